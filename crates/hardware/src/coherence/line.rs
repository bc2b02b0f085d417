//! The single cache line slot owned by a controller.

use serde::Serialize;

use super::state::CoherenceState;
use crate::common::PhysAddr;

/// Tag, data, dirty bit and protocol state of one line.
///
/// `tag` and `data` carry no meaning while `state` is invalid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct CacheLine<S> {
    /// Coherence state.
    pub state: S,
    /// Resident address.
    pub tag: PhysAddr,
    /// Cached byte for `tag`.
    pub data: u8,
    /// `data` differs from memory and must be written back before it is discarded.
    pub dirty: bool,
}

impl<S: CoherenceState> CacheLine<S> {
    /// Builds a line in the given state.
    ///
    /// A line built in the modified state is dirty; every other state is clean.
    pub fn new(state: S, tag: PhysAddr, data: u8) -> Self {
        Self {
            state,
            tag,
            data,
            dirty: state == S::MODIFIED,
        }
    }

    /// Whether `addr` is resident in a valid state.
    #[inline]
    pub fn is_hit(&self, addr: PhysAddr) -> bool {
        self.state.is_valid() && self.tag == addr
    }

    /// Claims the slot for `addr`.
    ///
    /// Does not evict; the previous tenant must already have been written back.
    #[inline]
    pub const fn allocate(&mut self, addr: PhysAddr) {
        self.tag = addr;
        self.dirty = false;
    }
}

impl<S: CoherenceState> Default for CacheLine<S> {
    fn default() -> Self {
        Self {
            state: S::INVALID,
            tag: PhysAddr::default(),
            data: 0,
            dirty: false,
        }
    }
}
