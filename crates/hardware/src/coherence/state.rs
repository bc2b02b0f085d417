//! Coherence state sets.
//!
//! A protocol is a closed set of line states plus the transition rules the
//! controller consults on every event. [`CoherenceState`] captures those rules
//! so that one controller implementation serves both protocols:
//! 1. **MSI:** [`MsiState`]: Modified, Shared, Invalid.
//! 2. **MESI:** [`MesiState`] adds Exclusive, a clean sole copy that upgrades to
//!    Modified without bus traffic.
//!
//! Every rule is an exhaustive `match`, so adding or removing a state is a
//! compile-time checked change.

use std::fmt;

use serde::Serialize;

use crate::common::AccessType;
use crate::config::Protocol;

/// Outcome of a local write that hits the resident line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteHit<S> {
    /// The line is privately held; commit locally and move to the given state.
    Local(S),
    /// Other copies may exist; the bus must be acquired to invalidate them.
    Upgrade,
    /// The state holds no valid data, so the access cannot be a hit.
    Miss,
}

/// Reaction to another controller's transaction that hits the resident line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SnoopAction<S> {
    /// Evict the line first (writing it back when dirty).
    pub evict: bool,
    /// State of the line after the snoop.
    pub next: S,
}

/// Transition rules of a snooping coherence protocol.
pub trait CoherenceState:
    Copy + Eq + fmt::Debug + fmt::Display + Serialize + Send + Sync + 'static
{
    /// Protocol this state set implements.
    const PROTOCOL: Protocol;

    /// The state of an empty line.
    const INVALID: Self;

    /// The dirty sole-owner state.
    const MODIFIED: Self;

    /// Whether the line holds usable data.
    fn is_valid(self) -> bool;

    /// Whether the line is the only valid copy in the system (M or E).
    fn is_owner(self) -> bool;

    /// How a local write that hits the line is serviced.
    fn on_write_hit(self) -> WriteHit<Self>;

    /// State entered by a read fill.
    ///
    /// `shared_elsewhere` is the bus's shared signal at response time.
    fn read_fill(shared_elsewhere: bool) -> Self;

    /// Reaction to a snooped transaction that hits the line.
    fn on_snoop(self, access: AccessType) -> SnoopAction<Self>;
}

/// MSI line states.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub enum MsiState {
    /// Sole valid copy, dirty.
    Modified,
    /// One of possibly many clean copies.
    Shared,
    /// No valid data.
    #[default]
    Invalid,
}

impl CoherenceState for MsiState {
    const PROTOCOL: Protocol = Protocol::Msi;
    const INVALID: Self = Self::Invalid;
    const MODIFIED: Self = Self::Modified;

    fn is_valid(self) -> bool {
        match self {
            Self::Modified | Self::Shared => true,
            Self::Invalid => false,
        }
    }

    fn is_owner(self) -> bool {
        match self {
            Self::Modified => true,
            Self::Shared | Self::Invalid => false,
        }
    }

    fn on_write_hit(self) -> WriteHit<Self> {
        match self {
            Self::Modified => WriteHit::Local(Self::Modified),
            Self::Shared => WriteHit::Upgrade,
            Self::Invalid => WriteHit::Miss,
        }
    }

    fn read_fill(_shared_elsewhere: bool) -> Self {
        Self::Shared
    }

    fn on_snoop(self, access: AccessType) -> SnoopAction<Self> {
        match (self, access) {
            // MSI has no clean owner state to fall back to, so any snoop of M invalidates.
            (Self::Modified, _) | (Self::Shared, AccessType::Write) => SnoopAction {
                evict: true,
                next: Self::Invalid,
            },
            (Self::Shared, AccessType::Read) => SnoopAction {
                evict: false,
                next: Self::Shared,
            },
            (Self::Invalid, _) => SnoopAction {
                evict: false,
                next: Self::Invalid,
            },
        }
    }
}

impl fmt::Display for MsiState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Modified => "M",
            Self::Shared => "S",
            Self::Invalid => "I",
        };
        f.write_str(label)
    }
}

/// MESI line states.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub enum MesiState {
    /// Sole valid copy, dirty.
    Modified,
    /// Sole valid copy, clean.
    Exclusive,
    /// One of possibly many clean copies.
    Shared,
    /// No valid data.
    #[default]
    Invalid,
}

impl CoherenceState for MesiState {
    const PROTOCOL: Protocol = Protocol::Mesi;
    const INVALID: Self = Self::Invalid;
    const MODIFIED: Self = Self::Modified;

    fn is_valid(self) -> bool {
        match self {
            Self::Modified | Self::Exclusive | Self::Shared => true,
            Self::Invalid => false,
        }
    }

    fn is_owner(self) -> bool {
        match self {
            Self::Modified | Self::Exclusive => true,
            Self::Shared | Self::Invalid => false,
        }
    }

    fn on_write_hit(self) -> WriteHit<Self> {
        match self {
            Self::Modified | Self::Exclusive => WriteHit::Local(Self::Modified),
            Self::Shared => WriteHit::Upgrade,
            Self::Invalid => WriteHit::Miss,
        }
    }

    fn read_fill(shared_elsewhere: bool) -> Self {
        if shared_elsewhere {
            Self::Shared
        } else {
            Self::Exclusive
        }
    }

    fn on_snoop(self, access: AccessType) -> SnoopAction<Self> {
        match (self, access) {
            (Self::Modified, AccessType::Read) => SnoopAction {
                evict: true,
                next: Self::Shared,
            },
            (Self::Modified | Self::Exclusive | Self::Shared, AccessType::Write) => SnoopAction {
                evict: true,
                next: Self::Invalid,
            },
            (Self::Exclusive | Self::Shared, AccessType::Read) => SnoopAction {
                evict: false,
                next: Self::Shared,
            },
            (Self::Invalid, _) => SnoopAction {
                evict: false,
                next: Self::Invalid,
            },
        }
    }
}

impl fmt::Display for MesiState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Modified => "M",
            Self::Exclusive => "E",
            Self::Shared => "S",
            Self::Invalid => "I",
        };
        f.write_str(label)
    }
}
