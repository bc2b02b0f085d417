//! Bus-facing port of a coherence controller.
//!
//! A controller never calls into the bus or another controller directly. It
//! emits commands through a [`BusPort`], and whoever owns the bus decides when
//! to act on them. This module provides:
//! 1. **The contract:** the [`BusPort`] trait.
//! 2. **A queueing port:** [`CommandQueue`], which records commands as [`BusCommand`]s
//!    so an orchestrator can apply them after the controller returns.

use crate::common::{CacheId, MemRequest, PhysAddr};

/// Operations a controller may perform on the shared bus.
pub trait BusPort {
    /// Asks for bus ownership; a grant follows eventually.
    fn request(&mut self, cache: CacheId);

    /// Gives up bus ownership after a memory response.
    fn release(&mut self, cache: CacheId);

    /// Issues the memory transaction for the current grant.
    fn send_mem_req(&mut self, req: MemRequest);

    /// Writes a dirty byte back to memory. No response follows.
    fn send_writeback(&mut self, cache: CacheId, addr: PhysAddr, value: u8);

    /// Whether another controller held a valid copy of `addr` when the current
    /// transaction was snooped.
    fn is_shared(&self, addr: PhysAddr) -> bool;
}

/// A bus command recorded by a [`CommandQueue`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BusCommand {
    /// See [`BusPort::request`].
    Request(CacheId),
    /// See [`BusPort::release`].
    Release(CacheId),
    /// See [`BusPort::send_mem_req`].
    MemRequest(MemRequest),
    /// See [`BusPort::send_writeback`].
    Writeback {
        /// Evicting controller.
        cache: CacheId,
        /// Evicted tag.
        addr: PhysAddr,
        /// Dirty value.
        value: u8,
    },
}

impl BusCommand {
    /// Short name used in diagnostics.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Request(_) => "request",
            Self::Release(_) => "release",
            Self::MemRequest(_) => "mem_req",
            Self::Writeback { .. } => "writeback",
        }
    }
}

/// A [`BusPort`] that queues commands for later application.
///
/// The shared signal is latched by the bus before the port is handed to the
/// controller receiving a memory response.
#[derive(Debug, Default)]
pub struct CommandQueue {
    commands: Vec<BusCommand>,
    shared: Option<PhysAddr>,
}

impl CommandQueue {
    /// An empty queue with the shared signal deasserted.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty queue reporting `addr` as shared elsewhere when `shared` is set.
    pub fn with_shared(addr: PhysAddr, shared: bool) -> Self {
        Self {
            commands: Vec::new(),
            shared: shared.then_some(addr),
        }
    }

    /// Takes the recorded commands in issue order.
    pub fn drain(&mut self) -> std::vec::Drain<'_, BusCommand> {
        self.commands.drain(..)
    }

    /// Whether no command has been recorded.
    pub const fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl BusPort for CommandQueue {
    fn request(&mut self, cache: CacheId) {
        self.commands.push(BusCommand::Request(cache));
    }

    fn release(&mut self, cache: CacheId) {
        self.commands.push(BusCommand::Release(cache));
    }

    fn send_mem_req(&mut self, req: MemRequest) {
        self.commands.push(BusCommand::MemRequest(req));
    }

    fn send_writeback(&mut self, cache: CacheId, addr: PhysAddr, value: u8) {
        self.commands.push(BusCommand::Writeback {
            cache,
            addr,
            value,
        });
    }

    fn is_shared(&self, addr: PhysAddr) -> bool {
        self.shared == Some(addr)
    }
}
