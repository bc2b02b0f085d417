//! Serializing snooping bus.
//!
//! This module implements the arbitration half of the shared bus. It provides:
//! 1. **Request queueing:** Each controller may have at most one request queued or granted.
//! 2. **Arbitration:** FIFO or round-robin selection of the next owner once the bus is free.
//! 3. **Ownership checks:** Only the owner may release the bus.
//! 4. **Traffic counters:** Grants, transactions, snoops and writebacks.
//!
//! Snoop delivery and memory servicing happen in [`System`](super::System),
//! which owns both the bus and the controllers.

use std::collections::VecDeque;

use tracing::trace;

use crate::common::{AccessType, BusError, CacheId};
use crate::config::Arbitration;
use crate::stats::BusStats;

/// Arbitration state of the shared bus.
#[derive(Debug, Clone)]
pub struct SnoopBus {
    policy: Arbitration,
    queue: VecDeque<CacheId>,
    owner: Option<CacheId>,
    last_owner: Option<CacheId>,
    stats: BusStats,
}

impl SnoopBus {
    /// Creates an idle bus using the given arbitration policy.
    pub fn new(policy: Arbitration) -> Self {
        Self {
            policy,
            queue: VecDeque::new(),
            owner: None,
            last_owner: None,
            stats: BusStats::default(),
        }
    }

    /// Queues a request for ownership.
    ///
    /// # Errors
    ///
    /// [`BusError::DuplicateRequest`] if `cache` already owns the bus or is queued.
    pub fn request(&mut self, cache: CacheId) -> Result<(), BusError> {
        if self.owner == Some(cache) || self.queue.contains(&cache) {
            return Err(BusError::DuplicateRequest { cache });
        }
        trace!(cache, "bus request queued");
        self.queue.push_back(cache);
        Ok(())
    }

    /// Releases ownership.
    ///
    /// # Errors
    ///
    /// [`BusError::NotOwner`] if `cache` does not own the bus.
    pub fn release(&mut self, cache: CacheId) -> Result<(), BusError> {
        if self.owner != Some(cache) {
            return Err(BusError::NotOwner {
                cache,
                owner: self.owner,
            });
        }
        trace!(cache, "bus released");
        self.owner = None;
        self.last_owner = Some(cache);
        Ok(())
    }

    /// Grants the bus to the next waiting controller if it is free.
    ///
    /// # Returns
    ///
    /// The new owner, or `None` if the bus is busy or nobody is waiting.
    pub fn arbitrate(&mut self) -> Option<CacheId> {
        if self.owner.is_some() {
            return None;
        }
        let pos = match self.policy {
            Arbitration::Fifo => 0,
            Arbitration::RoundRobin => {
                let after = self.last_owner.map_or(0, |last| last + 1);
                self.queue
                    .iter()
                    .enumerate()
                    .min_by_key(|&(_, &id)| (id < after, id))
                    .map(|(pos, _)| pos)?
            }
        };
        let cache = self.queue.remove(pos)?;
        self.owner = Some(cache);
        self.stats.grants += 1;
        trace!(cache, "bus granted");
        Some(cache)
    }

    /// Current owner.
    #[inline]
    pub const fn owner(&self) -> Option<CacheId> {
        self.owner
    }

    /// Controllers waiting for a grant, in queue order.
    pub fn waiting(&self) -> impl Iterator<Item = CacheId> + '_ {
        self.queue.iter().copied()
    }

    /// Whether the bus has no owner and no waiting requests.
    pub fn is_idle(&self) -> bool {
        self.owner.is_none() && self.queue.is_empty()
    }

    /// Traffic counters.
    #[inline]
    pub const fn stats(&self) -> &BusStats {
        &self.stats
    }

    pub(crate) const fn record_transaction(&mut self, access: AccessType) {
        match access {
            AccessType::Read => self.stats.mem_reads += 1,
            AccessType::Write => self.stats.mem_writes += 1,
        }
    }

    pub(crate) const fn record_snoop(&mut self) {
        self.stats.snoops += 1;
    }

    pub(crate) const fn record_writeback(&mut self) {
        self.stats.writebacks += 1;
    }
}
