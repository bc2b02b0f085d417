//! Backing memory.
//!
//! A sparse byte store standing behind the bus. Addresses that were never
//! written read as the configured fill value.

use std::collections::HashMap;

use tracing::trace;

use crate::common::{AccessType, MemRequest, MemResponse, PhysAddr};
use crate::stats::MemoryStats;

/// Main memory shared by every controller.
#[derive(Debug, Clone)]
pub struct BackingMemory {
    cells: HashMap<PhysAddr, u8>,
    fill_value: u8,
    stats: MemoryStats,
}

impl BackingMemory {
    /// Creates a memory where every byte reads as `fill_value`.
    pub fn new(fill_value: u8) -> Self {
        Self {
            cells: HashMap::new(),
            fill_value,
            stats: MemoryStats::default(),
        }
    }

    /// Sets a byte without counting it as traffic.
    pub fn preload(&mut self, addr: PhysAddr, value: u8) {
        let _ = self.cells.insert(addr, value);
    }

    /// Current value of a byte, without counting it as traffic.
    pub fn peek(&self, addr: PhysAddr) -> u8 {
        self.cells.get(&addr).copied().unwrap_or(self.fill_value)
    }

    /// Services a memory transaction and builds its response.
    ///
    /// A write transaction stores its value; the response never carries it back.
    /// The requester's line is then dirty yet equal to memory, so its eviction
    /// only changes memory once a later local store has hit in M.
    pub fn service(&mut self, req: &MemRequest) -> MemResponse {
        match req.access {
            AccessType::Read => {
                self.stats.reads += 1;
                let value = self.peek(req.addr);
                trace!(addr = %req.addr, value, "memory read");
                MemResponse::read(req.addr, value)
            }
            AccessType::Write => {
                self.stats.writes += 1;
                if let Some(value) = req.value {
                    trace!(addr = %req.addr, value, "memory write");
                    let _ = self.cells.insert(req.addr, value);
                }
                MemResponse::write_ack(req.addr)
            }
        }
    }

    /// Absorbs a writeback of dirty data.
    pub fn writeback(&mut self, addr: PhysAddr, value: u8) {
        self.stats.writebacks += 1;
        trace!(addr = %addr, value, "memory writeback");
        let _ = self.cells.insert(addr, value);
    }

    /// Traffic counters.
    #[inline]
    pub const fn stats(&self) -> &MemoryStats {
        &self.stats
    }
}
