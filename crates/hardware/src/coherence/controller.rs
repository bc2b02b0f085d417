//! Snooping coherence controller.
//!
//! One controller owns one [`CacheLine`] and reacts to four events:
//! 1. **Processor request:** serve hits locally; stash misses and S-state writes and request
//!    the bus.
//! 2. **Bus grant:** issue exactly one memory transaction for the stashed request.
//! 3. **Memory response:** evict the previous tenant if needed, fill the line, answer the
//!    processor and release the bus.
//! 4. **Snooped request:** write back, downgrade or invalidate the line when another
//!    controller's transaction hits it.
//!
//! The protocol is a type parameter; see [`MsiController`] and [`MesiController`].

use tracing::{debug, trace};

use super::line::CacheLine;
use super::port::BusPort;
use super::state::{CoherenceState, MesiState, MsiState, WriteHit};
use crate::common::{
    CacheId, CoherenceError, CpuOp, CpuRequest, CpuResponse, MemRequest, MemResponse,
    MemResponseKind, PhysAddr, SnoopRequest,
};
use crate::stats::CacheStats;

/// Controller running the MSI protocol.
pub type MsiController = CoherenceController<MsiState>;

/// Controller running the MESI protocol.
pub type MesiController = CoherenceController<MesiState>;

/// Progress of the outstanding processor request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PendingPhase {
    /// Bus ownership has been requested but not granted.
    AwaitingGrant,
    /// The memory transaction has been issued.
    AwaitingMemory,
}

/// A processor request waiting on a bus-mediated memory transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pending {
    /// The stashed request; for writes it also holds the value to commit.
    pub request: CpuRequest,
    /// How far the transaction has progressed.
    pub phase: PendingPhase,
}

/// A coherence controller for a single line slot.
///
/// While a request is pending the controller is blocked, and
/// [`on_processor_request`](Self::on_processor_request) rejects new work.
#[derive(Clone, Debug)]
pub struct CoherenceController<S: CoherenceState> {
    id: CacheId,
    line: CacheLine<S>,
    pending: Option<Pending>,
    stats: CacheStats,
}

impl<S: CoherenceState> CoherenceController<S> {
    /// Creates a controller with an invalid line.
    pub fn new(id: CacheId) -> Self {
        Self::with_line(id, CacheLine::default())
    }

    /// Creates a controller whose line starts in the given state.
    pub fn with_line(id: CacheId, line: CacheLine<S>) -> Self {
        Self {
            id,
            line,
            pending: None,
            stats: CacheStats::default(),
        }
    }

    /// Bus index of this controller.
    #[inline]
    pub const fn id(&self) -> CacheId {
        self.id
    }

    /// Current protocol state of the line.
    #[inline]
    pub const fn state(&self) -> S {
        self.line.state
    }

    /// The line slot.
    #[inline]
    pub const fn line(&self) -> &CacheLine<S> {
        &self.line
    }

    /// The outstanding request, if any.
    #[inline]
    pub const fn pending(&self) -> Option<&Pending> {
        self.pending.as_ref()
    }

    /// Whether a processor request is still being serviced.
    #[inline]
    pub const fn is_blocked(&self) -> bool {
        self.pending.is_some()
    }

    /// Event counters.
    #[inline]
    pub const fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Whether `addr` is resident in a valid state.
    #[inline]
    pub fn is_hit(&self, addr: PhysAddr) -> bool {
        self.line.is_hit(addr)
    }

    /// Claims the slot for `addr`. The previous tenant must already be evicted.
    pub const fn allocate(&mut self, addr: PhysAddr) {
        self.line.allocate(addr);
    }

    /// Writes the line back and invalidates it if it is dirty; otherwise does nothing.
    pub fn evict<P: BusPort>(&mut self, port: &mut P) {
        if !self.line.dirty {
            return;
        }
        self.line.dirty = false;
        self.line.state = S::INVALID;
        port.send_writeback(self.id, self.line.tag, self.line.data);
        self.stats.writebacks += 1;
        debug!(
            cache = self.id,
            addr = %self.line.tag,
            value = self.line.data,
            "writeback"
        );
    }

    /// Handles a load or store from the local processor.
    ///
    /// Returns the response when the request is served from the line, or `None`
    /// when it waits on the bus; the response then comes from
    /// [`on_memory_response`](Self::on_memory_response).
    ///
    /// # Errors
    ///
    /// [`CoherenceError::Blocked`] if a request is already outstanding, and
    /// [`CoherenceError::Invariant`] if the line reports a hit it cannot serve.
    pub fn on_processor_request<P: BusPort>(
        &mut self,
        req: CpuRequest,
        port: &mut P,
    ) -> Result<Option<CpuResponse>, CoherenceError> {
        if let Some(pending) = &self.pending {
            return Err(CoherenceError::Blocked {
                cache: self.id,
                pending: pending.request.id,
                rejected: req.id,
            });
        }
        debug!(
            cache = self.id,
            addr = %req.addr,
            access = %req.access_type(),
            state = %self.line.state,
            "cpu request"
        );

        if !self.is_hit(req.addr) {
            match req.op {
                CpuOp::Read => self.stats.read_misses += 1,
                CpuOp::Write(_) => self.stats.write_misses += 1,
            }
            debug!(cache = self.id, addr = %req.addr, "miss");
            self.await_bus(req, port);
            return Ok(None);
        }

        match req.op {
            CpuOp::Read => {
                self.stats.read_hits += 1;
                trace!(cache = self.id, addr = %req.addr, value = self.line.data, "read hit");
                Ok(Some(CpuResponse::read_data(&req, self.line.data)))
            }
            CpuOp::Write(value) => match self.line.state.on_write_hit() {
                WriteHit::Local(next) => {
                    if next != self.line.state {
                        self.stats.silent_upgrades += 1;
                    }
                    self.stats.write_hits += 1;
                    self.line.state = next;
                    self.line.data = value;
                    self.line.dirty = true;
                    trace!(cache = self.id, addr = %req.addr, value, "write hit");
                    Ok(Some(CpuResponse::write_ack(&req)))
                }
                WriteHit::Upgrade => {
                    self.stats.upgrades += 1;
                    debug!(cache = self.id, addr = %req.addr, "upgrade requested");
                    self.await_bus(req, port);
                    Ok(None)
                }
                WriteHit::Miss => Err(self.invariant(format!(
                    "write hit on {} in non-valid state {}",
                    req.addr, self.line.state
                ))),
            },
        }
    }

    /// Issues the memory transaction for the pending request.
    ///
    /// # Errors
    ///
    /// [`CoherenceError::UnexpectedGrant`] if no request is waiting for the bus.
    pub fn on_bus_grant<P: BusPort>(&mut self, port: &mut P) -> Result<(), CoherenceError> {
        let Some(pending) = self
            .pending
            .as_mut()
            .filter(|p| p.phase == PendingPhase::AwaitingGrant)
        else {
            return Err(CoherenceError::UnexpectedGrant { cache: self.id });
        };
        pending.phase = PendingPhase::AwaitingMemory;
        let req = MemRequest::for_request(self.id, &pending.request);
        debug!(cache = self.id, addr = %req.addr, access = %req.access, "bus granted");
        port.send_mem_req(req);
        Ok(())
    }

    /// Completes the pending request with the memory response.
    ///
    /// Write fills commit the stashed value; the response payload is only read
    /// for read fills.
    ///
    /// # Errors
    ///
    /// [`CoherenceError::UnexpectedResponse`] if no transaction is outstanding,
    /// [`CoherenceError::ResponseMismatch`] if the response answers a different
    /// address or direction.
    pub fn on_memory_response<P: BusPort>(
        &mut self,
        resp: MemResponse,
        port: &mut P,
    ) -> Result<CpuResponse, CoherenceError> {
        let Some(pending) = self
            .pending
            .filter(|p| p.phase == PendingPhase::AwaitingMemory)
        else {
            return Err(CoherenceError::UnexpectedResponse {
                cache: self.id,
                addr: resp.addr,
            });
        };
        let req = pending.request;
        let fill = match (req.op, resp.kind) {
            (CpuOp::Read, MemResponseKind::ReadData(value))
            | (CpuOp::Write(value), MemResponseKind::WriteAck)
                if resp.addr == req.addr =>
            {
                value
            }
            _ => {
                return Err(CoherenceError::ResponseMismatch {
                    cache: self.id,
                    expected: req.addr,
                    expected_access: req.access_type(),
                    got: resp.addr,
                    got_access: resp.access_type(),
                });
            }
        };

        // An S-state upgrade keeps its line unless a snoop invalidated it meanwhile.
        if !self.is_hit(resp.addr) {
            if self.line.state.is_valid() {
                debug!(
                    cache = self.id,
                    victim = %self.line.tag,
                    state = %self.line.state,
                    "replacing line"
                );
            }
            self.evict(port);
            self.line.state = S::INVALID;
            self.allocate(resp.addr);
        }

        let reply = match req.op {
            CpuOp::Read => {
                let shared = port.is_shared(resp.addr);
                self.line.state = S::read_fill(shared);
                self.line.data = fill;
                CpuResponse::read_data(&req, fill)
            }
            CpuOp::Write(_) => {
                self.line.state = S::MODIFIED;
                self.line.data = fill;
                self.line.dirty = true;
                CpuResponse::write_ack(&req)
            }
        };
        debug!(
            cache = self.id,
            addr = %resp.addr,
            value = fill,
            state = %self.line.state,
            "fill"
        );

        port.release(self.id);
        self.pending = None;
        Ok(reply)
    }

    /// Reacts to another controller's bus transaction.
    pub fn on_snooped_request<P: BusPort>(&mut self, snoop: &SnoopRequest, port: &mut P) {
        if !self.is_hit(snoop.addr) {
            trace!(cache = self.id, addr = %snoop.addr, "snoop miss");
            return;
        }
        self.stats.snoop_hits += 1;

        let before = self.line.state;
        let action = before.on_snoop(snoop.access);
        if action.evict {
            self.evict(port);
        }
        self.line.state = action.next;

        if !action.next.is_valid() {
            self.stats.invalidations += 1;
        } else if action.next != before {
            self.stats.downgrades += 1;
        }
        debug!(
            cache = self.id,
            addr = %snoop.addr,
            origin = snoop.origin,
            access = %snoop.access,
            from = %before,
            to = %action.next,
            "snoop hit"
        );
    }

    /// Checks the line invariants: an invalid line is clean, and only a
    /// modified line may be dirty.
    ///
    /// # Errors
    ///
    /// [`CoherenceError::Invariant`] describing the first violation found.
    pub fn check_invariants(&self) -> Result<(), CoherenceError> {
        if !self.line.dirty {
            return Ok(());
        }
        if self.line.state != S::MODIFIED {
            return Err(self.invariant(format!(
                "line {} is dirty in state {}",
                self.line.tag, self.line.state
            )));
        }
        Ok(())
    }

    fn await_bus<P: BusPort>(&mut self, request: CpuRequest, port: &mut P) {
        self.pending = Some(Pending {
            request,
            phase: PendingPhase::AwaitingGrant,
        });
        port.request(self.id);
    }

    const fn invariant(&self, detail: String) -> CoherenceError {
        CoherenceError::Invariant {
            cache: self.id,
            detail,
        }
    }
}
