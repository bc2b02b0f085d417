//! Multi-controller system: controllers, bus and memory wired together.
//!
//! [`System`] is the bus orchestrator. It owns every controller and applies
//! the commands they emit through their [`CommandQueue`] ports:
//! 1. **Requests and releases** go to the [`SnoopBus`] arbiter.
//! 2. **A memory request** from the bus owner is snooped by every other controller
//!    first; their writebacks reach memory immediately, the shared signal is
//!    latched from their post-snoop state, and only then does memory service the
//!    transaction. The response is held until the next [`step`](System::step).
//! 3. **Writebacks** go straight to memory.

use tracing::{debug, info};

use super::interconnect::SnoopBus;
use super::memory::BackingMemory;
use crate::coherence::{BusCommand, CacheLine, CoherenceController, CoherenceState, CommandQueue};
use crate::common::{
    BusError, CacheId, CpuRequest, CpuResponse, MemRequest, MemResponse, PhysAddr, SimError,
};
use crate::config::Config;
use crate::stats::SimStats;

/// A memory response waiting to be delivered to the bus owner.
#[derive(Debug, Clone, Copy)]
struct InFlight {
    cache: CacheId,
    response: MemResponse,
    shared: bool,
}

/// What a call to [`System::step`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Nothing to do: no response in flight and nobody waiting for the bus.
    Idle,
    /// The bus was granted and the owner issued its memory transaction.
    Granted(CacheId),
    /// A memory response was delivered and the processor request completed.
    Completed {
        /// Controller that completed.
        cache: CacheId,
        /// Response for its processor.
        response: CpuResponse,
    },
}

/// Controllers sharing one snooping bus and one backing memory.
#[derive(Debug, Clone)]
pub struct System<S: CoherenceState> {
    caches: Vec<CoherenceController<S>>,
    bus: SnoopBus,
    memory: BackingMemory,
    in_flight: Option<InFlight>,
    check_invariants: bool,
    bus_events: u64,
    cpu_requests: u64,
}

impl<S: CoherenceState> System<S> {
    /// Builds a system with `config.system.num_caches` empty controllers.
    ///
    /// The protocol is the type parameter; `config.system.protocol` is only
    /// consulted by callers choosing `S`.
    pub fn new(config: &Config) -> Self {
        let lines = vec![CacheLine::default(); config.system.num_caches];
        Self::with_lines(config, lines)
    }

    /// Builds a system whose controller `i` starts with `lines[i]`.
    ///
    /// The caller is responsible for the lines being coherent with each other.
    pub fn with_lines(config: &Config, lines: Vec<CacheLine<S>>) -> Self {
        info!(
            protocol = %S::PROTOCOL,
            caches = lines.len(),
            arbitration = ?config.system.arbitration,
            "building system"
        );
        Self {
            caches: lines
                .into_iter()
                .enumerate()
                .map(|(id, line)| CoherenceController::with_line(id, line))
                .collect(),
            bus: SnoopBus::new(config.system.arbitration),
            memory: BackingMemory::new(config.memory.fill_value),
            in_flight: None,
            check_invariants: config.general.check_invariants,
            bus_events: 0,
            cpu_requests: 0,
        }
    }

    /// Number of controllers.
    pub const fn len(&self) -> usize {
        self.caches.len()
    }

    /// Whether the system has no controllers.
    pub const fn is_empty(&self) -> bool {
        self.caches.is_empty()
    }

    /// Controller `cache`, if it exists.
    pub fn cache(&self, cache: CacheId) -> Option<&CoherenceController<S>> {
        self.caches.get(cache)
    }

    /// All controllers, indexed by id.
    pub fn caches(&self) -> &[CoherenceController<S>] {
        &self.caches
    }

    /// The bus arbiter.
    pub const fn bus(&self) -> &SnoopBus {
        &self.bus
    }

    /// The backing memory.
    pub const fn memory(&self) -> &BackingMemory {
        &self.memory
    }

    /// Mutable access to the backing memory, for preloading.
    pub const fn memory_mut(&mut self) -> &mut BackingMemory {
        &mut self.memory
    }

    /// Controllers still servicing a processor request.
    pub fn blocked_caches(&self) -> Vec<CacheId> {
        self.caches
            .iter()
            .filter(|c| c.is_blocked())
            .map(CoherenceController::id)
            .collect()
    }

    /// Whether no response is in flight and the bus has no owner or waiters.
    pub fn is_idle(&self) -> bool {
        self.in_flight.is_none() && self.bus.is_idle()
    }

    /// Hands a processor request to controller `cache`.
    ///
    /// # Returns
    ///
    /// The response if the request hit, or `None` if it now waits on the bus.
    ///
    /// # Errors
    ///
    /// Any controller, bus or invariant failure.
    pub fn submit(
        &mut self,
        cache: CacheId,
        req: CpuRequest,
    ) -> Result<Option<CpuResponse>, SimError> {
        let controller = self
            .caches
            .get_mut(cache)
            .ok_or(SimError::UnknownCache { cache })?;
        let mut port = CommandQueue::new();
        let response = controller.on_processor_request(req, &mut port)?;
        self.cpu_requests += 1;
        self.apply(&mut port)?;
        self.check_coherence_if_enabled()?;
        Ok(response)
    }

    /// Advances the bus by one event.
    ///
    /// Delivers the in-flight memory response if there is one; otherwise grants
    /// the bus to the next waiting controller, which issues its transaction.
    ///
    /// # Errors
    ///
    /// Any controller, bus or invariant failure.
    pub fn step(&mut self) -> Result<StepOutcome, SimError> {
        if let Some(flight) = self.in_flight.take() {
            let controller = self
                .caches
                .get_mut(flight.cache)
                .ok_or(SimError::UnknownCache {
                    cache: flight.cache,
                })?;
            let mut port = CommandQueue::with_shared(flight.response.addr, flight.shared);
            let response = controller.on_memory_response(flight.response, &mut port)?;
            self.bus_events += 1;
            self.apply(&mut port)?;
            self.check_coherence_if_enabled()?;
            return Ok(StepOutcome::Completed {
                cache: flight.cache,
                response,
            });
        }

        let Some(cache) = self.bus.arbitrate() else {
            return Ok(StepOutcome::Idle);
        };
        let controller = self
            .caches
            .get_mut(cache)
            .ok_or(SimError::UnknownCache { cache })?;
        let mut port = CommandQueue::new();
        controller.on_bus_grant(&mut port)?;
        self.bus_events += 1;
        self.apply(&mut port)?;
        self.check_coherence_if_enabled()?;
        Ok(StepOutcome::Granted(cache))
    }

    /// Checks every line invariant and that an owner (M or E) is the only
    /// valid copy of its address.
    ///
    /// # Errors
    ///
    /// The first violation found.
    pub fn check_coherence(&self) -> Result<(), SimError> {
        for cache in &self.caches {
            cache.check_invariants()?;
        }
        for owner in self.caches.iter().filter(|c| c.state().is_owner()) {
            let addr = owner.line().tag;
            if let Some(other) = self
                .caches
                .iter()
                .find(|c| c.id() != owner.id() && c.is_hit(addr))
            {
                return Err(SimError::OwnershipConflict {
                    addr,
                    owner: owner.id(),
                    other: other.id(),
                });
            }
        }
        Ok(())
    }

    /// Controllers holding `addr` in a valid state.
    pub fn holders(&self, addr: PhysAddr) -> Vec<CacheId> {
        self.caches
            .iter()
            .filter(|c| c.is_hit(addr))
            .map(CoherenceController::id)
            .collect()
    }

    /// Snapshot of all counters.
    pub fn stats(&self) -> SimStats {
        SimStats {
            protocol: S::PROTOCOL.to_string(),
            bus_events: self.bus_events,
            cpu_requests: self.cpu_requests,
            caches: self.caches.iter().map(|c| c.stats().clone()).collect(),
            bus: self.bus.stats().clone(),
            memory: self.memory.stats().clone(),
        }
    }

    fn check_coherence_if_enabled(&self) -> Result<(), SimError> {
        if self.check_invariants {
            self.check_coherence()
        } else {
            Ok(())
        }
    }

    fn apply(&mut self, port: &mut CommandQueue) -> Result<(), SimError> {
        let commands: Vec<BusCommand> = port.drain().collect();
        for command in commands {
            match command {
                BusCommand::Request(cache) => self.bus.request(cache)?,
                BusCommand::Release(cache) => self.bus.release(cache)?,
                BusCommand::Writeback { addr, value, .. } => {
                    self.bus.record_writeback();
                    self.memory.writeback(addr, value);
                }
                BusCommand::MemRequest(req) => self.issue(req)?,
            }
        }
        Ok(())
    }

    /// Broadcasts `req` as a snoop, then lets memory service it.
    fn issue(&mut self, req: MemRequest) -> Result<(), SimError> {
        if self.bus.owner() != Some(req.cache) {
            return Err(BusError::NotGranted { cache: req.cache }.into());
        }
        self.bus.record_transaction(req.access);
        debug!(cache = req.cache, addr = %req.addr, access = %req.access, "bus transaction");

        let snoop = req.snoop();
        let mut shared = false;
        for other in self.caches.iter_mut().filter(|c| c.id() != req.cache) {
            let mut port = CommandQueue::new();
            other.on_snooped_request(&snoop, &mut port);
            self.bus.record_snoop();
            for command in port.drain() {
                match command {
                    BusCommand::Writeback { addr, value, .. } => {
                        self.bus.record_writeback();
                        self.memory.writeback(addr, value);
                    }
                    other_command => {
                        return Err(BusError::SnoopSideEffect {
                            cache: other.id(),
                            command: other_command.name(),
                        }
                        .into());
                    }
                }
            }
            shared |= other.is_hit(snoop.addr);
        }

        let response = self.memory.service(&req);
        self.in_flight = Some(InFlight {
            cache: req.cache,
            response,
            shared,
        });
        Ok(())
    }
}
