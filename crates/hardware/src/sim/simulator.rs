//! Simulator: drives a workload through a [`System`].
//!
//! Each round offers every idle core its next access (in core order), then
//! advances the bus by one event. Loads are checked against the last store
//! committed anywhere in the system, so a coherence bug shows up as a
//! [`SimError::StaleRead`] at the access that observed it.

use std::collections::{HashMap, VecDeque};

use serde::Serialize;
use tracing::{debug, trace};

use super::workload::{Access, Workload};
use crate::coherence::{CoherenceController, CoherenceState};
use crate::common::{CacheId, CpuResponse, CpuResponseKind, PhysAddr, SimError};
use crate::config::Config;
use crate::soc::{StepOutcome, System};
use crate::stats::SimStats;

/// A load observed by a core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReadRecord {
    /// Loaded address.
    pub addr: PhysAddr,
    /// Value returned.
    pub value: u8,
}

/// Outcome of a completed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Loads observed by each core, in program order.
    pub reads: Vec<Vec<ReadRecord>>,
    /// Counters at the end of the run.
    pub stats: SimStats,
}

impl RunReport {
    /// Pretty-printed JSON form of the report.
    ///
    /// # Errors
    ///
    /// [`SimError::Encode`] if serialization fails.
    pub fn to_json(&self) -> Result<String, SimError> {
        serde_json::to_string_pretty(self)
            .map_err(|source| SimError::Encode { source })
    }
}

#[derive(Debug, Default)]
struct Core {
    accesses: VecDeque<Access>,
    outstanding: Option<Access>,
    reads: Vec<ReadRecord>,
}

impl Core {
    fn is_done(&self) -> bool {
        self.accesses.is_empty() && self.outstanding.is_none()
    }
}

/// Runs a workload against a system of `S` controllers.
#[derive(Debug)]
pub struct Simulator<S: CoherenceState> {
    system: System<S>,
    cores: Vec<Core>,
    committed: HashMap<PhysAddr, u8>,
    fill_value: u8,
    next_id: u64,
}

impl<S: CoherenceState> Simulator<S> {
    /// Builds the system described by `config` and loads `workload` into it.
    ///
    /// # Errors
    ///
    /// [`SimError::CoreCountMismatch`] if the workload has more cores than the
    /// system has caches.
    pub fn new(config: &Config, workload: Workload) -> Result<Self, SimError> {
        let system = System::new(config);
        Self::with_system(system, config.memory.fill_value, workload)
    }

    /// Loads `workload` into an already built system.
    ///
    /// # Errors
    ///
    /// [`SimError::CoreCountMismatch`] if the workload has more cores than the
    /// system has caches.
    pub fn with_system(
        mut system: System<S>,
        fill_value: u8,
        workload: Workload,
    ) -> Result<Self, SimError> {
        if workload.cores.len() > system.len() {
            return Err(SimError::CoreCountMismatch {
                cores: workload.cores.len(),
                caches: system.len(),
            });
        }

        let mut committed = HashMap::new();
        for init in &workload.memory {
            system.memory_mut().preload(init.addr, init.value);
            let _ = committed.insert(init.addr, init.value);
        }

        let mut cores: Vec<Core> = workload
            .cores
            .into_iter()
            .map(|accesses| Core {
                accesses: accesses.into(),
                ..Core::default()
            })
            .collect();
        cores.resize_with(system.len(), Core::default);

        Ok(Self {
            system,
            cores,
            committed,
            fill_value,
            next_id: 0,
        })
    }

    /// The simulated system.
    pub const fn system(&self) -> &System<S> {
        &self.system
    }

    /// Runs until every core has drained its accesses.
    ///
    /// # Errors
    ///
    /// Any controller, bus or invariant failure, a [`SimError::StaleRead`], or
    /// [`SimError::Deadlock`] if cores remain blocked with the bus idle.
    pub fn run(mut self) -> Result<RunReport, SimError> {
        while self.tick()? {}
        Ok(RunReport {
            reads: self.cores.into_iter().map(|core| core.reads).collect(),
            stats: self.system.stats(),
        })
    }

    /// Performs one round: issue ready accesses, then one bus event.
    ///
    /// # Returns
    ///
    /// `false` once every core is done and the bus is idle.
    ///
    /// # Errors
    ///
    /// See [`run`](Self::run).
    pub fn tick(&mut self) -> Result<bool, SimError> {
        self.issue_ready()?;
        match self.system.step()? {
            StepOutcome::Completed { cache, response } => {
                let access = self
                    .cores
                    .get_mut(cache)
                    .and_then(|core| core.outstanding.take())
                    .ok_or(SimError::UnexpectedCompletion {
                        cache,
                        id: response.id,
                    })?;
                self.complete(cache, access, response)?;
                Ok(true)
            }
            StepOutcome::Granted(_) => Ok(true),
            StepOutcome::Idle => {
                if self.cores.iter().all(Core::is_done) {
                    return Ok(false);
                }
                let blocked = self.system.blocked_caches();
                let ready = self.cores.iter().enumerate().any(|(id, core)| {
                    !core.accesses.is_empty() && !blocked.contains(&id)
                });
                if ready {
                    Ok(true)
                } else {
                    Err(SimError::Deadlock { blocked })
                }
            }
        }
    }

    fn issue_ready(&mut self) -> Result<(), SimError> {
        for cache in 0..self.cores.len() {
            if self.system.cache(cache).is_some_and(CoherenceController::is_blocked) {
                continue;
            }
            let Some(access) = self
                .cores
                .get_mut(cache)
                .filter(|core| core.outstanding.is_none())
                .and_then(|core| core.accesses.pop_front())
            else {
                continue;
            };

            let id = self.next_id;
            self.next_id += 1;
            trace!(cache, id, addr = %access.addr(), "access issued");
            match self.system.submit(cache, access.request(id))? {
                Some(response) => self.complete(cache, access, response)?,
                None => {
                    if let Some(core) = self.cores.get_mut(cache) {
                        core.outstanding = Some(access);
                    }
                }
            }
        }
        Ok(())
    }

    fn complete(
        &mut self,
        cache: CacheId,
        access: Access,
        response: CpuResponse,
    ) -> Result<(), SimError> {
        match (access, response.kind) {
            (Access::Write { addr, value }, CpuResponseKind::WriteAck) => {
                debug!(cache, addr = %addr, value, "store committed");
                let _ = self.committed.insert(addr, value);
            }
            (Access::Read { addr }, CpuResponseKind::ReadData(value)) => {
                let expected = self
                    .committed
                    .get(&addr)
                    .copied()
                    .unwrap_or(self.fill_value);
                if value != expected {
                    return Err(SimError::StaleRead {
                        cache,
                        addr,
                        expected,
                        got: value,
                    });
                }
                if let Some(core) = self.cores.get_mut(cache) {
                    core.reads.push(ReadRecord { addr, value });
                }
            }
            _ => {
                return Err(SimError::UnexpectedCompletion {
                    cache,
                    id: response.id,
                });
            }
        }
        Ok(())
    }
}
