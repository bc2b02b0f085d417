//! Randomized Workload Tests.
//!
//! Generates interleaved multi-core workloads over a handful of contended
//! addresses. Every run must finish without a stale load or an ownership
//! conflict; both are checked on every event.

use proptest::prelude::*;

use snoopsim_core::coherence::{CoherenceState, MesiState, MsiState};
use snoopsim_core::common::PhysAddr;
use snoopsim_core::config::{Arbitration, Config};
use snoopsim_core::sim::{Access, MemoryInit, Simulator, Workload};

fn access() -> impl Strategy<Value = Access> {
    prop_oneof![
        (0u64..3).prop_map(|addr| Access::Read {
            addr: PhysAddr(addr)
        }),
        (0u64..3, any::<u8>()).prop_map(|(addr, value)| Access::Write {
            addr: PhysAddr(addr),
            value,
        }),
    ]
}

fn workload() -> impl Strategy<Value = Workload> {
    (
        prop::collection::vec(prop::collection::vec(access(), 0..12), 1..=4),
        prop::collection::vec((0u64..3, any::<u8>()), 0..3),
    )
        .prop_map(|(cores, memory)| Workload {
            memory: memory
                .into_iter()
                .map(|(addr, value)| MemoryInit {
                    addr: PhysAddr(addr),
                    value,
                })
                .collect(),
            cores,
        })
}

fn run<S: CoherenceState>(workload: Workload, round_robin: bool) -> Result<(), TestCaseError> {
    let mut config = Config::default();
    config.system.num_caches = workload.cores.len();
    if round_robin {
        config.system.arbitration = Arbitration::RoundRobin;
    }
    let reads: Vec<usize> = workload
        .cores
        .iter()
        .map(|core| core.iter().filter(|a| matches!(a, Access::Read { .. })).count())
        .collect();
    let requests = workload.len() as u64;

    let report = Simulator::<S>::new(&config, workload)
        .and_then(Simulator::run)
        .map_err(|e| TestCaseError::fail(e.to_string()))?;

    prop_assert_eq!(report.reads.iter().map(Vec::len).collect::<Vec<_>>(), reads);
    prop_assert_eq!(report.stats.cpu_requests, requests);
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn msi_random_workloads_stay_coherent(workload in workload(), round_robin in any::<bool>()) {
        run::<MsiState>(workload, round_robin)?;
    }

    #[test]
    fn mesi_random_workloads_stay_coherent(workload in workload(), round_robin in any::<bool>()) {
        run::<MesiState>(workload, round_robin)?;
    }
}
