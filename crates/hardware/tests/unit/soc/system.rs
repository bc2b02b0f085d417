//! System Orchestration Tests.
//!
//! Verifies how `System` sequences grants, snoops, writebacks and memory
//! responses across several controllers.

use pretty_assertions::assert_eq;

use crate::common::harness::TestContext;
use snoopsim_core::coherence::{CacheLine, MesiState, MsiState};
use snoopsim_core::common::{CoherenceError, CpuRequest, PhysAddr, SimError};
use snoopsim_core::soc::StepOutcome;

const A: u64 = 0x100;
const B: u64 = 0x200;

// ══════════════════════════════════════════════════════════
// 1. Sharing
// ══════════════════════════════════════════════════════════

/// A second reader turns the first reader's E copy into S and fills S itself.
#[test]
fn second_reader_shares_exclusive_copy() {
    let mut tc = TestContext::<MesiState>::new(2).preload(A, 5);
    assert_eq!(tc.read(0, A), 5);
    assert_eq!(tc.state(0), MesiState::Exclusive);

    assert_eq!(tc.read(1, A), 5);
    assert_eq!(tc.state(0), MesiState::Shared);
    assert_eq!(tc.state(1), MesiState::Shared);
    assert_eq!(tc.system.holders(PhysAddr(A)), vec![0, 1]);
}

/// A reader of another address does not assert the shared signal.
#[test]
fn unrelated_holder_does_not_share() {
    let mut tc = TestContext::<MesiState>::new(2);
    let _ = tc.read(0, B);
    let _ = tc.read(1, A);
    assert_eq!(tc.state(1), MesiState::Exclusive);
}

/// A write invalidates every other copy.
#[test]
fn write_invalidates_all_sharers() {
    let mut tc = TestContext::<MsiState>::new(3).preload(A, 1);
    for cache in 0..3 {
        assert_eq!(tc.read(cache, A), 1);
    }
    tc.write(2, A, 4);
    assert_eq!(tc.system.holders(PhysAddr(A)), vec![2]);
    assert_eq!(tc.state(2), MsiState::Modified);
    assert_eq!(tc.cache(0).stats().invalidations, 1);
    assert_eq!(tc.cache(1).stats().invalidations, 1);
}

/// The upgrade's write transaction also reaches memory.
#[test]
fn upgrade_commits_value_to_memory() {
    let mut tc = TestContext::<MesiState>::new(2).preload(A, 1);
    let _ = tc.read(0, A);
    let _ = tc.read(1, A);
    tc.write(0, A, 8);
    assert_eq!(tc.state(0), MesiState::Modified);
    assert_eq!(tc.state(1), MesiState::Invalid);
    assert_eq!(tc.system.memory().peek(PhysAddr(A)), 8);
    assert_eq!(tc.cache(0).stats().upgrades, 1);
}

// ══════════════════════════════════════════════════════════
// 2. Writebacks
// ══════════════════════════════════════════════════════════

/// The owner's writeback lands before memory services the reader.
#[test]
fn msi_dirty_owner_writes_back_before_read_is_serviced() {
    let mut tc = TestContext::<MsiState>::new(2);
    tc.write(0, A, 7);
    // A silent M write leaves memory stale.
    tc.write(0, A, 9);
    assert_eq!(tc.system.memory().peek(PhysAddr(A)), 7);

    assert_eq!(tc.read(1, A), 9);
    assert_eq!(tc.state(0), MsiState::Invalid);
    assert_eq!(tc.state(1), MsiState::Shared);
    assert_eq!(tc.system.memory().peek(PhysAddr(A)), 9);
    assert_eq!(tc.system.memory().stats().writebacks, 1);
}

#[test]
fn mesi_dirty_owner_downgrades_on_read() {
    let mut tc = TestContext::<MesiState>::new(2);
    tc.write(0, A, 7);
    tc.write(0, A, 9);
    assert_eq!(tc.read(1, A), 9);
    assert_eq!(tc.state(0), MesiState::Shared);
    assert_eq!(tc.state(1), MesiState::Shared);
    assert!(!tc.cache(0).line().dirty);
}

/// A write-miss line matches memory but still writes back on eviction.
#[test]
fn write_miss_line_is_dirty_and_matches_memory() {
    let mut tc = TestContext::<MsiState>::new(1);
    tc.write(0, A, 5);
    assert!(tc.cache(0).line().dirty);
    assert_eq!(tc.system.memory().peek(PhysAddr(A)), 5);

    let _ = tc.read(0, B);
    assert_eq!(tc.system.memory().stats().writebacks, 1);
    assert_eq!(tc.system.memory().peek(PhysAddr(A)), 5);
}

/// Replacing a dirty line writes it back, so another cache can read it.
#[test]
fn replacement_writeback_is_visible() {
    let mut tc = TestContext::<MesiState>::new(2);
    tc.write(0, A, 3);
    tc.write(0, A, 4);
    let _ = tc.read(0, B);
    assert_eq!(tc.system.memory().peek(PhysAddr(A)), 4);
    assert_eq!(tc.read(1, A), 4);
    assert_eq!(tc.state(1), MesiState::Exclusive);
}

// ══════════════════════════════════════════════════════════
// 3. Serialization
// ══════════════════════════════════════════════════════════

/// Two misses are granted and completed one after another.
#[test]
fn concurrent_misses_are_serialized() {
    let mut tc = TestContext::<MesiState>::new(2).preload(A, 6);
    let first = CpuRequest::read(1, PhysAddr(A));
    let second = CpuRequest::read(2, PhysAddr(A));
    assert_eq!(tc.system.submit(0, first).ok(), Some(None));
    assert_eq!(tc.system.submit(1, second).ok(), Some(None));
    assert_eq!(tc.system.bus().waiting().collect::<Vec<_>>(), vec![0, 1]);

    assert_eq!(tc.system.step().ok(), Some(StepOutcome::Granted(0)));
    assert!(matches!(
        tc.system.step(),
        Ok(StepOutcome::Completed { cache: 0, .. })
    ));
    assert_eq!(tc.system.step().ok(), Some(StepOutcome::Granted(1)));
    assert!(matches!(
        tc.system.step(),
        Ok(StepOutcome::Completed { cache: 1, .. })
    ));
    assert_eq!(tc.system.step().ok(), Some(StepOutcome::Idle));
    assert!(tc.system.is_idle());
    assert_eq!(tc.state(0), MesiState::Shared);
    assert_eq!(tc.state(1), MesiState::Shared);
}

/// The bus stays owned until the response has been delivered.
#[test]
fn bus_held_until_response_delivered() {
    let mut tc = TestContext::<MsiState>::new(2);
    let req = CpuRequest::write(1, PhysAddr(A), 2);
    assert!(tc.system.submit(0, req).is_ok());
    assert_eq!(tc.system.step().ok(), Some(StepOutcome::Granted(0)));
    assert_eq!(tc.system.bus().owner(), Some(0));
    assert!(!tc.system.is_idle());

    assert!(tc.system.step().is_ok());
    assert_eq!(tc.system.bus().owner(), None);
    assert!(tc.system.is_idle());
}

#[test]
fn blocked_cache_rejects_submit() {
    let mut tc = TestContext::<MsiState>::new(2);
    let req = CpuRequest::read(1, PhysAddr(A));
    assert!(tc.system.submit(0, req).is_ok());
    assert!(matches!(
        tc.system.submit(0, CpuRequest::read(2, PhysAddr(B))),
        Err(SimError::Coherence(CoherenceError::Blocked { cache: 0, .. }))
    ));
    assert_eq!(tc.system.blocked_caches(), vec![0]);
}

#[test]
fn unknown_cache_is_rejected() {
    let mut tc = TestContext::<MsiState>::new(2);
    assert!(matches!(
        tc.system.submit(5, CpuRequest::read(1, PhysAddr(A))),
        Err(SimError::UnknownCache { cache: 5 })
    ));
}

// ══════════════════════════════════════════════════════════
// 4. Ownership checks
// ══════════════════════════════════════════════════════════

#[test]
fn owner_with_other_copy_is_a_conflict() {
    let tc = TestContext::<MesiState>::with_lines(vec![
        CacheLine::new(MesiState::Exclusive, PhysAddr(A), 1),
        CacheLine::new(MesiState::Shared, PhysAddr(A), 1),
    ]);
    assert!(matches!(
        tc.system.check_coherence(),
        Err(SimError::OwnershipConflict {
            owner: 0,
            other: 1,
            ..
        })
    ));
}

/// The conflict is reported on the first event when checking is enabled.
#[test]
fn conflict_is_caught_on_next_event() {
    let mut tc = TestContext::<MsiState>::with_lines(vec![
        CacheLine::new(MsiState::Shared, PhysAddr(A), 1),
        CacheLine::new(MsiState::Modified, PhysAddr(A), 2),
    ]);
    assert!(matches!(
        tc.system.submit(0, CpuRequest::read(1, PhysAddr(A))),
        Err(SimError::OwnershipConflict {
            owner: 1,
            other: 0,
            ..
        })
    ));
}

#[test]
fn sharers_of_one_address_are_coherent() {
    let tc = TestContext::<MsiState>::with_lines(vec![
        CacheLine::new(MsiState::Shared, PhysAddr(A), 1),
        CacheLine::new(MsiState::Shared, PhysAddr(A), 1),
        CacheLine::new(MsiState::Modified, PhysAddr(B), 2),
    ]);
    assert!(tc.system.check_coherence().is_ok());
}

// ══════════════════════════════════════════════════════════
// 5. Counters
// ══════════════════════════════════════════════════════════

#[test]
fn system_has_one_controller_per_configured_cache() {
    let tc = TestContext::<MsiState>::new(3);
    assert_eq!(tc.system.len(), 3);
    assert!(!tc.system.is_empty());
    assert!(tc.system.cache(2).is_some());
    assert!(tc.system.cache(3).is_none());
}

#[test]
fn traffic_counters_follow_transactions() {
    let mut tc = TestContext::<MesiState>::new(3);
    let _ = tc.read(0, A);
    tc.write(1, A, 2);

    let stats = tc.system.stats();
    assert_eq!(stats.protocol, "MESI");
    assert_eq!(stats.cpu_requests, 2);
    assert_eq!(stats.bus.grants, 2);
    assert_eq!(stats.bus.mem_reads, 1);
    assert_eq!(stats.bus.mem_writes, 1);
    assert_eq!(stats.bus.snoops, 4);
    assert_eq!(stats.bus_events, 4);
    assert_eq!(stats.caches[0].invalidations, 1);
}
