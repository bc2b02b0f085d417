//! Bus Arbitration Tests.
//!
//! Verifies grant order under both policies and the ownership rules of
//! `SnoopBus`.

use pretty_assertions::assert_eq;

use snoopsim_core::common::BusError;
use snoopsim_core::config::Arbitration;
use snoopsim_core::soc::SnoopBus;

fn grant_and_release(bus: &mut SnoopBus) -> Option<usize> {
    let owner = bus.arbitrate()?;
    bus.release(owner).expect("owner releases");
    Some(owner)
}

#[test]
fn fifo_grants_in_request_order() {
    let mut bus = SnoopBus::new(Arbitration::Fifo);
    for cache in [2, 0, 1] {
        bus.request(cache).expect("first request");
    }
    let order: Vec<usize> = std::iter::from_fn(|| grant_and_release(&mut bus)).collect();
    assert_eq!(order, vec![2, 0, 1]);
    assert!(bus.is_idle());
    assert_eq!(bus.stats().grants, 3);
}

/// Round-robin starts after the previous owner and wraps around.
#[test]
fn round_robin_rotates_after_last_owner() {
    let mut bus = SnoopBus::new(Arbitration::RoundRobin);
    bus.request(1).expect("request");
    assert_eq!(grant_and_release(&mut bus), Some(1));

    for cache in [0, 3, 2] {
        bus.request(cache).expect("request");
    }
    let order: Vec<usize> = std::iter::from_fn(|| grant_and_release(&mut bus)).collect();
    assert_eq!(order, vec![2, 3, 0]);
}

#[test]
fn round_robin_without_history_picks_lowest() {
    let mut bus = SnoopBus::new(Arbitration::RoundRobin);
    for cache in [3, 1, 2] {
        bus.request(cache).expect("request");
    }
    assert_eq!(bus.arbitrate(), Some(1));
}

/// Nothing is granted while the bus has an owner.
#[test]
fn busy_bus_grants_nothing() {
    let mut bus = SnoopBus::new(Arbitration::Fifo);
    bus.request(0).expect("request");
    bus.request(1).expect("request");
    assert_eq!(bus.arbitrate(), Some(0));
    assert_eq!(bus.arbitrate(), None);
    assert_eq!(bus.owner(), Some(0));
    assert_eq!(bus.waiting().collect::<Vec<_>>(), vec![1]);
}

#[test]
fn idle_bus_grants_nothing() {
    let mut bus = SnoopBus::new(Arbitration::Fifo);
    assert_eq!(bus.arbitrate(), None);
    assert_eq!(bus.stats().grants, 0);
}

#[test]
fn duplicate_request_is_rejected() {
    let mut bus = SnoopBus::new(Arbitration::Fifo);
    bus.request(0).expect("request");
    assert_eq!(bus.request(0), Err(BusError::DuplicateRequest { cache: 0 }));

    assert_eq!(bus.arbitrate(), Some(0));
    assert_eq!(bus.request(0), Err(BusError::DuplicateRequest { cache: 0 }));
}

#[test]
fn release_by_non_owner_is_rejected() {
    let mut bus = SnoopBus::new(Arbitration::Fifo);
    assert_eq!(
        bus.release(1),
        Err(BusError::NotOwner {
            cache: 1,
            owner: None,
        })
    );

    bus.request(0).expect("request");
    assert_eq!(bus.arbitrate(), Some(0));
    assert_eq!(
        bus.release(1),
        Err(BusError::NotOwner {
            cache: 1,
            owner: Some(0),
        })
    );
}
