//! Snooping cache-coherence simulator library.
//!
//! This crate models MSI and MESI coherence controllers, each owning a single
//! cache line, sharing a serializing snooping bus and a backing memory:
//! 1. **Coherence:** The per-line state machine, generic over the protocol's state set.
//! 2. **Interconnect:** Bus arbitration, backing memory and the orchestrator delivering grants,
//!    snoops and memory responses in order.
//! 3. **Simulation:** JSON workloads, configuration loading and a driver that checks every
//!    load against the last committed store.
//! 4. **Statistics:** Per-cache, bus and memory counters.

/// Coherence controllers and protocol state sets.
pub mod coherence;
/// Common types (addresses, access types, packets, errors).
pub mod common;
/// Simulator configuration (defaults, protocol and arbitration enums).
pub mod config;
/// Workload loading and the simulation driver.
pub mod sim;
/// Bus, memory and the multi-controller system.
pub mod soc;
/// Simulation statistics collection and reporting.
pub mod stats;

/// Generic coherence controller; see `MsiController` and `MesiController`.
pub use crate::coherence::{CoherenceController, MesiController, MsiController};
/// Root configuration type; use `Config::default()` or deserialize from JSON.
pub use crate::config::Config;
/// Workload driver.
pub use crate::sim::Simulator;
/// Multi-controller system; construct with `System::new`.
pub use crate::soc::System;
