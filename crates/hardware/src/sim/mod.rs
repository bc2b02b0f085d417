//! Workloads, loading and the simulation driver.
//!
//! Provides the JSON workload format, file loading for workloads and
//! configuration, and the simulator that runs a workload against a system.

/// Workload and configuration loading.
pub mod loader;

/// Workload driver.
pub mod simulator;

/// Workload format.
pub mod workload;

pub use simulator::{ReadRecord, RunReport, Simulator};
pub use workload::{Access, MemoryInit, Workload};
