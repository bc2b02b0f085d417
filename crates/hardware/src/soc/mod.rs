//! Shared bus, backing memory and the system that ties controllers to them.
//!
//! This module organizes the components surrounding the coherence
//! controllers: the serializing snooping bus, the memory behind it, and the
//! orchestrator that delivers grants, snoops and responses in order.

/// Serializing bus arbitration.
pub mod interconnect;

/// Backing memory.
pub mod memory;

/// The bus orchestrator owning every controller.
pub mod system;

pub use interconnect::SnoopBus;
pub use memory::BackingMemory;
pub use system::{StepOutcome, System};
