//! Common types used throughout the coherence simulator.
//!
//! This module provides the vocabulary shared by the controllers, the bus and
//! the simulation driver. It includes:
//! 1. **Address Types:** A strong type for bus addresses.
//! 2. **Memory Access:** The read/write classification of every transaction.
//! 3. **Packets:** Processor, memory and snoop request/response types.
//! 4. **Error Handling:** Controller, bus and simulation error types.

/// Address type definitions.
pub mod addr;

/// Memory access type definitions.
pub mod data;

/// Error types.
pub mod error;

/// Request and response packets.
pub mod packet;

pub use addr::PhysAddr;
pub use data::AccessType;
pub use error::{BusError, CoherenceError, SimError};
pub use packet::{
    CacheId, CpuOp, CpuRequest, CpuResponse, CpuResponseKind, MemRequest, MemResponse,
    MemResponseKind, SnoopRequest,
};
