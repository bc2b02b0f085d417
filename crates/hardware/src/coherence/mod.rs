//! Snooping cache-coherence controllers.
//!
//! This module holds the coherence core. It provides:
//! 1. **State sets:** MSI and MESI states and their transition rules.
//! 2. **Line storage:** The single tag/data/dirty/state slot a controller owns.
//! 3. **Bus port:** The contract through which a controller talks to the shared bus.
//! 4. **Controller:** The event handlers driving the line through the protocol.

/// Event handlers for one line slot.
pub mod controller;

/// Tag, data, dirty bit and state of the line slot.
pub mod line;

/// Bus port trait and a queueing implementation.
pub mod port;

/// MSI and MESI state sets.
pub mod state;

pub use controller::{CoherenceController, MesiController, MsiController, Pending, PendingPhase};
pub use line::CacheLine;
pub use port::{BusCommand, BusPort, CommandQueue};
pub use state::{CoherenceState, MesiState, MsiState, SnoopAction, WriteHit};
