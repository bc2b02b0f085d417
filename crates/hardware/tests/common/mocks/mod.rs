//! Mock collaborators.

/// Mock bus port.
pub mod bus;
