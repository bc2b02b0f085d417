//! Shared test infrastructure.


/// Mock implementations of controller collaborators.
pub mod mocks;
