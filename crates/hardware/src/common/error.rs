//! Error definitions.
//!
//! Coherence violations in this model are programming-logic failures, never
//! conditions to recover from, so every one of them surfaces as a typed error
//! that the caller propagates with `?` and reports. This module provides:
//! 1. **Controller faults:** [`CoherenceError`] for events a controller cannot legally accept.
//! 2. **Bus faults:** [`BusError`] for arbitration protocol misuse.
//! 3. **Simulation faults:** [`SimError`] for workload loading and system-wide invariant checks.

use std::io;

use thiserror::Error;

use super::addr::PhysAddr;
use super::data::AccessType;
use super::packet::CacheId;

/// A controller was handed an event that its current state forbids.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CoherenceError {
    /// A processor request arrived while a previous one is still outstanding.
    #[error("cache {cache} is blocked on request {pending} and cannot accept request {rejected}")]
    Blocked {
        /// Controller that rejected the request.
        cache: CacheId,
        /// Identifier of the outstanding request.
        pending: u64,
        /// Identifier of the rejected request.
        rejected: u64,
    },

    /// A bus grant arrived with no request waiting for one.
    #[error("cache {cache} received a bus grant with no request awaiting the bus")]
    UnexpectedGrant {
        /// Controller that received the grant.
        cache: CacheId,
    },

    /// A memory response arrived with no transaction outstanding.
    #[error("cache {cache} received a memory response for {addr} with no transaction outstanding")]
    UnexpectedResponse {
        /// Controller that received the response.
        cache: CacheId,
        /// Address carried by the response.
        addr: PhysAddr,
    },

    /// A memory response does not match the outstanding transaction.
    #[error(
        "cache {cache} expected a {expected_access} response for {expected} but received a {got_access} response for {got}"
    )]
    ResponseMismatch {
        /// Controller that received the response.
        cache: CacheId,
        /// Address of the outstanding transaction.
        expected: PhysAddr,
        /// Direction of the outstanding transaction.
        expected_access: AccessType,
        /// Address carried by the response.
        got: PhysAddr,
        /// Direction of the response.
        got_access: AccessType,
    },

    /// A line invariant does not hold.
    #[error("cache {cache} line invariant violated: {detail}")]
    Invariant {
        /// Controller whose line is inconsistent.
        cache: CacheId,
        /// Which invariant failed.
        detail: String,
    },
}

/// Misuse of the shared bus arbitration protocol.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum BusError {
    /// A controller requested the bus while already queued or owning it.
    #[error("cache {cache} requested the bus while a request is already outstanding")]
    DuplicateRequest {
        /// Offending controller.
        cache: CacheId,
    },

    /// A controller released a bus it does not own.
    #[error("cache {cache} released the bus but the owner is {owner:?}")]
    NotOwner {
        /// Offending controller.
        cache: CacheId,
        /// Actual owner, if any.
        owner: Option<CacheId>,
    },

    /// A snooping controller issued something other than a writeback.
    #[error("cache {cache} issued `{command}` while handling a snoop")]
    SnoopSideEffect {
        /// Offending controller.
        cache: CacheId,
        /// Name of the rejected command.
        command: &'static str,
    },

    /// A controller issued a memory request without owning the bus.
    #[error("cache {cache} issued a memory request without owning the bus")]
    NotGranted {
        /// Offending controller.
        cache: CacheId,
    },
}

/// Any failure while building or running a simulated system.
#[derive(Debug, Error)]
pub enum SimError {
    /// A controller rejected an event.
    #[error(transparent)]
    Coherence(#[from] CoherenceError),

    /// The bus protocol was violated.
    #[error(transparent)]
    Bus(#[from] BusError),

    /// Reading a workload or config file failed.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File being read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A workload or config file is not valid JSON for its schema.
    #[error("failed to parse {path}: {source}")]
    Parse {
        /// File being parsed.
        path: String,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// A run report could not be encoded as JSON.
    #[error("failed to encode report: {source}")]
    Encode {
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// The workload does not fit the configured system.
    #[error("workload drives {cores} cores but the system has {caches} caches")]
    CoreCountMismatch {
        /// Cores in the workload.
        cores: usize,
        /// Controllers in the system.
        caches: usize,
    },

    /// A controller index outside the system was addressed.
    #[error("no cache with id {cache}")]
    UnknownCache {
        /// Requested controller.
        cache: CacheId,
    },

    /// A controller completed a request its driver never issued.
    #[error("cache {cache} completed request {id} but no access was outstanding")]
    UnexpectedCompletion {
        /// Controller that completed.
        cache: CacheId,
        /// Identifier carried by the response.
        id: u64,
    },

    /// Two controllers hold conflicting copies of one address.
    #[error("ownership conflict at {addr}: owner cache {owner}, other valid copy in cache {other}")]
    OwnershipConflict {
        /// Contended address.
        addr: PhysAddr,
        /// Controller holding the line in an owner state.
        owner: CacheId,
        /// Another controller holding any valid copy.
        other: CacheId,
    },

    /// A load returned something other than the last committed store.
    #[error("cache {cache} read {got} from {addr}, expected {expected}")]
    StaleRead {
        /// Controller that served the load.
        cache: CacheId,
        /// Loaded address.
        addr: PhysAddr,
        /// Last committed value.
        expected: u8,
        /// Value returned.
        got: u8,
    },

    /// Controllers are blocked but the bus has nothing left to do.
    #[error("deadlock: caches {blocked:?} are blocked with the bus idle")]
    Deadlock {
        /// Controllers still waiting.
        blocked: Vec<CacheId>,
    },
}
