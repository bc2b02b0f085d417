//! Workload description: per-core access streams and initial memory contents.
//!
//! Workloads are JSON documents:
//!
//! ```json
//! {
//!     "memory": [ { "addr": 256, "value": 5 } ],
//!     "cores": [
//!         [ { "op": "read", "addr": 256 }, { "op": "write", "addr": 256, "value": 7 } ],
//!         [ { "op": "read", "addr": 256 } ]
//!     ]
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::common::{CpuRequest, PhysAddr};

/// One processor access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Access {
    /// Load a byte.
    Read {
        /// Target address.
        addr: PhysAddr,
    },
    /// Store a byte.
    Write {
        /// Target address.
        addr: PhysAddr,
        /// Value stored.
        value: u8,
    },
}

impl Access {
    /// Target address.
    pub const fn addr(&self) -> PhysAddr {
        match *self {
            Self::Read { addr } | Self::Write { addr, .. } => addr,
        }
    }

    /// The processor request performing this access.
    pub const fn request(&self, id: u64) -> CpuRequest {
        match *self {
            Self::Read { addr } => CpuRequest::read(id, addr),
            Self::Write { addr, value } => CpuRequest::write(id, addr, value),
        }
    }
}

/// Initial value of one memory byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryInit {
    /// Address.
    pub addr: PhysAddr,
    /// Value.
    pub value: u8,
}

/// A complete workload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workload {
    /// Memory contents before the run.
    #[serde(default)]
    pub memory: Vec<MemoryInit>,
    /// Access stream of each core; core `i` drives cache `i`.
    pub cores: Vec<Vec<Access>>,
}

impl Workload {
    /// Total number of accesses across all cores.
    pub fn len(&self) -> usize {
        self.cores.iter().map(Vec::len).sum()
    }

    /// Whether no core has any access.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
