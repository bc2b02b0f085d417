//! Memory Access Types.
//!
//! This module defines the direction of every transaction that crosses a
//! coherence controller. The same classification is used for the following:
//! 1. **Processor requests:** Loads and stores issued by the local core.
//! 2. **Memory transactions:** The single read or write a controller issues per bus grant.
//! 3. **Snoops:** The other controllers' bus transactions observed on the shared bus.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Direction of a memory access.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessType {
    /// Data read access.
    ///
    /// A snooped read lets other caches keep clean copies; an owner downgrades.
    Read,

    /// Data write access.
    ///
    /// A snooped write invalidates every other copy of the line.
    Write,
}

impl fmt::Display for AccessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => f.write_str("read"),
            Self::Write => f.write_str("write"),
        }
    }
}
