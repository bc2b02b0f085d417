//! Configuration system for the coherence simulator.
//!
//! This module defines all configuration structures and enums used to
//! parameterize a simulated system. It provides:
//! 1. **Defaults:** Baseline values for the protocol, system size and memory contents.
//! 2. **Structures:** Hierarchical config for general, system and memory settings.
//! 3. **Enums:** Coherence protocol and bus arbitration policy.
//!
//! Configuration is read from JSON (see [`crate::sim::loader::load_config`]) or
//! built with `Config::default()`. Every field may be omitted.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Default configuration constants for the simulator.
mod defaults {
    /// Number of coherence controllers sharing the bus.
    pub const NUM_CACHES: usize = 2;

    /// Value returned by memory for addresses never written.
    pub const FILL_VALUE: u8 = 0;

    /// Run the per-event invariant checks unless told otherwise.
    pub const CHECK_INVARIANTS: bool = true;
}

/// Coherence protocol run by every controller in the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Protocol {
    /// Modified / Shared / Invalid.
    #[serde(alias = "Msi", alias = "msi")]
    Msi,
    /// Modified / Exclusive / Shared / Invalid.
    #[default]
    #[serde(alias = "Mesi", alias = "mesi")]
    Mesi,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Msi => f.write_str("MSI"),
            Self::Mesi => f.write_str("MESI"),
        }
    }
}

impl FromStr for Protocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "msi" => Ok(Self::Msi),
            "mesi" => Ok(Self::Mesi),
            other => Err(format!("unknown protocol `{other}` (expected msi or mesi)")),
        }
    }
}

/// Order in which queued bus requests are granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum Arbitration {
    /// Grant in the order requests were made.
    #[default]
    Fifo,
    /// Grant the lowest-numbered waiting cache after the previous owner.
    RoundRobin,
}

/// Root configuration structure.
///
/// # Examples
///
/// Creating a default configuration:
///
/// ```
/// use snoopsim_core::config::{Config, Protocol};
///
/// let config = Config::default();
/// assert_eq!(config.system.protocol, Protocol::Mesi);
/// assert_eq!(config.system.num_caches, 2);
/// assert!(config.general.check_invariants);
/// ```
///
/// Deserializing from JSON:
///
/// ```
/// use snoopsim_core::config::{Arbitration, Config, Protocol};
///
/// let json = r#"{
///     "general": { "trace_events": true },
///     "system": {
///         "protocol": "MSI",
///         "num_caches": 4,
///         "arbitration": "RoundRobin"
///     },
///     "memory": { "fill_value": 255 }
/// }"#;
///
/// let config: Config = serde_json::from_str(json).unwrap();
/// assert!(config.general.trace_events);
/// assert_eq!(config.system.protocol, Protocol::Msi);
/// assert_eq!(config.system.num_caches, 4);
/// assert_eq!(config.system.arbitration, Arbitration::RoundRobin);
/// assert_eq!(config.memory.fill_value, 255);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// General simulation settings
    #[serde(default)]
    pub general: GeneralConfig,
    /// Protocol, cache count and bus arbitration
    #[serde(default)]
    pub system: SystemConfig,
    /// Backing memory settings
    #[serde(default)]
    pub memory: MemoryConfig,
}

/// General simulation settings and options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Emit per-transition debug events.
    #[serde(default)]
    pub trace_events: bool,

    /// Check line invariants and single ownership after every event.
    #[serde(default = "GeneralConfig::default_check_invariants")]
    pub check_invariants: bool,
}

impl GeneralConfig {
    /// Returns the default invariant checking mode.
    const fn default_check_invariants() -> bool {
        defaults::CHECK_INVARIANTS
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            trace_events: false,
            check_invariants: defaults::CHECK_INVARIANTS,
        }
    }
}

/// Controllers and the bus connecting them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemConfig {
    /// Coherence protocol
    #[serde(default)]
    pub protocol: Protocol,

    /// Number of controllers on the bus
    #[serde(default = "SystemConfig::default_num_caches")]
    pub num_caches: usize,

    /// Bus arbitration policy
    #[serde(default)]
    pub arbitration: Arbitration,
}

impl SystemConfig {
    /// Returns the default controller count.
    const fn default_num_caches() -> usize {
        defaults::NUM_CACHES
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            protocol: Protocol::default(),
            num_caches: defaults::NUM_CACHES,
            arbitration: Arbitration::default(),
        }
    }
}

/// Backing memory configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Value of every byte that has never been written
    #[serde(default = "MemoryConfig::default_fill_value")]
    pub fill_value: u8,
}

impl MemoryConfig {
    /// Returns the default fill value.
    const fn default_fill_value() -> u8 {
        defaults::FILL_VALUE
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            fill_value: defaults::FILL_VALUE,
        }
    }
}
