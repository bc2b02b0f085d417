//! # Configuration Tests
//!
//! Defaults, deserialization and the protocol name parsing used by the CLI.

use pretty_assertions::assert_eq;
use snoopsim_core::config::*;

#[test]
fn test_config_default() {
    let config = Config::default();
    assert!(!config.general.trace_events);
    assert!(config.general.check_invariants);
    assert_eq!(config.system.protocol, Protocol::Mesi);
    assert_eq!(config.system.num_caches, 2);
    assert_eq!(config.system.arbitration, Arbitration::Fifo);
    assert_eq!(config.memory.fill_value, 0);
}

#[test]
fn test_empty_json_uses_defaults() {
    let config: Config = serde_json::from_str("{}").expect("empty config");
    assert_eq!(config, Config::default());
}

#[test]
fn test_partial_section_keeps_other_defaults() {
    let json = r#"{ "general": { "check_invariants": false } }"#;
    let config: Config = serde_json::from_str(json).expect("config");
    assert!(!config.general.check_invariants);
    assert!(!config.general.trace_events);
    assert_eq!(config.system, SystemConfig::default());
}

#[test]
fn test_protocol_accepts_either_case() {
    for name in ["MSI", "msi", "Msi"] {
        let json = format!("\"{name}\"");
        let parsed: Protocol = serde_json::from_str(&json).expect("protocol");
        assert_eq!(parsed, Protocol::Msi);
    }
}

#[test]
fn test_protocol_from_str() {
    assert_eq!("mesi".parse::<Protocol>(), Ok(Protocol::Mesi));
    assert_eq!("MSI".parse::<Protocol>(), Ok(Protocol::Msi));
    assert!("moesi".parse::<Protocol>().is_err());
}

#[test]
fn test_protocol_display() {
    assert_eq!(Protocol::Msi.to_string(), "MSI");
    assert_eq!(Protocol::Mesi.to_string(), "MESI");
}

#[test]
fn test_unknown_arbitration_is_rejected() {
    let result: Result<Config, _> =
        serde_json::from_str(r#"{ "system": { "arbitration": "Lottery" } }"#);
    assert!(result.is_err());
}

#[test]
fn test_config_round_trips_through_json() {
    let mut config = Config::default();
    config.system.protocol = Protocol::Msi;
    config.system.arbitration = Arbitration::RoundRobin;
    config.memory.fill_value = 0xAA;
    let json = serde_json::to_string(&config).expect("serialize");
    let parsed: Config = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(parsed, config);
}
