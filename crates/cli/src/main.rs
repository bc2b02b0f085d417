//! Snooping coherence simulator CLI.
//!
//! This binary runs a JSON workload on a system of MSI or MESI controllers.
//! It performs:
//! 1. **Configuration:** Built-in defaults, optionally a JSON config file, then flag overrides.
//! 2. **Logging:** `tracing-subscriber` honoring `RUST_LOG`; `--trace` enables debug events.
//! 3. **Run:** Drives the workload to completion and prints statistics as text or JSON.

use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use snoopsim_core::coherence::{CoherenceState, MesiState, MsiState};
use snoopsim_core::common::SimError;
use snoopsim_core::config::{Config, Protocol};
use snoopsim_core::sim::{RunReport, Simulator, Workload, loader};

#[derive(Parser, Debug)]
#[command(
    name = "snoopsim",
    author,
    version,
    about = "Snooping MSI/MESI cache-coherence simulator",
    long_about = "Run a workload of per-core loads and stores on single-line coherence controllers sharing a serializing snooping bus.\n\nExamples:\n  snoopsim run -w demos/ping_pong.json\n  snoopsim run -w demos/ping_pong.json --protocol msi --json\n  snoopsim run -w trace.json -c config.json --trace"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a workload and print statistics.
    Run {
        /// Workload JSON file.
        #[arg(short, long)]
        workload: String,

        /// Configuration JSON file (defaults are used for missing fields).
        #[arg(short, long)]
        config: Option<String>,

        /// Coherence protocol (overrides the config file).
        #[arg(long)]
        protocol: Option<Protocol>,

        /// Number of caches (overrides the config file; defaults to the workload's core count).
        #[arg(long)]
        caches: Option<usize>,

        /// Emit per-transition debug events.
        #[arg(long)]
        trace: bool,

        /// Print the report as JSON instead of text.
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Run {
            workload,
            config,
            protocol,
            caches,
            trace,
            json,
        }) => {
            if let Err(e) = cmd_run(&workload, config.as_deref(), protocol, caches, trace, json) {
                eprintln!("\n[!] FATAL: {e}");
                process::exit(1);
            }
        }
        None => {
            eprintln!("Snooping coherence simulator: pass a subcommand");
            eprintln!();
            eprintln!("  snoopsim run -w <workload.json>   Run a workload");
            eprintln!();
            eprintln!("  snoopsim --help  for full options");
            process::exit(1);
        }
    }
}

/// Loads configuration and workload, runs the simulation and reports.
fn cmd_run(
    workload_path: &str,
    config_path: Option<&str>,
    protocol: Option<Protocol>,
    caches: Option<usize>,
    trace: bool,
    json: bool,
) -> Result<(), SimError> {
    let mut config = match config_path {
        Some(path) => loader::load_config(path)?,
        None => Config::default(),
    };
    let workload = loader::load_workload(workload_path)?;

    if let Some(protocol) = protocol {
        config.system.protocol = protocol;
    }
    if let Some(caches) = caches {
        config.system.num_caches = caches;
    } else if config_path.is_none() {
        config.system.num_caches = workload.cores.len().max(1);
    }
    config.general.trace_events |= trace;
    init_tracing(config.general.trace_events);

    if !json {
        println!(
            "Configuration: {} x{}  arbitration={:?}  checks={}",
            config.system.protocol,
            config.system.num_caches,
            config.system.arbitration,
            config.general.check_invariants
        );
        println!(
            "[*] Workload: {} ({} accesses on {} cores)",
            workload_path,
            workload.len(),
            workload.cores.len()
        );
    }

    let report = match config.system.protocol {
        Protocol::Msi => run::<MsiState>(&config, workload)?,
        Protocol::Mesi => run::<MesiState>(&config, workload)?,
    };

    if json {
        println!("{}", report.to_json()?);
    } else {
        for (core, reads) in report.reads.iter().enumerate() {
            let values: Vec<String> = reads
                .iter()
                .map(|r| format!("{}={}", r.addr, r.value))
                .collect();
            println!("  core {core} reads: [{}]", values.join(", "));
        }
        report.stats.print();
    }
    Ok(())
}

fn run<S: CoherenceState>(config: &Config, workload: Workload) -> Result<RunReport, SimError> {
    Simulator::<S>::new(config, workload)?.run()
}

/// Installs the global subscriber; `RUST_LOG` wins over the `verbose` default.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
