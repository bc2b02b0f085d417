//! Simulation statistics collection and reporting.
//!
//! This module tracks the coherence traffic of a simulated system. It provides:
//! 1. **Per-cache counters:** Hits, misses, upgrades, writebacks and snoop outcomes.
//! 2. **Bus counters:** Grants, memory transactions, snoop deliveries and writebacks.
//! 3. **Memory counters:** Reads, writes and writebacks serviced.
//! 4. **Reporting:** A plain-text report and `serde` serialization for JSON output.

use serde::Serialize;

/// Counters kept by one coherence controller.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Loads served from the line.
    pub read_hits: u64,
    /// Stores committed to the line without a bus transaction.
    pub write_hits: u64,
    /// Loads that needed a memory transaction.
    pub read_misses: u64,
    /// Stores that missed the line.
    pub write_misses: u64,
    /// Stores that hit a shared line and had to acquire the bus.
    pub upgrades: u64,
    /// Exclusive-to-modified transitions made without bus traffic.
    pub silent_upgrades: u64,
    /// Dirty lines written back (snoop-forced or on replacement).
    pub writebacks: u64,
    /// Snooped transactions that hit the line.
    pub snoop_hits: u64,
    /// Snoops that invalidated the line.
    pub invalidations: u64,
    /// Snoops that downgraded the line to shared.
    pub downgrades: u64,
}

impl CacheStats {
    /// Loads and stores served without a memory transaction.
    pub const fn hits(&self) -> u64 {
        self.read_hits + self.write_hits
    }

    /// Loads and stores that needed a memory transaction.
    pub const fn misses(&self) -> u64 {
        self.read_misses + self.write_misses + self.upgrades
    }

    /// Fraction of accesses served locally, or zero before any access.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits() + self.misses();
        if total == 0 {
            0.0
        } else {
            self.hits() as f64 / total as f64
        }
    }
}

/// Counters kept by the shared bus.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BusStats {
    /// Ownership grants issued.
    pub grants: u64,
    /// Read transactions carried.
    pub mem_reads: u64,
    /// Write transactions carried.
    pub mem_writes: u64,
    /// Snoops delivered (one per other controller per transaction).
    pub snoops: u64,
    /// Writebacks carried.
    pub writebacks: u64,
}

/// Counters kept by the backing memory.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MemoryStats {
    /// Read transactions serviced.
    pub reads: u64,
    /// Write transactions serviced.
    pub writes: u64,
    /// Writebacks absorbed.
    pub writebacks: u64,
}

/// Snapshot of every counter in a system.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SimStats {
    /// Protocol the system ran.
    pub protocol: String,
    /// Bus events (grants and response deliveries) processed.
    pub bus_events: u64,
    /// Processor requests accepted.
    pub cpu_requests: u64,
    /// Per-controller counters, indexed by cache id.
    pub caches: Vec<CacheStats>,
    /// Bus counters.
    pub bus: BusStats,
    /// Memory counters.
    pub memory: MemoryStats,
}

impl SimStats {
    /// Prints the statistics report to stdout.
    pub fn print(&self) {
        println!("\n==========================================================");
        println!("COHERENCE SIMULATION STATISTICS ({})", self.protocol);
        println!("==========================================================");
        println!("sim_cpu_requests         {}", self.cpu_requests);
        println!("sim_bus_events           {}", self.bus_events);
        println!("----------------------------------------------------------");
        println!("BUS");
        println!("  bus.grants             {}", self.bus.grants);
        println!("  bus.mem_reads          {}", self.bus.mem_reads);
        println!("  bus.mem_writes         {}", self.bus.mem_writes);
        println!("  bus.snoops             {}", self.bus.snoops);
        println!("  bus.writebacks         {}", self.bus.writebacks);
        println!("MEMORY");
        println!("  mem.reads              {}", self.memory.reads);
        println!("  mem.writes             {}", self.memory.writes);
        println!("  mem.writebacks         {}", self.memory.writebacks);
        for (id, cache) in self.caches.iter().enumerate() {
            println!("----------------------------------------------------------");
            println!("CACHE {id}");
            println!(
                "  hits                   {} ({:.2}%)",
                cache.hits(),
                cache.hit_rate() * 100.0
            );
            println!("    read_hits            {}", cache.read_hits);
            println!("    write_hits           {}", cache.write_hits);
            println!("  misses                 {}", cache.misses());
            println!("    read_misses          {}", cache.read_misses);
            println!("    write_misses         {}", cache.write_misses);
            println!("    upgrades             {}", cache.upgrades);
            println!("  silent_upgrades        {}", cache.silent_upgrades);
            println!("  writebacks             {}", cache.writebacks);
            println!("  snoop_hits             {}", cache.snoop_hits);
            println!("    invalidations        {}", cache.invalidations);
            println!("    downgrades           {}", cache.downgrades);
        }
        println!("==========================================================");
    }
}
