
/// Randomized multi-core workloads.
pub mod random_workloads;
