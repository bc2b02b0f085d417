/// Bus arbitration.
pub mod arbitration;



/// Snoop ordering, shared signal and ownership checks.
pub mod system;
