use mockall::mock;
use snoopsim_core::coherence::BusPort;
use snoopsim_core::common::{CacheId, MemRequest, PhysAddr};

mock! {
    pub Bus {}
    impl BusPort for Bus {
        fn request(&mut self, cache: CacheId);
        fn release(&mut self, cache: CacheId);
        fn send_mem_req(&mut self, req: MemRequest);
        fn send_writeback(&mut self, cache: CacheId, addr: PhysAddr, value: u8);
        fn is_shared(&self, addr: PhysAddr) -> bool;
    }
}

/// A bus port that panics on any call.
///
/// Handing this to a controller asserts that the event causes no bus traffic.
pub fn silent_bus() -> MockBus {
    MockBus::new()
}
