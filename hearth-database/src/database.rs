use crate::clock::Clock;
use crate::kv::KvService;

/// Shared storage handle passed across crates.
#[derive(Clone, Debug)]
pub struct Database {
    kv: KvService,
    clock: Clock,
}

impl Database {
    /// Create a storage handle over a key-value service using the system clock.
    pub fn new(kv: KvService) -> Self {
        Self {
            kv,
            clock: Clock::System,
        }
    }

    /// Create a storage handle with an explicit clock.
    pub fn with_clock(kv: KvService, clock: Clock) -> Self {
        Self { kv, clock }
    }

    /// Expose the key-value service for query modules.
    pub fn kv(&self) -> &KvService {
        &self.kv
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }
}
