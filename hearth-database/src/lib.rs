pub mod clock;
pub mod database;
pub mod impls;
pub mod kv;
pub mod model;

pub use clock::Clock;
pub use database::Database;
pub use impls::cooldown::{CooldownDecision, CooldownTracker};
pub use impls::prefix::{PrefixError, PrefixStore};
pub use kv::{KvService, MemoryKvStore};
