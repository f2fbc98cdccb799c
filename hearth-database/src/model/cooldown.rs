use serde::{Deserialize, Serialize};

/// Stored at `cooldown:<user_id>:<command>`; the last granted invocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CooldownRecord {
    pub last_invoked_ms: u64,
}
