use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use hearth_utils::time::now_unix_millis;

/// Source of wall-clock time for cooldown bookkeeping.
///
/// `Manual` exists so that cooldown windows can be exercised without
/// sleeping; it only moves when [`Clock::advance`] is called.
#[derive(Clone, Debug, Default)]
pub enum Clock {
    #[default]
    System,
    Manual(Arc<AtomicU64>),
}

impl Clock {
    pub fn manual(start_millis: u64) -> Self {
        Self::Manual(Arc::new(AtomicU64::new(start_millis)))
    }

    pub fn now_millis(&self) -> u64 {
        match self {
            Self::System => now_unix_millis(),
            Self::Manual(millis) => millis.load(Ordering::SeqCst),
        }
    }

    /// Move a manual clock forward. No-op for the system clock.
    pub fn advance(&self, by: Duration) {
        if let Self::Manual(millis) = self {
            let by = u64::try_from(by.as_millis()).unwrap_or(u64::MAX);
            millis.fetch_add(by, Ordering::SeqCst);
        }
    }
}
