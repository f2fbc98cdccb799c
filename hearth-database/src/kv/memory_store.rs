use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Expired entries are swept from the map once per this many writes.
const SWEEP_EVERY_WRITES: u64 = 64;

#[derive(Debug)]
struct MemoryEntry {
    value: Vec<u8>,
    expires_at: Option<Instant>,
}

impl MemoryEntry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|deadline| deadline > now)
    }
}

#[derive(Debug, Default)]
struct MemoryInner {
    entries: Mutex<HashMap<String, MemoryEntry>>,
    offline: AtomicBool,
    writes: AtomicU64,
}

/// Process-local store used when Redis is disabled and as the test double.
///
/// Clones share the same map. The lock is only held for the duration of a
/// single map operation.
#[derive(Clone, Debug, Default)]
pub struct MemoryKvStore {
    inner: Arc<MemoryInner>,
}

impl MemoryKvStore {
    /// Simulate an unreachable backend: every operation fails while set.
    pub fn set_offline(&self, offline: bool) {
        self.inner.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of successful writes since creation.
    pub fn write_count(&self) -> u64 {
        self.inner.writes.load(Ordering::SeqCst)
    }

    fn entries(&self) -> anyhow::Result<MutexGuard<'_, HashMap<String, MemoryEntry>>> {
        if self.inner.offline.load(Ordering::SeqCst) {
            anyhow::bail!("memory store is offline");
        }

        self.inner
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))
    }

    fn record_write(&self, entries: &mut HashMap<String, MemoryEntry>, now: Instant) {
        let writes = self.inner.writes.fetch_add(1, Ordering::SeqCst) + 1;
        if writes % SWEEP_EVERY_WRITES == 0 {
            entries.retain(|_, entry| entry.is_live(now));
        }
    }

    pub async fn get(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>> {
        let now = Instant::now();
        let mut entries = self.entries()?;

        match entries.get(key) {
            Some(entry) if entry.is_live(now) => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    pub async fn set(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl_seconds: Option<u64>,
    ) -> anyhow::Result<()> {
        let now = Instant::now();
        let expires_at = ttl_seconds.map(|secs| now + Duration::from_secs(secs));
        let mut entries = self.entries()?;

        entries.insert(key.to_owned(), MemoryEntry { value, expires_at });
        self.record_write(&mut entries, now);
        Ok(())
    }

    pub async fn set_nx(&self, key: &str, value: Vec<u8>) -> anyhow::Result<bool> {
        let now = Instant::now();
        let mut entries = self.entries()?;

        if entries.get(key).is_some_and(|entry| entry.is_live(now)) {
            return Ok(false);
        }

        entries.insert(
            key.to_owned(),
            MemoryEntry {
                value,
                expires_at: None,
            },
        );
        self.record_write(&mut entries, now);
        Ok(true)
    }

    pub async fn exists(&self, key: &str) -> anyhow::Result<bool> {
        let now = Instant::now();
        Ok(self
            .entries()?
            .get(key)
            .is_some_and(|entry| entry.is_live(now)))
    }

    pub async fn ping(&self) -> anyhow::Result<()> {
        self.entries().map(|_| ())
    }
}
