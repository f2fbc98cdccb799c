mod memory_store;
mod redis_store;

use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

pub use memory_store::MemoryKvStore;
use redis_store::RedisKvStore;

#[derive(Clone, Debug)]
enum KvBackend {
    Memory(MemoryKvStore),
    Redis(RedisKvStore),
}

/// Atomic single-key string store shared by the prefix and cooldown state.
///
/// Keys are namespaced with an optional prefix so several deployments can
/// share one Redis instance.
#[derive(Clone, Debug)]
pub struct KvService {
    key_prefix: String,
    backend: KvBackend,
}

impl KvService {
    pub fn memory(prefix: impl Into<String>) -> Self {
        Self::with_memory_store(MemoryKvStore::default(), prefix)
    }

    /// Wrap an existing in-memory store, keeping a handle for inspection.
    pub fn with_memory_store(store: MemoryKvStore, prefix: impl Into<String>) -> Self {
        Self {
            key_prefix: prefix.into(),
            backend: KvBackend::Memory(store),
        }
    }

    pub fn redis(redis_url: &str, prefix: impl Into<String>) -> anyhow::Result<Self> {
        Ok(Self {
            key_prefix: prefix.into(),
            backend: KvBackend::Redis(RedisKvStore::from_url(redis_url)?),
        })
    }

    pub fn is_redis_enabled(&self) -> bool {
        matches!(self.backend, KvBackend::Redis(_))
    }

    pub fn key(&self, suffix: impl AsRef<str>) -> String {
        if self.key_prefix.is_empty() {
            suffix.as_ref().to_owned()
        } else {
            format!("{}:{}", self.key_prefix, suffix.as_ref())
        }
    }

    pub async fn get_string(&self, key: &str) -> anyhow::Result<Option<String>> {
        let value = match &self.backend {
            KvBackend::Memory(store) => store.get(key).await,
            KvBackend::Redis(store) => store.get(key).await,
        }?;

        value
            .map(|bytes| {
                String::from_utf8(bytes)
                    .map_err(|e| anyhow::anyhow!("non-utf8 value stored at `{key}`: {e}"))
            })
            .transpose()
    }

    pub async fn set_string(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let payload = value.as_bytes().to_vec();

        match &self.backend {
            KvBackend::Memory(store) => store.set(key, payload, None).await,
            KvBackend::Redis(store) => store.set(key, payload).await,
        }
    }

    /// Store `value` only when `key` is unset. Returns whether this call wrote it.
    pub async fn set_string_if_absent(&self, key: &str, value: &str) -> anyhow::Result<bool> {
        let payload = value.as_bytes().to_vec();

        match &self.backend {
            KvBackend::Memory(store) => store.set_nx(key, payload).await,
            KvBackend::Redis(store) => store.set_nx(key, payload).await,
        }
    }

    pub async fn exists(&self, key: &str) -> anyhow::Result<bool> {
        match &self.backend {
            KvBackend::Memory(store) => store.exists(key).await,
            KvBackend::Redis(store) => store.exists(key).await,
        }
    }

    pub async fn get_json<T>(&self, key: &str) -> anyhow::Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        let value = match &self.backend {
            KvBackend::Memory(store) => store.get(key).await,
            KvBackend::Redis(store) => store.get(key).await,
        }?;

        match value {
            Some(bytes) => {
                let parsed = serde_json::from_slice(&bytes).map_err(|e| {
                    anyhow::anyhow!("failed to deserialize stored value for `{key}`: {e}")
                })?;
                Ok(Some(parsed))
            }
            None => Ok(None),
        }
    }

    /// Store a JSON value that expires after `ttl` (rounded up to whole seconds).
    pub async fn set_json<T>(&self, key: &str, value: &T, ttl: Duration) -> anyhow::Result<()>
    where
        T: Serialize,
    {
        let ttl_seconds = u64::try_from(ttl.as_millis().div_ceil(1_000))
            .unwrap_or(u64::MAX)
            .max(1);
        let payload = serde_json::to_vec(value)
            .map_err(|e| anyhow::anyhow!("failed to serialize value for `{key}`: {e}"))?;

        match &self.backend {
            KvBackend::Memory(store) => store.set(key, payload, Some(ttl_seconds)).await,
            KvBackend::Redis(store) => store.set_ex(key, payload, ttl_seconds).await,
        }
    }

    pub async fn ping(&self) -> anyhow::Result<()> {
        match &self.backend {
            KvBackend::Memory(store) => store.ping().await,
            KvBackend::Redis(store) => store.ping().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{KvService, MemoryKvStore};

    #[test]
    fn memory_backend_is_not_redis() {
        assert!(!KvService::memory("").is_redis_enabled());
    }

    #[test]
    fn keys_are_namespaced_when_prefix_is_set() {
        assert_eq!(KvService::memory("hearth:prod").key("a:1"), "hearth:prod:a:1");
        assert_eq!(KvService::memory("").key("a:1"), "a:1");
    }

    #[tokio::test]
    async fn string_round_trip_and_set_if_absent() {
        let kv = KvService::memory("");

        assert_eq!(kv.get_string("k").await.unwrap(), None);
        assert!(kv.set_string_if_absent("k", "first").await.unwrap());
        assert!(!kv.set_string_if_absent("k", "second").await.unwrap());
        assert_eq!(kv.get_string("k").await.unwrap().as_deref(), Some("first"));
        assert!(kv.exists("k").await.unwrap());

        kv.set_string("k", "third").await.unwrap();
        assert_eq!(kv.get_string("k").await.unwrap().as_deref(), Some("third"));

        assert!(!kv.exists("other").await.unwrap());
    }

    #[tokio::test]
    async fn json_values_survive_storage() {
        let kv = KvService::memory("");
        kv.set_json("n", &vec![1_u64, 2, 3], Duration::from_secs(30))
            .await
            .unwrap();

        let stored: Option<Vec<u64>> = kv.get_json("n").await.unwrap();
        assert_eq!(stored, Some(vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn offline_store_reports_errors() {
        let store = MemoryKvStore::default();
        let kv = KvService::with_memory_store(store.clone(), "");
        store.set_offline(true);

        assert!(kv.get_string("k").await.is_err());
        assert!(kv.ping().await.is_err());

        store.set_offline(false);
        assert!(kv.ping().await.is_ok());
    }
}
