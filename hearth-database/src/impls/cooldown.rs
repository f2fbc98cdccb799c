use std::time::Duration;

use anyhow::Context as _;

use crate::database::Database;
use crate::kv::KvService;
use crate::model::cooldown::CooldownRecord;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CooldownDecision {
    Granted,
    Active { retry_after: Duration },
}

impl CooldownDecision {
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted)
    }
}

fn cooldown_key(kv: &KvService, user_id: u64, command: &str) -> String {
    kv.key(format!("cooldown:{user_id}:{command}"))
}

/// Per (user, command) rate limiter over the key-value store.
///
/// Concurrent invocations by the same user race on a plain read-then-write;
/// the last writer wins. No lock is held across a store call.
#[derive(Clone, Debug)]
pub struct CooldownTracker {
    db: Database,
}

impl CooldownTracker {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn try_acquire(
        &self,
        user_id: u64,
        command: &str,
        cooldown: Duration,
    ) -> anyhow::Result<CooldownDecision> {
        if cooldown.is_zero() {
            return Ok(CooldownDecision::Granted);
        }

        let kv = self.db.kv();
        let key = cooldown_key(kv, user_id, command);
        let now = self.db.clock().now_millis();
        let cooldown_ms = u64::try_from(cooldown.as_millis()).unwrap_or(u64::MAX);

        let record = kv
            .get_json::<CooldownRecord>(&key)
            .await
            .context("failed reading cooldown record")?;

        if let Some(record) = record {
            let elapsed = now.saturating_sub(record.last_invoked_ms);
            if elapsed < cooldown_ms {
                return Ok(CooldownDecision::Active {
                    retry_after: Duration::from_millis(cooldown_ms - elapsed),
                });
            }
        }

        kv.set_json(
            &key,
            &CooldownRecord {
                last_invoked_ms: now,
            },
            cooldown,
        )
        .await
        .context("failed writing cooldown record")?;

        Ok(CooldownDecision::Granted)
    }
}
