use anyhow::Context as _;
use thiserror::Error;
use tracing::info;

use crate::database::Database;
use crate::kv::KvService;

/// Longest prefix an administrator may configure.
pub const MAX_PREFIX_LEN: usize = 16;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PrefixError {
    #[error("the prefix can't be empty")]
    Empty,
    #[error("the prefix can't contain whitespace")]
    ContainsWhitespace,
    #[error("the prefix can be at most {max} characters long")]
    TooLong { max: usize },
}

/// Validate an administrator-supplied prefix.
pub fn validate_prefix(raw: &str) -> Result<&str, PrefixError> {
    if raw.is_empty() {
        return Err(PrefixError::Empty);
    }

    if raw.chars().any(char::is_whitespace) {
        return Err(PrefixError::ContainsWhitespace);
    }

    if raw.chars().count() > MAX_PREFIX_LEN {
        return Err(PrefixError::TooLong {
            max: MAX_PREFIX_LEN,
        });
    }

    Ok(raw)
}

fn prefix_key(kv: &KvService, guild_id: u64) -> String {
    kv.key(format!("command_prefix:{guild_id}"))
}

/// Per-guild command prefix, persisted in the key-value store.
#[derive(Clone, Debug)]
pub struct PrefixStore {
    db: Database,
    default_prefix: String,
}

impl PrefixStore {
    pub fn new(db: Database, default_prefix: impl Into<String>) -> Self {
        Self {
            db,
            default_prefix: default_prefix.into(),
        }
    }

    pub fn default_prefix(&self) -> &str {
        &self.default_prefix
    }

    /// Resolve the prefix for a guild, assigning the default on first contact.
    pub async fn resolve(&self, guild_id: u64) -> anyhow::Result<String> {
        let kv = self.db.kv();
        let key = prefix_key(kv, guild_id);

        if let Some(prefix) = kv
            .get_string(&key)
            .await
            .context("failed retrieving command prefix")?
        {
            return Ok(prefix);
        }

        if kv
            .set_string_if_absent(&key, &self.default_prefix)
            .await
            .context("failed storing default command prefix")?
        {
            info!(
                guild_id,
                prefix = %self.default_prefix,
                "assigned default command prefix"
            );
            return Ok(self.default_prefix.clone());
        }

        // Another task assigned a prefix between our GET and SET NX.
        let prefix = kv
            .get_string(&key)
            .await
            .context("failed retrieving command prefix")?;

        Ok(prefix.unwrap_or_else(|| self.default_prefix.clone()))
    }

    /// Replace a guild's prefix.
    pub async fn set(&self, guild_id: u64, prefix: &str) -> anyhow::Result<()> {
        let prefix = validate_prefix(prefix)?;
        let kv = self.db.kv();

        kv.set_string(&prefix_key(kv, guild_id), prefix)
            .await
            .context("failed storing command prefix")?;

        info!(guild_id, prefix, "command prefix changed");
        Ok(())
    }

    /// Store the default prefix for a newly joined guild if it has none.
    pub async fn ensure_default(&self, guild_id: u64, guild_name: &str) -> anyhow::Result<()> {
        let kv = self.db.kv();
        let key = prefix_key(kv, guild_id);

        let exists = kv
            .exists(&key)
            .await
            .context("failed checking if prefix exists")?;
        if exists {
            return Ok(());
        }

        if kv.set_string_if_absent(&key, &self.default_prefix).await? {
            info!(
                guild_id,
                guild_name,
                prefix = %self.default_prefix,
                "set command prefix to default"
            );
        }

        Ok(())
    }
}
