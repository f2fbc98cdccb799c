use std::env;
use std::time::Duration;

use anyhow::Context as _;

use hearth_core::dispatch::DEFAULT_HANDLER_TIMEOUT;
use hearth_utils::DEFAULT_COMMAND_PREFIX;

const DEFAULT_REDIS_KEY_PREFIX: &str = "hearth:prod";

#[derive(Clone, Debug)]
pub struct Config {
    pub discord_token: String,
    pub command_prefix: String,
    pub redis_enabled: bool,
    pub redis_url: Option<String>,
    pub redis_key_prefix: String,
    pub handler_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required:
    /// - `DISCORD_TOKEN`
    ///
    /// Optional:
    /// - `COMMAND_PREFIX` (default `-`)
    /// - `REDIS_ENABLED`, `REDIS_URL`, `REDIS_KEY_PREFIX`
    /// - `HANDLER_TIMEOUT_SECS` (default 30)
    pub fn from_env() -> anyhow::Result<Self> {
        let discord_token =
            env::var("DISCORD_TOKEN").context("DISCORD_TOKEN environment variable is required")?;

        let command_prefix = env::var("COMMAND_PREFIX")
            .ok()
            .map(|prefix| prefix.trim().to_owned())
            .filter(|prefix| !prefix.is_empty())
            .unwrap_or_else(|| DEFAULT_COMMAND_PREFIX.to_owned());

        let redis_url = env::var("REDIS_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());
        let redis_key_prefix =
            env::var("REDIS_KEY_PREFIX").unwrap_or_else(|_| DEFAULT_REDIS_KEY_PREFIX.to_owned());

        let handler_timeout = Duration::from_secs(
            env_u64("HANDLER_TIMEOUT_SECS", DEFAULT_HANDLER_TIMEOUT.as_secs()).max(1),
        );

        Ok(Self {
            discord_token,
            command_prefix,
            redis_enabled: env_bool("REDIS_ENABLED", false),
            redis_url,
            redis_key_prefix,
            handler_timeout,
        })
    }
}

fn env_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(value) => parse_bool(&value),
        Err(_) => default,
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    match env::var(key) {
        Ok(value) => value.trim().parse::<u64>().unwrap_or(default),
        Err(_) => default,
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
