mod config;
mod events;
mod sink;

use std::sync::Arc;

use serenity::all::{ClientBuilder, GatewayIntents, Http};
use tracing::{info, warn};
use tracing_subscriber::Layer;
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use rustls::crypto::ring::default_provider;

use hearth_core::{CommandRegistry, Data, Dispatcher};
use hearth_database::{Database, KvService};

use crate::config::Config;
use crate::events::Handler;
use crate::sink::SerenityOutputSink;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let fmt_layer = tracing_subscriber::fmt::layer().with_filter(filter_fn(|metadata| {
        let target = metadata.target();

        let within_info_level = *metadata.level() <= tracing::Level::INFO;
        if !within_info_level {
            return false;
        }

        !(target.starts_with("serenity::gateway::bridge::shard_manager")
            || target.starts_with("serenity::gateway::bridge::shard_runner"))
    }));

    tracing_subscriber::registry().with(fmt_layer).init();

    default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("failed to install rustls ring provider"))?;

    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    let kv = connect_kv(&config).await;
    let data = Data::new(Database::new(kv), config.command_prefix.clone());
    info!(default_prefix = %config.command_prefix, "command prefix configured.");

    // Duplicate command names or aliases are a programming error; refuse to start.
    let registry = CommandRegistry::new(hearth_commands::root_container()?);

    let http = Arc::new(Http::new(&config.discord_token));
    let dispatcher = Dispatcher::new(
        Arc::new(registry),
        data,
        Arc::new(SerenityOutputSink::new(Arc::clone(&http))),
    )
    .with_handler_timeout(config.handler_timeout);

    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    info!("Hearth is connecting...");

    let mut client = ClientBuilder::new(&config.discord_token, intents)
        .event_handler(Handler::new(Arc::new(dispatcher)))
        .await?;

    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Shutdown signal received, stopping bot...");
        shard_manager.shutdown_all().await;
    });

    client.start().await?;
    info!("Hearth has shut down.");
    Ok(())
}

/// Pick the key-value backend. Redis problems fall back to the in-memory
/// store so the bot still answers commands.
async fn connect_kv(config: &Config) -> KvService {
    let key_prefix = config.redis_key_prefix.clone();

    let kv = if config.redis_enabled {
        match config.redis_url.as_deref() {
            Some(redis_url) => match KvService::redis(redis_url, key_prefix.clone()) {
                Ok(kv) => {
                    info!(key_prefix = %key_prefix, "Redis store enabled.");
                    kv
                }
                Err(err) => {
                    warn!(?err, key_prefix = %key_prefix, "Failed to initialize Redis; using in-memory store.");
                    KvService::memory(key_prefix)
                }
            },
            None => {
                warn!(key_prefix = %key_prefix, "REDIS_ENABLED=true but REDIS_URL is missing; using in-memory store.");
                KvService::memory(key_prefix)
            }
        }
    } else {
        info!("Redis disabled (set REDIS_ENABLED=true to enable); using in-memory store.");
        KvService::memory(key_prefix)
    };

    if kv.is_redis_enabled() {
        if let Err(err) = kv.ping().await {
            warn!(
                ?err,
                "Redis ping failed; store operations will fail until it becomes reachable."
            );
        } else {
            info!("Redis health check passed.");
        }
    }

    kv
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(?err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!(?err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
