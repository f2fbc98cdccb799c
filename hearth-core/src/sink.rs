//! Where replies go.
//!
//! The gateway binary implements [`OutputSink`] on top of the platform's HTTP
//! client; [`RecordingSink`] keeps everything in memory for tests and local
//! runs.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::reply::Reply;

#[async_trait]
pub trait OutputSink: Send + Sync {
    async fn send(&self, channel_id: u64, reply: &Reply) -> anyhow::Result<()>;

    /// Establish (or reuse) the direct-message channel with a user.
    async fn open_private_channel(&self, user_id: u64) -> anyhow::Result<u64>;

    /// Whether the user may change guild-level settings.
    async fn can_manage_guild(&self, guild_id: u64, user_id: u64) -> anyhow::Result<bool>;

    async fn send_private(&self, user_id: u64, reply: &Reply) -> anyhow::Result<u64> {
        let channel_id = self.open_private_channel(user_id).await?;
        self.send(channel_id, reply).await?;
        Ok(channel_id)
    }
}

/// A reply captured by [`RecordingSink`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SentReply {
    pub channel_id: u64,
    pub reply: Reply,
}

#[derive(Debug, Default)]
struct RecordingState {
    sent: Vec<SentReply>,
    private_channels: HashMap<u64, u64>,
    managers: HashSet<(u64, u64)>,
    fail_private: bool,
}

/// In-memory sink. Private channel ids are allocated from
/// [`RecordingSink::PRIVATE_CHANNEL_BASE`] upwards, one per user.
#[derive(Debug, Default)]
pub struct RecordingSink {
    state: Mutex<RecordingState>,
}

impl RecordingSink {
    pub const PRIVATE_CHANNEL_BASE: u64 = 1 << 40;

    pub fn new() -> Self {
        Self::default()
    }

    /// Let `user_id` manage `guild_id`.
    pub fn grant_manage_guild(&self, guild_id: u64, user_id: u64) {
        self.with_state(|state| {
            state.managers.insert((guild_id, user_id));
        });
    }

    /// Make opening private channels fail, as when a user blocks DMs.
    pub fn fail_private_channels(&self, fail: bool) {
        self.with_state(|state| state.fail_private = fail);
    }

    pub fn sent(&self) -> Vec<SentReply> {
        self.with_state(|state| state.sent.clone())
    }

    pub fn sent_to(&self, channel_id: u64) -> Vec<Reply> {
        self.with_state(|state| {
            state
                .sent
                .iter()
                .filter(|sent| sent.channel_id == channel_id)
                .map(|sent| sent.reply.clone())
                .collect()
        })
    }

    pub fn private_channel_of(&self, user_id: u64) -> Option<u64> {
        self.with_state(|state| state.private_channels.get(&user_id).copied())
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut RecordingState) -> T) -> T {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut state)
    }
}

#[async_trait]
impl OutputSink for RecordingSink {
    async fn send(&self, channel_id: u64, reply: &Reply) -> anyhow::Result<()> {
        self.with_state(|state| {
            state.sent.push(SentReply {
                channel_id,
                reply: reply.clone(),
            });
        });
        Ok(())
    }

    async fn open_private_channel(&self, user_id: u64) -> anyhow::Result<u64> {
        self.with_state(|state| {
            if state.fail_private {
                anyhow::bail!("cannot open a private channel with user {user_id}");
            }

            let next = Self::PRIVATE_CHANNEL_BASE + state.private_channels.len() as u64;
            Ok(*state.private_channels.entry(user_id).or_insert(next))
        })
    }

    async fn can_manage_guild(&self, guild_id: u64, user_id: u64) -> anyhow::Result<bool> {
        Ok(self.with_state(|state| state.managers.contains(&(guild_id, user_id))))
    }
}
