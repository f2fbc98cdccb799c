use tokio::time::Instant;

use crate::Data;
use crate::args::Arguments;
use crate::command::CommandDefinition;
use crate::registry::{CommandContainer, CommandRegistry};
use crate::sink::OutputSink;

/// An inbound chat message, as delivered by the gateway.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageEvent {
    pub message_id: u64,
    pub content: String,
    pub author_id: u64,
    pub author_is_bot: bool,
    pub channel_id: u64,
    /// `None` for direct messages.
    pub guild_id: Option<u64>,
}

/// One resolved attempt to run a command, owned by the dispatcher for the
/// duration of the handler call.
pub struct Invocation<'a> {
    pub message: &'a MessageEvent,
    pub command: &'a CommandDefinition,
    /// Containers walked to reach the command, root first.
    pub chain: Vec<&'a CommandContainer>,
    pub args: Arguments,
    /// The prefix the message actually used; empty for unprefixed DMs.
    pub prefix: &'a str,
    /// Handlers still running at this instant are abandoned.
    pub deadline: Instant,
    pub registry: &'a CommandRegistry,
    pub data: &'a Data,
    pub sink: &'a dyn OutputSink,
}

impl Invocation<'_> {
    pub fn guild_id(&self) -> Option<u64> {
        self.message.guild_id
    }

    pub fn channel_id(&self) -> u64 {
        self.message.channel_id
    }

    pub fn author_id(&self) -> u64 {
        self.message.author_id
    }

    pub fn is_direct_message(&self) -> bool {
        self.message.guild_id.is_none()
    }

    /// Prefix to show in usage hints; falls back to the default in DMs.
    pub fn display_prefix(&self) -> &str {
        if self.prefix.is_empty() {
            self.data.prefixes.default_prefix()
        } else {
            self.prefix
        }
    }
}
