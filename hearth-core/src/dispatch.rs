use std::any::Any;
use std::collections::{HashSet, VecDeque};
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::FutureExt;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, warn};

use hearth_database::CooldownDecision;
use hearth_utils::embed::error_embed;
use hearth_utils::formatting::format_retry_after_millis;

use crate::Data;
use crate::args::{ArgInput, bind};
use crate::command::CommandDefinition;
use crate::error::{ArgumentError, DispatchError};
use crate::help::usage_line;
use crate::invocation::{Invocation, MessageEvent};
use crate::registry::CommandRegistry;
use crate::reply::Reply;
use crate::sink::OutputSink;

pub const DEFAULT_HANDLER_TIMEOUT: Duration = Duration::from_secs(30);

/// How many recent command message ids are remembered for de-duplication.
const SEEN_MESSAGE_CAPACITY: usize = 4096;

/// Why a message was dropped before reaching a command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IgnoreReason {
    BotAuthor,
    NotPrefixed,
    /// The prefix could not be resolved; the message is treated as text.
    PrefixUnavailable,
    CommandNotFound(String),
    NotAllowedInDm,
    /// The same message id was already dispatched.
    Duplicate,
}

/// Terminal state of one dispatch.
#[derive(Debug)]
pub enum DispatchOutcome {
    Ignored(IgnoreReason),
    Completed { command: String },
    Failed { command: String, error: DispatchError },
}

impl DispatchOutcome {
    fn failed(command: &str, error: DispatchError) -> Self {
        Self::Failed {
            command: command.to_owned(),
            error,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

#[derive(Debug, Default)]
struct SeenMessages {
    order: VecDeque<u64>,
    ids: HashSet<u64>,
}

impl SeenMessages {
    /// Record `message_id`; false if it was already present.
    fn insert(&mut self, message_id: u64) -> bool {
        if !self.ids.insert(message_id) {
            return false;
        }

        self.order.push_back(message_id);
        if self.order.len() > SEEN_MESSAGE_CAPACITY
            && let Some(evicted) = self.order.pop_front()
        {
            self.ids.remove(&evicted);
        }

        true
    }
}

/// Routes inbound messages to command handlers.
///
/// The dispatcher itself holds no per-invocation state; each message runs
/// through [`Dispatcher::dispatch`] independently, usually on its own task
/// via [`Dispatcher::spawn`].
pub struct Dispatcher {
    registry: Arc<CommandRegistry>,
    data: Data,
    sink: Arc<dyn OutputSink>,
    handler_timeout: Duration,
    seen: Mutex<SeenMessages>,
}

impl Dispatcher {
    pub fn new(registry: Arc<CommandRegistry>, data: Data, sink: Arc<dyn OutputSink>) -> Self {
        Self {
            registry,
            data,
            sink,
            handler_timeout: DEFAULT_HANDLER_TIMEOUT,
            seen: Mutex::default(),
        }
    }

    pub fn with_handler_timeout(mut self, timeout: Duration) -> Self {
        self.handler_timeout = timeout;
        self
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn data(&self) -> &Data {
        &self.data
    }

    /// Dispatch on a fresh task so the caller's event loop never waits on a
    /// handler.
    pub fn spawn(self: &Arc<Self>, event: MessageEvent) -> JoinHandle<DispatchOutcome> {
        let dispatcher = Arc::clone(self);
        tokio::spawn(async move { dispatcher.dispatch(event).await })
    }

    pub async fn dispatch(&self, event: MessageEvent) -> DispatchOutcome {
        if event.author_is_bot {
            return DispatchOutcome::Ignored(IgnoreReason::BotAuthor);
        }

        // ReceivedMessage -> PrefixChecked
        let (prefix, body) = match self.strip_prefix(&event).await {
            Ok(stripped) => stripped,
            Err(reason) => return DispatchOutcome::Ignored(reason),
        };

        // PrefixChecked -> CommandResolved
        let input = ArgInput::new(body);
        let resolved = match self.registry.resolve(input.tokens()) {
            Ok(resolved) => resolved,
            Err(not_found) => {
                debug!(name = %not_found.name, "message did not name a command");
                return DispatchOutcome::Ignored(IgnoreReason::CommandNotFound(not_found.name));
            }
        };

        if event.guild_id.is_none() && !resolved.runs_in_dm() {
            return DispatchOutcome::Ignored(IgnoreReason::NotAllowedInDm);
        }

        if !self.mark_seen(event.message_id) {
            debug!(message_id = event.message_id, "duplicate message delivery dropped");
            return DispatchOutcome::Ignored(IgnoreReason::Duplicate);
        }

        let command = resolved.command;
        let qualified_name = resolved.qualified_name();
        let first_argument = input.tokens().len() - resolved.remaining.len();

        // CommandResolved -> CooldownChecked
        let cooldown = command.cooldown_duration();
        if !cooldown.is_zero() {
            match self
                .data
                .cooldowns
                .try_acquire(event.author_id, &qualified_name, cooldown)
                .await
            {
                Ok(CooldownDecision::Granted) => {}
                Ok(CooldownDecision::Active { retry_after }) => {
                    self.reply(&event, &Reply::text(cooldown_message(retry_after)))
                        .await;
                    return DispatchOutcome::failed(
                        &qualified_name,
                        DispatchError::CooldownActive { retry_after },
                    );
                }
                Err(error) => {
                    warn!(
                        ?error,
                        guild_id = ?event.guild_id,
                        user_id = event.author_id,
                        command = %qualified_name,
                        "cooldown check failed; command not run"
                    );
                    return DispatchOutcome::failed(
                        &qualified_name,
                        DispatchError::StoreUnavailable(error),
                    );
                }
            }
        }

        // CooldownChecked -> ArgumentsBound
        let display_prefix = if prefix.is_empty() {
            self.data.prefixes.default_prefix()
        } else {
            prefix.as_str()
        };
        let args = match bind(&input, first_argument, command.arguments()) {
            Ok(args) => args,
            Err(error) => {
                let usage = usage_line(display_prefix, &qualified_name, command);
                self.reply(&event, &Reply::text(argument_error_message(&error, &usage)))
                    .await;
                return DispatchOutcome::failed(&qualified_name, error.into());
            }
        };

        // ArgumentsBound -> Executing
        let deadline = Instant::now() + self.handler_timeout;
        let invocation = Invocation {
            message: &event,
            command,
            chain: resolved.chain,
            args,
            prefix: &prefix,
            deadline,
            registry: &self.registry,
            data: &self.data,
            sink: self.sink.as_ref(),
        };

        let handler = AssertUnwindSafe(command.handler().execute(&invocation)).catch_unwind();
        let result = tokio::time::timeout_at(deadline, handler)
            .await
            .map(|caught| caught.unwrap_or_else(|panic| Err(panic_error(panic.as_ref()))));

        // Executing -> Completed | Failed
        match result {
            Ok(Ok(reply)) => {
                let Some(reply) = reply else {
                    return DispatchOutcome::Completed {
                        command: qualified_name,
                    };
                };

                match self.deliver(&event, command, reply).await {
                    Ok(()) => DispatchOutcome::Completed {
                        command: qualified_name,
                    },
                    Err(error) => {
                        error!(
                            ?error,
                            guild_id = ?event.guild_id,
                            channel_id = event.channel_id,
                            user_id = event.author_id,
                            command = %qualified_name,
                            "failed to deliver command reply"
                        );
                        DispatchOutcome::failed(&qualified_name, DispatchError::Delivery(error))
                    }
                }
            }
            Ok(Err(error)) => {
                error!(
                    ?error,
                    guild_id = ?event.guild_id,
                    channel_id = event.channel_id,
                    user_id = event.author_id,
                    command = %qualified_name,
                    "command error"
                );
                self.reply(&event, &handler_failure_reply()).await;
                DispatchOutcome::failed(
                    &qualified_name,
                    DispatchError::HandlerExecution(error),
                )
            }
            Err(_elapsed) => {
                error!(
                    guild_id = ?event.guild_id,
                    channel_id = event.channel_id,
                    user_id = event.author_id,
                    command = %qualified_name,
                    timeout = ?self.handler_timeout,
                    "command timed out"
                );
                self.reply(&event, &handler_failure_reply()).await;
                DispatchOutcome::failed(
                    &qualified_name,
                    DispatchError::HandlerTimeout {
                        after: self.handler_timeout,
                    },
                )
            }
        }
    }

    /// Returns the prefix used (empty for an unprefixed DM) and the text after it.
    async fn strip_prefix<'m>(
        &self,
        event: &'m MessageEvent,
    ) -> Result<(String, &'m str), IgnoreReason> {
        let content = event.content.as_str();

        let Some(guild_id) = event.guild_id else {
            let default = self.data.prefixes.default_prefix();
            return Ok(match content.strip_prefix(default) {
                Some(body) => (default.to_owned(), body),
                None => (String::new(), content),
            });
        };

        let prefix = match self.data.prefixes.resolve(guild_id).await {
            Ok(prefix) => prefix,
            Err(error) => {
                warn!(?error, guild_id, "failed retrieving command prefix; ignoring message");
                return Err(IgnoreReason::PrefixUnavailable);
            }
        };

        match content.strip_prefix(prefix.as_str()) {
            Some(body) => Ok((prefix, body)),
            None => Err(IgnoreReason::NotPrefixed),
        }
    }

    fn mark_seen(&self, message_id: u64) -> bool {
        self.seen
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(message_id)
    }

    async fn deliver(
        &self,
        event: &MessageEvent,
        command: &CommandDefinition,
        reply: Reply,
    ) -> anyhow::Result<()> {
        if reply.is_empty() {
            return Ok(());
        }

        if reply.private || command.replies_privately() {
            self.sink.send_private(event.author_id, &reply).await?;
        } else {
            self.sink.send(event.channel_id, &reply).await?;
        }

        Ok(())
    }

    /// Best-effort notice to the origin channel.
    async fn reply(&self, event: &MessageEvent, reply: &Reply) {
        if let Err(error) = self.sink.send(event.channel_id, reply).await {
            warn!(
                ?error,
                channel_id = event.channel_id,
                "failed to send dispatch notice"
            );
        }
    }
}

pub fn cooldown_message(retry_after: Duration) -> String {
    let millis = u64::try_from(retry_after.as_millis()).unwrap_or(u64::MAX);
    format!(
        "This command is on cooldown. Try again in {}.",
        format_retry_after_millis(millis)
    )
}

pub fn argument_error_message(error: &ArgumentError, usage: &str) -> String {
    match error {
        ArgumentError::Missing { name } => {
            format!("Missing required argument `{}`.\nUsage: `{}`", name, usage)
        }
        ArgumentError::Invalid { name, token } => format!(
            "Invalid value `{}` for argument `{}`.\nUsage: `{}`",
            token, name, usage
        ),
    }
}

fn panic_error(panic: &(dyn Any + Send)) -> anyhow::Error {
    let message = panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic");
    anyhow::anyhow!("command panicked: {message}")
}

fn handler_failure_reply() -> Reply {
    Reply::embed(error_embed(
        "Something went wrong while running this command.",
    ))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{
        SEEN_MESSAGE_CAPACITY, SeenMessages, argument_error_message, cooldown_message, panic_error,
    };
    use crate::error::ArgumentError;

    #[test]
    fn seen_messages_reject_repeats_and_evict_oldest() {
        let mut seen = SeenMessages::default();
        assert!(seen.insert(1));
        assert!(!seen.insert(1));

        for id in 2..=(SEEN_MESSAGE_CAPACITY as u64 + 1) {
            assert!(seen.insert(id));
        }
        assert!(seen.insert(1));
    }

    #[test]
    fn cooldown_notice_shows_retry_time() {
        assert_eq!(
            cooldown_message(Duration::from_millis(7_400)),
            "This command is on cooldown. Try again in 8s."
        );
    }

    #[test]
    fn argument_errors_include_usage() {
        let missing = ArgumentError::Missing {
            name: "user".to_owned(),
        };
        assert_eq!(
            argument_error_message(&missing, "-greet <user>"),
            "Missing required argument `user`.\nUsage: `-greet <user>`"
        );
    }

    #[test]
    fn panic_payloads_become_errors() {
        let static_message: Box<dyn std::any::Any + Send> = Box::new("boom");
        let owned_message: Box<dyn std::any::Any + Send> = Box::new(String::from("index out of range"));
        let opaque: Box<dyn std::any::Any + Send> = Box::new(7_u8);

        assert_eq!(
            panic_error(static_message.as_ref()).to_string(),
            "command panicked: boom"
        );
        assert_eq!(
            panic_error(owned_message.as_ref()).to_string(),
            "command panicked: index out of range"
        );
        assert_eq!(
            panic_error(opaque.as_ref()).to_string(),
            "command panicked: unknown panic"
        );
    }
}
