use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use hearth_core::sink::RecordingSink;
use hearth_core::{
    ArgumentDecl, ArgumentKind, CommandContainer, CommandDefinition, CommandHandler, CommandRegistry,
    Data, DispatchError, DispatchOutcome, Dispatcher, Error, IgnoreReason, Invocation,
    MessageEvent, Reply,
};
use hearth_database::{Clock, Database, KvService, MemoryKvStore};

const GUILD: u64 = 100;
const CHANNEL: u64 = 200;
const USER: u64 = 300;

struct Counted {
    calls: Arc<AtomicUsize>,
    reply: &'static str,
}

#[async_trait]
impl CommandHandler for Counted {
    async fn execute(&self, _invocation: &Invocation<'_>) -> Result<Option<Reply>, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Some(Reply::text(self.reply)))
    }
}

struct Echo;

#[async_trait]
impl CommandHandler for Echo {
    async fn execute(&self, invocation: &Invocation<'_>) -> Result<Option<Reply>, Error> {
        let text = invocation.args.by_name("text").as_str().unwrap_or_default();
        Ok(Some(Reply::text(text)))
    }
}

struct Broken;

#[async_trait]
impl CommandHandler for Broken {
    async fn execute(&self, _invocation: &Invocation<'_>) -> Result<Option<Reply>, Error> {
        anyhow::bail!("upstream service returned 503")
    }
}

struct Panics;

#[async_trait]
impl CommandHandler for Panics {
    async fn execute(&self, _invocation: &Invocation<'_>) -> Result<Option<Reply>, Error> {
        panic!("handler bug");
    }
}

struct Secret;

#[async_trait]
impl CommandHandler for Secret {
    async fn execute(&self, _invocation: &Invocation<'_>) -> Result<Option<Reply>, Error> {
        Ok(Some(Reply::text("psst").private()))
    }
}

struct Roll;

#[async_trait]
impl CommandHandler for Roll {
    async fn execute(&self, invocation: &Invocation<'_>) -> Result<Option<Reply>, Error> {
        let sides = invocation.args.by_name("sides").as_i64().unwrap_or(6);
        Ok(Some(Reply::text(format!("Rolled a d{sides}."))))
    }
}

/// Blocks until released, then replies.
struct Gate {
    release: Arc<Notify>,
}

#[async_trait]
impl CommandHandler for Gate {
    async fn execute(&self, _invocation: &Invocation<'_>) -> Result<Option<Reply>, Error> {
        self.release.notified().await;
        Ok(Some(Reply::text("slow done")))
    }
}

struct Harness {
    dispatcher: Arc<Dispatcher>,
    sink: Arc<RecordingSink>,
    memory: MemoryKvStore,
    clock: Clock,
    ping_calls: Arc<AtomicUsize>,
    release: Arc<Notify>,
}

fn harness() -> Harness {
    let ping_calls = Arc::new(AtomicUsize::new(0));
    let greet_calls = Arc::new(AtomicUsize::new(0));
    let release = Arc::new(Notify::new());

    let mut root = CommandContainer::root();
    root.add_command(
        CommandDefinition::new(
            "ping",
            Counted {
                calls: Arc::clone(&ping_calls),
                reply: "Pong!",
            },
        )
        .alias("p")
        .run_in_dm(true),
    )
    .unwrap();
    root.add_command(
        CommandDefinition::new(
            "greet",
            Counted {
                calls: greet_calls,
                reply: "Hello!",
            },
        )
        .cooldown(Duration::from_secs(10)),
    )
    .unwrap();
    root.add_command(
        CommandDefinition::new(
            "daily",
            Counted {
                calls: Arc::new(AtomicUsize::new(0)),
                reply: "Claimed.",
            },
        )
        .cooldown(Duration::from_secs(86_400))
        .run_in_dm(true),
    )
    .unwrap();
    root.add_command(
        CommandDefinition::new("echo", Echo)
            .argument(ArgumentDecl::required("text", ArgumentKind::String)),
    )
    .unwrap();
    root.add_command(CommandDefinition::new("broken", Broken)).unwrap();
    root.add_command(CommandDefinition::new("panics", Panics)).unwrap();
    root.add_command(CommandDefinition::new(
        "slow",
        Gate {
            release: Arc::clone(&release),
        },
    ))
    .unwrap();
    root.add_command(
        CommandDefinition::new("whisper", Echo)
            .argument(ArgumentDecl::required("text", ArgumentKind::Rest))
            .private_reply(true),
    )
    .unwrap();

    root.add_command(CommandDefinition::new("secret", Secret)).unwrap();
    root.add_command(
        CommandDefinition::new("roll", Roll)
            .argument(ArgumentDecl::required("sides", ArgumentKind::Integer)),
    )
    .unwrap();
    root.add_command(
        CommandDefinition::new("show", Echo)
            .argument(ArgumentDecl::optional("text", ArgumentKind::Rest))
            .cooldown(Duration::from_secs(10)),
    )
    .unwrap();

    let mut config = CommandContainer::new("config");
    config
        .add_command(
            CommandDefinition::new("show", Echo)
                .argument(ArgumentDecl::optional("text", ArgumentKind::Rest))
                .cooldown(Duration::from_secs(10)),
        )
        .unwrap();
    root.add_container(config).unwrap();

    let memory = MemoryKvStore::default();
    let clock = Clock::manual(1_700_000_000_000);
    let db = Database::with_clock(
        KvService::with_memory_store(memory.clone(), ""),
        clock.clone(),
    );
    let sink = Arc::new(RecordingSink::new());
    let dispatcher = Dispatcher::new(
        Arc::new(CommandRegistry::new(root)),
        Data::new(db, "-"),
        sink.clone(),
    )
    .with_handler_timeout(Duration::from_secs(5));

    Harness {
        dispatcher: Arc::new(dispatcher),
        sink,
        memory,
        clock,
        ping_calls,
        release,
    }
}

fn guild_message(message_id: u64, content: &str) -> MessageEvent {
    MessageEvent {
        message_id,
        content: content.to_owned(),
        author_id: USER,
        author_is_bot: false,
        channel_id: CHANNEL,
        guild_id: Some(GUILD),
    }
}

fn direct_message(message_id: u64, content: &str) -> MessageEvent {
    MessageEvent {
        guild_id: None,
        channel_id: 999,
        ..guild_message(message_id, content)
    }
}

#[tokio::test]
async fn plain_text_produces_nothing() {
    let h = harness();

    let outcome = h.dispatcher.dispatch(guild_message(1, "ping everyone")).await;
    assert!(matches!(
        outcome,
        DispatchOutcome::Ignored(IgnoreReason::NotPrefixed)
    ));

    let outcome = h.dispatcher.dispatch(guild_message(2, "-dance")).await;
    assert!(matches!(
        outcome,
        DispatchOutcome::Ignored(IgnoreReason::CommandNotFound(_))
    ));

    assert!(h.sink.sent().is_empty());
    assert_eq!(h.ping_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn prefixed_command_replies_in_channel() {
    let h = harness();

    let outcome = h.dispatcher.dispatch(guild_message(1, "-P")).await;
    assert!(outcome.is_completed());
    assert_eq!(h.sink.sent_to(CHANNEL), vec![Reply::text("Pong!")]);
}

#[tokio::test]
async fn custom_prefix_replaces_default() {
    let h = harness();
    h.dispatcher.data().prefixes.set(GUILD, "!").await.unwrap();

    let outcome = h.dispatcher.dispatch(guild_message(1, "-ping")).await;
    assert!(matches!(
        outcome,
        DispatchOutcome::Ignored(IgnoreReason::NotPrefixed)
    ));

    let outcome = h.dispatcher.dispatch(guild_message(2, "!ping")).await;
    assert!(outcome.is_completed());
}

#[tokio::test]
async fn bot_authors_are_ignored() {
    let h = harness();
    let event = MessageEvent {
        author_is_bot: true,
        ..guild_message(1, "-ping")
    };

    let outcome = h.dispatcher.dispatch(event).await;
    assert!(matches!(
        outcome,
        DispatchOutcome::Ignored(IgnoreReason::BotAuthor)
    ));
    assert_eq!(h.ping_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn cooldown_rejects_second_call_with_retry_time() {
    let h = harness();

    assert!(h.dispatcher.dispatch(guild_message(1, "-greet")).await.is_completed());

    h.clock.advance(Duration::from_secs(2));
    let outcome = h.dispatcher.dispatch(guild_message(2, "-greet")).await;
    match outcome {
        DispatchOutcome::Failed {
            command,
            error: DispatchError::CooldownActive { retry_after },
        } => {
            assert_eq!(command, "greet");
            assert_eq!(retry_after, Duration::from_secs(8));
        }
        other => panic!("expected cooldown rejection, got {other:?}"),
    }

    let sent = h.sink.sent_to(CHANNEL);
    assert_eq!(
        sent.last(),
        Some(&Reply::text("This command is on cooldown. Try again in 8s."))
    );

    h.clock.advance(Duration::from_secs(8));
    assert!(h.dispatcher.dispatch(guild_message(3, "-greet")).await.is_completed());
}

#[tokio::test]
async fn missing_argument_is_reported_with_usage() {
    let h = harness();

    let outcome = h.dispatcher.dispatch(guild_message(1, "-echo")).await;
    match outcome {
        DispatchOutcome::Failed {
            error: DispatchError::MissingArgument { name },
            ..
        } => assert_eq!(name, "text"),
        other => panic!("expected missing argument, got {other:?}"),
    }
    assert_eq!(
        h.sink.sent_to(CHANNEL),
        vec![Reply::text(
            "Missing required argument `text`.\nUsage: `-echo <text>`"
        )]
    );

    let outcome = h.dispatcher.dispatch(guild_message(2, "-echo verbatim")).await;
    assert!(outcome.is_completed());
    assert_eq!(h.sink.sent_to(CHANNEL).last(), Some(&Reply::text("verbatim")));
}

#[tokio::test]
async fn nested_container_commands_resolve() {
    let h = harness();

    let outcome = h.dispatcher.dispatch(guild_message(1, "-CONFIG show all of it")).await;
    match outcome {
        DispatchOutcome::Completed { command } => assert_eq!(command, "config show"),
        other => panic!("expected completion, got {other:?}"),
    }
    assert_eq!(h.sink.sent_to(CHANNEL), vec![Reply::text("all of it")]);
}

#[tokio::test]
async fn handler_errors_are_reported_generically() {
    let h = harness();

    let outcome = h.dispatcher.dispatch(guild_message(1, "-broken")).await;
    assert!(matches!(
        outcome,
        DispatchOutcome::Failed {
            error: DispatchError::HandlerExecution(_),
            ..
        }
    ));

    let sent = h.sink.sent_to(CHANNEL);
    assert_eq!(sent.len(), 1);
    let description = sent[0].embeds[0].description.as_deref();
    assert_eq!(
        description,
        Some("Something went wrong while running this command.")
    );
}

#[tokio::test]
async fn slow_handler_times_out() {
    let h = harness();
    let dispatcher = Dispatcher::new(
        Arc::new(CommandRegistry::new({
            let mut root = CommandContainer::root();
            root.add_command(CommandDefinition::new(
                "slow",
                Gate {
                    release: Arc::new(Notify::new()),
                },
            ))
            .unwrap();
            root
        })),
        h.dispatcher.data().clone(),
        h.sink.clone(),
    )
    .with_handler_timeout(Duration::from_millis(50));

    let outcome = dispatcher.dispatch(guild_message(1, "-slow")).await;
    assert!(matches!(
        outcome,
        DispatchOutcome::Failed {
            error: DispatchError::HandlerTimeout { .. },
            ..
        }
    ));
}

#[tokio::test]
async fn slow_command_does_not_block_other_messages() {
    let h = harness();

    let slow = h.dispatcher.spawn(guild_message(1, "-slow"));
    let fast = h.dispatcher.spawn(guild_message(2, "-ping"));

    assert!(fast.await.unwrap().is_completed());
    assert!(!slow.is_finished());

    h.release.notify_one();
    assert!(slow.await.unwrap().is_completed());
}

#[tokio::test]
async fn panicking_handler_is_reported_like_a_handler_error() {
    let h = harness();

    let crashed = h.dispatcher.spawn(guild_message(1, "-panics"));
    let healthy = h.dispatcher.spawn(guild_message(2, "-ping"));

    match crashed.await.unwrap() {
        DispatchOutcome::Failed {
            command,
            error: DispatchError::HandlerExecution(error),
        } => {
            assert_eq!(command, "panics");
            assert_eq!(error.to_string(), "command panicked: handler bug");
        }
        other => panic!("expected handler failure, got {other:?}"),
    }
    assert!(healthy.await.unwrap().is_completed());

    let sent = h.sink.sent_to(CHANNEL);
    assert!(sent.contains(&Reply::text("Pong!")));
    assert!(sent.iter().any(|reply| {
        reply.embeds.first().and_then(|embed| embed.description.as_deref())
            == Some("Something went wrong while running this command.")
    }));
}

#[tokio::test]
async fn commands_sharing_a_name_keep_separate_cooldowns() {
    let h = harness();

    assert!(h.dispatcher.dispatch(guild_message(1, "-show")).await.is_completed());
    assert!(
        h.dispatcher
            .dispatch(guild_message(2, "-config show"))
            .await
            .is_completed()
    );

    let outcome = h.dispatcher.dispatch(guild_message(3, "-config show")).await;
    assert!(matches!(
        outcome,
        DispatchOutcome::Failed {
            error: DispatchError::CooldownActive { .. },
            ..
        }
    ));
}

#[tokio::test]
async fn invalid_argument_value_is_reported_with_usage() {
    let h = harness();

    let outcome = h.dispatcher.dispatch(guild_message(1, "-roll twenty")).await;
    match outcome {
        DispatchOutcome::Failed {
            command,
            error: DispatchError::InvalidArgumentValue { name, token },
        } => {
            assert_eq!(command, "roll");
            assert_eq!(name, "sides");
            assert_eq!(token, "twenty");
        }
        other => panic!("expected invalid argument, got {other:?}"),
    }
    assert_eq!(
        h.sink.sent_to(CHANNEL),
        vec![Reply::text(
            "Invalid value `twenty` for argument `sides`.\nUsage: `-roll <sides>`"
        )]
    );

    assert!(h.dispatcher.dispatch(guild_message(2, "-roll 20")).await.is_completed());
    assert_eq!(
        h.sink.sent_to(CHANNEL).last(),
        Some(&Reply::text("Rolled a d20."))
    );
}

#[tokio::test]
async fn redelivered_message_runs_once() {
    let h = harness();

    assert!(h.dispatcher.dispatch(guild_message(7, "-ping")).await.is_completed());
    let outcome = h.dispatcher.dispatch(guild_message(7, "-ping")).await;
    assert!(matches!(
        outcome,
        DispatchOutcome::Ignored(IgnoreReason::Duplicate)
    ));
    assert_eq!(h.ping_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn direct_messages_need_no_prefix_but_respect_dm_eligibility() {
    let h = harness();

    assert!(h.dispatcher.dispatch(direct_message(1, "ping")).await.is_completed());
    assert!(h.dispatcher.dispatch(direct_message(2, "-ping")).await.is_completed());
    assert_eq!(h.sink.sent_to(999).len(), 2);

    let outcome = h.dispatcher.dispatch(direct_message(3, "greet")).await;
    assert!(matches!(
        outcome,
        DispatchOutcome::Ignored(IgnoreReason::NotAllowedInDm)
    ));
}

#[tokio::test]
async fn private_reply_goes_to_direct_messages() {
    let h = harness();

    let outcome = h.dispatcher.dispatch(guild_message(1, "-whisper a secret")).await;
    assert!(outcome.is_completed());

    assert!(h.sink.sent_to(CHANNEL).is_empty());
    let dm = h.sink.private_channel_of(USER).unwrap();
    assert_eq!(h.sink.sent_to(dm), vec![Reply::text("a secret")]);
}

#[tokio::test]
async fn reply_can_ask_for_private_delivery() {
    let h = harness();

    assert!(h.dispatcher.dispatch(guild_message(1, "-secret")).await.is_completed());

    assert!(h.sink.sent_to(CHANNEL).is_empty());
    let dm = h.sink.private_channel_of(USER).unwrap();
    assert_eq!(h.sink.sent_to(dm), vec![Reply::text("psst").private()]);
}

#[tokio::test]
async fn rest_argument_keeps_original_text() {
    let h = harness();

    let outcome = h
        .dispatcher
        .dispatch(guild_message(1, r#"-whisper meet  at "the usual" spot "#))
        .await;
    assert!(outcome.is_completed());

    let dm = h.sink.private_channel_of(USER).unwrap();
    assert_eq!(
        h.sink.sent_to(dm),
        vec![Reply::text(r#"meet  at "the usual" spot"#)]
    );
}

#[tokio::test]
async fn undeliverable_reply_fails_the_dispatch() {
    let h = harness();
    h.sink.fail_private_channels(true);

    let outcome = h.dispatcher.dispatch(guild_message(1, "-secret")).await;
    match outcome {
        DispatchOutcome::Failed {
            command,
            error: DispatchError::Delivery(_),
        } => assert_eq!(command, "secret"),
        other => panic!("expected delivery failure, got {other:?}"),
    }
    assert!(h.sink.sent().is_empty());
}

#[tokio::test]
async fn unreachable_prefix_store_treats_message_as_text() {
    let h = harness();
    h.memory.set_offline(true);

    let outcome = h.dispatcher.dispatch(guild_message(1, "-ping")).await;
    assert!(matches!(
        outcome,
        DispatchOutcome::Ignored(IgnoreReason::PrefixUnavailable)
    ));
    assert!(h.sink.sent().is_empty());
    assert_eq!(h.ping_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unreachable_cooldown_store_blocks_execution() {
    let h = harness();
    h.memory.set_offline(true);

    // Direct messages resolve their prefix without the store.
    let outcome = h.dispatcher.dispatch(direct_message(1, "daily")).await;
    assert!(matches!(
        outcome,
        DispatchOutcome::Failed {
            error: DispatchError::StoreUnavailable(_),
            ..
        }
    ));
    assert!(h.sink.sent().is_empty());

    // Commands without a cooldown never touch it.
    assert!(h.dispatcher.dispatch(direct_message(2, "ping")).await.is_completed());
}
