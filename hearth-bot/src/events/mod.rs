use std::sync::Arc;

use async_trait::async_trait;
use serenity::all::{Context, EventHandler, Guild, Message, Ready};
use tracing::{error, info};

use hearth_core::{Dispatcher, MessageEvent};

pub struct Handler {
    dispatcher: Arc<Dispatcher>,
}

impl Handler {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn message(&self, _ctx: Context, message: Message) {
        let event = MessageEvent {
            message_id: message.id.get(),
            content: message.content,
            author_id: message.author.id.get(),
            // Webhook messages never run commands.
            author_is_bot: message.author.bot || message.webhook_id.is_some(),
            channel_id: message.channel_id.get(),
            guild_id: message.guild_id.map(|guild_id| guild_id.get()),
        };

        self.dispatcher.spawn(event);
    }

    async fn guild_create(&self, _ctx: Context, guild: Guild, _is_new: Option<bool>) {
        let prefixes = &self.dispatcher.data().prefixes;
        if let Err(error) = prefixes.ensure_default(guild.id.get(), &guild.name).await {
            error!(
                ?error,
                guild_id = guild.id.get(),
                "failed setting default command prefix"
            );
        }
    }

    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!(
            user = %ready.user.name,
            guilds = ready.guilds.len(),
            "Hearth has awoken!"
        );
    }
}
