use std::sync::Arc;

use anyhow::Context as _;
use async_trait::async_trait;
use serenity::all::{
    ChannelId, CreateEmbed, CreateEmbedFooter, CreateMessage, GuildId, Http, Permissions, RoleId,
    UserId,
};

use hearth_core::{OutputSink, Reply};
use hearth_utils::embed::Embed;

/// Most embeds a single message may carry.
const MAX_EMBEDS_PER_MESSAGE: usize = 10;

/// Delivers replies through the Discord REST API.
#[derive(Clone)]
pub struct SerenityOutputSink {
    http: Arc<Http>,
}

impl SerenityOutputSink {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl OutputSink for SerenityOutputSink {
    async fn send(&self, channel_id: u64, reply: &Reply) -> anyhow::Result<()> {
        let channel_id = ChannelId::new(channel_id);
        let embeds = reply.embeds.iter().map(to_create_embed).collect::<Vec<_>>();

        let mut batches = embeds.chunks(MAX_EMBEDS_PER_MESSAGE);
        let mut message = CreateMessage::new().embeds(batches.next().unwrap_or_default().to_vec());
        if let Some(content) = &reply.content {
            message = message.content(content);
        }
        channel_id
            .send_message(self.http.as_ref(), message)
            .await
            .context("failed sending message")?;

        for batch in batches {
            channel_id
                .send_message(self.http.as_ref(), CreateMessage::new().embeds(batch.to_vec()))
                .await
                .context("failed sending message")?;
        }

        Ok(())
    }

    async fn open_private_channel(&self, user_id: u64) -> anyhow::Result<u64> {
        let channel = UserId::new(user_id)
            .create_dm_channel(self.http.as_ref())
            .await
            .context("failed creating private channel")?;
        Ok(channel.id.get())
    }

    async fn can_manage_guild(&self, guild_id: u64, user_id: u64) -> anyhow::Result<bool> {
        let perms = resolve_user_permissions(&self.http, GuildId::new(guild_id), UserId::new(user_id))
            .await?;
        Ok(perms.contains(Permissions::ADMINISTRATOR) || perms.contains(Permissions::MANAGE_GUILD))
    }
}

/// Guild-level permissions of a member: owner gets everything, everyone else
/// the union of `@everyone` and their roles.
async fn resolve_user_permissions(
    http: &Http,
    guild_id: GuildId,
    user_id: UserId,
) -> anyhow::Result<Permissions> {
    let guild = guild_id.to_partial_guild(http).await?;
    if guild.owner_id == user_id {
        return Ok(Permissions::all());
    }

    let member = guild_id.member(http, user_id).await?;
    let roles = guild_id.roles(http).await?;

    let everyone_role_id = RoleId::new(guild_id.get());
    let resolved = roles
        .values()
        .filter(|role| role.id == everyone_role_id || member.roles.contains(&role.id))
        .fold(Permissions::empty(), |acc, role| acc | role.permissions);

    Ok(resolved)
}

fn to_create_embed(embed: &Embed) -> CreateEmbed {
    let mut builder = CreateEmbed::new();
    if let Some(color) = embed.color {
        builder = builder.color(color);
    }
    if let Some(title) = &embed.title {
        builder = builder.title(title);
    }
    if let Some(description) = &embed.description {
        builder = builder.description(description);
    }
    for field in &embed.fields {
        builder = builder.field(&field.name, &field.value, field.inline);
    }
    if let Some(footer) = &embed.footer {
        builder = builder.footer(CreateEmbedFooter::new(footer));
    }
    builder
}
