use std::time::Duration;

use anyhow::Context as _;
use async_trait::async_trait;
use tracing::debug;

use hearth_core::help::{HelpContext, HelpGenerator, StdHelpFormatter, command_not_found_message};
use hearth_core::{
    ArgumentDecl, ArgumentKind, CommandDefinition, CommandHandler, Error, Invocation, Reply,
};

const HELP_COOLDOWN: Duration = Duration::from_secs(10);

pub struct Help;

#[async_trait]
impl CommandHandler for Help {
    async fn execute(&self, invocation: &Invocation<'_>) -> Result<Option<Reply>, Error> {
        let generator = HelpGenerator::new(invocation.registry, StdHelpFormatter::default());
        let ctx = HelpContext::from_invocation(invocation);

        if let Some(target) = invocation
            .args
            .by_name("command")
            .as_str()
            .map(str::trim)
            .filter(|target| !target.is_empty())
        {
            return Ok(Some(match generator.targeted_help(target, &ctx) {
                Some(pages) => Reply::embeds(pages),
                None => Reply::text(command_not_found_message(target)),
            }));
        }

        let channel_id = invocation
            .sink
            .open_private_channel(invocation.author_id())
            .await
            .context("failed opening private channel for help")?;

        let pages = generator.full_help(&ctx);
        debug!(
            user_id = invocation.author_id(),
            pages = pages.len(),
            "sending full help"
        );
        for page in pages {
            invocation
                .sink
                .send(channel_id, &Reply::embed(page))
                .await
                .context("failed sending help page")?;
        }

        Ok(None)
    }
}

pub fn help() -> CommandDefinition {
    CommandDefinition::new("help", Help)
        .category("utility")
        .description("Shows help about all or one specific command.")
        .argument(
            ArgumentDecl::optional("command", ArgumentKind::Rest)
                .description("Command or group to describe"),
        )
        .cooldown(HELP_COOLDOWN)
        .run_in_dm(true)
}
