use async_trait::async_trait;

use hearth_core::{
    ArgumentDecl, ArgumentKind, CommandDefinition, CommandHandler, Error, Invocation, Reply,
};
use hearth_database::PrefixError;

pub struct Prefix;

#[async_trait]
impl CommandHandler for Prefix {
    async fn execute(&self, invocation: &Invocation<'_>) -> Result<Option<Reply>, Error> {
        let Some(guild_id) = invocation.guild_id() else {
            return Ok(Some(Reply::text("This command can only be used in a server.")));
        };
        let prefixes = &invocation.data.prefixes;

        let Some(new_prefix) = invocation
            .args
            .by_name("new")
            .as_str()
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
        else {
            let current = prefixes.resolve(guild_id).await?;
            return Ok(Some(Reply::text(format!(
                "Current command prefix: `{}`",
                current
            ))));
        };

        if !invocation
            .sink
            .can_manage_guild(guild_id, invocation.author_id())
            .await?
        {
            return Ok(Some(Reply::text(
                "You need the Manage Server permission to change the prefix.",
            )));
        }

        match prefixes.set(guild_id, new_prefix).await {
            Ok(()) => Ok(Some(Reply::text(format!(
                "Command prefix set to `{}`.",
                new_prefix
            )))),
            Err(error) => match error.downcast_ref::<PrefixError>() {
                Some(invalid) => Ok(Some(Reply::text(invalid_prefix_message(invalid)))),
                None => Err(error),
            },
        }
    }
}

fn invalid_prefix_message(error: &PrefixError) -> String {
    match error {
        PrefixError::Empty => "The prefix can't be empty.".to_owned(),
        PrefixError::ContainsWhitespace => "The prefix can't contain spaces.".to_owned(),
        PrefixError::TooLong { max } => {
            format!("The prefix can be at most {} characters long.", max)
        }
    }
}

pub fn prefix() -> CommandDefinition {
    CommandDefinition::new("prefix", Prefix)
        .category("config")
        .description("Shows or changes the command prefix for this server.")
        .argument(ArgumentDecl::optional("new", ArgumentKind::String).description("New prefix"))
}
