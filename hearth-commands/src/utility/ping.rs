use async_trait::async_trait;

use hearth_core::{CommandDefinition, CommandHandler, Error, Invocation, Reply};

pub struct Ping;

#[async_trait]
impl CommandHandler for Ping {
    async fn execute(&self, _invocation: &Invocation<'_>) -> Result<Option<Reply>, Error> {
        Ok(Some(Reply::text("Pong!")))
    }
}

pub fn ping() -> CommandDefinition {
    CommandDefinition::new("ping", Ping)
        .alias("p")
        .category("utility")
        .description("Replies with Pong!")
        .run_in_dm(true)
}
