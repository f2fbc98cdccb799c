use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::Error;
use crate::invocation::Invocation;
use crate::reply::Reply;

/// The single capability every command provides.
///
/// Returning `Ok(None)` means the handler already delivered whatever it
/// wanted to send (or had nothing to say).
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn execute(&self, invocation: &Invocation<'_>) -> Result<Option<Reply>, Error>;
}

/// How many tokens an argument consumes and what it converts them into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArgumentKind {
    /// One token, verbatim.
    String,
    Integer,
    Number,
    Boolean,
    /// A user mention or bare user id.
    User,
    /// A channel mention or bare channel id.
    Channel,
    /// Every remaining token, joined with single spaces.
    Rest,
}

impl ArgumentKind {
    pub fn display_name(self) -> &'static str {
        match self {
            Self::String => "text",
            Self::Integer => "whole number",
            Self::Number => "number",
            Self::Boolean => "yes/no",
            Self::User => "user",
            Self::Channel => "channel",
            Self::Rest => "text",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArgumentDecl {
    pub name: String,
    pub kind: ArgumentKind,
    pub required: bool,
    pub description: Option<String>,
}

impl ArgumentDecl {
    pub fn required(name: impl Into<String>, kind: ArgumentKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: true,
            description: None,
        }
    }

    pub fn optional(name: impl Into<String>, kind: ArgumentKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            description: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Usage fragment: `<name>`, `[name]`, with `...` for rest-of-line.
    pub fn usage(&self) -> String {
        let rest = if self.kind == ArgumentKind::Rest { "..." } else { "" };
        if self.required {
            format!("<{}{}>", self.name, rest)
        } else {
            format!("[{}{}]", self.name, rest)
        }
    }
}

/// A named, registered command. Immutable once added to a container.
#[derive(Clone)]
pub struct CommandDefinition {
    name: String,
    aliases: Vec<String>,
    category: String,
    description: String,
    arguments: Vec<ArgumentDecl>,
    cooldown: Duration,
    run_in_dm: bool,
    private_reply: bool,
    hidden: bool,
    handler: Arc<dyn CommandHandler>,
}

impl CommandDefinition {
    pub fn new(name: impl Into<String>, handler: impl CommandHandler + 'static) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            category: "general".to_owned(),
            description: String::new(),
            arguments: Vec::new(),
            cooldown: Duration::ZERO,
            run_in_dm: false,
            private_reply: false,
            hidden: false,
            handler: Arc::new(handler),
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn argument(mut self, argument: ArgumentDecl) -> Self {
        self.arguments.push(argument);
        self
    }

    pub fn cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    pub fn run_in_dm(mut self, run_in_dm: bool) -> Self {
        self.run_in_dm = run_in_dm;
        self
    }

    /// Route successful replies to the author's direct messages.
    pub fn private_reply(mut self, private_reply: bool) -> Self {
        self.private_reply = private_reply;
        self
    }

    /// Keep the command out of the full help listing.
    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn category_name(&self) -> &str {
        &self.category
    }

    pub fn description_text(&self) -> &str {
        &self.description
    }

    pub fn arguments(&self) -> &[ArgumentDecl] {
        &self.arguments
    }

    pub fn cooldown_duration(&self) -> Duration {
        self.cooldown
    }

    pub fn runs_in_dm(&self) -> bool {
        self.run_in_dm
    }

    pub fn replies_privately(&self) -> bool {
        self.private_reply
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn handler(&self) -> &dyn CommandHandler {
        self.handler.as_ref()
    }

    /// Name followed by aliases.
    pub fn triggers(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }

    pub fn matches(&self, token: &str) -> bool {
        self.triggers()
            .any(|trigger| trigger.eq_ignore_ascii_case(token))
    }

    /// Argument portion of the usage line, e.g. `<user> [reason...]`.
    pub fn argument_usage(&self) -> String {
        self.arguments
            .iter()
            .map(ArgumentDecl::usage)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Debug for CommandDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDefinition")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("category", &self.category)
            .field("arguments", &self.arguments)
            .field("cooldown", &self.cooldown)
            .field("run_in_dm", &self.run_in_dm)
            .field("private_reply", &self.private_reply)
            .field("hidden", &self.hidden)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::{ArgumentDecl, ArgumentKind, CommandDefinition, CommandHandler};
    use crate::Error;
    use crate::invocation::Invocation;
    use crate::reply::Reply;

    struct Noop;

    #[async_trait]
    impl CommandHandler for Noop {
        async fn execute(&self, _invocation: &Invocation<'_>) -> Result<Option<Reply>, Error> {
            Ok(None)
        }
    }

    #[test]
    fn matches_name_and_aliases_case_insensitively() {
        let command = CommandDefinition::new("ping", Noop).alias("p");
        assert!(command.matches("PING"));
        assert!(command.matches("p"));
        assert!(!command.matches("pong"));
    }

    #[test]
    fn argument_usage_marks_optional_and_rest() {
        let command = CommandDefinition::new("kick", Noop)
            .argument(ArgumentDecl::required("user", ArgumentKind::User))
            .argument(ArgumentDecl::optional("reason", ArgumentKind::Rest));

        assert_eq!(command.argument_usage(), "<user> [reason...]");
    }
}
