use std::sync::Arc;

use crate::command::CommandDefinition;
use crate::error::{CommandNotFound, RegistrationError};

#[derive(Debug)]
pub enum CommandNode {
    Command(Arc<CommandDefinition>),
    Container(CommandContainer),
}

impl CommandNode {
    fn matches(&self, token: &str) -> bool {
        match self {
            Self::Command(command) => command.matches(token),
            Self::Container(container) => container.matches(token),
        }
    }

    fn triggers(&self) -> Vec<&str> {
        match self {
            Self::Command(command) => command.triggers().collect(),
            Self::Container(container) => container.triggers().collect(),
        }
    }
}

/// A node grouping commands and nested containers (sub-commands).
#[derive(Debug)]
pub struct CommandContainer {
    name: String,
    aliases: Vec<String>,
    description: String,
    run_in_dm: bool,
    children: Vec<CommandNode>,
}

impl CommandContainer {
    /// The unnamed top-level container. Usable in direct messages.
    pub fn root() -> Self {
        Self {
            name: String::new(),
            aliases: Vec::new(),
            description: String::new(),
            run_in_dm: true,
            children: Vec::new(),
        }
    }

    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::root()
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn run_in_dm(mut self, run_in_dm: bool) -> Self {
        self.run_in_dm = run_in_dm;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description_text(&self) -> &str {
        &self.description
    }

    pub fn runs_in_dm(&self) -> bool {
        self.run_in_dm
    }

    pub fn children(&self) -> &[CommandNode] {
        &self.children
    }

    pub fn triggers(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }

    pub fn matches(&self, token: &str) -> bool {
        self.triggers()
            .any(|trigger| trigger.eq_ignore_ascii_case(token))
    }

    pub fn find(&self, token: &str) -> Option<&CommandNode> {
        self.children.iter().find(|child| child.matches(token))
    }

    /// Register a command. Fails on an empty name or a trigger clash.
    pub fn add_command(&mut self, command: CommandDefinition) -> Result<(), RegistrationError> {
        let node = CommandNode::Command(Arc::new(command));
        self.insert(node)
    }

    pub fn add_container(&mut self, container: CommandContainer) -> Result<(), RegistrationError> {
        self.insert(CommandNode::Container(container))
    }

    fn insert(&mut self, node: CommandNode) -> Result<(), RegistrationError> {
        let triggers = node.triggers();

        for (index, trigger) in triggers.iter().enumerate() {
            if trigger.is_empty() || trigger.chars().any(char::is_whitespace) {
                return Err(RegistrationError::InvalidName((*trigger).to_owned()));
            }

            let clashes_with_self = triggers[..index]
                .iter()
                .any(|earlier| earlier.eq_ignore_ascii_case(trigger));
            if clashes_with_self || self.find(trigger).is_some() {
                return Err(RegistrationError::Conflict {
                    container: self.display_name().to_owned(),
                    trigger: (*trigger).to_owned(),
                });
            }
        }

        self.children.push(node);
        Ok(())
    }

    fn display_name(&self) -> &str {
        if self.name.is_empty() { "root" } else { &self.name }
    }
}

/// A command matched by [`CommandRegistry::resolve`].
#[derive(Debug)]
pub struct Resolved<'r, 'p> {
    pub command: &'r CommandDefinition,
    /// Containers walked through, root first.
    pub chain: Vec<&'r CommandContainer>,
    /// Tokens after the command name, still unparsed.
    pub remaining: &'p [String],
}

impl Resolved<'_, '_> {
    /// Full invocation path, e.g. `config prefix`.
    pub fn qualified_name(&self) -> String {
        qualified_name(&self.chain, self.command.name())
    }

    /// Whether the command and every container above it allow direct messages.
    pub fn runs_in_dm(&self) -> bool {
        self.command.runs_in_dm() && self.chain.iter().all(|container| container.runs_in_dm())
    }
}

/// Exact path lookup used for targeted help.
#[derive(Debug)]
pub enum Lookup<'r> {
    Command {
        command: &'r CommandDefinition,
        chain: Vec<&'r CommandContainer>,
    },
    Container {
        container: &'r CommandContainer,
        chain: Vec<&'r CommandContainer>,
    },
}

/// One leaf of the tree, as enumerated for help.
#[derive(Debug, Clone)]
pub struct CommandEntry<'r> {
    pub qualified_name: String,
    pub command: &'r CommandDefinition,
    pub runs_in_dm: bool,
}

/// Read-only command tree, built at startup and shared for the process lifetime.
#[derive(Debug)]
pub struct CommandRegistry {
    root: CommandContainer,
}

impl CommandRegistry {
    pub fn new(root: CommandContainer) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &CommandContainer {
        &self.root
    }

    /// Walk `path` depth-first, stopping at the first token naming a command.
    pub fn resolve<'r, 'p>(
        &'r self,
        path: &'p [String],
    ) -> Result<Resolved<'r, 'p>, CommandNotFound> {
        let mut container = &self.root;
        let mut chain = vec![container];

        for (index, token) in path.iter().enumerate() {
            match container.find(token) {
                Some(CommandNode::Command(command)) => {
                    return Ok(Resolved {
                        command,
                        chain,
                        remaining: &path[index + 1..],
                    });
                }
                Some(CommandNode::Container(child)) => {
                    container = child;
                    chain.push(child);
                }
                None => {
                    return Err(CommandNotFound {
                        name: token.clone(),
                    });
                }
            }
        }

        Err(CommandNotFound {
            name: path.join(" "),
        })
    }

    /// Find the node named by exactly `path`. An empty path names the root.
    pub fn lookup(&self, path: &[String]) -> Option<Lookup<'_>> {
        let mut container = &self.root;
        let mut chain = Vec::new();

        for (index, token) in path.iter().enumerate() {
            match container.find(token)? {
                CommandNode::Command(command) => {
                    if index + 1 != path.len() {
                        return None;
                    }
                    chain.push(container);
                    return Some(Lookup::Command { command, chain });
                }
                CommandNode::Container(child) => {
                    chain.push(container);
                    container = child;
                }
            }
        }

        Some(Lookup::Container { container, chain })
    }

    /// Every command below `container`, in registration order.
    pub fn commands_under<'r>(
        &'r self,
        container: &'r CommandContainer,
        chain: &[&'r CommandContainer],
    ) -> Vec<CommandEntry<'r>> {
        let mut out = Vec::new();
        let mut path = chain.to_vec();
        collect_commands(container, &mut path, &mut out);
        out
    }

    /// Every command in the tree, in registration order.
    pub fn commands(&self) -> Vec<CommandEntry<'_>> {
        self.commands_under(&self.root, &[])
    }
}

fn collect_commands<'r>(
    container: &'r CommandContainer,
    path: &mut Vec<&'r CommandContainer>,
    out: &mut Vec<CommandEntry<'r>>,
) {
    path.push(container);

    for child in &container.children {
        match child {
            CommandNode::Command(command) => out.push(CommandEntry {
                qualified_name: qualified_name(path, command.name()),
                command,
                runs_in_dm: command.runs_in_dm() && path.iter().all(|c| c.runs_in_dm()),
            }),
            CommandNode::Container(nested) => collect_commands(nested, path, out),
        }
    }

    path.pop();
}

pub(crate) fn qualified_name(chain: &[&CommandContainer], leaf: &str) -> String {
    chain
        .iter()
        .map(|container| container.name())
        .filter(|name| !name.is_empty())
        .chain(std::iter::once(leaf))
        .collect::<Vec<_>>()
        .join(" ")
}
