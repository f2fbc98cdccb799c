pub mod args;
pub mod command;
pub mod dispatch;
pub mod error;
pub mod help;
pub mod invocation;
pub mod registry;
pub mod reply;
pub mod sink;

use hearth_database::{CooldownTracker, Database, PrefixStore};

pub use args::{ArgInput, ArgValue, Arguments};
pub use command::{ArgumentDecl, ArgumentKind, CommandDefinition, CommandHandler};
pub use dispatch::{DispatchOutcome, Dispatcher, IgnoreReason};
pub use error::{ArgumentError, CommandNotFound, DispatchError, RegistrationError};
pub use invocation::{Invocation, MessageEvent};
pub use registry::{CommandContainer, CommandRegistry};
pub use reply::Reply;
pub use sink::OutputSink;

pub type Error = anyhow::Error;

/// Shared state handed to every invocation.
#[derive(Clone, Debug)]
pub struct Data {
    pub prefixes: PrefixStore,
    pub cooldowns: CooldownTracker,
}

impl Data {
    pub fn new(db: Database, default_prefix: impl Into<String>) -> Self {
        Self {
            prefixes: PrefixStore::new(db.clone(), default_prefix),
            cooldowns: CooldownTracker::new(db),
        }
    }
}
