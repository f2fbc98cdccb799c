pub mod config;
pub mod utility;

use hearth_core::{CommandContainer, CommandDefinition, RegistrationError};

/// Every top-level built-in command.
pub fn commands() -> Vec<CommandDefinition> {
    vec![utility::ping::ping(), utility::help::help()]
}

/// The root container with all built-ins registered.
///
/// Fails on a duplicate name or alias; callers treat that as fatal.
pub fn root_container() -> Result<CommandContainer, RegistrationError> {
    let mut root = CommandContainer::root();
    for command in commands() {
        root.add_command(command)?;
    }
    root.add_command(config::prefix::prefix())?;
    Ok(root)
}

#[cfg(test)]
mod tests {
    use hearth_core::CommandRegistry;

    use super::root_container;

    #[test]
    fn built_ins_register_without_conflicts() {
        let registry = CommandRegistry::new(root_container().unwrap());
        let names = registry
            .commands()
            .into_iter()
            .map(|entry| entry.qualified_name)
            .collect::<Vec<_>>();

        assert!(names.contains(&"help".to_owned()));
        assert!(names.contains(&"ping".to_owned()));
        assert!(names.contains(&"prefix".to_owned()));
    }
}
