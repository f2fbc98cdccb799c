use hearth_utils::embed::{
    DEFAULT_EMBED_COLOR, Embed, build_paginated_embed, build_paginated_embed_with_footer_note,
};
use hearth_utils::formatting::{display_category, format_compact_duration};

use crate::args::tokenize;
use crate::command::CommandDefinition;
use crate::invocation::Invocation;
use crate::registry::{CommandEntry, CommandRegistry, Lookup, qualified_name};

pub const HELP_COMMANDS_PER_PAGE: usize = 20;

/// What help needs to know about where it was asked for.
#[derive(Clone, Copy, Debug)]
pub struct HelpContext<'a> {
    pub prefix: &'a str,
    pub direct_message: bool,
}

impl<'a> HelpContext<'a> {
    pub fn from_invocation(invocation: &'a Invocation<'_>) -> Self {
        Self {
            prefix: invocation.display_prefix(),
            direct_message: invocation.is_direct_message(),
        }
    }
}

/// Rendering strategy for help output.
pub trait HelpFormatter: Send + Sync {
    /// Detailed help for one command.
    fn command(&self, entry: &CommandEntry<'_>, prefix: &str) -> Embed;

    /// A paged overview of several commands.
    fn listing(&self, title: &str, entries: &[CommandEntry<'_>], prefix: &str) -> Vec<Embed>;
}

/// Usage line, e.g. `-kick <user> [reason...]`.
pub fn usage_line(prefix: &str, qualified_name: &str, command: &CommandDefinition) -> String {
    let args = command.argument_usage();
    if args.is_empty() {
        format!("{prefix}{qualified_name}")
    } else {
        format!("{prefix}{qualified_name} {args}")
    }
}

/// Command-not-found text shown by help lookups.
pub fn command_not_found_message(search: &str) -> String {
    format!("Couldn't find command {search:?}")
}

#[derive(Clone, Debug)]
pub struct StdHelpFormatter {
    per_page: usize,
}

impl Default for StdHelpFormatter {
    fn default() -> Self {
        Self {
            per_page: HELP_COMMANDS_PER_PAGE,
        }
    }
}

impl StdHelpFormatter {
    pub fn with_page_size(per_page: usize) -> Self {
        Self {
            per_page: per_page.max(1),
        }
    }
}

impl HelpFormatter for StdHelpFormatter {
    fn command(&self, entry: &CommandEntry<'_>, prefix: &str) -> Embed {
        let command = entry.command;
        let description = match command.description_text() {
            "" => "No description.",
            text => text,
        };

        let mut embed = Embed::new()
            .title(format!("{prefix}{}", entry.qualified_name))
            .color(DEFAULT_EMBED_COLOR)
            .description(description)
            .field(
                "Usage",
                format!("`{}`", usage_line(prefix, &entry.qualified_name, command)),
                false,
            );

        if !command.aliases().is_empty() {
            let aliases = command
                .aliases()
                .iter()
                .map(|alias| format!("`{alias}`"))
                .collect::<Vec<_>>()
                .join(", ");
            embed = embed.field("Aliases", aliases, true);
        }

        if !command.arguments().is_empty() {
            let lines = command
                .arguments()
                .iter()
                .map(|arg| {
                    let requirement = if arg.required { "required" } else { "optional" };
                    match &arg.description {
                        Some(text) => format!(
                            "`{}` ({}, {}): {}",
                            arg.name,
                            arg.kind.display_name(),
                            requirement,
                            text
                        ),
                        None => format!(
                            "`{}` ({}, {})",
                            arg.name,
                            arg.kind.display_name(),
                            requirement
                        ),
                    }
                })
                .collect::<Vec<_>>()
                .join("\n");
            embed = embed.field("Arguments", lines, false);
        }

        let cooldown = command.cooldown_duration();
        if !cooldown.is_zero() {
            let seconds = u64::try_from(cooldown.as_millis().div_ceil(1_000)).unwrap_or(u64::MAX);
            embed = embed.field("Cooldown", format_compact_duration(seconds), true);
        }

        embed.footer(format!(
            "Category: {}",
            display_category(command.category_name())
        ))
    }

    fn listing(&self, title: &str, entries: &[CommandEntry<'_>], prefix: &str) -> Vec<Embed> {
        let mut sorted: Vec<&CommandEntry<'_>> = entries.iter().collect();
        sorted.sort_by(|left, right| {
            left.command
                .category_name()
                .cmp(right.command.category_name())
                .then_with(|| left.qualified_name.cmp(&right.qualified_name))
        });

        if sorted.is_empty() {
            return vec![build_paginated_embed(title, "No commands available.", 1, 1)];
        }

        let total = total_pages(sorted.len(), self.per_page);
        let note = format!("{prefix}help <command> for details");

        (1..=total)
            .map(|page| {
                let (start, end) = page_window(sorted.len(), self.per_page, page);
                build_paginated_embed_with_footer_note(
                    title,
                    grouped_help_description(&sorted[start..end]),
                    page,
                    total,
                    Some(&note),
                )
            })
            .collect()
    }
}

/// Builds help content from the registry. Read-only.
pub struct HelpGenerator<'r, F = StdHelpFormatter> {
    registry: &'r CommandRegistry,
    formatter: F,
}

impl<'r, F: HelpFormatter> HelpGenerator<'r, F> {
    pub fn new(registry: &'r CommandRegistry, formatter: F) -> Self {
        Self {
            registry,
            formatter,
        }
    }

    /// Help for one command or container path. `None` when the path names
    /// nothing usable in this context.
    pub fn targeted_help(&self, target: &str, ctx: &HelpContext<'_>) -> Option<Vec<Embed>> {
        let target = target.trim();
        let target = match ctx.prefix {
            "" => target,
            prefix => target.strip_prefix(prefix).unwrap_or(target),
        };

        let path = tokenize(target);
        if path.is_empty() {
            return None;
        }

        match self.registry.lookup(&path)? {
            Lookup::Command { command, chain } => {
                let runs_in_dm =
                    command.runs_in_dm() && chain.iter().all(|container| container.runs_in_dm());
                if ctx.direct_message && !runs_in_dm {
                    return None;
                }

                let entry = CommandEntry {
                    qualified_name: qualified_name(&chain, command.name()),
                    command,
                    runs_in_dm,
                };
                Some(vec![self.formatter.command(&entry, ctx.prefix)])
            }
            Lookup::Container { container, chain } => {
                let runs_in_dm = container.runs_in_dm()
                    && chain.iter().all(|parent| parent.runs_in_dm());
                if ctx.direct_message && !runs_in_dm {
                    return None;
                }

                let entries = visible(self.registry.commands_under(container, &chain), ctx);
                let title = format!("{} commands", qualified_name(&chain, container.name()));
                Some(self.formatter.listing(&title, &entries, ctx.prefix))
            }
        }
    }

    /// Every command usable in this context, paged.
    pub fn full_help(&self, ctx: &HelpContext<'_>) -> Vec<Embed> {
        let entries = visible(self.registry.commands(), ctx);
        self.formatter
            .listing("Available Commands", &entries, ctx.prefix)
    }
}

fn visible<'r>(entries: Vec<CommandEntry<'r>>, ctx: &HelpContext<'_>) -> Vec<CommandEntry<'r>> {
    entries
        .into_iter()
        .filter(|entry| !entry.command.is_hidden())
        .filter(|entry| !ctx.direct_message || entry.runs_in_dm)
        .collect()
}

fn total_pages(total_items: usize, per_page: usize) -> usize {
    let per_page = per_page.max(1);
    let pages = total_items.div_ceil(per_page);
    pages.max(1)
}

fn page_window(total_items: usize, per_page: usize, page: usize) -> (usize, usize) {
    let per_page = per_page.max(1);
    let page = page.max(1);
    let start = (page - 1).saturating_mul(per_page).min(total_items);
    let end = (start + per_page).min(total_items);
    (start, end)
}

fn grouped_help_description(entries: &[&CommandEntry<'_>]) -> String {
    let mut out = String::new();
    let mut current_category: Option<&str> = None;

    for entry in entries {
        let category = entry.command.category_name();
        if current_category != Some(category) {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(&format!("**{}**\n", display_category(category)));
            current_category = Some(category);
        }

        let description = entry.command.description_text();
        if description.is_empty() {
            out.push_str(&format!("`{}`\n", entry.qualified_name));
        } else {
            out.push_str(&format!("`{}`: {}\n", entry.qualified_name, description));
        }
    }

    if out.is_empty() {
        out.push_str("No commands available.");
    }

    out.trim_end().to_owned()
}
