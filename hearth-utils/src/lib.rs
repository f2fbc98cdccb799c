/// Platform-neutral rich content and the shared embed builders.
pub mod embed;
/// Shared formatting helpers (durations, category labels).
pub mod formatting;
/// Default command prefix assigned to a guild on first contact.
pub const DEFAULT_COMMAND_PREFIX: &str = "-";
/// Pure parser helpers.
pub mod parse;
/// Shared time helpers.
pub mod time;
