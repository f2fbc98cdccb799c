/// Split message text into whitespace-delimited tokens.
///
/// A double-quoted span becomes a single token with the quotes removed, so
/// `say "hello there"` yields `["say", "hello there"]`. An unterminated quote
/// runs to the end of the input.
pub fn split_tokens(raw: &str) -> Vec<String> {
    split_token_spans(raw)
        .into_iter()
        .map(|(_, token)| token)
        .collect()
}

/// Like [`split_tokens`], paired with the byte offset in `raw` where each
/// token starts (its opening quote, if quoted).
pub fn split_token_spans(raw: &str) -> Vec<(usize, String)> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut start = None;
    let mut in_quotes = false;

    for (index, ch) in raw.char_indices() {
        if ch.is_whitespace() && !in_quotes {
            if let Some(begin) = start.take() {
                tokens.push((begin, std::mem::take(&mut current)));
            }
            continue;
        }

        start.get_or_insert(index);
        if ch == '"' {
            in_quotes = !in_quotes;
        } else {
            current.push(ch);
        }
    }

    if let Some(begin) = start {
        tokens.push((begin, current));
    }

    tokens
}

/// Parse a user reference: `<@123>`, `<@!123>` or a bare snowflake.
pub fn parse_user_mention(raw: &str) -> Option<u64> {
    let value = raw.trim();
    let inner = value
        .strip_prefix("<@")
        .and_then(|rest| rest.strip_suffix('>'))
        .map(|inner| inner.strip_prefix('!').unwrap_or(inner));

    parse_snowflake(inner.unwrap_or(value))
}

/// Parse a channel reference: `<#123>` or a bare snowflake.
pub fn parse_channel_mention(raw: &str) -> Option<u64> {
    let value = raw.trim();
    let inner = value
        .strip_prefix("<#")
        .and_then(|rest| rest.strip_suffix('>'));

    parse_snowflake(inner.unwrap_or(value))
}

/// Parse a loose boolean flag (`true`/`false`, `yes`/`no`, `on`/`off`, `1`/`0`).
pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" | "y" => Some(true),
        "0" | "false" | "no" | "off" | "n" => Some(false),
        _ => None,
    }
}

fn parse_snowflake(raw: &str) -> Option<u64> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    raw.parse::<u64>().ok().filter(|id| *id > 0)
}
