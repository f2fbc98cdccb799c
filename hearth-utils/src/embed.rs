/// Default embed color used across the bot UI.
pub const DEFAULT_EMBED_COLOR: u32 = 0xD9_6C_2B;

/// Color used for error and failure embeds.
pub const ERROR_EMBED_COLOR: u32 = 0xC0_39_2B;

/// A single titled field inside an [`Embed`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

/// Structured rich content, independent of any chat platform.
///
/// The gateway adapter converts this into the platform's own embed type
/// right before sending.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Embed {
    pub title: Option<String>,
    pub description: Option<String>,
    pub color: Option<u32>,
    pub fields: Vec<EmbedField>,
    pub footer: Option<String>,
}

impl Embed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn color(mut self, color: u32) -> Self {
        self.color = Some(color);
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }

    pub fn footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }
}

/// Build a standard paginated embed with consistent styling.
pub fn build_paginated_embed(
    title: &str,
    description: impl Into<String>,
    page: usize,
    total_pages: usize,
) -> Embed {
    build_paginated_embed_with_footer_note(title, description, page, total_pages, None)
}

/// Build a standard paginated embed with an optional footer suffix.
pub fn build_paginated_embed_with_footer_note(
    title: &str,
    description: impl Into<String>,
    page: usize,
    total_pages: usize,
    footer_note: Option<&str>,
) -> Embed {
    let page = page.max(1);
    let total_pages = total_pages.max(1);

    let footer_text = if total_pages > 1 {
        match footer_note {
            Some(note) if !note.is_empty() => format!("Page {}/{} • {}", page, total_pages, note),
            _ => format!("Page {}/{}", page, total_pages),
        }
    } else {
        match footer_note {
            Some(note) if !note.is_empty() => note.to_owned(),
            _ => String::new(),
        }
    };

    let builder = Embed::new()
        .title(title)
        .color(DEFAULT_EMBED_COLOR)
        .description(description);

    if footer_text.is_empty() {
        builder
    } else {
        builder.footer(footer_text)
    }
}

/// Build the embed shown when a command fails unexpectedly.
pub fn error_embed(description: impl Into<String>) -> Embed {
    Embed::new()
        .title("Command Error")
        .description(description)
        .color(ERROR_EMBED_COLOR)
}
