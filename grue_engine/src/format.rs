//! Structured output formatting.
//!
//! Things that need to print more than a sentence (a room's contents, the player's inventory)
//! build a [`Payload`] and ask the world's [`Formatter`] to render it. The engine only relies on
//! two kinds, `text` and `list`; a formatter falls back to `text` for anything it doesn't know.

use variantly::Variantly;

/// A label plus the lines or items it introduces.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Payload {
    pub label: Option<String>,
    pub data: Vec<String>,
}

impl Payload {
    pub fn new(label: Option<String>, data: Vec<String>) -> Self {
        Self { label, data }
    }

    pub fn labelled(label: impl Into<String>, data: Vec<String>) -> Self {
        Self::new(Some(label.into()), data)
    }
}

/// The rendering styles the engine asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Variantly)]
pub enum FormatKind {
    /// Lines joined into one block.
    Text,
    /// A label followed by one indented item per line.
    List,
}

impl FormatKind {
    /// Parse a kind name. Unknown names become [`FormatKind::Text`].
    pub fn from_name(name: &str) -> Self {
        match name {
            "list" => FormatKind::List,
            _ => FormatKind::Text,
        }
    }
}

/// Renders payloads into display strings.
pub trait Formatter {
    fn render(&self, kind: FormatKind, payload: &Payload) -> String;

    /// Render by kind name; unknown kinds render as text.
    fn format(&self, kind: &str, payload: &Payload) -> String {
        self.render(FormatKind::from_name(kind), payload)
    }
}

/// Unstyled formatter used by default.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainFormatter;

impl Formatter for PlainFormatter {
    fn render(&self, kind: FormatKind, payload: &Payload) -> String {
        let mut lines: Vec<String> = payload.label.iter().cloned().collect();
        match kind {
            FormatKind::Text => lines.extend(payload.data.iter().cloned()),
            FormatKind::List => lines.extend(payload.data.iter().map(|item| format!("  {item}"))),
        }
        lines.join("\n")
    }
}
