//! Styling helpers for terminal output.
//!
//! The [`GameStyle`] trait provides a set of convenience methods for applying
//! ANSI styling via the `colored` crate. Implementations for `&str` and
//! `String` are provided so string literals can be styled directly.
//!
//! Only the console front end uses these; text that flows through a
//! [`Sink`](crate::view::Sink) stays plain so transcripts compare cleanly.

use colored::{ColoredString, Colorize};

/// Convenience trait for applying color and style to text output.
pub trait GameStyle {
    fn banner_style(&self) -> ColoredString;
    fn prompt_style(&self) -> ColoredString;
    fn system_style(&self) -> ColoredString;
    fn error_style(&self) -> ColoredString;
}

impl GameStyle for &str {
    fn banner_style(&self) -> ColoredString {
        self.bold().truecolor(223, 77, 10)
    }
    fn prompt_style(&self) -> ColoredString {
        self.truecolor(110, 220, 110)
    }
    fn system_style(&self) -> ColoredString {
        self.italic().truecolor(75, 80, 75)
    }
    fn error_style(&self) -> ColoredString {
        self.bold().truecolor(230, 30, 30)
    }
}

impl GameStyle for String {
    fn banner_style(&self) -> ColoredString {
        self.as_str().banner_style()
    }
    fn prompt_style(&self) -> ColoredString {
        self.as_str().prompt_style()
    }
    fn system_style(&self) -> ColoredString {
        self.as_str().system_style()
    }
    fn error_style(&self) -> ColoredString {
        self.as_str().error_style()
    }
}
