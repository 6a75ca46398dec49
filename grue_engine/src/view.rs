//! View module.
//!
//! The engine never writes to the terminal itself. Every line it emits goes through a [`Sink`],
//! so the same world can drive a console, a test transcript or any other host.

use std::cell::RefCell;
use std::rc::Rc;

use textwrap::{Options, fill};

/// Where engine output goes, one complete line (or paragraph) at a time.
pub trait Sink {
    fn print(&mut self, line: &str);
}

/// Prints to stdout, wrapped to the terminal width.
#[derive(Debug, Clone)]
pub struct ConsoleSink {
    pub wrap: bool,
}

impl ConsoleSink {
    pub fn new(wrap: bool) -> Self {
        Self { wrap }
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Sink for ConsoleSink {
    fn print(&mut self, line: &str) {
        if self.wrap {
            // fill paragraph by paragraph so indented list items keep their indentation
            for paragraph in line.lines() {
                let indent: String = paragraph.chars().take_while(|c| c.is_whitespace()).collect();
                let options = Options::with_termwidth().subsequent_indent(&indent);
                println!("{}", fill(paragraph, options));
            }
        } else {
            println!("{line}");
        }
    }
}

/// In-memory sink. Clones share the same buffer, so a test can hand one clone to the world and
/// keep another to read back what was printed.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    lines: Rc<RefCell<Vec<String>>>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything printed so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }

    /// Drain the buffer, returning what was printed since the last `take`.
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.lines.borrow_mut())
    }

    /// Does any printed line contain `needle`?
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.borrow().iter().any(|line| line.contains(needle))
    }

    pub fn last(&self) -> Option<String> {
        self.lines.borrow().last().cloned()
    }
}

impl Sink for Transcript {
    fn print(&mut self, line: &str) {
        self.lines.borrow_mut().push(line.to_string());
    }
}
