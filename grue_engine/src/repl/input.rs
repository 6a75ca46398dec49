//! Line input for the REPL.
//!
//! A rustyline editor with word completion and a history file when stdin is a terminal;
//! plain buffered stdin otherwise (piped transcripts, tests).

use std::fs;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};

/// What a read produced.
pub enum InputEvent {
    Line(String),
    Eof,
    Interrupted,
}

/// Filler words left out of completion.
const EXCLUDED_TERMS: &[&str] = &["", "a", "an", "at", "from", "in", "on", "off", "the", "to", "with"];

type ReplEditor = rustyline::Editor<WordCompleter, DefaultHistory>;

/// Completes the word under the cursor from a fixed vocabulary.
struct WordCompleter {
    terms: Vec<String>,
}

impl Helper for WordCompleter {}

impl Completer for WordCompleter {
    type Candidate = Pair;

    fn complete(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> rustyline::Result<(usize, Vec<Pair>)> {
        let (start, word) = word_before(line, pos);
        let candidates = if word.is_empty() {
            Vec::new()
        } else {
            candidates_for(&self.terms, word)
        };
        Ok((start, candidates))
    }
}

impl Hinter for WordCompleter {
    type Hint = String;
}

impl Highlighter for WordCompleter {}

impl Validator for WordCompleter {}

/// Byte offset and text of the word that ends at `pos`.
fn word_before(line: &str, pos: usize) -> (usize, &str) {
    let head = &line[..pos];
    let start = head.rfind(char::is_whitespace).map_or(0, |i| i + 1);
    (start, &head[start..])
}

fn candidates_for(terms: &[String], word: &str) -> Vec<Pair> {
    let word = word.to_lowercase();
    terms
        .iter()
        .filter(|term| term.starts_with(&word))
        .map(|term| Pair {
            display: term.clone(),
            replacement: term.clone(),
        })
        .collect()
}

/// Sorted, deduplicated completion words, minus filler.
pub fn build_command_terms(words: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut terms: Vec<String> = words
        .into_iter()
        .map(|word| word.trim().to_lowercase())
        .filter(|word| !EXCLUDED_TERMS.contains(&word.as_str()))
        .collect();
    terms.sort_unstable();
    terms.dedup();
    terms
}

/// Reads player input from whichever source fits the terminal.
pub struct InputManager {
    reader: Reader,
}

enum Reader {
    Editor {
        editor: Box<ReplEditor>,
        history: Option<PathBuf>,
    },
    Plain(String),
}

impl InputManager {
    /// `history` is where the editor keeps past commands; `None` keeps them for this session only.
    pub fn new(terms: Vec<String>, history: Option<PathBuf>) -> Self {
        if !io::stdin().is_terminal() {
            info!("stdin is not a terminal; reading plain lines");
            return Self {
                reader: Reader::Plain(String::new()),
            };
        }
        let reader = match open_editor(terms, history.as_deref()) {
            Ok(editor) => {
                info!("line editor ready");
                Reader::Editor {
                    editor: Box::new(editor),
                    history,
                }
            },
            Err(err) => {
                warn!("line editor unavailable ({err}); reading plain lines");
                Reader::Plain(String::new())
            },
        };
        Self { reader }
    }

    /// Read one line. An editor failure drops to plain stdin for the rest of the session and
    /// the read is retried there.
    pub fn read_line(&mut self, prompt: &str) -> io::Result<InputEvent> {
        let failure = match &mut self.reader {
            Reader::Editor { editor, history } => match editor.readline(prompt) {
                Ok(line) => {
                    remember(editor, &line, history.as_deref());
                    return Ok(InputEvent::Line(line));
                },
                Err(ReadlineError::Interrupted) => return Ok(InputEvent::Interrupted),
                Err(ReadlineError::Eof) => return Ok(InputEvent::Eof),
                Err(err) => err,
            },
            Reader::Plain(buffer) => {
                print!("{prompt}");
                io::stdout().flush()?;
                return read_plain(&mut io::stdin().lock(), buffer);
            },
        };
        warn!("line editor failed ({failure}); switching to plain lines");
        self.reader = Reader::Plain(String::new());
        self.read_line(prompt)
    }
}

fn open_editor(terms: Vec<String>, history: Option<&Path>) -> rustyline::Result<ReplEditor> {
    let mut editor = ReplEditor::new()?;
    editor.set_helper(Some(WordCompleter { terms }));
    let Some(path) = history else {
        return Ok(editor);
    };
    if let Some(dir) = path.parent()
        && let Err(err) = fs::create_dir_all(dir)
    {
        warn!("cannot create history directory {}: {err}", dir.display());
    }
    match editor.load_history(path) {
        Ok(()) => debug!("loaded history from {}", path.display()),
        Err(ReadlineError::Io(err)) if err.kind() == io::ErrorKind::NotFound => {
            debug!("no history yet at {}", path.display());
        },
        Err(err) => warn!("cannot load history from {}: {err}", path.display()),
    }
    Ok(editor)
}

/// Record a non-blank line and, if there is a history file, write it out.
fn remember(editor: &mut ReplEditor, line: &str, history: Option<&Path>) {
    if line.trim().is_empty() {
        return;
    }
    if let Err(err) = editor.add_history_entry(line) {
        warn!("cannot record history entry: {err}");
    }
    if let Some(path) = history
        && let Err(err) = editor.save_history(path)
    {
        warn!("cannot save history to {}: {err}", path.display());
    }
}

/// One line from `source` without its line ending, or `Eof` when nothing is left.
fn read_plain(source: &mut impl BufRead, buffer: &mut String) -> io::Result<InputEvent> {
    buffer.clear();
    if source.read_line(buffer)? == 0 {
        return Ok(InputEvent::Eof);
    }
    let line = buffer.trim_end_matches(['\n', '\r']);
    Ok(InputEvent::Line(line.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn lines(input: &str) -> Vec<String> {
        let mut source = Cursor::new(input.as_bytes());
        let mut buffer = String::new();
        let mut out = Vec::new();
        while let InputEvent::Line(line) = read_plain(&mut source, &mut buffer).unwrap() {
            out.push(line);
        }
        out
    }

    #[test]
    fn plain_lines_lose_their_endings() {
        assert_eq!(lines("look\r\ntake leaflet\n\ninventory"), vec!["look", "take leaflet", "", "inventory"]);
        assert!(lines("").is_empty());
    }

    #[test]
    fn command_terms_are_sorted_and_filtered() {
        let terms = build_command_terms(["take", "The", "drop", "take", "on"].map(String::from));
        assert_eq!(terms, vec!["drop", "take"]);
    }

    #[test]
    fn completes_the_word_under_the_cursor() {
        let terms = build_command_terms(["inventory", "inside", "open"].map(String::from));
        let (start, word) = word_before("open mailbox and IN", 19);
        assert_eq!((start, word), (17, "IN"));
        let found: Vec<String> = candidates_for(&terms, word).into_iter().map(|p| p.replacement).collect();
        assert_eq!(found, vec!["inside", "inventory"]);
        assert_eq!(word_before("open", 0), (0, ""));
    }
}
