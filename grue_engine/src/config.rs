//! Engine configuration and loader.
//!
//! Everything the engine says on its own behalf (refusals, acknowledgements, listing labels)
//! lives here rather than in code, along with the input normalization settings and a couple of
//! display knobs. The configuration is read from `grue.toml`; every key is optional and
//! anything missing falls back to the built-in defaults.
//!
//! ```toml
//! [messages]
//! no_match = "That's not a verb I recognise."
//!
//! [parser]
//! ignored_words = ["the", "a", "an", "some"]
//!
//! [display]
//! prompt = "> "
//! ```

use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the configuration file inside the data directory.
pub const CONFIG_FILE: &str = "grue.toml";

/// Complete engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub messages: Messages,
    pub parser: ParserSettings,
    pub display: DisplaySettings,
}

/// Fixed sentences emitted by the engine and the base rules.
///
/// Templates may contain `{name}` or `{verb}` placeholders; see [`interpolate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Messages {
    pub no_match: String,
    pub blank: String,
    pub cant_go: String,
    pub cant_see: String,
    pub cant_take: String,
    pub already_have: String,
    pub taken: String,
    pub dropped: String,
    pub dont_have: String,
    pub empty_handed: String,
    pub cant_verb: String,
    pub cant_read: String,
    pub turn_on_what: String,
    pub turn_off_what: String,
    pub already_open: String,
    pub already_closed: String,
    pub opened: String,
    pub closed: String,
    pub nothing_special: String,
    pub room_listing: String,
    pub container_listing: String,
    pub supporter_listing: String,
    pub inventory_listing: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            no_match: "I don't understand that.".into(),
            blank: "I beg your pardon?".into(),
            cant_go: "You can't go that way.".into(),
            cant_see: "You can't see any such thing.".into(),
            cant_take: "You can't take that with you.".into(),
            already_have: "You already have that.".into(),
            taken: "Taken.".into(),
            dropped: "Dropped.".into(),
            dont_have: "You don't have any of those.".into(),
            empty_handed: "You're not carrying anything.".into(),
            cant_verb: "You can't {verb} that.".into(),
            cant_read: "I don't think you can read that right now.".into(),
            turn_on_what: "Turn what on?".into(),
            turn_off_what: "Turn what off?".into(),
            already_open: "The {name} is already open.".into(),
            already_closed: "The {name} is already closed.".into(),
            opened: "Opened.".into(),
            closed: "Closed.".into(),
            nothing_special: "You see nothing special about the {name}.".into(),
            room_listing: "You can see:".into(),
            container_listing: "The {name} contains:".into(),
            supporter_listing: "On the {name} you see:".into(),
            inventory_listing: "You are carrying:".into(),
        }
    }
}

/// Input normalization applied by [`World::input`](crate::world::World::input).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserSettings {
    /// Filler words removed before matching (articles, by default).
    pub ignored_words: Vec<String>,
    /// Lower-case input before matching.
    pub lowercase: bool,
}

impl Default for ParserSettings {
    fn default() -> Self {
        Self {
            ignored_words: vec!["the".into(), "a".into(), "an".into()],
            lowercase: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    pub prompt: String,
    /// Wrap console output to the terminal width.
    pub wrap: bool,
    /// Keep a command history between sessions.
    pub history: bool,
    /// Where the history lives. Defaults to `grue/history.txt` under the platform data directory.
    pub history_file: Option<PathBuf>,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            prompt: "> ".into(),
            wrap: true,
            history: true,
            history_file: None,
        }
    }
}

impl DisplaySettings {
    /// The history file to use, if history is on and a location can be found.
    pub fn history_path(&self) -> Option<PathBuf> {
        if !self.history {
            return None;
        }
        self.history_file.clone().or_else(|| {
            dirs::data_dir()
                .or_else(dirs::data_local_dir)
                .map(|base| base.join("grue").join("history.txt"))
        })
    }
}

/// Replace `{key}` placeholders in a message template.
pub fn interpolate(template: &str, vars: &[(&str, &str)]) -> String {
    vars.iter().fold(template.to_string(), |text, (key, value)| {
        text.replace(&format!("{{{key}}}"), value)
    })
}

/// Loads engine configuration from a TOML file, falling back to defaults on error.
///
/// This never fails: a missing or malformed file is logged with `warn!` and the defaults are
/// used instead.
pub fn load_config(toml_path: &Path) -> EngineConfig {
    match try_load_config(toml_path) {
        Ok(config) => {
            info!("engine configuration loaded from '{}'", toml_path.display());
            config
        },
        Err(e) => {
            warn!(
                "Could not load engine configuration from '{}': {:#}. Using defaults.",
                toml_path.display(),
                e
            );
            EngineConfig::default()
        },
    }
}

/// Attempts to load engine configuration from a TOML file.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
pub fn try_load_config(toml_path: &Path) -> Result<EngineConfig> {
    let text = fs::read_to_string(toml_path)
        .with_context(|| format!("reading engine configuration from '{}'", toml_path.display()))?;
    let config: EngineConfig = toml::from_str(&text)
        .with_context(|| format!("parsing engine configuration from '{}'", toml_path.display()))?;
    Ok(config)
}
