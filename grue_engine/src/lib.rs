#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
//! Grue: a small engine for parser-driven interactive fiction.
//!
//! A [`World`] owns every [`Thing`] in an arena, resolves what the player can see through
//! containment and scope, and feeds each line of input to an ordered set of rules. The
//! standard verbs live in [`base_rules`]; [`demo`] builds a sample world on top of them.

pub const GRUE_VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod bag;
pub mod base_rules;
pub mod config;
pub mod data_paths;
mod defaults;
pub mod demo;
pub mod format;
pub mod parser;
pub mod repl;
pub mod room;
pub mod selector;
pub mod style;
pub mod thing;
pub mod value;
pub mod view;
pub mod world;

pub use bag::Bag;
pub use config::{EngineConfig, load_config};
pub use parser::{Evaluation, Matches, RuleError, RuleParser};
pub use repl::run_repl;
pub use room::Place;
pub use thing::{Behavior, Event, Kind, Responder, Response, Thing, ThingId};
pub use value::{Computed, Value};
pub use view::{ConsoleSink, Sink, Transcript};
pub use world::{World, WorldError};
