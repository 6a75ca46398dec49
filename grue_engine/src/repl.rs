//! The read-eval-print loop.
//!
//! Every line goes to [`World::input`]; the loop itself only knows how to leave. Word
//! completion draws on the base verbs plus the literal words of every route rule.

mod input;

use anyhow::Result;
use log::{error, info};

use crate::base_rules::VERBS;
use crate::style::GameStyle;
use crate::world::World;

use input::{InputEvent, InputManager, build_command_terms};

/// Words that end the session without reaching the rule parser.
const QUIT_WORDS: &[&str] = &["quit", "exit", "q"];

/// Control flow signal for the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplControl {
    Continue,
    Quit,
}

/// Decide whether a raw input line ends the session.
pub fn control_for(line: &str) -> ReplControl {
    let word = line.trim().to_lowercase();
    if QUIT_WORDS.contains(&word.as_str()) {
        ReplControl::Quit
    } else {
        ReplControl::Continue
    }
}

/// Completion words for `world`: the base verbs plus route vocabulary.
pub fn completion_terms(world: &World) -> Vec<String> {
    build_command_terms(VERBS.iter().map(ToString::to_string).chain(world.vocabulary()))
}

/// Run the main read-eval-print loop until the player quits or input ends.
///
/// A failing command is reported and logged, and the loop carries on.
///
/// # Errors
/// Currently always returns `Ok`; the signature leaves room for fatal front-end failures.
pub fn run_repl(world: &mut World) -> Result<()> {
    let mut input_manager = InputManager::new(completion_terms(world), world.config().display.history_path());
    let mut turn: u64 = 0;

    loop {
        let prompt = world.config().display.prompt.prompt_style().to_string();
        let line = match input_manager.read_line(&prompt) {
            Ok(InputEvent::Line(line)) => line,
            Ok(InputEvent::Eof) => {
                info!("end of input; leaving the REPL");
                break;
            },
            Ok(InputEvent::Interrupted) => {
                println!("{}", "Command canceled. Type \"quit\" to leave.".system_style());
                continue;
            },
            Err(err) => {
                error!("failed to read input: {err}");
                println!("{}", "Failed to read input. Try again.".error_style());
                continue;
            },
        };

        if control_for(&line) == ReplControl::Quit {
            info!("player quit after {turn} turns");
            println!("{}", "Goodbye.".system_style());
            break;
        }

        turn += 1;
        info!("================> BEGIN TURN {turn} <================");
        if let Err(err) = world.input(&line) {
            error!("command \"{}\" failed: {err:#}", line.trim());
            println!("{}", format!("Something went wrong: {err}").error_style());
        }
    }
    Ok(())
}
