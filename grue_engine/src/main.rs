#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
//! ** Grue **
//! Play the sample world from a terminal.

use grue_engine::config::CONFIG_FILE;
use grue_engine::data_paths::data_path;
use grue_engine::style::GameStyle;
use grue_engine::{ConsoleSink, GRUE_VERSION, World, base_rules, demo, load_config, run_repl};

use anyhow::{Context, Result};
use log::info;

fn main() -> Result<()> {
    env_logger::init();
    info!("Start: loading Grue {GRUE_VERSION}...");

    let config = load_config(&data_path(CONFIG_FILE));
    let wrap = config.display.wrap;
    let mut world = World::with_config(ConsoleSink::new(wrap), config);
    base_rules::install(&mut world).context("while installing the standard rules")?;
    demo::west_of_house(&mut world).context("while building the sample world")?;
    info!("world ready: {} things", world.registry().len());

    println!("{}", "GRUE: WEST OF HOUSE".banner_style());
    println!("{}\n", format!("version {GRUE_VERSION} -- type \"quit\" to leave").system_style());

    world.input("look").context("while describing the opening room")?;
    run_repl(&mut world)
}
