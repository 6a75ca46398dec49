//! A small sample world: the field west of the white house, a path north around the house, and
//! a dark cellar below it.
//!
//! Used by the `grue` binary and by the end-to-end tests.

use anyhow::{Context, Result};

use crate::thing::{Event, Responder, Response, ThingId};
use crate::world::World;

const DARKNESS: &str = "It is pitch black. You are likely to be eaten by a grue.";

/// Handles to the notable things in the demo world.
#[derive(Debug, Clone, Copy)]
pub struct Landmarks {
    pub player: ThingId,
    pub field: ThingId,
    pub mailbox: ThingId,
    pub leaflet: ThingId,
    pub door: ThingId,
    pub north_of_house: ThingId,
    pub table: ThingId,
    pub lamp: ThingId,
    pub cellar: ThingId,
    pub darkness: ThingId,
}

/// Populate `world` with the demo and put the player in the field.
///
/// The base rules are not installed here; the caller decides which rules to use. The demo adds
/// one rule of its own, `cross :item`.
///
/// # Errors
/// Fails only if the demo's own authoring is broken.
pub fn west_of_house(world: &mut World) -> Result<Landmarks> {
    let player = world.new_player();
    world.edit(player)?.set_name("yourself").set_description("As good-looking as ever.");

    let field = world.new_room();
    world.edit(field)?.set_name("West of House").set_description(
        "You are standing in an open field west of a white house, with a boarded front door.\n\
         There is a small mailbox here.",
    );

    let mailbox = world.new_container();
    world
        .edit(mailbox)?
        .set_name("small mailbox")
        .set_description("It's painted red.")
        .set_background(true)
        .set_portable(false)
        .set_pattern("mailbox|box")?;
    world.add(field, mailbox)?;

    let leaflet = world.new_thing();
    world
        .edit(leaflet)?
        .set_name("leaflet")
        .set_description("It looks like some kind of product pitch.")
        .set_portable(true)
        .set_pattern("leaflet|pamphlet|booklet")?;
    world.cue(
        leaflet,
        "read",
        "WELCOME TO ZORK!\nZORK is a game of adventure, danger, and low cunning. In it you will explore some of \
         the most amazing territory ever seen by mortals. No computer should be without one!",
    )?;
    world.add(mailbox, leaflet)?;

    let door = world.new_scenery();
    world
        .edit(door)?
        .set_name("boarded door")
        .set_description("It's all boarded up.")
        .set_pattern("door")?;
    world.cue(door, "open", "The door cannot be opened.")?;
    world.cue(door, "cross", "The door is boarded and you can't remove the boards.")?;
    world.add(field, door)?;

    let north_of_house = world.new_room();
    world.edit(north_of_house)?.set_name("North of House").set_description(
        "You are facing the north side of a white house. There is no door here, but a trapdoor in \
         the grass leads down.",
    );

    let table = world.new_supporter();
    world
        .edit(table)?
        .set_name("garden table")
        .set_description("A weathered wooden table.")
        .set_portable(false)
        .set_pattern("table")?;
    world.add(north_of_house, table)?;

    let lamp = world.new_thing();
    world
        .edit(lamp)?
        .set_name("brass lantern")
        .set_description("A battery-powered brass lantern.")
        .set_portable(true)
        .set_prop("lit", false)
        .set_pattern("lamp|lantern")?;
    world.cue(lamp, "activate", Responder::behavior(|world, me, _| switch_lamp(world, me, true)))?;
    world.cue(lamp, "deactivate", Responder::behavior(|world, me, _| switch_lamp(world, me, false)))?;
    world.add(table, lamp)?;

    let cellar = world.new_room();
    world
        .edit(cellar)?
        .set_name("Cellar")
        .set_description("You are in a dark and damp cellar with a narrow passageway leading north.");

    let darkness = world.new_region();
    world.edit(darkness)?.set_name("darkness");
    world.cue(darkness, "look", Responder::behavior(darkness_intercepts))?;
    world.add_region(cellar, darkness)?;

    world.connect(field, "north", north_of_house)?;
    world.connect(north_of_house, "south", field)?;
    world.connect(north_of_house, "down", cellar)?;
    world.connect(cellar, "up", north_of_house)?;

    world.add_rule("cross :item", |world, m| {
        let item = m.get("item").unwrap_or_default();
        match world.ask_local("cross", item)? {
            Some(response) => Ok(response),
            None => {
                let text = world.config().messages.cant_see.clone();
                world.print(&text);
                Ok(Response::Text(text))
            },
        }
    })?;

    world.set_current_room(field)?;

    Ok(Landmarks {
        player,
        field,
        mailbox,
        leaflet,
        door,
        north_of_house,
        table,
        lamp,
        cellar,
        darkness,
    })
}

fn switch_lamp(world: &mut World, me: ThingId, on: bool) -> Result<Response> {
    world.edit(me)?.set_prop("lit", on);
    let text = format!("The brass lantern is now {}.", if on { "on" } else { "off" });
    world.print(&text);
    Ok(Response::Text(text))
}

/// Blocks `look` unless the player carries something lit.
fn darkness_intercepts(world: &mut World, _: ThingId, _: Option<&Event>) -> Result<Response> {
    let player = world.player().context("darkness needs a player to check for light")?;
    let lights = world.visible_contents(player).query(world, "lit=true")?;
    if lights.is_empty() {
        world.print(DARKNESS);
        Ok(Response::Blocked)
    } else {
        Ok(Response::Nothing)
    }
}
