//! The standard command set.
//!
//! Nothing here is built into the parser: these are ordinary rules, registered in order, and a
//! game can skip them, add rules before them to take precedence, or add more after them.
//!
//! | command                      | action                                   |
//! |------------------------------|------------------------------------------|
//! | `look` / `examine <thing>`   | room `look`, or `look` on a thing        |
//! | `open` / `close <thing>`     | `open` / `close`                         |
//! | `read <thing>`               | `read`                                   |
//! | `turn <thing> on` / `off`    | `activate` / `deactivate`                |
//! | `go <dir>`, `n`, `up`, ...   | room `go`                                |
//! | `take <thing> [from <thing>]`| moves a portable thing to the inventory  |
//! | `drop <thing>`               | moves a carried thing to the room        |
//! | `inventory`, `i`             | player `contents`                        |

use anyhow::{Context, Result};
use regex::Regex;

use crate::config::Messages;
use crate::parser::{Matches, RuleError};
use crate::thing::{Event, Response, ThingId};
use crate::world::World;

/// Command words the base rules understand, for completion.
pub const VERBS: &[&str] = &[
    "look",
    "examine",
    "open",
    "close",
    "read",
    "turn",
    "go",
    "north",
    "south",
    "east",
    "west",
    "up",
    "down",
    "inside",
    "outside",
    "take",
    "get",
    "pick",
    "drop",
    "inventory",
];

const LOOK: &str = r"(?i)^(?:look|examine|describe|l|x)(?:\s+at)?(?:\s+(?P<item>.+))?$";
const OPEN_CLOSE: &str = r"(?i)^(?P<verb>open|close)\s+(?P<item>.+)$";
const READ: &str = r"(?i)^read\s+(?P<item>.+)$";
const GO: &str = r"(?i)^go\s+(?P<direction>\w+)$|^(?P<short>n|north|s|south|e|east|w|west|ne|northeast|nw|northwest|se|southeast|sw|southwest|u|up|d|down|in|inside|out|outside)$";
const TAKE: &str = r"(?i)^(?:take|get|pick\s+up)\s+(?P<item>.+?)(?:\s+from\s+(?P<source>.+))?$";
const INVENTORY: &str = r"(?i)^i(?:nventory)?$";

fn compile(pattern: &str) -> Result<Regex, RuleError> {
    Regex::new(pattern).map_err(|source| RuleError::Compile {
        pattern: pattern.to_string(),
        source,
    })
}

/// Register the standard rules on `world`, after any rules already there.
///
/// # Errors
/// Returns a `RuleError` if a pattern fails to compile.
pub fn install(world: &mut World) -> Result<(), RuleError> {
    world.add_rule(compile(LOOK)?, look)?;
    world.add_rule(compile(OPEN_CLOSE)?, open_close)?;
    world.add_rule(compile(READ)?, read)?;
    world.add_rule("turn :item on", |world, m| switch(world, m, "activate", |msg| &msg.turn_on_what))?;
    world.add_rule("turn :item off", |world, m| switch(world, m, "deactivate", |msg| &msg.turn_off_what))?;
    world.add_rule(compile(GO)?, go)?;
    world.add_rule(compile(TAKE)?, take)?;
    world.add_rule("drop :item", drop_item)?;
    world.add_rule(compile(INVENTORY)?, inventory)?;
    Ok(())
}

fn say(world: &mut World, text: &str) -> Response {
    world.print(text);
    Response::Text(text.to_string())
}

fn require_player(world: &World) -> Result<ThingId> {
    world.player().context("the base rules need a player; call World::new_player first")
}

fn look(world: &mut World, m: &Matches) -> Result<Response> {
    if let Some(item) = m.get("item") {
        return match world.ask_local("look", item)? {
            Some(response) => Ok(response),
            None => {
                let text = world.config().messages.cant_see.clone();
                Ok(say(world, &text))
            },
        };
    }
    let Some(room) = world.current_room() else {
        return Ok(Response::Nothing);
    };
    if world.check(room, "look", None)? {
        world.ask(room, "look", None)
    } else {
        Ok(Response::Blocked)
    }
}

fn open_close(world: &mut World, m: &Matches) -> Result<Response> {
    let verb = m.get("verb").unwrap_or("open").to_lowercase();
    let item = m.get("item").unwrap_or_default();
    match world.find_local(None, item)? {
        Some(id) if world.thing(id).is_some_and(|thing| thing.responds_to(&verb)) => world.ask(id, &verb, None),
        _ => {
            let text = world.message(|msg| &msg.cant_verb, &[("verb", verb.as_str())]);
            Ok(say(world, &text))
        },
    }
}

fn read(world: &mut World, m: &Matches) -> Result<Response> {
    let item = m.get("item").unwrap_or_default();
    match world.find_local(None, item)? {
        Some(id) if world.thing(id).is_some_and(|thing| thing.responds_to("read")) => world.ask(id, "read", None),
        _ => {
            let text = world.config().messages.cant_read.clone();
            Ok(say(world, &text))
        },
    }
}

fn switch(
    world: &mut World,
    m: &Matches,
    action: &str,
    unknown: fn(&Messages) -> &String,
) -> Result<Response> {
    let item = m.get("item").unwrap_or_default();
    let Some(id) = world.find_local(None, item)? else {
        let text = world.message(unknown, &[]);
        return Ok(say(world, &text));
    };
    if world.thing(id).is_some_and(|thing| thing.responds_to(action)) {
        return world.ask(id, action, None);
    }
    let verb = if action == "activate" { "turn on" } else { "turn off" };
    let text = world.message(|msg| &msg.cant_verb, &[("verb", verb)]);
    Ok(say(world, &text))
}

fn go(world: &mut World, m: &Matches) -> Result<Response> {
    let direction = m.get("direction").or_else(|| m.get("short")).unwrap_or_default();
    let Some(room) = world.current_room() else {
        return Ok(Response::Nothing);
    };
    let event = Event::direction(direction);
    if !world.check(room, "go", Some(&event))? {
        return Ok(Response::Blocked);
    }
    world.ask(room, "go", Some(&event))
}

fn take(world: &mut World, m: &Matches) -> Result<Response> {
    let player = require_player(world)?;
    let item = m.get("item").unwrap_or_default();

    if world.visible_contents(player).nudge(world, item).first().is_some() {
        let text = world.config().messages.already_have.clone();
        return Ok(say(world, &text));
    }

    let mut candidate = world.find_local(Some("portable=true"), item)?;
    if let Some(source) = m.get("source") {
        let holder = world.find_local(None, source)?;
        candidate = candidate.filter(|id| holder.is_some() && world.thing(*id).and_then(|t| t.parent()) == holder);
    }
    let Some(target) = candidate else {
        let text = world.config().messages.cant_take.clone();
        return Ok(say(world, &text));
    };

    world.move_to(target, player)?;
    world.ask(target, "taken", None)?;
    let text = world.config().messages.taken.clone();
    Ok(say(world, &text))
}

fn drop_item(world: &mut World, m: &Matches) -> Result<Response> {
    let player = require_player(world)?;
    let item = m.get("item").unwrap_or_default();
    let Some(dropped) = world.visible_contents(player).nudge(world, item).first() else {
        let text = world.config().messages.dont_have.clone();
        return Ok(say(world, &text));
    };
    let room = world.current_room().context("nowhere to drop things: no current room")?;
    world.move_to(dropped, room)?;
    world.ask(dropped, "dropped", None)?;
    let text = world.config().messages.dropped.clone();
    Ok(say(world, &text))
}

fn inventory(world: &mut World, _: &Matches) -> Result<Response> {
    let player = require_player(world)?;
    match world.ask(player, "contents", None)? {
        Response::Text(listing) => Ok(say(world, &listing)),
        _ => {
            let text = world.config().messages.empty_handed.clone();
            Ok(say(world, &text))
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patterns_compile() {
        for pattern in [LOOK, OPEN_CLOSE, READ, GO, TAKE, INVENTORY] {
            assert!(compile(pattern).is_ok(), "{pattern}");
        }
    }

    #[test]
    fn go_accepts_long_and_short_forms() {
        let go = compile(GO).unwrap();
        assert_eq!(&go.captures("go north").unwrap()["direction"], "north");
        assert_eq!(&go.captures("ne").unwrap()["short"], "ne");
        assert!(go.captures("gone").is_none());
    }

    #[test]
    fn take_splits_source() {
        let take = compile(TAKE).unwrap();
        let caps = take.captures("take leaflet from small mailbox").unwrap();
        assert_eq!(&caps["item"], "leaflet");
        assert_eq!(&caps["source"], "small mailbox");
        let caps = take.captures("pick up brass lantern").unwrap();
        assert_eq!(&caps["item"], "brass lantern");
        assert!(caps.name("source").is_none());
    }

    #[test]
    fn look_item_is_optional() {
        let look = compile(LOOK).unwrap();
        assert!(look.captures("look").unwrap().name("item").is_none());
        assert_eq!(&look.captures("look at mailbox").unwrap()["item"], "mailbox");
        assert_eq!(&look.captures("x leaflet").unwrap()["item"], "leaflet");
    }
}
