//! Cues and proxies every thing gets from its kind when the world creates it.
//!
//! A cue that answers with [`Response::Text`] has already printed that text; the exception is
//! `contents`, which builds a listing for its caller to place. Authors can replace any of these
//! with [`World::cue`].

use anyhow::Result;

use crate::bag::Bag;
use crate::config::Messages;
use crate::format::{FormatKind, Payload};
use crate::thing::{Behavior, Event, Kind, Response, Thing, ThingId};
use crate::value::{Computed, Value};
use crate::world::World;

type Pick = fn(&Messages) -> &String;

pub(crate) fn cues(kind: Kind) -> Vec<(&'static str, Behavior)> {
    match kind {
        Kind::Region => Vec::new(),
        Kind::Room => vec![
            ("look", Behavior::new(room_look)),
            ("contents", Behavior::new(|world, me, _| listing(world, me, |m| &m.room_listing))),
            ("go", Behavior::new(|world, me, event| world.go(me, event))),
        ],
        Kind::Container => vec![
            ("look", Behavior::new(|world, me, _| look_with_contents(world, me))),
            ("contents", Behavior::new(|world, me, _| listing(world, me, |m| &m.container_listing))),
            ("open", Behavior::new(|world, me, _| set_lid(world, me, true))),
            ("close", Behavior::new(|world, me, _| set_lid(world, me, false))),
        ],
        Kind::Supporter => vec![
            ("look", Behavior::new(|world, me, _| look_with_contents(world, me))),
            ("contents", Behavior::new(|world, me, _| listing(world, me, |m| &m.supporter_listing))),
        ],
        Kind::Player => vec![
            ("look", Behavior::new(look)),
            ("contents", Behavior::new(|world, me, _| listing(world, me, |m| &m.inventory_listing))),
        ],
        Kind::Thing | Kind::Person | Kind::Scenery => vec![("look", Behavior::new(look))],
    }
}

pub(crate) fn proxies(kind: Kind) -> Vec<(&'static str, Computed)> {
    if kind.is_container() {
        vec![("contents", Computed::new(container_contents))]
    } else {
        Vec::new()
    }
}

/// Closed containers show nothing; the stored contents are untouched.
fn container_contents(world: &World, me: ThingId) -> Option<Value> {
    let thing = world.thing(me)?;
    let visible = if thing.is_open() {
        thing.raw_contents().cloned().unwrap_or_default()
    } else {
        Bag::new()
    };
    Some(Value::Things(visible))
}

fn name_of(world: &World, me: ThingId) -> String {
    world.thing(me).map(|thing| thing.name.clone()).unwrap_or_default()
}

fn description_of(world: &World, me: ThingId) -> String {
    world.thing(me).map(|thing| thing.description_text(world)).unwrap_or_default()
}

fn describe(world: &World, me: ThingId) -> String {
    let text = description_of(world, me);
    if text.is_empty() {
        world.message(|m| &m.nothing_special, &[("name", name_of(world, me).as_str())])
    } else {
        text
    }
}

fn look(world: &mut World, me: ThingId, _: Option<&Event>) -> Result<Response> {
    let text = describe(world, me);
    world.print(&text);
    Ok(Response::Text(text))
}

/// Non-background visible contents under a label, or nothing if there's nothing to list.
fn listing(world: &mut World, me: ThingId, label: Pick) -> Result<Response> {
    let names = world.visible_contents(me).query(world, "background=false")?.names(world);
    if names.is_empty() {
        return Ok(Response::Nothing);
    }
    let label = world.message(label, &[("name", name_of(world, me).as_str())]);
    Ok(Response::Text(world.format(FormatKind::List, &Payload::labelled(label, names))))
}

fn room_look(world: &mut World, me: ThingId, _: Option<&Event>) -> Result<Response> {
    let mut lines = Vec::new();
    let name = name_of(world, me);
    if !name.is_empty() {
        lines.push(name);
    }
    let description = description_of(world, me);
    if !description.is_empty() {
        lines.push(description);
    }
    if let Response::Text(list) = world.ask(me, "contents", None)? {
        lines.push(list);
    }
    if lines.is_empty() {
        return Ok(Response::Nothing);
    }
    let text = world.format(FormatKind::Text, &Payload::new(None, lines));
    world.print(&text);
    Ok(Response::Text(text))
}

fn look_with_contents(world: &mut World, me: ThingId) -> Result<Response> {
    let mut lines = vec![describe(world, me)];
    if let Response::Text(list) = world.ask(me, "contents", None)? {
        lines.push(list);
    }
    let text = world.format(FormatKind::Text, &Payload::new(None, lines));
    world.print(&text);
    Ok(Response::Text(text))
}

fn set_lid(world: &mut World, me: ThingId, open: bool) -> Result<Response> {
    let name = name_of(world, me);
    let already = world.thing(me).is_some_and(Thing::is_open) == open;
    let pick: Pick = match (already, open) {
        (true, true) => |m| &m.already_open,
        (true, false) => |m| &m.already_closed,
        (false, true) => |m| &m.opened,
        (false, false) => |m| &m.closed,
    };
    if !already {
        world.edit(me)?.set_open(open);
    }
    let text = world.message(pick, &[("name", name.as_str())]);
    world.print(&text);
    Ok(Response::Text(text))
}
