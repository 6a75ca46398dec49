//! Rooms, exits and regions.
//!
//! Any location the player can stand in is a room, whether it's a closet or a canyon. Rooms
//! carry named exits to other rooms and a list of regions. A region is consulted before certain
//! verbs run in any room it covers and may intercept them, the classic example being darkness
//! swallowing `look`.
//!
//! Movement is the only state machine in the engine: the states are rooms, the transitions are
//! exits, and there is no terminal state.

use std::collections::BTreeMap;

use anyhow::Result;
use log::info;

use crate::thing::{Event, Kind, Response, ThingId};
use crate::world::{World, WorldError};

/// Room-only state: exits and the regions that may intercept actions here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Place {
    pub exits: BTreeMap<String, ThingId>,
    pub regions: Vec<ThingId>,
}

/// Normalize a direction word to its short exit key (`north` -> `n`, `inside` -> `in`, ...).
/// Words that aren't compass or vertical directions pass through lower-cased.
pub fn normalize_direction(word: &str) -> String {
    let lower = word.trim().to_lowercase();
    let short = match lower.as_str() {
        "north" => "n",
        "south" => "s",
        "east" => "e",
        "west" => "w",
        "northeast" => "ne",
        "northwest" => "nw",
        "southeast" => "se",
        "southwest" => "sw",
        "up" => "u",
        "down" => "d",
        "inside" => "in",
        "outside" => "out",
        _ => return lower,
    };
    short.to_string()
}

impl World {
    /// Add an exit from one room to another. The direction is stored in its short form.
    ///
    /// # Errors
    /// Returns an error if either id is unknown or not a room.
    pub fn connect(&mut self, from: ThingId, direction: &str, to: ThingId) -> Result<(), WorldError> {
        self.expect_kind(to, Kind::Room)?;
        let key = normalize_direction(direction);
        self.place_mut(from)?.exits.insert(key, to);
        Ok(())
    }

    /// The room reached by leaving `room` in `direction`, if there is an exit that way.
    pub fn exit(&self, room: ThingId, direction: &str) -> Option<ThingId> {
        let place = self.thing(room)?.place.as_ref()?;
        place.exits.get(&normalize_direction(direction)).copied()
    }

    /// Put `room` inside `region`.
    ///
    /// # Errors
    /// Returns an error if the ids are unknown or of the wrong kinds.
    pub fn add_region(&mut self, room: ThingId, region: ThingId) -> Result<(), WorldError> {
        self.expect_kind(region, Kind::Region)?;
        let place = self.place_mut(room)?;
        if !place.regions.contains(&region) {
            place.regions.push(region);
        }
        if let Some(territory) = self.edit(region)?.territory.as_mut()
            && !territory.contains(room)
        {
            territory.push(room);
        }
        Ok(())
    }

    /// Ask each of the room's regions about `action`. Returns false if any region answered
    /// [`Response::Blocked`]; every region is asked either way.
    ///
    /// # Errors
    /// Propagates errors raised by region behaviors.
    pub fn check(&mut self, room: ThingId, action: &str, event: Option<&Event>) -> Result<bool> {
        let regions = self
            .thing(room)
            .and_then(|thing| thing.place.as_ref())
            .map(|place| place.regions.clone())
            .unwrap_or_default();

        let mut allowed = true;
        for region in regions {
            if self.ask(region, action, event)?.is_blocked() {
                info!("region {region} intercepted '{action}' in room {room}");
                allowed = false;
            }
        }
        Ok(allowed)
    }

    /// Follow an exit out of `room`.
    ///
    /// The direction comes from the event's `direction` field. With no exit that way the player
    /// is told so and stays put ([`Response::Blocked`]). Otherwise the current room changes and, if
    /// nothing in the new room intercepts `look`, the new room is described.
    ///
    /// # Errors
    /// Propagates errors raised by region or room behaviors.
    pub fn go(&mut self, room: ThingId, event: Option<&Event>) -> Result<Response> {
        let direction = event.and_then(|e| e.get("direction")).unwrap_or_default();
        let Some(destination) = self.exit(room, direction) else {
            let refusal = self.config().messages.cant_go.clone();
            self.print(&refusal);
            info!("no exit '{direction}' from room {room}");
            return Ok(Response::Blocked);
        };

        self.current_room = Some(destination);
        info!(
            "player moved {} from {room} to {destination}",
            normalize_direction(direction)
        );

        if self.check(destination, "look", None)? {
            return self.ask(destination, "look", None);
        }
        Ok(Response::Nothing)
    }

    fn place_mut(&mut self, room: ThingId) -> Result<&mut Place, WorldError> {
        self.edit(room)?.place.as_mut().ok_or(WorldError::WrongKind {
            id: room,
            expected: Kind::Room,
        })
    }
}
