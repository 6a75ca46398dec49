//! The world: every thing in the game, plus the machinery that turns a typed line into actions.
//!
//! A [`World`] owns the arena of [`Thing`]s, the player, the current room, the rule parser, the
//! output sink and the formatter. Things refer to each other by [`ThingId`] only; the world is the
//! one place where containment is changed, so it can keep each thing's `parent` in step with the
//! contents of the holder it lives in.
//!
//! Scope resolution lives here too. A command may only refer to things in the *local scope*:
//! the visible contents of the always-local holders (the player's inventory) and of the current
//! room, plus the visible contents of each of those things, one level deep.

use std::fmt;

use anyhow::Result;
use log::{debug, info};
use thiserror::Error;

use crate::bag::Bag;
use crate::config::{EngineConfig, Messages, interpolate};
use crate::defaults;
use crate::format::{FormatKind, Formatter, Payload, PlainFormatter};
use crate::parser::{Evaluation, Matches, RuleError, RuleParser, RulePattern, normalize};
use crate::selector::SelectorError;
use crate::thing::{Event, Kind, Responder, Response, Thing, ThingId};
use crate::value::{Computed, Value};
use crate::view::Sink;

/// Structural misuse of the world: bad ids and illegal containment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorldError {
    #[error("no thing with id {0}")]
    UnknownThing(ThingId),
    #[error("{id} is not a {}", .expected.tag())]
    WrongKind { id: ThingId, expected: Kind },
    #[error("{0} cannot hold other things")]
    NotAHolder(ThingId),
    #[error("{child} is already inside {parent}; remove it first")]
    AlreadyContained { child: ThingId, parent: ThingId },
    #[error("{0} cannot contain itself")]
    SelfContainment(ThingId),
    #[error("putting {child} inside {holder} would create a containment cycle")]
    Cycle { child: ThingId, holder: ThingId },
}

/// Complete state of a running game.
pub struct World {
    things: Vec<Thing>,
    player: Option<ThingId>,
    pub(crate) current_room: Option<ThingId>,
    always_local: Vec<ThingId>,
    parser: RuleParser<World>,
    sink: Box<dyn Sink>,
    formatter: Box<dyn Formatter>,
    config: EngineConfig,
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("things", &self.things.len())
            .field("player", &self.player)
            .field("current_room", &self.current_room)
            .field("always_local", &self.always_local)
            .field("rules", &self.parser)
            .finish_non_exhaustive()
    }
}

impl World {
    /// An empty world with the default configuration, printing to `sink`.
    pub fn new(sink: impl Sink + 'static) -> Self {
        Self::with_config(sink, EngineConfig::default())
    }

    pub fn with_config(sink: impl Sink + 'static, config: EngineConfig) -> Self {
        info!("creating world");
        Self {
            things: Vec::new(),
            player: None,
            current_room: None,
            always_local: Vec::new(),
            parser: RuleParser::new(),
            sink: Box::new(sink),
            formatter: Box::new(PlainFormatter),
            config,
        }
    }

    /// Replace the formatter used for structured output.
    #[must_use]
    pub fn with_formatter(mut self, formatter: impl Formatter + 'static) -> Self {
        self.formatter = Box::new(formatter);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut EngineConfig {
        &mut self.config
    }

    /// Create a thing of the given kind, with that kind's default cues installed.
    pub fn create(&mut self, kind: Kind) -> ThingId {
        let id = ThingId::new(self.things.len());
        let mut thing = Thing::new(id, kind);
        for (action, behavior) in defaults::cues(kind) {
            thing.insert_cue(action, Responder::Behavior(behavior));
        }
        for (key, proxy) in defaults::proxies(kind) {
            thing.insert_proxy(key, proxy);
        }
        self.things.push(thing);
        debug!("created {} {id}", kind.tag());
        id
    }

    pub fn new_thing(&mut self) -> ThingId {
        self.create(Kind::Thing)
    }

    pub fn new_room(&mut self) -> ThingId {
        self.create(Kind::Room)
    }

    pub fn new_container(&mut self) -> ThingId {
        self.create(Kind::Container)
    }

    pub fn new_supporter(&mut self) -> ThingId {
        self.create(Kind::Supporter)
    }

    pub fn new_person(&mut self) -> ThingId {
        self.create(Kind::Person)
    }

    pub fn new_scenery(&mut self) -> ThingId {
        self.create(Kind::Scenery)
    }

    pub fn new_region(&mut self) -> ThingId {
        self.create(Kind::Region)
    }

    /// Create the player. Their inventory is registered as always in scope.
    pub fn new_player(&mut self) -> ThingId {
        let id = self.create(Kind::Player);
        self.player = Some(id);
        self.always_local.push(id);
        id
    }

    pub fn thing(&self, id: ThingId) -> Option<&Thing> {
        self.things.get(id.index())
    }

    /// Mutable access for authoring, e.g. `world.edit(lamp)?.set_name("lamp")`.
    ///
    /// # Errors
    /// Returns `UnknownThing` if the id wasn't issued by this world.
    pub fn edit(&mut self, id: ThingId) -> Result<&mut Thing, WorldError> {
        self.things.get_mut(id.index()).ok_or(WorldError::UnknownThing(id))
    }

    pub(crate) fn expect_kind(&self, id: ThingId, kind: Kind) -> Result<&Thing, WorldError> {
        let thing = self.thing(id).ok_or(WorldError::UnknownThing(id))?;
        if thing.kind() == kind {
            Ok(thing)
        } else {
            Err(WorldError::WrongKind { id, expected: kind })
        }
    }

    /// Read a property of a thing (see [`Thing::get`]).
    pub fn get(&self, id: ThingId, key: &str) -> Option<Value> {
        self.thing(id)?.get(self, key)
    }

    /// What a thing currently shows of its contents: empty for closed containers and for things
    /// that can't hold anything.
    pub fn visible_contents(&self, id: ThingId) -> Bag {
        self.get(id, "contents").and_then(Value::into_things).unwrap_or_default()
    }

    /// Every thing in the world, in creation order.
    pub fn registry(&self) -> Bag {
        self.things.iter().map(Thing::id).collect()
    }

    pub fn player(&self) -> Option<ThingId> {
        self.player
    }

    pub fn current_room(&self) -> Option<ThingId> {
        self.current_room
    }

    /// # Errors
    /// Returns an error if `room` isn't a room.
    pub fn set_current_room(&mut self, room: ThingId) -> Result<(), WorldError> {
        self.expect_kind(room, Kind::Room)?;
        self.current_room = Some(room);
        Ok(())
    }

    /// Register (or replace) the responder for `action` on a thing.
    ///
    /// # Errors
    /// Returns `UnknownThing` for a bad id.
    pub fn cue(&mut self, id: ThingId, action: &str, responder: impl Into<Responder>) -> Result<(), WorldError> {
        self.edit(id)?.insert_cue(action, responder.into());
        Ok(())
    }

    /// Intercept reads of `key` on a thing.
    ///
    /// # Errors
    /// Returns `UnknownThing` for a bad id.
    pub fn proxy(
        &mut self,
        id: ThingId,
        key: &str,
        f: impl Fn(&World, ThingId) -> Option<Value> + 'static,
    ) -> Result<(), WorldError> {
        self.edit(id)?.insert_proxy(key, Computed::new(f));
        Ok(())
    }

    /// Dispatch a user-facing action to a thing.
    ///
    /// No responder answers [`Response::Nothing`]. Fixed text is printed and returned as
    /// [`Response::Text`]. A behavior's own return value is passed through.
    ///
    /// # Errors
    /// Fails for an unknown id, or when the behavior itself fails.
    pub fn ask(&mut self, id: ThingId, action: &str, event: Option<&Event>) -> Result<Response> {
        let responder = self
            .thing(id)
            .ok_or(WorldError::UnknownThing(id))?
            .responder(action)
            .cloned();
        match responder {
            None => Ok(Response::Nothing),
            Some(Responder::Text(text)) => {
                self.print(&text);
                Ok(Response::Text(text))
            },
            Some(Responder::Behavior(behavior)) => behavior.call(self, id, event),
        }
    }

    /// Send a line to the output sink.
    pub fn print(&mut self, line: &str) {
        self.sink.print(line);
    }

    /// Render structured output with the world's formatter.
    pub fn format(&self, kind: FormatKind, payload: &Payload) -> String {
        self.formatter.render(kind, payload)
    }

    /// A configured message with its `{placeholders}` filled in.
    pub fn message(&self, pick: impl Fn(&Messages) -> &String, vars: &[(&str, &str)]) -> String {
        interpolate(pick(&self.config.messages), vars)
    }

    /// Put `child` into `holder`.
    ///
    /// The child must be free-floating: a thing that already lives somewhere else has to be
    /// removed first (or use [`World::move_to`]). Adding a thing to the holder it is already in
    /// does nothing.
    ///
    /// # Errors
    /// Returns an error for unknown ids, a holder that can't hold things, a child that is already
    /// contained elsewhere, or an addition that would make something contain itself.
    pub fn add(&mut self, holder: ThingId, child: ThingId) -> Result<(), WorldError> {
        if holder == child {
            return Err(WorldError::SelfContainment(child));
        }
        let holder_thing = self.thing(holder).ok_or(WorldError::UnknownThing(holder))?;
        if holder_thing.raw_contents().is_none() {
            return Err(WorldError::NotAHolder(holder));
        }
        match self.thing(child).ok_or(WorldError::UnknownThing(child))?.parent() {
            Some(parent) if parent == holder => return Ok(()),
            Some(parent) => return Err(WorldError::AlreadyContained { child, parent }),
            None => {},
        }

        let mut ancestor = holder_thing.parent();
        while let Some(id) = ancestor {
            if id == child {
                return Err(WorldError::Cycle { child, holder });
            }
            ancestor = self.thing(id).and_then(Thing::parent);
        }

        if let Some(contents) = self.edit(holder)?.contents.as_mut() {
            contents.push(child);
        }
        self.edit(child)?.parent = Some(holder);
        info!("added {child} to {holder}");
        Ok(())
    }

    /// Take `child` out of `holder`. Removing something that isn't there does nothing.
    ///
    /// # Errors
    /// Returns `UnknownThing` for a bad id.
    pub fn remove(&mut self, holder: ThingId, child: ThingId) -> Result<(), WorldError> {
        self.thing(child).ok_or(WorldError::UnknownThing(child))?;
        let removed = match self.edit(holder)?.contents.as_mut() {
            Some(contents) if contents.contains(child) => {
                contents.remove(child);
                true
            },
            _ => false,
        };
        if removed {
            let thing = self.edit(child)?;
            if thing.parent == Some(holder) {
                thing.parent = None;
            }
            info!("removed {child} from {holder}");
        }
        Ok(())
    }

    /// Detach `child` from wherever it is and put it into `holder`.
    ///
    /// # Errors
    /// As for [`World::add`].
    pub fn move_to(&mut self, child: ThingId, holder: ThingId) -> Result<(), WorldError> {
        let parent = self.thing(child).ok_or(WorldError::UnknownThing(child))?.parent();
        if parent == Some(holder) {
            return Ok(());
        }
        if let Some(parent) = parent {
            self.remove(parent, child)?;
        }
        self.add(holder, child)
    }

    /// Query the whole registry, ignoring scope.
    ///
    /// # Errors
    /// Returns a `SelectorError` for a malformed selector.
    pub fn query(&self, selector: &str) -> Result<Bag, SelectorError> {
        self.registry().query(self, selector)
    }

    /// Assign the same property on every thing in `bag`.
    ///
    /// # Errors
    /// Returns `UnknownThing` if the bag holds a foreign id.
    pub fn set_all(&mut self, bag: &Bag, key: &str, value: &Value) -> Result<(), WorldError> {
        for id in bag {
            self.edit(id)?.assign(key, value.clone());
        }
        Ok(())
    }

    /// Keep `holder`'s visible contents in scope wherever the player is.
    ///
    /// # Errors
    /// Returns an error if `holder` can't hold things.
    pub fn consider_local(&mut self, holder: ThingId) -> Result<(), WorldError> {
        let thing = self.thing(holder).ok_or(WorldError::UnknownThing(holder))?;
        if thing.raw_contents().is_none() {
            return Err(WorldError::NotAHolder(holder));
        }
        if !self.always_local.contains(&holder) {
            self.always_local.push(holder);
        }
        Ok(())
    }

    /// Everything a command may currently refer to.
    ///
    /// Things nested two levels down (a box inside an open box on the floor) are not reached.
    pub fn local_scope(&self) -> Bag {
        let mut scope = Bag::new();
        for holder in self.always_local.iter().copied().chain(self.current_room) {
            scope.combine([&self.visible_contents(holder)]);
        }
        let nested: Vec<Bag> = scope.iter().map(|id| self.visible_contents(id)).collect();
        scope.combine(&nested);
        scope
    }

    /// The local scope, optionally narrowed by a selector and then by player-typed text.
    ///
    /// With `target` set, only things that answer to it are kept: the first of them, or all of
    /// them when `multiple` is true.
    ///
    /// # Errors
    /// Returns a `SelectorError` for a malformed selector.
    pub fn get_local(&self, selector: Option<&str>, target: Option<&str>, multiple: bool) -> Result<Bag, SelectorError> {
        let mut scope = self.local_scope();
        if let Some(selector) = selector {
            scope = scope.query(self, selector)?;
        }
        let Some(text) = target else {
            return Ok(scope);
        };
        let hits = scope.nudge(self, text);
        if multiple {
            Ok(hits)
        } else {
            Ok(hits.first().into_iter().collect())
        }
    }

    /// The first thing in scope that answers to `text`.
    ///
    /// # Errors
    /// Returns a `SelectorError` for a malformed selector.
    pub fn find_local(&self, selector: Option<&str>, text: &str) -> Result<Option<ThingId>, SelectorError> {
        Ok(self.get_local(selector, Some(text), false)?.first())
    }

    /// Ask the thing in scope that answers to `text` to perform `action`.
    ///
    /// The current room's regions get the first say; if one of them intercepts the action the
    /// result is `Some(Response::Blocked)`. `None` means nothing in scope answers to `text`.
    ///
    /// # Errors
    /// Propagates errors from behaviors.
    pub fn ask_local(&mut self, action: &str, text: &str) -> Result<Option<Response>> {
        if let Some(room) = self.current_room
            && !self.check(room, action, None)?
        {
            return Ok(Some(Response::Blocked));
        }
        match self.find_local(None, text)? {
            Some(id) => Ok(Some(self.ask(id, action, None)?)),
            None => Ok(None),
        }
    }

    /// Append a parser rule. Rules are tried in registration order.
    ///
    /// # Errors
    /// Returns a `RuleError` if the pattern doesn't compile.
    pub fn add_rule(
        &mut self,
        pattern: impl Into<RulePattern>,
        handler: impl Fn(&mut World, &Matches) -> Result<Response> + 'static,
    ) -> Result<(), RuleError> {
        self.parser.add_rule(pattern, handler)
    }

    /// Run the first rule matching `line` verbatim.
    ///
    /// # Errors
    /// Propagates errors from the rule handler.
    pub fn evaluate(&mut self, line: &str) -> Result<Evaluation> {
        match self.parser.find(line) {
            Some((handler, matches)) => Ok(Evaluation::Matched(handler.call(self, &matches)?)),
            None => Ok(Evaluation::NoMatch),
        }
    }

    /// Top-level entry point for a line of player input.
    ///
    /// The line is normalized first (see [`normalize`]). Blank input and input no rule matches
    /// are answered with the configured messages.
    ///
    /// # Errors
    /// Propagates authoring errors raised while handling the command.
    pub fn input(&mut self, line: &str) -> Result<Evaluation> {
        let line = normalize(line, &self.config.parser);
        if line.is_empty() {
            let blank = self.config.messages.blank.clone();
            self.print(&blank);
            return Ok(Evaluation::NoMatch);
        }
        debug!("input: \"{line}\"");
        let evaluation = self.evaluate(&line)?;
        if evaluation.is_no_match() {
            let no_match = self.config.messages.no_match.clone();
            self.print(&no_match);
        }
        Ok(evaluation)
    }

    /// Literal words used by route rules, for completion.
    pub fn vocabulary(&self) -> Vec<String> {
        self.parser.vocabulary()
    }
}
