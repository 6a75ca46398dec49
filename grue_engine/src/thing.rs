//! Things: the capability-bearing objects of the world.
//!
//! Every object in a [`World`] is a [`Thing`]. The variants (rooms, containers, the player and
//! so on) share one record shape; which capabilities a thing has is decided once, from its
//! [`Kind`], when the world creates it:
//!
//! - holders (rooms, containers, supporters, the player) get a contents [`Bag`]
//! - containers get an `open` flag and a `contents` proxy that hides what's inside while closed
//! - rooms get exits and regions
//! - regions record the rooms they cover
//!
//! Behavior hangs off two string-keyed maps. *Cues* answer user-facing actions (`look`, `open`,
//! `read`...) through [`World::ask`]; *proxies* intercept property reads through [`Thing::get`].

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt::{self, Display};
use std::rc::Rc;

use anyhow::Result;
use regex::{Regex, RegexBuilder};
use variantly::Variantly;

use crate::bag::Bag;
use crate::parser::Matches;
use crate::room::Place;
use crate::value::{Computed, Property, Value};
use crate::world::World;

/// Stable handle to a thing, issued by the world that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ThingId(usize);

impl ThingId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl Display for ThingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The closed set of thing variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Variantly)]
pub enum Kind {
    Thing,
    Room,
    Container,
    Supporter,
    Person,
    Player,
    Scenery,
    Region,
}

impl Kind {
    /// The tag exposed as the `type` property.
    pub fn tag(self) -> &'static str {
        match self {
            Kind::Thing => "Thing",
            Kind::Room => "Room",
            Kind::Container => "Container",
            Kind::Supporter => "Supporter",
            Kind::Person => "Person",
            Kind::Player => "Player",
            Kind::Scenery => "Scenery",
            Kind::Region => "Region",
        }
    }

    /// Returns true for variants that own contents.
    pub fn holds_things(self) -> bool {
        matches!(self, Kind::Room | Kind::Container | Kind::Supporter | Kind::Player)
    }
}

/// Optional payload handed to a cue, e.g. the direction for `go`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Event {
    fields: BTreeMap<String, String>,
}

impl Event {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn direction(direction: impl Into<String>) -> Self {
        Self::new().with("direction", direction)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }
}

impl From<&Matches> for Event {
    fn from(matches: &Matches) -> Self {
        let mut event = Event::new();
        for (name, text) in matches.named() {
            event = event.with(name, text);
        }
        event
    }
}

/// What a cue answered.
#[derive(Debug, Clone, PartialEq, Eq, Variantly)]
pub enum Response {
    /// No responder, or the responder had nothing to say.
    Nothing,
    /// The action was intercepted or refused; default handling must not proceed.
    Blocked,
    /// Display text.
    Text(String),
}

/// Signature of a behavior cue.
pub type BehaviorFn = dyn Fn(&mut World, ThingId, Option<&Event>) -> Result<Response>;

/// A shareable behavior. The world clones it out of the thing before calling it, so the
/// behavior is free to mutate the world (including the thing it belongs to).
#[derive(Clone)]
pub struct Behavior(Rc<BehaviorFn>);

impl Behavior {
    pub fn new(f: impl Fn(&mut World, ThingId, Option<&Event>) -> Result<Response> + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// # Errors
    /// Whatever the behavior itself returns.
    pub fn call(&self, world: &mut World, me: ThingId, event: Option<&Event>) -> Result<Response> {
        (self.0)(world, me, event)
    }
}

impl fmt::Debug for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Behavior(..)")
    }
}

/// A registered cue: fixed text, or a behavior.
#[derive(Debug, Clone)]
pub enum Responder {
    Text(String),
    Behavior(Behavior),
}

impl Responder {
    pub fn text(text: impl Into<String>) -> Self {
        Responder::Text(text.into())
    }

    pub fn behavior(f: impl Fn(&mut World, ThingId, Option<&Event>) -> Result<Response> + 'static) -> Self {
        Responder::Behavior(Behavior::new(f))
    }
}

impl From<&str> for Responder {
    fn from(text: &str) -> Self {
        Responder::text(text)
    }
}

impl From<String> for Responder {
    fn from(text: String) -> Self {
        Responder::Text(text)
    }
}

impl From<Behavior> for Responder {
    fn from(behavior: Behavior) -> Self {
        Responder::Behavior(behavior)
    }
}

/// Long-form description: literal, or computed whenever it's read.
#[derive(Debug, Clone)]
pub enum Description {
    Text(String),
    Computed(Computed),
}

impl Default for Description {
    fn default() -> Self {
        Description::Text(String::new())
    }
}

/// Any object in the world.
#[derive(Debug, Clone)]
pub struct Thing {
    id: ThingId,
    kind: Kind,
    pub name: String,
    pub description: Description,
    pub classes: BTreeSet<String>,
    /// Left out of room listings.
    pub background: bool,
    /// Eligible for pickup. `None` until an author says otherwise.
    pub portable: Option<bool>,
    pattern: Option<Regex>,
    props: BTreeMap<String, Property>,
    cues: HashMap<String, Responder>,
    proxies: HashMap<String, Computed>,
    pub(crate) parent: Option<ThingId>,
    pub(crate) contents: Option<Bag>,
    pub(crate) open: Option<bool>,
    pub(crate) place: Option<Place>,
    pub(crate) territory: Option<Bag>,
}

impl Thing {
    /// Build a bare thing with the capabilities of its kind. Default cues are installed by the world.
    pub(crate) fn new(id: ThingId, kind: Kind) -> Self {
        let mut thing = Self {
            id,
            kind,
            name: String::new(),
            description: Description::default(),
            classes: BTreeSet::new(),
            background: false,
            portable: None,
            pattern: None,
            props: BTreeMap::new(),
            cues: HashMap::new(),
            proxies: HashMap::new(),
            parent: None,
            contents: kind.holds_things().then(Bag::new),
            open: kind.is_container().then_some(false),
            place: kind.is_room().then(Place::default),
            territory: kind.is_region().then(Bag::new),
        };
        if kind.is_scenery() {
            thing.background = true;
            thing.portable = Some(false);
        }
        thing
    }

    pub fn id(&self) -> ThingId {
        self.id
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// The container this thing currently lives in, if any.
    pub fn parent(&self) -> Option<ThingId> {
        self.parent
    }

    /// Stored contents, ignoring any visibility proxy. `None` for things that can't hold others.
    pub fn raw_contents(&self) -> Option<&Bag> {
        self.contents.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.open.unwrap_or(false)
    }

    pub fn pattern(&self) -> Option<&Regex> {
        self.pattern.as_ref()
    }

    pub fn responds_to(&self, action: &str) -> bool {
        self.cues.contains_key(action)
    }

    pub fn responder(&self, action: &str) -> Option<&Responder> {
        self.cues.get(action)
    }

    pub(crate) fn insert_cue(&mut self, action: &str, responder: Responder) {
        self.cues.insert(action.to_string(), responder);
    }

    pub(crate) fn insert_proxy(&mut self, key: &str, proxy: Computed) {
        self.proxies.insert(key.to_string(), proxy);
    }

    /// Read a property.
    ///
    /// An override registered with [`World::proxy`] wins; then the built-in fields (`name`,
    /// `description`, `type`, `classes`, `background`, `portable`, `open`, `contents`); then
    /// author properties, computed ones being evaluated on the spot. `None` if the key is unknown.
    pub fn get(&self, world: &World, key: &str) -> Option<Value> {
        if let Some(proxy) = self.proxies.get(key) {
            return proxy.call(world, self.id);
        }
        match key {
            "name" => Some(Value::Text(self.name.clone())),
            "description" => Some(Value::Text(self.description_text(world))),
            "type" => Some(Value::Text(self.kind.tag().to_string())),
            "classes" => Some(Value::List(self.classes.iter().map(|c| Value::Text(c.clone())).collect())),
            "background" => Some(Value::Bool(self.background)),
            "portable" => self.portable.map(Value::Bool),
            "open" => self.open.map(Value::Bool),
            "contents" => self.contents.clone().map(Value::Things),
            _ => match self.props.get(key)? {
                Property::Literal(value) => Some(value.clone()),
                Property::Computed(producer) => producer.call(world, self.id),
            },
        }
    }

    /// The description as display text.
    pub fn description_text(&self, world: &World) -> String {
        match &self.description {
            Description::Text(text) => text.clone(),
            Description::Computed(producer) => producer.call(world, self.id).map(|v| v.to_string()).unwrap_or_default(),
        }
    }

    /// Does this thing answer to the player-typed `input`? Returns its id on a match.
    ///
    /// With a pattern set the (case-insensitive) pattern decides. Without one, the thing answers
    /// to any non-empty text contained in its name.
    pub fn nudge(&self, input: &str) -> Option<ThingId> {
        let matched = match &self.pattern {
            Some(pattern) => pattern.is_match(input),
            None => {
                let needle = input.trim().to_lowercase();
                !needle.is_empty() && self.name.to_lowercase().contains(&needle)
            },
        };
        matched.then_some(self.id)
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = name.into();
        self
    }

    pub fn set_description(&mut self, description: impl Into<String>) -> &mut Self {
        self.description = Description::Text(description.into());
        self
    }

    /// Compute the description every time it is read.
    pub fn set_description_fn(&mut self, f: impl Fn(&World, ThingId) -> String + 'static) -> &mut Self {
        self.description = Description::Computed(Computed::new(move |world, id| Some(Value::Text(f(world, id)))));
        self
    }

    /// Set the noun-phrase pattern. Matching is case-insensitive.
    ///
    /// # Errors
    /// Returns the regex error if the pattern doesn't compile.
    pub fn set_pattern(&mut self, pattern: &str) -> Result<&mut Self, regex::Error> {
        self.pattern = Some(RegexBuilder::new(pattern).case_insensitive(true).build()?);
        Ok(self)
    }

    pub fn set_portable(&mut self, portable: bool) -> &mut Self {
        self.portable = Some(portable);
        self
    }

    pub fn set_background(&mut self, background: bool) -> &mut Self {
        self.background = background;
        self
    }

    pub fn add_class(&mut self, class: impl Into<String>) -> &mut Self {
        self.classes.insert(class.into());
        self
    }

    /// Open or close a container. Things without a lid ignore this.
    pub fn set_open(&mut self, open: bool) -> &mut Self {
        if self.open.is_some() {
            self.open = Some(open);
        }
        self
    }

    pub fn set_prop(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.props.insert(key.into(), Property::Literal(value.into()));
        self
    }

    pub fn set_computed(
        &mut self,
        key: impl Into<String>,
        f: impl Fn(&World, ThingId) -> Option<Value> + 'static,
    ) -> &mut Self {
        self.props.insert(key.into(), Property::Computed(Computed::new(f)));
        self
    }

    /// Assign a property by key, routing the built-in keys to their fields.
    /// Values of the wrong type for a built-in key are ignored.
    pub fn assign(&mut self, key: &str, value: Value) -> &mut Self {
        match (key, value) {
            ("name", Value::Text(name)) => {
                self.name = name;
            },
            ("description", Value::Text(text)) => {
                self.description = Description::Text(text);
            },
            ("background", Value::Bool(b)) => {
                self.background = b;
            },
            ("portable", Value::Bool(b)) => {
                self.portable = Some(b);
            },
            ("open", Value::Bool(b)) => {
                self.set_open(b);
            },
            ("name" | "description" | "background" | "portable" | "open" | "type" | "classes" | "contents", _) => {},
            (other, value) => {
                self.props.insert(other.to_string(), Property::Literal(value));
            },
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::Transcript;

    #[test]
    fn capabilities_follow_kind() {
        let room = Thing::new(ThingId::new(0), Kind::Room);
        assert!(room.raw_contents().is_some());
        assert!(room.place.is_some());
        assert!(room.open.is_none());

        let chest = Thing::new(ThingId::new(1), Kind::Container);
        assert!(chest.raw_contents().is_some());
        assert_eq!(chest.open, Some(false));

        let pebble = Thing::new(ThingId::new(2), Kind::Thing);
        assert!(pebble.raw_contents().is_none());
        assert!(pebble.portable.is_none());

        let door = Thing::new(ThingId::new(3), Kind::Scenery);
        assert!(door.background);
        assert_eq!(door.portable, Some(false));
    }

    #[test]
    fn nudge_uses_pattern_case_insensitively() {
        let mut leaflet = Thing::new(ThingId::new(4), Kind::Thing);
        leaflet.set_name("leaflet").set_pattern("leaflet|pamphlet").unwrap();
        assert_eq!(leaflet.nudge("LEAFLET"), Some(leaflet.id()));
        assert_eq!(leaflet.nudge("the pamphlet"), Some(leaflet.id()));
        assert_eq!(leaflet.nudge("mailbox"), None);
    }

    #[test]
    fn nudge_falls_back_to_name() {
        let mut mailbox = Thing::new(ThingId::new(5), Kind::Container);
        mailbox.set_name("small mailbox");
        assert_eq!(mailbox.nudge("Mailbox"), Some(mailbox.id()));
        assert_eq!(mailbox.nudge("small mailbox"), Some(mailbox.id()));
        assert_eq!(mailbox.nudge("   "), None);
        assert_eq!(mailbox.nudge("large mailbox"), None);
    }

    #[test]
    fn bad_pattern_is_an_error() {
        let mut thing = Thing::new(ThingId::new(6), Kind::Thing);
        assert!(thing.set_pattern("(unclosed").is_err());
        assert!(thing.pattern().is_none());
    }

    #[test]
    fn get_reads_builtins_and_props() {
        let mut world = World::new(Transcript::new());
        let lamp = world.new_thing();
        world
            .edit(lamp)
            .unwrap()
            .set_name("brass lantern")
            .set_description("A battery-powered brass lantern.")
            .add_class("light")
            .set_prop("size", 3)
            .set_computed("weight", |_, _| Some(Value::Number(1.5)));
        assert_eq!(world.get(lamp, "name"), Some(Value::Text("brass lantern".into())));
        assert_eq!(world.get(lamp, "type"), Some(Value::Text("Thing".into())));
        assert_eq!(world.get(lamp, "classes"), Some(Value::List(vec!["light".into()])));
        assert_eq!(world.get(lamp, "size"), Some(Value::Number(3.0)));
        assert_eq!(world.get(lamp, "weight"), Some(Value::Number(1.5)));
        assert_eq!(world.get(lamp, "portable"), None);
        assert_eq!(world.get(lamp, "open"), None);
        assert_eq!(world.get(lamp, "colour"), None);
    }

    #[test]
    fn computed_description_sees_the_world() {
        let mut world = World::new(Transcript::new());
        let clock = world.new_thing();
        world
            .edit(clock)
            .unwrap()
            .set_prop("hour", 3)
            .set_description_fn(|world, me| format!("It reads {} o'clock.", world.get(me, "hour").unwrap_or(Value::Number(0.0))));
        assert_eq!(world.get(clock, "description"), Some(Value::Text("It reads 3 o'clock.".into())));
    }

    #[test]
    fn assign_routes_builtin_keys() {
        let mut thing = Thing::new(ThingId::new(7), Kind::Thing);
        thing.assign("portable", Value::Bool(true));
        thing.assign("name", "rope".into());
        thing.assign("open", Value::Bool(true));
        thing.assign("type", "Room".into());
        thing.assign("size", 2.into());
        assert_eq!(thing.portable, Some(true));
        assert_eq!(thing.name, "rope");
        assert_eq!(thing.open, None);
        assert_eq!(thing.kind(), Kind::Thing);
        assert!(matches!(thing.props.get("size"), Some(Property::Literal(Value::Number(n))) if *n == 2.0));
    }

    #[test]
    fn event_from_matches_carries_named_groups() {
        let regex = Regex::new(r"go (?P<direction>\w+)").unwrap();
        let matches = Matches::from_captures("go north", &regex, &regex.captures("go north").unwrap());
        let event = Event::from(&matches);
        assert_eq!(event.get("direction"), Some("north"));
        assert_eq!(Event::direction("up").get("direction"), Some("up"));
    }
}
