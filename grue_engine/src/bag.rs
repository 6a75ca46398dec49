//! Bags: ordered, queryable collections of things.
//!
//! A [`Bag`] is what the engine uses wherever it needs "some things": room contents, a player's
//! inventory, the local scope of a command, the result of a query. It only stores [`ThingId`]s;
//! anything that needs to look at the things themselves borrows the [`World`].
//!
//! Bags keep insertion order and permit duplicates. [`Bag::combine`] is the exception: it is a
//! union, so ids already present are not added again.

use anyhow::Result;

use crate::selector::{Selector, SelectorError};
use crate::thing::{Event, Kind, Response, ThingId};
use crate::value::Value;
use crate::world::World;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bag {
    items: Vec<ThingId>,
}

impl Bag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, id: ThingId) {
        self.items.push(id);
    }

    /// Append several ids, keeping their order.
    pub fn add(&mut self, ids: impl IntoIterator<Item = ThingId>) {
        self.items.extend(ids);
    }

    /// Remove every occurrence of `id`. Removing an id that isn't present does nothing.
    pub fn remove(&mut self, id: ThingId) {
        self.items.retain(|item| *item != id);
    }

    pub fn first(&self) -> Option<ThingId> {
        self.items.first().copied()
    }

    pub fn at(&self, n: usize) -> Option<ThingId> {
        self.items.get(n).copied()
    }

    pub fn contains(&self, id: ThingId) -> bool {
        self.items.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = ThingId> + '_ {
        self.items.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<ThingId> {
        self.items.clone()
    }

    pub fn filter(&self, mut pred: impl FnMut(ThingId) -> bool) -> Bag {
        self.iter().filter(|id| pred(*id)).collect()
    }

    pub fn map<T>(&self, f: impl FnMut(ThingId) -> T) -> Vec<T> {
        self.iter().map(f).collect()
    }

    pub fn reduce<T>(&self, f: impl FnMut(T, ThingId) -> T, seed: T) -> T {
        self.iter().fold(seed, f)
    }

    /// Run `f` on every element for its side effects. Returns the receiver for chaining.
    pub fn each(&self, f: impl FnMut(ThingId)) -> &Self {
        self.iter().for_each(f);
        self
    }

    /// Union the elements of `others` into this bag, in argument order, skipping ids already present.
    pub fn combine<'a>(&mut self, others: impl IntoIterator<Item = &'a Bag>) -> &mut Self {
        for other in others {
            for id in other.iter() {
                if !self.contains(id) {
                    self.items.push(id);
                }
            }
        }
        self
    }

    /// Filter with a selector string (see [`crate::selector`]).
    ///
    /// # Errors
    /// Returns a `SelectorError` if the selector is malformed.
    pub fn query(&self, world: &World, selector: &str) -> Result<Bag, SelectorError> {
        let selector = Selector::parse(selector)?;
        Ok(self.query_with(world, &selector))
    }

    /// Filter with an already parsed selector.
    pub fn query_with(&self, world: &World, selector: &Selector) -> Bag {
        self.filter(|id| selector.matches(|key| world.get(id, key)))
    }

    /// The elements whose name pattern answers to `text`.
    pub fn nudge(&self, world: &World, text: &str) -> Bag {
        self.iter()
            .filter_map(|id| world.thing(id).and_then(|thing| thing.nudge(text)))
            .collect()
    }

    /// Ask every element that has a cue for `action`, skipping the ones that don't. Silent
    /// responses are dropped from the result.
    ///
    /// # Errors
    /// Propagates errors raised by the behaviors themselves.
    pub fn invoke(&self, world: &mut World, action: &str, event: Option<&Event>) -> Result<Vec<Response>> {
        let mut responses = Vec::new();
        for id in self.iter() {
            if !world.thing(id).is_some_and(|thing| thing.responds_to(action)) {
                continue;
            }
            let response = world.ask(id, action, event)?;
            if !response.is_nothing() {
                responses.push(response);
            }
        }
        Ok(responses)
    }

    /// Read the same property from every element.
    pub fn pluck(&self, world: &World, key: &str) -> Vec<Option<Value>> {
        self.map(|id| world.get(id, key))
    }

    /// Keep only the elements of a given variant.
    pub fn of_kind(&self, world: &World, kind: Kind) -> Bag {
        self.filter(|id| world.thing(id).is_some_and(|thing| thing.kind() == kind))
    }

    /// Display names of the elements, in order.
    pub fn names(&self, world: &World) -> Vec<String> {
        self.iter()
            .filter_map(|id| world.thing(id).map(|thing| thing.name.clone()))
            .collect()
    }
}

impl FromIterator<ThingId> for Bag {
    fn from_iter<I: IntoIterator<Item = ThingId>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl Extend<ThingId> for Bag {
    fn extend<I: IntoIterator<Item = ThingId>>(&mut self, iter: I) {
        self.items.extend(iter);
    }
}

impl From<Vec<ThingId>> for Bag {
    fn from(items: Vec<ThingId>) -> Self {
        Self { items }
    }
}

impl<'a> IntoIterator for &'a Bag {
    type Item = ThingId;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, ThingId>>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter().copied()
    }
}
