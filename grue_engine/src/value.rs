//! Property values.
//!
//! Everything [`Thing::get`](crate::thing::Thing::get) can hand back, and the literal side of
//! a selector clause. Values are loosely typed on purpose: authors attach whatever properties
//! they like to a thing and query them later with the selector language.

use std::fmt::{self, Display};
use std::rc::Rc;

use crate::bag::Bag;
use crate::thing::ThingId;
use crate::world::World;

/// A property value read from a `Thing`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<Value>),
    Things(Bag),
}

impl Value {
    /// Loose truthiness, used by the `?` selector operator.
    pub fn truthy(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Text(text) => !text.is_empty(),
            Value::List(list) => !list.is_empty(),
            Value::Things(bag) => !bag.is_empty(),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_things(&self) -> Option<&Bag> {
        match self {
            Value::Things(bag) => Some(bag),
            _ => None,
        }
    }

    /// Consume the value, keeping it only if it is a collection of things.
    pub fn into_things(self) -> Option<Bag> {
        match self {
            Value::Things(bag) => Some(bag),
            _ => None,
        }
    }

    /// Coerce a raw literal the way selector values are coerced: `true`/`false` become booleans,
    /// finite numerals become numbers and anything else stays text.
    pub fn from_literal(raw: &str) -> Value {
        let raw = raw.trim();
        match raw {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => match raw.parse::<f64>() {
                Ok(n) if !raw.is_empty() && n.is_finite() => Value::Number(n),
                _ => Value::Text(raw.to_string()),
            },
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::Text(text) => write!(f, "{text}"),
            Value::List(list) => {
                let parts: Vec<String> = list.iter().map(ToString::to_string).collect();
                write!(f, "{}", parts.join(", "))
            },
            Value::Things(bag) => write!(f, "[{} things]", bag.len()),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(f64::from(value))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<Bag> for Value {
    fn from(value: Bag) -> Self {
        Value::Things(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::List(value)
    }
}

/// Signature of a computed property: reads the world, returns a value (or nothing).
pub type ProducerFn = dyn Fn(&World, ThingId) -> Option<Value>;

/// A shareable computed property. Used for computed descriptions, computed author
/// properties and `get` overrides (proxies).
#[derive(Clone)]
pub struct Computed(Rc<ProducerFn>);

impl Computed {
    pub fn new(f: impl Fn(&World, ThingId) -> Option<Value> + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn call(&self, world: &World, id: ThingId) -> Option<Value> {
        (self.0)(world, id)
    }
}

impl fmt::Debug for Computed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Computed(..)")
    }
}

/// An author-defined property: either a stored literal or computed on every read.
#[derive(Debug, Clone)]
pub enum Property {
    Literal(Value),
    Computed(Computed),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literals_coerce_booleans_and_numbers() {
        assert_eq!(Value::from_literal("true"), Value::Bool(true));
        assert_eq!(Value::from_literal(" false "), Value::Bool(false));
        assert_eq!(Value::from_literal("3"), Value::Number(3.0));
        assert_eq!(Value::from_literal("-2.5"), Value::Number(-2.5));
        assert_eq!(Value::from_literal("brass lantern"), Value::Text("brass lantern".into()));
    }

    #[test]
    fn non_finite_numerals_stay_text() {
        assert_eq!(Value::from_literal("inf"), Value::Text("inf".into()));
        assert_eq!(Value::from_literal("NaN"), Value::Text("NaN".into()));
        assert_eq!(Value::from_literal(""), Value::Text(String::new()));
    }

    #[test]
    fn truthiness_follows_emptiness() {
        assert!(Value::Bool(true).truthy());
        assert!(!Value::Number(0.0).truthy());
        assert!(Value::Number(2.0).truthy());
        assert!(!Value::Text(String::new()).truthy());
        assert!(Value::List(vec![Value::Bool(false)]).truthy());
        assert!(!Value::Things(Bag::new()).truthy());
    }

    #[test]
    fn whole_numbers_display_without_fraction() {
        assert_eq!(Value::Number(3.0).to_string(), "3");
        assert_eq!(Value::List(vec!["a".into(), 1.into()]).to_string(), "a, 1");
    }
}
