//! Attribute selector language.
//!
//! Selectors filter a [`Bag`](crate::bag::Bag) by the properties of its things, a bit like a
//! CSS attribute selector without the brackets:
//!
//! ```text
//! portable=true, size >= 3, name ^= "brass"
//! ```
//!
//! Clauses are separated by commas and are ANDed together. Each clause is `key operator value`:
//!
//! | op   | meaning                                  |
//! |------|------------------------------------------|
//! | `=`  | equal                                    |
//! | `!=` | not equal                                |
//! | `>` `>=` `<` `<=` | ordering (numbers or text)  |
//! | `?`  | truthy                                   |
//! | `~=` | list (or text) contains the value        |
//! | `^=` | text starts with                         |
//! | `$=` | text ends with                           |
//! | `*=` | text contains                            |
//!
//! A bare `key` only tests that the property exists. A thing that lacks the property is never
//! matched, whatever the operator. Literal values `true`/`false` become booleans, numerals become
//! numbers, everything else is text.
//!
//! A selector that doesn't parse is an authoring bug, so parsing fails hard with a
//! [`SelectorError`] rather than quietly matching nothing.

use std::str::FromStr;

use pest::Parser;
use pest::iterators::Pair;
use pest_derive::Parser as PestParser;
use thiserror::Error;

use crate::value::Value;

#[derive(PestParser)]
#[grammar = "src/selector.pest"]
struct SelectorParser;

/// Errors raised while parsing a selector string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    #[error("bad selector \"{selector}\": {reason}")]
    Syntax { selector: String, reason: String },
    #[error("unexpected selector shape: {0}")]
    Shape(&'static str),
}

/// Comparison performed by a single clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Present,
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    Truthy,
    Contains,
    StartsWith,
    EndsWith,
    Substring,
}

impl Operator {
    fn from_symbol(symbol: &str) -> Option<Self> {
        let op = match symbol {
            "=" => Operator::Eq,
            "!=" => Operator::Ne,
            ">" => Operator::Gt,
            ">=" => Operator::Ge,
            "<" => Operator::Lt,
            "<=" => Operator::Le,
            "?" => Operator::Truthy,
            "~=" => Operator::Contains,
            "^=" => Operator::StartsWith,
            "$=" => Operator::EndsWith,
            "*=" => Operator::Substring,
            _ => return None,
        };
        Some(op)
    }
}

/// One `key operator value` test.
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    pub key: String,
    pub op: Operator,
    pub value: Value,
}

impl Clause {
    /// Test a property value that is known to exist.
    pub fn test(&self, actual: &Value) -> bool {
        match self.op {
            Operator::Present => true,
            Operator::Eq => actual == &self.value,
            Operator::Ne => actual != &self.value,
            Operator::Gt => compare(actual, &self.value).is_some_and(std::cmp::Ordering::is_gt),
            Operator::Ge => compare(actual, &self.value).is_some_and(std::cmp::Ordering::is_ge),
            Operator::Lt => compare(actual, &self.value).is_some_and(std::cmp::Ordering::is_lt),
            Operator::Le => compare(actual, &self.value).is_some_and(std::cmp::Ordering::is_le),
            Operator::Truthy => actual.truthy(),
            Operator::Contains => match actual {
                Value::List(items) => items.contains(&self.value),
                Value::Text(text) => text.contains(&self.value.to_string()),
                _ => false,
            },
            Operator::StartsWith => actual.as_text().is_some_and(|t| t.starts_with(&self.value.to_string())),
            Operator::EndsWith => actual.as_text().is_some_and(|t| t.ends_with(&self.value.to_string())),
            Operator::Substring => actual.as_text().is_some_and(|t| t.contains(&self.value.to_string())),
        }
    }
}

/// Ordering only exists between two numbers or two strings.
fn compare(a: &Value, b: &Value) -> Option<std::cmp::Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.partial_cmp(y),
        (Value::Text(x), Value::Text(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// A parsed selector: a conjunction of clauses.
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    clauses: Vec<Clause>,
}

impl Selector {
    /// Parse a selector string.
    ///
    /// # Errors
    /// Returns a `SelectorError` if the string is not a well-formed selector.
    pub fn parse(source: &str) -> Result<Self, SelectorError> {
        let syntax = |reason: String| SelectorError::Syntax {
            selector: source.to_string(),
            reason,
        };
        let mut pairs = SelectorParser::parse(Rule::selector, source).map_err(|e| syntax(e.to_string()))?;
        let root = pairs.next().ok_or(SelectorError::Shape("expected selector"))?;

        let mut clauses = Vec::new();
        for pair in root.into_inner() {
            if pair.as_rule() == Rule::clause {
                clauses.push(parse_clause(pair).map_err(|reason| syntax(reason.to_string()))?);
            }
        }
        Ok(Self { clauses })
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Returns true if every clause holds. `lookup` reads a property by key and returns `None` if the
    /// property is missing, which fails the clause outright.
    pub fn matches(&self, lookup: impl Fn(&str) -> Option<Value>) -> bool {
        self.clauses
            .iter()
            .all(|clause| lookup(&clause.key).is_some_and(|actual| clause.test(&actual)))
    }
}

impl FromStr for Selector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Selector::parse(s)
    }
}

fn parse_clause(pair: Pair<'_, Rule>) -> Result<Clause, &'static str> {
    let mut inner = pair.into_inner();
    let key = inner.next().ok_or("clause without key")?.as_str().to_string();

    let Some(op_pair) = inner.next() else {
        return Ok(Clause {
            key,
            op: Operator::Present,
            value: Value::Bool(true),
        });
    };
    let op = Operator::from_symbol(op_pair.as_str()).ok_or("unknown operator")?;

    let value = match inner.next() {
        Some(literal) => {
            let body = literal.into_inner().next().ok_or("empty literal")?;
            match body.as_rule() {
                // quoted text is coerced the same way bare text is
                Rule::quoted => Value::from_literal(body.into_inner().next().map_or("", |p| p.as_str())),
                _ => Value::from_literal(body.as_str()),
            }
        },
        None => Value::Text(String::new()),
    };

    Ok(Clause { key, op, value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn props(pairs: &[(&str, Value)]) -> HashMap<String, Value> {
        pairs.iter().map(|(k, v)| ((*k).to_string(), v.clone())).collect()
    }

    fn check(selector: &str, thing: &HashMap<String, Value>) -> bool {
        Selector::parse(selector).unwrap().matches(|key| thing.get(key).cloned())
    }

    #[test]
    fn parses_clauses_and_coerces_values() {
        let selector = Selector::parse("portable=true, size >= 3, name ^= \"brass\"").unwrap();
        let clauses = selector.clauses();
        assert_eq!(clauses.len(), 3);
        assert_eq!(clauses[0].op, Operator::Eq);
        assert_eq!(clauses[0].value, Value::Bool(true));
        assert_eq!(clauses[1].op, Operator::Ge);
        assert_eq!(clauses[1].value, Value::Number(3.0));
        assert_eq!(clauses[2].op, Operator::StartsWith);
        assert_eq!(clauses[2].value, Value::Text("brass".into()));
    }

    #[test]
    fn bare_key_is_a_presence_test() {
        let selector = Selector::parse("lit").unwrap();
        assert_eq!(selector.clauses()[0].op, Operator::Present);
        assert!(check("lit", &props(&[("lit", Value::Bool(false))])));
        assert!(!check("lit", &props(&[])));
    }

    #[test]
    fn missing_property_never_matches() {
        let thing = props(&[("size", Value::Number(1.0))]);
        assert!(!check("portable!=true", &thing));
        assert!(!check("portable?", &thing));
    }

    #[test]
    fn equality_is_strict_about_types() {
        let thing = props(&[("portable", Value::Bool(true)), ("size", Value::Number(4.0))]);
        assert!(check("portable=true", &thing));
        assert!(!check("portable=\"yes\"", &thing));
        assert!(check("size=4", &thing));
        assert!(!check("size=\"four\"", &thing));
        assert!(check("size!=5", &thing));
    }

    #[test]
    fn ordering_operators() {
        let thing = props(&[("size", Value::Number(4.0)), ("name", Value::Text("lamp".into()))]);
        assert!(check("size>3", &thing));
        assert!(!check("size>4", &thing));
        assert!(check("size>=4", &thing));
        assert!(check("size<5", &thing));
        assert!(!check("size<4", &thing));
        assert!(check("size<=4", &thing));
        assert!(check("name<mailbox", &thing));
        // mismatched types never order
        assert!(!check("name>3", &thing));
    }

    #[test]
    fn clauses_are_anded() {
        let small = props(&[("size", Value::Number(2.0)), ("portable", Value::Bool(true))]);
        let large = props(&[("size", Value::Number(9.0)), ("portable", Value::Bool(true))]);
        let fixed = props(&[("size", Value::Number(9.0)), ("portable", Value::Bool(false))]);
        assert!(!check("size>3,portable=true", &small));
        assert!(check("size>3,portable=true", &large));
        assert!(!check("size>3,portable=true", &fixed));
    }

    #[test]
    fn text_operators() {
        let thing = props(&[
            ("name", Value::Text("brass lantern".into())),
            ("classes", Value::List(vec!["light".into(), "tool".into()])),
        ]);
        assert!(check("name^=brass", &thing));
        assert!(check("name$=lantern", &thing));
        assert!(check("name*=\"s lan\"", &thing));
        assert!(!check("name^=lantern", &thing));
        assert!(check("classes~=light", &thing));
        assert!(!check("classes~=weapon", &thing));
        assert!(check("name~=lantern", &thing));
    }

    #[test]
    fn text_operators_reject_non_text() {
        let thing = props(&[("size", Value::Number(12.0))]);
        assert!(!check("size^=1", &thing));
        assert!(!check("size*=2", &thing));
    }

    #[test]
    fn truthiness_operator_ignores_value() {
        let thing = props(&[("lit", Value::Bool(true)), ("charge", Value::Number(0.0))]);
        assert!(check("lit?", &thing));
        assert!(check("lit ? whatever", &thing));
        assert!(!check("charge?", &thing));
    }

    #[test]
    fn malformed_selectors_are_errors() {
        for bad in ["", "=true", "portable=true,", "size ! 3", ",name=x", "name=\"unterminated"] {
            let err = Selector::parse(bad).unwrap_err();
            assert!(matches!(err, SelectorError::Syntax { .. }), "{bad:?} should not parse");
        }
    }

    #[test]
    fn error_message_names_the_selector() {
        let err = Selector::parse("size ! 3").unwrap_err();
        assert!(err.to_string().contains("size ! 3"));
    }
}
