//! Ordered, first-match rule parser.
//!
//! A rule pairs a pattern with a handler. Patterns are either a ready [`Regex`] or a *route*, a
//! whitespace separated token string in the style of a web router:
//!
//! ```text
//! take :item from? :source?
//! ```
//!
//! - `:name` captures a noun phrase (one or more words) under `name`
//! - a trailing `?` makes the token optional
//! - anything else is matched literally
//!
//! An optional word followed by an optional capture (`from? :source?`) is one unit, so "take brass
//! lantern" leaves `item` whole and `source` unset.
//!
//! Routes match the whole line, case-insensitively, with any amount of whitespace between tokens.
//!
//! Rules are tried in registration order and the first one that matches wins. There is no
//! ranking by specificity, so a rule registered later can never shadow an earlier one that
//! matches the same input.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use anyhow::Result;
use log::{debug, info};
use regex::{Captures, Regex, RegexBuilder};
use thiserror::Error;
use variantly::Variantly;

use crate::config::ParserSettings;
use crate::thing::Response;

/// Errors raised while compiling a rule pattern.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("empty route")]
    EmptyRoute,
    #[error("bad capture name \":{name}\" in route \"{route}\"")]
    BadCapture { route: String, name: String },
    #[error("pattern \"{pattern}\" does not compile: {source}")]
    Compile {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Match data handed to a rule handler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Matches {
    line: String,
    groups: Vec<Option<String>>,
    named: BTreeMap<String, String>,
}

impl Matches {
    /// Collect positional and named groups from a successful match.
    pub fn from_captures(line: &str, regex: &Regex, captures: &Captures<'_>) -> Self {
        let groups = captures.iter().map(|m| m.map(|m| m.as_str().to_string())).collect();
        let named = regex
            .capture_names()
            .flatten()
            .filter_map(|name| captures.name(name).map(|m| (name.to_string(), m.as_str().to_string())))
            .collect();
        Self {
            line: line.to_string(),
            groups,
            named,
        }
    }

    /// The input line that matched.
    pub fn line(&self) -> &str {
        &self.line
    }

    /// Positional group `i` (0 is the whole match). `None` if the group didn't participate.
    pub fn at(&self, i: usize) -> Option<&str> {
        self.groups.get(i).and_then(|g| g.as_deref())
    }

    /// Named group, e.g. `item` for a `:item` route token.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.named.get(name).map(String::as_str)
    }

    /// Named groups that participated in the match, in name order.
    pub fn named(&self) -> impl Iterator<Item = (&str, &str)> {
        self.named.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// One token of a route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteToken {
    Literal { text: String, optional: bool },
    Capture { name: String, optional: bool },
}

impl RouteToken {
    fn is_literal(&self) -> bool {
        matches!(self, RouteToken::Literal { .. })
    }

    fn is_optional(&self) -> bool {
        match self {
            RouteToken::Literal { optional, .. } | RouteToken::Capture { optional, .. } => *optional,
        }
    }

    /// The token's expression without its optional wrapper. A lazy capture gives up words to
    /// whatever follows; a greedy one keeps the whole phrase.
    fn body(&self, lazy: bool) -> String {
        match self {
            RouteToken::Literal { text, .. } => bounded_literal(text),
            RouteToken::Capture { name, .. } => {
                let repeat = if lazy { "*?" } else { "*" };
                format!(r"\b(?P<{name}>\w+(?:\s+\w+){repeat})\b")
            },
        }
    }
}

/// Escape a literal, pinning word-character edges to word boundaries so it can't match inside
/// a longer word.
fn bounded_literal(text: &str) -> String {
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    let mut out = String::new();
    if text.starts_with(is_word) {
        out.push_str(r"\b");
    }
    out.push_str(&regex::escape(text));
    if text.ends_with(is_word) {
        out.push_str(r"\b");
    }
    out
}

/// A parsed route string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    source: String,
    tokens: Vec<RouteToken>,
}

impl Route {
    /// Tokenize a route.
    ///
    /// # Errors
    /// Returns an error for an empty route or a capture whose name isn't an identifier.
    pub fn parse(source: &str) -> Result<Self, RuleError> {
        let mut tokens = Vec::new();
        for word in source.split_whitespace() {
            let (body, optional) = match word.strip_suffix('?') {
                Some(body) if !body.is_empty() => (body, true),
                _ => (word, false),
            };
            let token = match body.strip_prefix(':') {
                Some(name) if is_identifier(name) => RouteToken::Capture {
                    name: name.to_string(),
                    optional,
                },
                Some(name) => {
                    return Err(RuleError::BadCapture {
                        route: source.to_string(),
                        name: name.to_string(),
                    });
                },
                None => RouteToken::Literal {
                    text: body.to_string(),
                    optional,
                },
            };
            tokens.push(token);
        }
        if tokens.is_empty() {
            return Err(RuleError::EmptyRoute);
        }
        Ok(Self {
            source: source.to_string(),
            tokens,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn tokens(&self) -> &[RouteToken] {
        &self.tokens
    }

    /// Literal words of the route, for completion.
    pub fn literals(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().filter_map(|token| match token {
            RouteToken::Literal { text, .. } => Some(text.as_str()),
            RouteToken::Capture { .. } => None,
        })
    }

    /// Compile to an anchored, case-insensitive regex.
    ///
    /// # Errors
    /// Returns an error if the generated expression doesn't compile (e.g. a duplicated capture).
    pub fn to_regex(&self) -> Result<Regex, RuleError> {
        let pattern = format!(r"^\s*{}\s*$", self.pieces().join(r"\s*"));
        RegexBuilder::new(&pattern)
            .case_insensitive(true)
            .build()
            .map_err(|source| RuleError::Compile {
                pattern: self.source.clone(),
                source,
            })
    }

    /// One regex fragment per token, except that an optional literal and the optional capture
    /// right after it (`from? :source?`) share a group: the capture only matches behind the
    /// literal. A capture is lazy while a literal still follows it, greedy otherwise.
    fn pieces(&self) -> Vec<String> {
        let tokens = &self.tokens;
        let lazy_at = |i: usize| tokens[i + 1..].iter().any(RouteToken::is_literal);
        let mut pieces = Vec::new();
        let mut i = 0;
        while i < tokens.len() {
            let token = &tokens[i];
            let paired = token.is_literal()
                && token.is_optional()
                && tokens.get(i + 1).is_some_and(|next| !next.is_literal() && next.is_optional());
            if paired {
                pieces.push(format!(r"(?:{}\s*{})?", token.body(false), tokens[i + 1].body(lazy_at(i + 1))));
                i += 2;
                continue;
            }
            let body = token.body(lazy_at(i));
            pieces.push(if token.is_optional() { format!("(?:{body})?") } else { body });
            i += 1;
        }
        pieces
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// What `add_rule` accepts.
#[derive(Debug, Clone)]
pub enum RulePattern {
    Regex(Regex),
    Route(String),
}

impl From<Regex> for RulePattern {
    fn from(regex: Regex) -> Self {
        RulePattern::Regex(regex)
    }
}

impl From<&str> for RulePattern {
    fn from(route: &str) -> Self {
        RulePattern::Route(route.to_string())
    }
}

impl From<String> for RulePattern {
    fn from(route: String) -> Self {
        RulePattern::Route(route)
    }
}

type HandlerFn<C> = dyn Fn(&mut C, &Matches) -> Result<Response>;

/// A rule handler. Cheap to clone, so a caller can release its borrow of the parser before
/// handing the context to the handler.
pub struct Handler<C>(Rc<HandlerFn<C>>);

impl<C> Handler<C> {
    pub fn new(f: impl Fn(&mut C, &Matches) -> Result<Response> + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// # Errors
    /// Whatever the handler returns.
    pub fn call(&self, context: &mut C, matches: &Matches) -> Result<Response> {
        (self.0)(context, matches)
    }
}

impl<C> Clone for Handler<C> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

struct Rule<C> {
    source: String,
    regex: Regex,
    words: Vec<String>,
    handler: Handler<C>,
}

/// Outcome of evaluating one line.
#[derive(Debug, Clone, PartialEq, Eq, Variantly)]
pub enum Evaluation {
    Matched(Response),
    NoMatch,
}

/// Ordered rule list over a context type `C` (the world, in practice).
pub struct RuleParser<C> {
    rules: Vec<Rule<C>>,
}

impl<C> Default for RuleParser<C> {
    fn default() -> Self {
        Self { rules: Vec::new() }
    }
}

impl<C> fmt::Debug for RuleParser<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.rules.iter().map(|rule| &rule.source)).finish()
    }
}

impl<C> RuleParser<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule. It will be tried after every rule already registered.
    ///
    /// # Errors
    /// Returns a `RuleError` if a route is malformed or doesn't compile.
    pub fn add_rule(
        &mut self,
        pattern: impl Into<RulePattern>,
        handler: impl Fn(&mut C, &Matches) -> Result<Response> + 'static,
    ) -> Result<(), RuleError> {
        let (source, regex, words) = match pattern.into() {
            RulePattern::Regex(regex) => (regex.as_str().to_string(), regex, Vec::new()),
            RulePattern::Route(route) => {
                let route = Route::parse(&route)?;
                let words = route.literals().map(str::to_lowercase).collect();
                (route.source().to_string(), route.to_regex()?, words)
            },
        };
        info!("registered rule {} \"{source}\"", self.rules.len());
        self.rules.push(Rule {
            source,
            regex,
            words,
            handler: Handler::new(handler),
        });
        Ok(())
    }

    /// The first rule matching `line`, with its match data.
    pub fn find(&self, line: &str) -> Option<(Handler<C>, Matches)> {
        self.rules.iter().find_map(|rule| {
            let captures = rule.regex.captures(line)?;
            debug!("\"{line}\" matched rule \"{}\"", rule.source);
            Some((rule.handler.clone(), Matches::from_captures(line, &rule.regex, &captures)))
        })
    }

    /// Run the first matching rule against `context`.
    ///
    /// # Errors
    /// Propagates the handler's error.
    pub fn evaluate(&self, context: &mut C, line: &str) -> Result<Evaluation> {
        match self.find(line) {
            Some((handler, matches)) => Ok(Evaluation::Matched(handler.call(context, &matches)?)),
            None => Ok(Evaluation::NoMatch),
        }
    }

    /// Literal route words across all rules, deduplicated, in first-seen order.
    pub fn vocabulary(&self) -> Vec<String> {
        let mut words: Vec<String> = Vec::new();
        for word in self.rules.iter().flat_map(|rule| rule.words.iter()) {
            if !words.contains(word) {
                words.push(word.clone());
            }
        }
        words
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Prepare a raw input line for matching: trim, optionally lower-case, drop filler words.
pub fn normalize(line: &str, settings: &ParserSettings) -> String {
    let line = if settings.lowercase {
        line.trim().to_lowercase()
    } else {
        line.trim().to_string()
    };
    line.split_whitespace()
        .filter(|word| !settings.ignored_words.iter().any(|ignored| ignored.eq_ignore_ascii_case(word)))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log_rule(parser: &mut RuleParser<Vec<String>>, pattern: impl Into<RulePattern>, tag: &'static str) {
        parser
            .add_rule(pattern, move |log: &mut Vec<String>, m: &Matches| {
                log.push(format!("{tag}:{}", m.get("item").unwrap_or("-")));
                Ok(Response::Nothing)
            })
            .unwrap();
    }

    #[test]
    fn route_tokens() {
        let route = Route::parse("take :item from? :source?").unwrap();
        assert_eq!(
            route.tokens(),
            &[
                RouteToken::Literal {
                    text: "take".into(),
                    optional: false
                },
                RouteToken::Capture {
                    name: "item".into(),
                    optional: false
                },
                RouteToken::Literal {
                    text: "from".into(),
                    optional: true
                },
                RouteToken::Capture {
                    name: "source".into(),
                    optional: true
                },
            ]
        );
        assert_eq!(route.literals().collect::<Vec<_>>(), vec!["take", "from"]);
    }

    #[test]
    fn route_captures_noun_phrases() {
        let regex = Route::parse("drop :item").unwrap().to_regex().unwrap();
        let caps = regex.captures("drop the leaflet").unwrap();
        let m = Matches::from_captures("drop the leaflet", &regex, &caps);
        assert_eq!(m.get("item"), Some("the leaflet"));
        assert_eq!(m.at(1), Some("the leaflet"));
    }

    #[test]
    fn optional_tokens() {
        let regex = Route::parse("take :item from? :source?").unwrap().to_regex().unwrap();
        let caps = regex.captures("take leaflet from mailbox").unwrap();
        assert_eq!(&caps["item"], "leaflet");
        assert_eq!(&caps["source"], "mailbox");

        let caps = regex.captures("take leaflet").unwrap();
        assert_eq!(&caps["item"], "leaflet");
        assert!(caps.name("source").is_none());
    }

    #[test]
    fn noun_phrases_stay_whole_around_optional_tokens() {
        let regex = Route::parse("take :item from? :source?").unwrap().to_regex().unwrap();
        let caps = regex.captures("take brass lantern").unwrap();
        assert_eq!(&caps["item"], "brass lantern");
        assert!(caps.name("source").is_none());

        let caps = regex.captures("take brass lantern from small mailbox").unwrap();
        assert_eq!(&caps["item"], "brass lantern");
        assert_eq!(&caps["source"], "small mailbox");

        let regex = Route::parse("give :item :person").unwrap().to_regex().unwrap();
        let caps = regex.captures("give red ball troll").unwrap();
        assert_eq!((&caps["item"], &caps["person"]), ("red ball", "troll"));
    }

    #[test]
    fn trailing_literal_bounds_the_capture() {
        let regex = Route::parse("turn :item on").unwrap().to_regex().unwrap();
        assert_eq!(&regex.captures("turn brass lamp on").unwrap()["item"], "brass lamp");
        assert!(regex.captures("turn lamp off").is_none());
    }

    #[test]
    fn literals_do_not_match_inside_words() {
        let regex = Route::parse("put :item in :holder").unwrap().to_regex().unwrap();
        let caps = regex.captures("put coin in case").unwrap();
        assert_eq!((&caps["item"], &caps["holder"]), ("coin", "case"));
        assert!(regex.captures("put coin case").is_none());
    }

    #[test]
    fn routes_are_case_insensitive_and_literal() {
        let regex = Route::parse("what? is :item").unwrap().to_regex().unwrap();
        assert!(regex.is_match("WHAT IS lamp"));
        assert!(regex.is_match("is lamp"));

        let regex = Route::parse("a.b :x").unwrap().to_regex().unwrap();
        assert!(regex.is_match("a.b y"));
        assert!(!regex.is_match("axb y"));
    }

    #[test]
    fn bad_routes_are_errors() {
        assert!(matches!(Route::parse("   "), Err(RuleError::EmptyRoute)));
        assert!(matches!(Route::parse("take :"), Err(RuleError::BadCapture { .. })));
        assert!(matches!(Route::parse("take :9lives"), Err(RuleError::BadCapture { .. })));
        let route = Route::parse("put :item in :item").unwrap();
        assert!(matches!(route.to_regex(), Err(RuleError::Compile { .. })));
    }

    #[test]
    fn first_registered_rule_wins() {
        let mut parser = RuleParser::new();
        log_rule(&mut parser, "take :item", "first");
        log_rule(&mut parser, "take :item", "second");
        let mut log = Vec::new();
        let result = parser.evaluate(&mut log, "take lamp").unwrap();
        assert_eq!(result, Evaluation::Matched(Response::Nothing));
        assert_eq!(log, vec!["first:lamp"]);
    }

    #[test]
    fn regex_rules_expose_named_and_positional_groups() {
        let mut parser = RuleParser::new();
        parser
            .add_rule(
                Regex::new(r"(?i)^(open|close) (?P<item>[\w\s]+)$").unwrap(),
                |log: &mut Vec<String>, m: &Matches| {
                    log.push(format!("{} {}", m.at(1).unwrap_or(""), m.get("item").unwrap_or("")));
                    Ok(Response::Text("ok".into()))
                },
            )
            .unwrap();
        let mut log = Vec::new();
        let result = parser.evaluate(&mut log, "Open small mailbox").unwrap();
        assert_eq!(result, Evaluation::Matched(Response::Text("ok".into())));
        assert_eq!(log, vec!["Open small mailbox"]);
    }

    #[test]
    fn no_rules_never_match() {
        let parser: RuleParser<Vec<String>> = RuleParser::new();
        assert!(parser.is_empty());
        assert_eq!(parser.evaluate(&mut Vec::new(), "xyzzy").unwrap(), Evaluation::NoMatch);
    }

    #[test]
    fn handler_errors_propagate() {
        let mut parser: RuleParser<()> = RuleParser::new();
        parser.add_rule("explode", |_, _| anyhow::bail!("boom")).unwrap();
        let err = parser.evaluate(&mut (), "explode").unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn vocabulary_collects_route_literals() {
        let mut parser = RuleParser::new();
        log_rule(&mut parser, "take :item", "t");
        log_rule(&mut parser, "turn :item on", "on");
        log_rule(&mut parser, "turn :item off", "off");
        log_rule(&mut parser, Regex::new("^xyzzy$").unwrap(), "x");
        assert_eq!(parser.vocabulary(), vec!["take", "turn", "on", "off"]);
        assert_eq!(parser.len(), 4);
    }

    #[test]
    fn normalize_trims_lowercases_and_drops_fillers() {
        let settings = ParserSettings::default();
        assert_eq!(normalize("  Drop THE   Leaflet ", &settings), "drop leaflet");
        assert_eq!(normalize("take a lamp", &settings), "take lamp");
        let raw = ParserSettings {
            ignored_words: Vec::new(),
            lowercase: false,
        };
        assert_eq!(normalize(" Take The Lamp ", &raw), "Take The Lamp");
    }
}
