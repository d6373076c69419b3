//! Named path-parameter patterns for route declarations.
//!
//! A pattern reference is either a registered name (`num`, `slug`, ...) or a raw regular
//! expression. Matching is always anchored to the whole segment.

use anyhow::{Context, Result};
use regex::Regex;
use std::collections::BTreeMap;

const BUILTIN: [(&str, &str); 13] = [
    ("num", "[0-9]+"),
    ("alnum", "[A-Za-z0-9]+"),
    ("alpha", "[A-Za-z]+"),
    ("any", "[^/]+"),
    ("slug", "[a-z0-9]+(?:-[a-z0-9]+)*"),
    (
        "date",
        "[0-9]{4}-(?:0[1-9]|1[0-2])-(?:0[1-9]|[12][0-9]|3[01])",
    ),
    ("year", "[0-9]{4}"),
    ("month", "(?:0[1-9]|1[0-2])"),
    ("day", "(?:0[1-9]|[12][0-9]|3[01])"),
    ("bool", "(?:true|false|1|0|yes|no)"),
    ("hexcolor", "#?(?:[0-9a-fA-F]{3}){1,2}"),
    ("all", ".*"),
    ("path", ".*"),
];

#[derive(Debug, Clone)]
pub struct RoutePatterns {
    compiled: BTreeMap<String, Regex>,
}

impl RoutePatterns {
    pub fn builtin() -> Result<Self> {
        let mut patterns = Self {
            compiled: BTreeMap::new(),
        };
        for (name, pattern) in BUILTIN {
            patterns.add_pattern(name, pattern)?;
        }
        Ok(patterns)
    }

    /// Register (or replace) a named pattern.
    pub fn add_pattern(&mut self, name: &str, pattern: &str) -> Result<()> {
        let regex = anchored(pattern)
            .with_context(|| format!("Invalid route pattern '{}': {}", name, pattern))?;
        self.compiled.insert(name.to_string(), regex);
        Ok(())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.compiled.keys().map(String::as_str)
    }

    /// Whether `value` matches the named pattern, or `pattern` itself as a regex when no
    /// pattern of that name exists. An unparsable raw regex never matches.
    pub fn matches(&self, pattern: &str, value: &str) -> bool {
        match self.compiled.get(pattern) {
            Some(regex) => regex.is_match(value),
            None => anchored(pattern).map_or(false, |regex| regex.is_match(value)),
        }
    }
}

fn anchored(pattern: &str) -> Result<Regex> {
    Ok(Regex::new(&format!("^(?:{})$", pattern))?)
}
