//! Named rule tables.

use std::collections::HashMap;

use crate::error::{ResolveError, SchemaError};
use crate::raw::RawRule;
use crate::rule::Rule;

/// A table of named rules, used to resolve [`Rule::Reference`].
///
/// The schema is only read during a call, so it can be shared freely between
/// threads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    rules: HashMap<String, Rule>,
}

impl Schema {
    /// Creates an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalizes named raw rules into a schema.
    ///
    /// # Errors
    ///
    /// Returns `Err` naming the first entry that is malformed.
    pub fn from_raw<I, S>(entries: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = (S, RawRule)>,
        S: Into<String>,
    {
        entries
            .into_iter()
            .map(|(name, raw)| {
                let name = name.into();
                match raw.parse() {
                    Ok(rule) => Ok((name, rule)),
                    Err(source) => Err(SchemaError { name, source }),
                }
            })
            .collect()
    }

    /// Adds or replaces a named rule, returning the previous one.
    pub fn insert(&mut self, name: impl Into<String>, rule: Rule) -> Option<Rule> {
        self.rules.insert(name.into(), rule)
    }

    /// Adds or replaces a named rule.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, rule: Rule) -> Self {
        self.insert(name, rule);
        self
    }

    /// Gets a named rule.
    pub fn get(&self, name: &str) -> Option<&Rule> {
        self.rules.get(name)
    }

    /// Gets the amount of named rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether there are no named rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Iterates over the named rules in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Rule)> {
        self.rules.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Looks up the target of a single reference.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the name is not in the schema.
    pub fn lookup(&self, name: &str) -> Result<&Rule, ResolveError> {
        log::trace!("Following reference `{name}`.");
        self.get(name)
            .ok_or_else(|| ResolveError::UnknownReference(name.to_owned()))
    }

    /// Follows references from `rule` until reaching a rule that isn't one.
    ///
    /// At most `limit` references are followed, so reference cycles fail
    /// instead of looping.
    ///
    /// # Errors
    ///
    /// Returns `Err` if a name is not in the schema or the limit is exceeded.
    pub fn resolve<'a>(&'a self, mut rule: &'a Rule, limit: usize) -> Result<&'a Rule, ResolveError> {
        let mut hops = 0usize;
        while let Rule::Reference(name) = rule {
            if hops >= limit {
                return Err(ResolveError::TooDeep(limit));
            }

            rule = self.lookup(name)?;
            hops += 1;
        }

        Ok(rule)
    }
}

impl<S: Into<String>> FromIterator<(S, Rule)> for Schema {
    fn from_iter<T: IntoIterator<Item = (S, Rule)>>(iter: T) -> Self {
        Self {
            rules: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl<S: Into<String>> Extend<(S, Rule)> for Schema {
    fn extend<T: IntoIterator<Item = (S, Rule)>>(&mut self, iter: T) {
        self.rules
            .extend(iter.into_iter().map(|(k, v)| (k.into(), v)));
    }
}
