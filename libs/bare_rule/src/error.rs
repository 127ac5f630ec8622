//! Errors shared between decoding and encoding.
//!
//! Each direction has its own error type, [`de::Error`] and [`ser::Error`].
//! The types here describe problems with the rules themselves and convert
//! into either.
//!
//! [`de::Error`]: crate::de::Error
//! [`ser::Error`]: crate::ser::Error

/// A raw rule does not describe a valid [`Rule`](crate::Rule).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum MalformedRule {
    /// A tuple rule had no items at all.
    #[error("tuple rule must not be empty")]
    EmptyTuple,
    /// The first item of a tuple rule wasn't a symbol.
    #[error("tuple rule must start with a symbol")]
    InvalidHead,
    /// A struct rule had a name without a matching rule.
    #[error("struct rule must have an even number of items")]
    OddStructFields,
    /// A struct field name was neither a symbol nor a keyword.
    #[error("struct field name must be a symbol or keyword")]
    InvalidFieldName,
    /// A tuple rule had the wrong amount of items.
    #[error("{kind} rule must have {expected} items, but has {found}")]
    Arity {
        /// The rule kind, i.e. the tuple's head.
        kind: &'static str,
        /// Description of the valid item counts.
        expected: &'static str,
        /// The actual item count, including the head.
        found: usize,
    },
    /// A fixed array length wasn't an integer.
    #[error("expected an integer for array length")]
    ExpectedArrayLength,
    /// A fixed array length was negative or too large.
    #[error("array length {0} is out of range")]
    InvalidArrayLength(i64),
    /// An integer appeared where a rule was expected.
    #[error("integer {0} is not a rule")]
    UnexpectedInteger(i64),
    /// The symbol does not name a known rule.
    #[error("unknown rule `{0}`")]
    UnknownRule(String),
}

/// A schema entry couldn't be normalized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid schema entry `{name}`: {source}")]
pub struct SchemaError {
    /// The name of the offending entry.
    pub name: String,
    /// The reason the entry is invalid.
    #[source]
    pub source: MalformedRule,
}

/// A schema reference couldn't be resolved.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ResolveError {
    /// The schema has no rule with this name.
    #[error("unknown schema reference `{0}`")]
    UnknownReference(String),
    /// Following references took more hops than allowed.
    #[error("reference chain exceeds the recursion limit of {0}")]
    TooDeep(usize),
}
