use std::io;

use crate::error::{MalformedRule, ResolveError};

/// Potential errors to encounter when encoding values.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The error originated from the [`io::Write`] implementation.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// The value's shape doesn't fit the rule.
    #[error("expected {expected} value, got {found}")]
    TypeMismatch {
        /// The rule kind.
        expected: &'static str,
        /// The value kind.
        found: &'static str,
    },
    /// An integer is too large for the rule.
    #[error("integer {value} is out of range for {rule}")]
    OutOfRange { value: u64, rule: &'static str },
    /// A [`Rule::UInt`](crate::Rule::UInt) value isn't exactly representable
    /// as an [`f64`].
    #[error("integer {value} is not exactly representable as a number")]
    PrecisionLoss { value: u64 },
    /// A fixed array got the wrong number of elements.
    #[error("fixed array needs {expected} elements, got {actual}")]
    ArrayLengthMismatch { expected: u32, actual: usize },
    /// A length or count exceeds the limit.
    #[error("length {len} is too large")]
    MessageTooLarge { len: usize },
    /// A struct field without an optional rule is absent from the value.
    #[error("struct field `{field}` is missing")]
    MissingField { field: String },
    /// The schema has no rule with this name.
    #[error("unknown schema reference `{0}`")]
    UnknownReference(String),
    /// A raw rule was malformed.
    #[error(transparent)]
    MalformedRule(#[from] MalformedRule),
    /// Rules nested deeper than [`Config::max_depth`](crate::Config::max_depth).
    #[error("recursion limit of {limit} exceeded")]
    RecursionLimitExceeded { limit: usize },
}

impl From<ResolveError> for Error {
    fn from(value: ResolveError) -> Self {
        match value {
            ResolveError::UnknownReference(name) => Self::UnknownReference(name),
            ResolveError::TooDeep(limit) => Self::RecursionLimitExceeded { limit },
        }
    }
}
