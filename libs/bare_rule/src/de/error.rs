use crate::error::{MalformedRule, ResolveError};

/// Potential errors to encounter when decoding binary data.
///
/// Offsets point at the start of the read that failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The buffer ended before a required byte or region.
    #[error("unexpected end of buffer at offset {offset}")]
    Truncated { offset: usize },
    /// A varuint was longer than 10 bytes or didn't fit into 64 bits.
    #[error("variable-length integer at offset {offset} exceeds 64 bits")]
    VaruintOverflow { offset: usize },
    /// A length or count prefix exceeded the limit.
    #[error("length {len} at offset {offset} is too large")]
    MessageTooLarge { len: u64, offset: usize },
    /// A [`Rule::UInt`](crate::Rule::UInt) value isn't exactly representable
    /// as an [`f64`].
    #[error("integer {value} at offset {offset} is not exactly representable as a number")]
    PrecisionLoss { value: u64, offset: usize },
    /// An optional flag was neither 0 nor 1 while
    /// [`Config::strict_optional`](crate::Config::strict_optional) is set.
    #[error("invalid optional flag {flag} at offset {offset}")]
    InvalidOptionFlag { flag: u8, offset: usize },
    /// Bytes remained after the expected end of the data.
    #[error("trailing bytes past offset {offset}")]
    TrailingBytes { offset: usize },
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
