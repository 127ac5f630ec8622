//! Dynamic representation of decoded data, also used as encoder input.

use std::fmt;

/// The kind of a textual value.
///
/// All kinds share the same wire layout, the kind only records which rule
/// produced the value or which rule may encode it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextKind {
    String,
    Symbol,
    Keyword,
}

/// A decoded value, or a value to encode.
///
/// Equality treats maps as unordered collections of pairs, so two maps with
/// the same pairs in a different order are equal.
#[derive(Debug, Clone)]
pub enum Value {
    /// An absent value. Decoded from an empty [`Rule::Optional`].
    ///
    /// [`Rule::Optional`]: crate::Rule::Optional
    Nil,
    /// The zero-width marker decoded from [`Rule::Void`](crate::Rule::Void).
    Void,
    /// An unsigned integer, no matter which integer rule produced it.
    UInt(u64),
    /// A host number. The encoder accepts it for integer rules if it is an
    /// integer in range, but the decoder never produces it.
    Number(f64),
    /// Raw bytes.
    Bytes(Vec<u8>),
    /// Text bytes tagged with their kind. The bytes are usually, but not
    /// necessarily, UTF-8.
    Text(TextKind, Vec<u8>),
    /// Ordered elements.
    Seq(Vec<Value>),
    /// Key-value pairs, also used for struct fields.
    Map(Vec<(Value, Value)>),
}

impl Value {
    /// Creates a [`TextKind::String`] text value.
    pub fn string(s: impl Into<Vec<u8>>) -> Self {
        Self::Text(TextKind::String, s.into())
    }

    /// Creates a [`TextKind::Symbol`] text value.
    pub fn symbol(s: impl Into<Vec<u8>>) -> Self {
        Self::Text(TextKind::Symbol, s.into())
    }

    /// Creates a [`TextKind::Keyword`] text value.
    pub fn keyword(s: impl Into<Vec<u8>>) -> Self {
        Self::Text(TextKind::Keyword, s.into())
    }

    /// Creates a map from `(key, value)` pairs.
    pub fn map<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Self>,
        V: Into<Self>,
    {
        Self::Map(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Creates a struct-shaped map with keyword keys.
    pub fn fields<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Vec<u8>>,
        V: Into<Self>,
    {
        Self::Map(
            fields
                .into_iter()
                .map(|(k, v)| (Self::keyword(k), v.into()))
                .collect(),
        )
    }

    /// Whether this is [`Value::Nil`].
    pub fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    /// Gets the integer, if this is a [`Value::UInt`].
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::UInt(n) => Some(*n),
            _ => None,
        }
    }

    /// Gets the bytes of a [`Value::Bytes`] or [`Value::Text`].
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) | Self::Text(_, b) => Some(b),
            _ => None,
        }
    }

    /// Gets the text as a [`str`], if this is UTF-8 text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(_, b) => std::str::from_utf8(b).ok(),
            _ => None,
        }
    }

    /// Gets the elements of a [`Value::Seq`].
    pub fn as_seq(&self) -> Option<&[Self]> {
        match self {
            Self::Seq(s) => Some(s),
            _ => None,
        }
    }

    /// Gets the pairs of a [`Value::Map`].
    pub fn as_map(&self) -> Option<&[(Self, Self)]> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Looks up a struct field by name.
    ///
    /// Matches the first text key with the same bytes, regardless of its
    /// [`TextKind`].
    pub fn field(&self, name: &str) -> Option<&Self> {
        let pairs = self.as_map()?;
        pairs
            .iter()
            .find(|(k, _)| matches!(k, Self::Text(_, b) if b == name.as_bytes()))
            .map(|(_, v)| v)
    }

    /// A short name for the value's variant, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Nil => "nil",
            Self::Void => "void",
            Self::UInt(_) => "uint",
            Self::Number(_) => "number",
            Self::Bytes(_) => "bytes",
            Self::Text(TextKind::String, _) => "string",
            Self::Text(TextKind::Symbol, _) => "symbol",
            Self::Text(TextKind::Keyword, _) => "keyword",
            Self::Seq(_) => "seq",
            Self::Map(_) => "map",
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Nil, Self::Nil) | (Self::Void, Self::Void) => true,
            (Self::UInt(a), Self::UInt(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::Bytes(a), Self::Bytes(b)) => a == b,
            (Self::Text(ka, a), Self::Text(kb, b)) => ka == kb && a == b,
            (Self::Seq(a), Self::Seq(b)) => a == b,
            (Self::Map(a), Self::Map(b)) => pairs_eq_unordered(a, b),
            _ => false,
        }
    }
}

/// Whether `value` survives a round trip through [`f64`] unchanged.
///
/// This is the precision check of [`Rule::UInt`](crate::Rule::UInt). It is
/// not a plain upper bound: `2^60` passes, while `2^53 + 1` does not.
pub fn is_exact_f64(value: u64) -> bool {
    if value == 0 {
        return true;
    }

    let significant = u64::BITS - value.leading_zeros() - value.trailing_zeros();
    significant <= f64::MANTISSA_DIGITS
}

/// Compares two pair lists as multisets.
fn pairs_eq_unordered(a: &[(Value, Value)], b: &[(Value, Value)]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut used = vec![false; b.len()];
    a.iter().all(|pair| {
        let found = b
            .iter()
            .zip(used.iter_mut())
            .find(|(other, used)| !**used && pair == *other);

        match found {
            Some((_, used)) => {
                *used = true;
                true
            }
            None => false,
        }
    })
}

impl From<u8> for Value {
    fn from(value: u8) -> Self {
        Self::UInt(value.into())
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Self::UInt(value.into())
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Self::UInt(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::string(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::string(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Self::Seq(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Nil, Into::into)
    }
}

impl fmt::Display for TextKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::String => "string",
            Self::Symbol => "symbol",
            Self::Keyword => "keyword",
        })
    }
}
