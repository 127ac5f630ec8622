//! Rules describing how a single value is laid out on the wire, and the macro
//! for constructing them with less noise.

use crate::value::TextKind;

/// Description of how raw bytes map to a [`Value`](crate::Value).
///
/// Rules form a tree. Cycles are expressed by naming a rule in a
/// [`Schema`](crate::Schema) and referring to it with [`Rule::Reference`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Rule {
    /// Zero-width marker. Encoded as nothing.
    Void,
    /// A single byte.
    UInt8,
    /// A varuint whose value must be exactly representable as an [`f64`].
    UInt,
    /// A varuint with the full 64-bit range.
    UInt64,
    /// Raw bytes.
    ///
    /// Encoded as:
    /// - varuint length
    /// - length bytes of data
    Data,
    /// Text tagged as a string. Encoded like [`Rule::Data`].
    String,
    /// Text tagged as a symbol. Encoded like [`Rule::Data`].
    Symbol,
    /// Text tagged as a keyword. Encoded like [`Rule::Data`].
    Keyword,
    /// A value that may be absent.
    ///
    /// Encoded as:
    /// - byte flag, zero if absent
    /// - if present:
    ///     - inner data
    Optional(Box<Rule>),
    /// Homogenous sequence. May be fixed or variable length.
    ///
    /// Encoded as:
    /// - if `len` is none:
    ///     - varuint count
    /// - repeating count times:
    ///     - element data
    Array {
        /// The rule for each element.
        element: Box<Rule>,
        /// The fixed element count, if any.
        len: Option<u32>,
    },
    /// Key-value pairs.
    ///
    /// Encoded as:
    /// - varuint count
    /// - repeating count times:
    ///     - key data
    ///     - value data
    Map {
        /// The rule for each key.
        key: Box<Rule>,
        /// The rule for each value.
        value: Box<Rule>,
    },
    /// Named fields in a fixed order.
    ///
    /// Encoded as:
    /// - for each field, in order:
    ///     - field data
    Struct(Vec<StructField>),
    /// A rule looked up by name in the schema.
    Reference(String),
}

/// Item in [`Rule::Struct`].
///
/// `kind` is the text kind of the key in decoded values. Fields built from a
/// `(name, rule)` pair or with [`rule!`](crate::rule!) use keywords.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StructField {
    pub name: String,
    pub kind: TextKind,
    pub rule: Rule,
}

impl<S: Into<String>> From<(S, Rule)> for StructField {
    fn from((name, rule): (S, Rule)) -> Self {
        Self {
            name: name.into(),
            kind: TextKind::Keyword,
            rule,
        }
    }
}

impl Rule {
    /// Creates a [`Rule::Optional`].
    #[must_use]
    pub fn optional(inner: Self) -> Self {
        Self::Optional(Box::new(inner))
    }

    /// Creates a variable length [`Rule::Array`].
    #[must_use]
    pub fn array(element: Self) -> Self {
        Self::Array {
            element: Box::new(element),
            len: None,
        }
    }

    /// Creates a fixed length [`Rule::Array`].
    #[must_use]
    pub fn fixed_array(element: Self, len: u32) -> Self {
        Self::Array {
            element: Box::new(element),
            len: Some(len),
        }
    }

    /// Creates a [`Rule::Map`].
    #[must_use]
    pub fn map(key: Self, value: Self) -> Self {
        Self::Map {
            key: Box::new(key),
            value: Box::new(value),
        }
    }

    /// Creates a [`Rule::Struct`] from `(name, rule)` pairs.
    #[must_use]
    pub fn structure<I, F>(fields: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<StructField>,
    {
        Self::Struct(fields.into_iter().map(Into::into).collect())
    }

    /// Creates a [`Rule::Reference`].
    #[must_use]
    pub fn reference(name: impl Into<String>) -> Self {
        Self::Reference(name.into())
    }

    /// A short name for the rule kind, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Void => "void",
            Self::UInt8 => "u8",
            Self::UInt => "uint",
            Self::UInt64 => "uint/u64",
            Self::Data => "data",
            Self::String => "string",
            Self::Symbol => "symbol",
            Self::Keyword => "keyword",
            Self::Optional(_) => "optional",
            Self::Array { .. } => "array",
            Self::Map { .. } => "map",
            Self::Struct(_) => "struct",
            Self::Reference(_) => "reference",
        }
    }
}

/// Syntax sugar for constructing a [`Rule`].
///
/// ```
/// use bare_rule::{Rule, rule};
///
/// let _: Rule = rule!(void);
/// let _: Rule = rule!(u8);
/// let _: Rule = rule!(uint);
/// let _: Rule = rule!(u64);
/// let _: Rule = rule!(data);
/// let _: Rule = rule!(string);
/// let _: Rule = rule!(symbol);
/// let _: Rule = rule!(keyword);
/// let _: Rule = rule!(optional(string));
/// let _: Rule = rule!(array(u8));
/// let _: Rule = rule!(array[4](u8));
/// let _: Rule = rule!(map(string)(uint));
/// let _: Rule = rule!(struct {
///     (a: u8),
///     (b: optional(string)),
/// });
/// let _linked_list = rule!(struct {
///     (value: u8),
///     (next: optional(ref("node"))),
/// });
/// let _: Rule = rule!(%Rule::Data);
/// ```
#[macro_export]
macro_rules! rule {
    (void) => { $crate::Rule::Void };
    (u8) => { $crate::Rule::UInt8 };
    (uint) => { $crate::Rule::UInt };
    (u64) => { $crate::Rule::UInt64 };
    (data) => { $crate::Rule::Data };
    (string) => { $crate::Rule::String };
    (symbol) => { $crate::Rule::Symbol };
    (keyword) => { $crate::Rule::Keyword };
    (optional($($inner:tt)*)) => { $crate::Rule::optional($crate::rule!($($inner)*)) };
    (array[$len:expr]($($inner:tt)*)) => { $crate::Rule::fixed_array($crate::rule!($($inner)*), $len) };
    (array($($inner:tt)*)) => { $crate::Rule::array($crate::rule!($($inner)*)) };
    (map($($key:tt)*)($($value:tt)*)) => { $crate::Rule::map($crate::rule!($($key)*), $crate::rule!($($value)*)) };
    (struct { $(($name:ident: $($field:tt)*)),* $(,)? }) => {
        $crate::Rule::Struct(::std::vec![$(
            $crate::StructField {
                name: ::std::string::String::from(::core::stringify!($name)),
                kind: $crate::TextKind::Keyword,
                rule: $crate::rule!($($field)*),
            },
        )*])
    };
    (ref($name:expr)) => { $crate::Rule::reference($name) };
    (%$rule:expr) => { $rule };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn macro_matches_constructors() {
        let by_macro = rule!(struct {
            (a: u8),
            (b: array[3](map(keyword)(u64))),
            (c: optional(ref("node"))),
        });

        let by_hand = Rule::structure([
            ("a", Rule::UInt8),
            (
                "b",
                Rule::fixed_array(Rule::map(Rule::Keyword, Rule::UInt64), 3),
            ),
            ("c", Rule::optional(Rule::reference("node"))),
        ]);

        assert_eq!(by_macro, by_hand, "macro must build the same rule");
    }

    #[test]
    fn field_order_is_kept() {
        let rule = rule!(struct { (z: u8), (a: u8), (m: u8) });
        let Rule::Struct(fields) = rule else {
            panic!("expected a struct rule");
        };

        let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["z", "a", "m"], "declaration order must be kept");
    }
}
