//! Rules as a host hands them over, before normalization.
//!
//! A host that describes rules with its own data structures, f.e. nested
//! tuples of symbols, converts them into [`RawRule`] first. [`RawRule::parse`]
//! then checks the shape and produces a [`Rule`]:
//!
//! | raw                           | rule                            |
//! |-------------------------------|---------------------------------|
//! | `void`                        | [`Rule::Void`]                  |
//! | `u8`                          | [`Rule::UInt8`]                 |
//! | `uint`                        | [`Rule::UInt`]                  |
//! | `uint/u64`                    | [`Rule::UInt64`]                |
//! | `data`                        | [`Rule::Data`]                  |
//! | `string`, `symbol`, `keyword` | the matching text rule          |
//! | `:name`                       | [`Rule::Reference`]             |
//! | `(optional r)`                | [`Rule::Optional`]              |
//! | `(array r)`                   | variable length [`Rule::Array`] |
//! | `(array n r)`                 | fixed length [`Rule::Array`]    |
//! | `(map k v)`                   | [`Rule::Map`]                   |
//! | `(struct name r ...)`         | [`Rule::Struct`]                |

use crate::error::MalformedRule;
use crate::rule::{Rule, StructField};
use crate::value::TextKind;

/// An unvalidated rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RawRule {
    /// Names a primitive rule or the kind of a tuple rule.
    Symbol(String),
    /// Names a schema entry.
    Keyword(String),
    /// The length of a fixed array.
    Int(i64),
    /// A composite rule, led by its kind.
    Tuple(Vec<RawRule>),
}

impl RawRule {
    /// Creates a [`RawRule::Symbol`].
    pub fn symbol(name: impl Into<String>) -> Self {
        Self::Symbol(name.into())
    }

    /// Creates a [`RawRule::Keyword`].
    pub fn keyword(name: impl Into<String>) -> Self {
        Self::Keyword(name.into())
    }

    /// Creates a [`RawRule::Tuple`].
    pub fn tuple(items: impl IntoIterator<Item = Self>) -> Self {
        Self::Tuple(items.into_iter().collect())
    }

    /// Normalizes this into a [`Rule`].
    ///
    /// # Errors
    ///
    /// Returns `Err` if this or any nested rule is malformed.
    pub fn parse(&self) -> Result<Rule, MalformedRule> {
        match self {
            Self::Symbol(name) => parse_symbol(name),
            Self::Keyword(name) => Ok(Rule::Reference(name.clone())),
            Self::Int(n) => Err(MalformedRule::UnexpectedInteger(*n)),
            Self::Tuple(items) => parse_tuple(items),
        }
    }
}

impl TryFrom<&RawRule> for Rule {
    type Error = MalformedRule;

    fn try_from(value: &RawRule) -> Result<Self, Self::Error> {
        value.parse()
    }
}

fn parse_symbol(name: &str) -> Result<Rule, MalformedRule> {
    Ok(match name {
        "void" => Rule::Void,
        "u8" => Rule::UInt8,
        "uint" => Rule::UInt,
        "uint/u64" => Rule::UInt64,
        "data" => Rule::Data,
        "string" => Rule::String,
        "symbol" => Rule::Symbol,
        "keyword" => Rule::Keyword,
        _ => return Err(MalformedRule::UnknownRule(name.to_owned())),
    })
}

fn parse_tuple(items: &[RawRule]) -> Result<Rule, MalformedRule> {
    let Some((head, args)) = items.split_first() else {
        return Err(MalformedRule::EmptyTuple);
    };

    let RawRule::Symbol(kind) = head else {
        return Err(MalformedRule::InvalidHead);
    };

    match (kind.as_str(), args) {
        ("struct", args) => {
            let (pairs, rest) = args.as_chunks::<2>();
            if !rest.is_empty() {
                return Err(MalformedRule::OddStructFields);
            }

            let fields = pairs
                .iter()
                .map(|[name, rule]| -> Result<StructField, MalformedRule> {
                    let (name, kind) = match name {
                        RawRule::Symbol(n) => (n.clone(), TextKind::Symbol),
                        RawRule::Keyword(n) => (n.clone(), TextKind::Keyword),
                        _ => return Err(MalformedRule::InvalidFieldName),
                    };

                    Ok(StructField {
                        name,
                        kind,
                        rule: rule.parse()?,
                    })
                })
                .collect::<Result<_, _>>()?;

            Ok(Rule::Struct(fields))
        }
        ("map", [key, value]) => Ok(Rule::map(key.parse()?, value.parse()?)),
        ("map", _) => Err(arity("map", "3", items)),
        ("optional", [inner]) => Ok(Rule::optional(inner.parse()?)),
        ("optional", _) => Err(arity("optional", "2", items)),
        ("array", [element]) => Ok(Rule::array(element.parse()?)),
        ("array", [len, element]) => {
            let &RawRule::Int(len) = len else {
                return Err(MalformedRule::ExpectedArrayLength);
            };

            let len = u32::try_from(len).map_err(|_| MalformedRule::InvalidArrayLength(len))?;
            Ok(Rule::fixed_array(element.parse()?, len))
        }
        ("array", _) => Err(arity("array", "2 or 3", items)),
        (kind, _) => Err(MalformedRule::UnknownRule(kind.to_owned())),
    }
}

fn arity(kind: &'static str, expected: &'static str, items: &[RawRule]) -> MalformedRule {
    MalformedRule::Arity {
        kind,
        expected,
        found: items.len(),
    }
}

impl From<&Rule> for RawRule {
    fn from(value: &Rule) -> Self {
        let sym = |s: &str| Self::Symbol(s.to_owned());
        match value {
            Rule::Void => sym("void"),
            Rule::UInt8 => sym("u8"),
            Rule::UInt => sym("uint"),
            Rule::UInt64 => sym("uint/u64"),
            Rule::Data => sym("data"),
            Rule::String => sym("string"),
            Rule::Symbol => sym("symbol"),
            Rule::Keyword => sym("keyword"),
            Rule::Optional(inner) => Self::Tuple(vec![sym("optional"), Self::from(&**inner)]),
            Rule::Array { element, len } => {
                let mut items = vec![sym("array")];
                if let Some(len) = len {
                    items.push(Self::Int(i64::from(*len)));
                }
                items.push(Self::from(&**element));
                Self::Tuple(items)
            }
            Rule::Map { key, value } => {
                Self::Tuple(vec![sym("map"), Self::from(&**key), Self::from(&**value)])
            }
            Rule::Struct(fields) => {
                let mut items = Vec::with_capacity(1 + fields.len() * 2);
                items.push(sym("struct"));
                for field in fields {
                    // raw rules have no string form, keep those as keywords
                    items.push(match field.kind {
                        TextKind::Symbol => Self::Symbol(field.name.clone()),
                        TextKind::String | TextKind::Keyword => Self::Keyword(field.name.clone()),
                    });
                    items.push(Self::from(&field.rule));
                }
                Self::Tuple(items)
            }
            Rule::Reference(name) => Self::Keyword(name.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule;

    fn sym(s: &str) -> RawRule {
        RawRule::symbol(s)
    }

    fn kw(s: &str) -> RawRule {
        RawRule::keyword(s)
    }

    #[test]
    fn parse_nested() {
        let raw = RawRule::tuple([
            sym("struct"),
            kw("value"),
            sym("u8"),
            kw("tags"),
            RawRule::tuple([sym("array"), RawRule::Int(2), sym("keyword")]),
            kw("next"),
            RawRule::tuple([sym("optional"), kw("node")]),
        ]);

        let expected = rule!(struct {
            (value: u8),
            (tags: array[2](keyword)),
            (next: optional(ref("node"))),
        });

        assert_eq!(raw.parse(), Ok(expected.clone()), "parsed rule mismatch");
        assert_eq!(RawRule::from(&expected), raw, "raw conversion mismatch");
    }

    #[test]
    fn field_name_kind_is_kept() {
        let raw = RawRule::tuple([sym("struct"), sym("a"), sym("u8"), kw("b"), sym("u8")]);
        let rule = raw.parse().expect("must parse");

        let Rule::Struct(fields) = &rule else {
            panic!("expected a struct rule");
        };

        let kinds: Vec<TextKind> = fields.iter().map(|f| f.kind).collect();
        assert_eq!(kinds, [TextKind::Symbol, TextKind::Keyword], "kinds must follow the names");
        assert_eq!(RawRule::from(&rule), raw, "raw conversion must keep name kinds");
    }

    #[test]
    fn parse_primitives() {
        let cases = [
            ("void", Rule::Void),
            ("u8", Rule::UInt8),
            ("uint", Rule::UInt),
            ("uint/u64", Rule::UInt64),
            ("data", Rule::Data),
            ("string", Rule::String),
            ("symbol", Rule::Symbol),
            ("keyword", Rule::Keyword),
        ];

        for (name, rule) in cases {
            assert_eq!(sym(name).parse(), Ok(rule), "mismatch for `{name}`");
        }
    }

    #[test]
    fn reject_empty_tuple() {
        let res = RawRule::tuple([]).parse();
        assert_eq!(res, Err(MalformedRule::EmptyTuple), "must reject empty tuple");
    }

    #[test]
    fn reject_odd_struct() {
        let raw = RawRule::tuple([sym("struct"), kw("a"), sym("u8"), kw("b")]);
        assert_eq!(
            raw.parse(),
            Err(MalformedRule::OddStructFields),
            "must reject a name without rule"
        );
    }

    #[test]
    fn reject_bad_field_name() {
        let raw = RawRule::tuple([sym("struct"), RawRule::Int(1), sym("u8")]);
        assert_eq!(
            raw.parse(),
            Err(MalformedRule::InvalidFieldName),
            "must reject integer field names"
        );
    }

    #[test]
    fn reject_wrong_arity() {
        let map = RawRule::tuple([sym("map"), sym("string")]);
        assert!(
            matches!(map.parse(), Err(MalformedRule::Arity { kind: "map", found: 2, .. })),
            "map must need 3 items"
        );

        let opt = RawRule::tuple([sym("optional"), sym("u8"), sym("u8")]);
        assert!(
            matches!(opt.parse(), Err(MalformedRule::Arity { kind: "optional", found: 3, .. })),
            "optional must need 2 items"
        );

        let arr = RawRule::tuple([sym("array")]);
        assert!(
            matches!(arr.parse(), Err(MalformedRule::Arity { kind: "array", found: 1, .. })),
            "array must need 2 or 3 items"
        );
    }

    #[test]
    fn reject_bad_array_length() {
        let negative = RawRule::tuple([sym("array"), RawRule::Int(-1), sym("u8")]);
        assert_eq!(
            negative.parse(),
            Err(MalformedRule::InvalidArrayLength(-1)),
            "must reject negative length"
        );

        let not_int = RawRule::tuple([sym("array"), sym("u8"), sym("u8")]);
        assert_eq!(
            not_int.parse(),
            Err(MalformedRule::ExpectedArrayLength),
            "must reject non-integer length"
        );
    }

    #[test]
    fn reject_unknown() {
        assert_eq!(
            sym("f32").parse(),
            Err(MalformedRule::UnknownRule("f32".to_owned())),
            "must reject unknown symbol"
        );
        assert_eq!(
            RawRule::tuple([sym("enum"), sym("u8")]).parse(),
            Err(MalformedRule::UnknownRule("enum".to_owned())),
            "must reject unknown tuple kind"
        );
        assert_eq!(
            RawRule::tuple([kw("struct")]).parse(),
            Err(MalformedRule::InvalidHead),
            "must reject keyword head"
        );
        assert_eq!(
            RawRule::Int(3).parse(),
            Err(MalformedRule::UnexpectedInteger(3)),
            "must reject stray integer"
        );
    }
}
