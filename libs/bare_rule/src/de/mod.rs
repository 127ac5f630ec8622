//! Exposes a decoder and decoding helper functions.

use crate::config::Config;
use crate::raw::RawRule;
use crate::rule::Rule;
use crate::schema::Schema;
use crate::value::{TextKind, Value, is_exact_f64};

mod error;
mod read;

pub use error::Error;
use read::SliceRead;

/// Upper bound for preallocated elements. Counts come from the input and
/// incorrect data could otherwise lead to a DoS.
const PREALLOC_LIMIT: usize = 0x1000;

/// Decodes one value described by `rule` from the start of `buf`.
///
/// Bytes after the value are ignored. Use [`Decoder::end`] to reject them.
///
/// # Errors
///
/// Returns `Err` if the data doesn't match the rule. The error names the
/// offset at which reading failed.
pub fn decode(schema: &Schema, rule: &Rule, buf: &[u8]) -> Result<Value, Error> {
    decode_with(schema, rule, buf, Config::default())
}

/// Decodes one value, like [`decode`], with explicit limits.
///
/// # Errors
///
/// Returns `Err` if the data doesn't match the rule or exceeds a limit.
pub fn decode_with(
    schema: &Schema,
    rule: &Rule,
    buf: &[u8],
    config: Config,
) -> Result<Value, Error> {
    Decoder::with_config(schema, buf, config).decode(rule)
}

/// Normalizes a raw rule and decodes one value with it.
///
/// # Errors
///
/// Returns [`Error::MalformedRule`] if the rule is malformed, otherwise the
/// same errors as [`decode`].
pub fn decode_raw(schema: &Schema, rule: &RawRule, buf: &[u8]) -> Result<Value, Error> {
    let rule = rule.parse()?;
    decode(schema, &rule, buf)
}

/// Decodes values from a byte slice.
///
/// Multiple values can be read in sequence from the same decoder.
///
/// # Examples
///
/// ```
/// use bare_rule::{Decoder, Schema, Value, rule};
///
/// let schema = Schema::new();
/// let mut de = Decoder::new(&schema, &[1, 2, 0xFF]);
/// assert_eq!(de.decode(&rule!(u8)).unwrap(), Value::UInt(1));
/// assert_eq!(de.decode(&rule!(u8)).unwrap(), Value::UInt(2));
/// assert_eq!(de.remainder(), &[0xFF]);
/// assert!(de.end().is_err());
/// ```
#[derive(Debug, Clone)]
pub struct Decoder<'s, 'de> {
    schema: &'s Schema,
    config: Config,
    reader: SliceRead<'de>,
    budget: u64,
}

impl<'s, 'de> Decoder<'s, 'de> {
    /// Creates a decoder with the default [`Config`].
    pub fn new(schema: &'s Schema, buf: &'de [u8]) -> Self {
        Self::with_config(schema, buf, Config::default())
    }

    /// Creates a decoder with the given [`Config`].
    pub fn with_config(schema: &'s Schema, buf: &'de [u8], config: Config) -> Self {
        Self {
            schema,
            config,
            reader: SliceRead::new(buf),
            budget: config.max_elements,
        }
    }

    /// Gets the amount of bytes consumed so far.
    pub fn position(&self) -> usize {
        self.reader.offset()
    }

    /// Gets the unread rest of the input.
    pub fn remainder(&self) -> &'de [u8] {
        self.reader.remainder()
    }

    /// Ensures the whole input was consumed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TrailingBytes`] if there is unread input.
    pub fn end(&self) -> Result<(), Error> {
        if self.remainder().is_empty() {
            Ok(())
        } else {
            Err(Error::TrailingBytes {
                offset: self.position(),
            })
        }
    }

    /// Decodes the next value.
    ///
    /// Each call gets the full [`Config::max_elements`] budget. On error, the
    /// decoder may have consumed part of the value.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the data doesn't match the rule or exceeds a limit.
    pub fn decode(&mut self, rule: &Rule) -> Result<Value, Error> {
        self.budget = self.config.max_elements;
        self.decode_rule(rule, 0)
            .inspect_err(|why| log::debug!("Failed to decode {} value: {why}", rule.kind_name()))
    }

    fn decode_rule(&mut self, rule: &Rule, depth: usize) -> Result<Value, Error> {
        if depth >= self.config.max_depth {
            return Err(Error::RecursionLimitExceeded {
                limit: self.config.max_depth,
            });
        }

        let depth = depth + 1;
        match rule {
            Rule::Void => Ok(Value::Void),
            Rule::UInt8 => {
                let [b] = self.reader.read_bytes()?;
                Ok(Value::UInt(b.into()))
            }
            Rule::UInt => {
                let offset = self.reader.offset();
                let value = self.reader.read_varuint()?;
                if !is_exact_f64(value) {
                    return Err(Error::PrecisionLoss { value, offset });
                }

                Ok(Value::UInt(value))
            }
            Rule::UInt64 => self.reader.read_varuint().map(Value::UInt),
            Rule::Data => self.read_data().map(Value::Bytes),
            Rule::String => self.read_text(TextKind::String),
            Rule::Symbol => self.read_text(TextKind::Symbol),
            Rule::Keyword => self.read_text(TextKind::Keyword),
            Rule::Optional(inner) => {
                let offset = self.reader.offset();
                let [flag] = self.reader.read_bytes()?;
                match flag {
                    0 => Ok(Value::Nil),
                    1 => self.decode_rule(inner, depth),
                    _ if self.config.strict_optional => {
                        Err(Error::InvalidOptionFlag { flag, offset })
                    }
                    _ => self.decode_rule(inner, depth),
                }
            }
            Rule::Array { element, len } => {
                let len = match *len {
                    Some(len) => {
                        let offset = self.reader.offset();
                        self.reserve(len.into(), offset)?;
                        usize::try_from(len).map_err(|_| Error::MessageTooLarge {
                            len: len.into(),
                            offset,
                        })?
                    }
                    None => self.read_count()?,
                };

                let mut items = Vec::with_capacity(len.min(PREALLOC_LIMIT));
                for _ in 0..len {
                    items.push(self.decode_rule(element, depth)?);
                }

                Ok(Value::Seq(items))
            }
            Rule::Map { key, value } => {
                let len = self.read_count()?;
                let mut pairs = Vec::with_capacity(len.min(PREALLOC_LIMIT));
                for _ in 0..len {
                    let k = self.decode_rule(key, depth)?;
                    let v = self.decode_rule(value, depth)?;
                    pairs.push((k, v));
                }

                Ok(Value::Map(pairs))
            }
            Rule::Struct(fields) => {
                let mut pairs = Vec::with_capacity(fields.len());
                for field in fields {
                    let v = self.decode_rule(&field.rule, depth)?;
                    pairs.push((Value::Text(field.kind, field.name.clone().into_bytes()), v));
                }

                Ok(Value::Map(pairs))
            }
            Rule::Reference(name) => {
                let schema = self.schema;
                let target = schema.lookup(name)?;
                self.decode_rule(target, depth)
            }
        }
    }

    /// Reads a length or count prefix.
    fn read_len(&mut self) -> Result<usize, Error> {
        let offset = self.reader.offset();
        let len = self.reader.read_varuint()?;
        if len > self.config.len_limit() {
            return Err(Error::MessageTooLarge { len, offset });
        }

        usize::try_from(len).map_err(|_| Error::MessageTooLarge { len, offset })
    }

    /// Reads an element count prefix and reserves it from the budget.
    fn read_count(&mut self) -> Result<usize, Error> {
        let offset = self.reader.offset();
        let len = self.read_len()?;
        let count = u64::try_from(len).map_err(|_| Error::MessageTooLarge {
            len: u64::MAX,
            offset,
        })?;

        self.reserve(count, offset)?;
        Ok(len)
    }

    /// Takes `count` elements from the per-call element budget.
    fn reserve(&mut self, count: u64, offset: usize) -> Result<(), Error> {
        match self.budget.checked_sub(count) {
            Some(rest) => {
                self.budget = rest;
                Ok(())
            }
            None => Err(Error::MessageTooLarge { len: count, offset }),
        }
    }

    fn read_data(&mut self) -> Result<Vec<u8>, Error> {
        let len = self.read_len()?;
        self.reader.read_byte_vec(len)
    }

    fn read_text(&mut self, kind: TextKind) -> Result<Value, Error> {
        self.read_data().map(|b| Value::Text(kind, b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule;

    #[test]
    fn truncated_data_keeps_position() {
        let schema = Schema::new();
        let buf = [10, b'a', b'b', b'c'];
        let mut de = Decoder::new(&schema, &buf);

        let err = de.decode(&rule!(data)).expect_err("must fail");
        assert_eq!(err, Error::Truncated { offset: 1 }, "must point after the length");
        assert_eq!(de.position(), 1, "must not consume the partial region");
        assert_eq!(de.remainder(), b"abc", "region must stay unread");
    }

    #[test]
    fn optional_flags() {
        let schema = Schema::new();
        let rule = rule!(optional(u8));

        assert_eq!(decode(&schema, &rule, &[0]), Ok(Value::Nil), "0 is absent");
        assert_eq!(decode(&schema, &rule, &[1, 7]), Ok(Value::UInt(7)), "1 is present");
        assert_eq!(
            decode(&schema, &rule, &[2, 7]),
            Ok(Value::UInt(7)),
            "other flags are present by default"
        );

        let strict = Config::default().with_strict_optional(true);
        assert_eq!(
            decode_with(&schema, &rule, &[2, 7], strict),
            Err(Error::InvalidOptionFlag { flag: 2, offset: 0 }),
            "strict mode must reject other flags"
        );
    }

    #[test]
    fn length_limit() {
        let schema = Schema::new();
        let buf = [0x80, 0x80, 0x80, 0x80, 0x08];
        assert_eq!(
            decode(&schema, &rule!(string), &buf),
            Err(Error::MessageTooLarge {
                len: 0x8000_0000,
                offset: 0
            }),
            "must reject lengths above 2^31 - 1"
        );

        let config = Config::default().with_max_len(2);
        assert_eq!(
            decode_with(&schema, &rule!(array(u8)), &[3, 1, 2, 3], config),
            Err(Error::MessageTooLarge { len: 3, offset: 0 }),
            "must respect the configured limit"
        );
    }

    #[test]
    fn precision() {
        let schema = Schema::new();
        let buf = varuint_bytes((1 << 53) + 1);
        assert_eq!(
            decode(&schema, &rule!(uint), &buf),
            Err(Error::PrecisionLoss {
                value: (1 << 53) + 1,
                offset: 0
            }),
            "uint must reject inexact values"
        );
        assert_eq!(
            decode(&schema, &rule!(u64), &buf),
            Ok(Value::UInt((1 << 53) + 1)),
            "u64 must accept any value"
        );
        assert_eq!(
            decode(&schema, &rule!(uint), &varuint_bytes(1 << 60)),
            Ok(Value::UInt(1 << 60)),
            "uint must accept exact values"
        );
    }

    #[test]
    fn varuint_overflow() {
        let schema = Schema::new();
        let buf = [0xFF; 11];
        assert_eq!(
            decode(&schema, &rule!(u64), &buf),
            Err(Error::VaruintOverflow { offset: 0 }),
            "must reject 11 byte varuints"
        );
    }

    #[test]
    fn raw_rule() {
        let schema = Schema::new();
        let raw = RawRule::tuple([RawRule::symbol("array"), RawRule::Int(2), RawRule::symbol("u8")]);
        assert_eq!(
            decode_raw(&schema, &raw, &[4, 5]),
            Ok(Value::Seq(vec![Value::UInt(4), Value::UInt(5)])),
            "must decode with the parsed rule"
        );

        let bad = RawRule::tuple([]);
        assert!(
            matches!(decode_raw(&schema, &bad, &[]), Err(Error::MalformedRule(_))),
            "must report malformed rules"
        );
    }

    #[test]
    fn zero_depth() {
        let schema = Schema::new();
        let config = Config::default().with_max_depth(0);
        assert_eq!(
            decode_with(&schema, &rule!(void), &[], config),
            Err(Error::RecursionLimitExceeded { limit: 0 }),
            "no rule fits into zero depth"
        );
    }

    #[test]
    fn truncated_primitives() {
        let schema = Schema::new();
        assert_eq!(
            decode(&schema, &rule!(u8), &[]),
            Err(Error::Truncated { offset: 0 }),
            "u8 needs a byte"
        );
        assert_eq!(
            decode(&schema, &rule!(optional(u8)), &[]),
            Err(Error::Truncated { offset: 0 }),
            "optional needs a flag byte"
        );
        assert_eq!(
            decode(&schema, &rule!(optional(u8)), &[1]),
            Err(Error::Truncated { offset: 1 }),
            "present optional needs its value"
        );

        let rule = rule!(struct {
            (a: u8),
            (b: uint),
        });
        assert_eq!(
            decode(&schema, &rule, &[5, 0x80]),
            Err(Error::Truncated { offset: 1 }),
            "truncated varuint must report where it started"
        );
    }

    #[test]
    fn map_count_limit() {
        let schema = Schema::new();
        let buf = [0x80, 0x80, 0x80, 0x80, 0x08];
        assert_eq!(
            decode(&schema, &rule!(map(u8)(u8)), &buf),
            Err(Error::MessageTooLarge {
                len: 0x8000_0000,
                offset: 0
            }),
            "map counts share the length limit"
        );
    }

    #[test]
    fn zero_width_elements() {
        let schema = Schema::new();
        let buf = [0xFF, 0xFF, 0xFF, 0xFF, 0x07];
        assert_eq!(
            decode(&schema, &rule!(array(void)), &buf),
            Err(Error::MessageTooLarge {
                len: 0x7FFF_FFFF,
                offset: 0
            }),
            "huge counts of void must not be materialized"
        );
        assert_eq!(
            decode(&schema, &rule!(map(void)(void)), &buf),
            Err(Error::MessageTooLarge {
                len: 0x7FFF_FFFF,
                offset: 0
            }),
            "huge counts of void pairs must not be materialized"
        );

        let fixed = Rule::fixed_array(rule!(void), u32::MAX);
        assert_eq!(
            decode(&schema, &fixed, &[]),
            Err(Error::MessageTooLarge {
                len: u32::MAX.into(),
                offset: 0
            }),
            "fixed counts use the same budget"
        );
    }

    #[test]
    fn element_budget_spans_nesting() {
        let schema = Schema::new();
        let config = Config::default().with_max_elements(4);
        let rule = rule!(array(array(void)));

        assert_eq!(
            decode_with(&schema, &rule, &[2, 1, 1], config),
            Ok(Value::Seq(vec![
                Value::Seq(vec![Value::Void]),
                Value::Seq(vec![Value::Void]),
            ])),
            "4 elements fit"
        );
        assert_eq!(
            decode_with(&schema, &rule, &[2, 3, 0], config),
            Err(Error::MessageTooLarge { len: 3, offset: 1 }),
            "nested counts must add up"
        );
    }

    #[test]
    fn element_budget_is_per_call() {
        let schema = Schema::new();
        let config = Config::default().with_max_elements(2);
        let mut decoder = Decoder::with_config(&schema, &[2, 2], config);

        let rule = rule!(array(void));
        let both = Value::Seq(vec![Value::Void, Value::Void]);
        assert_eq!(decoder.decode(&rule), Ok(both.clone()), "first call fits");
        assert_eq!(decoder.decode(&rule), Ok(both), "second call gets a new budget");
    }

    fn varuint_bytes(x: u64) -> Vec<u8> {
        crate::varuint::encode(x).to_vec()
    }
}
