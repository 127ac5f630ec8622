//! Exposes an encoder and encoding helper functions.

use std::io;

use crate::config::Config;
use crate::error::ResolveError;
use crate::raw::RawRule;
use crate::rule::Rule;
use crate::schema::Schema;
use crate::value::{TextKind, Value, is_exact_f64};
use crate::varuint;

mod error;

pub use error::Error;

/// Encodes a value described by `rule`.
///
/// The bytes are appended to `out` if given, otherwise to a new buffer. If
/// encoding fails, the given buffer is lost. Use [`encode_into`] to keep it.
///
/// # Errors
///
/// Returns `Err` if the value doesn't fit the rule.
pub fn encode(
    schema: &Schema,
    rule: &Rule,
    value: &Value,
    out: Option<Vec<u8>>,
) -> Result<Vec<u8>, Error> {
    encode_with(schema, rule, value, out, Config::default())
}

/// Encodes a value, like [`encode`], with explicit limits.
///
/// # Errors
///
/// Returns `Err` if the value doesn't fit the rule or exceeds a limit.
pub fn encode_with(
    schema: &Schema,
    rule: &Rule,
    value: &Value,
    out: Option<Vec<u8>>,
    config: Config,
) -> Result<Vec<u8>, Error> {
    let mut buf = out.unwrap_or_default();
    encode_into(schema, rule, value, &mut buf, config)?;
    Ok(buf)
}

/// Appends an encoded value to `out`.
///
/// If encoding fails, `out` is truncated back to its previous length.
///
/// # Errors
///
/// Returns `Err` if the value doesn't fit the rule or exceeds a limit.
pub fn encode_into(
    schema: &Schema,
    rule: &Rule,
    value: &Value,
    out: &mut Vec<u8>,
    config: Config,
) -> Result<(), Error> {
    let start = out.len();
    let res = Encoder::with_config(schema, &mut *out, config).encode(rule, value);
    if res.is_err() {
        out.truncate(start);
    }

    res
}

/// Encodes a value to a [`io::Write`].
///
/// If encoding fails, part of the value may already have been written.
///
/// # Errors
///
/// Returns `Err` if the value doesn't fit the rule or the writer fails.
pub fn to_writer<W>(writer: W, schema: &Schema, rule: &Rule, value: &Value) -> Result<(), Error>
where
    W: io::Write,
{
    Encoder::new(schema, writer).encode(rule, value)
}

/// Normalizes a raw rule and encodes a value with it.
///
/// # Errors
///
/// Returns [`Error::MalformedRule`] if the rule is malformed, otherwise the
/// same errors as [`encode`].
pub fn encode_raw(schema: &Schema, rule: &RawRule, value: &Value) -> Result<Vec<u8>, Error> {
    let rule = rule.parse()?;
    encode(schema, &rule, value, None)
}

/// Encodes values to a [`io::Write`].
#[derive(Debug)]
pub struct Encoder<'s, W> {
    schema: &'s Schema,
    config: Config,
    writer: W,
}

impl<'s, W: io::Write> Encoder<'s, W> {
    /// Creates an encoder with the default [`Config`].
    pub fn new(schema: &'s Schema, writer: W) -> Self {
        Self::with_config(schema, writer, Config::default())
    }

    /// Creates an encoder with the given [`Config`].
    pub fn with_config(schema: &'s Schema, writer: W, config: Config) -> Self {
        Self {
            schema,
            config,
            writer,
        }
    }

    /// Unwraps the encoder into its inner writer.
    pub fn into_writer(self) -> W {
        self.writer
    }

    /// Gets a mutable reference to the inner writer.
    pub fn as_writer(&mut self) -> &mut W {
        &mut self.writer
    }

    /// Encodes a value.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the value doesn't fit the rule or the writer fails.
    pub fn encode(&mut self, rule: &Rule, value: &Value) -> Result<(), Error> {
        self.encode_rule(rule, value, 0)
            .inspect_err(|why| log::debug!("Failed to encode {} value: {why}", rule.kind_name()))
    }

    fn encode_rule(&mut self, rule: &Rule, value: &Value, depth: usize) -> Result<(), Error> {
        if depth >= self.config.max_depth {
            return Err(Error::RecursionLimitExceeded {
                limit: self.config.max_depth,
            });
        }

        let depth = depth + 1;
        match rule {
            Rule::Void => match value {
                Value::Void => Ok(()),
                _ => Err(mismatch(rule, value)),
            },
            Rule::UInt8 => {
                let n = to_u64(rule, value)?;
                let b = u8::try_from(n).map_err(|_| Error::OutOfRange {
                    value: n,
                    rule: rule.kind_name(),
                })?;

                self.write_byte(b)
            }
            Rule::UInt => {
                let n = to_u64(rule, value)?;
                if !is_exact_f64(n) {
                    return Err(Error::PrecisionLoss { value: n });
                }

                self.write_varuint(n)
            }
            Rule::UInt64 => {
                let n = to_u64(rule, value)?;
                self.write_varuint(n)
            }
            Rule::Data => match value {
                Value::Bytes(b) => self.write_data(b),
                _ => Err(mismatch(rule, value)),
            },
            Rule::String => self.write_text(rule, TextKind::String, value),
            Rule::Symbol => self.write_text(rule, TextKind::Symbol, value),
            Rule::Keyword => self.write_text(rule, TextKind::Keyword, value),
            Rule::Optional(inner) => {
                if value.is_nil() {
                    self.write_byte(0)
                } else {
                    self.write_byte(1)?;
                    self.encode_rule(inner, value, depth)
                }
            }
            Rule::Array { element, len } => {
                let Value::Seq(items) = value else {
                    return Err(mismatch(rule, value));
                };

                match *len {
                    Some(len) if usize::try_from(len).is_ok_and(|len| len == items.len()) => {}
                    Some(len) => {
                        return Err(Error::ArrayLengthMismatch {
                            expected: len,
                            actual: items.len(),
                        });
                    }
                    None => self.write_len(items.len())?,
                }

                for item in items {
                    self.encode_rule(element, item, depth)?;
                }

                Ok(())
            }
            Rule::Map {
                key,
                value: value_rule,
            } => {
                let Value::Map(pairs) = value else {
                    return Err(mismatch(rule, value));
                };

                self.write_len(pairs.len())?;
                for (k, v) in pairs {
                    self.encode_rule(key, k, depth)?;
                    self.encode_rule(value_rule, v, depth)?;
                }

                Ok(())
            }
            Rule::Struct(fields) => {
                if !matches!(value, Value::Map(_)) {
                    return Err(mismatch(rule, value));
                }

                for field in fields {
                    // a nil field counts as absent
                    match value.field(&field.name).filter(|v| !v.is_nil()) {
                        Some(v) => self.encode_rule(&field.rule, v, depth)?,
                        None if self.is_optional(&field.rule, depth)? => {
                            self.encode_rule(&field.rule, &Value::Nil, depth)?;
                        }
                        None => {
                            return Err(Error::MissingField {
                                field: field.name.clone(),
                            });
                        }
                    }
                }

                Ok(())
            }
            Rule::Reference(name) => {
                let schema = self.schema;
                let target = schema.lookup(name)?;
                self.encode_rule(target, value, depth)
            }
        }
    }

    /// Whether `rule` resolves to [`Rule::Optional`] within the remaining
    /// depth.
    fn is_optional(&self, rule: &Rule, depth: usize) -> Result<bool, Error> {
        let limit = self.config.max_depth;
        let resolved = self
            .schema
            .resolve(rule, limit.saturating_sub(depth))
            .map_err(|why| match why {
                ResolveError::TooDeep(_) => Error::RecursionLimitExceeded { limit },
                why => why.into(),
            })?;

        Ok(matches!(resolved, Rule::Optional(_)))
    }

    fn write_byte(&mut self, b: u8) -> Result<(), Error> {
        self.writer.write_all(&[b])?;
        Ok(())
    }

    fn write_varuint(&mut self, x: u64) -> Result<(), Error> {
        varuint::write(&mut self.writer, x)?;
        Ok(())
    }

    /// Writes a length or count prefix.
    fn write_len(&mut self, len: usize) -> Result<(), Error> {
        match u64::try_from(len) {
            Ok(n) if n <= self.config.len_limit() => self.write_varuint(n),
            _ => Err(Error::MessageTooLarge { len }),
        }
    }

    fn write_data(&mut self, data: &[u8]) -> Result<(), Error> {
        self.write_len(data.len())?;
        self.writer.write_all(data)?;
        Ok(())
    }

    fn write_text(&mut self, rule: &Rule, kind: TextKind, value: &Value) -> Result<(), Error> {
        match value {
            Value::Text(k, b) if *k == kind => self.write_data(b),
            _ => Err(mismatch(rule, value)),
        }
    }
}

fn mismatch(rule: &Rule, value: &Value) -> Error {
    Error::TypeMismatch {
        expected: rule.kind_name(),
        found: value.kind_name(),
    }
}

/// Coerces a value for an integer rule.
///
/// Host numbers are accepted if they are non-negative integers below `2^64`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_u64(rule: &Rule, value: &Value) -> Result<u64, Error> {
    // 2^64, exactly representable
    const LIMIT: f64 = 18_446_744_073_709_551_616.0;

    match *value {
        Value::UInt(n) => Ok(n),
        Value::Number(f) if f >= 0.0 && f < LIMIT && f.fract() == 0.0 => Ok(f as u64),
        _ => Err(mismatch(rule, value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule;

    #[test]
    fn u8_range() {
        let schema = Schema::new();
        let res = encode(&schema, &rule!(u8), &Value::UInt(256), None);
        assert!(
            matches!(res, Err(Error::OutOfRange { value: 256, rule: "u8" })),
            "must reject 256 for u8"
        );

        let res = encode(&schema, &rule!(u8), &Value::UInt(255), None);
        assert_eq!(res.ok(), Some(vec![0xFF]), "must accept 255 for u8");
    }

    #[test]
    fn number_coercion() {
        let schema = Schema::new();
        let cases = [
            (Value::Number(300.0), Some(vec![0xAC, 0x02])),
            (Value::Number(-0.0), Some(vec![0x00])),
            (Value::Number(1.5), None),
            (Value::Number(-1.0), None),
            (Value::Number(f64::NAN), None),
            (Value::Number(f64::INFINITY), None),
        ];

        for (value, expected) in cases {
            let res = encode(&schema, &rule!(u64), &value, None);
            assert_eq!(res.ok(), expected, "mismatch for {value:?}");
        }
    }

    #[test]
    fn precision() {
        let schema = Schema::new();
        let value = Value::UInt((1 << 53) + 1);
        assert!(
            matches!(
                encode(&schema, &rule!(uint), &value, None),
                Err(Error::PrecisionLoss { .. })
            ),
            "uint must reject inexact values"
        );
        encode(&schema, &rule!(u64), &value, None).expect("u64 must accept any value");
    }

    #[test]
    fn text_kinds() {
        let schema = Schema::new();
        assert_eq!(
            encode(&schema, &rule!(symbol), &Value::symbol("ab"), None).ok(),
            Some(vec![2, b'a', b'b']),
            "symbol must encode as text"
        );
        assert!(
            matches!(
                encode(&schema, &rule!(string), &Value::keyword("ab"), None),
                Err(Error::TypeMismatch {
                    expected: "string",
                    found: "keyword"
                })
            ),
            "text kinds must match"
        );
        assert!(
            matches!(
                encode(&schema, &rule!(data), &Value::string("ab"), None),
                Err(Error::TypeMismatch { .. })
            ),
            "data only accepts bytes"
        );
    }

    #[test]
    fn void_requires_void() {
        let schema = Schema::new();
        assert_eq!(
            encode(&schema, &rule!(void), &Value::Void, None).ok(),
            Some(Vec::new()),
            "void writes nothing"
        );
        encode(&schema, &rule!(void), &Value::Nil, None).expect_err("void rejects nil");
    }

    #[test]
    fn length_limit() {
        let schema = Schema::new();
        let config = Config::default().with_max_len(2);
        let value = Value::Bytes(vec![1, 2, 3]);
        let res = encode_with(&schema, &rule!(data), &value, None, config);

        assert!(
            matches!(res, Err(Error::MessageTooLarge { len: 3 })),
            "must respect the configured limit"
        );
    }

    #[test]
    fn writer() {
        let schema = Schema::new();
        let mut enc = Encoder::new(&schema, Vec::new());
        enc.encode(&rule!(u8), &Value::UInt(1)).expect("must encode");
        enc.encode(&rule!(string), &Value::string("x")).expect("must encode");
        assert_eq!(enc.into_writer(), [1, 1, b'x'], "values must be appended");
    }

    #[test]
    fn raw_rule() {
        let schema = Schema::new();
        let raw = RawRule::tuple([RawRule::symbol("optional"), RawRule::symbol("u8")]);
        assert_eq!(
            encode_raw(&schema, &raw, &Value::UInt(9)).ok(),
            Some(vec![1, 9]),
            "must encode with the parsed rule"
        );

        let bad = RawRule::symbol("f64");
        assert!(
            matches!(
                encode_raw(&schema, &bad, &Value::Nil),
                Err(Error::MalformedRule(_))
            ),
            "must report malformed rules"
        );
    }
}
