//! # Schema-driven binary encoding
//!
//! Encodes and decodes a compact binary format, modeled after [BARE][bare].
//! The format is not self-describing: every read or write is driven by a
//! [`Rule`], which may refer to named rules in a [`Schema`].
//!
//! The rules map to the wire as follows:
//!
//! - `void`: nothing
//! - `u8`: single byte
//! - `uint`, `uint/u64`: unsigned LEB128 integer of at most 10 bytes. `uint`
//!   additionally requires the value to be exactly representable as an [`f64`].
//! - `data`, `string`, `symbol`, `keyword`: `uint`-length prefix followed by
//!   that many raw bytes
//! - `optional`: a flag byte, followed by the inner value if the flag is set
//! - `array`: `uint`-length prefix followed by the elements. Fixed length
//!   arrays omit the prefix.
//! - `map`: `uint`-count prefix followed by key-value pairs
//! - `struct`: the field values in declaration order, without names
//! - references: whatever the named rule describes
//!
//! Values are represented dynamically as [`Value`], both when decoding and
//! encoding. Limits on lengths and nesting are set with [`Config`].
//!
//! # Examples
//!
//! ```
//! use bare_rule::{Schema, Value, decode, encode, rule};
//!
//! let schema = Schema::new().with("point", rule!(struct {
//!     (x: uint),
//!     (y: uint),
//! }));
//!
//! let value = Value::fields([("x", 3u8), ("y", 200u8)]);
//! let buf = encode(&schema, &rule!(ref("point")), &value, None).unwrap();
//! assert_eq!(buf, [3, 0xC8, 0x01]);
//!
//! let rev = decode(&schema, &rule!(ref("point")), &buf).unwrap();
//! assert_eq!(rev, value);
//! ```
//!
//! [bare]: <https://baremessages.org/>

#[cfg(test)]
use criterion as _;

pub mod config;
pub mod de;
pub mod error;
pub mod raw;
pub mod rule;
pub mod schema;
pub mod ser;
pub mod value;
pub mod varuint;


pub use config::Config;
pub use de::{Decoder, decode, decode_raw, decode_with};
pub use raw::RawRule;
pub use rule::{Rule, StructField};
pub use schema::Schema;
pub use ser::{Encoder, encode, encode_into, encode_raw, encode_with, to_writer};
pub use value::{TextKind, Value};
