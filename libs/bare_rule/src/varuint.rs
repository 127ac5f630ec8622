//! Unsigned LEB128 variable-length integers, fixed to 64 bits.
//!
//! This is the wire format of [`Rule::UInt`] and [`Rule::UInt64`] values as
//! well as of every length and count prefix.
//!
//! See also: <https://en.wikipedia.org/wiki/LEB128>
//!
//! [`Rule::UInt`]: crate::Rule::UInt
//! [`Rule::UInt64`]: crate::Rule::UInt64

use std::io;

use arrayvec::ArrayVec;

/// The maximum length of a canonical varuint in bytes.
///
/// Nine bytes carry 63 payload bits, so the tenth byte may only hold the
/// single remaining bit.
pub const MAX_LEN: usize = 10;

/// Error reading a varuint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The buffer ended before a byte without the continuation bit.
    #[error("unexpected end of buffer in variable-length integer")]
    Truncated,
    /// The encoded value needs more than 64 bits.
    #[error("variable-length integer exceeds 64 bits")]
    Overflow,
}

/// Encodes `x` into a stack buffer, least significant group first.
pub fn encode(mut x: u64) -> ArrayVec<u8, MAX_LEN> {
    let mut buf = ArrayVec::new_const();
    while x >= 0x80 {
        buf.push(trunc_u8(x) | 0x80);
        x >>= 7;
    }

    buf.push(trunc_u8(x));
    buf
}

/// Gets the amount of bytes [`encode`] produces for `x`.
pub const fn encoded_len(mut x: u64) -> usize {
    let mut len = 1;
    while x >= 0x80 {
        x >>= 7;
        len += 1;
    }
    len
}

/// Writes `x` to a writer.
///
/// # Errors
///
/// Returns `Err` if the writer fails.
pub fn write<W: io::Write>(mut writer: W, x: u64) -> io::Result<()> {
    writer.write_all(&encode(x))
}

/// Reads a varuint from the start of `buf`.
///
/// Returns the value and the amount of bytes it occupied.
///
/// # Errors
///
/// Returns [`Error::Truncated`] if `buf` ends before the value does, and
/// [`Error::Overflow`] if the value is longer than [`MAX_LEN`] bytes or its
/// last byte carries more than the 64th bit.
pub fn read(buf: &[u8]) -> Result<(u64, usize), Error> {
    let mut x = 0u64;
    for (i, &b) in buf.iter().enumerate() {
        // this also catches a continuation bit on the tenth byte
        if i == MAX_LEN - 1 && b > 1 {
            return Err(Error::Overflow);
        }

        x |= u64::from(b & 0x7F) << (7 * i);

        if b < 0x80 {
            // No continuation bit is set
            return Ok((x, i + 1));
        }
    }

    Err(Error::Truncated)
}

#[allow(clippy::cast_possible_truncation)]
fn trunc_u8(x: u64) -> u8 {
    x as u8
}
