use super::Error;
use crate::varuint;

/// Cursor over the input slice.
///
/// Reads either succeed completely or leave the cursor where it was.
#[derive(Debug, Clone)]
pub struct SliceRead<'de> {
    slice: &'de [u8],
    offset: usize,
}

impl<'de> SliceRead<'de> {
    pub(crate) fn new(slice: &'de [u8]) -> Self {
        Self { slice, offset: 0 }
    }

    /// Gets the amount of bytes read so far.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Gets the remaining unread part of the slice.
    pub fn remainder(&self) -> &'de [u8] {
        self.slice
    }

    fn eof(&self) -> Error {
        Error::Truncated {
            offset: self.offset,
        }
    }

    #[inline]
    fn take(&mut self, len: usize) -> Result<&'de [u8], Error> {
        let slice = self.slice;
        let (out, rem) = slice.split_at_checked(len).ok_or_else(|| self.eof())?;
        self.slice = rem;
        self.offset += len;
        Ok(out)
    }

    /// Reads a constant size chunk of bytes.
    pub fn read_bytes<const N: usize>(&mut self) -> Result<[u8; N], Error> {
        let slice = self.slice;
        let (out, rem) = slice.split_first_chunk::<N>().ok_or_else(|| self.eof())?;
        self.slice = rem;
        self.offset += N;
        Ok(*out)
    }

    /// Reads a chunk of bytes, returning it as a newly allocated [`Vec`].
    pub fn read_byte_vec(&mut self, len: usize) -> Result<Vec<u8>, Error> {
        self.take(len).map(<[u8]>::to_vec)
    }

    /// Reads a varuint.
    pub fn read_varuint(&mut self) -> Result<u64, Error> {
        let offset = self.offset;
        let (x, len) = varuint::read(self.slice).map_err(|why| match why {
            varuint::Error::Truncated => Error::Truncated { offset },
            varuint::Error::Overflow => Error::VaruintOverflow { offset },
        })?;

        self.take(len)?;
        Ok(x)
    }
}
