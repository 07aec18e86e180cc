//! Forward-only little-endian decoder over a model byte stream.
//!
//! [`ModelReader`] wraps any [`Read`] and exposes the typed reads the legacy
//! binary format needs. Every fixed-size read either returns the complete
//! value or fails with [`ReadError::ShortRead`] carrying the requested and
//! delivered byte counts; nothing is ever zero-filled.
//!
//! # Example
//!
//! ```
//! use xgboost_predictor::io::ModelReader;
//!
//! let bytes = [0x2a, 0, 0, 0, 0, 0, 0x80, 0x3f];
//! let mut reader = ModelReader::new(&bytes[..]);
//! assert_eq!(reader.read_i32().unwrap(), 42);
//! assert_eq!(reader.read_f32().unwrap(), 1.0);
//! assert_eq!(reader.position(), 8);
//! ```

use std::io::{self, Read};
use std::string::FromUtf8Error;

use byteorder::{ByteOrder, LittleEndian};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Errors raised while decoding the byte stream.
#[derive(Debug, Error)]
pub enum ReadError {
    /// The stream ended before a fixed-size field was complete.
    #[error("short read: expected {expected} bytes, got {actual}")]
    ShortRead { expected: usize, actual: usize },

    /// A discard ended before the requested number of bytes was consumed.
    #[error("short skip: expected {expected} bytes, skipped {actual}")]
    ShortSkip { expected: u64, actual: u64 },

    /// A value documented as non-negative decoded out of range.
    #[error("{what} overflow: {value}")]
    Overflow { what: &'static str, value: i64 },

    /// A length-prefixed string was not valid UTF-8.
    #[error("invalid string: {0}")]
    InvalidString(#[from] FromUtf8Error),

    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

// ============================================================================
// Stateless decoding helpers
// ============================================================================

/// Reinterpret four little-endian bytes as an IEEE-754 float32.
#[inline]
pub fn le_f32(bytes: [u8; 4]) -> f32 {
    LittleEndian::read_f32(&bytes)
}

/// Decode four little-endian bytes as an unsigned count.
///
/// The format stores unsigned fields in signed 32-bit slots, so a word with
/// the sign bit set is an overflow rather than a large value.
#[inline]
pub fn le_unsigned(bytes: [u8; 4]) -> Result<u32, ReadError> {
    checked_unsigned("unsigned int", LittleEndian::read_i32(&bytes))
}

fn checked_unsigned(what: &'static str, value: i32) -> Result<u32, ReadError> {
    u32::try_from(value).map_err(|_| ReadError::Overflow {
        what,
        value: value.into(),
    })
}

fn byte_len(count: usize, width: usize) -> Result<usize, ReadError> {
    count.checked_mul(width).ok_or(ReadError::Overflow {
        what: "array length",
        value: i64::try_from(count).unwrap_or(i64::MAX),
    })
}

// ============================================================================
// ModelReader
// ============================================================================

/// Sequential, non-seekable reader for the legacy binary model format.
///
/// All multi-byte values are little-endian. The reader keeps one scratch
/// buffer that retains its capacity, so repeated node and statistics reads
/// do not allocate.
#[derive(Debug)]
pub struct ModelReader<R> {
    inner: R,
    buffer: Vec<u8>,
    position: u64,
}

impl<R: Read> ModelReader<R> {
    /// Wrap a byte source.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buffer: Vec::new(),
            position: 0,
        }
    }

    /// Number of bytes consumed so far (read or skipped).
    #[inline]
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Recover the wrapped source.
    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Fill the scratch buffer with exactly `n` bytes.
    ///
    /// The buffer grows with the data actually delivered, so a corrupt count
    /// fails with a short read instead of a huge up-front allocation.
    fn fill(&mut self, n: usize) -> Result<&[u8], ReadError> {
        self.buffer.clear();
        let filled = (&mut self.inner).take(n as u64).read_to_end(&mut self.buffer)?;
        self.position += filled as u64;

        if filled < n {
            return Err(ReadError::ShortRead {
                expected: n,
                actual: filled,
            });
        }
        Ok(&self.buffer[..n])
    }

    // =========================================================================
    // Scalars
    // =========================================================================

    /// Read one byte as an integer.
    pub fn read_u8(&mut self) -> Result<u8, ReadError> {
        Ok(self.fill(1)?[0])
    }

    /// Read a signed 32-bit integer.
    pub fn read_i32(&mut self) -> Result<i32, ReadError> {
        Ok(LittleEndian::read_i32(self.fill(4)?))
    }

    /// Read a 32-bit field documented as unsigned.
    ///
    /// Fails with [`ReadError::Overflow`] when the sign bit is set.
    pub fn read_unsigned(&mut self) -> Result<u32, ReadError> {
        let value = self.read_i32()?;
        checked_unsigned("unsigned int", value)
    }

    /// Read a 32-bit element count.
    ///
    /// Same as [`read_unsigned`](Self::read_unsigned), but names the field in
    /// the overflow error and returns a `usize` ready for allocation.
    pub fn read_count(&mut self, what: &'static str) -> Result<usize, ReadError> {
        let value = self.read_i32()?;
        Ok(checked_unsigned(what, value)? as usize)
    }

    /// Read a signed 64-bit integer.
    pub fn read_i64(&mut self) -> Result<i64, ReadError> {
        Ok(LittleEndian::read_i64(self.fill(8)?))
    }

    /// Read an IEEE-754 float32.
    pub fn read_f32(&mut self) -> Result<f32, ReadError> {
        Ok(LittleEndian::read_f32(self.fill(4)?))
    }

    // =========================================================================
    // Arrays
    // =========================================================================

    /// Read `n` raw bytes.
    pub fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>, ReadError> {
        Ok(self.fill(n)?.to_vec())
    }

    /// Read `n` signed 32-bit integers.
    pub fn read_i32_array(&mut self, n: usize) -> Result<Vec<i32>, ReadError> {
        let bytes = self.fill(byte_len(n, 4)?)?;
        let mut values = vec![0i32; n];
        LittleEndian::read_i32_into(bytes, &mut values);
        Ok(values)
    }

    /// Read `n` signed 64-bit integers.
    pub fn read_i64_array(&mut self, n: usize) -> Result<Vec<i64>, ReadError> {
        let bytes = self.fill(byte_len(n, 8)?)?;
        let mut values = vec![0i64; n];
        LittleEndian::read_i64_into(bytes, &mut values);
        Ok(values)
    }

    /// Read `n` float32 values.
    pub fn read_f32_array(&mut self, n: usize) -> Result<Vec<f32>, ReadError> {
        let bytes = self.fill(byte_len(n, 4)?)?;
        let mut values = vec![0f32; n];
        LittleEndian::read_f32_into(bytes, &mut values);
        Ok(values)
    }

    // =========================================================================
    // Strings
    // =========================================================================

    /// Read a string prefixed by its 64-bit byte length.
    ///
    /// Lengths that are negative or exceed `i32::MAX` fail with
    /// [`ReadError::Overflow`] before any payload is consumed.
    pub fn read_string(&mut self) -> Result<String, ReadError> {
        let len = self.read_i64()?;
        if !(0..=i64::from(i32::MAX)).contains(&len) {
            return Err(ReadError::Overflow {
                what: "string length",
                value: len,
            });
        }
        self.read_fixed_string(len as usize)
    }

    /// Read a string of exactly `n` bytes.
    pub fn read_fixed_string(&mut self, n: usize) -> Result<String, ReadError> {
        let bytes = self.fill(n)?.to_vec();
        Ok(String::from_utf8(bytes)?)
    }

    // =========================================================================
    // Skipping
    // =========================================================================

    /// Discard `n` bytes without decoding them.
    pub fn skip(&mut self, n: u64) -> Result<(), ReadError> {
        let skipped = io::copy(&mut (&mut self.inner).take(n), &mut io::sink())?;
        self.position += skipped;
        if skipped < n {
            return Err(ReadError::ShortSkip {
                expected: n,
                actual: skipped,
            });
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
