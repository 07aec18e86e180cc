//! Binary model stream decoding.
//!
//! The legacy format has no framing or checksums: every structure is read
//! back-to-back from one cursor, so [`ModelReader`] is the only I/O type the
//! loaders touch.

mod reader;

pub use reader::{ModelReader, ReadError, le_f32, le_unsigned};
