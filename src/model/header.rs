//! Top-level model header.
//!
//! The first eight bytes are sniffed to tell three historical layouts apart:
//!
//! ```text
//! "binf" | base_score f32 | num_feature u32          (Binf)
//! 00 05 '_' 'c' 'l' 's' '_' hi | lo | type[hi<<8|lo] | base_score | num_feature
//! 00 05 '_' 'r' 'e' 'g' '_' hi | lo | type[hi<<8|lo] | base_score | num_feature
//! base_score f32 | num_feature u32                    (Bare)
//! ```
//!
//! All three continue with `num_class`, the prediction-buffer flag, 30
//! reserved words, then the objective and booster names.

use std::io::Read;

use tracing::debug;

use crate::io::{ModelReader, ReadError, le_f32, le_unsigned};

const BINF_MAGIC: [u8; 4] = *b"binf";
const LEGACY_PREFIX: [u8; 3] = [0, 5, b'_'];
const RESERVED: usize = 30;

/// Which header layout the stream used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderFormat {
    /// `binf` magic followed by base score and feature count.
    Binf,
    /// Length-prefixed `_cls_` / `_reg_` marker followed by a model-type string.
    Legacy {
        marker: LegacyMarker,
        model_type: String,
    },
    /// No marker: the first eight bytes are base score and feature count.
    Bare,
}

/// Discriminator of a [`HeaderFormat::Legacy`] header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegacyMarker {
    Classification,
    Regression,
}

impl LegacyMarker {
    fn sniff(first: &[u8; 4], next: &[u8; 4]) -> Option<Self> {
        if first[..3] != LEGACY_PREFIX {
            return None;
        }
        match (first[3], &next[..3]) {
            (b'c', b"ls_") => Some(Self::Classification),
            (b'r', b"eg_") => Some(Self::Regression),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Classification => "_cls_",
            Self::Regression => "_reg_",
        }
    }
}

/// Decoded model header. Immutable after load.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelHeader {
    pub format: HeaderFormat,
    pub base_score: f32,
    pub num_feature: u32,
    pub num_class: i32,
    pub saved_with_pbuffer: bool,
    pub objective: String,
    pub booster: String,
}

impl ModelHeader {
    /// Decode the header, leaving the reader at the booster section.
    pub fn read<R: Read>(reader: &mut ModelReader<R>) -> Result<Self, ReadError> {
        let first: [u8; 4] = read_word(reader)?;
        let next: [u8; 4] = read_word(reader)?;

        let (format, base_score, num_feature) = if first == BINF_MAGIC {
            (HeaderFormat::Binf, le_f32(next), reader.read_unsigned()?)
        } else if let Some(marker) = LegacyMarker::sniff(&first, &next) {
            let len = (usize::from(next[3]) << 8) + usize::from(reader.read_u8()?);
            let model_type = reader.read_fixed_string(len)?;
            let base_score = reader.read_f32()?;
            let num_feature = reader.read_unsigned()?;
            (
                HeaderFormat::Legacy { marker, model_type },
                base_score,
                num_feature,
            )
        } else {
            (HeaderFormat::Bare, le_f32(first), le_unsigned(next)?)
        };

        let num_class = reader.read_i32()?;
        let saved_with_pbuffer = reader.read_i32()? != 0;
        reader.read_i32_array(RESERVED)?;
        let objective = reader.read_string()?;
        let booster = reader.read_string()?;

        debug!(
            ?format,
            base_score,
            num_feature,
            num_class,
            saved_with_pbuffer,
            objective = %objective,
            booster = %booster,
            "decoded model header"
        );

        Ok(Self {
            format,
            base_score,
            num_feature,
            num_class,
            saved_with_pbuffer,
            objective,
            booster,
        })
    }
}

fn read_word<R: Read>(reader: &mut ModelReader<R>) -> Result<[u8; 4], ReadError> {
    let mut word = [0u8; 4];
    word.copy_from_slice(&reader.read_bytes(4)?);
    Ok(word)
}
