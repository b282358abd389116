use self::error::TiffErrorCode;
use super::PredictorParms;
use crate::process::filter::error::FilterResult;
use crate::process::filter::Filter;
use crate::Byte;

/// REFERENCE: [[TIFF 6.0 Specification] Section 14: Differencing Predictor,
/// p64]
/// Each component is replaced by its difference from the same component of
/// the pixel to its left, modulo 2^BitsPerComponent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(in crate::process::filter) struct Tiff {
    parms: PredictorParms,
}

impl Filter for Tiff {
    /// REFERENCE: [7.4.4.4 LZW and Flate predictor functions, p41]
    fn filter(&self, bytes: impl Into<Vec<Byte>> + AsRef<[Byte]>) -> FilterResult<Vec<Byte>> {
        self.process(bytes.as_ref(), false)
    }

    fn defilter(&self, bytes: impl Into<Vec<Byte>> + AsRef<[Byte]>) -> FilterResult<Vec<Byte>> {
        self.process(bytes.as_ref(), true)
    }
}

impl Tiff {
    fn process(&self, bytes: &[Byte], decode: bool) -> FilterResult<Vec<Byte>> {
        let bits = self.parms.bits_per_component();
        let colors = self.parms.colors();
        let row_components = colors * self.parms.columns();
        let mask = ((1u32 << bits) - 1) as u16;

        let mut processed = Vec::with_capacity(bytes.len());
        for (index, row) in bytes.chunks(self.parms.bytes_per_row()).enumerate() {
            let mut components = unpack(row, bits)
                .ok_or(TiffErrorCode::PartialComponent(index, row.len()))?;
            // Padding bits at the end of a row are kept as they are
            let count = row_components.min(components.len());
            if decode {
                for position in colors..count {
                    components[position] =
                        components[position].wrapping_add(components[position - colors]) & mask;
                }
            } else {
                // Right to left so that the left neighbour is still original
                for position in (colors..count).rev() {
                    components[position] =
                        components[position].wrapping_sub(components[position - colors]) & mask;
                }
            }
            pack(&components, bits, &mut processed);
        }
        Ok(processed)
    }
}

/// Split a row into components of `bits` bits, most significant first.
/// `None` if a 16-bit row ends in the middle of a component.
fn unpack(row: &[Byte], bits: usize) -> Option<Vec<u16>> {
    match bits {
        16 => {
            let components = row.chunks_exact(2);
            if !components.remainder().is_empty() {
                return None;
            }
            Some(
                components
                    .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                    .collect(),
            )
        }
        8 => Some(row.iter().copied().map(u16::from).collect()),
        _ => {
            let per_byte = 8 / bits;
            let mask = (1u16 << bits) - 1;
            Some(
                row.iter()
                    .flat_map(|&byte| {
                        (1..=per_byte).map(move |k| (u16::from(byte) >> (8 - bits * k)) & mask)
                    })
                    .collect(),
            )
        }
    }
}

fn pack(components: &[u16], bits: usize, out: &mut Vec<Byte>) {
    match bits {
        16 => components
            .iter()
            .for_each(|component| out.extend_from_slice(&component.to_be_bytes())),
        8 => out.extend(components.iter().map(|&component| component as Byte)),
        _ => {
            for chunk in components.chunks(8 / bits) {
                let byte = chunk
                    .iter()
                    .fold(0u16, |byte, &component| (byte << bits) | component);
                out.push(byte as Byte);
            }
        }
    }
}

mod convert {
    use super::*;

    impl Tiff {
        pub(in crate::process::filter::predictor) fn new(parms: PredictorParms) -> Self {
            Self { parms }
        }
    }
}

pub(in crate::process::filter) mod error {
    use ::thiserror::Error;

    #[derive(Debug, Error, PartialEq, Clone, Copy)]
    pub enum TiffErrorCode {
        #[error("Row {0} ends inside a 16-bit component after {1} bytes")]
        PartialComponent(usize, usize),
    }
}
