use self::error::PngErrorCode;
use super::PredictorParms;
use crate::process::filter::error::FilterResult;
use crate::process::filter::Filter;
use crate::Byte;

/// REFERENCE:
/// - [7.4.4.4 LZW and Flate predictor functions, p41]
/// - [[https://www.w3.org/TR/PNG-Filters.html]]
/// The World Wide Web Consortium’s Portable Network Graphics filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(in crate::process::filter) struct Png {
    algorithm: PngAlgorithm,
    parms: PredictorParms,
}

impl Filter for Png {
    /// Every row is prefixed with the filter type used for it. `Optimum`
    /// picks, per row, the type with the smallest sum of absolute residuals.
    fn filter(&self, bytes: impl Into<Vec<Byte>> + AsRef<[Byte]>) -> FilterResult<Vec<Byte>> {
        let bytes = bytes.as_ref();
        let row_len = self.parms.bytes_per_row();
        let bytes_per_pixel = self.parms.bytes_per_pixel();

        let mut filtered = Vec::with_capacity(bytes.len() + bytes.len() / row_len + 1);
        let mut prior = vec![0; row_len];
        let mut residuals = vec![0; row_len];
        for row in bytes.chunks(row_len) {
            let residuals = &mut residuals[..row.len()];
            let filter_type = match self.algorithm {
                PngAlgorithm::Optimum => {
                    let mut best = (u64::MAX, FilterType::None);
                    for filter_type in FilterType::ALL {
                        filter_type.residuals(row, &prior, bytes_per_pixel, residuals);
                        let cost = residuals
                            .iter()
                            .map(|&residual| u64::from((residual as i8).unsigned_abs()))
                            .sum::<u64>();
                        if cost < best.0 {
                            best = (cost, filter_type);
                        }
                    }
                    best.1
                }
                PngAlgorithm::Fixed(filter_type) => filter_type,
            };
            filter_type.residuals(row, &prior, bytes_per_pixel, residuals);
            filtered.push(filter_type as Byte);
            filtered.extend_from_slice(residuals);
            prior[..row.len()].copy_from_slice(row);
        }
        Ok(filtered)
    }

    /// The filter type of each row is read from its first byte, whatever
    /// predictor value the parameters name.
    fn defilter(&self, bytes: impl Into<Vec<Byte>> + AsRef<[Byte]>) -> FilterResult<Vec<Byte>> {
        let bytes = bytes.as_ref();
        let row_len = self.parms.bytes_per_row();
        let bytes_per_pixel = self.parms.bytes_per_pixel();

        let mut defiltered = Vec::with_capacity(bytes.len() / (row_len + 1) * row_len + row_len);
        let mut prior = vec![0; row_len];
        for (index, encoded) in bytes.chunks(row_len + 1).enumerate() {
            let filter_type = FilterType::try_from(encoded[0])
                .map_err(|_| PngErrorCode::FilterType(encoded[0], index))?;
            let residuals = &encoded[1..];
            let start = defiltered.len();
            for (position, &residual) in residuals.iter().enumerate() {
                let left = position
                    .checked_sub(bytes_per_pixel)
                    .map(|left| defiltered[start + left])
                    .unwrap_or(0);
                let up = prior[position];
                let up_left = position
                    .checked_sub(bytes_per_pixel)
                    .map(|left| prior[left])
                    .unwrap_or(0);
                defiltered.push(residual.wrapping_add(filter_type.predict(left, up, up_left)));
            }
            prior[..residuals.len()].copy_from_slice(&defiltered[start..]);
        }
        Ok(defiltered)
    }
}

/// REFERENCE: [Table 10 — Predictor values. p42]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(in crate::process::filter) enum PngAlgorithm {
    Fixed(FilterType),
    Optimum,
}

/// REFERENCE: [[https://www.w3.org/TR/PNG-Filters.html] 6. Filter
/// Algorithms]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub(in crate::process::filter) enum FilterType {
    None = 0,
    Sub = 1,
    Up = 2,
    Average = 3,
    Paeth = 4,
}

mod process {
    use super::*;

    impl FilterType {
        pub(super) const ALL: [Self; 5] = [Self::None, Self::Sub, Self::Up, Self::Average, Self::Paeth];

        pub(super) fn predict(&self, left: Byte, up: Byte, up_left: Byte) -> Byte {
            match self {
                Self::None => 0,
                Self::Sub => left,
                Self::Up => up,
                Self::Average => ((u16::from(left) + u16::from(up)) / 2) as Byte,
                Self::Paeth => paeth(left, up, up_left),
            }
        }

        pub(super) fn residuals(
            &self,
            row: &[Byte],
            prior: &[Byte],
            bytes_per_pixel: usize,
            residuals: &mut [Byte],
        ) {
            for (position, (&byte, residual)) in row.iter().zip(residuals.iter_mut()).enumerate() {
                let left_position = position.checked_sub(bytes_per_pixel);
                let left = left_position.map(|left| row[left]).unwrap_or(0);
                let up_left = left_position.map(|left| prior[left]).unwrap_or(0);
                *residual = byte.wrapping_sub(self.predict(left, prior[position], up_left));
            }
        }
    }

    /// REFERENCE: [[https://www.w3.org/TR/PNG-Filters.html] 6.6. Filter type
    /// 4: Paeth]
    fn paeth(left: Byte, up: Byte, up_left: Byte) -> Byte {
        let (a, b, c) = (i16::from(left), i16::from(up), i16::from(up_left));
        let p = a + b - c;
        let (pa, pb, pc) = ((p - a).abs(), (p - b).abs(), (p - c).abs());
        if pa <= pb && pa <= pc {
            left
        } else if pb <= pc {
            up
        } else {
            up_left
        }
    }
}

mod convert {
    use super::*;

    impl Png {
        pub(in crate::process::filter::predictor) fn new(
            algorithm: PngAlgorithm,
            parms: PredictorParms,
        ) -> Self {
            Self { algorithm, parms }
        }
    }

    impl PngAlgorithm {
        /// Predictor values 10 to 14 fix the filter type, 15 lets the
        /// encoder choose it per row.
        pub(in crate::process::filter::predictor) fn from_predictor(predictor: i64) -> Self {
            match predictor {
                11 => Self::Fixed(FilterType::Sub),
                12 => Self::Fixed(FilterType::Up),
                13 => Self::Fixed(FilterType::Average),
                14 => Self::Fixed(FilterType::Paeth),
                15 => Self::Optimum,
                _ => Self::Fixed(FilterType::None),
            }
        }
    }

    impl TryFrom<Byte> for FilterType {
        type Error = Byte;

        fn try_from(value: Byte) -> Result<Self, Self::Error> {
            FilterType::ALL
                .into_iter()
                .find(|&filter_type| filter_type as Byte == value)
                .ok_or(value)
        }
    }
}

pub(in crate::process::filter) mod error {
    use ::thiserror::Error;

    use crate::Byte;

    #[derive(Debug, Error, PartialEq, Clone, Copy)]
    pub enum PngErrorCode {
        #[error("Unknown filter type {0} in row {1}")]
        FilterType(Byte, usize),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_err_eq;

    fn png(predictor: i64, parms: PredictorParms) -> Png {
        Png::new(PngAlgorithm::from_predictor(predictor), parms)
    }

    #[test]
    fn png_valid() {
        let parms = PredictorParms::with(8, 1, 3);
        let data = b"abcabdabe".to_vec();

        let filtered = png(12, parms).filter(data.as_slice()).unwrap();
        assert_eq!(filtered, b"\x02abc\x02\x00\x00\x01\x02\x00\x00\x01");
        assert_eq!(png(12, parms).defilter(filtered).unwrap(), data);

        let filtered = png(11, parms).filter(data.as_slice()).unwrap();
        assert_eq!(filtered, b"\x01a\x01\x01\x01a\x01\x02\x01a\x01\x03");

        for predictor in 10..=15 {
            let filtered = png(predictor, parms).filter(data.as_slice()).unwrap();
            // Decoding follows the per-row type whatever the predictor value
            assert_eq!(png(10, parms).defilter(filtered).unwrap(), data, "{}", predictor);
        }

        // Several bytes per pixel and a partial final row
        let parms = PredictorParms::with(8, 3, 2);
        let data: Vec<Byte> = (0..15).map(|byte| byte * 17).collect();
        for predictor in 10..=15 {
            let filtered = png(predictor, parms).filter(data.as_slice()).unwrap();
            assert_eq!(png(15, parms).defilter(filtered).unwrap(), data, "{}", predictor);
        }
    }

    #[test]
    fn png_optimum() {
        let parms = PredictorParms::with(8, 1, 4);
        // A constant row is best encoded with Sub, a repeated row with Up
        let filtered = png(15, parms).filter(b"\x05\x05\x05\x05\x05\x05\x05\x05").unwrap();
        assert_eq!(filtered[0], FilterType::Sub as Byte);
        assert_eq!(filtered[5], FilterType::Up as Byte);
    }

    #[test]
    fn png_invalid() {
        let parms = PredictorParms::with(8, 1, 2);
        assert_err_eq!(
            png(10, parms).defilter(b"\x00ab\x07cd"),
            PngErrorCode::FilterType(7, 1)
        );
    }
}
