pub(in crate::process::filter) mod png;
pub(in crate::process::filter) mod tiff;

use self::png::Png;
use self::png::PngAlgorithm;
use self::tiff::Tiff;
use super::Filter;
use crate::object::direct::dictionary::Dictionary;
use crate::process::filter::error::FilterErr;
use crate::process::filter::error::FilterErrorCode;
use crate::process::filter::error::FilterResult;
use crate::Byte;
use crate::DECODED_LIMIT;

const KEY_PREDICTOR: &str = "Predictor";
const KEY_BITS_PER_COMPONENT: &str = "BitsPerComponent";
const KEY_COLORS: &str = "Colors";
const KEY_COLUMNS: &str = "Columns";

/// REFERENCE: [Table 8 — Optional parameters for LZWDecode and FlateDecode
/// filters, p40] and [Table 10 — Predictor values. p42]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum Predictor {
    #[default]
    None,
    Tiff(Tiff),
    Png(Png),
}

impl Filter for Predictor {
    fn filter(&self, bytes: impl Into<Vec<Byte>> + AsRef<[Byte]>) -> FilterResult<Vec<Byte>> {
        match self {
            Self::None => Ok(bytes.into()),
            Self::Tiff(tiff) => tiff.filter(bytes),
            Self::Png(png) => png.filter(bytes),
        }
    }

    fn defilter(&self, bytes: impl Into<Vec<Byte>> + AsRef<[Byte]>) -> FilterResult<Vec<Byte>> {
        match self {
            Self::None => Ok(bytes.into()),
            Self::Tiff(tiff) => tiff.defilter(bytes),
            Self::Png(png) => png.defilter(bytes),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PredictorParms {
    bits_per_component: usize,
    colors: usize,
    columns: usize,
}

impl Default for PredictorParms {
    fn default() -> Self {
        Self {
            bits_per_component: 8,
            colors: 1,
            columns: 1,
        }
    }
}

impl PredictorParms {
    pub(crate) fn bits_per_component(&self) -> usize {
        self.bits_per_component
    }

    pub(crate) fn colors(&self) -> usize {
        self.colors
    }

    pub(crate) fn columns(&self) -> usize {
        self.columns
    }

    /// Rounded up to whole bytes, and at least one.
    pub(crate) fn bytes_per_pixel(&self) -> usize {
        ((self.bits_per_component * self.colors + 7) / 8).max(1)
    }

    /// REFERENCE: [7.4.4.4 LZW and Flate predictor functions, p42]
    /// Each row is padded to a whole number of bytes.
    pub(crate) fn bytes_per_row(&self) -> usize {
        (self.bits_per_component * self.colors * self.columns + 7) / 8
    }
}

mod convert {
    use super::*;

    impl Predictor {
        pub(in crate::process::filter) fn new(decode_parms: &Dictionary) -> FilterResult<Self> {
            let predictor = decode_parms
                .get_i64(KEY_PREDICTOR)?
                .unwrap_or(1);
            match predictor {
                1 => Ok(Self::None),
                2 => Ok(Self::Tiff(Tiff::new(PredictorParms::new(decode_parms)?))),
                10..=15 => Ok(Self::Png(Png::new(
                    PngAlgorithm::from_predictor(predictor),
                    PredictorParms::new(decode_parms)?,
                ))),
                _ => Err(FilterErr::new(
                    stringify!(Predictor),
                    FilterErrorCode::UnsupportedParameter(KEY_PREDICTOR, predictor),
                )),
            }
        }
    }

    impl PredictorParms {
        pub(in crate::process::filter) fn new(decode_parms: &Dictionary) -> FilterResult<Self> {
            let default = Self::default();
            let bits_per_component =
                parameter(decode_parms, KEY_BITS_PER_COMPONENT, default.bits_per_component, |value| {
                    matches!(value, 1 | 2 | 4 | 8 | 16)
                })?;
            let colors = parameter(decode_parms, KEY_COLORS, default.colors, |value| value >= 1)?;
            let columns =
                parameter(decode_parms, KEY_COLUMNS, default.columns, |value| value >= 1)?;
            // A row must fit in memory before any data is seen
            let row_bits = bits_per_component
                .checked_mul(colors)
                .and_then(|bits| bits.checked_mul(columns))
                .filter(|bits| bits / 8 < DECODED_LIMIT);
            if row_bits.is_none() {
                return Err(FilterErr::new(
                    stringify!(PredictorParms),
                    FilterErrorCode::UnsupportedParameter(
                        KEY_COLUMNS,
                        i64::try_from(columns).unwrap_or(i64::MAX),
                    ),
                ));
            }
            Ok(Self {
                bits_per_component,
                colors,
                columns,
            })
        }
    }

    fn parameter(
        decode_parms: &Dictionary,
        key: &'static str,
        default: usize,
        valid: impl Fn(i64) -> bool,
    ) -> FilterResult<usize> {
        let value = match decode_parms.get_i64(key)? {
            Some(value) => value,
            None => return Ok(default),
        };
        if !valid(value) {
            return Err(FilterErr::new(
                stringify!(PredictorParms),
                FilterErrorCode::UnsupportedParameter(key, value),
            ));
        }
        usize::try_from(value).map_err(|_| {
            FilterErr::new(
                stringify!(PredictorParms),
                FilterErrorCode::UnsupportedParameter(key, value),
            )
        })
    }

    #[cfg(test)]
    impl PredictorParms {
        pub(in crate::process::filter) fn with(
            bits_per_component: usize,
            colors: usize,
            columns: usize,
        ) -> Self {
            Self {
                bits_per_component,
                colors,
                columns,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_err_eq;

    #[test]
    fn predictor_new() {
        let mut parms = Dictionary::default();
        assert_eq!(Predictor::new(&parms), Ok(Predictor::None));

        parms.insert(KEY_PREDICTOR, 2);
        parms.insert(KEY_COLORS, 3);
        assert_eq!(
            Predictor::new(&parms),
            Ok(Predictor::Tiff(Tiff::new(PredictorParms::with(8, 3, 1))))
        );

        parms.insert(KEY_PREDICTOR, 7);
        assert_err_eq!(
            Predictor::new(&parms),
            FilterErr::new(
                stringify!(Predictor),
                FilterErrorCode::UnsupportedParameter(KEY_PREDICTOR, 7)
            )
        );

        parms.insert(KEY_PREDICTOR, 12);
        parms.insert(KEY_BITS_PER_COMPONENT, 3);
        assert_err_eq!(
            Predictor::new(&parms),
            FilterErr::new(
                stringify!(PredictorParms),
                FilterErrorCode::UnsupportedParameter(KEY_BITS_PER_COMPONENT, 3)
            )
        );

        parms.insert(KEY_BITS_PER_COMPONENT, 4);
        parms.insert(KEY_COLUMNS, 0);
        assert_err_eq!(
            Predictor::new(&parms),
            FilterErr::new(
                stringify!(PredictorParms),
                FilterErrorCode::UnsupportedParameter(KEY_COLUMNS, 0)
            )
        );

        parms.insert(KEY_COLUMNS, crate::object::direct::name::Name::from("Two"));
        assert_err_eq!(
            Predictor::new(&parms),
            FilterErr::new(
                stringify!(DecodeParms),
                FilterErrorCode::ValueType(KEY_COLUMNS, "/Two".to_string())
            )
        );
    }

    #[test]
    fn predictor_oversized_row() {
        let mut parms = Dictionary::default();
        parms.insert(KEY_PREDICTOR, 12);
        parms.insert(KEY_BITS_PER_COMPONENT, 16);
        parms.insert(KEY_COLORS, 4);
        parms.insert(KEY_COLUMNS, 1i64 << 60);
        assert_err_eq!(
            Predictor::new(&parms),
            FilterErr::new(
                stringify!(PredictorParms),
                FilterErrorCode::UnsupportedParameter(KEY_COLUMNS, 1 << 60)
            )
        );

        // No overflow, but a single row would exceed the decoded limit
        parms.insert(KEY_BITS_PER_COMPONENT, 8);
        parms.insert(KEY_COLORS, 1);
        parms.insert(KEY_COLUMNS, 1i64 << 31);
        assert_err_eq!(
            Predictor::new(&parms),
            FilterErr::new(
                stringify!(PredictorParms),
                FilterErrorCode::UnsupportedParameter(KEY_COLUMNS, 1 << 31)
            )
        );

        parms.insert(KEY_COLUMNS, 1i64 << 20);
        assert!(Predictor::new(&parms).is_ok());
    }

    #[test]
    fn predictor_parms_sizes() {
        let parms = PredictorParms::with(4, 3, 5);
        assert_eq!(parms.bytes_per_pixel(), 2);
        assert_eq!(parms.bytes_per_row(), 8);
        let parms = PredictorParms::with(1, 1, 10);
        assert_eq!(parms.bytes_per_pixel(), 1);
        assert_eq!(parms.bytes_per_row(), 2);
        let parms = PredictorParms::with(16, 3, 2);
        assert_eq!(parms.bytes_per_pixel(), 6);
        assert_eq!(parms.bytes_per_row(), 12);
    }
}
