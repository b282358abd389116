use ::log::warn;
use ::weezl::decode::Decoder;
use ::weezl::encode::Encoder;
use ::weezl::BitOrder;

use self::error::LzwErrorCode;
use super::predictor::Predictor;
use super::Filter;
use crate::config::ParseOptions;
use crate::process::filter::error::FilterResult;
use crate::Byte;

const KEY_EARLY_CHANGE: &str = "EarlyChange";
const MIN_CODE_SIZE: u8 = 8;

/// REFERENCE: [7.4.4 LZWDecode and FlateDecode filters, p38] and [[Adobe TIFF
/// Revision 6.0; Final (TIFF)] 7.4.4.2 "Details of LZW encoding"]
/// The LZW (Lempel-Ziv-Welch) adaptive compression filter.
#[derive(Debug, PartialEq, Clone, Copy)]
pub(crate) struct Lzw {
    predictor: Predictor,
    /// Whether the code width grows one code early, as TIFF encoders do.
    early_change: bool,
    strict: bool,
}

impl Filter for Lzw {
    /// REFERENCE: [7.4.4.2 Details of LZW encoding, p38-40]
    fn filter(&self, bytes: impl Into<Vec<Byte>> + AsRef<[Byte]>) -> FilterResult<Vec<Byte>> {
        let bytes = self.predictor.filter(bytes)?;
        let mut encoder = if self.early_change {
            Encoder::with_tiff_size_switch(BitOrder::Msb, MIN_CODE_SIZE)
        } else {
            Encoder::new(BitOrder::Msb, MIN_CODE_SIZE)
        };
        let filtered = encoder
            .encode(&bytes)
            .map_err(|err| LzwErrorCode::Filter(err.to_string()))?;
        Ok(filtered)
    }

    /// A missing EOD code ends the data. Corrupt codes fail in strict mode
    /// and cut the output short otherwise.
    fn defilter(&self, bytes: impl Into<Vec<Byte>> + AsRef<[Byte]>) -> FilterResult<Vec<Byte>> {
        let mut decoder = if self.early_change {
            Decoder::with_tiff_size_switch(BitOrder::Msb, MIN_CODE_SIZE)
        } else {
            Decoder::new(BitOrder::Msb, MIN_CODE_SIZE)
        };
        let mut defiltered = Vec::new();
        let result = decoder.into_vec(&mut defiltered).decode(bytes.as_ref());
        if let Err(err) = result.status {
            if self.strict {
                return Err(LzwErrorCode::Defilter(err.to_string()).into());
            }
            warn!(
                "{}. Keeping the {} bytes decoded before it",
                LzwErrorCode::Defilter(err.to_string()),
                defiltered.len()
            );
        }
        self.predictor.defilter(defiltered)
    }
}

mod convert {
    use super::*;
    use crate::object::direct::dictionary::Dictionary;
    use crate::process::filter::error::FilterErr;
    use crate::process::filter::error::FilterErrorCode;

    impl Lzw {
        pub(in crate::process::filter) fn new(
            decode_parms: Option<&Dictionary>,
            options: ParseOptions,
        ) -> FilterResult<Self> {
            let (predictor, early_change) = match decode_parms {
                Some(decode_parms) => {
                    let early_change = match decode_parms.get_i64(KEY_EARLY_CHANGE)? {
                        None | Some(1) => true,
                        Some(0) => false,
                        Some(value) => {
                            return Err(FilterErr::new(
                                stringify!(Lzw),
                                FilterErrorCode::UnsupportedParameter(KEY_EARLY_CHANGE, value),
                            ))
                        }
                    };
                    (Predictor::new(decode_parms)?, early_change)
                }
                None => (Predictor::None, true),
            };
            Ok(Self {
                predictor,
                early_change,
                strict: options.is_strict(),
            })
        }
    }
}

pub(in crate::process::filter) mod error {
    use ::thiserror::Error;

    #[derive(Debug, Error, PartialEq, Clone)]
    pub enum LzwErrorCode {
        #[error("Filtering: {0}")]
        Filter(String),
        #[error("Defiltering: {0}")]
        Defilter(String),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::direct::dictionary::Dictionary;
    use crate::process::filter::error::FilterErr;

    #[test]
    fn lzw_valid() {
        let lzw = Lzw::new(None, ParseOptions::strict()).unwrap();
        // REFERENCE: [7.4.4.2 Details of LZW encoding, p39]
        let filtered = b"\x80\x0B\x60\x50\x22\x0C\x0C\x85\x01";
        let expected = b"\x2D\x2D\x2D\x2D\x2D\x41\x2D\x2D\x2D\x42";
        assert_eq!(lzw.defilter(filtered).unwrap(), expected);

        let data: Vec<Byte> = (0..5000u32).map(|value| (value * 7 % 251) as Byte).collect();
        let filtered = lzw.filter(data.as_slice()).unwrap();
        assert_eq!(lzw.defilter(filtered).unwrap(), data);

        let mut parms = Dictionary::default();
        parms.insert(KEY_EARLY_CHANGE, 0);
        let lzw = Lzw::new(Some(&parms), ParseOptions::strict()).unwrap();
        let filtered = lzw.filter(data.as_slice()).unwrap();
        assert_eq!(lzw.defilter(filtered).unwrap(), data);
    }

    #[test]
    fn lzw_invalid() {
        let mut parms = Dictionary::default();
        parms.insert(KEY_EARLY_CHANGE, 2);
        assert!(matches!(
            Lzw::new(Some(&parms), ParseOptions::strict()),
            Err(FilterErr { .. })
        ));

        // A code beyond the table
        let corrupt = b"\x80\x0B\x60\x50\x22\x0C\x0C\xFF\xFF\xFF";
        let strict = Lzw::new(None, ParseOptions::strict()).unwrap();
        assert!(strict.defilter(corrupt).is_err());
        let lenient = Lzw::new(None, ParseOptions::lenient()).unwrap();
        let partial = lenient.defilter(corrupt).unwrap();
        assert!(partial.starts_with(b"\x2D\x2D\x2D\x2D\x2D\x41"));
    }
}
