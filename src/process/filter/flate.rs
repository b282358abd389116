use ::flate2::read::DeflateDecoder;
use ::flate2::read::ZlibDecoder;
use ::flate2::write::ZlibEncoder;
use ::flate2::Compression;
use ::log::warn;
use ::std::io::Read;
use ::std::io::Write;

use self::error::FlErrorCode;
use super::predictor::Predictor;
use super::Filter;
use crate::config::ParseOptions;
use crate::process::filter::error::FilterResult;
use crate::Byte;

pub(crate) const FLATE_DECODE: &str = "FlateDecode";
pub(crate) const DEFAULT_LEVEL: u32 = 6;
const MAX_LEVEL: u32 = 9;

/// REFERENCE: [7.4.4 LZWDecode and FlateDecode filters, p38]
/// zlib/deflate compression filter.
#[derive(Debug, PartialEq, Clone, Copy)]
pub(crate) struct Fl {
    predictor: Predictor,
    level: u32,
    limit: usize,
    strict: bool,
}

impl Filter for Fl {
    fn filter(&self, bytes: impl Into<Vec<Byte>> + AsRef<[Byte]>) -> FilterResult<Vec<Byte>> {
        let bytes = self.predictor.filter(bytes)?;
        let mut encoder = ZlibEncoder::new(
            Vec::with_capacity(bytes.len() / 2),
            Compression::new(self.level),
        );
        encoder
            .write_all(&bytes)
            .map_err(|err| FlErrorCode::Filter(err.to_string()))?;
        let filtered = encoder
            .finish()
            .map_err(|err| FlErrorCode::Filter(err.to_string()))?;
        Ok(filtered)
    }

    /// Output is read up to one byte past the decoded limit so that the
    /// pipeline can report the overflow without inflating the whole stream.
    ///
    /// In lenient mode, a corrupt stream keeps what was inflated before the
    /// error, and a stream without a zlib header is read as raw deflate.
    fn defilter(&self, bytes: impl Into<Vec<Byte>> + AsRef<[Byte]>) -> FilterResult<Vec<Byte>> {
        let bytes = bytes.as_ref();
        let bound = self.limit as u64 + 1;

        let mut defiltered = Vec::new();
        let result = ZlibDecoder::new(bytes)
            .take(bound)
            .read_to_end(&mut defiltered);
        if let Err(err) = result {
            let err = FlErrorCode::Defilter(err.to_string());
            if self.strict {
                return Err(err.into());
            }
            if defiltered.is_empty() {
                let mut raw = Vec::new();
                DeflateDecoder::new(bytes)
                    .take(bound)
                    .read_to_end(&mut raw)
                    .map_err(|_| err.clone())?;
                warn!("{}. Decoded as raw deflate data", err);
                defiltered = raw;
            } else {
                warn!(
                    "{}. Keeping the {} bytes decoded before it",
                    err,
                    defiltered.len()
                );
            }
        }

        self.predictor.defilter(defiltered)
    }
}

impl Fl {
    /// Compression level used when encoding, from 0 (none) to 9 (best).
    pub(crate) fn set_level(&mut self, level: u32) {
        self.level = level.min(MAX_LEVEL);
    }
}

mod convert {
    use super::*;
    use crate::object::direct::dictionary::Dictionary;

    impl Fl {
        pub(in crate::process::filter) fn new(
            decode_parms: Option<&Dictionary>,
            options: ParseOptions,
        ) -> FilterResult<Self> {
            let predictor = decode_parms
                .map(Predictor::new)
                .transpose()?
                .unwrap_or_default();
            Ok(Self {
                predictor,
                level: DEFAULT_LEVEL,
                limit: options.decoded_limit(),
                strict: options.is_strict(),
            })
        }
    }
}

pub(in crate::process::filter) mod error {
    use ::thiserror::Error;

    #[derive(Debug, Error, PartialEq, Clone)]
    pub enum FlErrorCode {
        #[error("Filtering: {0}")]
        Filter(String),
        #[error("Defiltering: {0}")]
        Defilter(String),
    }
}
