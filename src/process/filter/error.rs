use ::thiserror::Error;

use super::ascii_85::error::A85ErrorCode;
use super::ascii_hex::error::AHxErrorCode;
use super::flate::error::FlErrorCode;
use super::lzw::error::LzwErrorCode;
use super::predictor::png::error::PngErrorCode;
use super::predictor::tiff::error::TiffErrorCode;
use super::run_length::error::RLErrorCode;
use crate::object::direct::dictionary::error::DataTypeError;

pub type FilterResult<T> = Result<T, FilterErr>;

#[derive(Debug, Error, PartialEq, Clone)]
#[error("{object}. Error: {code}")]
pub struct FilterErr {
    pub(crate) object: &'static str,
    pub(crate) code: FilterErrorCode,
}

#[derive(Debug, Error, PartialEq, Clone)]
pub enum FilterErrorCode {
    #[error("Mismatching number of filters {0} and decode parameters {1}")]
    Mismatch(usize, usize),
    #[error("Unsupported. Found: {0}")]
    Unsupported(String),
    #[error("Unsupported parameter {0}. Found: {1}")]
    UnsupportedParameter(&'static str, i64),
    #[error("Wrong value type for {0}. Found: {1}")]
    ValueType(&'static str, String),
    #[error("Decoded data exceeds the limit of {0} bytes")]
    Limit(usize),
    #[error("External codec {0}: {1}")]
    External(String, String),
    //
    #[error("Tiff: {0}")]
    Tiff(TiffErrorCode),
    #[error("Png: {0}")]
    Png(PngErrorCode),
    #[error("ASCII85: {0}")]
    A85(A85ErrorCode),
    #[error("ASCIIHex: {0}")]
    AHx(AHxErrorCode),
    #[error("LZW: {0}")]
    Lzw(LzwErrorCode),
    #[error("Flate: {0}")]
    Fl(FlErrorCode),
    #[error("RunLength: {0}")]
    RL(RLErrorCode),
}

mod convert {
    use super::*;

    impl FilterErr {
        pub fn new(object: &'static str, code: FilterErrorCode) -> Self {
            Self { object, code }
        }

        pub fn code(&self) -> &FilterErrorCode {
            &self.code
        }
    }

    impl From<DataTypeError> for FilterErr {
        fn from(err: DataTypeError) -> Self {
            Self::new(
                stringify!(DecodeParms),
                FilterErrorCode::ValueType(err.entry, err.value),
            )
        }
    }

    macro_rules! filter_err_from {
        ($from:ty, $object:ident) => {
            impl From<$from> for FilterErr {
                fn from(code: $from) -> Self {
                    Self::new(stringify!($object), FilterErrorCode::$object(code))
                }
            }
        };
    }

    filter_err_from!(TiffErrorCode, Tiff);
    filter_err_from!(PngErrorCode, Png);
    filter_err_from!(A85ErrorCode, A85);
    filter_err_from!(AHxErrorCode, AHx);
    filter_err_from!(LzwErrorCode, Lzw);
    filter_err_from!(FlErrorCode, Fl);
    filter_err_from!(RLErrorCode, RL);
}
