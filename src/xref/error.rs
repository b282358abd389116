use ::thiserror::Error;

use crate::object::direct::dictionary::error::DataTypeError;
use crate::object::direct::dictionary::error::DictionaryErr;
use crate::object::direct::dictionary::error::MissingEntryError;
use crate::objstm::error::ObjStmErr;
use crate::parse::error::ParseErr;
use crate::process::filter::error::FilterErr;
use crate::source::error::SourceErr;
use crate::ObjectNumber;
use crate::Offset;

pub type XRefResult<T> = Result<T, XRefErr>;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum XRefErr {
    #[error("No startxref keyword in the last {0} bytes")]
    StartXRefNotFound(usize),
    #[error("Offset {0} is past the end of the file of {1} bytes")]
    OffsetOutOfBounds(Offset, Offset),
    #[error("Neither a cross-reference section nor a stream at offset {0}")]
    NotFound(Offset),
    #[error("Object at offset {0} is not a cross-reference stream: {1}")]
    NotXRefStream(Offset, String),
    #[error("Object at offset {0} is not an object stream: {1}")]
    NotObjectStream(Offset, String),
    #[error("Duplicate object number: {0}")]
    DuplicateObjectNumber(ObjectNumber),
    #[error("Object number overflow. First: {0}. Index: {1}")]
    ObjectNumberOverflow(u64, u64),
    #[error("Field width {0} exceeds 8 bytes")]
    FieldWidth(usize),
    #[error("Field value {1} out of range for {0}")]
    FieldValue(&'static str, u64),
    #[error("Decoded data length {1}: Not a multiple of the sum of W values: {0:?}")]
    EntriesDecodedLength([usize; 3], usize),
    #[error("Entries too short. Expected {0} entries, found {1}")]
    EntriesTooShort(usize, usize),
    #[error("Wrong value for /{key}. Expected {expected}. Found: {value}")]
    WrongValue {
        key: &'static str,
        expected: &'static str,
        value: String,
    },
    #[error("Rebuild found no indirect objects")]
    RebuildNoObjects,
    #[error("Rebuild found neither a trailer nor a catalog")]
    RebuildNoRoot,
    //
    #[error("Source: {0}")]
    Source(#[from] SourceErr),
    #[error("Parse: {0}")]
    Parse(#[from] ParseErr),
    #[error("Filter: {0}")]
    Filter(#[from] FilterErr),
    #[error("Dictionary: {0}")]
    Dictionary(#[from] DictionaryErr),
    #[error("Object stream: {0}")]
    ObjectStream(#[from] ObjStmErr),
}

impl From<DataTypeError> for XRefErr {
    fn from(err: DataTypeError) -> Self {
        Self::Dictionary(err.into())
    }
}

impl From<MissingEntryError> for XRefErr {
    fn from(err: MissingEntryError) -> Self {
        Self::Dictionary(err.into())
    }
}
