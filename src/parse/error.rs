use ::nom::error::ErrorKind;
use ::thiserror::Error;

use crate::Byte;
use crate::Offset;

pub type ParseResult<T> = Result<T, ParseErr>;
/// Recoverable parsing error
/// This error is used when the parser is unable to determine the value type
/// and the buffer needs to be reprocessed with a different parser
pub type ParseRecoverable = ParseError<true>;
/// Unrecoverable parsing error
/// This error is used when the parser is able to determine the value type
/// but fails to parse it completely
pub type ParseFailure = ParseError<false>;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ParseErr {
    #[error("Parse Recoverable: {0}")]
    Recoverable(ParseRecoverable),
    #[error("Parse Failure: {0}")]
    Failure(ParseFailure),
}

#[derive(Debug, Error, PartialEq, Clone)]
#[error("{object}. Offset: {offset}. Error: {code}")]
pub struct ParseError<const RECOVERABLE: bool> {
    offset: Offset,
    object: &'static str,
    code: ParseErrorCode,
}

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ParseErrorCode {
    // Whole buffer errors
    #[error("Buffer is too small")]
    TooSmallBuffer,
    #[error("Unexpected end of input")]
    UnexpectedEof,
    // Token errors
    #[error("Not found. Nom: {}", .0.as_ref().map(|kind| kind.description()).unwrap_or("-"))]
    NotFound(Option<ErrorKind>),
    #[error("Unexpected token: {0}")]
    UnexpectedToken(String),
    #[error("Unexpected byte: {}", char::from(*.0))]
    UnexpectedByte(Byte),
    #[error("Malformed number: {0}")]
    MalformedNumber(String),
    #[error("Invalid hexadecimal digit: {}", char::from(*.0))]
    InvalidHexDigit(Byte),
    #[error("Invalid escape sequence in name: {0}")]
    InvalidNameEscape(String),
    // Collection errors
    #[error("Dictionary key is not a name: {0}")]
    DictionaryKey(String),
    #[error("Missing value for key /{0}")]
    MissingValue(String),
    #[error("Missing keyword: {0}")]
    MissingKeyword(&'static str),
    // Stream errors
    #[error("Missing or invalid /Length")]
    MissingLength,
    #[error("Stream data does not match the declared /Length {0}")]
    Length(usize),
    #[error("Missing end-of-line marker after the stream keyword")]
    StreamEol,
    // Number errors
    #[error("Object number")]
    ObjectNumber,
    #[error("Generation number")]
    GenerationNumber,
    #[error("First object number")]
    FirstObjectNumber,
    #[error("Offset")]
    Offset,
    #[error("Next free object number")]
    NextFree,
    #[error("Entry type")]
    EntryType,
    #[error("Entry count")]
    EntryCount,
    #[error("Invalid trailer: {0}")]
    InvalidTrailer(String),
    #[error("Unsupported version: {0}")]
    UnsupportedVersion(String),
}

impl ParseErrorCode {
    /// Nom reports an error at the end of its input when it ran out of bytes
    /// rather than met an unexpected one.
    pub(crate) fn from_nom(remains: &[Byte], kind: ErrorKind) -> Self {
        if remains.is_empty() {
            Self::UnexpectedEof
        } else {
            Self::NotFound(Some(kind))
        }
    }
}

#[macro_export]
macro_rules! parse_failure {
    ($e:ident, $failure:expr) => {
        |err| match err {
            NomErr::Incomplete(_) => unreachable!(
                "::nom::complete functions do not return the Incomplete error variant."
            ),
            NomErr::Error($e) | NomErr::Failure($e) => ParseErr::Failure($failure.into()),
        }
    };
}

mod convert {
    use super::*;
    use crate::impl_from;

    impl_from!(ParseFailure, Failure, ParseErr);
    impl_from!(ParseRecoverable, Recoverable, ParseErr);

    impl<const RECOVERABLE: bool> ParseError<RECOVERABLE> {
        pub fn new(offset: Offset, object: &'static str, code: ParseErrorCode) -> Self {
            Self {
                offset,
                object,
                code,
            }
        }
    }

    impl ParseErr {
        pub fn offset(&self) -> Offset {
            match self {
                Self::Recoverable(err) => err.offset,
                Self::Failure(err) => err.offset,
            }
        }

        pub fn object(&self) -> &'static str {
            match self {
                Self::Recoverable(err) => err.object,
                Self::Failure(err) => err.object,
            }
        }

        pub fn code(&self) -> &ParseErrorCode {
            match self {
                Self::Recoverable(err) => &err.code,
                Self::Failure(err) => &err.code,
            }
        }

        pub fn is_failure(&self) -> bool {
            matches!(self, Self::Failure(_))
        }

        /// Whether parsing stopped because the input ended early, so that
        /// more bytes may let it succeed.
        pub fn is_truncated(&self) -> bool {
            matches!(self.code(), ParseErrorCode::UnexpectedEof)
        }

        /// Move the reported offset by `base`, for errors raised while
        /// parsing a window that starts at `base`.
        pub(crate) fn shift(mut self, base: Offset) -> Self {
            match &mut self {
                Self::Recoverable(err) => err.offset += base,
                Self::Failure(err) => err.offset += base,
            }
            self
        }

        /// Promote a recoverable error once no other parser applies.
        pub(crate) fn into_failure(self) -> Self {
            match self {
                Self::Recoverable(err) => {
                    Self::Failure(ParseFailure::new(err.offset, err.object, err.code))
                }
                failure => failure,
            }
        }
    }
}
