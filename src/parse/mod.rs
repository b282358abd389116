pub(crate) mod character_set;
pub(crate) mod error;
pub(crate) mod lexer;
pub(crate) mod num;
pub(crate) mod object;

use self::error::ParseErr;
use self::error::ParseResult;
use crate::Byte;
use crate::Offset;

pub(crate) const EOF: &str = "%%EOF";
pub(crate) const MARKER_PDF: &str = "%PDF-";
pub(crate) const KW_ENDOBJ: &str = "endobj";
pub(crate) const KW_ENDSTREAM: &str = "endstream";
pub(crate) const KW_FALSE: &str = "false";
pub(crate) const KW_NULL: &str = "null";
pub(crate) const KW_OBJ: &str = "obj";
pub(crate) const KW_R: &str = "R";
pub(crate) const KW_STARTXREF: &str = "startxref";
pub(crate) const KW_STREAM: &str = "stream";
pub(crate) const KW_TRAILER: &str = "trailer";
pub(crate) const KW_TRUE: &str = "true";
pub(crate) const KW_XREF: &str = "xref";

/// Parsers of the fixed-layout file structures: the cross-reference section
/// and its entries, and the `startxref` line.
pub(crate) trait Parser: Sized {
    /// Parse `Self` from `buffer` starting at `offset`, returning the offset
    /// just past the parsed bytes.
    fn parse(buffer: &[Byte], offset: Offset) -> ParseResult<(Offset, Self)>;

    /// Try to parse the buffer and return an option:
    /// - Some(Ok(_)): if the buffer was parsed successfully
    /// - Some(Err(ParseErr::Failure(_))): if the parser failed with no possible
    /// recovery
    /// - None: if the parser returned another error, which could be recovered
    /// by another parser
    fn parse_suppress_recoverable<O>(
        buffer: &[Byte],
        offset: Offset,
    ) -> Option<ParseResult<(Offset, O)>>
    where
        O: From<Self>,
    {
        match Self::parse(buffer, offset) {
            Ok((offset, parsed)) => Some(Ok((offset, parsed.into()))),
            Err(ParseErr::Failure(err)) => Some(Err(ParseErr::Failure(err))),
            Err(ParseErr::Recoverable(_)) => None,
        }
    }
}

/// Offset within `buffer` of `remains`, a suffix of it.
pub(crate) fn offset_of(buffer: &[Byte], remains: &[Byte]) -> Offset {
    buffer.len() - remains.len()
}

/// Offset of the first occurrence of `pattern` in `buffer` at or after
/// `from`.
pub(crate) fn find(buffer: &[Byte], from: Offset, pattern: &[Byte]) -> Option<Offset> {
    buffer
        .get(from..)?
        .windows(pattern.len())
        .position(|window| window == pattern)
        .map(|position| from + position)
}

/// Offset of the last occurrence of `pattern` in `buffer`.
pub(crate) fn rfind(buffer: &[Byte], pattern: &[Byte]) -> Option<Offset> {
    buffer.windows(pattern.len()).rposition(|window| window == pattern)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[macro_export]
    macro_rules! parse_assert_eq {
        ($type:ty, $buffer:expr, $expected_parsed:expr, $expected_offset:expr $(,)?) => {
            assert_eq!(
                <$type as $crate::parse::Parser>::parse($buffer, 0).unwrap(),
                ($expected_offset, $expected_parsed)
            );
        };
    }

    #[test]
    fn find_valid() {
        assert_eq!(find(b"a endstream b endstream", 0, b"endstream"), Some(2));
        assert_eq!(find(b"a endstream b endstream", 3, b"endstream"), Some(14));
        assert_eq!(find(b"abc", 5, b"c"), None);
        assert_eq!(rfind(b"startxref 1 startxref 2", b"startxref"), Some(12));
        assert_eq!(rfind(b"", b"startxref"), None);
    }
}
