use ::nom::branch::alt;
use ::nom::bytes::complete::tag;
use ::nom::character::complete::char;
use ::nom::character::complete::digit1;
use ::nom::sequence::separated_pair;
use ::nom::sequence::terminated;
use ::nom::Err as NomErr;
use ::std::fmt::Display;
use ::std::fmt::Formatter;
use ::std::fmt::Result as FmtResult;

use crate::parse::character_set::white_space;
use crate::parse::error::ParseErr;
use crate::parse::error::ParseErrorCode;
use crate::parse::error::ParseFailure;
use crate::parse::error::ParseResult;
use crate::parse::num::ascii_to_u16;
use crate::parse::num::ascii_to_u32;
use crate::parse::num::ascii_to_usize;
use crate::parse::offset_of;
use crate::parse::Parser;
use crate::parse_failure;
use crate::xref::XRefEntry;
use crate::Byte;
use crate::GenerationNumber;
use crate::ObjectNumber;
use crate::Offset;

/// REFERENCE: [7.5.4 Cross-reference table, p56-57]
pub(super) const BIG_LEN: usize = 10;
/// REFERENCE: [7.5.4 Cross-reference table, p56-57]
pub(super) const SMALL_LEN: usize = 5;

#[derive(Debug, PartialEq, Clone, Copy)]
pub(crate) enum Entry {
    Free(ObjectNumber, GenerationNumber),
    InUse(Offset, GenerationNumber),
}

impl Display for Entry {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        // The trailing space is essential to ensure the entry is exactly 20
        // bytes, with `writeln!` appending a line feed on all platforms
        match self {
            Self::InUse(offset, generation_number) => writeln!(
                f,
                "{:0BIG_LEN$} {:0SMALL_LEN$} n ",
                offset, generation_number
            ),
            Self::Free(next_free, generation_number) => writeln!(
                f,
                "{:0BIG_LEN$} {:0SMALL_LEN$} f ",
                next_free, generation_number
            ),
        }
    }
}

impl Parser for Entry {
    fn parse(buffer: &[Byte], offset: Offset) -> ParseResult<(Offset, Self)> {
        let remains = buffer.get(offset..).unwrap_or_default();
        // HACK Records are meant to be exactly 20 bytes long, but some
        // producers use a single EOL byte or pad the fields differently
        let (remains, ((num_64, num_16), entry_type)) = terminated(
            separated_pair(
                separated_pair(digit1, char(' '), digit1),
                char(' '),
                alt((tag(b"f"), tag(b"n"))),
            ),
            white_space,
        )(remains)
        .map_err(parse_failure!(
            e,
            ParseFailure::new(
                offset_of(buffer, e.input),
                stringify!(Entry),
                ParseErrorCode::from_nom(e.input, e.code),
            )
        ))?;
        let failure = |field: &[Byte], code| -> ParseErr {
            ParseFailure::new(offset_of(buffer, field), stringify!(Entry), code).into()
        };
        let generation_number =
            ascii_to_u16(num_16).ok_or_else(|| failure(num_16, ParseErrorCode::GenerationNumber))?;
        let entry = if entry_type == b"f" {
            let next_free =
                ascii_to_u32(num_64).ok_or_else(|| failure(num_64, ParseErrorCode::NextFree))?;
            Self::Free(next_free, generation_number)
        } else {
            let offset =
                ascii_to_usize(num_64).ok_or_else(|| failure(num_64, ParseErrorCode::Offset))?;
            Self::InUse(offset, generation_number)
        };
        Ok((offset_of(buffer, remains), entry))
    }
}

mod convert {
    use super::*;

    impl From<Entry> for XRefEntry {
        fn from(entry: Entry) -> Self {
            match entry {
                Entry::Free(next_free, generation_number) => XRefEntry::Free {
                    next_free,
                    generation_number,
                },
                Entry::InUse(offset, generation_number) => XRefEntry::InUse {
                    offset,
                    generation_number,
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use ::nom::error::ErrorKind;

    use super::*;
    use crate::assert_err_eq;
    use crate::parse_assert_eq;

    #[test]
    fn entry_valid() {
        parse_assert_eq!(Entry, b"0000000000 65535 f\r\n", Entry::Free(0, 65535), 20);
        parse_assert_eq!(Entry, b"0000025325 00000 n \n", Entry::InUse(25325, 0), 20);
        // Single EOL byte
        parse_assert_eq!(Entry, b"0000000017 00002 n\n", Entry::InUse(17, 2), 19);
        assert_eq!(Entry::InUse(17, 2).to_string(), "0000000017 00002 n \n");
        assert_eq!(Entry::Free(3, 1).to_string().len(), 20);
    }

    #[test]
    fn entry_invalid() {
        assert_err_eq!(
            Entry::parse(b"0000000000 65535 r\r\n", 0),
            ParseFailure::new(
                17,
                stringify!(Entry),
                ParseErrorCode::NotFound(Some(ErrorKind::Tag))
            )
        );
        assert_err_eq!(
            Entry::parse(b"0000000000 65536 f\r\n", 0),
            ParseFailure::new(11, stringify!(Entry), ParseErrorCode::GenerationNumber)
        );
        // Truncated
        assert_err_eq!(
            Entry::parse(b"0000000000 65535 f", 0),
            ParseFailure::new(18, stringify!(Entry), ParseErrorCode::UnexpectedEof)
        );
    }
}
