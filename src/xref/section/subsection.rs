use ::nom::character::complete::char;
use ::nom::character::complete::digit1;
use ::nom::sequence::separated_pair;
use ::nom::sequence::terminated;
use ::nom::Err as NomErr;
use ::std::fmt::Display;
use ::std::fmt::Formatter;
use ::std::fmt::Result as FmtResult;

use super::entry::Entry;
use crate::parse::character_set::eol;
use crate::parse::error::ParseErr;
use crate::parse::error::ParseErrorCode;
use crate::parse::error::ParseFailure;
use crate::parse::error::ParseRecoverable;
use crate::parse::error::ParseResult;
use crate::parse::num::ascii_to_u32;
use crate::parse::num::ascii_to_usize;
use crate::parse::offset_of;
use crate::parse::Parser;
use crate::Byte;
use crate::ObjectNumber;
use crate::Offset;

/// Shortest possible entry, with a single EOL byte.
const MIN_ENTRY_LEN: usize = 19;

#[derive(Debug, PartialEq, Default, Clone)]
pub(crate) struct Subsection {
    pub(crate) first_object_number: ObjectNumber,
    pub(crate) entries: Vec<Entry>,
}

impl Display for Subsection {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        writeln!(f, "{} {}", self.first_object_number, self.entries.len())?;
        for entry in &self.entries {
            write!(f, "{}", entry)?;
        }
        Ok(())
    }
}

impl Parser for Subsection {
    /// REFERENCE: [7.5.4 Cross-reference table, p56-57]
    fn parse(buffer: &[Byte], offset: Offset) -> ParseResult<(Offset, Self)> {
        let remains = buffer.get(offset..).unwrap_or_default();
        let (remains, (first_object_number, entry_count)) =
            terminated(separated_pair(digit1, char(' '), digit1), eol)(remains).map_err(
                |err| -> ParseErr {
                    match err {
                        NomErr::Incomplete(_) => unreachable!(
                            "::nom::complete functions do not return the Incomplete error variant."
                        ),
                        // The header may continue past the end of a partial
                        // buffer
                        NomErr::Error(e) | NomErr::Failure(e) if e.input.is_empty() => {
                            ParseFailure::new(
                                buffer.len(),
                                stringify!(Subsection),
                                ParseErrorCode::UnexpectedEof,
                            )
                            .into()
                        }
                        NomErr::Error(e) | NomErr::Failure(e) => ParseRecoverable::new(
                            offset_of(buffer, e.input),
                            stringify!(Subsection),
                            ParseErrorCode::NotFound(Some(e.code)),
                        )
                        .into(),
                    }
                },
            )?;
        // Here, we know that the buffer starts with a cross-reference
        // subsection, and the following errors should be propagated as
        // failures
        let first_object_number = ascii_to_u32(first_object_number).ok_or_else(|| {
            ParseFailure::new(
                offset_of(buffer, first_object_number),
                stringify!(Subsection),
                ParseErrorCode::FirstObjectNumber,
            )
        })?;
        let entry_count = ascii_to_usize(entry_count).ok_or_else(|| {
            ParseFailure::new(
                offset_of(buffer, entry_count),
                stringify!(Subsection),
                ParseErrorCode::EntryCount,
            )
        })?;

        let mut offset = offset_of(buffer, remains);
        // A corrupt count must not reserve more than the buffer can hold
        let mut entries =
            Vec::with_capacity(entry_count.min(remains.len() / MIN_ENTRY_LEN + 1));
        for _ in 0..entry_count {
            let (next, entry) = Entry::parse(buffer, offset)?;
            offset = next;
            entries.push(entry);
        }
        Ok((
            offset,
            Self {
                first_object_number,
                entries,
            },
        ))
    }
}

mod convert {
    use super::*;

    impl Subsection {
        pub(crate) fn new(first_object_number: ObjectNumber, entries: impl Into<Vec<Entry>>) -> Self {
            Self {
                first_object_number,
                entries: entries.into(),
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
    fn subsection_valid() {
        let buffer = b"0 3\r\n\
        0000000000 65535 f\r\n\
        0000000017 00000 n\r\n\
        0000000081 00000 n\r\n\
        trailer\r\n";
        let subsection = Subsection::new(
            0,
            [
                Entry::Free(0, 65535),
                Entry::InUse(17, 0),
                Entry::InUse(81, 0),
            ],
        );
        parse_assert_eq!(Subsection, buffer, subsection, 65);

        assert_eq!(
            Subsection::new(4, [Entry::InUse(100, 1)]).to_string(),
            "4 1\n0000000100 00001 n \n"
        );
    }

    #[test]
    fn subsection_invalid() {
        // Not found
        assert_err_eq!(
            Subsection::parse(b"0 1 R\r\n", 0),
            ParseRecoverable::new(
                4,
                stringify!(Subsection),
                ParseErrorCode::NotFound(Some(ErrorKind::Tag))
            )
        );
        assert_err_eq!(
            Subsection::parse(b"trailer", 0),
            ParseRecoverable::new(
                0,
                stringify!(Subsection),
                ParseErrorCode::NotFound(Some(ErrorKind::Digit))
            )
        );

        // Incomplete buffer
        let buffer = b"0 3\r\n\
        0000000000 65535 f\r\n\
        0000000100 00000 n\r\n";
        assert_err_eq!(
            Subsection::parse(buffer, 0),
            ParseFailure::new(45, stringify!(Entry), ParseErrorCode::UnexpectedEof)
        );
        assert_err_eq!(
            Subsection::parse(b"0 3", 0),
            ParseFailure::new(3, stringify!(Subsection), ParseErrorCode::UnexpectedEof)
        );

        // Missing generation number
        let buffer = b"0 2\r\n\
        0000000000 65535 f\r\n\
        0000000100 n\r\n";
        assert_err_eq!(
            Subsection::parse(buffer, 0),
            ParseFailure::new(
                36,
                stringify!(Entry),
                ParseErrorCode::NotFound(Some(ErrorKind::Digit))
            )
        );
    }
}
