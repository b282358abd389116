pub(crate) mod entry;
pub(crate) mod subsection;

use ::log::warn;
use ::nom::bytes::complete::tag;
use ::nom::combinator::opt;
use ::nom::sequence::pair;
use ::nom::sequence::preceded;
use ::nom::Err as NomErr;
use ::std::fmt::Display;
use ::std::fmt::Formatter;
use ::std::fmt::Result as FmtResult;

use self::entry::Entry;
use self::subsection::Subsection;
use super::error::XRefErr;
use super::error::XRefResult;
use super::trailer::Trailer;
use super::XRefEntry;
use super::XRefTable;
use crate::config::ParseOptions;
use crate::object::Object;
use crate::parse::character_set::eol;
use crate::parse::character_set::keyword;
use crate::parse::character_set::white_space;
use crate::parse::error::ParseErr;
use crate::parse::error::ParseErrorCode;
use crate::parse::error::ParseFailure;
use crate::parse::error::ParseRecoverable;
use crate::parse::error::ParseResult;
use crate::parse::object::ObjectParser;
use crate::parse::offset_of;
use crate::parse::Parser;
use crate::parse::KW_TRAILER;
use crate::parse::KW_XREF;
use crate::Byte;
use crate::ObjectNumber;
use crate::Offset;

/// REFERENCE: [7.5.4 Cross-reference table, p57]
#[derive(Debug, PartialEq, Clone)]
pub(crate) struct Section {
    pub(crate) subsections: Vec<Subsection>,
    pub(crate) trailer: Trailer,
}

impl Display for Section {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        writeln!(f, "{}", KW_XREF)?;
        for subsection in &self.subsections {
            write!(f, "{}", subsection)?;
        }
        writeln!(f, "{}", KW_TRAILER)?;
        writeln!(f, "{}", self.trailer)
    }
}

impl Section {
    /// REFERENCE: [7.5.4 Cross-reference table, p56]
    ///
    /// Returns a recoverable error when the buffer does not start with the
    /// `xref` keyword. `complete` tells whether the buffer reaches the end of
    /// the file.
    pub(crate) fn parse(
        buffer: &[Byte],
        offset: Offset,
        options: ParseOptions,
        complete: bool,
    ) -> ParseResult<(Offset, Self)> {
        let remains = buffer.get(offset..).unwrap_or_default();
        let (remains, _) = pair(keyword(KW_XREF), eol)(remains).map_err(|err| -> ParseErr {
            match err {
                NomErr::Incomplete(_) => unreachable!(
                    "::nom::complete functions do not return the Incomplete error variant."
                ),
                NomErr::Error(e) | NomErr::Failure(e) => ParseRecoverable::new(
                    offset_of(buffer, e.input),
                    stringify!(Section),
                    ParseErrorCode::from_nom(e.input, e.code),
                )
                .into(),
            }
        })?;
        // Here, we know that the buffer starts with a cross-reference section,
        // not a cross-reference stream, and the following errors should be
        // propagated as failures
        let mut offset = offset_of(buffer, remains);
        let mut subsections = Vec::new();
        while let Some(result) = Subsection::parse_suppress_recoverable::<Subsection>(buffer, offset)
        {
            let (next, subsection) = result?;
            offset = next;
            subsections.push(subsection);
        }
        // HACK Some producers write white space before the trailer keyword
        // that is not accounted for in the standard
        let remains = buffer.get(offset..).unwrap_or_default();
        let (remains, _) = preceded(opt(white_space), tag(KW_TRAILER))(remains).map_err(
            |err| -> ParseErr {
                match err {
                    NomErr::Incomplete(_) => unreachable!(
                        "::nom::complete functions do not return the Incomplete error variant."
                    ),
                    NomErr::Error(e) | NomErr::Failure(e) => {
                        let code = match ParseErrorCode::from_nom(e.input, e.code) {
                            ParseErrorCode::UnexpectedEof => ParseErrorCode::UnexpectedEof,
                            _ => ParseErrorCode::MissingKeyword(KW_TRAILER),
                        };
                        ParseFailure::new(offset_of(buffer, e.input), stringify!(Section), code)
                            .into()
                    }
                }
            },
        )?;
        // REFERENCE: [7.5.5 File trailer, p58-59]
        let trailer_offset = offset_of(buffer, remains);
        let mut parser = ObjectParser::new(buffer, options)
            .set_complete(complete)
            .at(trailer_offset);
        let trailer = match parser.parse_object()? {
            Object::Dictionary(dictionary) => dictionary,
            other => {
                return Err(ParseFailure::new(
                    trailer_offset,
                    stringify!(Section),
                    ParseErrorCode::InvalidTrailer(other.to_string()),
                )
                .into())
            }
        };
        let trailer = Trailer::try_from(&trailer).map_err(|err| {
            ParseFailure::new(
                trailer_offset,
                stringify!(Section),
                ParseErrorCode::InvalidTrailer(err.to_string()),
            )
        })?;
        Ok((
            parser.position(),
            Self {
                subsections,
                trailer,
            },
        ))
    }

    /// REFERENCE: [7.5.4 Cross-reference table, p56]
    pub(crate) fn to_table(&self) -> XRefResult<XRefTable> {
        let mut table = XRefTable::default();
        for (position, subsection) in self.subsections.iter().enumerate() {
            let mut first_object_number = u64::from(subsection.first_object_number);
            // HACK Some producers number the first subsection from 1 while
            // still listing the head of the free list
            if position == 0
                && first_object_number == 1
                && subsection.entries.first() == Some(&Entry::Free(0, 65535))
            {
                warn!("Cross-reference subsection numbered from 1 instead of 0");
                first_object_number = 0;
            }
            for (index, entry) in subsection.entries.iter().enumerate() {
                let object_number = first_object_number + index as u64;
                let object_number = ObjectNumber::try_from(object_number)
                    .map_err(|_| XRefErr::ObjectNumberOverflow(first_object_number, index as u64))?;
                // The object number should not appear in multiple
                // subsections within the same section
                if table.contains(object_number) {
                    warn!(
                        "Duplicate object number {} in a cross-reference section. The first \
                         entry is kept",
                        object_number
                    );
                    continue;
                }
                table.insert(object_number, XRefEntry::from(*entry));
            }
        }
        Ok(table)
    }

    /// Group `table` into subsections of consecutive object numbers.
    /// Compressed entries cannot be written in a section and are skipped.
    pub(crate) fn from_table(table: &XRefTable, trailer: Trailer) -> Self {
        let mut subsections: Vec<Subsection> = Vec::new();
        let mut next_object_number: Option<ObjectNumber> = None;
        for (&object_number, entry) in table.iter() {
            let entry = match *entry {
                XRefEntry::Free {
                    next_free,
                    generation_number,
                } => Entry::Free(next_free, generation_number),
                XRefEntry::InUse {
                    offset,
                    generation_number,
                } => Entry::InUse(offset, generation_number),
                XRefEntry::Compressed { .. } => continue,
            };
            match subsections.last_mut() {
                Some(subsection) if next_object_number == Some(object_number) => {
                    subsection.entries.push(entry)
                }
                _ => subsections.push(Subsection::new(object_number, [entry])),
            }
            next_object_number = object_number.checked_add(1);
        }
        Self {
            subsections,
            trailer,
        }
    }

    pub(crate) fn write_to(&self, out: &mut Vec<Byte>) {
        out.extend_from_slice(self.to_string().as_bytes());
    }
}
