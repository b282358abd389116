use ::nom::bytes::complete::tag;
use ::nom::character::complete::digit1;
use ::nom::combinator::opt;
use ::nom::sequence::pair;
use ::nom::sequence::preceded;
use ::nom::Err as NomErr;
use ::std::fmt::Display;
use ::std::fmt::Formatter;
use ::std::fmt::Result as FmtResult;
use ::std::ops::Deref;

use crate::parse::character_set::keyword;
use crate::parse::character_set::white_space;
use crate::parse::error::ParseErr;
use crate::parse::error::ParseErrorCode;
use crate::parse::error::ParseFailure;
use crate::parse::error::ParseResult;
use crate::parse::num::ascii_to_usize;
use crate::parse::offset_of;
use crate::parse::rfind;
use crate::parse::Parser;
use crate::parse::EOF;
use crate::parse::KW_STARTXREF;
use crate::parse_failure;
use crate::Byte;
use crate::Offset;

/// How far from the end of the file the `startxref` keyword is looked for.
/// The standard puts it in the last three lines, but some producers append
/// garbage after `%%EOF`.
pub(crate) const STARTXREF_SEARCH_SIZE: usize = 1024;

/// REFERENCE: [7.5.5 File trailer, p58]
#[derive(Debug, PartialEq, Clone, Copy)]
pub(crate) struct StartXRef {
    offset: Offset,
}

impl Display for StartXRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        writeln!(f, "{}\n{}\n{}", KW_STARTXREF, self.offset, EOF)
    }
}

impl Parser for StartXRef {
    fn parse(buffer: &[Byte], offset: Offset) -> ParseResult<(Offset, Self)> {
        let remains = buffer.get(offset..).unwrap_or_default();
        // HACK The %%EOF marker is missing in some files, and some others
        // have a space between the keyword and the EOL marker
        let (remains, start_xref_offset) = preceded(
            pair(keyword(KW_STARTXREF), white_space),
            digit1,
        )(remains)
        .map_err(parse_failure!(
            e,
            ParseFailure::new(
                offset_of(buffer, e.input),
                stringify!(StartXRef),
                ParseErrorCode::NotFound(Some(e.code)),
            )
        ))?;
        let (remains, _) = opt(preceded(opt(white_space), tag(EOF)))(remains).map_err(
            parse_failure!(
                e,
                ParseFailure::new(
                    offset_of(buffer, e.input),
                    stringify!(StartXRef),
                    ParseErrorCode::NotFound(Some(e.code)),
                )
            ),
        )?;
        let start_xref_offset = ascii_to_usize(start_xref_offset).ok_or_else(|| {
            ParseFailure::new(
                offset_of(buffer, start_xref_offset),
                stringify!(StartXRef),
                ParseErrorCode::Offset,
            )
        })?;
        Ok((
            offset_of(buffer, remains),
            Self {
                offset: start_xref_offset,
            },
        ))
    }
}

impl StartXRef {
    /// Parse the last `startxref` line of `tail`, the end of a file.
    pub(crate) fn locate(tail: &[Byte]) -> ParseResult<Self> {
        let position = rfind(tail, KW_STARTXREF.as_bytes()).ok_or_else(|| -> ParseErr {
            ParseFailure::new(
                tail.len(),
                stringify!(StartXRef),
                ParseErrorCode::MissingKeyword(KW_STARTXREF),
            )
            .into()
        })?;
        Self::parse(tail, position).map(|(_, start_xref)| start_xref)
    }
}

mod convert {
    use super::*;

    impl StartXRef {
        pub(crate) fn new(offset: Offset) -> Self {
            Self { offset }
        }
    }

    impl Deref for StartXRef {
        type Target = Offset;

        fn deref(&self) -> &Self::Target {
            &self.offset
        }
    }
}
