use ::nom::bytes::complete::tag;
use ::nom::bytes::complete::take;
use ::nom::sequence::preceded;
use ::nom::error::Error as NomError;
use ::nom::Err as NomErr;
use ::std::fmt::Display;
use ::std::fmt::Formatter;
use ::std::fmt::Result as FmtResult;

use crate::fmt::debug_bytes;
use crate::object::direct::name::Name;
use crate::parse::error::ParseErr;
use crate::parse::error::ParseErrorCode;
use crate::parse::error::ParseFailure;
use crate::parse::error::ParseResult;
use crate::parse::find;
use crate::parse::offset_of;
use crate::parse::Parser;
use crate::parse::MARKER_PDF;
use crate::parse_failure;
use crate::Byte;
use crate::Offset;

/// How far from the start of the file the header is looked for.
pub(crate) const HEADER_SEARCH_SIZE: usize = 1024;

/// REFERENCE: [7.5.2 File header, p54-55]
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Default)]
pub enum Version {
    V1_0,
    V1_1,
    V1_2,
    V1_3,
    V1_4,
    V1_5,
    V1_6,
    #[default]
    V1_7,
    V2_0,
}

impl Display for Version {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let version = match self {
            Version::V1_0 => "1.0",
            Version::V1_1 => "1.1",
            Version::V1_2 => "1.2",
            Version::V1_3 => "1.3",
            Version::V1_4 => "1.4",
            Version::V1_5 => "1.5",
            Version::V1_6 => "1.6",
            Version::V1_7 => "1.7",
            Version::V2_0 => "2.0",
        };
        write!(f, "{}", version)
    }
}

impl Parser for Version {
    fn parse(buffer: &[Byte], offset: Offset) -> ParseResult<(Offset, Self)> {
        let remains = buffer.get(offset..).unwrap_or_default();
        let (remains, version) = preceded(
            tag::<_, _, NomError<&[Byte]>>(MARKER_PDF),
            take(3usize),
        )(remains).map_err(
            parse_failure!(
                e,
                ParseFailure::new(
                    offset_of(buffer, e.input),
                    stringify!(Version),
                    ParseErrorCode::from_nom(e.input, e.code),
                )
            ),
        )?;
        let version = Self::from_bytes(version).ok_or_else(|| {
            ParseFailure::new(
                offset_of(buffer, version),
                stringify!(Version),
                ParseErrorCode::UnsupportedVersion(debug_bytes(version)),
            )
        })?;
        Ok((offset_of(buffer, remains), version))
    }
}

impl Version {
    /// The version declared by the header found in `head`, the start of a
    /// file.
    pub(crate) fn locate(head: &[Byte]) -> ParseResult<Self> {
        // HACK Some producers write bytes before the header
        let position = find(head, 0, MARKER_PDF.as_bytes()).ok_or_else(|| -> ParseErr {
            ParseFailure::new(
                0,
                stringify!(Version),
                ParseErrorCode::MissingKeyword(MARKER_PDF),
            )
            .into()
        })?;
        Self::parse(head, position).map(|(_, version)| version)
    }

    fn from_bytes(bytes: &[Byte]) -> Option<Self> {
        let version = match bytes {
            b"1.0" => Version::V1_0,
            b"1.1" => Version::V1_1,
            b"1.2" => Version::V1_2,
            b"1.3" => Version::V1_3,
            b"1.4" => Version::V1_4,
            b"1.5" => Version::V1_5,
            b"1.6" => Version::V1_6,
            b"1.7" => Version::V1_7,
            b"2.0" => Version::V2_0,
            _ => return None,
        };
        Some(version)
    }

    /// REFERENCE: [Table 29 — Entries in the catalog dictionary, p85]
    /// The `/Version` entry of the catalog overrides the header if later.
    pub(crate) fn from_name(name: &Name) -> Option<Self> {
        Self::from_bytes(name.as_bytes())
    }

    pub(crate) fn to_name(self) -> Name {
        Name::from(self.to_string().as_str())
    }

    /// REFERENCE: [7.5.2 File header, p55]
    /// The comment line of four bytes above 127 flags the file as binary.
    pub(crate) fn write_header(self, out: &mut Vec<Byte>) {
        out.extend_from_slice(MARKER_PDF.as_bytes());
        out.extend_from_slice(self.to_string().as_bytes());
        out.extend_from_slice(b"\n%\xE2\xE3\xCF\xD3\n");
    }
}
