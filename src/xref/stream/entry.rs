use ::log::warn;

use crate::parse::num::bytes_to_u64;
use crate::parse::num::write_be;
use crate::xref::error::XRefErr;
use crate::xref::error::XRefResult;
use crate::xref::XRefEntry;
use crate::Byte;
use crate::GenerationNumber;
use crate::IndexNumber;
use crate::ObjectNumber;
use crate::Offset;

/// REFERENCE:
/// - [7.5.8.3 Cross-reference stream data, p67]
/// - [Table 18 — Entries in a cross-reference stream, p67-68]
#[derive(Debug, PartialEq, Clone, Copy)]
pub(crate) enum Entry {
    Free(ObjectNumber, GenerationNumber),
    InUse(Offset, GenerationNumber),
    Compressed(ObjectNumber, IndexNumber),
    /// Types other than 0, 1 and 2 shall be interpreted as a reference to
    /// the null object.
    Unknown(u64, u64, u64),
}

impl Entry {
    /// REFERENCE: [7.5.8.3 Cross-reference stream data, p67]
    ///
    /// Fields are big-endian. A type field of width 0 defaults to 1, and so
    /// does a missing generation number.
    pub(crate) fn from_fields(fields: [&[Byte]; 3]) -> XRefResult<Self> {
        let [field1, field2, field3] = fields;
        let value = |field: &[Byte]| bytes_to_u64(field).ok_or(XRefErr::FieldWidth(field.len()));
        let entry_type = if field1.is_empty() { 1 } else { value(field1)? };
        let value2 = value(field2)?;
        let value3 = value(field3)?;
        let generation_number = || {
            GenerationNumber::try_from(value3)
                .map_err(|_| XRefErr::FieldValue("generation number", value3))
        };
        let entry = match entry_type {
            0 => {
                let next_free = ObjectNumber::try_from(value2).unwrap_or_else(|_| {
                    warn!("Next free object number {} out of range. Using 0", value2);
                    0
                });
                Self::Free(next_free, generation_number()?)
            }
            1 => {
                let offset = Offset::try_from(value2)
                    .map_err(|_| XRefErr::FieldValue("offset", value2))?;
                Self::InUse(offset, generation_number()?)
            }
            2 => {
                let stream = ObjectNumber::try_from(value2)
                    .map_err(|_| XRefErr::FieldValue("object stream number", value2))?;
                let index = IndexNumber::try_from(value3)
                    .map_err(|_| XRefErr::FieldValue("index", value3))?;
                Self::Compressed(stream, index)
            }
            _ => Self::Unknown(entry_type, value2, value3),
        };
        Ok(entry)
    }

    /// The three field values, type first.
    pub(crate) fn fields(&self) -> [u64; 3] {
        match *self {
            Self::Free(next_free, generation_number) => {
                [0, u64::from(next_free), u64::from(generation_number)]
            }
            Self::InUse(offset, generation_number) => {
                [1, offset as u64, u64::from(generation_number)]
            }
            Self::Compressed(stream, index) => [2, u64::from(stream), u64::from(index)],
            Self::Unknown(entry_type, value2, value3) => [entry_type, value2, value3],
        }
    }

    pub(crate) fn write_to(&self, widths: [usize; 3], out: &mut Vec<Byte>) {
        for (value, width) in self.fields().into_iter().zip(widths) {
            write_be(value, width, out);
        }
    }
}

mod convert {
    use super::*;

    impl From<XRefEntry> for Entry {
        fn from(entry: XRefEntry) -> Self {
            match entry {
                XRefEntry::Free {
                    next_free,
                    generation_number,
                } => Self::Free(next_free, generation_number),
                XRefEntry::InUse {
                    offset,
                    generation_number,
                } => Self::InUse(offset, generation_number),
                XRefEntry::Compressed { stream, index } => Self::Compressed(stream, index),
            }
        }
    }

    impl TryFrom<Entry> for XRefEntry {
        type Error = Entry;

        fn try_from(entry: Entry) -> Result<Self, Self::Error> {
            match entry {
                Entry::Free(next_free, generation_number) => Ok(XRefEntry::Free {
                    next_free,
                    generation_number,
                }),
                Entry::InUse(offset, generation_number) => Ok(XRefEntry::InUse {
                    offset,
                    generation_number,
                }),
                Entry::Compressed(stream, index) => Ok(XRefEntry::Compressed { stream, index }),
                Entry::Unknown(..) => Err(entry),
            }
        }
    }
}
