pub(crate) mod entry;

use ::log::warn;

use self::entry::Entry;
use super::error::XRefErr;
use super::error::XRefResult;
use super::trailer::Trailer;
use super::trailer::KEY_INDEX;
use super::trailer::KEY_TYPE;
use super::trailer::KEY_W;
use super::trailer::VAL_XREF;
use super::XRefEntry;
use super::XRefTable;
use crate::config::ParseOptions;
use crate::object::direct::array::Array;
use crate::object::direct::dictionary::error::MissingEntryError;
use crate::object::direct::dictionary::Dictionary;
use crate::object::direct::name::Name;
use crate::object::indirect::stream::Stream;
use crate::object::indirect::stream::KEY_FILTER;
use crate::object::Object;
use crate::parse::num::bytes_needed;
use crate::process::filter::error::FilterResult;
use crate::process::filter::flate::FLATE_DECODE;
use crate::process::filter::registry::FilterRegistry;
use crate::ObjectNumber;

/// Fields wider than this cannot be held in a `u64`.
const MAX_FIELD_WIDTH: usize = 8;

/// REFERENCE: [7.5.8 Cross-reference streams, p65-66]
#[derive(Debug, PartialEq, Clone)]
pub(crate) struct XRefStream {
    pub(crate) table: XRefTable,
    pub(crate) trailer: Trailer,
}

impl XRefStream {
    /// REFERENCE: [7.5.8.2 Cross-reference stream dictionary, p66-67]
    pub(crate) fn from_stream(
        stream: &Stream,
        registry: &FilterRegistry,
        options: ParseOptions,
    ) -> XRefResult<Self> {
        let dictionary = stream.dictionary();
        match dictionary.get_name(KEY_TYPE)? {
            Some(name) if *name == VAL_XREF => {}
            value => {
                let value = value.map(Name::to_string).unwrap_or_default();
                if options.is_strict() {
                    return Err(XRefErr::WrongValue {
                        key: KEY_TYPE,
                        expected: VAL_XREF,
                        value,
                    });
                }
                warn!("Cross-reference stream with /{} {:?}", KEY_TYPE, value);
            }
        }
        let trailer = Trailer::try_from(dictionary)?;
        let widths = Self::widths(dictionary)?;
        let index = Self::index(dictionary, trailer.size())?;

        let decoded = stream.decode(registry, options)?;
        let entry_len: usize = widths.iter().sum();
        if entry_len == 0 {
            return Err(XRefErr::EntriesDecodedLength(widths, decoded.len()));
        }
        if decoded.len() % entry_len != 0 {
            if options.is_strict() {
                return Err(XRefErr::EntriesDecodedLength(widths, decoded.len()));
            }
            warn!(
                "Cross-reference stream of {} bytes is not a multiple of the entry length {}. \
                 Ignoring the last {} bytes",
                decoded.len(),
                entry_len,
                decoded.len() % entry_len
            );
        }
        let expected: usize = index.iter().map(|&(_, count)| count as usize).sum();
        let found = decoded.len() / entry_len;
        if found < expected {
            if options.is_strict() {
                return Err(XRefErr::EntriesTooShort(expected, found));
            }
            warn!(
                "Cross-reference stream has {} entries instead of {}",
                found, expected
            );
        }

        let mut records = decoded.chunks_exact(entry_len);
        let mut table = XRefTable::default();
        'subsections: for (first_object_number, count) in index {
            for position in 0..count {
                let Some(record) = records.next() else {
                    break 'subsections;
                };
                let object_number =
                    ObjectNumber::try_from(first_object_number.saturating_add(position)).map_err(
                        |_| XRefErr::ObjectNumberOverflow(first_object_number, position),
                    )?;
                let (field1, remains) = record.split_at(widths[0]);
                let (field2, field3) = remains.split_at(widths[1]);
                let entry = Entry::from_fields([field1, field2, field3])?;
                let entry = match XRefEntry::try_from(entry) {
                    Ok(entry) => entry,
                    Err(entry) => {
                        warn!(
                            "Object {}: unknown cross-reference stream entry {:?}, read as a \
                             reference to null",
                            object_number, entry
                        );
                        continue;
                    }
                };
                if table.contains(object_number) {
                    if options.is_strict() {
                        return Err(XRefErr::DuplicateObjectNumber(object_number));
                    }
                    warn!(
                        "Duplicate object number {} in a cross-reference stream. The first \
                         entry is kept",
                        object_number
                    );
                    continue;
                }
                table.insert(object_number, entry);
            }
        }
        Ok(Self { table, trailer })
    }

    fn widths(dictionary: &Dictionary) -> XRefResult<[usize; 3]> {
        let w = dictionary.get_array(KEY_W)?.ok_or(MissingEntryError {
            key: KEY_W,
            data_type: stringify!(Array),
        })?;
        let wrong_value = || XRefErr::WrongValue {
            key: KEY_W,
            expected: "an array of three non-negative integers",
            value: w.to_string(),
        };
        let widths: Vec<usize> = w
            .iter()
            .map(|width| width.as_usize().ok_or_else(wrong_value))
            .collect::<XRefResult<_>>()?;
        let widths: [usize; 3] = widths.try_into().map_err(|_| wrong_value())?;
        if let Some(&width) = widths.iter().find(|&&width| width > MAX_FIELD_WIDTH) {
            return Err(XRefErr::FieldWidth(width));
        }
        Ok(widths)
    }

    /// Pairs of first object number and entry count, `[0 Size]` by default.
    fn index(dictionary: &Dictionary, size: usize) -> XRefResult<Vec<(u64, u64)>> {
        let index = match dictionary.get_array(KEY_INDEX)? {
            Some(index) => index,
            None => return Ok(vec![(0, size as u64)]),
        };
        let wrong_value = || XRefErr::WrongValue {
            key: KEY_INDEX,
            expected: "pairs of non-negative integers",
            value: index.to_string(),
        };
        if index.len() % 2 != 0 {
            return Err(wrong_value());
        }
        index
            .chunks_exact(2)
            .map(|pair| match (pair[0].as_u64(), pair[1].as_u64()) {
                (Some(first), Some(count)) => Ok((first, count)),
                _ => Err(wrong_value()),
            })
            .collect()
    }

    /// A `/FlateDecode` stream holding the entries of `table` and the
    /// fields of `trailer`.
    pub(crate) fn to_stream(
        &self,
        registry: &FilterRegistry,
        options: ParseOptions,
        compression: u32,
    ) -> FilterResult<Stream> {
        let entries: Vec<(ObjectNumber, Entry)> = self
            .table
            .iter()
            .map(|(&object_number, &entry)| (object_number, Entry::from(entry)))
            .collect();

        let mut max_fields = [0u64; 3];
        for (_, entry) in &entries {
            for (max, value) in max_fields.iter_mut().zip(entry.fields()) {
                *max = (*max).max(value);
            }
        }
        let widths = [
            bytes_needed(max_fields[0]),
            bytes_needed(max_fields[1]),
            bytes_needed(max_fields[2]),
        ];

        let mut data = Vec::with_capacity(entries.len() * widths.iter().sum::<usize>());
        let mut index: Vec<(ObjectNumber, u64)> = Vec::new();
        for (object_number, entry) in &entries {
            match index.last_mut() {
                Some((first, count)) if u64::from(*first) + *count == u64::from(*object_number) => {
                    *count += 1
                }
                _ => index.push((*object_number, 1)),
            }
            entry.write_to(widths, &mut data);
        }

        let mut dictionary = Dictionary::default();
        dictionary.insert(KEY_TYPE, Name::from(VAL_XREF));
        for (key, value) in self.trailer.to_dictionary() {
            dictionary.insert(key, value);
        }
        if index != [(0, self.trailer.size() as u64)] {
            let index: Array = index
                .into_iter()
                .flat_map(|(first, count)| [Object::from(first), Object::from(count as usize)])
                .collect();
            dictionary.insert(KEY_INDEX, index);
        }
        let widths: Array = widths.into_iter().map(Object::from).collect();
        dictionary.insert(KEY_W, widths);
        dictionary.insert(KEY_FILTER, Name::from(FLATE_DECODE));
        Stream::from_decoded(dictionary, data).to_encoded(registry, options, compression)
    }
}

mod convert {
    use super::*;

    impl XRefStream {
        pub(crate) fn new(table: XRefTable, trailer: Trailer) -> Self {
            Self { table, trailer }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_err_eq;
    use crate::object::indirect::reference::Reference;
    use crate::object::indirect::stream::KEY_LENGTH;
    use crate::xref::trailer::KEY_SIZE;
    use crate::Byte;

    fn dictionary(w: [i64; 3], index: Option<Vec<i64>>, size: i64) -> Dictionary {
        let mut dictionary = Dictionary::default();
        dictionary.insert(KEY_TYPE, Name::from(VAL_XREF));
        dictionary.insert(KEY_SIZE, size);
        dictionary.insert(
            KEY_W,
            w.into_iter().map(Object::from).collect::<Array>(),
        );
        if let Some(index) = index {
            dictionary.insert(
                KEY_INDEX,
                index.into_iter().map(Object::from).collect::<Array>(),
            );
        }
        dictionary
    }

    fn from_stream(stream: &Stream, options: ParseOptions) -> XRefResult<XRefStream> {
        XRefStream::from_stream(stream, &FilterRegistry::default(), options)
    }

    #[test]
    fn xref_stream_valid() {
        let data: Vec<Byte> = vec![
            0, 0, 0, 0xFF, //
            1, 0, 15, 0, //
            2, 0, 5, 1, //
        ];
        let stream = Stream::new(dictionary([1, 2, 1], None, 3), data.clone());
        let xref_stream = from_stream(&stream, ParseOptions::strict()).unwrap();
        assert_eq!(xref_stream.trailer.size(), 3);
        assert_eq!(
            xref_stream.table.get(0),
            Some(&XRefEntry::Free {
                next_free: 0,
                generation_number: 255
            })
        );
        assert_eq!(
            xref_stream.table.get(1),
            Some(&XRefEntry::InUse {
                offset: 15,
                generation_number: 0
            })
        );
        assert_eq!(
            xref_stream.table.get(2),
            Some(&XRefEntry::Compressed {
                stream: 5,
                index: 1
            })
        );

        // Subsections from /Index
        let stream = Stream::new(dictionary([1, 2, 1], Some(vec![0, 1, 7, 2]), 9), data);
        let xref_stream = from_stream(&stream, ParseOptions::strict()).unwrap();
        assert_eq!(xref_stream.table.len(), 3);
        assert!(xref_stream.table.contains(7));
        assert!(xref_stream.table.contains(8));
        assert!(!xref_stream.table.contains(1));

        // Type field of width 0
        let stream = Stream::new(dictionary([0, 1, 0], None, 2), vec![9, 27]);
        let xref_stream = from_stream(&stream, ParseOptions::strict()).unwrap();
        assert_eq!(
            xref_stream.table.get(1),
            Some(&XRefEntry::InUse {
                offset: 27,
                generation_number: 0
            })
        );
    }

    #[test]
    fn xref_stream_invalid() {
        // Remainder bytes
        let stream = Stream::new(dictionary([1, 1, 1], None, 1), vec![1, 9, 0, 0]);
        assert_err_eq!(
            from_stream(&stream, ParseOptions::strict()),
            XRefErr::EntriesDecodedLength([1, 1, 1], 4)
        );
        let xref_stream = from_stream(&stream, ParseOptions::lenient()).unwrap();
        assert_eq!(xref_stream.table.len(), 1);

        // Fewer entries than /Size
        let stream = Stream::new(dictionary([1, 1, 1], None, 3), vec![1, 9, 0]);
        assert_err_eq!(
            from_stream(&stream, ParseOptions::strict()),
            XRefErr::EntriesTooShort(3, 1)
        );
        let xref_stream = from_stream(&stream, ParseOptions::lenient()).unwrap();
        assert_eq!(xref_stream.table.len(), 1);

        // Field too wide
        let stream = Stream::new(dictionary([1, 9, 1], None, 1), vec![0; 11]);
        assert_err_eq!(from_stream(&stream, ParseOptions::lenient()), XRefErr::FieldWidth(9));

        // Missing /W
        let mut dictionary = dictionary([1, 1, 1], None, 1);
        dictionary.remove(KEY_W);
        let stream = Stream::new(dictionary, vec![1, 9, 0]);
        assert_err_eq!(
            from_stream(&stream, ParseOptions::lenient()),
            XRefErr::Dictionary(
                MissingEntryError {
                    key: KEY_W,
                    data_type: stringify!(Array)
                }
                .into()
            )
        );

        // Wrong /Type
        let mut dictionary = Dictionary::default();
        dictionary.insert(KEY_TYPE, Name::from("ObjStm"));
        dictionary.insert(KEY_SIZE, 1);
        dictionary.insert(KEY_W, vec![Object::from(1), 1.into(), 1.into()]);
        let stream = Stream::new(dictionary, vec![1, 9, 0]);
        assert_err_eq!(
            from_stream(&stream, ParseOptions::strict()),
            XRefErr::WrongValue {
                key: KEY_TYPE,
                expected: VAL_XREF,
                value: "/ObjStm".to_string(),
            }
        );
        assert!(from_stream(&stream, ParseOptions::lenient()).is_ok());
    }

    #[test]
    fn xref_stream_to_stream() {
        let mut table = XRefTable::default();
        table.insert(
            0,
            XRefEntry::Free {
                next_free: 0,
                generation_number: 65535,
            },
        );
        table.insert(
            1,
            XRefEntry::InUse {
                offset: 70000,
                generation_number: 0,
            },
        );
        table.insert(4, XRefEntry::Compressed { stream: 1, index: 0 });
        let trailer = Trailer::new(5).set_root(Reference::new(1, 0)).set_prev(9);
        let xref_stream = XRefStream::new(table, trailer);

        let registry = FilterRegistry::default();
        let stream = xref_stream
            .to_stream(&registry, ParseOptions::strict(), 6)
            .unwrap();
        let dictionary = stream.dictionary();
        assert_eq!(
            dictionary.get(KEY_W),
            Some(&Object::from(vec![
                Object::from(1),
                Object::from(3),
                Object::from(2)
            ]))
        );
        assert_eq!(
            dictionary.get(KEY_INDEX),
            Some(&Object::from(vec![
                Object::from(0),
                Object::from(2),
                Object::from(4),
                Object::from(1)
            ]))
        );
        assert!(dictionary.contains_key(KEY_LENGTH));

        let parsed = from_stream(&stream, ParseOptions::strict()).unwrap();
        assert_eq!(parsed, xref_stream);
    }
}
