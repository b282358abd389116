use ::log::debug;
use ::log::info;
use ::log::warn;

use super::error::XRefErr;
use super::error::XRefResult;
use super::trailer::Trailer;
use super::trailer::KEY_TYPE;
use super::trailer::VAL_XREF;
use super::XRefEntry;
use super::XRefTable;
use super::MAX_GENERATION_NUMBER;
use crate::config::ParseOptions;
use crate::object::indirect::id::Id;
use crate::object::indirect::reference::Reference;
use crate::object::Object;
use crate::objstm::ObjectStream;
use crate::objstm::VAL_OBJSTM;
use crate::parse::character_set::is_regular;
use crate::parse::character_set::is_white_space;
use crate::parse::find;
use crate::parse::num::ascii_to_u16;
use crate::parse::num::ascii_to_u32;
use crate::parse::object::ObjectParser;
use crate::parse::KW_OBJ;
use crate::parse::KW_TRAILER;
use crate::process::filter::registry::FilterRegistry;
use crate::source::ByteSource;
use crate::Byte;
use crate::IndexNumber;
use crate::ObjectNumber;
use crate::Offset;

const VAL_CATALOG: &str = "Catalog";

/// REFERENCE: [7.5.4 Cross-reference table, p55-57]
///
/// Reconstruct the cross-reference table of a damaged file by scanning it
/// for `N G obj` headers. Later definitions of an object replace earlier
/// ones, as they would in an incrementally updated file.
pub(crate) fn rebuild(
    source: &dyn ByteSource,
    registry: &FilterRegistry,
    options: ParseOptions,
) -> XRefResult<(XRefTable, Trailer)> {
    let buffer = source.read_all()?;
    let mut table = XRefTable::default();
    // Trailer dictionaries and cross-reference stream dictionaries, in file
    // order
    let mut trailers: Vec<(Offset, Trailer)> = Vec::new();
    let mut catalog: Option<Id> = None;
    let mut object_streams: Vec<(Offset, ObjectNumber)> = Vec::new();

    let mut position = 0;
    while let Some(found) = find(&buffer, position, KW_OBJ.as_bytes()) {
        position = found + KW_OBJ.len();
        if buffer.get(position).is_some_and(|&byte| is_regular(byte)) {
            continue;
        }
        let Some((offset, id)) = object_header_before(&buffer, found) else {
            continue;
        };
        if id.object_number() == 0 {
            continue;
        }
        debug!("Rebuild: object {} at offset {}", id, offset);
        table.insert(
            id.object_number(),
            XRefEntry::InUse {
                offset,
                generation_number: id.generation_number(),
            },
        );

        let object = ObjectParser::new(&buffer, options)
            .set_complete(true)
            .at(offset)
            .parse_indirect_object();
        let value = match object {
            Ok(object) => object.into_value(),
            Err(err) => {
                debug!("Rebuild: object {} does not parse: {}", id, err);
                continue;
            }
        };
        let r#type = value
            .as_dictionary()
            .and_then(|dictionary| dictionary.get(KEY_TYPE))
            .and_then(Object::as_name);
        match (r#type, &value) {
            (Some(name), Object::Stream(_)) if *name == VAL_OBJSTM => {
                object_streams.push((offset, id.object_number()))
            }
            (Some(name), Object::Stream(stream)) if *name == VAL_XREF => {
                match Trailer::try_from(stream.dictionary()) {
                    Ok(trailer) => trailers.push((offset, trailer)),
                    Err(err) => debug!("Rebuild: ignoring stream {}: {}", id, err),
                }
            }
            (Some(name), Object::Dictionary(_)) if *name == VAL_CATALOG => catalog = Some(id),
            _ => {}
        }
    }
    if table.is_empty() {
        return Err(XRefErr::RebuildNoObjects);
    }

    position = 0;
    while let Some(found) = find(&buffer, position, KW_TRAILER.as_bytes()) {
        position = found + KW_TRAILER.len();
        let dictionary = ObjectParser::new(&buffer, options)
            .set_complete(true)
            .at(position)
            .parse_object();
        if let Ok(Object::Dictionary(dictionary)) = dictionary {
            match Trailer::try_from(&dictionary) {
                Ok(trailer) => trailers.push((found, trailer)),
                Err(err) => debug!("Rebuild: ignoring trailer at offset {}: {}", found, err),
            }
        }
    }

    // Objects in object streams do not replace objects found directly
    for (offset, stream_number) in object_streams.into_iter().rev() {
        // Only the last definition of the stream object is in the table
        let current = matches!(
            table.get(stream_number),
            Some(XRefEntry::InUse { offset: current, .. }) if *current == offset
        );
        if !current {
            continue;
        }
        let object_stream = ObjectParser::new(&buffer, options)
            .set_complete(true)
            .at(offset)
            .parse_indirect_object()
            .map_err(XRefErr::from)
            .and_then(|object| match object.into_value() {
                Object::Stream(stream) => {
                    ObjectStream::decode(&stream, registry, options).map_err(XRefErr::from)
                }
                other => Err(XRefErr::NotObjectStream(offset, other.type_name().to_string())),
            });
        let object_stream = match object_stream {
            Ok(object_stream) => object_stream,
            Err(err) => {
                warn!("Rebuild: skipping object stream {}: {}", stream_number, err);
                continue;
            }
        };
        for (index, object_number) in object_stream.object_numbers().enumerate() {
            if object_number == 0 || table.contains(object_number) {
                continue;
            }
            table.insert(
                object_number,
                XRefEntry::Compressed {
                    stream: stream_number,
                    index: index as IndexNumber,
                },
            );
        }
    }

    trailers.sort_by_key(|(offset, _)| *offset);
    let mut trailer = match trailers.pop() {
        Some((_, mut newest)) => {
            for (_, older) in trailers.iter().rev() {
                newest.inherit(older);
            }
            newest
        }
        None => Trailer::default(),
    };
    if trailer.root().is_none() {
        let catalog = catalog.ok_or(XRefErr::RebuildNoRoot)?;
        warn!("Rebuild: using object {} as the catalog", catalog);
        trailer = trailer.set_root(Reference::new(
            catalog.object_number(),
            catalog.generation_number(),
        ));
    }
    table.insert(
        0,
        XRefEntry::Free {
            next_free: 0,
            generation_number: MAX_GENERATION_NUMBER,
        },
    );
    let size = table.max_object_number().map_or(1, |max| max as usize + 1);
    info!("Rebuilt a cross-reference table of {} entries", table.len());
    Ok((
        table,
        trailer.set_size(size).clear_prev().clear_xref_stm(),
    ))
}

/// The offset and identifier of the `N G` preceding the `obj` keyword at
/// `obj`, if any.
fn object_header_before(buffer: &[Byte], obj: Offset) -> Option<(Offset, Id)> {
    let head = buffer.get(..obj)?;
    let skip_white_space = |end: usize| -> Option<usize> {
        let start = head[..end]
            .iter()
            .rposition(|&byte| !is_white_space(byte))
            .map_or(0, |position| position + 1);
        (start < end).then_some(start)
    };
    let skip_digits = |end: usize| -> Option<usize> {
        let start = head[..end]
            .iter()
            .rposition(|byte| !byte.is_ascii_digit())
            .map_or(0, |position| position + 1);
        (start < end).then_some(start)
    };
    let generation_end = skip_white_space(obj)?;
    let generation_start = skip_digits(generation_end)?;
    let number_end = skip_white_space(generation_start)?;
    let number_start = skip_digits(number_end)?;
    if number_start > 0 && is_regular(head[number_start - 1]) {
        return None;
    }
    let object_number = ascii_to_u32(&head[number_start..number_end])?;
    let generation_number = ascii_to_u16(&head[generation_start..generation_end])?;
    Some((number_start, Id::new(object_number, generation_number)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_err_eq;
    use crate::objstm::ObjectStreamBuilder;
    use crate::source::MemorySource;

    fn rebuild_bytes(buffer: &[Byte]) -> XRefResult<(XRefTable, Trailer)> {
        let source = MemorySource::from(buffer.to_vec());
        rebuild(&source, &FilterRegistry::default(), ParseOptions::lenient())
    }

    #[test]
    fn header_before() {
        let buffer = b"%PDF-1.7\n12 3 obj";
        assert_eq!(object_header_before(buffer, 14), Some((9, Id::new(12, 3))));
        assert_eq!(object_header_before(b"x12 0 obj", 6), None);
        assert_eq!(object_header_before(b"endobj", 3), None);
        assert_eq!(object_header_before(b"1 obj", 2), None);
    }

    #[test]
    fn rebuild_later_definitions_win() {
        let buffer = b"%PDF-1.7\n\
            1 0 obj\n<</Type /Catalog /Pages 2 0 R>>\nendobj\n\
            2 0 obj\n<</Type /Pages /Kids [] /Count 0>>\nendobj\n\
            2 0 obj\n<</Type /Pages /Kids [] /Count 0 /Rotate 90>>\nendobj\n\
            xref garbage";
        let (table, trailer) = rebuild_bytes(buffer).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(
            table.get(2),
            Some(&XRefEntry::InUse {
                offset: 106,
                generation_number: 0
            })
        );
        // Synthesised from the catalog
        assert_eq!(trailer.root(), Some(Reference::new(1, 0)));
        assert_eq!(trailer.size(), 3);
        assert_eq!(trailer.prev(), None);
    }

    #[test]
    fn rebuild_with_object_stream() {
        let mut builder = ObjectStreamBuilder::default();
        builder.add(Id::new(3, 0), &Object::from(7)).unwrap();
        builder.add(Id::new(1, 0), &Object::Null).unwrap();
        let stream = builder
            .build(&FilterRegistry::default(), ParseOptions::lenient(), 6)
            .unwrap();
        let mut buffer = b"%PDF-1.7\n1 0 obj\n<</Type /Catalog>>\nendobj\n4 0 obj\n".to_vec();
        stream.write_to(&mut buffer);
        buffer.extend_from_slice(b"\nendobj\ntrailer\n<</Size 5 /Root 1 0 R /Prev 999>>\n");

        let (table, trailer) = rebuild_bytes(&buffer).unwrap();
        assert_eq!(
            table.get(3),
            Some(&XRefEntry::Compressed { stream: 4, index: 0 })
        );
        // Found directly, not replaced by the compressed copy
        assert_eq!(
            table.get(1),
            Some(&XRefEntry::InUse {
                offset: 9,
                generation_number: 0
            })
        );
        assert_eq!(trailer.root(), Some(Reference::new(1, 0)));
        assert_eq!(trailer.size(), 5);
        assert_eq!(trailer.prev(), None);
    }

    #[test]
    fn rebuild_failures() {
        assert_err_eq!(rebuild_bytes(b"%PDF-1.7\nno objects"), XRefErr::RebuildNoObjects);
        assert_err_eq!(
            rebuild_bytes(b"%PDF-1.7\n1 0 obj\n<</Type /Pages>>\nendobj\n"),
            XRefErr::RebuildNoRoot
        );
    }
}
