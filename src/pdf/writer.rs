use ::log::debug;
use ::log::info;
use ::log::warn;
use ::std::collections::BTreeMap;
use ::std::io::Write;
use ::std::mem;
use ::std::sync::Arc;
use ::thiserror::Error;

use super::error::PdfErr;
use super::error::PdfResult;
use super::Document;
use super::KEY_VERSION;
use crate::config::WriteMode;
use crate::config::WriteOptions;
use crate::config::XRefFormat;
use crate::fmt::write_hex;
use crate::header::Version;
use crate::object::direct::dictionary::Dictionary;
use crate::object::direct::string::String_;
use crate::object::indirect::id::Id;
use crate::object::indirect::object::IndirectObject;
use crate::object::indirect::reference::Reference;
use crate::object::indirect::stream::Stream;
use crate::object::Object;
use crate::objstm::ObjectStreamBuilder;
use crate::objstm::VAL_OBJSTM;
use crate::parse::EOF;
use crate::parse::KW_STARTXREF;
use crate::process::filter::error::FilterErr;
use crate::source::error::SourceErr;
use crate::source::AppendedSource;
use crate::source::ByteSource;
use crate::source::MemorySource;
use crate::table::Location;
use crate::xref::section::Section;
use crate::xref::stream::XRefStream;
use crate::xref::trailer::Trailer;
use crate::xref::trailer::KEY_TYPE;
use crate::xref::trailer::VAL_XREF;
use crate::xref::XRefEntry;
use crate::xref::XRefTable;
use crate::xref::MAX_GENERATION_NUMBER;
use crate::Byte;
use crate::GenerationNumber;
use crate::ObjectNumber;
use crate::Offset;

/// REFERENCE: [Table 252 — Entries in a signature dictionary, p475]
const KEY_BYTE_RANGE: &str = "ByteRange";
const KEY_CONTENTS: &str = "Contents";
/// Room for four 20-digit integers, their separators and the brackets, so
/// that the final array never moves the bytes after it.
const BYTE_RANGE_WIDTH: usize = 4 * 20 + 5;
const COPY_CHUNK: usize = 1 << 20;

/// REFERENCE: [12.8.1 General, p468]
/// Offset and length of the bytes before the signature container, then
/// offset and length of the bytes after it.
pub type ByteRange = [usize; 4];

/// Room reserved in a signature dictionary for a container computed after
/// the rest of the file is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignaturePlaceholder {
    /// A signature dictionary written by this save, i.e. new or modified.
    pub reference: Reference,
    /// Maximum size of the container in bytes.
    pub capacity: usize,
}

/// An external signer. The writer never computes signatures itself.
pub trait SignatureHook {
    /// Called before any object is written.
    fn prepare(&mut self) -> Option<SignaturePlaceholder>;

    /// `covered` holds the bytes of both parts of `byte_range`, which are
    /// final. Returns the container to embed in `/Contents`.
    fn sign(&mut self, byte_range: ByteRange, covered: &[Byte]) -> Vec<Byte>;
}

/// Problems found while writing. The output is valid regardless.
#[derive(Debug, Error, PartialEq, Clone)]
pub enum WriteWarning {
    #[error("Object {referrer}: dangling reference {reference} written as null")]
    DanglingReference { referrer: Id, reference: Reference },
    #[error("Object {id}: /Length {declared} corrected to {actual}")]
    LengthCorrected {
        id: Id,
        declared: usize,
        actual: usize,
    },
    #[error("Object {id}: stream written without its filters: {err}")]
    FilterFailed { id: Id, err: FilterErr },
    #[error("Object {id}: written as null: {err}")]
    UnloadableObject { id: Id, err: PdfErr },
    #[error("Signature container of {size} bytes exceeds the {capacity} bytes reserved")]
    SignatureTooLarge { capacity: usize, size: usize },
    #[error("Signature dictionary {0} was not written")]
    SignatureObjectMissing(Reference),
    #[error("Compressed entries written in a cross-reference stream instead of a table")]
    XRefStreamForced,
}

#[derive(Debug, Default, PartialEq, Clone)]
pub struct WriteReport {
    pub warnings: Vec<WriteWarning>,
    /// Where the bytes written by the save start. 0 for a full save.
    pub update_offset: Offset,
    /// Offset of the new cross-reference section or stream.
    pub xref_offset: Offset,
    /// Set when a signature placeholder was filled.
    pub byte_range: Option<ByteRange>,
}

#[derive(Debug)]
struct Signature {
    placeholder: SignaturePlaceholder,
    /// Positions in the output of the /ByteRange array, and of the start and
    /// end of the /Contents string.
    slots: Option<(usize, usize, usize)>,
}

/// REFERENCE: [7.5 File structure, p53-69]
///
/// Serialises a document into memory first, so nothing reaches the output
/// unless the whole file could be produced.
pub(crate) struct Writer<'document> {
    document: &'document mut Document,
    options: WriteOptions,
    incremental: bool,
    /// Offset in the file of the first byte of `out`.
    base: Offset,
    out: Vec<Byte>,
    written: BTreeMap<ObjectNumber, (GenerationNumber, Location)>,
    trailer: Option<Trailer>,
    signature: Option<Signature>,
    warnings: Vec<WriteWarning>,
}

impl<'document> Writer<'document> {
    pub(crate) fn new(document: &'document mut Document, options: WriteOptions) -> Self {
        Self {
            document,
            options,
            incremental: false,
            base: 0,
            out: Vec::new(),
            written: BTreeMap::new(),
            trailer: None,
            signature: None,
            warnings: Vec::new(),
        }
    }

    /// The document is updated only once `out` accepted every byte. On error
    /// it is left as it was before the call.
    pub(crate) fn write(
        mut self,
        out: &mut dyn Write,
        hook: Option<&mut dyn SignatureHook>,
    ) -> PdfResult<WriteReport> {
        let table = self.document.table.clone();
        let version = self.document.version;
        let (xref_offset, byte_range) = match self.produce(out, hook) {
            Ok(produced) => produced,
            Err(err) => {
                warn!("Save failed, document left unchanged: {}", err);
                self.document.table = table;
                self.document.version = version;
                return Err(err);
            }
        };
        let update_offset = self.base;
        self.commit(xref_offset);
        info!(
            "Wrote {} objects. Cross-reference at offset {}",
            self.written.len(),
            xref_offset
        );
        Ok(WriteReport {
            warnings: self.warnings,
            update_offset,
            xref_offset,
            byte_range,
        })
    }

    fn produce(
        &mut self,
        out: &mut dyn Write,
        mut hook: Option<&mut dyn SignatureHook>,
    ) -> PdfResult<(Offset, Option<ByteRange>)> {
        self.signature = hook
            .as_mut()
            .and_then(|hook| hook.prepare())
            .map(|placeholder| Signature {
                placeholder,
                slots: None,
            });
        self.incremental = match self.options.mode() {
            WriteMode::Full => false,
            WriteMode::Incremental if self.document.source.is_empty() => {
                info!("No previous revision to update. Writing the whole document");
                false
            }
            WriteMode::Incremental => true,
        };

        let xref_offset = if self.incremental {
            self.write_incremental()?
        } else {
            self.write_full()?
        };
        let byte_range = match hook {
            Some(hook) => self.sign(hook)?,
            None => None,
        };

        if self.incremental {
            self.copy_source(out)?;
        }
        out.write_all(&self.out)
            .and_then(|()| out.flush())
            .map_err(|err| SourceErr::Write(err.kind()))?;
        Ok((xref_offset, byte_range))
    }

    /// Every live object, in ascending object number order, from offset 0.
    fn write_full(&mut self) -> PdfResult<Offset> {
        let version = self.document.version.max(self.required_version());
        self.document.version = version;
        version.write_header(&mut self.out);

        // Load everything first, since members of object streams are read
        // through their containers
        let mut objects = Vec::new();
        for id in self.document.ids() {
            let value = self.load(id);
            objects.push((id, value));
        }
        let mut kept = Vec::with_capacity(objects.len());
        for (id, value) in objects {
            // Object streams and cross-reference streams are rebuilt
            if is_rebuilt_by_writer(&value) {
                debug!("Dropping object {}", id);
                self.document.table.free(id.object_number())?;
                continue;
            }
            kept.push((id, value));
        }
        self.write_objects(kept)?;
        self.write_xref(None, true)
    }

    /// REFERENCE: [7.5.6 Incremental updates, p60-61]
    ///
    /// Only new, modified and freed objects. Unmodified objects keep the
    /// offsets of the previous revision.
    fn write_incremental(&mut self) -> PdfResult<Offset> {
        self.base = self.document.source.len();
        let last = self
            .document
            .source
            .read_at(self.base.saturating_sub(1), 1)?;
        if !matches!(last.first(), Some(b'\n' | b'\r')) {
            self.out.push(b'\n');
        }
        self.raise_version();

        let dirty: Vec<Id> = self
            .document
            .table
            .iter()
            .filter(|(_, entry)| entry.is_dirty() && !entry.is_free())
            .map(|(&object_number, entry)| Id::new(object_number, entry.generation()))
            .collect();
        let mut objects = Vec::with_capacity(dirty.len());
        for id in dirty {
            let value = self.load(id);
            objects.push((id, value));
        }
        self.write_objects(objects)?;

        // The offsets of a rebuilt table are not reachable through /Prev
        if self.document.rebuilt {
            self.write_xref(None, true)
        } else {
            let prev = self.document.startxref;
            self.write_xref(prev, false)
        }
    }

    /// REFERENCE: [7.7.2 Document catalog, p85]
    /// The header of an existing file stays as is. A later version is
    /// declared in the catalog instead.
    fn raise_version(&mut self) {
        let required = self.required_version();
        if required <= self.document.version {
            return;
        }
        let Some(root) = self.document.trailer.root() else {
            return;
        };
        let raised = self.document.modify(root, |catalog| {
            if let Some(catalog) = catalog.as_dictionary_mut() {
                catalog.insert(KEY_VERSION, required.to_name());
            }
        });
        match raised {
            Ok(()) => {
                info!("Catalog /{} raised to {}", KEY_VERSION, required);
                self.document.version = required;
            }
            Err(err) => warn!("Cannot declare version {} in the catalog: {}", required, err),
        }
    }

    /// REFERENCE: [7.5.8 Cross-reference streams, p65]
    fn required_version(&self) -> Version {
        if self.options.xref_format() == XRefFormat::Stream || self.options.object_streams() {
            Version::V1_5
        } else {
            Version::V1_0
        }
    }

    fn load(&mut self, id: Id) -> Arc<Object> {
        match self.document.resolve(Reference::from(id)) {
            Ok(value) => value,
            Err(err) => {
                warn!("Object {} written as null: {}", id, err);
                self.warnings.push(WriteWarning::UnloadableObject { id, err });
                Arc::new(Object::Null)
            }
        }
    }

    fn write_objects(&mut self, objects: Vec<(Id, Arc<Object>)>) -> PdfResult<()> {
        let mut compressible = Vec::new();
        for (id, value) in objects {
            let object = self.without_dangling(id, &value);
            if self.is_compressible(id, &object) {
                compressible.push((id, object));
            } else {
                self.write_direct(id, object);
            }
        }
        let max = self.options.max_objects_per_stream();
        let mut compressible = compressible.into_iter().peekable();
        while compressible.peek().is_some() {
            let chunk: Vec<(Id, Object)> = compressible.by_ref().take(max).collect();
            self.write_object_stream(chunk)?;
        }
        Ok(())
    }

    /// A copy of `value` where references to free or missing objects are
    /// null.
    fn without_dangling(&mut self, id: Id, value: &Object) -> Object {
        let mut object = value.clone();
        let table = &self.document.table;
        let dangling = object.retain_references(&mut |reference| {
            table.lookup(reference.object_number()).is_some_and(|entry| {
                !entry.is_free() && entry.generation() == reference.generation_number()
            })
        });
        for reference in dangling {
            warn!("Object {}: dangling reference {} written as null", id, reference);
            self.warnings.push(WriteWarning::DanglingReference {
                referrer: id,
                reference,
            });
        }
        object
    }

    /// REFERENCE: [7.5.7 Object streams, p62]
    fn is_compressible(&self, id: Id, object: &Object) -> bool {
        let encrypt = self
            .document
            .trailer
            .encrypt()
            .and_then(Object::as_reference);
        self.options.object_streams()
            && id.generation_number() == 0
            && !matches!(object, Object::Stream(_))
            && !self.is_signature(id)
            && encrypt != Some(Reference::from(id))
    }

    fn is_signature(&self, id: Id) -> bool {
        self.signature
            .as_ref()
            .is_some_and(|signature| signature.placeholder.reference.id() == id)
    }

    fn position(&self) -> Offset {
        self.base + self.out.len()
    }

    fn write_direct(&mut self, id: Id, object: Object) {
        let offset = self.position();
        match object {
            Object::Stream(stream) => {
                let stream = self.encode_stream(id, stream);
                IndirectObject::write_parts(id, &Object::Stream(stream), &mut self.out);
            }
            Object::Dictionary(dictionary) if self.is_signature(id) => {
                self.write_signature(id, dictionary)
            }
            object => IndirectObject::write_parts(id, &object, &mut self.out),
        }
        self.written.insert(
            id.object_number(),
            (id.generation_number(), Location::Offset(offset)),
        );
    }

    /// The stream with its payload encoded and `/Length` matching it.
    fn encode_stream(&mut self, id: Id, stream: Stream) -> Stream {
        match stream.encoded_data().map(<[Byte]>::len) {
            Some(actual) => {
                if let Some(declared) = stream.declared_length().filter(|&declared| declared != actual) {
                    warn!("Object {}: /Length {} corrected to {}", id, declared, actual);
                    self.warnings.push(WriteWarning::LengthCorrected {
                        id,
                        declared,
                        actual,
                    });
                }
                stream
            }
            None => match stream.to_encoded(
                &self.document.registry,
                self.document.options,
                self.options.compression(),
            ) {
                Ok(encoded) => encoded,
                Err(err) => {
                    warn!("Object {}: stream written without its filters: {}", id, err);
                    self.warnings.push(WriteWarning::FilterFailed { id, err });
                    stream
                }
            },
        }
    }

    /// REFERENCE: [12.8.1 General, p468-469]
    /// /ByteRange and /Contents are reserved with fixed widths and filled
    /// once the rest of the file is final.
    fn write_signature(&mut self, id: Id, mut dictionary: Dictionary) {
        let capacity = self
            .signature
            .as_ref()
            .map_or(0, |signature| signature.placeholder.capacity);
        dictionary.remove(KEY_BYTE_RANGE);
        dictionary.remove(KEY_CONTENTS);
        let mut body = Vec::new();
        dictionary.write_to(&mut body);
        body.truncate(body.len().saturating_sub(2));

        self.out
            .extend_from_slice(format!("{} obj\n", id).as_bytes());
        self.out.extend_from_slice(&body);
        self.out.extend_from_slice(b" /");
        self.out.extend_from_slice(KEY_BYTE_RANGE.as_bytes());
        self.out.push(b' ');
        let byte_range_at = self.out.len();
        self.out.extend_from_slice(
            format!("{:<width$}", "[0 0 0 0]", width = BYTE_RANGE_WIDTH).as_bytes(),
        );
        self.out.extend_from_slice(b" /");
        self.out.extend_from_slice(KEY_CONTENTS.as_bytes());
        self.out.push(b' ');
        let contents_start = self.out.len();
        self.out.push(b'<');
        self.out.resize(self.out.len() + 2 * capacity, b'0');
        self.out.push(b'>');
        let contents_end = self.out.len();
        self.out.extend_from_slice(b">>\nendobj\n");

        if let Some(signature) = self.signature.as_mut() {
            signature.slots = Some((byte_range_at, contents_start, contents_end));
        }
    }

    /// REFERENCE: [7.5.7 Object streams, p61-62]
    fn write_object_stream(&mut self, chunk: Vec<(Id, Object)>) -> PdfResult<()> {
        let mut builder = ObjectStreamBuilder::default();
        let mut members = Vec::with_capacity(chunk.len());
        for (id, object) in chunk {
            match builder.add(id, &object) {
                Ok(index) => members.push((id.object_number(), index)),
                Err(err) => {
                    warn!("{}. Writing object {} directly", err, id);
                    self.write_direct(id, object);
                }
            }
        }
        if members.is_empty() {
            return Ok(());
        }
        let stream = builder.build(
            &self.document.registry,
            self.document.options,
            self.options.compression(),
        )?;
        let container = self.document.table.append()?;
        debug!(
            "Object stream {} holds {} objects",
            container,
            members.len()
        );
        self.document.table.set_value(
            container.object_number(),
            Arc::new(Object::Stream(stream.clone())),
        )?;
        self.write_direct(container, Object::Stream(stream));
        for (object_number, index) in members {
            self.written.insert(
                object_number,
                (
                    0,
                    Location::Compressed {
                        stream: container.object_number(),
                        index,
                    },
                ),
            );
        }
        Ok(())
    }

    /// Write the cross-reference section or stream and the file trailer.
    /// `all` lists every entry of the table rather than the written ones.
    fn write_xref(&mut self, prev: Option<Offset>, all: bool) -> PdfResult<Offset> {
        let format = if self.options.xref_format() == XRefFormat::Table && self.keeps_compressed(all)
        {
            warn!("Compressed entries cannot be listed in a cross-reference table");
            self.warnings.push(WriteWarning::XRefStreamForced);
            XRefFormat::Stream
        } else {
            self.options.xref_format()
        };

        match format {
            XRefFormat::Table => {
                let table = self.entries(all);
                let offset = self.position();
                let trailer = self.new_trailer(prev);
                Section::from_table(&table, trailer.clone()).write_to(&mut self.out);
                self.trailer = Some(trailer);
                self.write_startxref(offset);
                Ok(offset)
            }
            // REFERENCE: [7.5.8 Cross-reference streams, p65]
            // The stream lists itself, at the offset it is about to be
            // written to
            XRefFormat::Stream => {
                let id = self.document.table.append()?;
                let offset = self.position();
                let mut table = self.entries(all);
                table.insert(
                    id.object_number(),
                    XRefEntry::InUse {
                        offset,
                        generation_number: id.generation_number(),
                    },
                );
                let trailer = self.new_trailer(prev);
                let stream = XRefStream::new(table, trailer.clone()).to_stream(
                    &self.document.registry,
                    self.document.options,
                    self.options.compression(),
                )?;
                self.document
                    .table
                    .set_value(id.object_number(), Arc::new(Object::Stream(stream.clone())))?;
                IndirectObject::write_parts(id, &Object::Stream(stream), &mut self.out);
                self.written.insert(
                    id.object_number(),
                    (id.generation_number(), Location::Offset(offset)),
                );
                self.trailer = Some(trailer);
                self.write_startxref(offset);
                Ok(offset)
            }
        }
    }

    /// Whether entries that stay in existing object streams are listed.
    fn keeps_compressed(&self, all: bool) -> bool {
        self.written
            .values()
            .any(|(_, location)| matches!(location, Location::Compressed { .. }))
            || (all
                && self.document.table.iter().any(|(object_number, entry)| {
                    !entry.is_free()
                        && !self.written.contains_key(object_number)
                        && matches!(entry.location(), Location::Compressed { .. })
                }))
    }

    /// REFERENCE: [7.5.4 Cross-reference table, p57]
    /// Free entries form a linked list headed by object 0.
    fn entries(&self, all: bool) -> XRefTable {
        let mut table: XRefTable = self
            .written
            .iter()
            .map(|(&object_number, &(generation_number, location))| {
                let entry = match location {
                    Location::Compressed { stream, index } => {
                        XRefEntry::Compressed { stream, index }
                    }
                    Location::Offset(offset) => XRefEntry::InUse {
                        offset,
                        generation_number,
                    },
                    Location::None => XRefEntry::Free {
                        next_free: 0,
                        generation_number,
                    },
                };
                (object_number, entry)
            })
            .collect();

        let mut free = Vec::new();
        for (&object_number, entry) in self.document.table.iter() {
            if table.contains(object_number) {
                continue;
            }
            if entry.is_free() {
                if all || entry.is_dirty() {
                    free.push((object_number, entry.generation()));
                }
                continue;
            }
            if !all {
                continue;
            }
            let generation_number = entry.generation();
            match entry.location() {
                Location::Offset(offset) => {
                    table.insert(
                        object_number,
                        XRefEntry::InUse {
                            offset,
                            generation_number,
                        },
                    );
                }
                Location::Compressed { stream, index } => {
                    table.insert(object_number, XRefEntry::Compressed { stream, index });
                }
                Location::None => {}
            }
        }

        for (position, &(object_number, generation_number)) in free.iter().enumerate() {
            let next_free = free.get(position + 1).map_or(0, |(next, _)| *next);
            table.insert(
                object_number,
                XRefEntry::Free {
                    next_free,
                    generation_number,
                },
            );
        }
        table.insert(
            0,
            XRefEntry::Free {
                next_free: free.first().map_or(0, |(first, _)| *first),
                generation_number: MAX_GENERATION_NUMBER,
            },
        );
        table
    }

    /// REFERENCE: [7.5.5 File trailer, p58-59]
    fn new_trailer(&self, prev: Option<Offset>) -> Trailer {
        let mut trailer = self
            .document
            .trailer
            .clone()
            .clear_prev()
            .clear_xref_stm()
            .set_size(self.document.table.size());
        if let Some(prev) = prev {
            trailer = trailer.set_prev(prev);
        }
        trailer.set_id(self.file_id())
    }

    /// REFERENCE: [14.4 File identifiers, p559]
    /// The first identifier is permanent. The second changes with every
    /// revision.
    fn file_id(&self) -> [String_; 2] {
        let mut context = md5::Context::new();
        context.consume(self.base.to_le_bytes());
        context.consume(self.document.table.size().to_le_bytes());
        context.consume(&self.out);
        let digest = String_::hexadecimal(context.finalize().0.to_vec());
        match self.document.trailer.id() {
            Some([permanent, _]) => [permanent.clone(), digest],
            None => [digest.clone(), digest],
        }
    }

    fn write_startxref(&mut self, offset: Offset) {
        self.out.extend_from_slice(
            format!("{}\n{}\n{}\n", KW_STARTXREF, offset, EOF).as_bytes(),
        );
    }

    /// Fill the signature placeholder. The container is written in place of
    /// the reserved zeros, so no offset moves.
    fn sign(&mut self, hook: &mut dyn SignatureHook) -> PdfResult<Option<ByteRange>> {
        let Some(signature) = self.signature.take() else {
            return Ok(None);
        };
        let Some((byte_range_at, contents_start, contents_end)) = signature.slots else {
            let reference = signature.placeholder.reference;
            warn!("Signature dictionary {} was not written", reference);
            self.warnings
                .push(WriteWarning::SignatureObjectMissing(reference));
            return Ok(None);
        };
        let before = self.base + contents_start;
        let after = self.base + contents_end;
        let byte_range = [0, before, after, self.position() - after];
        let text = format!(
            "[{} {} {} {}]",
            byte_range[0], byte_range[1], byte_range[2], byte_range[3]
        );
        let text = format!("{:<width$}", text, width = BYTE_RANGE_WIDTH);
        self.out[byte_range_at..byte_range_at + BYTE_RANGE_WIDTH].copy_from_slice(text.as_bytes());

        let mut covered = Vec::with_capacity(before + byte_range[3]);
        if self.base > 0 {
            covered.extend_from_slice(&self.document.source.read_at(0, self.base)?);
        }
        covered.extend_from_slice(&self.out[..contents_start]);
        covered.extend_from_slice(&self.out[contents_end..]);
        let container = hook.sign(byte_range, &covered);

        let capacity = signature.placeholder.capacity;
        if container.len() > capacity {
            warn!(
                "Signature container of {} bytes exceeds the {} bytes reserved",
                container.len(),
                capacity
            );
            self.warnings.push(WriteWarning::SignatureTooLarge {
                capacity,
                size: container.len(),
            });
        } else {
            let mut hex = Vec::with_capacity(2 * container.len());
            write_hex(&container, &mut hex);
            let start = contents_start + 1;
            self.out[start..start + hex.len()].copy_from_slice(&hex);
        }
        Ok(Some(byte_range))
    }

    fn copy_source(&self, out: &mut dyn Write) -> PdfResult<()> {
        let mut offset = 0;
        while offset < self.base {
            let chunk = self
                .document
                .source
                .read_at(offset, COPY_CHUNK.min(self.base - offset))?;
            if chunk.is_empty() {
                break;
            }
            out.write_all(&chunk)
                .map_err(|err| SourceErr::Write(err.kind()))?;
            offset += chunk.len();
        }
        Ok(())
    }

    /// Point the document at the written file.
    fn commit(&mut self, xref_offset: Offset) {
        let update = mem::take(&mut self.out);
        let document = &mut *self.document;
        let source: Arc<dyn ByteSource> = if self.incremental {
            Arc::new(AppendedSource::new(Arc::clone(&document.source), update))
        } else {
            Arc::new(MemorySource::new(update))
        };
        document.source = source;
        for (&object_number, &(_, location)) in &self.written {
            document.table.set_location(object_number, location);
        }
        let saved: Vec<ObjectNumber> = document
            .table
            .iter()
            .filter(|(_, entry)| entry.is_dirty())
            .map(|(&object_number, _)| object_number)
            .collect();
        for object_number in saved {
            document.table.mark_saved(object_number);
        }
        if self.options.low_memory() {
            for &object_number in self.written.keys() {
                if let Err(err) = document.table.flush(object_number) {
                    debug!("Object {} stays in memory: {}", object_number, err);
                }
            }
        }
        if let Some(trailer) = self.trailer.take() {
            document.trailer = trailer;
        }
        if self.incremental && !document.rebuilt {
            document.revisions.insert(0, xref_offset);
        } else {
            document.revisions = vec![xref_offset];
        }
        document.startxref = Some(xref_offset);
        document.rebuilt = false;
        document.object_streams.clear();
    }
}

fn is_rebuilt_by_writer(value: &Object) -> bool {
    value
        .as_stream()
        .and_then(|stream| stream.dictionary().get(KEY_TYPE))
        .and_then(Object::as_name)
        .is_some_and(|r#type| *r#type == VAL_OBJSTM || *r#type == VAL_XREF)
}
