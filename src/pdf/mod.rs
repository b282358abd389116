pub(crate) mod error;
pub(crate) mod writer;

use ::log::debug;
use ::log::info;
use ::log::warn;
use ::std::collections::HashMap;
use ::std::io::Write;
use ::std::mem;
use ::std::path::Path;
use ::std::sync::Arc;

use self::error::ObjectErr;
use self::error::PdfErr;
use self::error::PdfResult;
use self::writer::SignatureHook;
use self::writer::WriteReport;
use self::writer::Writer;
use crate::config::ParseOptions;
use crate::config::WriteOptions;
use crate::header::Version;
use crate::header::HEADER_SEARCH_SIZE;
use crate::object::indirect::id::Id;
use crate::object::indirect::reference::Reference;
use crate::object::Object;
use crate::objstm::ObjectStream;
use crate::parse::object::LengthResolver;
use crate::parse::object::ObjectParser;
use crate::process::filter::registry::FilterRegistry;
use crate::source::read_growing;
use crate::source::ByteSource;
use crate::source::FileSource;
use crate::source::MemorySource;
use crate::table::error::TableErr;
use crate::table::EntryState;
use crate::table::IndirectTable;
use crate::table::Location;
use crate::xref::reader::XRefReader;
use crate::xref::trailer::Trailer;
use crate::Byte;
use crate::GenerationNumber;
use crate::IndexNumber;
use crate::ObjectNumber;
use crate::Offset;

/// REFERENCE: [Table 29 — Entries in the catalog dictionary, p85]
pub(crate) const KEY_VERSION: &str = "Version";

/// REFERENCE: [7.5.1 General, p53]
///
/// A PDF file as a graph of indirect objects. Objects are read from the
/// source on first access and kept in the table. Changes are kept in memory
/// until the document is saved.
///
/// A document exclusively owns its source. Sharing one file between
/// documents is left to the caller.
#[derive(Debug)]
pub struct Document {
    source: Arc<dyn ByteSource>,
    registry: FilterRegistry,
    options: ParseOptions,
    table: IndirectTable,
    trailer: Trailer,
    version: Version,
    /// Offset of the newest cross-reference section or stream. `None` for a
    /// new document or a rebuilt table.
    startxref: Option<Offset>,
    /// Offsets of the cross-reference sections and streams, newest first.
    revisions: Vec<Offset>,
    rebuilt: bool,
    object_streams: HashMap<ObjectNumber, Arc<ObjectStream>>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// An empty document. The caller adds a catalog and sets it as the
    /// `/Root`.
    pub fn new() -> Self {
        Self {
            source: Arc::new(MemorySource::default()),
            registry: FilterRegistry::default(),
            options: ParseOptions::default(),
            table: IndirectTable::default(),
            trailer: Trailer::new(1),
            version: Version::default(),
            startxref: None,
            revisions: Vec::new(),
            rebuilt: false,
            object_streams: HashMap::new(),
        }
    }

    pub fn open(source: impl ByteSource + 'static, options: ParseOptions) -> PdfResult<Self> {
        Self::with_registry(Arc::new(source), FilterRegistry::default(), options)
    }

    pub fn open_file(path: impl AsRef<Path>, options: ParseOptions) -> PdfResult<Self> {
        Self::open(FileSource::open(path)?, options)
    }

    /// REFERENCE: [7.5.1 General, p54]
    /// Apart from linearised files, a file is read from its end, starting
    /// with the trailer and the cross-reference table.
    pub fn with_registry(
        source: Arc<dyn ByteSource>,
        registry: FilterRegistry,
        options: ParseOptions,
    ) -> PdfResult<Self> {
        let head = source.read_at(0, HEADER_SEARCH_SIZE)?;
        let version = match Version::locate(&head) {
            Ok(version) => version,
            Err(err) if options.is_strict() => return Err(err.into()),
            Err(err) => {
                warn!("{}. Assuming version {}", err, Version::default());
                Version::default()
            }
        };
        let read = XRefReader::new(source.as_ref(), &registry, options).read()?;
        let mut document = Self {
            table: IndirectTable::from_xref(&read.table),
            trailer: read.trailer,
            version,
            startxref: read.startxref,
            revisions: read.revisions,
            rebuilt: read.rebuilt,
            source,
            registry,
            options,
            object_streams: HashMap::new(),
        };
        // The catalog may declare a later version than the header
        if let Some(version) = document.catalog_version() {
            if version > document.version {
                debug!("Catalog /{} {} overrides the header", KEY_VERSION, version);
                document.version = version;
            }
        }
        info!(
            "Opened a PDF {} document of {} revisions and {} objects",
            document.version,
            document.revisions.len(),
            document.len()
        );
        Ok(document)
    }

    /// REFERENCE: [7.3.10 Indirect objects, p33]
    /// A reference to a free or missing object, or to a generation that is
    /// no longer current, is a reference to the null object.
    pub fn resolve(&mut self, reference: Reference) -> PdfResult<Arc<Object>> {
        let object_number = reference.object_number();
        let (generation, location) = match self.table.lookup(object_number) {
            Some(entry)
                if !entry.is_free() && entry.generation() == reference.generation_number() =>
            {
                if let Some(value) = entry.value() {
                    return Ok(Arc::clone(value));
                }
                (entry.generation(), entry.location())
            }
            _ => {
                debug!("Reference {} resolves to null", reference);
                return Ok(Arc::new(Object::Null));
            }
        };
        self.table.begin_resolve(object_number)?;
        let loaded = self.load(Id::new(object_number, generation), location);
        self.table.end_resolve(object_number);
        let value = Arc::new(loaded?);
        self.table.memoize(object_number, Arc::clone(&value));
        Ok(value)
    }

    /// The value of an object if it is already in memory. Does not read the
    /// source.
    pub fn cached(&self, reference: Reference) -> Option<Arc<Object>> {
        self.table
            .lookup(reference.object_number())
            .filter(|entry| !entry.is_free())
            .filter(|entry| entry.generation() == reference.generation_number())
            .and_then(|entry| entry.value().cloned())
    }

    /// Allocate an identifier for `value`, reusing a free object number if
    /// possible.
    pub fn add_object(&mut self, value: impl Into<Object>) -> PdfResult<Reference> {
        let id = self.table.allocate()?;
        self.table
            .set_value(id.object_number(), Arc::new(value.into()))?;
        debug!("Added object {}", id);
        Ok(Reference::from(id))
    }

    pub fn replace(&mut self, reference: Reference, value: impl Into<Object>) -> PdfResult<()> {
        self.check_live(reference)?;
        let object_number = reference.object_number();
        self.table.set_value(object_number, Arc::new(value.into()))?;
        self.object_streams.remove(&object_number);
        Ok(())
    }

    /// Apply `change` to a copy of the object and store the result.
    pub fn modify(
        &mut self,
        reference: Reference,
        change: impl FnOnce(&mut Object),
    ) -> PdfResult<()> {
        self.check_live(reference)?;
        let mut value = Object::clone(&*self.resolve(reference)?);
        change(&mut value);
        self.replace(reference, value)
    }

    /// Flag the object to be written by the next incremental save. It is
    /// loaded first so that its content is kept.
    pub fn mark_modified(&mut self, reference: Reference) -> PdfResult<()> {
        self.check_live(reference)?;
        self.resolve(reference)?;
        self.table.mark_modified(reference.object_number())?;
        Ok(())
    }

    /// REFERENCE: [7.5.4 Cross-reference table, p57]
    /// Returns the generation number a reuse of the object number gets.
    pub fn free_object(&mut self, reference: Reference) -> PdfResult<GenerationNumber> {
        self.check_live(reference)?;
        let object_number = reference.object_number();
        let generation = self.table.free(object_number)?;
        self.object_streams.remove(&object_number);
        debug!("Freed object {}", reference);
        Ok(generation)
    }

    /// Load every object in use, collecting the failures rather than
    /// stopping at the first one.
    pub fn load_all(&mut self) -> Vec<ObjectErr> {
        let ids: Vec<Id> = self
            .table
            .iter()
            .filter(|(_, entry)| !entry.is_free())
            .map(|(&object_number, entry)| Id::new(object_number, entry.generation()))
            .collect();
        let mut errors = Vec::new();
        for id in ids {
            if let Err(err) = self.resolve(Reference::from(id)) {
                debug!("Object {} does not load: {}", id, err);
                errors.push(ObjectErr { id, err });
            }
        }
        errors
    }

    /// The decoded data of a stream object. A filter failure only concerns
    /// this stream, whose data is then undecodable.
    pub fn decode_stream(&mut self, reference: Reference) -> PdfResult<Vec<Byte>> {
        let value = self.resolve(reference)?;
        let stream = value
            .as_stream()
            .ok_or(PdfErr::NotA(reference.id(), stringify!(Stream)))?;
        Ok(stream.decode(&self.registry, self.options)?)
    }

    /// REFERENCE: [7.7.2 Document catalog, p85]
    pub fn catalog(&mut self) -> PdfResult<Arc<Object>> {
        let root = self.trailer.root().ok_or(PdfErr::MissingRoot)?;
        let catalog = self.resolve(root)?;
        match catalog.as_ref() {
            Object::Dictionary(_) => Ok(catalog),
            _ => Err(PdfErr::NotA(root.id(), stringify!(Dictionary))),
        }
    }

    pub fn trailer(&self) -> &Trailer {
        &self.trailer
    }

    pub fn set_root(&mut self, root: Reference) {
        self.trailer = mem::take(&mut self.trailer).set_root(root);
    }

    pub fn set_info(&mut self, info: Reference) {
        self.trailer = mem::take(&mut self.trailer).set_info(info);
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    pub fn options(&self) -> ParseOptions {
        self.options
    }

    pub fn registry(&self) -> &FilterRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut FilterRegistry {
        &mut self.registry
    }

    /// Offset of the newest cross-reference section or stream.
    pub fn startxref(&self) -> Option<Offset> {
        self.startxref
    }

    /// Offsets of the cross-reference sections and streams, newest first.
    pub fn revisions(&self) -> &[Offset] {
        &self.revisions
    }

    /// Whether the cross-reference table was reconstructed by scanning the
    /// file.
    pub fn is_rebuilt(&self) -> bool {
        self.rebuilt
    }

    /// The generation, state and location of an object number.
    pub fn entry(
        &self,
        object_number: ObjectNumber,
    ) -> Option<(GenerationNumber, EntryState, Location)> {
        self.table
            .lookup(object_number)
            .map(|entry| (entry.generation(), entry.state(), entry.location()))
    }

    /// The identifiers of the objects in use, ascending.
    pub fn ids(&self) -> Vec<Id> {
        self.table
            .iter()
            .filter(|(_, entry)| !entry.is_free())
            .map(|(&object_number, entry)| Id::new(object_number, entry.generation()))
            .collect()
    }

    /// Number of objects in use.
    pub fn len(&self) -> usize {
        self.table
            .iter()
            .filter(|(_, entry)| !entry.is_free())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Write the document to `out`.
    ///
    /// A full save writes a new file. An incremental save writes the bytes
    /// of the source unchanged followed by the changed objects. Either way,
    /// the document then reads from the written file.
    pub fn save(&mut self, out: &mut dyn Write, options: WriteOptions) -> PdfResult<WriteReport> {
        Writer::new(self, options).write(out, None)
    }

    /// Save, reserving room for a signature that `hook` computes once the
    /// bytes it covers are final.
    pub fn save_signed(
        &mut self,
        out: &mut dyn Write,
        options: WriteOptions,
        hook: &mut dyn SignatureHook,
    ) -> PdfResult<WriteReport> {
        Writer::new(self, options).write(out, Some(hook))
    }

    fn check_live(&self, reference: Reference) -> PdfResult<()> {
        let object_number = reference.object_number();
        match self.table.lookup(object_number) {
            None => Err(TableErr::NotFound(object_number).into()),
            Some(entry) if entry.is_free() => Err(TableErr::Free(object_number).into()),
            Some(entry) if entry.generation() != reference.generation_number() => Err(
                PdfErr::MismatchedId(reference.id(), Id::new(object_number, entry.generation())),
            ),
            Some(_) => Ok(()),
        }
    }

    fn catalog_version(&mut self) -> Option<Version> {
        let catalog = match self.catalog() {
            Ok(catalog) => catalog,
            Err(err) => {
                warn!("Unreadable catalog: {}", err);
                return None;
            }
        };
        let name = catalog.as_dictionary()?.get_name(KEY_VERSION).ok()??;
        Version::from_name(name)
    }

    fn load(&mut self, id: Id, location: Location) -> PdfResult<Object> {
        match location {
            Location::Offset(offset) => self.load_at(id, offset),
            Location::Compressed { stream, index } => self.load_compressed(id, stream, index),
            Location::None => Ok(Object::Null),
        }
    }

    /// REFERENCE: [7.3.10 Indirect objects, p33]
    fn load_at(&mut self, id: Id, offset: Offset) -> PdfResult<Object> {
        let source = Arc::clone(&self.source);
        let options = self.options;
        let object = read_growing(source.as_ref(), offset, |bytes, complete| {
            ObjectParser::new(bytes, options)
                .set_complete(complete)
                .set_resolver(&mut *self)
                .parse_indirect_object()
        })??;
        if object.id() != id {
            if self.options.is_strict() {
                return Err(PdfErr::MismatchedId(id, object.id()));
            }
            warn!(
                "Expected object {} at offset {}, found object {}",
                id,
                offset,
                object.id()
            );
        }
        Ok(object.into_value())
    }

    /// REFERENCE: [7.5.7 Object streams, p62]
    fn load_compressed(
        &mut self,
        id: Id,
        stream: ObjectNumber,
        index: IndexNumber,
    ) -> PdfResult<Object> {
        let object_stream = self.object_stream(stream)?;
        let mut object = object_stream.get(index, self.options)?;
        if object.id().object_number() != id.object_number() {
            // HACK Some producers index the objects of a stream inconsistently
            // with the cross-reference stream
            let index = object_stream
                .find(id.object_number())
                .ok_or(PdfErr::MismatchedId(id, object.id()))?;
            warn!(
                "Object {} is at index {} of object stream {}, not the indexed one",
                id, index, stream
            );
            object = object_stream.get(index, self.options)?;
        }
        Ok(object.into_value())
    }

    fn object_stream(&mut self, stream: ObjectNumber) -> PdfResult<Arc<ObjectStream>> {
        if let Some(object_stream) = self.object_streams.get(&stream) {
            return Ok(Arc::clone(object_stream));
        }
        let generation = self
            .table
            .lookup(stream)
            .map_or(0, |entry| entry.generation());
        let reference = Reference::new(stream, generation);
        let container = self.resolve(reference)?;
        let container = container
            .as_stream()
            .ok_or(PdfErr::NotA(reference.id(), stringify!(Stream)))?;
        let object_stream = Arc::new(ObjectStream::decode(
            container,
            &self.registry,
            self.options,
        )?);
        self.object_streams
            .insert(stream, Arc::clone(&object_stream));
        Ok(object_stream)
    }
}

impl LengthResolver for Document {
    fn resolve_length(&mut self, reference: &Reference) -> Option<usize> {
        match self.resolve(*reference) {
            Ok(length) => length.as_usize(),
            Err(err) => {
                debug!("Indirect /Length {} does not resolve: {}", reference, err);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_err_eq;
    use crate::object::direct::dictionary::Dictionary;
    use crate::object::direct::name::Name;
    use crate::object::indirect::stream::Stream;
    use crate::objstm::ObjectStreamBuilder;

    /// A file with `objects` at increasing offsets, a classic cross-reference
    /// table and a trailer whose /Root is object 1.
    pub(crate) fn build_file(objects: &[(Id, &[Byte])]) -> Vec<Byte> {
        let mut out = b"%PDF-1.4\n".to_vec();
        let mut offsets = Vec::new();
        for (id, body) in objects {
            offsets.push((*id, out.len()));
            out.extend_from_slice(format!("{} obj\n", id).as_bytes());
            out.extend_from_slice(body);
            out.extend_from_slice(b"\nendobj\n");
        }
        let size = offsets
            .iter()
            .map(|(id, _)| id.object_number() + 1)
            .max()
            .unwrap_or(1);
        let xref = out.len();
        out.extend_from_slice(format!("xref\n0 {}\n0000000000 65535 f\r\n", size).as_bytes());
        for object_number in 1..size {
            match offsets.iter().find(|(id, _)| id.object_number() == object_number) {
                Some((id, offset)) => out.extend_from_slice(
                    format!("{:010} {:05} n\r\n", offset, id.generation_number()).as_bytes(),
                ),
                None => out.extend_from_slice(b"0000000000 00000 f\r\n"),
            }
        }
        out.extend_from_slice(
            format!(
                "trailer\n<</Size {} /Root 1 0 R>>\nstartxref\n{}\n%%EOF\n",
                size, xref
            )
            .as_bytes(),
        );
        out
    }

    fn open(buffer: Vec<Byte>) -> Document {
        Document::open(MemorySource::from(buffer), ParseOptions::lenient()).unwrap()
    }

    #[test]
    fn document_resolve() {
        let mut document = open(build_file(&[
            (Id::new(1, 0), b"<</Type /Catalog /Pages 2 0 R /Version /1.6>>"),
            (Id::new(2, 0), b"<</Type /Pages /Kids [] /Count 0 /Parent 2 0 R>>"),
        ]));
        assert_eq!(document.version(), Version::V1_6);
        assert_eq!(document.len(), 2);
        assert_eq!(document.cached(Reference::new(2, 0)), None);

        let pages = document.resolve(Reference::new(2, 0)).unwrap();
        let dictionary = pages.as_dictionary().unwrap();
        assert_eq!(dictionary.get_i64("Count"), Ok(Some(0)));
        // The parent cycle is a handle, not a nested copy
        assert_eq!(
            dictionary.get_reference("Parent"),
            Ok(Some(Reference::new(2, 0)))
        );
        assert!(document.cached(Reference::new(2, 0)).is_some());
        assert_eq!(
            document.entry(2).map(|(_, state, _)| state),
            Some(EntryState::InUse)
        );

        // Missing, wrong generation and the free head
        assert!(document.resolve(Reference::new(9, 0)).unwrap().is_null());
        assert!(document.resolve(Reference::new(2, 1)).unwrap().is_null());
        assert!(document.resolve(Reference::new(0, 65535)).unwrap().is_null());
        assert!(document.load_all().is_empty());
    }

    #[test]
    fn document_indirect_length() {
        let mut document = open(build_file(&[
            (Id::new(1, 0), b"<</Type /Catalog>>"),
            (Id::new(2, 0), b"<</Length 3 0 R>>\nstream\nHello\nendstream"),
            (Id::new(3, 0), b"5"),
            // Its length depends on itself
            (Id::new(4, 0), b"<</Length 4 0 R>>\nstream\nabc\nendstream"),
        ]));
        assert_eq!(
            document.decode_stream(Reference::new(2, 0)),
            Ok(b"Hello".to_vec())
        );
        // Lenient parsing falls back to searching for endstream
        assert_eq!(
            document.decode_stream(Reference::new(4, 0)),
            Ok(b"abc".to_vec())
        );
        assert_err_eq!(
            document.decode_stream(Reference::new(3, 0)),
            PdfErr::NotA(Id::new(3, 0), "Stream")
        );
    }

    #[test]
    fn document_compressed() {
        let mut builder = ObjectStreamBuilder::default();
        builder.add(Id::new(3, 0), &Object::from(42)).unwrap();
        builder
            .add(Id::new(4, 0), &Object::from(Name::from("Four")))
            .unwrap();
        let stream = builder
            .build(&FilterRegistry::default(), ParseOptions::lenient(), 6)
            .unwrap();
        let mut document = open(build_file(&[
            (Id::new(1, 0), b"<</Type /Catalog>>"),
            (Id::new(2, 0), &Object::from(stream).to_bytes()),
        ]));
        // Objects in object streams are only listed by cross-reference
        // streams, so register them directly
        document
            .table
            .register(3, 0, Location::Compressed { stream: 2, index: 0 }, EntryState::InUse);
        document
            .table
            .register(4, 0, Location::Compressed { stream: 2, index: 0 }, EntryState::InUse);
        assert_eq!(
            *document.resolve(Reference::new(3, 0)).unwrap(),
            Object::from(42)
        );
        // Wrong index, found by object number
        assert_eq!(
            *document.resolve(Reference::new(4, 0)).unwrap(),
            Object::from(Name::from("Four"))
        );
    }

    #[test]
    fn document_edit() {
        let mut document = open(build_file(&[
            (Id::new(1, 0), b"<</Type /Catalog>>"),
            (Id::new(2, 0), b"(two)"),
        ]));
        let generation = document.free_object(Reference::new(2, 0)).unwrap();
        assert_eq!(generation, 1);
        assert!(document.resolve(Reference::new(2, 0)).unwrap().is_null());
        assert_err_eq!(document.free_object(Reference::new(2, 0)), TableErr::Free(2));

        // The freed number is reused with the incremented generation
        let reference = document.add_object(7).unwrap();
        assert_eq!(reference, Reference::new(2, 1));
        assert!(document.resolve(Reference::new(2, 0)).unwrap().is_null());
        assert_eq!(*document.resolve(reference).unwrap(), Object::from(7));

        document
            .modify(Reference::new(1, 0), |catalog| {
                if let Some(catalog) = catalog.as_dictionary_mut() {
                    catalog.insert("Lang", Name::from("en"));
                }
            })
            .unwrap();
        assert_eq!(
            document.entry(1).map(|(_, state, _)| state),
            Some(EntryState::Modified)
        );
        assert_eq!(
            document.catalog().unwrap().as_dictionary().unwrap().get_name("Lang"),
            Ok(Some(&Name::from("en")))
        );
        assert_err_eq!(
            document.replace(Reference::new(1, 3), Object::Null),
            PdfErr::MismatchedId(Id::new(1, 3), Id::new(1, 0))
        );
    }

    #[test]
    fn document_new() {
        let mut document = Document::new();
        assert!(document.is_empty());
        assert_err_eq!(document.catalog(), PdfErr::MissingRoot);
        let mut catalog = Dictionary::default();
        catalog.insert("Type", Name::from("Catalog"));
        let root = document.add_object(catalog).unwrap();
        assert_eq!(root, Reference::new(1, 0));
        document.set_root(root);
        assert!(document.catalog().is_ok());
        let stream = document
            .add_object(Stream::from_decoded(Dictionary::default(), b"q Q".to_vec()))
            .unwrap();
        assert_eq!(document.decode_stream(stream), Ok(b"q Q".to_vec()));
    }

    #[test]
    fn document_mismatched_id() {
        let buffer = build_file(&[
            (Id::new(1, 0), b"<</Type /Catalog>>"),
            (Id::new(5, 0), b"true"),
        ]);
        // Point entry 5 at object 1
        let buffer = String::from_utf8(buffer)
            .unwrap()
            .replacen("0000000043 00000 n", "0000000009 00000 n", 1);
        let mut document = Document::open(
            MemorySource::from(buffer.clone().into_bytes()),
            ParseOptions::strict(),
        )
        .unwrap();
        assert_err_eq!(
            document.resolve(Reference::new(5, 0)),
            PdfErr::MismatchedId(Id::new(5, 0), Id::new(1, 0))
        );
        let mut document = open(buffer.into_bytes());
        assert!(document.resolve(Reference::new(5, 0)).unwrap().as_dictionary().is_some());
    }
}
