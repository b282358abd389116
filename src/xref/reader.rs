use ::log::debug;
use ::log::warn;

use super::error::XRefErr;
use super::error::XRefResult;
use super::rebuild::rebuild;
use super::section::Section;
use super::startxref::StartXRef;
use super::startxref::STARTXREF_SEARCH_SIZE;
use super::stream::XRefStream;
use super::trailer::Trailer;
use super::trailer::KEY_ROOT;
use super::XRefTable;
use crate::config::ParseOptions;
use crate::object::direct::dictionary::error::MissingEntryError;
use crate::object::Object;
use crate::parse::error::ParseErrorCode;
use crate::parse::object::ObjectParser;
use crate::process::filter::registry::FilterRegistry;
use crate::source::read_growing;
use crate::source::ByteSource;
use crate::Offset;

/// The merged cross-reference information of a file.
#[derive(Debug, PartialEq, Clone)]
pub(crate) struct ReadXRef {
    pub(crate) table: XRefTable,
    /// The trailer of the newest revision, completed from older ones.
    pub(crate) trailer: Trailer,
    /// Offsets of the visited cross-reference sections and streams, newest
    /// first.
    pub(crate) revisions: Vec<Offset>,
    /// Offset of the newest cross-reference section or stream. `None` when
    /// the table was rebuilt.
    pub(crate) startxref: Option<Offset>,
    pub(crate) rebuilt: bool,
}

/// REFERENCE: [7.5.6 Incremental updates, p60]
#[derive(Debug, Clone, Copy, PartialEq)]
enum State {
    LocateStartxref,
    Revision(Offset),
    FollowPrev(Option<Offset>),
    Merged,
}

/// Walks the chain of cross-reference sections and streams from the
/// `startxref` offset back through `/Prev`.
pub(crate) struct XRefReader<'source> {
    source: &'source dyn ByteSource,
    registry: &'source FilterRegistry,
    options: ParseOptions,
}

impl<'source> XRefReader<'source> {
    pub(crate) fn new(
        source: &'source dyn ByteSource,
        registry: &'source FilterRegistry,
        options: ParseOptions,
    ) -> Self {
        Self {
            source,
            registry,
            options,
        }
    }

    /// Read the chain, or rebuild the table from a scan of the whole file if
    /// the chain is broken and rebuilding is enabled.
    pub(crate) fn read(&self) -> XRefResult<ReadXRef> {
        match self.read_chain() {
            Ok(read) => Ok(read),
            Err(err) if self.options.rebuild() => {
                warn!("Broken cross-reference chain: {}. Rebuilding", err);
                let (table, trailer) = rebuild(self.source, self.registry, self.options)?;
                Ok(ReadXRef {
                    table,
                    trailer,
                    revisions: Vec::new(),
                    startxref: None,
                    rebuilt: true,
                })
            }
            Err(err) => Err(err),
        }
    }

    fn read_chain(&self) -> XRefResult<ReadXRef> {
        let mut table = XRefTable::default();
        let mut trailer: Option<Trailer> = None;
        let mut revisions: Vec<Offset> = Vec::new();
        let mut startxref = None;

        let mut state = State::LocateStartxref;
        loop {
            state = match state {
                State::LocateStartxref => {
                    let offset = self.locate_startxref()?;
                    startxref = Some(offset);
                    State::Revision(offset)
                }
                State::Revision(offset) => {
                    debug!("Reading cross-reference revision at offset {}", offset);
                    revisions.push(offset);
                    let (revision_table, revision_trailer) = self.revision(offset)?;
                    // Entries of newer revisions shadow those of older ones
                    table.extend_older(revision_table);
                    let prev = revision_trailer.prev();
                    match trailer.as_mut() {
                        Some(trailer) => trailer.inherit(&revision_trailer),
                        None => trailer = Some(revision_trailer),
                    }
                    State::FollowPrev(prev)
                }
                State::FollowPrev(Some(prev)) if revisions.contains(&prev) => {
                    warn!("Cycle in the /Prev chain at offset {}", prev);
                    State::Merged
                }
                State::FollowPrev(Some(prev)) => State::Revision(prev),
                State::FollowPrev(None) => State::Merged,
                State::Merged => break,
            };
        }

        let trailer = trailer.unwrap_or_default();
        if trailer.root().is_none() {
            return Err(MissingEntryError {
                key: KEY_ROOT,
                data_type: stringify!(Reference),
            }
            .into());
        }
        Ok(ReadXRef {
            table,
            trailer,
            revisions,
            startxref,
            rebuilt: false,
        })
    }

    fn locate_startxref(&self) -> XRefResult<Offset> {
        let len = self.source.len();
        let start = len.saturating_sub(STARTXREF_SEARCH_SIZE);
        let tail = self.source.read_at(start, len - start)?;
        let startxref = StartXRef::locate(&tail).map_err(|err| match err.code() {
            ParseErrorCode::MissingKeyword(_) => XRefErr::StartXRefNotFound(tail.len()),
            _ => err.shift(start).into(),
        })?;
        if *startxref >= len {
            return Err(XRefErr::OffsetOutOfBounds(*startxref, len));
        }
        Ok(*startxref)
    }

    /// REFERENCE: [7.5.8.4 Compatibility with applications that do not
    /// support compressed reference streams, p68-69]
    fn revision(&self, offset: Offset) -> XRefResult<(XRefTable, Trailer)> {
        if offset >= self.source.len() {
            return Err(XRefErr::OffsetOutOfBounds(offset, self.source.len()));
        }
        let section = read_growing(self.source, offset, |bytes, complete| {
            Section::parse(bytes, 0, self.options, complete)
        })?;
        match section {
            Ok((_, section)) => {
                let mut table = section.to_table()?;
                let trailer = section.trailer;
                if let Some(xref_stm) = trailer.xref_stm() {
                    // In a hybrid-reference file, the entries of the stream
                    // take precedence over those of the section
                    match self.xref_stream(xref_stm) {
                        Ok(xref_stream) => table.extend_newer(xref_stream.table),
                        Err(err) if self.options.is_strict() => return Err(err),
                        Err(err) => warn!(
                            "Ignoring the cross-reference stream at /XRefStm {}: {}",
                            xref_stm, err
                        ),
                    }
                }
                Ok((table, trailer))
            }
            Err(err) if err.is_failure() => Err(err.into()),
            Err(_) => {
                let xref_stream = self.xref_stream(offset)?;
                Ok((xref_stream.table, xref_stream.trailer))
            }
        }
    }

    /// REFERENCE: [7.5.8 Cross-reference streams, p65]
    ///
    /// The stream is read directly at `offset`, as the table needed to
    /// resolve an indirect `/Length` is not available yet.
    fn xref_stream(&self, offset: Offset) -> XRefResult<XRefStream> {
        if offset >= self.source.len() {
            return Err(XRefErr::OffsetOutOfBounds(offset, self.source.len()));
        }
        let object = read_growing(self.source, offset, |bytes, complete| {
            ObjectParser::new(bytes, self.options)
                .set_complete(complete)
                .parse_indirect_object()
        })?
        .map_err(|err| {
            if err.is_failure() {
                XRefErr::from(err)
            } else {
                XRefErr::NotFound(offset)
            }
        })?;
        match object.into_value() {
            Object::Stream(stream) => XRefStream::from_stream(&stream, self.registry, self.options),
            other => Err(XRefErr::NotXRefStream(offset, other.type_name().to_string())),
        }
    }
}
