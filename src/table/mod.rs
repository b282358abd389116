pub(crate) mod error;

use ::std::collections::btree_map::Iter;
use ::std::collections::BTreeMap;
use ::std::sync::Arc;

use self::error::TableErr;
use self::error::TableResult;
use crate::object::indirect::id::Id;
use crate::object::Object;
use crate::xref::XRefEntry;
use crate::xref::XRefTable;
use crate::xref::MAX_GENERATION_NUMBER;
use crate::GenerationNumber;
use crate::IndexNumber;
use crate::ObjectNumber;
use crate::Offset;

/// REFERENCE: [7.5.4 Cross-reference table, p56-57]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    /// Not in use. The generation is the one to use if the number is reused.
    Free,
    /// As found in the source. Loaded lazily.
    InUse,
    /// Changed or created since the document was opened or last saved.
    Modified,
    /// Written and evicted from memory. Re-read from its location on access.
    Flushed,
}

/// Where the bytes of an object can be read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Offset(Offset),
    Compressed {
        stream: ObjectNumber,
        index: IndexNumber,
    },
    /// Only in memory.
    None,
}

#[derive(Debug, Clone)]
pub(crate) struct Entry {
    generation: GenerationNumber,
    state: EntryState,
    location: Location,
    value: Option<Arc<Object>>,
    resolving: bool,
    /// Changed since the last save, including freed.
    dirty: bool,
}

impl Entry {
    fn new(generation: GenerationNumber, state: EntryState, location: Location) -> Self {
        Self {
            generation,
            state,
            location,
            value: None,
            resolving: false,
            dirty: false,
        }
    }

    pub(crate) fn generation(&self) -> GenerationNumber {
        self.generation
    }

    pub(crate) fn state(&self) -> EntryState {
        self.state
    }

    pub(crate) fn location(&self) -> Location {
        self.location
    }

    pub(crate) fn value(&self) -> Option<&Arc<Object>> {
        self.value.as_ref()
    }

    pub(crate) fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn is_free(&self) -> bool {
        self.state == EntryState::Free
    }
}

/// The indirect objects of a document, keyed by object number.
///
/// Values are loaded on first access and shared as `Arc`s, so readers of
/// memoised values do not need to borrow the table.
#[derive(Debug, Clone, Default)]
pub(crate) struct IndirectTable {
    entries: BTreeMap<ObjectNumber, Entry>,
}

impl IndirectTable {
    /// Entries of the merged cross-reference table. Object 0 is not kept.
    pub(crate) fn from_xref(xref: &XRefTable) -> Self {
        let mut table = Self::default();
        for (&object_number, entry) in xref.iter() {
            let (generation, state, location) = match *entry {
                XRefEntry::Free {
                    generation_number, ..
                } => (generation_number, EntryState::Free, Location::None),
                XRefEntry::InUse {
                    offset,
                    generation_number,
                } => (generation_number, EntryState::InUse, Location::Offset(offset)),
                XRefEntry::Compressed { stream, index } => {
                    (0, EntryState::InUse, Location::Compressed { stream, index })
                }
            };
            table.register(object_number, generation, location, state);
        }
        table
    }

    /// Record an entry unless the object number is already known, e.g. from
    /// a more recent revision. Returns whether the entry was recorded.
    pub(crate) fn register(
        &mut self,
        object_number: ObjectNumber,
        generation: GenerationNumber,
        location: Location,
        state: EntryState,
    ) -> bool {
        if object_number == 0 || self.entries.contains_key(&object_number) {
            return false;
        }
        self.entries
            .insert(object_number, Entry::new(generation, state, location));
        true
    }

    /// Reserve an identifier for a new object.
    ///
    /// The lowest free number whose generation can still grow is reused,
    /// otherwise the next number after the highest in use.
    pub(crate) fn allocate(&mut self) -> TableResult<Id> {
        let reusable = self
            .entries
            .iter()
            .find(|(_, entry)| entry.is_free() && entry.generation < MAX_GENERATION_NUMBER)
            .map(|(&object_number, _)| object_number);
        let object_number = match reusable {
            Some(object_number) => object_number,
            None => self
                .entries
                .keys()
                .next_back()
                .map_or(Some(1), |max| max.checked_add(1))
                .ok_or(TableErr::Exhausted)?,
        };
        let generation = self
            .entries
            .get(&object_number)
            .map_or(0, |entry| entry.generation);
        let mut entry = Entry::new(generation, EntryState::Modified, Location::None);
        entry.dirty = true;
        self.entries.insert(object_number, entry);
        Ok(Id::new(object_number, generation))
    }

    /// REFERENCE: [Table 18 — Entries in a cross-reference stream, p67]
    /// Reserve the number after the highest known, with generation 0.
    /// Containers of compressed objects are referred to by number only.
    pub(crate) fn append(&mut self) -> TableResult<Id> {
        let object_number = self
            .entries
            .keys()
            .next_back()
            .map_or(Some(1), |max| max.checked_add(1))
            .ok_or(TableErr::Exhausted)?;
        let mut entry = Entry::new(0, EntryState::Modified, Location::None);
        entry.dirty = true;
        self.entries.insert(object_number, entry);
        Ok(Id::new(object_number, 0))
    }

    pub(crate) fn lookup(&self, object_number: ObjectNumber) -> Option<&Entry> {
        self.entries.get(&object_number)
    }

    fn lookup_mut(&mut self, object_number: ObjectNumber) -> TableResult<&mut Entry> {
        if object_number == 0 {
            return Err(TableErr::ObjectZero);
        }
        self.entries
            .get_mut(&object_number)
            .ok_or(TableErr::NotFound(object_number))
    }

    /// Idempotent. A free object cannot be modified.
    pub(crate) fn mark_modified(&mut self, object_number: ObjectNumber) -> TableResult<()> {
        let entry = self.lookup_mut(object_number)?;
        if entry.is_free() {
            return Err(TableErr::Free(object_number));
        }
        entry.state = EntryState::Modified;
        entry.dirty = true;
        Ok(())
    }

    /// Replace the value of an object, marking it modified.
    pub(crate) fn set_value(
        &mut self,
        object_number: ObjectNumber,
        value: Arc<Object>,
    ) -> TableResult<()> {
        self.mark_modified(object_number)?;
        self.lookup_mut(object_number)?.value = Some(value);
        Ok(())
    }

    /// REFERENCE: [7.5.4 Cross-reference table, p57]
    /// Returns the generation number recorded for the next use of the
    /// number.
    pub(crate) fn free(&mut self, object_number: ObjectNumber) -> TableResult<GenerationNumber> {
        let entry = self.lookup_mut(object_number)?;
        if entry.is_free() {
            return Err(TableErr::Free(object_number));
        }
        entry.generation = entry.generation.saturating_add(1);
        entry.state = EntryState::Free;
        entry.location = Location::None;
        entry.value = None;
        entry.dirty = true;
        Ok(entry.generation)
    }

    /// Keep the value of an object read from the source.
    pub(crate) fn memoize(&mut self, object_number: ObjectNumber, value: Arc<Object>) {
        if let Some(entry) = self.entries.get_mut(&object_number) {
            if entry.state == EntryState::Flushed {
                entry.state = EntryState::InUse;
            }
            entry.value = Some(value);
        }
    }

    /// Flag the object as being loaded. Loading it again before
    /// `end_resolve` is a cycle.
    pub(crate) fn begin_resolve(&mut self, object_number: ObjectNumber) -> TableResult<()> {
        let entry = self.lookup_mut(object_number)?;
        if entry.resolving {
            return Err(TableErr::Cycle(object_number));
        }
        entry.resolving = true;
        Ok(())
    }

    pub(crate) fn end_resolve(&mut self, object_number: ObjectNumber) {
        if let Some(entry) = self.entries.get_mut(&object_number) {
            entry.resolving = false;
        }
    }

    /// Drop the value of a saved object, keeping its location.
    pub(crate) fn flush(&mut self, object_number: ObjectNumber) -> TableResult<()> {
        let entry = self.lookup_mut(object_number)?;
        match (entry.state, entry.location) {
            (EntryState::Free, _) => Err(TableErr::Free(object_number)),
            (EntryState::Modified, _) | (_, Location::None) => {
                Err(TableErr::Unsaved(object_number))
            }
            (EntryState::InUse | EntryState::Flushed, _) => {
                entry.state = EntryState::Flushed;
                entry.value = None;
                Ok(())
            }
        }
    }

    /// Record where a saved object now lives. Its changes are saved.
    pub(crate) fn set_location(&mut self, object_number: ObjectNumber, location: Location) {
        if let Some(entry) = self.entries.get_mut(&object_number) {
            entry.location = location;
            if entry.state == EntryState::Modified {
                entry.state = EntryState::InUse;
            }
            entry.dirty = false;
        }
    }

    /// Clear the changes of a saved free entry.
    pub(crate) fn mark_saved(&mut self, object_number: ObjectNumber) {
        if let Some(entry) = self.entries.get_mut(&object_number) {
            entry.dirty = false;
        }
    }

    pub(crate) fn iter(&self) -> Iter<'_, ObjectNumber, Entry> {
        self.entries.iter()
    }

    /// One more than the highest object number.
    pub(crate) fn size(&self) -> usize {
        self.entries
            .keys()
            .next_back()
            .map_or(1, |max| *max as usize + 1)
    }

    /// The free object numbers, ascending, with the generation numbers to use
    /// if reused.
    pub(crate) fn free_list(&self) -> Vec<(ObjectNumber, GenerationNumber)> {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.is_free())
            .map(|(&object_number, entry)| (object_number, entry.generation))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_err_eq;

    fn table() -> IndirectTable {
        let mut xref = XRefTable::default();
        xref.insert(
            0,
            XRefEntry::Free {
                next_free: 3,
                generation_number: 65535,
            },
        );
        xref.insert(
            1,
            XRefEntry::InUse {
                offset: 9,
                generation_number: 0,
            },
        );
        xref.insert(
            2,
            XRefEntry::InUse {
                offset: 50,
                generation_number: 1,
            },
        );
        xref.insert(
            3,
            XRefEntry::Free {
                next_free: 0,
                generation_number: 2,
            },
        );
        xref.insert(4, XRefEntry::Compressed { stream: 2, index: 0 });
        IndirectTable::from_xref(&xref)
    }

    #[test]
    fn table_from_xref() {
        let table = table();
        assert!(table.lookup(0).is_none());
        assert_eq!(table.size(), 5);
        let entry = table.lookup(2).unwrap();
        assert_eq!(entry.generation(), 1);
        assert_eq!(entry.state(), EntryState::InUse);
        assert_eq!(entry.location(), Location::Offset(50));
        assert_eq!(
            table.lookup(4).unwrap().location(),
            Location::Compressed { stream: 2, index: 0 }
        );
        assert_eq!(table.free_list(), [(3, 2)]);
    }

    #[test]
    fn table_register_never_overwrites() {
        let mut table = table();
        assert!(!table.register(1, 0, Location::Offset(1000), EntryState::InUse));
        assert_eq!(table.lookup(1).unwrap().location(), Location::Offset(9));
        assert!(table.register(7, 0, Location::Offset(1000), EntryState::InUse));
        assert!(!table.register(0, 0, Location::Offset(1000), EntryState::InUse));
    }

    #[test]
    fn table_allocate() {
        let mut table = table();
        // Reuses the free number with its recorded generation
        assert_eq!(table.allocate(), Ok(Id::new(3, 2)));
        assert_eq!(table.lookup(3).unwrap().state(), EntryState::Modified);
        assert!(table.lookup(3).unwrap().is_dirty());
        // Then appends
        assert_eq!(table.allocate(), Ok(Id::new(5, 0)));
        assert_eq!(table.size(), 6);

        let mut table = IndirectTable::default();
        assert_eq!(table.allocate(), Ok(Id::new(1, 0)));

        let mut table = self::table();
        assert_eq!(table.append(), Ok(Id::new(5, 0)));
        assert_eq!(table.lookup(3).unwrap().state(), EntryState::Free);
    }

    #[test]
    fn table_free_and_reuse() {
        let mut table = table();
        assert_eq!(table.free(1), Ok(1));
        assert_err_eq!(table.free(1), TableErr::Free(1));
        assert_eq!(table.lookup(1).unwrap().state(), EntryState::Free);
        assert_eq!(table.lookup(1).unwrap().location(), Location::None);
        // The lowest free number is reused, one generation up
        assert_eq!(table.allocate(), Ok(Id::new(1, 1)));

        // A number whose generation cannot grow is not reused
        table.register(8, MAX_GENERATION_NUMBER, Location::None, EntryState::Free);
        assert_eq!(table.allocate(), Ok(Id::new(3, 2)));
        assert_eq!(table.allocate(), Ok(Id::new(9, 0)));
    }

    #[test]
    fn table_mark_modified() {
        let mut table = table();
        assert_eq!(table.mark_modified(1), Ok(()));
        assert_eq!(table.mark_modified(1), Ok(()));
        assert_eq!(table.lookup(1).unwrap().state(), EntryState::Modified);
        assert_err_eq!(table.mark_modified(3), TableErr::Free(3));
        assert_err_eq!(table.mark_modified(42), TableErr::NotFound(42));
        assert_err_eq!(table.mark_modified(0), TableErr::ObjectZero);

        table.set_location(1, Location::Offset(700));
        let entry = table.lookup(1).unwrap();
        assert_eq!(entry.state(), EntryState::InUse);
        assert_eq!(entry.location(), Location::Offset(700));
        assert!(!entry.is_dirty());
    }

    #[test]
    fn table_resolve_cycle() {
        let mut table = table();
        assert_eq!(table.begin_resolve(1), Ok(()));
        assert_err_eq!(table.begin_resolve(1), TableErr::Cycle(1));
        table.end_resolve(1);
        assert_eq!(table.begin_resolve(1), Ok(()));
    }

    #[test]
    fn table_flush() {
        let mut table = table();
        table.memoize(1, Arc::new(Object::Null));
        assert!(table.lookup(1).unwrap().value().is_some());
        assert_eq!(table.flush(1), Ok(()));
        let entry = table.lookup(1).unwrap();
        assert_eq!(entry.state(), EntryState::Flushed);
        assert!(entry.value().is_none());
        assert_eq!(entry.location(), Location::Offset(9));
        // Re-read
        table.memoize(1, Arc::new(Object::Null));
        assert_eq!(table.lookup(1).unwrap().state(), EntryState::InUse);

        table.set_value(2, Arc::new(Object::from(1))).unwrap();
        assert_err_eq!(table.flush(2), TableErr::Unsaved(2));
        assert_err_eq!(table.flush(3), TableErr::Free(3));
    }
}
