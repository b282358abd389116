pub(crate) mod error;
pub(crate) mod reader;
pub(crate) mod rebuild;
pub(crate) mod section;
pub(crate) mod startxref;
pub(crate) mod stream;
pub(crate) mod trailer;

use ::std::collections::btree_map::Iter;
use ::std::collections::BTreeMap;

use crate::GenerationNumber;
use crate::IndexNumber;
use crate::ObjectNumber;
use crate::Offset;

/// REFERENCE: [7.5.4 Cross-reference table, p56]
/// The generation number of a free entry is the one to use if the object
/// number is reused.
pub(crate) const MAX_GENERATION_NUMBER: GenerationNumber = 65535;

/// Where one revision says an object lives.
///
/// REFERENCE: [Table 18 — Entries in a cross-reference stream, p67-68]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum XRefEntry {
    Free {
        next_free: ObjectNumber,
        generation_number: GenerationNumber,
    },
    InUse {
        offset: Offset,
        generation_number: GenerationNumber,
    },
    /// Objects in an object stream implicitly have generation 0.
    Compressed {
        stream: ObjectNumber,
        index: IndexNumber,
    },
}

impl XRefEntry {
    pub fn generation_number(&self) -> GenerationNumber {
        match self {
            Self::Free {
                generation_number, ..
            }
            | Self::InUse {
                generation_number, ..
            } => *generation_number,
            Self::Compressed { .. } => 0,
        }
    }

    pub fn is_free(&self) -> bool {
        matches!(self, Self::Free { .. })
    }
}

/// The merged cross-reference entries of one or more revisions, keyed by
/// object number.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct XRefTable(BTreeMap<ObjectNumber, XRefEntry>);

impl XRefTable {
    /// Returns the entry previously recorded for the object number.
    pub fn insert(&mut self, object_number: ObjectNumber, entry: XRefEntry) -> Option<XRefEntry> {
        self.0.insert(object_number, entry)
    }

    pub fn get(&self, object_number: ObjectNumber) -> Option<&XRefEntry> {
        self.0.get(&object_number)
    }

    pub fn contains(&self, object_number: ObjectNumber) -> bool {
        self.0.contains_key(&object_number)
    }

    pub fn iter(&self) -> Iter<'_, ObjectNumber, XRefEntry> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn max_object_number(&self) -> Option<ObjectNumber> {
        self.0.keys().next_back().copied()
    }

    /// Add the entries of an older revision. Entries already present, i.e.
    /// from a newer revision, shadow them.
    pub fn extend_older(&mut self, older: XRefTable) {
        for (object_number, entry) in older.0 {
            self.0.entry(object_number).or_insert(entry);
        }
    }

    /// Add the entries of `newer`, replacing those already present.
    pub fn extend_newer(&mut self, newer: XRefTable) {
        self.0.extend(newer.0);
    }
}

mod convert {
    use super::*;

    impl FromIterator<(ObjectNumber, XRefEntry)> for XRefTable {
        fn from_iter<T: IntoIterator<Item = (ObjectNumber, XRefEntry)>>(iter: T) -> Self {
            Self(iter.into_iter().collect())
        }
    }

    impl IntoIterator for XRefTable {
        type Item = (ObjectNumber, XRefEntry);
        type IntoIter = <BTreeMap<ObjectNumber, XRefEntry> as IntoIterator>::IntoIter;

        fn into_iter(self) -> Self::IntoIter {
            self.0.into_iter()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn in_use(offset: Offset) -> XRefEntry {
        XRefEntry::InUse {
            offset,
            generation_number: 0,
        }
    }

    #[test]
    fn xref_table_shadowing() {
        let mut newer = XRefTable::default();
        newer.insert(1, in_use(500));
        newer.insert(3, XRefEntry::Compressed { stream: 4, index: 0 });

        let mut older = XRefTable::default();
        older.insert(1, in_use(100));
        older.insert(2, in_use(200));
        newer.extend_older(older);

        assert_eq!(newer.get(1), Some(&in_use(500)));
        assert_eq!(newer.get(2), Some(&in_use(200)));
        assert_eq!(newer.len(), 3);
        assert_eq!(newer.max_object_number(), Some(3));

        let mut stream_entries = XRefTable::default();
        stream_entries.insert(2, XRefEntry::Compressed { stream: 4, index: 1 });
        newer.extend_newer(stream_entries);
        assert_eq!(newer.get(2).map(XRefEntry::generation_number), Some(0));
        assert!(!newer.get(2).unwrap().is_free());
    }
}
