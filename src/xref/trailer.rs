use ::log::warn;
use ::std::fmt::Display;
use ::std::fmt::Formatter;
use ::std::fmt::Result as FmtResult;

use crate::object::direct::dictionary::Dictionary;
use crate::object::direct::string::String_;
use crate::object::indirect::reference::Reference;
use crate::object::indirect::stream::KEY_DECODEPARMS;
use crate::object::indirect::stream::KEY_DL;
use crate::object::indirect::stream::KEY_F;
use crate::object::indirect::stream::KEY_FDECODEPARMS;
use crate::object::indirect::stream::KEY_FFILTER;
use crate::object::indirect::stream::KEY_FILTER;
use crate::object::indirect::stream::KEY_LENGTH;
use crate::object::Object;
use crate::Offset;

// Common dictionary keys
pub(crate) const KEY_SIZE: &str = "Size";
pub(crate) const KEY_PREV: &str = "Prev";
// Section dictionary keys
pub(crate) const KEY_ENCRYPT: &str = "Encrypt";
pub(crate) const KEY_ID: &str = "ID";
pub(crate) const KEY_INFO: &str = "Info";
pub(crate) const KEY_ROOT: &str = "Root";
// Stream dictionary keys
pub(crate) const KEY_INDEX: &str = "Index";
pub(crate) const KEY_TYPE: &str = "Type";
pub(crate) const KEY_W: &str = "W";
pub(crate) const VAL_XREF: &str = "XRef";
// Hybrid-reference file trailer dictionary keys
pub(crate) const KEY_XREF_STM: &str = "XRefStm";

/// Keys describing the cross-reference stream itself rather than the
/// document.
const STREAM_KEYS: [&str; 10] = [
    KEY_TYPE,
    KEY_W,
    KEY_INDEX,
    KEY_LENGTH,
    KEY_FILTER,
    KEY_DECODEPARMS,
    KEY_F,
    KEY_FFILTER,
    KEY_FDECODEPARMS,
    KEY_DL,
];

/// REFERENCE:
/// - [7.5.5 File trailer, p58-59],
/// - ["Table 15 — Entries in the file trailer dictionary"],
/// - [7.5.8.2 Cross-reference stream dictionary, p66]
#[derive(Debug, PartialEq, Clone, Default)]
pub struct Trailer {
    size: usize,
    prev: Option<Offset>,
    // HACK: Although it is required in the standard, it's not always present,
    // especially in the cross-reference sections of incremental updates
    root: Option<Reference>,
    /// Opaque to this crate. Handed on to an encryption handler.
    encrypt: Option<Object>,
    info: Option<Reference>,
    id: Option<[String_; 2]>,
    xref_stm: Option<Offset>,
    others: Dictionary,
}

impl Display for Trailer {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.to_dictionary())
    }
}

impl Trailer {
    /// The trailer as written in a file, without the cross-reference stream
    /// entries.
    pub fn to_dictionary(&self) -> Dictionary {
        let mut dictionary = Dictionary::default();
        dictionary.insert(KEY_SIZE, self.size);
        if let Some(prev) = self.prev {
            dictionary.insert(KEY_PREV, prev);
        }
        if let Some(root) = self.root {
            dictionary.insert(KEY_ROOT, root);
        }
        if let Some(encrypt) = self.encrypt.as_ref() {
            dictionary.insert(KEY_ENCRYPT, encrypt.clone());
        }
        if let Some(info) = self.info {
            dictionary.insert(KEY_INFO, info);
        }
        if let Some([id_1, id_2]) = self.id.as_ref() {
            dictionary.insert(
                KEY_ID,
                vec![Object::from(id_1.clone()), Object::from(id_2.clone())],
            );
        }
        if let Some(xref_stm) = self.xref_stm {
            dictionary.insert(KEY_XREF_STM, xref_stm);
        }
        for (key, value) in self.others.iter() {
            dictionary.insert(key.clone(), value.clone());
        }
        dictionary
    }

    /// Take the document-level entries missing here from the trailer of an
    /// older revision.
    pub(crate) fn inherit(&mut self, older: &Trailer) {
        // HACK Incremental updates often omit /Root and /Info
        if self.root.is_none() {
            self.root = older.root;
        }
        if self.info.is_none() {
            self.info = older.info;
        }
        if self.encrypt.is_none() {
            self.encrypt = older.encrypt.clone();
        }
        if self.id.is_none() {
            self.id = older.id.clone();
        }
        self.size = self.size.max(older.size);
    }
}

mod convert {
    use super::*;
    use crate::xref::error::XRefErr;

    impl TryFrom<&Dictionary> for Trailer {
        type Error = XRefErr;

        fn try_from(value: &Dictionary) -> Result<Self, Self::Error> {
            let size = value.required_usize(KEY_SIZE)?;
            let prev = value.get_usize(KEY_PREV)?;
            let root = value.get_reference(KEY_ROOT)?;
            let encrypt = value.get(KEY_ENCRYPT).filter(|value| !value.is_null()).cloned();
            let info = value.get_reference(KEY_INFO)?;
            let id = match value.get(KEY_ID) {
                None | Some(Object::Null) => None,
                Some(Object::Array(array)) => match array.as_slice() {
                    [Object::String(id_1), Object::String(id_2)] => {
                        Some([id_1.clone(), id_2.clone()])
                    }
                    _ => {
                        warn!("Ignoring malformed trailer /{}: {}", KEY_ID, array);
                        None
                    }
                },
                Some(other) => {
                    warn!("Ignoring malformed trailer /{}: {}", KEY_ID, other);
                    None
                }
            };
            let xref_stm = value.get_usize(KEY_XREF_STM)?;

            const KNOWN_KEYS: [&str; 7] = [
                KEY_SIZE,
                KEY_PREV,
                KEY_ROOT,
                KEY_ENCRYPT,
                KEY_INFO,
                KEY_ID,
                KEY_XREF_STM,
            ];
            let others: Dictionary = value
                .iter()
                .filter(|(key, _)| {
                    !KNOWN_KEYS.iter().any(|known| *key == known)
                        && !STREAM_KEYS.iter().any(|known| *key == known)
                })
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect();

            Ok(Trailer {
                size,
                prev,
                root,
                encrypt,
                info,
                id,
                xref_stm,
                others,
            })
        }
    }

    impl Trailer {
        pub fn new(size: usize) -> Self {
            Self {
                size,
                ..Default::default()
            }
        }

        pub fn set_size(mut self, size: usize) -> Self {
            self.size = size;
            self
        }

        pub fn set_prev(mut self, prev: Offset) -> Self {
            self.prev.replace(prev);
            self
        }

        pub fn clear_prev(mut self) -> Self {
            self.prev = None;
            self
        }

        pub fn set_root(mut self, root: Reference) -> Self {
            self.root.replace(root);
            self
        }

        pub fn set_encrypt(mut self, encrypt: impl Into<Object>) -> Self {
            self.encrypt.replace(encrypt.into());
            self
        }

        pub fn set_info(mut self, info: Reference) -> Self {
            self.info.replace(info);
            self
        }

        pub fn set_id(mut self, id: [String_; 2]) -> Self {
            self.id.replace(id);
            self
        }

        pub fn set_xref_stm(mut self, xref_stm: Offset) -> Self {
            self.xref_stm.replace(xref_stm);
            self
        }

        pub fn clear_xref_stm(mut self) -> Self {
            self.xref_stm = None;
            self
        }

        pub fn set_others(mut self, others: Dictionary) -> Self {
            self.others = others;
            self
        }

        pub fn size(&self) -> usize {
            self.size
        }

        pub fn prev(&self) -> Option<Offset> {
            self.prev
        }

        pub fn root(&self) -> Option<Reference> {
            self.root
        }

        pub fn encrypt(&self) -> Option<&Object> {
            self.encrypt.as_ref()
        }

        pub fn info(&self) -> Option<Reference> {
            self.info
        }

        pub fn id(&self) -> Option<&[String_; 2]> {
            self.id.as_ref()
        }

        pub fn xref_stm(&self) -> Option<Offset> {
            self.xref_stm
        }

        pub fn others(&self) -> &Dictionary {
            &self.others
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_err_eq;
    use crate::config::ParseOptions;
    use crate::object::direct::dictionary::error::MissingEntryError;
    use crate::parse::object::ObjectParser;
    use crate::xref::error::XRefErr;

    fn dictionary(buffer: &[u8]) -> Dictionary {
        match ObjectParser::new(buffer, ParseOptions::strict()).parse_object() {
            Ok(Object::Dictionary(dictionary)) => dictionary,
            other => panic!("Not a dictionary: {:?}", other),
        }
    }

    #[test]
    fn trailer_valid() {
        let value = dictionary(
            b"<</Size 22 /Root 2 0 R /Info 1 0 R /ID [<81b14aafa313db63dbd6f981e49f94f4> \
              <81b14aafa313db63dbd6f981e49f94f4>] /Prev 116 /Custom (kept)>>",
        );
        let trailer = Trailer::try_from(&value).unwrap();
        assert_eq!(trailer.size(), 22);
        assert_eq!(trailer.root(), Some(Reference::new(2, 0)));
        assert_eq!(trailer.info(), Some(Reference::new(1, 0)));
        assert_eq!(trailer.prev(), Some(116));
        assert_eq!(trailer.id().map(|[id_1, _]| id_1.len()), Some(16));
        assert_eq!(trailer.others().get("Custom"), Some(&String_::from("kept").into()));
        assert_eq!(
            trailer.clear_prev().to_string(),
            "<</Size 22 /Root 2 0 R /Info 1 0 R /ID [<81B14AAFA313DB63DBD6F981E49F94F4> \
             <81B14AAFA313DB63DBD6F981E49F94F4>] /Custom (kept)>>"
        );
    }

    #[test]
    fn trailer_from_stream_dictionary() {
        let value = dictionary(
            b"<</Type /XRef /Size 5 /W [1 2 1] /Index [0 5] /Filter /FlateDecode \
              /Length 20 /Root 1 0 R /XRefStm 300>>",
        );
        let trailer = Trailer::try_from(&value).unwrap();
        assert_eq!(trailer.xref_stm(), Some(300));
        assert!(trailer.others().is_empty());
        assert_eq!(trailer.to_dictionary().get(KEY_TYPE), None);
    }

    #[test]
    fn trailer_invalid() {
        let value = dictionary(b"<</Root 1 0 R>>");
        assert_err_eq!(
            Trailer::try_from(&value),
            XRefErr::Dictionary(
                MissingEntryError {
                    key: KEY_SIZE,
                    data_type: stringify!(usize),
                }
                .into()
            )
        );

        // A malformed /ID is dropped
        let value = dictionary(b"<</Size 1 /ID (single)>>");
        assert_eq!(Trailer::try_from(&value).unwrap().id(), None);
    }
}
