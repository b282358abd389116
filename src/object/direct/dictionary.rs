use ::indexmap::IndexMap;
use ::std::fmt::Display;
use ::std::fmt::Formatter;
use ::std::fmt::Result as FmtResult;

use self::error::DataTypeError;
use self::error::MissingEntryError;
use super::array::Array;
use super::name::Name;
use crate::object::indirect::reference::Reference;
use crate::object::Object;
use crate::Byte;

/// REFERENCE: [7.3.7 Dictionary objects, p30-31]
/// Entries keep their insertion order so that a dictionary is written back
/// the way it was read.
#[derive(Debug, Default, Clone)]
pub struct Dictionary(IndexMap<Name, Object>);

impl Display for Dictionary {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let mut out = Vec::new();
        self.write_to(&mut out);
        write!(f, "{}", String::from_utf8_lossy(&out))
    }
}

/// REFERENCE: [7.3.7 Dictionary objects, p30] and [7.3.9 Null object, p33]
/// An entry whose value is null is equivalent to an absent entry.
impl PartialEq for Dictionary {
    fn eq(&self, other: &Self) -> bool {
        let present = |dictionary: &Self| {
            dictionary
                .values()
                .filter(|value| !value.is_null())
                .count()
        };
        present(self) == present(other)
            && self
                .iter()
                .filter(|(_, value)| !value.is_null())
                .all(|(key, value)| other.0.get(key) == Some(value))
    }
}

impl Dictionary {
    pub fn insert(&mut self, key: impl Into<Name>, value: impl Into<Object>) -> Option<Object> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Object> {
        self.0.get(key.as_bytes())
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Object> {
        self.0.get_mut(key.as_bytes())
    }

    /// Remove an entry, keeping the order of the others.
    pub fn remove(&mut self, key: &str) -> Option<Object> {
        self.0.shift_remove(key.as_bytes())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key.as_bytes())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Name, &Object)> {
        self.0.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &Name> {
        self.0.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &Object> {
        self.0.values()
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut Object> {
        self.0.values_mut()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Null entries are omitted.
    pub(crate) fn write_to(&self, out: &mut Vec<Byte>) {
        out.extend_from_slice(b"<<");
        let mut first = true;
        for (key, value) in self.iter().filter(|(_, value)| !value.is_null()) {
            if !first {
                out.push(b' ');
            }
            first = false;
            key.write_to(out);
            out.push(b' ');
            value.write_to(out);
        }
        out.extend_from_slice(b">>");
    }
}

mod convert {
    use super::*;

    impl FromIterator<(Name, Object)> for Dictionary {
        fn from_iter<T: IntoIterator<Item = (Name, Object)>>(iter: T) -> Self {
            Self(IndexMap::from_iter(iter))
        }
    }

    impl IntoIterator for Dictionary {
        type Item = (Name, Object);
        type IntoIter = <IndexMap<Name, Object> as IntoIterator>::IntoIter;

        fn into_iter(self) -> Self::IntoIter {
            self.0.into_iter()
        }
    }

    impl Dictionary {
        fn typed<'dictionary, T>(
            &'dictionary self,
            key: &'static str,
            expected_type: &'static str,
            convert: impl FnOnce(&'dictionary Object) -> Option<T>,
        ) -> Result<Option<T>, DataTypeError> {
            match self.get(key) {
                None | Some(Object::Null) => Ok(None),
                Some(value) => convert(value).map(Some).ok_or_else(|| DataTypeError {
                    entry: key,
                    expected_type,
                    value: value.to_string(),
                }),
            }
        }

        pub fn get_name(&self, key: &'static str) -> Result<Option<&Name>, DataTypeError> {
            self.typed(key, stringify!(Name), Object::as_name)
        }

        pub fn get_i64(&self, key: &'static str) -> Result<Option<i64>, DataTypeError> {
            self.typed(key, stringify!(i64), Object::as_i64)
        }

        pub fn get_u64(&self, key: &'static str) -> Result<Option<u64>, DataTypeError> {
            self.typed(key, stringify!(u64), Object::as_u64)
        }

        pub fn get_usize(&self, key: &'static str) -> Result<Option<usize>, DataTypeError> {
            self.typed(key, stringify!(usize), Object::as_usize)
        }

        pub fn get_array(&self, key: &'static str) -> Result<Option<&Array>, DataTypeError> {
            self.typed(key, stringify!(Array), Object::as_array)
        }

        pub fn get_dictionary(
            &self,
            key: &'static str,
        ) -> Result<Option<&Dictionary>, DataTypeError> {
            self.typed(key, stringify!(Dictionary), |value| match value {
                Object::Dictionary(dictionary) => Some(dictionary),
                _ => None,
            })
        }

        pub fn get_reference(
            &self,
            key: &'static str,
        ) -> Result<Option<Reference>, DataTypeError> {
            self.typed(key, stringify!(Reference), Object::as_reference)
        }

        pub(crate) fn required_usize(
            &self,
            key: &'static str,
        ) -> Result<usize, error::DictionaryErr> {
            self.get_usize(key)?
                .ok_or(MissingEntryError {
                    key,
                    data_type: stringify!(usize),
                })
                .map_err(Into::into)
        }
    }
}

pub(crate) mod error {
    use ::thiserror::Error;

    use crate::impl_from;

    #[derive(Debug, Error, PartialEq, Clone)]
    #[error("Data type. Entry /{entry}. Expected a {expected_type} value, found {value}")]
    pub struct DataTypeError {
        pub(crate) entry: &'static str,
        pub(crate) expected_type: &'static str,
        pub(crate) value: String,
    }

    #[derive(Debug, Error, PartialEq, Clone, Copy)]
    #[error("Missing required entry. Key /{key}. Expected a {data_type} value")]
    pub struct MissingEntryError {
        pub(crate) key: &'static str,
        pub(crate) data_type: &'static str,
    }

    #[derive(Debug, Error, PartialEq, Clone)]
    pub enum DictionaryErr {
        #[error("{0}")]
        DataType(#[from] DataTypeError),
        #[error("{0}")]
        MissingEntry(MissingEntryError),
    }

    impl_from!(MissingEntryError, MissingEntry, DictionaryErr);
}
