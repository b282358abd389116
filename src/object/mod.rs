pub(crate) mod direct;
pub(crate) mod indirect;

use ::std::fmt::Display;
use ::std::fmt::Formatter;
use ::std::fmt::Result as FmtResult;

use self::direct::array::Array;
use self::direct::dictionary::Dictionary;
use self::direct::name::Name;
use self::direct::numeric::Numeric;
use self::direct::string::String_;
use self::indirect::reference::Reference;
use self::indirect::stream::Stream;
use crate::parse::KW_FALSE;
use crate::parse::KW_NULL;
use crate::parse::KW_TRUE;
use crate::Byte;

/// REFERENCE: [7.3 Objects, p23]
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Object {
    #[default]
    Null,
    Boolean(bool),
    Numeric(Numeric),
    String(String_),
    Name(Name),
    Array(Array),
    Dictionary(Dictionary),
    Stream(Stream),
    Reference(Reference),
}

impl Display for Object {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            // Stream data is rarely printable
            Self::Stream(stream) => write!(f, "{}", stream),
            _ => write!(f, "{}", String::from_utf8_lossy(&self.to_bytes())),
        }
    }
}

impl Object {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => stringify!(Null),
            Self::Boolean(_) => stringify!(Boolean),
            Self::Numeric(_) => stringify!(Numeric),
            Self::String(_) => stringify!(String),
            Self::Name(_) => stringify!(Name),
            Self::Array(_) => stringify!(Array),
            Self::Dictionary(_) => stringify!(Dictionary),
            Self::Stream(_) => stringify!(Stream),
            Self::Reference(_) => stringify!(Reference),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_numeric(&self) -> Option<Numeric> {
        match self {
            Self::Numeric(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_numeric().and_then(|numeric| numeric.as_i64())
    }

    pub fn as_u64(&self) -> Option<u64> {
        self.as_numeric().and_then(|numeric| numeric.as_u64())
    }

    pub fn as_usize(&self) -> Option<usize> {
        self.as_numeric().and_then(|numeric| numeric.as_usize())
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.as_numeric().map(|numeric| numeric.as_f64())
    }

    pub fn as_string(&self) -> Option<&String_> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_name(&self) -> Option<&Name> {
        match self {
            Self::Name(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Self::Array(value) => Some(value),
            _ => None,
        }
    }

    /// The dictionary of a dictionary object or of a stream.
    pub fn as_dictionary(&self) -> Option<&Dictionary> {
        match self {
            Self::Dictionary(value) => Some(value),
            Self::Stream(stream) => Some(stream.dictionary()),
            _ => None,
        }
    }

    pub fn as_dictionary_mut(&mut self) -> Option<&mut Dictionary> {
        match self {
            Self::Dictionary(value) => Some(value),
            Self::Stream(stream) => Some(stream.dictionary_mut()),
            _ => None,
        }
    }

    pub fn as_stream(&self) -> Option<&Stream> {
        match self {
            Self::Stream(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<Reference> {
        match self {
            Self::Reference(value) => Some(*value),
            _ => None,
        }
    }

    /// Call `visit` on every reference nested in this object.
    pub fn for_each_reference(&self, visit: &mut impl FnMut(Reference)) {
        match self {
            Self::Reference(reference) => visit(*reference),
            Self::Array(array) => {
                for object in array.iter() {
                    object.for_each_reference(&mut *visit);
                }
            }
            Self::Dictionary(dictionary) => {
                for object in dictionary.values() {
                    object.for_each_reference(&mut *visit);
                }
            }
            Self::Stream(stream) => {
                for object in stream.dictionary().values() {
                    object.for_each_reference(&mut *visit);
                }
            }
            _ => {}
        }
    }

    /// Replace with `null` every nested reference for which `keep` is false.
    /// Returns the replaced references.
    pub fn retain_references(
        &mut self,
        keep: &mut impl FnMut(&Reference) -> bool,
    ) -> Vec<Reference> {
        let mut replaced = Vec::new();
        self.retain_references_into(keep, &mut replaced);
        replaced
    }

    fn retain_references_into(
        &mut self,
        keep: &mut impl FnMut(&Reference) -> bool,
        replaced: &mut Vec<Reference>,
    ) {
        if let Self::Reference(reference) = self {
            let reference = *reference;
            if !keep(&reference) {
                replaced.push(reference);
                *self = Self::Null;
            }
            return;
        }
        let objects: Box<dyn Iterator<Item = &mut Object>> = match self {
            Self::Array(array) => Box::new(array.iter_mut()),
            Self::Dictionary(dictionary) => Box::new(dictionary.values_mut()),
            Self::Stream(stream) => Box::new(stream.dictionary_mut().values_mut()),
            _ => return,
        };
        for object in objects {
            object.retain_references_into(&mut *keep, replaced);
        }
    }

    /// Append the PDF syntax of the object to `out`.
    pub fn write_to(&self, out: &mut Vec<Byte>) {
        match self {
            Self::Null => out.extend_from_slice(KW_NULL.as_bytes()),
            Self::Boolean(true) => out.extend_from_slice(KW_TRUE.as_bytes()),
            Self::Boolean(false) => out.extend_from_slice(KW_FALSE.as_bytes()),
            Self::Numeric(value) => value.write_to(out),
            Self::String(value) => value.write_to(out),
            Self::Name(value) => value.write_to(out),
            Self::Array(value) => value.write_to(out),
            Self::Dictionary(value) => value.write_to(out),
            Self::Stream(value) => value.write_to(out),
            Self::Reference(value) => value.write_to(out),
        }
    }

    pub fn to_bytes(&self) -> Vec<Byte> {
        let mut out = Vec::new();
        self.write_to(&mut out);
        out
    }
}

mod convert {
    use super::*;
    use crate::impl_from;

    impl_from!(bool, Boolean, Object);
    impl_from!(Numeric, Numeric, Object);
    impl_from!(i64, Numeric, Object);
    impl_from!(f64, Numeric, Object);
    impl_from!(String_, String, Object);
    impl_from!(Name, Name, Object);
    impl_from!(Array, Array, Object);
    impl_from!(Dictionary, Dictionary, Object);
    impl_from!(Stream, Stream, Object);
    impl_from!(Reference, Reference, Object);

    impl From<usize> for Object {
        fn from(value: usize) -> Self {
            Self::Numeric(Numeric::from(value))
        }
    }

    impl From<i32> for Object {
        fn from(value: i32) -> Self {
            Self::Numeric(Numeric::Integer(i64::from(value)))
        }
    }

    impl From<u32> for Object {
        fn from(value: u32) -> Self {
            Self::Numeric(Numeric::Integer(i64::from(value)))
        }
    }

    impl From<Vec<Object>> for Object {
        fn from(value: Vec<Object>) -> Self {
            Self::Array(value.into())
        }
    }
}
