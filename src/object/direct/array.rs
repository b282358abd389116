use ::std::fmt::Display;
use ::std::fmt::Formatter;
use ::std::fmt::Result as FmtResult;
use ::std::ops::Deref;
use ::std::ops::DerefMut;

use crate::object::Object;
use crate::Byte;

/// REFERENCE: [7.3.6 Array objects, p29]
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Array(Vec<Object>);

impl Display for Array {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let mut out = Vec::new();
        self.write_to(&mut out);
        write!(f, "{}", String::from_utf8_lossy(&out))
    }
}

impl Deref for Array {
    type Target = Vec<Object>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Array {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl Array {
    pub(crate) fn write_to(&self, out: &mut Vec<Byte>) {
        out.push(b'[');
        for (i, object) in self.0.iter().enumerate() {
            if i > 0 {
                out.push(b' ');
            }
            object.write_to(out);
        }
        out.push(b']');
    }
}

mod convert {
    use super::*;

    impl From<Vec<Object>> for Array {
        fn from(value: Vec<Object>) -> Self {
            Self(value)
        }
    }

    impl FromIterator<Object> for Array {
        fn from_iter<T: IntoIterator<Item = Object>>(iter: T) -> Self {
            Self(Vec::from_iter(iter))
        }
    }

    impl IntoIterator for Array {
        type Item = Object;
        type IntoIter = <Vec<Object> as IntoIterator>::IntoIter;

        fn into_iter(self) -> Self::IntoIter {
            self.0.into_iter()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::direct::name::Name;
    use crate::object::direct::string::String_;

    #[test]
    fn array_write_to() {
        assert_eq!(Array::default().to_string(), "[]");
        let array: Array = [
            Object::from(549),
            3.14.into(),
            false.into(),
            String_::from("Ralph").into(),
            Name::from("SomeName").into(),
            Object::Null,
        ]
        .into_iter()
        .collect();
        assert_eq!(array.to_string(), "[549 3.14 false (Ralph) /SomeName null]");
    }
}
