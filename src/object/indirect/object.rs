use ::std::fmt::Display;
use ::std::fmt::Formatter;
use ::std::fmt::Result as FmtResult;

use super::id::Id;
use crate::object::Object;
use crate::parse::KW_ENDOBJ;
use crate::parse::KW_OBJ;
use crate::Byte;

/// REFERENCE: [7.3.10 Indirect objects, p33]
#[derive(Debug, PartialEq, Clone)]
pub struct IndirectObject {
    pub(crate) id: Id,
    pub(crate) value: Object,
}

impl Display for IndirectObject {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{} {}\n{}\n{}", self.id, KW_OBJ, self.value, KW_ENDOBJ)
    }
}

impl IndirectObject {
    pub fn id(&self) -> Id {
        self.id
    }

    pub fn value(&self) -> &Object {
        &self.value
    }

    pub fn into_value(self) -> Object {
        self.value
    }

    pub(crate) fn write_to(&self, out: &mut Vec<Byte>) {
        Self::write_parts(self.id, &self.value, out);
    }

    pub(crate) fn write_parts(id: Id, value: &Object, out: &mut Vec<Byte>) {
        out.extend_from_slice(format!("{} {}\n", id, KW_OBJ).as_bytes());
        value.write_to(out);
        out.push(b'\n');
        out.extend_from_slice(KW_ENDOBJ.as_bytes());
        out.push(b'\n');
    }
}

mod convert {
    use super::*;

    impl IndirectObject {
        pub fn new(id: Id, value: impl Into<Object>) -> Self {
            Self {
                id,
                value: value.into(),
            }
        }
    }
}
