use ::std::fmt::Display;
use ::std::fmt::Formatter;
use ::std::fmt::Result as FmtResult;
use ::std::ops::Deref;

use super::id::Id;
use crate::parse::KW_R;
use crate::Byte;
use crate::GenerationNumber;
use crate::ObjectNumber;

/// REFERENCE: [7.3.10 Indirect Objects, p33]
/// A handle into the indirect table of a document. It never owns its target.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, PartialOrd, Ord)]
pub struct Reference(Id);

impl Display for Reference {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{} {}", self.0, KW_R)
    }
}

impl Deref for Reference {
    type Target = Id;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Reference {
    pub fn id(&self) -> Id {
        self.0
    }

    pub(crate) fn write_to(&self, out: &mut Vec<Byte>) {
        out.extend_from_slice(self.to_string().as_bytes());
    }
}

mod convert {
    use super::*;

    impl Reference {
        pub fn new(object_number: ObjectNumber, generation_number: GenerationNumber) -> Self {
            Self(Id::new(object_number, generation_number))
        }
    }

    impl From<Id> for Reference {
        fn from(id: Id) -> Self {
            Self(id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_write_to() {
        let mut out = Vec::new();
        Reference::new(12, 3).write_to(&mut out);
        assert_eq!(out, b"12 3 R");
        assert_eq!(Reference::new(1, 0).object_number(), 1);
        assert_eq!(Reference::from(Id::new(4, 0)).id(), Id::new(4, 0));
    }
}
