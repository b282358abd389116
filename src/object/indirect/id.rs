use ::std::fmt::Display;
use ::std::fmt::Formatter;
use ::std::fmt::Result as FmtResult;

use crate::GenerationNumber;
use crate::ObjectNumber;

/// REFERENCE: [7.3.10 Indirect Objects, p33]
/// The object identifier shall consist of two parts:
/// - A positive integer object number.
/// - A non-negative integer generation number.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, PartialOrd, Ord, Default)]
pub struct Id {
    pub(crate) object_number: ObjectNumber,
    pub(crate) generation_number: GenerationNumber,
}

impl Display for Id {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{} {}", self.object_number, self.generation_number)
    }
}

impl Id {
    pub fn object_number(&self) -> ObjectNumber {
        self.object_number
    }

    pub fn generation_number(&self) -> GenerationNumber {
        self.generation_number
    }
}

mod convert {
    use super::*;

    impl Id {
        pub fn new(object_number: ObjectNumber, generation_number: GenerationNumber) -> Self {
            Self {
                object_number,
                generation_number,
            }
        }
    }

    impl From<(ObjectNumber, GenerationNumber)> for Id {
        fn from((object_number, generation_number): (ObjectNumber, GenerationNumber)) -> Self {
            Self::new(object_number, generation_number)
        }
    }
}
