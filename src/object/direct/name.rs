use ::std::borrow::Borrow;
use ::std::fmt::Display;
use ::std::fmt::Formatter;
use ::std::fmt::Result as FmtResult;
use ::std::ops::Deref;

use crate::parse::character_set::is_delimiter;
use crate::Byte;

/// REFERENCE: [7.3.5 Name objects, p27-28]
/// The bytes are stored with `#xx` escapes decoded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Name(Vec<Byte>);

impl Display for Name {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let mut out = Vec::new();
        self.write_to(&mut out);
        write!(f, "{}", String::from_utf8_lossy(&out))
    }
}

impl Deref for Name {
    type Target = [Byte];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

// Allows dictionary lookups by byte string without building a `Name`
impl Borrow<[Byte]> for Name {
    fn borrow(&self) -> &[Byte] {
        &self.0
    }
}

impl PartialEq<str> for Name {
    fn eq(&self, other: &str) -> bool {
        self.0 == other.as_bytes()
    }
}

impl PartialEq<&str> for Name {
    fn eq(&self, other: &&str) -> bool {
        self.0 == other.as_bytes()
    }
}

impl Name {
    pub fn as_bytes(&self) -> &[Byte] {
        &self.0
    }

    pub(crate) fn write_to(&self, out: &mut Vec<Byte>) {
        out.push(b'/');
        for &byte in &self.0 {
            // REFERENCE: [7.3.5 Name objects, p27]
            if byte < b'!' || byte > b'~' || byte == b'#' || is_delimiter(byte) {
                out.extend_from_slice(format!("#{:02X}", byte).as_bytes());
            } else {
                out.push(byte);
            }
        }
    }
}

mod convert {
    use super::*;

    impl Name {
        pub fn new(bytes: impl Into<Vec<Byte>>) -> Self {
            Self(bytes.into())
        }
    }

    impl From<&str> for Name {
        fn from(value: &str) -> Self {
            Self(value.as_bytes().to_vec())
        }
    }

    impl From<&[Byte]> for Name {
        fn from(value: &[Byte]) -> Self {
            Self(value.to_vec())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_write_to() {
        assert_eq!(Name::from("Type").to_string(), "/Type");
        assert_eq!(Name::from("").to_string(), "/");
        assert_eq!(
            Name::from("paired()parentheses").to_string(),
            "/paired#28#29parentheses"
        );
        assert_eq!(Name::from("Lime Green").to_string(), "/Lime#20Green");
        assert_eq!(Name::from("F#").to_string(), "/F#23");
        assert_eq!(Name::new(vec![0xC3, 0xA9]).to_string(), "/#C3#A9");
    }

    #[test]
    fn name_eq() {
        assert_eq!(Name::from("Length"), "Length");
        let name = Name::from("Length");
        let borrowed: &[Byte] = name.borrow();
        assert_eq!(borrowed, b"Length");
    }
}
