use ::std::fmt::Display;
use ::std::fmt::Formatter;
use ::std::fmt::Result as FmtResult;
use ::std::hash::Hash;
use ::std::hash::Hasher;
use ::std::ops::Deref;

use crate::fmt::write_hex;
use crate::Byte;

/// How a string is written back. Reading either form yields the same bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StringFormat {
    #[default]
    Literal,
    Hexadecimal,
}

/// REFERENCE: [7.3.4 String objects, p25-28]
/// The bytes are stored unescaped. Equality ignores the format.
#[derive(Debug, Clone, Default)]
pub struct String_ {
    bytes: Vec<Byte>,
    format: StringFormat,
}

impl PartialEq for String_ {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl Eq for String_ {}

impl Hash for String_ {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bytes.hash(state);
    }
}

impl Display for String_ {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let mut out = Vec::new();
        self.write_to(&mut out);
        write!(f, "{}", String::from_utf8_lossy(&out))
    }
}

impl Deref for String_ {
    type Target = [Byte];

    fn deref(&self) -> &Self::Target {
        &self.bytes
    }
}

impl String_ {
    pub fn format(&self) -> StringFormat {
        self.format
    }

    pub fn bytes(&self) -> &[Byte] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<Byte> {
        self.bytes
    }

    pub(crate) fn write_to(&self, out: &mut Vec<Byte>) {
        match self.format {
            StringFormat::Literal => {
                out.push(b'(');
                for &byte in &self.bytes {
                    match byte {
                        b'(' | b')' | b'\\' => out.extend_from_slice(&[b'\\', byte]),
                        // A raw carriage return would be read back as a line feed
                        b'\r' => out.extend_from_slice(b"\\r"),
                        _ => out.push(byte),
                    }
                }
                out.push(b')');
            }
            StringFormat::Hexadecimal => {
                out.push(b'<');
                write_hex(&self.bytes, out);
                out.push(b'>');
            }
        }
    }
}

mod convert {
    use super::*;

    impl String_ {
        pub fn literal(bytes: impl Into<Vec<Byte>>) -> Self {
            Self {
                bytes: bytes.into(),
                format: StringFormat::Literal,
            }
        }

        pub fn hexadecimal(bytes: impl Into<Vec<Byte>>) -> Self {
            Self {
                bytes: bytes.into(),
                format: StringFormat::Hexadecimal,
            }
        }
    }

    impl From<&str> for String_ {
        fn from(value: &str) -> Self {
            Self::literal(value.as_bytes())
        }
    }

    impl From<Vec<Byte>> for String_ {
        fn from(value: Vec<Byte>) -> Self {
            Self::literal(value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_write_to() {
        let string = String_::literal(b"a (b) \\ c\r\n".to_vec());
        assert_eq!(string.to_string(), "(a \\(b\\) \\\\ c\\r\n)");

        let string = String_::hexadecimal(b"\x90\x1F\xA0".to_vec());
        assert_eq!(string.to_string(), "<901FA0>");
    }

    #[test]
    fn string_eq_ignores_format() {
        assert_eq!(String_::literal(b"Hello".to_vec()), String_::hexadecimal(b"Hello".to_vec()));
        assert_ne!(String_::from("Hello"), String_::from("World"));
        assert_eq!(&*String_::from("abc"), b"abc");
    }
}
