use ::std::fmt::Display;
use ::std::fmt::Formatter;
use ::std::fmt::Result as FmtResult;

use crate::Byte;

/// REFERENCE: [7.3.3 Numeric objects, p24]
/// The integer/real distinction of the file syntax is kept so that integers
/// are written back without a decimal point. Both kinds compare by value.
#[derive(Debug, Clone, Copy)]
pub enum Numeric {
    Integer(i64),
    Real(f64),
}

impl PartialEq for Numeric {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Integer(a), Self::Integer(b)) => a == b,
            _ => self.as_f64() == other.as_f64(),
        }
    }
}

impl Display for Numeric {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Integer(value) => write!(f, "{}", value),
            // PDF has no representation for NaN and infinities
            Self::Real(value) if !value.is_finite() => write!(f, "0"),
            Self::Real(value) => {
                // `Display` for f64 never uses the exponent notation and
                // prints the shortest representation that reads back the same
                let text = value.to_string();
                if text.contains('.') {
                    write!(f, "{}", text)
                } else {
                    write!(f, "{}.0", text)
                }
            }
        }
    }
}

impl Numeric {
    pub fn as_f64(&self) -> f64 {
        match self {
            Self::Integer(value) => *value as f64,
            Self::Real(value) => *value,
        }
    }

    /// Integral reals such as `5.0` are accepted, as some producers write
    /// lengths and counts that way.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            Self::Real(value) if value.fract() == 0.0 && value.abs() < i64::MAX as f64 => {
                Some(*value as i64)
            }
            Self::Real(_) => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        self.as_i64().and_then(|value| u64::try_from(value).ok())
    }

    pub fn as_usize(&self) -> Option<usize> {
        self.as_i64().and_then(|value| usize::try_from(value).ok())
    }

    pub(crate) fn write_to(&self, out: &mut Vec<Byte>) {
        out.extend_from_slice(self.to_string().as_bytes());
    }
}

mod convert {
    use super::*;

    impl From<i64> for Numeric {
        fn from(value: i64) -> Self {
            Self::Integer(value)
        }
    }

    impl From<f64> for Numeric {
        fn from(value: f64) -> Self {
            Self::Real(value)
        }
    }

    impl From<usize> for Numeric {
        fn from(value: usize) -> Self {
            i64::try_from(value)
                .map(Self::Integer)
                .unwrap_or(Self::Real(value as f64))
        }
    }
}
