use crate::Byte;

/// Unsigned decimal made only of ASCII digits. `None` on an empty input, on
/// any other byte or on overflow.
pub(crate) fn ascii_to_u64(bytes: &[Byte]) -> Option<u64> {
    if bytes.is_empty() {
        return None;
    }
    bytes.iter().try_fold(0u64, |number, &byte| {
        let digit = char::from(byte).to_digit(10)?;
        number.checked_mul(10)?.checked_add(u64::from(digit))
    })
}

pub(crate) fn ascii_to_usize(bytes: &[Byte]) -> Option<usize> {
    ascii_to_u64(bytes).and_then(|number| usize::try_from(number).ok())
}

pub(crate) fn ascii_to_u32(bytes: &[Byte]) -> Option<u32> {
    ascii_to_u64(bytes).and_then(|number| u32::try_from(number).ok())
}

pub(crate) fn ascii_to_u16(bytes: &[Byte]) -> Option<u16> {
    ascii_to_u64(bytes).and_then(|number| u16::try_from(number).ok())
}

fn split_sign(bytes: &[Byte]) -> (bool, &[Byte]) {
    match bytes.first() {
        Some(b'-') => (true, &bytes[1..]),
        Some(b'+') => (false, &bytes[1..]),
        _ => (false, bytes),
    }
}

/// REFERENCE: [7.3.3 Numeric objects, p24]
pub(crate) fn ascii_to_i64(bytes: &[Byte]) -> Option<i64> {
    let (negative, digits) = split_sign(bytes);
    if digits.is_empty() {
        return None;
    }
    digits.iter().try_fold(0i64, |number, &byte| {
        let digit = i64::from(char::from(byte).to_digit(10)?);
        let number = number.checked_mul(10)?;
        if negative {
            number.checked_sub(digit)
        } else {
            number.checked_add(digit)
        }
    })
}

/// REFERENCE: [7.3.3 Numeric objects, p24]
/// More restrictive than `str::parse::<f64>` as the exponent notation is not
/// part of the PDF syntax. Integers are accepted as well.
pub(crate) fn ascii_to_f64(bytes: &[Byte]) -> Option<f64> {
    let (_, digits) = split_sign(bytes);
    let mut seen_digit = false;
    let mut seen_point = false;
    for &byte in digits {
        match byte {
            b'0'..=b'9' => seen_digit = true,
            b'.' if !seen_point => seen_point = true,
            _ => return None,
        }
    }
    if !seen_digit {
        return None;
    }
    ::std::str::from_utf8(bytes).ok()?.parse().ok()
}

/// Big-endian unsigned integer of at most eight bytes, as used by the fields
/// of cross-reference stream entries.
pub(crate) fn bytes_to_u64(bytes: &[Byte]) -> Option<u64> {
    bytes.iter().try_fold(0u64, |number, &byte| {
        if number >> 56 != 0 {
            return None;
        }
        Some(number << 8 | u64::from(byte))
    })
}

/// Number of bytes needed to write `value` in big-endian order, at least one.
pub(crate) fn bytes_needed(value: u64) -> usize {
    let bits = u64::BITS - value.leading_zeros();
    (bits as usize).div_ceil(8).max(1)
}

/// Append the `width` least significant bytes of `value`, most significant
/// first.
pub(crate) fn write_be(value: u64, width: usize, out: &mut Vec<Byte>) {
    let bytes = value.to_be_bytes();
    let width = width.min(bytes.len());
    out.extend_from_slice(&bytes[bytes.len() - width..]);
}

pub(crate) fn hex_val(byte: Byte) -> Option<Byte> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_to_unsigned() {
        assert_eq!(ascii_to_u64(b"0000000017"), Some(17));
        assert_eq!(ascii_to_u64(b""), None);
        assert_eq!(ascii_to_u64(b"1a"), None);
        assert_eq!(ascii_to_u64(b"18446744073709551616"), None);
        assert_eq!(ascii_to_u16(b"65535"), Some(65535));
        assert_eq!(ascii_to_u16(b"65536"), None);
        assert_eq!(ascii_to_u32(b"4294967295"), Some(u32::MAX));
        assert_eq!(ascii_to_usize(b"123"), Some(123));
    }

    #[test]
    fn ascii_to_i64_valid() {
        assert_eq!(ascii_to_i64(b"123"), Some(123));
        assert_eq!(ascii_to_i64(b"+17"), Some(17));
        assert_eq!(ascii_to_i64(b"-98"), Some(-98));
        assert_eq!(ascii_to_i64(b"0"), Some(0));
        assert_eq!(ascii_to_i64(b"-9223372036854775808"), Some(i64::MIN));
    }

    #[test]
    fn ascii_to_i64_invalid() {
        assert_eq!(ascii_to_i64(b"-"), None);
        assert_eq!(ascii_to_i64(b"--1"), None);
        assert_eq!(ascii_to_i64(b"1.0"), None);
        assert_eq!(ascii_to_i64(b"9223372036854775808"), None);
    }

    #[test]
    fn ascii_to_f64_valid() {
        assert_eq!(ascii_to_f64(b"34.5"), Some(34.5));
        assert_eq!(ascii_to_f64(b"-3.62"), Some(-3.62));
        assert_eq!(ascii_to_f64(b"+123.6"), Some(123.6));
        assert_eq!(ascii_to_f64(b"4."), Some(4.0));
        assert_eq!(ascii_to_f64(b"-.002"), Some(-0.002));
        assert_eq!(ascii_to_f64(b"0.0"), Some(0.0));
        assert_eq!(ascii_to_f64(b"42"), Some(42.0));
    }

    #[test]
    fn ascii_to_f64_invalid() {
        assert_eq!(ascii_to_f64(b"."), None);
        assert_eq!(ascii_to_f64(b"-"), None);
        assert_eq!(ascii_to_f64(b"1.2.3"), None);
        assert_eq!(ascii_to_f64(b"6.02e23"), None);
        assert_eq!(ascii_to_f64(b"inf"), None);
    }

    #[test]
    fn big_endian() {
        assert_eq!(bytes_to_u64(b""), Some(0));
        assert_eq!(bytes_to_u64(&[0x01, 0x02]), Some(0x0102));
        assert_eq!(bytes_to_u64(&[0; 9]), Some(0));
        assert_eq!(bytes_to_u64(&[1, 0, 0, 0, 0, 0, 0, 0, 0]), None);

        assert_eq!(bytes_needed(0), 1);
        assert_eq!(bytes_needed(255), 1);
        assert_eq!(bytes_needed(256), 2);
        assert_eq!(bytes_needed(u64::MAX), 8);

        let mut out = Vec::new();
        write_be(0x0102, 3, &mut out);
        assert_eq!(out, [0x00, 0x01, 0x02]);
    }

    #[test]
    fn hex_val_valid() {
        assert_eq!(hex_val(b'0'), Some(0));
        assert_eq!(hex_val(b'a'), Some(10));
        assert_eq!(hex_val(b'F'), Some(15));
        assert_eq!(hex_val(b'g'), None);
    }
}
