use self::error::A85ErrorCode;
use super::Filter;
use crate::parse::character_set::is_white_space;
use crate::process::filter::error::FilterResult;
use crate::Byte;

const FIRST_DIGIT: Byte = b'!';
const LAST_DIGIT: Byte = b'u';
const ZERO_GROUP: Byte = b'z';
const EOD: &[Byte; 2] = b"~>";

/// ASCII base-85 filter.
#[derive(Debug, PartialEq, Clone, Copy)]
pub(crate) struct A85;

impl Filter for A85 {
    fn filter(&self, bytes: impl Into<Vec<Byte>> + AsRef<[Byte]>) -> FilterResult<Vec<Byte>> {
        let bytes = bytes.as_ref();
        let mut filtered = Vec::with_capacity(bytes.len() * 5 / 4 + EOD.len() + 1);
        for chunk in bytes.chunks(4) {
            let mut group = [0; 4];
            group[..chunk.len()].copy_from_slice(chunk);
            let value = u32::from_be_bytes(group);
            if value == 0 && chunk.len() == 4 {
                filtered.push(ZERO_GROUP);
                continue;
            }
            let digits = encode_group(value);
            // A final partial group of n bytes is written as n + 1 digits
            filtered.extend_from_slice(&digits[..chunk.len() + 1]);
        }
        filtered.extend_from_slice(EOD);
        Ok(filtered)
    }

    /// REFERENCE: [7.4.3 ASCII85Decode filter, p37-39]
    fn defilter(&self, bytes: impl Into<Vec<Byte>> + AsRef<[Byte]>) -> FilterResult<Vec<Byte>> {
        let bytes = bytes.as_ref();
        let mut defiltered = Vec::with_capacity(bytes.len() * 4 / 5 + 4);
        let mut group = Vec::with_capacity(5);
        let mut significant = bytes.iter().copied().filter(|&byte| !is_white_space(byte));
        while let Some(byte) = significant.next() {
            match byte {
                b'~' => match significant.next() {
                    Some(b'>') => {
                        if let Some(byte) = significant.next() {
                            return Err(A85ErrorCode::AfterEod(char::from(byte)).into());
                        }
                        break;
                    }
                    Some(byte) => return Err(A85ErrorCode::CorruptEod(char::from(byte)).into()),
                    None => return Err(A85ErrorCode::CorruptEod('~').into()),
                },
                ZERO_GROUP if group.is_empty() => defiltered.extend_from_slice(&[0; 4]),
                ZERO_GROUP => return Err(A85ErrorCode::ZInMiddle(group_string(&group)).into()),
                FIRST_DIGIT..=LAST_DIGIT => {
                    group.push(byte - FIRST_DIGIT);
                    if group.len() == 5 {
                        defiltered.extend_from_slice(&decode_group(&group)?);
                        group.clear();
                    }
                }
                _ => return Err(A85ErrorCode::InvalidBase85Digit(char::from(byte)).into()),
            }
        }
        match group.len() {
            0 => {}
            1 => return Err(A85ErrorCode::FinalPartialGroup(group_string(&group)).into()),
            len => {
                // Pad with the highest digit and keep len - 1 bytes
                let mut padded = group.clone();
                padded.resize(5, LAST_DIGIT - FIRST_DIGIT);
                defiltered.extend_from_slice(&decode_group(&padded)?[..len - 1]);
            }
        }
        Ok(defiltered)
    }
}

fn encode_group(mut value: u32) -> [Byte; 5] {
    let mut digits = [0; 5];
    for digit in digits.iter_mut().rev() {
        *digit = (value % 85) as Byte + FIRST_DIGIT;
        value /= 85;
    }
    digits
}

fn decode_group(group: &[Byte]) -> Result<[Byte; 4], A85ErrorCode> {
    let value = group.iter().try_fold(0u32, |value, &digit| {
        value
            .checked_mul(85)
            .and_then(|value| value.checked_add(u32::from(digit)))
    });
    value
        .map(u32::to_be_bytes)
        .ok_or_else(|| A85ErrorCode::ValueTooLarge(group_string(group)))
}

fn group_string(group: &[Byte]) -> String {
    group
        .iter()
        .map(|&digit| char::from(digit + FIRST_DIGIT))
        .collect()
}

pub(in crate::process::filter) mod error {
    use ::thiserror::Error;

    #[derive(Debug, Error, PartialEq, Clone)]
    pub enum A85ErrorCode {
        #[error("Invalid ASCII base-85 digit: {0}")]
        InvalidBase85Digit(char),
        #[error("Unexpected character after the EOD marker: {0}")]
        AfterEod(char),
        #[error("Value is greater than 2^32 - 1. Group: {0}")]
        ValueTooLarge(String),
        #[error("A z character occurs in the middle of a group: {0}")]
        ZInMiddle(String),
        #[error("A final partial group contains only one character: {0}")]
        FinalPartialGroup(String),
        #[error("Corrupt EOD marker. Expected '>' after '~'. Found: {0}")]
        CorruptEod(char),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_err_eq;

    #[test]
    fn ascii_85_valid() {
        let filtered = b"5p/^0G[Y,o@qfdgC`lYuEbTE(~>";
        let defiltered = A85.defilter(filtered).unwrap();
        assert_eq!(defiltered, b"A Hexadecimal String");
        assert_eq!(A85.filter(defiltered).unwrap(), filtered);

        assert_eq!(A85.filter(b"\0\0\0\0ab").unwrap(), b"z@:B~>");
        assert_eq!(A85.defilter(b"z @:\nB ~>").unwrap(), b"\0\0\0\0ab");
        assert_eq!(A85.defilter(b"").unwrap(), b"");
    }

    #[test]
    fn ascii_85_invalid() {
        assert_err_eq!(
            A85.defilter(b"5p/^0G[Y,o@qfdgC`lYuEbTE(v~>"),
            A85ErrorCode::InvalidBase85Digit('v')
        );
        assert_err_eq!(
            A85.defilter(b"5p/^0G[Y,o@qfdgC`lYuEbTE(~> a"),
            A85ErrorCode::AfterEod('a')
        );
        assert_err_eq!(
            A85.defilter(b"5p/^0 uuuuu~>"),
            A85ErrorCode::ValueTooLarge("uuuuu".to_string())
        );
        assert_err_eq!(
            A85.defilter(b"5p/^0/cz~>"),
            A85ErrorCode::ZInMiddle("/c".to_string())
        );
        assert_err_eq!(
            A85.defilter(b"5p/^0/"),
            A85ErrorCode::FinalPartialGroup("/".to_string())
        );
        assert_err_eq!(
            A85.defilter(b"5p/^0~ a"),
            A85ErrorCode::CorruptEod('a')
        );
    }
}
