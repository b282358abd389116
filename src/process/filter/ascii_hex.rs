use self::error::AHxErrorCode;
use super::Filter;
use crate::fmt::write_hex;
use crate::parse::character_set::is_white_space;
use crate::parse::num::hex_val;
use crate::process::filter::error::FilterResult;
use crate::Byte;

const EOD: Byte = b'>';

/// ASCII hexadecimal filter.
#[derive(Debug, PartialEq, Clone, Copy)]
pub(crate) struct AHx;

impl Filter for AHx {
    fn filter(&self, bytes: impl Into<Vec<Byte>> + AsRef<[Byte]>) -> FilterResult<Vec<Byte>> {
        let bytes = bytes.as_ref();
        let mut filtered = Vec::with_capacity(bytes.len() * 2 + 1);
        write_hex(bytes, &mut filtered);
        filtered.push(EOD);
        Ok(filtered)
    }

    /// REFERENCE: [7.4.2 ASCIIHexDecode filter, p37]
    fn defilter(&self, bytes: impl Into<Vec<Byte>> + AsRef<[Byte]>) -> FilterResult<Vec<Byte>> {
        let bytes = bytes.as_ref();
        let mut defiltered = Vec::with_capacity(bytes.len() / 2 + 1);
        let mut high: Option<Byte> = None;
        let mut digits = bytes.iter().copied().filter(|&byte| !is_white_space(byte));
        for byte in digits.by_ref() {
            if byte == EOD {
                break;
            }
            let value = hex_val(byte).ok_or(AHxErrorCode::InvalidHexDigit(char::from(byte)))?;
            match high.take() {
                Some(high) => defiltered.push(high << 4 | value),
                None => high = Some(value),
            }
        }
        if let Some(byte) = digits.next() {
            return Err(AHxErrorCode::AfterEod(char::from(byte)).into());
        }
        // An odd final digit is followed by an implied 0
        if let Some(high) = high {
            defiltered.push(high << 4);
        }
        Ok(defiltered)
    }
}

pub(in crate::process::filter) mod error {
    use ::thiserror::Error;

    #[derive(Debug, Error, PartialEq, Clone, Copy)]
    pub enum AHxErrorCode {
        #[error("Invalid ASCII hexadecimal digit: {0}")]
        InvalidHexDigit(char),
        #[error("Unexpected character after the EOD marker: {0}")]
        AfterEod(char),
    }
}
