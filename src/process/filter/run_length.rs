use self::error::RLErrorCode;
use super::Filter;
use crate::process::filter::error::FilterResult;
use crate::Byte;

const EOD: Byte = 128;
const MAX_RUN: usize = 128;

/// REFERENCE: [7.4.5 RunLengthDecode filter, p42]
#[derive(Debug, PartialEq, Clone, Copy)]
pub(crate) struct RL;

impl Filter for RL {
    fn filter(&self, bytes: impl Into<Vec<Byte>> + AsRef<[Byte]>) -> FilterResult<Vec<Byte>> {
        let bytes = bytes.as_ref();
        let mut filtered = Vec::with_capacity(bytes.len() + bytes.len() / MAX_RUN + 2);
        let mut literal_start = 0;
        let mut index = 0;
        while index < bytes.len() {
            let byte = bytes[index];
            let run = bytes[index..]
                .iter()
                .take(MAX_RUN)
                .take_while(|&&next| next == byte)
                .count();
            if run < 2 {
                index += 1;
                if index - literal_start == MAX_RUN {
                    write_literal(&bytes[literal_start..index], &mut filtered);
                    literal_start = index;
                }
                continue;
            }
            write_literal(&bytes[literal_start..index], &mut filtered);
            // A run of n bytes is written as 257 - n
            filtered.push((257 - run) as Byte);
            filtered.push(byte);
            index += run;
            literal_start = index;
        }
        write_literal(&bytes[literal_start..], &mut filtered);
        filtered.push(EOD);
        Ok(filtered)
    }

    fn defilter(&self, bytes: impl Into<Vec<Byte>> + AsRef<[Byte]>) -> FilterResult<Vec<Byte>> {
        let bytes = bytes.as_ref();
        let mut defiltered = Vec::with_capacity(bytes.len() * 2);
        let mut index = 0;
        while let Some(&length) = bytes.get(index) {
            index += 1;
            match length {
                EOD => return Ok(defiltered),
                0..=127 => {
                    let end = index + usize::from(length) + 1;
                    let literal = bytes
                        .get(index..end)
                        .ok_or(RLErrorCode::LiteralOutOfBound(index - 1, usize::from(length) + 1))?;
                    defiltered.extend_from_slice(literal);
                    index = end;
                }
                _ => {
                    let byte = *bytes
                        .get(index)
                        .ok_or(RLErrorCode::MissingRunByte(index - 1))?;
                    defiltered.resize(defiltered.len() + 257 - usize::from(length), byte);
                    index += 1;
                }
            }
        }
        // Missing EOD
        Ok(defiltered)
    }
}

fn write_literal(literal: &[Byte], filtered: &mut Vec<Byte>) {
    if literal.is_empty() {
        return;
    }
    filtered.push((literal.len() - 1) as Byte);
    filtered.extend_from_slice(literal);
}

pub(in crate::process::filter) mod error {
    use ::thiserror::Error;

    #[derive(Debug, Error, PartialEq, Clone, Copy)]
    pub enum RLErrorCode {
        #[error("Literal run at {0} needs {1} bytes beyond the end of data")]
        LiteralOutOfBound(usize, usize),
        #[error("Repeat run at {0} is missing its byte")]
        MissingRunByte(usize),
    }
}
