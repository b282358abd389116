use ::std::fmt::Display;
use ::std::fmt::Formatter;
use ::std::fmt::Result as FmtResult;

use crate::config::ParseOptions;
use crate::config::Strictness;
use crate::object::direct::dictionary::Dictionary;
use crate::object::Object;
use crate::parse::KW_ENDSTREAM;
use crate::parse::KW_STREAM;
use crate::process::filter::error::FilterResult;
use crate::process::filter::registry::FilterRegistry;
use crate::process::filter::FilterPipeline;
use crate::Byte;

pub(crate) const KEY_LENGTH: &str = "Length";
pub(crate) const KEY_F: &str = "F";
pub(crate) const KEY_FILTER: &str = "Filter";
pub(crate) const KEY_DECODEPARMS: &str = "DecodeParms";
pub(crate) const KEY_FFILTER: &str = "FFilter";
pub(crate) const KEY_FDECODEPARMS: &str = "FDecodeParms";
pub(crate) const KEY_DL: &str = "DL";

/// The payload of a stream.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamData {
    /// As stored in a file, with the `/Filter` chain applied.
    Encoded(Vec<Byte>),
    /// Supplied by code. The `/Filter` chain is applied when the stream is
    /// written.
    Decoded(Vec<Byte>),
}

/// REFERENCE: [7.3.8 Stream objects, p31]
#[derive(Debug, Clone)]
pub struct Stream {
    pub(crate) dictionary: Dictionary,
    pub(crate) data: StreamData,
}

/// `/Length` is recomputed on write, so it does not take part.
impl PartialEq for Stream {
    fn eq(&self, other: &Self) -> bool {
        let without_length = |dictionary: &Dictionary| -> Dictionary {
            dictionary
                .iter()
                .filter(|(key, _)| **key != KEY_LENGTH)
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect()
        };
        self.data == other.data
            && without_length(&self.dictionary) == without_length(&other.dictionary)
    }
}

impl Display for Stream {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match &self.data {
            StreamData::Encoded(data) => write!(
                f,
                "{} {} ({} encoded bytes) {}",
                self.dictionary,
                KW_STREAM,
                data.len(),
                KW_ENDSTREAM
            ),
            StreamData::Decoded(data) => write!(
                f,
                "{} {} ({} decoded bytes) {}",
                self.dictionary,
                KW_STREAM,
                data.len(),
                KW_ENDSTREAM
            ),
        }
    }
}

impl Stream {
    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    pub fn dictionary_mut(&mut self) -> &mut Dictionary {
        &mut self.dictionary
    }

    pub fn data(&self) -> &StreamData {
        &self.data
    }

    /// The stored bytes, if the stream was read from a file or already
    /// encoded.
    pub fn encoded_data(&self) -> Option<&[Byte]> {
        match &self.data {
            StreamData::Encoded(data) => Some(data),
            StreamData::Decoded(_) => None,
        }
    }

    /// Replace the content, keeping the filters of the dictionary.
    pub fn set_decoded(&mut self, data: impl Into<Vec<Byte>>) {
        self.data = StreamData::Decoded(data.into());
    }

    /// Apply the decoding filters of the dictionary.
    pub fn decode(&self, registry: &FilterRegistry, options: ParseOptions) -> FilterResult<Vec<Byte>> {
        match &self.data {
            StreamData::Decoded(data) => Ok(data.clone()),
            StreamData::Encoded(data) => {
                FilterPipeline::from_dictionary(&self.dictionary, registry, options)?.decode(data)
            }
        }
    }

    /// The stream with its `/Filter` chain applied and `/Length` matching
    /// the encoded payload. `compression` is the Flate level.
    ///
    /// Every filter of the chain must be known, even in lenient mode, since
    /// the dictionary keeps declaring all of them.
    pub fn to_encoded(
        &self,
        registry: &FilterRegistry,
        options: ParseOptions,
        compression: u32,
    ) -> FilterResult<Self> {
        let data = match &self.data {
            StreamData::Encoded(data) => data.clone(),
            StreamData::Decoded(data) => {
                let options = options.set_strictness(Strictness::Strict);
                FilterPipeline::from_dictionary(&self.dictionary, registry, options)?
                    .set_compression(compression)
                    .encode(data)?
            }
        };
        let mut dictionary = self.dictionary.clone();
        dictionary.insert(KEY_LENGTH, data.len());
        Ok(Self {
            dictionary,
            data: StreamData::Encoded(data),
        })
    }

    /// The `/Length` found in the dictionary, when it is a direct integer.
    pub(crate) fn declared_length(&self) -> Option<usize> {
        self.dictionary.get(KEY_LENGTH).and_then(Object::as_usize)
    }

    /// A decoded payload is written without its filters, so that the
    /// output is always consistent.
    pub(crate) fn write_to(&self, out: &mut Vec<Byte>) {
        let mut dictionary = self.dictionary.clone();
        let data = match &self.data {
            StreamData::Encoded(data) => data,
            StreamData::Decoded(data) => {
                dictionary.remove(KEY_FILTER);
                dictionary.remove(KEY_DECODEPARMS);
                data
            }
        };
        dictionary.insert(KEY_LENGTH, data.len());
        dictionary.write_to(out);
        out.push(b'\n');
        out.extend_from_slice(KW_STREAM.as_bytes());
        out.push(b'\n');
        out.extend_from_slice(data);
        out.push(b'\n');
        out.extend_from_slice(KW_ENDSTREAM.as_bytes());
    }
}

mod convert {
    use super::*;

    impl Stream {
        /// A stream whose data is already encoded by the dictionary filters.
        pub fn new(dictionary: impl Into<Dictionary>, data: impl Into<Vec<Byte>>) -> Self {
            Self {
                dictionary: dictionary.into(),
                data: StreamData::Encoded(data.into()),
            }
        }

        pub fn from_decoded(dictionary: impl Into<Dictionary>, data: impl Into<Vec<Byte>>) -> Self {
            Self {
                dictionary: dictionary.into(),
                data: StreamData::Decoded(data.into()),
            }
        }
    }
}
