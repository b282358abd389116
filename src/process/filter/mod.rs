pub(crate) mod ascii_85;
pub(crate) mod ascii_hex;
pub(crate) mod error;
pub(crate) mod flate;
pub(crate) mod lzw;
pub(crate) mod predictor;
pub(crate) mod registry;
pub(crate) mod run_length;

use ::log::warn;
use ::std::sync::Arc;

use self::ascii_85::A85;
use self::ascii_hex::AHx;
use self::error::FilterErr;
use self::error::FilterErrorCode;
use self::error::FilterResult;
use self::flate::Fl;
use self::lzw::Lzw;
use self::registry::Codec;
use self::registry::FilterRegistry;
use self::run_length::RL;
use crate::config::ParseOptions;
use crate::object::direct::dictionary::Dictionary;
use crate::object::direct::name::Name;
use crate::object::indirect::stream::KEY_DECODEPARMS;
use crate::object::indirect::stream::KEY_F;
use crate::object::indirect::stream::KEY_FDECODEPARMS;
use crate::object::indirect::stream::KEY_FFILTER;
use crate::object::indirect::stream::KEY_FILTER;
use crate::object::Object;
use crate::Byte;

pub(crate) trait Filter {
    fn filter(&self, bytes: impl Into<Vec<Byte>> + AsRef<[Byte]>) -> FilterResult<Vec<Byte>>;

    fn defilter(&self, bytes: impl Into<Vec<Byte>> + AsRef<[Byte]>) -> FilterResult<Vec<Byte>>;
}

/// The filters of one stream, in the order they decode its data.
///
/// REFERENCE: [7.3.8.2 Stream extent, p31-33] and [7.4 Filters, p34]
#[derive(Debug, Clone)]
pub struct FilterPipeline {
    filters: Vec<Filtering>,
    limit: usize,
}

impl FilterPipeline {
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Apply the filters left to right.
    pub fn decode(&self, bytes: &[Byte]) -> FilterResult<Vec<Byte>> {
        let mut decoded = bytes.to_vec();
        for filtering in &self.filters {
            decoded = filtering.defilter(decoded)?;
            if decoded.len() > self.limit {
                return Err(FilterErr::new(
                    stringify!(FilterPipeline),
                    FilterErrorCode::Limit(self.limit),
                ));
            }
        }
        Ok(decoded)
    }

    /// Apply the encoders right to left, so that `decode` undoes them.
    pub fn encode(&self, bytes: &[Byte]) -> FilterResult<Vec<Byte>> {
        let mut encoded = bytes.to_vec();
        for filtering in self.filters.iter().rev() {
            encoded = filtering.filter(encoded)?;
        }
        Ok(encoded)
    }

    /// Flate compression level used by `encode`.
    pub fn set_compression(mut self, level: u32) -> Self {
        for filtering in self.filters.iter_mut() {
            if let Filtering::Fl(fl) = filtering {
                fl.set_level(level);
            }
        }
        self
    }
}

/// REFERENCE: [Table 6: Standard filters, p35-36]
/// NOTE: This structure is named `Filtering` to avoid conflicts with the
/// `Filter` trait.
#[derive(Debug, Clone)]
enum Filtering {
    AHx(AHx),
    A85(A85),
    Lzw(Lzw),
    Fl(Fl),
    RL(RL),
    /// Image and security filters whose payload is handed on as is unless a
    /// codec is registered.
    Passthrough(Name),
    External(Name, Arc<dyn Codec>, Option<Dictionary>),
}

impl Filtering {
    fn new(
        name: &Name,
        parms: Option<&Dictionary>,
        registry: &FilterRegistry,
        options: ParseOptions,
    ) -> FilterResult<Self> {
        if let Some(codec) = registry.get(name) {
            return Ok(Self::External(name.clone(), codec, parms.cloned()));
        }
        // REFERENCE: [Table 92 — Additional abbreviations in an inline image
        // object, p269]
        match name.as_bytes() {
            b"AHx" | b"ASCIIHexDecode" => Ok(Self::AHx(AHx)),
            b"A85" | b"ASCII85Decode" => Ok(Self::A85(A85)),
            b"LZW" | b"LZWDecode" => Ok(Self::Lzw(Lzw::new(parms, options)?)),
            b"Fl" | b"FlateDecode" => Ok(Self::Fl(Fl::new(parms, options)?)),
            b"RL" | b"RunLengthDecode" => Ok(Self::RL(RL)),
            b"CCF" | b"CCITTFaxDecode" | b"DCT" | b"DCTDecode" | b"JPXDecode"
            | b"JBIG2Decode" | b"Crypt" => Ok(Self::Passthrough(name.clone())),
            _ => Err(FilterErr::new(
                stringify!(Filtering),
                FilterErrorCode::Unsupported(name.to_string()),
            )),
        }
    }
}

impl Filter for Filtering {
    fn filter(&self, bytes: impl Into<Vec<Byte>> + AsRef<[Byte]>) -> FilterResult<Vec<Byte>> {
        match self {
            Self::AHx(filtering) => filtering.filter(bytes),
            Self::A85(filtering) => filtering.filter(bytes),
            Self::Lzw(filtering) => filtering.filter(bytes),
            Self::Fl(filtering) => filtering.filter(bytes),
            Self::RL(filtering) => filtering.filter(bytes),
            Self::Passthrough(_) => Ok(bytes.into()),
            Self::External(name, codec, parms) => codec
                .encode(bytes.as_ref(), parms.as_ref())
                .map_err(|err| external_err(name, err.to_string())),
        }
    }

    fn defilter(&self, bytes: impl Into<Vec<Byte>> + AsRef<[Byte]>) -> FilterResult<Vec<Byte>> {
        match self {
            Self::AHx(filtering) => filtering.defilter(bytes),
            Self::A85(filtering) => filtering.defilter(bytes),
            Self::Lzw(filtering) => filtering.defilter(bytes),
            Self::Fl(filtering) => filtering.defilter(bytes),
            Self::RL(filtering) => filtering.defilter(bytes),
            Self::Passthrough(_) => Ok(bytes.into()),
            Self::External(name, codec, parms) => codec
                .decode(bytes.as_ref(), parms.as_ref())
                .map_err(|err| external_err(name, err.to_string())),
        }
    }
}

fn external_err(name: &Name, message: String) -> FilterErr {
    FilterErr::new(
        stringify!(Codec),
        FilterErrorCode::External(name.to_string(), message),
    )
}

mod convert {
    use super::*;

    impl FilterPipeline {
        /// A pipeline from filter names and their parameters. Missing
        /// parameters are read as `None`.
        ///
        /// An unknown filter fails in strict mode. In lenient mode the chain
        /// stops before it, so its payload is passed on undecoded.
        pub fn new(
            names: &[Name],
            parms: &[Option<Dictionary>],
            registry: &FilterRegistry,
            options: ParseOptions,
        ) -> FilterResult<Self> {
            let mut filters = Vec::with_capacity(names.len());
            for (index, name) in names.iter().enumerate() {
                let parms = parms.get(index).and_then(Option::as_ref);
                match Filtering::new(name, parms, registry, options) {
                    Ok(filtering) => filters.push(filtering),
                    Err(err) if options.is_strict() => return Err(err),
                    Err(err) => {
                        warn!("{}. The data is passed through undecoded", err);
                        break;
                    }
                }
            }
            Ok(Self {
                filters,
                limit: options.decoded_limit(),
            })
        }

        /// REFERENCE: [Table 5 — Entries common to all stream dictionaries,
        /// p32]
        pub fn from_dictionary(
            dictionary: &Dictionary,
            registry: &FilterRegistry,
            options: ParseOptions,
        ) -> FilterResult<Self> {
            let (filter_key, parms_key) = if dictionary.contains_key(KEY_F) {
                (KEY_FFILTER, KEY_FDECODEPARMS)
            } else {
                (KEY_FILTER, KEY_DECODEPARMS)
            };

            let names = match dictionary.get(filter_key) {
                None | Some(Object::Null) => Vec::new(),
                Some(Object::Name(name)) => vec![name.clone()],
                Some(Object::Array(array)) => array
                    .iter()
                    .map(|value| match value {
                        Object::Name(name) => Ok(name.clone()),
                        value => Err(value_type_err(filter_key, value)),
                    })
                    .collect::<FilterResult<_>>()?,
                Some(value) => return Err(value_type_err(filter_key, value)),
            };

            let parms = match dictionary.get(parms_key) {
                None | Some(Object::Null) => Vec::new(),
                Some(Object::Dictionary(parms)) => vec![Some(parms.clone())],
                Some(Object::Array(array)) => {
                    if array.len() != names.len() {
                        let err = FilterErr::new(
                            stringify!(FilterPipeline),
                            FilterErrorCode::Mismatch(names.len(), array.len()),
                        );
                        if options.is_strict() {
                            return Err(err);
                        }
                        warn!("{}", err);
                    }
                    array
                        .iter()
                        .map(|value| match value {
                            Object::Dictionary(parms) => Ok(Some(parms.clone())),
                            Object::Null => Ok(None),
                            value if options.is_strict() => {
                                Err(value_type_err(parms_key, value))
                            }
                            value => {
                                warn!("{}. Parameters ignored", value_type_err(parms_key, value));
                                Ok(None)
                            }
                        })
                        .collect::<FilterResult<_>>()?
                }
                Some(value) if options.is_strict() => {
                    return Err(value_type_err(parms_key, value))
                }
                Some(value) => {
                    warn!("{}. Parameters ignored", value_type_err(parms_key, value));
                    Vec::new()
                }
            };

            Self::new(&names, &parms, registry, options)
        }
    }

    fn value_type_err(key: &'static str, value: &Object) -> FilterErr {
        FilterErr::new(
            stringify!(FilterPipeline),
            FilterErrorCode::ValueType(key, value.to_string()),
        )
    }
}
