use ::log::warn;

use self::error::ObjStmErr;
use self::error::ObjStmResult;
use crate::config::ParseOptions;
use crate::object::direct::dictionary::Dictionary;
use crate::object::direct::name::Name;
use crate::object::indirect::id::Id;
use crate::object::indirect::object::IndirectObject;
use crate::object::indirect::stream::Stream;
use crate::object::indirect::stream::KEY_FILTER;
use crate::object::Object;
use crate::parse::lexer::Token;
use crate::parse::object::ObjectParser;
use crate::process::filter::error::FilterResult;
use crate::process::filter::flate::FLATE_DECODE;
use crate::process::filter::registry::FilterRegistry;
use crate::xref::trailer::KEY_TYPE;
use crate::Byte;
use crate::IndexNumber;
use crate::ObjectNumber;
use crate::Offset;

pub(crate) const VAL_OBJSTM: &str = "ObjStm";
pub(crate) const KEY_N: &str = "N";
pub(crate) const KEY_FIRST: &str = "First";

/// The objects of a decoded object stream, parsed on demand.
///
/// REFERENCE: [7.5.7 Object streams, p61-64]
#[derive(Debug, PartialEq, Clone)]
pub struct ObjectStream {
    data: Vec<Byte>,
    first: Offset,
    /// Object numbers and offsets relative to `first`, in index order.
    pairs: Vec<(ObjectNumber, Offset)>,
}

impl ObjectStream {
    /// Decode `stream` and read the `N` pairs of integers at its start.
    pub fn decode(
        stream: &Stream,
        registry: &FilterRegistry,
        options: ParseOptions,
    ) -> ObjStmResult<Self> {
        let dictionary = stream.dictionary();
        match dictionary.get_name(KEY_TYPE)? {
            Some(name) if *name == VAL_OBJSTM => {}
            value => {
                let value = value.map(Name::to_string).unwrap_or_default();
                if options.is_strict() {
                    return Err(ObjStmErr::Type(value));
                }
                warn!("Object stream with /{} {:?}", KEY_TYPE, value);
            }
        }
        let n = dictionary.required_usize(KEY_N)?;
        let first = dictionary.required_usize(KEY_FIRST)?;
        let data = stream.decode(registry, options)?;
        if first > data.len() {
            return Err(ObjStmErr::First(first, data.len()));
        }

        let mut parser = ObjectParser::new(&data[..first], options).set_complete(true);
        let mut integer = || -> ObjStmResult<u64> {
            let position = parser.position();
            match parser.next_token()? {
                Token::Integer(value) => {
                    u64::try_from(value).map_err(|_| ObjStmErr::Header(position))
                }
                _ => Err(ObjStmErr::Header(position)),
            }
        };
        // A corrupt count must not reserve more than the header can hold
        let mut pairs = Vec::with_capacity(n.min(first / 4 + 1));
        for _ in 0..n {
            let object_number = integer()?;
            let offset = integer()?;
            let object_number = ObjectNumber::try_from(object_number)
                .map_err(|_| ObjStmErr::ObjectNumber(object_number))?;
            let offset = Offset::try_from(offset)
                .ok()
                .filter(|offset| first.saturating_add(*offset) <= data.len())
                .ok_or(ObjStmErr::Offset(offset, data.len()))?;
            pairs.push((object_number, offset));
        }
        Ok(Self { data, first, pairs })
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn object_numbers(&self) -> impl Iterator<Item = ObjectNumber> + '_ {
        self.pairs.iter().map(|(object_number, _)| *object_number)
    }

    /// The index of `object_number` in the stream, if present.
    pub fn find(&self, object_number: ObjectNumber) -> Option<IndexNumber> {
        self.pairs
            .iter()
            .position(|(number, _)| *number == object_number)
            .and_then(|index| IndexNumber::try_from(index).ok())
    }

    /// REFERENCE: [7.5.7 Object streams, p62]
    /// The object at `index`. Its generation number is implicitly 0.
    pub fn get(&self, index: IndexNumber, options: ParseOptions) -> ObjStmResult<IndirectObject> {
        let position = index as usize;
        let (object_number, offset) = *self
            .pairs
            .get(position)
            .ok_or(ObjStmErr::Index(index, self.pairs.len()))?;
        let start = self.first + offset;
        // The object ends where the next one starts, when offsets are sorted
        let end = self
            .pairs
            .get(position + 1)
            .map(|(_, next)| self.first + next)
            .filter(|end| *end >= start)
            .unwrap_or(self.data.len());
        let value = ObjectParser::new(&self.data[start..end], options)
            .set_complete(true)
            .parse_object()
            .map_err(|err| err.shift(start))?;
        Ok(IndirectObject::new(Id::new(object_number, 0), value))
    }

    /// All objects of the stream, in index order.
    pub fn objects(&self, options: ParseOptions) -> ObjStmResult<Vec<IndirectObject>> {
        (0..self.pairs.len())
            .map(|index| self.get(index as IndexNumber, options))
            .collect()
    }
}

/// Packs objects into a new object stream.
///
/// REFERENCE: [7.5.7 Object streams, p61-62]
#[derive(Debug, Default, Clone)]
pub struct ObjectStreamBuilder {
    objects: Vec<(ObjectNumber, Vec<Byte>)>,
}

impl ObjectStreamBuilder {
    /// Append `object` and return its index in the stream.
    pub fn add(&mut self, id: Id, object: &Object) -> ObjStmResult<IndexNumber> {
        if id.generation_number() != 0 {
            return Err(ObjStmErr::Generation(id));
        }
        if let Object::Stream(_) = object {
            return Err(ObjStmErr::Stream(id));
        }
        let index = IndexNumber::try_from(self.objects.len())
            .map_err(|_| ObjStmErr::Index(IndexNumber::MAX, self.objects.len()))?;
        self.objects.push((id.object_number(), object.to_bytes()));
        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// A `/FlateDecode` stream with the objects added so far.
    pub fn build(
        &self,
        registry: &FilterRegistry,
        options: ParseOptions,
        compression: u32,
    ) -> FilterResult<Stream> {
        let mut header = Vec::new();
        let mut body = Vec::new();
        for (object_number, bytes) in &self.objects {
            if !header.is_empty() {
                header.push(b' ');
            }
            header.extend_from_slice(format!("{} {}", object_number, body.len()).as_bytes());
            body.extend_from_slice(bytes);
            body.push(b'\n');
        }
        header.push(b'\n');
        let first = header.len();
        header.extend_from_slice(&body);

        let mut dictionary = Dictionary::default();
        dictionary.insert(KEY_TYPE, Name::from(VAL_OBJSTM));
        dictionary.insert(KEY_N, self.objects.len());
        dictionary.insert(KEY_FIRST, first);
        dictionary.insert(KEY_FILTER, Name::from(FLATE_DECODE));
        Stream::from_decoded(dictionary, header).to_encoded(registry, options, compression)
    }
}

pub(crate) mod error {
    use ::thiserror::Error;

    use crate::object::direct::dictionary::error::DataTypeError;
    use crate::object::direct::dictionary::error::DictionaryErr;
    use crate::object::indirect::id::Id;
    use crate::parse::error::ParseErr;
    use crate::process::filter::error::FilterErr;
    use crate::IndexNumber;
    use crate::Offset;

    pub type ObjStmResult<T> = Result<T, ObjStmErr>;

    #[derive(Debug, Error, PartialEq, Clone)]
    pub enum ObjStmErr {
        #[error("Not an object stream. /Type: {0}")]
        Type(String),
        #[error("/First {0} is past the end of the decoded data of {1} bytes")]
        First(Offset, usize),
        #[error("Expected a non-negative integer in the header at offset {0}")]
        Header(Offset),
        #[error("Object number out of range: {0}")]
        ObjectNumber(u64),
        #[error("Object offset {0} is past the end of the decoded data of {1} bytes")]
        Offset(u64, usize),
        #[error("Index {0} out of range for an object stream of {1} objects")]
        Index(IndexNumber, usize),
        #[error("Object {0}: only objects with generation number 0 can be compressed")]
        Generation(Id),
        #[error("Object {0}: streams cannot be compressed")]
        Stream(Id),
        //
        #[error("Parse: {0}")]
        Parse(#[from] ParseErr),
        #[error("Filter: {0}")]
        Filter(#[from] FilterErr),
        #[error("Dictionary: {0}")]
        Dictionary(#[from] DictionaryErr),
    }

    impl From<DataTypeError> for ObjStmErr {
        fn from(err: DataTypeError) -> Self {
            Self::Dictionary(err.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_err_eq;
    use crate::object::direct::string::String_;
    use crate::object::indirect::reference::Reference;

    fn stream(header: &str, body: &str, n: usize) -> Stream {
        let mut dictionary = Dictionary::default();
        dictionary.insert(KEY_TYPE, Name::from(VAL_OBJSTM));
        dictionary.insert(KEY_N, n);
        dictionary.insert(KEY_FIRST, header.len());
        Stream::new(dictionary, format!("{}{}", header, body).into_bytes())
    }

    #[test]
    fn object_stream_decode() {
        let stream = stream("11 0 12 15 ", "<</Type /Font>> [1 2 0 R]", 2);
        let registry = FilterRegistry::default();
        let object_stream =
            ObjectStream::decode(&stream, &registry, ParseOptions::strict()).unwrap();
        assert_eq!(object_stream.len(), 2);
        assert_eq!(object_stream.object_numbers().collect::<Vec<_>>(), [11, 12]);
        assert_eq!(object_stream.find(12), Some(1));
        assert_eq!(object_stream.find(13), None);

        let object = object_stream.get(1, ParseOptions::strict()).unwrap();
        assert_eq!(object.id(), Id::new(12, 0));
        assert_eq!(
            object.value(),
            &Object::from(vec![Object::from(1), Reference::new(2, 0).into()])
        );
        let mut font = Dictionary::default();
        font.insert(KEY_TYPE, Name::from("Font"));
        assert_eq!(
            object_stream.get(0, ParseOptions::strict()).unwrap().value(),
            &Object::from(font)
        );
        assert_err_eq!(
            object_stream.get(2, ParseOptions::strict()),
            ObjStmErr::Index(2, 2)
        );
    }

    #[test]
    fn object_stream_invalid() {
        let registry = FilterRegistry::default();
        // Header shorter than /N
        let stream_1 = stream("11 0 ", "null", 2);
        assert!(ObjectStream::decode(&stream_1, &registry, ParseOptions::strict()).is_err());
        // Offset past the data
        let stream_2 = stream("11 40 ", "null", 1);
        assert_err_eq!(
            ObjectStream::decode(&stream_2, &registry, ParseOptions::strict()),
            ObjStmErr::Offset(40, 10)
        );
        // Not an object stream
        let mut stream_3 = stream("11 0 ", "null", 1);
        stream_3.dictionary_mut().insert(KEY_TYPE, Name::from("XRef"));
        assert_err_eq!(
            ObjectStream::decode(&stream_3, &registry, ParseOptions::strict()),
            ObjStmErr::Type("/XRef".to_string())
        );
        assert!(ObjectStream::decode(&stream_3, &registry, ParseOptions::lenient()).is_ok());
    }

    #[test]
    fn object_stream_builder() {
        let mut builder = ObjectStreamBuilder::default();
        assert_err_eq!(
            builder.add(Id::new(3, 1), &Object::Null),
            ObjStmErr::Generation(Id::new(3, 1))
        );
        assert_err_eq!(
            builder.add(Id::new(4, 0), &Stream::new(Dictionary::default(), Vec::new()).into()),
            ObjStmErr::Stream(Id::new(4, 0))
        );
        assert!(builder.is_empty());
    }

    #[test]
    fn object_stream_symmetry() {
        let mut objects = vec![
            IndirectObject::new(Id::new(9, 0), String_::from("nine")),
            IndirectObject::new(Id::new(2, 0), Reference::new(9, 0)),
            IndirectObject::new(Id::new(5, 0), vec![Object::from(1.5), Object::Null]),
            IndirectObject::new(Id::new(7, 0), 42),
        ];
        let mut builder = ObjectStreamBuilder::default();
        for (position, object) in objects.iter().enumerate() {
            let index = builder.add(object.id(), object.value()).unwrap();
            assert_eq!(index as usize, position);
        }
        let registry = FilterRegistry::default();
        let options = ParseOptions::strict();
        let stream = builder.build(&registry, options, 9).unwrap();
        assert_eq!(stream.dictionary().get_usize(KEY_N), Ok(Some(4)));

        let decoded = ObjectStream::decode(&stream, &registry, options).unwrap();
        let mut parsed = decoded.objects(options).unwrap();
        parsed.sort_by_key(IndirectObject::id);
        objects.sort_by_key(IndirectObject::id);
        assert_eq!(parsed, objects);
    }
}
