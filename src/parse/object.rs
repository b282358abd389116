use ::log::warn;

use super::error::ParseErr;
use super::error::ParseErrorCode;
use super::error::ParseFailure;
use super::error::ParseRecoverable;
use super::error::ParseResult;
use super::find;
use super::lexer::Lexer;
use super::lexer::Token;
use super::KW_ENDOBJ;
use super::KW_ENDSTREAM;
use super::KW_FALSE;
use super::KW_NULL;
use super::KW_OBJ;
use super::KW_R;
use super::KW_STREAM;
use super::KW_TRUE;
use crate::config::ParseOptions;
use crate::fmt::debug_bytes;
use crate::object::direct::array::Array;
use crate::object::direct::dictionary::Dictionary;
use crate::object::direct::name::Name;
use crate::object::direct::numeric::Numeric;
use crate::object::direct::string::String_;
use crate::object::indirect::id::Id;
use crate::object::indirect::object::IndirectObject;
use crate::object::indirect::reference::Reference;
use crate::object::indirect::stream::Stream;
use crate::object::indirect::stream::KEY_LENGTH;
use crate::object::Object;
use crate::Byte;
use crate::GenerationNumber;
use crate::ObjectNumber;
use crate::Offset;

/// Looks up a `/Length` given as an indirect reference while a stream is
/// being parsed.
pub(crate) trait LengthResolver {
    fn resolve_length(&mut self, reference: &Reference) -> Option<usize>;
}

/// Builds objects from the tokens of a buffer.
///
/// Offsets in errors are relative to the buffer.
pub(crate) struct ObjectParser<'buffer, 'resolver> {
    lexer: Lexer<'buffer>,
    resolver: Option<&'resolver mut dyn LengthResolver>,
}

impl<'buffer, 'resolver> ObjectParser<'buffer, 'resolver> {
    pub(crate) fn position(&self) -> Offset {
        self.lexer.position()
    }

    pub(crate) fn seek(&mut self, position: Offset) {
        self.lexer.seek(position);
    }

    pub(crate) fn options(&self) -> ParseOptions {
        self.lexer.options()
    }

    pub(crate) fn next_token(&mut self) -> ParseResult<Token> {
        self.lexer.next_token()
    }

    pub(crate) fn peek_token(&mut self) -> ParseResult<Token> {
        self.lexer.peek_token()
    }

    /// REFERENCE: [7.3 Objects, p23]
    pub(crate) fn parse_object(&mut self) -> ParseResult<Object> {
        let start = self.lexer.position();
        let token = self.lexer.next_token()?;
        self.object_from(start, token)
    }

    /// REFERENCE: [7.3.10 Indirect objects, p33]
    ///
    /// Returns a recoverable error when the buffer does not start with
    /// `N G obj`.
    pub(crate) fn parse_indirect_object(&mut self) -> ParseResult<IndirectObject> {
        let start = self.lexer.position();
        let id = self.object_header()?;

        let value = if self.lexer.peek_token()?.is_keyword(KW_ENDOBJ) {
            if self.options().is_strict() {
                return Err(self.failure(
                    start,
                    stringify!(IndirectObject),
                    ParseErrorCode::MissingValue(id.to_string()),
                ));
            }
            warn!("Empty indirect object {} at offset {} read as null", id, start);
            Object::Null
        } else {
            self.parse_object()?
        };

        let value = match value {
            Object::Dictionary(dictionary) if self.lexer.peek_token()?.is_keyword(KW_STREAM) => {
                self.lexer.next_token()?;
                Object::Stream(self.stream_body(start, dictionary)?)
            }
            value => value,
        };

        if self.lexer.peek_token()?.is_keyword(KW_ENDOBJ) {
            self.lexer.next_token()?;
        } else if self.options().is_strict() {
            return Err(self.failure(
                self.lexer.position(),
                stringify!(IndirectObject),
                ParseErrorCode::MissingKeyword(KW_ENDOBJ),
            ));
        } else {
            warn!("Missing {} for object {} at offset {}", KW_ENDOBJ, id, start);
        }
        Ok(IndirectObject::new(id, value))
    }

    /// The `N G obj` prefix of an indirect object.
    pub(crate) fn object_header(&mut self) -> ParseResult<Id> {
        let start = self.lexer.position();
        let not_found = |code| -> ParseErr {
            ParseRecoverable::new(start, stringify!(IndirectObject), code).into()
        };
        let object_number = match self.lexer.next_token()? {
            Token::Integer(value) => value,
            token => return Err(not_found(ParseErrorCode::UnexpectedToken(token.to_string()))),
        };
        let generation_number = match self.lexer.next_token()? {
            Token::Integer(value) => value,
            token => return Err(not_found(ParseErrorCode::UnexpectedToken(token.to_string()))),
        };
        match self.lexer.next_token()? {
            token if token.is_keyword(KW_OBJ) => {}
            token => return Err(not_found(ParseErrorCode::UnexpectedToken(token.to_string()))),
        }
        let object_number = ObjectNumber::try_from(object_number).map_err(|_| {
            self.failure(start, stringify!(IndirectObject), ParseErrorCode::ObjectNumber)
        })?;
        let generation_number = GenerationNumber::try_from(generation_number).map_err(|_| {
            self.failure(start, stringify!(IndirectObject), ParseErrorCode::GenerationNumber)
        })?;
        Ok(Id::new(object_number, generation_number))
    }

    fn failure(
        &self,
        offset: Offset,
        object: &'static str,
        code: ParseErrorCode,
    ) -> ParseErr {
        ParseFailure::new(offset, object, code).into()
    }

    fn end_of_input(&self, object: &'static str) -> ParseErr {
        self.failure(
            self.lexer.buffer().len(),
            object,
            ParseErrorCode::UnexpectedEof,
        )
    }

    fn object_from(&mut self, start: Offset, token: Token) -> ParseResult<Object> {
        match token {
            Token::Integer(value) => self.integer_or_reference(value),
            Token::Real(value) => Ok(Numeric::Real(value).into()),
            Token::LiteralString(bytes) => Ok(String_::literal(bytes).into()),
            Token::HexString(bytes) => Ok(String_::hexadecimal(bytes).into()),
            Token::Name(bytes) => Ok(Name::new(bytes).into()),
            Token::ArrayStart => self.array(start).map(Object::from),
            Token::DictStart => self.dictionary(start).map(Object::from),
            Token::Keyword(ref keyword) => match keyword.as_slice() {
                keyword if keyword == KW_TRUE.as_bytes() => Ok(true.into()),
                keyword if keyword == KW_FALSE.as_bytes() => Ok(false.into()),
                keyword if keyword == KW_NULL.as_bytes() => Ok(Object::Null),
                _ => Err(self.failure(
                    start,
                    stringify!(Object),
                    ParseErrorCode::UnexpectedToken(token.to_string()),
                )),
            },
            Token::Eof => Err(self.end_of_input(stringify!(Object))),
            Token::ArrayEnd | Token::DictEnd => Err(self.failure(
                start,
                stringify!(Object),
                ParseErrorCode::UnexpectedToken(token.to_string()),
            )),
        }
    }

    /// REFERENCE: [7.3.10 Indirect objects, p34]
    /// `12 0` may start the reference `12 0 R` or be two integers.
    fn integer_or_reference(&mut self, value: i64) -> ParseResult<Object> {
        let after_integer = self.lexer.position();
        if let Ok(object_number) = ObjectNumber::try_from(value) {
            if let Token::Integer(generation_number) = self.lexer.next_token()? {
                if let Ok(generation_number) = GenerationNumber::try_from(generation_number) {
                    if self.lexer.next_token()?.is_keyword(KW_R) {
                        return Ok(Reference::new(object_number, generation_number).into());
                    }
                }
            }
        }
        self.lexer.seek(after_integer);
        Ok(value.into())
    }

    /// A keyword other than `true`, `false`, `null` and `R` cannot occur in
    /// a container.
    fn is_closing_keyword(token: &Token) -> bool {
        match token {
            Token::Keyword(keyword) => ![KW_TRUE, KW_FALSE, KW_NULL]
                .iter()
                .any(|allowed| keyword == allowed.as_bytes()),
            _ => false,
        }
    }

    /// REFERENCE: [7.3.6 Array objects, p29]
    fn array(&mut self, start: Offset) -> ParseResult<Array> {
        let mut array = Array::default();
        loop {
            let position = self.lexer.position();
            let token = self.lexer.peek_token()?;
            match token {
                Token::ArrayEnd => {
                    self.lexer.next_token()?;
                    return Ok(array);
                }
                Token::Eof => return Err(self.end_of_input(stringify!(Array))),
                ref token if Self::is_closing_keyword(token) || *token == Token::DictEnd => {
                    if self.options().is_strict() {
                        return Err(self.failure(
                            position,
                            stringify!(Array),
                            ParseErrorCode::MissingKeyword("]"),
                        ));
                    }
                    warn!(
                        "Array at offset {} closed before unexpected {} at offset {}",
                        start, token, position
                    );
                    return Ok(array);
                }
                _ => array.push(self.parse_object()?),
            }
        }
    }

    /// REFERENCE: [7.3.7 Dictionary objects, p30-31]
    fn dictionary(&mut self, start: Offset) -> ParseResult<Dictionary> {
        let mut dictionary = Dictionary::default();
        loop {
            let position = self.lexer.position();
            let token = self.lexer.next_token()?;
            let key = match token {
                Token::DictEnd => return Ok(dictionary),
                Token::Eof => return Err(self.end_of_input(stringify!(Dictionary))),
                Token::Name(key) => Name::new(key),
                token if self.options().is_strict() => {
                    return Err(self.failure(
                        position,
                        stringify!(Dictionary),
                        ParseErrorCode::DictionaryKey(token.to_string()),
                    ));
                }
                token if Self::is_closing_keyword(&token) || token == Token::ArrayEnd => {
                    warn!(
                        "Dictionary at offset {} closed before unexpected {} at offset {}",
                        start, token, position
                    );
                    self.lexer.seek(position);
                    return Ok(dictionary);
                }
                token => {
                    // Skip the whole value, e.g. a nested array
                    warn!(
                        "Skipping dictionary entry with key {} at offset {}",
                        token, position
                    );
                    self.object_from(position, token)?;
                    continue;
                }
            };

            let value_position = self.lexer.position();
            let next = self.lexer.peek_token()?;
            let value = if next == Token::DictEnd || Self::is_closing_keyword(&next) {
                if self.options().is_strict() {
                    return Err(self.failure(
                        value_position,
                        stringify!(Dictionary),
                        ParseErrorCode::MissingValue(debug_bytes(&key)),
                    ));
                }
                warn!(
                    "Missing value for key {} at offset {} read as null",
                    key, value_position
                );
                Object::Null
            } else {
                self.parse_object()?
            };

            // REFERENCE: [7.3.7 Dictionary objects, p30]
            // Keys should not be duplicated. The last value is kept.
            if let Some(old_value) = dictionary.insert(key.clone(), value) {
                warn!(
                    "Dictionary at offset {}: overwriting value for key {}: {}",
                    start, key, old_value
                );
            }
        }
    }

    /// REFERENCE: [7.3.8 Stream objects, p31-32]
    /// The lexer is positioned right after the `stream` keyword.
    fn stream_body(&mut self, start: Offset, dictionary: Dictionary) -> ParseResult<Stream> {
        let buffer = self.lexer.buffer();
        let complete = self.lexer.is_complete();
        let strict = self.options().is_strict();
        let position = self.lexer.position();

        // The keyword shall be followed by CRLF or LF
        let eol_len = match (buffer.get(position), buffer.get(position + 1)) {
            (None, _) | (Some(b'\r'), None) if !complete => {
                return Err(self.end_of_input(stringify!(Stream)))
            }
            (Some(b'\r'), Some(b'\n')) => 2,
            (Some(b'\n'), _) => 1,
            (eol, _) => {
                if strict {
                    return Err(self.failure(
                        position,
                        stringify!(Stream),
                        ParseErrorCode::StreamEol,
                    ));
                }
                warn!(
                    "Stream at offset {}: {} is not followed by CRLF or LF",
                    start, KW_STREAM
                );
                usize::from(eol == Some(&b'\r'))
            }
        };
        let data_start = position + eol_len;

        let length = match dictionary.get(KEY_LENGTH) {
            Some(Object::Reference(reference)) => {
                let reference = *reference;
                self.resolver
                    .as_mut()
                    .and_then(|resolver| resolver.resolve_length(&reference))
            }
            Some(length) => length.as_usize(),
            None => None,
        };

        if let Some(length) = length {
            let data_end = data_start.saturating_add(length);
            if data_end > buffer.len() && !complete {
                return Err(self.end_of_input(stringify!(Stream)));
            }
            if data_end <= buffer.len() {
                self.lexer.seek(data_end);
                if self.lexer.next_token()?.is_keyword(KW_ENDSTREAM) {
                    let data = buffer[data_start..data_end].to_vec();
                    return Ok(Stream::new(dictionary, data));
                }
            }
            if strict {
                return Err(self.failure(
                    data_start,
                    stringify!(Stream),
                    ParseErrorCode::Length(length),
                ));
            }
            warn!(
                "Stream at offset {}: /{} {} does not match the data",
                start, KEY_LENGTH, length
            );
        } else if strict {
            return Err(self.failure(start, stringify!(Stream), ParseErrorCode::MissingLength));
        }

        // Recover the extent of the data from the position of endstream
        let end = match find(buffer, data_start, KW_ENDSTREAM.as_bytes()) {
            Some(end) => end,
            None if !complete => return Err(self.end_of_input(stringify!(Stream))),
            None => {
                return Err(self.failure(
                    data_start,
                    stringify!(Stream),
                    ParseErrorCode::MissingKeyword(KW_ENDSTREAM),
                ))
            }
        };
        let mut data = &buffer[data_start..end];
        if let Some(trimmed) = data.strip_suffix(b"\r\n") {
            data = trimmed;
        } else if let Some(trimmed) = data.strip_suffix(b"\n").or_else(|| data.strip_suffix(b"\r")) {
            data = trimmed;
        }
        warn!(
            "Stream at offset {}: data extent recovered as {} bytes",
            start,
            data.len()
        );
        let mut dictionary = dictionary;
        dictionary.insert(KEY_LENGTH, data.len());
        self.lexer.seek(end + KW_ENDSTREAM.len());
        Ok(Stream::new(dictionary, data.to_vec()))
    }
}

mod convert {
    use super::*;

    impl<'buffer, 'resolver> ObjectParser<'buffer, 'resolver> {
        pub(crate) fn new(buffer: &'buffer [Byte], options: ParseOptions) -> Self {
            Self {
                lexer: Lexer::new(buffer, options),
                resolver: None,
            }
        }

        /// See `Lexer::set_complete`.
        pub(crate) fn set_complete(mut self, complete: bool) -> Self {
            self.lexer = self.lexer.set_complete(complete);
            self
        }

        pub(crate) fn at(mut self, position: Offset) -> Self {
            self.lexer.seek(position);
            self
        }

        pub(crate) fn set_resolver(mut self, resolver: &'resolver mut dyn LengthResolver) -> Self {
            self.resolver = Some(resolver);
            self
        }
    }
}
