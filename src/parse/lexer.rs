use ::log::warn;
use ::std::fmt::Display;
use ::std::fmt::Formatter;
use ::std::fmt::Result as FmtResult;

use super::character_set::is_regular;
use super::character_set::is_white_space;
use super::character_set::white_space_or_comment;
use super::error::ParseErrorCode;
use super::error::ParseFailure;
use super::error::ParseResult;
use super::num::ascii_to_f64;
use super::num::ascii_to_i64;
use super::num::hex_val;
use super::offset_of;
use crate::config::ParseOptions;
use crate::fmt::debug_bytes;
use crate::Byte;
use crate::Offset;

/// REFERENCE: [7.2 Lexical conventions, p22-24]
#[derive(Debug, PartialEq, Clone)]
pub(crate) enum Token {
    Integer(i64),
    Real(f64),
    LiteralString(Vec<Byte>),
    HexString(Vec<Byte>),
    /// The name without the leading solidus, with `#xx` escapes decoded
    Name(Vec<Byte>),
    Keyword(Vec<Byte>),
    ArrayStart,
    ArrayEnd,
    DictStart,
    DictEnd,
    Eof,
}

impl Token {
    pub(crate) fn is_keyword(&self, keyword: &str) -> bool {
        matches!(self, Self::Keyword(bytes) if bytes == keyword.as_bytes())
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Integer(value) => write!(f, "{}", value),
            Self::Real(value) => write!(f, "{}", value),
            Self::LiteralString(bytes) => write!(f, "({})", debug_bytes(bytes)),
            Self::HexString(bytes) => write!(f, "<{}>", debug_bytes(bytes)),
            Self::Name(bytes) => write!(f, "/{}", debug_bytes(bytes)),
            Self::Keyword(bytes) => write!(f, "{}", debug_bytes(bytes)),
            Self::ArrayStart => write!(f, "["),
            Self::ArrayEnd => write!(f, "]"),
            Self::DictStart => write!(f, "<<"),
            Self::DictEnd => write!(f, ">>"),
            Self::Eof => write!(f, "end of input"),
        }
    }
}

/// A restartable tokenizer over a byte buffer.
///
/// `complete` tells whether the end of the buffer is the end of the data. If
/// it is not, running out of bytes is always reported as `UnexpectedEof` so
/// that the caller can retry with a larger buffer.
#[derive(Debug, Clone)]
pub(crate) struct Lexer<'buffer> {
    buffer: &'buffer [Byte],
    position: Offset,
    complete: bool,
    options: ParseOptions,
}

impl<'buffer> Lexer<'buffer> {
    pub(crate) fn buffer(&self) -> &'buffer [Byte] {
        self.buffer
    }

    pub(crate) fn position(&self) -> Offset {
        self.position
    }

    pub(crate) fn seek(&mut self, position: Offset) {
        self.position = position.min(self.buffer.len());
    }

    pub(crate) fn options(&self) -> ParseOptions {
        self.options
    }

    pub(crate) fn is_complete(&self) -> bool {
        self.complete
    }

    pub(crate) fn skip_white_space(&mut self) {
        let remains = &self.buffer[self.position..];
        if let Ok((remains, _)) = white_space_or_comment(remains) {
            self.position = offset_of(self.buffer, remains);
        }
    }

    /// Return `len` raw bytes at the current position, e.g. the body of a
    /// stream, and move past them.
    pub(crate) fn take_raw(&mut self, len: usize) -> Option<&'buffer [Byte]> {
        let end = self.position.checked_add(len)?;
        let raw = self.buffer.get(self.position..end)?;
        self.position = end;
        Some(raw)
    }

    pub(crate) fn peek_token(&mut self) -> ParseResult<Token> {
        let position = self.position;
        let token = self.next_token();
        self.position = position;
        token
    }

    /// In an incomplete buffer, a token that reaches the end of the buffer
    /// may continue past it and is reported as `UnexpectedEof`.
    pub(crate) fn next_token(&mut self) -> ParseResult<Token> {
        let token = self.scan_token()?;
        if !self.complete && (token == Token::Eof || self.position >= self.buffer.len()) {
            return Err(self.end_of_input(stringify!(Lexer)).into());
        }
        Ok(token)
    }

    fn scan_token(&mut self) -> ParseResult<Token> {
        loop {
            self.skip_white_space();
            let start = self.position;
            let byte = match self.buffer.get(start) {
                Some(&byte) => byte,
                None => return Ok(Token::Eof),
            };
            let next = self.buffer.get(start + 1).copied();
            match byte {
                b'[' => {
                    self.position += 1;
                    return Ok(Token::ArrayStart);
                }
                b']' => {
                    self.position += 1;
                    return Ok(Token::ArrayEnd);
                }
                b'<' if next == Some(b'<') => {
                    self.position += 2;
                    return Ok(Token::DictStart);
                }
                b'<' => return self.hex_string(),
                b'>' if next == Some(b'>') => {
                    self.position += 2;
                    return Ok(Token::DictEnd);
                }
                b'(' => return self.literal_string(),
                b'/' => return self.name(),
                // PostScript calculator braces only occur in function
                // streams, but are harmless as keywords
                b'{' | b'}' => {
                    self.position += 1;
                    return Ok(Token::Keyword(vec![byte]));
                }
                b'>' | b')' => self.stray(start, byte)?,
                b'+' | b'-' | b'.' | b'0'..=b'9' => return self.number(),
                _ => return Ok(self.keyword()),
            }
        }
    }

    fn end_of_input(&self, object: &'static str) -> ParseFailure {
        ParseFailure::new(self.buffer.len(), object, ParseErrorCode::UnexpectedEof)
    }

    fn stray(&mut self, start: Offset, byte: Byte) -> ParseResult<()> {
        if self.options.is_strict() {
            return Err(ParseFailure::new(
                start,
                stringify!(Lexer),
                ParseErrorCode::UnexpectedByte(byte),
            )
            .into());
        }
        warn!("Skipping stray {:?} at offset {}", char::from(byte), start);
        self.position += 1;
        Ok(())
    }

    fn regular_run(&mut self) -> &'buffer [Byte] {
        let start = self.position;
        let len = self.buffer[start..]
            .iter()
            .take_while(|&&byte| is_regular(byte))
            .count();
        self.position += len;
        &self.buffer[start..start + len]
    }

    fn keyword(&mut self) -> Token {
        Token::Keyword(self.regular_run().to_vec())
    }

    /// REFERENCE: [7.3.3 Numeric objects, p24]
    fn number(&mut self) -> ParseResult<Token> {
        let start = self.position;
        let run = self.regular_run();
        if let Some(value) = ascii_to_i64(run) {
            return Ok(Token::Integer(value));
        }
        // Integers too large for i64 are kept as reals
        if let Some(value) = ascii_to_f64(run) {
            return Ok(Token::Real(value));
        }
        if self.options.is_strict() {
            return Err(ParseFailure::new(
                start,
                stringify!(Numeric),
                ParseErrorCode::MalformedNumber(debug_bytes(run)),
            )
            .into());
        }
        let fallback = self.options.fallback_integer();
        warn!(
            "Malformed number {} at offset {} replaced with {}",
            debug_bytes(run),
            start,
            fallback
        );
        Ok(Token::Integer(fallback))
    }

    /// REFERENCE: [7.3.5 Name objects, p27-28]
    fn name(&mut self) -> ParseResult<Token> {
        let start = self.position;
        self.position += 1;
        let run = self.regular_run();
        let mut name = Vec::with_capacity(run.len());
        let mut index = 0;
        while index < run.len() {
            let byte = run[index];
            if byte == b'#' {
                let escaped = run
                    .get(index + 1)
                    .and_then(|&high| hex_val(high))
                    .zip(run.get(index + 2).and_then(|&low| hex_val(low)));
                if let Some((high, low)) = escaped {
                    name.push(high << 4 | low);
                    index += 3;
                    continue;
                }
                if self.options.is_strict() {
                    return Err(ParseFailure::new(
                        start,
                        stringify!(Name),
                        ParseErrorCode::InvalidNameEscape(debug_bytes(run)),
                    )
                    .into());
                }
                warn!(
                    "Invalid escape in name /{} at offset {} kept verbatim",
                    debug_bytes(run),
                    start
                );
            }
            name.push(byte);
            index += 1;
        }
        Ok(Token::Name(name))
    }

    /// REFERENCE: [7.3.4.2 Literal strings, p25-27]
    fn literal_string(&mut self) -> ParseResult<Token> {
        let start = self.position;
        self.position += 1;
        let mut string = Vec::new();
        let mut depth = 1usize;
        loop {
            let byte = match self.buffer.get(self.position) {
                Some(&byte) => byte,
                None => {
                    if self.complete && !self.options.is_strict() {
                        warn!(
                            "Unbalanced literal string at offset {} closed at the end of input",
                            start
                        );
                        return Ok(Token::LiteralString(string));
                    }
                    return Err(self.end_of_input(stringify!(LiteralString)).into());
                }
            };
            self.position += 1;
            match byte {
                b'\\' => self.escape(&mut string),
                b'(' => {
                    depth += 1;
                    string.push(byte);
                }
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(Token::LiteralString(string));
                    }
                    string.push(byte);
                }
                // An end-of-line marker within the string is read as a line
                // feed, whichever marker the file uses
                b'\r' => {
                    if self.buffer.get(self.position) == Some(&b'\n') {
                        self.position += 1;
                    }
                    string.push(b'\n');
                }
                _ => string.push(byte),
            }
        }
    }

    /// REFERENCE: [Table 3 — Escape sequences in literal strings, p26]
    fn escape(&mut self, string: &mut Vec<Byte>) {
        let byte = match self.buffer.get(self.position) {
            Some(&byte) => byte,
            // Leave the end of input to the caller
            None => return,
        };
        self.position += 1;
        match byte {
            b'n' => string.push(b'\n'),
            b'r' => string.push(b'\r'),
            b't' => string.push(b'\t'),
            b'b' => string.push(b'\x08'),
            b'f' => string.push(b'\x0C'),
            b'0'..=b'7' => {
                let mut value = u16::from(byte - b'0');
                for _ in 0..2 {
                    match self.buffer.get(self.position) {
                        Some(&digit @ b'0'..=b'7') => {
                            value = value * 8 + u16::from(digit - b'0');
                            self.position += 1;
                        }
                        _ => break,
                    }
                }
                // High-order overflow is ignored
                string.push(value as Byte);
            }
            // Line continuation
            b'\r' => {
                if self.buffer.get(self.position) == Some(&b'\n') {
                    self.position += 1;
                }
            }
            b'\n' => {}
            // Covers \( \) \\ and, ignoring the backslash, unknown escapes
            _ => string.push(byte),
        }
    }

    /// REFERENCE: [7.3.4.3 Hexadecimal strings, p27]
    fn hex_string(&mut self) -> ParseResult<Token> {
        let start = self.position;
        self.position += 1;
        let mut string = Vec::new();
        let mut high: Option<Byte> = None;
        loop {
            let byte = match self.buffer.get(self.position) {
                Some(&byte) => byte,
                None => return Err(self.end_of_input(stringify!(HexString)).into()),
            };
            self.position += 1;
            if byte == b'>' {
                break;
            }
            if is_white_space(byte) {
                continue;
            }
            let value = match hex_val(byte) {
                Some(value) => value,
                None if self.options.is_strict() => {
                    return Err(ParseFailure::new(
                        self.position - 1,
                        stringify!(HexString),
                        ParseErrorCode::InvalidHexDigit(byte),
                    )
                    .into());
                }
                None => {
                    warn!(
                        "Skipping invalid digit {:?} in hexadecimal string at offset {}",
                        char::from(byte),
                        start
                    );
                    continue;
                }
            };
            match high.take() {
                Some(high) => string.push(high << 4 | value),
                None => high = Some(value),
            }
        }
        // An odd final digit is followed by an implied 0
        if let Some(high) = high {
            string.push(high << 4);
        }
        Ok(Token::HexString(string))
    }
}

mod convert {
    use super::*;

    impl<'buffer> Lexer<'buffer> {
        pub(crate) fn new(buffer: &'buffer [Byte], options: ParseOptions) -> Self {
            Self {
                buffer,
                position: 0,
                complete: true,
                options,
            }
        }

        pub(crate) fn set_complete(mut self, complete: bool) -> Self {
            self.complete = complete;
            self
        }

        pub(crate) fn at(mut self, position: Offset) -> Self {
            self.seek(position);
            self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_err_eq;

    fn tokens(buffer: &[Byte], options: ParseOptions) -> ParseResult<Vec<Token>> {
        let mut lexer = Lexer::new(buffer, options);
        let mut tokens = Vec::new();
        loop {
            match lexer.next_token()? {
                Token::Eof => return Ok(tokens),
                token => tokens.push(token),
            }
        }
    }

    fn keyword(keyword: &str) -> Token {
        Token::Keyword(keyword.as_bytes().to_vec())
    }

    #[test]
    fn lexer_indirect_object() {
        let buffer = b"1 0 obj % comment\n<</Type/Catalog/Pages 2 0 R>>\nendobj";
        assert_eq!(
            tokens(buffer, ParseOptions::strict()).unwrap(),
            vec![
                Token::Integer(1),
                Token::Integer(0),
                keyword("obj"),
                Token::DictStart,
                Token::Name(b"Type".to_vec()),
                Token::Name(b"Catalog".to_vec()),
                Token::Name(b"Pages".to_vec()),
                Token::Integer(2),
                Token::Integer(0),
                keyword("R"),
                Token::DictEnd,
                keyword("endobj"),
            ]
        );
    }

    #[test]
    fn lexer_missing_white_space() {
        let buffer = b"[1 2.5/A(s)<41>]true";
        assert_eq!(
            tokens(buffer, ParseOptions::strict()).unwrap(),
            vec![
                Token::ArrayStart,
                Token::Integer(1),
                Token::Real(2.5),
                Token::Name(b"A".to_vec()),
                Token::LiteralString(b"s".to_vec()),
                Token::HexString(b"A".to_vec()),
                Token::ArrayEnd,
                keyword("true"),
            ]
        );
    }

    #[test]
    fn lexer_numbers() {
        let buffer = b"123 43445 +17 -98 0 34.5 -3.62 +123.6 4. -.002 0.0";
        assert_eq!(
            tokens(buffer, ParseOptions::strict()).unwrap(),
            vec![
                Token::Integer(123),
                Token::Integer(43445),
                Token::Integer(17),
                Token::Integer(-98),
                Token::Integer(0),
                Token::Real(34.5),
                Token::Real(-3.62),
                Token::Real(123.6),
                Token::Real(4.0),
                Token::Real(-0.002),
                Token::Real(0.0),
            ]
        );
    }

    #[test]
    fn lexer_malformed_number() {
        let buffer = b"--5 1";
        assert_eq!(
            tokens(buffer, ParseOptions::lenient()).unwrap(),
            vec![Token::Integer(0), Token::Integer(1)]
        );
        assert_eq!(
            tokens(buffer, ParseOptions::lenient().set_fallback_integer(-1)).unwrap(),
            vec![Token::Integer(-1), Token::Integer(1)]
        );
        assert_err_eq!(
            tokens(buffer, ParseOptions::strict()),
            ParseFailure::new(
                0,
                stringify!(Numeric),
                ParseErrorCode::MalformedNumber("--5".to_string())
            )
        );
    }

    #[test]
    fn lexer_literal_strings() {
        let buffer = b"(a (nested) string) (\\(\\)\\\\\\n\\101\\0053) (line\\\r\ncontinued) (cr\rlf)";
        assert_eq!(
            tokens(buffer, ParseOptions::strict()).unwrap(),
            vec![
                Token::LiteralString(b"a (nested) string".to_vec()),
                Token::LiteralString(b"()\\\nA\x053".to_vec()),
                Token::LiteralString(b"linecontinued".to_vec()),
                Token::LiteralString(b"cr\nlf".to_vec()),
            ]
        );
    }

    #[test]
    fn lexer_unbalanced_literal_string() {
        let buffer = b"(never (closed)";
        assert_eq!(
            tokens(buffer, ParseOptions::lenient()).unwrap(),
            vec![Token::LiteralString(b"never (closed)".to_vec())]
        );
        assert_err_eq!(
            tokens(buffer, ParseOptions::strict()),
            ParseFailure::new(
                buffer.len(),
                stringify!(LiteralString),
                ParseErrorCode::UnexpectedEof
            )
        );
        // A partial buffer asks for more input even in lenient mode
        let mut lexer = Lexer::new(buffer, ParseOptions::lenient()).set_complete(false);
        assert!(lexer.next_token().unwrap_err().is_truncated());
    }

    #[test]
    fn lexer_partial_buffer() {
        // The number may continue past the end of the window
        let mut lexer = Lexer::new(b"12 0 obj 34", ParseOptions::lenient()).set_complete(false);
        assert_eq!(lexer.next_token(), Ok(Token::Integer(12)));
        assert_eq!(lexer.next_token(), Ok(Token::Integer(0)));
        assert_eq!(lexer.next_token(), Ok(keyword("obj")));
        assert!(lexer.next_token().unwrap_err().is_truncated());
    }

    #[test]
    fn lexer_hex_strings() {
        let buffer = b"<48 65 6C6c6F> <901FA> <>";
        assert_eq!(
            tokens(buffer, ParseOptions::strict()).unwrap(),
            vec![
                Token::HexString(b"Hello".to_vec()),
                Token::HexString(vec![0x90, 0x1F, 0xA0]),
                Token::HexString(vec![]),
            ]
        );
        assert_err_eq!(
            tokens(b"<4X>", ParseOptions::strict()),
            ParseFailure::new(
                2,
                stringify!(HexString),
                ParseErrorCode::InvalidHexDigit(b'X')
            )
        );
        assert_eq!(
            tokens(b"<4X1>", ParseOptions::lenient()).unwrap(),
            vec![Token::HexString(vec![0x41])]
        );
    }

    #[test]
    fn lexer_names() {
        let buffer = b"/Name1 /A;Name_With-Various***Characters? /1.2 / /paired#28#29parentheses /The_Key_of_F#23_Minor";
        assert_eq!(
            tokens(buffer, ParseOptions::strict()).unwrap(),
            vec![
                Token::Name(b"Name1".to_vec()),
                Token::Name(b"A;Name_With-Various***Characters?".to_vec()),
                Token::Name(b"1.2".to_vec()),
                Token::Name(b"".to_vec()),
                Token::Name(b"paired()parentheses".to_vec()),
                Token::Name(b"The_Key_of_F#_Minor".to_vec()),
            ]
        );
        assert_eq!(
            tokens(b"/A#2", ParseOptions::lenient()).unwrap(),
            vec![Token::Name(b"A#2".to_vec())]
        );
        assert!(tokens(b"/A#2", ParseOptions::strict()).is_err());
    }

    #[test]
    fn lexer_stray_delimiters() {
        assert_eq!(
            tokens(b"1 ) 2", ParseOptions::lenient()).unwrap(),
            vec![Token::Integer(1), Token::Integer(2)]
        );
        assert_err_eq!(
            tokens(b"1 ) 2", ParseOptions::strict()),
            ParseFailure::new(2, stringify!(Lexer), ParseErrorCode::UnexpectedByte(b')'))
        );
    }

    #[test]
    fn lexer_seek_and_raw() {
        let buffer = b"stream\nRAW DATA\nendstream";
        let mut lexer = Lexer::new(buffer, ParseOptions::strict());
        assert_eq!(lexer.next_token().unwrap(), keyword("stream"));
        lexer.seek(lexer.position() + 1);
        assert_eq!(lexer.take_raw(8), Some(b"RAW DATA".as_slice()));
        assert_eq!(lexer.peek_token().unwrap(), keyword("endstream"));
        assert_eq!(lexer.next_token().unwrap(), keyword("endstream"));
        assert_eq!(lexer.next_token().unwrap(), Token::Eof);
        assert_eq!(lexer.take_raw(1), None);

        lexer.seek(0);
        assert_eq!(lexer.next_token().unwrap(), keyword("stream"));
    }
}
