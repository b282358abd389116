use ::log::trace;
use ::nom::branch::alt;
use ::nom::bytes::complete::tag;
use ::nom::bytes::complete::take_till;
use ::nom::bytes::complete::take_while;
use ::nom::bytes::complete::take_while1;
use ::nom::character::complete::char;
use ::nom::combinator::recognize;
use ::nom::multi::many1;
use ::nom::sequence::preceded;
use ::nom::IResult;

use crate::fmt::debug_bytes;
use crate::Byte;

/// REFERENCE: [3.68 white-space character, p14] and ["Table 1 — White-space
/// characters" in 7.2.3, "Character set", p22]
pub(crate) const fn is_white_space(byte: Byte) -> bool {
    byte == b'\x09' // HORIZONTAL TABULATION
        || byte == b'\x0A' // LINE FEED
        || byte == b'\x0C' // FORM FEED
        || byte == b'\x0D' // CARRIAGE RETURN
        || byte == b'\x20' // SPACE
        || byte == b'\x00' // NULL
}

/// REFERENCE: [7.2.3 Character set, p22]
pub(crate) const fn is_delimiter(byte: Byte) -> bool {
    matches!(
        byte,
        b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
    )
}

/// REFERENCE: [7.2.3 Character set, p23] indicates that regular characters are
/// not restricted to the ASCII range.
pub(crate) const fn is_regular(byte: Byte) -> bool {
    !is_white_space(byte) && !is_delimiter(byte)
}

/// REFERENCE: [7.2.3 Character set, p22]
pub(crate) fn white_space(buffer: &[Byte]) -> IResult<&[Byte], &[Byte]> {
    take_while1(is_white_space)(buffer)
}

/// REFERENCE: [7.2.4 Comments, p23]
pub(crate) fn comment(buffer: &[Byte]) -> IResult<&[Byte], &[Byte]> {
    let (buffer, comment) =
        preceded(char('%'), take_till(|byte| byte == b'\n' || byte == b'\r'))(buffer)?;
    trace!("Comment: {}", debug_bytes(comment));
    Ok((buffer, comment))
}

/// REFERENCE: [7.2.4 Comments, p23]
pub(crate) fn white_space_or_comment(buffer: &[Byte]) -> IResult<&[Byte], &[Byte]> {
    // A comment is treated as a single white-space character.
    recognize(many1(alt((white_space, comment))))(buffer)
}

/// REFERENCE: [7.2.3 Character set, p22]
pub(crate) fn eol(buffer: &[Byte]) -> IResult<&[Byte], &[Byte]> {
    // HACK Some producers write spaces before the EOL marker
    preceded(
        take_while(|byte| byte == b'\x09' || byte == b'\x0C' || byte == b'\x20' || byte == b'\x00'),
        alt((tag(b"\r\n"), tag(b"\n"), tag(b"\r"))),
    )(buffer)
}

/// A run of regular characters: a keyword, a number or the body of a name.
pub(crate) fn regular_token(buffer: &[Byte]) -> IResult<&[Byte], &[Byte]> {
    take_while1(is_regular)(buffer)
}

/// A keyword followed by a delimiter, white space or the end of input, so
/// that `xref` does not match the start of `xrefs`.
pub(crate) fn keyword<'buffer>(
    keyword: &'static str,
) -> impl FnMut(&'buffer [Byte]) -> IResult<&'buffer [Byte], &'buffer [Byte]> {
    move |buffer| {
        let (remains, matched) = tag(keyword)(buffer)?;
        if remains.first().copied().map_or(false, is_regular) {
            return Err(::nom::Err::Error(::nom::error::Error::new(
                buffer,
                ::nom::error::ErrorKind::Tag,
            )));
        }
        Ok((remains, matched))
    }
}

#[cfg(test)]
mod tests {
    use ::nom::error::Error as NomError;
    use ::nom::error::ErrorKind;
    use ::nom::Err as NomErr;

    use super::*;

    #[test]
    fn white_space_valid() {
        for byte in [b' ', b'\t', b'\n', b'\x0C', b'\r', b'\x00'] {
            let buffer = [byte, b'.'];
            assert_eq!(
                white_space(&buffer).unwrap(),
                (b".".as_slice(), &buffer[..1])
            );
        }
        // Comments, delimiters and regular characters end the run
        assert_eq!(
            white_space(b"  %%EOF\n").unwrap(),
            (b"%%EOF\n".as_slice(), b"  ".as_slice())
        );
        assert_eq!(
            white_space(b" R").unwrap(),
            (b"R".as_slice(), b" ".as_slice())
        );
    }

    #[test]
    fn white_space_invalid() {
        assert_eq!(
            white_space(b">"),
            Err(NomErr::Error(NomError::new(
                b">".as_slice(),
                ErrorKind::TakeWhile1
            )))
        );
    }

    #[test]
    fn comment_valid() {
        assert_eq!(
            comment(b"%\r\n").unwrap(),
            (b"\r\n".as_slice(), b"".as_slice())
        );
        assert_eq!(
            comment(b"%%EOF\n").unwrap(),
            (b"\n".as_slice(), b"%EOF".as_slice())
        );
        assert_eq!(
            comment(b"%PDF\rLINE2%ANOTHER COMMENT\n").unwrap(),
            (b"\rLINE2%ANOTHER COMMENT\n".as_slice(), b"PDF".as_slice())
        );
        // Invalid UTF-8
        assert_eq!(
            comment(b"%\x00\x9F\x92\x96\r\n").unwrap(),
            (b"\r\n".as_slice(), b"\x00\x9F\x92\x96".as_slice())
        );
    }

    #[test]
    fn white_space_or_comment_valid() {
        assert_eq!(
            white_space_or_comment(b"  %A COMMENT\n % ANOTHER\r<").unwrap(),
            (b"<".as_slice(), b"  %A COMMENT\n % ANOTHER\r".as_slice())
        );
        assert_eq!(
            white_space_or_comment(b"\r\n1").unwrap(),
            (b"1".as_slice(), b"\r\n".as_slice())
        );
        assert!(white_space_or_comment(b"R").is_err());
    }

    #[test]
    fn eol_valid() {
        assert_eq!(eol(b"\n<").unwrap(), (b"<".as_slice(), b"\n".as_slice()));
        assert_eq!(eol(b"\r<").unwrap(), (b"<".as_slice(), b"\r".as_slice()));
        assert_eq!(
            eol(b"\r\n<").unwrap(),
            (b"<".as_slice(), b"\r\n".as_slice())
        );
        assert_eq!(
            eol(b"  \n<").unwrap(),
            (b"<".as_slice(), b"\n".as_slice())
        );
        assert!(eol(b"<").is_err());
    }

    #[test]
    fn character_classes() {
        for byte in b"()<>[]{}/%" {
            assert!(is_delimiter(*byte));
            assert!(!is_regular(*byte));
        }
        assert!(is_regular(b'#'));
        assert!(is_regular(0x80));
        assert!(!is_regular(b' '));
    }

    #[test]
    fn regular_token_valid() {
        assert_eq!(
            regular_token(b"endobj\n").unwrap(),
            (b"\n".as_slice(), b"endobj".as_slice())
        );
        assert_eq!(
            regular_token(b"-0.5/Name").unwrap(),
            (b"/Name".as_slice(), b"-0.5".as_slice())
        );
        assert!(regular_token(b"[").is_err());
    }

    #[test]
    fn keyword_valid() {
        assert_eq!(
            keyword("xref")(b"xref\n0 1").unwrap(),
            (b"\n0 1".as_slice(), b"xref".as_slice())
        );
        assert_eq!(
            keyword("trailer")(b"trailer<<").unwrap(),
            (b"<<".as_slice(), b"trailer".as_slice())
        );
        assert_eq!(keyword("xref")(b"xref").unwrap().0, b"".as_slice());
        assert!(keyword("xref")(b"xrefs").is_err());
    }
}
