use crate::parse::character_set::is_white_space;
use crate::Byte;
use crate::MAX_DEBUG_BYTES;

const HEX_DIGITS: &[Byte; 16] = b"0123456789ABCDEF";

// FIXME Why not convert to printable UTF-8 characters when possible?
// This slows down the program. Apply it only for display purposes.
pub(crate) fn debug_bytes(bytes: &[Byte]) -> String {
    let mut result = String::new();
    for &byte in bytes.iter().take(MAX_DEBUG_BYTES) {
        if byte.is_ascii_graphic() || is_white_space(byte) {
            // Preserve ASCII printable and white-space characters
            result.push(char::from(byte));
        } else {
            // Hexadecimal representation of other bytes
            result.push_str(&format!("\\x{:02X}", byte));
        }
    }
    if MAX_DEBUG_BYTES < bytes.len() {
        result.push_str("...");
    }
    result
}

/// Upper-case hexadecimal digits of `bytes`, two per byte, appended to `out`.
pub(crate) fn write_hex(bytes: &[Byte], out: &mut Vec<Byte>) {
    out.reserve(bytes.len() * 2);
    for &byte in bytes {
        out.push(HEX_DIGITS[usize::from(byte >> 4)]);
        out.push(HEX_DIGITS[usize::from(byte & 0x0F)]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_bytes_valid() {
        assert_eq!(debug_bytes(b"1 0 obj\n"), "1 0 obj\n");
        assert_eq!(debug_bytes(b"\x80\xFFA"), "\\x80\\xFFA");
        let long = vec![b'a'; MAX_DEBUG_BYTES + 1];
        assert!(debug_bytes(&long).ends_with("a..."));
    }

    #[test]
    fn write_hex_valid() {
        let mut out = Vec::new();
        write_hex(b"\x00\x1F\xA0\xFF", &mut out);
        assert_eq!(out, b"001FA0FF");
    }
}
