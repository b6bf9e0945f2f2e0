//! Hex text <-> byte conversion.
//!
//! # Parsing policy
//!
//! Console hex input is parsed tolerantly:
//!
//! 1. Tokens are maximal runs of ASCII alphanumerics. Anything else
//!    (whitespace, `,` `;` `:` `-` `|`, brackets, ...) separates tokens.
//! 2. A leading `0x`/`0X` is stripped from each token.
//! 3. A token that still holds a non-hex character is rejected whole.
//! 4. An even digit count is read as byte pairs (`4142` -> `41 42`); an odd
//!    count is left-padded with a zero (`a` -> `0a`, `123` -> `01 23`).
//! 5. A bare `0x` is rejected.
//!
//! Rejected tokens are returned to the caller, which logs them. Parsing
//! never fails.

pub mod dump;

use bytes::{BufMut, BytesMut};

pub use dump::DumpFormatter;

/// Render bytes as lowercase two-digit hex separated by single spaces.
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 3);
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        push_hex_byte(&mut out, *b);
    }
    out
}

pub(crate) fn push_hex_byte(out: &mut String, b: u8) {
    const DIGITS: &[u8; 16] = b"0123456789abcdef";
    out.push(DIGITS[(b >> 4) as usize] as char);
    out.push(DIGITS[(b & 0x0F) as usize] as char);
}

/// Result of tolerant hex parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedHex {
    /// Bytes decoded from all accepted tokens, in order.
    pub bytes: BytesMut,
    /// Tokens skipped because they were not valid hex.
    pub rejected: Vec<String>,
}

/// Parse hex text into bytes, keeping track of rejected tokens.
pub fn parse_hex(text: &str) -> ParsedHex {
    let mut parsed = ParsedHex::default();

    for token in text
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
    {
        let digits = token
            .strip_prefix("0x")
            .or_else(|| token.strip_prefix("0X"))
            .unwrap_or(token);

        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            parsed.rejected.push(token.to_string());
            continue;
        }

        let digits = digits.as_bytes();
        let mut rest = digits;
        if digits.len() % 2 == 1 {
            parsed.bytes.put_u8(nibble(digits[0]));
            rest = &digits[1..];
        }
        for pair in rest.chunks_exact(2) {
            parsed.bytes.put_u8((nibble(pair[0]) << 4) | nibble(pair[1]));
        }
    }

    parsed
}

/// Parse hex text into bytes, silently dropping rejected tokens.
pub fn hex_to_bytes(text: &str) -> Vec<u8> {
    parse_hex(text).bytes.to_vec()
}

fn nibble(digit: u8) -> u8 {
    match digit {
        b'0'..=b'9' => digit - b'0',
        b'a'..=b'f' => digit - b'a' + 10,
        b'A'..=b'F' => digit - b'A' + 10,
        _ => 0,
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_lowercase_space_separated() {
        assert_eq!(bytes_to_hex(&[0x41, 0x42, 0x0a]), "41 42 0a");
        assert_eq!(bytes_to_hex(&[0xff, 0x00]), "ff 00");
        assert_eq!(bytes_to_hex(&[]), "");
    }

    #[test]
    fn roundtrip_all_byte_values() {
        let all: Vec<u8> = (0..=255u8).collect();
        assert_eq!(hex_to_bytes(&bytes_to_hex(&all)), all);
    }

    #[test]
    fn accepts_punctuation_and_prefixes() {
        assert_eq!(hex_to_bytes("41,42;0x0A"), vec![0x41, 0x42, 0x0a]);
        assert_eq!(hex_to_bytes("[de:ad-be|ef]"), vec![0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(hex_to_bytes("  \t41\t\t42  "), vec![0x41, 0x42]);
    }

    #[test]
    fn even_tokens_split_into_pairs() {
        assert_eq!(hex_to_bytes("41424344"), vec![0x41, 0x42, 0x43, 0x44]);
        assert_eq!(hex_to_bytes("0x0102"), vec![0x01, 0x02]);
    }

    #[test]
    fn odd_tokens_are_left_padded() {
        assert_eq!(hex_to_bytes("a"), vec![0x0a]);
        assert_eq!(hex_to_bytes("123"), vec![0x01, 0x23]);
        assert_eq!(hex_to_bytes("0xf"), vec![0x0f]);
    }

    #[test]
    fn non_hex_tokens_are_rejected_whole() {
        let parsed = parse_hex("41 zz 4g 42 0x");
        assert_eq!(&parsed.bytes[..], &[0x41, 0x42]);
        assert_eq!(parsed.rejected, vec!["zz", "4g", "0x"]);
    }

    #[test]
    fn empty_and_separator_only_input() {
        assert!(hex_to_bytes("").is_empty());
        assert!(parse_hex(" ,;: ").rejected.is_empty());
    }
}
