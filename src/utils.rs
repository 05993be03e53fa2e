use crate::base::{Error, Result};
use log::trace;
use std::fmt::Write;

/// Parses a whitespace separated list of hexadecimal byte tokens.
///
/// Each token is one or two hex digits, optionally prefixed with `0x` or `0X`
/// (`"0x01 0A ff"` yields `[0x01, 0x0A, 0xFF]`). An empty or blank input yields
/// an empty vector.
///
/// # Errors
///
/// Returns `Error::InvalidHexToken` carrying the first token that is not a valid byte.
pub fn parse_hex_tokens(input: &str) -> Result<Vec<u8>> {
    trace!("parse_hex_tokens called with {:?}", input);
    input.split_whitespace().map(parse_hex_token).collect()
}

fn parse_hex_token(token: &str) -> Result<u8> {
    let digits = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
        .unwrap_or(token);

    // from_str_radix alone would accept a leading '+'
    if digits.is_empty() || digits.len() > 2 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(Error::InvalidHexToken {
            token: token.to_owned(),
        });
    }

    u8::from_str_radix(digits, 16).map_err(|_| Error::InvalidHexToken {
        token: token.to_owned(),
    })
}

/// Formats bytes as uppercase two digit hex values separated by single spaces.
pub fn hex_string(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 3);
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        // Writing into a String cannot fail
        let _ = write!(out, "{:02X}", b);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mixed_token_styles() {
        assert_eq!(
            parse_hex_tokens("0x01 0A ff\t7").unwrap(),
            vec![0x01, 0x0A, 0xFF, 0x07]
        );
        assert!(parse_hex_tokens("   ").unwrap().is_empty());
    }

    #[test]
    fn rejects_malformed_tokens() {
        for bad in ["ZZ", "0x", "123", "+1", "0xG1", "-1"] {
            match parse_hex_tokens(&format!("01 {}", bad)) {
                Err(Error::InvalidHexToken { token }) => assert_eq!(token, bad),
                other => panic!("expected InvalidHexToken for {:?}, got {:?}", bad, other),
            }
        }
    }

    #[test]
    fn hex_string_is_space_separated() {
        assert_eq!(hex_string(&[0xAA, 0x00, 0x5f]), "AA 00 5F");
        assert_eq!(hex_string(&[]), "");
    }
}
