//! Byte-string decoding for text signals

use crate::types::EMPTY_STRING_PLACEHOLDER;

const TRAILING_PADDING: &[char] = &[' ', '\r', '\n', '\t', '\x0b', '\0'];

/// Decode a byte-string sample for display.
///
/// Tries UTF-8 first and falls back to Latin-1, which never fails. Trailing
/// padding (spaces, CR, LF, tabs, vertical tabs and NULs) is removed, and a
/// sample that ends up empty is shown as `<empty string>`.
pub fn decode_bytes(bytes: &[u8]) -> String {
    let decoded = match std::str::from_utf8(bytes) {
        Ok(text) => text.trim_end_matches(TRAILING_PADDING).to_string(),
        Err(_) => {
            let latin1: String = bytes.iter().map(|&b| b as char).collect();
            latin1.trim_end_matches(TRAILING_PADDING).to_string()
        }
    };

    if decoded.is_empty() {
        EMPTY_STRING_PLACEHOLDER.to_string()
    } else {
        decoded
    }
}
