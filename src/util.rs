//! Small text helpers shared across the pipeline.

use std::borrow::Cow;

/// Decode a package file. Text that is not valid UTF-8 (old tS exports made
/// on Windows) is read as Windows-1252. A UTF-8 BOM is dropped.
pub fn decode_text(bytes: &[u8]) -> Cow<'_, str> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match encoding_rs::UTF_8.decode_without_bom_handling_and_without_replacement(bytes) {
        Some(text) => text,
        None => encoding_rs::WINDOWS_1252.decode_without_bom_handling(bytes).0,
    }
}

/// Collapse every run of whitespace into a single space and trim the ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse a number that may carry leading zeros (`"03"`), as used in tS
/// directory and file names.
pub fn parse_padded(text: &str) -> Option<u32> {
    let text = text.trim();
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

/// Zero-pad a number to two digits (`3` → `"03"`).
pub fn pad2(n: u32) -> String {
    format!("{n:02}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_utf8() {
        assert_eq!(decode_text("שָׁלוֹם".as_bytes()), "שָׁלוֹם");
    }

    #[test]
    fn test_decode_falls_back_to_windows_1252() {
        // 0xE9 is "é" in Windows-1252 and invalid as a lone UTF-8 byte
        assert_eq!(decode_text(&[b'c', b'a', b'f', 0xE9]), "café");
    }

    #[test]
    fn test_decode_drops_bom() {
        assert_eq!(decode_text(b"\xEF\xBB\xBF\\id TIT"), "\\id TIT");
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  In the\n beginning  "), "In the beginning");
    }

    #[test]
    fn test_parse_padded() {
        assert_eq!(parse_padded("03"), Some(3));
        assert_eq!(parse_padded("front"), None);
        assert_eq!(parse_padded(""), None);
    }
}
