//! Escaping and anchor slugs.

/// Escape text for use in HTML content and double-quoted attributes.
///
/// Only `&`, `<` and `"` are escaped; `>` and `'` are safe in the places
/// the renderers put text.
pub fn encode_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '"' => result.push_str("&quot;"),
            _ => result.push(c),
        }
    }
    result
}

/// Generate an anchor slug from a title.
///
/// Lowercases, turns whitespace, `-` and `_` into single hyphens and drops
/// everything else that is not alphanumeric.
///
/// # Examples
///
/// ```
/// use rcpreview::html::slugify;
///
/// assert_eq!(slugify("Key Terms"), "key-terms");
/// assert_eq!(slugify("Figures of Speech!"), "figures-of-speech");
/// ```
pub fn slugify(text: &str) -> String {
    text.chars()
        .filter_map(|c| {
            if c.is_alphanumeric() {
                Some(c.to_lowercase().next().unwrap_or(c))
            } else if c.is_whitespace() || c == '-' || c == '_' {
                Some('-')
            } else {
                None
            }
        })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}
