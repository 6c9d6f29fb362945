//! Curly-brace balancing.
//!
//! Gateway texts mark implied words with braces (`created {the} heavens`).
//! A quote that cuts through such a span would display a dangling brace, so
//! both the aligner and the notes renderer close them.

/// Widen `start..end` within `text` until the braces in the slice balance.
///
/// An unmatched `}` pulls the start back to its `{`; an unmatched `{` pushes
/// the end forward past its `}`. Missing partners leave the range as is.
pub fn balance_range(text: &str, mut start: usize, mut end: usize) -> (usize, usize) {
    let mut depth: i32 = 0;
    let mut lowest: i32 = 0;
    for c in text[start..end].chars() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                lowest = lowest.min(depth);
            }
            _ => {}
        }
    }

    for _ in 0..(-lowest) {
        match text[..start].rfind('{') {
            Some(open) => start = open,
            None => break,
        }
    }

    // Opens still unclosed after the slice
    let unclosed = depth - lowest;
    for _ in 0..unclosed {
        match text[end..].find('}') {
            Some(close) => end += close + 1,
            None => break,
        }
    }

    (start, end)
}

/// True when a `}` appears before any `{`.
fn has_leading_close(part: &str) -> bool {
    match (part.find('}'), part.find('{')) {
        (Some(close), Some(open)) => close < open,
        (Some(_), None) => true,
        _ => false,
    }
}

/// True when a `{` appears after the last `}`.
fn has_trailing_open(part: &str) -> bool {
    match (part.rfind('{'), part.rfind('}')) {
        (Some(open), Some(close)) => open > close,
        (Some(_), None) => true,
        _ => false,
    }
}

/// Close braces left dangling at the edges of each quote part.
///
/// A part starting with an unmatched `}` gains a leading `{` when that text
/// occurs in `scripture`, otherwise `{` plus the delimiter (the opening
/// brace is elsewhere). Unmatched trailing `{` is handled symmetrically.
pub fn insert_unmatched_braces(quote: &str, scripture: &str, delimiter: &str) -> String {
    quote
        .split(delimiter)
        .map(|part| {
            let mut fixed = part.to_string();
            if has_leading_close(part) {
                let candidate = format!("{{{part}");
                fixed = if scripture.contains(&candidate) {
                    candidate
                } else {
                    format!("{{{delimiter}{part}")
                };
            }
            if has_trailing_open(part) {
                let candidate = format!("{part}}}");
                fixed = if scripture.contains(&candidate) {
                    format!("{fixed}}}")
                } else {
                    format!("{fixed}{delimiter}}}")
                };
            }
            fixed
        })
        .collect::<Vec<_>>()
        .join(delimiter)
}
