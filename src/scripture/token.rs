//! Word tokens and the word tokenizer.
//!
//! Quotes and verse text must tokenize identically for occurrence counting to
//! line up, so both the USFM parser and the quote aligner go through
//! [`tokenize`] and [`normalize_token`].

use serde::Serialize;

/// A word in one verse with its within-verse occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerseToken {
    /// Surface form as written.
    pub text: String,
    /// 1-based index among identical (normalized) words in the verse.
    pub occurrence: u32,
    /// Number of identical (normalized) words in the verse.
    pub occurrences: u32,
}

impl VerseToken {
    pub fn new(text: impl Into<String>, occurrence: u32, occurrences: u32) -> Self {
        Self {
            text: text.into(),
            occurrence,
            occurrences,
        }
    }

    pub fn normalized(&self) -> String {
        normalize_token(&self.text)
    }
}

/// Number occurrences for a sequence of surface words.
pub fn number_occurrences<S: AsRef<str>>(words: &[S]) -> Vec<VerseToken> {
    let normalized: Vec<String> = words.iter().map(|w| normalize_token(w.as_ref())).collect();
    normalized
        .iter()
        .enumerate()
        .map(|(i, norm)| {
            let occurrence = normalized[..=i].iter().filter(|n| *n == norm).count() as u32;
            let occurrences = normalized.iter().filter(|n| *n == norm).count() as u32;
            VerseToken::new(words[i].as_ref(), occurrence, occurrences)
        })
        .collect()
}

/// Format characters that are invisible and must not affect matching.
fn is_format_char(c: char) -> bool {
    matches!(c, '\u{2060}' | '\u{200B}'..='\u{200D}' | '\u{FEFF}' | '\u{00AD}')
}

/// Combining marks of the scripts scripture resources are written in.
fn is_mark(c: char) -> bool {
    matches!(c,
        '\u{0300}'..='\u{036F}'
        | '\u{0483}'..='\u{0489}'
        | '\u{0591}'..='\u{05BD}'
        | '\u{05BF}'
        | '\u{05C1}'..='\u{05C2}'
        | '\u{05C4}'..='\u{05C5}'
        | '\u{05C7}'
        | '\u{0610}'..='\u{061A}'
        | '\u{064B}'..='\u{065F}'
        | '\u{0670}'
        | '\u{1AB0}'..='\u{1AFF}'
        | '\u{1DC0}'..='\u{1DFF}'
        | '\u{20D0}'..='\u{20FF}'
        | '\u{FE20}'..='\u{FE2F}')
}

/// Indic vowel signs and viramas, kept inside words.
fn is_indic_sign(c: char) -> bool {
    matches!(c, '\u{0900}'..='\u{0DFF}') && !matches!(c, '\u{0964}' | '\u{0965}')
}

pub fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || is_mark(c) || is_format_char(c) || is_indic_sign(c)
}

fn is_apostrophe(c: char) -> bool {
    matches!(c, '\'' | '\u{2019}')
}

/// Split text into words, returning each word with its byte span.
///
/// Apostrophes between word characters stay inside the word (`God's`).
pub fn tokenize_spans(text: &str) -> Vec<(usize, usize)> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut spans = Vec::new();
    let mut start: Option<usize> = None;

    for (i, &(pos, c)) in chars.iter().enumerate() {
        let inside = is_word_char(c)
            || (is_apostrophe(c)
                && start.is_some()
                && chars.get(i + 1).is_some_and(|&(_, next)| is_word_char(next)));
        match (inside, start) {
            (true, None) => start = Some(pos),
            (false, Some(s)) => {
                spans.push((s, pos));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        spans.push((s, text.len()));
    }

    // A span made only of format characters is not a word
    spans.retain(|&(s, e)| text[s..e].chars().any(|c| !is_format_char(c)));
    spans
}

/// Split text into words.
pub fn tokenize(text: &str) -> Vec<String> {
    tokenize_spans(text)
        .into_iter()
        .map(|(s, e)| text[s..e].to_string())
        .collect()
}

/// Comparison form of a word: format characters removed and edge
/// punctuation trimmed.
///
/// Case is kept. Alignment milestones count `x-occurrence` on the exact
/// word, so `Καὶ` and `καὶ` in one verse are different words.
pub fn normalize_token(word: &str) -> String {
    word.chars()
        .filter(|&c| !is_format_char(c))
        .collect::<String>()
        .trim_matches(|c: char| !is_word_char(c))
        .to_string()
}
