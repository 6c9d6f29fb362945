//! Origin-to-gateway quote alignment.
//!
//! Translation notes quote the origin-language text (Hebrew or Greek). To
//! show the quote in a gateway language, the quoted words are located in the
//! origin book, and each located word is followed through the gateway book's
//! `\zaln` alignment groups to the gateway words that translate it.
//!
//! Words are matched by normalized text *and* within-verse occurrence, never
//! by surface text alone, so a quote of the second `וְ` in a verse maps to
//! the translation of that second word.

mod braces;

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::scripture::{ParsedBook, Reference, normalize_token};
use crate::util::collapse_whitespace;

pub use braces::{balance_range, insert_unmatched_braces};
pub use crate::scripture::tokenize;

/// Separator placed between the runs of a discontinuous quote.
pub const DEFAULT_DELIMITER: &str = " … ";

/// Which match of a quote a note refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Occurrence {
    /// Not applicable; the quote is not aligned.
    #[default]
    None,
    /// The n-th match (1-based).
    Nth(u32),
    /// Every match.
    All,
}

impl Occurrence {
    /// Parse a TSV `Occurrence` field: `0`, `1`, `2`, …, `-1`.
    ///
    /// Absent or unparsable values are [`Occurrence::None`].
    pub fn parse(text: &str) -> Self {
        match text.trim().parse::<i64>() {
            Ok(-1) => Occurrence::All,
            Ok(n) if n >= 1 => u32::try_from(n).map_or(Occurrence::None, Occurrence::Nth),
            _ => Occurrence::None,
        }
    }

    /// Numeric form, as written in TSV files.
    pub fn as_i64(self) -> i64 {
        match self {
            Occurrence::None => 0,
            Occurrence::Nth(n) => n as i64,
            Occurrence::All => -1,
        }
    }
}

/// A quote to align.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteSpec {
    pub quote: String,
    pub reference: String,
    pub occurrence: Occurrence,
}

impl QuoteSpec {
    pub fn new(quote: impl Into<String>, reference: impl Into<String>, occurrence: Occurrence) -> Self {
        Self {
            quote: quote.into(),
            reference: reference.into(),
            occurrence,
        }
    }
}

/// Alignment settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignOptions {
    pub delimiter: String,
}

impl Default for AlignOptions {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER.to_string(),
        }
    }
}

/// An origin word located in the reference.
#[derive(Debug, Clone)]
struct OriginWord {
    chapter: u32,
    verse: u32,
    norm: String,
    occurrence: u32,
}

/// Split a quote into its discontinuous parts, each tokenized and normalized.
fn quote_parts(quote: &str, delimiter: &str) -> Vec<Vec<String>> {
    let quote = if delimiter.trim().is_empty() {
        quote.to_string()
    } else {
        quote.replace(delimiter, "…")
    };
    quote
        .split(['…', '&'])
        .map(|part| {
            tokenize(part)
                .iter()
                .map(|w| normalize_token(w))
                .filter(|w| !w.is_empty())
                .collect::<Vec<_>>()
        })
        .filter(|part| !part.is_empty())
        .collect()
}

/// Collect the origin words of every verse the reference covers.
fn origin_words(origin: &ParsedBook, reference: &Reference) -> Vec<OriginWord> {
    let mut words = Vec::new();
    let mut seen: HashSet<(u32, String)> = HashSet::new();

    for (chapter, verse) in reference.verses(|c| origin.last_verse(c)) {
        let Some(found) = origin.verse(chapter, verse) else {
            continue;
        };
        // A bridged verse is reached once per number it covers
        if !seen.insert((chapter, found.label.clone())) {
            continue;
        }
        words.extend(found.tokens.iter().map(|token| OriginWord {
            chapter,
            verse,
            norm: token.normalized(),
            occurrence: token.occurrence,
        }));
    }
    words
}

fn run_matches_at(words: &[OriginWord], at: usize, part: &[String]) -> bool {
    at + part.len() <= words.len() && words[at..at + part.len()].iter().zip(part).all(|(w, p)| w.norm == *p)
}

/// Find the remaining parts in order, each starting after the previous one.
fn match_rest(words: &[OriginWord], mut from: usize, parts: &[Vec<String>]) -> Option<Vec<usize>> {
    let mut starts = Vec::with_capacity(parts.len());
    for part in parts {
        let start = (from..words.len()).find(|&at| run_matches_at(words, at, part))?;
        starts.push(start);
        from = start + part.len();
    }
    Some(starts)
}

/// Every match of the quote, ordered by where its first run starts.
/// Each match lists the indices of its matched origin words.
fn find_matches(words: &[OriginWord], parts: &[Vec<String>]) -> Vec<Vec<usize>> {
    let Some((first, rest)) = parts.split_first() else {
        return Vec::new();
    };
    let mut matches = Vec::new();
    for at in 0..words.len() {
        if !run_matches_at(words, at, first) {
            continue;
        }
        let Some(rest_starts) = match_rest(words, at + first.len(), rest) else {
            continue;
        };
        let mut indices: Vec<usize> = (at..at + first.len()).collect();
        for (start, part) in rest_starts.into_iter().zip(rest) {
            indices.extend(start..start + part.len());
        }
        matches.push(indices);
    }
    matches
}

/// Target position: (chapter, target verse first number, token index).
type Position = (u32, u32, usize);

/// Follow origin words through the target's alignment groups.
fn target_positions(target: &ParsedBook, words: &[&OriginWord]) -> BTreeSet<Position> {
    let mut positions = BTreeSet::new();
    for word in words {
        let Some(verse) = target.verse(word.chapter, word.verse) else {
            log::debug!("target has no verse {}:{}", word.chapter, word.verse);
            continue;
        };
        let verse_key = verse.first_number().unwrap_or(word.verse);
        for group in &verse.alignments {
            let aligned = group
                .sources
                .iter()
                .any(|s| s.occurrence == word.occurrence && s.normalized() == word.norm);
            if aligned {
                positions.extend(group.targets.iter().map(|&t| (word.chapter, verse_key, t)));
            }
        }
    }
    positions
}

/// Render consecutive target positions as text slices.
fn render_runs(target: &ParsedBook, positions: &BTreeSet<Position>, delimiter: &str) -> String {
    let mut runs: Vec<(u32, u32, usize, usize)> = Vec::new();
    for &(chapter, verse, index) in positions {
        match runs.last_mut() {
            Some(run) if run.0 == chapter && run.1 == verse && run.3 + 1 == index => run.3 = index,
            _ => runs.push((chapter, verse, index, index)),
        }
    }

    runs.iter()
        .filter_map(|&(chapter, verse, first, last)| {
            let verse = target.verse(chapter, verse)?;
            let &(start, _) = verse.spans.get(first)?;
            let &(_, end) = verse.spans.get(last)?;
            let (start, end) = balance_range(&verse.text, start, end);
            Some(collapse_whitespace(&verse.text[start..end]))
        })
        .collect::<Vec<_>>()
        .join(delimiter)
}

/// Align an origin-language quote to the gateway text of `target`.
///
/// Returns the gateway quote, with discontinuous runs joined by the
/// delimiter, or an empty string when the quote cannot be aligned. Never
/// fails; misses are logged at debug level.
pub fn align_quote(spec: &QuoteSpec, origin: &ParsedBook, target: &ParsedBook, options: &AlignOptions) -> String {
    if spec.occurrence == Occurrence::None || spec.quote.trim().is_empty() {
        return String::new();
    }

    let reference = match Reference::parse(&spec.reference) {
        Ok(r) => r,
        Err(e) => {
            log::debug!("{e}");
            return String::new();
        }
    };

    let parts = quote_parts(&spec.quote, &options.delimiter);
    let words = origin_words(origin, &reference);
    let matches = find_matches(&words, &parts);

    let selected: Vec<&OriginWord> = match spec.occurrence {
        Occurrence::Nth(n) => (n as usize)
            .checked_sub(1)
            .and_then(|i| matches.get(i))
            .map(|m| m.iter().map(|&i| &words[i]).collect())
            .unwrap_or_default(),
        Occurrence::All => matches.iter().flatten().map(|&i| &words[i]).collect(),
        Occurrence::None => Vec::new(),
    };
    if selected.is_empty() {
        log::debug!(
            "quote {:?} occurrence {} not found in {}",
            spec.quote,
            spec.occurrence.as_i64(),
            spec.reference
        );
        return String::new();
    }

    let positions = target_positions(target, &selected);
    if positions.is_empty() {
        log::debug!("quote {:?} at {} has no aligned target words", spec.quote, spec.reference);
        return String::new();
    }
    render_runs(target, &positions, &options.delimiter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scripture::parse_usfm;

    const UHB: &str = "\\id GEN\n\\c 1\n\\v 1 \\w בְּ⁠רֵאשִׁית|lemma=\"רֵאשִׁית\"\\w* \\w בָּרָא\\w* \\w אֱלֹהִים\\w* \\w אֵת\\w* \\w הַ⁠שָּׁמַיִם\\w* \\w וְ⁠אֵת\\w* \\w הָ⁠אָרֶץ\\w*׃\n";

    const ULT: &str = concat!(
        "\\id GEN\n\\c 1\n\\v 1 ",
        "\\zaln-s |x-occurrence=\"1\" x-occurrences=\"1\" x-content=\"בְּ⁠רֵאשִׁית\"\\*\\w In\\w* \\w the\\w* \\w beginning\\w*\\zaln-e\\*, ",
        "\\zaln-s |x-occurrence=\"1\" x-occurrences=\"1\" x-content=\"אֱלֹהִים\"\\*\\w God\\w*\\zaln-e\\* ",
        "\\zaln-s |x-occurrence=\"1\" x-occurrences=\"1\" x-content=\"בָּרָא\"\\*\\w created\\w*\\zaln-e\\* ",
        "\\zaln-s |x-occurrence=\"1\" x-occurrences=\"1\" x-content=\"אֵת\"\\*",
        "\\zaln-s |x-occurrence=\"1\" x-occurrences=\"1\" x-content=\"הַ⁠שָּׁמַיִם\"\\*\\w the\\w* \\w heavens\\w*\\zaln-e\\*\\zaln-e\\* ",
        "\\zaln-s |x-occurrence=\"1\" x-occurrences=\"1\" x-content=\"וְ⁠אֵת\"\\*\\w and\\w*\\zaln-e\\* ",
        "\\zaln-s |x-occurrence=\"1\" x-occurrences=\"1\" x-content=\"הָ⁠אָרֶץ\"\\*\\w the\\w* \\w earth\\w*\\zaln-e\\*.\n",
    );

    fn books() -> (ParsedBook, ParsedBook) {
        (parse_usfm(UHB), parse_usfm(ULT))
    }

    fn align(quote: &str, occurrence: Occurrence) -> String {
        let (origin, target) = books();
        align_quote(
            &QuoteSpec::new(quote, "1:1", occurrence),
            &origin,
            &target,
            &AlignOptions::default(),
        )
    }

    #[test]
    fn test_occurrence_parse() {
        assert_eq!(Occurrence::parse("1"), Occurrence::Nth(1));
        assert_eq!(Occurrence::parse("-1"), Occurrence::All);
        assert_eq!(Occurrence::parse("0"), Occurrence::None);
        assert_eq!(Occurrence::parse(""), Occurrence::None);
        assert_eq!(Occurrence::parse("x"), Occurrence::None);
    }

    #[test]
    fn test_occurrence_out_of_range_is_none() {
        assert_eq!(Occurrence::parse("4294967295"), Occurrence::Nth(u32::MAX));
        assert_eq!(Occurrence::parse("4294967297"), Occurrence::None);
        assert_eq!(Occurrence::parse("-2"), Occurrence::None);
    }

    #[test]
    fn test_single_word() {
        assert_eq!(align("בְּ⁠רֵאשִׁית", Occurrence::Nth(1)), "In the beginning");
    }

    #[test]
    fn test_multi_word_contiguous() {
        assert_eq!(align("בָּרָא אֱלֹהִים", Occurrence::Nth(1)), "God created");
    }

    #[test]
    fn test_discontinuous_quote_keeps_delimiter() {
        assert_eq!(
            align("בְּ⁠רֵאשִׁית & הָ⁠אָרֶץ", Occurrence::Nth(1)),
            "In the beginning … the earth"
        );
    }

    #[test]
    fn test_many_to_many_group() {
        assert_eq!(align("אֵת הַ⁠שָּׁמַיִם", Occurrence::Nth(1)), "the heavens");
    }

    #[test]
    fn test_missing_quote_is_empty() {
        assert_eq!(align("שָׁלוֹם", Occurrence::Nth(1)), "");
        assert_eq!(align("בָּרָא", Occurrence::Nth(2)), "");
        assert_eq!(align("בָּרָא", Occurrence::None), "");
    }

    #[test]
    fn test_invalid_reference_is_empty() {
        let (origin, target) = books();
        let spec = QuoteSpec::new("בָּרָא", ":", Occurrence::Nth(1));
        assert_eq!(align_quote(&spec, &origin, &target, &AlignOptions::default()), "");
    }

    #[test]
    fn test_quote_parts_split() {
        let parts = quote_parts("a b … c & d", DEFAULT_DELIMITER);
        assert_eq!(parts, vec![vec!["a", "b"], vec!["c"], vec!["d"]]);
    }
}
