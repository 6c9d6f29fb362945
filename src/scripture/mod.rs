//! Scripture texts: references, USFM parsing and legacy tS projects.
//!
//! Every scripture source ends up as a [`ParsedBook`]: an ordered map of
//! chapters to verses, each verse carrying its display text, its word
//! tokens with occurrence numbers, and (for aligned gateway texts) the
//! word-alignment groups that link it back to the origin language.

mod legacy;
mod reference;
mod token;
mod usfm;

use std::collections::BTreeMap;

use serde::Serialize;

use crate::package::FileSet;

pub use legacy::ts_to_usfm;
pub use reference::{MAX_CHAPTER, MAX_VERSE, RefKey, Reference, expand_label};
pub use token::{VerseToken, is_word_char, normalize_token, number_occurrences, tokenize, tokenize_spans};
pub use usfm::parse_usfm;

/// One alignment group: origin words and the gateway tokens that translate them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alignment {
    pub sources: Vec<VerseToken>,
    /// Indices into the verse's `tokens`.
    pub targets: Vec<usize>,
}

/// A verse (or bridged verse range) of a parsed book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verse {
    /// Verse number as written: `"3"` or `"3-4"`.
    pub label: String,
    /// Display text with markup removed.
    pub text: String,
    pub tokens: Vec<VerseToken>,
    /// Byte range of each token in `text`.
    #[serde(skip)]
    pub spans: Vec<(usize, usize)>,
    pub alignments: Vec<Alignment>,
}

impl Verse {
    /// Verse numbers covered by this verse's label.
    pub fn numbers(&self) -> Vec<u32> {
        expand_label(&self.label)
    }

    pub fn is_bridge(&self) -> bool {
        let mut spans = reference::label_spans(&self.label);
        match (spans.next(), spans.next()) {
            (Some((start, end)), None) => start != end,
            (Some(_), Some(_)) => true,
            _ => false,
        }
    }

    /// First verse number of the label.
    pub fn first_number(&self) -> Option<u32> {
        reference::label_spans(&self.label).map(|(start, _)| start).next()
    }

    /// Highest verse number of the label.
    pub fn last_number(&self) -> Option<u32> {
        reference::label_spans(&self.label).map(|(_, end)| end).max()
    }

    /// Whether the label covers verse `n`.
    pub fn covers(&self, n: u32) -> bool {
        reference::label_spans(&self.label).any(|(start, end)| (start..=end).contains(&n))
    }
}

/// A book parsed into chapters and verses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedBook {
    /// Lowercase book code from `\id`.
    pub id: Option<String>,
    /// Header markers before the first chapter, in order.
    pub headers: Vec<(String, String)>,
    pub chapters: BTreeMap<RefKey, BTreeMap<RefKey, Verse>>,
    /// SHA-1 of the source text; identifies the book in memo keys.
    pub fingerprint: String,
}

impl ParsedBook {
    pub fn empty() -> Self {
        Self {
            id: None,
            headers: Vec::new(),
            chapters: BTreeMap::new(),
            fingerprint: String::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.chapters.is_empty()
    }

    /// First header with the given tag.
    pub fn header(&self, tag: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(t, _)| t == tag)
            .map(|(_, content)| content.as_str())
    }

    /// Book title from `\h`, `\toc1` or `\mt`.
    pub fn title(&self) -> Option<&str> {
        ["h", "toc1", "mt", "mt1"]
            .iter()
            .find_map(|tag| self.header(tag))
            .filter(|t| !t.is_empty())
    }

    /// Numbered chapters in order.
    pub fn numbered_chapters(&self) -> impl Iterator<Item = (u32, &BTreeMap<RefKey, Verse>)> {
        self.chapters
            .iter()
            .filter_map(|(key, verses)| key.as_num().map(|n| (n, verses)))
    }

    /// Look up a verse, resolving bridges: verse 4 is found inside `3-5`.
    pub fn verse(&self, chapter: u32, verse: u32) -> Option<&Verse> {
        let verses = self.chapters.get(&RefKey::Num(chapter))?;
        if let Some(found) = verses.get(&RefKey::Num(verse)) {
            return Some(found);
        }
        // A bridge is stored under its first verse, the nearest numbered key below
        verses
            .range(..RefKey::Num(verse))
            .rev()
            .find(|(key, _)| key.as_num().is_some())
            .map(|(_, v)| v)
            .filter(|v| v.covers(verse))
    }

    /// Highest verse number present in a chapter.
    pub fn last_verse(&self, chapter: u32) -> Option<u32> {
        self.chapters
            .get(&RefKey::Num(chapter))?
            .values()
            .filter_map(Verse::last_number)
            .max()
    }
}

/// How the raw input is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Usfm,
    /// translationStudio per-chunk text files.
    TsLegacy,
}

/// Raw scripture input, already fetched.
#[derive(Debug, Clone, Copy)]
pub enum RawBook<'a> {
    Text(&'a str),
    /// A resource package; the book is looked up by id.
    Files {
        files: &'a FileSet,
        book_id: &'a str,
        title: &'a str,
    },
}

/// Find the USFM file for a book inside a resource package (`01-GEN.usfm`,
/// `57-TIT.usfm`, `tit.usfm`).
fn find_usfm<'a>(files: &'a FileSet, book_id: &str) -> Option<&'a str> {
    let needle = book_id.to_lowercase();
    files
        .paths()
        .find(|path| {
            let name = path.rsplit('/').next().unwrap_or(path).to_lowercase();
            let Some(stem) = name.strip_suffix(".usfm") else {
                return false;
            };
            stem == needle || stem.rsplit('-').next() == Some(needle.as_str())
        })
        .and_then(|path| files.get(path))
}

/// Turn raw scripture input into a [`ParsedBook`].
///
/// Never fails: missing or unusable input yields [`ParsedBook::empty`] and
/// a warning.
pub fn normalize(raw: RawBook<'_>, format: SourceFormat) -> ParsedBook {
    let usfm = match (raw, format) {
        (RawBook::Text(text), SourceFormat::Usfm) => Some(text.to_string()),
        (RawBook::Files { files, book_id, .. }, SourceFormat::Usfm) => {
            find_usfm(files, book_id).map(str::to_string)
        }
        (RawBook::Files { files, book_id, title }, SourceFormat::TsLegacy) => {
            Some(ts_to_usfm(files, book_id, title))
        }
        (RawBook::Text(_), SourceFormat::TsLegacy) => {
            log::warn!("tS projects must be supplied as a file set");
            None
        }
    };

    let Some(usfm) = usfm.filter(|u| !u.trim().is_empty()) else {
        log::warn!("no scripture text to normalize");
        return ParsedBook::empty();
    };

    let book = parse_usfm(&usfm);
    if book.numbered_chapters().next().is_none() {
        log::warn!("scripture text contains no chapters");
    }
    book
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT: &str = "\\id TIT\n\\h Titus\n\\c 1\n\\v 1 Paul\n\\v 2-4 in hope\n\\v 5 For this\n\\c 2\n\\v 1 But you\n";

    #[test]
    fn test_bridged_lookup() {
        let book = normalize(RawBook::Text(TEXT), SourceFormat::Usfm);
        assert_eq!(book.verse(1, 3).unwrap().label, "2-4");
        assert_eq!(book.verse(1, 5).unwrap().text, "For this");
        assert!(book.verse(1, 6).is_none());
        assert!(book.verse(1, 3).unwrap().is_bridge());
        assert!(!book.verse(1, 5).unwrap().is_bridge());
    }

    #[test]
    fn test_runaway_bridge_is_clamped() {
        let book = normalize(RawBook::Text("\\c 1\n\\v 1-200000 Paul\n"), SourceFormat::Usfm);
        let verse = book.verse(1, 1).unwrap();
        assert_eq!(verse.numbers().len(), MAX_VERSE as usize);
        assert!(book.verse(1, MAX_VERSE).is_some());
        assert!(book.verse(1, 5000).is_none());
        assert_eq!(book.last_verse(1), Some(MAX_VERSE));
    }

    #[test]
    fn test_last_verse() {
        let book = normalize(RawBook::Text(TEXT), SourceFormat::Usfm);
        assert_eq!(book.last_verse(1), Some(5));
        assert_eq!(book.last_verse(3), None);
    }

    #[test]
    fn test_empty_input_gives_empty_book() {
        assert!(normalize(RawBook::Text("  "), SourceFormat::Usfm).is_empty());
        assert!(normalize(RawBook::Text(TEXT), SourceFormat::TsLegacy).is_empty());
    }

    #[test]
    fn test_usfm_found_in_package() {
        let files: FileSet = [("en_ult/57-TIT.usfm", TEXT), ("en_ult/manifest.yaml", "")]
            .into_iter()
            .collect();
        let raw = RawBook::Files {
            files: &files,
            book_id: "tit",
            title: "Titus",
        };
        let book = normalize(raw, SourceFormat::Usfm);
        assert_eq!(book.title(), Some("Titus"));
        assert_eq!(book.fingerprint.len(), 40);
    }
}
