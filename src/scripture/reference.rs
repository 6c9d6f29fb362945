//! Chapter/verse keys and scripture references.
//!
//! TSV resources and USFM books both address content by chapter and verse,
//! but neither is purely numeric: notes use `front:intro` and `1:intro`, and
//! USFM books carry front matter before the first chapter. [`RefKey`] gives
//! these a single total order so buckets iterate the way a reader expects.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::error::{Error, Result};

/// Highest verse number a range may expand to (Psalm 119 has 176).
pub const MAX_VERSE: u32 = 176;

/// Highest chapter number a cross-chapter range may walk through.
pub const MAX_CHAPTER: u32 = 150;

/// Ordered key for a chapter or verse bucket.
///
/// Orders as `Front < Intro < Num(1) < Num(2) < … < Other(..)`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RefKey {
    Front,
    Intro,
    Num(u32),
    Other(String),
}

impl RefKey {
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        match text {
            "front" => RefKey::Front,
            "intro" => RefKey::Intro,
            _ => match crate::util::parse_padded(text) {
                Some(n) => RefKey::Num(n),
                None => RefKey::Other(text.to_string()),
            },
        }
    }

    pub fn as_num(&self) -> Option<u32> {
        match self {
            RefKey::Num(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for RefKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefKey::Front => f.write_str("front"),
            RefKey::Intro => f.write_str("intro"),
            RefKey::Num(n) => write!(f, "{n}"),
            RefKey::Other(s) => f.write_str(s),
        }
    }
}

impl From<u32> for RefKey {
    fn from(n: u32) -> Self {
        RefKey::Num(n)
    }
}

impl Serialize for RefKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A parsed scripture reference such as `1:3`, `1:3-5`, `1:3,7` or
/// `1:20-2:3`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub chapter: RefKey,
    /// Verse part as written (`"3-5"`, `"intro"`).
    pub verse: String,
}

impl Reference {
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        let (chapter, verse) = match text.split_once(':') {
            Some((c, v)) => (c.trim(), v.trim()),
            None => (text, "0"),
        };
        if chapter.is_empty() {
            return Err(Error::InvalidReference(text.to_string()));
        }
        Ok(Self {
            chapter: RefKey::parse(chapter),
            verse: verse.to_string(),
        })
    }

    /// Bucket key for this reference: the first verse of the first span.
    pub fn first_verse(&self) -> RefKey {
        let first = self
            .verse
            .split(',')
            .next()
            .unwrap_or_default()
            .split('-')
            .next()
            .unwrap_or_default();
        RefKey::parse(first)
    }

    /// Enumerate every numeric `(chapter, verse)` this reference covers.
    ///
    /// Cross-chapter ranges (`1:20-2:3`) run to the end of the first chapter
    /// using `last_verse_of` to learn where that chapter ends. Range ends are
    /// clamped to the chapter's last verse and to [`MAX_VERSE`].
    pub fn verses(&self, last_verse_of: impl Fn(u32) -> Option<u32>) -> Vec<(u32, u32)> {
        let Some(mut chapter) = self.chapter.as_num() else {
            return Vec::new();
        };
        let mut verses = Vec::new();
        for span in self.verse.split(',') {
            let span = span.trim();
            let (start, end) = match span.split_once('-') {
                Some((s, e)) => (s.trim(), Some(e.trim())),
                None => (span, None),
            };
            let Some(start) = crate::util::parse_padded(start) else {
                continue;
            };
            match end {
                None => verses.push((chapter, start)),
                Some(end) => {
                    if let Some((end_chapter, end_verse)) = end.split_once(':') {
                        let (Some(end_chapter), Some(end_verse)) = (
                            crate::util::parse_padded(end_chapter),
                            crate::util::parse_padded(end_verse),
                        ) else {
                            continue;
                        };
                        let end_chapter = end_chapter.min(MAX_CHAPTER);
                        let last = last_verse_of(chapter).unwrap_or(start).min(MAX_VERSE);
                        verses.extend((start..=last).map(|v| (chapter, v)));
                        for c in chapter + 1..end_chapter {
                            let last = last_verse_of(c).unwrap_or(0).min(MAX_VERSE);
                            verses.extend((1..=last).map(|v| (c, v)));
                        }
                        let end_verse = match last_verse_of(end_chapter) {
                            Some(last) => end_verse.min(last),
                            None => end_verse,
                        };
                        verses.extend((1..=end_verse.min(MAX_VERSE)).map(|v| (end_chapter, v)));
                        chapter = end_chapter;
                    } else if let Some(end) = crate::util::parse_padded(end) {
                        let cap = last_verse_of(chapter).map_or(MAX_VERSE, |last| last.min(MAX_VERSE));
                        verses.extend((start..=end.min(cap).max(start)).map(|v| (chapter, v)));
                    }
                }
            }
        }
        verses
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.chapter, self.verse)
    }
}

/// Numeric spans of a verse label, as inclusive `(start, end)` pairs with
/// `end` clamped to [`MAX_VERSE`].
pub(crate) fn label_spans(label: &str) -> impl Iterator<Item = (u32, u32)> + '_ {
    label.split(',').filter_map(|span| match span.split_once('-') {
        Some((start, end)) => {
            let start = crate::util::parse_padded(start)?;
            let end = crate::util::parse_padded(end)?;
            Some((start, end.min(MAX_VERSE).max(start)))
        }
        None => crate::util::parse_padded(span).map(|n| (n, n)),
    })
}

/// Expand a verse label such as `"3-5"` or `"3,5"` to the verses it covers.
pub fn expand_label(label: &str) -> Vec<u32> {
    label_spans(label).flat_map(|(start, end)| start..=end).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refkey_order() {
        let mut keys = vec![
            RefKey::parse("10"),
            RefKey::parse("intro"),
            RefKey::parse("2"),
            RefKey::parse("front"),
        ];
        keys.sort();
        assert_eq!(
            keys,
            vec![RefKey::Front, RefKey::Intro, RefKey::Num(2), RefKey::Num(10)]
        );
    }

    #[test]
    fn test_first_verse() {
        assert_eq!(Reference::parse("1:3-5").unwrap().first_verse(), RefKey::Num(3));
        assert_eq!(Reference::parse("1:2,6").unwrap().first_verse(), RefKey::Num(2));
        assert_eq!(Reference::parse("front:intro").unwrap().first_verse(), RefKey::Intro);
        assert_eq!(Reference::parse("4").unwrap().first_verse(), RefKey::Num(0));
    }

    #[test]
    fn test_verses_range_and_list() {
        let r = Reference::parse("1:3-5,8").unwrap();
        assert_eq!(r.verses(|_| None), vec![(1, 3), (1, 4), (1, 5), (1, 8)]);
    }

    #[test]
    fn test_verses_cross_chapter() {
        let r = Reference::parse("1:30-2:2").unwrap();
        let verses = r.verses(|c| if c == 1 { Some(31) } else { None });
        assert_eq!(verses, vec![(1, 30), (1, 31), (2, 1), (2, 2)]);
    }

    #[test]
    fn test_empty_reference_is_invalid() {
        assert!(Reference::parse(":3").is_err());
    }

    #[test]
    fn test_expand_label() {
        assert_eq!(expand_label("3-5"), vec![3, 4, 5]);
        assert_eq!(expand_label("7"), vec![7]);
        assert_eq!(expand_label("1,3"), vec![1, 3]);
    }

    #[test]
    fn test_runaway_ranges_are_clamped() {
        assert_eq!(expand_label("1-200000").len(), MAX_VERSE as usize);
        assert_eq!(expand_label("300-2"), vec![300]);

        let r = Reference::parse("1:1-30000000").unwrap();
        assert_eq!(r.verses(|_| None).len(), MAX_VERSE as usize);
        assert_eq!(r.verses(|_| Some(31)).len(), 31);

        let r = Reference::parse("1:1-40000000:3").unwrap();
        assert!(r.verses(|_| Some(10)).len() <= (MAX_CHAPTER * 10) as usize);
    }
}
