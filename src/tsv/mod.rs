//! Translation notes, questions and word-link TSV files.
//!
//! A TSV resource is parsed into [`TsvRow`]s, bucketed by chapter and first
//! verse into a [`Pivot`], and annotated with one `GLQuote{i}` column per
//! gateway Bible by the [`Annotator`]. Open Bible Stories resources use the
//! same shape with story and frame in place of chapter and verse.

mod annotate;
mod memo;

use std::collections::BTreeMap;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::align::Occurrence;
use crate::error::{Error, Result};
use crate::html::STORY_COUNT;
use crate::scripture::{RefKey, Reference};

pub use annotate::{Annotator, gl_quote_column, pivot_tsv};
pub use memo::QuoteMemo;

/// chapter → first verse → rows in input order.
pub type Pivot = BTreeMap<RefKey, BTreeMap<RefKey, Vec<TsvRow>>>;

/// One TSV record: fields in column order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TsvRow {
    fields: Vec<(String, String)>,
}

impl TsvRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v.as_str())
    }

    /// Field value, or `""` when the column is absent.
    pub fn field(&self, column: &str) -> &str {
        self.get(column).unwrap_or_default()
    }

    /// Set a field, replacing an existing value or appending a new column.
    pub fn set(&mut self, column: &str, value: impl Into<String>) {
        let value = value.into();
        match self.fields.iter_mut().find(|(c, _)| c == column) {
            Some((_, v)) => *v = value,
            None => self.fields.push((column.to_string(), value)),
        }
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(c, v)| (c.as_str(), v.as_str()))
    }

    pub fn id(&self) -> &str {
        self.field("ID")
    }

    pub fn reference(&self) -> &str {
        self.field("Reference")
    }

    pub fn quote(&self) -> &str {
        self.field("Quote")
    }

    pub fn occurrence(&self) -> Occurrence {
        Occurrence::parse(self.field("Occurrence"))
    }

    pub fn note(&self) -> &str {
        self.field("Note")
    }

    pub fn support_reference(&self) -> &str {
        self.field("SupportReference")
    }

    /// Question of a TQ or SQ row.
    pub fn question(&self) -> &str {
        self.field("Question")
    }

    pub fn response(&self) -> &str {
        self.field("Response")
    }

    /// Word link of a TWL row (`rc://*/tw/dict/bible/kt/god`).
    pub fn tw_link(&self) -> &str {
        self.field("TWLink")
    }

    pub fn gl_quote(&self, target_index: usize) -> &str {
        self.field(&gl_quote_column(target_index))
    }

    /// Parsed `Reference`, if valid.
    pub fn parsed_reference(&self) -> Option<Reference> {
        Reference::parse(self.reference()).ok()
    }
}

impl<C: Into<String>, V: Into<String>> FromIterator<(C, V)> for TsvRow {
    fn from_iter<I: IntoIterator<Item = (C, V)>>(iter: I) -> Self {
        let mut row = TsvRow::new();
        for (column, value) in iter {
            let column: String = column.into();
            row.set(&column, value);
        }
        row
    }
}

impl Serialize for TsvRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (column, value) in &self.fields {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

/// Bring a legacy (`Book Chapter Verse …`) row into the current column set.
fn upgrade_legacy(row: &mut TsvRow) {
    let chapter = row.field("Chapter").to_string();
    let verse = row.field("Verse").to_string();
    if !chapter.is_empty() && !verse.is_empty() {
        row.set("Reference", format!("{chapter}:{verse}"));
        let note = row.field("OccurrenceNote").to_string();
        row.set("Note", note);
        let quote = row.field("OrigQuote").to_string();
        row.set("Quote", quote);
        let support = row.support_reference().to_string();
        if !support.is_empty() && !support.contains('/') {
            row.set("SupportReference", format!("rc://*/ta/man/translate/{support}"));
        }
    }
    if row.quote().is_empty()
        && let Some(words) = row.get("OrigWords").filter(|w| !w.is_empty())
    {
        let words = words.to_string();
        row.set("Quote", words);
    }
}

/// Parse TSV text into rows.
///
/// Rows without an `ID` or without a reference are dropped. An empty file
/// or a header without an `ID` column fails the whole resource.
pub fn parse_tsv(text: &str) -> Result<Vec<TsvRow>> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut lines = text.lines().map(|l| l.trim_end_matches('\r'));

    let header = lines
        .by_ref()
        .find(|l| !l.trim().is_empty())
        .ok_or_else(|| Error::MalformedTsv("empty file".to_string()))?;
    let columns: Vec<&str> = header.split('\t').map(str::trim).collect();
    if !columns.contains(&"ID") {
        return Err(Error::MalformedTsv(format!("no ID column in header {header:?}")));
    }

    let mut rows = Vec::new();
    let mut dropped = 0;
    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        let values: Vec<&str> = line.split('\t').collect();
        if values.len() > columns.len() {
            log::debug!("row has {} extra fields: {line:?}", values.len() - columns.len());
        }
        let mut row: TsvRow = columns
            .iter()
            .enumerate()
            .map(|(i, column)| (*column, values.get(i).copied().unwrap_or_default()))
            .collect();
        upgrade_legacy(&mut row);

        if row.id().trim().is_empty() || row.reference().trim().is_empty() {
            dropped += 1;
            continue;
        }
        rows.push(row);
    }

    if dropped > 0 {
        log::debug!("dropped {dropped} TSV rows without ID or reference");
    }
    Ok(rows)
}

/// Bucket rows by chapter and by the first verse of their reference.
///
/// A row whose reference cannot be parsed is dropped.
pub fn bucket_rows(rows: Vec<TsvRow>) -> Pivot {
    let mut pivot = Pivot::new();
    for row in rows {
        let reference = match Reference::parse(row.reference()) {
            Ok(r) => r,
            Err(e) => {
                log::debug!("dropping row {}: {e}", row.id());
                continue;
            }
        };
        pivot
            .entry(reference.chapter.clone())
            .or_default()
            .entry(reference.first_verse())
            .or_default()
            .push(row);
    }
    pivot
}

/// Parse and bucket an Open Bible Stories TSV (`OBS TN`, `OBS SN`, `OBS TQ`,
/// `OBS SQ`) by story and first frame.
///
/// References read `story:frame` (`1:3`, `1:3-4`) plus `front:intro` and
/// `story:intro`. Rows pointing at a story outside the fifty are dropped.
/// No gateway quotes are added; OBS has no aligned text.
pub fn pivot_obs_tsv(text: &str) -> Result<Pivot> {
    let mut pivot = bucket_rows(parse_tsv(text)?);
    pivot.retain(|story, _| {
        let known = match story {
            RefKey::Front => true,
            RefKey::Num(n) => (1..=STORY_COUNT).contains(n),
            _ => false,
        };
        if !known {
            log::debug!("dropping rows of unknown story {story}");
        }
        known
    });
    Ok(pivot)
}

/// Iterate every row of a pivot in chapter/verse order.
pub fn pivot_rows(pivot: &Pivot) -> impl Iterator<Item = &TsvRow> {
    pivot.values().flat_map(|verses| verses.values().flatten())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TN: &str = "Reference\tID\tTags\tSupportReference\tQuote\tOccurrence\tNote\r\n\
        front:intro\tabcd\t\t\t\t0\t# Introduction\r\n\
        1:1\tef01\t\trc://*/ta/man/translate/figs-abstractnouns\tἐν ἀρχῇ\t1\tThe beginning\r\n\
        1:3-5\tef02\t\t\tκαὶ\t1\tand\r\n\
        1:2,6\tef03\t\t\t\t0\tlist\r\n\
        1:1\t\t\t\tλόγος\t1\tno id\r\n\
        \r\n\
        1:1\tef04\n";

    #[test]
    fn test_parse_drops_rows_without_id() {
        let rows = parse_tsv(TN).unwrap();
        assert_eq!(rows.len(), 5);
        assert!(rows.iter().all(|r| !r.id().is_empty()));
        assert_eq!(rows[4].note(), "");
    }

    #[test]
    fn test_missing_id_column_is_malformed() {
        assert!(matches!(parse_tsv("Reference\tNote\n1:1\tx"), Err(Error::MalformedTsv(_))));
        assert!(matches!(parse_tsv("\n\n"), Err(Error::MalformedTsv(_))));
    }

    #[test]
    fn test_bucket_by_first_verse() {
        let pivot = bucket_rows(parse_tsv(TN).unwrap());
        let ch1 = &pivot[&RefKey::Num(1)];
        let ids: Vec<_> = ch1[&RefKey::Num(1)].iter().map(TsvRow::id).collect();
        assert_eq!(ids, vec!["ef01", "ef04"]);
        assert_eq!(ch1[&RefKey::Num(3)][0].id(), "ef02");
        assert_eq!(ch1[&RefKey::Num(2)][0].id(), "ef03");
        assert!(!ch1.contains_key(&RefKey::Num(4)));
        assert_eq!(pivot[&RefKey::Front][&RefKey::Intro][0].id(), "abcd");
    }

    #[test]
    fn test_legacy_columns() {
        let legacy = "Book\tChapter\tVerse\tID\tSupportReference\tOrigQuote\tOccurrence\tGLQuote\tOccurrenceNote\n\
            TIT\t1\t1\tab12\tfigs-metaphor\tΠαῦλος\t1\tPaul\tPaul is the author";
        let rows = parse_tsv(legacy).unwrap();
        assert_eq!(rows[0].reference(), "1:1");
        assert_eq!(rows[0].quote(), "Παῦλος");
        assert_eq!(rows[0].note(), "Paul is the author");
        assert_eq!(rows[0].support_reference(), "rc://*/ta/man/translate/figs-metaphor");
    }

    #[test]
    fn test_orig_words_become_quote() {
        let twl = "Reference\tID\tTags\tOrigWords\tOccurrence\tTWLink\n1:1\tx1\tkeyterm\tθεοῦ\t1\trc://*/tw/dict/bible/kt/god";
        let rows = parse_tsv(twl).unwrap();
        assert_eq!(rows[0].quote(), "θεοῦ");
        assert_eq!(rows[0].tw_link(), "rc://*/tw/dict/bible/kt/god");
    }

    #[test]
    fn test_obs_pivot_by_story_and_frame() {
        let tsv = "Reference\tID\tTags\tQuote\tOccurrence\tQuestion\tResponse\n\
            front:intro\tq000\t\t\t\tWhat is OBS?\tStories.\n\
            01:02\tq001\t\t\t\tWho made it?\tGod.\n\
            1:intro\tq002\t\t\t\tIntro\t\n\
            1:3-4\tq003\t\t\t\tWhat did God say?\tLet there be light.\n\
            51:1\tq004\t\t\t\tLost\t\n\
            title:1\tq005\t\t\t\tLost\t\n";
        let pivot = pivot_obs_tsv(tsv).unwrap();
        let stories: Vec<&RefKey> = pivot.keys().collect();
        assert_eq!(stories, [&RefKey::Front, &RefKey::Num(1)]);
        let frames: Vec<&RefKey> = pivot[&RefKey::Num(1)].keys().collect();
        assert_eq!(frames, [&RefKey::Intro, &RefKey::Num(2), &RefKey::Num(3)]);
        let row = &pivot[&RefKey::Num(1)][&RefKey::Num(3)][0];
        assert_eq!(row.question(), "What did God say?");
        assert_eq!(row.response(), "Let there be light.");
        assert_eq!(row.get("GLQuote0"), None);
    }

    #[test]
    fn test_row_serializes_in_column_order() {
        let mut row: TsvRow = [("Reference", "1:1"), ("ID", "ab12")].into_iter().collect();
        row.set("GLQuote0", "Paul");
        assert_eq!(
            serde_json::to_string(&row).unwrap(),
            r#"{"Reference":"1:1","ID":"ab12","GLQuote0":"Paul"}"#
        );
    }
}
