//! USFM parsing into a [`ParsedBook`].
//!
//! The parser is deliberately forgiving: it understands the markers the
//! preview needs (books, chapters, verses, words and word alignments) and
//! treats everything else as whitespace, so a malformed file still yields
//! whatever verses could be recognized.
//!
//! ## Alignment milestones
//!
//! Aligned gateway texts wrap target words in `\zaln-s … \*` / `\zaln-e\*`
//! pairs naming the origin word they translate:
//!
//! ```text
//! \zaln-s |x-occurrence="1" x-occurrences="1" x-content="בְּרֵאשִׁית"\*\w In\w* \w the\w* \w beginning\w*\zaln-e\*
//! ```
//!
//! Nested starts before any target word form one many-to-many group.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use memchr::memchr;
use regex_lite::Regex;

use super::reference::RefKey;
use super::token::{VerseToken, number_occurrences, tokenize_spans};
use super::{Alignment, ParsedBook, Verse};

/// Matches `name="value"` pairs in word and milestone attributes
static ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"([A-Za-z0-9_-]+)\s*=\s*"([^"]*)""#).unwrap());

/// Markers recorded as book headers when they appear before the first chapter.
const HEADER_MARKERS: &[&str] = &[
    "id", "usfm", "ide", "h", "h1", "h2", "h3", "toc1", "toc2", "toc3", "toca1", "toca2", "toca3",
    "mt", "mt1", "mt2", "mt3", "mt4", "sts", "rem",
];

/// Markers whose rest-of-line content is not verse text.
const LINE_SKIP_MARKERS: &[&str] = &[
    "s", "s1", "s2", "s3", "s4", "s5", "ms", "ms1", "ms2", "ms3", "mr", "r", "sr", "cl", "cd", "rem",
    "sts", "restore",
];

/// Character-style markers whose content is not verse text, up to their closing marker.
const SPAN_SKIP_MARKERS: &[&str] = &["f", "fe", "ef", "x", "ex", "ca", "cp", "va", "vp", "fig"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lex<'a> {
    Text(&'a str),
    Marker { name: &'a str, closed: bool },
}

/// Split USFM into text runs and markers.
///
/// A single space after a marker name is its separator and is consumed.
/// `\*` (milestone end) lexes as a closed marker with an empty name.
fn lex(src: &str) -> Vec<Lex<'_>> {
    let bytes = src.as_bytes();
    let mut out = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let Some(offset) = memchr(b'\\', &bytes[pos..]) else {
            out.push(Lex::Text(&src[pos..]));
            break;
        };
        if offset > 0 {
            out.push(Lex::Text(&src[pos..pos + offset]));
        }
        let start = pos + offset + 1;
        let mut end = start;
        while end < bytes.len()
            && (bytes[end].is_ascii_alphanumeric() || bytes[end] == b'-' || bytes[end] == b'+')
        {
            end += 1;
        }
        let name = src[start..end].trim_start_matches('+');
        let mut closed = false;
        if end < bytes.len() && bytes[end] == b'*' {
            closed = true;
            end += 1;
        } else if end < bytes.len() && bytes[end] == b' ' && !name.is_empty() {
            end += 1;
        }
        out.push(Lex::Marker { name, closed });
        pos = end;
    }

    out
}

/// Parse `name="value"` attributes.
fn parse_attrs(text: &str) -> BTreeMap<String, String> {
    ATTR_RE
        .captures_iter(text)
        .map(|caps| (caps[1].to_string(), caps[2].to_string()))
        .collect()
}

#[derive(Default)]
struct GroupBuilder {
    sources: Vec<VerseToken>,
    targets: Vec<usize>,
}

#[derive(Default)]
struct VerseBuilder {
    label: String,
    text: String,
    words: Vec<(usize, usize)>,
    /// `x-occurrence` / `x-occurrences` written on each `\w` word.
    stated: Vec<(Option<u32>, Option<u32>)>,
    marked: bool,
    groups: Vec<GroupBuilder>,
    stack: Vec<VerseToken>,
    current: Option<usize>,
}

impl VerseBuilder {
    fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            ..Default::default()
        }
    }

    fn push_text(&mut self, text: &str) {
        self.text.push_str(text);
    }

    fn push_word(&mut self, surface: &str, stated: (Option<u32>, Option<u32>)) {
        let start = self.text.len();
        self.text.push_str(surface);
        let index = self.words.len();
        self.words.push((start, self.text.len()));
        self.stated.push(stated);
        self.marked = true;

        if self.stack.is_empty() {
            return;
        }
        let group = match self.current {
            Some(g) => g,
            None => {
                self.groups.push(GroupBuilder {
                    sources: self.stack.clone(),
                    targets: Vec::new(),
                });
                self.groups.len() - 1
            }
        };
        self.groups[group].targets.push(index);
        self.current = Some(group);
    }

    fn open_alignment(&mut self, source: VerseToken) {
        match self.current {
            Some(g) if self.groups[g].targets.is_empty() => {
                self.groups[g].sources.push(source.clone());
            }
            _ => {
                let mut sources = self.stack.clone();
                sources.push(source.clone());
                self.groups.push(GroupBuilder {
                    sources,
                    targets: Vec::new(),
                });
                self.current = Some(self.groups.len() - 1);
            }
        }
        self.stack.push(source);
    }

    fn close_alignment(&mut self) {
        self.stack.pop();
        if self.stack.is_empty() {
            self.current = None;
        }
    }

    fn is_blank(&self) -> bool {
        self.words.is_empty() && self.text.trim().is_empty()
    }

    fn finish(self) -> Verse {
        let lead = self.text.len() - self.text.trim_start().len();
        let text = self.text.trim().to_string();

        let spans: Vec<(usize, usize)> = if self.marked {
            self.words.iter().map(|&(s, e)| (s - lead, e - lead)).collect()
        } else {
            tokenize_spans(&text)
        };
        let words: Vec<&str> = spans.iter().map(|&(s, e)| &text[s..e]).collect();
        let mut tokens = number_occurrences(&words);
        if self.marked {
            for (token, &(occurrence, occurrences)) in tokens.iter_mut().zip(&self.stated) {
                if let Some(n) = occurrence.filter(|&n| n >= 1) {
                    token.occurrence = n;
                }
                if let Some(n) = occurrences.filter(|&n| n >= token.occurrence) {
                    token.occurrences = n;
                }
            }
        }

        let alignments = self
            .groups
            .into_iter()
            .filter(|g| !g.targets.is_empty())
            .map(|g| Alignment {
                sources: g.sources,
                targets: g.targets,
            })
            .collect();

        Verse {
            label: self.label,
            text,
            tokens,
            spans,
            alignments,
        }
    }
}

struct Parser<'a> {
    tokens: Vec<Lex<'a>>,
    pos: usize,
    book: ParsedBook,
    chapter: Option<u32>,
    verse_key: RefKey,
    verse: VerseBuilder,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            tokens: lex(src),
            pos: 0,
            book: ParsedBook::empty(),
            chapter: None,
            verse_key: RefKey::Front,
            verse: VerseBuilder::new("front"),
        }
    }

    fn next(&mut self) -> Option<Lex<'a>> {
        let tok = self.tokens.get(self.pos).copied();
        self.pos += 1;
        tok
    }

    /// Take the text run directly after a marker, if any.
    fn take_text(&mut self) -> &'a str {
        match self.tokens.get(self.pos) {
            Some(Lex::Text(t)) => {
                self.pos += 1;
                t
            }
            _ => "",
        }
    }

    /// Collect all text up to the closing form of `name` (or `\*` when
    /// `name` is empty), consuming the closing marker.
    fn take_until_closed(&mut self, name: &str) -> String {
        let mut content = String::new();
        while let Some(tok) = self.next() {
            match tok {
                Lex::Text(t) => content.push_str(t),
                Lex::Marker { name: n, closed: true } if n == name => break,
                Lex::Marker { .. } => {}
            }
        }
        content
    }

    /// Skip text up to the closing form of `name`, ignoring nested markers.
    fn skip_until_closed(&mut self, name: &str) {
        while let Some(tok) = self.next() {
            if let Lex::Marker { name: n, closed: true } = tok
                && n == name
            {
                break;
            }
        }
    }

    fn finish_verse(&mut self, next_key: RefKey, next_label: &str) {
        let verse = std::mem::replace(&mut self.verse, VerseBuilder::new(next_label));
        let key = std::mem::replace(&mut self.verse_key, next_key);
        if verse.is_blank() {
            return;
        }
        let chapter = match self.chapter {
            Some(c) => RefKey::Num(c),
            None => RefKey::Front,
        };
        let verses = self.book.chapters.entry(chapter).or_default();
        if verses.contains_key(&key) {
            log::debug!("duplicate verse {key} replaced");
        }
        verses.insert(key, verse.finish());
    }

    fn parse(mut self) -> ParsedBook {
        while let Some(tok) = self.next() {
            match tok {
                Lex::Text(t) => self.verse.push_text(t),
                Lex::Marker { closed: true, .. } => {}
                Lex::Marker { name, closed: false } => self.marker(name),
            }
        }
        self.finish_verse(RefKey::Front, "front");
        self.book
    }

    fn marker(&mut self, name: &str) {
        match name {
            "c" => {
                let text = self.take_text();
                let (number, rest) = split_first_word(text);
                match crate::util::parse_padded(number) {
                    Some(n) => {
                        self.finish_verse(RefKey::Front, "front");
                        self.chapter = Some(n);
                    }
                    None => log::warn!("ignoring chapter marker with number {number:?}"),
                }
                self.verse.push_text(rest);
            }
            "v" => {
                let text = self.take_text();
                let (label, rest) = split_first_word(text);
                let key = label
                    .split([',', '-'])
                    .next()
                    .and_then(crate::util::parse_padded)
                    .map(RefKey::Num);
                match key {
                    Some(key) => {
                        self.finish_verse(key, label);
                    }
                    None => log::warn!("ignoring verse marker with label {label:?}"),
                }
                self.verse.push_text(rest);
            }
            "w" => {
                let content = self.take_until_closed("w");
                let (surface, attrs) = content.split_once('|').unwrap_or((content.as_str(), ""));
                let surface = surface.trim();
                if !surface.is_empty() {
                    let attrs = parse_attrs(attrs);
                    let stated = (
                        attr_number(&attrs, "x-occurrence"),
                        attr_number(&attrs, "x-occurrences"),
                    );
                    self.verse.push_word(surface, stated);
                }
            }
            "zaln-s" => {
                let attrs = parse_attrs(&self.take_until_closed(""));
                let content = attrs.get("x-content").cloned().unwrap_or_default();
                let occurrence = attr_number(&attrs, "x-occurrence").unwrap_or(1);
                let occurrences = attr_number(&attrs, "x-occurrences").unwrap_or(occurrence);
                self.verse
                    .open_alignment(VerseToken::new(content, occurrence, occurrences));
            }
            "zaln-e" => self.verse.close_alignment(),
            _ if self.chapter.is_none() && HEADER_MARKERS.contains(&name) => {
                let text = self.take_text();
                let (line, rest) = split_line(text);
                let content = line.trim().to_string();
                if name == "id" {
                    let (code, _) = split_first_word(&content);
                    self.book.id = Some(code.to_lowercase());
                }
                self.book.headers.push((name.to_string(), content));
                self.verse.push_text(rest);
            }
            _ if LINE_SKIP_MARKERS.contains(&name) => {
                let text = self.take_text();
                let (_, rest) = split_line(text);
                self.verse.push_text(rest);
            }
            _ if SPAN_SKIP_MARKERS.contains(&name) => self.skip_until_closed(name),
            _ => self.verse.push_text(" "),
        }
    }
}

fn attr_number(attrs: &BTreeMap<String, String>, key: &str) -> Option<u32> {
    attrs.get(key).and_then(|v| v.trim().parse().ok())
}

/// Split off the first whitespace-delimited word, returning (word, rest).
fn split_first_word(text: &str) -> (&str, &str) {
    let text = text.trim_start();
    match text.find(char::is_whitespace) {
        Some(i) => (&text[..i], &text[i..]),
        None => (text, ""),
    }
}

/// Split at the first newline, returning (line, rest including the newline).
fn split_line(text: &str) -> (&str, &str) {
    match text.find('\n') {
        Some(i) => (&text[..i], &text[i..]),
        None => (text, ""),
    }
}

/// Parse a USFM document.
///
/// Never fails: unrecognized markers are treated as whitespace and a text
/// without any chapter or verse yields a book with at most front matter.
pub fn parse_usfm(src: &str) -> ParsedBook {
    let mut book = Parser::new(src).parse();
    book.fingerprint = sha1_smol::Sha1::from(src).hexdigest();
    book
}
