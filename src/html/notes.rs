//! Translation notes book rendering.
//!
//! A notes book interleaves, verse by verse, the gateway scripture of every
//! target Bible with the notes and word links for that verse. Translation
//! academy and translation words articles referenced through `rc://` links
//! are gathered into appendices, each listing the verses that cite it.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write;
use std::sync::LazyLock;

use regex_lite::{Captures, Regex};

use super::escape::encode_html;
use super::manual::Section;
use super::markdown::note_to_html;
use crate::align::insert_unmatched_braces;
use crate::scripture::{ParsedBook, RefKey};
use crate::tsv::{Pivot, TsvRow};

/// `[[rc://…]]` text links and `href="rc://…"` attributes.
static RC_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\[\[(rc://[^\]\s]+)\]\]|href="(rc://[^"]+)""#).unwrap());

/// Anchor prefix of every notes-book element.
const NAV: &str = "nav";

/// Articles of a manual family, addressable by (manual or category, article id).
#[derive(Debug, Clone, Default)]
pub struct ArticleIndex {
    articles: BTreeMap<(String, String), (String, String)>,
}

impl ArticleIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index every article in manual trees whose links follow `group--article`.
    pub fn from_sections(manuals: &[Section]) -> Self {
        fn walk(index: &mut ArticleIndex, node: &Section) {
            if let Some((group, article)) = node.id.as_deref().and_then(|id| id.split_once("--"))
                && node.body.is_some()
            {
                index.insert(
                    group,
                    article,
                    node.title.clone().unwrap_or_default(),
                    node.body.clone().unwrap_or_default(),
                );
            }
            for child in &node.sections {
                walk(index, child);
            }
        }
        let mut index = Self::new();
        for manual in manuals {
            walk(&mut index, manual);
        }
        index
    }

    pub fn insert(&mut self, group: &str, article: &str, title: String, body: String) {
        self.articles
            .insert((group.to_string(), article.to_string()), (title, body));
    }

    /// (title, body) of an article.
    pub fn get(&self, group: &str, article: &str) -> Option<(&str, &str)> {
        self.articles
            .get(&(group.to_string(), article.to_string()))
            .map(|(t, b)| (t.as_str(), b.as_str()))
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }
}

/// A TA or TW resource used for an appendix.
#[derive(Debug, Clone, Copy)]
pub struct Appendix<'a> {
    pub title: &'a str,
    pub version: &'a str,
    pub articles: &'a ArticleIndex,
}

/// A target Bible shown in scripture blocks.
#[derive(Debug, Clone, Copy)]
pub struct ScriptureColumn<'a> {
    pub abbreviation: &'a str,
    pub book: &'a ParsedBook,
}

/// Everything needed to render one notes book.
#[derive(Debug, Clone, Copy)]
pub struct NotesDocument<'a> {
    pub book_id: &'a str,
    pub book_title: &'a str,
    /// Title of the notes resource.
    pub resource_title: &'a str,
    pub notes: &'a Pivot,
    pub word_links: Option<&'a Pivot>,
    pub scripture: &'a [ScriptureColumn<'a>],
    pub academy: Option<Appendix<'a>>,
    pub words: Option<Appendix<'a>>,
    pub delimiter: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Resource {
    Academy,
    Words,
}

impl Resource {
    fn key(self) -> &'static str {
        match self {
            Resource::Academy => "ta",
            Resource::Words => "tw",
        }
    }
}

/// A parsed `rc://lang/resource/type/path` link.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RcLink {
    resource: Resource,
    group: String,
    article: String,
    anchor: String,
}

impl RcLink {
    fn parse(link: &str) -> Option<Self> {
        let rest = link.strip_prefix("rc://")?;
        let mut parts = rest.splitn(4, '/');
        let _lang = parts.next()?;
        let resource = match parts.next()? {
            "ta" => Resource::Academy,
            "tw" => Resource::Words,
            _ => return None,
        };
        let _kind = parts.next()?;
        let path = parts.next()?.trim_end_matches(".md").trim_end_matches('/');
        let segments: Vec<&str> = path.split('/').collect();
        let (group, article) = match resource {
            // translate/figs-metaphor
            Resource::Academy => (segments.first()?, segments.get(1..)?.join("/")),
            // bible/kt/god
            Resource::Words => (segments.get(1)?, segments.get(2..)?.join("/")),
        };
        if article.is_empty() {
            return None;
        }
        let anchor = format!("{}--{}", resource.key(), path.replace('/', "--"));
        Some(Self {
            resource,
            group: group.to_string(),
            article,
            anchor,
        })
    }
}

struct AppendixEntry {
    title: String,
    body: String,
    back_refs: Vec<String>,
}

/// rc links found while rendering, keyed by resource and anchor.
#[derive(Default)]
struct LinkCollector {
    entries: BTreeMap<(Resource, String), AppendixEntry>,
    /// Raw link text → anchor, for the final rewrite.
    anchors: BTreeMap<String, (Resource, String)>,
}

impl LinkCollector {
    fn collect(&mut self, doc: &NotesDocument<'_>, html: &str, back_ref: Option<&str>) -> Vec<String> {
        let mut new_bodies = Vec::new();
        for caps in RC_LINK_RE.captures_iter(html) {
            let Some(raw) = caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str()) else {
                continue;
            };
            let Some(link) = RcLink::parse(raw) else {
                continue;
            };
            // Without an appendix to point into, the link stays as written.
            let Some(library) = (match link.resource {
                Resource::Academy => doc.academy,
                Resource::Words => doc.words,
            }) else {
                continue;
            };
            let key = (link.resource, link.anchor.clone());
            self.anchors.insert(raw.to_string(), key.clone());
            let entry = self.entries.entry(key).or_insert_with(|| {
                let found = library.articles.get(&link.group, &link.article);
                let (title, body) = match found {
                    Some((title, body)) => (title.to_string(), body.to_string()),
                    None => {
                        log::debug!("no article for {raw}");
                        (
                            format!(
                                "{} ARTICLE FOR {} :: {} NOT FOUND!",
                                link.resource.key().to_uppercase(),
                                link.group,
                                link.article
                            ),
                            String::new(),
                        )
                    }
                };
                new_bodies.push(body.clone());
                AppendixEntry {
                    title,
                    body,
                    back_refs: Vec::new(),
                }
            });
            if let Some(back_ref) = back_ref
                && !entry.back_refs.iter().any(|r| r == back_ref)
            {
                entry.back_refs.push(back_ref.to_string());
            }
        }
        new_bodies
    }

    /// Collect links from `html`, then from every newly reached article body.
    fn collect_all(&mut self, doc: &NotesDocument<'_>, html: &str, back_ref: Option<&str>) {
        let mut pending = self.collect(doc, html, back_ref);
        while let Some(body) = pending.pop() {
            pending.extend(self.collect(doc, &body, None));
        }
    }

    /// Replace rc links with in-document anchors.
    fn rewrite(&self, html: &str) -> String {
        RC_LINK_RE
            .replace_all(html, |caps: &Captures| {
                if let Some(text) = caps.get(1) {
                    match self.lookup(text.as_str()) {
                        Some((anchor, title)) => format!(r##"<a href="#{anchor}">{title}</a>"##),
                        None => caps[0].to_string(),
                    }
                } else {
                    let raw = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
                    match self.lookup(raw) {
                        Some((anchor, _)) => format!(r##"href="#{anchor}""##),
                        None => caps[0].to_string(),
                    }
                }
            })
            .into_owned()
    }

    fn lookup(&self, raw: &str) -> Option<(&str, &str)> {
        let key = self.anchors.get(raw)?;
        let entry = self.entries.get(key)?;
        Some((key.1.as_str(), entry.title.as_str()))
    }
}

/// Verse numbers to render for a chapter: every verse any target Bible or
/// resource knows about.
pub(super) fn chapter_verses(scripture: &[ScriptureColumn<'_>], pivots: &[&Pivot], chapter: u32) -> BTreeSet<u32> {
    let mut verses = BTreeSet::new();
    for column in scripture {
        if let Some(found) = column.book.chapters.get(&RefKey::Num(chapter)) {
            verses.extend(found.values().flat_map(|v| v.numbers()));
        }
    }
    for pivot in pivots {
        if let Some(found) = pivot.get(&RefKey::Num(chapter)) {
            verses.extend(found.keys().filter_map(RefKey::as_num));
        }
    }
    verses.retain(|&v| v > 0);
    verses
}

pub(super) fn book_chapters(scripture: &[ScriptureColumn<'_>], pivots: &[&Pivot]) -> BTreeSet<u32> {
    let mut chapters: BTreeSet<u32> = scripture
        .iter()
        .flat_map(|c| c.book.numbered_chapters().map(|(n, _)| n))
        .collect();
    for pivot in pivots {
        chapters.extend(pivot.keys().filter_map(RefKey::as_num));
    }
    chapters
}

impl NotesDocument<'_> {
    fn pivots(&self) -> Vec<&Pivot> {
        std::iter::once(self.notes).chain(self.word_links).collect()
    }
}

struct NotesRenderer<'a> {
    doc: &'a NotesDocument<'a>,
    links: LinkCollector,
    out: String,
}

impl<'a> NotesRenderer<'a> {
    fn article(&mut self, html: String, back_ref: Option<String>) {
        self.links.collect_all(self.doc, &html, back_ref.as_deref());
        self.out.push_str(&html);
    }

    fn front_intro(&mut self) {
        let doc = self.doc;
        let Some(rows) = doc.notes.get(&RefKey::Front).and_then(|v| v.get(&RefKey::Intro)) else {
            return;
        };
        let book = doc.book_id;
        let _ = writeln!(
            self.out,
            r#"<div id="{NAV}-{book}-front-intro" class="section tn-front-intro-section" data-toc-title="{} Introduction">"#,
            encode_html(doc.book_title)
        );
        for row in rows {
            let link = format!("{NAV}-{book}-front-intro-{}", row.id());
            let html = format!(
                "<div class=\"article tn-front-intro-note\" id=\"{link}\">\n<span class=\"header-title\">{} :: {} :: Introduction</span>\n<div class=\"tn-note-body\">\n{}\n</div>\n</div>\n",
                doc.resource_title,
                doc.book_title,
                note_to_html(row.note(), NAV, book, "front"),
            );
            self.article(html, Some(format!(r##"<a href="#{link}">{}</a>"##, row.reference())));
        }
        self.out.push_str("</div>\n");
    }

    fn chapter(&mut self, chapter: u32) {
        let doc = self.doc;
        let book = doc.book_id;
        let title = doc.book_title;
        let _ = writeln!(
            self.out,
            r##"<div id="{NAV}-{book}-{chapter}" class="section tn-chapter-section" data-toc-title="{title} {chapter}">
<h2 class="header tn-chapter-header"><a href="#{NAV}-{book}-{chapter}" class="header-link">{title} {chapter}</a></h2>"##
        );

        if let Some(rows) = doc
            .notes
            .get(&RefKey::Num(chapter))
            .and_then(|v| v.get(&RefKey::Intro))
        {
            let _ = writeln!(
                self.out,
                r#"<div class="section tn-chapter-intro-section" id="{NAV}-{book}-{chapter}-intro">"#
            );
            for row in rows {
                let link = format!("{NAV}-{book}-{chapter}-intro-{}", row.id());
                let html = format!(
                    "<div class=\"article tn-note-body\" id=\"{link}\">\n<span class=\"header-title\">{} :: {title} {chapter} Introduction</span>\n{}\n</div>\n",
                    doc.resource_title,
                    note_to_html(row.note(), NAV, book, &chapter.to_string()),
                );
                self.article(html, Some(format!(r##"<a href="#{link}">{}</a>"##, row.reference())));
            }
            self.out.push_str("</div>\n");
        }

        for verse in chapter_verses(doc.scripture, &doc.pivots(), chapter) {
            self.verse(chapter, verse);
        }
        self.out.push_str("</div>\n");
    }

    /// Scripture blocks for one verse; returns each target's verse text.
    fn scripture_blocks(&mut self, chapter: u32, verse: u32) -> Vec<String> {
        let doc = self.doc;
        let book = doc.book_id;
        let mut texts = Vec::with_capacity(doc.scripture.len());
        for column in doc.scripture {
            let Some(found) = column.book.verse(chapter, verse) else {
                texts.push(String::new());
                continue;
            };
            let abbr = column.abbreviation;
            let link = format!("{NAV}-{book}-{chapter}-{verse}-{abbr}");
            let bridge = if found.label != verse.to_string() {
                format!(" (vv{})", found.label)
            } else {
                String::new()
            };
            let _ = writeln!(
                self.out,
                r##"<div class="article tn-scripture-block" id="{link}">
<h4 class="header tn-scripture-header"><a href="#{link}" class="header-link" data-descr="{abbr}">{}:</a></h4>
<div class="tn-scripture-text">{}{bridge}</div>
</div>"##,
                abbr.to_uppercase(),
                found.text,
            );
            texts.push(found.text.clone());
        }
        texts
    }

    fn quote_heading(&self, row: &TsvRow, index: usize, scripture: &str) -> String {
        let gl_quote = row.gl_quote(index);
        if !gl_quote.is_empty() {
            insert_unmatched_braces(gl_quote, scripture, self.doc.delimiter)
        } else if !row.quote().is_empty() {
            format!(r#"<span style="color: red">"{}" (ORIG QUOTE)</span>"#, encode_html(row.quote()))
        } else {
            String::new()
        }
    }

    fn note(&mut self, row: &TsvRow, chapter: u32, verse: u32, scripture: &[String]) {
        let doc = self.doc;
        let book = doc.book_id;
        let link = format!("{NAV}-{book}-{chapter}-{verse}-{}", row.id());
        let bridge = if row.reference() != format!("{chapter}:{verse}") {
            format!(" ({})", row.reference())
        } else {
            String::new()
        };
        let id = row.id();

        let mut html = format!("<div class=\"article tn-note-article\" id=\"{link}\">\n");
        let quote = row.quote();
        if quote.is_empty() || quote.ends_with(':') {
            let _ = writeln!(
                html,
                r##"<h4 class="header tn-note-header"><a href="#{link}" class="header-link" data-descr="{id}">Note:{bridge}</a></h4>"##
            );
        } else {
            for (index, column) in doc.scripture.iter().enumerate() {
                let text = scripture.get(index).map(String::as_str).unwrap_or_default();
                let heading = self.quote_heading(row, index, text);
                let _ = writeln!(
                    html,
                    r##"<h4 class="header tn-note-header"><a href="#{link}" class="header-link" data-descr="{id}">{heading}{bridge} ({})</a></h4>"##,
                    column.abbreviation.to_uppercase()
                );
            }
        }
        let _ = writeln!(
            html,
            "<span class=\"header-title\">{} :: {} {}</span>\n<div class=\"tn-note-body\">\n{}\n</div>",
            doc.resource_title,
            doc.book_title,
            row.reference(),
            note_to_html(row.note(), NAV, book, &chapter.to_string()),
        );
        if !row.support_reference().is_empty() {
            let _ = writeln!(
                html,
                "<div class=\"tn-note-support-reference\">\n<span class=\"tn-note-label\">Support Reference:&nbsp;</span>\n[[{}]]\n</div>",
                row.support_reference()
            );
        }
        html.push_str("<hr style=\"width: 75%\"/>\n</div>\n");
        self.article(html, Some(format!(r##"<a href="#{link}">{}</a>"##, row.reference())));
    }

    fn word_links(&mut self, rows: &[TsvRow], chapter: u32, verse: u32, scripture: &[String]) {
        let doc = self.doc;
        let book = doc.book_id;
        let link = format!("twl-{book}-{chapter}-{verse}");
        let heading = doc.words.map(|w| w.title).unwrap_or("Translation Words");
        let mut html = format!(
            "<div class=\"article tn-verse-twls\" id=\"{link}\">\n<h4 class=\"header tn-verse-twl-header\">{heading}</h4>\n"
        );
        for (index, column) in doc.scripture.iter().enumerate() {
            let text = scripture.get(index).map(String::as_str).unwrap_or_default();
            let _ = writeln!(
                html,
                "<h5 class=\"tn-verse-twl-bible\">{}</h5>\n<ul class=\"tn-verse-twl-list\">",
                column.abbreviation.to_uppercase()
            );
            for row in rows {
                let gl_quote = row.gl_quote(index);
                let label = if gl_quote.is_empty() {
                    format!("{} (ORIG QUOTE)", encode_html(row.quote()))
                } else {
                    insert_unmatched_braces(gl_quote, text, doc.delimiter)
                };
                let _ = writeln!(
                    html,
                    r#"<li class="tn-verse-twl-list-item"><a href="{}">{label}</a></li>"#,
                    row.tw_link()
                );
            }
            html.push_str("</ul>\n");
        }
        html.push_str("</div>\n");
        let verse_link = format!("{NAV}-{book}-{chapter}-{verse}");
        self.article(html, Some(format!(r##"<a href="#{verse_link}">{chapter}:{verse}</a>"##)));
    }

    fn verse(&mut self, chapter: u32, verse: u32) {
        let doc = self.doc;
        let book = doc.book_id;
        let title = doc.book_title;
        let link = format!("{NAV}-{book}-{chapter}-{verse}");
        let _ = writeln!(
            self.out,
            r##"<div id="{link}" class="section tn-chapter-verse-section">
<h3 class="header tn-verse-header"><a href="#{link}" class="header-link">{title} {chapter}:{verse}</a></h3>
<span class="header-title">{} :: {title} {chapter}:{verse}</span>"##,
            doc.resource_title
        );

        let scripture = self.scripture_blocks(chapter, verse);

        let rows = doc
            .notes
            .get(&RefKey::Num(chapter))
            .and_then(|v| v.get(&RefKey::Num(verse)));
        match rows {
            Some(rows) if !rows.is_empty() => {
                for row in rows {
                    self.note(row, chapter, verse, &scripture);
                }
            }
            _ => self.out.push_str(
                "<div class=\"article tn-verse-no-content\">\n(There are no notes for this verse)\n</div>\n",
            ),
        }

        if let Some(rows) = doc
            .word_links
            .and_then(|p| p.get(&RefKey::Num(chapter)))
            .and_then(|v| v.get(&RefKey::Num(verse)))
            .filter(|rows| !rows.is_empty())
        {
            self.word_links(rows, chapter, verse, &scripture);
        }

        self.out.push_str("<hr style=\"width: 100%\"/>\n</div>\n");
    }

    fn appendix(&mut self, resource: Resource) {
        let doc = self.doc;
        let (source, logo) = match resource {
            Resource::Academy => (doc.academy, "uta"),
            Resource::Words => (doc.words, "utw"),
        };
        let Some(source) = source else {
            return;
        };
        let mut entries: Vec<(&String, &AppendixEntry)> = self
            .links
            .entries
            .iter()
            .filter(|((r, _), _)| *r == resource)
            .map(|((_, anchor), entry)| (anchor, entry))
            .collect();
        if entries.is_empty() {
            return;
        }
        entries.sort_by_key(|(_, e)| e.title.to_lowercase());

        let key = resource.key();
        let mut html = format!(
            r#"<div class="appendex {key} section" id="appendex-{key}" data-toc-title="Appendix: {}">
<div class="article title-page">
<span class="header-title"></span>
<img class="title-logo" src="https://cdn.door43.org/assets/uw-icons/logo-{logo}-256.png" alt="{logo}">
<h1 class="header cover-header section-header">{} - {}</h1>
<h3 class="cover-version">{}</h3>
</div>
"#,
            encode_html(source.title),
            source.title,
            doc.book_title,
            source.version,
        );
        for (anchor, entry) in entries {
            let _ = write!(
                html,
                r##"<div class="article" id="{anchor}" data-toc-title="{}">
<h2 class="header article-header"><a href="#{anchor}" class="header-link">{}</a></h2>
<span class="header-title">{} :: {}</span>
<div class="article-body">
{}
</div>
<div class="back-refs">
<h3>{} References:</h3>
{}
</div>
</div>
"##,
                encode_html(&entry.title),
                entry.title,
                source.title,
                entry.title,
                entry.body,
                doc.book_title,
                entry.back_refs.join("; "),
            );
        }
        html.push_str("</div>\n");
        self.out.push_str(&html);
    }
}

/// Render a complete translation notes book with its appendices.
pub fn render_notes_book(doc: &NotesDocument<'_>) -> String {
    let mut renderer = NotesRenderer {
        doc,
        links: LinkCollector::default(),
        out: String::new(),
    };
    let book = doc.book_id;
    let heading = format!("{} - {}", doc.resource_title, doc.book_title);
    let _ = writeln!(
        renderer.out,
        r##"<div class="section tn-book-section" id="{NAV}-{book}" data-toc-title="{}">
<h1 class="header tn-book-section-header"><a href="#{NAV}-{book}" class="header-link">{heading}</a></h1>"##,
        encode_html(&heading)
    );

    renderer.front_intro();
    for chapter in book_chapters(doc.scripture, &doc.pivots()) {
        renderer.chapter(chapter);
    }
    renderer.out.push_str("</div>\n");

    renderer.appendix(Resource::Academy);
    renderer.appendix(Resource::Words);

    log::info!(
        "rendered notes for {book} with {} appendix articles",
        renderer.links.entries.len()
    );
    renderer.links.rewrite(&renderer.out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scripture::{MAX_VERSE, parse_usfm};
    use crate::tsv::{bucket_rows, parse_tsv};

    const ULT: &str = "\\id TIT\n\\c 1\n\\v 1 Paul, a servant of God\n\\v 2-3 in hope of {eternal} life\n\\v 4 to Titus\n";
    const TN: &str = "Reference\tID\tTags\tSupportReference\tQuote\tOccurrence\tNote\tGLQuote0\n\
        front:intro\tf001\t\t\t\t0\t# Introduction to Titus\t\n\
        1:intro\tc001\t\t\t\t0\t# Titus 1 notes\t\n\
        1:1\tn001\t\trc://*/ta/man/translate/figs-metaphor\tΠαῦλος\t1\tPaul wrote this.\tPaul\n\
        1:1\tn002\t\t\tδοῦλος\t1\tA servant, see [[rc://*/ta/man/translate/figs-metaphor]]\t\n\
        1:2-3\tn003\t\t\tζωῆς αἰωνίου\t1\tLife.\teternal} life\n\
        1:4\tn004\t\t\t\t0\tGeneral note\t\n";
    const TWL: &str = "Reference\tID\tTags\tOrigWords\tOccurrence\tTWLink\tGLQuote0\n\
        1:1\tw001\tkeyterm\tΘεοῦ\t1\trc://*/tw/dict/bible/kt/god\tGod\n";

    fn render() -> String {
        let ult = parse_usfm(ULT);
        let notes = bucket_rows(parse_tsv(TN).unwrap());
        let twl = bucket_rows(parse_tsv(TWL).unwrap());
        let mut ta = ArticleIndex::new();
        ta.insert("translate", "figs-metaphor", "Metaphor".into(), "<p>A metaphor…</p>".into());
        let tw = ArticleIndex::from_sections(&[Section::new("kt", "Key Terms")
            .with_sections(vec![Section::new("kt--god", "God").with_body("<p>God is…</p>")])]);
        let columns = [ScriptureColumn {
            abbreviation: "ult",
            book: &ult,
        }];
        let doc = NotesDocument {
            book_id: "tit",
            book_title: "Titus",
            resource_title: "unfoldingWord Translation Notes",
            notes: &notes,
            word_links: Some(&twl),
            scripture: &columns,
            academy: Some(Appendix {
                title: "unfoldingWord Translation Academy",
                version: "v80",
                articles: &ta,
            }),
            words: Some(Appendix {
                title: "unfoldingWord Translation Words",
                version: "v80",
                articles: &tw,
            }),
            delimiter: " … ",
        };
        render_notes_book(&doc)
    }

    #[test]
    fn test_rc_link_parse() {
        let ta = RcLink::parse("rc://*/ta/man/translate/figs-metaphor").unwrap();
        assert_eq!(ta.anchor, "ta--translate--figs-metaphor");
        assert_eq!((ta.group.as_str(), ta.article.as_str()), ("translate", "figs-metaphor"));
        let tw = RcLink::parse("rc://en/tw/dict/bible/kt/god").unwrap();
        assert_eq!(tw.anchor, "tw--bible--kt--god");
        assert_eq!((tw.group.as_str(), tw.article.as_str()), ("kt", "god"));
        assert!(RcLink::parse("rc://en/ult/book/tit").is_none());
    }

    #[test]
    fn test_book_structure() {
        let html = render();
        assert!(html.contains(r#"id="nav-tit""#));
        assert!(html.contains(r#"id="nav-tit-front-intro""#));
        assert!(html.contains(r#"id="nav-tit-1-intro""#));
        assert!(html.contains(r#"id="nav-tit-1-1-n001""#));
        assert!(html.contains(r#"id="nav-tit-1-1-ult""#));
        assert!(html.contains("<h3>Introduction to Titus</h3>"));
    }

    #[test]
    fn test_bridged_verse_and_braces() {
        let html = render();
        assert!(html.contains("in hope of {eternal} life (vv2-3)"));
        assert!(html.contains("{eternal} life (1:2-3) (ULT)"));
    }

    #[test]
    fn test_orig_quote_fallback_and_placeholder() {
        let html = render();
        assert!(html.contains(r#"<span style="color: red">"δοῦλος" (ORIG QUOTE)</span> (ULT)"#));
        assert!(html.contains("Note:</a>"));
        assert!(html.contains("(There are no notes for this verse)"));
    }

    #[test]
    fn test_appendices_with_back_refs() {
        let html = render();
        assert!(html.contains(r#"id="appendex-ta""#));
        assert!(html.contains(r#"<div class="article" id="ta--translate--figs-metaphor""#));
        assert!(html.contains(r##"<a href="#ta--translate--figs-metaphor">Metaphor</a>"##));
        assert!(html.contains(r##"<a href="#nav-tit-1-1-n001">1:1</a>; <a href="#nav-tit-1-1-n002">1:1</a>"##));
        assert!(html.contains(r#"id="tw--bible--kt--god""#));
        assert!(html.contains(r##"<a href="#tw--bible--kt--god">God</a>"##));
        assert!(!html.contains("[[rc://"));
    }

    #[test]
    fn test_missing_article_title() {
        let mut links = LinkCollector::default();
        let index = ArticleIndex::new();
        let notes = Pivot::new();
        let doc = NotesDocument {
            book_id: "tit",
            book_title: "Titus",
            resource_title: "TN",
            notes: &notes,
            word_links: None,
            scripture: &[],
            academy: Some(Appendix {
                title: "TA",
                version: "v1",
                articles: &index,
            }),
            words: None,
            delimiter: " … ",
        };
        links.collect_all(&doc, "[[rc://*/ta/man/translate/figs-x]]", None);
        let rewritten = links.rewrite("see [[rc://*/ta/man/translate/figs-x]]");
        assert!(rewritten.contains("TA ARTICLE FOR translate :: figs-x NOT FOUND!"));
    }

    fn render_plain(ult: &str, tn: &str, twl: &str) -> String {
        let ult = parse_usfm(ult);
        let notes = bucket_rows(parse_tsv(tn).unwrap());
        let twl = bucket_rows(parse_tsv(twl).unwrap());
        let columns = [ScriptureColumn {
            abbreviation: "ult",
            book: &ult,
        }];
        let doc = NotesDocument {
            book_id: "tit",
            book_title: "Titus",
            resource_title: "TN",
            notes: &notes,
            word_links: Some(&twl),
            scripture: &columns,
            academy: None,
            words: None,
            delimiter: " … ",
        };
        render_notes_book(&doc)
    }

    #[test]
    fn test_orig_quotes_are_escaped() {
        let tn = "Reference\tID\tTags\tSupportReference\tQuote\tOccurrence\tNote\n\
            1:1\tn001\t\t\t<b>Παῦλος & δοῦλος\t1\tPaul.\n";
        let twl = "Reference\tID\tTags\tOrigWords\tOccurrence\tTWLink\n\
            1:1\tw001\t\tΘεοῦ<script>\t1\trc://*/tw/dict/bible/kt/god\n";
        let html = render_plain(ULT, tn, twl);
        assert!(html.contains(r#"<span style="color: red">"&lt;b>Παῦλος &amp; δοῦλος" (ORIG QUOTE)</span>"#));
        assert!(html.contains(">Θεοῦ&lt;script> (ORIG QUOTE)</a>"));
        assert!(!html.contains("<b>"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_runaway_bridge_renders_bounded_sections() {
        let ult = "\\id TIT\n\\c 1\n\\v 1-5000 Paul\n";
        let tn = "Reference\tID\tTags\tSupportReference\tQuote\tOccurrence\tNote\n";
        let twl = "Reference\tID\tTags\tOrigWords\tOccurrence\tTWLink\n";
        let html = render_plain(ult, tn, twl);
        let sections = html.matches("tn-chapter-verse-section").count();
        assert!(sections > 0);
        assert!(sections <= MAX_VERSE as usize, "{sections} verse sections");
    }
}
