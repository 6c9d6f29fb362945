//! Translation questions and study questions books.
//!
//! A questions book follows the same chapter and verse layout as a notes
//! book: each verse shows the gateway scripture of every target Bible, then
//! its questions. Responses sit behind a hidden checkbox so a reader can
//! reveal them one at a time.

use std::fmt::Write;

use super::escape::encode_html;
use super::markdown::note_to_html;
use super::notes::{ScriptureColumn, book_chapters, chapter_verses};
use crate::scripture::RefKey;
use crate::tsv::{Pivot, TsvRow};

const NAV: &str = "nav";

/// Everything needed to render one questions book.
#[derive(Debug, Clone, Copy)]
pub struct QuestionsDocument<'a> {
    pub book_id: &'a str,
    pub book_title: &'a str,
    /// Title of the questions resource.
    pub resource_title: &'a str,
    pub questions: &'a Pivot,
    pub scripture: &'a [ScriptureColumn<'a>],
}

/// Question heading and collapsible response.
pub(super) fn question_entry(out: &mut String, link: &str, row: &TsvRow, bridge: &str, chapter: &str, book: &str) {
    let id = row.id();
    let _ = writeln!(
        out,
        r##"<div id="{link}" class="article tq-question-article">
<div class="tq-entry">
<h4 class="tq-entry-question"><a class="header-link" href="#{link}" data-descr="{id}">{}{bridge}</a></h4>"##,
        encode_html(row.question().trim()),
    );
    if !row.response().is_empty() {
        let _ = writeln!(
            out,
            r#"<input type="checkbox" class="response-show-checkbox" id="checkbox-{id}" style="display:none;">
<label class="response-show-label" for="checkbox-{id}"></label>
<div class="tq-entry-response">
{}
</div>"#,
            note_to_html(row.response(), NAV, book, chapter),
        );
    }
    out.push_str("</div>\n</div>\n");
}

struct QuestionsRenderer<'a> {
    doc: &'a QuestionsDocument<'a>,
    out: String,
}

impl QuestionsRenderer<'_> {
    fn front_intro(&mut self) {
        let doc = self.doc;
        let Some(rows) = doc.questions.get(&RefKey::Front).and_then(|v| v.get(&RefKey::Intro)) else {
            return;
        };
        let book = doc.book_id;
        let _ = writeln!(
            self.out,
            r#"<div id="{NAV}-{book}-front-intro" class="section tq-front-intro-section" data-toc-title="{} Introduction">"#,
            encode_html(doc.book_title)
        );
        for row in rows {
            let _ = writeln!(
                self.out,
                "<div class=\"article tq-front-intro-note\" id=\"{NAV}-{book}-front-intro-{}\">\n<span class=\"header-title\">{} :: {} :: Introduction</span>\n<div class=\"tq-question-body\">\n{}\n{}\n</div>\n</div>",
                row.id(),
                doc.resource_title,
                doc.book_title,
                note_to_html(row.question(), NAV, book, "front"),
                note_to_html(row.response(), NAV, book, "front"),
            );
        }
        self.out.push_str("</div>\n");
    }

    fn chapter(&mut self, chapter: u32) {
        let doc = self.doc;
        let book = doc.book_id;
        let title = doc.book_title;
        let _ = writeln!(
            self.out,
            r##"<div id="{NAV}-{book}-{chapter}" class="section tq-chapter-section" data-toc-title="{title} {chapter}">
<h2 class="header tq-chapter-header"><a href="#{NAV}-{book}-{chapter}" class="header-link">{title} {chapter}</a></h2>"##
        );

        if let Some(rows) = doc.questions.get(&RefKey::Num(chapter)).and_then(|v| v.get(&RefKey::Intro)) {
            let _ = writeln!(
                self.out,
                r#"<div class="section tq-chapter-intro-section" id="{NAV}-{book}-{chapter}-intro">"#
            );
            for row in rows {
                let _ = writeln!(
                    self.out,
                    "<div class=\"article\" id=\"{NAV}-{book}-{chapter}-intro-{}\">\n<span class=\"header-title\">{} :: {title} {chapter} Introduction</span>\n{}\n{}\n</div>",
                    row.id(),
                    doc.resource_title,
                    note_to_html(row.question(), NAV, book, &chapter.to_string()),
                    note_to_html(row.response(), NAV, book, &chapter.to_string()),
                );
            }
            self.out.push_str("</div>\n");
        }

        for verse in chapter_verses(doc.scripture, &[doc.questions], chapter) {
            self.verse(chapter, verse);
        }
        self.out.push_str("</div>\n");
    }

    fn verse(&mut self, chapter: u32, verse: u32) {
        let doc = self.doc;
        let book = doc.book_id;
        let title = doc.book_title;
        let link = format!("{NAV}-{book}-{chapter}-{verse}");
        let _ = writeln!(
            self.out,
            r##"<div id="{link}" class="section tq-chapter-verse-section">
<h3 class="header tq-verse-header"><a href="#{link}" class="header-link">{title} {chapter}:{verse}</a></h3>
<span class="header-title">{} :: {title} {chapter}:{verse}</span>"##,
            doc.resource_title
        );

        for column in doc.scripture {
            let Some(found) = column.book.verse(chapter, verse) else {
                continue;
            };
            let abbr = column.abbreviation;
            let block = format!("{link}-{abbr}");
            let bridge = if found.label != verse.to_string() {
                format!(" (vv{})", found.label)
            } else {
                String::new()
            };
            let _ = writeln!(
                self.out,
                r##"<div class="article tq-scripture-block" id="{block}">
<h4 class="header tq-scripture-header"><a href="#{block}" class="header-link" data-descr="{abbr}">{}:</a></h4>
<div class="tq-scripture-text">{}{bridge}</div>
</div>"##,
                abbr.to_uppercase(),
                found.text,
            );
        }

        let rows = doc
            .questions
            .get(&RefKey::Num(chapter))
            .and_then(|v| v.get(&RefKey::Num(verse)))
            .map(|rows| rows.iter().filter(|r| !r.question().is_empty()).collect::<Vec<_>>())
            .unwrap_or_default();
        if rows.is_empty() {
            self.out.push_str(
                "<div class=\"article tq-verse-no-content\">\n(There are no questions for this verse)\n</div>\n",
            );
        }
        for row in rows {
            let bridge = if row.reference() != format!("{chapter}:{verse}") {
                format!(" ({})", encode_html(row.reference()))
            } else {
                String::new()
            };
            let question_link = format!("{link}-{}", row.id());
            question_entry(&mut self.out, &question_link, row, &bridge, &chapter.to_string(), book);
        }

        self.out.push_str("<hr style=\"width: 100%\"/>\n</div>\n");
    }
}

/// Render a complete translation questions (or study questions) book.
pub fn render_questions_book(doc: &QuestionsDocument<'_>) -> String {
    let mut renderer = QuestionsRenderer {
        doc,
        out: String::new(),
    };
    let book = doc.book_id;
    let heading = format!("{} - {}", doc.resource_title, doc.book_title);
    let _ = writeln!(
        renderer.out,
        r##"<div class="section tq-book-section" id="{NAV}-{book}" data-toc-title="{0}">
<h1 class="header tq-book-section-header"><a href="#{NAV}-{book}" class="header-link">{0}</a></h1>"##,
        encode_html(&heading)
    );

    renderer.front_intro();
    let chapters = book_chapters(doc.scripture, &[doc.questions]);
    for chapter in chapters {
        renderer.chapter(chapter);
    }
    renderer.out.push_str("</div>\n");
    log::info!("rendered questions for {book}");
    renderer.out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scripture::parse_usfm;
    use crate::tsv::{bucket_rows, parse_tsv};

    const ULT: &str = "\\id TIT\n\\c 1\n\\v 1 Paul, a servant of God\n\\v 2-3 in hope of eternal life\n\\v 4 to Titus\n";
    const TQ: &str = "Reference\tID\tTags\tQuote\tOccurrence\tQuestion\tResponse\n\
        front:intro\tq000\t\t\t\tAbout Titus\tA letter.\n\
        1:1\tq001\t\t\t\tWhose servant is Paul?\tPaul is a servant of God.\n\
        1:2-3\tq002\t\t\t\tWhat does Paul hope for?\tEternal life.\n\
        1:4\tq003\t\t\t\tTo whom <is> it written?\t\n";

    fn render() -> String {
        let ult = parse_usfm(ULT);
        let questions = bucket_rows(parse_tsv(TQ).unwrap());
        let columns = [ScriptureColumn {
            abbreviation: "ult",
            book: &ult,
        }];
        render_questions_book(&QuestionsDocument {
            book_id: "tit",
            book_title: "Titus",
            resource_title: "unfoldingWord Translation Questions",
            questions: &questions,
            scripture: &columns,
        })
    }

    #[test]
    fn test_questions_book_structure() {
        let html = render();
        assert!(html.contains(r#"id="nav-tit""#));
        assert!(html.contains(r#"id="nav-tit-front-intro-q000""#));
        assert!(html.contains(r#"id="nav-tit-1""#));
        assert!(html.contains(r#"id="nav-tit-1-1-ult""#));
        assert!(html.contains(r#"id="nav-tit-1-1-q001""#));
        assert!(html.contains("Paul, a servant of God"));
    }

    #[test]
    fn test_question_and_response() {
        let html = render();
        assert!(html.contains(">Whose servant is Paul?</a></h4>"));
        assert!(html.contains(r#"<label class="response-show-label" for="checkbox-q001">"#));
        assert!(html.contains("<p>Paul is a servant of God.</p>"));
    }

    #[test]
    fn test_bridged_question_and_empty_verse() {
        let html = render();
        assert!(html.contains(">What does Paul hope for? (1:2-3)</a>"));
        assert!(html.contains("in hope of eternal life (vv2-3)"));
        // verse 3 is covered by the bridge but has no questions of its own
        assert!(html.contains(r#"id="nav-tit-1-3""#));
        assert!(html.contains("(There are no questions for this verse)"));
    }

    #[test]
    fn test_question_is_escaped_and_response_optional() {
        let html = render();
        assert!(html.contains("To whom &lt;is> it written?"));
        assert!(!html.contains("checkbox-q003"));
    }
}
