//! Open Bible Stories helps: OBS translation notes, study notes, translation
//! questions and study questions.
//!
//! These resources are TSV files keyed by `story:frame`. Notes are shown
//! under the frame they annotate, with the frame's image and text, and the
//! translation academy topics they cite gathered into an appendix.
//! Questions walk every frame of every story so a frame without questions
//! still shows its text.

use std::collections::BTreeMap;
use std::fmt::Write;

use super::escape::encode_html;
use super::markdown::note_to_html;
use super::notes::Appendix;
use super::obs::{ObsData, ObsFrame, ObsOptions, ObsStory};
use super::questions::question_entry;
use crate::scripture::{RefKey, Reference};
use crate::tsv::{Pivot, TsvRow, pivot_rows};

const NAV: &str = "nav";
const BOOK: &str = "obs";

/// What an OBS TSV resource holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObsTsvKind {
    /// `Note` rows: OBS TN and OBS SN.
    Notes,
    /// `Question`/`Response` rows: OBS TQ and OBS SQ.
    Questions,
}

impl ObsTsvKind {
    /// Questions when any row carries a question, notes otherwise.
    pub fn detect(pivot: &Pivot) -> Self {
        if pivot_rows(pivot).any(|r| !r.question().is_empty()) {
            ObsTsvKind::Questions
        } else {
            ObsTsvKind::Notes
        }
    }
}

/// Everything needed to render an OBS helps resource.
#[derive(Debug, Clone, Copy)]
pub struct ObsTsvDocument<'a> {
    pub resource_title: &'a str,
    pub kind: ObsTsvKind,
    pub rows: &'a Pivot,
    pub stories: &'a ObsData,
    pub options: &'a ObsOptions,
    pub academy: Option<Appendix<'a>>,
}

#[derive(Debug, Default)]
struct Topic {
    title: String,
    body: String,
    back_refs: Vec<String>,
}

struct ObsTsvRenderer<'a> {
    doc: &'a ObsTsvDocument<'a>,
    topics: BTreeMap<String, Topic>,
    note_count: usize,
    out: String,
}

impl<'a> ObsTsvRenderer<'a> {
    fn story(&self, number: u32) -> Option<&'a ObsStory> {
        self.doc.stories.stories.iter().find(|s| s.number == number)
    }

    fn story_title(&self, number: u32) -> String {
        self.story(number)
            .map(|s| s.title.clone())
            .unwrap_or_else(|| format!("OBS {number}"))
    }

    fn frame(&self, story: u32, frame: u32) -> Option<&'a ObsFrame> {
        self.story(story)?.frames.iter().find(|f| f.number == frame)
    }

    fn frame_text(&mut self, story: u32, frame: &ObsFrame) {
        let f = frame.number;
        if self.doc.options.shows_images() {
            let _ = writeln!(
                self.out,
                r#"<div class="obs-image-container" style="text-align: center"><img src="{}" alt="Frame {story}-{f}"></div>"#,
                self.doc.options.image_url(story, f)
            );
        }
        let _ = writeln!(self.out, "<div class=\"obs-frame-text\">{}</div>", frame.content);
    }

    fn intro(&mut self, rows: &[TsvRow], story: &str) {
        let doc = self.doc;
        for row in rows {
            let body = match doc.kind {
                ObsTsvKind::Notes => note_to_html(row.note(), NAV, BOOK, story),
                ObsTsvKind::Questions => format!(
                    "{}\n{}",
                    note_to_html(row.question(), NAV, BOOK, story),
                    note_to_html(row.response(), NAV, BOOK, story)
                ),
            };
            let _ = writeln!(
                self.out,
                "<div class=\"article obs-intro-article\" id=\"{NAV}-{BOOK}-{story}-intro-{}\">\n<span class=\"header-title\">{} :: Introduction</span>\n{body}\n</div>",
                row.id(),
                doc.resource_title,
            );
        }
    }

    /// Link for a support reference, registering it for the appendix.
    fn topic_link(&mut self, support_reference: &str, back_ref: String) -> Option<(String, String)> {
        let academy = self.doc.academy?;
        let mut parts = support_reference.trim_end_matches('/').rsplit('/');
        let article = parts.next().filter(|a| !a.is_empty())?;
        let group = parts.next().unwrap_or("translate");
        let anchor = format!("ta--{group}--{article}");
        let topic = self.topics.entry(anchor.clone()).or_insert_with(|| match academy.articles.get(group, article) {
            Some((title, body)) => Topic {
                title: title.to_string(),
                body: body.to_string(),
                back_refs: Vec::new(),
            },
            None => Topic {
                title: article.to_string(),
                body: format!("TA ARTICLE FOR {group} :: {article} NOT FOUND!"),
                back_refs: Vec::new(),
            },
        });
        topic.back_refs.push(back_ref);
        Some((anchor, topic.title.clone()))
    }

    fn note(&mut self, row: &TsvRow, story: u32, frame: u32) {
        if row.note().is_empty() {
            return;
        }
        self.note_count += 1;
        let doc = self.doc;
        let link = format!("{NAV}-{BOOK}-{story}-{frame}-{}", row.id());
        let mut html = format!(
            "<div class=\"article obs-tn-entry\" id=\"{link}\">\n<h4 class=\"header obs-tn-entry-header\"><a class=\"header-link\" href=\"#{link}\">Note #{}:</a></h4>\n",
            self.note_count
        );

        let quote = Some(row.field("GLQuote"))
            .filter(|q| !q.is_empty())
            .unwrap_or_else(|| row.quote());
        if !quote.is_empty() {
            let frame_label = row.parsed_reference().map(|r| r.verse).unwrap_or_default();
            let bridge = if frame_label != frame.to_string() {
                format!("({}) ", encode_html(row.reference()))
            } else {
                String::new()
            };
            let _ = writeln!(html, "<h5 class=\"obs-tn-entry-quote\">Quote: {bridge}{}</h5>", encode_html(quote));
        }

        if !row.support_reference().is_empty() {
            let back_ref = format!(r##"<a href="#{link}">{}</a>"##, encode_html(row.reference()));
            let topic = match self.topic_link(row.support_reference(), back_ref) {
                Some((anchor, title)) => format!(r##"<a href="#{anchor}">{}</a>"##, encode_html(&title)),
                None => encode_html(row.support_reference()),
            };
            let _ = writeln!(
                html,
                "<div class=\"obs-tn-entry-support-reference\"><span style=\"font-weight: bold\">Topic:</span>&nbsp; {topic}</div>"
            );
        }

        let _ = writeln!(
            html,
            "<span class=\"header-title\">{} :: {} :: {}</span>\n<div class=\"obs-tn-entry-body\">\n{}\n</div>\n<hr style=\"width: 75%\"/>\n</div>",
            doc.resource_title,
            encode_html(&self.story_title(story)),
            row.reference(),
            note_to_html(row.note(), NAV, BOOK, &story.to_string()),
        );
        self.out.push_str(&html);
    }

    fn notes_story(&mut self, story: u32, frames: &BTreeMap<RefKey, Vec<TsvRow>>) {
        let title = self.story_title(story);
        let _ = writeln!(
            self.out,
            r##"<div class="section obs-tn-story-section" id="{NAV}-{BOOK}-{story}" data-toc-title="{0}">
<h2 class="header obs-tn-story-header"><a href="#{NAV}-{BOOK}-{story}" class="header-link">{0}</a></h2>"##,
            encode_html(&title)
        );
        if let Some(rows) = frames.get(&RefKey::Intro) {
            self.intro(rows, &story.to_string());
        }
        for (key, rows) in frames {
            let Some(frame) = key.as_num() else {
                continue;
            };
            let link = format!("{NAV}-{BOOK}-{story}-{frame}");
            let _ = writeln!(
                self.out,
                r##"<div class="section obs-tn-frame-section" id="{link}">
<h3 class="header obs-tn-frame-header"><a href="#{link}" class="header-link">OBS {story}:{frame}</a></h3>"##
            );
            if let Some(found) = self.frame(story, frame) {
                self.frame_text(story, found);
            }
            for row in rows {
                self.note(row, story, frame);
            }
            self.out.push_str("</div>\n");
        }
        self.out.push_str("</div>\n");
    }

    fn questions_story(&mut self, story: &ObsStory) {
        let doc = self.doc;
        let n = story.number;
        let frames = doc.rows.get(&RefKey::Num(n));
        let _ = writeln!(
            self.out,
            r##"<div class="section tq-chapter-section" id="{NAV}-{BOOK}-{n}" data-toc-title="{0}">
<h2 class="header tq-chapter-header"><a href="#{NAV}-{BOOK}-{n}" class="header-link">{0}</a></h2>"##,
            encode_html(&story.title)
        );
        if let Some(rows) = frames.and_then(|f| f.get(&RefKey::Intro)) {
            self.intro(rows, &n.to_string());
        }
        for frame in &story.frames {
            let f = frame.number;
            let link = format!("{NAV}-{BOOK}-{n}-{f}");
            let _ = writeln!(
                self.out,
                r##"<div class="section obs-tq-chapter-frame-section" id="{link}">
<h3 class="header tq-frame-header"><a href="#{link}" class="header-link">{n}:{f}</a></h3>
<span class="header-title">{} :: {n}:{f}</span>"##,
                doc.resource_title
            );
            self.frame_text(n, frame);
            let rows: Vec<&TsvRow> = frames
                .and_then(|fr| fr.get(&RefKey::Num(f)))
                .map(|rows| rows.iter().filter(|r| !r.question().is_empty()).collect())
                .unwrap_or_default();
            if rows.is_empty() {
                self.out.push_str(
                    "<div class=\"article tq-verse-no-content\">\n(There are no questions for this frame)\n</div>\n",
                );
            }
            for row in rows {
                let bridge = match row.parsed_reference() {
                    Some(Reference { verse, .. }) if verse != f.to_string() => {
                        format!(" ({})", encode_html(row.reference()))
                    }
                    _ => String::new(),
                };
                let question_link = format!("{link}-{}", row.id());
                question_entry(&mut self.out, &question_link, row, &bridge, &n.to_string(), BOOK);
            }
            self.out.push_str("</div>\n");
        }
        self.out.push_str("</div>\n");
    }

    fn appendix(&mut self) {
        let Some(academy) = self.doc.academy else {
            return;
        };
        if self.topics.is_empty() {
            return;
        }
        let mut topics: Vec<(&String, &Topic)> = self.topics.iter().collect();
        topics.sort_by_key(|(_, t)| t.title.to_lowercase());
        let mut html = format!(
            r#"<div class="appendex ta section" id="appendex-ta" data-toc-title="{0}">
<div class="article title-page">
<span class="header-title"></span>
<img class="title-logo" src="https://cdn.door43.org/assets/uw-icons/logo-uta-256.png" alt="uta">
<h1 class="header cover-header section-header">{0}</h1>
<h3 class="cover-version">{1}</h3>
</div>
"#,
            encode_html(academy.title),
            encode_html(academy.version),
        );
        for (anchor, topic) in topics {
            let title = encode_html(&topic.title);
            let _ = write!(
                html,
                r##"<div class="article" id="{anchor}" data-toc-title="{title}">
<h2 class="header article-header"><a href="#{anchor}" class="header-link">{title}</a></h2>
<span class="header-title">{} :: {title}</span>
<div class="article-body">
{}
</div>
<div class="back-refs">
<h3>OBS References:</h3>
{}
</div>
</div>
"##,
                academy.title,
                topic.body,
                topic.back_refs.join("; "),
            );
        }
        html.push_str("</div>\n");
        self.out.push_str(&html);
    }
}

/// Render an OBS helps resource.
pub fn render_obs_tsv(doc: &ObsTsvDocument<'_>) -> String {
    let mut renderer = ObsTsvRenderer {
        doc,
        topics: BTreeMap::new(),
        note_count: 0,
        out: String::new(),
    };
    let class = match doc.kind {
        ObsTsvKind::Notes => "obs-tn-book-section",
        ObsTsvKind::Questions => "tq-book-section",
    };
    let _ = writeln!(
        renderer.out,
        r##"<div class="section {class}" id="{NAV}-{BOOK}" data-toc-title="{0}">
<h1 class="header" style="text-align: center"><a href="#{NAV}-{BOOK}" class="header-link">{0}</a></h1>"##,
        encode_html(doc.resource_title)
    );

    if let Some(rows) = doc.rows.get(&RefKey::Front).and_then(|f| f.get(&RefKey::Intro)) {
        let _ = writeln!(
            renderer.out,
            r#"<div class="section obs-front-intro-section" id="{NAV}-{BOOK}-front-intro">"#
        );
        renderer.intro(rows, "front");
        renderer.out.push_str("</div>\n");
    }

    match doc.kind {
        ObsTsvKind::Notes => {
            for (key, frames) in doc.rows {
                if let Some(story) = key.as_num() {
                    renderer.notes_story(story, frames);
                }
            }
        }
        ObsTsvKind::Questions => {
            for story in &doc.stories.stories {
                renderer.questions_story(story);
            }
        }
    }
    renderer.out.push_str("</div>\n");
    renderer.appendix();

    log::info!(
        "rendered {} with {} notes and {} topics",
        doc.resource_title,
        renderer.note_count,
        renderer.topics.len()
    );
    renderer.out
}
