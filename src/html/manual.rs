//! Manual trees flattened to HTML.
//!
//! Translation academy and translation words manuals are trees of sections
//! with article bodies at the leaves (and sometimes at inner nodes). The
//! whole forest is flattened into one HTML string in document order.
//!
//! ## Anchors
//!
//! Every node gets a link of the form `manualId--articleId`; a manual's own
//! root node is `manualId--manualId`. Ids that already contain `--` are
//! taken as complete links.

use std::fmt::Write;

use serde::{Deserialize, Serialize};

use super::escape::{encode_html, slugify};
use crate::error::{Error, Result};

/// Deepest heading level emitted.
pub const MAX_HEADING_DEPTH: usize = 6;

const NO_TITLE: &str = "NO TITLE FOUND!";

/// A node of a manual tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Section {
    #[serde(alias = "link", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub toctitle: Option<String>,
    /// Article body, already HTML.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sections: Vec<Section>,
}

impl Section {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            title: Some(title.into()),
            ..Default::default()
        }
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_sections(mut self, sections: Vec<Section>) -> Self {
        self.sections = sections;
        self
    }

    fn title_or_default(&self) -> &str {
        self.title.as_deref().filter(|t| !t.is_empty()).unwrap_or(NO_TITLE)
    }

    fn toc_title(&self) -> &str {
        self.toctitle
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| self.title_or_default())
    }

    fn has_body(&self) -> bool {
        self.body.as_deref().is_some_and(|b| !b.is_empty())
    }
}

/// Which manual family is being rendered; they differ in element names and
/// anchor prefixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Flavor {
    /// Translation academy: `<article id="ta-…">` / `<section>`.
    #[default]
    Academy,
    /// Translation words: `<div class="article" id="nav-…">`.
    Words,
}

/// Manual id of a root node.
fn manual_id(root: &Section) -> String {
    match root.id.as_deref().filter(|id| !id.is_empty()) {
        Some(id) => id.split("--").next().unwrap_or(id).to_string(),
        None => slugify(root.title_or_default()),
    }
}

fn node_link(node: &Section, manual: &str) -> String {
    match node.id.as_deref().filter(|id| !id.is_empty()) {
        Some(id) if id.contains("--") => id.to_string(),
        Some(id) => format!("{manual}--{id}"),
        None => format!("{manual}--{}", slugify(node.title_or_default())),
    }
}

fn position_class(index: usize, total: usize, prefix: &str) -> String {
    if index == 0 {
        format!("first-{prefix}")
    } else if index + 1 == total {
        format!("last-{prefix}")
    } else {
        String::new()
    }
}

struct Assembler<'a> {
    flavor: Flavor,
    manual_id: String,
    manual_title: &'a str,
    out: String,
}

impl Assembler<'_> {
    fn node(&mut self, node: &Section, index: usize, total: usize, depth: usize, crumbs: &[&str]) {
        let level = depth.min(MAX_HEADING_DEPTH);
        let link = if depth == 1 {
            format!("{0}--{0}", self.manual_id)
        } else {
            node_link(node, &self.manual_id)
        };
        let title = node.title_or_default();
        let toctitle = node.toc_title();

        let mut trail: Vec<&str> = crumbs.to_vec();
        if trail.last() != Some(&toctitle) {
            trail.push(toctitle);
        }
        let header_title = encode_html(&trail.join(" :: "));
        let toc_attr = encode_html(toctitle);
        let title_html = encode_html(title);

        if node.has_body() {
            let class = position_class(index, total, "article");
            let body = node.body.as_deref().unwrap_or_default();
            let (open, anchor, close) = match self.flavor {
                Flavor::Academy => (
                    format!(r#"<article id="ta-{link}" data-nav-id="{link}" class="{class}" data-toc-title="{toc_attr}">"#),
                    format!(r##"<a href="#ta-{link}" data-nav-anchor="{link}" class="header-link">{title_html}</a>"##),
                    "</article>",
                ),
                Flavor::Words => (
                    format!(r#"<div class="article {class}" id="nav-{link}" data-toc-title="{toc_attr}">"#),
                    format!(r##"<a href="#nav-{link}" class="header-link">{title_html}</a>"##),
                    "</div>",
                ),
            };
            let _ = writeln!(self.out, "{open}");
            if title != self.manual_title {
                let _ = writeln!(self.out, r#"<h{level} class="header article-header">{anchor}</h{level}>"#);
            }
            let _ = writeln!(self.out, r#"<span class="header-title">{header_title}</span>"#);
            let _ = writeln!(self.out, "<div class=\"article-body\">\n{body}\n</div>");
            let _ = writeln!(self.out, "{close}");
            if index + 1 < total {
                let _ = writeln!(self.out, r#"<hr class="article-divider divider"></hr>"#);
            }
        }

        if !node.sections.is_empty() {
            let class = format!(
                "{}{}",
                match position_class(index, total, "section") {
                    c if c.is_empty() => c,
                    c => c + " ",
                },
                if depth == 1 { "manual" } else { "subsection" }
            );
            let (open, anchor, close) = match self.flavor {
                Flavor::Academy => (
                    format!(r#"<section id="{link}" class="{class}" data-toc-title="{toc_attr}">"#),
                    format!(r##"<a href="#ta-{link}" data-nav-anchor="{link}" class="header-link">{title_html}</a>"##),
                    "</section>",
                ),
                Flavor::Words => (
                    format!(r#"<div class="section {class}" id="nav-{link}" data-toc-title="{toc_attr}">"#),
                    format!(r##"<a href="#nav-{link}" class="header-link">{title_html}</a>"##),
                    "</div>",
                ),
            };
            let _ = writeln!(self.out, "{open}");
            let _ = writeln!(self.out, r#"<h{level} class="header section-header">{anchor}</h{level}>"#);
            let _ = writeln!(self.out, r#"<span class="header-title">{header_title}</span>"#);
            let count = node.sections.len();
            for (i, child) in node.sections.iter().enumerate() {
                self.node(child, i, count, depth + 1, &trail);
            }
            let _ = writeln!(self.out, "{close}");
        }
    }
}

/// Flatten manuals with the given flavor.
pub fn assemble_html_with(manuals: &[Section], flavor: Flavor) -> String {
    let mut out = String::new();
    let total = manuals.len();
    for (index, manual) in manuals.iter().enumerate() {
        let mut assembler = Assembler {
            flavor,
            manual_id: manual_id(manual),
            manual_title: manual.title_or_default(),
            out: String::new(),
        };
        assembler.node(manual, index, total, 1, &[]);
        out.push_str(&assembler.out);
    }
    out
}

/// Flatten translation academy style manuals into one HTML string.
pub fn assemble_html(manuals: &[Section]) -> String {
    assemble_html_with(manuals, Flavor::Academy)
}

/// Flatten translation words manuals inside the `tw-manual` wrapper.
pub fn words_manual_html(title: &str, manuals: &[Section]) -> Result<String> {
    let inner = assemble_html_with(manuals, Flavor::Words);
    if inner.is_empty() {
        return Err(Error::NoContent(
            "No articles found to generate a TW manual".to_string(),
        ));
    }
    Ok(format!(
        r##"<div class="section tw-manual">
<h1 class="header tw-section-header" id="nav-tw"><a class="header-link" href="#nav-tw">{}</a></h1>
{inner}</div>
"##,
        encode_html(title)
    ))
}
