//! Markdown bodies and their HTML post-processing.
//!
//! Notes, manual articles and stories are written in markdown that links to
//! sibling files (`../03/05.md`, `./figs-metaphor.md`). After rendering,
//! those links are rewritten to in-document anchors.

use std::sync::LazyLock;

use markdown::{Options as MarkdownOptions, to_html_with_options};
use regex_lite::{Captures, Regex};

use super::escape::encode_html;

static BARE_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"https?://(?:www\.)?[-a-zA-Z0-9@:%._+~#=]{1,256}\.[a-zA-Z0-9()]{1,6}\b[-a-zA-Z0-9()@:%_+.~#?&/=]*",
    )
    .unwrap()
});

static EXTERNAL_HREF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(href="http[^"]+")"#).unwrap());

static SEE_ALSO_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\(See: \[\[[^\]]+\]\]\)").unwrap());

// Note links, relative to the note's chapter directory
static SAME_CHAPTER_DOT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"href="\./0*([^/".]+)(?:\.md)?""#).unwrap());
static OTHER_CHAPTER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"href="\.\./0*([^/".]+)/0*([^/".]+)(?:\.md)?""#).unwrap());
static SAME_CHAPTER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"href="0*([^#/".:]+)(?:\.md)?""#).unwrap());
static BOOK_ROOT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"href="/*0*([^#/".:]+)/0*([^/".]+)\.md""#).unwrap());

fn markdown_options() -> MarkdownOptions {
    let mut options = MarkdownOptions::gfm();
    // Resource bodies embed trusted HTML and rc:// links
    options.compile.allow_dangerous_html = true;
    options.compile.allow_dangerous_protocol = true;
    options.compile.gfm_tagfilter = false;
    options
}

/// Render markdown to HTML (GitHub flavored, raw HTML passed through).
pub fn render_markdown(md: &str) -> String {
    to_html_with_options(md, &markdown_options()).unwrap_or_else(|e| {
        log::warn!("markdown rendering failed: {e}");
        format!("<p>{}</p>", encode_html(md))
    })
}

/// Turn bare `http(s)://` URLs into links, skipping URLs already inside an
/// attribute or used as link text.
pub fn linkify(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut last = 0;
    for m in BARE_URL_RE.find_iter(html) {
        let preceded = html[..m.start()].chars().next_back();
        if matches!(preceded, Some('"') | Some('>')) {
            continue;
        }
        out.push_str(&html[last..m.start()]);
        out.push_str(&format!(r#"<a href="{0}">{0}</a>"#, m.as_str()));
        last = m.end();
    }
    out.push_str(&html[last..]);
    out
}

/// Open external links in a new tab.
pub fn external_links_new_tab(html: &str) -> String {
    EXTERNAL_HREF_RE
        .replace_all(html, r#"$1 target="_blank""#)
        .into_owned()
}

/// Demote headings by two levels: `h1` → `h3` … `h4` → `h6`.
pub fn demote_headings(html: &str) -> String {
    let mut html = html.to_string();
    for (from, to) in [(4, 6), (3, 5), (2, 4), (1, 3)] {
        html = html
            .replace(&format!("<h{from}>"), &format!("<h{to}>"))
            .replace(&format!("</h{from}>"), &format!("</h{to}>"));
    }
    html
}

/// Rewrite links between note files to anchors of the form
/// `#<prefix>-<book>-<chapter>-<verse>`.
pub fn rewrite_note_links(html: &str, prefix: &str, book_id: &str, chapter: &str) -> String {
    let same_chapter = |caps: &Captures| {
        format!(
            r##"href="#{prefix}-{book_id}-{chapter}-{0}" data-nav-anchor="{book_id}-{chapter}-{0}""##,
            &caps[1]
        )
    };
    let other_chapter = |caps: &Captures| {
        format!(
            r##"href="#{prefix}-{book_id}-{0}-{1}" data-nav-anchor="{book_id}-{0}-{1}""##,
            &caps[1], &caps[2]
        )
    };

    let html = SAME_CHAPTER_DOT_RE.replace_all(html, same_chapter);
    let html = OTHER_CHAPTER_RE.replace_all(&html, other_chapter);
    let html = SAME_CHAPTER_RE.replace_all(&html, same_chapter);
    BOOK_ROOT_RE.replace_all(&html, other_chapter).into_owned()
}

/// Render a translation note to HTML.
///
/// Literal `\n` sequences and `<br>` become line breaks before rendering;
/// links to other notes become anchors, URLs are linkified and open in a new
/// tab, headings are demoted under the verse heading and the first
/// `(See: [[…]])` trailer is removed.
pub fn note_to_html(note: &str, prefix: &str, book_id: &str, chapter: &str) -> String {
    let md = note.replace("\\n", "\n").replace("<br>", "\n");
    let html = render_markdown(&md);
    let html = rewrite_note_links(&html, prefix, book_id, chapter);
    let html = external_links_new_tab(&linkify(&html));
    let html = demote_headings(&html);
    SEE_ALSO_RE.replace(&html, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_markdown_passes_html() {
        let html = render_markdown("# Title\n\nSome <b>bold</b> text");
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains("<b>bold</b>"));
    }

    #[test]
    fn test_rc_links_survive() {
        let html = render_markdown("[link](rc://*/ta/man/translate/figs-metaphor)");
        assert!(html.contains(r#"href="rc://*/ta/man/translate/figs-metaphor""#));
    }

    #[test]
    fn test_demote_headings() {
        assert_eq!(demote_headings("<h1>a</h1><h2>b</h2><h4>c</h4>"), "<h3>a</h3><h4>b</h4><h6>c</h6>");
    }

    #[test]
    fn test_linkify_skips_existing_links() {
        let html = r#"<a href="https://door43.org">https://door43.org</a> see https://unfoldingword.org/x"#;
        let out = linkify(html);
        assert_eq!(out.matches("<a ").count(), 2);
        assert!(out.ends_with(r#"<a href="https://unfoldingword.org/x">https://unfoldingword.org/x</a>"#));
    }

    #[test]
    fn test_note_links_rewritten() {
        let html = r#"<a href="../03/05.md">x</a> <a href="./07.md">y</a> <a href="09.md">z</a>"#;
        let out = rewrite_note_links(html, "nav", "tit", "1");
        assert!(out.contains(r##"href="#nav-tit-3-5" data-nav-anchor="tit-3-5""##));
        assert!(out.contains(r##"href="#nav-tit-1-7""##));
        assert!(out.contains(r##"href="#nav-tit-1-9""##));
    }

    #[test]
    fn test_note_to_html() {
        let note = "# Heading\\nSee [this](../02/01.md) and https://door43.org (See: [[rc://en/tw/dict/bible/kt/god]])";
        let html = note_to_html(note, "nav", "tit", "1");
        assert!(html.contains("<h3>Heading</h3>"));
        assert!(html.contains(r##"href="#nav-tit-2-1""##));
        assert!(html.contains(r#"href="https://door43.org" target="_blank""#));
        assert!(!html.contains("See: [["));
    }
}
