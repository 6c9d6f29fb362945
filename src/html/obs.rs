//! Open Bible Stories.
//!
//! A story file is markdown: a heading, then frames that each start with an
//! image (`…/obs-en-01-02.jpg`) followed by paragraphs, and a final italic
//! line with the Bible reference.

use std::fmt::Write;
use std::sync::LazyLock;

use regex_lite::Regex;
use serde::{Deserialize, Serialize};

use super::escape::encode_html;
use super::markdown::render_markdown;
use crate::util::pad2;

static FRAME_IMAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[[^\]]*\]\(([^)\s]*-(\d+)\.jpg)[^)]*\)").unwrap());

static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^#{1,6}\s+(.*?)\s*#*$").unwrap());

/// Number of stories in a complete OBS project.
pub const STORY_COUNT: u32 = 50;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObsFrame {
    pub number: u32,
    /// Frame text, already HTML.
    pub content: String,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObsStory {
    pub number: u32,
    pub title: String,
    pub frames: Vec<ObsFrame>,
    pub bible_ref: String,
}

impl ObsStory {
    /// Placeholder for a story missing from the project.
    pub fn missing(number: u32) -> Self {
        Self {
            number,
            title: format!("{number}. [STORY NOT FOUND]"),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObsData {
    pub title: String,
    /// Front and back matter, already HTML.
    pub front: String,
    pub back: String,
    pub stories: Vec<ObsStory>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObsOptions {
    pub image_base_url: String,
    /// `360px`, `2160px` or `none` to leave images out.
    pub resolution: String,
}

impl Default for ObsOptions {
    fn default() -> Self {
        Self {
            image_base_url: "https://cdn.door43.org/obs/jpg".to_string(),
            resolution: "360px".to_string(),
        }
    }
}

impl ObsOptions {
    pub(crate) fn shows_images(&self) -> bool {
        self.resolution != "none"
    }

    /// CDN image for a frame.
    pub fn image_url(&self, story: u32, frame: u32) -> String {
        format!(
            "{}/{}/obs-en-{}-{}.jpg",
            self.image_base_url.trim_end_matches('/'),
            self.resolution,
            pad2(story),
            pad2(frame)
        )
    }
}

/// Paragraph wholly wrapped in `_…_` or `*…*`.
fn italic_line(block: &str) -> Option<&str> {
    let block = block.trim();
    ['_', '*'].into_iter().find_map(|mark| {
        let inner = block.strip_prefix(mark)?.strip_suffix(mark)?;
        (!inner.is_empty() && !inner.contains(mark)).then_some(inner.trim())
    })
}

/// Split a story's markdown into its title, frames and Bible reference.
pub fn parse_obs_story(markdown: &str, story_num: u32) -> ObsStory {
    let mut story = ObsStory {
        number: story_num,
        title: format!("{story_num}. [NO TITLE]"),
        ..Default::default()
    };
    let blocks: Vec<&str> = markdown
        .split("\n\n")
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .collect();
    let mut frame: Option<(ObsFrame, String)> = None;
    let last = blocks.len().saturating_sub(1);

    for (i, block) in blocks.iter().enumerate() {
        if let Some(caps) = HEADING_RE.captures(block) {
            story.title = caps[1].to_string();
        } else if let Some(caps) = FRAME_IMAGE_RE.captures(block) {
            if let Some((done, md)) = frame.take() {
                story.frames.push(ObsFrame {
                    content: render_markdown(&md),
                    ..done
                });
            }
            let number = caps[2].parse().unwrap_or(story.frames.len() as u32 + 1);
            let rest = FRAME_IMAGE_RE.replace(block, "").trim().to_string();
            frame = Some((
                ObsFrame {
                    number,
                    content: String::new(),
                    image: Some(caps[1].to_string()),
                },
                rest,
            ));
        } else if i == last
            && let Some(reference) = italic_line(block)
        {
            story.bible_ref = reference.to_string();
        } else if let Some((_, md)) = frame.as_mut() {
            if !md.is_empty() {
                md.push_str("\n\n");
            }
            md.push_str(block);
        }
    }
    if let Some((done, md)) = frame {
        story.frames.push(ObsFrame {
            content: render_markdown(&md),
            ..done
        });
    }
    story
}

/// Render OBS stories with optional front and back matter.
pub fn obs_to_html(data: &ObsData, options: &ObsOptions) -> String {
    let mut html = format!(
        "<div class=\"section\" id=\"obs\" data-toc-title=\"{}\">\n",
        encode_html(&data.title)
    );
    if !data.front.is_empty() {
        let _ = writeln!(
            html,
            "<div class=\"section obs-front-section\" data-toc-title=\"Front Matter\">\n<div class=\"article obs-front-article\" id=\"obs-front-article\">\n{}\n</div>\n</div>",
            data.front
        );
    }

    for story in &data.stories {
        let n = story.number;
        let _ = writeln!(
            html,
            r##"<div class="section story" id="nav-obs-{n}" data-toc-title="{}">
<h1 class="obs-story-title title"><a href="#nav-obs-{n}" class="header-link">{}</a></h1>"##,
            encode_html(&story.title),
            story.title
        );
        let placeholder;
        let frames = if story.frames.is_empty() {
            placeholder = [ObsFrame {
                number: 1,
                content: "<p>[NO FRAMES FOUND]</p>".to_string(),
                image: None,
            }];
            &placeholder[..]
        } else {
            &story.frames[..]
        };
        for frame in frames {
            let f = frame.number;
            let _ = writeln!(html, r#"<div class="article obs-story-frame" id="obs-{n}-{f}">"#);
            if options.shows_images() {
                let _ = writeln!(
                    html,
                    r#"<img src="{}" alt="Frame {n}-{f}">"#,
                    options.image_url(n, f)
                );
            }
            let _ = writeln!(html, "<div class=\"obs-frame-content\">{}</div>\n</div>", frame.content);
        }
        if !story.bible_ref.is_empty() {
            let _ = writeln!(
                html,
                "<div class=\"article obs-story-bible-ref\" id=\"obs-story-bible-ref-{n}\">\n<em>{}</em>\n</div>",
                story.bible_ref
            );
        }
        html.push_str("</div>\n");
    }

    if !data.back.is_empty() {
        let _ = writeln!(
            html,
            "<div class=\"section obs-back-section\" data-toc-title=\"Back Matter\">\n<div class=\"article obs-back-article\" id=\"obs-back-article\">\n{}\n</div>\n</div>",
            data.back
        );
    }
    html.push_str("</div>\n");
    html
}
