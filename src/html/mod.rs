//! HTML assembly.
//!
//! Every renderer returns a flat HTML string whose elements carry stable
//! anchors (`id`) and `data-toc-title` attributes, so a print or web preview
//! can build its table of contents and cross references from the markup.

mod escape;
mod manual;
mod markdown;
mod notes;
mod obs;
mod obs_tsv;
mod questions;

pub use escape::{encode_html, slugify};
pub use manual::{Flavor, MAX_HEADING_DEPTH, Section, assemble_html, assemble_html_with, words_manual_html};
pub use markdown::{
    demote_headings, external_links_new_tab, linkify, note_to_html, render_markdown, rewrite_note_links,
};
pub use notes::{Appendix, ArticleIndex, NotesDocument, ScriptureColumn, render_notes_book};
pub use obs::{ObsData, ObsFrame, ObsOptions, ObsStory, STORY_COUNT, parse_obs_story, obs_to_html};
pub use obs_tsv::{ObsTsvDocument, ObsTsvKind, render_obs_tsv};
pub use questions::{QuestionsDocument, render_questions_book};
