//! # rcpreview
//!
//! Renders Scripture and translation helps to HTML for on-screen and print
//! preview.
//!
//! ## Features
//!
//! - Parse USFM (including word alignment) and legacy translationStudio
//!   projects into a uniform [`ParsedBook`]
//! - Align origin-language quotes (Hebrew, Greek) to gateway-language text
//!   by occurrence-indexed word alignment
//! - Pivot translation notes and word-link TSVs by chapter and verse, adding
//!   a gateway quote per target Bible
//! - Assemble translation academy and translation words manuals, notes books
//!   with appendices, and Open Bible Stories into HTML with stable anchors
//!
//! The library performs no network or disk I/O: every entry point takes
//! already-fetched strings, bytes or [`FileSet`]s.
//!
//! ## Quick Start
//!
//! ```
//! use rcpreview::{AlignOptions, Occurrence, QuoteSpec, align_quote, parse_usfm};
//!
//! let origin = parse_usfm("\\id TIT\n\\c 1\n\\v 1 \\w Παῦλος\\w* \\w δοῦλος\\w*\n");
//! let target = parse_usfm(concat!(
//!     "\\id TIT\n\\c 1\n\\v 1 ",
//!     "\\zaln-s |x-occurrence=\"1\" x-occurrences=\"1\" x-content=\"Παῦλος\"\\*\\w Paul\\w*\\zaln-e\\*, ",
//!     "\\zaln-s |x-occurrence=\"1\" x-occurrences=\"1\" x-content=\"δοῦλος\"\\*\\w a\\w* \\w servant\\w*\\zaln-e\\*\n",
//! ));
//!
//! let spec = QuoteSpec::new("δοῦλος", "1:1", Occurrence::Nth(1));
//! assert_eq!(align_quote(&spec, &origin, &target, &AlignOptions::default()), "a servant");
//! ```
//!
//! ## Manuals
//!
//! ```
//! use rcpreview::{Section, assemble_html};
//!
//! let manual = Section::new("a", "A").with_sections(vec![Section::new("a1", "A1").with_body("<p>x</p>")]);
//! let html = assemble_html(&[manual]);
//! assert!(html.contains(r#"id="a--a""#));
//! assert!(html.contains(r#"data-nav-id="a--a1""#));
//! ```

pub mod align;
pub mod books;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod html;
pub mod manual;
pub mod package;
pub mod pipeline;
pub mod scripture;
pub mod tsv;
pub(crate) mod util;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use align::{AlignOptions, DEFAULT_DELIMITER, Occurrence, QuoteSpec, align_quote, insert_unmatched_braces};
pub use cache::{BlobStore, CachedBook, MemoryStore, storage_key};
pub use catalog::CatalogEntry;
pub use config::PreviewConfig;
pub use error::{Error, Result};
pub use html::{Section, assemble_html, render_notes_book};
pub use package::FileSet;
pub use pipeline::{
    NotesInputs, ObsHelpsInputs, QuestionsInputs, RenderRequest, render_cached, render_obs_helps,
    render_translation_notes, render_translation_questions,
};
pub use scripture::{ParsedBook, RawBook, RefKey, SourceFormat, normalize, parse_usfm};
pub use tsv::{Pivot, QuoteMemo, TsvRow, pivot_obs_tsv, pivot_tsv};
