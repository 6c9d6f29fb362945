//! HTML assembly tests: manual flattening and full notes and questions book
//! renders.

use std::fs;

use proptest::prelude::*;
use rcpreview::pipeline::{BookSource, ManualSource, TargetBible};
use rcpreview::{
    CatalogEntry, Error, FileSet, NotesInputs, PreviewConfig, QuestionsInputs, RenderRequest, Section, assemble_html,
    render_translation_notes, render_translation_questions,
};

const FIXTURES_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures");

fn fixture(name: &str) -> String {
    fs::read_to_string(format!("{FIXTURES_DIR}/{name}")).unwrap()
}

fn entry(json: &str) -> CatalogEntry {
    CatalogEntry::from_json(json).unwrap()
}

// ============================================================================
// Manual Assembly
// ============================================================================

#[test]
fn test_two_level_manual() {
    let manual = Section::new("a", "A").with_sections(vec![Section::new("a1", "A1").with_body("<p>x</p>")]);
    let html = assemble_html(&[manual]);
    assert!(html.contains(r#"<section id="a--a""#));
    assert!(html.contains(r#"<article id="ta-a--a1" data-nav-id="a--a1""#));
    assert!(html.contains(r#"<span class="header-title">A :: A1</span>"#));
}

#[test]
fn test_manuals_keep_input_order() {
    let manuals = [
        Section::new("b", "B").with_sections(vec![Section::new("b1", "B1").with_body("1")]),
        Section::new("a", "A").with_sections(vec![Section::new("a1", "A1").with_body("2")]),
    ];
    let html = assemble_html(&manuals);
    assert!(html.find("b--b1").unwrap() < html.find("a--a1").unwrap());
}

fn chain(depth: usize) -> Section {
    let mut node = Section::new(format!("n{depth}"), format!("N{depth}")).with_body("leaf");
    for level in (1..depth).rev() {
        node = Section::new(format!("n{level}"), format!("N{level}")).with_sections(vec![node]);
    }
    node
}

proptest! {
    #[test]
    fn prop_heading_depth_is_capped(depth in 1usize..=9) {
        let html = assemble_html(&[chain(depth)]);
        prop_assert!(!html.contains("<h7"));
        prop_assert!(!html.contains("<h8"));
        prop_assert!(html.contains("leaf"));
        if depth >= 6 {
            prop_assert!(html.contains("<h6"));
        }
    }
}

// ============================================================================
// Notes Book
// ============================================================================

fn request() -> RenderRequest {
    let tn = entry(
        r#"{"owner": "unfoldingWord", "repo": {"name": "en_tn"}, "title": "unfoldingWord Translation Notes",
            "commit_sha": "0a1b2c", "branch_or_tag_name": "v80",
            "ingredients": [{"identifier": "gen", "path": "./tn_GEN.tsv", "title": "Genesis"}]}"#,
    );
    RenderRequest::new(tn, "GEN", PreviewConfig::default())
}

fn academy() -> ManualSource {
    ManualSource {
        entry: entry(
            r#"{"repo": {"name": "en_ta"}, "title": "unfoldingWord Translation Academy", "branch_or_tag_name": "v80",
                "ingredients": [{"identifier": "translate", "path": "./translate", "title": "Translation Manual"}]}"#,
        ),
        files: [
            ("en_ta/translate/figs-idiom/title.md", "Idiom"),
            ("en_ta/translate/figs-idiom/sub-title.md", "What is an idiom?"),
            ("en_ta/translate/figs-idiom/01.md", "An idiom is a group of words."),
        ]
        .into_iter()
        .collect(),
    }
}

fn words() -> ManualSource {
    ManualSource {
        entry: entry(
            r#"{"repo": {"name": "en_tw"}, "title": "unfoldingWord Translation Words", "branch_or_tag_name": "v80",
                "ingredients": [{"identifier": "bible", "path": "./bible"}]}"#,
        ),
        files: [(
            "en_tw/bible/kt/god.md",
            "# God\n\nThe creator. See [[rc://*/ta/man/translate/figs-idiom]].",
        )]
        .into_iter()
        .collect::<FileSet>(),
    }
}

fn inputs() -> NotesInputs {
    NotesInputs {
        tn_tsv: fixture("en_tn_GEN.tsv"),
        twl_tsv: Some(fixture("en_twl_GEN.tsv")),
        origin: Some(BookSource::Usfm(fixture("gen_1_uhb.usfm"))),
        targets: vec![TargetBible {
            abbreviation: "ult".to_string(),
            source: BookSource::Usfm(fixture("gen_1_ult.usfm")),
        }],
        academy: Some(academy()),
        words: Some(words()),
    }
}

fn render() -> String {
    let output = render_translation_notes(&request(), &inputs(), None).unwrap();
    assert_eq!(output.book_id, "gen");
    assert!(output.html_sections.cover.contains("Genesis"));
    output.html_sections.body
}

#[test]
fn test_notes_anchors() {
    let html = render();
    for id in [
        "nav-gen",
        "nav-gen-front-intro",
        "nav-gen-1",
        "nav-gen-1-intro",
        "nav-gen-1-1",
        "nav-gen-1-1-ult",
        "nav-gen-1-1-r001",
        "nav-gen-1-1-r006",
        "nav-gen-1-2-r004",
        "twl-gen-1-1",
    ] {
        assert!(html.contains(&format!(r#"id="{id}""#)), "missing anchor {id}");
    }
    // dropped for having no ID
    assert_eq!(html.matches("This row has no ID").count(), 0);
}

#[test]
fn test_notes_quote_headings() {
    let html = render();
    assert!(html.contains(">In the beginning (ULT)</a>"));
    assert!(html.contains(">In the beginning … the earth (ULT)</a>"));
    assert!(html.contains(">was (1:1-2) (ULT)</a>"));
    assert!(html.contains(r#"<span style="color: red">"שָׁלוֹם" (ORIG QUOTE)</span> (ULT)"#));
}

#[test]
fn test_notes_scripture_and_intro() {
    let html = render();
    assert!(html.contains("In the beginning, God created the heavens and the earth."));
    assert!(html.contains("<h3>Introduction to Genesis</h3>"));
    assert!(html.contains("<h3>Genesis 1 General Notes</h3>"));
}

#[test]
fn test_notes_appendices() {
    let html = render();
    assert!(html.contains(r#"id="appendex-ta""#));
    assert!(html.contains(r#"<div class="article" id="ta--translate--figs-idiom""#));
    assert!(html.contains("This page answers the question: <em>What is an idiom?</em>"));
    assert!(html.contains(r##"<a href="#nav-gen-1-1-r001">1:1</a>"##));

    assert!(html.contains(r#"id="appendex-tw""#));
    assert!(html.contains(r#"<div class="article" id="tw--bible--kt--god""#));
    assert!(html.contains(r##"<a href="#tw--bible--kt--god">God</a>"##));
    assert!(html.contains(r##"href="#tw--bible--kt--god""##));
    assert!(html.contains(r##"<a href="#nav-gen-1-1">1:1</a>; <a href="#nav-gen-1-2-r004">1:2</a>"##));
    assert!(html.contains("TW ARTICLE FOR other :: create NOT FOUND!"));
    assert!(!html.contains("[[rc://"));
    assert!(!html.contains(r#"href="rc://"#));
}

#[test]
fn test_appendix_article_is_listed_once() {
    let html = render();
    assert_eq!(html.matches(r#"id="ta--translate--figs-idiom""#).count(), 1);
}

#[test]
fn test_notes_without_manuals() {
    let inputs = NotesInputs {
        academy: None,
        words: None,
        ..inputs()
    };
    let html = render_translation_notes(&request(), &inputs, None).unwrap().html_sections.body;
    assert!(!html.contains("appendex-ta"));
    assert!(!html.contains("appendex-tw"));
    assert!(html.contains("[[rc://*/ta/man/translate/figs-idiom]]"));
}

#[test]
fn test_unsupported_book() {
    let request = RenderRequest::new(request().entry, "exo", PreviewConfig::default());
    let err = render_translation_notes(&request, &inputs(), None).unwrap_err();
    assert!(matches!(err, Error::BookNotSupported(ref book) if book == "exo"));
}

// ============================================================================
// Questions Book
// ============================================================================

fn render_questions() -> String {
    let mut request = request();
    request.entry.title = "unfoldingWord Translation Questions".into();
    let inputs = QuestionsInputs {
        tsv: fixture("en_tq_GEN.tsv"),
        targets: inputs().targets,
        ..Default::default()
    };
    render_translation_questions(&request, &inputs).unwrap().html_sections.body
}

#[test]
fn test_questions_anchors() {
    let html = render_questions();
    for id in ["nav-gen", "nav-gen-1", "nav-gen-1-1", "nav-gen-1-1-ult", "nav-gen-1-1-q001", "nav-gen-1-2-q003"] {
        assert!(html.contains(&format!(r#"id="{id}""#)), "missing anchor {id}");
    }
    assert!(html.contains("unfoldingWord Translation Questions - Genesis"));
}

#[test]
fn test_questions_keep_row_order() {
    let html = render_questions();
    assert!(html.find("nav-gen-1-1-q001").unwrap() < html.find("nav-gen-1-1-q002").unwrap());
    assert!(html.contains(">What was the earth like? (1:2-3)</a>"));
    assert!(html.contains("<p>In the beginning.</p>"));
}
