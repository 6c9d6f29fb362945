//! Render pipelines.
//!
//! A render is a chain of plain function calls over already-fetched inputs:
//! validate the request, normalize scripture, pivot and annotate the TSV
//! resources, build the manual indexes and assemble HTML. The request and
//! its inputs travel as explicit structs; the only state that may outlive a
//! render is the caller's [`QuoteMemo`].

use crate::books;
use crate::cache::{BlobStore, CachedBook, HtmlSections, load_cached, storage_key};
use crate::catalog::{CatalogEntry, book_title, find_ingredient, supported_books};
use crate::config::PreviewConfig;
use crate::error::{Error, Result};
use crate::html::{
    Appendix, ArticleIndex, NotesDocument, ObsData, ObsStory, ObsTsvDocument, ObsTsvKind, QuestionsDocument,
    STORY_COUNT, ScriptureColumn, encode_html, obs_to_html, parse_obs_story, render_markdown, render_notes_book,
    render_obs_tsv, render_questions_book,
};
use crate::manual::{academy_manuals, words_manuals};
use crate::package::FileSet;
use crate::scripture::{ParsedBook, RawBook, SourceFormat, normalize};
use crate::tsv::{Annotator, Pivot, QuoteMemo, bucket_rows, parse_tsv, pivot_obs_tsv};
use crate::util::pad2;

/// Scripture for one book, as fetched.
#[derive(Debug, Clone)]
pub enum BookSource {
    Usfm(String),
    /// A whole resource package; the book's file is found by id.
    Package { files: FileSet, format: SourceFormat },
}

impl BookSource {
    pub fn parse(&self, book_id: &str, title: &str) -> ParsedBook {
        match self {
            BookSource::Usfm(text) => normalize(RawBook::Text(text.as_str()), SourceFormat::Usfm),
            BookSource::Package { files, format } => normalize(
                RawBook::Files {
                    files,
                    book_id,
                    title,
                },
                *format,
            ),
        }
    }
}

/// A gateway Bible shown next to the notes.
#[derive(Debug, Clone)]
pub struct TargetBible {
    /// Short name shown in headings (`ult`, `ust`).
    pub abbreviation: String,
    pub source: BookSource,
}

/// A TA, TW or OBS repository read from a package.
#[derive(Debug, Clone)]
pub struct ManualSource {
    pub entry: CatalogEntry,
    pub files: FileSet,
}

/// What to render.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    /// Catalog entry of the resource being rendered.
    pub entry: CatalogEntry,
    pub book_id: String,
    pub config: PreviewConfig,
}

impl RenderRequest {
    pub fn new(entry: CatalogEntry, book_id: impl Into<String>, config: PreviewConfig) -> Self {
        Self {
            entry,
            book_id: book_id.into().to_lowercase(),
            config,
        }
    }

    /// Where a render of this request is cached.
    pub fn storage_key(&self) -> String {
        let git_ref = if self.entry.branch_or_tag_name.is_empty() {
            &self.entry.commit_sha
        } else {
            &self.entry.branch_or_tag_name
        };
        storage_key(&self.entry.owner, &self.entry.repo_dir(), git_ref, &self.book_id)
    }

    fn validate_book(&self) -> Result<()> {
        let supported = supported_books(&self.entry, None);
        if supported.is_empty() {
            return Err(Error::NoBooks);
        }
        if !supported.contains(&self.book_id) {
            return Err(Error::BookNotSupported(self.book_id.clone()));
        }
        Ok(())
    }
}

/// Already-resolved inputs of a translation notes render.
#[derive(Debug, Clone, Default)]
pub struct NotesInputs {
    pub tn_tsv: String,
    pub twl_tsv: Option<String>,
    pub origin: Option<BookSource>,
    pub targets: Vec<TargetBible>,
    pub academy: Option<ManualSource>,
    pub words: Option<ManualSource>,
}

/// Already-resolved inputs of a translation questions (or study questions)
/// render.
#[derive(Debug, Clone, Default)]
pub struct QuestionsInputs {
    pub tsv: String,
    /// Only needed when the rows quote the origin text.
    pub origin: Option<BookSource>,
    pub targets: Vec<TargetBible>,
}

/// Already-resolved inputs of an OBS notes or questions render.
#[derive(Debug, Clone)]
pub struct ObsHelpsInputs {
    pub tsv: String,
    /// The Open Bible Stories repository the rows refer to.
    pub obs: ManualSource,
    pub academy: Option<ManualSource>,
}

/// Result of a render.
#[derive(Debug, Clone)]
pub struct RenderOutput {
    pub book_id: String,
    pub html_sections: HtmlSections,
    pub notes: Pivot,
    pub word_links: Option<Pivot>,
}

fn cover_html(entry: &CatalogEntry, book_title: &str) -> String {
    format!(
        "<h1 class=\"cover-header section-header\">{}</h1>\n<h2 class=\"cover-book-title\">{}</h2>\n<h3 class=\"cover-version\">{}</h3>\n",
        encode_html(&entry.title),
        encode_html(book_title),
        encode_html(&entry.branch_or_tag_name),
    )
}

fn annotated_pivot(
    text: &str,
    origin: Option<&ParsedBook>,
    targets: &[ParsedBook],
    config: &PreviewConfig,
    memo: Option<&QuoteMemo>,
) -> Result<Pivot> {
    let mut pivot = bucket_rows(parse_tsv(text)?);
    let annotator = Annotator::new(origin, targets).with_options(config.align_options());
    match memo {
        Some(memo) => annotator.with_memo(memo).annotate(&mut pivot),
        None => annotator.annotate(&mut pivot),
    }
    Ok(pivot)
}

/// Index a manual resource; a broken resource only costs its appendix.
fn manual_index(
    source: Option<&ManualSource>,
    build: fn(&CatalogEntry, &FileSet) -> Result<Vec<crate::html::Section>>,
) -> Option<(ArticleIndex, &CatalogEntry)> {
    let source = source?;
    match build(&source.entry, &source.files) {
        Ok(manuals) => Some((ArticleIndex::from_sections(&manuals), &source.entry)),
        Err(e) => {
            log::warn!("skipping appendix for {}: {e}", source.entry.title);
            None
        }
    }
}

fn appendix<'a>(index: &'a (ArticleIndex, &'a CatalogEntry)) -> Appendix<'a> {
    let (articles, entry) = index;
    Appendix {
        title: &entry.title,
        version: &entry.branch_or_tag_name,
        articles,
    }
}

/// Render one book of a translation notes resource.
pub fn render_translation_notes(
    request: &RenderRequest,
    inputs: &NotesInputs,
    memo: Option<&QuoteMemo>,
) -> Result<RenderOutput> {
    request.validate_book()?;
    let book_id = request.book_id.as_str();
    if inputs.tn_tsv.trim().is_empty() {
        return Err(Error::BookNotSupported(book_id.to_string()));
    }
    let title = book_title(&request.entry, book_id);
    log::info!("rendering {} for {book_id}", request.entry.title);

    let origin = inputs.origin.as_ref().map(|o| o.parse(book_id, &title));
    let targets: Vec<ParsedBook> = inputs.targets.iter().map(|t| t.source.parse(book_id, &title)).collect();

    let notes = annotated_pivot(&inputs.tn_tsv, origin.as_ref(), &targets, &request.config, memo)?;
    let word_links = inputs
        .twl_tsv
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .map(|t| annotated_pivot(t, origin.as_ref(), &targets, &request.config, memo))
        .transpose()?;

    let academy = manual_index(inputs.academy.as_ref(), academy_manuals);
    let words = manual_index(inputs.words.as_ref(), words_manuals);
    let columns = target_columns(&inputs.targets, &targets);

    let doc = NotesDocument {
        book_id,
        book_title: &title,
        resource_title: &request.entry.title,
        notes: &notes,
        word_links: word_links.as_ref(),
        scripture: &columns,
        academy: academy.as_ref().map(appendix),
        words: words.as_ref().map(appendix),
        delimiter: &request.config.quote_token_delimiter,
    };
    let body = render_notes_book(&doc);

    Ok(RenderOutput {
        book_id: book_id.to_string(),
        html_sections: HtmlSections {
            cover: cover_html(&request.entry, &title),
            body,
            ..Default::default()
        },
        notes,
        word_links,
    })
}

fn target_columns<'a>(targets: &'a [TargetBible], books: &'a [ParsedBook]) -> Vec<ScriptureColumn<'a>> {
    targets
        .iter()
        .zip(books)
        .map(|(target, book)| ScriptureColumn {
            abbreviation: &target.abbreviation,
            book,
        })
        .collect()
}

/// Render one book of a translation questions or study questions resource.
pub fn render_translation_questions(request: &RenderRequest, inputs: &QuestionsInputs) -> Result<RenderOutput> {
    request.validate_book()?;
    let book_id = request.book_id.as_str();
    if inputs.tsv.trim().is_empty() {
        return Err(Error::BookNotSupported(book_id.to_string()));
    }
    let title = book_title(&request.entry, book_id);
    log::info!("rendering {} for {book_id}", request.entry.title);

    let origin = inputs.origin.as_ref().map(|o| o.parse(book_id, &title));
    let targets: Vec<ParsedBook> = inputs.targets.iter().map(|t| t.source.parse(book_id, &title)).collect();
    let questions = annotated_pivot(&inputs.tsv, origin.as_ref(), &targets, &request.config, None)?;
    let columns = target_columns(&inputs.targets, &targets);

    let body = render_questions_book(&QuestionsDocument {
        book_id,
        book_title: &title,
        resource_title: &request.entry.title,
        questions: &questions,
        scripture: &columns,
    });

    Ok(RenderOutput {
        book_id: book_id.to_string(),
        html_sections: HtmlSections {
            cover: cover_html(&request.entry, &title),
            body,
            ..Default::default()
        },
        notes: questions,
        word_links: None,
    })
}

/// Render an OBS translation notes, study notes, translation questions or
/// study questions resource.
pub fn render_obs_helps(entry: &CatalogEntry, inputs: &ObsHelpsInputs, config: &PreviewConfig) -> Result<RenderOutput> {
    if inputs.tsv.trim().is_empty() {
        return Err(Error::NoContent(format!("Unable to get content for {} from DCS", entry.title)));
    }
    let rows = pivot_obs_tsv(&inputs.tsv)?;
    let stories = obs_data(&inputs.obs.entry, &inputs.obs.files)?;
    let academy = manual_index(inputs.academy.as_ref(), academy_manuals);
    let kind = ObsTsvKind::detect(&rows);
    log::info!("rendering {} as {kind:?}", entry.title);

    let options = config.obs_options();
    let body = render_obs_tsv(&ObsTsvDocument {
        resource_title: &entry.title,
        kind,
        rows: &rows,
        stories: &stories,
        options: &options,
        academy: academy.as_ref().map(appendix),
    });

    Ok(RenderOutput {
        book_id: "obs".to_string(),
        html_sections: HtmlSections {
            cover: cover_html(entry, &stories.title),
            body,
            ..Default::default()
        },
        notes: rows,
        word_links: None,
    })
}

/// Return the cached render of `request` when it is current, otherwise
/// render it and store the result.
pub fn render_cached(
    store: &dyn BlobStore,
    request: &RenderRequest,
    inputs: &NotesInputs,
    memo: Option<&QuoteMemo>,
) -> Result<CachedBook> {
    let key = request.storage_key();
    let version = &request.config.preview_version;
    if let Some(cached) = load_cached(store, &key)?
        && cached.is_current(&request.entry.commit_sha, version)
    {
        log::info!("using cached render at {key}");
        return Ok(cached);
    }

    let output = render_translation_notes(request, inputs, memo)?;
    let book = CachedBook::new(&output.book_id, version, &request.entry, output.html_sections);
    store.put(&key, &book.encode()?)?;
    log::info!("stored render at {key}");
    Ok(book)
}

/// Read Open Bible Stories from a repository package.
///
/// Markdown projects keep one file per story (`01.md`); tS projects keep a
/// directory per story with `title.txt`, `reference.txt` and one text file
/// per frame.
pub fn obs_data(entry: &CatalogEntry, files: &FileSet) -> Result<ObsData> {
    let ingredient = find_ingredient(entry, "obs")
        .ok_or_else(|| Error::NoContent("Unable to find an obs project in the manifest".to_string()))?;
    let root = entry.ingredient_path(ingredient);
    let path = |rel: &str| format!("{root}/{rel}");
    let mut data = ObsData {
        title: entry.title.clone(),
        ..Default::default()
    };

    if entry.metadata_type == "ts" {
        if let Some(title) = files.get(&path("front/title.txt")) {
            data.title = title.trim().to_string();
        }
        for n in 1..=STORY_COUNT {
            let dir = path(&pad2(n));
            if !files.has_dir(&dir) {
                data.stories.push(ObsStory::missing(n));
                continue;
            }
            let mut story = ObsStory {
                number: n,
                title: format!("{n}. [NO TITLE]"),
                ..Default::default()
            };
            if let Some(title) = files.get(&format!("{dir}/title.txt")) {
                story.title = title.trim().to_string();
            }
            if let Some(reference) = files.get(&format!("{dir}/reference.txt")) {
                story.bible_ref = reference.trim().to_string();
            }
            let mut frame = 1;
            while let Some(text) = files.get(&format!("{dir}/{}.txt", pad2(frame))) {
                story.frames.push(crate::html::ObsFrame {
                    number: frame,
                    content: format!("<p>{}</p>", text.trim()),
                    image: None,
                });
                frame += 1;
            }
            data.stories.push(story);
        }
    } else {
        let matter = |names: [&str; 2]| {
            names
                .into_iter()
                .find_map(|name| files.get(&path(name)))
                .map(render_markdown)
                .unwrap_or_default()
        };
        data.front = matter(["front.md", "front/intro.md"]);
        data.back = matter(["back.md", "back/intro.md"]);
        for n in 1..=STORY_COUNT {
            let story = match files.get(&path(&format!("{}.md", pad2(n)))) {
                Some(markdown) => parse_obs_story(markdown, n),
                None => ObsStory::missing(n),
            };
            data.stories.push(story);
        }
    }

    if data.stories.iter().all(|s| s.frames.is_empty()) {
        return Err(Error::NoContent("No stories found in this resource".to_string()));
    }
    Ok(data)
}

/// Render Open Bible Stories to HTML.
pub fn render_obs(entry: &CatalogEntry, files: &FileSet, config: &PreviewConfig) -> Result<String> {
    let data = obs_data(entry, files)?;
    Ok(obs_to_html(&data, &config.obs_options()))
}

/// Name of the origin-language Bible a book's quotes come from.
pub fn origin_subject(book_id: &str) -> Option<&'static str> {
    books::book(book_id).map(|b| b.testament.origin_subject())
}
