//! rcpreview - Scripture and translation-helps preview renderer

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use rcpreview::cache::{BlobStore, HtmlSections};
use rcpreview::manual::{academy_manuals, words_manuals};
use rcpreview::pipeline::{BookSource, ManualSource, RenderOutput, TargetBible, render_obs};
use rcpreview::{
    AlignOptions, CatalogEntry, Error, FileSet, NotesInputs, ObsHelpsInputs, Occurrence, PreviewConfig,
    QuestionsInputs, QuoteMemo, QuoteSpec, RawBook, RenderRequest, Section, SourceFormat, align_quote, assemble_html,
    normalize, pivot_tsv, render_cached, render_obs_helps, render_translation_notes, render_translation_questions,
};

#[derive(Parser)]
#[command(name = "rcpreview")]
#[command(version, about = "Render Scripture and translation helps to HTML", long_about = None)]
#[command(after_help = "EXAMPLES:
    rcpreview normalize 57-TIT.usfm                 Print the parsed book as JSON
    rcpreview align --origin ugnt.usfm --target ult.usfm --quote δοῦλος --reference 1:1
    rcpreview notes --catalog tn.json --book tit --tn tn_TIT.tsv --target ult=ult.usfm
    rcpreview questions --catalog tq.json --book tit --tsv tq_TIT.tsv --target ult=ult.usfm
    rcpreview obs-helps --catalog obs-tn.json --tsv tn_OBS.tsv --obs obs.json=en_obs.zip")]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse a book and print it as JSON
    Normalize {
        /// USFM file, or a tS project zip with --book
        input: PathBuf,
        /// Book id inside a zip package
        #[arg(long)]
        book: Option<String>,
    },
    /// Align an origin-language quote to a target Bible
    Align {
        #[arg(long)]
        origin: PathBuf,
        #[arg(long)]
        target: PathBuf,
        #[arg(long)]
        quote: String,
        #[arg(long)]
        reference: String,
        #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
        occurrence: i64,
    },
    /// Pivot a TSV file by chapter and verse, adding gateway quotes
    Pivot {
        tsv: PathBuf,
        #[arg(long)]
        origin: Option<PathBuf>,
        /// Target Bible USFM (repeatable)
        #[arg(long)]
        target: Vec<PathBuf>,
    },
    /// Assemble manuals into HTML
    Assemble {
        /// Manual trees as JSON, or a repository zip with --catalog
        input: PathBuf,
        /// Catalog entry JSON of the repository
        #[arg(long)]
        catalog: Option<PathBuf>,
        /// Translation words instead of translation academy
        #[arg(long)]
        words: bool,
    },
    /// Render a translation notes book
    Notes {
        /// Catalog entry JSON of the notes resource
        #[arg(long)]
        catalog: PathBuf,
        #[arg(long)]
        book: String,
        #[arg(long)]
        tn: PathBuf,
        #[arg(long)]
        twl: Option<PathBuf>,
        #[arg(long)]
        origin: Option<PathBuf>,
        /// Target Bible as ABBR=USFM (repeatable)
        #[arg(long)]
        target: Vec<String>,
        /// Translation academy as CATALOG_JSON=ZIP
        #[arg(long)]
        ta: Option<String>,
        /// Translation words as CATALOG_JSON=ZIP
        #[arg(long)]
        tw: Option<String>,
        /// Reuse and store renders in this directory
        #[arg(long)]
        cache_dir: Option<PathBuf>,
    },
    /// Render a translation questions or study questions book
    Questions {
        #[arg(long)]
        catalog: PathBuf,
        #[arg(long)]
        book: String,
        #[arg(long)]
        tsv: PathBuf,
        #[arg(long)]
        origin: Option<PathBuf>,
        /// Target Bible as ABBR=USFM (repeatable)
        #[arg(long)]
        target: Vec<String>,
    },
    /// Render OBS notes or questions against the stories they annotate
    ObsHelps {
        #[arg(long)]
        catalog: PathBuf,
        #[arg(long)]
        tsv: PathBuf,
        /// Open Bible Stories as CATALOG_JSON=ZIP
        #[arg(long)]
        obs: String,
        /// Translation academy as CATALOG_JSON=ZIP
        #[arg(long)]
        ta: Option<String>,
    },
    /// Render Open Bible Stories from a repository zip
    Obs {
        #[arg(long)]
        catalog: PathBuf,
        zip: PathBuf,
    },
}

type CliResult<T> = Result<T, Error>;

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::debug!("{e:?}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> CliResult<String> {
    let config = match &cli.config {
        Some(path) => PreviewConfig::from_json(&fs::read_to_string(path)?)?,
        None => PreviewConfig::default(),
    };

    match cli.command {
        Command::Normalize { input, book } => {
            let source = book_source(&input)?;
            let id = book.as_deref().unwrap_or_default();
            Ok(serde_json::to_string_pretty(&source.parse(id, id))?)
        }
        Command::Align {
            origin,
            target,
            quote,
            reference,
            occurrence,
        } => {
            let spec = QuoteSpec::new(quote, reference, Occurrence::parse(&occurrence.to_string()));
            Ok(align_quote(
                &spec,
                &read_usfm(&origin)?,
                &read_usfm(&target)?,
                &config.align_options(),
            ))
        }
        Command::Pivot { tsv, origin, target } => {
            let origin = origin.as_deref().map(read_usfm).transpose()?;
            let targets = target.iter().map(|p| read_usfm(p)).collect::<CliResult<Vec<_>>>()?;
            let options: AlignOptions = config.align_options();
            let pivot = pivot_tsv(&fs::read_to_string(tsv)?, origin.as_ref(), &targets, &options)?;
            Ok(serde_json::to_string_pretty(&pivot)?)
        }
        Command::Assemble { input, catalog, words } => {
            let manuals: Vec<Section> = match catalog {
                Some(catalog) => {
                    let source = manual_source(&catalog, &input)?;
                    if words {
                        words_manuals(&source.entry, &source.files)?
                    } else {
                        academy_manuals(&source.entry, &source.files)?
                    }
                }
                None => serde_json::from_str(&fs::read_to_string(input)?)?,
            };
            if words {
                rcpreview::html::words_manual_html("Translation Words", &manuals)
            } else {
                Ok(assemble_html(&manuals))
            }
        }
        Command::Notes {
            catalog,
            book,
            tn,
            twl,
            origin,
            target,
            ta,
            tw,
            cache_dir,
        } => {
            let entry = read_catalog(&catalog)?;
            let request = RenderRequest::new(entry, book, config);
            let inputs = NotesInputs {
                tn_tsv: fs::read_to_string(tn)?,
                twl_tsv: twl.map(fs::read_to_string).transpose()?,
                origin: origin.as_deref().map(book_source).transpose()?,
                targets: target.iter().map(|t| target_bible(t)).collect::<CliResult<_>>()?,
                academy: ta.as_deref().map(manual_pair).transpose()?,
                words: tw.as_deref().map(manual_pair).transpose()?,
            };
            let memo = QuoteMemo::new();
            let sections: HtmlSections = match cache_dir {
                Some(dir) => render_cached(&DirStore::new(dir), &request, &inputs, Some(&memo))?.html_sections,
                None => render_translation_notes(&request, &inputs, Some(&memo))?.html_sections,
            };
            Ok(format!("{}{}", sections.cover, sections.body))
        }
        Command::Questions {
            catalog,
            book,
            tsv,
            origin,
            target,
        } => {
            let request = RenderRequest::new(read_catalog(&catalog)?, book, config);
            let inputs = QuestionsInputs {
                tsv: fs::read_to_string(tsv)?,
                origin: origin.as_deref().map(book_source).transpose()?,
                targets: target.iter().map(|t| target_bible(t)).collect::<CliResult<_>>()?,
            };
            Ok(page(render_translation_questions(&request, &inputs)?))
        }
        Command::ObsHelps { catalog, tsv, obs, ta } => {
            let entry = read_catalog(&catalog)?;
            let inputs = ObsHelpsInputs {
                tsv: fs::read_to_string(tsv)?,
                obs: manual_pair(&obs)?,
                academy: ta.as_deref().map(manual_pair).transpose()?,
            };
            Ok(page(render_obs_helps(&entry, &inputs, &config)?))
        }
        Command::Obs { catalog, zip } => {
            let entry = read_catalog(&catalog)?;
            let files = FileSet::from_zip(&fs::read(zip)?)?;
            render_obs(&entry, &files, &config)
        }
    }
}

fn page(output: RenderOutput) -> String {
    format!("{}{}", output.html_sections.cover, output.html_sections.body)
}

fn read_catalog(path: &Path) -> CliResult<CatalogEntry> {
    CatalogEntry::from_json(&fs::read_to_string(path)?)
}

fn read_usfm(path: &Path) -> CliResult<rcpreview::ParsedBook> {
    let text = fs::read_to_string(path)?;
    Ok(normalize(RawBook::Text(&text), SourceFormat::Usfm))
}

/// A USFM file, or a zip package (USFM repository or tS project).
fn book_source(path: &Path) -> CliResult<BookSource> {
    if path.extension().is_some_and(|e| e.eq_ignore_ascii_case("zip")) {
        let files = FileSet::from_zip(&fs::read(path)?)?;
        let format = if files.paths().any(|p| p.ends_with(".usfm")) {
            SourceFormat::Usfm
        } else {
            SourceFormat::TsLegacy
        };
        return Ok(BookSource::Package { files, format });
    }
    Ok(BookSource::Usfm(fs::read_to_string(path)?))
}

fn target_bible(arg: &str) -> CliResult<TargetBible> {
    let (abbreviation, path) = arg
        .split_once('=')
        .ok_or_else(|| Error::NoContent(format!("expected ABBR=PATH, got `{arg}`")))?;
    Ok(TargetBible {
        abbreviation: abbreviation.to_string(),
        source: book_source(Path::new(path))?,
    })
}

fn manual_source(catalog: &Path, zip: &Path) -> CliResult<ManualSource> {
    Ok(ManualSource {
        entry: read_catalog(catalog)?,
        files: FileSet::from_zip(&fs::read(zip)?)?,
    })
}

fn manual_pair(arg: &str) -> CliResult<ManualSource> {
    let (catalog, zip) = arg
        .split_once('=')
        .ok_or_else(|| Error::NoContent(format!("expected CATALOG_JSON=ZIP, got `{arg}`")))?;
    manual_source(Path::new(catalog), Path::new(zip))
}

/// [`BlobStore`] over a local directory; keys become relative paths.
struct DirStore {
    root: PathBuf,
}

impl DirStore {
    fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        key.split('/')
            .filter(|seg| !seg.is_empty() && *seg != "." && *seg != "..")
            .fold(self.root.clone(), |path, seg| path.join(seg))
    }
}

impl BlobStore for DirStore {
    fn get(&self, key: &str) -> CliResult<Option<Vec<u8>>> {
        match fs::read(self.path(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn put(&self, key: &str, bytes: &[u8]) -> CliResult<()> {
        let path = self.path(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, bytes)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dir_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirStore::new(dir.path());
        let key = "u/unfoldingWord/en_tn/v80/tit.json.gzip";
        assert_eq!(store.get(key).unwrap(), None);
        store.put(key, b"payload").unwrap();
        assert_eq!(store.get(key).unwrap().as_deref(), Some(&b"payload"[..]));
        assert!(dir.path().join("u/unfoldingWord/en_tn/v80/tit.json.gzip").exists());
    }

    #[test]
    fn test_dir_store_stays_inside_root() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirStore::new(dir.path());
        assert_eq!(store.path("../../etc/passwd"), dir.path().join("etc").join("passwd"));
    }

    #[test]
    fn test_target_argument() {
        assert!(matches!(target_bible("no-equals"), Err(Error::NoContent(_))));
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from([
            "rcpreview", "align", "--origin", "o.usfm", "--target", "t.usfm", "--quote", "x", "--reference", "1:1",
            "--occurrence", "-1",
        ])
        .unwrap();
        assert!(matches!(cli.command, Command::Align { occurrence: -1, .. }));
    }

    #[test]
    fn test_cli_parses_obs_helps() {
        let cli = Cli::try_parse_from([
            "rcpreview", "obs-helps", "--catalog", "tn.json", "--tsv", "tn_OBS.tsv", "--obs", "obs.json=obs.zip",
        ])
        .unwrap();
        assert!(matches!(cli.command, Command::ObsHelps { ta: None, .. }));
    }
}
