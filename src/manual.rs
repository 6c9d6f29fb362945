//! Translation academy and translation words manuals read from a repository.
//!
//! Both resources are directories of markdown articles. Academy manuals
//! keep one directory per article (`title.md`, `sub-title.md`, `01.md`) and
//! an optional `toc.yaml`; words are grouped in category directories with
//! one file per article.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex_lite::{Captures, Regex};
use serde::Deserialize;

use crate::catalog::CatalogEntry;
use crate::error::{Error, Result};
use crate::html::{Section, external_links_new_tab, linkify, render_markdown};
use crate::package::FileSet;

static TA_SIBLING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"href="\.\./([^/".]+)/*(?:01\.md)?""#).unwrap());
static TA_OTHER_MANUAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"href="\.\./\.\./([^/".]+)/([^/".]+)/*(?:01\.md)?""#).unwrap());

static TW_SAME_CATEGORY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"href="(?:\./)?([^/".:#]+)\.md""#).unwrap());
static TW_OTHER_CATEGORY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"href="\.\./([^/".]+)/+([^/".]+)\.md""#).unwrap());

static FIRST_HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^\s*<(h\d)>(.*?)</h\d>\s*\n?(.*)$").unwrap());

/// Translation words categories, in display order.
pub const WORD_CATEGORIES: [(&str, &str); 3] = [("kt", "Key Terms"), ("names", "Names"), ("other", "Other")];

/// An entry of a manual's `toc.yaml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct TocSection {
    title: String,
    link: String,
    sections: Vec<TocSection>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Toc {
    sections: Vec<TocSection>,
}

#[derive(Debug, Default)]
struct Article {
    title: String,
    subtitle: String,
    body: String,
}

impl Article {
    fn html(&self) -> String {
        if self.subtitle.is_empty() {
            return self.body.clone();
        }
        format!(
            "<div class=\"ta-question\">This page answers the question: <em>{}</em></div>\n{}",
            self.subtitle, self.body
        )
    }
}

fn academy_body(markdown: &str, manual: &str) -> String {
    let html = render_markdown(markdown);
    let html = TA_SIBLING_RE.replace_all(&html, |caps: &Captures| format!(r##"href="#{manual}--{}""##, &caps[1]));
    let html = TA_OTHER_MANUAL_RE.replace_all(&html, r##"href="#$1--$2""##);
    external_links_new_tab(&linkify(&html))
}

fn toc_sections(toc: &[TocSection], manual: &str, articles: &BTreeMap<String, Article>) -> Vec<Section> {
    toc.iter()
        .map(|entry| {
            let mut section = Section {
                toctitle: Some(entry.title.clone()),
                title: Some(entry.title.clone()),
                ..Default::default()
            };
            let link = if entry.link.is_empty() {
                let slug: String = entry
                    .title
                    .split(|c: char| !(c.is_alphanumeric() || c == '_'))
                    .filter(|s| !s.is_empty())
                    .collect::<Vec<_>>()
                    .join("-")
                    .to_lowercase();
                format!("section-{slug}")
            } else {
                if let Some(article) = articles.get(&entry.link) {
                    section.title = Some(article.title.clone());
                    section.body = Some(article.html());
                } else {
                    log::debug!("toc link {manual}/{} has no article", entry.link);
                }
                entry.link.clone()
            };
            section.id = Some(format!("{manual}--{link}"));
            section.sections = toc_sections(&entry.sections, manual, articles);
            section
        })
        .collect()
}

/// Build the translation academy manuals of `entry`, one tree per ingredient.
pub fn academy_manuals(entry: &CatalogEntry, files: &FileSet) -> Result<Vec<Section>> {
    let mut manuals = Vec::new();
    for ingredient in entry.sorted_ingredients() {
        let manual = ingredient.identifier.as_str();
        let root = entry.ingredient_path(ingredient);
        if !files.has_dir(&root) {
            log::warn!("manual given in manifest file does not exist: {manual}");
            continue;
        }

        let mut articles: BTreeMap<String, Article> = BTreeMap::new();
        let mut toc: Option<Toc> = None;
        for (path, text) in files.under(&root) {
            match path.split('/').collect::<Vec<_>>()[..] {
                ["toc.yaml"] => toc = Some(serde_yaml::from_str(text)?),
                [article, file] => {
                    let slot = articles.entry(article.to_string()).or_default();
                    match file {
                        "title.md" => slot.title = text.trim().to_string(),
                        "sub-title.md" => slot.subtitle = text.trim().to_string(),
                        "01.md" => slot.body = academy_body(text, manual),
                        _ => {}
                    }
                }
                _ => {}
            }
        }

        let sections = match toc.filter(|t| !t.sections.is_empty()) {
            Some(toc) => toc_sections(&toc.sections, manual, &articles),
            None => {
                let mut list: Vec<(&String, &Article)> =
                    articles.iter().filter(|(_, a)| !a.body.is_empty()).collect();
                list.sort_by(|a, b| a.1.title.cmp(&b.1.title));
                list.into_iter()
                    .map(|(id, article)| Section {
                        id: Some(format!("{manual}--{id}")),
                        title: Some(article.title.clone()),
                        toctitle: Some(article.title.clone()),
                        body: Some(article.html()),
                        sections: Vec::new(),
                    })
                    .collect()
            }
        };
        log::info!("manual {manual}: {} articles", articles.len());
        manuals.push(Section {
            id: Some(manual.to_string()),
            title: Some(ingredient.title.clone()),
            toctitle: None,
            body: None,
            sections,
        });
    }
    if manuals.is_empty() {
        return Err(Error::NoContent("No manuals found in this resource".to_string()));
    }
    Ok(manuals)
}

fn words_body(markdown: &str, category: &str) -> (String, String) {
    let html = render_markdown(markdown);
    let html = TW_OTHER_CATEGORY_RE.replace_all(&html, r##"href="#$1--$2""##);
    let html = TW_SAME_CATEGORY_RE.replace_all(&html, |caps: &Captures| format!(r##"href="#{category}--{}""##, &caps[1]));
    let html = external_links_new_tab(&linkify(&html));
    if let Some(caps) = FIRST_HEADING_RE.captures(&html) {
        return (caps[2].to_string(), caps[3].to_string());
    }
    (String::new(), html)
}

/// Build the translation words manuals of `entry`, one tree per category.
pub fn words_manuals(entry: &CatalogEntry, files: &FileSet) -> Result<Vec<Section>> {
    let ingredient = crate::catalog::find_ingredient(entry, "bible")
        .ok_or_else(|| Error::NoContent("No bible ingredient in this translation words resource".to_string()))?;
    let root = entry.ingredient_path(ingredient);
    if !files.has_dir(&root) {
        return Err(Error::NoContent(format!(
            "Path given in manifest file does not exist: {}",
            ingredient.path
        )));
    }

    let mut manuals = Vec::new();
    for (category, title) in WORD_CATEGORIES {
        let dir = format!("{root}/{category}");
        if !files.has_dir(&dir) {
            continue;
        }
        let mut articles: Vec<Section> = files
            .under(&dir)
            .filter_map(|(path, text)| {
                let id = path.strip_suffix(".md").filter(|id| !id.contains('/'))?;
                let (title, body) = words_body(text, category);
                Some(Section {
                    id: Some(format!("{category}--{id}")),
                    toctitle: Some(title.clone()),
                    title: Some(title),
                    body: Some(body),
                    sections: Vec::new(),
                })
            })
            .collect();
        articles.sort_by(|a, b| a.title.cmp(&b.title));
        log::info!("words category {category}: {} articles", articles.len());
        manuals.push(Section::new(category, title).with_sections(articles));
    }
    Ok(manuals)
}
