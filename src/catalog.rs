//! Catalog entries and their ingredients.
//!
//! Entries come from the content API as JSON; only the fields the renderers
//! need are modeled, everything else is ignored.

use serde::{Deserialize, Serialize};

use crate::books;
use crate::error::Result;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Repo {
    pub name: String,
    pub full_name: String,
    pub owner: Option<Owner>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Owner {
    pub username: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ingredient {
    pub identifier: String,
    pub path: String,
    pub title: String,
    pub sort: i64,
    pub categories: Vec<String>,
}

impl Ingredient {
    /// Path without the leading `./` or trailing `/`.
    pub fn clean_path(&self) -> &str {
        self.path.trim_start_matches("./").trim_end_matches('/')
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogEntry {
    pub owner: String,
    pub repo: Repo,
    pub name: String,
    pub title: String,
    pub subject: String,
    pub language: String,
    pub language_direction: String,
    pub commit_sha: String,
    pub branch_or_tag_name: String,
    pub abbreviation: String,
    pub metadata_type: String,
    pub ingredients: Vec<Ingredient>,
}

impl CatalogEntry {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Lowercase repository name, the top-level directory of its zip.
    pub fn repo_dir(&self) -> String {
        let name = if self.repo.name.is_empty() { &self.name } else { &self.repo.name };
        name.to_lowercase()
    }

    /// Path of an ingredient inside the repository zip.
    pub fn ingredient_path(&self, ingredient: &Ingredient) -> String {
        match ingredient.clean_path() {
            "" | "." => self.repo_dir(),
            path => format!("{}/{path}", self.repo_dir()),
        }
    }

    /// Abbreviation, or the part of the repo name after the language code.
    pub fn short_name(&self) -> String {
        if !self.abbreviation.is_empty() {
            return self.abbreviation.to_lowercase();
        }
        let name = self.repo_dir();
        match name.split_once('_') {
            Some((_, rest)) => rest.to_string(),
            None => name,
        }
    }

    /// Ingredients in `sort` order.
    pub fn sorted_ingredients(&self) -> Vec<&Ingredient> {
        let mut ingredients: Vec<&Ingredient> = self.ingredients.iter().collect();
        ingredients.sort_by_key(|i| i.sort);
        ingredients
    }
}

/// Bible books that are ingredients of `entry`, in manifest order.
///
/// With a file list, only books whose ingredient path is present count.
pub fn supported_books(entry: &CatalogEntry, file_list: Option<&[&str]>) -> Vec<String> {
    entry
        .ingredients
        .iter()
        .filter(|i| books::is_book(&i.identifier))
        .filter(|i| file_list.is_none_or(|files| files.contains(&i.clean_path())))
        .map(|i| i.identifier.to_lowercase())
        .collect()
}

pub fn find_ingredient<'a>(entry: &'a CatalogEntry, identifier: &str) -> Option<&'a Ingredient> {
    entry
        .ingredients
        .iter()
        .find(|i| i.identifier.eq_ignore_ascii_case(identifier))
}

/// Display title of a book: the ingredient title, else the canonical name.
pub fn book_title(entry: &CatalogEntry, book_id: &str) -> String {
    find_ingredient(entry, book_id)
        .map(|i| i.title.trim())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .or_else(|| books::book(book_id).map(|b| b.name.to_string()))
        .unwrap_or_else(|| book_id.to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENTRY: &str = r#"{
        "owner": "unfoldingWord",
        "repo": {"name": "en_ult", "full_name": "unfoldingWord/en_ult", "stars_count": 3},
        "name": "en_ult",
        "title": "unfoldingWord Literal Text",
        "subject": "Aligned Bible",
        "commit_sha": "abc123",
        "abbreviation": "ult",
        "metadata_type": "rc",
        "ingredients": [
            {"identifier": "tit", "path": "./57-TIT.usfm", "title": "Titus", "sort": 57},
            {"identifier": "gen", "path": "./01-GEN.usfm", "title": "", "sort": 1},
            {"identifier": "frt", "path": "./A0-FRT.usfm", "title": "Front", "sort": 0}
        ]
    }"#;

    #[test]
    fn test_parse_ignores_unknown_fields() {
        let entry = CatalogEntry::from_json(ENTRY).unwrap();
        assert_eq!(entry.repo_dir(), "en_ult");
        assert_eq!(entry.ingredients.len(), 3);
        assert_eq!(entry.short_name(), "ult");
        assert_eq!(entry.ingredient_path(&entry.ingredients[0]), "en_ult/57-TIT.usfm");
    }

    #[test]
    fn test_supported_books() {
        let entry = CatalogEntry::from_json(ENTRY).unwrap();
        assert_eq!(supported_books(&entry, None), vec!["tit", "gen"]);
        let files = ["57-TIT.usfm", "manifest.yaml"];
        assert_eq!(supported_books(&entry, Some(&files)), vec!["tit"]);
    }

    #[test]
    fn test_book_title_fallbacks() {
        let entry = CatalogEntry::from_json(ENTRY).unwrap();
        assert_eq!(book_title(&entry, "tit"), "Titus");
        assert_eq!(book_title(&entry, "gen"), "Genesis");
        assert_eq!(book_title(&entry, "xyz"), "XYZ");
    }

    #[test]
    fn test_sorted_ingredients() {
        let entry = CatalogEntry::from_json(ENTRY).unwrap();
        let ids: Vec<&str> = entry.sorted_ingredients().iter().map(|i| i.identifier.as_str()).collect();
        assert_eq!(ids, ["frt", "gen", "tit"]);
    }
}
