//! Legacy translationStudio (tS) projects.
//!
//! A tS project stores one text file per chunk under `<project>/<CC>/<VV>.txt`,
//! where `CC` is the chapter and `VV` the first verse of the chunk, both
//! zero-padded. The chunks already carry `\v` markers; this module stitches
//! them back into a single USFM document so the regular parser can take over.

use std::collections::BTreeMap;
use std::fmt::Write;

use crate::package::FileSet;
use crate::util::parse_padded;

/// Find the directory that holds the chapter directories.
///
/// Zip downloads wrap the project in a single top-level directory; loose file
/// sets may not.
fn project_root(files: &FileSet) -> String {
    let mut roots = files.paths().filter_map(|path| {
        let (first, rest) = path.split_once('/')?;
        Some((first, rest))
    });
    let Some((first, rest)) = roots.next() else {
        return String::new();
    };
    let top_is_chapter = parse_padded(first).is_some() && !rest.contains('/');
    if top_is_chapter || first == "front" {
        String::new()
    } else {
        first.to_string()
    }
}

/// Book title from `front/title.txt`, then `00/title.txt`.
fn project_title(files: &FileSet, root: &str) -> Option<String> {
    ["front/title.txt", "00/title.txt"]
        .iter()
        .map(|name| join(root, name))
        .find_map(|path| files.get(&path))
        .map(|t| crate::util::collapse_whitespace(t))
        .filter(|t| !t.is_empty())
}

fn join(root: &str, rel: &str) -> String {
    if root.is_empty() {
        rel.to_string()
    } else {
        format!("{root}/{rel}")
    }
}

fn has_chapter_marker(text: &str, chapter: u32) -> bool {
    text.split("\\c ").skip(1).any(|rest| {
        let number = rest.split(char::is_whitespace).next().unwrap_or_default();
        parse_padded(number) == Some(chapter)
    })
}

/// Convert a tS project into USFM.
///
/// `title` is used when the project carries no title file of its own.
/// Returns an empty string when the file set contains no chunk files.
pub fn ts_to_usfm(files: &FileSet, book_id: &str, title: &str) -> String {
    let root = project_root(files);

    // chapter -> first verse -> chunk text
    let mut chunks: BTreeMap<u32, BTreeMap<u32, &str>> = BTreeMap::new();
    for (rel, text) in files.under(&root) {
        let Some((dir, file)) = rel.split_once('/') else {
            continue;
        };
        let Some(stem) = file.strip_suffix(".txt") else {
            continue;
        };
        let (Some(chapter), Some(verse)) = (parse_padded(dir), parse_padded(stem)) else {
            continue;
        };
        // 00 holds front matter such as the book title
        if chapter == 0 || verse == 0 {
            continue;
        }
        chunks.entry(chapter).or_default().insert(verse, text);
    }

    if chunks.is_empty() {
        log::warn!("no chunk files found in tS project for {book_id}");
        return String::new();
    }

    let book_title = project_title(files, &root).unwrap_or_else(|| title.to_string());
    let mut usfm = String::new();
    let _ = writeln!(usfm, "\\id {} {}", book_id.to_uppercase(), title);
    usfm.push_str("\\usfm 3.0\n\\ide UTF-8\n");
    for tag in ["h", "toc1", "toc2", "toc3", "mt"] {
        let _ = writeln!(usfm, "\\{tag} {book_title}");
    }
    usfm.push('\n');

    for (chapter, verses) in &chunks {
        for (i, text) in verses.values().enumerate() {
            usfm.push_str("\\p\n");
            if i == 0 && !has_chapter_marker(text, *chapter) {
                let _ = writeln!(usfm, "\\c {chapter}");
            }
            usfm.push_str(text.trim_end());
            usfm.push('\n');
        }
    }

    log::debug!("stitched {} tS chapters for {book_id}", chunks.len());
    usfm
}
