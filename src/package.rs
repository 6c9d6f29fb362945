//! In-memory file sets for resource packages.
//!
//! Resource repositories arrive as zip archives (tS projects, translation
//! academy and translation words repos). The caller downloads the bytes;
//! [`FileSet::from_zip`] turns them into a path → text map the rest of the
//! pipeline can query without touching the filesystem.

use std::collections::{BTreeMap, BTreeSet};
use std::io::{Cursor, Read, Seek};

use zip::ZipArchive;

use crate::error::Result;
use crate::util::decode_text;

/// A set of text files keyed by their path inside the package.
#[derive(Debug, Clone, Default)]
pub struct FileSet {
    files: BTreeMap<String, String>,
    dirs: BTreeSet<String>,
}

impl FileSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read every file of an in-memory zip archive.
    pub fn from_zip(bytes: &[u8]) -> Result<Self> {
        Self::from_reader(Cursor::new(bytes))
    }

    /// Read every file from any [`Read`] + [`Seek`] zip source.
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)?;
        let mut set = Self::new();

        for i in 0..archive.len() {
            let mut entry = archive.by_index(i)?;
            let name = entry.name().to_string();
            if entry.is_dir() {
                set.add_dir(&name);
                continue;
            }
            let mut data = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut data)?;
            set.insert(name, decode_text(&data).into_owned());
        }

        log::debug!("read {} files from package", set.len());
        Ok(set)
    }

    /// Add a file, registering its parent directories.
    pub fn insert(&mut self, path: impl Into<String>, text: impl Into<String>) {
        let path = path.into();
        if let Some((parent, _)) = path.rsplit_once('/') {
            self.insert_dir_chain(parent);
        }
        self.files.insert(path, text.into());
    }

    fn add_dir(&mut self, path: &str) {
        let path = path.trim_end_matches('/');
        if !path.is_empty() {
            self.insert_dir_chain(path);
        }
    }

    fn insert_dir_chain(&mut self, path: &str) {
        let mut dir = path;
        self.dirs.insert(dir.to_string());
        while let Some((parent, _)) = dir.rsplit_once('/') {
            self.dirs.insert(parent.to_string());
            dir = parent;
        }
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.files.get(path).map(String::as_str)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    pub fn has_dir(&self, path: &str) -> bool {
        self.dirs.contains(path.trim_end_matches('/'))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    /// Files below `root`, yielded as (path relative to root, text).
    pub fn under<'a>(&'a self, root: &'a str) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        let root = root.trim_end_matches('/');
        self.files.iter().filter_map(move |(path, text)| {
            let rel = if root.is_empty() {
                Some(path.as_str())
            } else {
                path.strip_prefix(root).and_then(|p| p.strip_prefix('/'))
            };
            rel.map(|rel| (rel, text.as_str()))
        })
    }
}

impl<P: Into<String>, T: Into<String>> FromIterator<(P, T)> for FileSet {
    fn from_iter<I: IntoIterator<Item = (P, T)>>(iter: I) -> Self {
        let mut set = FileSet::new();
        for (path, text) in iter {
            set.insert(path, text);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn zip_bytes(files: &[(&str, &str)]) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut buf);
            let options = zip::write::SimpleFileOptions::default();
            writer.add_directory("en_ta/", options).unwrap();
            for (name, text) in files {
                writer.start_file(*name, options).unwrap();
                writer.write_all(text.as_bytes()).unwrap();
            }
            writer.finish().unwrap();
        }
        buf.into_inner()
    }

    #[test]
    fn test_from_zip() {
        let bytes = zip_bytes(&[("en_ta/translate/toc.yaml", "title: x"), ("en_ta/intro/x.md", "# X")]);
        let set = FileSet::from_zip(&bytes).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.get("en_ta/translate/toc.yaml"), Some("title: x"));
        assert!(set.has_dir("en_ta"));
        assert!(set.has_dir("en_ta/translate/"));
    }

    #[test]
    fn test_under_strips_root() {
        let set: FileSet = [("gen/01/01.txt", "a"), ("gen/01/02.txt", "b"), ("other/x", "c")]
            .into_iter()
            .collect();
        let rel: Vec<_> = set.under("gen").map(|(p, _)| p).collect();
        assert_eq!(rel, vec!["01/01.txt", "01/02.txt"]);
        assert!(set.has_dir("gen/01"));
    }
}
