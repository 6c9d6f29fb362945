//! Rendered-book cache payloads.
//!
//! A rendered book is stored as gzip-compressed JSON under a key derived
//! from owner, repository, ref and book. Where the bytes live is up to the
//! caller: anything implementing [`BlobStore`] will do.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::sync::{PoisonError, RwLock};

use chrono::{SecondsFormat, Utc};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use serde::{Deserialize, Serialize};

use crate::catalog::CatalogEntry;
use crate::error::{Error, Result};

/// Characters escaped inside one key segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'?')
    .add(b'\\');

/// Object-storage key of a cached book: `u/{owner}/{repo}/{ref}/{book}.json.gzip`.
pub fn storage_key(owner: &str, repo: &str, git_ref: &str, book_id: &str) -> String {
    let seg = |s: &str| utf8_percent_encode(s, SEGMENT).to_string();
    format!(
        "u/{}/{}/{}/{}.json.gzip",
        seg(owner),
        seg(repo),
        seg(git_ref),
        seg(book_id)
    )
}

/// The HTML pieces of a rendered book.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HtmlSections {
    pub cover: String,
    pub body: String,
    /// Anything else a front end chose to store alongside.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedBook {
    #[serde(rename = "bookId")]
    pub book_id: String,
    pub preview_version: String,
    pub date_iso: String,
    pub date_unix: i64,
    pub commit_sha: String,
    #[serde(rename = "htmlSections")]
    pub html_sections: HtmlSections,
    #[serde(rename = "catalogEntry")]
    pub catalog_entry: CatalogEntry,
}

impl CachedBook {
    /// Wrap a fresh render, stamped with the current time.
    pub fn new(book_id: &str, preview_version: &str, entry: &CatalogEntry, html_sections: HtmlSections) -> Self {
        let now = Utc::now();
        Self {
            book_id: book_id.to_string(),
            preview_version: preview_version.to_string(),
            date_iso: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            date_unix: now.timestamp_millis(),
            commit_sha: entry.commit_sha.clone(),
            html_sections,
            catalog_entry: entry.clone(),
        }
    }

    /// Serialize to gzip-compressed JSON.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let json = serde_json::to_vec(self)?;
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&json)?;
        Ok(encoder.finish()?)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut json = String::new();
        GzDecoder::new(bytes)
            .read_to_string(&mut json)
            .map_err(|e| Error::Cache(format!("not a gzip payload: {e}")))?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Rendered from this commit by this preview version.
    pub fn is_current(&self, commit_sha: &str, preview_version: &str) -> bool {
        self.commit_sha == commit_sha && self.preview_version == preview_version
    }
}

/// Byte storage addressed by string keys.
pub trait BlobStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
    fn put(&self, key: &str, bytes: &[u8]) -> Result<()>;
}

/// In-memory [`BlobStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.blobs.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl BlobStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let blobs = self.blobs.read().unwrap_or_else(PoisonError::into_inner);
        Ok(blobs.get(key).cloned())
    }

    fn put(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let mut blobs = self.blobs.write().unwrap_or_else(PoisonError::into_inner);
        blobs.insert(key.to_string(), bytes.to_vec());
        Ok(())
    }
}

/// Load a cached book, treating an undecodable payload as absent.
pub fn load_cached(store: &dyn BlobStore, key: &str) -> Result<Option<CachedBook>> {
    let Some(bytes) = store.get(key)? else {
        return Ok(None);
    };
    match CachedBook::decode(&bytes) {
        Ok(book) => Ok(Some(book)),
        Err(e) => {
            log::warn!("ignoring cached book at {key}: {e}");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> CatalogEntry {
        CatalogEntry {
            owner: "unfoldingWord".into(),
            commit_sha: "abc123".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_storage_key() {
        assert_eq!(
            storage_key("unfoldingWord", "en_tn", "v80", "tit"),
            "u/unfoldingWord/en_tn/v80/tit.json.gzip"
        );
        assert_eq!(
            storage_key("me", "my repo", "feature/x", "tit"),
            "u/me/my%20repo/feature%2Fx/tit.json.gzip"
        );
    }

    #[test]
    fn test_encode_decode() {
        let sections = HtmlSections {
            body: "<div>body</div>".into(),
            ..Default::default()
        };
        let book = CachedBook::new("tit", "1.0.0", &entry(), sections);
        let bytes = book.encode().unwrap();
        assert_eq!(&bytes[..2], &[0x1f, 0x8b]);
        let decoded = CachedBook::decode(&bytes).unwrap();
        assert_eq!(decoded, book);
        assert!(decoded.is_current("abc123", "1.0.0"));
        assert!(!decoded.is_current("abc123", "1.0.1"));
        assert!(!decoded.is_current("def456", "1.0.0"));
    }

    #[test]
    fn test_json_field_names() {
        let book = CachedBook::new("tit", "1.0.0", &entry(), HtmlSections::default());
        let json = serde_json::to_value(&book).unwrap();
        assert_eq!(json["bookId"], "tit");
        assert!(json.get("htmlSections").is_some());
        assert!(json["date_iso"].as_str().unwrap().ends_with('Z'));
    }

    #[test]
    fn test_decode_garbage_is_cache_error() {
        assert!(matches!(CachedBook::decode(b"not gzip"), Err(Error::Cache(_))));
    }

    #[test]
    fn test_memory_store_and_load() {
        let store = MemoryStore::new();
        assert!(load_cached(&store, "k").unwrap().is_none());
        store.put("bad", b"junk").unwrap();
        assert!(load_cached(&store, "bad").unwrap().is_none());
        let book = CachedBook::new("tit", "1", &entry(), HtmlSections::default());
        store.put("k", &book.encode().unwrap()).unwrap();
        assert_eq!(load_cached(&store, "k").unwrap(), Some(book));
        assert_eq!(store.len(), 2);
    }
}
