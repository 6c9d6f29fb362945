//! Content-addressed memo for aligned quotes.
//!
//! Alignment is the expensive step of a notes render and the same quote is
//! aligned again on every preview of an unchanged book. Keys hash every
//! input of [`align_quote`](crate::align::align_quote), including the
//! fingerprints of both books, so a stale entry can never be returned for
//! changed text.

use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock};

use crate::align::QuoteSpec;
use crate::error::Result;

/// Thread-safe quote memo. The first writer for a key wins.
#[derive(Debug, Default)]
pub struct QuoteMemo {
    entries: RwLock<HashMap<String, String>>,
}

impl QuoteMemo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Memo key for aligning `spec` against target book `target_index`.
    pub fn key(
        spec: &QuoteSpec,
        target_index: usize,
        delimiter: &str,
        origin_fingerprint: &str,
        target_fingerprint: &str,
    ) -> String {
        let mut hasher = sha1_smol::Sha1::new();
        let occurrence = spec.occurrence.as_i64().to_string();
        let index = target_index.to_string();
        let fields = [
            spec.quote.as_str(),
            spec.reference.as_str(),
            index.as_str(),
            occurrence.as_str(),
            delimiter,
            origin_fingerprint,
            target_fingerprint,
        ];
        for field in fields {
            hasher.update(field.as_bytes());
            hasher.update(b"\x1f");
        }
        hasher.digest().to_string()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Store `value` unless the key is already present; returns the stored value.
    pub fn insert_if_absent(&self, key: String, value: String) -> String {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key)
            .or_insert(value)
            .clone()
    }

    /// Return the memoized value, computing and storing it on a miss.
    ///
    /// The lock is not held while computing; concurrent misses may compute
    /// twice and the first insert is kept.
    pub fn get_or_compute(&self, key: String, compute: impl FnOnce() -> String) -> String {
        if let Some(hit) = self.get(&key) {
            return hit;
        }
        let value = compute();
        self.insert_if_absent(key, value)
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of all entries, sorted by key.
    pub fn entries(&self) -> BTreeMap<String, String> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn from_entries(entries: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            entries: RwLock::new(entries.into_iter().collect()),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.entries())?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let entries: HashMap<String, String> = serde_json::from_str(json)?;
        Ok(Self {
            entries: RwLock::new(entries),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::Occurrence;

    fn spec() -> QuoteSpec {
        QuoteSpec::new("λόγος", "1:1", Occurrence::Nth(1))
    }

    #[test]
    fn test_key_depends_on_every_input() {
        let base = QuoteMemo::key(&spec(), 0, " … ", "a", "b");
        assert_eq!(base.len(), 40);
        assert_eq!(base, QuoteMemo::key(&spec(), 0, " … ", "a", "b"));
        assert_ne!(base, QuoteMemo::key(&spec(), 1, " … ", "a", "b"));
        assert_ne!(base, QuoteMemo::key(&spec(), 0, " & ", "a", "b"));
        assert_ne!(base, QuoteMemo::key(&spec(), 0, " … ", "a", "c"));
        let mut other = spec();
        other.occurrence = Occurrence::All;
        assert_ne!(base, QuoteMemo::key(&other, 0, " … ", "a", "b"));
    }

    #[test]
    fn test_first_writer_wins() {
        let memo = QuoteMemo::new();
        assert_eq!(memo.insert_if_absent("k".into(), "first".into()), "first");
        assert_eq!(memo.insert_if_absent("k".into(), "second".into()), "first");
        assert_eq!(memo.get("k").as_deref(), Some("first"));
    }

    #[test]
    fn test_get_or_compute_skips_work_on_hit() {
        let memo = QuoteMemo::from_entries([("k".to_string(), "cached".to_string())]);
        let value = memo.get_or_compute("k".into(), || panic!("should not compute"));
        assert_eq!(value, "cached");
    }

    #[test]
    fn test_json_persistence() {
        let memo = QuoteMemo::new();
        memo.insert_if_absent("k".into(), "the Word".into());
        let restored = QuoteMemo::from_json(&memo.to_json().unwrap()).unwrap();
        assert_eq!(restored.entries(), memo.entries());
    }

    #[test]
    fn test_shared_across_threads() {
        let memo = QuoteMemo::new();
        std::thread::scope(|s| {
            for i in 0..4 {
                let memo = &memo;
                s.spawn(move || memo.insert_if_absent(format!("k{}", i % 2), i.to_string()));
            }
        });
        assert_eq!(memo.len(), 2);
    }
}
