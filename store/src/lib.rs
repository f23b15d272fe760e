//! Per-document state: content, content hash, raw analysis text, and the
//! current diagnostic set, all keyed by uri.
//!
//! The store performs no internal synchronization. Callers must serialize
//! read-modify-write sequences per uri; concurrent calls for the same uri
//! are undefined unless externally serialized. Nothing here survives a
//! process restart.

use std::collections::HashMap;

use sha2::{Digest, Sha256};
use thiserror::Error;

use lintra_types::Diagnostic;

/// Errors raised by [`DocumentStore`] operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The new content hashes identically to what is already stored.
    ///
    /// Non-fatal: callers treat this as "already up to date" and skip
    /// re-analysis rather than surfacing an error.
    #[error("document ({uri}) already stored")]
    AlreadyStored { uri: String },
    /// No state exists for the uri.
    #[error("document ({uri}) not found")]
    NotFound { uri: String },
}

type ContentHash = [u8; 32];

/// Keyed state for every open document.
///
/// Diagnostics for a uri live as one ordered sequence and are always
/// replaced wholesale, never merged incrementally. An entry in the
/// diagnostics map with an empty list means "analyzed, zero findings",
/// which is distinct from a missing entry ("never analyzed").
#[derive(Debug, Default)]
pub struct DocumentStore {
    data: HashMap<String, String>,
    hashes: HashMap<String, ContentHash>,
    analysis: HashMap<String, String>,
    diagnostics: HashMap<String, Vec<Diagnostic>>,
}

fn content_hash(text: &str) -> ContentHash {
    Sha256::digest(text.as_bytes()).into()
}

impl DocumentStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current text for a document.
    pub fn load(&self, uri: &str) -> Result<&str, StoreError> {
        self.data
            .get(uri)
            .map(String::as_str)
            .ok_or_else(|| StoreError::NotFound {
                uri: uri.to_string(),
            })
    }

    /// Store whole-document text, replacing any previous content.
    ///
    /// Returns [`StoreError::AlreadyStored`] when the content hash matches
    /// the stored hash; the existing state is left untouched so identical
    /// saves never trigger re-analysis.
    pub fn store(&mut self, uri: &str, text: &str) -> Result<(), StoreError> {
        let hash = content_hash(text);
        if self.hashes.get(uri) == Some(&hash) {
            tracing::debug!(uri, "content unchanged, skipping store");
            return Err(StoreError::AlreadyStored {
                uri: uri.to_string(),
            });
        }

        tracing::debug!(uri, bytes = text.len(), "storing document");
        self.data.insert(uri.to_string(), text.to_string());
        self.hashes.insert(uri.to_string(), hash);
        Ok(())
    }

    /// Remove all state associated with a uri.
    pub fn delete(&mut self, uri: &str) {
        tracing::debug!(uri, "clearing document state");
        self.data.remove(uri);
        self.hashes.remove(uri);
        self.analysis.remove(uri);
        self.diagnostics.remove(uri);
    }

    /// Persist the raw provider output for a uri.
    ///
    /// Overwritten every analysis cycle, including failed ones, so the last
    /// raw text is always available for debugging.
    pub fn store_analysis(&mut self, uri: &str, analysis: &str) {
        self.analysis.insert(uri.to_string(), analysis.to_string());
    }

    /// Last raw provider output for a uri.
    pub fn load_analysis(&self, uri: &str) -> Result<&str, StoreError> {
        self.analysis
            .get(uri)
            .map(String::as_str)
            .ok_or_else(|| StoreError::NotFound {
                uri: uri.to_string(),
            })
    }

    /// Wholesale replace the diagnostic set for a uri.
    pub fn update_diagnostics(&mut self, uri: &str, diagnostics: Vec<Diagnostic>) {
        tracing::debug!(uri, count = diagnostics.len(), "updating diagnostics");
        self.diagnostics.insert(uri.to_string(), diagnostics);
    }

    /// Current diagnostics for a uri.
    ///
    /// `Ok(&[])` means a completed analysis found nothing; `NotFound` means
    /// the uri was never analyzed.
    pub fn get_diagnostics(&self, uri: &str) -> Result<&[Diagnostic], StoreError> {
        self.diagnostics
            .get(uri)
            .map(Vec::as_slice)
            .ok_or_else(|| StoreError::NotFound {
                uri: uri.to_string(),
            })
    }

    /// All stored documents, for debugging surfaces.
    pub fn dump(&self) -> impl Iterator<Item = (&str, &str)> {
        self.data.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_diag(line: u32, description: &str) -> Diagnostic {
        Diagnostic {
            uri: "file:///a.c".to_string(),
            line_number: line,
            source: "misra".to_string(),
            rule: "R1".to_string(),
            severity: "advisory".to_string(),
            description: description.to_string(),
            recommendation: "fix it".to_string(),
        }
    }

    #[test]
    fn test_load_unknown_uri_is_not_found() {
        let store = DocumentStore::new();
        assert_eq!(
            store.load("file:///missing.c"),
            Err(StoreError::NotFound {
                uri: "file:///missing.c".to_string()
            })
        );
    }

    #[test]
    fn test_store_then_load() {
        let mut store = DocumentStore::new();
        store.store("file:///a.c", "int x;").unwrap();
        assert_eq!(store.load("file:///a.c").unwrap(), "int x;");
    }

    #[test]
    fn test_identical_content_reports_already_stored() {
        let mut store = DocumentStore::new();
        store.store("file:///a.c", "int x;").unwrap();
        let err = store.store("file:///a.c", "int x;").unwrap_err();
        assert!(matches!(err, StoreError::AlreadyStored { .. }));
        // Content survives the rejected store
        assert_eq!(store.load("file:///a.c").unwrap(), "int x;");
    }

    #[test]
    fn test_changed_content_replaces() {
        let mut store = DocumentStore::new();
        store.store("file:///a.c", "int x;").unwrap();
        store.store("file:///a.c", "int y;").unwrap();
        assert_eq!(store.load("file:///a.c").unwrap(), "int y;");
    }

    #[test]
    fn test_idempotent_store_leaves_diagnostics_unchanged() {
        let mut store = DocumentStore::new();
        store.store("file:///a.c", "int x;").unwrap();
        store.update_diagnostics("file:///a.c", vec![make_diag(1, "d")]);

        assert!(store.store("file:///a.c", "int x;").is_err());
        assert_eq!(store.get_diagnostics("file:///a.c").unwrap().len(), 1);
    }

    #[test]
    fn test_delete_removes_all_state() {
        let mut store = DocumentStore::new();
        store.store("file:///a.c", "int x;").unwrap();
        store.store_analysis("file:///a.c", "raw");
        store.update_diagnostics("file:///a.c", vec![make_diag(1, "d")]);

        store.delete("file:///a.c");
        assert!(store.load("file:///a.c").is_err());
        assert!(store.load_analysis("file:///a.c").is_err());
        assert!(store.get_diagnostics("file:///a.c").is_err());

        // Re-storing identical content after delete is not AlreadyStored
        store.store("file:///a.c", "int x;").unwrap();
    }

    #[test]
    fn test_analysis_overwritten_each_cycle() {
        let mut store = DocumentStore::new();
        store.store_analysis("file:///a.c", "attempt 1 garbage");
        store.store_analysis("file:///a.c", "attempt 2 garbage");
        assert_eq!(
            store.load_analysis("file:///a.c").unwrap(),
            "attempt 2 garbage"
        );
    }

    #[test]
    fn test_wholesale_replace() {
        let mut store = DocumentStore::new();
        let d1 = vec![make_diag(1, "first"), make_diag(2, "second")];
        let d2 = vec![make_diag(3, "third")];

        store.update_diagnostics("file:///a.c", d1);
        store.update_diagnostics("file:///a.c", d2.clone());
        assert_eq!(store.get_diagnostics("file:///a.c").unwrap(), &d2[..]);
    }

    #[test]
    fn test_zero_findings_distinct_from_never_analyzed() {
        let mut store = DocumentStore::new();
        assert!(store.get_diagnostics("file:///a.c").is_err());

        store.update_diagnostics("file:///a.c", Vec::new());
        assert_eq!(store.get_diagnostics("file:///a.c").unwrap(), &[]);
    }

    #[test]
    fn test_dump_lists_documents() {
        let mut store = DocumentStore::new();
        store.store("file:///a.c", "int x;").unwrap();
        store.store("file:///b.c", "int y;").unwrap();
        let mut uris: Vec<&str> = store.dump().map(|(uri, _)| uri).collect();
        uris.sort_unstable();
        assert_eq!(uris, vec!["file:///a.c", "file:///b.c"]);
    }
}
