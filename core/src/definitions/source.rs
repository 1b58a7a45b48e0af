//! Where definition documents come from.
//!
//! Each source is one resource namespace: the base definitions, or a single
//! contribution pack. Paths inside documents are relative to the root of the
//! namespace they were read from.

use std::fs;
use std::path::{Path, PathBuf};

use hashbrown::HashMap;
use serde::de::DeserializeOwned;

use crate::error::DefinitionError;

/// A namespace of JSON documents.
pub trait DocumentSource {
    /// Namespace name, used for logging and cycle tracking
    fn name(&self) -> &str;

    fn read_to_string(&self, path: &str) -> Result<String, DefinitionError>;

    /// Read and parse a document.
    fn read_document<T: DeserializeOwned>(&self, path: &str) -> Result<T, DefinitionError>
    where
        Self: Sized,
    {
        read_json(self, path)
    }
}

/// Read and parse a document from any source (object-safe form).
pub fn read_json<T: DeserializeOwned>(
    source: &(impl DocumentSource + ?Sized),
    path: &str,
) -> Result<T, DefinitionError> {
    let contents = source.read_to_string(path)?;
    serde_json::from_str(&contents).map_err(|e| DefinitionError::Parse {
        source_name: source.name().to_string(),
        path: PathBuf::from(path),
        source: e,
    })
}

/// Normalize a document path: forward slashes, no leading `./` or `/`.
pub fn normalize_path(path: &str) -> String {
    let unified = path.trim().replace('\\', "/");
    let mut rest = unified.as_str();
    loop {
        if let Some(stripped) = rest.strip_prefix("./") {
            rest = stripped;
        } else if let Some(stripped) = rest.strip_prefix('/') {
            rest = stripped;
        } else {
            break;
        }
    }
    rest.to_string()
}

// ─────────────────────────────────────────────────────────────────────────────
// Filesystem
// ─────────────────────────────────────────────────────────────────────────────

/// Documents under a directory on disk.
#[derive(Debug, Clone)]
pub struct FsSource {
    name: String,
    root: PathBuf,
}

impl FsSource {
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl DocumentSource for FsSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn read_to_string(&self, path: &str) -> Result<String, DefinitionError> {
        let full = self.root.join(normalize_path(path));
        fs::read_to_string(&full).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                DefinitionError::NotFound {
                    source_name: self.name.clone(),
                    path: full.clone(),
                }
            } else {
                DefinitionError::Io {
                    source_name: self.name.clone(),
                    path: full.clone(),
                    source: e,
                }
            }
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// In-memory
// ─────────────────────────────────────────────────────────────────────────────

/// Documents held in memory, keyed by normalized path.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    name: String,
    documents: HashMap<String, String>,
}

impl MemorySource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            documents: HashMap::new(),
        }
    }

    /// Builder-style insert
    pub fn with(mut self, path: &str, contents: impl Into<String>) -> Self {
        self.insert(path, contents);
        self
    }

    pub fn insert(&mut self, path: &str, contents: impl Into<String>) {
        self.documents.insert(normalize_path(path), contents.into());
    }
}

impl DocumentSource for MemorySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn read_to_string(&self, path: &str) -> Result<String, DefinitionError> {
        self.documents
            .get(&normalize_path(path))
            .cloned()
            .ok_or_else(|| DefinitionError::NotFound {
                source_name: self.name.clone(),
                path: PathBuf::from(path),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hotbar_types::IndexDocument;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("./defs/index.json"), "defs/index.json");
        assert_eq!(normalize_path("/defs\\weapons\\a.json"), "defs/weapons/a.json");
        assert_eq!(normalize_path(" ././x.json "), "x.json");
    }

    #[test]
    fn test_memory_source_reads_normalized() {
        let source = MemorySource::new("base").with("./index.json", r#"{"Weapons":["a.json"]}"#);
        let doc: IndexDocument = source.read_document("index.json").unwrap();
        assert_eq!(doc.weapons, vec!["a.json"]);
    }

    #[test]
    fn test_missing_document_is_not_found() {
        let source = MemorySource::new("base");
        let err = source.read_to_string("nope.json").unwrap_err();
        assert!(matches!(err, DefinitionError::NotFound { .. }));
    }

    #[test]
    fn test_bad_json_is_parse_error() {
        let source = MemorySource::new("base").with("index.json", "{ not json");
        let err = source.read_document::<IndexDocument>("index.json").unwrap_err();
        assert!(matches!(err, DefinitionError::Parse { .. }));
    }
}
