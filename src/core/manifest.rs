//! Package manifest (`package.json`) access
//!
//! The manifest is the single source of truth for the project name and the
//! current version. It is always read fresh from disk; the parsed document
//! is kept whole so fields this crate does not know about survive a
//! read-modify-write cycle untouched and in their original order.

use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default manifest file name inside the working directory
pub const DEFAULT_MANIFEST: &str = "package.json";

/// Errors reading or writing a manifest file
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Failed to access manifest {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse manifest {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Manifest {0} is not a JSON object")]
    NotAnObject(PathBuf),
}

/// A parsed manifest document
#[derive(Debug, Clone, PartialEq)]
pub struct Manifest {
    document: Map<String, Value>,
}

impl Manifest {
    /// Read and parse the manifest at `path`
    ///
    /// A manifest without `name` or `version` is returned as is; callers
    /// decide whether those fields are required.
    pub async fn read(path: &Path) -> Result<Self, ManifestError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ManifestError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        Self::parse(path, &content)
    }

    fn parse(path: &Path, content: &str) -> Result<Self, ManifestError> {
        let value: Value = serde_json::from_str(content).map_err(|source| ManifestError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        match value {
            Value::Object(document) => Ok(Self { document }),
            _ => Err(ManifestError::NotAnObject(path.to_path_buf())),
        }
    }

    /// Replace the file at `path` with this document (2-space indent)
    pub async fn write(&self, path: &Path) -> Result<(), ManifestError> {
        let content = self.to_pretty_string().map_err(|source| ManifestError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tokio::fs::write(path, content)
            .await
            .map_err(|source| ManifestError::Io {
                path: path.to_path_buf(),
                source,
            })
    }

    fn to_pretty_string(&self) -> Result<String, serde_json::Error> {
        let mut content = serde_json::to_string_pretty(&self.document)?;
        content.push('\n');
        Ok(content)
    }

    pub fn name(&self) -> Option<&str> {
        self.document.get("name").and_then(Value::as_str)
    }

    pub fn version(&self) -> Option<&str> {
        self.document.get("version").and_then(Value::as_str)
    }

    pub fn set_version(&mut self, version: impl Into<String>) {
        self.document
            .insert("version".to_string(), Value::String(version.into()));
    }

    /// Raw access to a top-level field
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.document.get(key)
    }
}

/// Resolve the manifest location for a working directory
///
/// Relative overrides are taken relative to `working_dir`.
pub fn manifest_path(working_dir: &Path, manifest_override: Option<&Path>) -> PathBuf {
    match manifest_override {
        Some(path) if path.is_absolute() => path.to_path_buf(),
        Some(path) => working_dir.join(path),
        None => working_dir.join(DEFAULT_MANIFEST),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_round_trip_preserves_other_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("package.json");
        let original = r#"{
  "name": "demo",
  "version": "1.2.3",
  "private": true,
  "scripts": {
    "lint": "eslint ."
  },
  "dependencies": {
    "zod": "^3.0.0",
    "axios": "^1.0.0"
  }
}
"#;
        tokio::fs::write(&path, original).await.unwrap();

        let mut manifest = Manifest::read(&path).await.unwrap();
        assert_eq!(manifest.name(), Some("demo"));
        assert_eq!(manifest.version(), Some("1.2.3"));

        manifest.set_version("1.3.0");
        manifest.write(&path).await.unwrap();

        let written = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(written, original.replace("1.2.3", "1.3.0"));

        let reread = Manifest::read(&path).await.unwrap();
        assert_eq!(reread.name(), Some("demo"));
        assert_eq!(reread.version(), Some("1.3.0"));
        assert_eq!(reread.get("private"), Some(&Value::Bool(true)));
    }

    #[tokio::test]
    async fn test_missing_version_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("package.json");
        tokio::fs::write(&path, r#"{"name": "demo"}"#).await.unwrap();

        let manifest = Manifest::read(&path).await.unwrap();
        assert_eq!(manifest.name(), Some("demo"));
        assert_eq!(manifest.version(), None);
    }

    #[tokio::test]
    async fn test_malformed_json_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("package.json");
        tokio::fs::write(&path, "{ not json").await.unwrap();

        let result = Manifest::read(&path).await;
        assert!(matches!(result, Err(ManifestError::Parse { .. })));
    }

    #[tokio::test]
    async fn test_missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = Manifest::read(&dir.path().join("package.json")).await;
        assert!(matches!(result, Err(ManifestError::Io { .. })));
    }

    #[test]
    fn test_non_object_document_is_rejected() {
        let result = Manifest::parse(Path::new("package.json"), "[1, 2]");
        assert!(matches!(result, Err(ManifestError::NotAnObject(_))));
    }

    #[test]
    fn test_manifest_path_resolution() {
        let root = Path::new("/work/app");
        assert_eq!(manifest_path(root, None), PathBuf::from("/work/app/package.json"));
        assert_eq!(
            manifest_path(root, Some(Path::new("dist/package.json"))),
            PathBuf::from("/work/app/dist/package.json")
        );
        assert_eq!(
            manifest_path(root, Some(Path::new("/elsewhere/package.json"))),
            PathBuf::from("/elsewhere/package.json")
        );
    }
}
