//! Tag naming for single- and multi-project repositories

use crate::core::error::ValidationError;
use semver::Version;
use serde::{Deserialize, Serialize};

/// How release tags are named
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagStyle {
    /// `<version>`, one project per repository
    #[default]
    Version,
    /// `<name>-<version>`, several projects sharing a repository
    Prefixed,
}

impl TagStyle {
    /// Tag for `version` of the project called `name`
    ///
    /// `manifest` is only used to report a missing name.
    pub fn tag_name(
        self,
        name: Option<&str>,
        version: &Version,
        manifest: &str,
    ) -> Result<String, ValidationError> {
        match self {
            TagStyle::Version => Ok(version.to_string()),
            TagStyle::Prefixed => {
                let name = name.ok_or_else(|| ValidationError::MissingManifestField {
                    path: manifest.to_string(),
                    field: "name",
                })?;
                Ok(format!("{}-{}", name, version))
            }
        }
    }
}

/// Message of the version bump commit
pub fn release_message(tag: &str) -> String {
    format!("Release {}", tag)
}
