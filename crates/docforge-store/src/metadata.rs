//! Version metadata sidecar (`metadata.json`) and version ids.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use docforge_utils::types::StageId;

/// Format of generated version ids; lexical order equals chronological order.
pub const VERSION_ID_FORMAT: &str = "%Y%m%d_%H%M%S_%3f";

/// Manifest entry for one document in a version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub filename: String,
    /// BLAKE3 hex digest of the stored bytes
    pub blake3: String,
}

impl FileEntry {
    #[must_use]
    pub fn for_content(stage: StageId, content: &str) -> Self {
        Self {
            filename: stage.filename().to_string(),
            blake3: content_hash(content),
        }
    }
}

/// Contents of `versions/<id>/metadata.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionMetadata {
    pub version_id: String,
    /// Absent only for versions whose metadata file is missing or unreadable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub doc_types: Vec<StageId>,
    pub project_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
    #[serde(default)]
    pub files: BTreeMap<StageId, FileEntry>,
}

impl VersionMetadata {
    /// Metadata for a snapshot of `documents` taken now.
    #[must_use]
    pub fn new(
        project: &str,
        version_id: &str,
        documents: &BTreeMap<StageId, String>,
        label: Option<&str>,
        comments: Option<&str>,
    ) -> Self {
        Self {
            version_id: version_id.to_string(),
            created_at: Some(Utc::now()),
            doc_types: documents.keys().copied().collect(),
            project_name: project.to_string(),
            label: non_empty(label),
            comments: non_empty(comments),
            files: documents
                .iter()
                .map(|(stage, content)| (*stage, FileEntry::for_content(*stage, content)))
                .collect(),
        }
    }

    /// Placeholder for a version directory without usable metadata.
    #[must_use]
    pub fn inferred(project: &str, version_id: &str, doc_types: Vec<StageId>) -> Self {
        Self {
            version_id: version_id.to_string(),
            created_at: None,
            doc_types,
            project_name: project.to_string(),
            label: None,
            comments: None,
            files: BTreeMap::new(),
        }
    }

    /// `created_at` as `YYYY-MM-DD HH:MM`, or `unknown`.
    #[must_use]
    pub fn created_at_display(&self) -> String {
        self.created_at.map_or_else(
            || "unknown".to_string(),
            |ts| ts.format("%Y-%m-%d %H:%M").to_string(),
        )
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// New version id for the current instant.
#[must_use]
pub fn new_version_id() -> String {
    version_id_for(Utc::now())
}

#[must_use]
pub fn version_id_for(at: DateTime<Utc>) -> String {
    at.format(VERSION_ID_FORMAT).to_string()
}

#[must_use]
pub fn content_hash(content: &str) -> String {
    blake3::hash(content.as_bytes()).to_hex().to_string()
}

/// Serialize as JCS-canonical JSON (RFC 8785) so identical metadata is
/// byte-identical on disk.
pub(crate) fn emit_jcs<T: Serialize>(value: &T) -> Result<String, String> {
    let json_value =
        serde_json::to_value(value).map_err(|e| format!("Failed to serialize metadata: {e}"))?;
    let json_bytes = serde_json_canonicalizer::to_vec(&json_value)
        .map_err(|e| format!("Failed to canonicalize metadata: {e}"))?;
    String::from_utf8(json_bytes).map_err(|e| format!("Canonical JSON is not UTF-8: {e}"))
}
