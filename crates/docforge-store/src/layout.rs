//! On-disk layout and name validation.
//!
//! ```text
//! <root>/<project>/current/<stage filename>
//! <root>/<project>/versions/<version_id>/<stage filename>
//! <root>/<project>/versions/<version_id>/metadata.json
//! ```

use camino::{Utf8Path, Utf8PathBuf};

use docforge_utils::error::StoreError;

pub const CURRENT_DIR: &str = "current";
pub const VERSIONS_DIR: &str = "versions";
pub const METADATA_FILE: &str = "metadata.json";

/// Prefix of in-progress snapshot directories; never listed as versions.
pub(crate) const STAGING_PREFIX: &str = ".staging-";

/// Resolved directories for one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    project_dir: Utf8PathBuf,
}

impl ProjectLayout {
    /// # Errors
    ///
    /// Returns `StoreError::InvalidName` if `project` is not a safe directory name
    pub fn new(root: &Utf8Path, project: &str) -> Result<Self, StoreError> {
        validate_component(project, "project name")?;
        Ok(Self {
            project_dir: root.join(project),
        })
    }

    #[must_use]
    pub fn project_dir(&self) -> &Utf8Path {
        &self.project_dir
    }

    #[must_use]
    pub fn current_dir(&self) -> Utf8PathBuf {
        self.project_dir.join(CURRENT_DIR)
    }

    #[must_use]
    pub fn versions_dir(&self) -> Utf8PathBuf {
        self.project_dir.join(VERSIONS_DIR)
    }

    /// # Errors
    ///
    /// Returns `StoreError::InvalidName` if `version_id` is not a safe directory name
    pub fn version_dir(&self, version_id: &str) -> Result<Utf8PathBuf, StoreError> {
        validate_component(version_id, "version id")?;
        if version_id.starts_with('.') {
            return Err(StoreError::InvalidName {
                name: version_id.to_string(),
                reason: "version id must not start with '.'".to_string(),
            });
        }
        Ok(self.versions_dir().join(version_id))
    }

    pub(crate) fn staging_dir(&self, version_id: &str) -> Utf8PathBuf {
        self.versions_dir()
            .join(format!("{STAGING_PREFIX}{version_id}"))
    }
}

/// Reject names that could escape their parent directory or are unusable
/// as a single path component.
fn validate_component(name: &str, what: &str) -> Result<(), StoreError> {
    let invalid = |reason: String| StoreError::InvalidName {
        name: name.to_string(),
        reason,
    };

    if name.trim().is_empty() {
        return Err(invalid(format!("{what} is empty")));
    }
    if name.contains('/') || name.contains('\\') {
        return Err(invalid(format!("{what} must not contain path separators")));
    }
    if name == "." || name.contains("..") {
        return Err(invalid(format!("{what} must not contain '..'")));
    }
    if name.chars().any(char::is_control) {
        return Err(invalid(format!("{what} must not contain control characters")));
    }
    Ok(())
}
