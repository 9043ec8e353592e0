//! Versioned document store for docforge
//!
//! Each project keeps its latest documents in `current/` and immutable
//! snapshots under `versions/<version_id>/`, each with a `metadata.json`
//! manifest mapping stage ids to files and BLAKE3 digests.

mod diff;
mod layout;
mod metadata;
mod report;
mod store;

pub use diff::{StageDiff, VersionDiff, diff_documents};
pub use layout::{CURRENT_DIR, METADATA_FILE, ProjectLayout, VERSIONS_DIR};
pub use metadata::{
    FileEntry, VERSION_ID_FORMAT, VersionMetadata, content_hash, new_version_id, version_id_for,
};
pub use report::{DocumentSummary, ReportFormat, VersionDetails, render_report};
pub use store::{DocumentStore, Documents, EXPORT_DETAILS_FILE};
pub use docforge_utils::error::StoreError;
