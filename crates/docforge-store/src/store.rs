//! Per-project document persistence with immutable version snapshots.

use camino::{Utf8Path, Utf8PathBuf};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use tracing::{debug, info, warn};

use docforge_utils::atomic_write::write_file_atomic;
use docforge_utils::error::StoreError;
use docforge_utils::types::StageId;

use crate::diff::{VersionDiff, diff_documents};
use crate::layout::{METADATA_FILE, ProjectLayout};
use crate::metadata::{VersionMetadata, content_hash, emit_jcs, new_version_id};
use crate::report::{DocumentSummary, ReportFormat, VersionDetails, render_report};

/// File name of the details sidecar written by [`DocumentStore::export_version`].
pub const EXPORT_DETAILS_FILE: &str = "version.json";

/// Stage → document content.
pub type Documents = BTreeMap<StageId, String>;

/// Filesystem-backed store rooted at an output directory.
///
/// "Current" documents may be overwritten freely; a version directory is
/// written once, under a staging name, and renamed into place, so a visible
/// version is always complete and never modified afterwards.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    root: Utf8PathBuf,
}

impl DocumentStore {
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// # Errors
    ///
    /// Returns `StoreError::InvalidName` for unsafe project names
    pub fn layout(&self, project: &str) -> Result<ProjectLayout, StoreError> {
        ProjectLayout::new(&self.root, project)
    }

    /// Write `content` verbatim as the current document for `stage`,
    /// returning its path.
    pub fn save(
        &self,
        project: &str,
        stage: StageId,
        content: &str,
    ) -> Result<Utf8PathBuf, StoreError> {
        let path = self.layout(project)?.current_dir().join(stage.filename());
        write_text(&path, content)?;
        debug!(project, stage = %stage, path = %path, bytes = content.len(), "Saved document");
        Ok(path)
    }

    pub fn save_all(
        &self,
        project: &str,
        documents: &Documents,
    ) -> Result<BTreeMap<StageId, Utf8PathBuf>, StoreError> {
        documents
            .iter()
            .map(|(stage, content)| Ok((*stage, self.save(project, *stage, content)?)))
            .collect()
    }

    /// Current documents; an absent `current/` directory yields an empty map.
    pub fn load_current(&self, project: &str) -> Result<Documents, StoreError> {
        let dir = self.layout(project)?.current_dir();
        read_documents_by_filename(&dir)
    }

    /// Snapshot every current document as `version_id`.
    ///
    /// Returns `Ok(None)` when there is nothing to snapshot.
    ///
    /// # Errors
    ///
    /// - `VersionExists` if `version_id` is already taken
    /// - `InvalidName` for unsafe project names or version ids
    /// - `Io`/`Write` on filesystem failures
    pub fn checkpoint(
        &self,
        project: &str,
        version_id: &str,
        label: Option<&str>,
        comment: Option<&str>,
    ) -> Result<Option<VersionMetadata>, StoreError> {
        let layout = self.layout(project)?;
        let version_dir = layout.version_dir(version_id)?;

        let documents = self.load_current(project)?;
        if documents.is_empty() {
            warn!(project, version_id, "No current documents; checkpoint skipped");
            return Ok(None);
        }

        if version_dir.exists() {
            return Err(StoreError::VersionExists {
                project: project.to_string(),
                version_id: version_id.to_string(),
            });
        }

        let staging = layout.staging_dir(version_id);
        if staging.exists() {
            fs::remove_dir_all(&staging).map_err(|e| StoreError::io(&staging, e))?;
        }

        let metadata = VersionMetadata::new(project, version_id, &documents, label, comment);
        if let Err(e) = write_snapshot(&staging, &documents, &metadata) {
            let _ = fs::remove_dir_all(&staging);
            return Err(e);
        }

        if let Err(e) = fs::rename(&staging, &version_dir) {
            let _ = fs::remove_dir_all(&staging);
            return Err(if version_dir.exists() {
                StoreError::VersionExists {
                    project: project.to_string(),
                    version_id: version_id.to_string(),
                }
            } else {
                StoreError::io(&version_dir, e)
            });
        }

        info!(
            project,
            version_id,
            documents = documents.len(),
            "Created version snapshot"
        );
        Ok(Some(metadata))
    }

    /// [`checkpoint`](Self::checkpoint) with a fresh timestamp-derived id.
    pub fn checkpoint_now(
        &self,
        project: &str,
        label: Option<&str>,
        comment: Option<&str>,
    ) -> Result<Option<VersionMetadata>, StoreError> {
        self.checkpoint(project, &new_version_id(), label, comment)
    }

    /// Version ids in lexical (chronological) order.
    pub fn list_versions(&self, project: &str) -> Result<Vec<String>, StoreError> {
        let dir = self.layout(project)?.versions_dir();
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(&dir, e)),
        };

        let mut versions = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io(&dir, e))?;
            let is_dir = entry
                .file_type()
                .map_err(|e| StoreError::io(&dir, e))?
                .is_dir();
            if !is_dir {
                continue;
            }
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            // hidden entries include in-progress staging directories
            if name.starts_with('.') {
                continue;
            }
            versions.push(name);
        }
        versions.sort();
        Ok(versions)
    }

    /// Metadata for every version, oldest first.
    ///
    /// Versions with missing or unreadable metadata are reported with the
    /// stages found on disk and no creation time.
    pub fn list_version_metadata(&self, project: &str) -> Result<Vec<VersionMetadata>, StoreError> {
        let mut out = Vec::new();
        for version_id in self.list_versions(project)? {
            match self.version_metadata(project, &version_id) {
                Ok(Some(meta)) => out.push(meta),
                Ok(None) => {
                    let stages = self.load_version(project, &version_id)?.into_keys().collect();
                    out.push(VersionMetadata::inferred(project, &version_id, stages));
                }
                Err(e @ StoreError::Metadata { .. }) => {
                    warn!(project, version_id = %version_id, error = %e, "Unreadable version metadata");
                    let stages = self.load_version(project, &version_id)?.into_keys().collect();
                    out.push(VersionMetadata::inferred(project, &version_id, stages));
                }
                Err(e) => return Err(e),
            }
        }
        Ok(out)
    }

    /// Parsed `metadata.json`, or `None` if the version has none.
    ///
    /// # Errors
    ///
    /// - `VersionNotFound` if the version directory does not exist
    /// - `Metadata` if the file exists but cannot be parsed
    pub fn version_metadata(
        &self,
        project: &str,
        version_id: &str,
    ) -> Result<Option<VersionMetadata>, StoreError> {
        let dir = self.existing_version_dir(project, version_id)?;
        read_metadata(&dir)
    }

    /// Documents frozen in `version_id`.
    ///
    /// The metadata manifest is authoritative: each listed file must carry
    /// its stage's filename and match the recorded BLAKE3 digest. Versions
    /// without a manifest are read through the fixed stage filename table and
    /// unknown files are skipped.
    ///
    /// # Errors
    ///
    /// - `VersionNotFound` if the version directory does not exist
    /// - `Metadata` if a manifest entry is missing, misnamed or fails its digest
    pub fn load_version(&self, project: &str, version_id: &str) -> Result<Documents, StoreError> {
        let dir = self.existing_version_dir(project, version_id)?;

        let manifest = match read_metadata(&dir) {
            Ok(Some(meta)) if !meta.files.is_empty() => Some(meta.files),
            Ok(_) => None,
            Err(e) => {
                warn!(project, version_id, error = %e, "Ignoring unreadable version metadata");
                None
            }
        };

        let Some(files) = manifest else {
            return read_documents_by_filename(&dir);
        };

        let mut documents = Documents::new();
        for (stage, entry) in files {
            if entry.filename != stage.filename() {
                return Err(StoreError::Metadata {
                    path: dir.join(METADATA_FILE).to_string(),
                    reason: format!(
                        "manifest maps {stage} to '{}', expected '{}'",
                        entry.filename,
                        stage.filename()
                    ),
                });
            }
            let path = dir.join(stage.filename());
            match read_text(&path) {
                Ok(content) => {
                    if content_hash(&content) != entry.blake3 {
                        return Err(StoreError::Metadata {
                            path: path.to_string(),
                            reason: format!("{stage} does not match its recorded BLAKE3 digest"),
                        });
                    }
                    documents.insert(stage, content);
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    return Err(StoreError::Metadata {
                        path: path.to_string(),
                        reason: format!("manifest lists {stage} but the file is missing"),
                    });
                }
                Err(e) => return Err(StoreError::io(&path, e)),
            }
        }
        Ok(documents)
    }

    /// Compare two versions stage by stage.
    pub fn diff(&self, project: &str, from: &str, to: &str) -> Result<VersionDiff, StoreError> {
        let old = self.load_version(project, from)?;
        let new = self.load_version(project, to)?;
        Ok(VersionDiff {
            from: from.to_string(),
            to: to.to_string(),
            stages: diff_documents(&old, &new),
        })
    }

    /// Re-save every document of `version_id` into `current/`.
    ///
    /// History is untouched; current documents for stages absent from the
    /// version are left as they are.
    ///
    /// # Errors
    ///
    /// Returns `VersionNotFound` if the version does not exist or holds no documents
    pub fn revert(
        &self,
        project: &str,
        version_id: &str,
    ) -> Result<BTreeMap<StageId, Utf8PathBuf>, StoreError> {
        let documents = self.load_version(project, version_id)?;
        if documents.is_empty() {
            return Err(StoreError::VersionNotFound {
                project: project.to_string(),
                version_id: version_id.to_string(),
            });
        }

        let saved = self.save_all(project, &documents)?;
        info!(project, version_id, documents = saved.len(), "Reverted current documents");
        Ok(saved)
    }

    /// Metadata plus a structural summary of each document.
    pub fn version_details(
        &self,
        project: &str,
        version_id: &str,
    ) -> Result<VersionDetails, StoreError> {
        let documents = self.load_version(project, version_id)?;
        let metadata = match self.version_metadata(project, version_id) {
            Ok(Some(meta)) => meta,
            Ok(None) | Err(StoreError::Metadata { .. }) => {
                VersionMetadata::inferred(project, version_id, documents.keys().copied().collect())
            }
            Err(e) => return Err(e),
        };

        Ok(VersionDetails {
            metadata,
            documents: documents
                .iter()
                .map(|(stage, content)| DocumentSummary::from_content(*stage, content))
                .collect(),
        })
    }

    /// Version history of `project` as Markdown or plain text.
    pub fn version_report(&self, project: &str, format: ReportFormat) -> Result<String, StoreError> {
        let versions = self.list_version_metadata(project)?;
        Ok(render_report(project, &versions, format))
    }

    /// Copy the documents of `version_id` plus a details sidecar into
    /// `target`, returning the written paths.
    pub fn export_version(
        &self,
        project: &str,
        version_id: &str,
        target: &Utf8Path,
    ) -> Result<Vec<Utf8PathBuf>, StoreError> {
        let documents = self.load_version(project, version_id)?;
        if documents.is_empty() {
            return Err(StoreError::VersionNotFound {
                project: project.to_string(),
                version_id: version_id.to_string(),
            });
        }
        let details = self.version_details(project, version_id)?;

        let mut written = Vec::with_capacity(documents.len() + 1);
        for (stage, content) in &documents {
            let path = target.join(stage.filename());
            write_text(&path, content)?;
            written.push(path);
        }

        let details_path = target.join(EXPORT_DETAILS_FILE);
        let json = serde_json::to_string_pretty(&details).map_err(|e| StoreError::Write {
            path: details_path.to_string(),
            reason: e.to_string(),
        })?;
        write_text(&details_path, &json)?;
        written.push(details_path);

        info!(project, version_id, target = %target, "Exported version");
        Ok(written)
    }

    fn existing_version_dir(
        &self,
        project: &str,
        version_id: &str,
    ) -> Result<Utf8PathBuf, StoreError> {
        let dir = self.layout(project)?.version_dir(version_id)?;
        if dir.is_dir() {
            Ok(dir)
        } else {
            Err(StoreError::VersionNotFound {
                project: project.to_string(),
                version_id: version_id.to_string(),
            })
        }
    }
}

fn write_text(path: &Utf8Path, content: &str) -> Result<(), StoreError> {
    write_file_atomic(path, content).map_err(|e| StoreError::Write {
            path: path.to_string(),
            reason: format!("{e:#}"),
        })
}

fn write_snapshot(
    dir: &Utf8Path,
    documents: &Documents,
    metadata: &VersionMetadata,
) -> Result<(), StoreError> {
    fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;
    for (stage, content) in documents {
        write_text(&dir.join(stage.filename()), content)?;
    }

    let metadata_path = dir.join(METADATA_FILE);
    let json = emit_jcs(metadata).map_err(|reason| StoreError::Write {
        path: metadata_path.to_string(),
        reason,
    })?;
    write_text(&metadata_path, &json)
}

fn read_text(path: &Utf8Path) -> io::Result<String> {
    fs::read_to_string(path)
}

fn read_metadata(dir: &Utf8Path) -> Result<Option<VersionMetadata>, StoreError> {
    let path = dir.join(METADATA_FILE);
    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(StoreError::io(&path, e)),
    };
    serde_json::from_str(&text)
        .map(Some)
        .map_err(|e| StoreError::Metadata {
            path: path.to_string(),
            reason: e.to_string(),
        })
}

/// Read every file in `dir` whose name is a known stage filename.
fn read_documents_by_filename(dir: &Utf8Path) -> Result<Documents, StoreError> {
    let entries = match dir.read_dir_utf8() {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Documents::new()),
        Err(e) => return Err(StoreError::io(dir, e)),
    };

    let mut documents = Documents::new();
    for entry in entries {
        let entry = entry.map_err(|e| StoreError::io(dir, e))?;
        let Some(stage) = StageId::from_filename(entry.file_name()) else {
            continue;
        };
        let content = read_text(entry.path()).map_err(|e| StoreError::io(entry.path(), e))?;
        documents.insert(stage, content);
    }
    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, DocumentStore) {
        let temp = TempDir::new().unwrap();
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
        (temp, DocumentStore::new(root))
    }

    fn seed(store: &DocumentStore) {
        store.save("shop", StageId::Brainstorm, "# Ideas\n- a\n").unwrap();
        store.save("shop", StageId::Prd, "# PRD\n## Scope\n").unwrap();
    }

    #[test]
    fn test_save_writes_current_file() {
        let (_t, store) = store();

        let path = store.save("shop", StageId::Prd, "# PRD\r\nbody").unwrap();

        assert!(path.ends_with("shop/current/02-prd.md"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "# PRD\r\nbody");
    }

    #[test]
    fn test_carriage_returns_survive_checkpoint() {
        let (_t, store) = store();
        let documents: Documents = [
            (StageId::Brainstorm, "a\rb".to_string()),
            (StageId::Prd, "# PRD\r\nline\r\n".to_string()),
        ]
        .into_iter()
        .collect();

        store.save_all("shop", &documents).unwrap();
        store.checkpoint("shop", "v", None, None).unwrap();

        assert_eq!(store.load_current("shop").unwrap(), documents);
        assert_eq!(store.load_version("shop", "v").unwrap(), documents);
    }

    #[test]
    fn test_load_version_rejects_tampered_document() {
        let (_t, store) = store();
        seed(&store);
        store.checkpoint("shop", "v1", None, None).unwrap();
        let dir = store.layout("shop").unwrap().versions_dir().join("v1");
        fs::write(dir.join("02-prd.md"), "# PRD\nedited\n").unwrap();

        let err = store.load_version("shop", "v1").unwrap_err();

        assert!(matches!(err, StoreError::Metadata { .. }));
    }

    #[test]
    fn test_load_version_rejects_foreign_manifest_filename() {
        let (_t, store) = store();
        seed(&store);
        store.checkpoint("shop", "v1", None, None).unwrap();
        let dir = store.layout("shop").unwrap().versions_dir().join("v1");
        let mut meta = read_metadata(&dir).unwrap().unwrap();
        meta.files.get_mut(&StageId::Prd).unwrap().filename = "../../current/02-prd.md".to_string();
        fs::write(dir.join(METADATA_FILE), emit_jcs(&meta).unwrap()).unwrap();

        match store.load_version("shop", "v1").unwrap_err() {
            StoreError::Metadata { reason, .. } => assert!(reason.contains("02-prd.md")),
            other => panic!("unexpected: {other}"),
        }
    }

    #[test]
    fn test_save_overwrites_current() {
        let (_t, store) = store();
        store.save("shop", StageId::Prd, "one").unwrap();
        store.save("shop", StageId::Prd, "two").unwrap();

        let current = store.load_current("shop").unwrap();

        assert_eq!(current[&StageId::Prd], "two");
    }

    #[test]
    fn test_load_current_of_unknown_project_is_empty() {
        let (_t, store) = store();
        assert!(store.load_current("nobody").unwrap().is_empty());
        assert!(store.list_versions("nobody").unwrap().is_empty());
    }

    #[test]
    fn test_load_current_skips_unknown_files() {
        let (_t, store) = store();
        seed(&store);
        let current = store.layout("shop").unwrap().current_dir();
        fs::write(current.join("notes.txt"), "x").unwrap();

        let docs = store.load_current("shop").unwrap();

        assert_eq!(docs.len(), 2);
    }

    #[test]
    fn test_checkpoint_without_current_returns_none() {
        let (_t, store) = store();

        let result = store.checkpoint("shop", "v1", None, None).unwrap();

        assert!(result.is_none());
        assert!(store.list_versions("shop").unwrap().is_empty());
    }

    #[test]
    fn test_checkpoint_and_load_round_trip() {
        let (_t, store) = store();
        seed(&store);

        let meta = store
            .checkpoint("shop", "20250101_000000_000", Some("first"), Some("initial"))
            .unwrap()
            .unwrap();

        assert_eq!(meta.doc_types, vec![StageId::Brainstorm, StageId::Prd]);
        let loaded = store.load_version("shop", "20250101_000000_000").unwrap();
        assert_eq!(loaded, store.load_current("shop").unwrap());

        let on_disk = store
            .version_metadata("shop", "20250101_000000_000")
            .unwrap()
            .unwrap();
        assert_eq!(on_disk, meta);
    }

    #[test]
    fn test_snapshot_is_unaffected_by_later_saves() {
        let (_t, store) = store();
        seed(&store);
        store.checkpoint("shop", "v1", None, None).unwrap();

        store.save("shop", StageId::Prd, "# PRD v2").unwrap();

        let v1 = store.load_version("shop", "v1").unwrap();
        assert_eq!(v1[&StageId::Prd], "# PRD\n## Scope\n");
    }

    #[test]
    fn test_checkpoint_refuses_existing_version() {
        let (_t, store) = store();
        seed(&store);
        store.checkpoint("shop", "v1", None, None).unwrap();
        store.save("shop", StageId::Prd, "changed").unwrap();

        let err = store.checkpoint("shop", "v1", None, None).unwrap_err();

        assert!(matches!(err, StoreError::VersionExists { .. }));
        assert_eq!(
            store.load_version("shop", "v1").unwrap()[&StageId::Prd],
            "# PRD\n## Scope\n"
        );
    }

    #[test]
    fn test_list_versions_sorted_and_ignores_staging() {
        let (_t, store) = store();
        seed(&store);
        for id in ["20250103_000000_000", "20250101_000000_000", "20250102_000000_000"] {
            store.checkpoint("shop", id, None, None).unwrap();
        }
        let versions_dir = store.layout("shop").unwrap().versions_dir();
        fs::create_dir_all(versions_dir.join(".staging-leftover")).unwrap();
        fs::write(versions_dir.join("stray.txt"), "x").unwrap();

        let versions = store.list_versions("shop").unwrap();

        assert_eq!(
            versions,
            vec![
                "20250101_000000_000",
                "20250102_000000_000",
                "20250103_000000_000"
            ]
        );
    }

    #[test]
    fn test_load_version_without_manifest_uses_filenames() {
        let (_t, store) = store();
        let dir = store.layout("shop").unwrap().versions_dir().join("legacy");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("02-prd.md"), "# PRD").unwrap();
        fs::write(dir.join("readme.md"), "ignored").unwrap();

        let docs = store.load_version("shop", "legacy").unwrap();

        assert_eq!(docs.len(), 1);
        assert_eq!(docs[&StageId::Prd], "# PRD");
    }

    #[test]
    fn test_load_missing_version_is_not_found() {
        let (_t, store) = store();
        let err = store.load_version("shop", "nope").unwrap_err();
        assert!(matches!(err, StoreError::VersionNotFound { .. }));
    }

    #[test]
    fn test_revert_restores_current() {
        let (_t, store) = store();
        seed(&store);
        store.checkpoint("shop", "v1", None, None).unwrap();
        store.save("shop", StageId::Prd, "rewritten").unwrap();
        store.save("shop", StageId::Workflow, "# Flow").unwrap();

        let saved = store.revert("shop", "v1").unwrap();

        assert_eq!(saved.len(), 2);
        let current = store.load_current("shop").unwrap();
        assert_eq!(current[&StageId::Prd], "# PRD\n## Scope\n");
        assert_eq!(current[&StageId::Workflow], "# Flow");
        assert_eq!(store.list_versions("shop").unwrap(), vec!["v1"]);
    }

    #[test]
    fn test_revert_missing_version_fails() {
        let (_t, store) = store();
        seed(&store);

        let err = store.revert("shop", "missing").unwrap_err();

        assert!(matches!(err, StoreError::VersionNotFound { .. }));
    }

    #[test]
    fn test_diff_between_versions() {
        let (_t, store) = store();
        seed(&store);
        store.checkpoint("shop", "v1", None, None).unwrap();
        store.save("shop", StageId::Prd, "# PRD\n## Scope\n## Risks\n").unwrap();
        store.save("shop", StageId::Workflow, "# Flow").unwrap();
        store.checkpoint("shop", "v2", None, None).unwrap();

        let diff = store.diff("shop", "v1", "v2").unwrap();

        assert_eq!(diff.stages[&StageId::Prd].line_diff, 1);
        assert!(diff.stages[&StageId::Workflow].is_new);
        assert!(diff.stages[&StageId::Brainstorm].is_unchanged());
        assert_eq!(diff.changed_stages(), vec![StageId::Prd, StageId::Workflow]);
    }

    #[test]
    fn test_version_details_and_report() {
        let (_t, store) = store();
        seed(&store);
        store.checkpoint("shop", "v1", Some("alpha"), None).unwrap();

        let details = store.version_details("shop", "v1").unwrap();
        assert_eq!(details.metadata.label.as_deref(), Some("alpha"));
        assert_eq!(details.documents[1].headings, vec!["# PRD", "## Scope"]);

        let report = store.version_report("shop", ReportFormat::Markdown).unwrap();
        assert!(report.contains("| v1 | alpha |"));
    }

    #[test]
    fn test_list_metadata_tolerates_missing_sidecar() {
        let (_t, store) = store();
        let dir = store.layout("shop").unwrap().versions_dir().join("old");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("00-brainstorm.md"), "# B").unwrap();
        fs::write(dir.join(METADATA_FILE), "{not json").unwrap();

        let metas = store.list_version_metadata("shop").unwrap();

        assert_eq!(metas.len(), 1);
        assert_eq!(metas[0].created_at, None);
        assert_eq!(metas[0].doc_types, vec![StageId::Brainstorm]);
    }

    #[test]
    fn test_export_version() {
        let (temp, store) = store();
        seed(&store);
        store.checkpoint("shop", "v1", None, None).unwrap();
        let target = Utf8PathBuf::from_path_buf(temp.path().join("export")).unwrap();

        let written = store.export_version("shop", "v1", &target).unwrap();

        assert_eq!(written.len(), 3);
        assert_eq!(
            fs::read_to_string(target.join("02-prd.md")).unwrap(),
            "# PRD\n## Scope\n"
        );
        let details: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(target.join(EXPORT_DETAILS_FILE)).unwrap())
                .unwrap();
        assert_eq!(details["version_id"], "v1");
    }

    #[test]
    fn test_invalid_project_name_rejected() {
        let (_t, store) = store();
        let err = store.save("../escape", StageId::Prd, "x").unwrap_err();
        assert!(matches!(err, StoreError::InvalidName { .. }));
    }
}
