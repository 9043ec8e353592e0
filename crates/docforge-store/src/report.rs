//! Version details and history reports.

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::str::FromStr;

use docforge_utils::types::StageId;

use crate::metadata::VersionMetadata;

const MAX_HEADINGS: usize = 5;

/// Structural summary of one stored document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub doc_type: StageId,
    pub filename: String,
    /// First five lines starting with `#`
    pub headings: Vec<String>,
    /// Length in bytes
    pub size: usize,
}

impl DocumentSummary {
    #[must_use]
    pub fn from_content(stage: StageId, content: &str) -> Self {
        Self {
            doc_type: stage,
            filename: stage.filename().to_string(),
            headings: content
                .split('\n')
                .filter(|line| line.starts_with('#'))
                .take(MAX_HEADINGS)
                .map(str::to_string)
                .collect(),
            size: content.len(),
        }
    }
}

/// Version metadata enriched with per-document summaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionDetails {
    #[serde(flatten)]
    pub metadata: VersionMetadata,
    pub documents: Vec<DocumentSummary>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Markdown,
    Text,
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "markdown" | "md" => Ok(Self::Markdown),
            "text" | "txt" => Ok(Self::Text),
            other => Err(format!("unknown report format '{other}' (expected markdown or text)")),
        }
    }
}

pub(crate) const EMPTY_REPORT: &str = "No versions found.";

/// Render the version history of `project`.
#[must_use]
pub fn render_report(project: &str, versions: &[VersionMetadata], format: ReportFormat) -> String {
    if versions.is_empty() {
        return EMPTY_REPORT.to_string();
    }
    match format {
        ReportFormat::Markdown => render_markdown(project, versions),
        ReportFormat::Text => render_text(project, versions),
    }
}

fn label(meta: &VersionMetadata) -> &str {
    meta.label.as_deref().unwrap_or("(no label)")
}

fn comments(meta: &VersionMetadata) -> &str {
    meta.comments.as_deref().unwrap_or("(no comments)")
}

// `write!` into a String cannot fail.
fn render_markdown(project: &str, versions: &[VersionMetadata]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {project} Version History\n");
    out.push_str("## Summary\n\n");
    out.push_str("| Version | Label | Created | Documents |\n");
    out.push_str("|---------|-------|---------|-----------|\n");
    for meta in versions {
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} |",
            meta.version_id,
            label(meta),
            meta.created_at_display(),
            meta.doc_types.len()
        );
    }

    out.push_str("\n## Versions\n");
    for meta in versions {
        let _ = writeln!(out, "\n### Version {}\n", meta.version_id);
        let _ = writeln!(out, "- **Label**: {}", label(meta));
        let _ = writeln!(out, "- **Created**: {}", meta.created_at_display());
        let _ = writeln!(out, "- **Comments**: {}", comments(meta));
        out.push_str("\n#### Documents\n\n");
        for stage in &meta.doc_types {
            let _ = writeln!(out, "- {} ({stage})", stage.filename());
        }
    }
    out
}

fn render_text(project: &str, versions: &[VersionMetadata]) -> String {
    let rule = "=".repeat(50);
    let thin = "-".repeat(50);

    let mut out = String::new();
    let _ = writeln!(out, "{project} Version History\n{rule}\n");
    let _ = writeln!(out, "Summary:\n{thin}");
    for meta in versions {
        let _ = writeln!(out, "Version: {}", meta.version_id);
        let _ = writeln!(out, "Label: {}", label(meta));
        let _ = writeln!(out, "Created: {}", meta.created_at_display());
        let _ = writeln!(out, "Documents: {}", meta.doc_types.len());
        let _ = writeln!(out, "{thin}");
    }

    let _ = writeln!(out, "\nDetails:\n{rule}");
    for meta in versions {
        let _ = writeln!(out, "\nVersion {}\n{}", meta.version_id, "-".repeat(30));
        let _ = writeln!(out, "Label: {}", label(meta));
        let _ = writeln!(out, "Created: {}", meta.created_at_display());
        let _ = writeln!(out, "Comments: {}", comments(meta));
        out.push_str("\nDocuments:\n");
        for stage in &meta.doc_types {
            let _ = writeln!(out, "- {} ({stage})", stage.filename());
        }
        let _ = writeln!(out, "\n{rule}");
    }
    out
}
