//! Line-level comparison of two document sets.

use serde::{Deserialize, Serialize};
use similar::{ChangeTag, TextDiff};
use std::collections::BTreeMap;

use docforge_utils::types::StageId;

const CONTEXT_LINES: usize = 3;

/// Comparison result for one stage.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StageDiff {
    pub exists_in_both: bool,
    /// `lines(new) - lines(old)`, counting an absent document as zero lines
    pub line_diff: i64,
    /// Unified diff hunks (`@@` headers and `-`/`+`/` ` lines) without the
    /// `---`/`+++` file header; empty unless both sides exist and differ
    pub diff_details: Vec<String>,
    pub is_new: bool,
    pub is_deleted: bool,
}

impl StageDiff {
    #[must_use]
    pub fn is_unchanged(&self) -> bool {
        self.exists_in_both && self.diff_details.is_empty()
    }
}

/// Comparison of two versions, keyed by every stage present in either.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionDiff {
    pub from: String,
    pub to: String,
    pub stages: BTreeMap<StageId, StageDiff>,
}

impl VersionDiff {
    #[must_use]
    pub fn changed_stages(&self) -> Vec<StageId> {
        self.stages
            .iter()
            .filter(|(_, d)| !d.is_unchanged())
            .map(|(s, _)| *s)
            .collect()
    }
}

/// Compare `old` against `new` for the union of their stages.
#[must_use]
pub fn diff_documents(
    old: &BTreeMap<StageId, String>,
    new: &BTreeMap<StageId, String>,
) -> BTreeMap<StageId, StageDiff> {
    let mut stages: Vec<StageId> = old.keys().chain(new.keys()).copied().collect();
    stages.sort();
    stages.dedup();

    stages
        .into_iter()
        .map(|stage| {
            let before = old.get(&stage);
            let after = new.get(&stage);
            let exists_in_both = before.is_some() && after.is_some();

            let old_lines = split_lines(before.map_or("", String::as_str));
            let new_lines = split_lines(after.map_or("", String::as_str));

            let diff_details = match (before, after) {
                (Some(a), Some(b)) if a != b => unified_hunks(&old_lines, &new_lines),
                _ => Vec::new(),
            };

            let entry = StageDiff {
                exists_in_both,
                line_diff: new_lines.len() as i64 - old_lines.len() as i64,
                diff_details,
                is_new: before.is_none() && after.is_some(),
                is_deleted: before.is_some() && after.is_none(),
            };
            (stage, entry)
        })
        .collect()
}

/// Lines as produced by splitting on `\n`; the empty document has none.
fn split_lines(content: &str) -> Vec<&str> {
    if content.is_empty() {
        Vec::new()
    } else {
        content.split('\n').collect()
    }
}

fn unified_hunks(old: &[&str], new: &[&str]) -> Vec<String> {
    let diff = TextDiff::configure().diff_slices(old, new);
    let mut unified = diff.unified_diff();
    unified.context_radius(CONTEXT_LINES);

    let mut lines = Vec::new();
    for hunk in unified.iter_hunks() {
        lines.push(hunk.header().to_string().trim_end().to_string());
        for change in hunk.iter_changes() {
            let sign = match change.tag() {
                ChangeTag::Delete => '-',
                ChangeTag::Insert => '+',
                ChangeTag::Equal => ' ',
            };
            lines.push(format!("{sign}{}", change.value()));
        }
    }
    lines
}
