use camino::Utf8PathBuf;
use std::collections::BTreeMap;
use tracing::debug;

use docforge_store::Documents;
use docforge_utils::types::{StageId, StageStatus};

use crate::plan::StagePlan;

/// Per-stage state within one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageRecord {
    pub stage: StageId,
    /// Zero-based position in the plan
    pub position: usize,
    pub deps: Vec<StageId>,
    pub status: StageStatus,
    /// Generated or seeded document text
    pub artifact: Option<String>,
    /// Where the document was saved, once persisted in this run
    pub location: Option<Utf8PathBuf>,
}

/// Records for every stage of a plan, in plan order.
#[derive(Debug, Clone)]
pub(crate) struct RunState {
    records: Vec<StageRecord>,
}

impl RunState {
    pub(crate) fn new(plan: &StagePlan) -> Self {
        Self {
            records: plan
                .stages()
                .iter()
                .enumerate()
                .map(|(position, def)| StageRecord {
                    stage: def.stage,
                    position,
                    deps: def.deps.clone(),
                    status: StageStatus::Ready,
                    artifact: None,
                    location: None,
                })
                .collect(),
        }
    }

    pub(crate) fn records(&self) -> &[StageRecord] {
        &self.records
    }

    pub(crate) fn get(&self, stage: StageId) -> Option<&StageRecord> {
        self.records.iter().find(|r| r.stage == stage)
    }

    pub(crate) fn get_mut(&mut self, stage: StageId) -> Option<&mut StageRecord> {
        self.records.iter_mut().find(|r| r.stage == stage)
    }

    pub(crate) fn artifact(&self, stage: StageId) -> Option<&str> {
        self.get(stage).and_then(|r| r.artifact.as_deref())
    }

    pub(crate) fn artifacts(&self) -> Documents {
        self.records
            .iter()
            .filter_map(|r| r.artifact.clone().map(|a| (r.stage, a)))
            .collect()
    }

    pub(crate) fn statuses(&self) -> BTreeMap<StageId, StageStatus> {
        self.records.iter().map(|r| (r.stage, r.status)).collect()
    }

    pub(crate) fn completed_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.status == StageStatus::Completed)
            .count()
    }

    /// Move `stage` to `next`. Callers check preconditions first.
    pub(crate) fn transition(&mut self, stage: StageId, next: StageStatus) {
        if let Some(record) = self.get_mut(stage) {
            debug_assert!(
                record.status.can_transition_to(next),
                "illegal transition {} -> {next} for {stage}",
                record.status
            );
            debug!(stage = %stage, from = %record.status, to = %next, "Stage transition");
            record.status = next;
        }
    }
}
