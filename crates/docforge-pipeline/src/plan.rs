use std::collections::HashSet;

use docforge_utils::error::PipelineError;
use docforge_utils::types::StageId;

/// One stage of a plan and the stages whose documents it consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageDef {
    pub stage: StageId,
    /// In the order their documents appear in the stage's context.
    pub deps: Vec<StageId>,
}

impl StageDef {
    #[must_use]
    pub fn new(stage: StageId, deps: &[StageId]) -> Self {
        Self {
            stage,
            deps: deps.to_vec(),
        }
    }
}

/// Ordered list of stages a pipeline runs.
///
/// Construction guarantees that stages are unique and that every dependency
/// appears earlier in the plan than its dependent, so running the plan in
/// order always has dependencies available.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagePlan {
    stages: Vec<StageDef>,
}

impl StagePlan {
    /// # Errors
    ///
    /// Returns `PipelineError::InvalidPlan` for an empty plan, a repeated
    /// stage, or a dependency that does not precede its dependent.
    pub fn new(stages: Vec<StageDef>) -> Result<Self, PipelineError> {
        if stages.is_empty() {
            return Err(PipelineError::InvalidPlan {
                reason: "plan has no stages".to_string(),
            });
        }

        let mut seen: HashSet<StageId> = HashSet::with_capacity(stages.len());
        for def in &stages {
            for dep in &def.deps {
                if *dep == def.stage {
                    return Err(PipelineError::InvalidPlan {
                        reason: format!("stage '{}' depends on itself", def.stage),
                    });
                }
                if !seen.contains(dep) {
                    return Err(PipelineError::InvalidPlan {
                        reason: format!(
                            "stage '{}' depends on '{dep}', which does not run before it",
                            def.stage
                        ),
                    });
                }
            }
            if !seen.insert(def.stage) {
                return Err(PipelineError::InvalidPlan {
                    reason: format!("stage '{}' appears more than once", def.stage),
                });
            }
        }

        Ok(Self { stages })
    }

    /// All eight stages with their default dependencies.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            stages: StageId::ALL
                .into_iter()
                .map(|stage| StageDef::new(stage, stage.default_dependencies()))
                .collect(),
        }
    }

    #[must_use]
    pub fn stages(&self) -> &[StageDef] {
        &self.stages
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    #[must_use]
    pub fn position(&self, stage: StageId) -> Option<usize> {
        self.stages.iter().position(|def| def.stage == stage)
    }

    #[must_use]
    pub fn get(&self, stage: StageId) -> Option<&StageDef> {
        self.stages.iter().find(|def| def.stage == stage)
    }

    #[must_use]
    pub fn contains(&self, stage: StageId) -> bool {
        self.position(stage).is_some()
    }
}

impl Default for StagePlan {
    fn default() -> Self {
        Self::standard()
    }
}
