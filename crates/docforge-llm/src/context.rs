//! Generation context handed to the completion client, and prompt assembly.

use serde::{Deserialize, Serialize};

use docforge_utils::error::LlmError;
use docforge_utils::types::{ProjectInfo, StageId};

/// One prior document supplied as context to a later stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainEntry {
    #[serde(rename = "type")]
    pub stage: StageId,
    pub title: String,
    pub content: String,
}

impl ChainEntry {
    #[must_use]
    pub fn new(stage: StageId, content: impl Into<String>) -> Self {
        Self {
            stage,
            title: stage.title().to_string(),
            content: content.into(),
        }
    }
}

/// Project metadata plus the ordered dependency chain for the stage about to run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationContext {
    pub project_info: ProjectInfo,
    pub document_chain: Vec<ChainEntry>,
}

impl GenerationContext {
    #[must_use]
    pub fn new(project_info: ProjectInfo) -> Self {
        Self {
            project_info,
            document_chain: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_chain(mut self, document_chain: Vec<ChainEntry>) -> Self {
        self.document_chain = document_chain;
        self
    }

    /// Stage ids in the chain, in order.
    #[must_use]
    pub fn chain_stages(&self) -> Vec<StageId> {
        self.document_chain.iter().map(|e| e.stage).collect()
    }
}

/// Append the context to `prompt`.
///
/// With a non-empty chain, each prior document is rendered under a
/// `## {title} ({type})` heading, followed by the project metadata as JSON.
/// Without one, the whole context is appended as a single JSON block.
pub fn assemble_prompt(prompt: &str, context: &GenerationContext) -> Result<String, LlmError> {
    if context.document_chain.is_empty() {
        let json = to_pretty_json(context)?;
        return Ok(format!("{prompt}\n\nContext:\n{json}"));
    }

    let mut previous = String::new();
    for entry in &context.document_chain {
        previous.push_str(&format!(
            "\n\n## {} ({})\n\n{}",
            entry.title, entry.stage, entry.content
        ));
    }
    let project = to_pretty_json(&context.project_info)?;

    Ok(format!(
        "{prompt}\n\n# Previous documents\n{previous}\n\n# Project info\n{project}"
    ))
}

fn to_pretty_json<T: Serialize>(value: &T) -> Result<String, LlmError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| LlmError::Misconfiguration(format!("context is not serializable: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn info() -> ProjectInfo {
        ProjectInfo::new("shop", "An online shop")
            .with_created_at(Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap())
    }

    #[test]
    fn test_prompt_without_chain_embeds_whole_context() {
        let ctx = GenerationContext::new(info());

        let full = assemble_prompt("# Write a brainstorm", &ctx).unwrap();

        assert!(full.starts_with("# Write a brainstorm\n\nContext:\n{"));
        assert!(full.contains("\"document_chain\": []"));
        assert!(full.contains("\"name\": \"shop\""));
    }

    #[test]
    fn test_prompt_with_chain_renders_documents_in_order() {
        let ctx = GenerationContext::new(info()).with_chain(vec![
            ChainEntry::new(StageId::Brainstorm, "ideas"),
            ChainEntry::new(StageId::RequirementConfirm, "reqs"),
        ]);

        let full = assemble_prompt("P", &ctx).unwrap();

        let expected_prefix = "P\n\n# Previous documents\n\n\n## Brainstorm (brainstorm)\n\nideas\n\n## Requirement Confirmation (requirement_confirm)\n\nreqs\n\n# Project info\n{";
        assert!(full.starts_with(expected_prefix), "got: {full}");
        assert!(!full.contains("document_chain"));
    }

    #[test]
    fn test_chain_entry_serializes_stage_as_type() {
        let json = serde_json::to_value(ChainEntry::new(StageId::Prd, "x")).unwrap();
        assert_eq!(json["type"], "prd");
        assert_eq!(json["title"], "Product Requirements Document (PRD)");
    }
}
