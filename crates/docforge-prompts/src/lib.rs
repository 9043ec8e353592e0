//! Stage prompt lookup for docforge
//!
//! The pipeline asks a [`PromptCatalog`] for each stage's prompt. Prompts that
//! fail structural validation are treated as absent.

mod catalog;
pub mod validation;

pub use catalog::{DirectoryPromptCatalog, PromptCatalog, PromptSummary, StaticPromptCatalog};
pub use validation::validate_prompt;
