//! Command implementations.
//!
//! Each command returns `DocforgeError` on failure; printing errors and
//! choosing the exit code is left to [`run`](super::run).

use camino::Utf8PathBuf;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use docforge_config::Config;
use docforge_pipeline::{LogProgress, Pipeline, PipelineHandle};
use docforge_store::{DocumentStore, ReportFormat};
use docforge_utils::error::{ConfigError, DocforgeError, PipelineError};
use docforge_utils::types::{ProjectInfo, StageId};

use super::args::{GenerateArgs, ReportFormatArg, VersionCommands};

pub(super) fn execute_generate_command(
    args: GenerateArgs,
    config: &Config,
) -> Result<(), DocforgeError> {
    let project = load_project_info(&args)?;
    let pipeline = Pipeline::from_config(config)?.with_progress(Arc::new(LogProgress));
    let mut handle = PipelineHandle::new(pipeline)?;

    match args.stage.as_deref() {
        Some(name) => {
            let stage: StageId = name.parse().map_err(PipelineError::from)?;
            info!(project = %project.name, stage = %stage, "Regenerating single stage");
            seed_saved_dependencies(&mut handle, &project.name, stage)?;
            let document = handle.generate_document(stage, &project)?;
            println!(
                "✓ {} generated ({} bytes)",
                stage.title(),
                document.len()
            );
        }
        None => {
            info!(project = %project.name, stages = handle.pipeline().plan().len(), "Running full pipeline");
            let documents = handle.run(&project)?;
            println!(
                "✓ Generated {} documents for '{}'",
                documents.len(),
                project.name
            );
        }
    }

    for record in handle.pipeline().records() {
        if let Some(location) = &record.location {
            println!("  {:<24} {location}", record.stage.as_str());
        }
    }

    if args.checkpoint {
        let store = handle.pipeline().store();
        match store.checkpoint_now(&project.name, args.label.as_deref(), None)? {
            Some(meta) => println!("✓ Saved version {}", meta.version_id),
            None => println!("No documents to snapshot"),
        }
    }

    println!("\nNext steps:");
    println!("  - Snapshot the documents: docforge versions checkpoint {}", project.name);
    println!("  - Regenerate one stage:   docforge generate {} --stage <stage>", project.name);
    Ok(())
}

/// Record saved documents for `stage`'s dependencies so it can run alone.
fn seed_saved_dependencies(
    handle: &mut PipelineHandle,
    project: &str,
    stage: StageId,
) -> Result<(), DocforgeError> {
    let deps = handle
        .pipeline()
        .plan()
        .get(stage)
        .map(|def| def.deps.clone())
        .unwrap_or_default();
    if deps.is_empty() {
        return Ok(());
    }

    let mut current = handle.pipeline().store().load_current(project)?;
    for dep in deps {
        if let Some(content) = current.remove(&dep) {
            debug!(project, stage = %dep, "Seeding saved dependency");
            handle.pipeline_mut().seed_artifact(dep, content)?;
        }
    }
    Ok(())
}

/// Project info from `--input`, overridden by the positional name,
/// `--description` and `--meta`.
fn load_project_info(args: &GenerateArgs) -> Result<ProjectInfo, DocforgeError> {
    let mut fields = match &args.input {
        Some(path) => read_input_file(path)?,
        None => Map::new(),
    };

    let file_name =
        take_string(&mut fields, "name").or_else(|| take_string(&mut fields, "project_name"));
    let file_description = take_string(&mut fields, "description");

    let name = args
        .project
        .clone()
        .or(file_name)
        .ok_or_else(|| ConfigError::InvalidValue {
            key: "project".to_string(),
            value: "missing (pass a project name or an --input file with \"name\")".to_string(),
        })?;
    let description = args
        .description
        .clone()
        .or(file_description)
        .unwrap_or_default();
    let created_at = take_string(&mut fields, "created_at")
        .and_then(|raw| DateTime::parse_from_rfc3339(&raw).ok())
        .map(|at| at.with_timezone(&Utc));

    let mut project = ProjectInfo::new(name, description);
    if let Some(created_at) = created_at {
        project = project.with_created_at(created_at);
    }
    for (key, value) in fields {
        project = project.with_extra(key, value);
    }
    for pair in &args.meta {
        let (key, value) = parse_meta(pair)?;
        project = project.with_extra(key, value);
    }
    Ok(project)
}

fn read_input_file(path: &Path) -> Result<Map<String, Value>, DocforgeError> {
    let raw = std::fs::read_to_string(path)?;
    match serde_json::from_str::<Value>(&raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(invalid_input(path, "expected a JSON object")),
        Err(e) => Err(invalid_input(path, &e.to_string())),
    }
}

fn invalid_input(path: &Path, reason: &str) -> DocforgeError {
    ConfigError::InvalidValue {
        key: "--input".to_string(),
        value: format!("{}: {reason}", path.display()),
    }
    .into()
}

fn take_string(fields: &mut Map<String, Value>, key: &str) -> Option<String> {
    match fields.remove(key) {
        Some(Value::String(s)) => Some(s),
        Some(other) => {
            fields.insert(key.to_string(), other);
            None
        }
        None => None,
    }
}

fn parse_meta(pair: &str) -> Result<(String, String), DocforgeError> {
    match pair.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(ConfigError::InvalidValue {
            key: "--meta".to_string(),
            value: format!("{pair} (expected KEY=VALUE)"),
        }
        .into()),
    }
}

pub(super) fn execute_stages_command(json: bool) -> Result<(), DocforgeError> {
    if json {
        let stages: Vec<Value> = StageId::ALL
            .iter()
            .map(|stage| {
                json!({
                    "id": stage.as_str(),
                    "title": stage.title(),
                    "filename": stage.filename(),
                    "prompt": stage.prompt_filename(),
                    "deps": stage.default_dependencies().iter().map(|d| d.as_str()).collect::<Vec<_>>(),
                })
            })
            .collect();
        return print_json(&stages);
    }

    for stage in StageId::ALL {
        let deps = stage.default_dependencies();
        let deps = if deps.is_empty() {
            "-".to_string()
        } else {
            deps.iter().map(|d| d.as_str()).collect::<Vec<_>>().join(", ")
        };
        println!(
            "{}. {:<20} {:<28} {}",
            stage.position(),
            stage.as_str(),
            stage.filename(),
            stage.title()
        );
        println!("   depends on: {deps}");
    }
    Ok(())
}

pub(super) fn execute_config_command(json: bool, config: &Config) -> Result<(), DocforgeError> {
    let effective = config.effective_config();
    if json {
        let map: Map<String, Value> = effective
            .into_iter()
            .map(|(key, (value, source))| (key, json!({ "value": value, "source": source })))
            .collect();
        return print_json(&map);
    }

    println!("Effective configuration:");
    for (key, (value, source)) in effective {
        println!("  {key:<20} = {value:<40} [{source}]");
    }
    Ok(())
}

pub(super) fn execute_versions_command(
    command: VersionCommands,
    config: &Config,
) -> Result<(), DocforgeError> {
    let store = DocumentStore::new(utf8("paths.output_dir", config.output_dir())?);
    debug!(root = %store.root(), "Opened document store");

    match command {
        VersionCommands::List { project, json } => {
            let versions = store.list_version_metadata(&project)?;
            if json {
                return print_json(&versions);
            }
            if versions.is_empty() {
                println!("No versions found for '{project}'");
                return Ok(());
            }
            for meta in versions {
                println!(
                    "{}  {:<16}  {} documents  {}",
                    meta.version_id,
                    meta.created_at_display(),
                    meta.doc_types.len(),
                    meta.label.as_deref().unwrap_or("")
                );
            }
        }
        VersionCommands::Checkpoint {
            project,
            id,
            label,
            comment,
        } => {
            let created = match id {
                Some(id) => store.checkpoint(&project, &id, label.as_deref(), comment.as_deref())?,
                None => store.checkpoint_now(&project, label.as_deref(), comment.as_deref())?,
            };
            match created {
                Some(meta) => println!(
                    "✓ Saved version {} ({} documents)",
                    meta.version_id,
                    meta.doc_types.len()
                ),
                None => println!("Nothing to snapshot: '{project}' has no current documents"),
            }
        }
        VersionCommands::Show {
            project,
            version,
            json,
        } => {
            let details = store.version_details(&project, &version)?;
            if json {
                return print_json(&details);
            }
            let meta = &details.metadata;
            println!("Version {} of '{project}'", meta.version_id);
            println!("  Created: {}", meta.created_at_display());
            if let Some(label) = &meta.label {
                println!("  Label:   {label}");
            }
            if let Some(comments) = &meta.comments {
                println!("  Comment: {comments}");
            }
            println!("  Documents:");
            for doc in &details.documents {
                println!("    {} ({} bytes)", doc.filename, doc.size);
                for heading in &doc.headings {
                    println!("      {heading}");
                }
            }
        }
        VersionCommands::Diff { project, from, to } => {
            let diff = store.diff(&project, &from, &to)?;
            println!("Comparing {from} → {to}");
            for (stage, stage_diff) in &diff.stages {
                let summary = if stage_diff.is_new {
                    "added".to_string()
                } else if stage_diff.is_deleted {
                    "deleted".to_string()
                } else if stage_diff.is_unchanged() {
                    "unchanged".to_string()
                } else {
                    format!("changed ({:+} lines)", stage_diff.line_diff)
                };
                println!("  {:<20} {summary}", stage.as_str());
                for line in &stage_diff.diff_details {
                    println!("    {line}");
                }
            }
        }
        VersionCommands::Revert { project, version } => {
            let restored = store.revert(&project, &version)?;
            println!(
                "✓ Restored {} documents from {version} into current/",
                restored.len()
            );
        }
        VersionCommands::Report { project, format } => {
            let format = match format {
                ReportFormatArg::Markdown => ReportFormat::Markdown,
                ReportFormatArg::Text => ReportFormat::Text,
            };
            print!("{}", store.version_report(&project, format)?);
        }
        VersionCommands::Export {
            project,
            version,
            target,
        } => {
            let target = utf8("target", target)?;
            let written = store.export_version(&project, &version, &target)?;
            println!("✓ Exported {} files to {target}", written.len());
        }
    }
    Ok(())
}

fn utf8(key: &str, path: PathBuf) -> Result<Utf8PathBuf, DocforgeError> {
    Utf8PathBuf::from_path_buf(path).map_err(|path| {
        ConfigError::InvalidValue {
            key: key.to_string(),
            value: format!("{} (path is not valid UTF-8)", path.display()),
        }
        .into()
    })
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), DocforgeError> {
    let rendered = serde_json::to_string_pretty(value).map_err(std::io::Error::other)?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generate_args() -> GenerateArgs {
        GenerateArgs {
            project: None,
            description: None,
            input: None,
            meta: Vec::new(),
            stage: None,
            checkpoint: false,
            label: None,
        }
    }

    #[test]
    fn test_parse_meta() {
        assert_eq!(
            parse_meta("audience = small shops").unwrap(),
            ("audience".to_string(), "small shops".to_string())
        );
        assert_eq!(parse_meta("k=a=b").unwrap().1, "a=b");
        assert!(parse_meta("novalue").is_err());
        assert!(parse_meta("=x").is_err());
    }

    #[test]
    fn test_project_info_requires_name() {
        let err = load_project_info(&generate_args()).unwrap_err();
        assert!(matches!(err, DocforgeError::Config(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_project_info_from_input_file_with_overrides() {
        let temp = tempfile::TempDir::new().unwrap();
        let input = temp.path().join("project.json");
        std::fs::write(
            &input,
            r#"{"name": "from-file", "description": "file desc",
                "created_at": "2026-01-02T03:04:05Z", "target_users": ["makers"]}"#,
        )
        .unwrap();

        let args = GenerateArgs {
            input: Some(input),
            description: Some("cli desc".to_string()),
            meta: vec!["budget=small".to_string()],
            ..generate_args()
        };
        let project = load_project_info(&args).unwrap();

        assert_eq!(project.name, "from-file");
        assert_eq!(project.description, "cli desc");
        assert_eq!(project.created_at.to_rfc3339(), "2026-01-02T03:04:05+00:00");
        assert_eq!(project.extra["target_users"], json!(["makers"]));
        assert_eq!(project.extra["budget"], json!("small"));
        assert!(!project.extra.contains_key("name"));
        // the file's description was consumed, not copied into extra
        assert!(!project.extra.contains_key("description"));
    }

    #[test]
    fn test_project_name_key_is_a_fallback_for_name() {
        let temp = tempfile::TempDir::new().unwrap();
        let both = temp.path().join("both.json");
        std::fs::write(&both, r#"{"name": "primary", "project_name": "alias"}"#).unwrap();
        let only_alias = temp.path().join("alias.json");
        std::fs::write(&only_alias, r#"{"project_name": "alias"}"#).unwrap();

        let project = load_project_info(&GenerateArgs {
            input: Some(both),
            ..generate_args()
        })
        .unwrap();
        assert_eq!(project.name, "primary");
        assert_eq!(project.extra["project_name"], json!("alias"));

        let project = load_project_info(&GenerateArgs {
            input: Some(only_alias),
            ..generate_args()
        })
        .unwrap();
        assert_eq!(project.name, "alias");
        assert!(project.extra.is_empty());
    }

    #[test]
    fn test_input_file_must_be_object() {
        let temp = tempfile::TempDir::new().unwrap();
        let input = temp.path().join("project.json");
        std::fs::write(&input, "[1, 2]").unwrap();

        let args = GenerateArgs {
            project: Some("p".to_string()),
            input: Some(input),
            ..generate_args()
        };
        assert!(load_project_info(&args).is_err());
    }
}
