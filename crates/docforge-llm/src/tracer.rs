//! Model I/O tracing.
//!
//! When enabled, every successful completion is recorded with its prompt,
//! messages, response and timing. Tracing never affects the call result.

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

use docforge_utils::atomic_write::write_file_atomic;
use docforge_utils::types::StageId;

use crate::types::Message;

/// One traced completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceRecord {
    pub timestamp: DateTime<Utc>,
    pub project: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<StageId>,
    pub model: String,
    pub duration_ms: u128,
    pub prompt: String,
    pub messages: Vec<Message>,
    pub response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens_input: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens_output: Option<u64>,
}

pub trait InvocationTracer: Send + Sync {
    fn record(&self, record: &TraceRecord) -> Result<()>;
}

/// Writes each record as a pretty-printed JSON file under a directory.
#[derive(Debug)]
pub struct FileTracer {
    dir: Utf8PathBuf,
    sequence: AtomicU64,
}

impl FileTracer {
    pub fn new(dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            sequence: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn dir(&self) -> &Utf8Path {
        &self.dir
    }

    fn file_name(&self, record: &TraceRecord) -> String {
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        let stage = record.stage.map_or("adhoc", StageId::as_str);
        format!(
            "{}-{:04}-{}-{}.json",
            record.timestamp.format("%Y%m%dT%H%M%S%3fZ"),
            seq,
            sanitize(&record.project),
            stage
        )
    }
}

impl InvocationTracer for FileTracer {
    fn record(&self, record: &TraceRecord) -> Result<()> {
        let path = self.dir.join(self.file_name(record));
        let json = serde_json::to_string_pretty(record).context("Failed to serialize trace record")?;
        write_file_atomic(&path, &json)
            .with_context(|| format!("Failed to write trace record to: {path}"))?;
        Ok(())
    }
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn record() -> TraceRecord {
        TraceRecord {
            timestamp: Utc.with_ymd_and_hms(2025, 3, 4, 5, 6, 7).unwrap(),
            project: "my shop".to_string(),
            stage: Some(StageId::Prd),
            model: "gpt-4".to_string(),
            duration_ms: 42,
            prompt: "write".to_string(),
            messages: vec![Message::system("sys"), Message::user("write")],
            response: "# PRD".to_string(),
            tokens_input: Some(10),
            tokens_output: None,
        }
    }

    #[test]
    fn test_file_tracer_writes_json() {
        let temp = TempDir::new().unwrap();
        let dir = Utf8PathBuf::from_path_buf(temp.path().join("traces")).unwrap();
        let tracer = FileTracer::new(dir.clone());

        tracer.record(&record()).unwrap();
        tracer.record(&record()).unwrap();

        let mut names: Vec<_> = std::fs::read_dir(&dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        names.sort();
        assert_eq!(names.len(), 2);
        assert_eq!(names[0], "20250304T050607000Z-0000-my_shop-prd.json");

        let text = std::fs::read_to_string(dir.join(&names[0])).unwrap();
        let parsed: TraceRecord = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, record());
    }

    #[test]
    fn test_optional_fields_are_omitted() {
        let mut rec = record();
        rec.stage = None;
        let json = serde_json::to_value(&rec).unwrap();
        assert!(json.get("stage").is_none());
        assert!(json.get("tokens_output").is_none());
    }
}
