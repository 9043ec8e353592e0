//! Atomic file writes.
//!
//! A temporary file is created next to the target, fsynced, then renamed
//! over it. Content is written byte for byte.

use anyhow::{Context, Result};
use camino::Utf8Path;
use std::fs;
use std::io::Write;

use tempfile::NamedTempFile;

/// Atomically write text to `path`.
///
/// Missing parent directories are created. Readers observe either the old
/// file or the complete new one, never a partial write.
pub fn write_file_atomic(path: &Utf8Path, content: &str) -> Result<()> {
    write_bytes_atomic(path, content.as_bytes())
}

/// Atomically write raw bytes to `path`.
pub fn write_bytes_atomic(path: &Utf8Path, bytes: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    fs::create_dir_all(parent)
        .with_context(|| format!("Failed to create parent directory: {parent}"))?;

    // Same directory as the target, so the rename never crosses filesystems
    let mut temp_file = NamedTempFile::new_in(parent)
        .with_context(|| format!("Failed to create temporary file in: {parent}"))?;

    temp_file
        .write_all(bytes)
        .with_context(|| "Failed to write content to temporary file")?;

    temp_file
        .as_file()
        .sync_all()
        .with_context(|| "Failed to fsync temporary file")?;

    temp_file
        .persist(path.as_std_path())
        .map_err(|e| anyhow::Error::new(e.error))
        .with_context(|| format!("Failed to atomically write file: {path}"))?;

    Ok(())
}

/// Normalize line endings to LF
pub fn normalize_line_endings(content: &str) -> String {
    content.replace("\r\n", "\n").replace('\r', "\n")
}

/// Read a UTF-8 file, normalizing line endings to LF.
pub fn read_file_with_crlf_tolerance(path: &Utf8Path) -> Result<String> {
    let content = fs::read_to_string(path.as_std_path())
        .with_context(|| format!("Failed to read file: {path}"))?;

    Ok(normalize_line_endings(&content))
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use tempfile::TempDir;

    fn utf8_dir(temp: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap()
    }

    #[test]
    fn test_normalize_line_endings() {
        assert_eq!(
            normalize_line_endings("line1\r\nline2\r\nline3"),
            "line1\nline2\nline3"
        );
        assert_eq!(normalize_line_endings("line1\rline2"), "line1\nline2");
        assert_eq!(
            normalize_line_endings("mixed\r\nline\nending\r"),
            "mixed\nline\nending\n"
        );
    }

    #[test]
    fn test_atomic_write_basic() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = utf8_dir(&temp_dir).join("test.md");

        let content = "# Title\nbody";
        write_file_atomic(&file_path, content).unwrap();

        assert_eq!(fs::read_to_string(&file_path).unwrap(), content);
    }

    #[test]
    fn test_atomic_write_keeps_carriage_returns() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = utf8_dir(&temp_dir).join("crlf.md");

        write_file_atomic(&file_path, "line1\r\nline2\rline3").unwrap();

        let read_content = fs::read_to_string(&file_path).unwrap();
        assert_eq!(read_content, "line1\r\nline2\rline3");
    }

    #[test]
    fn test_atomic_write_creates_parent_directory() {
        let temp_dir = TempDir::new().unwrap();
        let nested = utf8_dir(&temp_dir).join("a").join("b").join("doc.md");

        write_file_atomic(&nested, "content").unwrap();

        assert!(nested.exists());
    }

    #[test]
    fn test_atomic_write_overwrites_existing() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = utf8_dir(&temp_dir).join("doc.md");

        write_file_atomic(&file_path, "first").unwrap();
        write_file_atomic(&file_path, "second").unwrap();

        assert_eq!(fs::read_to_string(&file_path).unwrap(), "second");
        let leftovers: Vec<_> = fs::read_dir(temp_dir.path()).unwrap().collect();
        assert_eq!(leftovers.len(), 1, "temporary files must not linger");
    }

    #[test]
    fn test_write_bytes_atomic_preserves_bytes() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = utf8_dir(&temp_dir).join("raw.bin");

        write_bytes_atomic(&file_path, b"a\r\nb").unwrap();

        assert_eq!(fs::read(&file_path).unwrap(), b"a\r\nb");
    }

    #[test]
    fn test_read_file_with_crlf_tolerance() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = utf8_dir(&temp_dir).join("win.md");
        fs::write(&file_path, "a\r\nb\r\n").unwrap();

        assert_eq!(read_file_with_crlf_tolerance(&file_path).unwrap(), "a\nb\n");
    }
}
