//! Discovery and loading of source files under a project root.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::{Error, Result};

pub const DEFAULT_EXTENSIONS: [&str; 4] = [".ts", ".tsx", ".js", ".jsx"];

/// A file picked up by the walker.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Path relative to the scan root, `/`-separated.
    pub relative_path: String,
}

impl SourceFile {
    pub fn read(&self) -> Result<String> { read_file_content(&self.path) }
}

/// Recursively list files under `root` whose extension is in `extensions`
/// (matched case-insensitively, with or without the leading dot). Sorted by path.
///
/// A missing or unreadable `root` is an error; unreadable entries below it are skipped.
pub fn list_source_files(root: &Path, extensions: &[String]) -> Result<Vec<SourceFile>> {
    fs::metadata(root).map_err(|source| Error::Io { path: root.display().to_string(), source })?;
    let allowed: Vec<String> = extensions.iter().map(|e| e.trim_start_matches('.').to_ascii_lowercase()).collect();
    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(root).into_iter() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!(error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() { continue; }
        let path = entry.path();
        let ext = path.extension().and_then(|s| s.to_str()).map(str::to_ascii_lowercase);
        if !ext.is_some_and(|e| allowed.contains(&e)) { continue; }
        files.push(SourceFile { path: path.to_path_buf(), relative_path: relative_path(root, path) });
    }
    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(files)
}

fn relative_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components().map(|c| c.as_os_str().to_string_lossy()).collect::<Vec<_>>().join("/")
}

/// Read a file as UTF-8, falling back to a lossy decode.
pub fn read_file_content(file_path: &Path) -> Result<String> {
    let io_err = |source| Error::Io { path: file_path.display().to_string(), source };
    match fs::read_to_string(file_path) {
        Ok(content) => Ok(content),
        Err(_) => Ok(String::from_utf8_lossy(&fs::read(file_path).map_err(io_err)?).to_string()),
    }
}
