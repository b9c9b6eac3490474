//! Source discovery and loading.
//!
//! Walks the audited root (respecting .gitignore and the configured glob
//! exclusions), then reads every matching file in parallel. Unreadable files
//! are skipped; they are a tooling limitation, not a finding.

use crate::error::{AuditError, AuditResult};
use ignore::overrides::{Override, OverrideBuilder};
use ignore::WalkBuilder;
use rayon::prelude::*;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// A source file loaded into memory
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Absolute, lexically normalized path
    pub path: PathBuf,
    /// Root-relative path with forward slashes
    pub relative: String,
    pub content: String,
}

impl SourceFile {
    pub fn new(root: &Path, path: PathBuf, content: String) -> Self {
        let relative = relative_display(root, &path);
        Self {
            path,
            relative,
            content,
        }
    }

    pub fn extension(&self) -> Option<&str> {
        self.path.extension().and_then(|e| e.to_str())
    }

    pub fn line_count(&self) -> usize {
        count_lines(&self.content)
    }
}

/// Compile exclusion globs into an `ignore` override set.
///
/// Every pattern is registered as a negated override so it removes matches
/// without whitelisting everything else.
pub fn build_overrides(root: &Path, patterns: &[String]) -> AuditResult<Override> {
    let mut builder = OverrideBuilder::new(root);
    for pattern in patterns {
        let negated = format!("!{}", pattern.trim_start_matches('!'));
        builder
            .add(&negated)
            .map_err(|e| AuditError::InvalidIgnorePattern {
                pattern: pattern.clone(),
                message: e.to_string(),
            })?;
    }
    builder
        .build()
        .map_err(|e| AuditError::InvalidIgnorePattern {
            pattern: patterns.join(","),
            message: e.to_string(),
        })
}

/// Collect all source files under `root`, respecting .gitignore and `ignore`
pub fn collect_source_files(
    root: &Path,
    ignore: &[String],
    extensions: &[String],
) -> AuditResult<Vec<PathBuf>> {
    let overrides = build_overrides(root, ignore)?;
    Ok(walk_sources(root, overrides, extensions))
}

/// Walk `root` with pre-compiled exclusion overrides
pub fn walk_sources(root: &Path, overrides: Override, extensions: &[String]) -> Vec<PathBuf> {
    let mut builder = WalkBuilder::new(root);
    builder
        .hidden(true)
        .git_ignore(true)
        .git_global(false)
        .git_exclude(true)
        .require_git(false)
        .overrides(overrides)
        .add_custom_ignore_filename(".triadignore");

    let mut files = Vec::new();
    for entry in builder.build().flatten() {
        let path = entry.path();
        if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }
        let matches_ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|ext| extensions.iter().any(|allowed| allowed == ext))
            .unwrap_or(false);
        if matches_ext {
            files.push(normalize_path(path));
        }
    }

    files.sort();
    debug!("Discovered {} source files under {}", files.len(), root.display());
    files
}

/// Read files in parallel; unreadable or non-UTF-8 files are skipped
pub fn load_sources(root: &Path, paths: &[PathBuf]) -> Vec<SourceFile> {
    let mut sources: Vec<SourceFile> = paths
        .par_iter()
        .filter_map(|path| match std::fs::read_to_string(path) {
            Ok(content) => Some(SourceFile::new(root, path.clone(), content)),
            Err(e) => {
                debug!("Skipping unreadable file {}: {}", path.display(), e);
                None
            }
        })
        .collect();
    sources.sort_by(|a, b| a.path.cmp(&b.path));
    sources
}

/// Lexically normalize a path: drop `.` components and fold `..` into
/// their parent. Does not touch the filesystem, so non-existent import
/// candidates normalize too.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Root-relative path with forward slashes (falls back to the full path)
pub fn relative_display(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

/// Path with its final extension removed (`src/a.ts` -> `src/a`)
pub fn strip_extension(path: &Path) -> PathBuf {
    match (path.parent(), path.file_stem()) {
        (Some(parent), Some(stem)) => parent.join(stem),
        _ => path.to_path_buf(),
    }
}

/// Number of lines, counting a trailing line without newline
pub fn count_lines(content: &str) -> usize {
    if content.is_empty() {
        return 0;
    }
    let newlines = memchr::memchr_iter(b'\n', content.as_bytes()).count();
    if content.ends_with('\n') {
        newlines
    } else {
        newlines + 1
    }
}
