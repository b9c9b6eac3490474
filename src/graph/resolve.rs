//! Import specifier resolution
//!
//! Relative specifiers resolve to a set of *candidate* file paths; every
//! candidate is registered as satisfied. Over-approximating here keeps
//! false "dead" and "orphan" flags down.

use crate::files::normalize_path;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Suffixes tried after the raw specifier, in order
pub const RESOLUTION_SUFFIXES: &[&str] = &[
    "",
    ".ts",
    ".tsx",
    ".js",
    ".jsx",
    "/index.ts",
    "/index.js",
    ".mjs",
    ".cjs",
    ".svelte",
    ".vue",
    "/index.tsx",
    "/index.jsx",
];

/// Module prefixes that are path aliases or runtime builtins, never packages
static NON_PACKAGE_PREFIXES: &[&str] = &[
    "node:", "bun:", "$lib", "$app", "$env", "$service-worker", "~/", "@/", "#", "virtual:",
    "http:", "https:", "data:",
];

pub fn is_relative_specifier(spec: &str) -> bool {
    spec.starts_with('.')
}

fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut s: OsString = base.as_os_str().to_os_string();
    s.push(suffix);
    PathBuf::from(s)
}

/// Candidate files a relative specifier may refer to.
///
/// Returns an empty list for non-relative specifiers.
pub fn resolve_candidates(importer: &Path, spec: &str) -> Vec<PathBuf> {
    if !is_relative_specifier(spec) {
        return Vec::new();
    }

    // Strip loader queries such as `?raw` / `?url`
    let spec = spec.split(['?', '#']).next().unwrap_or(spec);
    let dir = importer.parent().unwrap_or_else(|| Path::new(""));
    let base = normalize_path(&dir.join(spec));

    let mut candidates: Vec<PathBuf> = RESOLUTION_SUFFIXES
        .iter()
        .map(|suffix| with_suffix(&base, suffix))
        .collect();

    // ESM TypeScript writes `./x.js` for `x.ts`
    let swapped: &[&str] = match base.extension().and_then(|e| e.to_str()) {
        Some("js") => &["ts", "tsx"],
        Some("jsx") => &["tsx"],
        Some("mjs") => &["mts"],
        Some("cjs") => &["cts"],
        _ => &[],
    };
    for ext in swapped {
        candidates.push(base.with_extension(ext));
    }

    candidates
}

/// Top-level package name of a bare specifier.
///
/// `@scope/name/sub` -> `@scope/name`, `lodash/fp` -> `lodash`. Returns
/// `None` for relative/absolute paths, aliases and runtime builtins.
pub fn package_name(spec: &str) -> Option<String> {
    let spec = spec.trim();
    if spec.is_empty() || spec.starts_with('.') || spec.starts_with('/') {
        return None;
    }
    if NON_PACKAGE_PREFIXES.iter().any(|p| spec.starts_with(p)) {
        return None;
    }

    let spec = spec.split(['?', '#']).next().unwrap_or(spec);
    let mut parts = spec.split('/');
    let first = parts.next()?;
    if let Some(scope) = first.strip_prefix('@') {
        let name = parts.next()?;
        if scope.is_empty() || name.is_empty() {
            return None;
        }
        Some(format!("{}/{}", first, name))
    } else {
        Some(first.to_string())
    }
}
