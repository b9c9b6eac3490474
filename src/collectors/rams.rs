//! Rams collector: does every artifact earn its existence?
//!
//! Dead exports, unused package dependencies, oversized files and files
//! with no content beyond comments.

use crate::collectors::base::{AuditContext, Collector, CollectorReport};
use crate::collectors::manifest::{
    matches_skip_list, DependencyKind, PackageManifest, MANIFEST_FILE, TOOLING_PACKAGES,
};
use crate::config::RamsConfig;
use crate::files::SourceFile;
use crate::graph::SymbolGraph;
use crate::models::{Metrics, Severity, Violation, ViolationType};
use crate::policy::ExclusionPolicy;
use crate::scoring::{rams_score, RamsCounts};
use anyhow::Result;
use rayon::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use tracing::{debug, info};

static BLOCK_COMMENT: OnceLock<Regex> = OnceLock::new();
static LINE_COMMENT: OnceLock<Regex> = OnceLock::new();
static MARKUP_COMMENT: OnceLock<Regex> = OnceLock::new();

fn block_comment() -> &'static Regex {
    BLOCK_COMMENT.get_or_init(|| Regex::new(r"(?s)/\*.*?\*/").expect("valid regex"))
}

fn line_comment() -> &'static Regex {
    LINE_COMMENT.get_or_init(|| Regex::new(r"//[^\n]*").expect("valid regex"))
}

fn markup_comment() -> &'static Regex {
    MARKUP_COMMENT.get_or_init(|| Regex::new(r"(?s)<!--.*?-->").expect("valid regex"))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeadExport {
    pub file: String,
    pub export: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnusedDependency {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: DependencyKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LargeFile {
    pub file: String,
    pub lines: usize,
    pub suggestion: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RamsDetails {
    pub dead_exports: Vec<DeadExport>,
    /// Dead exports found before the report cap was applied
    pub total_dead_exports: usize,
    pub unused_dependencies: Vec<UnusedDependency>,
    pub large_files: Vec<LargeFile>,
    pub empty_files: Vec<String>,
}

/// Whether nothing but comments and whitespace remains
pub fn is_effectively_empty(content: &str) -> bool {
    let without_blocks = block_comment().replace_all(content, "");
    let without_markup = markup_comment().replace_all(&without_blocks, "");
    let without_lines = line_comment().replace_all(&without_markup, "");
    without_lines.trim().is_empty()
}

/// Exported symbols no import can reach, in path order.
///
/// Returns the capped list and the uncapped total.
pub fn find_dead_exports(
    graph: &SymbolGraph,
    policy: &ExclusionPolicy,
    relative: impl Fn(&std::path::Path) -> String,
    cap: usize,
) -> (Vec<DeadExport>, usize) {
    let mut dead = Vec::new();
    let mut total = 0;

    for (path, exports) in graph.exports() {
        let file = relative(path);
        if let Some(reason) = policy.classify(&file) {
            debug!("Skipping exports of {} ({})", file, reason);
            continue;
        }
        if graph.is_wildcard_imported(path) {
            continue;
        }
        for symbol in exports {
            if graph.is_symbol_imported(path, symbol) {
                continue;
            }
            total += 1;
            if dead.len() < cap {
                dead.push(DeadExport {
                    file: file.clone(),
                    export: symbol.clone(),
                });
            }
        }
    }

    (dead, total)
}

/// Declared packages never imported by any scanned file
pub fn find_unused_dependencies(
    manifest: &PackageManifest,
    graph: &SymbolGraph,
    config: &RamsConfig,
) -> Vec<UnusedDependency> {
    manifest
        .declared()
        .filter(|(name, _)| !matches_skip_list(name, TOOLING_PACKAGES))
        .filter(|(name, _)| !matches_skip_list(name, config.skip_dependencies.as_slice()))
        .filter(|(name, _)| graph.package_import_count(name) == 0)
        .map(|(name, kind)| UnusedDependency {
            name: name.to_string(),
            kind,
        })
        .collect()
}

pub fn find_large_files(sources: &[SourceFile], config: &RamsConfig) -> Vec<LargeFile> {
    let policy = ExclusionPolicy::large_files();
    let mut large: Vec<LargeFile> = sources
        .par_iter()
        .filter(|s| !policy.excludes(&s.relative))
        .filter_map(|s| {
            let lines = s.line_count();
            if lines < config.large_file_lines {
                return None;
            }
            let suggestion = if lines >= config.huge_file_lines {
                "Split this file by responsibility into several modules"
            } else {
                "Consider extracting cohesive parts into their own modules"
            };
            Some(LargeFile {
                file: s.relative.clone(),
                lines,
                suggestion: suggestion.to_string(),
            })
        })
        .collect();
    large.sort_by(|a, b| b.lines.cmp(&a.lines).then_with(|| a.file.cmp(&b.file)));
    large
}

pub fn find_empty_files(sources: &[SourceFile]) -> Vec<String> {
    let mut empty: Vec<String> = sources
        .par_iter()
        .filter(|s| is_effectively_empty(&s.content))
        .map(|s| s.relative.clone())
        .collect();
    empty.sort();
    empty
}

#[derive(Debug, Clone, Default)]
pub struct RamsCollector;

impl RamsCollector {
    pub fn new() -> Self {
        Self
    }

    pub fn run(&self, ctx: &AuditContext) -> Metrics<RamsDetails> {
        let config = &ctx.config().rams;
        let mut details = RamsDetails::default();
        let mut violations = Vec::new();
        let mut complete = true;

        'phases: {
            if ctx.expired() {
                complete = false;
                break 'phases;
            }
            let graph = ctx.symbol_graph();

            let policy = ExclusionPolicy::dead_exports(config.library_roots.clone());
            let (dead, total) =
                find_dead_exports(graph, &policy, |p| ctx.relative(p), config.max_dead_exports);
            for d in &dead {
                violations.push(Violation::new(
                    ViolationType::DeadExport,
                    Severity::Medium,
                    format!("Export '{}' in {} is never imported", d.export, d.file),
                    vec![d.file.clone()],
                    format!("Remove '{}' or stop exporting it", d.export),
                ));
            }
            details.dead_exports = dead;
            details.total_dead_exports = total;

            if ctx.expired() {
                complete = false;
                break 'phases;
            }
            if let Some(manifest) = PackageManifest::load(ctx.root()) {
                details.unused_dependencies = find_unused_dependencies(&manifest, graph, config);
            }
            for dep in &details.unused_dependencies {
                let (severity, suggestion) = match dep.kind {
                    DependencyKind::Dependency => (
                        Severity::High,
                        format!("Remove '{}' from dependencies", dep.name),
                    ),
                    DependencyKind::DevDependency => (
                        Severity::Low,
                        format!(
                            "Remove '{}' from devDependencies if no script or tool uses it",
                            dep.name
                        ),
                    ),
                };
                violations.push(Violation::new(
                    ViolationType::UnusedDependency,
                    severity,
                    format!("Package '{}' is declared but never imported", dep.name),
                    vec![MANIFEST_FILE.to_string()],
                    suggestion,
                ));
            }

            if ctx.expired() {
                complete = false;
                break 'phases;
            }
            details.large_files = find_large_files(ctx.sources(), config);
            for large in &details.large_files {
                let severity = if large.lines >= config.huge_file_lines {
                    Severity::High
                } else {
                    Severity::Medium
                };
                violations.push(Violation::new(
                    ViolationType::LargeFile,
                    severity,
                    format!("{} has {} lines", large.file, large.lines),
                    vec![large.file.clone()],
                    large.suggestion.clone(),
                ));
            }

            if ctx.expired() {
                complete = false;
                break 'phases;
            }
            details.empty_files = find_empty_files(ctx.sources());
            for file in &details.empty_files {
                violations.push(Violation::new(
                    ViolationType::EmptyFile,
                    Severity::Low,
                    format!("{} contains no code", file),
                    vec![file.clone()],
                    "Delete the file or give it content",
                ));
            }
        }

        let counts = RamsCounts {
            dead_exports: details.dead_exports.len(),
            unused_dependencies: details.unused_dependencies.len(),
            large_files: details.large_files.len(),
            empty_files: details.empty_files.len(),
        };
        let score = rams_score(counts, &ctx.config().scoring.rams);
        info!(
            "Rams: {} dead exports ({} total), {} unused deps, {} large, {} empty, score {:.1}",
            counts.dead_exports,
            details.total_dead_exports,
            counts.unused_dependencies,
            counts.large_files,
            counts.empty_files,
            score
        );
        Metrics::new(details, score, violations, complete)
    }
}

impl Collector for RamsCollector {
    fn name(&self) -> &'static str {
        "rams"
    }

    fn description(&self) -> &'static str {
        "Dead exports, unused dependencies, oversized and empty files"
    }

    fn collect(&self, ctx: &AuditContext) -> Result<CollectorReport> {
        Ok(CollectorReport::Rams(self.run(ctx)))
    }
}
