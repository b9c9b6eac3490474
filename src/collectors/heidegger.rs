//! Heidegger collector: does each part serve the whole?
//!
//! Package completeness, orphaned modules, import cycles and undocumented
//! public functions.

use crate::collectors::base::{AuditContext, Collector, CollectorReport};
use crate::collectors::manifest::{PackageManifest, MANIFEST_FILE};
use crate::config::HeideggerConfig;
use crate::files::SourceFile;
use crate::graph::{find_cycles, SymbolGraph};
use crate::models::{Metrics, Severity, Violation, ViolationType};
use crate::policy::ExclusionPolicy;
use crate::scoring::heidegger_score;
use anyhow::Result;
use rayon::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;
use tracing::{debug, info};

static EXPORTED_FUNCTION: OnceLock<Regex> = OnceLock::new();

/// `export [default] [async] function` and exported arrow/function-expression constants
fn exported_function() -> &'static Regex {
    EXPORTED_FUNCTION.get_or_init(|| {
        Regex::new(
            r"\bexport\s+(?:(?:default\s+)?(?:async\s+)?function\b|const\s+[A-Za-z_$][\w$]*\s*(?::[^=\n]+)?=\s*(?:async\s+)?(?:function\b|\(|[A-Za-z_$][\w$]*\s*=>))",
        )
        .expect("valid regex")
    })
}

static TEST_DIRS: &[&str] = &["test", "tests", "__tests__", "e2e", "src/__tests__"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageCompleteness {
    /// Manifest name, or the directory when there is none
    pub package: String,
    /// Root-relative directory (`.` for the root)
    pub path: String,
    pub has_src: bool,
    pub has_tests: bool,
    pub has_readme: bool,
    pub has_package_json: bool,
    pub completeness: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrphanedFile {
    pub file: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircularDependency {
    pub cycle: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndocumentedFile {
    pub file: String,
    pub exported: usize,
    pub documented: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeideggerDetails {
    pub packages: Vec<PackageCompleteness>,
    pub average_completeness: f64,
    pub orphaned_files: Vec<OrphanedFile>,
    /// Orphans found before the report cap was applied
    pub total_orphans: usize,
    pub circular_dependencies: Vec<CircularDependency>,
    pub missing_documentation: Vec<UndocumentedFile>,
}

/// Package roots: children of the configured package directories, or the
/// audited root itself for a single-package layout. Root-relative, sorted.
pub fn discover_packages(root: &Path, package_dirs: &[String]) -> Vec<String> {
    let mut packages = Vec::new();
    for dir in package_dirs {
        let Ok(entries) = std::fs::read_dir(root.join(dir)) else {
            continue;
        };
        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with('.') || name == "node_modules" {
                continue;
            }
            if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                packages.push(format!("{}/{}", dir.trim_end_matches('/'), name));
            }
        }
    }
    packages.sort();
    if packages.is_empty() {
        packages.push(".".to_string());
    }
    packages
}

fn has_readme(dir: &Path) -> bool {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries.flatten().any(|e| {
                e.file_name()
                    .to_string_lossy()
                    .to_ascii_lowercase()
                    .starts_with("readme")
            })
        })
        .unwrap_or(false)
}

fn is_test_source(relative: &str) -> bool {
    let name = relative.rsplit('/').next().unwrap_or(relative);
    name.contains(".test.") || name.contains(".spec.")
}

/// Score one package directory
pub fn package_completeness(
    root: &Path,
    package: &str,
    sources: &[SourceFile],
    config: &HeideggerConfig,
) -> PackageCompleteness {
    let dir = if package == "." {
        root.to_path_buf()
    } else {
        root.join(package)
    };
    let prefix = if package == "." {
        String::new()
    } else {
        format!("{}/", package)
    };

    let has_src = dir.join("src").is_dir();
    let has_package_json = dir.join(MANIFEST_FILE).is_file();
    let has_readme = has_readme(&dir);
    let has_tests = TEST_DIRS.iter().any(|d| dir.join(d).is_dir())
        || sources
            .iter()
            .any(|s| s.relative.starts_with(&prefix) && is_test_source(&s.relative));

    let w = &config.completeness;
    let mut completeness = 0.0;
    if has_src {
        completeness += w.src;
    }
    if has_package_json {
        completeness += w.manifest;
    }
    if has_readme {
        completeness += w.readme;
    }
    if has_tests {
        completeness += w.tests;
    }

    let name = PackageManifest::load(&dir)
        .and_then(|m| m.name)
        .unwrap_or_else(|| package.to_string());

    PackageCompleteness {
        package: name,
        path: package.to_string(),
        has_src,
        has_tests,
        has_readme,
        has_package_json,
        completeness: completeness.clamp(0.0, 1.0),
    }
}

pub fn completeness_severity(completeness: f64, config: &HeideggerConfig) -> Option<Severity> {
    if completeness < config.high_below {
        Some(Severity::High)
    } else if completeness < config.medium_below {
        Some(Severity::Medium)
    } else {
        None
    }
}

fn completeness_violation(pkg: &PackageCompleteness, severity: Severity) -> Violation {
    let mut missing = Vec::new();
    if !pkg.has_src {
        missing.push("src/");
    }
    if !pkg.has_package_json {
        missing.push(MANIFEST_FILE);
    }
    if !pkg.has_readme {
        missing.push("README");
    }
    if !pkg.has_tests {
        missing.push("tests");
    }
    Violation::new(
        ViolationType::IncompletePackage,
        severity,
        format!(
            "Package {} is {:.0}% complete (missing {})",
            pkg.package,
            pkg.completeness * 100.0,
            missing.join(", ")
        ),
        vec![pkg.path.clone()],
        format!("Add {} to {}", missing.join(", "), pkg.path),
    )
}

/// Non-excluded files that no relative import reaches
pub fn find_orphans(
    sources: &[SourceFile],
    graph: &SymbolGraph,
    policy: &ExclusionPolicy,
) -> Vec<OrphanedFile> {
    sources
        .iter()
        .filter(|s| !policy.excludes(&s.relative))
        .filter(|s| !graph.has_inbound(&s.path))
        .map(|s| OrphanedFile {
            file: s.relative.clone(),
            reason: "No module imports this file".to_string(),
        })
        .collect()
}

/// Whether `before` ends in a `/** ... */` block (plain `/* */` does not count)
fn is_doc_block_end(before: &str) -> bool {
    let before = before.trim_end();
    if !before.ends_with("*/") {
        return false;
    }
    let body = &before[..before.len() - 2];
    body.rfind("/*")
        .map(|open| body[open..].starts_with("/**"))
        .unwrap_or(false)
}

/// Count exported functions and how many carry a preceding doc block
pub fn documentation_counts(content: &str) -> (usize, usize) {
    let mut exported = 0;
    let mut documented = 0;
    for m in exported_function().find_iter(content) {
        exported += 1;
        if is_doc_block_end(&content[..m.start()]) {
            documented += 1;
        }
    }
    (exported, documented)
}

/// Files documenting fewer than half their exported functions, worst first
pub fn find_missing_documentation(sources: &[SourceFile]) -> Vec<UndocumentedFile> {
    let mut files: Vec<UndocumentedFile> = sources
        .par_iter()
        .filter_map(|s| {
            let (exported, documented) = documentation_counts(&s.content);
            if exported == 0 || documented * 2 >= exported {
                return None;
            }
            Some(UndocumentedFile {
                file: s.relative.clone(),
                exported,
                documented,
            })
        })
        .collect();
    files.sort_by(|a, b| {
        (b.exported - b.documented)
            .cmp(&(a.exported - a.documented))
            .then_with(|| a.file.cmp(&b.file))
    });
    files
}

#[derive(Debug, Clone, Default)]
pub struct HeideggerCollector;

impl HeideggerCollector {
    pub fn new() -> Self {
        Self
    }

    pub fn run(&self, ctx: &AuditContext) -> Metrics<HeideggerDetails> {
        let config = &ctx.config().heidegger;
        let mut details = HeideggerDetails::default();
        let mut violations = Vec::new();
        let mut complete = true;

        'phases: {
            if ctx.expired() {
                complete = false;
                break 'phases;
            }
            let sources = ctx.sources();

            for package in discover_packages(ctx.root(), &config.package_dirs) {
                let pkg = package_completeness(ctx.root(), &package, sources, config);
                if let Some(severity) = completeness_severity(pkg.completeness, config) {
                    violations.push(completeness_violation(&pkg, severity));
                }
                details.packages.push(pkg);
            }
            if !details.packages.is_empty() {
                details.average_completeness = details
                    .packages
                    .iter()
                    .map(|p| p.completeness)
                    .sum::<f64>()
                    / details.packages.len() as f64;
            }

            if ctx.expired() {
                complete = false;
                break 'phases;
            }
            let graph = ctx.symbol_graph();
            let policy = ExclusionPolicy::orphans(ctx.config().rams.library_roots.clone());
            let mut orphans = find_orphans(sources, graph, &policy);
            details.total_orphans = orphans.len();
            orphans.truncate(config.max_orphans);
            for orphan in &orphans {
                violations.push(Violation::new(
                    ViolationType::OrphanedFile,
                    Severity::Low,
                    format!("{} is never imported", orphan.file),
                    vec![orphan.file.clone()],
                    "Import it where it is needed or delete it",
                ));
            }
            details.orphaned_files = orphans;

            if ctx.expired() {
                complete = false;
                break 'phases;
            }
            for cycle in find_cycles(&graph.file_graph()) {
                let cycle: Vec<String> = cycle
                    .iter()
                    .map(|p| ctx.relative(Path::new(p)))
                    .collect();
                let members = cycle[..cycle.len().saturating_sub(1)].to_vec();
                violations.push(Violation::new(
                    ViolationType::CircularDependency,
                    Severity::High,
                    format!("Circular import: {}", cycle.join(" -> ")),
                    members,
                    "Break the cycle by moving shared code into a module both can import",
                ));
                details.circular_dependencies.push(CircularDependency { cycle });
            }

            if ctx.expired() {
                complete = false;
                break 'phases;
            }
            let mut undocumented = find_missing_documentation(sources);
            undocumented.truncate(config.max_missing_docs);
            for file in &undocumented {
                violations.push(Violation::new(
                    ViolationType::MissingDocumentation,
                    Severity::Low,
                    format!(
                        "{} documents {} of {} exported functions",
                        file.file, file.documented, file.exported
                    ),
                    vec![file.file.clone()],
                    "Add doc comments to the exported functions",
                ));
            }
            details.missing_documentation = undocumented;
        }

        debug!(
            "Heidegger: {} packages, average completeness {:.2}",
            details.packages.len(),
            details.average_completeness
        );
        let score = heidegger_score(
            details.average_completeness,
            details.orphaned_files.len(),
            details.circular_dependencies.len(),
            &ctx.config().scoring.heidegger,
        );
        info!(
            "Heidegger: {} orphans ({} total), {} cycles, {} undocumented, score {:.1}",
            details.orphaned_files.len(),
            details.total_orphans,
            details.circular_dependencies.len(),
            details.missing_documentation.len(),
            score
        );
        Metrics::new(details, score, violations, complete)
    }
}

impl Collector for HeideggerCollector {
    fn name(&self) -> &'static str {
        "heidegger"
    }

    fn description(&self) -> &'static str {
        "Package completeness, orphaned files, import cycles and missing documentation"
    }

    fn collect(&self, ctx: &AuditContext) -> Result<CollectorReport> {
        Ok(CollectorReport::Heidegger(self.run(ctx)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn source(rel: &str, content: &str) -> SourceFile {
        let root = Path::new("/repo");
        SourceFile::new(root, root.join(rel), content.to_string())
    }

    #[test]
    fn test_documentation_counts() {
        let src = r#"
/** Formats a value */
export function format() {}

export async function load() {}

/**
 * Parses input
 */
export const parse = (input: string) => input;

export const handler = async (req) => req;
export const curried = x => x;
export const VALUE = 3;
"#;
        assert_eq!(documentation_counts(src), (5, 2));
    }

    #[test]
    fn test_plain_block_comment_is_not_documentation() {
        let src = "/* eslint-disable */\nexport function a() {}\n/** Documented */\nexport function b() {}\n/**/\nexport function c() {}";
        assert_eq!(documentation_counts(src), (3, 1));
    }

    #[test]
    fn test_missing_documentation_threshold() {
        let half = source(
            "src/half.ts",
            "/** a */\nexport function a() {}\nexport function b() {}",
        );
        let none = source("src/none.ts", "export function a() {}\nexport function b() {}\nexport function c() {}");
        let one = source("src/one.ts", "export function a() {}");
        let found = find_missing_documentation(&[half, none, one]);
        let files: Vec<&str> = found.iter().map(|f| f.file.as_str()).collect();
        assert_eq!(files, vec!["src/none.ts", "src/one.ts"]);
    }

    #[test]
    fn test_completeness_severity() {
        let config = HeideggerConfig::default();
        assert_eq!(completeness_severity(0.4, &config), Some(Severity::High));
        assert_eq!(completeness_severity(0.5, &config), Some(Severity::Medium));
        assert_eq!(completeness_severity(0.7, &config), Some(Severity::Medium));
        assert_eq!(completeness_severity(0.75, &config), None);
        assert_eq!(completeness_severity(1.0, &config), None);
    }

    #[test]
    fn test_package_discovery_and_completeness() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("packages/full/src")).unwrap();
        fs::create_dir_all(root.join("packages/full/tests")).unwrap();
        fs::write(root.join("packages/full/package.json"), r#"{"name":"@acme/full"}"#).unwrap();
        fs::write(root.join("packages/full/README.md"), "# full").unwrap();
        fs::create_dir_all(root.join("packages/bare")).unwrap();
        fs::create_dir_all(root.join("packages/.cache")).unwrap();

        let packages = discover_packages(root, &HeideggerConfig::default().package_dirs);
        assert_eq!(packages, vec!["packages/bare", "packages/full"]);

        let config = HeideggerConfig::default();
        let full = package_completeness(root, "packages/full", &[], &config);
        assert_eq!(full.package, "@acme/full");
        assert_eq!(full.path, "packages/full");
        assert!((full.completeness - 1.0).abs() < 1e-9);

        let bare = package_completeness(root, "packages/bare", &[], &config);
        assert_eq!(bare.completeness, 0.0);
    }

    #[test]
    fn test_single_package_layout_uses_root() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(discover_packages(dir.path(), &["packages".to_string()]), vec!["."]);
    }

    #[test]
    fn test_colocated_tests_count() {
        let dir = tempfile::tempdir().unwrap();
        let sources = vec![source("src/a.test.ts", "")];
        let pkg = package_completeness(dir.path(), ".", &sources, &HeideggerConfig::default());
        assert!(pkg.has_tests);
        assert!((pkg.completeness - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_orphans_respect_policy() {
        let sources = vec![
            source("src/index.ts", "import { a } from './a';"),
            source("src/a.ts", "export const a = 1;"),
            source("src/lonely.ts", "export const x = 1;"),
            source("src/lonely.test.ts", "import { x } from './lonely.js';"),
            source("scripts/seed.ts", "console.log(1);"),
            source("src/unused.ts", "export const y = 2;"),
        ];
        let graph = SymbolGraph::build(&sources);
        let orphans = find_orphans(&sources, &graph, &ExclusionPolicy::orphans(Vec::new()));
        let files: Vec<&str> = orphans.iter().map(|o| o.file.as_str()).collect();
        assert_eq!(files, vec!["src/unused.ts"]);
    }
}
