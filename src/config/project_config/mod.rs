//! Project-level configuration support
//!
//! Loads per-project configuration from `triad.toml` or `.triadrc.json` in the
//! audited root. Every heuristic constant the collectors use lives here with
//! its calibrated value as the default.
//!
//! # Configuration Format
//!
//! ```toml
//! # triad.toml
//!
//! [exclude]
//! paths = ["generated/", "**/fixtures/**"]
//!
//! [dry]
//! min_lines = 5
//! min_tokens = 50
//! timeout_secs = 120
//!
//! [rams]
//! large_file_lines = 500
//! library_roots = ["packages/sdk/src"]
//!
//! [heidegger]
//! package_dirs = ["packages"]
//!
//! [scoring.rams]
//! dead_exports = { per_item = 0.1, cap = 2.0 }
//!
//! [audit]
//! timeout_secs = 300
//! ```

use crate::error::{AuditError, AuditResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

/// File names searched in the audited root, in priority order
pub const CONFIG_FILE_NAMES: &[&str] = &["triad.toml", ".triadrc.json"];

/// Built-in exclusion patterns for vendored, built and generated output.
/// Applied automatically unless `skip_defaults = true`.
pub const DEFAULT_EXCLUDE_PATTERNS: &[&str] = &[
    "**/node_modules/**",
    "**/dist/**",
    "**/build/**",
    "**/.svelte-kit/**",
    "**/.next/**",
    "**/coverage/**",
    "**/*.min.js",
];

/// Source extensions scanned by default
pub const DEFAULT_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx", "mjs", "cjs", "svelte", "vue"];

/// Project-level configuration loaded from triad.toml or .triadrc.json
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct TriadConfig {
    pub exclude: ExcludeConfig,
    pub scan: ScanConfig,
    pub dry: DryConfig,
    pub rams: RamsConfig,
    pub heidegger: HeideggerConfig,
    pub scoring: ScoringConfig,
    pub audit: AuditConfig,
}

/// Path exclusion configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ExcludeConfig {
    /// Glob patterns to exclude from every collector
    pub paths: Vec<String>,
    /// Do not apply [`DEFAULT_EXCLUDE_PATTERNS`]
    pub skip_defaults: bool,
}

impl ExcludeConfig {
    /// Patterns to apply: defaults (unless skipped) followed by user patterns
    pub fn effective_patterns(&self) -> Vec<String> {
        let mut patterns: Vec<String> = if self.skip_defaults {
            Vec::new()
        } else {
            DEFAULT_EXCLUDE_PATTERNS.iter().map(|s| s.to_string()).collect()
        };
        for p in &self.paths {
            if !patterns.contains(p) {
                patterns.push(p.clone());
            }
        }
        patterns
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScanConfig {
    /// File extensions (without the dot) treated as source
    pub extensions: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Duplication collector settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DryConfig {
    pub min_lines: u32,
    pub min_tokens: u32,
    /// Subprocess timeout for the clone detector
    pub timeout_secs: u64,
    /// Run the external clone detector at all
    pub clone_detector: bool,
    /// A constant name must appear in this many distinct files to be flagged
    pub min_constant_files: usize,
    pub high_lines: u32,
    pub medium_lines: u32,
    /// Noise floor: clones shorter than this are recorded but not flagged
    pub low_lines: u32,
}

impl Default for DryConfig {
    fn default() -> Self {
        Self {
            min_lines: 5,
            min_tokens: 50,
            timeout_secs: 120,
            clone_detector: true,
            min_constant_files: 3,
            high_lines: 50,
            medium_lines: 25,
            low_lines: 10,
        }
    }
}

/// Dead-artifact collector settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RamsConfig {
    pub large_file_lines: usize,
    pub huge_file_lines: usize,
    pub max_dead_exports: usize,
    /// Root-relative directories whose exports serve external consumers
    pub library_roots: Vec<String>,
    /// Extra package names never reported as unused
    pub skip_dependencies: Vec<String>,
}

impl Default for RamsConfig {
    fn default() -> Self {
        Self {
            large_file_lines: 500,
            huge_file_lines: 1000,
            max_dead_exports: 50,
            library_roots: Vec::new(),
            skip_dependencies: Vec::new(),
        }
    }
}

/// System-coherence collector settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HeideggerConfig {
    /// Directories whose children are packages in a multi-package layout
    pub package_dirs: Vec<String>,
    pub max_orphans: usize,
    pub max_missing_docs: usize,
    pub completeness: CompletenessWeights,
    /// Completeness below this is a high-severity violation
    pub high_below: f64,
    /// Completeness below this (and not below `high_below`) is medium
    pub medium_below: f64,
}

impl Default for HeideggerConfig {
    fn default() -> Self {
        Self {
            package_dirs: vec!["packages".to_string(), "apps".to_string()],
            max_orphans: 50,
            max_missing_docs: 5,
            completeness: CompletenessWeights::default(),
            high_below: 0.5,
            medium_below: 0.75,
        }
    }
}

/// Weights of the package completeness formula
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(default)]
pub struct CompletenessWeights {
    pub src: f64,
    pub manifest: f64,
    pub readme: f64,
    pub tests: f64,
}

impl Default for CompletenessWeights {
    fn default() -> Self {
        Self {
            src: 0.4,
            manifest: 0.3,
            readme: 0.2,
            tests: 0.1,
        }
    }
}

/// A capped linear penalty: `min(cap, per_item * count)`
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct PenaltyRule {
    pub per_item: f64,
    pub cap: f64,
}

impl PenaltyRule {
    pub const fn new(per_item: f64, cap: f64) -> Self {
        Self { per_item, cap }
    }

    pub fn penalty(&self, count: usize) -> f64 {
        (self.per_item * count as f64).min(self.cap)
    }
}

/// Scoring configuration for all collectors
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub dry: DryScoring,
    pub rams: RamsScoring,
    pub heidegger: HeideggerScoring,
    pub architecture: ArchitectureScoring,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DryScoring {
    /// Score = 10 - duplication% / divisor
    pub percentage_divisor: f64,
}

impl Default for DryScoring {
    fn default() -> Self {
        Self {
            percentage_divisor: 5.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RamsScoring {
    pub dead_exports: PenaltyRule,
    pub unused_dependencies: PenaltyRule,
    pub large_files: PenaltyRule,
    pub empty_files: PenaltyRule,
}

impl Default for RamsScoring {
    fn default() -> Self {
        Self {
            dead_exports: PenaltyRule::new(0.1, 2.0),
            unused_dependencies: PenaltyRule::new(0.5, 3.0),
            large_files: PenaltyRule::new(0.2, 2.0),
            empty_files: PenaltyRule::new(0.1, 1.0),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HeideggerScoring {
    pub orphans: PenaltyRule,
    pub cycles: PenaltyRule,
}

impl Default for HeideggerScoring {
    fn default() -> Self {
        Self {
            orphans: PenaltyRule::new(0.2, 2.0),
            cycles: PenaltyRule::new(1.0, 3.0),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ArchitectureScoring {
    pub critical: f64,
    pub high: f64,
    pub medium: f64,
    pub low: f64,
    /// Awarded when no zone-coherence violation exists
    pub zone_bonus: f64,
    /// Awarded when open dwelling space is reachable from the entry
    pub flow_bonus: f64,
}

impl Default for ArchitectureScoring {
    fn default() -> Self {
        Self {
            critical: 3.0,
            high: 2.0,
            medium: 1.0,
            low: 0.5,
            zone_bonus: 1.0,
            flow_bonus: 1.0,
        }
    }
}

/// Whole-run settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Global deadline for one audit run
    pub timeout_secs: Option<u64>,
    /// Worker threads (default: available cores)
    pub workers: Option<usize>,
}

/// Load project configuration from the audited root.
///
/// Searches [`CONFIG_FILE_NAMES`] in order. A broken config file is logged
/// and ignored; defaults are returned when nothing usable is found.
pub fn load_project_config(root: &Path) -> TriadConfig {
    for name in CONFIG_FILE_NAMES {
        let path = root.join(name);
        if !path.exists() {
            continue;
        }
        match load_config_file(&path) {
            Ok(config) => {
                debug!("Loaded project config from {}", path.display());
                return config;
            }
            Err(e) => {
                warn!("{}", e);
            }
        }
    }

    debug!("No project config found, using defaults");
    TriadConfig::default()
}

/// Load an explicit configuration file (TOML or JSON by extension)
pub fn load_config_file(path: &Path) -> AuditResult<TriadConfig> {
    let content = std::fs::read_to_string(path)?;
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let parsed = if is_json {
        serde_json::from_str::<TriadConfig>(&content).map_err(|e| e.to_string())
    } else {
        toml::from_str::<TriadConfig>(&content).map_err(|e| e.to_string())
    };

    parsed.map_err(|message| AuditError::Config {
        path: path.to_path_buf(),
        message,
    })
}

/// Commented starter config written by `triad init`
pub fn starter_config() -> String {
    let defaults = TriadConfig::default();
    let body = toml::to_string_pretty(&defaults).unwrap_or_default();
    format!(
        "# Triad Audit configuration\n\
         # Every value below is the built-in default; delete what you don't change.\n\n{}",
        body
    )
}
