//! DRY collector: duplicated code blocks and duplicated named constants
//!
//! Block duplication comes from the external clone detector; when the tool
//! is missing or fails, the collector carries on with 0% duplication and the
//! constant check still runs.

use crate::collectors::base::{AuditContext, Collector, CollectorReport};
use crate::collectors::clone_detector::{
    CloneDetector, CloneReport, CloneRequest, DuplicateBlock, JscpdRunner,
};
use crate::config::DryConfig;
use crate::files::SourceFile;
use crate::models::{Metrics, Severity, Violation, ViolationType};
use crate::scoring::dry_score;
use anyhow::Result;
use rayon::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, info, warn};

static CONSTANT_DECL: OnceLock<Regex> = OnceLock::new();

/// `const NAME = ` followed by an array, object, string, template or number literal
fn constant_decl() -> &'static Regex {
    CONSTANT_DECL.get_or_init(|| {
        Regex::new(r#"\bconst\s+([A-Z][A-Z0-9_]+)\s*(?::[^=\n]+)?=\s*(?:[\[{"'`]|-?\d)"#)
            .expect("valid regex")
    })
}

/// A constant name declared in several files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateConstant {
    pub name: String,
    pub files: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DryDetails {
    pub duplication_percentage: f64,
    pub duplicate_blocks: Vec<DuplicateBlock>,
    pub duplicate_constants: Vec<DuplicateConstant>,
    /// False when the clone detector was disabled, missing or failed
    pub clone_detection_ran: bool,
}

/// Severity of a clone of `lines` lines; `None` below the noise floor
pub fn block_severity(lines: u32, config: &DryConfig) -> Option<Severity> {
    if lines >= config.high_lines {
        Some(Severity::High)
    } else if lines >= config.medium_lines {
        Some(Severity::Medium)
    } else if lines >= config.low_lines {
        Some(Severity::Low)
    } else {
        None
    }
}

fn block_violation(block: &DuplicateBlock, severity: Severity) -> Violation {
    let message = format!(
        "{} duplicated lines between {}",
        block.lines,
        block.files.join(" and ")
    );
    let suggestion = if severity >= Severity::High {
        "Extract the duplicated block into a shared module"
    } else {
        "Refactor the duplicated code into a shared helper"
    };
    Violation::new(
        ViolationType::DuplicateBlock,
        severity,
        message,
        block.files.clone(),
        suggestion,
    )
}

/// Constant names declared in each file
fn constants_in(source: &SourceFile) -> BTreeSet<String> {
    constant_decl()
        .captures_iter(&source.content)
        .map(|cap| cap[1].to_string())
        .collect()
}

/// Group constant names across files; keep names declared in at least `min_files` files
pub fn find_duplicate_constants(sources: &[SourceFile], min_files: usize) -> Vec<DuplicateConstant> {
    let per_file: Vec<(&str, BTreeSet<String>)> = sources
        .par_iter()
        .map(|s| (s.relative.as_str(), constants_in(s)))
        .collect();

    let mut by_name: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for (file, names) in per_file {
        for name in names {
            by_name.entry(name).or_default().insert(file.to_string());
        }
    }

    by_name
        .into_iter()
        .filter(|(_, files)| files.len() >= min_files.max(1))
        .map(|(name, files)| DuplicateConstant {
            name,
            files: files.into_iter().collect(),
        })
        .collect()
}

pub struct DryCollector {
    detector: Box<dyn CloneDetector>,
}

impl Default for DryCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl DryCollector {
    /// Collector backed by jscpd
    pub fn new() -> Self {
        Self::with_detector(Box::new(JscpdRunner::new()))
    }

    pub fn with_detector(detector: Box<dyn CloneDetector>) -> Self {
        Self { detector }
    }

    fn detect_duplicate_blocks(&self, ctx: &AuditContext) -> Option<CloneReport> {
        let config = &ctx.config().dry;
        if !config.clone_detector {
            debug!("Clone detection disabled");
            return None;
        }

        let mut timeout = Duration::from_secs(config.timeout_secs);
        if let Some(remaining) = ctx.remaining() {
            timeout = timeout.min(remaining);
        }
        let request = CloneRequest {
            root: ctx.root().to_path_buf(),
            min_lines: config.min_lines,
            min_tokens: config.min_tokens,
            extensions: ctx.config().scan.extensions.clone(),
            ignore: ctx.ignore_patterns().to_vec(),
            timeout,
        };

        match self.detector.detect(&request) {
            Ok(report) => {
                debug!(
                    "{} reported {} clones ({:.1}%)",
                    self.detector.name(),
                    report.duplicates.len(),
                    report.percentage
                );
                Some(report)
            }
            Err(e) => {
                warn!(
                    "{} unavailable, continuing without duplicate-block data: {:#}",
                    self.detector.name(),
                    e
                );
                None
            }
        }
    }

    pub fn run(&self, ctx: &AuditContext) -> Metrics<DryDetails> {
        let config = &ctx.config().dry;
        let mut details = DryDetails::default();
        let mut violations = Vec::new();
        let mut complete = true;

        if ctx.expired() {
            complete = false;
        } else if let Some(report) = self.detect_duplicate_blocks(ctx) {
            details.clone_detection_ran = true;
            details.duplication_percentage = report.percentage;
            for block in &report.duplicates {
                if let Some(severity) = block_severity(block.lines, config) {
                    violations.push(block_violation(block, severity));
                }
            }
            details.duplicate_blocks = report.duplicates;
        }

        if ctx.expired() {
            complete = false;
        } else {
            details.duplicate_constants =
                find_duplicate_constants(ctx.sources(), config.min_constant_files);
            for constant in &details.duplicate_constants {
                violations.push(Violation::new(
                    ViolationType::DuplicateConstant,
                    Severity::Medium,
                    format!(
                        "Constant {} is defined in {} files",
                        constant.name,
                        constant.files.len()
                    ),
                    constant.files.clone(),
                    format!(
                        "Define {} once in a shared constants module and import it",
                        constant.name
                    ),
                ));
            }
        }

        let score = dry_score(details.duplication_percentage, &ctx.config().scoring.dry);
        info!(
            "DRY: {:.1}% duplication, {} clones, {} duplicated constants, score {:.1}",
            details.duplication_percentage,
            details.duplicate_blocks.len(),
            details.duplicate_constants.len(),
            score
        );
        Metrics::new(details, score, violations, complete)
    }
}

impl Collector for DryCollector {
    fn name(&self) -> &'static str {
        "dry"
    }

    fn description(&self) -> &'static str {
        "Duplicated code blocks and duplicated named constants"
    }

    fn collect(&self, ctx: &AuditContext) -> Result<CollectorReport> {
        Ok(CollectorReport::Dry(self.run(ctx)))
    }
}
