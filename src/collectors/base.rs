//! Base collector trait and shared run context
//!
//! This module defines the core abstractions every collector builds on:
//! - `Collector` trait that all collectors implement
//! - `AuditContext`, the per-run input (root, ignore set, config, deadline)
//!   together with the lazily built sources and symbol graph
//! - `CollectorReport` / `CollectorRun` for capturing execution results

use crate::collectors::architecture::ArchitectureDetails;
use crate::collectors::dry::DryDetails;
use crate::collectors::heidegger::HeideggerDetails;
use crate::collectors::rams::RamsDetails;
use crate::config::TriadConfig;
use crate::error::{AuditError, AuditResult};
use crate::files::{build_overrides, load_sources, relative_display, walk_sources, SourceFile};
use crate::graph::SymbolGraph;
use crate::models::{Metrics, Violation};
use anyhow::Result;
use ignore::overrides::Override;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::{Duration, Instant};
use tracing::debug;

/// Everything a collector run reads.
///
/// Sources and the symbol graph are built on first use and then shared
/// read-only by every collector holding the same context.
pub struct AuditContext {
    root: PathBuf,
    config: TriadConfig,
    ignore: Vec<String>,
    overrides: Override,
    deadline: Option<Instant>,
    sources: OnceLock<Vec<SourceFile>>,
    graph: OnceLock<SymbolGraph>,
}

impl std::fmt::Debug for AuditContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditContext")
            .field("root", &self.root)
            .field("ignore", &self.ignore)
            .field("deadline", &self.deadline)
            .finish()
    }
}

impl AuditContext {
    /// Create a context over `root`.
    ///
    /// Fails when the root is missing or an ignore pattern does not compile;
    /// both are configuration errors with no partial result to fall back to.
    pub fn new(root: impl AsRef<Path>, config: TriadConfig) -> AuditResult<Self> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(AuditError::MissingRoot(root.to_path_buf()));
        }
        let root = root.canonicalize()?;
        let ignore = config.exclude.effective_patterns();
        let overrides = build_overrides(&root, &ignore)?;
        let deadline = config
            .audit
            .timeout_secs
            .map(|secs| Instant::now() + Duration::from_secs(secs));

        Ok(Self {
            root,
            config,
            ignore,
            overrides,
            deadline,
            sources: OnceLock::new(),
            graph: OnceLock::new(),
        })
    }

    /// Set the deadline for the whole run
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &TriadConfig {
        &self.config
    }

    /// Effective glob exclusions (defaults plus configured patterns)
    pub fn ignore_patterns(&self) -> &[String] {
        &self.ignore
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Whether the run deadline has passed
    pub fn expired(&self) -> bool {
        self.deadline.map(|d| Instant::now() >= d).unwrap_or(false)
    }

    /// Time left before the deadline (`None` when unbounded)
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Root-relative display path
    pub fn relative(&self, path: &Path) -> String {
        relative_display(&self.root, path)
    }

    /// Source files under the root, loaded once per context
    pub fn sources(&self) -> &[SourceFile] {
        self.sources.get_or_init(|| {
            let paths = walk_sources(
                &self.root,
                self.overrides.clone(),
                &self.config.scan.extensions,
            );
            let sources = load_sources(&self.root, &paths);
            debug!("Loaded {} of {} source files", sources.len(), paths.len());
            sources
        })
    }

    /// Symbol graph over [`Self::sources`], built once per context
    pub fn symbol_graph(&self) -> &SymbolGraph {
        self.graph
            .get_or_init(|| SymbolGraph::build(self.sources()))
    }
}

/// Typed output of one collector
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum CollectorReport {
    Dry(Metrics<DryDetails>),
    Rams(Metrics<RamsDetails>),
    Heidegger(Metrics<HeideggerDetails>),
    Architecture(Metrics<ArchitectureDetails>),
}

impl CollectorReport {
    pub fn score(&self) -> f64 {
        match self {
            CollectorReport::Dry(m) => m.score,
            CollectorReport::Rams(m) => m.score,
            CollectorReport::Heidegger(m) => m.score,
            CollectorReport::Architecture(m) => m.score,
        }
    }

    pub fn violations(&self) -> &[Violation] {
        match self {
            CollectorReport::Dry(m) => &m.violations,
            CollectorReport::Rams(m) => &m.violations,
            CollectorReport::Heidegger(m) => &m.violations,
            CollectorReport::Architecture(m) => &m.violations,
        }
    }

    pub fn complete(&self) -> bool {
        match self {
            CollectorReport::Dry(m) => m.complete,
            CollectorReport::Rams(m) => m.complete,
            CollectorReport::Heidegger(m) => m.complete,
            CollectorReport::Architecture(m) => m.complete,
        }
    }
}

/// Result from running a single collector
#[derive(Debug, Clone, Serialize)]
pub struct CollectorRun {
    /// Name of the collector that produced this run
    pub collector: String,
    /// Whether the collector completed without error or panic
    pub success: bool,
    /// Execution time in milliseconds
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<CollectorReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CollectorRun {
    /// Create a successful run
    pub fn success(collector: String, metrics: CollectorReport, duration_ms: u64) -> Self {
        Self {
            collector,
            success: true,
            duration_ms,
            metrics: Some(metrics),
            error: None,
        }
    }

    /// Create a failed run
    pub fn failure(collector: String, error: String, duration_ms: u64) -> Self {
        Self {
            collector,
            success: false,
            duration_ms,
            metrics: None,
            error: Some(error),
        }
    }

    pub fn score(&self) -> Option<f64> {
        self.metrics.as_ref().map(CollectorReport::score)
    }
}

/// Trait for all collectors
///
/// A collector inspects one aspect of the audited tree (or a floor plan)
/// and returns a scored [`CollectorReport`]. Recoverable problems (an
/// unreadable file, a missing external tool) degrade the result and are
/// logged; they never become violations and never fail the collector.
pub trait Collector: Send + Sync {
    /// Unique identifier, e.g. `"rams"`
    fn name(&self) -> &'static str;

    /// Human-readable description of what this collector measures
    fn description(&self) -> &'static str;

    /// Run the collector against a shared context
    fn collect(&self, ctx: &AuditContext) -> Result<CollectorReport>;
}
