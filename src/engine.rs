//! Audit execution engine
//!
//! The AuditEngine runs every registered collector against one shared
//! [`AuditContext`]:
//! - Collectors are independent, so they all run in parallel on a rayon pool
//! - A panicking collector is isolated and reported as a failed run
//! - Successful scores are averaged into the overall score
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                      AuditEngine                        │
//! ├─────────────────────────────────────────────────────────┤
//! │  1. Register collectors                                 │
//! │  2. Run all in parallel (rayon), catch panics           │
//! │  3. Collect runs in registration order                  │
//! │  4. Average successful scores                           │
//! └─────────────────────────────────────────────────────────┘
//! ```

use crate::collectors::{
    AuditContext, Collector, CollectorRun, DryCollector, HeideggerCollector, RamsCollector,
};
use crate::models::SeverityCounts;
use crate::scoring::finalize_score;
use anyhow::Result;
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Outcome of one audit over one root
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditReport {
    pub root: String,
    pub timestamp: DateTime<Utc>,
    pub duration_ms: u64,
    /// One entry per registered collector, in registration order
    pub runs: Vec<CollectorRun>,
    /// Mean of the successful collector scores
    pub overall_score: Option<f64>,
}

impl AuditReport {
    pub fn run(&self, collector: &str) -> Option<&CollectorRun> {
        self.runs.iter().find(|r| r.collector == collector)
    }

    /// Severity totals across every successful run
    pub fn severity_counts(&self) -> SeverityCounts {
        let mut total = SeverityCounts::default();
        for report in self.runs.iter().filter_map(|r| r.metrics.as_ref()) {
            let counts = SeverityCounts::from_violations(report.violations());
            total.critical += counts.critical;
            total.high += counts.high;
            total.medium += counts.medium;
            total.low += counts.low;
        }
        total
    }

    /// Whether every collector succeeded and finished before the deadline
    pub fn complete(&self) -> bool {
        self.runs
            .iter()
            .all(|r| r.metrics.as_ref().map(|m| m.complete()).unwrap_or(false))
    }
}

/// Orchestrates the registered collectors
pub struct AuditEngine {
    collectors: Vec<Arc<dyn Collector>>,
    /// Number of worker threads for parallel execution
    workers: usize,
}

impl AuditEngine {
    /// Create an engine with no collectors (`workers == 0` auto-detects)
    pub fn new(workers: usize) -> Self {
        let workers = if workers == 0 {
            std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(4)
                .min(16)
        } else {
            workers
        };
        Self {
            collectors: Vec::new(),
            workers,
        }
    }

    /// Engine with the three code collectors registered
    pub fn with_default_collectors(workers: usize) -> Self {
        let mut engine = Self::new(workers);
        engine.register_all(default_collectors());
        engine
    }

    pub fn register(&mut self, collector: Arc<dyn Collector>) {
        debug!("Registering collector: {}", collector.name());
        self.collectors.push(collector);
    }

    pub fn register_all(&mut self, collectors: impl IntoIterator<Item = Arc<dyn Collector>>) {
        for collector in collectors {
            self.register(collector);
        }
    }

    pub fn collector_count(&self) -> usize {
        self.collectors.len()
    }

    pub fn collector_names(&self) -> Vec<&'static str> {
        self.collectors.iter().map(|c| c.name()).collect()
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run every collector against `ctx`
    pub fn run(&self, ctx: &AuditContext) -> Result<AuditReport> {
        let start = Instant::now();
        info!(
            "Starting audit of {} with {} collectors on {} workers",
            ctx.root().display(),
            self.collectors.len(),
            self.workers
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()?;

        let runs: Vec<CollectorRun> = pool.install(|| {
            self.collectors
                .par_iter()
                .map(|collector| run_single_collector(collector, ctx))
                .collect()
        });

        let scores: Vec<f64> = runs.iter().filter_map(CollectorRun::score).collect();
        let overall_score = if scores.is_empty() {
            None
        } else {
            Some(finalize_score(scores.iter().sum::<f64>() / scores.len() as f64))
        };

        let report = AuditReport {
            root: ctx.root().display().to_string(),
            timestamp: Utc::now(),
            duration_ms: start.elapsed().as_millis() as u64,
            runs,
            overall_score,
        };
        info!(
            "Audit finished in {}ms, overall score {}",
            report.duration_ms,
            report
                .overall_score
                .map(|s| format!("{:.1}", s))
                .unwrap_or_else(|| "n/a".to_string())
        );
        Ok(report)
    }
}

impl Default for AuditEngine {
    fn default() -> Self {
        Self::new(0)
    }
}

/// The code collectors: DRY, Rams, Heidegger
pub fn default_collectors() -> Vec<Arc<dyn Collector>> {
    vec![
        Arc::new(DryCollector::new()),
        Arc::new(RamsCollector::new()),
        Arc::new(HeideggerCollector::new()),
    ]
}

/// Run a single collector with error handling and timing
fn run_single_collector(collector: &Arc<dyn Collector>, ctx: &AuditContext) -> CollectorRun {
    let name = collector.name().to_string();
    let start = Instant::now();
    debug!("Running collector: {}", name);

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| collector.collect(ctx)));
    let duration = start.elapsed().as_millis() as u64;

    match result {
        Ok(Ok(report)) => {
            debug!(
                "Collector {} reported {} violations in {}ms",
                name,
                report.violations().len(),
                duration
            );
            if !report.complete() {
                warn!("Collector {} hit the audit deadline", name);
            }
            CollectorRun::success(name, report, duration)
        }
        Ok(Err(e)) => {
            warn!("Collector {} failed: {:#}", name, e);
            CollectorRun::failure(name, format!("{:#}", e), duration)
        }
        Err(panic_info) => {
            let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = panic_info.downcast_ref::<String>() {
                s.clone()
            } else {
                "Unknown panic".to_string()
            };
            error!("Collector {} panicked: {}", name, panic_msg);
            CollectorRun::failure(name, format!("Panic: {}", panic_msg), duration)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collectors::CollectorReport;
    use crate::collectors::RamsDetails;
    use crate::config::TriadConfig;
    use crate::models::Metrics;

    struct FixedCollector {
        name: &'static str,
        score: f64,
    }

    impl Collector for FixedCollector {
        fn name(&self) -> &'static str {
            self.name
        }

        fn description(&self) -> &'static str {
            "Fixed score for testing"
        }

        fn collect(&self, _ctx: &AuditContext) -> Result<CollectorReport> {
            Ok(CollectorReport::Rams(Metrics::new(
                RamsDetails::default(),
                self.score,
                Vec::new(),
                true,
            )))
        }
    }

    struct PanickingCollector;

    impl Collector for PanickingCollector {
        fn name(&self) -> &'static str {
            "panics"
        }

        fn description(&self) -> &'static str {
            "Always panics"
        }

        fn collect(&self, _ctx: &AuditContext) -> Result<CollectorReport> {
            panic!("collector exploded")
        }
    }

    struct FailingCollector;

    impl Collector for FailingCollector {
        fn name(&self) -> &'static str {
            "fails"
        }

        fn description(&self) -> &'static str {
            "Always errors"
        }

        fn collect(&self, _ctx: &AuditContext) -> Result<CollectorReport> {
            anyhow::bail!("no input")
        }
    }

    fn context() -> (tempfile::TempDir, AuditContext) {
        let dir = tempfile::tempdir().unwrap();
        let ctx = AuditContext::new(dir.path(), TriadConfig::default()).unwrap();
        (dir, ctx)
    }

    #[test]
    fn test_engine_default_workers() {
        let engine = AuditEngine::new(0);
        assert!(engine.workers() > 0);
        assert!(engine.workers() <= 16);
        assert_eq!(AuditEngine::new(3).workers(), 3);
    }

    #[test]
    fn test_default_collectors() {
        let engine = AuditEngine::with_default_collectors(2);
        assert_eq!(engine.collector_names(), vec!["dry", "rams", "heidegger"]);
    }

    #[test]
    fn test_overall_score_is_mean_of_successes() {
        let (_dir, ctx) = context();
        let mut engine = AuditEngine::new(2);
        engine.register(Arc::new(FixedCollector { name: "a", score: 8.0 }));
        engine.register(Arc::new(FixedCollector { name: "b", score: 5.0 }));
        engine.register(Arc::new(FailingCollector));

        let report = engine.run(&ctx).unwrap();
        assert_eq!(report.runs.len(), 3);
        assert_eq!(report.overall_score, Some(6.5));
        let failed = report.run("fails").unwrap();
        assert!(!failed.success);
        assert!(failed.metrics.is_none());
        assert_eq!(failed.error.as_deref(), Some("no input"));
        assert!(!report.complete());
    }

    #[test]
    fn test_panicking_collector_is_isolated() {
        let (_dir, ctx) = context();
        let mut engine = AuditEngine::new(2);
        engine.register(Arc::new(PanickingCollector));
        engine.register(Arc::new(FixedCollector { name: "ok", score: 9.0 }));

        let report = engine.run(&ctx).unwrap();
        let panicked = report.run("panics").unwrap();
        assert!(!panicked.success);
        assert!(panicked.error.as_deref().unwrap().contains("collector exploded"));
        assert_eq!(report.run("ok").unwrap().score(), Some(9.0));
        assert_eq!(report.overall_score, Some(9.0));
    }

    #[test]
    fn test_no_successes_has_no_overall_score() {
        let (_dir, ctx) = context();
        let mut engine = AuditEngine::new(1);
        engine.register(Arc::new(FailingCollector));
        assert_eq!(engine.run(&ctx).unwrap().overall_score, None);
    }
}
