//! Triad Audit - graph-based code and structure auditing
//!
//! Three code collectors read a JS/TS source tree through one shared symbol
//! graph:
//! - **DRY**: duplicated blocks (external clone detector) and duplicated constants
//! - **Rams**: dead exports, unused dependencies, large and empty files
//! - **Heidegger**: package completeness, orphaned files, import cycles, missing docs
//!
//! A fourth, **Architecture**, applies the same adjacency reasoning to a
//! floor plan of rooms and doors.
//!
//! ```ignore
//! use triad_audit::{AuditContext, AuditEngine, TriadConfig};
//!
//! let ctx = AuditContext::new("path/to/repo", TriadConfig::default())?;
//! let report = AuditEngine::with_default_collectors(0).run(&ctx)?;
//! println!("{:?}", report.overall_score);
//! ```

pub mod cli;
pub mod collectors;
pub mod config;
pub mod engine;
pub mod error;
pub mod files;
pub mod graph;
pub mod models;
pub mod policy;
pub mod scoring;

pub use collectors::{
    analyze_floor_plan, AuditContext, Collector, CollectorReport, CollectorRun, FloorPlan,
};
pub use config::TriadConfig;
pub use engine::{AuditEngine, AuditReport};
pub use error::{AuditError, AuditResult};
pub use models::{Metrics, Severity, Violation, ViolationType};
