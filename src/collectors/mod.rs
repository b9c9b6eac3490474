//! Audit collectors
//!
//! Each collector inspects one aspect of a project and returns a scored,
//! typed report.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       AuditEngine                           │
//! │  - Registers collectors                                     │
//! │  - Runs them in parallel (rayon), isolating panics          │
//! │  - Aggregates the overall score                             │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Collector + AuditContext                    │
//! │  - name(): Unique identifier                                │
//! │  - collect(ctx): Scored report over shared sources/graph    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!        ┌───────────────┬─────┴─────────┬───────────────┐
//!        ▼               ▼               ▼               ▼
//!   ┌─────────┐    ┌───────────┐   ┌───────────┐   ┌──────────────┐
//!   │ dry     │    │ rams      │   │ heidegger │   │ architecture │
//!   │ (jscpd, │    │ (dead     │   │ (packages,│   │ (floor plan, │
//!   │  consts)│    │  exports) │   │  cycles)  │   │  BFS)        │
//!   └─────────┘    └───────────┘   └───────────┘   └──────────────┘
//! ```

pub mod architecture;
mod base;
pub mod clone_detector;
pub mod dry;
pub mod external_tool;
pub mod floor_plan;
pub mod heidegger;
pub mod manifest;
pub mod rams;

pub use architecture::{analyze_floor_plan, ArchitectureCollector, ArchitectureDetails};
pub use base::{AuditContext, Collector, CollectorReport, CollectorRun};
pub use clone_detector::{CloneDetector, CloneReport, CloneRequest, DuplicateBlock, JscpdRunner};
pub use dry::{DryCollector, DryDetails};
pub use floor_plan::{FloorPlan, RoomGraph, Zone};
pub use heidegger::{HeideggerCollector, HeideggerDetails};
pub use rams::{RamsCollector, RamsDetails};
