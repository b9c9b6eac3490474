//! Collector health scores
//!
//! Every collector reports a 1-10 score with one decimal. Each score starts
//! at 10 and loses points per finding category; every category penalty is
//! individually capped so no single category can dominate.
//!
//! # Scoring Formulas
//!
//! ```text
//! DRY          = 10 - duplication% / 5
//! Rams         = 10 - min(2, 0.1·dead) - min(3, 0.5·unusedDeps)
//!                   - min(2, 0.2·large) - min(1, 0.1·empty)
//! Heidegger    = avgCompleteness·10 - min(2, 0.2·orphans) - min(3, 1·cycles)
//! Architecture = 10 - 3·critical - 2·high - 1·medium - 0.5·low
//!                   + zoneBonus(1) + flowBonus(1)
//!
//! every result clamped to [1, 10] and rounded to one decimal
//! ```
//!
//! All rates, caps and bonuses come from [`ScoringConfig`](crate::config::ScoringConfig).

use crate::config::{ArchitectureScoring, DryScoring, HeideggerScoring, RamsScoring};
use crate::models::SeverityCounts;

pub const MIN_SCORE: f64 = 1.0;
pub const MAX_SCORE: f64 = 10.0;

/// Clamp to `[1, 10]` and round to one decimal
pub fn finalize_score(raw: f64) -> f64 {
    if raw.is_nan() {
        return MIN_SCORE;
    }
    let clamped = raw.clamp(MIN_SCORE, MAX_SCORE);
    (clamped * 10.0).round() / 10.0
}

pub fn dry_score(duplication_percentage: f64, weights: &DryScoring) -> f64 {
    let divisor = if weights.percentage_divisor > 0.0 {
        weights.percentage_divisor
    } else {
        1.0
    };
    finalize_score(MAX_SCORE - duplication_percentage.max(0.0) / divisor)
}

/// Category sizes the Rams score is computed from
#[derive(Debug, Clone, Copy, Default)]
pub struct RamsCounts {
    pub dead_exports: usize,
    pub unused_dependencies: usize,
    pub large_files: usize,
    pub empty_files: usize,
}

pub fn rams_score(counts: RamsCounts, weights: &RamsScoring) -> f64 {
    finalize_score(
        MAX_SCORE
            - weights.dead_exports.penalty(counts.dead_exports)
            - weights.unused_dependencies.penalty(counts.unused_dependencies)
            - weights.large_files.penalty(counts.large_files)
            - weights.empty_files.penalty(counts.empty_files),
    )
}

pub fn heidegger_score(
    avg_completeness: f64,
    orphans: usize,
    cycles: usize,
    weights: &HeideggerScoring,
) -> f64 {
    finalize_score(
        avg_completeness.clamp(0.0, 1.0) * MAX_SCORE
            - weights.orphans.penalty(orphans)
            - weights.cycles.penalty(cycles),
    )
}

pub fn architecture_score(
    counts: &SeverityCounts,
    zones_coherent: bool,
    dwelling_reachable: bool,
    weights: &ArchitectureScoring,
) -> f64 {
    let mut raw = MAX_SCORE
        - weights.critical * counts.critical as f64
        - weights.high * counts.high as f64
        - weights.medium * counts.medium as f64
        - weights.low * counts.low as f64;
    if zones_coherent {
        raw += weights.zone_bonus;
    }
    if dwelling_reachable {
        raw += weights.flow_bonus;
    }
    finalize_score(raw)
}
