//! Configuration module for Triad Audit
//!
//! This module handles:
//! - Project-level configuration (triad.toml / .triadrc.json)
//! - Collector thresholds and caps
//! - Scoring weights
//! - Exclusion patterns

mod project_config;

pub use project_config::{
    load_config_file,
    load_project_config,
    starter_config,
    ArchitectureScoring,
    AuditConfig,
    CompletenessWeights,
    DryConfig,
    DryScoring,
    ExcludeConfig,
    HeideggerConfig,
    HeideggerScoring,
    PenaltyRule,
    RamsConfig,
    RamsScoring,
    ScanConfig,
    ScoringConfig,
    TriadConfig,
    CONFIG_FILE_NAMES,
    DEFAULT_EXCLUDE_PATTERNS,
    DEFAULT_EXTENSIONS,
};
