//! Core data models for Triad Audit
//!
//! Every collector speaks the same output language: a list of typed
//! [`Violation`]s plus a 1-10 health score, wrapped in [`Metrics`] together
//! with the collector-specific details that produced them.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Generate a deterministic violation ID based on content hash.
///
/// Two runs over an unchanged tree must produce identical violation lists,
/// so the ID is derived from what was found rather than when:
/// - violation type
/// - implicated locations (in reported order)
/// - message
pub fn deterministic_violation_id(kind: ViolationType, files: &[String], message: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(kind.as_str().as_bytes());
    for file in files {
        hasher.update(b"\n");
        hasher.update(file.as_bytes());
    }
    hasher.update(b"\n");
    hasher.update(message.as_bytes());
    let digest = hasher.finalize();
    digest[..8].iter().map(|b| format!("{:02x}", b)).collect()
}

/// Severity levels for violations
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

/// The fixed vocabulary of violation types across all collectors
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationType {
    DuplicateBlock,
    DuplicateConstant,
    DeadExport,
    UnusedDependency,
    LargeFile,
    EmptyFile,
    OrphanedFile,
    CircularDependency,
    IncompletePackage,
    MissingDocumentation,
    AccessViolation,
    ZoneCoherence,
    FlowViolation,
}

impl ViolationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationType::DuplicateBlock => "duplicate_block",
            ViolationType::DuplicateConstant => "duplicate_constant",
            ViolationType::DeadExport => "dead_export",
            ViolationType::UnusedDependency => "unused_dependency",
            ViolationType::LargeFile => "large_file",
            ViolationType::EmptyFile => "empty_file",
            ViolationType::OrphanedFile => "orphaned_file",
            ViolationType::CircularDependency => "circular_dependency",
            ViolationType::IncompletePackage => "incomplete_package",
            ViolationType::MissingDocumentation => "missing_documentation",
            ViolationType::AccessViolation => "access_violation",
            ViolationType::ZoneCoherence => "zone_coherence",
            ViolationType::FlowViolation => "flow_violation",
        }
    }
}

impl std::fmt::Display for ViolationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single finding produced by a collector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ViolationType,
    pub severity: Severity,
    pub message: String,
    /// Root-relative paths (or room ids for floor plans)
    pub files: Vec<String>,
    pub suggestion: String,
}

impl Violation {
    pub fn new(
        kind: ViolationType,
        severity: Severity,
        message: impl Into<String>,
        files: Vec<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        let message = message.into();
        Self {
            id: deterministic_violation_id(kind, &files, &message),
            kind,
            severity,
            message,
            files,
            suggestion: suggestion.into(),
        }
    }

    /// First implicated location, if any
    pub fn file(&self) -> Option<&str> {
        self.files.first().map(String::as_str)
    }
}

/// Per-severity counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl SeverityCounts {
    pub fn from_violations(violations: &[Violation]) -> Self {
        let mut counts = Self::default();
        for v in violations {
            match v.severity {
                Severity::Critical => counts.critical += 1,
                Severity::High => counts.high += 1,
                Severity::Medium => counts.medium += 1,
                Severity::Low => counts.low += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.critical + self.high + self.medium + self.low
    }
}

/// Output of one collector run.
///
/// `details` carries the collector-specific fields and is flattened into the
/// serialized object next to `score` and `violations`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metrics<D> {
    #[serde(flatten)]
    pub details: D,
    /// Health score, 1.0-10.0 with one decimal
    pub score: f64,
    pub violations: Vec<Violation>,
    /// False when the run hit the audit deadline and returned a partial result
    pub complete: bool,
}

impl<D> Metrics<D> {
    pub fn new(details: D, score: f64, mut violations: Vec<Violation>, complete: bool) -> Self {
        sort_violations(&mut violations);
        Self {
            details,
            score,
            violations,
            complete,
        }
    }

    pub fn severity_counts(&self) -> SeverityCounts {
        SeverityCounts::from_violations(&self.violations)
    }
}

/// Deterministic order: severity (desc), then type, then first location, then message
pub fn sort_violations(violations: &mut [Violation]) {
    violations.sort_by(|a, b| {
        b.severity
            .cmp(&a.severity)
            .then_with(|| a.kind.cmp(&b.kind))
            .then_with(|| a.file().cmp(&b.file()))
            .then_with(|| a.message.cmp(&b.message))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
    }

    #[test]
    fn test_violation_id_is_stable() {
        let a = Violation::new(
            ViolationType::DeadExport,
            Severity::Medium,
            "unused",
            vec!["src/a.ts".into()],
            "remove it",
        );
        let b = Violation::new(
            ViolationType::DeadExport,
            Severity::Medium,
            "unused",
            vec!["src/a.ts".into()],
            "something else",
        );
        assert_eq!(a.id, b.id);
        assert_eq!(a.id.len(), 16);

        let c = Violation::new(
            ViolationType::DeadExport,
            Severity::Medium,
            "unused",
            vec!["src/b.ts".into()],
            "remove it",
        );
        assert_ne!(a.id, c.id);
    }

    #[test]
    fn test_violation_serializes_type_field() {
        let v = Violation::new(
            ViolationType::CircularDependency,
            Severity::High,
            "cycle",
            vec!["a.ts".into(), "b.ts".into()],
            "break it",
        );
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["type"], "circular_dependency");
        assert_eq!(json["severity"], "high");
        assert_eq!(json["files"][1], "b.ts");
    }

    #[test]
    fn test_metrics_sorts_by_severity() {
        let low = Violation::new(ViolationType::EmptyFile, Severity::Low, "e", vec![], "");
        let high = Violation::new(ViolationType::LargeFile, Severity::High, "l", vec![], "");
        let metrics = Metrics::new((), 5.0, vec![low, high], true);
        assert_eq!(metrics.violations[0].severity, Severity::High);
        assert_eq!(metrics.severity_counts().total(), 2);
        assert_eq!(metrics.severity_counts().low, 1);
    }
}
