//! Terminal rendering for audit and floor-plan results

use crate::collectors::{ArchitectureDetails, CollectorReport};
use crate::engine::AuditReport;
use crate::models::{Metrics, Severity, Violation};
use console::{style, StyledObject};
use std::fmt::Write;

/// Violations shown per collector before eliding the rest
const MAX_SHOWN: usize = 15;

fn severity_tag(severity: Severity) -> StyledObject<&'static str> {
    match severity {
        Severity::Critical => style("[C]").red().bold(),
        Severity::High => style("[H]").red(),
        Severity::Medium => style("[M]").yellow(),
        Severity::Low => style("[L]").blue(),
    }
}

fn score_style(score: f64) -> StyledObject<String> {
    let text = format!("{:.1}/10", score);
    if score >= 8.0 {
        style(text).green().bold()
    } else if score >= 5.0 {
        style(text).yellow().bold()
    } else {
        style(text).red().bold()
    }
}

fn write_violations(out: &mut String, violations: &[Violation]) {
    for v in violations.iter().take(MAX_SHOWN) {
        let _ = writeln!(
            out,
            "  {} {} {}",
            severity_tag(v.severity),
            style(v.kind).dim(),
            v.message
        );
        if let Some(file) = v.file() {
            let _ = writeln!(out, "      {}", style(file).cyan());
        }
    }
    if violations.len() > MAX_SHOWN {
        let _ = writeln!(
            out,
            "  {}",
            style(format!("... and {} more", violations.len() - MAX_SHOWN)).dim()
        );
    }
}

fn collector_summary(report: &CollectorReport) -> String {
    match report {
        CollectorReport::Dry(m) => format!(
            "{:.1}% duplication, {} duplicated constants{}",
            m.details.duplication_percentage,
            m.details.duplicate_constants.len(),
            if m.details.clone_detection_ran {
                ""
            } else {
                " (clone detection skipped)"
            }
        ),
        CollectorReport::Rams(m) => format!(
            "{} dead exports, {} unused dependencies, {} large files, {} empty files",
            m.details.total_dead_exports,
            m.details.unused_dependencies.len(),
            m.details.large_files.len(),
            m.details.empty_files.len()
        ),
        CollectorReport::Heidegger(m) => format!(
            "{} packages at {:.0}% completeness, {} orphans, {} cycles",
            m.details.packages.len(),
            m.details.average_completeness * 100.0,
            m.details.total_orphans,
            m.details.circular_dependencies.len()
        ),
        CollectorReport::Architecture(m) => architecture_summary(&m.details),
    }
}

fn architecture_summary(details: &ArchitectureDetails) -> String {
    format!(
        "dwelling {}, private {}, service {}",
        if details.dwelling_reachable { "reachable" } else { "unreachable" },
        if details.private_accessible { "accessible" } else { "inaccessible" },
        if details.service_accessible { "accessible" } else { "inaccessible" },
    )
}

/// Render a full audit report
pub fn render_audit(report: &AuditReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\n{}", style("Triad Audit").bold());
    let _ = writeln!(out, "{}", style("──────────────────────────────────────").dim());
    let _ = writeln!(out, "Root: {}", style(&report.root).cyan());
    match report.overall_score {
        Some(score) => {
            let _ = writeln!(out, "Overall: {}\n", score_style(score));
        }
        None => {
            let _ = writeln!(out, "Overall: {}\n", style("n/a").red());
        }
    }

    for run in &report.runs {
        match &run.metrics {
            Some(metrics) => {
                let _ = writeln!(
                    out,
                    "{} {}  {}",
                    style(run.collector.to_uppercase()).bold(),
                    score_style(metrics.score()),
                    style(collector_summary(metrics)).dim()
                );
                if !metrics.complete() {
                    let _ = writeln!(out, "  {}", style("incomplete: audit deadline reached").yellow());
                }
                write_violations(&mut out, metrics.violations());
            }
            None => {
                let _ = writeln!(
                    out,
                    "{} {}  {}",
                    style(run.collector.to_uppercase()).bold(),
                    style("failed").red().bold(),
                    run.error.as_deref().unwrap_or("unknown error")
                );
            }
        }
        out.push('\n');
    }

    let counts = report.severity_counts();
    let _ = writeln!(
        out,
        "{} critical, {} high, {} medium, {} low ({}ms)",
        counts.critical, counts.high, counts.medium, counts.low, report.duration_ms
    );
    out
}

/// Render a floor-plan analysis
pub fn render_architecture(metrics: &Metrics<ArchitectureDetails>) -> String {
    let details = &metrics.details;
    let mut out = String::new();
    let _ = writeln!(out, "\n{} {}", style("Floor plan").bold(), style(&details.plan).cyan());
    let _ = writeln!(out, "{}", style("──────────────────────────────────────").dim());
    let _ = writeln!(out, "Score: {}", score_style(metrics.score));
    let _ = writeln!(out, "{}", architecture_summary(details));
    if !details.entry_sequence.is_empty() {
        let _ = writeln!(out, "Entry sequence: {}", details.entry_sequence.join(" → "));
    }
    for path in &details.non_monotonic_paths {
        let _ = writeln!(
            out,
            "  {} {}",
            style("non-monotonic:").yellow(),
            path.join(" → ")
        );
    }
    out.push('\n');
    write_violations(&mut out, &metrics.violations);
    out
}
