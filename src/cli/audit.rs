//! Audit command - run the code collectors over a project root

use super::output;
use crate::collectors::AuditContext;
use crate::config::load_project_config;
use crate::engine::AuditEngine;
use anyhow::{Context, Result};
use std::path::Path;
use tracing::debug;

/// Command-line overrides applied on top of the project config
#[derive(Debug, Clone)]
pub struct AuditOptions {
    pub format: String,
    pub skip_clones: bool,
    pub timeout: Option<u64>,
    pub ignore: Vec<String>,
    pub workers: Option<usize>,
}

impl Default for AuditOptions {
    fn default() -> Self {
        Self {
            format: "text".to_string(),
            skip_clones: false,
            timeout: None,
            ignore: Vec::new(),
            workers: None,
        }
    }
}

/// Run the audit command
pub fn run(path: &Path, options: AuditOptions) -> Result<()> {
    let mut config = load_project_config(path);
    if options.skip_clones {
        config.dry.clone_detector = false;
    }
    if options.timeout.is_some() {
        config.audit.timeout_secs = options.timeout;
    }
    config.exclude.paths.extend(options.ignore);
    let workers = options.workers.or(config.audit.workers).unwrap_or(0);
    debug!("Effective config: {:?}", config);

    let ctx = AuditContext::new(path, config)
        .with_context(|| format!("Cannot audit {}", path.display()))?;
    let engine = AuditEngine::with_default_collectors(workers);
    let report = engine.run(&ctx)?;

    match options.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        _ => print!("{}", output::render_audit(&report)),
    }
    Ok(())
}
