//! Architecture command - analyze a floor plan file

use super::output;
use crate::collectors::{analyze_floor_plan, FloorPlan};
use crate::config::{load_project_config, TriadConfig};
use anyhow::{Context, Result};
use std::path::Path;

/// Run the architecture command
pub fn run(root: &Path, plan_path: &Path, format: &str) -> Result<()> {
    let json = std::fs::read_to_string(plan_path)
        .with_context(|| format!("Cannot read floor plan {}", plan_path.display()))?;
    let plan = FloorPlan::from_json(&json)
        .with_context(|| format!("Invalid floor plan {}", plan_path.display()))?;

    let config = if root.is_dir() {
        load_project_config(root)
    } else {
        TriadConfig::default()
    };
    let metrics = analyze_floor_plan(&plan, &config.scoring.architecture);

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&metrics)?),
        _ => print!("{}", output::render_architecture(&metrics)),
    }
    Ok(())
}
