//! CLI command definitions and handlers

mod architecture;
mod audit;
mod init;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Parse and validate workers count (1-64)
fn parse_workers(s: &str) -> Result<usize, String> {
    let n: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if n == 0 {
        Err("workers must be at least 1".to_string())
    } else if n > 64 {
        Err("workers cannot exceed 64".to_string())
    } else {
        Ok(n)
    }
}

/// Triad Audit - duplication, dead artifacts, system coherence and floor-plan flow
#[derive(Parser, Debug)]
#[command(name = "triad")]
#[command(
    version,
    about = "Audit a JS/TS project for duplication, dead artifacts and coherence, or a floor plan for flow",
    after_help = "\
Examples:
  triad .                               Audit the current directory
  triad . audit --format json           JSON output for scripting
  triad . audit --skip-clones           Skip the external clone detector
  triad architecture plan.json          Analyze a floor plan
  triad init                            Write a starter triad.toml"
)]
pub struct Cli {
    /// Path to the project root (default: current directory), given before the subcommand
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    /// Number of parallel workers (1-64, default: available cores)
    #[arg(long, global = true, value_parser = parse_workers)]
    pub workers: Option<usize>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the DRY, Rams and Heidegger collectors
    Audit {
        /// Output format: text or json
        #[arg(long, short = 'f', default_value = "text", value_parser = ["text", "json"])]
        format: String,

        /// Skip the external clone detector (duplicate constants still run)
        #[arg(long)]
        skip_clones: bool,

        /// Global deadline in seconds; unfinished collectors report partial results
        #[arg(long)]
        timeout: Option<u64>,

        /// Extra glob patterns to exclude (repeatable)
        #[arg(long)]
        ignore: Vec<String>,
    },

    /// Analyze a floor plan (JSON) for access, zone coherence and flow
    Architecture {
        /// Floor plan JSON file
        plan: PathBuf,

        /// Output format: text or json
        #[arg(long, short = 'f', default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },

    /// Write a starter triad.toml with every default spelled out
    Init {
        /// Overwrite an existing triad.toml
        #[arg(long)]
        force: bool,
    },
}

/// Run the CLI with parsed arguments
pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Commands::Audit {
            format,
            skip_clones,
            timeout,
            ignore,
        }) => audit::run(
            &cli.path,
            audit::AuditOptions {
                format,
                skip_clones,
                timeout,
                ignore,
                workers: cli.workers,
            },
        ),

        Some(Commands::Architecture { plan, format }) => {
            architecture::run(&cli.path, &plan, &format)
        }

        Some(Commands::Init { force }) => init::run(&cli.path, force),

        // Default: audit the path with default options
        None => audit::run(
            &cli.path,
            audit::AuditOptions {
                workers: cli.workers,
                ..Default::default()
            },
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_workers() {
        assert_eq!(parse_workers("4"), Ok(4));
        assert!(parse_workers("0").is_err());
        assert!(parse_workers("65").is_err());
        assert!(parse_workers("many").is_err());
    }

    #[test]
    fn test_parse_audit_flags() {
        let cli = Cli::try_parse_from([
            "triad",
            "repo",
            "audit",
            "--format",
            "json",
            "--skip-clones",
            "--timeout",
            "30",
            "--ignore",
            "**/fixtures/**",
            "--ignore",
            "legacy/**",
        ])
        .unwrap();
        assert_eq!(cli.path, PathBuf::from("repo"));
        match cli.command {
            Some(Commands::Audit {
                format,
                skip_clones,
                timeout,
                ignore,
            }) => {
                assert_eq!(format, "json");
                assert!(skip_clones);
                assert_eq!(timeout, Some(30));
                assert_eq!(ignore, vec!["**/fixtures/**", "legacy/**"]);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_architecture_with_default_root() {
        let cli = Cli::try_parse_from(["triad", "architecture", "plan.json"]).unwrap();
        assert_eq!(cli.path, PathBuf::from("."));
        match cli.command {
            Some(Commands::Architecture { plan, format }) => {
                assert_eq!(plan, PathBuf::from("plan.json"));
                assert_eq!(format, "text");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["triad", ".", "audit", "--format", "sarif"]).is_err());
    }
}
