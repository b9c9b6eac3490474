//! Subprocess runner for external tools
//!
//! The clone detector is a Node package run through `bunx`/`npx`. A tool
//! that is missing, crashes or exceeds its timeout yields a failed
//! [`ExternalToolResult`]; callers degrade instead of aborting.

use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Result from running an external tool
#[derive(Debug, Clone)]
pub struct ExternalToolResult {
    /// Whether the tool ran to completion (its exit code may still be non-zero)
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    pub return_code: Option<i32>,
    pub timed_out: bool,
    pub error: Option<String>,
}

impl ExternalToolResult {
    pub fn success(stdout: String, stderr: String, return_code: i32) -> Self {
        Self {
            success: true,
            stdout,
            stderr,
            return_code: Some(return_code),
            timed_out: false,
            error: None,
        }
    }

    pub fn failure(error: String) -> Self {
        Self {
            success: false,
            stdout: String::new(),
            stderr: String::new(),
            return_code: None,
            timed_out: false,
            error: Some(error),
        }
    }

    pub fn timeout(tool_name: &str, timeout: Duration) -> Self {
        Self {
            success: false,
            stdout: String::new(),
            stderr: String::new(),
            return_code: None,
            timed_out: true,
            error: Some(format!("{} timed out after {}s", tool_name, timeout.as_secs())),
        }
    }
}

/// Cached JavaScript runtime detection
static JS_RUNTIME: OnceLock<JsRuntime> = OnceLock::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsRuntime {
    Bun,
    Npm,
    None,
}

impl JsRuntime {
    /// Package executor command (bunx or npx)
    pub fn exec_cmd(&self) -> &'static str {
        match self {
            JsRuntime::Bun => "bunx",
            JsRuntime::Npm => "npx",
            JsRuntime::None => "npx", // will fail to spawn and degrade
        }
    }
}

fn is_installed(program: &str) -> bool {
    Command::new(program)
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Detect available JavaScript runtime (bun preferred)
pub fn get_js_runtime() -> JsRuntime {
    *JS_RUNTIME.get_or_init(|| {
        if is_installed("bun") {
            debug!("Using Bun runtime for JavaScript tools");
            return JsRuntime::Bun;
        }
        if is_installed("npm") {
            debug!("Using npm runtime for JavaScript tools");
            return JsRuntime::Npm;
        }
        warn!("No JavaScript runtime (bun or npm) found; external clone detection unavailable");
        JsRuntime::None
    })
}

/// Command prefix that executes a JS package binary
pub fn get_js_exec_command(package: &str) -> Vec<String> {
    let runtime = get_js_runtime();
    let mut cmd = vec![runtime.exec_cmd().to_string()];
    // npx would otherwise prompt before installing
    if runtime != JsRuntime::Bun {
        cmd.push("--yes".to_string());
    }
    cmd.push(package.to_string());
    cmd
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

/// Run an external tool, killing it once `timeout` elapses.
///
/// Output pipes are drained on background threads so a chatty tool cannot
/// block on a full pipe while we poll.
pub fn run_external_tool(
    cmd: &[String],
    tool_name: &str,
    timeout: Duration,
    cwd: Option<&Path>,
) -> ExternalToolResult {
    let Some((program, args)) = cmd.split_first() else {
        return ExternalToolResult::failure("Empty command".to_string());
    };

    debug!("Running {}: {} {:?}", tool_name, program, args);

    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }

    let child = match command.spawn() {
        Ok(child) => child,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return ExternalToolResult::failure(format!("{} not found", tool_name));
        }
        Err(e) => {
            return ExternalToolResult::failure(format!("Failed to run {}: {}", tool_name, e));
        }
    };

    wait_with_timeout(child, tool_name, timeout)
}

/// Run a JavaScript package binary through the detected runtime
pub fn run_js_tool(
    package: &str,
    args: &[String],
    tool_name: &str,
    timeout: Duration,
    cwd: Option<&Path>,
) -> ExternalToolResult {
    let mut cmd = get_js_exec_command(package);
    cmd.extend(args.iter().cloned());
    run_external_tool(&cmd, tool_name, timeout, cwd)
}

fn wait_with_timeout(mut child: Child, tool_name: &str, timeout: Duration) -> ExternalToolResult {
    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());
    let start = Instant::now();

    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                let stdout = stdout.join().unwrap_or_default();
                let stderr = stderr.join().unwrap_or_default();
                return ExternalToolResult::success(stdout, stderr, status.code().unwrap_or(-1));
            }
            Ok(None) => {
                if start.elapsed() > timeout {
                    let _ = child.kill();
                    let _ = child.wait();
                    warn!("{} timed out after {}s", tool_name, timeout.as_secs());
                    return ExternalToolResult::timeout(tool_name, timeout);
                }
                thread::sleep(Duration::from_millis(100));
            }
            Err(e) => {
                let _ = child.kill();
                return ExternalToolResult::failure(format!(
                    "Failed to wait for {}: {}",
                    tool_name, e
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_command() {
        let result = run_external_tool(&[], "nothing", Duration::from_secs(1), None);
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("Empty command"));
    }

    #[test]
    fn test_missing_program_degrades() {
        let cmd = vec!["triad-no-such-program-xyz".to_string()];
        let result = run_external_tool(&cmd, "missing", Duration::from_secs(1), None);
        assert!(!result.success);
        assert!(!result.timed_out);
        assert!(result.error.unwrap().contains("not found"));
    }

    #[cfg(unix)]
    #[test]
    fn test_captures_output() {
        let cmd = vec!["sh".to_string(), "-c".to_string(), "echo out; echo err >&2; exit 3".to_string()];
        let result = run_external_tool(&cmd, "sh", Duration::from_secs(10), None);
        assert!(result.success);
        assert_eq!(result.stdout.trim(), "out");
        assert_eq!(result.stderr.trim(), "err");
        assert_eq!(result.return_code, Some(3));
    }

    #[cfg(unix)]
    #[test]
    fn test_timeout_kills_process() {
        let cmd = vec!["sleep".to_string(), "5".to_string()];
        let start = Instant::now();
        let result = run_external_tool(&cmd, "sleep", Duration::from_millis(200), None);
        assert!(result.timed_out);
        assert!(start.elapsed() < Duration::from_secs(4));
    }
}
