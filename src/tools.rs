//! Best-effort hand-off to an external diagnostics tool.
//!
//! Launching can fail in a dozen environment-specific ways (not installed,
//! not executable, bad command string); none of them are errors worth
//! propagating. Every attempt resolves to a [`LaunchOutcome`] the caller
//! can log or display.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use log::*;
use serde::Serialize;
use tokio::process::Command;
use uuid::Uuid;

use crate::config::ToolConfig;

#[derive(Debug, Clone, Serialize)]
pub struct LaunchOutcome {
    pub success: bool,
    pub message: String,
}

impl LaunchOutcome {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Spawn the configured tool, detached from our terminal.
///
/// The program is resolved through the configured fallback directories and
/// then `$PATH`. A reaper task waits on the child so its exit is logged
/// rather than leaving a zombie behind.
pub async fn launch(tool: &ToolConfig) -> LaunchOutcome {
    let Some(command) = tool.command.as_deref() else {
        return LaunchOutcome::failure("no tool configured (set [tool] command)");
    };
    let Some(args) = shlex::split(command) else {
        return LaunchOutcome::failure(format!("bad command string: {command}"));
    };
    let Some(program) = args.first() else {
        return LaunchOutcome::failure("empty command string");
    };
    let Some(resolved) = resolve_program(program, &tool.fallback_paths) else {
        return LaunchOutcome::failure(format!("{program} not found on any probed path"));
    };

    let id = Uuid::new_v4();
    let spawned = Command::new(&resolved)
        .args(args.iter().skip(1))
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn();
    match spawned {
        Ok(mut child) => {
            let pid = child.id().unwrap_or_default();
            info!(target: "Tools", "Launched {} as {} (pid {})", resolved.display(), id, pid);
            let display = resolved.display().to_string();
            tokio::spawn(async move {
                match child.wait().await {
                    Ok(status) => debug!(target: "Tools", "{display} exited with {status}"),
                    Err(e) => warn!(target: "Tools", "{display} wait failed: {e}"),
                }
            });
            LaunchOutcome {
                success: true,
                message: format!("launched {} (pid {pid})", resolved.display()),
            }
        }
        Err(e) => LaunchOutcome::failure(format!("{}: {e}", resolved.display())),
    }
}

/// Find an executable for `program`: as given if it carries a path,
/// otherwise the first hit across `fallback_paths` and then `$PATH`.
fn resolve_program(program: &str, fallback_paths: &[String]) -> Option<PathBuf> {
    if program.contains('/') {
        let path = PathBuf::from(program);
        return is_executable(&path).then_some(path);
    }
    let path_var = std::env::var("PATH").unwrap_or_default();
    fallback_paths
        .iter()
        .map(String::as_str)
        .chain(path_var.split(':'))
        .filter(|dir| !dir.is_empty())
        .map(|dir| Path::new(dir).join(program))
        .find(|candidate| is_executable(candidate))
}

fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}
