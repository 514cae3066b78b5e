//! Runner script generation.
//!
//! The runner takes `iteration prompt_file worktree output_file log_file
//! status_file` as positional arguments, runs the agent with its combined
//! output in the log file, and writes exactly `DONE` or `FAILED` to the
//! status file. That write is the only terminal signal of a run.

use std::path::Path;

use crate::config::AgentConfig;
use crate::error::{Result, TrackError};

const RUNNER_TEMPLATE: &str = r#"#!/usr/bin/env bash
set -u
set -o pipefail

iteration="$1"
prompt_file="$2"
worktree="$3"
output_file="$4"
log_file="$5"
status_file="$6"

prompt="$(cat -- "$prompt_file")"

if ( {agent_command} ) >"$log_file" 2>&1; then
  echo "DONE" >"$status_file"
else
  echo "FAILED" >"$status_file"
fi
"#;

/// Render the runner script for one agent.
pub fn render_runner_script(agent: &AgentConfig) -> String {
    RUNNER_TEMPLATE.replace("{agent_command}", agent.command.trim())
}

/// Write (or refresh) an executable runner script.
pub async fn write_runner_script(path: &Path, contents: &str) -> Result<()> {
    let fail = |e: std::io::Error| TrackError::session("write-runner-script", format!("{}: {}", path.display(), e));

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(fail)?;
    }
    tokio::fs::write(path, contents).await.map_err(fail)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))
            .await
            .map_err(fail)?;
    }

    Ok(())
}
