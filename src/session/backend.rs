//! Process/session collaborator and its tmux implementation.

use async_trait::async_trait;
use log::debug;
use std::path::Path;
use tokio::process::Command;

use crate::error::{Result, TrackError};

/// Named detached sessions.
///
/// "No such session" is steady state, not an error: `is_alive` and
/// `kill` report it as `false`. Errors are reserved for failures of the
/// session manager itself.
#[async_trait]
pub trait SessionBackend: Send + Sync {
    /// Start `program args...` in a new detached session called `name`.
    async fn start(&self, name: &str, program: &Path, args: &[String]) -> Result<()>;

    /// Whether a session called `name` currently exists.
    async fn is_alive(&self, name: &str) -> Result<bool>;

    /// Terminate the session. Returns whether there was one to kill.
    async fn kill(&self, name: &str) -> Result<bool>;
}

/// Sessions backed by `tmux`.
#[derive(Debug, Clone)]
pub struct TmuxBackend {
    tmux_cmd: String,
}

impl Default for TmuxBackend {
    fn default() -> Self {
        Self::new("tmux")
    }
}

impl TmuxBackend {
    pub fn new(tmux_cmd: impl Into<String>) -> Self {
        Self {
            tmux_cmd: tmux_cmd.into(),
        }
    }

    /// Exact-match target, so `debug-track-a-agent` never matches by prefix.
    fn target(name: &str) -> String {
        format!("={}", name)
    }

    async fn run(&self, operation: &str, args: &[&str]) -> Result<std::process::Output> {
        debug!("{} {}", self.tmux_cmd, args.join(" "));
        Command::new(&self.tmux_cmd)
            .args(args)
            .output()
            .await
            .map_err(|e| TrackError::session(operation, format!("failed to execute {}: {}", self.tmux_cmd, e)))
    }
}

/// Whether tmux's stderr says the session (or the whole server) is absent.
fn is_absent_session(stderr: &str) -> bool {
    stderr.contains("can't find session")
        || stderr.contains("session not found")
        || stderr.contains("no server running")
        || (stderr.contains("error connecting to") && stderr.contains("No such file or directory"))
}

/// Map a targeted tmux command's outcome to session presence. A non-zero
/// exit is only "absent" when tmux says so; anything else is a failure.
fn session_present(operation: &str, output: &std::process::Output) -> Result<bool> {
    if output.status.success() {
        return Ok(true);
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    if is_absent_session(&stderr) {
        debug!("{}: {}", operation, stderr.trim());
        return Ok(false);
    }
    let message = match stderr.trim() {
        "" => format!("exited with {}", output.status),
        trimmed => trimmed.to_string(),
    };
    Err(TrackError::session(operation, message))
}

#[async_trait]
impl SessionBackend for TmuxBackend {
    async fn start(&self, name: &str, program: &Path, args: &[String]) -> Result<()> {
        let program = program.to_string_lossy();
        let mut argv: Vec<&str> = vec!["new-session", "-d", "-s", name, program.as_ref()];
        argv.extend(args.iter().map(String::as_str));

        let output = self.run("new-session", &argv).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TrackError::session("new-session", stderr.trim()));
        }
        Ok(())
    }

    async fn is_alive(&self, name: &str) -> Result<bool> {
        let target = Self::target(name);
        let output = self.run("has-session", &["has-session", "-t", &target]).await?;
        session_present("has-session", &output)
    }

    async fn kill(&self, name: &str) -> Result<bool> {
        let target = Self::target(name);
        let output = self.run("kill-session", &["kill-session", "-t", &target]).await?;
        session_present("kill-session", &output)
    }
}
