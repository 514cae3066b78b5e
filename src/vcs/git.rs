//! Git CLI implementation of the version-control collaborator.

use async_trait::async_trait;
use chrono::Utc;
use log::{debug, warn};
use std::path::Path;
use std::process::{Output, Stdio};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::Vcs;
use crate::error::{Result, TrackError};

/// Runs `git` as a subprocess for every operation.
#[derive(Debug, Clone)]
pub struct GitCli {
    git_cmd: String,
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new("git")
    }
}

impl GitCli {
    pub fn new(git_cmd: impl Into<String>) -> Self {
        Self {
            git_cmd: git_cmd.into(),
        }
    }

    /// Name a branch gets when archived at the current time.
    pub fn archive_name(branch: &str) -> String {
        format!("archive/{}-{}", branch, Utc::now().format("%Y-%m-%dT%H-%M-%S"))
    }

    async fn git(&self, dir: &Path, args: &[&str]) -> Result<Output> {
        debug!("{} {} (in {})", self.git_cmd, args.join(" "), dir.display());
        Command::new(&self.git_cmd)
            .args(args)
            .current_dir(dir)
            .output()
            .await
            .map_err(|e| TrackError::Worktree(format!("Failed to execute git: {}", e)))
    }

    /// Run a removal-style command. `Ok(false)` when git's stderr matches
    /// one of `absent`, i.e. there was nothing to act on.
    async fn git_removal(&self, dir: &Path, args: &[&str], absent: &[&str]) -> Result<bool> {
        let output = self.git(dir, args).await?;
        if output.status.success() {
            return Ok(true);
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        if absent.iter().any(|pattern| stderr.contains(pattern)) {
            debug!("git {}: {}", args.join(" "), stderr.trim());
            return Ok(false);
        }
        Err(TrackError::Worktree(format!("git {} failed: {}", args.join(" "), stderr.trim())))
    }
}

/// stderr of `git worktree remove` when the path is not a registered
/// worktree, or its directory already vanished
const WORKTREE_ABSENT: &[&str] = &["is not a working tree", "does not exist"];

/// stderr of `git branch -D` / `git branch -m` for a missing branch
const BRANCH_ABSENT: &[&str] = &["not found", "no branch named"];

fn path_arg(path: &Path) -> Result<&str> {
    path.to_str()
        .ok_or_else(|| TrackError::Worktree(format!("Non UTF-8 path: {}", path.display())))
}

#[async_trait]
impl Vcs for GitCli {
    async fn is_repo(&self, root: &Path) -> bool {
        match self.git(root, &["rev-parse", "--is-inside-work-tree"]).await {
            Ok(output) => output.status.success() && String::from_utf8_lossy(&output.stdout).trim() == "true",
            Err(_) => false,
        }
    }

    async fn create_worktree(&self, path: &Path, branch: &str, root: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| TrackError::Worktree(format!("Failed to create base path: {}", e)))?;
        }

        let output = self
            .git(root, &["worktree", "add", path_arg(path)?, "-b", branch, "HEAD"])
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TrackError::Worktree(format!("Failed to create worktree: {}", stderr.trim())));
        }

        Ok(())
    }

    async fn remove_worktree(&self, path: &Path, root: &Path) -> Result<bool> {
        let removed = self
            .git_removal(root, &["worktree", "remove", path_arg(path)?, "--force"], WORKTREE_ABSENT)
            .await?;

        // Drop registrations whose directories vanished underneath git
        match self.git(root, &["worktree", "prune"]).await {
            Ok(output) if !output.status.success() => {
                warn!("git worktree prune failed: {}", String::from_utf8_lossy(&output.stderr).trim());
            }
            Ok(_) => {}
            Err(e) => warn!("{}", e),
        }

        Ok(removed)
    }

    async fn delete_branch(&self, branch: &str, root: &Path) -> Result<bool> {
        self.git_removal(root, &["branch", "-D", branch], BRANCH_ABSENT).await
    }

    async fn archive_branch(&self, branch: &str, root: &Path) -> Result<Option<String>> {
        let archive = Self::archive_name(branch);
        let renamed = self
            .git_removal(root, &["branch", "-m", branch, &archive], BRANCH_ABSENT)
            .await?;
        Ok(renamed.then_some(archive))
    }

    async fn diff(&self, worktree: &Path) -> Result<String> {
        let output = self.git(worktree, &["diff", "HEAD", "--", "."]).await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TrackError::Worktree(format!("Failed to diff worktree: {}", stderr.trim())));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn apply(&self, root: &Path, patch: &str) -> Result<()> {
        let mut child = Command::new(&self.git_cmd)
            .args(["apply", "--verbose", "-"])
            .current_dir(root)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| TrackError::Worktree(format!("Failed to execute git: {}", e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(patch.as_bytes()).await?;
            stdin.shutdown().await?;
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TrackError::Worktree(format!("Failed to apply patch: {}", stderr.trim())));
        }

        Ok(())
    }
}
