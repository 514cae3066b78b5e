//! Version-control collaborator.
//!
//! Thin, idempotent wrappers around git worktree and branch commands.
//! Removal operations report `Ok(false)`/`Ok(None)` when there was nothing
//! to remove; `Err` means git itself failed.

mod git;
mod mock;

use async_trait::async_trait;
use std::path::Path;

use crate::error::Result;

pub use git::GitCli;
pub use mock::{MockVcs, VcsCall};

#[async_trait]
pub trait Vcs: Send + Sync {
    /// Whether `root` is inside a git work tree.
    async fn is_repo(&self, root: &Path) -> bool;

    /// Add a worktree at `path` on a new branch `branch` from HEAD.
    async fn create_worktree(&self, path: &Path, branch: &str, root: &Path) -> Result<()>;

    /// Force-remove the worktree at `path`. Returns whether one was removed.
    async fn remove_worktree(&self, path: &Path, root: &Path) -> Result<bool>;

    /// Delete `branch`. Returns whether it existed.
    async fn delete_branch(&self, branch: &str, root: &Path) -> Result<bool>;

    /// Rename `branch` under `archive/`. Returns the new name if it existed.
    async fn archive_branch(&self, branch: &str, root: &Path) -> Result<Option<String>>;

    /// Uncommitted changes in `worktree` relative to HEAD, as a patch.
    async fn diff(&self, worktree: &Path) -> Result<String>;

    /// Apply `patch` to the working tree at `root`.
    async fn apply(&self, root: &Path, patch: &str) -> Result<()>;
}
