//! In-memory version control that records every call.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use super::Vcs;
use crate::error::{Result, TrackError};

/// One recorded call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VcsCall {
    IsRepo(PathBuf),
    CreateWorktree { path: PathBuf, branch: String },
    RemoveWorktree(PathBuf),
    DeleteBranch(String),
    ArchiveBranch(String),
    Diff(PathBuf),
    Apply { root: PathBuf, patch: String },
}

#[derive(Debug, Default)]
struct MockState {
    calls: Vec<VcsCall>,
    repos: HashSet<PathBuf>,
    worktrees: HashSet<PathBuf>,
    branches: HashSet<String>,
    diffs: HashMap<PathBuf, String>,
    applied: Vec<(PathBuf, String)>,
    failing: HashSet<&'static str>,
}

/// Worktrees are directories on disk; branches exist only in memory.
#[derive(Debug, Default)]
pub struct MockVcs {
    state: Mutex<MockState>,
}

impl MockVcs {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mock that treats `root` as a repository
    pub fn with_repo(root: &Path) -> Self {
        let vcs = Self::default();
        vcs.state().repos.insert(root.to_path_buf());
        vcs
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn calls(&self) -> Vec<VcsCall> {
        self.state().calls.clone()
    }

    /// Existing branches, sorted
    pub fn branches(&self) -> Vec<String> {
        let mut branches: Vec<String> = self.state().branches.iter().cloned().collect();
        branches.sort();
        branches
    }

    pub fn has_worktree(&self, path: &Path) -> bool {
        self.state().worktrees.contains(path)
    }

    /// Make `diff` of `worktree` return `patch`
    pub fn set_diff(&self, worktree: &Path, patch: &str) {
        self.state().diffs.insert(worktree.to_path_buf(), patch.to_string());
    }

    /// Patches applied so far, with the root they went to
    pub fn applied(&self) -> Vec<(PathBuf, String)> {
        self.state().applied.clone()
    }

    /// Make an operation (`remove_worktree`, `delete_branch` or
    /// `archive_branch`) fail as if git itself errored
    pub fn fail_on(&self, operation: &'static str) {
        self.state().failing.insert(operation);
    }

    fn check(state: &MockState, operation: &'static str) -> Result<()> {
        if state.failing.contains(operation) {
            return Err(TrackError::Worktree(format!("{}: injected failure", operation)));
        }
        Ok(())
    }
}

#[async_trait]
impl Vcs for MockVcs {
    async fn is_repo(&self, root: &Path) -> bool {
        let mut state = self.state();
        state.calls.push(VcsCall::IsRepo(root.to_path_buf()));
        state.repos.contains(root)
    }

    async fn create_worktree(&self, path: &Path, branch: &str, _root: &Path) -> Result<()> {
        let mut state = self.state();
        state.calls.push(VcsCall::CreateWorktree {
            path: path.to_path_buf(),
            branch: branch.to_string(),
        });

        if state.branches.contains(branch) {
            return Err(TrackError::Worktree(format!("branch '{}' already exists", branch)));
        }
        if state.worktrees.contains(path) {
            return Err(TrackError::Worktree(format!("'{}' already exists", path.display())));
        }
        std::fs::create_dir_all(path)?;
        state.worktrees.insert(path.to_path_buf());
        state.branches.insert(branch.to_string());
        Ok(())
    }

    async fn remove_worktree(&self, path: &Path, _root: &Path) -> Result<bool> {
        let mut state = self.state();
        state.calls.push(VcsCall::RemoveWorktree(path.to_path_buf()));
        Self::check(&state, "remove_worktree")?;
        if !state.worktrees.remove(path) {
            return Ok(false);
        }
        if path.exists() {
            std::fs::remove_dir_all(path)?;
        }
        Ok(true)
    }

    async fn delete_branch(&self, branch: &str, _root: &Path) -> Result<bool> {
        let mut state = self.state();
        state.calls.push(VcsCall::DeleteBranch(branch.to_string()));
        Self::check(&state, "delete_branch")?;
        Ok(state.branches.remove(branch))
    }

    async fn archive_branch(&self, branch: &str, _root: &Path) -> Result<Option<String>> {
        let mut state = self.state();
        state.calls.push(VcsCall::ArchiveBranch(branch.to_string()));
        Self::check(&state, "archive_branch")?;
        if !state.branches.remove(branch) {
            return Ok(None);
        }
        let archived = format!("archive/{}", branch);
        state.branches.insert(archived.clone());
        Ok(Some(archived))
    }

    async fn diff(&self, worktree: &Path) -> Result<String> {
        let mut state = self.state();
        state.calls.push(VcsCall::Diff(worktree.to_path_buf()));
        if !state.worktrees.contains(worktree) {
            return Err(TrackError::Worktree(format!("not a worktree: {}", worktree.display())));
        }
        Ok(state.diffs.get(worktree).cloned().unwrap_or_default())
    }

    async fn apply(&self, root: &Path, patch: &str) -> Result<()> {
        let mut state = self.state();
        state.calls.push(VcsCall::Apply {
            root: root.to_path_buf(),
            patch: patch.to_string(),
        });
        state.applied.push((root.to_path_buf(), patch.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_worktree_lifecycle() {
        let dir = TempDir::new().unwrap();
        let vcs = MockVcs::with_repo(dir.path());
        let wt = dir.path().join("wt");

        assert!(vcs.is_repo(dir.path()).await);
        vcs.create_worktree(&wt, "b", dir.path()).await.unwrap();
        assert!(wt.is_dir());
        assert!(vcs.create_worktree(&wt, "b", dir.path()).await.is_err());

        assert!(vcs.remove_worktree(&wt, dir.path()).await.unwrap());
        assert!(!wt.exists());
        assert!(!vcs.remove_worktree(&wt, dir.path()).await.unwrap());
    }

    #[tokio::test]
    async fn test_archive_moves_branch() {
        let dir = TempDir::new().unwrap();
        let vcs = MockVcs::with_repo(dir.path());
        vcs.create_worktree(&dir.path().join("wt"), "b", dir.path()).await.unwrap();

        assert_eq!(
            vcs.archive_branch("b", dir.path()).await.unwrap(),
            Some("archive/b".to_string())
        );
        assert_eq!(vcs.branches(), vec!["archive/b".to_string()]);
        assert_eq!(vcs.archive_branch("b", dir.path()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_injected_failure_keeps_branch() {
        let dir = TempDir::new().unwrap();
        let vcs = MockVcs::with_repo(dir.path());
        vcs.create_worktree(&dir.path().join("wt"), "b", dir.path()).await.unwrap();
        vcs.fail_on("delete_branch");

        assert!(matches!(vcs.delete_branch("b", dir.path()).await, Err(TrackError::Worktree(_))));
        assert_eq!(vcs.branches(), vec!["b".to_string()]);
        assert!(vcs.archive_branch("b", dir.path()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_diff_requires_worktree() {
        let dir = TempDir::new().unwrap();
        let vcs = MockVcs::new();
        assert!(vcs.diff(dir.path()).await.is_err());
    }
}
