//! In-memory session backend that records every call.
//!
//! Sessions never run anything; tests end them with [`MockSessionBackend::finish`],
//! which writes the terminal marker to the status path the supervisor passed
//! as the last runner argument.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use super::backend::SessionBackend;
use crate::error::{Result, TrackError};

/// One recorded backend call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCall {
    Start {
        name: String,
        program: PathBuf,
        args: Vec<String>,
    },
    IsAlive(String),
    Kill(String),
}

#[derive(Debug, Default)]
struct MockState {
    calls: Vec<SessionCall>,
    live: HashSet<String>,
    last_args: HashMap<String, Vec<String>>,
    sticky: HashSet<String>,
    failing: HashSet<&'static str>,
    duplicate_starts: usize,
}

#[derive(Debug, Default)]
pub struct MockSessionBackend {
    state: Mutex<MockState>,
}

impl MockSessionBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Every call received so far, in order
    pub fn calls(&self) -> Vec<SessionCall> {
        self.state().calls.clone()
    }

    /// Names of sessions currently alive, sorted
    pub fn live_sessions(&self) -> Vec<String> {
        let mut live: Vec<String> = self.state().live.iter().cloned().collect();
        live.sort();
        live
    }

    /// Arguments of the most recent start of `name`
    pub fn start_args(&self, name: &str) -> Option<Vec<String>> {
        self.state().last_args.get(name).cloned()
    }

    /// Starts refused because a session of that name was still alive
    pub fn duplicate_starts(&self) -> usize {
        self.state().duplicate_starts
    }

    /// Pretend a session already exists, e.g. left over from an earlier process
    pub fn insert_live(&self, name: &str) {
        self.state().live.insert(name.to_string());
    }

    /// Make `kill` report success without ending the session
    pub fn survive_kill(&self, name: &str) {
        self.state().sticky.insert(name.to_string());
    }

    /// Make an operation (`start`, `is_alive` or `kill`) fail
    pub fn fail_on(&self, operation: &'static str) {
        self.state().failing.insert(operation);
    }

    /// End a session as the runner would: optionally write `marker` to the
    /// status file, then exit.
    pub fn finish(&self, name: &str, marker: Option<&str>) -> std::io::Result<()> {
        let mut state = self.state();
        state.live.remove(name);
        if let Some(marker) = marker
            && let Some(status_file) = state.last_args.get(name).and_then(|args| args.last())
        {
            std::fs::write(status_file, format!("{}\n", marker))?;
        }
        Ok(())
    }

    fn check(state: &MockState, operation: &'static str) -> Result<()> {
        if state.failing.contains(operation) {
            return Err(TrackError::session(operation, "injected failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl SessionBackend for MockSessionBackend {
    async fn start(&self, name: &str, program: &Path, args: &[String]) -> Result<()> {
        let mut state = self.state();
        state.calls.push(SessionCall::Start {
            name: name.to_string(),
            program: program.to_path_buf(),
            args: args.to_vec(),
        });
        Self::check(&state, "start")?;

        if state.live.contains(name) {
            state.duplicate_starts += 1;
            return Err(TrackError::session("start", format!("duplicate session: {}", name)));
        }
        state.live.insert(name.to_string());
        state.last_args.insert(name.to_string(), args.to_vec());
        Ok(())
    }

    async fn is_alive(&self, name: &str) -> Result<bool> {
        let mut state = self.state();
        state.calls.push(SessionCall::IsAlive(name.to_string()));
        Self::check(&state, "is_alive")?;
        Ok(state.live.contains(name))
    }

    async fn kill(&self, name: &str) -> Result<bool> {
        let mut state = self.state();
        state.calls.push(SessionCall::Kill(name.to_string()));
        Self::check(&state, "kill")?;

        if state.sticky.contains(name) {
            return Ok(state.live.contains(name));
        }
        Ok(state.live.remove(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_start_and_kill() {
        let backend = MockSessionBackend::new();
        backend.start("s", Path::new("/bin/run"), &[]).await.unwrap();
        assert!(backend.is_alive("s").await.unwrap());
        assert!(backend.kill("s").await.unwrap());
        assert!(!backend.is_alive("s").await.unwrap());
        assert!(!backend.kill("s").await.unwrap());
        assert_eq!(backend.calls().len(), 5);
    }

    #[tokio::test]
    async fn test_duplicate_start_is_refused() {
        let backend = MockSessionBackend::new();
        backend.start("s", Path::new("/bin/run"), &[]).await.unwrap();
        assert!(backend.start("s", Path::new("/bin/run"), &[]).await.is_err());
        assert_eq!(backend.duplicate_starts(), 1);
    }

    #[tokio::test]
    async fn test_finish_writes_marker_to_last_argument() {
        let dir = TempDir::new().unwrap();
        let status = dir.path().join("status");
        let backend = MockSessionBackend::new();
        backend
            .start("s", Path::new("/bin/run"), &["1".to_string(), status.to_string_lossy().into_owned()])
            .await
            .unwrap();

        backend.finish("s", Some("FAILED")).unwrap();

        assert!(!backend.is_alive("s").await.unwrap());
        assert_eq!(std::fs::read_to_string(&status).unwrap(), "FAILED\n");
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let backend = MockSessionBackend::new();
        backend.fail_on("is_alive");
        assert!(backend.is_alive("s").await.is_err());
        assert_eq!(backend.calls(), vec![SessionCall::IsAlive("s".to_string())]);
    }
}
