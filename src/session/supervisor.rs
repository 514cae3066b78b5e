//! SessionSupervisor drives the launch/poll/kill lifecycle of agent sessions.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::backend::SessionBackend;
use super::script::{render_runner_script, write_runner_script};
use crate::config::AgentsConfig;
use crate::error::{Result, TrackError};
use crate::paths::PathResolver;
use crate::track::Track;

/// Terminal marker the runner script writes to the status file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusMarker {
    Done,
    Failed,
}

impl StatusMarker {
    /// Parse status file contents. Anything but exactly `DONE`/`FAILED`
    /// (surrounding whitespace aside) is not a recorded outcome.
    pub fn parse(contents: &str) -> Option<Self> {
        match contents.trim() {
            "DONE" => Some(StatusMarker::Done),
            "FAILED" => Some(StatusMarker::Failed),
            _ => None,
        }
    }
}

/// Observed state of a track's session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PollStatus {
    Running,
    Done,
    Failed,
    NotFound,
}

impl PollStatus {
    /// Classify an observation. Liveness wins over any status file content:
    /// a marker left by an earlier iteration must not be reported while a
    /// new run is in flight.
    pub fn observe(alive: bool, status_contents: Option<&str>) -> Self {
        if alive {
            return PollStatus::Running;
        }
        match status_contents.and_then(StatusMarker::parse) {
            Some(StatusMarker::Done) => PollStatus::Done,
            Some(StatusMarker::Failed) => PollStatus::Failed,
            None => PollStatus::NotFound,
        }
    }
}

/// Where to find the results of a launched iteration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchReceipt {
    pub track: Track,
    pub session: String,
    pub iteration: u32,
    pub log_file: PathBuf,
    pub output_file: PathBuf,
    pub status_file: PathBuf,
}

/// Launches, polls and kills the agent session of each track.
pub struct SessionSupervisor {
    resolver: PathResolver,
    backend: Arc<dyn SessionBackend>,
    agents: AgentsConfig,
}

impl SessionSupervisor {
    pub fn new(resolver: PathResolver, backend: Arc<dyn SessionBackend>, agents: AgentsConfig) -> Self {
        Self {
            resolver,
            backend,
            agents,
        }
    }

    /// Start iteration `iteration` of `track` in a fresh detached session.
    ///
    /// Any prior session of the track is terminated first, and the new one
    /// is only started once the old one is confirmed gone. Returns without
    /// waiting for the agent.
    pub async fn launch(&self, track: Track, iteration: u32, prompt: &Path) -> Result<LaunchReceipt> {
        let prompt = readable_prompt(prompt).await?;
        let resources = self.resolver.resources(track);
        let session = resources.session_name.as_str();

        info!("Killing any existing session for {}", track);
        match self.backend.kill(session).await {
            Ok(true) => info!("Terminated previous session {}", session),
            Ok(false) => debug!("No previous session {}", session),
            Err(e) => warn!("Failed to kill previous session {}: {}", session, e),
        }
        if self.backend.is_alive(session).await? {
            return Err(TrackError::session(
                "kill-session",
                format!("previous session {} is still alive", session),
            ));
        }

        // A marker from the previous iteration must not outlive its session
        match tokio::fs::remove_file(&resources.status_file).await {
            Ok(()) => debug!("Removed stale status file {}", resources.status_file.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(TrackError::session("clear-status", e)),
        }

        let script = render_runner_script(self.agents.for_track(track));
        write_runner_script(&resources.runner_script, &script).await?;

        let log_file = resources.log_file(iteration);
        let output_file = resources.output_file(iteration);
        let args = vec![
            iteration.to_string(),
            prompt.to_string_lossy().into_owned(),
            resources.worktree.to_string_lossy().into_owned(),
            output_file.to_string_lossy().into_owned(),
            log_file.to_string_lossy().into_owned(),
            resources.status_file.to_string_lossy().into_owned(),
        ];

        info!("Launching {} iteration {} in session {}", track, iteration, session);
        self.backend.start(session, &resources.runner_script, &args).await?;

        Ok(LaunchReceipt {
            track,
            session: session.to_string(),
            iteration,
            log_file,
            output_file,
            status_file: resources.status_file,
        })
    }

    /// Observe the session of `track`, checking liveness before the status file.
    pub async fn poll(&self, track: Track) -> Result<PollStatus> {
        let resources = self.resolver.resources(track);

        if self.backend.is_alive(&resources.session_name).await? {
            return Ok(PollStatus::Running);
        }

        let contents = match tokio::fs::read_to_string(&resources.status_file).await {
            Ok(contents) => Some(contents),
            Err(e) => {
                debug!("No readable status file {}: {}", resources.status_file.display(), e);
                None
            }
        };
        Ok(PollStatus::observe(false, contents.as_deref()))
    }

    /// Terminate the session of `track`. Returns whether one was running.
    pub async fn kill(&self, track: Track) -> Result<bool> {
        let resources = self.resolver.resources(track);
        let killed = self.backend.kill(&resources.session_name).await?;
        if killed {
            info!("Killed session {}", resources.session_name);
        }
        Ok(killed)
    }
}

/// Confirm the prompt can be read and pin it to an absolute path, since the
/// session manager may not share our working directory.
async fn readable_prompt(prompt: &Path) -> Result<PathBuf> {
    let unreadable = |source| TrackError::PromptUnreadable {
        path: prompt.to_path_buf(),
        source,
    };
    tokio::fs::read(prompt).await.map_err(unreadable)?;
    tokio::fs::canonicalize(prompt).await.map_err(unreadable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::PathConfig;
    use crate::session::{MockSessionBackend, SessionCall};
    use tempfile::TempDir;

    struct Fixture {
        dir: TempDir,
        backend: Arc<MockSessionBackend>,
        supervisor: SessionSupervisor,
        resolver: PathResolver,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let resolver = PathResolver::new(PathConfig::new(dir.path(), "debug").unwrap());
        let backend = Arc::new(MockSessionBackend::new());
        let supervisor = SessionSupervisor::new(resolver.clone(), backend.clone(), AgentsConfig::default());
        Fixture {
            dir,
            backend,
            supervisor,
            resolver,
        }
    }

    fn write_prompt(dir: &TempDir) -> PathBuf {
        let prompt = dir.path().join("prompt.md");
        std::fs::write(&prompt, "Investigate the crash").unwrap();
        prompt
    }

    #[test]
    fn test_status_marker_parse() {
        assert_eq!(StatusMarker::parse("DONE\n"), Some(StatusMarker::Done));
        assert_eq!(StatusMarker::parse("  FAILED "), Some(StatusMarker::Failed));
        assert_eq!(StatusMarker::parse("done"), None);
        assert_eq!(StatusMarker::parse(""), None);
        assert_eq!(StatusMarker::parse("DONE\nFAILED"), None);
    }

    #[test]
    fn test_observe_liveness_wins() {
        assert_eq!(PollStatus::observe(true, Some("DONE")), PollStatus::Running);
        assert_eq!(PollStatus::observe(true, Some("FAILED")), PollStatus::Running);
        assert_eq!(PollStatus::observe(true, None), PollStatus::Running);
    }

    #[test]
    fn test_observe_terminal_states() {
        assert_eq!(PollStatus::observe(false, Some("DONE\n")), PollStatus::Done);
        assert_eq!(PollStatus::observe(false, Some("FAILED\n")), PollStatus::Failed);
        assert_eq!(PollStatus::observe(false, Some("garbage")), PollStatus::NotFound);
        assert_eq!(PollStatus::observe(false, None), PollStatus::NotFound);
    }

    #[test]
    fn test_poll_status_serialization() {
        assert_eq!(serde_json::to_string(&PollStatus::NotFound).unwrap(), "\"NOT_FOUND\"");
        assert_eq!(serde_json::to_string(&PollStatus::Running).unwrap(), "\"RUNNING\"");
    }

    #[tokio::test]
    async fn test_launch_returns_receipt_and_starts_runner() {
        let f = fixture();
        let prompt = write_prompt(&f.dir);
        let resources = f.resolver.resources(Track::B);

        let receipt = f.supervisor.launch(Track::B, 2, &prompt).await.unwrap();

        assert_eq!(receipt.session, "debug-track-b-agent");
        assert_eq!(receipt.iteration, 2);
        assert_eq!(receipt.log_file, resources.log_file(2));
        assert_eq!(receipt.output_file, resources.output_file(2));
        assert_eq!(receipt.status_file, resources.status_file);
        assert!(resources.runner_script.exists());

        let args = f.backend.start_args("debug-track-b-agent").unwrap();
        assert_eq!(args.len(), 6);
        assert_eq!(args[0], "2");
        assert_eq!(PathBuf::from(&args[1]), prompt.canonicalize().unwrap());
        assert_eq!(PathBuf::from(&args[2]), resources.worktree);
        assert_eq!(PathBuf::from(&args[3]), resources.output_file(2));
        assert_eq!(PathBuf::from(&args[4]), resources.log_file(2));
        assert_eq!(PathBuf::from(&args[5]), resources.status_file);
    }

    #[tokio::test]
    async fn test_launch_kills_before_start() {
        let f = fixture();
        let prompt = write_prompt(&f.dir);

        f.supervisor.launch(Track::A, 1, &prompt).await.unwrap();

        let calls = f.backend.calls();
        let kill = calls
            .iter()
            .position(|c| matches!(c, SessionCall::Kill(n) if n == "debug-track-a-agent"))
            .unwrap();
        let start = calls
            .iter()
            .position(|c| matches!(c, SessionCall::Start { name, .. } if name == "debug-track-a-agent"))
            .unwrap();
        assert!(kill < start);
    }

    #[tokio::test]
    async fn test_launch_unreadable_prompt_touches_nothing() {
        let f = fixture();
        let missing = f.dir.path().join("missing.md");

        let err = f.supervisor.launch(Track::A, 1, &missing).await.unwrap_err();

        assert!(matches!(err, TrackError::PromptUnreadable { .. }));
        assert!(f.backend.calls().is_empty());
        assert!(!f.resolver.resources(Track::A).runner_script.exists());
    }

    #[tokio::test]
    async fn test_launch_twice_never_overlaps() {
        let f = fixture();
        let prompt = write_prompt(&f.dir);

        f.supervisor.launch(Track::A, 1, &prompt).await.unwrap();
        f.supervisor.launch(Track::A, 2, &prompt).await.unwrap();

        assert_eq!(f.backend.live_sessions(), vec!["debug-track-a-agent".to_string()]);
        assert_eq!(f.backend.start_args("debug-track-a-agent").unwrap()[0], "2");
        assert_eq!(f.backend.duplicate_starts(), 0);
    }

    #[tokio::test]
    async fn test_launch_refuses_when_prior_session_survives_kill() {
        let f = fixture();
        let prompt = write_prompt(&f.dir);
        f.backend.insert_live("debug-track-a-agent");
        f.backend.survive_kill("debug-track-a-agent");

        let err = f.supervisor.launch(Track::A, 1, &prompt).await.unwrap_err();

        assert!(matches!(
            err,
            TrackError::SessionOperationFailed { ref operation, .. } if operation == "kill-session"
        ));
        assert!(!f.backend.calls().iter().any(|c| matches!(c, SessionCall::Start { .. })));
    }

    #[tokio::test]
    async fn test_launch_proceeds_when_kill_errors_but_session_absent() {
        let f = fixture();
        let prompt = write_prompt(&f.dir);
        f.backend.fail_on("kill");

        f.supervisor.launch(Track::B, 1, &prompt).await.unwrap();

        assert_eq!(f.backend.live_sessions(), vec!["debug-track-b-agent".to_string()]);
    }

    #[tokio::test]
    async fn test_launch_propagates_start_failure() {
        let f = fixture();
        let prompt = write_prompt(&f.dir);
        f.backend.fail_on("start");

        let err = f.supervisor.launch(Track::B, 1, &prompt).await.unwrap_err();
        assert!(matches!(err, TrackError::SessionOperationFailed { .. }));
    }

    #[tokio::test]
    async fn test_launch_clears_stale_status() {
        let f = fixture();
        let prompt = write_prompt(&f.dir);
        let status = f.resolver.resources(Track::A).status_file;
        std::fs::write(&status, "DONE\n").unwrap();

        f.supervisor.launch(Track::A, 2, &prompt).await.unwrap();
        assert!(!status.exists());

        f.backend.finish("debug-track-a-agent", None).unwrap();
        assert_eq!(f.supervisor.poll(Track::A).await.unwrap(), PollStatus::NotFound);
    }

    #[tokio::test]
    async fn test_poll_running_despite_done_status() {
        let f = fixture();
        let prompt = write_prompt(&f.dir);
        f.supervisor.launch(Track::A, 1, &prompt).await.unwrap();
        std::fs::write(f.resolver.resources(Track::A).status_file, "DONE\n").unwrap();

        assert_eq!(f.supervisor.poll(Track::A).await.unwrap(), PollStatus::Running);
    }

    #[tokio::test]
    async fn test_poll_terminal_outcomes() {
        let f = fixture();
        let prompt = write_prompt(&f.dir);

        f.supervisor.launch(Track::A, 1, &prompt).await.unwrap();
        f.backend.finish("debug-track-a-agent", Some("DONE")).unwrap();
        assert_eq!(f.supervisor.poll(Track::A).await.unwrap(), PollStatus::Done);

        f.supervisor.launch(Track::A, 2, &prompt).await.unwrap();
        f.backend.finish("debug-track-a-agent", Some("FAILED")).unwrap();
        assert_eq!(f.supervisor.poll(Track::A).await.unwrap(), PollStatus::Failed);

        f.supervisor.launch(Track::A, 3, &prompt).await.unwrap();
        assert!(f.supervisor.kill(Track::A).await.unwrap());
        assert_eq!(f.supervisor.poll(Track::A).await.unwrap(), PollStatus::NotFound);
    }

    #[tokio::test]
    async fn test_poll_absent_track_is_not_found() {
        let f = fixture();
        assert_eq!(f.supervisor.poll(Track::B).await.unwrap(), PollStatus::NotFound);
    }

    #[tokio::test]
    async fn test_poll_propagates_liveness_failure() {
        let f = fixture();
        f.backend.fail_on("is_alive");
        let err = f.supervisor.poll(Track::B).await.unwrap_err();
        assert!(matches!(err, TrackError::SessionOperationFailed { .. }));
    }

    #[tokio::test]
    async fn test_kill_without_session_is_false() {
        let f = fixture();
        assert!(!f.supervisor.kill(Track::A).await.unwrap());
    }

    #[tokio::test]
    async fn test_tracks_are_independent() {
        let f = fixture();
        let prompt = write_prompt(&f.dir);

        f.supervisor.launch(Track::A, 1, &prompt).await.unwrap();
        f.supervisor.launch(Track::B, 1, &prompt).await.unwrap();
        f.backend.finish("debug-track-b-agent", Some("DONE")).unwrap();

        assert_eq!(f.supervisor.poll(Track::A).await.unwrap(), PollStatus::Running);
        assert_eq!(f.supervisor.poll(Track::B).await.unwrap(), PollStatus::Done);
    }
}
