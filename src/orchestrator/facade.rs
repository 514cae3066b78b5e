//! Orchestrator composes path resolution, session supervision, signal
//! parsing and version control into the user-visible operations.

use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::report::{InitReport, InitRequest, TeardownReport, TrackInit};
use crate::config::{AgentsConfig, Config, TeardownConfig};
use crate::error::{Result, TrackError};
use crate::paths::{PathResolver, ResourceSet};
use crate::progress::{ProgressTemplate, read_progress_doc, write_progress_doc};
use crate::scan::find_marker_lines;
use crate::session::{LaunchReceipt, PollStatus, SessionBackend, SessionSupervisor, TmuxBackend};
use crate::signals::{ProgressStatus, SignalParser};
use crate::vcs::{GitCli, Vcs};

/// Entry point for driving both debug tracks.
///
/// Every operation that names a track validates it before touching the
/// filesystem or any collaborator.
pub struct Orchestrator {
    resolver: PathResolver,
    sessions: Arc<dyn SessionBackend>,
    vcs: Arc<dyn Vcs>,
    supervisor: SessionSupervisor,
    parser: SignalParser,
    agents: AgentsConfig,
    teardown: TeardownConfig,
    archive_branches: bool,
}

impl Orchestrator {
    pub fn new(
        resolver: PathResolver,
        sessions: Arc<dyn SessionBackend>,
        vcs: Arc<dyn Vcs>,
        config: &Config,
    ) -> Self {
        let supervisor = SessionSupervisor::new(resolver.clone(), sessions.clone(), config.agents.clone());
        Self {
            resolver,
            sessions,
            vcs,
            supervisor,
            parser: SignalParser::default(),
            agents: config.agents.clone(),
            teardown: config.teardown.clone(),
            archive_branches: config.git.archive_branches,
        }
    }

    /// Build with the tmux and git command-line collaborators.
    pub fn from_config(config: &Config) -> Result<Self> {
        let resolver = PathResolver::new(config.paths.to_path_config()?);
        let sessions = Arc::new(TmuxBackend::new(config.session.tmux_cmd.clone()));
        let vcs = Arc::new(GitCli::new(config.git.git_cmd.clone()));
        Ok(Self::new(resolver, sessions, vcs, config))
    }

    /// Swap the signal parser, e.g. for a different marker grammar.
    pub fn with_parser(mut self, parser: SignalParser) -> Self {
        self.parser = parser;
        self
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    /// Reset both tracks and create fresh worktrees, branches and progress
    /// documents from HEAD of `project_root`.
    pub async fn initialize(&self, project_root: &Path, request: &InitRequest) -> Result<InitReport> {
        if !self.vcs.is_repo(project_root).await {
            return Err(TrackError::NotARepository(project_root.to_path_buf()));
        }

        let all = self.resolver.all();

        info!("Cleaning up existing worktrees");
        for resources in &all {
            if self.vcs.remove_worktree(&resources.worktree, project_root).await? {
                debug!("Removed stale worktree {}", resources.worktree.display());
            }
            if self.vcs.delete_branch(&resources.branch, project_root).await? {
                debug!("Deleted stale branch {}", resources.branch);
            }
            remove_if_present(&resources.status_file).await?;
        }

        info!("Creating fresh worktrees");
        for resources in &all {
            self.vcs
                .create_worktree(&resources.worktree, &resources.branch, project_root)
                .await?;
        }

        info!("Creating progress documents");
        let mut tracks = Vec::with_capacity(all.len());
        for resources in all {
            let content = ProgressTemplate {
                track: resources.track,
                agent_label: &self.agents.for_track(resources.track).label,
                worktree: &resources.worktree,
                bug_description: request.bug_description.as_deref().unwrap_or("{bug_description}"),
                reproduction_command: request.reproduction_command.as_deref(),
                hypotheses: &request.hypotheses,
            }
            .render();
            write_progress_doc(&resources.progress_doc, &content).await?;

            tracks.push(TrackInit {
                track: resources.track,
                worktree: resources.worktree,
                progress_doc: resources.progress_doc,
                branch: resources.branch,
            });
        }

        Ok(InitReport { tracks })
    }

    /// Launch one agent iteration. Returns as soon as the session is started.
    pub async fn run_iteration(&self, track: &str, iteration: u32, prompt: &Path) -> Result<LaunchReceipt> {
        let resources = self.resolver.resolve(track)?;
        self.supervisor.launch(resources.track, iteration, prompt).await
    }

    pub async fn check_status(&self, track: &str) -> Result<PollStatus> {
        let resources = self.resolver.resolve(track)?;
        self.supervisor.poll(resources.track).await
    }

    /// Effective signal of the track's progress document. A missing
    /// document reads as `CONTINUE` with no iterations.
    pub async fn read_signal(&self, track: &str) -> Result<ProgressStatus> {
        let resources = self.resolver.resolve(track)?;
        let text = read_progress_doc(&resources.progress_doc).await;
        Ok(ProgressStatus::new(resources.track, self.parser.parse(&text)))
    }

    /// Terminate the track's session. Returns whether one was running.
    pub async fn kill(&self, track: &str) -> Result<bool> {
        let resources = self.resolver.resolve(track)?;
        self.supervisor.kill(resources.track).await
    }

    /// Patch of the track's uncommitted changes against HEAD.
    pub async fn diff(&self, track: &str) -> Result<String> {
        let resources = self.resolver.resolve(track)?;
        self.vcs.diff(&resources.worktree).await
    }

    /// Apply the track's changes to the project working tree.
    pub async fn apply(&self, track: &str, project_root: &Path) -> Result<()> {
        let resources = self.resolver.resolve(track)?;
        let patch = self.vcs.diff(&resources.worktree).await?;
        if patch.trim().is_empty() {
            return Err(TrackError::Worktree(format!("No changes to apply from {}", resources.track)));
        }

        info!("Applying {} changes to {}", resources.track, project_root.display());
        self.vcs.apply(project_root, &patch).await
    }

    /// Remove every resource of both tracks. Failures are collected in the
    /// report and never stop later steps.
    pub async fn teardown(&self, project_root: &Path) -> TeardownReport {
        let mut report = TeardownReport::default();
        let all = self.resolver.all();

        info!("Killing sessions");
        for resources in &all {
            match self.sessions.kill(&resources.session_name).await {
                Ok(true) => report.sessions_killed.push(resources.session_name.clone()),
                Ok(false) => {}
                Err(e) => report.fail("kill-session", &resources.session_name, e),
            }
        }

        info!("Removing worktrees");
        for resources in &all {
            match self.vcs.remove_worktree(&resources.worktree, project_root).await {
                Ok(true) => report.worktrees_removed.push(resources.worktree.clone()),
                Ok(false) => {}
                Err(e) => report.fail("remove-worktree", resources.worktree.display(), e),
            }
        }

        for resources in &all {
            if self.archive_branches {
                match self.vcs.archive_branch(&resources.branch, project_root).await {
                    Ok(Some(archived)) => {
                        info!("Archived {} as {}", resources.branch, archived);
                        report.branches_archived.push(archived);
                    }
                    Ok(None) => {}
                    Err(e) => report.fail("archive-branch", &resources.branch, e),
                }
            } else {
                match self.vcs.delete_branch(&resources.branch, project_root).await {
                    Ok(true) => {
                        info!("Deleted branch {}", resources.branch);
                        report.branches_deleted.push(resources.branch.clone());
                    }
                    Ok(false) => {}
                    Err(e) => report.fail("delete-branch", &resources.branch, e),
                }
            }
        }

        info!("Deleting temp files");
        for resources in &all {
            for path in teardown_files(resources, &mut report) {
                match tokio::fs::remove_file(&path).await {
                    Ok(()) => report.files_deleted.push(path),
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(e) => report.fail("delete-file", path.display(), e),
                }
            }
        }

        info!("Scanning for leftover debug markers");
        report.debug_marker_lines = find_marker_lines(
            project_root,
            &self.teardown.debug_marker,
            &self.teardown.scan_extensions,
        );
        if !report.debug_marker_lines.is_empty() {
            warn!(
                "{} line(s) still carry {}",
                report.debug_marker_lines.len(),
                self.teardown.debug_marker
            );
        }

        report
    }
}

/// Known ephemeral files plus iteration artifacts found on disk.
fn teardown_files(resources: &ResourceSet, report: &mut TeardownReport) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = resources.ephemeral_files().iter().map(|p| p.to_path_buf()).collect();

    match glob::glob(&resources.iteration_glob()) {
        Ok(entries) => {
            for entry in entries {
                match entry {
                    Ok(path) => {
                        let matches = path
                            .file_name()
                            .and_then(|n| n.to_str())
                            .is_some_and(|n| resources.is_iteration_artifact(n));
                        if matches {
                            files.push(path);
                        }
                    }
                    Err(e) => report.fail("scan-files", e.path().display(), e.error()),
                }
            }
        }
        Err(e) => report.fail("scan-files", resources.iteration_glob(), e),
    }

    files
}

async fn remove_if_present(path: &Path) -> Result<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
