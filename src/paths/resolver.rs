//! PathResolver maps a track to its full set of resource locations.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use crate::error::{Result, TrackError};
use crate::track::Track;

// `<stem>-iter<N>.log` or `<stem>-iter<N>-out.txt`; group 1 is the stem.
static ITERATION_ARTIFACT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+)-iter\d+(?:\.log|-out\.txt)$").unwrap());

/// Root directory and name prefix shared by every derived resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathConfig {
    root: PathBuf,
    prefix: String,
}

impl PathConfig {
    /// Create a new PathConfig.
    ///
    /// The prefix ends up in file, branch and tmux session names, so it is
    /// restricted to ASCII alphanumerics, `-`, `_` and `.`.
    pub fn new(root: impl Into<PathBuf>, prefix: impl Into<String>) -> Result<Self> {
        let prefix = prefix.into();
        let valid = !prefix.is_empty()
            && prefix
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !valid {
            return Err(TrackError::Config(format!("invalid path prefix: {:?}", prefix)));
        }

        Ok(Self {
            root: root.into(),
            prefix,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

/// Every location a track owns. Recomputed on demand, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceSet {
    pub track: Track,
    pub worktree: PathBuf,
    pub branch: String,
    pub progress_doc: PathBuf,
    pub prompt_file: PathBuf,
    pub status_file: PathBuf,
    pub runner_script: PathBuf,
    pub session_name: String,
    root: PathBuf,
    stem: String,
}

impl ResourceSet {
    /// Log file capturing the agent's combined output for one iteration
    pub fn log_file(&self, iteration: u32) -> PathBuf {
        self.root.join(format!("{}-iter{}.log", self.stem, iteration))
    }

    /// File the agent writes its final answer to for one iteration
    pub fn output_file(&self, iteration: u32) -> PathBuf {
        self.root.join(format!("{}-iter{}-out.txt", self.stem, iteration))
    }

    /// Every file teardown deletes by name. Iteration files are found by scan.
    pub fn ephemeral_files(&self) -> [&Path; 4] {
        [
            &self.progress_doc,
            &self.prompt_file,
            &self.status_file,
            &self.runner_script,
        ]
    }

    /// Glob matching candidate iteration log/output files for this track
    pub fn iteration_glob(&self) -> String {
        let root = glob::Pattern::escape(&self.root.to_string_lossy());
        format!("{}/{}-iter*", root.trim_end_matches('/'), self.stem)
    }

    /// Whether a file name follows this track's iteration naming scheme
    pub fn is_iteration_artifact(&self, file_name: &str) -> bool {
        ITERATION_ARTIFACT_REGEX
            .captures(file_name)
            .and_then(|cap| cap.get(1))
            .is_some_and(|stem| stem.as_str() == self.stem)
    }
}

/// Pure mapping from track identifiers to resource locations.
#[derive(Debug, Clone)]
pub struct PathResolver {
    config: PathConfig,
}

impl PathResolver {
    pub fn new(config: PathConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PathConfig {
        &self.config
    }

    /// Resolve a raw track identifier, rejecting anything outside the track set.
    pub fn resolve(&self, track: &str) -> Result<ResourceSet> {
        let track: Track = track.parse()?;
        Ok(self.resources(track))
    }

    /// Resources for an already-validated track.
    pub fn resources(&self, track: Track) -> ResourceSet {
        let root = self.config.root.clone();
        let stem = format!("{}-{}", self.config.prefix, track.as_str());

        ResourceSet {
            track,
            worktree: root.join(&stem),
            branch: stem.clone(),
            progress_doc: root.join(format!("{}-progress.md", stem)),
            prompt_file: root.join(format!("{}-prompt.md", stem)),
            status_file: root.join(format!("{}.status", stem)),
            runner_script: root.join(format!("{}-runner.sh", stem)),
            session_name: format!("{}-agent", stem),
            root,
            stem,
        }
    }

    /// Resources for every track, in track order.
    pub fn all(&self) -> Vec<ResourceSet> {
        Track::ALL.iter().map(|t| self.resources(*t)).collect()
    }
}
