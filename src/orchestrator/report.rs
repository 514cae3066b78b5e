//! Records returned by facade operations.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::scan::MarkerLine;
use crate::track::Track;

/// What to write into fresh progress documents
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitRequest {
    #[serde(default)]
    pub bug_description: Option<String>,
    #[serde(default)]
    pub reproduction_command: Option<String>,
    #[serde(default)]
    pub hypotheses: Vec<String>,
}

/// Resources created for one track
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackInit {
    pub track: Track,
    pub worktree: PathBuf,
    pub progress_doc: PathBuf,
    pub branch: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitReport {
    pub tracks: Vec<TrackInit>,
}

/// A teardown sub-step that did not succeed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepFailure {
    pub step: String,
    pub target: String,
    pub message: String,
}

impl fmt::Display for StepFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.step, self.target, self.message)
    }
}

/// Everything teardown removed, what it could not, and what needs manual care.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeardownReport {
    pub sessions_killed: Vec<String>,
    pub worktrees_removed: Vec<PathBuf>,
    pub branches_archived: Vec<String>,
    pub branches_deleted: Vec<String>,
    pub files_deleted: Vec<PathBuf>,
    /// Advisory: lines still carrying the debug marker
    pub debug_marker_lines: Vec<MarkerLine>,
    pub errors: Vec<StepFailure>,
}

impl TeardownReport {
    /// Whether anything at all was removed
    pub fn removed_anything(&self) -> bool {
        !(self.sessions_killed.is_empty()
            && self.worktrees_removed.is_empty()
            && self.branches_archived.is_empty()
            && self.branches_deleted.is_empty()
            && self.files_deleted.is_empty())
    }

    pub(crate) fn fail(&mut self, step: &str, target: impl fmt::Display, message: impl fmt::Display) {
        self.errors.push(StepFailure {
            step: step.to_string(),
            target: target.to_string(),
            message: message.to_string(),
        });
    }
}
