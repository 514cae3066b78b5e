//! debug-mode - dual-track agent debugging orchestration
//!
//! Two external coding agents investigate the same bug in parallel, each in
//! its own git worktree and detached tmux session. The orchestrator launches
//! and polls their iterations and reads the control signal each agent leaves
//! in its markdown progress document.

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod paths;
pub mod progress;
pub mod scan;
pub mod session;
pub mod signals;
pub mod track;
pub mod vcs;

pub use config::Config;
pub use error::{Result, TrackError};
pub use orchestrator::{InitReport, InitRequest, Orchestrator, TeardownReport};
pub use paths::{PathConfig, PathResolver, ResourceSet};
pub use session::{LaunchReceipt, PollStatus};
pub use signals::{ProgressStatus, Signal, SignalKind};
pub use track::Track;
