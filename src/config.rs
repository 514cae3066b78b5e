use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, TrackError};
use crate::paths::PathConfig;
use crate::track::Track;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: Option<String>,
    pub log_file: Option<PathBuf>,
    pub paths: PathsConfig,
    pub session: SessionConfig,
    pub git: GitConfig,
    pub agents: AgentsConfig,
    pub teardown: TeardownConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory holding worktrees, progress documents and runner artifacts
    pub root: PathBuf,
    pub prefix: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            root: std::env::temp_dir(),
            prefix: "debug".to_string(),
        }
    }
}

impl PathsConfig {
    pub fn to_path_config(&self) -> Result<PathConfig> {
        PathConfig::new(&self.root, &self.prefix)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub tmux_cmd: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tmux_cmd: "tmux".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GitConfig {
    pub git_cmd: String,
    /// Rename branches to `archive/...` on teardown instead of deleting them
    pub archive_branches: bool,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            git_cmd: "git".to_string(),
            archive_branches: true,
        }
    }
}

/// How the runner script invokes the external agent for one track.
///
/// `command` is a shell fragment; it sees `$iteration`, `$prompt`,
/// `$worktree` and `$output_file`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub label: String,
    pub command: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            label: "Claude".to_string(),
            command: r#"cd -- "$worktree" && claude --print --dangerously-skip-permissions "$prompt" | tee "$output_file""#
                .to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentsConfig {
    pub track_a: AgentConfig,
    pub track_b: AgentConfig,
}

impl Default for AgentsConfig {
    fn default() -> Self {
        Self {
            track_a: AgentConfig::default(),
            track_b: AgentConfig {
                label: "GPT 5.2".to_string(),
                command: r#"codex exec -m gpt-5.2 --full-auto -C "$worktree" -o "$output_file" "$prompt""#.to_string(),
            },
        }
    }
}

impl AgentsConfig {
    pub fn for_track(&self, track: Track) -> &AgentConfig {
        match track {
            Track::A => &self.track_a,
            Track::B => &self.track_b,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TeardownConfig {
    /// Literal marker agents put on temporary instrumentation lines
    pub debug_marker: String,
    pub scan_extensions: Vec<String>,
}

impl Default for TeardownConfig {
    fn default() -> Self {
        Self {
            debug_marker: "[DEBUG_AGENT]".to_string(),
            scan_extensions: ["js", "ts", "tsx", "py", "go", "java", "rs"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            log_file: None,
            paths: PathsConfig::default(),
            session: SessionConfig::default(),
            git: GitConfig::default(),
            agents: AgentsConfig::default(),
            teardown: TeardownConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        // Try primary location: ~/.config/<project>/<project>.yml
        let project_name = env!("CARGO_PKG_NAME");
        if let Some(config_dir) = dirs::config_dir() {
            let primary_config = config_dir.join(project_name).join(format!("{}.yml", project_name));
            if primary_config.exists() {
                match Self::load_from_file(&primary_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        warn!("Failed to load config from {}: {}", primary_config.display(), e);
                    }
                }
            }
        }

        // Try fallback location: ./<project>.yml
        let fallback_config = PathBuf::from(format!("{}.yml", project_name));
        if fallback_config.exists() {
            match Self::load_from_file(&fallback_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    warn!("Failed to load config from {}: {}", fallback_config.display(), e);
                }
            }
        }

        // No config file found, use defaults
        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| TrackError::Config(format!("Failed to read {}: {}", path.display(), e)))?;

        let config: Self = serde_yaml::from_str(&content)
            .map_err(|e| TrackError::Config(format!("Failed to parse {}: {}", path.display(), e)))?;

        info!("Loaded config from: {}", path.display());
        Ok(config)
    }
}
