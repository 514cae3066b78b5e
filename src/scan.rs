//! Scan a project tree for leftover debug instrumentation.
//!
//! Agents tag the lines they add while investigating with a fixed marker
//! string. Anything still carrying it after teardown needs manual removal.

use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

const SKIPPED_DIRS: &[&str] = &[".git", "node_modules", "target", "dist", "build", "vendor"];

/// One line still carrying the debug marker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerLine {
    pub path: PathBuf,
    /// 1-based line number
    pub line: usize,
    pub text: String,
}

impl fmt::Display for MarkerLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.path.display(), self.line, self.text)
    }
}

fn is_skipped(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| SKIPPED_DIRS.contains(&name))
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|e| e.trim_start_matches('.') == ext))
}

/// Find every line containing `marker` in files under `root` whose
/// extension is in `extensions`. Unreadable files are skipped.
pub fn find_marker_lines(root: &Path, marker: &str, extensions: &[String]) -> Vec<MarkerLine> {
    let mut found = Vec::new();
    if marker.is_empty() || !root.is_dir() {
        return found;
    }

    for entry in WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_skipped(e))
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_file() || !has_extension(entry.path(), extensions) {
            continue;
        }

        let contents = match std::fs::read_to_string(entry.path()) {
            Ok(contents) => contents,
            Err(e) => {
                debug!("Skipping {}: {}", entry.path().display(), e);
                continue;
            }
        };

        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        found.extend(
            contents
                .lines()
                .enumerate()
                .filter(|(_, line)| line.contains(marker))
                .map(|(i, line)| MarkerLine {
                    path: relative.to_path_buf(),
                    line: i + 1,
                    text: line.trim().to_string(),
                }),
        );
    }

    found
}
