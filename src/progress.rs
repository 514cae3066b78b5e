//! Progress documents.
//!
//! Each track has one markdown document. The orchestrator writes the
//! initial template; after that only the agent appends to it.

use log::debug;
use std::path::Path;

use crate::error::Result;
use crate::track::Track;

/// Placeholder hypotheses written when the caller supplies none
const HYPOTHESIS_PLACEHOLDERS: usize = 6;

/// Inputs for a fresh progress document
#[derive(Debug, Clone)]
pub struct ProgressTemplate<'a> {
    pub track: Track,
    pub agent_label: &'a str,
    pub worktree: &'a Path,
    pub bug_description: &'a str,
    pub reproduction_command: Option<&'a str>,
    pub hypotheses: &'a [String],
}

impl ProgressTemplate<'_> {
    pub fn render(&self) -> String {
        let reproduction = self.reproduction_command.unwrap_or("{reproduction_command}");
        let hypotheses = if self.hypotheses.is_empty() {
            (1..=HYPOTHESIS_PLACEHOLDERS)
                .map(|i| format!("{}. {{hypothesis_{}}}", i, i))
                .collect::<Vec<_>>()
        } else {
            self.hypotheses
                .iter()
                .enumerate()
                .map(|(i, h)| format!("{}. {}", i + 1, h))
                .collect()
        };

        format!(
            "# Debug Track {letter} Progress ({label})\n\
             \n\
             ## Worktree\n\
             {worktree}\n\
             \n\
             ## Bug Description\n\
             {bug}\n\
             \n\
             ## Reproduction Command\n\
             {reproduction}\n\
             \n\
             ## Hypotheses\n\
             {hypotheses}\n\
             \n\
             ---\n",
            letter = self.track.letter(),
            label = self.agent_label,
            worktree = self.worktree.display(),
            bug = self.bug_description,
            reproduction = reproduction,
            hypotheses = hypotheses.join("\n"),
        )
    }
}

/// Write a progress document, replacing any previous one.
pub async fn write_progress_doc(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, content).await?;
    Ok(())
}

/// Read a progress document. A missing or unreadable document reads as empty.
pub async fn read_progress_doc(path: &Path) -> String {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) => {
            debug!("Progress document {} unreadable, treating as empty: {}", path.display(), e);
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::{Signal, parse_progress};
    use tempfile::TempDir;

    fn template<'a>(hypotheses: &'a [String], repro: Option<&'a str>) -> ProgressTemplate<'a> {
        ProgressTemplate {
            track: Track::B,
            agent_label: "GPT 5.2",
            worktree: Path::new("/tmp/debug-track-b"),
            bug_description: "Login fails after password reset",
            reproduction_command: repro,
            hypotheses,
        }
    }

    #[test]
    fn test_render_with_hypotheses() {
        let hypotheses = vec!["Token cache is stale".to_string(), "Clock skew".to_string()];
        let doc = template(&hypotheses, Some("npm test -- login")).render();

        assert!(doc.starts_with("# Debug Track B Progress (GPT 5.2)\n"));
        assert!(doc.contains("## Worktree\n/tmp/debug-track-b\n"));
        assert!(doc.contains("## Bug Description\nLogin fails after password reset\n"));
        assert!(doc.contains("## Reproduction Command\nnpm test -- login\n"));
        assert!(doc.contains("## Hypotheses\n1. Token cache is stale\n2. Clock skew\n"));
        assert!(doc.ends_with("---\n"));
    }

    #[test]
    fn test_render_placeholders() {
        let doc = template(&[], None).render();
        assert!(doc.contains("## Reproduction Command\n{reproduction_command}\n"));
        assert!(doc.contains("1. {hypothesis_1}\n"));
        assert!(doc.contains("6. {hypothesis_6}\n"));
        assert!(!doc.contains("7. "));
    }

    #[test]
    fn test_fresh_template_has_no_signal() {
        let doc = template(&[], None).render();
        let parsed = parse_progress(&doc);
        assert_eq!(parsed.signal, Signal::Continue);
        assert_eq!(parsed.iteration_count, 0);
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sub").join("progress.md");
        write_progress_doc(&path, "# Hello\n").await.unwrap();
        assert_eq!(read_progress_doc(&path).await, "# Hello\n");
    }

    #[tokio::test]
    async fn test_missing_document_reads_empty() {
        let dir = TempDir::new().unwrap();
        assert_eq!(read_progress_doc(&dir.path().join("missing.md")).await, "");
    }
}
