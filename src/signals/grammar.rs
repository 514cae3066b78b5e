//! Marker grammars.
//!
//! A grammar finds every marker in a document and counts iteration
//! sections; it never decides which marker wins. Swapping the grammar
//! (e.g. for structured JSON markers) leaves resolution and callers alone.

use regex::Regex;
use std::sync::LazyLock;

use super::types::{MarkerMatch, SignalKind};

/// Finds signal markers and iteration headings in document text.
pub trait SignalGrammar: Send + Sync {
    /// Every marker of every kind, with its offset and payload.
    fn markers(&self, text: &str) -> Vec<MarkerMatch>;

    /// Number of iteration section headings.
    fn iteration_count(&self, text: &str) -> usize;
}

// Keyword, optional bold markup around the colon, then the rest of the line.
// Payload capture stops at the line end so an empty payload stays empty.
static NEEDS_MORE_WORK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bNEEDS[_ ]MORE[_ ]WORK(?:\*\*)?:(?:\*\*)?[ \t]*([^\r\n]*)").unwrap());

static READY_FOR_FIX_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bREADY[_ ]FOR[_ ]FIX(?:\*\*)?:(?:\*\*)?[ \t]*([^\r\n]*)").unwrap());

static EARLY_EXIT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bEARLY[_ ]EXIT(?:\*\*)?:(?:\*\*)?[ \t]*([^\r\n]*)").unwrap());

static SKIP_TO_VERIFY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bSKIP[_ ]TO[_ ]VERIFY(?:\*\*)?:(?:\*\*)?[ \t]*([^\r\n]*)").unwrap());

static ITERATION_HEADING_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^##[ \t]+Iteration[ \t]+\d+\b").unwrap());

/// Keyword lines in markdown, as agents write them in progress documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownGrammar;

impl MarkdownGrammar {
    fn patterns() -> [(SignalKind, &'static Regex); 4] {
        [
            (SignalKind::NeedsMoreWork, &NEEDS_MORE_WORK_REGEX),
            (SignalKind::ReadyForFix, &READY_FOR_FIX_REGEX),
            (SignalKind::EarlyExit, &EARLY_EXIT_REGEX),
            (SignalKind::SkipToVerify, &SKIP_TO_VERIFY_REGEX),
        ]
    }
}

impl SignalGrammar for MarkdownGrammar {
    fn markers(&self, text: &str) -> Vec<MarkerMatch> {
        let mut found = Vec::new();

        for (kind, regex) in Self::patterns() {
            for cap in regex.captures_iter(text) {
                let (Some(whole), Some(payload)) = (cap.get(0), cap.get(1)) else {
                    continue;
                };
                found.push(MarkerMatch::new(kind, whole.start(), payload.as_str().trim()));
            }
        }

        found
    }

    fn iteration_count(&self, text: &str) -> usize {
        ITERATION_HEADING_REGEX.find_iter(text).count()
    }
}
