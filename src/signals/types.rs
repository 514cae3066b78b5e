//! Signal types extracted from progress documents.

use serde::{Deserialize, Serialize};

use crate::track::Track;

/// Kind of control signal.
///
/// Declaration order doubles as the tie-break when two markers share an
/// offset: the later-declared kind wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalKind {
    Continue,
    NeedsMoreWork,
    ReadyForFix,
    EarlyExit,
    SkipToVerify,
}

/// A marker found in the document text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerMatch {
    pub kind: SignalKind,
    /// Byte offset of the marker keyword in the document
    pub offset: usize,
    /// Trimmed text after the marker, up to end of line
    pub payload: String,
}

impl MarkerMatch {
    pub fn new(kind: SignalKind, offset: usize, payload: impl Into<String>) -> Self {
        Self {
            kind,
            offset,
            payload: payload.into(),
        }
    }
}

/// The single effective directive of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    Continue,
    NeedsMoreWork { note: String },
    ReadyForFix { root_cause: String },
    EarlyExit { reason: String },
    SkipToVerify,
}

impl Signal {
    pub fn kind(&self) -> SignalKind {
        match self {
            Signal::Continue => SignalKind::Continue,
            Signal::NeedsMoreWork { .. } => SignalKind::NeedsMoreWork,
            Signal::ReadyForFix { .. } => SignalKind::ReadyForFix,
            Signal::EarlyExit { .. } => SignalKind::EarlyExit,
            Signal::SkipToVerify => SignalKind::SkipToVerify,
        }
    }

    /// Build the signal a marker stands for, keeping only the payload its kind carries
    pub fn from_marker(marker: &MarkerMatch) -> Self {
        let payload = marker.payload.clone();
        match marker.kind {
            SignalKind::Continue => Signal::Continue,
            SignalKind::NeedsMoreWork => Signal::NeedsMoreWork { note: payload },
            SignalKind::ReadyForFix => Signal::ReadyForFix { root_cause: payload },
            SignalKind::EarlyExit => Signal::EarlyExit { reason: payload },
            SignalKind::SkipToVerify => Signal::SkipToVerify,
        }
    }
}

/// Result of parsing one document. Pure function of the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedProgress {
    pub signal: Signal,
    pub iteration_count: usize,
}

/// Record returned to callers of `status`.
///
/// At most one of `root_cause` and `reason` is present, chosen by the
/// signal kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressStatus {
    pub track: Track,
    pub signal: SignalKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_cause: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub iteration_count: usize,
}

impl ProgressStatus {
    pub fn new(track: Track, parsed: ParsedProgress) -> Self {
        let signal = parsed.signal.kind();
        let (root_cause, reason) = match parsed.signal {
            Signal::ReadyForFix { root_cause } => (Some(root_cause), None),
            Signal::EarlyExit { reason } => (None, Some(reason)),
            Signal::NeedsMoreWork { note } => (None, Some(note)),
            Signal::Continue | Signal::SkipToVerify => (None, None),
        };

        Self {
            track,
            signal,
            root_cause,
            reason,
            iteration_count: parsed.iteration_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_order_is_declaration_order() {
        assert!(SignalKind::Continue < SignalKind::NeedsMoreWork);
        assert!(SignalKind::NeedsMoreWork < SignalKind::ReadyForFix);
        assert!(SignalKind::ReadyForFix < SignalKind::EarlyExit);
        assert!(SignalKind::EarlyExit < SignalKind::SkipToVerify);
    }

    #[test]
    fn test_from_marker_keeps_kind_payload() {
        let ready = Signal::from_marker(&MarkerMatch::new(SignalKind::ReadyForFix, 0, "off by one"));
        assert_eq!(
            ready,
            Signal::ReadyForFix {
                root_cause: "off by one".to_string()
            }
        );
        let skip = Signal::from_marker(&MarkerMatch::new(SignalKind::SkipToVerify, 4, "ignored"));
        assert_eq!(skip, Signal::SkipToVerify);
        assert_eq!(skip.kind(), SignalKind::SkipToVerify);
    }

    #[test]
    fn test_status_ready_serializes_root_cause_only() {
        let status = ProgressStatus::new(
            Track::A,
            ParsedProgress {
                signal: Signal::ReadyForFix {
                    root_cause: "cache not invalidated".to_string(),
                },
                iteration_count: 2,
            },
        );
        assert_eq!(
            serde_json::to_value(&status).unwrap(),
            json!({
                "track": "track-a",
                "signal": "READY_FOR_FIX",
                "rootCause": "cache not invalidated",
                "iterationCount": 2
            })
        );
    }

    #[test]
    fn test_status_early_exit_serializes_reason_only() {
        let status = ProgressStatus::new(
            Track::B,
            ParsedProgress {
                signal: Signal::EarlyExit {
                    reason: String::new(),
                },
                iteration_count: 0,
            },
        );
        assert_eq!(status.root_cause, None);
        assert_eq!(status.reason.as_deref(), Some(""));
        assert_eq!(
            serde_json::to_value(&status).unwrap(),
            json!({
                "track": "track-b",
                "signal": "EARLY_EXIT",
                "reason": "",
                "iterationCount": 0
            })
        );
    }

    #[test]
    fn test_status_continue_has_no_payload() {
        let status = ProgressStatus::new(
            Track::A,
            ParsedProgress {
                signal: Signal::Continue,
                iteration_count: 3,
            },
        );
        assert_eq!(
            serde_json::to_value(&status).unwrap(),
            json!({"track": "track-a", "signal": "CONTINUE", "iterationCount": 3})
        );
    }
}
