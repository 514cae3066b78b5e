//! Control signals from progress documents.
//!
//! Agents steer the orchestrator by writing keyword lines into their
//! progress document:
//!
//! - `NEEDS_MORE_WORK: <note>` - keep iterating
//! - `READY_FOR_FIX: <root cause>` - investigation finished
//! - `EARLY_EXIT: <reason>` - give up or escalate
//! - `SKIP_TO_VERIFY:` - jump straight to verification
//!
//! Keywords are case-insensitive and accept `_` or a space between words.
//! The last marker in the document wins, whatever its kind. A document with
//! no markers means `CONTINUE`.

mod grammar;
mod parser;
mod types;

pub use grammar::{MarkdownGrammar, SignalGrammar};
pub use parser::{SignalParser, parse_progress};
pub use types::{MarkerMatch, ParsedProgress, ProgressStatus, Signal, SignalKind};
