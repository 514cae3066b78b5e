//! Orchestration facade.
//!
//! ```text
//! initialize ──► run_iteration ──► check_status ──► read_signal
//!                     ▲                 │                │
//!                     └──── CONTINUE / NEEDS_MORE_WORK ◄─┘
//!                                                        │
//!          READY_FOR_FIX / EARLY_EXIT / SKIP_TO_VERIFY ──┴──► diff / apply ──► teardown
//! ```

mod facade;
mod report;

pub use facade::Orchestrator;
pub use report::{InitReport, InitRequest, StepFailure, TeardownReport, TrackInit};
