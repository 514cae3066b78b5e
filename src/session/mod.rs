//! Detached agent sessions, one per track.
//!
//! A session runs a generated runner script that invokes the external
//! agent and records `DONE` or `FAILED` in the track's status file. The
//! supervisor launches sessions without waiting for them and later polls
//! liveness before it looks at the status file:
//!
//! ```text
//! ABSENT --launch--> RUNNING --script exits--> DONE | FAILED
//!    ^                  |                            |
//!    |                  +--killed / crashed--> NOT_FOUND
//!    +------------------- teardown / next launch ----+
//! ```

mod backend;
mod mock;
mod script;
mod supervisor;

pub use backend::{SessionBackend, TmuxBackend};
pub use mock::{MockSessionBackend, SessionCall};
pub use script::{render_runner_script, write_runner_script};
pub use supervisor::{LaunchReceipt, PollStatus, SessionSupervisor, StatusMarker};
