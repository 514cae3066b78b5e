//! Path resolution for track resources.
//!
//! Every file, directory and session a track uses is derived from the
//! track identifier and an injected root directory, so two tracks never
//! share a resource and a later process can find an earlier run's
//! artifacts by resolving again.

mod resolver;

pub use resolver::{PathConfig, PathResolver, ResourceSet};
