//! Track identifiers.
//!
//! A track is one of two identically-structured debugging lanes. Every
//! resource a track owns is derived from its identifier.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TrackError;

/// One of the fixed debugging lanes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Track {
    #[serde(rename = "track-a")]
    A,
    #[serde(rename = "track-b")]
    B,
}

impl Track {
    /// Every track, in a stable order
    pub const ALL: [Track; 2] = [Track::A, Track::B];

    /// Identifier used on the command line and in file names
    pub fn as_str(&self) -> &'static str {
        match self {
            Track::A => "track-a",
            Track::B => "track-b",
        }
    }

    /// Upper-case letter used in document titles
    pub fn letter(&self) -> char {
        match self {
            Track::A => 'A',
            Track::B => 'B',
        }
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Track {
    type Err = TrackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "track-a" => Ok(Track::A),
            "track-b" => Ok(Track::B),
            other => Err(TrackError::InvalidTrack(other.to_string())),
        }
    }
}
