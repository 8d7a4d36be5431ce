//! Playback backend seam

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Number identifying one `play` call
pub type PlaybackSession = u64;

/// Controller-side playback state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
}

impl std::fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackState::Stopped => write!(f, "stopped"),
            PlaybackState::Playing => write!(f, "playing"),
        }
    }
}

/// A MIDI playback backend.
///
/// `play` starts playback of a `/keplerphone/...` path and returns at once;
/// completion is reported out of band. `stop` halts any current output and
/// must be safe to call when nothing plays.
pub trait Player {
    fn play(&mut self, path: &str) -> Result<PlaybackSession>;

    fn stop(&mut self);
}
