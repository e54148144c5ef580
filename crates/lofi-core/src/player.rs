//! Capability interface of the external player.
//!
//! A [`PlayerService`] is loaded lazily once and then hands out one
//! [`PlayerHandle`] per station. Handles cannot switch streams: changing
//! station means destroying the handle and creating a new one. Asynchronous
//! callbacks come back as [`PlayerEvent`]s tagged with the [`HandleId`] they
//! belong to, so events of a torn-down handle can be told apart from those of
//! its replacement.

use std::fmt;

use crate::catalog::Station;
use crate::error::{PlayerError, StreamError};

/// Identity of one created handle. Never reused within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandleId(pub u64);

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Playback state as reported by the external player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayerState {
    #[default]
    Unstarted,
    Ended,
    Playing,
    Paused,
    Buffering,
    Cued,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEventKind {
    /// The handle finished initialising and accepts commands.
    Ready,
    StateChanged(PlayerState),
    Error(StreamError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerEvent {
    pub handle: HandleId,
    pub kind: PlayerEventKind,
}

impl PlayerEvent {
    pub fn ready(handle: HandleId) -> Self {
        Self {
            handle,
            kind: PlayerEventKind::Ready,
        }
    }

    pub fn state(handle: HandleId, state: PlayerState) -> Self {
        Self {
            handle,
            kind: PlayerEventKind::StateChanged(state),
        }
    }

    pub fn error(handle: HandleId, error: StreamError) -> Self {
        Self {
            handle,
            kind: PlayerEventKind::Error(error),
        }
    }
}

/// Options for a freshly created handle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CreateOptions {
    /// Ask the player to start on its own once loaded.
    pub autoplay: bool,
    /// Initial volume, 0..=100.
    pub volume: u8,
}

/// A live connection to the player for one station.
pub trait PlayerHandle {
    fn play(&mut self);
    fn pause(&mut self);
    fn state(&self) -> PlayerState;
    /// Volume in percent, 0..=100.
    fn set_volume(&mut self, percent: u8);
    /// Tear the handle down. Calling it again is a no-op.
    fn destroy(&mut self);
}

/// The player library itself.
pub trait PlayerService {
    type Handle: PlayerHandle;

    fn is_loaded(&self) -> bool;

    /// Start loading the library. Completion is reported to the controller
    /// through `on_service_loaded` / `on_service_failed`.
    fn load(&mut self);

    fn create(
        &mut self,
        id: HandleId,
        station: &Station,
        options: CreateOptions,
    ) -> Result<Self::Handle, PlayerError>;
}

/// Converts a normalised 0..=1 level into the player's percent scale.
pub fn volume_percent(level: f32) -> u8 {
    (level.clamp(0.0, 1.0) * 100.0).round() as u8
}
