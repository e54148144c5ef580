//! Core of the lofi radio: station catalog, configuration, the simulated beat
//! envelope, the layered waveform renderer and the playback state machine that
//! drives an external player.
//!
//! Nothing in here touches a terminal or a process; the front end supplies a
//! [`player::PlayerService`], a [`timer::Scheduler`] and a [`waveform::Surface`].

pub mod beat;
pub mod catalog;
pub mod config;
pub mod error;
pub mod platform;
pub mod playback;
pub mod player;
pub mod timer;
pub mod volume;
pub mod waveform;
