//! Playback state machine.
//!
//! [`PlaybackController`] owns the station selection and the one live player
//! handle, takes user intents, and reconciles them with the asynchronous
//! callbacks of the player service. It never blocks and never sleeps: delays
//! go through the [`Scheduler`], callbacks arrive as method calls from the
//! host's event loop.
//!
//! ```text
//!            create                 Ready event
//!   Idle ───────────────► Loading ───────────────► Ready
//!    ▲                       │                       │
//!    └───── destroy ─────────┴───────── destroy ─────┘
//! ```
//!
//! Station changes tear the handle down synchronously and arm a
//! `CreatePlayer` timer tagged with a selection generation. A newer
//! selection cancels the timer and bumps the generation, so at most one
//! replacement is ever built, for the latest selection only.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::catalog::{Catalog, Station};
use crate::config::PlayerConfig;
use crate::error::{ControllerError, StreamError};
use crate::player::{
    volume_percent, CreateOptions, HandleId, PlayerEvent, PlayerEventKind, PlayerHandle,
    PlayerService, PlayerState,
};
use crate::timer::{disarm, Deferred, Scheduler};
use crate::volume::{VolumeSlider, VOLUME_STEP};

pub const TITLE_LOADING: &str = "Loading...";
pub const TITLE_LOAD_FAILED: &str = "Failed to load player";
pub const TITLE_UNAVAILABLE: &str = "Station temporarily unavailable";
pub const TITLE_PLAYER_LOST: &str = "Player stopped";

/// Load state of the player service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceStatus {
    Unloaded,
    Loading,
    Loaded,
}

/// Where the current handle is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Idle,
    Loading,
    Ready,
}

/// Which transport affordance the UI shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayIcon {
    #[default]
    Play,
    Pause,
}

/// Everything the UI reads from the controller to draw itself.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Presentation {
    pub title: String,
    pub icon: PlayIcon,
    /// Station highlighted in the menu. Refreshed when a handle is created,
    /// so it trails the selection by the switch delay.
    pub active_index: Option<usize>,
}

enum PlayerSlot<H> {
    Idle,
    Loading { id: HandleId, handle: H },
    Ready { id: HandleId, handle: H },
}

impl<H: PlayerHandle> PlayerSlot<H> {
    fn id(&self) -> Option<HandleId> {
        match self {
            PlayerSlot::Idle => None,
            PlayerSlot::Loading { id, .. } | PlayerSlot::Ready { id, .. } => Some(*id),
        }
    }

    fn handle(&self) -> Option<&H> {
        match self {
            PlayerSlot::Idle => None,
            PlayerSlot::Loading { handle, .. } | PlayerSlot::Ready { handle, .. } => Some(handle),
        }
    }

    fn handle_mut(&mut self) -> Option<&mut H> {
        match self {
            PlayerSlot::Idle => None,
            PlayerSlot::Loading { handle, .. } | PlayerSlot::Ready { handle, .. } => Some(handle),
        }
    }

    fn lifecycle(&self) -> Lifecycle {
        match self {
            PlayerSlot::Idle => Lifecycle::Idle,
            PlayerSlot::Loading { .. } => Lifecycle::Loading,
            PlayerSlot::Ready { .. } => Lifecycle::Ready,
        }
    }

    fn take(&mut self) -> Option<H> {
        match std::mem::replace(self, PlayerSlot::Idle) {
            PlayerSlot::Idle => None,
            PlayerSlot::Loading { handle, .. } | PlayerSlot::Ready { handle, .. } => Some(handle),
        }
    }
}

pub struct PlaybackController<S: PlayerService, T: Scheduler> {
    catalog: Catalog,
    service: S,
    scheduler: T,
    service_status: ServiceStatus,
    slot: PlayerSlot<S::Handle>,
    current: usize,
    pending_autoplay: bool,
    generation: u64,
    next_handle: u64,
    pending_switch: Option<T::Timer>,
    pending_settle: Option<T::Timer>,
    volume: VolumeSlider,
    presentation: Presentation,
    autoplay: bool,
    switch_delay: Duration,
    settle_delay: Duration,
}

impl<S: PlayerService, T: Scheduler> PlaybackController<S, T> {
    pub fn new(catalog: Catalog, service: S, scheduler: T, config: &PlayerConfig) -> Self {
        let service_status = if service.is_loaded() {
            ServiceStatus::Loaded
        } else {
            ServiceStatus::Unloaded
        };
        let title = catalog
            .get(0)
            .map(|s| s.name.clone())
            .unwrap_or_default();
        Self {
            catalog,
            service,
            scheduler,
            service_status,
            slot: PlayerSlot::Idle,
            current: 0,
            pending_autoplay: false,
            generation: 0,
            next_handle: 1,
            pending_switch: None,
            pending_settle: None,
            volume: VolumeSlider::new(config.default_volume),
            presentation: Presentation {
                title,
                icon: PlayIcon::Play,
                active_index: Some(0),
            },
            autoplay: config.autoplay,
            switch_delay: config.switch_delay(),
            settle_delay: config.settle_delay(),
        }
    }

    // ── accessors ───────────────────────────────────────────────────────────

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn station(&self) -> &Station {
        &self.catalog.stations()[self.current]
    }

    pub fn presentation(&self) -> &Presentation {
        &self.presentation
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.slot.lifecycle()
    }

    pub fn service_status(&self) -> ServiceStatus {
        self.service_status
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn service_mut(&mut self) -> &mut S {
        &mut self.service
    }

    pub fn pending_autoplay(&self) -> bool {
        self.pending_autoplay
    }

    /// Id of the live handle, if any.
    pub fn handle_id(&self) -> Option<HandleId> {
        self.slot.id()
    }

    pub fn volume(&self) -> f32 {
        self.volume.value()
    }

    /// True only while a live handle reports `Playing`.
    pub fn is_playing(&self) -> bool {
        self.slot
            .handle()
            .is_some_and(|h| h.state() == PlayerState::Playing)
    }

    // ── intents ─────────────────────────────────────────────────────────────

    /// Switch to station `index`. Returns `Ok(false)` when it is already
    /// selected (nothing is torn down).
    pub fn select_station(&mut self, index: usize) -> Result<bool, ControllerError> {
        let len = self.catalog.len();
        if index >= len {
            return Err(ControllerError::StationOutOfRange { index, len });
        }
        if index == self.current {
            debug!("select_station({}): already current", index);
            return Ok(false);
        }
        self.switch_to(index);
        Ok(true)
    }

    pub fn next_station(&mut self) -> bool {
        if !self.service.is_loaded() {
            self.ensure_service();
            return false;
        }
        let index = self.catalog.next_index(self.current);
        self.switch_if_changed(index)
    }

    pub fn previous_station(&mut self) -> bool {
        if !self.service.is_loaded() {
            self.ensure_service();
            return false;
        }
        let index = self.catalog.prev_index(self.current);
        self.switch_if_changed(index)
    }

    pub fn toggle_play_pause(&mut self) {
        match &mut self.slot {
            PlayerSlot::Idle => {
                self.pending_autoplay = true;
                if self.pending_switch.is_some() {
                    debug!("toggle: creation already armed");
                } else if self.service.is_loaded() {
                    self.create_player();
                } else {
                    self.ensure_service();
                }
            }
            PlayerSlot::Loading { id, .. } => {
                debug!("toggle: {} not ready, deferring play", id);
                self.pending_autoplay = true;
            }
            PlayerSlot::Ready { handle, .. } => {
                if handle.state() == PlayerState::Playing {
                    handle.pause();
                } else {
                    handle.play();
                }
            }
        }
    }

    /// Move the slider to `level` and forward it to the live handle, if
    /// any. Returns whether it was forwarded.
    pub fn set_volume(&mut self, level: f32) -> bool {
        let value = self.volume.set(level);
        self.apply_volume(value)
    }

    pub fn volume_up(&mut self) -> f32 {
        let target = self.volume.step(VOLUME_STEP);
        self.apply_volume(target);
        target
    }

    pub fn volume_down(&mut self) -> f32 {
        let target = self.volume.step(-VOLUME_STEP);
        self.apply_volume(target);
        target
    }

    pub fn toggle_mute(&mut self) -> f32 {
        let target = self.volume.toggle_mute();
        self.apply_volume(target);
        target
    }

    // ── callbacks ───────────────────────────────────────────────────────────

    /// A scheduled action came due.
    pub fn fire(&mut self, action: Deferred) {
        match action {
            Deferred::CreatePlayer { generation } => {
                if generation != self.generation {
                    debug!(
                        "stale create (generation {} < {})",
                        generation, self.generation
                    );
                    return;
                }
                self.pending_switch = None;
                if self.service.is_loaded() {
                    self.create_player();
                } else {
                    self.ensure_service();
                }
            }
            Deferred::SettlePlay { handle } => match &mut self.slot {
                PlayerSlot::Ready { id, handle: live } if *id == handle => {
                    self.pending_settle = None;
                    debug!("settle: play {}", handle);
                    live.play();
                }
                _ => debug!("stale settle for {}", handle),
            },
        }
    }

    pub fn on_player_event(&mut self, event: PlayerEvent) {
        if self.slot.id() != Some(event.handle) {
            debug!("ignoring {:?} for stale handle {}", event.kind, event.handle);
            return;
        }
        match event.kind {
            PlayerEventKind::Ready => self.on_ready(),
            PlayerEventKind::StateChanged(state) => self.on_state_changed(state),
            PlayerEventKind::Error(error) => self.on_stream_error(event.handle, error),
        }
    }

    pub fn on_service_loaded(&mut self) {
        info!("player service loaded");
        self.service_status = ServiceStatus::Loaded;
        if matches!(self.slot, PlayerSlot::Idle) && self.pending_switch.is_none() {
            self.create_player();
        }
    }

    pub fn on_service_failed(&mut self, reason: &str) {
        warn!("player service failed to load: {}", reason);
        self.service_status = ServiceStatus::Unloaded;
        self.pending_autoplay = false;
        self.presentation.title = TITLE_LOAD_FAILED.to_string();
    }

    /// The service went away underneath us (player process died).
    pub fn on_service_lost(&mut self) {
        warn!("player service lost");
        self.service_status = ServiceStatus::Unloaded;
        disarm(&mut self.pending_switch);
        self.teardown_handle();
        self.pending_autoplay = false;
        self.presentation.title = TITLE_PLAYER_LOST.to_string();
    }

    /// Destroy the live handle and cancel everything pending.
    pub fn shutdown(&mut self) {
        disarm(&mut self.pending_switch);
        self.teardown_handle();
        self.pending_autoplay = false;
    }

    // ── internals ───────────────────────────────────────────────────────────

    fn switch_if_changed(&mut self, index: usize) -> bool {
        if index == self.current {
            return false;
        }
        self.switch_to(index);
        true
    }

    fn switch_to(&mut self, index: usize) {
        info!(
            "station {} -> {} ({})",
            self.current, index, self.catalog.stations()[index].name
        );
        self.current = index;
        self.teardown_handle();
        disarm(&mut self.pending_switch);
        self.generation += 1;

        if !self.service.is_loaded() {
            self.ensure_service();
            return;
        }
        let action = Deferred::CreatePlayer {
            generation: self.generation,
        };
        self.pending_switch = Some(self.scheduler.schedule(self.switch_delay, action));
    }

    fn ensure_service(&mut self) {
        if self.service.is_loaded() {
            self.service_status = ServiceStatus::Loaded;
            return;
        }
        if self.service_status == ServiceStatus::Loading {
            debug!("player service already loading");
            return;
        }
        info!("loading player service");
        self.service_status = ServiceStatus::Loading;
        self.presentation.title = TITLE_LOADING.to_string();
        self.service.load();
    }

    fn create_player(&mut self) {
        disarm(&mut self.pending_switch);
        self.teardown_handle();

        let station = self.catalog.stations()[self.current].clone();
        let id = HandleId(self.next_handle);
        self.next_handle += 1;
        let options = CreateOptions {
            autoplay: self.autoplay,
            volume: volume_percent(self.volume.value()),
        };

        self.presentation.title = format!("Playing: {}", station.name);
        self.presentation.active_index = Some(self.current);
        match self.service.create(id, &station, options) {
            Ok(handle) => {
                info!("created player {} for {}", id, station.name);
                self.slot = PlayerSlot::Loading { id, handle };
            }
            Err(e) => {
                warn!("failed to create player for {}: {}", station.name, e);
                self.pending_autoplay = false;
                self.presentation.title = e.to_string();
            }
        }
    }

    fn teardown_handle(&mut self) {
        disarm(&mut self.pending_settle);
        if let Some(mut handle) = self.slot.take() {
            handle.destroy();
        }
        self.presentation.icon = PlayIcon::Play;
    }

    fn apply_volume(&mut self, value: f32) -> bool {
        match self.slot.handle_mut() {
            Some(handle) => {
                handle.set_volume(volume_percent(value));
                true
            }
            None => false,
        }
    }

    fn on_ready(&mut self) {
        let id = match std::mem::replace(&mut self.slot, PlayerSlot::Idle) {
            PlayerSlot::Loading { id, handle } => {
                self.slot = PlayerSlot::Ready { id, handle };
                id
            }
            other => {
                debug!("duplicate ready");
                self.slot = other;
                return;
            }
        };
        info!("player {} ready", id);
        self.apply_volume(self.volume.value());

        if self.pending_autoplay || self.autoplay {
            self.pending_autoplay = false;
            disarm(&mut self.pending_settle);
            let timer = self
                .scheduler
                .schedule(self.settle_delay, Deferred::SettlePlay { handle: id });
            self.pending_settle = Some(timer);
        }
    }

    fn on_state_changed(&mut self, state: PlayerState) {
        debug!("player state {:?}", state);
        match state {
            PlayerState::Playing => self.presentation.icon = PlayIcon::Pause,
            PlayerState::Paused | PlayerState::Ended => self.presentation.icon = PlayIcon::Play,
            _ => {}
        }
    }

    fn on_stream_error(&mut self, id: HandleId, error: StreamError) {
        warn!("player {} error: {}", id, error);
        if error.is_station_unavailable() {
            self.presentation.title = TITLE_UNAVAILABLE.to_string();
        }
    }
}
