#![allow(dead_code)]
//! Scripted player service and a harness around the controller.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use lofi_core::catalog::{Catalog, Station};
use lofi_core::config::PlayerConfig;
use lofi_core::error::PlayerError;
use lofi_core::playback::PlaybackController;
use lofi_core::player::{CreateOptions, HandleId, PlayerHandle, PlayerService, PlayerState};
use lofi_core::timer::ManualScheduler;

/// One call made against the fake player.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Load,
    Create(HandleId, String),
    Play(HandleId),
    Pause(HandleId),
    Volume(HandleId, u8),
    Destroy(HandleId),
}

#[derive(Debug, Default)]
pub struct Log {
    pub calls: Vec<Call>,
    pub live: Vec<HandleId>,
    pub loaded: bool,
    pub fail_create: Option<String>,
}

pub type SharedLog = Rc<RefCell<Log>>;

pub struct FakeService {
    log: SharedLog,
}

pub struct FakeHandle {
    id: HandleId,
    log: SharedLog,
    state: PlayerState,
    destroyed: bool,
}

impl PlayerHandle for FakeHandle {
    fn play(&mut self) {
        self.log.borrow_mut().calls.push(Call::Play(self.id));
        self.state = PlayerState::Playing;
    }

    fn pause(&mut self) {
        self.log.borrow_mut().calls.push(Call::Pause(self.id));
        self.state = PlayerState::Paused;
    }

    fn state(&self) -> PlayerState {
        self.state
    }

    fn set_volume(&mut self, percent: u8) {
        self.log.borrow_mut().calls.push(Call::Volume(self.id, percent));
    }

    fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        let mut log = self.log.borrow_mut();
        log.calls.push(Call::Destroy(self.id));
        let id = self.id;
        log.live.retain(|h| *h != id);
    }
}

impl PlayerService for FakeService {
    type Handle = FakeHandle;

    fn is_loaded(&self) -> bool {
        self.log.borrow().loaded
    }

    fn load(&mut self) {
        self.log.borrow_mut().calls.push(Call::Load);
    }

    fn create(
        &mut self,
        id: HandleId,
        station: &Station,
        _options: CreateOptions,
    ) -> Result<FakeHandle, PlayerError> {
        let mut log = self.log.borrow_mut();
        if let Some(reason) = log.fail_create.clone() {
            return Err(PlayerError::Create(reason));
        }
        log.calls.push(Call::Create(id, station.id.clone()));
        log.live.push(id);
        Ok(FakeHandle {
            id,
            log: self.log.clone(),
            state: PlayerState::Unstarted,
            destroyed: false,
        })
    }
}

pub struct Harness {
    pub ctl: PlaybackController<FakeService, ManualScheduler>,
    pub sched: ManualScheduler,
    pub log: SharedLog,
}

impl Harness {
    /// Controller over stations named by their ids.
    pub fn new(ids: &[&str], loaded: bool, autoplay: bool) -> Self {
        let stations = ids.iter().map(|id| Station::new(*id, id.to_uppercase())).collect();
        let catalog = Catalog::new(stations).expect("non-empty catalog");
        let log = Rc::new(RefCell::new(Log {
            loaded,
            ..Log::default()
        }));
        let sched = ManualScheduler::new();
        let config = PlayerConfig {
            autoplay,
            ..PlayerConfig::default()
        };
        let ctl = PlaybackController::new(
            catalog,
            FakeService { log: log.clone() },
            sched.clone(),
            &config,
        );
        Self { ctl, sched, log }
    }

    pub fn abc() -> Self {
        Self::new(&["a", "b", "c"], true, false)
    }

    /// Run the virtual clock forward, firing whatever comes due.
    pub fn advance(&mut self, ms: u64) {
        for action in self.sched.advance(Duration::from_millis(ms)) {
            self.ctl.fire(action);
        }
    }

    /// Service finishes loading.
    pub fn complete_load(&mut self) {
        self.log.borrow_mut().loaded = true;
        self.ctl.on_service_loaded();
    }

    pub fn calls(&self) -> Vec<Call> {
        self.log.borrow().calls.clone()
    }

    pub fn clear(&self) {
        self.log.borrow_mut().calls.clear();
    }

    pub fn live(&self) -> Vec<HandleId> {
        self.log.borrow().live.clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.log.borrow().calls.iter().filter(|c| pred(c)).count()
    }

    pub fn creates(&self) -> usize {
        self.count(|c| matches!(c, Call::Create(..)))
    }

    pub fn plays(&self) -> usize {
        self.count(|c| matches!(c, Call::Play(_)))
    }
}
