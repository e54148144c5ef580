//! App: the event loop.
//!
//! Architecture:
//! - `App` owns the playback controller, the waveform renderer and its scene,
//!   and the view state (menu, fullscreen, toasts).
//! - A `tokio::mpsc` channel carries `AppMessage`s in from background tasks:
//!   terminal input, mpv events, service load results and scheduler timers.
//! - Input is mapped to `Action`s; App dispatches each Action.
//! - A fixed-cadence frame interval advances the animation and redraws.

use std::io;
use std::time::{Duration, Instant};

use ratatui::crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, MouseButton, MouseEvent,
        MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    widgets::{Block, Paragraph},
    Frame, Terminal,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use lofi_core::beat::BeatSimulator;
use lofi_core::catalog::Catalog;
use lofi_core::config::{Config, VisualizerConfig};
use lofi_core::playback::PlaybackController;
use lofi_core::player::PlayerEvent;
use lofi_core::timer::{Deferred, TokioScheduler};
use lofi_core::waveform::{Scene, WaveformRenderer};

use crate::action::{map_key, Action};
use crate::components::station_menu::{self, StationMenu};
use crate::components::{header, hint_bar, waveform};
use crate::gesture::TapDetector;
use crate::mpv::{MpvService, MpvSettings};
use crate::theme::C_BG;
use crate::widgets::toast::ToastManager;

/// Messages flowing into the event loop from background tasks.
#[derive(Debug)]
pub enum AppMessage {
    Event(Event),
    Player(PlayerEvent),
    ServiceLoaded,
    ServiceFailed(String),
    ServiceLost,
    Timer(Deferred),
}

const HEARTBEAT: Duration = Duration::from_secs(10);

type Controller = PlaybackController<MpvService, TokioScheduler<AppMessage>>;

pub struct App {
    ctl: Controller,
    renderer: WaveformRenderer,
    scene: Scene,
    visualizer: VisualizerConfig,
    menu: StationMenu,
    toast: ToastManager,
    taps: TapDetector,
    fullscreen: bool,
    /// Terminal area of the last drawn frame, for mouse hit-testing.
    area: Rect,
    started: Instant,
    should_quit: bool,
}

impl App {
    pub fn new(config: &Config, catalog: Catalog, tx: mpsc::Sender<AppMessage>) -> Self {
        let service = MpvService::new(MpvSettings::from_config(&config.player), tx.clone());
        let scheduler = TokioScheduler::new(tx, AppMessage::Timer);
        let ctl = PlaybackController::new(catalog, service, scheduler, &config.player);

        let visualizer = config.visualizer.clone();
        let simulator = match visualizer.seed {
            Some(seed) => BeatSimulator::with_seed(visualizer.beat.clone(), seed),
            None => BeatSimulator::new(visualizer.beat.clone()),
        }
        .frame_independent(visualizer.frame_independent);

        Self {
            ctl,
            renderer: WaveformRenderer::new(simulator),
            scene: Scene::new(0.0, visualizer.surface_height),
            visualizer,
            menu: StationMenu::default(),
            toast: ToastManager::new(),
            taps: TapDetector::new(),
            fullscreen: false,
            area: Rect::default(),
            started: Instant::now(),
            should_quit: false,
        }
    }

    pub async fn run(
        mut self,
        tx: mpsc::Sender<AppMessage>,
        mut rx: mpsc::Receiver<AppMessage>,
    ) -> anyhow::Result<()> {
        debug!("run(): enabling raw mode");
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        debug!("run(): terminal created, size={:?}", terminal.size());

        // ── Background task: keyboard/mouse events ────────────────────────────
        let event_tx = tx.clone();
        tokio::task::spawn_blocking(move || loop {
            match event::read() {
                Ok(ev) => {
                    if event_tx.blocking_send(AppMessage::Event(ev)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        });
        drop(tx);

        // ── Periodic timers ───────────────────────────────────────────────────
        let mut frame_tick = tokio::time::interval(self.visualizer.frame_interval());
        frame_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        let mut toast_tick = tokio::time::interval(Duration::from_millis(100));
        toast_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        let mut heartbeat = tokio::time::interval(HEARTBEAT);
        heartbeat.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        // ── Main loop ─────────────────────────────────────────────────────────
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal.draw(|f| self.draw(f))?;
            }
            needs_redraw = false;

            if self.should_quit {
                break;
            }

            tokio::select! {
                Some(msg) = rx.recv() => {
                    const MAX_DRAIN: usize = 256;
                    self.handle_message(msg);
                    let mut drained = 0usize;
                    while drained < MAX_DRAIN {
                        match rx.try_recv() {
                            Ok(next) => self.handle_message(next),
                            Err(_) => break,
                        }
                        drained += 1;
                    }
                    needs_redraw = true;
                }

                _ = frame_tick.tick() => {
                    let size = terminal.size()?;
                    self.animate(Rect::new(0, 0, size.width, size.height));
                    needs_redraw = true;
                }

                _ = toast_tick.tick() => {
                    self.toast.tick();
                }

                _ = heartbeat.tick() => {
                    if self.ctl.service().heartbeat() {
                        warn!("mpv process died");
                        self.ctl.on_service_lost();
                        self.toast.warning("mpv exited");
                        needs_redraw = true;
                    }
                }
            }
        }

        // ── Teardown ──────────────────────────────────────────────────────────
        info!("shutting down");
        self.ctl.shutdown();
        self.ctl.service().shutdown();
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;

        Ok(())
    }

    fn handle_message(&mut self, msg: AppMessage) {
        match msg {
            AppMessage::Event(Event::Key(key)) => {
                for action in map_key(key, self.menu.is_open()) {
                    self.dispatch(action);
                }
            }
            AppMessage::Event(Event::Mouse(mouse)) => {
                for action in self.handle_mouse(mouse) {
                    self.dispatch(action);
                }
            }
            AppMessage::Event(_) => {}
            AppMessage::Player(ev) => self.ctl.on_player_event(ev),
            AppMessage::ServiceLoaded => self.ctl.on_service_loaded(),
            AppMessage::ServiceFailed(reason) => {
                self.ctl.on_service_failed(&reason);
                self.toast.error(reason);
            }
            AppMessage::ServiceLost => {
                self.ctl.on_service_lost();
                self.toast.warning("mpv exited");
            }
            AppMessage::Timer(action) => self.ctl.fire(action),
        }
    }

    fn dispatch(&mut self, action: Action) {
        debug!("dispatch {:?}", action);
        match action {
            Action::TogglePlay => self.ctl.toggle_play_pause(),
            Action::Next => {
                self.ctl.next_station();
            }
            Action::Prev => {
                self.ctl.previous_station();
            }
            Action::Select(index) => {
                if let Err(e) = self.ctl.select_station(index) {
                    warn!("select: {}", e);
                    self.toast.error(e.to_string());
                }
            }
            Action::VolumeUp => {
                let level = self.ctl.volume_up();
                self.toast.info(volume_label(level));
            }
            Action::VolumeDown => {
                let level = self.ctl.volume_down();
                self.toast.info(volume_label(level));
            }
            Action::Mute => {
                let level = self.ctl.toggle_mute();
                self.toast.info(volume_label(level));
            }
            Action::ToggleFullscreen => self.fullscreen = !self.fullscreen,
            Action::OpenMenu => self.menu.open(self.ctl.current_index()),
            Action::CloseMenu => self.menu.close(),
            Action::MenuUp => self.menu.up(self.ctl.catalog().len()),
            Action::MenuDown => self.menu.down(self.ctl.catalog().len()),
            Action::MenuConfirm => {
                let index = self.menu.cursor();
                self.menu.close();
                self.dispatch(Action::Select(index));
            }
            Action::Quit => self.should_quit = true,
        }
    }

    fn handle_mouse(&mut self, event: MouseEvent) -> Vec<Action> {
        match event.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if self.menu.is_open() {
                    let count = self.ctl.catalog().len();
                    return match station_menu::row_at(self.area, count, event.column, event.row) {
                        Some(index) => vec![Action::CloseMenu, Action::Select(index)],
                        None => vec![Action::CloseMenu],
                    };
                }
                if self.taps.tap(Instant::now()) {
                    vec![Action::ToggleFullscreen]
                } else {
                    vec![]
                }
            }
            MouseEventKind::ScrollUp => vec![Action::VolumeUp],
            MouseEventKind::ScrollDown => vec![Action::VolumeDown],
            _ => vec![],
        }
    }

    /// Advance the animation one frame into a scene sized for the band.
    fn animate(&mut self, area: Rect) {
        let band = self.layout(area).band;
        self.scene.resize(
            f64::from(band.width) * self.visualizer.px_per_column,
            self.visualizer.surface_height,
        );
        let now_ms = self.started.elapsed().as_secs_f64() * 1000.0;
        let playing = self.ctl.is_playing();
        self.renderer.render(&mut self.scene, playing, now_ms);
    }

    fn layout(&self, area: Rect) -> Regions {
        if self.fullscreen {
            return Regions {
                header: Rect::default(),
                rule: Rect::default(),
                band: area,
                hints: Rect::default(),
            };
        }
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(self.visualizer.band_rows),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(area);
        Regions {
            header: chunks[0],
            rule: chunks[1],
            band: chunks[3],
            hints: chunks[5],
        }
    }

    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();
        self.area = area;
        frame.render_widget(Block::default().style(Style::default().bg(C_BG)), area);

        let regions = self.layout(area);
        waveform::draw(frame, regions.band, &self.scene);
        if self.fullscreen {
            return;
        }

        let station = self.ctl.station();
        let view = header::HeaderView {
            presentation: self.ctl.presentation(),
            service: self.ctl.service_status(),
            station_name: &station.name,
            index: self.ctl.current_index(),
            count: self.ctl.catalog().len(),
            volume: self.ctl.volume(),
        };
        header::draw(frame, regions.header, &view);
        frame.render_widget(Paragraph::new(header::separator(regions.rule.width)), regions.rule);
        hint_bar::draw(frame, regions.hints, self.menu.is_open());

        self.menu.draw(
            frame,
            area,
            self.ctl.catalog().stations(),
            self.ctl.presentation().active_index,
        );
        self.toast.draw(frame, regions.band);
    }
}

struct Regions {
    header: Rect,
    rule: Rect,
    band: Rect,
    hints: Rect,
}

fn volume_label(level: f32) -> String {
    if level <= 0.0 {
        "Muted".to_string()
    } else {
        format!("Volume {}%", (level * 100.0).round() as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volume_label() {
        assert_eq!(volume_label(0.0), "Muted");
        assert_eq!(volume_label(0.5), "Volume 50%");
        assert_eq!(volume_label(0.6000001), "Volume 60%");
    }
}
