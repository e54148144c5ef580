//! mpv as the external player.
//!
//! One mpv child process in idle mode is the player *service*; each loaded
//! stream is one player *handle*. mpv resolves YouTube ids itself through its
//! yt-dlp hook, so a handle is just `loadfile <watch url>`.
//!
//! ```text
//!   MpvService::load() ── spawn task ──► MpvDriver::spawn_and_connect()
//!                                             │
//!                                             ├── writer_task ← MpvRequest via mpsc → socket
//!                                             └── reader_task ← JSON lines from socket
//!                                                    ├── response (request_id) → oneshot
//!                                                    └── event → forward_events()
//!                                                                  │ translate(&mut Binding)
//!                                                                  ▼
//!                                                       AppMessage::Player(PlayerEvent)
//! ```
//!
//! The shared [`Binding`] records which handle currently owns mpv; events
//! that arrive while nothing is bound, or for a playlist entry other than
//! the bound one, are dropped.
//!
//! Platform notes:
//! - Unix:   Unix domain sockets
//! - Windows: Named pipes  \\.\pipe\<name>

use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

#[cfg(unix)]
use tokio::net::UnixStream;

#[cfg(windows)]
use tokio::net::windows::named_pipe::ClientOptions;

use lofi_core::catalog::Station;
use lofi_core::config::PlayerConfig;
use lofi_core::error::{PlayerError, StreamError};
use lofi_core::platform;
use lofi_core::player::{
    CreateOptions, HandleId, PlayerEvent, PlayerHandle, PlayerService, PlayerState,
};

use crate::app::AppMessage;

// ── global request-id counter ─────────────────────────────────────────────────

static NEXT_REQ_ID: AtomicU64 = AtomicU64::new(1);

// ── observation property IDs ──────────────────────────────────────────────────

pub const OBS_CORE_IDLE: u64 = 1;
pub const OBS_PAUSE: u64 = 2;

// ── internal channel types ────────────────────────────────────────────────────

type PendingMap = Arc<tokio::sync::Mutex<HashMap<u64, oneshot::Sender<anyhow::Result<Value>>>>>;

struct PendingRequest {
    req_id: u64,
    payload: String, // serialised JSON line (already has '\n')
    reply: oneshot::Sender<anyhow::Result<Value>>,
}

/// An mpv event / property-change that arrived unsolicited (no request_id).
#[derive(Debug, Clone)]
pub struct MpvEvent {
    pub raw: Value,
}

impl MpvEvent {
    /// Returns `Some((obs_id, data))` if this is a property-change event.
    pub fn as_property_change(&self) -> Option<(u64, &Value)> {
        if self.raw.get("event")?.as_str()? == "property-change" {
            let id = self.raw.get("id")?.as_u64()?;
            let data = self.raw.get("data").unwrap_or(&Value::Null);
            Some((id, data))
        } else {
            None
        }
    }

    /// Returns the event name, e.g. "end-file", "start-file", "file-loaded".
    pub fn event_name(&self) -> Option<&str> {
        self.raw.get("event")?.as_str()
    }

    fn entry_id(&self) -> Option<i64> {
        self.raw.get("playlist_entry_id")?.as_i64()
    }
}

// ── IPC handle ────────────────────────────────────────────────────────────────

/// Cloneable handle to the mpv writer task.
#[derive(Clone)]
pub struct MpvHandle {
    tx: mpsc::Sender<PendingRequest>,
}

fn encode(command: Value) -> anyhow::Result<(u64, String)> {
    let req_id = NEXT_REQ_ID.fetch_add(1, Ordering::Relaxed);
    let msg = json!({ "command": command, "request_id": req_id });
    let mut raw = serde_json::to_string(&msg)?;
    raw.push('\n');
    Ok((req_id, raw))
}

impl MpvHandle {
    /// Fire a command and await mpv's reply.
    pub async fn send(&self, command: Value) -> anyhow::Result<Value> {
        let (req_id, payload) = encode(command)?;
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(PendingRequest {
                req_id,
                payload,
                reply: reply_tx,
            })
            .await
            .map_err(|_| anyhow::anyhow!("mpv writer task gone"))?;

        tokio::time::timeout(tokio::time::Duration::from_secs(5), reply_rx)
            .await
            .map_err(|_| anyhow::anyhow!("mpv IPC timeout for req={}", req_id))?
            .map_err(|_| anyhow::anyhow!("mpv reply channel dropped req={}", req_id))?
    }

    /// Queue a command without waiting for the reply. Commands posted from
    /// one thread reach mpv in posting order.
    pub fn post(&self, command: Value) -> anyhow::Result<()> {
        let (req_id, payload) = encode(command)?;
        let (reply, _) = oneshot::channel();
        self.tx
            .try_send(PendingRequest {
                req_id,
                payload,
                reply,
            })
            .map_err(|e| anyhow::anyhow!("mpv command queue: {}", e))
    }

    /// Register observe_property for the playback properties. Must be called
    /// after every fresh connection.
    pub async fn observe_properties(&self) {
        let props = [(OBS_CORE_IDLE, "core-idle"), (OBS_PAUSE, "pause")];
        for (id, name) in &props {
            match self.send(json!(["observe_property", id, name])).await {
                Ok(_) => debug!("mpv: observe_property id={} name={}", id, name),
                Err(e) => warn!("mpv: observe_property {} failed: {}", name, e),
            }
        }
    }
}

// ── driver ────────────────────────────────────────────────────────────────────

/// Spawn settings for the mpv child.
#[derive(Debug, Clone)]
pub struct MpvSettings {
    pub ytdl_format: String,
    pub initial_volume: u8,
}

impl MpvSettings {
    pub fn from_config(config: &PlayerConfig) -> Self {
        Self {
            ytdl_format: config.ytdl_format.clone(),
            initial_volume: lofi_core::player::volume_percent(config.default_volume),
        }
    }

    fn args(&self, ipc_arg: &str) -> Vec<String> {
        let mut args = vec![
            "--no-video".to_string(),
            "--idle=yes".to_string(),
            ipc_arg.to_string(),
            "--quiet".to_string(),
            format!("--volume={}", self.initial_volume),
            format!("--ytdl-format={}", self.ytdl_format),
        ];
        if let Some(ytdl) = platform::find_yt_dlp_binary() {
            args.push(format!(
                "--script-opts=ytdl_hook-ytdl_path={}",
                ytdl.display()
            ));
        }
        args
    }
}

/// Owns the mpv child process.
pub struct MpvDriver {
    pub socket_name: String,
    settings: MpvSettings,
    process: Option<tokio::process::Child>,
}

impl MpvDriver {
    pub fn new(settings: MpvSettings) -> Self {
        Self {
            socket_name: platform::mpv_socket_name(),
            settings,
            process: None,
        }
    }

    pub fn process_alive(&mut self) -> bool {
        if let Some(ref mut child) = self.process {
            match child.try_wait() {
                Ok(None) => true,
                Ok(Some(status)) => {
                    if let Some(code) = status.code() {
                        warn!("mpv process exited with code: {}", code);
                    } else {
                        warn!("mpv process terminated by signal");
                    }
                    false
                }
                Err(e) => {
                    warn!("mpv process_alive check failed: {}", e);
                    false
                }
            }
        } else {
            false
        }
    }

    /// Ask the process to exit without waiting for it.
    pub fn kill(&mut self) {
        if let Some(mut p) = self.process.take() {
            let _ = p.start_kill();
        }
    }

    fn spawn(&mut self) -> anyhow::Result<()> {
        self.kill();
        info!("mpv: spawning new process");
        let mpv_binary = platform::find_mpv_binary()
            .ok_or_else(|| anyhow::anyhow!("{}", PlayerError::BinaryNotFound))?;

        let ipc_arg = platform::mpv_socket_arg(&self.socket_name);

        let data_dir = platform::data_dir();
        std::fs::create_dir_all(&data_dir)?;
        let stderr_path = data_dir.join("mpv-stderr.log");
        let stderr_file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&stderr_path)?;
        info!("mpv: logging stderr to {:?}", stderr_path);

        let child = tokio::process::Command::new(&mpv_binary)
            .args(self.settings.args(&ipc_arg))
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(stderr_file)
            .kill_on_drop(true)
            .spawn()?;
        info!("mpv: spawned process with pid {:?}", child.id());
        self.process = Some(child);
        Ok(())
    }

    #[cfg(unix)]
    pub async fn spawn_and_connect(
        &mut self,
        event_tx: mpsc::Sender<MpvEvent>,
    ) -> anyhow::Result<MpvHandle> {
        let socket_path = std::path::PathBuf::from(&self.socket_name);
        let _ = tokio::fs::remove_file(&socket_path).await;

        self.spawn()?;

        for _ in 0..50 {
            tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
            if socket_path.exists() {
                break;
            }
            if !self.process_alive() {
                anyhow::bail!("mpv exited during start-up");
            }
        }
        if !socket_path.exists() {
            anyhow::bail!("mpv IPC socket did not appear");
        }

        let stream = UnixStream::connect(&socket_path).await?;
        info!("mpv: connected to IPC socket");
        let (read_half, write_half) = stream.into_split();
        Ok(start_io_tasks(read_half, write_half, event_tx))
    }

    #[cfg(windows)]
    pub async fn spawn_and_connect(
        &mut self,
        event_tx: mpsc::Sender<MpvEvent>,
    ) -> anyhow::Result<MpvHandle> {
        self.spawn()?;

        let pipe_path = format!(r"\\.\pipe\{}", self.socket_name);
        for _ in 0..50 {
            tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
            match ClientOptions::new().open(&pipe_path) {
                Ok(client) => {
                    info!("mpv: connected to named pipe");
                    let (read_half, write_half) = tokio::io::split(client);
                    return Ok(start_io_tasks(read_half, write_half, event_tx));
                }
                Err(_) => continue,
            }
        }
        anyhow::bail!("mpv named pipe did not appear")
    }
}

fn start_io_tasks<R, W>(read_half: R, write_half: W, event_tx: mpsc::Sender<MpvEvent>) -> MpvHandle
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
    W: tokio::io::AsyncWrite + Unpin + Send + 'static,
{
    // req_id → reply channel. Writer inserts, reader resolves.
    let pending: PendingMap = Arc::new(tokio::sync::Mutex::new(HashMap::new()));
    let (cmd_tx, cmd_rx) = mpsc::channel::<PendingRequest>(64);

    tokio::spawn(writer_task(write_half, cmd_rx, pending.clone()));
    tokio::spawn(reader_task(BufReader::new(read_half), pending, event_tx));

    MpvHandle { tx: cmd_tx }
}

// ── reader task ───────────────────────────────────────────────────────────────

async fn reader_task<R>(mut reader: BufReader<R>, pending: PendingMap, event_tx: mpsc::Sender<MpvEvent>)
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut line = String::new();
    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) => {
                debug!("mpv reader: connection closed");
                let mut map = pending.lock().await;
                for (_, tx) in map.drain() {
                    let _ = tx.send(Err(anyhow::anyhow!("mpv IPC connection closed")));
                }
                break;
            }
            Ok(_) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let val: Value = match serde_json::from_str(trimmed) {
                    Ok(v) => v,
                    Err(e) => {
                        debug!("mpv reader: invalid json '{}': {}", trimmed, e);
                        continue;
                    }
                };

                if let Some(req_id) = val.get("request_id").and_then(|v| v.as_u64()) {
                    let mut map = pending.lock().await;
                    let result = if val["error"].as_str() == Some("success") {
                        Ok(val)
                    } else {
                        let err = val["error"].as_str().unwrap_or("unknown error").to_string();
                        warn!("mpv: req={} failed: {}", req_id, err);
                        Err(anyhow::anyhow!("mpv error: {}", err))
                    };
                    if let Some(tx) = map.remove(&req_id) {
                        let _ = tx.send(result);
                    }
                } else {
                    debug!("mpv reader: event {}", trimmed);
                    if event_tx.send(MpvEvent { raw: val }).await.is_err() {
                        break;
                    }
                }
            }
            Err(e) => {
                warn!("mpv reader: read error: {}", e);
                let mut map = pending.lock().await;
                for (_, tx) in map.drain() {
                    let _ = tx.send(Err(anyhow::anyhow!("mpv IPC read error: {}", e)));
                }
                break;
            }
        }
    }
}

// ── writer task ───────────────────────────────────────────────────────────────

async fn writer_task<W>(mut writer: W, mut rx: mpsc::Receiver<PendingRequest>, pending: PendingMap)
where
    W: tokio::io::AsyncWrite + Unpin,
{
    while let Some(req) = rx.recv().await {
        // Register reply channel before writing so reader can match it
        {
            let mut map = pending.lock().await;
            map.insert(req.req_id, req.reply);
        }
        debug!("mpv writer: send req={} payload={}", req.req_id, req.payload.trim());
        if let Err(e) = writer.write_all(req.payload.as_bytes()).await {
            warn!("mpv writer: write error: {}", e);
            let mut map = pending.lock().await;
            if let Some(tx) = map.remove(&req.req_id) {
                let _ = tx.send(Err(anyhow::anyhow!("mpv write error: {}", e)));
            }
            break;
        }
    }
    debug!("mpv writer: task exiting");
}

// ── event translation ─────────────────────────────────────────────────────────

/// Which handle owns mpv right now, and what mpv last told us about it.
#[derive(Debug, Default)]
pub struct Binding {
    handle: Option<HandleId>,
    /// Playlist entry of the bound `loadfile`, learnt from its `start-file`.
    entry_id: Option<i64>,
    loaded: bool,
    pause: bool,
    core_idle: bool,
    state: PlayerState,
}

impl Binding {
    /// `core_idle` carries over: mpv only reports it when it changes.
    pub fn bind(&mut self, handle: HandleId, paused: bool) {
        *self = Binding {
            handle: Some(handle),
            pause: paused,
            core_idle: self.core_idle,
            ..Binding::default()
        };
    }

    /// Forget `handle` if it is the bound one.
    pub fn release(&mut self, handle: HandleId) {
        if self.handle == Some(handle) {
            *self = Binding {
                pause: self.pause,
                core_idle: self.core_idle,
                ..Binding::default()
            };
        }
    }

    /// Re-arm for a reload of the same handle.
    fn rearm(&mut self) {
        self.entry_id = None;
        self.loaded = false;
        self.state = PlayerState::Unstarted;
    }

    pub fn state_of(&self, handle: HandleId) -> PlayerState {
        if self.handle == Some(handle) {
            self.state
        } else {
            PlayerState::Unstarted
        }
    }

    fn derived_state(&self) -> PlayerState {
        if self.pause {
            PlayerState::Paused
        } else if self.core_idle {
            PlayerState::Buffering
        } else {
            PlayerState::Playing
        }
    }

    fn set_state(&mut self, handle: HandleId, state: PlayerState, out: &mut Vec<PlayerEvent>) {
        if self.state != state {
            self.state = state;
            out.push(PlayerEvent::state(handle, state));
        }
    }
}

/// Maps mpv's `file_error` text onto the stream error taxonomy. A video id
/// yt-dlp cannot resolve surfaces as a load failure.
pub fn stream_error_from_mpv(file_error: &str) -> StreamError {
    let lower = file_error.to_ascii_lowercase();
    if lower.contains("loading failed")
        || lower.contains("unrecognized file format")
        || lower.contains("no such file")
    {
        StreamError::NotFound
    } else {
        StreamError::Other(file_error.to_string())
    }
}

/// Fold one mpv event into the binding and return the player events it
/// produces for the bound handle.
pub fn translate(binding: &mut Binding, event: &MpvEvent) -> Vec<PlayerEvent> {
    let mut out = Vec::new();

    // Property values are tracked even while unbound.
    if let Some((id, data)) = event.as_property_change() {
        match id {
            OBS_PAUSE => binding.pause = data.as_bool().unwrap_or(false),
            OBS_CORE_IDLE => binding.core_idle = data.as_bool().unwrap_or(true),
            _ => return out,
        }
        if let (Some(handle), true) = (binding.handle, binding.loaded) {
            let state = binding.derived_state();
            binding.set_state(handle, state, &mut out);
        }
        return out;
    }

    let Some(handle) = binding.handle else {
        return out;
    };
    match event.event_name() {
        Some("start-file") => {
            if binding.entry_id.is_none() {
                binding.entry_id = event.entry_id();
                binding.set_state(handle, PlayerState::Buffering, &mut out);
            }
        }
        Some("file-loaded") => {
            if binding.entry_id.is_some() && !binding.loaded {
                binding.loaded = true;
                out.push(PlayerEvent::ready(handle));
                let state = binding.derived_state();
                binding.set_state(handle, state, &mut out);
            }
        }
        Some("end-file") => {
            let ours = binding.entry_id.is_some() && event.entry_id() == binding.entry_id;
            let reason = event.raw.get("reason").and_then(|v| v.as_str());
            if !ours || reason == Some("stop") || reason == Some("redirect") {
                return out;
            }
            if reason == Some("error") {
                let text = event
                    .raw
                    .get("file_error")
                    .and_then(|v| v.as_str())
                    .unwrap_or("error");
                out.push(PlayerEvent::error(handle, stream_error_from_mpv(text)));
            }
            binding.loaded = false;
            binding.set_state(handle, PlayerState::Ended, &mut out);
        }
        _ => {}
    }
    out
}

// ── service / handle ──────────────────────────────────────────────────────────

#[derive(Default)]
struct Session {
    /// Bumped on every successful load; stale forwarders compare against it.
    epoch: u64,
    driver: Option<MpvDriver>,
    ipc: Option<MpvHandle>,
    binding: Binding,
}

type Shared = Arc<Mutex<Session>>;

fn lock(shared: &Shared) -> MutexGuard<'_, Session> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The mpv process as a [`PlayerService`]. Load results and player events
/// are posted into the app's channel.
pub struct MpvService {
    shared: Shared,
    settings: MpvSettings,
    app_tx: mpsc::Sender<AppMessage>,
}

impl MpvService {
    pub fn new(settings: MpvSettings, app_tx: mpsc::Sender<AppMessage>) -> Self {
        Self {
            shared: Arc::new(Mutex::new(Session::default())),
            settings,
            app_tx,
        }
    }

    /// Returns true when a loaded mpv has died since the last check. The
    /// session is dropped so the next intent loads a fresh process.
    pub fn heartbeat(&self) -> bool {
        let mut session = lock(&self.shared);
        let dead = match session.driver.as_mut() {
            Some(driver) => !driver.process_alive(),
            None => false,
        };
        if dead {
            session.driver = None;
            session.ipc = None;
            session.binding = Binding::default();
        }
        dead
    }

    /// Kill the mpv process, if any.
    pub fn shutdown(&self) {
        let mut session = lock(&self.shared);
        session.ipc = None;
        if let Some(mut driver) = session.driver.take() {
            driver.kill();
        }
    }
}

impl PlayerService for MpvService {
    type Handle = MpvPlayer;

    fn is_loaded(&self) -> bool {
        lock(&self.shared).ipc.is_some()
    }

    fn load(&mut self) {
        let shared = self.shared.clone();
        let app_tx = self.app_tx.clone();
        let settings = self.settings.clone();
        tokio::spawn(async move {
            let (event_tx, event_rx) = mpsc::channel::<MpvEvent>(256);
            let mut driver = MpvDriver::new(settings);
            match driver.spawn_and_connect(event_tx).await {
                Ok(ipc) => {
                    ipc.observe_properties().await;
                    let epoch = {
                        let mut session = lock(&shared);
                        session.epoch += 1;
                        session.driver = Some(driver);
                        session.ipc = Some(ipc);
                        session.binding = Binding::default();
                        session.epoch
                    };
                    tokio::spawn(forward_events(event_rx, shared, epoch, app_tx.clone()));
                    let _ = app_tx.send(AppMessage::ServiceLoaded).await;
                }
                Err(e) => {
                    warn!("mpv: load failed: {:#}", e);
                    driver.kill();
                    let _ = app_tx.send(AppMessage::ServiceFailed(e.to_string())).await;
                }
            }
        });
    }

    fn create(
        &mut self,
        id: HandleId,
        station: &Station,
        options: CreateOptions,
    ) -> Result<MpvPlayer, PlayerError> {
        let ipc = {
            let mut session = lock(&self.shared);
            let ipc = session.ipc.clone().ok_or(PlayerError::NotLoaded)?;
            session.binding.bind(id, !options.autoplay);
            ipc
        };
        let url = station.stream_url();
        let post = |cmd: Value| ipc.post(cmd).map_err(|e| PlayerError::Ipc(e.to_string()));
        post(json!(["set_property", "pause", !options.autoplay]))?;
        post(json!(["set_property", "volume", options.volume]))?;
        post(json!(["loadfile", url, "replace"]))?;
        info!("mpv: {} -> {}", id, url);
        Ok(MpvPlayer {
            id,
            url,
            ipc,
            shared: self.shared.clone(),
            destroyed: false,
        })
    }
}

async fn forward_events(
    mut event_rx: mpsc::Receiver<MpvEvent>,
    shared: Shared,
    epoch: u64,
    app_tx: mpsc::Sender<AppMessage>,
) {
    while let Some(event) = event_rx.recv().await {
        let events = translate(&mut lock(&shared).binding, &event);
        for ev in events {
            if app_tx.send(AppMessage::Player(ev)).await.is_err() {
                return;
            }
        }
    }
    // reader gone: connection closed or mpv died
    let lost = {
        let mut session = lock(&shared);
        if session.epoch == epoch && session.ipc.is_some() {
            session.ipc = None;
            session.driver = None;
            session.binding = Binding::default();
            true
        } else {
            false
        }
    };
    if lost {
        let _ = app_tx.send(AppMessage::ServiceLost).await;
    }
}

/// One loaded stream.
pub struct MpvPlayer {
    id: HandleId,
    url: String,
    ipc: MpvHandle,
    shared: Shared,
    destroyed: bool,
}

impl MpvPlayer {
    fn post(&self, command: Value) {
        if let Err(e) = self.ipc.post(command) {
            warn!("mpv: {} command dropped: {}", self.id, e);
        }
    }
}

impl PlayerHandle for MpvPlayer {
    fn play(&mut self) {
        if self.destroyed {
            return;
        }
        let ended = {
            let mut session = lock(&self.shared);
            let ended = session.binding.state_of(self.id) == PlayerState::Ended;
            if ended {
                session.binding.rearm();
            }
            ended
        };
        self.post(json!(["set_property", "pause", false]));
        if ended {
            // an ended stream has to be loaded again
            self.post(json!(["loadfile", self.url, "replace"]));
        }
    }

    fn pause(&mut self) {
        if !self.destroyed {
            self.post(json!(["set_property", "pause", true]));
        }
    }

    fn state(&self) -> PlayerState {
        lock(&self.shared).binding.state_of(self.id)
    }

    fn set_volume(&mut self, percent: u8) {
        if !self.destroyed {
            self.post(json!(["set_property", "volume", percent]));
        }
    }

    fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        lock(&self.shared).binding.release(self.id);
        self.post(json!(["stop"]));
        debug!("mpv: destroyed {}", self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ev(raw: Value) -> MpvEvent {
        MpvEvent { raw }
    }

    fn prop(id: u64, data: bool) -> MpvEvent {
        ev(json!({"event": "property-change", "id": id, "data": data}))
    }

    fn bound(paused: bool) -> Binding {
        let mut b = Binding::default();
        b.bind(HandleId(3), paused);
        b
    }

    #[test]
    fn test_unbound_events_are_dropped() {
        let mut b = Binding::default();
        assert!(translate(&mut b, &ev(json!({"event": "file-loaded"}))).is_empty());
    }

    #[test]
    fn test_load_sequence_reports_ready_then_playing() {
        let mut b = bound(false);
        let h = HandleId(3);
        let out = translate(&mut b, &ev(json!({"event": "start-file", "playlist_entry_id": 7})));
        assert_eq!(out, vec![PlayerEvent::state(h, PlayerState::Buffering)]);

        translate(&mut b, &prop(OBS_CORE_IDLE, false));
        let out = translate(&mut b, &ev(json!({"event": "file-loaded"})));
        assert_eq!(
            out,
            vec![PlayerEvent::ready(h), PlayerEvent::state(h, PlayerState::Playing)]
        );

        let out = translate(&mut b, &prop(OBS_PAUSE, true));
        assert_eq!(out, vec![PlayerEvent::state(h, PlayerState::Paused)]);
        assert_eq!(b.state_of(h), PlayerState::Paused);
        assert_eq!(b.state_of(HandleId(2)), PlayerState::Unstarted);
    }

    #[test]
    fn test_idle_observed_before_bind_survives_rebind() {
        let mut b = Binding::default();
        let h = HandleId(2);
        // core-idle went true after the previous `stop` and never changes
        // again before the new file is loaded
        assert!(translate(&mut b, &prop(OBS_CORE_IDLE, true)).is_empty());
        b.bind(h, false);
        translate(&mut b, &ev(json!({"event": "start-file", "playlist_entry_id": 3})));
        let out = translate(&mut b, &ev(json!({"event": "file-loaded"})));
        assert_eq!(out, vec![PlayerEvent::ready(h)]);
        assert_eq!(b.state_of(h), PlayerState::Buffering);

        let out = translate(&mut b, &prop(OBS_CORE_IDLE, false));
        assert_eq!(out, vec![PlayerEvent::state(h, PlayerState::Playing)]);
    }

    #[test]
    fn test_release_keeps_observed_properties() {
        let mut b = bound(false);
        translate(&mut b, &prop(OBS_CORE_IDLE, true));
        b.release(HandleId(3));
        b.bind(HandleId(4), false);
        assert!(b.core_idle);
    }

    #[test]
    fn test_paused_load_reports_paused() {
        let mut b = bound(true);
        translate(&mut b, &ev(json!({"event": "start-file", "playlist_entry_id": 1})));
        let out = translate(&mut b, &ev(json!({"event": "file-loaded"})));
        assert_eq!(out[1], PlayerEvent::state(HandleId(3), PlayerState::Paused));
    }

    #[test]
    fn test_end_file_of_previous_entry_is_ignored() {
        let mut b = bound(false);
        // stop of the previous stream, arriving after the rebind
        let out = translate(
            &mut b,
            &ev(json!({"event": "end-file", "reason": "stop", "playlist_entry_id": 4})),
        );
        assert!(out.is_empty());

        translate(&mut b, &ev(json!({"event": "start-file", "playlist_entry_id": 5})));
        let out = translate(
            &mut b,
            &ev(json!({"event": "end-file", "reason": "eof", "playlist_entry_id": 4})),
        );
        assert!(out.is_empty());
    }

    #[test]
    fn test_load_error_reports_error_and_ended() {
        let mut b = bound(false);
        let h = HandleId(3);
        translate(&mut b, &ev(json!({"event": "start-file", "playlist_entry_id": 9})));
        let out = translate(
            &mut b,
            &ev(json!({
                "event": "end-file",
                "reason": "error",
                "playlist_entry_id": 9,
                "file_error": "loading failed"
            })),
        );
        assert_eq!(
            out,
            vec![
                PlayerEvent::error(h, StreamError::NotFound),
                PlayerEvent::state(h, PlayerState::Ended)
            ]
        );
        // idle after the error must not flip the state back
        assert!(translate(&mut b, &prop(OBS_CORE_IDLE, true)).is_empty());
        assert_eq!(b.state_of(h), PlayerState::Ended);
    }

    #[test]
    fn test_release_only_matching_handle() {
        let mut b = bound(false);
        b.release(HandleId(9));
        assert_eq!(b.handle, Some(HandleId(3)));
        b.release(HandleId(3));
        assert_eq!(b.handle, None);
    }

    #[test]
    fn test_stream_error_mapping() {
        assert_eq!(stream_error_from_mpv("Loading failed"), StreamError::NotFound);
        assert_eq!(
            stream_error_from_mpv("unrecognized file format"),
            StreamError::NotFound
        );
        assert!(matches!(
            stream_error_from_mpv("audio output initialization failed"),
            StreamError::Other(_)
        ));
    }

    #[test]
    fn test_spawn_args() {
        let settings = MpvSettings {
            ytdl_format: "bestaudio".into(),
            initial_volume: 40,
        };
        let args = settings.args("--input-ipc-server=/tmp/x.sock");
        assert_eq!(&args[..3], ["--no-video", "--idle=yes", "--input-ipc-server=/tmp/x.sock"]);
        assert!(args.contains(&"--volume=40".to_string()));
        assert!(args.contains(&"--ytdl-format=bestaudio".to_string()));
    }

    #[tokio::test]
    async fn test_post_preserves_order() {
        let (tx, mut rx) = mpsc::channel(8);
        let handle = MpvHandle { tx };
        handle.post(json!(["stop"])).unwrap();
        handle.post(json!(["loadfile", "x"])).unwrap();
        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert!(first.payload.contains("stop"));
        assert!(second.payload.contains("loadfile"));
        assert!(first.req_id < second.req_id);
    }
}
