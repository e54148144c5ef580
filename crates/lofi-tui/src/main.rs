mod action;
mod app;
mod components;
mod gesture;
mod mpv;
mod theme;
mod widgets;

use tokio::sync::mpsc;

use lofi_core::{catalog, config::Config, platform};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let data_dir = platform::data_dir();
    std::fs::create_dir_all(&data_dir)?;
    let log_path = data_dir.join("lofi.log");

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    // Allow RUST_LOG override; default to debug for app code.
    let log_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "debug".to_string());
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(log_filter.as_str())
        .with_ansi(false)
        .init();

    // Print log path to stderr so the operator can tail it immediately.
    eprintln!("lofi log: {}", log_path.display());

    tracing::info!("lofi starting…");

    // Bundled mpv / yt-dlp beside the executable are skipped when set.
    if std::env::var_os("LOFI_SYSTEM_DEPS").is_some() {
        platform::set_use_system_deps(true);
    }

    // ── Load config ──────────────────────────────────────────────────────────
    let config = Config::load().unwrap_or_else(|e| {
        tracing::warn!("config: {:#}, using defaults", e);
        Config::default()
    });
    let catalog = catalog::load_catalog(&config);
    tracing::info!("{} stations", catalog.len());

    // ── Run TUI ──────────────────────────────────────────────────────────────
    let (tx, rx) = mpsc::channel::<app::AppMessage>(1024);
    let app = app::App::new(&config, catalog, tx.clone());
    app.run(tx, rx).await?;

    Ok(())
}
