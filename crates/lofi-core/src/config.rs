use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::beat::BeatParams;
use super::platform;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub stations: StationsConfig,
    #[serde(default)]
    pub visualizer: VisualizerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Initial slider position, 0.0..=1.0.
    #[serde(default = "default_volume")]
    pub default_volume: f32,
    /// Start playback as soon as a freshly created player reports ready.
    #[serde(default = "default_autoplay")]
    pub autoplay: bool,
    /// Gap between tearing down a player and creating its replacement.
    #[serde(default = "default_switch_delay_ms")]
    pub switch_delay_ms: u64,
    /// Gap between readiness and the deferred play command.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    /// Passed to mpv as `--ytdl-format`.
    #[serde(default = "default_ytdl_format")]
    pub ytdl_format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationsConfig {
    /// Path to a TOML station file.
    /// Defaults to `~/.config/lofi/stations.toml`.
    #[serde(default = "default_stations_toml")]
    pub stations_toml: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisualizerConfig {
    /// Animation cadence.
    #[serde(default = "default_fps")]
    pub fps: u32,
    /// Height of the waveform band in terminal rows.
    #[serde(default = "default_band_rows")]
    pub band_rows: u16,
    /// Logical height of the drawing surface.
    #[serde(default = "default_surface_height")]
    pub surface_height: f64,
    /// Logical width contributed by each terminal column.
    #[serde(default = "default_px_per_column")]
    pub px_per_column: f64,
    /// Scale per-frame increments by the measured frame time instead of
    /// assuming a constant cadence.
    #[serde(default)]
    pub frame_independent: bool,
    /// Fixed RNG seed for reproducible animation.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub beat: BeatParams,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            default_volume: default_volume(),
            autoplay: default_autoplay(),
            switch_delay_ms: default_switch_delay_ms(),
            settle_delay_ms: default_settle_delay_ms(),
            ytdl_format: default_ytdl_format(),
        }
    }
}

impl PlayerConfig {
    pub fn switch_delay(&self) -> Duration {
        Duration::from_millis(self.switch_delay_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

impl Default for StationsConfig {
    fn default() -> Self {
        Self {
            stations_toml: default_stations_toml(),
        }
    }
}

impl Default for VisualizerConfig {
    fn default() -> Self {
        Self {
            fps: default_fps(),
            band_rows: default_band_rows(),
            surface_height: default_surface_height(),
            px_per_column: default_px_per_column(),
            frame_independent: false,
            seed: None,
            beat: BeatParams::default(),
        }
    }
}

impl VisualizerConfig {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_micros(1_000_000 / u64::from(self.fps.clamp(1, 240)))
    }
}

fn default_volume() -> f32 {
    0.5
}

fn default_autoplay() -> bool {
    true
}

fn default_switch_delay_ms() -> u64 {
    100
}

fn default_settle_delay_ms() -> u64 {
    500
}

fn default_ytdl_format() -> String {
    "bestaudio/best".to_string()
}

fn default_stations_toml() -> PathBuf {
    platform::config_dir().join("stations.toml")
}

fn default_fps() -> u32 {
    60
}

fn default_band_rows() -> u16 {
    8
}

fn default_surface_height() -> f64 {
    80.0
}

fn default_px_per_column() -> f64 {
    10.0
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(&config_path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.player.default_volume, 0.5);
        assert!(config.player.autoplay);
        assert_eq!(config.player.switch_delay(), Duration::from_millis(100));
        assert_eq!(config.player.settle_delay(), Duration::from_millis(500));
        assert_eq!(config.visualizer.fps, 60);
        assert!(!config.visualizer.frame_independent);
        assert!(config
            .stations
            .stations_toml
            .ends_with("lofi/stations.toml"));
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [player]
            autoplay = false

            [visualizer.beat]
            decay = 0.9
            "#,
        )
        .unwrap();
        assert!(!config.player.autoplay);
        assert_eq!(config.player.settle_delay_ms, 500);
        assert_eq!(config.visualizer.beat.decay, 0.9);
        assert_eq!(config.visualizer.beat.initial_interval_ms, 450.0);
    }

    #[test]
    fn test_frame_interval() {
        let mut vis = VisualizerConfig::default();
        assert_eq!(vis.frame_interval(), Duration::from_micros(16_666));
        vis.fps = 0;
        assert_eq!(vis.frame_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_config_round_trips_through_toml() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back.visualizer.beat.decay, config.visualizer.beat.decay);
    }
}
