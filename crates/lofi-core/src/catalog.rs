//! Station catalog: the fixed, ordered, cyclic list of streams.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::Config;
use crate::error::CatalogError;

/// One selectable continuous stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Station {
    /// Video id of the stream, or a full URL for any other mpv-playable source.
    pub id: String,
    pub name: String,
}

impl Station {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    pub fn stream_url(&self) -> String {
        if self.id.contains("://") {
            self.id.clone()
        } else {
            format!("https://www.youtube.com/watch?v={}", self.id)
        }
    }
}

/// Immutable, non-empty station list. Indices wrap modulo `len()`.
#[derive(Debug, Clone)]
pub struct Catalog {
    stations: Vec<Station>,
}

impl Catalog {
    /// Returns `None` for an empty list; a catalog always has a station 0.
    pub fn new(stations: Vec<Station>) -> Option<Self> {
        if stations.is_empty() {
            None
        } else {
            Some(Self { stations })
        }
    }

    /// The curated default streams. Index 0 is the start-up station.
    pub fn builtin() -> Self {
        let stations = [
            ("jfKfPfyJRdk", "Live Lofi - 24/7 chill beats"),
            ("wAPCSnAhhC8", "lofi hip hop radio - beats to relax/study to"),
            ("M8J9zHyyUYc", "lofi beats to do absolutely nothing to"),
            ("-FlxM_0S2lA", "jazz/lofi hip hop radio - beats to relax/study to"),
            ("_tV5LEBDs7w", "lofi hip hop radio - beats to sleep/chill to"),
            ("BTYAsjAVa3I", "chillhop radio - jazzy & lofi hip hop beats"),
        ]
        .into_iter()
        .map(|(id, name)| Station::new(id, name))
        .collect();
        Self { stations }
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Station> {
        self.stations.get(index)
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    pub fn next_index(&self, index: usize) -> usize {
        (index + 1) % self.len()
    }

    pub fn prev_index(&self, index: usize) -> usize {
        (index + self.len() - 1) % self.len()
    }
}

// ── TOML loader ───────────────────────────────────────────────────────────────

/// Matches the `[[station]]` tables of a stations file.
#[derive(Debug, Deserialize)]
struct TomlStationFile {
    #[serde(default)]
    station: Vec<Station>,
}

pub fn parse_stations_from_toml_str(content: &str) -> Result<Vec<Station>, CatalogError> {
    let file: TomlStationFile = toml::from_str(content)?;
    Ok(file.station)
}

pub fn load_catalog_from_toml(path: &Path) -> Result<Catalog, CatalogError> {
    let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let stations = parse_stations_from_toml_str(&content)?;
    Catalog::new(stations).ok_or_else(|| CatalogError::EmptyCatalog {
        path: path.to_path_buf(),
    })
}

/// Resolve the catalog: configured file, then `./stations.toml`, then the
/// built-in list. Broken files are skipped with a warning.
pub fn load_catalog(config: &Config) -> Catalog {
    let candidates = [
        config.stations.stations_toml.clone(),
        PathBuf::from("stations.toml"),
    ];

    for path in candidates.iter().filter(|p| p.exists()) {
        match load_catalog_from_toml(path) {
            Ok(catalog) => {
                info!(
                    "Loaded {} stations from {}",
                    catalog.len(),
                    path.display()
                );
                return catalog;
            }
            Err(e) => warn!("Ignoring station file {}: {}", path.display(), e),
        }
    }

    let catalog = Catalog::builtin();
    info!("Using {} built-in stations", catalog.len());
    catalog
}
