use std::path::PathBuf;
use thiserror::Error;

/// Failures while building the station catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("station list at {path} contains no stations")]
    EmptyCatalog { path: PathBuf },

    #[error("failed to read station list {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse station list: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Failures of the external player service itself (not of a single stream).
#[derive(Debug, Clone, Error)]
pub enum PlayerError {
    #[error("player binary not found")]
    BinaryNotFound,

    #[error("player IPC failed: {0}")]
    Ipc(String),

    #[error("player is not loaded")]
    NotLoaded,

    #[error("failed to create player: {0}")]
    Create(String),
}

/// Failures reported by the state machine to its callers.
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("station index {index} out of range (catalog has {len})")]
    StationOutOfRange { index: usize, len: usize },
}

/// Stream-level playback error raised by a live handle.
///
/// The numeric codes follow the embeddable video player's error callback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamError {
    #[error("stream not found")]
    NotFound,

    #[error("embedding disallowed by the stream owner")]
    EmbedDisallowed,

    #[error("invalid stream request")]
    InvalidRequest,

    #[error("playback error: {0}")]
    Other(String),
}

impl StreamError {
    pub fn from_code(code: u16) -> Self {
        match code {
            2 => StreamError::InvalidRequest,
            100 => StreamError::NotFound,
            101 | 150 => StreamError::EmbedDisallowed,
            other => StreamError::Other(format!("code {other}")),
        }
    }

    /// Errors that mean this station cannot be played at all right now.
    pub fn is_station_unavailable(&self) -> bool {
        matches!(self, StreamError::NotFound | StreamError::EmbedDisallowed)
    }
}
