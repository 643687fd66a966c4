//! Error types shared by the settings loader and the soundtrack scheduler.

use std::path::PathBuf;

use thiserror::Error;

/// Problems reading or validating [`crate::settings::Settings`].
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid setting `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },
}

impl SettingsError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid { field, reason: reason.into() }
    }
}

/// Failures reported by a playable audio handle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AudioError {
    /// The track could not be fetched or decoded.
    #[error("failed to load {url}: {reason}")]
    LoadFailed { url: String, reason: String },
    /// The host refused to start playback (autoplay policy, device busy, ...).
    #[error("playback denied: {reason}")]
    PlaybackDenied { reason: String },
    /// `play` was called before anything was loaded into the handle.
    #[error("no track loaded")]
    NotLoaded,
}

/// Errors the soundtrack scheduler surfaces to its owner.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JukeboxError {
    #[error("playlist is empty")]
    EmptyPlaylist,
    #[error("no track in the playlist could be loaded")]
    NoPlayableTrack,
}
