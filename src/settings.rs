//! Startup configuration, read from an optional JSON file.

use std::{fs, path::Path, time::Duration};

use bevy::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::error::SettingsError;
use crate::jukebox::{JukeboxConfig, Playlist, RotationPolicy, Track};
use crate::snake_game::{BoundaryPolicy, Grid, GridPoint, Rules, MAX_TILE_COUNT, SPEED_LIMITS};

#[derive(Resource, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Board side in pixels; divided by `cell_pixels` to get the tile count.
    pub board_pixels: u32,
    pub cell_pixels: u32,
    pub start: GridPoint,
    pub boundary: BoundaryPolicy,
    /// Ticks per second.
    pub base_speed: f32,
    pub speed_increment: f32,
    pub max_speed: f32,
    pub food_award: u32,
    pub min_turn_interval_ms: u64,
    pub min_swipe_distance: f32,
    pub music: MusicSettings,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MusicSettings {
    pub tracks: Vec<Track>,
    pub base_volume: f32,
    pub fade_step: f32,
    pub fade_interval_ms: u64,
    /// Rotate on a fixed period instead of waiting for each track to end.
    pub rotation_interval_secs: Option<u64>,
    pub muted: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            board_pixels: 400,
            cell_pixels: 20,
            start: GridPoint::new(10, 10),
            boundary: BoundaryPolicy::Toroidal,
            base_speed: 7.0,
            speed_increment: 0.5,
            max_speed: 15.0,
            food_award: 10,
            min_turn_interval_ms: 50,
            min_swipe_distance: 30.0,
            music: MusicSettings::default(),
        }
    }
}

impl Default for MusicSettings {
    fn default() -> Self {
        Self {
            tracks: vec![
                Track::new("music/qifengle.mp3").with_title("Qi Feng Le"),
                Track::new("music/ningxia.mp3").with_title("Ning Xia"),
            ],
            base_volume: 0.3,
            fade_step: 0.02,
            fade_interval_ms: 50,
            rotation_interval_secs: None,
            muted: false,
        }
    }
}

impl Settings {
    /// Reads `path` if given, otherwise returns the defaults.
    pub fn load(path: Option<&Path>) -> Result<Settings, SettingsError> {
        let Some(path) = path else {
            return Ok(Settings::default());
        };
        let text = fs::read_to_string(path)
            .map_err(|source| SettingsError::Io { path: path.to_owned(), source })?;
        let settings: Settings = serde_json::from_str(&text)
            .map_err(|source| SettingsError::Parse { path: path.to_owned(), source })?;
        log::info!("loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.cell_pixels == 0 {
            return Err(SettingsError::invalid("cell_pixels", "must be positive"));
        }
        let tiles = self.board_pixels / self.cell_pixels;
        if tiles < 1 || tiles > MAX_TILE_COUNT as u32 {
            return Err(SettingsError::invalid(
                "board_pixels",
                format!("gives {tiles} tiles per side, expected 1..={MAX_TILE_COUNT}"),
            ));
        }
        let tiles = tiles as i16;
        if !Grid::new(tiles).contains(self.start) {
            return Err(SettingsError::invalid(
                "start",
                format!("({}, {}) lies outside a {tiles}x{tiles} grid", self.start.x, self.start.y),
            ));
        }
        let (min, max) = (SPEED_LIMITS.start(), SPEED_LIMITS.end());
        if !SPEED_LIMITS.contains(&self.base_speed) {
            return Err(SettingsError::invalid("base_speed", format!("must be within {min}..={max}")));
        }
        if !SPEED_LIMITS.contains(&self.max_speed) {
            return Err(SettingsError::invalid("max_speed", format!("must be within {min}..={max}")));
        }
        if !(self.speed_increment >= 0.0 && self.speed_increment.is_finite()) {
            return Err(SettingsError::invalid("speed_increment", "must be finite and not negative"));
        }
        if self.max_speed < self.base_speed {
            return Err(SettingsError::invalid("max_speed", "must be at least base_speed"));
        }
        if !(0.0..=1.0).contains(&self.music.base_volume) {
            return Err(SettingsError::invalid("music.base_volume", "must be within 0..=1"));
        }
        if !(self.music.fade_step > 0.0) {
            return Err(SettingsError::invalid("music.fade_step", "must be positive"));
        }
        if self.music.fade_interval_ms == 0 {
            return Err(SettingsError::invalid("music.fade_interval_ms", "must be positive"));
        }
        if self.music.rotation_interval_secs == Some(0) {
            return Err(SettingsError::invalid("music.rotation_interval_secs", "must be positive"));
        }
        Ok(())
    }

    /// Cells per side. Call [`Settings::validate`] first.
    pub fn tile_count(&self) -> i16 {
        (self.board_pixels / self.cell_pixels.max(1)).clamp(1, MAX_TILE_COUNT as u32) as i16
    }

    pub fn rules(&self) -> Rules {
        Rules {
            tile_count: self.tile_count(),
            start: self.start,
            boundary: self.boundary,
            base_speed: self.base_speed,
            speed_increment: self.speed_increment,
            max_speed: self.max_speed,
            food_award: self.food_award,
            min_turn_interval: Duration::from_millis(self.min_turn_interval_ms),
        }
    }

    pub fn playlist(&self) -> Playlist {
        Playlist::new(self.music.tracks.clone())
    }

    pub fn jukebox_config(&self) -> JukeboxConfig {
        let rotation = match self.music.rotation_interval_secs {
            Some(secs) => RotationPolicy::Interval(Duration::from_secs(secs)),
            None => RotationPolicy::OnTrackEnd,
        };
        JukeboxConfig {
            base_volume: self.music.base_volume,
            fade_step: self.music.fade_step,
            fade_interval: Duration::from_millis(self.music.fade_interval_ms),
            rotation,
            muted: self.music.muted,
        }
    }
}
