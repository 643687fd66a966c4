use std::path::PathBuf;

use clap::Parser;

use crate::error::SettingsError;
use crate::settings::Settings;
use crate::snake_game::BoundaryPolicy;

#[derive(Parser, Debug)]
#[command(version, about = "Snake with a crossfading soundtrack")]
pub struct Args {
    /// JSON settings file; built-in defaults are used when omitted.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override the boundary policy.
    #[arg(long, value_enum)]
    pub boundary: Option<BoundaryPolicy>,

    /// Override the number of cells per side.
    #[arg(long)]
    pub tiles: Option<u32>,

    /// Start with the soundtrack muted.
    #[arg(long)]
    pub mute: bool,
}

impl Args {
    /// Loads the settings file and applies the command-line overrides.
    pub fn settings(&self) -> Result<Settings, SettingsError> {
        let mut settings = Settings::load(self.config.as_deref())?;
        if let Some(boundary) = self.boundary {
            settings.boundary = boundary;
        }
        if let Some(tiles) = self.tiles {
            settings.board_pixels = tiles.saturating_mul(settings.cell_pixels);
        }
        if self.mute {
            settings.music.muted = true;
        }
        settings.validate()?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides() {
        let args = Args::parse_from(["snake-jukebox", "--boundary", "walled", "--tiles", "12", "--mute"]);
        let settings = args.settings().unwrap();
        assert_eq!(BoundaryPolicy::Walled, settings.boundary);
        assert_eq!(12, settings.tile_count());
        assert!(settings.music.muted);
    }

    #[test]
    fn test_overrides_are_validated() {
        // The default start cell (10, 10) does not fit on a 5x5 board.
        let args = Args::parse_from(["snake-jukebox", "--tiles", "5"]);
        assert!(args.settings().is_err());

        let args = Args::parse_from(["snake-jukebox", "--tiles", "30000"]);
        assert!(args.settings().is_err());
    }
}
