pub mod cmdline;
#[cfg(feature = "dev")]
mod dev_tools;
pub mod error;
mod game;
pub mod jukebox;
pub mod periodic;
pub mod settings;
pub mod snake_game;

use bevy::{asset::AssetMetaCheck, prelude::*, window::WindowResolution};

use crate::game::hud::HUD_HEIGHT;
use crate::settings::Settings;

/// Empty space around the board.
const MARGIN: f32 = 20.0;

pub struct AppPlugin {
    pub settings: Settings,
}

impl Plugin for AppPlugin {
    fn build(&self, app: &mut App) {
        // Everything below reads the settings while building.
        app.insert_resource(self.settings.clone());

        // Order new `AppStep` variants by adding them here:
        app.configure_sets(
            Update,
            (AppSet::TickTimers, AppSet::RecordInput, AppSet::Update).chain(),
        );

        // Spawn the main camera.
        app.add_systems(Startup, spawn_camera);

        let board = self.settings.tile_count() as f32 * self.settings.cell_pixels as f32;

        // Add Bevy plugins.
        app.add_plugins(
            DefaultPlugins
                .set(AssetPlugin {
                    // Wasm builds will check for meta files (that don't exist) if this isn't set.
                    meta_check: AssetMetaCheck::Never,
                    ..default()
                })
                .set(WindowPlugin {
                    primary_window: Window {
                        title: "Snake Jukebox".to_string(),
                        canvas: Some("#bevy".to_string()),
                        fit_canvas_to_parent: true,
                        prevent_default_event_handling: true,
                        resolution: WindowResolution::new(
                            board + 2.0 * MARGIN,
                            board + 2.0 * MARGIN + HUD_HEIGHT,
                        )
                        .with_scale_factor_override(1.0),
                        ..default()
                    }
                    .into(),
                    ..default()
                }),
        );

        // Add other plugins.
        app.add_plugins(game::plugin);

        // Enable dev tools for dev builds.
        #[cfg(feature = "dev")]
        app.add_plugins(dev_tools::plugin);
    }
}

/// High-level groupings of systems for the app in the `Update` schedule.
/// When adding a new variant, make sure to order it in the `configure_sets`
/// call above.
#[derive(SystemSet, Debug, Clone, Copy, Eq, PartialEq, Hash)]
enum AppSet {
    /// Tick timers.
    TickTimers,
    /// Record player input.
    RecordInput,
    /// Advance the session.
    Update,
}

fn spawn_camera(mut commands: Commands) {
    commands.spawn((
        Name::new("Camera"),
        Camera2dBundle::default(),
        // Render all UI to this camera.
        IsDefaultUiCamera,
    ));
}
