//! Bevy host for the game and the soundtrack.

use bevy::prelude::*;

pub mod assets;
pub mod audio;
pub mod hud;
pub mod input;
pub mod session;
pub mod snake_visualizer;

pub(super) fn plugin(app: &mut App) {
    app.add_plugins((
        assets::plugin,
        input::plugin,
        session::plugin,
        audio::plugin,
        hud::plugin,
        snake_visualizer::plugin,
    ));
}
