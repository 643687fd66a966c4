//! Development tools for the game. This plugin is only enabled in dev builds.

use bevy::{dev_tools::fps_overlay::FpsOverlayPlugin, prelude::*};

pub(super) fn plugin(app: &mut App) {
    app.add_plugins(FpsOverlayPlugin::default());
}
