//! Sound effects and the background soundtrack.

use bevy::prelude::*;

pub mod sfx;
pub mod soundtrack;

pub(super) fn plugin(app: &mut App) {
    app.add_plugins((sfx::plugin, soundtrack::plugin));
}
