use bevy::{audio::PlaybackMode, prelude::*};

use crate::game::assets::{HandleMap, SfxKey};
use crate::game::audio::soundtrack::Soundtrack;
use crate::game::session::SessionEvent;
use crate::AppSet;

pub(super) fn plugin(app: &mut App) {
    app.observe(play_sfx);
    app.add_systems(Update, sfx_for_session_events.in_set(AppSet::Update));
}

fn sfx_for_session_events(mut commands: Commands, mut events: EventReader<SessionEvent>) {
    for event in events.read() {
        match event {
            SessionEvent::Ate { .. } => commands.trigger(PlaySfx::Key(SfxKey::Eating)),
            SessionEvent::GameOver { .. } => commands.trigger(PlaySfx::Key(SfxKey::Crash)),
            _ => {}
        }
    }
}

fn play_sfx(
    trigger: Trigger<PlaySfx>,
    mut commands: Commands,
    sfx_handles: Res<HandleMap<SfxKey>>,
    soundtrack: Res<Soundtrack>,
) {
    // Mute silences the whole game, not just the music.
    if soundtrack.muted() {
        return;
    }
    let PlaySfx::Key(sfx_key) = trigger.event();
    commands.spawn(AudioSourceBundle {
        source: sfx_handles[sfx_key].clone_weak(),
        settings: PlaybackSettings {
            mode: PlaybackMode::Despawn,
            ..default()
        },
    });
}

/// Trigger this event to play a single sound effect.
#[derive(Event)]
pub enum PlaySfx {
    Key(SfxKey),
}
