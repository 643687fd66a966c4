//! Bevy audio backend for the [`Jukebox`].
//!
//! Handles only record what the scheduler asked for. Once per frame
//! [`sync_sinks`] mirrors that onto `AudioSink` entities, spawning one when a
//! handle starts playing and despawning it when the handle is rewound or
//! reloaded.

use std::time::Duration;

use bevy::{
    asset::LoadState,
    audio::{AudioSinkPlayback, PlaybackMode, Volume},
    prelude::*,
};

use crate::error::AudioError;
use crate::game::input::UserGesture;
use crate::game::session::SessionEvent;
use crate::jukebox::{AudioBackend, AudioHandle, Jukebox};
use crate::settings::Settings;
use crate::snake_game::command::Command;
use crate::AppSet;

pub(super) fn plugin(app: &mut App) {
    app.init_resource::<Soundtrack>();
    app.add_systems(
        Update,
        (start_on_gesture, follow_session, toggle_mute).in_set(AppSet::RecordInput),
    );
    app.add_systems(
        Update,
        (drive_soundtrack, sync_sinks).chain().in_set(AppSet::TickTimers),
    );
}

#[derive(Resource, Deref, DerefMut)]
pub struct Soundtrack(pub Jukebox<SinkBackend>);

impl FromWorld for Soundtrack {
    fn from_world(world: &mut World) -> Self {
        let asset_server = world.resource::<AssetServer>().clone();
        let settings = world.resource::<Settings>();
        let mut jukebox = Jukebox::new(
            SinkBackend { asset_server },
            settings.playlist(),
            settings.jukebox_config(),
        );
        if let Err(err) = jukebox.prepare() {
            log::error!("soundtrack disabled: {err}");
        }
        Soundtrack(jukebox)
    }
}

pub struct SinkBackend {
    asset_server: AssetServer,
}

impl AudioBackend for SinkBackend {
    type Handle = SinkHandle;

    fn create_handle(&mut self) -> SinkHandle {
        SinkHandle {
            asset_server: self.asset_server.clone(),
            source: None,
            url: None,
            entity: None,
            respawn: false,
            playing: false,
            ended: false,
            volume: 1.0,
            muted: false,
            position: Duration::ZERO,
        }
    }
}

pub struct SinkHandle {
    asset_server: AssetServer,
    source: Option<Handle<AudioSource>>,
    url: Option<String>,
    entity: Option<Entity>,
    /// Drop the current sink so playback restarts from the top.
    respawn: bool,
    playing: bool,
    ended: bool,
    volume: f32,
    muted: bool,
    position: Duration,
}

impl SinkHandle {
    fn load_failed(&self) -> bool {
        self.source.as_ref().is_some_and(|source| {
            matches!(self.asset_server.get_load_state(source.id()), Some(LoadState::Failed { .. }))
        })
    }

    fn sync(&mut self, commands: &mut Commands, sinks: &Query<&AudioSink>, delta: Duration) {
        if self.respawn {
            if let Some(entity) = self.entity.take() {
                commands.entity(entity).despawn();
            }
            self.respawn = false;
        }

        let gain = if self.muted { 0.0 } else { self.volume };
        let Some(entity) = self.entity else {
            if let (true, Some(source)) = (self.playing, &self.source) {
                let entity = commands
                    .spawn((
                        Name::new("Soundtrack"),
                        AudioBundle {
                            source: source.clone(),
                            settings: PlaybackSettings {
                                mode: PlaybackMode::Once,
                                volume: Volume::new(gain),
                                ..default()
                            },
                        },
                    ))
                    .id();
                self.entity = Some(entity);
            }
            return;
        };

        // The sink only appears once the asset finished loading.
        let Ok(sink) = sinks.get(entity) else { return };
        sink.set_volume(gain);
        match (self.playing, sink.is_paused()) {
            (true, true) => sink.play(),
            (false, false) => sink.pause(),
            _ => {}
        }
        if self.playing {
            if sink.empty() {
                self.playing = false;
                self.ended = true;
            } else {
                self.position += delta;
            }
        }
    }
}

impl AudioHandle for SinkHandle {
    fn load(&mut self, url: &str) -> Result<(), AudioError> {
        let source: Handle<AudioSource> = self.asset_server.load(url.to_owned());
        if let Some(LoadState::Failed { .. }) = self.asset_server.get_load_state(source.id()) {
            return Err(AudioError::LoadFailed {
                url: url.to_owned(),
                reason: "asset server could not load it".into(),
            });
        }
        self.source = Some(source);
        self.url = Some(url.to_owned());
        self.respawn = self.entity.is_some();
        self.playing = false;
        self.ended = false;
        self.position = Duration::ZERO;
        Ok(())
    }

    fn play(&mut self) -> Result<(), AudioError> {
        if self.source.is_none() {
            return Err(AudioError::NotLoaded);
        }
        if self.load_failed() {
            return Err(AudioError::LoadFailed {
                url: self.url.clone().unwrap_or_default(),
                reason: "asset server could not load it".into(),
            });
        }
        if self.ended {
            self.respawn = self.entity.is_some();
            self.ended = false;
            self.position = Duration::ZERO;
        }
        self.playing = true;
        Ok(())
    }

    fn pause(&mut self) {
        self.playing = false;
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    fn muted(&self) -> bool {
        self.muted
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn current_time(&self) -> Duration {
        self.position
    }

    fn set_current_time(&mut self, position: Duration) {
        if !position.is_zero() {
            log::debug!("audio sinks cannot seek, ignoring seek to {position:?}");
            return;
        }
        self.respawn = self.entity.is_some();
        self.ended = false;
        self.position = Duration::ZERO;
    }

    fn has_ended(&self) -> bool {
        self.ended
    }

    fn has_failed(&self) -> bool {
        self.load_failed()
    }
}

fn start_on_gesture(mut gestures: EventReader<UserGesture>, mut soundtrack: ResMut<Soundtrack>) {
    if gestures.is_empty() {
        return;
    }
    gestures.clear();
    soundtrack.on_user_gesture();
}

/// Game over and pause silence the music; starting or resuming brings it back.
fn follow_session(mut events: EventReader<SessionEvent>, mut soundtrack: ResMut<Soundtrack>) {
    for event in events.read() {
        match event {
            SessionEvent::Paused | SessionEvent::GameOver { .. } => {
                soundtrack.pause();
            }
            SessionEvent::Started | SessionEvent::Resumed => {
                soundtrack.resume();
            }
            SessionEvent::Ate { .. } => {}
        }
    }
}

fn toggle_mute(mut commands: EventReader<Command>, mut soundtrack: ResMut<Soundtrack>) {
    for command in commands.read() {
        if *command == Command::ToggleMute {
            let muted = soundtrack.toggle_mute();
            log::info!("soundtrack {}", if muted { "muted" } else { "unmuted" });
        }
    }
}

fn drive_soundtrack(time: Res<Time<Real>>, mut soundtrack: ResMut<Soundtrack>) {
    soundtrack.update(time.delta());
}

fn sync_sinks(
    mut commands: Commands,
    time: Res<Time<Real>>,
    mut soundtrack: ResMut<Soundtrack>,
    sinks: Query<&AudioSink>,
) {
    let delta = time.delta();
    for handle in soundtrack.handles_mut() {
        handle.sync(&mut commands, &sinks, delta);
    }
}
