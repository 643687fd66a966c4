//! Score, status and now-playing lines above the board.

use bevy::prelude::*;

use crate::game::audio::soundtrack::Soundtrack;
use crate::game::session::{Session, SessionEvent};
use crate::jukebox::JukeboxState;
use crate::snake_game::{CollisionKind, GameOverCause, Phase};
use crate::AppSet;

pub const HUD_HEIGHT: f32 = 72.0;
const FONT_SIZE: f32 = 18.0;

pub(super) fn plugin(app: &mut App) {
    app.init_resource::<LastResult>();
    app.add_systems(Startup, spawn_hud);
    app.add_systems(
        Update,
        (remember_result, update_score, update_status, update_now_playing)
            .chain()
            .after(AppSet::Update),
    );
}

#[derive(Component)]
struct ScoreText;

#[derive(Component)]
struct StatusText;

#[derive(Component)]
struct NowPlayingText;

/// How the previous session ended, shown until the next one starts.
#[derive(Resource, Default)]
struct LastResult(Option<(u32, GameOverCause)>);

fn spawn_hud(mut commands: Commands) {
    let style = TextStyle { font_size: FONT_SIZE, color: Color::WHITE, ..default() };
    commands
        .spawn((
            Name::new("Hud"),
            NodeBundle {
                style: Style {
                    width: Val::Percent(100.0),
                    height: Val::Px(HUD_HEIGHT),
                    flex_direction: FlexDirection::Column,
                    align_items: AlignItems::Center,
                    justify_content: JustifyContent::SpaceEvenly,
                    ..default()
                },
                ..default()
            },
        ))
        .with_children(|hud| {
            hud.spawn((ScoreText, TextBundle::from_section(score_line(0), style.clone())));
            hud.spawn((StatusText, TextBundle::from_section("", style.clone())));
            hud.spawn((
                NowPlayingText,
                TextBundle::from_section("", TextStyle { color: Color::srgb(0.7, 0.7, 0.7), ..style }),
            ));
        });
}

fn score_line(score: u32) -> String {
    format!("Score: {score}")
}

fn status_line(phase: Phase, last: Option<(u32, GameOverCause)>) -> String {
    match (phase, last) {
        (Phase::Running, _) => String::new(),
        (Phase::Paused, _) => "Paused (space to resume)".to_owned(),
        (_, Some((score, cause))) => {
            let reason = match cause {
                GameOverCause::Collision(CollisionKind::Body) => "Bit your tail",
                GameOverCause::Collision(CollisionKind::Wall) => "Hit the wall",
                GameOverCause::BoardFilled => "Board filled",
            };
            format!("{reason}! Final score {score}. Arrow keys or swipe to play again")
        }
        (_, None) => "Arrow keys or swipe to start".to_owned(),
    }
}

fn now_playing_line(state: JukeboxState, title: Option<&str>, muted: bool) -> String {
    let mut line = match (state, title) {
        (JukeboxState::Uninitialized, _) => String::new(),
        (JukeboxState::AwaitingUserGesture, _) => "Press any key for music".to_owned(),
        (JukeboxState::Paused, Some(title)) => format!("Paused: {title}"),
        (_, Some(title)) => format!("Now playing: {title}"),
        (_, None) => String::new(),
    };
    if muted && !line.is_empty() {
        line.push_str(" (muted)");
    }
    line
}

fn remember_result(mut events: EventReader<SessionEvent>, mut last: ResMut<LastResult>) {
    for event in events.read() {
        match *event {
            SessionEvent::GameOver { score, cause } => last.0 = Some((score, cause)),
            SessionEvent::Started => last.0 = None,
            _ => {}
        }
    }
}

fn update_score(session: Res<Session>, mut query: Query<&mut Text, With<ScoreText>>) {
    if !session.is_changed() {
        return;
    }
    let line = score_line(session.score());
    for mut text in &mut query {
        if text.sections[0].value != line {
            text.sections[0].value.clone_from(&line);
        }
    }
}

fn update_status(
    session: Res<Session>,
    last: Res<LastResult>,
    mut query: Query<&mut Text, With<StatusText>>,
) {
    let line = status_line(session.phase(), last.0);
    for mut text in &mut query {
        if text.sections[0].value != line {
            text.sections[0].value.clone_from(&line);
        }
    }
}

fn update_now_playing(soundtrack: Res<Soundtrack>, mut query: Query<&mut Text, With<NowPlayingText>>) {
    let title = soundtrack.now_playing().map(|track| track.display_name());
    let line = now_playing_line(soundtrack.state(), title, soundtrack.muted());
    for mut text in &mut query {
        if text.sections[0].value != line {
            text.sections[0].value.clone_from(&line);
        }
    }
}
