//! Translate keyboard, touch and mouse input into [`Command`] events.

use bevy::{input::touch::Touches, prelude::*};

use crate::settings::Settings;
use crate::snake_game::command::{Command, SwipeTracker};
use crate::snake_game::Direction;
use crate::AppSet;

pub(super) fn plugin(app: &mut App) {
    app.add_event::<Command>();
    app.add_event::<UserGesture>();
    app.add_systems(
        Update,
        (record_keyboard, record_touch, record_mouse).in_set(AppSet::RecordInput),
    );
}

/// Any press, touch or click. Browsers and some platforms only allow audio to
/// start after one of these.
#[derive(Event, Debug, Clone, Copy)]
pub struct UserGesture;

fn direction_of_key(key: KeyCode) -> Option<Direction> {
    match key {
        KeyCode::KeyW | KeyCode::ArrowUp => Some(Direction::North),
        KeyCode::KeyS | KeyCode::ArrowDown => Some(Direction::South),
        KeyCode::KeyA | KeyCode::ArrowLeft => Some(Direction::West),
        KeyCode::KeyD | KeyCode::ArrowRight => Some(Direction::East),
        _ => None,
    }
}

fn command_of_key(key: KeyCode) -> Option<Command> {
    if let Some(direction) = direction_of_key(key) {
        return Some(Command::Turn(direction));
    }
    match key {
        KeyCode::Space | KeyCode::KeyP | KeyCode::Escape => Some(Command::TogglePause),
        KeyCode::KeyM => Some(Command::ToggleMute),
        _ => None,
    }
}

fn record_keyboard(
    input: Res<ButtonInput<KeyCode>>,
    mut commands: EventWriter<Command>,
    mut gestures: EventWriter<UserGesture>,
) {
    let mut pressed = false;
    for key in input.get_just_pressed() {
        pressed = true;
        if let Some(command) = command_of_key(*key) {
            commands.send(command);
        }
    }
    if pressed {
        gestures.send(UserGesture);
    }
}

fn record_touch(
    touches: Res<Touches>,
    settings: Res<Settings>,
    mut swipe: Local<SwipeTracker>,
    mut commands: EventWriter<Command>,
    mut gestures: EventWriter<UserGesture>,
) {
    if let Some(touch) = touches.iter_just_pressed().next() {
        let start = touch.start_position();
        swipe.begin(start.x, start.y);
        gestures.send(UserGesture);
    }
    // Only the first finger steers.
    if let Some(touch) = touches.iter().next() {
        let pos = touch.position();
        if let Some(direction) = swipe.moved(pos.x, pos.y, settings.min_swipe_distance) {
            commands.send(Command::Turn(direction));
        }
    }
    if touches.iter_just_released().next().is_some() || touches.iter_just_canceled().next().is_some() {
        swipe.end();
    }
}

fn record_mouse(input: Res<ButtonInput<MouseButton>>, mut gestures: EventWriter<UserGesture>) {
    if input.get_just_pressed().next().is_some() {
        gestures.send(UserGesture);
    }
}
