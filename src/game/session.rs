//! The running game: applies commands to the engine and ticks it.

use bevy::prelude::*;

use crate::settings::Settings;
use crate::snake_game::command::Command;
use crate::snake_game::{GameOverCause, Phase, SnakeGame, TickOutcome, Turn};
use crate::AppSet;

pub(super) fn plugin(app: &mut App) {
    app.init_resource::<Session>();
    app.add_event::<SessionEvent>();
    app.add_systems(
        Update,
        (apply_commands, advance_session).chain().in_set(AppSet::Update),
    );
}

#[derive(Resource, Deref, DerefMut)]
pub struct Session(pub SnakeGame);

impl FromWorld for Session {
    fn from_world(world: &mut World) -> Self {
        let rules = world.resource::<Settings>().rules();
        Session(SnakeGame::new(rules))
    }
}

/// Notable changes in the session, for sound, music and the HUD.
#[derive(Event, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    Started,
    Ate { score: u32 },
    Paused,
    Resumed,
    GameOver { score: u32, cause: GameOverCause },
}

fn apply_commands(
    time: Res<Time<Real>>,
    mut commands: EventReader<Command>,
    mut session: ResMut<Session>,
    mut events: EventWriter<SessionEvent>,
) {
    // Turn throttling is measured in wall-clock time.
    let now = time.elapsed();
    for command in commands.read() {
        match *command {
            Command::Turn(direction) => {
                if session.request_direction(direction, now) == Turn::Started {
                    events.send(SessionEvent::Started);
                }
            }
            Command::TogglePause => match session.toggle_pause() {
                Some(Phase::Paused) => {
                    events.send(SessionEvent::Paused);
                }
                Some(Phase::Running) => {
                    events.send(SessionEvent::Resumed);
                }
                _ => {}
            },
            Command::ToggleMute => {}
        }
    }
}

fn advance_session(
    time: Res<Time>,
    mut session: ResMut<Session>,
    mut events: EventWriter<SessionEvent>,
) {
    for outcome in session.advance(time.delta()) {
        match outcome {
            TickOutcome::Ate { score } => {
                events.send(SessionEvent::Ate { score });
            }
            TickOutcome::GameOver { score, cause } => {
                events.send(SessionEvent::GameOver { score, cause });
                session.reset();
            }
            TickOutcome::Moved | TickOutcome::Stalled | TickOutcome::NotRunning => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::snake_game::{BoundaryPolicy, CollisionKind, Direction, GridPoint, Rules};

    fn session_app(game: SnakeGame) -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_event::<Command>();
        app.add_event::<SessionEvent>();
        app.insert_resource(Session(game));
        app
    }

    fn sent(world: &World) -> Vec<SessionEvent> {
        world.resource::<Events<SessionEvent>>().iter_current_update_events().copied().collect()
    }

    #[test]
    fn test_commands_start_and_pause() {
        let mut app = session_app(SnakeGame::with_seed(Rules::default(), 3));
        let world = app.world_mut();
        let apply = world.register_system(apply_commands);

        world.send_event(Command::Turn(Direction::East));
        world.run_system(apply).unwrap();
        assert_eq!(vec![SessionEvent::Started], sent(world));
        assert_eq!(Phase::Running, world.resource::<Session>().phase());

        world.send_event(Command::TogglePause);
        world.run_system(apply).unwrap();
        assert_eq!(Phase::Paused, world.resource::<Session>().phase());
        assert_eq!(Some(&SessionEvent::Paused), sent(world).last());
    }

    #[test]
    fn test_game_over_resets_session() {
        let rules = Rules { boundary: BoundaryPolicy::Walled, ..Rules::default() };
        let game = SnakeGame::from_parts(rules, [GridPoint::new(19, 5)], Some(Direction::East), GridPoint::new(0, 0), 1);
        let mut app = session_app(game);
        let world = app.world_mut();
        let advance = world.register_system(advance_session);

        world.resource_mut::<Time>().advance_by(Duration::from_millis(200));
        world.run_system(advance).unwrap();

        let cause = GameOverCause::Collision(CollisionKind::Wall);
        assert_eq!(vec![SessionEvent::GameOver { score: 0, cause }], sent(world));
        let session = world.resource::<Session>();
        assert_eq!(Phase::Idle, session.phase());
        assert_eq!(rules.start, session.snake().head());
    }
}
