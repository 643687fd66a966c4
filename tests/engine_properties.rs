//! Property-based invariant tests for the grid-movement engine.
//!
//! Over random boards, seeds, boundary policies and input sequences:
//!
//! 1. A tick that eats nothing leaves length and score unchanged.
//! 2. Eating grows the snake by one and adds the food award.
//! 3. The head never leaves the grid.
//! 4. Food never lies on the snake while a session is live.
//! 5. An exact reversal of a multi-segment snake is rejected.

use std::time::Duration;

use proptest::prelude::*;
use snake_jukebox::snake_game::{
    BoundaryPolicy, Direction, GridPoint, Phase, Rules, SnakeGame, TickOutcome, Turn,
};

// ── Helpers ─────────────────────────────────────────────────────────────

fn boundary_strategy() -> impl Strategy<Value = BoundaryPolicy> {
    prop_oneof![
        Just(BoundaryPolicy::Toroidal),
        Just(BoundaryPolicy::Walled),
        Just(BoundaryPolicy::Clamped),
    ]
}

fn direction_strategy() -> impl Strategy<Value = Direction> {
    (0usize..4).prop_map(|i| Direction::ALL[i])
}

/// Each step turns (maybe) and then runs a few ticks.
fn steps_strategy() -> impl Strategy<Value = Vec<(Direction, u8)>> {
    prop::collection::vec((direction_strategy(), 1u8..6), 1..60)
}

fn rules(tile_count: i16, boundary: BoundaryPolicy) -> Rules {
    Rules {
        tile_count,
        start: GridPoint::new(tile_count / 2, tile_count / 2),
        boundary,
        ..Rules::default()
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 1-4. Tick invariants
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn tick_invariants_hold(
        tile_count in 3i16..12,
        seed in any::<u64>(),
        boundary in boundary_strategy(),
        steps in steps_strategy(),
    ) {
        let rules = rules(tile_count, boundary);
        let mut game = SnakeGame::with_seed(rules, seed);
        let mut now = Duration::ZERO;

        for (direction, ticks) in steps {
            now += Duration::from_millis(100);
            game.request_direction(direction, now);

            for _ in 0..ticks {
                let length = game.snake().length();
                let score = game.score();
                let outcome = game.tick();
                match outcome {
                    TickOutcome::Ate { score: new_score } => {
                        prop_assert_eq!(length + 1, game.snake().length());
                        prop_assert_eq!(score + rules.food_award, new_score);
                        prop_assert_eq!(new_score, game.score());
                    }
                    TickOutcome::Moved | TickOutcome::Stalled | TickOutcome::NotRunning => {
                        prop_assert_eq!(length, game.snake().length(), "{:?}", outcome);
                        prop_assert_eq!(score, game.score());
                    }
                    TickOutcome::GameOver { .. } => {
                        prop_assert_eq!(Phase::GameOver, game.phase());
                    }
                }

                let grid = game.grid();
                prop_assert!(
                    game.snake().segments().all(|pt| grid.contains(pt)),
                    "segment outside a {}x{} grid: {:?}",
                    tile_count, tile_count, game.snake()
                );

                if game.phase() == Phase::GameOver {
                    game.reset();
                    prop_assert_eq!(1, game.snake().length());
                    prop_assert_eq!(0, game.score());
                    prop_assert_eq!(rules.base_speed, game.speed());
                }
                prop_assert!(!game.snake().contains(game.food()), "food {:?} on {:?}", game.food(), game.snake());
            }
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Reversal is rejected
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn reversal_is_rejected(direction in direction_strategy(), length in 2i16..6) {
        let start = GridPoint::new(10, 10);
        let back = direction.opposite().to_point();
        let segments: Vec<GridPoint> = (0..length)
            .map(|i| GridPoint::new(start.x + back.x * i, start.y + back.y * i))
            .collect();
        let mut game = SnakeGame::from_parts(Rules::default(), segments, Some(direction), GridPoint::new(0, 0), 7);

        let turn = game.request_direction(direction.opposite(), Duration::from_secs(1));
        prop_assert_eq!(Turn::Ignored, turn);
        prop_assert_eq!(Some(direction), game.heading());

        prop_assert_eq!(TickOutcome::Moved, game.tick());
        prop_assert_eq!(start + direction.to_point(), game.snake().head());
    }
}
