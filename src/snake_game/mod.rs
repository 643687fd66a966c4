//! Grid-movement engine: the snake, its food, and the tick state machine.
//!
//! Nothing in here knows about windows, sprites or sound. The owner feeds it
//! elapsed time and normalized commands, and reads back [`RenderState`].

use std::{collections::VecDeque, ops, ops::RangeInclusive, time::Duration};

use rand::{rngs::StdRng, seq::IteratorRandom, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::periodic::PeriodicTask;

pub mod command;

#[derive(Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Debug, Default)]
pub struct GridPoint {
    pub x: i16,
    pub y: i16,
}

impl GridPoint {
    pub const fn new(x: i16, y: i16) -> Self {
        Self { x, y }
    }

    pub(crate) fn is_zero(&self) -> bool {
        self.x == 0 && self.y == 0
    }
}

impl ops::Add<Self> for GridPoint {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        GridPoint { x: self.x + rhs.x, y: self.y + rhs.y }
    }
}

impl ops::Sub<Self> for GridPoint {
    type Output = GridPoint;
    fn sub(self, rhs: GridPoint) -> Self::Output {
        GridPoint { x: self.x - rhs.x, y: self.y - rhs.y }
    }
}

/// Screen-style directions: `y` grows downward, so North is `(0, -1)`.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Debug)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Direction::North, Direction::East, Direction::South, Direction::West];

    pub fn to_point(self) -> GridPoint {
        match self {
            Direction::North => GridPoint { x: 0, y: -1 },
            Direction::East  => GridPoint { x: 1, y: 0 },
            Direction::South => GridPoint { x: 0, y: 1 },
            Direction::West  => GridPoint { x: -1, y: 0 },
        }
    }

    /// Inverse of [`Direction::to_point`]; `None` for the zero vector and diagonals.
    pub fn from_point(pt: GridPoint) -> Option<Direction> {
        Self::ALL.into_iter().find(|dir| dir.to_point() == pt)
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::East  => Direction::West,
            Direction::South => Direction::North,
            Direction::West  => Direction::East,
        }
    }

    pub fn is_opposite(self, other: Direction) -> bool {
        self.opposite() == other
    }
}

/// What happens when the head leaves the grid.
#[derive(Copy, Clone, PartialEq, Eq, Serialize, Deserialize, Debug, Default, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryPolicy {
    /// Re-enter from the opposite edge.
    #[default]
    Toroidal,
    /// Leaving the grid ends the session.
    Walled,
    /// The head is pinned to the edge and the snake stalls.
    Clamped,
}

impl BoundaryPolicy {
    /// Maps a candidate head onto the grid. `None` means the head hit a wall.
    pub fn apply(self, pt: GridPoint, tile_count: i16) -> Option<GridPoint> {
        match self {
            BoundaryPolicy::Toroidal => Some(GridPoint {
                x: pt.x.rem_euclid(tile_count),
                y: pt.y.rem_euclid(tile_count),
            }),
            BoundaryPolicy::Walled => {
                let inside = (0..tile_count).contains(&pt.x) && (0..tile_count).contains(&pt.y);
                inside.then_some(pt)
            }
            BoundaryPolicy::Clamped => Some(GridPoint {
                x: pt.x.clamp(0, tile_count - 1),
                y: pt.y.clamp(0, tile_count - 1),
            }),
        }
    }
}

/// Square grid, `tile_count` cells per side.
#[derive(Copy, Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub struct Grid {
    pub tile_count: i16,
}

impl Grid {
    pub fn new(tile_count: i16) -> Self {
        Self { tile_count: tile_count.max(1) }
    }

    pub fn contains(&self, pt: GridPoint) -> bool {
        (0..self.tile_count).contains(&pt.x) && (0..self.tile_count).contains(&pt.y)
    }

    pub fn cell_count(&self) -> usize {
        self.tile_count as usize * self.tile_count as usize
    }

    pub fn cells(&self) -> impl Iterator<Item = GridPoint> + '_ {
        (0..self.tile_count).flat_map(move |y| (0..self.tile_count).map(move |x| GridPoint { x, y }))
    }

    pub fn rand_point(&self, rng: &mut impl Rng) -> GridPoint {
        GridPoint {
            x: rng.gen_range(0..self.tile_count),
            y: rng.gen_range(0..self.tile_count),
        }
    }
}

/// Body segments, head first.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Snake {
    locations: VecDeque<GridPoint>,
}

impl Snake {
    pub fn new(start: GridPoint) -> Snake {
        Snake { locations: VecDeque::from([start]) }
    }

    /// Builds a snake from explicit segments. Empty input yields a snake at the origin.
    pub fn from_segments(segments: impl IntoIterator<Item = GridPoint>) -> Snake {
        let mut locations: VecDeque<GridPoint> = segments.into_iter().collect();
        if locations.is_empty() {
            locations.push_back(GridPoint::default());
        }
        Snake { locations }
    }

    pub fn head(&self) -> GridPoint {
        self.locations[0]
    }

    pub fn length(&self) -> usize {
        self.locations.len()
    }

    pub fn contains(&self, pt: GridPoint) -> bool {
        self.locations.contains(&pt)
    }

    pub fn segments(&self) -> impl Iterator<Item = GridPoint> + '_ {
        self.locations.iter().copied()
    }
}

/// Ticks per second are kept within this range.
pub const SPEED_LIMITS: RangeInclusive<f32> = 0.1..=1000.0;

/// Largest board side that still renders one entity per cell.
pub const MAX_TILE_COUNT: i16 = 256;

/// Tuning for one session. Defaults are the classic 20x20 board.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct Rules {
    pub tile_count: i16,
    pub start: GridPoint,
    pub boundary: BoundaryPolicy,
    pub base_speed: f32,
    pub speed_increment: f32,
    pub max_speed: f32,
    pub food_award: u32,
    pub min_turn_interval: Duration,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            tile_count: 20,
            start: GridPoint::new(10, 10),
            boundary: BoundaryPolicy::Toroidal,
            base_speed: 7.0,
            speed_increment: 0.5,
            max_speed: 15.0,
            food_award: 10,
            min_turn_interval: Duration::from_millis(50),
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub enum Phase {
    Idle,
    Running,
    Paused,
    GameOver,
}

#[derive(Copy, Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub enum CollisionKind {
    Body,
    Wall,
}

#[derive(Copy, Clone, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub enum GameOverCause {
    Collision(CollisionKind),
    /// The snake covers every cell, so there is nowhere left for food.
    BoardFilled,
}

/// Result of one tick.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum TickOutcome {
    NotRunning,
    /// Clamped against an edge; nothing moved.
    Stalled,
    Moved,
    Ate { score: u32 },
    GameOver { score: u32, cause: GameOverCause },
}

/// Result of a direction request.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Turn {
    Ignored,
    Applied,
    /// Applied, and it was the input that started the session.
    Started,
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, Copy)]
pub struct RenderState<'a> {
    pub snake: &'a Snake,
    pub food: GridPoint,
    pub score: u32,
    pub not_started: bool,
    pub tile_count: i16,
}

pub struct SnakeGame {
    rules: Rules,
    grid: Grid,
    snake: Snake,
    food: GridPoint,
    heading: Option<Direction>,
    score: u32,
    speed: f32,
    phase: Phase,
    last_turn_at: Option<Duration>,
    clock: PeriodicTask,
    rng: StdRng,
}

impl SnakeGame {
    /// Rejection sampling gives up after this many draws per cell and scans instead.
    const SAMPLE_ATTEMPTS_PER_CELL: usize = 4;

    pub fn new(rules: Rules) -> Self {
        Self::with_rng(rules, StdRng::from_entropy())
    }

    pub fn with_seed(rules: Rules, seed: u64) -> Self {
        Self::with_rng(rules, StdRng::seed_from_u64(seed))
    }

    fn with_rng(rules: Rules, rng: StdRng) -> Self {
        let grid = Grid::new(rules.tile_count);
        let mut game = Self {
            rules,
            grid,
            snake: Snake::new(rules.start),
            food: GridPoint::default(),
            heading: None,
            score: 0,
            speed: rules.base_speed,
            phase: Phase::Idle,
            last_turn_at: None,
            clock: PeriodicTask::default(),
            rng,
        };
        game.reset();
        game
    }

    /// Starts mid-session from explicit parts. A `Some` heading puts the game in `Running`.
    pub fn from_parts(
        rules: Rules,
        segments: impl IntoIterator<Item = GridPoint>,
        heading: Option<Direction>,
        food: GridPoint,
        seed: u64,
    ) -> Self {
        let mut game = Self::with_seed(rules, seed);
        game.snake = Snake::from_segments(segments);
        game.heading = heading;
        game.food = food;
        if heading.is_some() {
            game.phase = Phase::Running;
            game.clock.schedule(game.tick_period());
        }
        game
    }

    /// Back to a fresh `Idle` session: single segment at the start cell,
    /// new food, zero score, base speed.
    pub fn reset(&mut self) {
        self.snake = Snake::new(self.rules.start);
        self.heading = None;
        self.score = 0;
        self.speed = self.rules.base_speed;
        self.last_turn_at = None;
        self.clock.cancel();
        self.food = self.sample_food().unwrap_or(self.rules.start);
        self.phase = Phase::Idle;
    }

    /// Applies a direction change requested at wall-clock time `now`.
    ///
    /// Exact reversals of a multi-segment snake and requests arriving within
    /// `min_turn_interval` of the last accepted one are dropped.
    pub fn request_direction(&mut self, direction: Direction, now: Duration) -> Turn {
        if matches!(self.phase, Phase::Paused | Phase::GameOver) {
            return Turn::Ignored;
        }
        if let Some(last) = self.last_turn_at {
            if now.saturating_sub(last) < self.rules.min_turn_interval {
                return Turn::Ignored;
            }
        }
        if let Some(current) = self.heading {
            if self.snake.length() > 1 && current.is_opposite(direction) {
                return Turn::Ignored;
            }
        }

        self.heading = Some(direction);
        self.last_turn_at = Some(now);
        if self.phase == Phase::Idle {
            self.phase = Phase::Running;
            self.clock.schedule(self.tick_period());
            log::info!("session started heading {direction:?}");
            return Turn::Started;
        }
        Turn::Applied
    }

    pub fn pause(&mut self) -> bool {
        if self.phase != Phase::Running { return false; }
        self.phase = Phase::Paused;
        self.clock.cancel();
        true
    }

    pub fn resume(&mut self) -> bool {
        if self.phase != Phase::Paused { return false; }
        self.phase = Phase::Running;
        self.clock.schedule(self.tick_period());
        true
    }

    /// Pauses a running game or resumes a paused one; returns the new phase if it changed.
    pub fn toggle_pause(&mut self) -> Option<Phase> {
        match self.phase {
            Phase::Running => self.pause().then_some(Phase::Paused),
            Phase::Paused => self.resume().then_some(Phase::Running),
            _ => None,
        }
    }

    /// Feeds elapsed time to the tick clock and runs every tick that came due.
    pub fn advance(&mut self, delta: Duration) -> Vec<TickOutcome> {
        let due = self.clock.tick(delta);
        let mut outcomes = Vec::with_capacity(due as usize);
        for _ in 0..due {
            if self.phase != Phase::Running { break; }
            outcomes.push(self.tick());
        }
        outcomes
    }

    /// One discrete step. Collision is checked before the body moves, the
    /// body moves before food is checked, and food is checked before score
    /// and speed change.
    pub fn tick(&mut self) -> TickOutcome {
        if self.phase != Phase::Running { return TickOutcome::NotRunning; }
        let Some(direction) = self.heading else { return TickOutcome::NotRunning; };

        let head = self.snake.head();
        let Some(new_head) = self.rules.boundary.apply(head + direction.to_point(), self.grid.tile_count) else {
            return self.game_over(GameOverCause::Collision(CollisionKind::Wall));
        };
        if (new_head - head).is_zero() {
            return TickOutcome::Stalled;
        }
        if self.snake.contains(new_head) {
            return self.game_over(GameOverCause::Collision(CollisionKind::Body));
        }

        self.snake.locations.push_front(new_head);

        if new_head != self.food {
            self.snake.locations.pop_back();
            return TickOutcome::Moved;
        }

        self.score += self.rules.food_award;
        let Some(food) = self.sample_food() else {
            return self.game_over(GameOverCause::BoardFilled);
        };
        self.food = food;
        let speed = (self.speed + self.rules.speed_increment).min(self.rules.max_speed);
        if speed != self.speed {
            self.speed = speed;
            self.clock.schedule(self.tick_period());
        }
        TickOutcome::Ate { score: self.score }
    }

    fn game_over(&mut self, cause: GameOverCause) -> TickOutcome {
        self.phase = Phase::GameOver;
        self.clock.cancel();
        log::info!("game over ({cause:?}) with score {}", self.score);
        TickOutcome::GameOver { score: self.score, cause }
    }

    /// Picks a uniformly random free cell, or `None` when the snake fills the grid.
    fn sample_food(&mut self) -> Option<GridPoint> {
        if self.snake.length() >= self.grid.cell_count() {
            return None;
        }
        for _ in 0..self.grid.cell_count() * Self::SAMPLE_ATTEMPTS_PER_CELL {
            let pt = self.grid.rand_point(&mut self.rng);
            if !self.snake.contains(pt) {
                return Some(pt);
            }
        }
        let snake = &self.snake;
        self.grid.cells().filter(|pt| !snake.contains(*pt)).choose(&mut self.rng)
    }

    /// Milliseconds between ticks is `1000 / speed`, with the speed held
    /// inside [`SPEED_LIMITS`].
    pub fn tick_period(&self) -> Duration {
        let speed = if self.speed.is_nan() {
            *SPEED_LIMITS.start()
        } else {
            self.speed.clamp(*SPEED_LIMITS.start(), *SPEED_LIMITS.end())
        };
        Duration::from_secs_f32(1.0 / speed)
    }

    pub fn render_state(&self) -> RenderState<'_> {
        RenderState {
            snake: &self.snake,
            food: self.food,
            score: self.score,
            not_started: self.phase == Phase::Idle,
            tile_count: self.grid.tile_count,
        }
    }

    pub fn phase(&self) -> Phase { self.phase }
    pub fn score(&self) -> u32 { self.score }
    pub fn speed(&self) -> f32 { self.speed }
    pub fn snake(&self) -> &Snake { &self.snake }
    pub fn food(&self) -> GridPoint { self.food }
    pub fn heading(&self) -> Option<Direction> { self.heading }
    pub fn grid(&self) -> Grid { self.grid }
    pub fn rules(&self) -> &Rules { &self.rules }

    /// `(dx, dy)`, or `(0, 0)` before the first turn.
    pub fn direction_vector(&self) -> (i16, i16) {
        self.heading.map_or((0, 0), |dir| {
            let pt = dir.to_point();
            (pt.x, pt.y)
        })
    }
}
