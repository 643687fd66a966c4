//! Normalized control values produced by the input layer.

use bevy::prelude::Event;

use super::Direction;

/// One control request, independent of whether it came from a key, a
/// swipe or a button.
#[derive(Event, Copy, Clone, PartialEq, Eq, Debug)]
pub enum Command {
    Turn(Direction),
    TogglePause,
    ToggleMute,
}

/// Maps a drag of `(dx, dy)` screen pixels (y down) to a direction once the
/// dominant axis travels farther than `min_distance`.
pub fn classify_swipe(dx: f32, dy: f32, min_distance: f32) -> Option<Direction> {
    if dx.abs() <= min_distance && dy.abs() <= min_distance {
        return None;
    }
    let dir = if dx.abs() > dy.abs() {
        if dx > 0.0 { Direction::East } else { Direction::West }
    } else if dy > 0.0 {
        Direction::South
    } else {
        Direction::North
    };
    Some(dir)
}

/// Tracks one touch drag so that it yields at most one turn.
#[derive(Debug, Clone, Copy, Default)]
pub struct SwipeTracker {
    origin: Option<(f32, f32)>,
}

impl SwipeTracker {
    pub fn begin(&mut self, x: f32, y: f32) {
        self.origin = Some((x, y));
    }

    /// Returns a direction the first time the drag crosses the threshold.
    pub fn moved(&mut self, x: f32, y: f32, min_distance: f32) -> Option<Direction> {
        let (ox, oy) = self.origin?;
        let dir = classify_swipe(x - ox, y - oy, min_distance)?;
        self.origin = None;
        Some(dir)
    }

    pub fn end(&mut self) {
        self.origin = None;
    }
}
