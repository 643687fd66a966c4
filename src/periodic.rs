//! Cancellable repeating task driven by elapsed time.

use std::time::Duration;

use bevy::time::{Timer, TimerMode};

/// A repeating timer that may or may not be armed.
///
/// Scheduling always replaces the previous timer, so a task can never be
/// armed twice.
#[derive(Debug, Clone, Default)]
pub struct PeriodicTask {
    timer: Option<Timer>,
}

impl PeriodicTask {
    pub fn schedule(&mut self, period: Duration) {
        self.cancel();
        self.timer = Some(Timer::new(period, TimerMode::Repeating));
    }

    pub fn cancel(&mut self) {
        self.timer = None;
    }

    pub fn is_scheduled(&self) -> bool {
        self.timer.is_some()
    }

    pub fn period(&self) -> Option<Duration> {
        self.timer.as_ref().map(Timer::duration)
    }

    /// Advances the task and returns how many periods elapsed.
    pub fn tick(&mut self, delta: Duration) -> u32 {
        match &mut self.timer {
            Some(timer) => timer.tick(delta).times_finished_this_tick(),
            None => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::PeriodicTask;
    use std::time::Duration;

    #[test]
    fn test_unscheduled_never_fires() {
        let mut task = PeriodicTask::default();
        assert_eq!(0, task.tick(Duration::from_secs(10)));
        assert!(!task.is_scheduled());
    }

    #[test]
    fn test_fires_once_per_period() {
        let mut task = PeriodicTask::default();
        task.schedule(Duration::from_millis(100));
        assert_eq!(0, task.tick(Duration::from_millis(60)));
        assert_eq!(1, task.tick(Duration::from_millis(60)));
        assert_eq!(2, task.tick(Duration::from_millis(200)));
    }

    #[test]
    fn test_reschedule_discards_progress() {
        let mut task = PeriodicTask::default();
        task.schedule(Duration::from_millis(100));
        task.tick(Duration::from_millis(90));
        task.schedule(Duration::from_millis(100));
        assert_eq!(0, task.tick(Duration::from_millis(20)));
        assert_eq!(Some(Duration::from_millis(100)), task.period());
    }

    #[test]
    fn test_cancel() {
        let mut task = PeriodicTask::default();
        task.schedule(Duration::from_millis(10));
        task.cancel();
        assert_eq!(0, task.tick(Duration::from_millis(50)));
    }
}
