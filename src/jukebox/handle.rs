use std::time::Duration;

use crate::error::AudioError;

/// Volume at or below which a fade-out counts as silent.
pub const SILENCE: f32 = 1e-3;

/// Something that can play one track at a time.
///
/// `load` and `play` may complete asynchronously on the host; failures found
/// later are reported through [`AudioHandle::has_failed`].
pub trait AudioHandle {
    fn load(&mut self, url: &str) -> Result<(), AudioError>;
    fn play(&mut self) -> Result<(), AudioError>;
    fn pause(&mut self);

    fn volume(&self) -> f32;
    fn set_volume(&mut self, volume: f32);
    fn muted(&self) -> bool;
    fn set_muted(&mut self, muted: bool);

    fn current_time(&self) -> Duration;
    fn set_current_time(&mut self, position: Duration);

    /// Playback reached the end of the track.
    fn has_ended(&self) -> bool;

    /// The last `load` turned out to be unplayable after it returned.
    fn has_failed(&self) -> bool {
        false
    }
}

/// Creates fresh handles for the scheduler.
pub trait AudioBackend {
    type Handle: AudioHandle;
    fn create_handle(&mut self) -> Self::Handle;
}

/// Lowers the volume by `step`. Once silent the handle is paused, rewound and
/// set back to `base_volume` so it can be reused; returns `true` then.
pub fn fade_out_step<H: AudioHandle>(handle: &mut H, step: f32, base_volume: f32) -> bool {
    let volume = (handle.volume() - step).max(0.0);
    if volume > SILENCE {
        handle.set_volume(volume);
        return false;
    }
    handle.pause();
    handle.set_current_time(Duration::ZERO);
    handle.set_volume(base_volume);
    true
}

/// Raises the volume by `step` up to `target`; returns `true` once reached.
pub fn fade_in_step<H: AudioHandle>(handle: &mut H, step: f32, target: f32) -> bool {
    let volume = (handle.volume() + step).min(target);
    handle.set_volume(volume);
    volume >= target
}
