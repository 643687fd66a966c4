//! Background soundtrack scheduler.
//!
//! Keeps a "current" and a "next" handle. A rotation fades the current one
//! out while the next one fades in, then preloads the entry after that so a
//! handle is always ready before it is needed. Playback waits for a user
//! gesture because hosts may refuse to start audio before one.

use std::time::Duration;

use crate::error::{AudioError, JukeboxError};
use crate::periodic::PeriodicTask;

mod handle;
mod playlist;

pub use handle::{fade_in_step, fade_out_step, AudioBackend, AudioHandle, SILENCE};
pub use playlist::{Playlist, Track};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RotationPolicy {
    /// Rotate when the current track finishes.
    OnTrackEnd,
    /// Rotate every period while playing, and also when a track finishes early.
    Interval(Duration),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct JukeboxConfig {
    pub base_volume: f32,
    pub fade_step: f32,
    pub fade_interval: Duration,
    pub rotation: RotationPolicy,
    pub muted: bool,
}

impl Default for JukeboxConfig {
    fn default() -> Self {
        Self {
            base_volume: 0.3,
            fade_step: 0.02,
            fade_interval: Duration::from_millis(50),
            rotation: RotationPolicy::OnTrackEnd,
            muted: false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JukeboxState {
    Uninitialized,
    AwaitingUserGesture,
    Playing,
    Paused,
}

struct Slot<H> {
    handle: H,
    index: usize,
}

pub struct Jukebox<B: AudioBackend> {
    backend: B,
    playlist: Playlist,
    config: JukeboxConfig,
    state: JukeboxState,
    current: Option<Slot<B::Handle>>,
    next: Option<Slot<B::Handle>>,
    /// Previous current handle while it fades out.
    outgoing: Option<B::Handle>,
    fading_in: bool,
    /// Idle handles reused by later preloads. Handles are never dropped, so a
    /// host mirroring them keeps track of every one it created.
    spares: Vec<B::Handle>,
    fade_task: PeriodicTask,
    rotation_task: PeriodicTask,
    muted: bool,
}

impl<B: AudioBackend> Jukebox<B> {
    pub fn new(backend: B, playlist: Playlist, config: JukeboxConfig) -> Self {
        Self {
            backend,
            playlist,
            config,
            state: JukeboxState::Uninitialized,
            current: None,
            next: None,
            outgoing: None,
            fading_in: false,
            spares: Vec::new(),
            fade_task: PeriodicTask::default(),
            rotation_task: PeriodicTask::default(),
            muted: config.muted,
        }
    }

    /// Loads the first two playable entries and waits for a gesture.
    pub fn prepare(&mut self) -> Result<(), JukeboxError> {
        if self.playlist.is_empty() {
            return Err(JukeboxError::EmptyPlaylist);
        }
        if self.state != JukeboxState::Uninitialized {
            return Ok(());
        }
        let current = self.load_slot(0).ok_or(JukeboxError::NoPlayableTrack)?;
        let next_index = current.index + 1;
        self.current = Some(current);
        self.next = self.load_slot(next_index);
        self.set_state(JukeboxState::AwaitingUserGesture);
        Ok(())
    }

    /// Called for every press, touch or key. Starts playback the first time
    /// the host allows it; returns whether playback started.
    pub fn on_user_gesture(&mut self) -> bool {
        if self.state != JukeboxState::AwaitingUserGesture {
            return false;
        }
        for _ in 0..self.playlist.len() {
            match self.start_current() {
                Ok(()) => {
                    self.set_state(JukeboxState::Playing);
                    self.arm_rotation();
                    if let Some(track) = self.now_playing() {
                        log::info!("now playing {}", track.display_name());
                    }
                    return true;
                }
                Err(AudioError::PlaybackDenied { reason }) => {
                    log::warn!("playback denied, waiting for the next gesture: {reason}");
                    return false;
                }
                Err(err) => {
                    log::warn!("current track unplayable: {err}");
                    if !self.skip_current() {
                        break;
                    }
                }
            }
        }
        false
    }

    /// Stops playback and the rotation timer. Any fade in flight is completed
    /// immediately so that resuming starts from a settled pair.
    pub fn pause(&mut self) -> bool {
        if self.state != JukeboxState::Playing {
            return false;
        }
        self.finish_fades();
        if let Some(current) = self.current.as_mut() {
            current.handle.pause();
        }
        self.rotation_task.cancel();
        self.set_state(JukeboxState::Paused);
        true
    }

    /// Continues the current track and starts a fresh rotation period. If the
    /// host refuses, the scheduler goes back to waiting for a gesture.
    pub fn resume(&mut self) -> bool {
        if self.state != JukeboxState::Paused {
            return false;
        }
        match self.start_current() {
            Ok(()) => {
                self.set_state(JukeboxState::Playing);
                self.arm_rotation();
                true
            }
            Err(err) => {
                log::warn!("resume failed, waiting for the next gesture: {err}");
                self.set_state(JukeboxState::AwaitingUserGesture);
                false
            }
        }
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        for handle in self.handles_mut() {
            handle.set_muted(muted);
        }
    }

    /// Flips mute and returns the new setting.
    pub fn toggle_mute(&mut self) -> bool {
        self.set_muted(!self.muted);
        self.muted
    }

    /// Advances fades and decides whether to rotate.
    pub fn update(&mut self, delta: Duration) {
        if self.state != JukeboxState::Playing {
            return;
        }
        for _ in 0..self.fade_task.tick(delta) {
            self.fade_step();
        }
        self.replace_failed_next();

        let finished = self
            .current
            .as_ref()
            .is_some_and(|current| current.handle.has_ended() || current.handle.has_failed());
        let interval_due = self.rotation_task.tick(delta) > 0;
        if finished || interval_due {
            self.rotate();
        }
    }

    /// Crossfades into the queued handle and preloads the following entry.
    pub fn rotate(&mut self) {
        self.finish_fades();

        let Some(incoming) = self.next.take() else {
            log::warn!("no track queued, restarting the current one");
            if let Some(current) = self.current.as_mut() {
                current.handle.set_current_time(Duration::ZERO);
                if let Err(err) = current.handle.play() {
                    log::warn!("restart failed: {err}");
                }
            }
            self.arm_rotation();
            return;
        };

        let next_index = incoming.index + 1;
        if let Some(previous) = self.current.replace(incoming) {
            self.outgoing = Some(previous.handle);
        }

        let started = match self.current.as_mut() {
            Some(current) => {
                current.handle.set_volume(0.0);
                let result = current.handle.play();
                if result.is_err() {
                    current.handle.set_volume(self.config.base_volume);
                }
                result
            }
            None => Err(AudioError::NotLoaded),
        };

        match started {
            Ok(()) => {
                self.fading_in = true;
                self.fade_task.schedule(self.config.fade_interval);
                self.arm_rotation();
                if let Some(track) = self.now_playing() {
                    log::info!("now playing {}", track.display_name());
                }
            }
            Err(err) => {
                log::warn!("could not start next track, waiting for a gesture: {err}");
                self.finish_fades();
                self.rotation_task.cancel();
                self.set_state(JukeboxState::AwaitingUserGesture);
            }
        }

        self.next = self.load_slot(next_index);
    }

    fn start_current(&mut self) -> Result<(), AudioError> {
        let Some(current) = self.current.as_mut() else {
            return Err(AudioError::NotLoaded);
        };
        if current.handle.has_failed() {
            let url = self.playlist.get(current.index).map(|t| t.url.clone()).unwrap_or_default();
            return Err(AudioError::LoadFailed { url, reason: "track failed to load".into() });
        }
        current.handle.play()
    }

    /// Drops an unplayable current handle and promotes the queued one.
    fn skip_current(&mut self) -> bool {
        let Some(failed) = self.current.take() else {
            return false;
        };
        let following = failed.index + 1;
        self.spares.push(failed.handle);

        let promoted = match self.next.take() {
            Some(next) if !next.handle.has_failed() => Some(next),
            Some(bad) => {
                let index = bad.index + 1;
                self.spares.push(bad.handle);
                self.load_slot(index)
            }
            None => self.load_slot(following),
        };
        let Some(current) = promoted else {
            return false;
        };
        let next_index = current.index + 1;
        self.current = Some(current);
        self.next = self.load_slot(next_index);
        true
    }

    fn replace_failed_next(&mut self) {
        if !self.next.as_ref().is_some_and(|next| next.handle.has_failed()) {
            return;
        }
        if let Some(bad) = self.next.take() {
            log::warn!("queued track {} failed to load, skipping it", bad.index);
            let index = bad.index + 1;
            self.spares.push(bad.handle);
            self.next = self.load_slot(index);
        }
    }

    /// Loads the first playable entry at or after `start`, trying each entry once.
    fn load_slot(&mut self, start: usize) -> Option<Slot<B::Handle>> {
        let len = self.playlist.len();
        for offset in 0..len {
            let index = (start + offset) % len;
            let Some(url) = self.playlist.get(index).map(|track| track.url.clone()) else {
                break;
            };
            let mut handle = self.spares.pop().unwrap_or_else(|| self.backend.create_handle());
            match handle.load(&url) {
                Ok(()) => {
                    handle.set_volume(self.config.base_volume);
                    handle.set_muted(self.muted);
                    return Some(Slot { handle, index });
                }
                Err(err) => {
                    log::warn!("skipping playlist entry {index}: {err}");
                    self.spares.push(handle);
                }
            }
        }
        log::error!("none of the {len} playlist entries could be loaded");
        None
    }

    fn fade_step(&mut self) {
        let (step, base) = (self.config.fade_step, self.config.base_volume);
        if let Some(outgoing) = self.outgoing.as_mut() {
            if fade_out_step(outgoing, step, base) {
                self.spares.extend(self.outgoing.take());
            }
        }
        if self.fading_in {
            self.fading_in = match self.current.as_mut() {
                Some(current) => !fade_in_step(&mut current.handle, step, base),
                None => false,
            };
        }
        if self.outgoing.is_none() && !self.fading_in {
            self.fade_task.cancel();
        }
    }

    fn finish_fades(&mut self) {
        let base = self.config.base_volume;
        if let Some(mut outgoing) = self.outgoing.take() {
            outgoing.pause();
            outgoing.set_current_time(Duration::ZERO);
            outgoing.set_volume(base);
            self.spares.push(outgoing);
        }
        if self.fading_in {
            if let Some(current) = self.current.as_mut() {
                current.handle.set_volume(base);
            }
            self.fading_in = false;
        }
        self.fade_task.cancel();
    }

    fn arm_rotation(&mut self) {
        match self.config.rotation {
            RotationPolicy::Interval(period) => self.rotation_task.schedule(period),
            RotationPolicy::OnTrackEnd => self.rotation_task.cancel(),
        }
    }

    fn set_state(&mut self, state: JukeboxState) {
        if self.state != state {
            log::debug!("jukebox {:?} -> {:?}", self.state, state);
            self.state = state;
        }
    }

    pub fn state(&self) -> JukeboxState {
        self.state
    }

    pub fn muted(&self) -> bool {
        self.muted
    }

    pub fn is_fading(&self) -> bool {
        self.outgoing.is_some() || self.fading_in
    }

    pub fn now_playing(&self) -> Option<&Track> {
        self.current.as_ref().and_then(|current| self.playlist.get(current.index))
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current.as_ref().map(|slot| slot.index)
    }

    pub fn next_index(&self) -> Option<usize> {
        self.next.as_ref().map(|slot| slot.index)
    }

    pub fn current_handle(&self) -> Option<&B::Handle> {
        self.current.as_ref().map(|slot| &slot.handle)
    }

    pub fn next_handle(&self) -> Option<&B::Handle> {
        self.next.as_ref().map(|slot| &slot.handle)
    }

    pub fn outgoing_handle(&self) -> Option<&B::Handle> {
        self.outgoing.as_ref()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Every handle the scheduler owns, for hosts that mirror them each frame.
    pub fn handles_mut(&mut self) -> impl Iterator<Item = &mut B::Handle> + '_ {
        self.current
            .iter_mut()
            .map(|slot| &mut slot.handle)
            .chain(self.next.iter_mut().map(|slot| &mut slot.handle))
            .chain(self.outgoing.iter_mut())
            .chain(self.spares.iter_mut())
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, rc::Rc};

    use super::*;

    #[derive(Default)]
    struct FakeHandle {
        url: Option<String>,
        volume: f32,
        muted: bool,
        playing: bool,
        position: Duration,
        ended: bool,
        failed: bool,
        deny: Rc<Cell<bool>>,
    }

    impl AudioHandle for FakeHandle {
        fn load(&mut self, url: &str) -> Result<(), AudioError> {
            if url.starts_with("missing") {
                return Err(AudioError::LoadFailed { url: url.into(), reason: "404".into() });
            }
            self.url = Some(url.into());
            self.playing = false;
            self.ended = false;
            self.failed = false;
            self.position = Duration::ZERO;
            Ok(())
        }
        fn play(&mut self) -> Result<(), AudioError> {
            if self.url.is_none() {
                return Err(AudioError::NotLoaded);
            }
            if self.deny.get() {
                return Err(AudioError::PlaybackDenied { reason: "no gesture yet".into() });
            }
            self.playing = true;
            Ok(())
        }
        fn pause(&mut self) { self.playing = false; }
        fn volume(&self) -> f32 { self.volume }
        fn set_volume(&mut self, volume: f32) { self.volume = volume; }
        fn muted(&self) -> bool { self.muted }
        fn set_muted(&mut self, muted: bool) { self.muted = muted; }
        fn current_time(&self) -> Duration { self.position }
        fn set_current_time(&mut self, position: Duration) { self.position = position; }
        fn has_ended(&self) -> bool { self.ended }
        fn has_failed(&self) -> bool { self.failed }
    }

    #[derive(Default)]
    struct FakeBackend {
        created: usize,
        deny: Rc<Cell<bool>>,
    }

    impl AudioBackend for FakeBackend {
        type Handle = FakeHandle;
        fn create_handle(&mut self) -> FakeHandle {
            self.created += 1;
            FakeHandle { deny: self.deny.clone(), ..FakeHandle::default() }
        }
    }

    fn jukebox(urls: &[&str], rotation: RotationPolicy) -> Jukebox<FakeBackend> {
        let playlist = Playlist::new(urls.iter().map(|url| Track::new(*url)).collect());
        let config = JukeboxConfig { rotation, ..JukeboxConfig::default() };
        Jukebox::new(FakeBackend::default(), playlist, config)
    }

    fn playing(urls: &[&str], rotation: RotationPolicy) -> Jukebox<FakeBackend> {
        let mut jukebox = jukebox(urls, rotation);
        jukebox.prepare().unwrap();
        assert!(jukebox.on_user_gesture());
        jukebox
    }

    fn end_current(jukebox: &mut Jukebox<FakeBackend>) {
        jukebox.current.as_mut().unwrap().handle.ended = true;
    }

    const FADE: Duration = Duration::from_millis(50);

    #[test]
    fn test_fade_out_takes_fifteen_steps() {
        let mut handle = FakeHandle { url: Some("a".into()), volume: 0.3, playing: true, ..FakeHandle::default() };
        for _ in 0..14 {
            assert!(!fade_out_step(&mut handle, 0.02, 0.3));
            assert!(handle.playing);
        }
        assert!(handle.volume() <= 0.02 + 1e-6);
        assert!(fade_out_step(&mut handle, 0.02, 0.3));
        assert!(!handle.playing);
        assert_eq!(0.3, handle.volume());
    }

    #[test]
    fn test_fade_in_stops_at_target() {
        let mut handle = FakeHandle::default();
        let mut steps = 0;
        while !fade_in_step(&mut handle, 0.02, 0.3) {
            steps += 1;
            assert!(steps < 20);
        }
        assert_eq!(0.3, handle.volume());
    }

    #[test]
    fn test_prepare_requires_tracks() {
        let mut jukebox = jukebox(&[], RotationPolicy::OnTrackEnd);
        assert_eq!(Err(JukeboxError::EmptyPlaylist), jukebox.prepare());

        let mut jukebox = jukebox_all_missing();
        assert_eq!(Err(JukeboxError::NoPlayableTrack), jukebox.prepare());
        assert_eq!(JukeboxState::Uninitialized, jukebox.state());
    }

    fn jukebox_all_missing() -> Jukebox<FakeBackend> {
        jukebox(&["missing-a", "missing-b"], RotationPolicy::OnTrackEnd)
    }

    #[test]
    fn test_waits_for_gesture() {
        let mut jukebox = jukebox(&["a", "b"], RotationPolicy::OnTrackEnd);
        assert!(!jukebox.on_user_gesture());
        jukebox.prepare().unwrap();
        assert_eq!(JukeboxState::AwaitingUserGesture, jukebox.state());
        assert_eq!((Some(0), Some(1)), (jukebox.current_index(), jukebox.next_index()));
        assert!(!jukebox.current_handle().unwrap().playing);
        assert_eq!(0.3, jukebox.current_handle().unwrap().volume());

        jukebox.backend.deny.set(true);
        assert!(!jukebox.on_user_gesture());
        assert_eq!(JukeboxState::AwaitingUserGesture, jukebox.state());

        jukebox.backend.deny.set(false);
        assert!(jukebox.on_user_gesture());
        assert_eq!(JukeboxState::Playing, jukebox.state());
        assert!(jukebox.current_handle().unwrap().playing);
        assert!(!jukebox.on_user_gesture());
    }

    #[test]
    fn test_track_end_crossfades() {
        let mut jukebox = playing(&["a", "b", "c"], RotationPolicy::OnTrackEnd);
        end_current(&mut jukebox);
        jukebox.update(Duration::from_millis(1));

        assert_eq!(Some(1), jukebox.current_index());
        assert_eq!(Some(2), jukebox.next_index());
        assert_eq!(Some("a"), jukebox.outgoing_handle().and_then(|h| h.url.as_deref()));
        let current = jukebox.current_handle().unwrap();
        assert!(current.playing);
        assert_eq!(0.0, current.volume());

        jukebox.update(FADE);
        assert!((jukebox.current_handle().unwrap().volume() - 0.02).abs() < 1e-6);
        assert!((jukebox.outgoing_handle().unwrap().volume() - 0.28).abs() < 1e-6);

        for _ in 0..20 {
            jukebox.update(FADE);
        }
        assert!(!jukebox.is_fading());
        assert!(jukebox.outgoing_handle().is_none());
        assert_eq!(0.3, jukebox.current_handle().unwrap().volume());
    }

    #[test]
    fn test_interval_rotation_wraps_playlist() {
        let mut jukebox = playing(&["a", "b"], RotationPolicy::Interval(Duration::from_secs(10)));
        jukebox.update(Duration::from_secs(9));
        assert_eq!(Some(0), jukebox.current_index());
        jukebox.update(Duration::from_secs(1));
        assert_eq!(Some(1), jukebox.current_index());
        assert_eq!(Some(0), jukebox.next_index());
        assert_eq!("b", jukebox.now_playing().unwrap().url);
    }

    #[test]
    fn test_pause_cancels_rotation() {
        let mut jukebox = playing(&["a", "b"], RotationPolicy::Interval(Duration::from_secs(10)));
        jukebox.rotate();
        assert!(jukebox.is_fading());

        assert!(jukebox.pause());
        assert!(!jukebox.is_fading());
        assert!(!jukebox.current_handle().unwrap().playing);
        assert_eq!(0.3, jukebox.current_handle().unwrap().volume());
        jukebox.update(Duration::from_secs(30));
        assert_eq!(Some(1), jukebox.current_index());

        assert!(jukebox.resume());
        assert!(jukebox.current_handle().unwrap().playing);
        jukebox.update(Duration::from_secs(10));
        assert_eq!(Some(0), jukebox.current_index());
    }

    #[test]
    fn test_resume_denied_rearms_gesture() {
        let mut jukebox = playing(&["a", "b"], RotationPolicy::OnTrackEnd);
        jukebox.pause();
        jukebox.backend.deny.set(true);
        assert!(!jukebox.resume());
        assert_eq!(JukeboxState::AwaitingUserGesture, jukebox.state());
        jukebox.backend.deny.set(false);
        assert!(jukebox.on_user_gesture());
    }

    #[test]
    fn test_load_failure_skips_forward() {
        let mut jukebox = jukebox(&["a", "missing-b", "c"], RotationPolicy::OnTrackEnd);
        jukebox.prepare().unwrap();
        assert_eq!((Some(0), Some(2)), (jukebox.current_index(), jukebox.next_index()));

        jukebox.on_user_gesture();
        end_current(&mut jukebox);
        jukebox.update(Duration::from_millis(1));
        assert_eq!(Some(2), jukebox.current_index());
        assert_eq!(Some(0), jukebox.next_index());
    }

    #[test]
    fn test_faded_handles_are_recycled() {
        let mut jukebox = playing(&["a", "b", "c"], RotationPolicy::OnTrackEnd);
        assert_eq!(2, jukebox.backend().created);

        jukebox.rotate();
        assert_eq!(3, jukebox.backend().created);
        for _ in 0..20 {
            jukebox.update(FADE);
        }
        jukebox.rotate();
        assert_eq!(3, jukebox.backend().created);
        assert_eq!(Some(0), jukebox.next_index());
        assert_eq!(Some("a"), jukebox.next_handle().and_then(|h| h.url.as_deref()));
    }

    #[test]
    fn test_mute_reaches_every_handle() {
        let mut jukebox = playing(&["a", "b"], RotationPolicy::OnTrackEnd);
        assert!(jukebox.toggle_mute());
        assert!(jukebox.current_handle().unwrap().muted());
        assert!(jukebox.next_handle().unwrap().muted());

        jukebox.rotate();
        assert!(jukebox.next_handle().unwrap().muted());
        assert!(!jukebox.toggle_mute());
        assert!(!jukebox.current_handle().unwrap().muted());
    }

    #[test]
    fn test_skipped_handles_are_kept() {
        let mut jukebox = playing(&["a", "b", "c"], RotationPolicy::OnTrackEnd);
        jukebox.rotate();
        for _ in 0..20 {
            jukebox.update(FADE);
        }
        assert!(!jukebox.is_fading());

        // The playing track goes bad while another handle sits idle.
        jukebox.pause();
        jukebox.current.as_mut().unwrap().handle.failed = true;
        assert!(!jukebox.resume());
        assert!(jukebox.on_user_gesture());

        assert_eq!(Some(2), jukebox.current_index());
        assert_eq!(Some("a"), jukebox.next_handle().and_then(|h| h.url.as_deref()));
        assert_eq!(3, jukebox.backend().created);
        assert_eq!(3, jukebox.handles_mut().count());
    }
}
