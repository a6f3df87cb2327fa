//! Motion playback state machine
//!
//! [`MotionPlayer`] tracks an explicit lifecycle and turns elapsed time into a
//! progress value between 0 and 100:
//!
//! ```text
//! Idle ──play──▶ Playing ──pause──▶ Paused
//!                  │   ◀───play────────┘
//!                  └──span elapsed──▶ Completed ──play──▶ Playing (restart)
//! any ──stop/reset──▶ Idle        any ──fail──▶ Error
//! ```
//!
//! Elapsed time is `now - start - total_paused - delay`. The start time is
//! re-anchored whenever elapsed time is changed from outside (seek, reverse,
//! resuming after a seek) so the requested position is honoured exactly.
//! Operations that make no sense in the current state are silent no-ops.

use crate::clock::Clock;
use serde::{Deserialize, Serialize};
use std::rc::Rc;

/// Lifecycle state of a motion
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    #[default]
    Idle,
    Playing,
    Paused,
    Completed,
    Error,
}

/// Direction progress moves in
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayDirection {
    #[default]
    Forward,
    Reverse,
    /// Forward then back to the start (ping-pong)
    Alternate,
}

/// Timing configuration for a player
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub duration_ms: u32,
    /// Applied once, before the first pass
    pub delay_ms: u32,
    pub direction: PlayDirection,
    #[serde(rename = "loop")]
    pub looping: bool,
}

impl PlayerConfig {
    pub fn new(duration_ms: u32) -> Self {
        Self {
            duration_ms,
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, delay_ms: u32) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    pub fn with_direction(mut self, direction: PlayDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_loop(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            duration_ms: 600,
            delay_ms: 0,
            direction: PlayDirection::Forward,
            looping: false,
        }
    }
}

/// Time-driven motion state machine
pub struct MotionPlayer {
    clock: Rc<dyn Clock>,
    config: PlayerConfig,
    state: PlaybackState,
    direction: PlayDirection,
    start_time: f64,
    pause_time: f64,
    total_paused: f64,
    elapsed: f64,
    /// Set after the first loop iteration; the delay only applies before it
    looped: bool,
    progress: f32,
    error: Option<String>,
}

impl MotionPlayer {
    pub fn new(config: PlayerConfig, clock: Rc<dyn Clock>) -> Self {
        Self {
            clock,
            config,
            state: PlaybackState::Idle,
            direction: config.direction,
            start_time: 0.0,
            pause_time: 0.0,
            total_paused: 0.0,
            elapsed: 0.0,
            looped: false,
            progress: 0.0,
            error: None,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn direction(&self) -> PlayDirection {
        self.direction
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    /// Progress in `[0, 100]` as of the last tick or control operation
    pub fn progress(&self) -> f32 {
        self.progress
    }

    /// Progress in `[0, 1]`
    pub fn normalized_progress(&self) -> f32 {
        self.progress / 100.0
    }

    /// Elapsed time in the current pass, excluding delay and pauses
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    pub fn is_paused(&self) -> bool {
        self.state == PlaybackState::Paused
    }

    pub fn is_completed(&self) -> bool {
        self.state == PlaybackState::Completed
    }

    fn duration(&self) -> f64 {
        f64::from(self.config.duration_ms)
    }

    fn delay(&self) -> f64 {
        if self.looped {
            0.0
        } else {
            f64::from(self.config.delay_ms)
        }
    }

    /// Length of one pass in the current direction
    fn span(&self) -> f64 {
        match self.direction {
            PlayDirection::Alternate => self.duration() * 2.0,
            _ => self.duration(),
        }
    }

    fn progress_at(&self, elapsed: f64) -> f32 {
        let duration = self.duration();
        if duration <= 0.0 {
            return match self.direction {
                PlayDirection::Forward => 100.0,
                PlayDirection::Reverse | PlayDirection::Alternate => 0.0,
            };
        }
        let raw = match self.direction {
            PlayDirection::Forward => (elapsed / duration).clamp(0.0, 1.0),
            PlayDirection::Reverse => 1.0 - (elapsed / duration).clamp(0.0, 1.0),
            PlayDirection::Alternate => {
                let elapsed = elapsed.clamp(0.0, duration * 2.0);
                let cycle = (elapsed / duration).floor();
                let local = (elapsed - cycle * duration) / duration;
                if cycle as u64 % 2 == 0 {
                    local
                } else {
                    1.0 - local
                }
            }
        };
        (raw * 100.0) as f32
    }

    /// Move the start time so that `elapsed` is the current position
    fn anchor(&mut self, elapsed: f64) {
        let reference = if self.state == PlaybackState::Paused {
            self.pause_time
        } else {
            self.clock.now_ms()
        };
        self.start_time = reference - elapsed - self.delay();
        self.total_paused = 0.0;
    }

    /// Advance to the clock's current time
    ///
    /// Only does work while playing. Returns the progress in `[0, 100]`.
    pub fn tick(&mut self) -> f32 {
        if self.state != PlaybackState::Playing {
            return self.progress;
        }

        let now = self.clock.now_ms();
        let elapsed = (now - self.start_time - self.total_paused - self.delay()).max(0.0);
        let span = self.span();

        if elapsed >= span {
            if self.config.looping && span > 0.0 {
                self.looped = true;
                self.start_time = now;
                self.total_paused = 0.0;
                self.elapsed = 0.0;
                self.progress = self.progress_at(0.0);
                tracing::trace!("motion loop restarted");
            } else {
                self.elapsed = span;
                self.progress = self.progress_at(span);
                self.state = PlaybackState::Completed;
                tracing::debug!(direction = ?self.direction, "motion completed");
            }
        } else {
            self.elapsed = elapsed;
            self.progress = self.progress_at(elapsed);
        }
        self.progress
    }

    /// Start or resume playback
    ///
    /// From `Completed` the motion restarts from the beginning in the current
    /// direction. From `Idle` any sought position is kept and the delay is
    /// only waited when starting from zero.
    pub fn play(&mut self) {
        match self.state {
            PlaybackState::Playing | PlaybackState::Error => return,
            PlaybackState::Paused => {
                self.total_paused += self.clock.now_ms() - self.pause_time;
                self.state = PlaybackState::Playing;
                tracing::debug!("motion resumed");
                return;
            }
            PlaybackState::Completed => self.stop(),
            PlaybackState::Idle => {}
        }

        let now = self.clock.now_ms();
        let delay = if self.elapsed > 0.0 { self.delay() } else { 0.0 };
        self.start_time = now - self.elapsed - delay;
        self.total_paused = 0.0;
        self.state = PlaybackState::Playing;
        self.progress = self.progress_at(self.elapsed);
        tracing::debug!(elapsed = self.elapsed, "motion playing");
    }

    /// Pause playback, only from `Playing`
    pub fn pause(&mut self) {
        if self.state != PlaybackState::Playing {
            return;
        }
        self.tick();
        if self.state == PlaybackState::Playing {
            self.pause_time = self.clock.now_ms();
            self.state = PlaybackState::Paused;
            tracing::debug!(progress = self.progress, "motion paused");
        }
    }

    /// Return to `Idle` with all timing cleared
    pub fn stop(&mut self) {
        self.state = PlaybackState::Idle;
        self.start_time = 0.0;
        self.pause_time = 0.0;
        self.total_paused = 0.0;
        self.elapsed = 0.0;
        self.looped = false;
        self.progress = 0.0;
        self.error = None;
    }

    /// Stop and restore the configured direction
    pub fn reset(&mut self) {
        self.stop();
        self.direction = self.config.direction;
    }

    /// Toggle the playback direction
    ///
    /// Elapsed time is preserved so progress flips: reversing at 30% shows
    /// 70% and finishes after the remaining 70% of the duration. Alternate
    /// motions mirror their position so the visual state holds. A completed
    /// motion is mirrored too so that playing it again runs back to the start.
    pub fn reverse(&mut self) {
        if self.state == PlaybackState::Error {
            return;
        }
        self.direction = match self.direction {
            PlayDirection::Forward => PlayDirection::Reverse,
            PlayDirection::Reverse => PlayDirection::Forward,
            PlayDirection::Alternate => {
                self.elapsed = (self.span() - self.elapsed).max(0.0);
                PlayDirection::Alternate
            }
        };
        if self.state == PlaybackState::Completed && self.direction != PlayDirection::Alternate {
            self.elapsed = (self.span() - self.elapsed).max(0.0);
        }

        match self.state {
            PlaybackState::Playing | PlaybackState::Paused => {
                self.anchor(self.elapsed);
                self.progress = self.progress_at(self.elapsed);
            }
            PlaybackState::Completed => self.progress = self.progress_at(self.elapsed),
            PlaybackState::Idle | PlaybackState::Error => {}
        }
        tracing::debug!(direction = ?self.direction, "motion reversed");
    }

    /// Jump to `percent` (clamped to `[0, 100]`) under the current direction
    ///
    /// A completed motion becomes paused at the sought position.
    pub fn seek(&mut self, percent: f32) {
        if self.state == PlaybackState::Error || self.duration() <= 0.0 {
            return;
        }
        let fraction = f64::from(percent.clamp(0.0, 100.0)) / 100.0;
        let duration = self.duration();

        self.elapsed = match self.direction {
            PlayDirection::Forward => fraction * duration,
            PlayDirection::Reverse => (1.0 - fraction) * duration,
            PlayDirection::Alternate => {
                if self.elapsed >= duration {
                    duration + (1.0 - fraction) * duration
                } else {
                    fraction * duration
                }
            }
        };
        self.progress = self.progress_at(self.elapsed);

        if self.state == PlaybackState::Completed {
            self.state = PlaybackState::Paused;
            self.pause_time = self.clock.now_ms();
        }
        if matches!(self.state, PlaybackState::Playing | PlaybackState::Paused) {
            self.anchor(self.elapsed);
        }
    }

    /// Enter the error state
    pub fn fail(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        tracing::warn!(%reason, "motion failed");
        self.state = PlaybackState::Error;
        self.error = Some(reason);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn player(config: PlayerConfig) -> (MotionPlayer, ManualClock) {
        let clock = ManualClock::new();
        let player = MotionPlayer::new(config, Rc::new(clock.clone()));
        (player, clock)
    }

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn test_initial_state() {
        let (player, _) = player(PlayerConfig::new(1000));
        assert_eq!(player.state(), PlaybackState::Idle);
        assert_eq!(player.progress(), 0.0);
    }

    #[test]
    fn test_forward_progress() {
        let (mut player, clock) = player(PlayerConfig::new(1000));
        player.play();
        clock.advance(250.0);
        assert!(approx(player.tick(), 25.0));
        clock.advance(750.0);
        assert!(approx(player.tick(), 100.0));
        assert_eq!(player.state(), PlaybackState::Completed);
    }

    #[test]
    fn test_delay_defers_progress() {
        let (mut player, clock) = player(PlayerConfig::new(1000).with_delay(200));
        player.play();
        clock.advance(150.0);
        assert_eq!(player.tick(), 0.0);
        clock.advance(550.0);
        assert!(approx(player.tick(), 50.0));
    }

    #[test]
    fn test_reverse_direction_config() {
        let config = PlayerConfig::new(1000).with_direction(PlayDirection::Reverse);
        let (mut player, clock) = player(config);
        player.play();
        clock.advance(250.0);
        assert!(approx(player.tick(), 75.0));
    }

    #[test]
    fn test_alternate_ping_pongs() {
        let config = PlayerConfig::new(1000).with_direction(PlayDirection::Alternate);
        let (mut player, clock) = player(config);
        player.play();
        clock.advance(500.0);
        assert!(approx(player.tick(), 50.0));
        clock.advance(500.0);
        assert!(approx(player.tick(), 100.0));
        clock.advance(250.0);
        assert!(approx(player.tick(), 75.0));
        clock.advance(750.0);
        assert!(approx(player.tick(), 0.0));
        assert!(player.is_completed());
    }

    #[test]
    fn test_pause_and_resume() {
        let (mut player, clock) = player(PlayerConfig::new(1000));
        player.play();
        clock.advance(400.0);
        player.pause();
        assert!(player.is_paused());
        assert!(approx(player.progress(), 40.0));

        clock.advance(5000.0);
        assert!(approx(player.tick(), 40.0));

        player.play();
        clock.advance(100.0);
        assert!(approx(player.tick(), 50.0));
    }

    #[test]
    fn test_pause_only_from_playing() {
        let (mut player, _) = player(PlayerConfig::new(1000));
        player.pause();
        assert_eq!(player.state(), PlaybackState::Idle);
    }

    #[test]
    fn test_reverse_at_thirty_percent() {
        let (mut player, clock) = player(PlayerConfig::new(1000));
        player.play();
        clock.advance(300.0);
        player.tick();
        player.reverse();
        assert!(approx(player.progress(), 70.0));

        clock.advance(350.0);
        assert!(approx(player.tick(), 35.0));
        assert!(player.is_playing());

        clock.advance(349.0);
        player.tick();
        assert!(player.is_playing());

        clock.advance(1.0);
        assert!(approx(player.tick(), 0.0));
        assert!(player.is_completed());
    }

    #[test]
    fn test_reverse_while_paused_then_resume() {
        let (mut player, clock) = player(PlayerConfig::new(1000));
        player.play();
        clock.advance(200.0);
        player.pause();
        player.reverse();
        assert!(approx(player.progress(), 80.0));

        clock.advance(1000.0);
        player.play();
        clock.advance(100.0);
        assert!(approx(player.tick(), 70.0));
    }

    #[test]
    fn test_reverse_completed_then_play_runs_back() {
        let (mut player, clock) = player(PlayerConfig::new(1000));
        player.play();
        clock.advance(1000.0);
        player.tick();
        assert!(player.is_completed());

        player.reverse();
        assert!(approx(player.progress(), 100.0));

        player.play();
        clock.advance(250.0);
        assert!(approx(player.tick(), 75.0));
    }

    #[test]
    fn test_seek_then_play_continues() {
        let (mut player, clock) = player(PlayerConfig::new(1000).with_delay(300));
        player.seek(50.0);
        assert!(approx(player.progress(), 50.0));

        player.play();
        assert!(approx(player.tick(), 50.0));
        clock.advance(100.0);
        assert!(approx(player.tick(), 60.0));
    }

    #[test]
    fn test_seek_while_playing_reanchors() {
        let (mut player, clock) = player(PlayerConfig::new(1000));
        player.play();
        clock.advance(100.0);
        player.seek(80.0);
        assert!(approx(player.tick(), 80.0));
        clock.advance(100.0);
        assert!(approx(player.tick(), 90.0));
    }

    #[test]
    fn test_seek_clamps() {
        let (mut player, _) = player(PlayerConfig::new(1000));
        player.seek(150.0);
        assert_eq!(player.progress(), 100.0);
        player.seek(-20.0);
        assert_eq!(player.progress(), 0.0);
    }

    #[test]
    fn test_seek_under_reverse() {
        let config = PlayerConfig::new(1000).with_direction(PlayDirection::Reverse);
        let (mut player, clock) = player(config);
        player.seek(25.0);
        player.play();
        clock.advance(100.0);
        assert!(approx(player.tick(), 15.0));
    }

    #[test]
    fn test_seek_completed_pauses() {
        let (mut player, clock) = player(PlayerConfig::new(1000));
        player.play();
        clock.advance(2000.0);
        player.tick();
        player.seek(40.0);
        assert!(player.is_paused());
        player.play();
        clock.advance(100.0);
        assert!(approx(player.tick(), 50.0));
    }

    #[test]
    fn test_play_from_completed_restarts() {
        let (mut player, clock) = player(PlayerConfig::new(500));
        player.play();
        clock.advance(500.0);
        player.tick();
        assert!(player.is_completed());

        player.play();
        assert!(player.is_playing());
        assert_eq!(player.progress(), 0.0);
        clock.advance(250.0);
        assert!(approx(player.tick(), 50.0));
    }

    #[test]
    fn test_looping_never_completes() {
        let (mut player, clock) = player(PlayerConfig::new(100).with_delay(50).with_loop(true));
        player.play();
        clock.advance(150.0);
        assert_eq!(player.tick(), 0.0);
        assert!(player.is_playing());

        // no delay on later passes
        clock.advance(50.0);
        assert!(approx(player.tick(), 50.0));
    }

    #[test]
    fn test_stop_and_reset_are_idempotent() {
        let (mut player, clock) = player(
            PlayerConfig::new(1000).with_direction(PlayDirection::Reverse),
        );
        player.play();
        clock.advance(300.0);
        player.tick();
        player.reverse();

        player.stop();
        player.stop();
        assert_eq!(player.state(), PlaybackState::Idle);
        assert_eq!(player.progress(), 0.0);
        assert_eq!(player.elapsed_ms(), 0.0);
        assert_eq!(player.direction(), PlayDirection::Forward);

        player.reset();
        player.reset();
        assert_eq!(player.direction(), PlayDirection::Reverse);
        assert_eq!(player.state(), PlaybackState::Idle);
    }

    #[test]
    fn test_fail_blocks_play() {
        let (mut player, _) = player(PlayerConfig::new(1000));
        player.fail("target detached");
        assert_eq!(player.state(), PlaybackState::Error);
        assert_eq!(player.error(), Some("target detached"));

        player.play();
        assert_eq!(player.state(), PlaybackState::Error);

        player.reset();
        assert_eq!(player.state(), PlaybackState::Idle);
        assert_eq!(player.error(), None);
    }

    #[test]
    fn test_zero_duration_completes_immediately() {
        let (mut player, _) = player(PlayerConfig::new(0));
        player.play();
        assert_eq!(player.tick(), 100.0);
        assert!(player.is_completed());
    }

    #[test]
    fn test_config_deserializes_loop_key() {
        let config: PlayerConfig =
            serde_json::from_str(r#"{"duration_ms": 300, "direction": "alternate", "loop": true}"#)
                .unwrap();
        assert_eq!(config.duration_ms, 300);
        assert_eq!(config.direction, PlayDirection::Alternate);
        assert!(config.looping);
    }
}
