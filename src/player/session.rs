use std::time::Instant;

use tracing::{debug, trace};

use crate::models::{ProgressSnapshot, ResumeHints};

/// Tolerances and thresholds the session applies. Extracted from
/// `TrackerConfig` so the state machine stays free of file-level config.
#[derive(Debug, Clone, Copy)]
pub struct SessionTuning {
    pub seek_tolerance_seconds: f64,
    pub max_plausible_delta_seconds: f64,
    pub completion_ratio: f64,
}

impl Default for SessionTuning {
    fn default() -> Self {
        Self {
            seek_tolerance_seconds: 2.0,
            max_plausible_delta_seconds: 3.0,
            completion_ratio: 0.95,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Bound,
    Playing,
    Paused,
    Ended,
}

/// Verdict on a backend-reported seek under the anti-skip policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SeekVerdict {
    Allow,
    /// Seek target exceeded the furthest verified position; snap back here.
    SnapBack(f64),
}

/// Pure per-video playback state machine.
///
/// Owns the position/watched/max-reached triple and applies the anti-skip,
/// accrual and completion rules. All timing inputs are explicit `Instant`
/// arguments so every property is testable without a runtime; the async
/// tracker shell feeds it from real timers.
#[derive(Debug)]
pub struct WatchSession {
    phase: Phase,
    watched_seconds: f64,
    max_reached_seconds: f64,
    duration_seconds: f64,
    last_position_seconds: f64,
    completed: bool,
    resume_applied: bool,
    last_tick: Option<Instant>,
    tuning: SessionTuning,
}

impl WatchSession {
    /// Seed a session from server-sourced resume hints. Malformed hints are
    /// clamped rather than rejected.
    pub fn new(hints: ResumeHints, tuning: SessionTuning) -> Self {
        let max_reached = hints.max_reached_seconds.max(0.0);
        let mut last_position = hints.last_position_seconds.max(0.0);
        if max_reached > 0.0 {
            last_position = last_position.min(max_reached + tuning.seek_tolerance_seconds);
        }

        Self {
            phase: Phase::Idle,
            watched_seconds: hints.watched_seconds.max(0.0),
            max_reached_seconds: max_reached,
            duration_seconds: 0.0,
            last_position_seconds: last_position,
            completed: hints.completed,
            resume_applied: false,
            last_tick: None,
            tuning,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_playing(&self) -> bool {
        self.phase == Phase::Playing
    }

    pub fn duration_seconds(&self) -> f64 {
        self.duration_seconds
    }

    pub fn max_reached_seconds(&self) -> f64 {
        self.max_reached_seconds
    }

    /// Backend handle attached; the session can now receive signals.
    pub fn bind(&mut self) {
        if self.phase == Phase::Idle {
            self.phase = Phase::Bound;
        }
    }

    /// Record the duration once the backend reports it. Returns true when
    /// this newly crossed the completion threshold (a short video may already
    /// be past 95% from a previous session).
    pub fn set_duration(&mut self, duration: f64) -> bool {
        if duration > 0.0 {
            self.duration_seconds = duration;
        }
        self.check_completion()
    }

    /// Where to seek at bind time, clamped to the furthest verified point so
    /// a forged client-side position can never unlock later content.
    pub fn resume_position(&self) -> Option<f64> {
        if self.last_position_seconds <= 0.0 {
            return None;
        }
        let ceiling = if self.max_reached_seconds > 0.0 {
            self.max_reached_seconds
        } else {
            self.last_position_seconds
        };
        Some(self.last_position_seconds.min(ceiling))
    }

    pub fn resume_applied(&self) -> bool {
        self.resume_applied
    }

    pub fn mark_resume_applied(&mut self) {
        self.resume_applied = true;
    }

    /// One-shot late resume for hints that arrive after bind. Returns the
    /// clamped seek target, or `None` if resume was already applied.
    pub fn late_resume(&mut self, position: f64) -> Option<f64> {
        if self.resume_applied || position <= 0.0 {
            return None;
        }
        self.resume_applied = true;
        let ceiling = if self.max_reached_seconds > 0.0 {
            self.max_reached_seconds
        } else {
            position
        };
        Some(position.min(ceiling))
    }

    pub fn on_play(&mut self, now: Instant) {
        trace!("session: play");
        self.phase = Phase::Playing;
        self.last_tick = Some(now);
    }

    pub fn on_pause(&mut self) {
        trace!("session: pause");
        if self.phase == Phase::Playing {
            self.phase = Phase::Paused;
        }
    }

    pub fn on_ended(&mut self) {
        debug!("session: ended");
        self.phase = Phase::Ended;
    }

    /// Anti-skip verdict for a backend-reported seek. Only the native-file
    /// backend exposes reliable seek events; the polling widget is exempt.
    pub fn check_seek(&self, target: f64) -> SeekVerdict {
        if target > self.max_reached_seconds + self.tuning.seek_tolerance_seconds {
            SeekVerdict::SnapBack(self.max_reached_seconds)
        } else {
            SeekVerdict::Allow
        }
    }

    /// Record an observed playback position (native `timeupdate`). Advances
    /// max-reached only when the position is within the seek-tolerance
    /// window, i.e. was reached through real forward playback. Returns true
    /// when the completion threshold was newly crossed.
    pub fn observe_position(&mut self, position: f64) -> bool {
        if position < 0.0 {
            return false;
        }
        self.last_position_seconds = position;
        if position <= self.max_reached_seconds + self.tuning.seek_tolerance_seconds {
            self.max_reached_seconds = self.max_reached_seconds.max(position);
        }
        self.check_completion()
    }

    /// Accrue watched time for one tick. Deltas outside
    /// `(0, max_plausible_delta)` are discarded, not clamped, so a suspended
    /// tab adds nothing. The tick origin resets either way.
    pub fn accrue(&mut self, now: Instant) {
        if self.phase != Phase::Playing {
            return;
        }
        if let Some(last) = self.last_tick {
            let delta = now.duration_since(last).as_secs_f64();
            if delta > 0.0 && delta < self.tuning.max_plausible_delta_seconds {
                self.watched_seconds += delta;
            }
        }
        self.last_tick = Some(now);
    }

    /// One widget poll tick: take the widget's own position sample when it
    /// answered, otherwise extrapolate by wall clock so tracking degrades
    /// gracefully instead of freezing. Also accrues watched time for the
    /// tick. Returns true when completion was newly crossed.
    ///
    /// No seek-tolerance gate here: the widget cannot reliably report
    /// scrubbing, so max-reached follows the estimated position directly.
    /// Known platform limitation, intentionally preserved.
    pub fn poll_position(&mut self, sampled: Option<f64>, now: Instant) -> bool {
        if self.phase != Phase::Playing {
            self.last_tick = Some(now);
            return false;
        }

        let delta = self
            .last_tick
            .map(|last| now.duration_since(last).as_secs_f64())
            .unwrap_or(0.0);
        let plausible = delta > 0.0 && delta < self.tuning.max_plausible_delta_seconds;

        match sampled {
            Some(position) if position > 0.0 => {
                self.last_position_seconds = position;
            }
            _ => {
                if plausible {
                    self.last_position_seconds += delta;
                }
            }
        }

        if self.last_position_seconds > 0.0 {
            self.max_reached_seconds = self.max_reached_seconds.max(self.last_position_seconds);
        }
        if plausible {
            self.watched_seconds += delta;
        }
        self.last_tick = Some(now);

        self.check_completion()
    }

    /// Latch completion once max-reached crosses the threshold. Returns true
    /// exactly once; repeated crossings are no-ops and the flag never
    /// reverts.
    fn check_completion(&mut self) -> bool {
        if self.completed || self.duration_seconds <= 0.0 {
            return false;
        }
        if self.max_reached_seconds / self.duration_seconds >= self.tuning.completion_ratio {
            debug!(
                max_reached = self.max_reached_seconds,
                duration = self.duration_seconds,
                "session: completion threshold crossed"
            );
            self.completed = true;
            return true;
        }
        false
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            watched_seconds: self.watched_seconds,
            max_reached_seconds: self.max_reached_seconds,
            duration_seconds: self.duration_seconds,
            current_position: self.last_position_seconds,
            completed: self.completed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn session() -> WatchSession {
        WatchSession::new(ResumeHints::default(), SessionTuning::default())
    }

    fn session_with(hints: ResumeHints) -> WatchSession {
        WatchSession::new(hints, SessionTuning::default())
    }

    #[test]
    fn test_max_reached_is_non_decreasing() {
        let mut s = session();
        s.set_duration(600.0);
        // Ordinary playback steps, including a rewatch of an earlier part.
        for position in [1.0, 2.5, 1.5, 3.0, 4.5, 4.0] {
            s.observe_position(position);
        }
        assert_eq!(s.max_reached_seconds(), 4.5);
        assert_eq!(s.snapshot().current_position, 4.0);
    }

    #[test]
    fn test_position_past_tolerance_does_not_advance_max() {
        let mut s = session_with(ResumeHints {
            max_reached_seconds: 10.0,
            ..ResumeHints::default()
        });
        s.set_duration(600.0);
        // A jump far past max + tolerance: position updates, max does not.
        s.observe_position(150.0);
        assert_eq!(s.max_reached_seconds(), 10.0);
        assert_eq!(s.snapshot().current_position, 150.0);
    }

    #[test]
    fn test_anti_skip_snaps_back() {
        let mut s = session_with(ResumeHints {
            max_reached_seconds: 100.0,
            ..ResumeHints::default()
        });
        s.set_duration(600.0);
        assert_eq!(s.check_seek(150.0), SeekVerdict::SnapBack(100.0));
        assert_eq!(s.check_seek(101.5), SeekVerdict::Allow);
        assert_eq!(s.check_seek(40.0), SeekVerdict::Allow);
    }

    #[test]
    fn test_accrual_counts_only_plausible_deltas() {
        let mut s = session();
        s.set_duration(600.0);
        let t0 = Instant::now();
        s.on_play(t0);
        s.accrue(t0 + Duration::from_secs(1));
        s.accrue(t0 + Duration::from_secs(2));
        // Tab suspend: a 120s gap adds nothing.
        s.accrue(t0 + Duration::from_secs(122));
        // But ticking resumes normally afterwards.
        s.accrue(t0 + Duration::from_secs(123));
        assert!((s.snapshot().watched_seconds - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_accrual_requires_playing() {
        let mut s = session();
        s.set_duration(600.0);
        let t0 = Instant::now();
        s.on_play(t0);
        s.accrue(t0 + Duration::from_secs(1));
        s.on_pause();
        s.accrue(t0 + Duration::from_secs(2));
        assert!((s.snapshot().watched_seconds - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_completion_fires_exactly_once() {
        let mut s = session_with(ResumeHints {
            max_reached_seconds: 93.5,
            ..ResumeHints::default()
        });
        s.set_duration(100.0);
        assert!(!s.observe_position(94.0));
        assert!(s.observe_position(95.5));
        assert!(s.is_completed());
        // Repeated crossings are no-ops; the flag never reverts.
        assert!(!s.observe_position(96.0));
        assert!(!s.observe_position(10.0));
        assert!(s.is_completed());
    }

    #[test]
    fn test_completed_hint_suppresses_resignal() {
        let mut s = session_with(ResumeHints {
            max_reached_seconds: 99.0,
            completed: true,
            ..ResumeHints::default()
        });
        assert!(!s.set_duration(100.0));
        assert!(!s.observe_position(99.5));
        assert!(s.is_completed());
    }

    #[test]
    fn test_short_video_completes_on_duration_load() {
        let mut s = session_with(ResumeHints {
            max_reached_seconds: 58.0,
            last_position_seconds: 58.0,
            watched_seconds: 60.0,
            completed: false,
        });
        assert!(s.set_duration(60.0));
        assert!(s.is_completed());
    }

    #[test]
    fn test_resume_clamped_to_max_reached() {
        let s = session_with(ResumeHints {
            last_position_seconds: 500.0,
            max_reached_seconds: 120.0,
            ..ResumeHints::default()
        });
        // Forged/corrupted lastPosition cannot resume past max-reached.
        assert_eq!(s.resume_position(), Some(120.0));
    }

    #[test]
    fn test_resume_without_history() {
        let s = session();
        assert_eq!(s.resume_position(), None);

        let s = session_with(ResumeHints {
            last_position_seconds: 30.0,
            ..ResumeHints::default()
        });
        assert_eq!(s.resume_position(), Some(30.0));
    }

    #[test]
    fn test_late_resume_applies_once() {
        let mut s = session_with(ResumeHints {
            max_reached_seconds: 80.0,
            ..ResumeHints::default()
        });
        assert_eq!(s.late_resume(200.0), Some(80.0));
        assert_eq!(s.late_resume(50.0), None);
    }

    #[test]
    fn test_late_resume_skipped_after_bind_resume() {
        let mut s = session_with(ResumeHints {
            last_position_seconds: 30.0,
            max_reached_seconds: 40.0,
            ..ResumeHints::default()
        });
        s.mark_resume_applied();
        assert_eq!(s.late_resume(35.0), None);
    }

    #[test]
    fn test_widget_poll_prefers_api_sample() {
        let mut s = session();
        s.set_duration(600.0);
        let t0 = Instant::now();
        s.on_play(t0);
        s.poll_position(Some(12.0), t0 + Duration::from_secs(1));
        assert_eq!(s.snapshot().current_position, 12.0);
        assert_eq!(s.max_reached_seconds(), 12.0);
    }

    #[test]
    fn test_widget_poll_extrapolates_on_query_failure() {
        let mut s = session();
        s.set_duration(600.0);
        let t0 = Instant::now();
        s.on_play(t0);
        s.poll_position(Some(12.0), t0 + Duration::from_secs(1));
        // Two failed queries: position keeps advancing by wall clock.
        s.poll_position(None, t0 + Duration::from_secs(2));
        s.poll_position(None, t0 + Duration::from_secs(3));
        let snap = s.snapshot();
        assert!((snap.current_position - 14.0).abs() < 1e-9);
        assert!((snap.max_reached_seconds - 14.0).abs() < 1e-9);
        assert!((snap.watched_seconds - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_widget_poll_ignores_suspend_gap() {
        let mut s = session();
        s.set_duration(600.0);
        let t0 = Instant::now();
        s.on_play(t0);
        s.poll_position(Some(5.0), t0 + Duration::from_secs(1));
        s.poll_position(None, t0 + Duration::from_secs(121));
        let snap = s.snapshot();
        assert_eq!(snap.current_position, 5.0);
        assert!((snap.watched_seconds - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_negative_hints_clamped() {
        let s = session_with(ResumeHints {
            last_position_seconds: -4.0,
            max_reached_seconds: -9.0,
            watched_seconds: -1.0,
            completed: false,
        });
        let snap = s.snapshot();
        assert_eq!(snap.current_position, 0.0);
        assert_eq!(snap.max_reached_seconds, 0.0);
        assert_eq!(snap.watched_seconds, 0.0);
    }

    #[test]
    fn test_phase_transitions() {
        let mut s = session();
        assert_eq!(s.phase(), Phase::Idle);
        s.bind();
        assert_eq!(s.phase(), Phase::Bound);
        let t0 = Instant::now();
        s.on_play(t0);
        assert_eq!(s.phase(), Phase::Playing);
        s.on_pause();
        assert_eq!(s.phase(), Phase::Paused);
        s.on_play(t0 + Duration::from_secs(1));
        assert_eq!(s.phase(), Phase::Playing);
        s.on_ended();
        assert_eq!(s.phase(), Phase::Ended);
    }
}
