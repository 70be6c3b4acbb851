use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};
use uuid::Uuid;

use super::provider::Provider;
use super::session::{SeekVerdict, SessionTuning, WatchSession};
use super::surface::{PlaybackSurface, SurfaceEvent};
use crate::config::TrackerConfig;
use crate::models::{ProgressKey, ProgressSnapshot, ResumeHints};

/// Commands accepted by a running tracker.
#[derive(Debug)]
pub enum TrackerCommand {
    /// Signal forwarded from the bound playback surface.
    Surface(SurfaceEvent),
    /// One-shot resume for hints that arrived after bind.
    LateResume { position_seconds: f64 },
    /// Force a progress emission outside the normal cadence.
    Flush,
    Shutdown,
}

/// Events a tracker emits to its host.
#[derive(Debug, Clone)]
pub enum TrackerEvent {
    /// Periodic snapshot on the emission cadence (and on pause/end).
    Progress(ProgressSnapshot),
    /// One-shot: the completion threshold was crossed this session.
    Completed(ProgressSnapshot),
    /// Backend-native end of playback.
    Ended(ProgressSnapshot),
}

/// Handle owned by the host for one mounted tracker.
#[derive(Clone)]
pub struct TrackerHandle {
    key: ProgressKey,
    commands: mpsc::UnboundedSender<TrackerCommand>,
    cancel: CancellationToken,
    destroyed: Arc<AtomicBool>,
}

impl TrackerHandle {
    pub fn key(&self) -> &ProgressKey {
        &self.key
    }

    pub fn surface_event(&self, event: SurfaceEvent) {
        let _ = self.commands.send(TrackerCommand::Surface(event));
    }

    pub fn late_resume(&self, position_seconds: f64) {
        let _ = self.commands.send(TrackerCommand::LateResume { position_seconds });
    }

    pub fn flush(&self) {
        let _ = self.commands.send(TrackerCommand::Flush);
    }

    /// Tear the tracker down. Both timers are dead from this call on: the
    /// destroyed flag is checked at the top of every timer arm, so a tick
    /// racing the cancellation can never write into a torn-down tracker.
    pub fn teardown(&self) {
        self.destroyed.store(true, Ordering::SeqCst);
        self.cancel.cancel();
        let _ = self.commands.send(TrackerCommand::Shutdown);
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }
}

/// Per-video tracker: owns the playback surface and the watch session,
/// drives the accrual/poll tick and the coarser emission tick, and emits
/// progress events to the host.
///
/// One instance exists per (module, video) on screen; switching videos tears
/// it down and spawns a fresh one.
pub struct Tracker {
    key: ProgressKey,
    provider: Provider,
    surface: Box<dyn PlaybackSurface>,
    session: WatchSession,
    config: TrackerConfig,
    events: mpsc::UnboundedSender<TrackerEvent>,
    commands: mpsc::UnboundedReceiver<TrackerCommand>,
    cancel: CancellationToken,
    destroyed: Arc<AtomicBool>,
    instance_id: Uuid,
}

impl Tracker {
    /// Spawn a tracker task for a playable provider. The caller (the mount
    /// factory) guarantees `provider` is never `OpaqueEmbed`, which has no
    /// progress contract.
    pub fn spawn(
        key: ProgressKey,
        provider: Provider,
        surface: Box<dyn PlaybackSurface>,
        hints: ResumeHints,
        config: TrackerConfig,
    ) -> (TrackerHandle, mpsc::UnboundedReceiver<TrackerEvent>) {
        debug_assert!(provider != Provider::OpaqueEmbed);

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let destroyed = Arc::new(AtomicBool::new(false));

        let tuning = SessionTuning {
            seek_tolerance_seconds: config.seek_tolerance_seconds,
            max_plausible_delta_seconds: config.max_plausible_delta_seconds,
            completion_ratio: config.completion_ratio,
        };

        let tracker = Tracker {
            key: key.clone(),
            provider,
            surface,
            session: WatchSession::new(hints, tuning),
            config,
            events: event_tx,
            commands: command_rx,
            cancel: cancel.clone(),
            destroyed: Arc::clone(&destroyed),
            instance_id: Uuid::new_v4(),
        };

        let handle = TrackerHandle {
            key,
            commands: command_tx,
            cancel,
            destroyed,
        };

        tokio::spawn(tracker.run());

        (handle, event_rx)
    }

    async fn run(mut self) {
        debug!(
            instance = %self.instance_id,
            module = %self.key.module_id,
            video = %self.key.video_id,
            provider = ?self.provider,
            "tracker starting"
        );

        if let Err(e) = self.surface.bind().await {
            // No crash and no retry storm: the host shows an empty player.
            warn!(error = %e, "backend bind failed, tracker stays inert");
            return;
        }
        self.session.bind();

        if let Some(duration) = self.surface.duration().await
            && self.session.set_duration(duration)
        {
            self.signal_completed();
        }

        // Resume-on-load. The widget takes its start offset immediately;
        // the native element cannot seek until metadata arrives.
        match self.provider {
            Provider::PollingWidget => self.apply_resume().await,
            Provider::NativeFile if self.session.duration_seconds() > 0.0 => {
                self.apply_resume().await
            }
            _ => {}
        }

        let tick_every = self.config.tick_interval();
        let emit_every = self.config.emit_interval();
        let mut tick = time::interval_at(time::Instant::now() + tick_every, tick_every);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut emit = time::interval_at(time::Instant::now() + emit_every, emit_every);
        emit.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = tick.tick() => {
                    if self.destroyed.load(Ordering::SeqCst) {
                        break;
                    }
                    self.on_tick().await;
                }
                _ = emit.tick() => {
                    if self.destroyed.load(Ordering::SeqCst) {
                        break;
                    }
                    self.emit_progress();
                }
                command = self.commands.recv() => {
                    match command {
                        Some(command) => {
                            if !self.handle_command(command).await {
                                break;
                            }
                        }
                        None => break,
                    }
                }
            }
        }

        self.surface.teardown().await;
        debug!(instance = %self.instance_id, "tracker stopped");
    }

    /// One accrual/poll tick. Surface queries that fail are "no sample this
    /// tick"; tracking must never crash the player.
    async fn on_tick(&mut self) {
        let now = tick_now();

        if self.session.duration_seconds() <= 0.0
            && let Some(duration) = self.surface.duration().await
            && self.session.set_duration(duration)
        {
            self.signal_completed();
        }

        match self.provider {
            Provider::NativeFile => self.session.accrue(now),
            Provider::PollingWidget => {
                if !self.session.is_playing() {
                    return;
                }
                let sampled = self.surface.position().await;
                trace!(?sampled, "widget poll");
                if self.session.poll_position(sampled, now) {
                    self.signal_completed();
                }
            }
            Provider::OpaqueEmbed => {}
        }
    }

    async fn handle_command(&mut self, command: TrackerCommand) -> bool {
        match command {
            TrackerCommand::Surface(event) => {
                self.handle_surface_event(event).await;
                true
            }
            TrackerCommand::LateResume { position_seconds } => {
                if let Some(target) = self.session.late_resume(position_seconds) {
                    debug!(target, "applying late resume");
                    if let Err(e) = self.surface.seek(target).await {
                        debug!(error = %e, "late resume seek failed");
                    }
                }
                true
            }
            TrackerCommand::Flush => {
                self.emit_progress();
                true
            }
            TrackerCommand::Shutdown => false,
        }
    }

    async fn handle_surface_event(&mut self, event: SurfaceEvent) {
        match event {
            SurfaceEvent::MetadataLoaded { duration_seconds } => {
                if self.session.set_duration(duration_seconds) {
                    self.signal_completed();
                }
                if self.provider == Provider::NativeFile && !self.session.resume_applied() {
                    self.apply_resume().await;
                }
            }
            SurfaceEvent::Play => self.session.on_play(tick_now()),
            SurfaceEvent::Pause => {
                self.session.on_pause();
                self.emit_progress();
            }
            SurfaceEvent::Seeking { target_seconds } => {
                // Anti-skip applies to the native backend only; the polling
                // widget cannot reliably report scrubbing and is exempt.
                if self.provider == Provider::NativeFile
                    && let SeekVerdict::SnapBack(to) = self.session.check_seek(target_seconds)
                {
                    debug!(
                        target = target_seconds,
                        snap_to = to,
                        "seek past max-reached, snapping back"
                    );
                    if let Err(e) = self.surface.seek(to).await {
                        debug!(error = %e, "snap-back seek failed");
                    }
                }
            }
            SurfaceEvent::TimeUpdate { position_seconds } => {
                if self.session.observe_position(position_seconds) {
                    self.signal_completed();
                }
            }
            SurfaceEvent::Ended => {
                self.session.on_ended();
                self.emit_progress();
                let _ = self.events.send(TrackerEvent::Ended(self.session.snapshot()));
            }
        }
    }

    async fn apply_resume(&mut self) {
        if let Some(target) = self.session.resume_position() {
            debug!(target, "resuming at saved position");
            if let Err(e) = self.surface.seek(target).await {
                debug!(error = %e, "resume seek failed");
            }
            self.session.mark_resume_applied();
        }
    }

    fn emit_progress(&self) {
        let _ = self.events.send(TrackerEvent::Progress(self.session.snapshot()));
    }

    /// Completion crossed: force an emission regardless of the cadence, then
    /// fire the one-shot completed signal.
    fn signal_completed(&mut self) {
        self.emit_progress();
        let _ = self.events.send(TrackerEvent::Completed(self.session.snapshot()));
    }
}

fn tick_now() -> Instant {
    time::Instant::now().into_std()
}
