//! Playback host: wires the tracker for the active (module, video) to the
//! persistence gateway and the embedding UI, and owns the mount/unmount and
//! switch lifecycle. At most one tracker is live at a time; switching tears
//! the current one down before the next is constructed.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::api::SaveVideoProgress;
use crate::config::Config;
use crate::error::EngineError;
use crate::models::{
    Course, CourseId, Enrollment, ModuleId, ProgressKey, ProgressSnapshot, VideoId, VideoRef,
};
use crate::player::mount::{PlayerMount, mount_video};
use crate::player::surface::{SurfaceEvent, SurfaceFactory};
use crate::player::tracker::{TrackerEvent, TrackerHandle};
use crate::progress::{self, ResumeTarget};
use crate::sync::{ProgressSyncGateway, ProgressWriter, SyncNotice};

/// Events the host surfaces to the embedding UI.
#[derive(Debug, Clone)]
pub enum HostEvent {
    Progress {
        module_id: ModuleId,
        video_id: VideoId,
        snapshot: ProgressSnapshot,
    },
    /// The active video crossed the watch threshold (one-shot per session).
    VideoCompleted { module_id: ModuleId, video_id: VideoId },
    /// Backend-native end of the active video.
    VideoEnded { module_id: ModuleId, video_id: VideoId },
    /// Every video of the module has crossed the watch threshold.
    ModuleCompleted { module_id: ModuleId },
    /// The last video of the module finished playing (distinct from
    /// `ModuleCompleted`: finishing playback is not the 95% watch rule).
    ModuleFinished { module_id: ModuleId },
    /// Auto-advance target after a video ends.
    AdvanceTo { module_id: ModuleId, video_id: VideoId },
    /// Non-blocking toast; playback is unaffected.
    SaveFailed { message: String },
    /// The authoritative enrollment should be refetched.
    RefreshEnrollment,
}

struct TrackedMount {
    module_id: ModuleId,
    video_id: VideoId,
    handle: TrackerHandle,
}

enum ActivePlayer {
    Tracked(TrackedMount),
    /// Opaque embed or document-only module: rendered without progress UI.
    Untracked {
        module_id: ModuleId,
        video_id: Option<VideoId>,
        embed_url: Option<String>,
    },
}

pub struct PlaybackHost {
    course: Course,
    enrollment: Option<Enrollment>,
    config: Config,
    surfaces: Arc<dyn SurfaceFactory>,
    gateway: Arc<ProgressSyncGateway>,
    events: mpsc::UnboundedSender<HostEvent>,
    active: Option<ActivePlayer>,
}

impl PlaybackHost {
    /// Build a host for one open course. The enrollment may arrive later
    /// (`apply_enrollment`); free-preview modules are playable without one.
    pub fn new(
        course: Course,
        enrollment: Option<Enrollment>,
        config: Config,
        surfaces: Arc<dyn SurfaceFactory>,
        writer: Arc<dyn ProgressWriter>,
    ) -> (Self, mpsc::UnboundedReceiver<HostEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (gateway, notices) =
            ProgressSyncGateway::new(course.id.clone(), writer, config.sync.clone());

        Self::spawn_notice_pump(notices, events_tx.clone());

        let host = Self {
            course,
            enrollment,
            config,
            surfaces,
            gateway,
            events: events_tx,
            active: None,
        };
        (host, events_rx)
    }

    fn spawn_notice_pump(
        mut notices: mpsc::UnboundedReceiver<SyncNotice>,
        events: mpsc::UnboundedSender<HostEvent>,
    ) {
        tokio::spawn(async move {
            while let Some(notice) = notices.recv().await {
                let event = match notice {
                    SyncNotice::SaveFailed { error, .. } => HostEvent::SaveFailed { message: error },
                    SyncNotice::RefreshSuggested => HostEvent::RefreshEnrollment,
                };
                if events.send(event).is_err() {
                    break;
                }
            }
        });
    }

    pub fn course_id(&self) -> &CourseId {
        &self.course.id
    }

    /// Where to drop the student when the course opens.
    pub fn resume_point(&self) -> Option<ResumeTarget> {
        progress::resume_target(&self.course, self.enrollment.as_ref())
    }

    /// Authoritative course percentage from the enrollment record.
    pub fn course_percent(&self) -> u32 {
        self.enrollment.as_ref().map(|e| e.progress).unwrap_or(0)
    }

    /// Locally recomputed course percentage for display between refreshes.
    pub fn estimated_course_percent(&self) -> u32 {
        match &self.enrollment {
            Some(enrollment) => progress::course_progress_percent(&self.course, enrollment),
            None => 0,
        }
    }

    pub fn module_percent(&self, module_id: &ModuleId) -> u32 {
        let Some(module) = self.course.module(module_id) else {
            return 0;
        };
        progress::module_completion_percent(
            &progress::module_videos(module),
            self.enrollment
                .as_ref()
                .and_then(|e| e.module_progress.get(module_id)),
        )
    }

    fn can_access(&self, module_id: &ModuleId) -> bool {
        self.course
            .module(module_id)
            .map(|m| m.is_free || self.enrollment.is_some())
            .unwrap_or(false)
    }

    /// Mount a tracker for one video. Tears down whatever was mounted.
    pub fn mount(&mut self, module_id: &ModuleId, video_id: &VideoId) -> Result<()> {
        self.unmount();

        let module = self
            .course
            .module(module_id)
            .ok_or_else(|| EngineError::UnknownTarget(module_id.to_string()))?;
        if !module.is_free && self.enrollment.is_none() {
            return Err(EngineError::Locked.into());
        }

        let videos = progress::module_videos(module);
        let video = videos
            .iter()
            .find(|v| &v.id == video_id)
            .ok_or_else(|| EngineError::UnknownTarget(video_id.to_string()))?
            .clone();

        let hints = progress::resume_hints(self.enrollment.as_ref(), module_id, video_id);
        let key = ProgressKey::new(module_id.clone(), video_id.clone());

        info!(module = %module_id, video = %video_id, "mounting player");
        let mount = mount_video(
            self.surfaces.as_ref(),
            key,
            &video.url,
            hints,
            &self.config.tracker,
        )
        .context("failed to mount playback surface")?;

        self.active = Some(match mount {
            PlayerMount::Tracked { handle, events } => {
                self.spawn_forwarder(module_id.clone(), video_id.clone(), videos, events);
                ActivePlayer::Tracked(TrackedMount {
                    module_id: module_id.clone(),
                    video_id: video_id.clone(),
                    handle,
                })
            }
            PlayerMount::Untracked { embed_url } => ActivePlayer::Untracked {
                module_id: module_id.clone(),
                video_id: Some(video_id.clone()),
                embed_url,
            },
        });
        Ok(())
    }

    /// Tear down the active tracker synchronously. Its timers cannot fire
    /// afterwards; in-flight persistence writes are left to finish on their
    /// own (they are keyed and cannot clobber the next video's writes).
    pub fn unmount(&mut self) {
        if let Some(ActivePlayer::Tracked(mount)) = self.active.take() {
            debug!(module = %mount.module_id, video = %mount.video_id, "unmounting player");
            mount.handle.teardown();
        }
    }

    /// Switch to another video of the current module.
    pub fn switch_video(&mut self, video_id: &VideoId) -> Result<()> {
        let module_id = self
            .active_module()
            .ok_or_else(|| EngineError::UnknownTarget("no active module".into()))?;
        self.mount(&module_id, video_id)
    }

    /// Switch modules, landing on the module's last-watched video (or its
    /// first). A module with no playable videos mounts as an empty pane and
    /// completes on this first visit.
    pub fn switch_module(&mut self, module_id: &ModuleId) -> Result<()> {
        let module = self
            .course
            .module(module_id)
            .ok_or_else(|| EngineError::UnknownTarget(module_id.to_string()))?;
        if !self.can_access(module_id) {
            return Err(EngineError::Locked.into());
        }

        let videos = progress::module_videos(module);
        if videos.is_empty() {
            self.unmount();
            self.active = Some(ActivePlayer::Untracked {
                module_id: module_id.clone(),
                video_id: None,
                embed_url: None,
            });
            self.complete_module_on_visit(module_id);
            return Ok(());
        }

        let target = self
            .enrollment
            .as_ref()
            .and_then(|e| e.module_progress.get(module_id))
            .and_then(|p| p.last_video_id.clone())
            .filter(|id| videos.iter().any(|v| &v.id == id))
            .unwrap_or_else(|| videos[0].id.clone());
        self.mount(module_id, &target)
    }

    /// Document-only modules have no watch threshold to cross; visiting
    /// them is the completion criterion.
    fn complete_module_on_visit(&self, module_id: &ModuleId) {
        let Some(enrollment) = &self.enrollment else {
            return;
        };
        let already = enrollment.completed_modules.contains(module_id)
            || enrollment
                .module_progress
                .get(module_id)
                .map(|p| p.completed)
                .unwrap_or(false);
        if !already {
            info!(module = %module_id, "document-only module visited, marking complete");
            self.gateway.complete_module(module_id.clone());
            let _ = self.events.send(HostEvent::ModuleCompleted {
                module_id: module_id.clone(),
            });
        }
    }

    /// Forward a backend signal into the active tracker. The embedding UI
    /// calls this from its media element / widget callbacks.
    pub fn surface_event(&self, event: SurfaceEvent) {
        if let Some(ActivePlayer::Tracked(mount)) = &self.active {
            mount.handle.surface_event(event);
        }
    }

    /// Force a progress emission outside the normal cadence.
    pub fn flush_progress(&self) {
        if let Some(ActivePlayer::Tracked(mount)) = &self.active {
            mount.handle.flush();
        }
    }

    /// Fresh authoritative enrollment arrived. If a tracker is already
    /// bound, its resume hint is applied through the one-shot late-resume
    /// path instead of rebuilding the tracker.
    pub fn apply_enrollment(&mut self, enrollment: Enrollment) {
        if let Some(ActivePlayer::Tracked(mount)) = &self.active {
            let hints =
                progress::resume_hints(Some(&enrollment), &mount.module_id, &mount.video_id);
            if hints.last_position_seconds > 0.0 {
                mount.handle.late_resume(hints.last_position_seconds);
            }
        }
        self.enrollment = Some(enrollment);
    }

    pub fn enrollment(&self) -> Option<&Enrollment> {
        self.enrollment.as_ref()
    }

    pub fn active_module(&self) -> Option<ModuleId> {
        match &self.active {
            Some(ActivePlayer::Tracked(mount)) => Some(mount.module_id.clone()),
            Some(ActivePlayer::Untracked { module_id, .. }) => Some(module_id.clone()),
            None => None,
        }
    }

    pub fn active_video(&self) -> Option<VideoId> {
        match &self.active {
            Some(ActivePlayer::Tracked(mount)) => Some(mount.video_id.clone()),
            Some(ActivePlayer::Untracked { video_id, .. }) => video_id.clone(),
            None => None,
        }
    }

    /// Embed URL for an untracked mount, if any.
    pub fn active_embed_url(&self) -> Option<&str> {
        match &self.active {
            Some(ActivePlayer::Untracked { embed_url, .. }) => embed_url.as_deref(),
            _ => None,
        }
    }

    /// Last-resort best-effort write on page unload.
    pub async fn on_unload(&self) {
        self.gateway.flush_on_unload().await;
    }

    fn spawn_forwarder(
        &self,
        module_id: ModuleId,
        video_id: VideoId,
        videos: Vec<VideoRef>,
        mut tracker_events: mpsc::UnboundedReceiver<TrackerEvent>,
    ) {
        let gateway = Arc::clone(&self.gateway);
        let events = self.events.clone();
        let current_index = progress::video_index(&videos, &video_id);

        // Whether this video is the last hold-out for module completion,
        // judged from the enrollment snapshot taken at mount time (other
        // videos cannot change while this one is on screen).
        let others_completed = {
            let module_progress = self
                .enrollment
                .as_ref()
                .and_then(|e| e.module_progress.get(&module_id));
            videos.iter().filter(|v| v.id != video_id).all(|v| {
                module_progress
                    .and_then(|p| p.videos.get(&v.id))
                    .map(|p| p.completed)
                    .unwrap_or(false)
            })
        };

        tokio::spawn(async move {
            while let Some(event) = tracker_events.recv().await {
                match event {
                    TrackerEvent::Progress(snapshot) => {
                        gateway.report(payload(&module_id, &video_id, &snapshot));
                        let _ = events.send(HostEvent::Progress {
                            module_id: module_id.clone(),
                            video_id: video_id.clone(),
                            snapshot,
                        });
                    }
                    TrackerEvent::Completed(_snapshot) => {
                        let _ = events.send(HostEvent::VideoCompleted {
                            module_id: module_id.clone(),
                            video_id: video_id.clone(),
                        });
                        if others_completed {
                            gateway.complete_module(module_id.clone());
                            let _ = events.send(HostEvent::ModuleCompleted {
                                module_id: module_id.clone(),
                            });
                        }
                    }
                    TrackerEvent::Ended(snapshot) => {
                        gateway.report(payload(&module_id, &video_id, &snapshot));
                        let _ = events.send(HostEvent::VideoEnded {
                            module_id: module_id.clone(),
                            video_id: video_id.clone(),
                        });
                        match current_index.and_then(|i| progress::next_video(&videos, i)) {
                            Some(next) => {
                                let _ = events.send(HostEvent::AdvanceTo {
                                    module_id: module_id.clone(),
                                    video_id: next.id.clone(),
                                });
                            }
                            None => {
                                let _ = events.send(HostEvent::ModuleFinished {
                                    module_id: module_id.clone(),
                                });
                                let _ = events.send(HostEvent::RefreshEnrollment);
                            }
                        }
                    }
                }
            }
        });
    }
}

fn payload(module_id: &ModuleId, video_id: &VideoId, snapshot: &ProgressSnapshot) -> SaveVideoProgress {
    SaveVideoProgress {
        module_id: module_id.clone(),
        video_id: video_id.clone(),
        watched_seconds: snapshot.watched_seconds,
        max_reached_seconds: snapshot.max_reached_seconds,
        duration: snapshot.duration_seconds,
        last_position: snapshot.current_position,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Module, ModuleProgress, VideoProgress};
    use crate::player::provider::Provider;
    use crate::player::surface::PlaybackSurface;
    use crate::models::ResumeHints;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct NullSurface;

    #[async_trait]
    impl PlaybackSurface for NullSurface {
        async fn bind(&mut self) -> Result<()> {
            Ok(())
        }
        async fn position(&self) -> Option<f64> {
            None
        }
        async fn duration(&self) -> Option<f64> {
            None
        }
        async fn seek(&self, _seconds: f64) -> Result<()> {
            Ok(())
        }
        async fn teardown(&mut self) {}
    }

    struct NullFactory;

    impl SurfaceFactory for NullFactory {
        fn create(
            &self,
            _provider: Provider,
            _url: &str,
            _hints: &ResumeHints,
        ) -> Result<Box<dyn PlaybackSurface>> {
            Ok(Box::new(NullSurface))
        }
    }

    #[derive(Default)]
    struct RecordingWriter {
        saves: Mutex<Vec<SaveVideoProgress>>,
        completions: Mutex<Vec<ModuleId>>,
    }

    #[async_trait]
    impl ProgressWriter for RecordingWriter {
        async fn save(
            &self,
            _course_id: &CourseId,
            progress: &SaveVideoProgress,
        ) -> anyhow::Result<()> {
            self.saves.lock().unwrap().push(progress.clone());
            Ok(())
        }

        async fn complete_module(
            &self,
            _course_id: &CourseId,
            module_id: &ModuleId,
        ) -> anyhow::Result<()> {
            self.completions.lock().unwrap().push(module_id.clone());
            Ok(())
        }
    }

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("atril=debug")
            .with_test_writer()
            .try_init();
    }

    fn video(id: &str, order: u32) -> VideoRef {
        VideoRef {
            id: VideoId::new(id),
            url: format!("https://cdn.courses.example/{id}.mp4"),
            title: id.to_string(),
            order,
            duration_seconds: 100.0,
        }
    }

    fn course() -> Course {
        Course {
            id: CourseId::new("c1"),
            title: "Course".into(),
            modules: vec![
                Module {
                    id: ModuleId::new("m1"),
                    number: 1,
                    title: "Module 1".into(),
                    videos: vec![video("v1", 0), video("v2", 1)],
                    video_url: None,
                    video_duration: None,
                    is_free: true,
                },
                Module {
                    id: ModuleId::new("docs"),
                    number: 2,
                    title: "Reading".into(),
                    videos: vec![],
                    video_url: None,
                    video_duration: None,
                    is_free: false,
                },
            ],
        }
    }

    fn enrollment() -> Enrollment {
        serde_json::from_value(serde_json::json!({ "id": "e1", "courseId": "c1" })).unwrap()
    }

    fn host_with(
        enrollment: Option<Enrollment>,
    ) -> (PlaybackHost, mpsc::UnboundedReceiver<HostEvent>, Arc<RecordingWriter>) {
        init_tracing();
        let writer = Arc::new(RecordingWriter::default());
        let (host, events) = PlaybackHost::new(
            course(),
            enrollment,
            Config::default(),
            Arc::new(NullFactory),
            Arc::clone(&writer) as Arc<dyn ProgressWriter>,
        );
        (host, events, writer)
    }

    async fn next_host_event(rx: &mut mpsc::UnboundedReceiver<HostEvent>) -> HostEvent {
        tokio::time::timeout(std::time::Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for host event")
            .expect("host event stream closed")
    }

    #[tokio::test(start_paused = true)]
    async fn test_ended_advances_to_next_video() {
        let (mut host, mut events, _writer) = host_with(None);
        host.mount(&ModuleId::new("m1"), &VideoId::new("v1")).unwrap();

        host.surface_event(SurfaceEvent::MetadataLoaded { duration_seconds: 100.0 });
        host.surface_event(SurfaceEvent::Ended);

        let mut saw_ended = false;
        loop {
            match next_host_event(&mut events).await {
                HostEvent::VideoEnded { video_id, .. } => {
                    assert_eq!(video_id.as_str(), "v1");
                    saw_ended = true;
                }
                HostEvent::AdvanceTo { video_id, .. } => {
                    assert!(saw_ended);
                    assert_eq!(video_id.as_str(), "v2");
                    break;
                }
                _ => {}
            }
        }
        host.unmount();
    }

    #[tokio::test(start_paused = true)]
    async fn test_ended_on_last_video_finishes_module() {
        let (mut host, mut events, _writer) = host_with(None);
        host.mount(&ModuleId::new("m1"), &VideoId::new("v2")).unwrap();

        host.surface_event(SurfaceEvent::Ended);

        let mut saw_finished = false;
        loop {
            match next_host_event(&mut events).await {
                HostEvent::ModuleFinished { module_id } => {
                    assert_eq!(module_id.as_str(), "m1");
                    saw_finished = true;
                }
                HostEvent::RefreshEnrollment => {
                    if saw_finished {
                        break;
                    }
                }
                _ => {}
            }
        }
        host.unmount();
    }

    #[tokio::test(start_paused = true)]
    async fn test_completion_of_last_holdout_completes_module() {
        let mut e = enrollment();
        let mut videos = HashMap::new();
        videos.insert(
            VideoId::new("v2"),
            VideoProgress {
                completed: true,
                max_reached_seconds: 96.0,
                duration_seconds: 100.0,
                ..VideoProgress::default()
            },
        );
        videos.insert(
            VideoId::new("v1"),
            VideoProgress {
                max_reached_seconds: 94.0,
                last_position_seconds: 94.0,
                duration_seconds: 100.0,
                ..VideoProgress::default()
            },
        );
        e.module_progress.insert(
            ModuleId::new("m1"),
            ModuleProgress {
                videos,
                completed: false,
                last_video_id: Some(VideoId::new("v1")),
            },
        );

        let (mut host, mut events, writer) = host_with(Some(e));
        host.switch_module(&ModuleId::new("m1")).unwrap();
        assert_eq!(host.active_video().unwrap().as_str(), "v1");

        host.surface_event(SurfaceEvent::MetadataLoaded { duration_seconds: 100.0 });
        host.surface_event(SurfaceEvent::TimeUpdate { position_seconds: 95.5 });

        let mut saw_video_completed = false;
        loop {
            match next_host_event(&mut events).await {
                HostEvent::VideoCompleted { video_id, .. } => {
                    assert_eq!(video_id.as_str(), "v1");
                    saw_video_completed = true;
                }
                HostEvent::ModuleCompleted { module_id } => {
                    assert!(saw_video_completed);
                    assert_eq!(module_id.as_str(), "m1");
                    break;
                }
                _ => {}
            }
        }

        for _ in 0..100 {
            if !writer.completions.lock().unwrap().is_empty() {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(
            writer.completions.lock().unwrap().clone(),
            vec![ModuleId::new("m1")]
        );
        host.unmount();
    }

    #[tokio::test(start_paused = true)]
    async fn test_locked_module_refuses_mount() {
        let course = Course {
            id: CourseId::new("c1"),
            title: "Course".into(),
            modules: vec![Module {
                id: ModuleId::new("m1"),
                number: 1,
                title: "Paid".into(),
                videos: vec![video("v1", 0)],
                video_url: None,
                video_duration: None,
                is_free: false,
            }],
        };
        let writer = Arc::new(RecordingWriter::default());
        let (mut host, _events) = PlaybackHost::new(
            course,
            None,
            Config::default(),
            Arc::new(NullFactory),
            writer as Arc<dyn ProgressWriter>,
        );

        let err = host
            .mount(&ModuleId::new("m1"), &VideoId::new("v1"))
            .unwrap_err();
        assert!(err.downcast_ref::<EngineError>().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_document_only_module_completes_on_visit() {
        let (mut host, mut events, writer) = host_with(Some(enrollment()));
        host.switch_module(&ModuleId::new("docs")).unwrap();

        assert!(host.active_video().is_none());
        match next_host_event(&mut events).await {
            HostEvent::ModuleCompleted { module_id } => {
                assert_eq!(module_id.as_str(), "docs");
            }
            other => panic!("expected ModuleCompleted, got {other:?}"),
        }

        for _ in 0..100 {
            if !writer.completions.lock().unwrap().is_empty() {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(
            writer.completions.lock().unwrap().clone(),
            vec![ModuleId::new("docs")]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_progress_events_reach_gateway() {
        let (mut host, mut events, writer) = host_with(None);
        host.mount(&ModuleId::new("m1"), &VideoId::new("v1")).unwrap();

        host.surface_event(SurfaceEvent::MetadataLoaded { duration_seconds: 100.0 });
        host.surface_event(SurfaceEvent::TimeUpdate { position_seconds: 1.5 });
        host.flush_progress();

        loop {
            if let HostEvent::Progress { snapshot, .. } = next_host_event(&mut events).await {
                assert_eq!(snapshot.duration_seconds, 100.0);
                break;
            }
        }

        for _ in 0..100 {
            if !writer.saves.lock().unwrap().is_empty() {
                break;
            }
            tokio::task::yield_now().await;
        }
        let saves = writer.saves.lock().unwrap().clone();
        assert_eq!(saves[0].video_id.as_str(), "v1");
        assert_eq!(saves[0].last_position, 1.5);
        host.unmount();
    }

    #[tokio::test(start_paused = true)]
    async fn test_unload_flush_goes_through_gateway() {
        let (mut host, _events, writer) = host_with(None);
        host.mount(&ModuleId::new("m1"), &VideoId::new("v1")).unwrap();

        host.surface_event(SurfaceEvent::MetadataLoaded { duration_seconds: 100.0 });
        host.surface_event(SurfaceEvent::TimeUpdate { position_seconds: 7.0 });
        host.flush_progress();

        for _ in 0..100 {
            if !writer.saves.lock().unwrap().is_empty() {
                break;
            }
            tokio::task::yield_now().await;
        }

        host.on_unload().await;
        let saves = writer.saves.lock().unwrap().clone();
        assert!(saves.len() >= 2);
        assert_eq!(saves.last().unwrap().last_position, 7.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_switch_module_lands_on_last_watched_video() {
        let mut e = enrollment();
        e.module_progress.insert(
            ModuleId::new("m1"),
            ModuleProgress {
                videos: HashMap::new(),
                completed: false,
                last_video_id: Some(VideoId::new("v2")),
            },
        );

        let (mut host, _events, _writer) = host_with(Some(e));
        host.switch_module(&ModuleId::new("m1")).unwrap();
        assert_eq!(host.active_video().unwrap().as_str(), "v2");
        host.unmount();
    }
}
