//! Persistence gateway: debounced, deduplicated, latest-wins delivery of
//! tracker snapshots to the enrollment store, plus the best-effort unload
//! flush. Writes are fire-and-forget from the tracker's perspective; a
//! failed save costs at most one emission interval of progress.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, error};

use crate::api::{EnrollmentsApi, SaveVideoProgress};
use crate::config::SyncConfig;
use crate::models::{CourseId, ModuleId, ProgressKey};

/// Write sink for progress snapshots. `EnrollmentsApi` is the production
/// implementation; tests inject a controllable fake.
#[async_trait]
pub trait ProgressWriter: Send + Sync {
    async fn save(&self, course_id: &CourseId, progress: &SaveVideoProgress)
    -> anyhow::Result<()>;

    async fn complete_module(
        &self,
        course_id: &CourseId,
        module_id: &ModuleId,
    ) -> anyhow::Result<()>;
}

#[async_trait]
impl ProgressWriter for EnrollmentsApi {
    async fn save(
        &self,
        course_id: &CourseId,
        progress: &SaveVideoProgress,
    ) -> anyhow::Result<()> {
        self.save_video_progress(course_id, progress).await
    }

    async fn complete_module(
        &self,
        course_id: &CourseId,
        module_id: &ModuleId,
    ) -> anyhow::Result<()> {
        EnrollmentsApi::complete_module(self, course_id, module_id)
            .await
            .map(|_| ())
    }
}

/// Non-blocking notices surfaced to the host UI.
#[derive(Debug, Clone)]
pub enum SyncNotice {
    /// A save failed; playback continues, the next cadence emission
    /// naturally retries with fresher data.
    SaveFailed { key: ProgressKey, error: String },
    /// A write landed; the host may refetch the authoritative enrollment.
    /// Rate-limited to one per rolling refresh window.
    RefreshSuggested,
}

#[derive(Default)]
struct KeyState {
    in_flight: Option<SaveVideoProgress>,
    pending: Option<SaveVideoProgress>,
}

/// Keyed write queue over the enrollment store.
///
/// Per key, one write is in flight at a time; an identical payload reported
/// while it flies is suppressed, a fresher one replaces whatever was queued
/// (latest wins, never reordered). Writes for different keys are fully
/// independent, so a video switch never clobbers the previous video's
/// in-flight write.
pub struct ProgressSyncGateway {
    course_id: CourseId,
    writer: Arc<dyn ProgressWriter>,
    config: SyncConfig,
    states: Mutex<HashMap<ProgressKey, KeyState>>,
    /// Side-channel slot holding the most recent snapshot for the unload
    /// flush.
    latest: Mutex<Option<SaveVideoProgress>>,
    last_refresh: Mutex<Option<Instant>>,
    notices: mpsc::UnboundedSender<SyncNotice>,
}

impl ProgressSyncGateway {
    pub fn new(
        course_id: CourseId,
        writer: Arc<dyn ProgressWriter>,
        config: SyncConfig,
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<SyncNotice>) {
        let (notices_tx, notices_rx) = mpsc::unbounded_channel();
        let gateway = Arc::new(Self {
            course_id,
            writer,
            config,
            states: Mutex::new(HashMap::new()),
            latest: Mutex::new(None),
            last_refresh: Mutex::new(None),
            notices: notices_tx,
        });
        (gateway, notices_rx)
    }

    /// Queue one snapshot for delivery. Returns immediately; the tracker
    /// never blocks on persistence.
    pub fn report(self: &Arc<Self>, snapshot: SaveVideoProgress) {
        let key = ProgressKey::new(snapshot.module_id.clone(), snapshot.video_id.clone());

        if let Ok(mut latest) = self.latest.lock() {
            *latest = Some(snapshot.clone());
        }

        let Ok(mut states) = self.states.lock() else {
            return;
        };
        let state = states.entry(key.clone()).or_default();

        if let Some(in_flight) = &state.in_flight {
            if *in_flight == snapshot {
                debug!(module = %key.module_id, video = %key.video_id,
                    "identical write in flight, suppressing");
                state.pending = None;
            } else {
                state.pending = Some(snapshot);
            }
            return;
        }

        state.in_flight = Some(snapshot.clone());
        drop(states);
        self.spawn_writer(key, snapshot);
    }

    fn spawn_writer(self: &Arc<Self>, key: ProgressKey, first: SaveVideoProgress) {
        let gateway = Arc::clone(self);
        tokio::spawn(async move {
            let mut current = first;
            loop {
                match gateway.writer.save(&gateway.course_id, &current).await {
                    Ok(()) => {
                        debug!(module = %key.module_id, video = %key.video_id,
                            "progress write landed");
                        gateway.suggest_refresh();
                    }
                    Err(e) => {
                        error!(module = %key.module_id, video = %key.video_id,
                            error = %e, "progress save failed");
                        let _ = gateway.notices.send(SyncNotice::SaveFailed {
                            key: key.clone(),
                            error: e.to_string(),
                        });
                    }
                }

                let Ok(mut states) = gateway.states.lock() else {
                    return;
                };
                let Some(state) = states.get_mut(&key) else {
                    return;
                };
                match state.pending.take() {
                    Some(next) => {
                        state.in_flight = Some(next.clone());
                        drop(states);
                        current = next;
                    }
                    None => {
                        state.in_flight = None;
                        return;
                    }
                }
            }
        });
    }

    fn suggest_refresh(&self) {
        let Ok(mut last) = self.last_refresh.lock() else {
            return;
        };
        let now = Instant::now();
        let due = last
            .map(|at| now.duration_since(at) >= self.config.refresh_window())
            .unwrap_or(true);
        if due {
            *last = Some(now);
            let _ = self.notices.send(SyncNotice::RefreshSuggested);
        }
    }

    /// Mark a module complete on the enrollment, fire-and-forget.
    pub fn complete_module(self: &Arc<Self>, module_id: ModuleId) {
        let gateway = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = gateway
                .writer
                .complete_module(&gateway.course_id, &module_id)
                .await
            {
                error!(module = %module_id, error = %e, "complete-module failed");
                let _ = gateway.notices.send(SyncNotice::SaveFailed {
                    key: ProgressKey::new(module_id, ""),
                    error: e.to_string(),
                });
            }
        });
    }

    pub fn latest_snapshot(&self) -> Option<SaveVideoProgress> {
        self.latest.lock().ok().and_then(|latest| latest.clone())
    }

    /// One last, connection-surviving write of the most recent snapshot at
    /// page unload. No retry, no error handling; a race against normal
    /// teardown is fine because the payload is idempotent server-side.
    pub async fn flush_on_unload(&self) {
        let Some(snapshot) = self.latest_snapshot() else {
            return;
        };
        debug!(module = %snapshot.module_id, video = %snapshot.video_id, "unload flush");
        let _ = tokio::time::timeout(
            self.config.unload_flush_timeout(),
            self.writer.save(&self.course_id, &snapshot),
        )
        .await;
    }
}
