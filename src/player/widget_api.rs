use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::OnceCell;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::error::EngineError;

/// Lifecycle of the external widget player script. The script is a
/// process-wide resource: any number of trackers may need it, but it must be
/// requested at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptState {
    NotRequested,
    Loading,
    Ready,
    Failed,
}

/// Hook into the environment that actually hosts the external script.
/// The embedding application injects the script tag and exposes the global
/// readiness flag; tests use a fake.
#[async_trait]
pub trait ScriptProbe: Send + Sync {
    /// Request the script load. Called at most once per process.
    async fn request_load(&self);

    /// Whether the external API object is available yet.
    async fn is_ready(&self) -> bool;
}

static GLOBAL_LOADER: OnceCell<WidgetScriptLoader> = OnceCell::new();

/// Process-wide initializer for the external widget script.
///
/// Subscribe-once-ready: every caller awaits the same load; concurrent
/// subscribers never trigger duplicate script loads. Readiness is polled on
/// a bounded cadence; exhausting the check budget transitions to `Failed`
/// permanently (no retry storm) and every subscriber gets the error.
pub struct WidgetScriptLoader {
    probe: Arc<dyn ScriptProbe>,
    state_tx: watch::Sender<ScriptState>,
    check_interval: Duration,
    max_checks: u32,
}

impl WidgetScriptLoader {
    pub fn new(probe: Arc<dyn ScriptProbe>, check_interval: Duration, max_checks: u32) -> Self {
        let (state_tx, _) = watch::channel(ScriptState::NotRequested);
        Self {
            probe,
            state_tx,
            check_interval,
            max_checks,
        }
    }

    /// The process-wide instance. The first caller's probe and tuning win;
    /// later calls get the existing loader.
    pub fn global(
        probe: Arc<dyn ScriptProbe>,
        check_interval: Duration,
        max_checks: u32,
    ) -> &'static Self {
        GLOBAL_LOADER.get_or_init(|| Self::new(probe, check_interval, max_checks))
    }

    pub fn state(&self) -> ScriptState {
        *self.state_tx.borrow()
    }

    /// Wait until the script is ready, kicking off the load if nobody has
    /// yet. Returns `EngineError::ScriptLoad` once the load is known failed.
    pub async fn ensure_ready(&self) -> Result<(), EngineError> {
        let mut rx = self.state_tx.subscribe();

        let should_start = {
            let mut start = false;
            self.state_tx.send_if_modified(|state| {
                if *state == ScriptState::NotRequested {
                    *state = ScriptState::Loading;
                    start = true;
                    true
                } else {
                    false
                }
            });
            start
        };

        if should_start {
            debug!("Requesting external widget script load");
            self.probe.request_load().await;
            self.spawn_readiness_poll();
        }

        loop {
            match *rx.borrow_and_update() {
                ScriptState::Ready => return Ok(()),
                ScriptState::Failed => return Err(EngineError::ScriptLoad),
                ScriptState::NotRequested | ScriptState::Loading => {}
            }
            if rx.changed().await.is_err() {
                return Err(EngineError::ScriptLoad);
            }
        }
    }

    fn spawn_readiness_poll(&self) {
        let probe = Arc::clone(&self.probe);
        let state_tx = self.state_tx.clone();
        let check_interval = self.check_interval;
        let max_checks = self.max_checks;

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(check_interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            for _ in 0..max_checks {
                interval.tick().await;
                if probe.is_ready().await {
                    debug!("External widget script ready");
                    let _ = state_tx.send(ScriptState::Ready);
                    return;
                }
            }

            warn!(
                "External widget script not ready after {} checks, giving up",
                max_checks
            );
            let _ = state_tx.send(ScriptState::Failed);
        });
    }
}
