use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, trace};

use super::surface::PlaybackSurface;
use super::widget_api::WidgetScriptLoader;

/// Imperative handle on one live embedded widget player. The widget offers
/// no continuous event stream; only these queries and coarse state
/// callbacks, which the embedding application forwards as `SurfaceEvent`s.
#[async_trait]
pub trait WidgetPlayer: Send + Sync {
    /// Current time in seconds. `None` on a thrown/transient API error.
    async fn current_time(&self) -> Option<f64>;

    /// Duration in seconds. `None` until the widget knows it.
    async fn duration(&self) -> Option<f64>;

    async fn seek_to(&self, seconds: f64) -> Result<()>;

    async fn destroy(&self);
}

/// Creates widget players once the external script is ready. Injected by
/// the embedding application.
#[async_trait]
pub trait WidgetPlayerFactory: Send + Sync {
    async fn create_player(&self, url: &str, start_seconds: f64)
    -> Result<Box<dyn WidgetPlayer>>;
}

/// `PlaybackSurface` over an embedded widget player.
///
/// Binding waits (bounded) on the shared script loader and then constructs
/// the player, passing the resume position as the start offset the way the
/// widget expects it. If the script never loads, `bind` errors and the
/// tracker stays inert.
pub struct WidgetSurface {
    loader: Arc<WidgetScriptLoader>,
    factory: Arc<dyn WidgetPlayerFactory>,
    url: String,
    start_seconds: f64,
    player: Option<Box<dyn WidgetPlayer>>,
}

impl WidgetSurface {
    pub fn new(
        loader: Arc<WidgetScriptLoader>,
        factory: Arc<dyn WidgetPlayerFactory>,
        url: impl Into<String>,
        start_seconds: f64,
    ) -> Self {
        Self {
            loader,
            factory,
            url: url.into(),
            start_seconds: start_seconds.max(0.0),
            player: None,
        }
    }
}

#[async_trait]
impl PlaybackSurface for WidgetSurface {
    async fn bind(&mut self) -> Result<()> {
        self.loader
            .ensure_ready()
            .await
            .context("widget script unavailable")?;

        let player = self
            .factory
            .create_player(&self.url, self.start_seconds)
            .await
            .context("failed to create widget player")?;
        debug!(url = %self.url, start = self.start_seconds, "widget player created");
        self.player = Some(player);
        Ok(())
    }

    async fn position(&self) -> Option<f64> {
        self.player.as_ref()?.current_time().await
    }

    async fn duration(&self) -> Option<f64> {
        self.player.as_ref()?.duration().await
    }

    async fn seek(&self, seconds: f64) -> Result<()> {
        match &self.player {
            Some(player) => player.seek_to(seconds).await,
            // Not created yet; the start offset already covers resume.
            None => {
                trace!("seek before widget player creation, ignored");
                Ok(())
            }
        }
    }

    async fn teardown(&mut self) {
        if let Some(player) = self.player.take() {
            player.destroy().await;
        }
    }
}
