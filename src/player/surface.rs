use anyhow::Result;
use async_trait::async_trait;

use super::provider::Provider;
use crate::models::ResumeHints;

/// Signals a playback surface pushes into its tracker. Native media elements
/// deliver the full set; polling widgets only deliver the coarse state
/// transitions (`Play`, `Pause`, `Ended`) from their state callback.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    /// Media metadata arrived; duration is now known.
    MetadataLoaded { duration_seconds: f64 },
    Play,
    Pause,
    /// User-initiated seek reported by the backend (native only).
    Seeking { target_seconds: f64 },
    /// Position sample pushed by the backend (native `timeupdate`).
    TimeUpdate { position_seconds: f64 },
    Ended,
}

/// Narrow interface over one concrete playback backend handle.
///
/// The embedding application provides implementations for its real media
/// element and widget surfaces; the engine only relies on this contract.
/// Query methods return `None` on failure so a throwing backend never
/// propagates into the tracker; a failed query is "no data this tick".
#[async_trait]
pub trait PlaybackSurface: Send {
    /// Attach the concrete backend handle. For widget surfaces this includes
    /// waiting (bounded) for the external script; an error leaves the
    /// tracker inert rather than crashing the player.
    async fn bind(&mut self) -> Result<()>;

    /// Current playback position in seconds, if the backend answered.
    async fn position(&self) -> Option<f64>;

    /// Media duration in seconds, if known yet.
    async fn duration(&self) -> Option<f64>;

    /// Move playback to the given position. Best effort.
    async fn seek(&self, seconds: f64) -> Result<()>;

    /// Release the backend handle. Must be idempotent.
    async fn teardown(&mut self);
}

/// Constructs the concrete surface for a (provider, url) pair. Injected by
/// the embedding application; the factory in `player::mount` is the single
/// dispatch point that decides whether a surface is needed at all.
pub trait SurfaceFactory: Send + Sync {
    fn create(
        &self,
        provider: Provider,
        url: &str,
        hints: &ResumeHints,
    ) -> Result<Box<dyn PlaybackSurface>>;
}
