use anyhow::Result;
use tokio::sync::mpsc;

use super::provider::{self, Provider};
use super::surface::SurfaceFactory;
use super::tracker::{Tracker, TrackerEvent, TrackerHandle};
use crate::config::TrackerConfig;
use crate::models::{ProgressKey, ResumeHints};

/// Result of mounting one video: either a live tracker or a pass-through
/// embed with no progress contract.
pub enum PlayerMount {
    Tracked {
        handle: TrackerHandle,
        events: mpsc::UnboundedReceiver<TrackerEvent>,
    },
    /// Opaque embed or missing URL; rendered without any progress UI.
    Untracked { embed_url: Option<String> },
}

/// The single dispatch point from URL to playback strategy. Classifies the
/// URL, builds the matching surface through the injected factory and spawns
/// the tracker; opaque embeds never get a tracker at all.
pub fn mount_video(
    surfaces: &dyn SurfaceFactory,
    key: ProgressKey,
    url: &str,
    hints: ResumeHints,
    config: &TrackerConfig,
) -> Result<PlayerMount> {
    if url.is_empty() {
        return Ok(PlayerMount::Untracked { embed_url: None });
    }

    let provider = provider::classify(url);
    match provider {
        Provider::OpaqueEmbed => Ok(PlayerMount::Untracked {
            embed_url: provider::embed_url(url),
        }),
        Provider::NativeFile | Provider::PollingWidget => {
            let surface = surfaces.create(provider, url, &hints)?;
            let (handle, events) = Tracker::spawn(key, provider, surface, hints, config.clone());
            Ok(PlayerMount::Tracked { handle, events })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::surface::PlaybackSurface;
    use async_trait::async_trait;

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

    #[tokio::test]
    async fn test_opaque_embed_gets_no_tracker() {
        let mount = mount_video(
            &NullFactory,
            ProgressKey::new("m1", "v1"),
            "https://prezi.com/p/abc123/",
            ResumeHints::default(),
            &TrackerConfig::default(),
        )
        .unwrap();

        match mount {
            PlayerMount::Untracked { embed_url } => {
                assert_eq!(embed_url.as_deref(), Some("https://prezi.com/p/embed/abc123/"));
            }
            PlayerMount::Tracked { .. } => panic!("opaque embed must not be tracked"),
        }
    }

    #[tokio::test]
    async fn test_empty_url_is_untracked() {
        let mount = mount_video(
            &NullFactory,
            ProgressKey::new("m1", "v1"),
            "",
            ResumeHints::default(),
            &TrackerConfig::default(),
        )
        .unwrap();

        assert!(matches!(mount, PlayerMount::Untracked { embed_url: None }));
    }

    #[tokio::test]
    async fn test_native_url_spawns_tracker() {
        let mount = mount_video(
            &NullFactory,
            ProgressKey::new("m1", "v1"),
            "https://cdn.courses.example/media/intro.mp4",
            ResumeHints::default(),
            &TrackerConfig::default(),
        )
        .unwrap();

        match mount {
            PlayerMount::Tracked { handle, .. } => {
                assert_eq!(handle.key().video_id.as_str(), "v1");
                handle.teardown();
            }
            PlayerMount::Untracked { .. } => panic!("native file must be tracked"),
        }
    }
}
