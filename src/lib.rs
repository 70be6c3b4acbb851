//! atril — video playback progress tracking and resume engine for an
//! online-course platform.
//!
//! The crate is headless: the embedding UI provides concrete playback
//! surfaces and renders from [`host::HostEvent`]s; everything with timing or
//! state-machine concerns lives here. See `DESIGN.md` for the layout.

pub mod api;
pub mod config;
pub mod error;
pub mod host;
pub mod models;
pub mod player;
pub mod progress;
pub mod sync;

pub use config::Config;
pub use error::EngineError;
pub use host::{HostEvent, PlaybackHost};
pub use models::{
    Course, CourseId, Enrollment, Module, ModuleId, ModuleProgress, ProgressKey, ProgressSnapshot,
    ResumeHints, VideoId, VideoProgress, VideoRef,
};
pub use player::{PlaybackSurface, Provider, SurfaceEvent, SurfaceFactory, TrackerHandle};
pub use sync::{ProgressSyncGateway, ProgressWriter, SyncNotice};
