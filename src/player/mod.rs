pub mod mount;
pub mod provider;
pub mod session;
pub mod surface;
pub mod tracker;
pub mod widget;
pub mod widget_api;

pub use mount::{PlayerMount, mount_video};
pub use provider::{Provider, classify, embed_url, format_duration, parse_duration};
pub use session::{Phase, SeekVerdict, SessionTuning, WatchSession};
pub use surface::{PlaybackSurface, SurfaceEvent, SurfaceFactory};
pub use tracker::{Tracker, TrackerEvent, TrackerHandle};
pub use widget::{WidgetPlayer, WidgetPlayerFactory, WidgetSurface};
pub use widget_api::{ScriptProbe, ScriptState, WidgetScriptLoader};
