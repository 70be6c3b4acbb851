use serde::{Deserialize, Serialize};

use super::identifiers::{CourseId, ModuleId, VideoId};

/// A single playable video belonging to a module. Owned by the course
/// catalog; the engine only reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoRef {
    pub id: VideoId,
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub order: u32,
    /// Duration in seconds as reported by the catalog. May be 0 when the
    /// course author never filled it in; the tracker then learns it from
    /// the backend at bind time.
    #[serde(default, rename = "duration")]
    pub duration_seconds: f64,
}

/// A course module as read from the catalog. Modern modules carry a `videos`
/// list; legacy modules carry a single embedded `video_url` plus a free-form
/// duration string, from which the aggregator synthesizes a `VideoRef`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    pub id: ModuleId,
    #[serde(default)]
    pub number: u32,
    pub title: String,
    #[serde(default)]
    pub videos: Vec<VideoRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_duration: Option<String>,
    #[serde(default)]
    pub is_free: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: CourseId,
    pub title: String,
    #[serde(default)]
    pub modules: Vec<Module>,
}

impl Course {
    pub fn module(&self, id: &ModuleId) -> Option<&Module> {
        self.modules.iter().find(|m| &m.id == id)
    }
}
