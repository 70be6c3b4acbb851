use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::identifiers::{CourseId, EnrollmentId, ModuleId, VideoId};

/// Per-student, per-video progress as stored by the enrollment record.
///
/// `max_reached_seconds` is the furthest point verified as reached through
/// real playback; it drives completion and anti-skip. `last_position_seconds`
/// is only "where the user currently is" for resume purposes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoProgress {
    #[serde(default)]
    pub watched_seconds: f64,
    #[serde(default)]
    pub max_reached_seconds: f64,
    #[serde(default, rename = "duration")]
    pub duration_seconds: f64,
    #[serde(default, rename = "lastPosition")]
    pub last_position_seconds: f64,
    #[serde(default)]
    pub completed: bool,
}

/// Per-module rollup owned by the enrollment record. The engine treats this
/// as a cache it may read stale and write eventually-consistent updates to.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleProgress {
    #[serde(default)]
    pub videos: HashMap<VideoId, VideoProgress>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_video_id: Option<VideoId>,
}

/// The store predates structured per-video progress; old enrollments carry a
/// bare percentage where the structured entry now lives. Those collapse to an
/// empty entry keeping only the completed latch.
#[derive(Deserialize)]
#[serde(untagged)]
enum ModuleProgressWire {
    Entry(ModuleProgress),
    LegacyPercent(f64),
}

fn deserialize_module_progress<'de, D>(
    deserializer: D,
) -> Result<HashMap<ModuleId, ModuleProgress>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: HashMap<ModuleId, ModuleProgressWire> = HashMap::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|(id, wire)| {
            let entry = match wire {
                ModuleProgressWire::Entry(entry) => entry,
                ModuleProgressWire::LegacyPercent(pct) => ModuleProgress {
                    completed: pct >= 100.0,
                    ..ModuleProgress::default()
                },
            };
            (id, entry)
        })
        .collect())
}

/// Read model of an enrollment. The server-computed `progress` percentage is
/// the authoritative course-level number; the engine never overwrites it
/// locally.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    pub id: EnrollmentId,
    pub course_id: CourseId,
    #[serde(default)]
    pub progress: u32,
    #[serde(default)]
    pub completed_modules: Vec<ModuleId>,
    #[serde(default, deserialize_with = "deserialize_module_progress")]
    pub module_progress: HashMap<ModuleId, ModuleProgress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_watched_module: Option<ModuleId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enrolled_at: Option<DateTime<Utc>>,
}

impl Enrollment {
    pub fn video_progress(&self, module_id: &ModuleId, video_id: &VideoId) -> Option<&VideoProgress> {
        self.module_progress.get(module_id)?.videos.get(video_id)
    }
}

/// Identifies one tracked video within one course; persistence writes are
/// keyed by this so writes for different videos never clobber each other.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProgressKey {
    pub module_id: ModuleId,
    pub video_id: VideoId,
}

impl ProgressKey {
    pub fn new(module_id: impl Into<ModuleId>, video_id: impl Into<VideoId>) -> Self {
        Self {
            module_id: module_id.into(),
            video_id: video_id.into(),
        }
    }
}

/// Snapshot emitted by a running tracker on the emission cadence.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSnapshot {
    pub watched_seconds: f64,
    pub max_reached_seconds: f64,
    pub duration_seconds: f64,
    pub current_position: f64,
    pub completed: bool,
}

/// Server-sourced triple used to seed a freshly bound tracker.
#[derive(Debug, Clone, Default)]
pub struct ResumeHints {
    pub last_position_seconds: f64,
    pub max_reached_seconds: f64,
    pub watched_seconds: f64,
    pub completed: bool,
}

impl ResumeHints {
    pub fn from_progress(progress: &VideoProgress) -> Self {
        Self {
            last_position_seconds: progress.last_position_seconds,
            max_reached_seconds: progress.max_reached_seconds,
            watched_seconds: progress.watched_seconds,
            completed: progress.completed,
        }
    }
}
