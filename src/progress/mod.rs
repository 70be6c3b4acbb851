//! Pure rollup logic over per-video progress: module/course percentages,
//! resume targets and next-video decisions. No I/O so the whole thing is
//! unit-testable independent of any backend.

use crate::models::{
    Course, Enrollment, Module, ModuleId, ModuleProgress, ResumeHints, VideoId, VideoRef,
};
use crate::player::provider::parse_duration;

/// Synthetic id for the single implicit video of a legacy module.
pub const LEGACY_VIDEO_ID: &str = "legacy-0";

/// Where to drop the student when a course is reopened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeTarget {
    pub module_id: ModuleId,
    /// `None` for a module with no playable videos (document-only).
    pub video_id: Option<VideoId>,
}

/// The playable videos of a module, ordered. Legacy modules carry a single
/// embedded URL and a free-form duration string instead of a video list; a
/// `VideoRef` is synthesized for those so everything downstream sees one
/// shape.
pub fn module_videos(module: &Module) -> Vec<VideoRef> {
    if !module.videos.is_empty() {
        let mut videos = module.videos.clone();
        videos.sort_by_key(|v| v.order);
        return videos;
    }

    match module.video_url.as_deref() {
        Some(url) if !url.is_empty() => vec![VideoRef {
            id: VideoId::new(LEGACY_VIDEO_ID),
            url: url.to_string(),
            title: module.title.clone(),
            order: 0,
            duration_seconds: parse_duration(module.video_duration.as_deref().unwrap_or("")),
        }],
        _ => Vec::new(),
    }
}

/// Effective duration of one video: the measured duration from progress when
/// available, else the catalog figure. Zero means unknown and keeps the
/// video out of both sides of a percentage.
fn effective_duration(video: &VideoRef, progress: Option<&ModuleProgress>) -> f64 {
    let measured = progress
        .and_then(|p| p.videos.get(&video.id))
        .map(|v| v.duration_seconds)
        .unwrap_or(0.0);
    if measured > 0.0 {
        measured
    } else {
        video.duration_seconds
    }
}

/// Completion percentage for one module: `round(100 × Σmax / Σduration)`
/// over its videos, 0 when the total duration is 0.
pub fn module_completion_percent(videos: &[VideoRef], progress: Option<&ModuleProgress>) -> u32 {
    let mut total_duration = 0.0;
    let mut total_reached = 0.0;

    for video in videos {
        let duration = effective_duration(video, progress);
        if duration <= 0.0 {
            continue;
        }
        let reached = progress
            .and_then(|p| p.videos.get(&video.id))
            .map(|v| v.max_reached_seconds.min(duration))
            .unwrap_or(0.0);
        total_duration += duration;
        total_reached += reached;
    }

    if total_duration <= 0.0 {
        return 0;
    }
    ((100.0 * total_reached / total_duration).round() as u32).min(100)
}

/// Course-level percentage derived from the same rollup across all modules.
/// Display-only: the enrollment's server-computed `progress` stays the
/// authoritative number.
pub fn course_progress_percent(course: &Course, enrollment: &Enrollment) -> u32 {
    let mut total_duration = 0.0;
    let mut total_reached = 0.0;

    for module in &course.modules {
        let progress = enrollment.module_progress.get(&module.id);
        for video in module_videos(module) {
            let duration = effective_duration(&video, progress);
            if duration <= 0.0 {
                continue;
            }
            let reached = progress
                .and_then(|p| p.videos.get(&video.id))
                .map(|v| v.max_reached_seconds.min(duration))
                .unwrap_or(0.0);
            total_duration += duration;
            total_reached += reached;
        }
    }

    if total_duration <= 0.0 {
        return 0;
    }
    ((100.0 * total_reached / total_duration).round() as u32).min(100)
}

/// Whether a module counts as complete: every video completed. A module
/// with no playable videos is complete once visited, which is when its
/// progress entry first exists.
pub fn module_completed(videos: &[VideoRef], progress: Option<&ModuleProgress>) -> bool {
    if videos.is_empty() {
        return progress.is_some();
    }
    let Some(progress) = progress else {
        return false;
    };
    videos.iter().all(|video| {
        progress
            .videos
            .get(&video.id)
            .map(|v| v.completed)
            .unwrap_or(false)
    })
}

/// Decide where to drop the student on course open: the last watched module
/// when it still exists, else the first module; within it, the module's
/// last-watched video when it still exists, else the first video.
pub fn resume_target(course: &Course, enrollment: Option<&Enrollment>) -> Option<ResumeTarget> {
    let module = enrollment
        .and_then(|e| e.last_watched_module.as_ref())
        .and_then(|id| course.module(id))
        .or_else(|| course.modules.first())?;

    let videos = module_videos(module);
    let last_video = enrollment
        .and_then(|e| e.module_progress.get(&module.id))
        .and_then(|p| p.last_video_id.as_ref())
        .filter(|id| videos.iter().any(|v| &v.id == *id));

    Some(ResumeTarget {
        module_id: module.id.clone(),
        video_id: last_video
            .cloned()
            .or_else(|| videos.first().map(|v| v.id.clone())),
    })
}

/// The video after `current_index`, or `None` when the module is finished.
/// "Module finished" is not "course finished": course-level completion comes
/// from the enrollment's server-computed percentage.
pub fn next_video(videos: &[VideoRef], current_index: usize) -> Option<&VideoRef> {
    videos.get(current_index + 1)
}

pub fn video_index(videos: &[VideoRef], video_id: &VideoId) -> Option<usize> {
    videos.iter().position(|v| &v.id == video_id)
}

/// Seed for a freshly bound tracker, from whatever the enrollment knows
/// about this video. Zeros when nothing is stored yet.
pub fn resume_hints(
    enrollment: Option<&Enrollment>,
    module_id: &ModuleId,
    video_id: &VideoId,
) -> ResumeHints {
    enrollment
        .and_then(|e| e.video_progress(module_id, video_id))
        .map(ResumeHints::from_progress)
        .unwrap_or_default()
}
