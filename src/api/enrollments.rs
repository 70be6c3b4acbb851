use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{CourseId, Enrollment, ModuleId, VideoId};

/// Wire payload for the save-video-progress upsert. Field names are
/// camelCase to match the store; the upsert is idempotent and keyed by
/// (enrollment, moduleId, videoId) server-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveVideoProgress {
    pub module_id: ModuleId,
    pub video_id: VideoId,
    pub watched_seconds: f64,
    pub max_reached_seconds: f64,
    pub duration: f64,
    pub last_position: f64,
}

/// HTTP client for the enrollment store.
pub struct EnrollmentsApi {
    base_url: String,
    client: reqwest::Client,
}

impl EnrollmentsApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }

    fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Persist one video progress snapshot.
    pub async fn save_video_progress(
        &self,
        course_id: &CourseId,
        progress: &SaveVideoProgress,
    ) -> Result<()> {
        let url = self.build_url(&format!("/enrollments/{course_id}/save-video-progress"));
        debug!(
            module = %progress.module_id,
            video = %progress.video_id,
            max_reached = progress.max_reached_seconds,
            "saving video progress"
        );

        let response = self.client.post(&url).json(progress).send().await?;
        if !response.status().is_success() {
            return Err(anyhow!(
                "Failed to save video progress: {}",
                response.status()
            ));
        }
        Ok(())
    }

    /// Mark a module complete on the enrollment. Returns the updated
    /// enrollment with the server-recomputed percentage.
    pub async fn complete_module(
        &self,
        course_id: &CourseId,
        module_id: &ModuleId,
    ) -> Result<Enrollment> {
        let url = self.build_url(&format!("/enrollments/{course_id}/complete-module"));

        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Body<'a> {
            module_id: &'a ModuleId,
        }

        let response = self
            .client
            .post(&url)
            .json(&Body { module_id })
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(anyhow!("Failed to complete module: {}", response.status()));
        }
        Ok(response.json().await?)
    }

    /// The student's enrollments, including the authoritative progress
    /// percentages the server recomputes on every write.
    pub async fn get_enrollments(&self) -> Result<Vec<Enrollment>> {
        let url = self.build_url("/enrollments");
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(anyhow!("Failed to fetch enrollments: {}", response.status()));
        }
        Ok(response.json().await?)
    }
}
