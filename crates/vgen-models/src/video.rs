//! Rendered videos, their scripts and the YouTube upload exchange.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::utils::{lenient_timestamp, null_as_default};
use crate::{IdeaId, VideoType};

/// Response of `GET /api/videos/by-idea/{idea_id}` and items of `GET /api/videos/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Video {
    pub id: String,
    pub idea_id: IdeaId,

    #[serde(default)]
    pub script_id: Option<String>,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub video_type: VideoType,

    #[serde(default)]
    pub duration_seconds: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub youtube_video_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub youtube_url: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub uploaded_at: Option<DateTime<Utc>>,

    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub scheduled_publish_date: Option<DateTime<Utc>>,

    #[serde(default)]
    pub is_scheduled: bool,

    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

impl Video {
    pub fn new(id: impl Into<String>, idea_id: impl Into<IdeaId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            idea_id: idea_id.into(),
            script_id: None,
            title: title.into(),
            video_type: VideoType::default(),
            duration_seconds: 0.0,
            youtube_video_id: None,
            youtube_url: None,
            uploaded_at: None,
            scheduled_publish_date: None,
            is_scheduled: false,
            created_at: None,
        }
    }

    /// Already published, or waiting for a scheduled publish.
    pub fn is_uploaded(&self) -> bool {
        self.youtube_video_id.is_some()
    }
}

/// Response of `GET /api/scripts/by-idea/{idea_id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Script {
    pub id: String,
    pub idea_id: IdeaId,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub original_script: String,

    /// Text rewritten for speech synthesis
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elevenlabs_adapted_script: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub youtube_description: Option<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub phrases: Vec<String>,
}

impl Script {
    /// The adapted text when adaptation ran, the original otherwise.
    pub fn spoken_text(&self) -> &str {
        self.elevenlabs_adapted_script
            .as_deref()
            .unwrap_or(&self.original_script)
    }
}

/// Body of `POST /api/youtube/upload/{video_id}`.
///
/// Empty fields are left to the backend, which falls back to the video title
/// and generates a description from the script.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
pub struct UploadVideoRequest {
    #[validate(length(min = 1, max = 100))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[validate(length(max = 5000))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// Publish later instead of immediately
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish_at: Option<DateTime<Utc>>,
}

impl UploadVideoRequest {
    pub fn scheduled(mut self, publish_at: DateTime<Utc>) -> Self {
        self.publish_at = Some(publish_at);
        self
    }
}

/// Response of `POST /api/youtube/upload/{video_id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct UploadVideoResponse {
    #[serde(default)]
    pub success: bool,

    pub youtube_video_id: String,

    #[serde(default)]
    pub youtube_url: String,

    /// Description the backend generated when none was sent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_generated: Option<String>,
}
