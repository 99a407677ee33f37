//! Request bodies sent to the backend.
//!
//! Bounds mirror the backend's own validation so obviously invalid requests
//! never leave the client.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{Idea, VideoType};

/// Body of `PATCH /api/ideas/{id}/validate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
pub struct ValidateIdeaRequest {
    pub video_type: VideoType,

    #[validate(range(min = 10, max = 600))]
    pub duration_seconds: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
}

impl ValidateIdeaRequest {
    pub fn new(video_type: VideoType, duration_seconds: u32) -> Self {
        Self {
            video_type,
            duration_seconds,
            keywords: None,
        }
    }

    /// Keep the idea's current parameters, falling back to a 30s short.
    pub fn from_idea(idea: &Idea) -> Self {
        Self {
            video_type: idea.video_type,
            duration_seconds: idea.duration_seconds.unwrap_or(30),
            keywords: (!idea.keywords.is_empty()).then(|| idea.keywords.clone()),
        }
    }

    pub fn with_keywords(mut self, keywords: Vec<String>) -> Self {
        self.keywords = (!keywords.is_empty()).then_some(keywords);
        self
    }
}

/// Body of `POST /api/ideas/generate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
pub struct GenerateIdeasRequest {
    #[validate(range(min = 1, max = 20))]
    pub count: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,

    /// Forces the title of a single generated idea
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_title: Option<String>,

    #[serde(default)]
    pub video_type: VideoType,

    #[validate(range(min = 10, max = 600))]
    pub duration_seconds: u32,

    /// Long-form videos only
    #[validate(range(min = 2, max = 10))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sections_count: Option<u32>,
}

impl Default for GenerateIdeasRequest {
    fn default() -> Self {
        Self {
            count: 5,
            keywords: None,
            custom_title: None,
            video_type: VideoType::Short,
            duration_seconds: 30,
            sections_count: None,
        }
    }
}

/// Body of `POST /api/ideas/custom-script`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
pub struct CustomScriptRequest {
    #[validate(length(min = 50))]
    pub script_text: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,

    #[serde(default)]
    pub video_type: VideoType,

    #[validate(range(min = 10, max = 600))]
    pub duration_seconds: u32,
}

/// Response of `POST /api/ideas/generate` and `/custom-script`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GeneratedIdeas {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub ideas: Vec<Idea>,
}
