//! Request/response DTOs for the backend REST API (serde ready).
//! Field names follow the backend's snake_case JSON; keep this small and
//! stable so client and backend can evolve independently.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize)]
pub struct RegisterRequest {
    pub email: String,
    pub full_name: String,
    pub password: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Bearer token handed out by the login endpoint.
#[derive(Clone, Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    /// Seconds until the token expires.
    pub expires_in: i64,
}

/// Optional filters for the lesson listing; serialized as query parameters.
#[derive(Clone, Debug, Default, Serialize)]
pub struct LessonQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
}

impl LessonQuery {
    /// Restrict the listing to one difficulty tier.
    pub fn with_difficulty(mut self, difficulty: crate::domain::Difficulty) -> Self {
        self.difficulty = Some(difficulty.as_str().to_string());
        self
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct SubmissionCreate {
    pub lesson_id: i64,
    pub code: String,
    pub language: String,
}

impl SubmissionCreate {
    /// The platform grades Python; other languages must be set explicitly.
    pub fn python(lesson_id: i64, code: impl Into<String>) -> Self {
        Self {
            lesson_id,
            code: code.into(),
            language: "python".into(),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct ProgressCreate {
    pub lesson_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<crate::domain::ProgressStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_submission_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress_metadata: Option<serde_json::Value>,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct ProgressUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<crate::domain::ProgressStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_submission_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress_metadata: Option<serde_json::Value>,
}
