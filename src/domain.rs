//! Domain models: backend records the client consumes plus the quest challenge type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lesson difficulty tiers as the backend reports them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
        }
    }
}

/// Lesson record. Immutable from the client's perspective; the backend
/// serves lessons as an ordered sequence and that order drives unlocking.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Lesson {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Starter code shown in the editor.
    pub content: String,
    pub difficulty: Difficulty,
    pub module: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Game counters the backend embeds in the user record. These are the
/// server's copy; the client keeps its own snapshot and reconciles.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RemoteGameStats {
    #[serde(default)]
    pub hearts: Option<u8>,
    #[serde(default)]
    pub current_streak: u32,
    #[serde(default)]
    pub max_streak: u32,
    #[serde(default)]
    pub challenges_completed: u32,
}

/// User record as returned by the backend. Read-mostly on the client.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
    pub is_active: bool,
    pub is_verified: bool,
    #[serde(default)]
    pub total_xp: u32,
    #[serde(default = "default_level")]
    pub current_level: u32,
    #[serde(default)]
    pub badges: Vec<String>,
    #[serde(default)]
    pub game_stats: Option<RemoteGameStats>,
    #[serde(default)]
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_level() -> u32 {
    1
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

/// Result payload produced by the execution service for a submission.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub passed: bool,
    #[serde(default)]
    pub metrics: Option<serde_json::Value>,
    #[serde(default)]
    pub hints: Option<Vec<String>>,
    #[serde(default)]
    pub logs: Option<String>,
}

/// A code submission and its (possibly still pending) outcome.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Submission {
    pub id: i64,
    pub lesson_id: i64,
    pub user_id: i64,
    pub code: String,
    pub language: String,
    pub status: SubmissionStatus,
    #[serde(default)]
    pub result: Option<ExecutionResult>,
    /// Set when grading was handed off to an asynchronous job.
    #[serde(default)]
    pub job_id: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

/// Asynchronous execution job, polled until it settles.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub status: JobStatus,
    #[serde(default)]
    pub result: Option<ExecutionResult>,
    #[serde(default)]
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    NotStarted,
    InProgress,
    Completed,
}

/// Per-lesson mastery record owned by the backend.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Progress {
    pub id: i64,
    pub user_id: i64,
    pub lesson_id: i64,
    pub status: ProgressStatus,
    #[serde(default)]
    pub score: u32,
    #[serde(default)]
    pub attempts: u32,
    #[serde(default)]
    pub best_submission_id: Option<i64>,
    #[serde(default)]
    pub progress_metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_tolerance() -> f64 {
    0.1
}

/// What counts as a correct answer for a quest challenge.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExpectedAnswer {
    /// Numeric answer accepted within an absolute tolerance.
    Number {
        value: f64,
        #[serde(default = "default_tolerance")]
        tolerance: f64,
    },
    /// Textual answer matched against accepted forms after normalization
    /// (lowercase, whitespace stripped).
    Text { accepted: Vec<String> },
}

impl ExpectedAnswer {
    /// Human-readable form of the expected answer, used when revealing it
    /// after the attempt cap is reached.
    pub fn display(&self) -> String {
        match self {
            ExpectedAnswer::Number { value, .. } => format!("{value}"),
            ExpectedAnswer::Text { accepted } => accepted.first().cloned().unwrap_or_default(),
        }
    }
}

/// A single scripted quest challenge, compiled into the client.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Challenge {
    pub id: String,
    pub title: String,
    /// Narrative framing shown before the question.
    pub story: String,
    pub question: String,
    pub expected: ExpectedAnswer,
    /// Ordered from vaguest to most explicit; revealed one per failed
    /// attempt starting at the second.
    pub hints: Vec<String>,
    #[serde(default)]
    pub explanation: Option<String>,
    /// XP awarded when the challenge is completed, on top of grading XP.
    pub xp: u32,
    #[serde(default)]
    pub badges: Vec<String>,
}
