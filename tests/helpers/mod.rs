//! Shared test fixtures: an in-memory backend fake plus record builders.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

use chrono::Utc;
use mlquest_client::client::{Api, ApiError};
use mlquest_client::domain::{
    Difficulty, ExecutionResult, Job, JobStatus, Lesson, Progress, ProgressStatus, Submission,
    SubmissionStatus, User,
};
use mlquest_client::protocol::{
    LessonQuery, LoginRequest, ProgressCreate, ProgressUpdate, RegisterRequest, SubmissionCreate,
    TokenResponse,
};

pub fn sample_user(id: i64, total_xp: u32) -> User {
    User {
        id,
        email: format!("player{id}@example.org"),
        full_name: Some(format!("Player {id}")),
        is_active: true,
        is_verified: true,
        total_xp,
        current_level: total_xp / 100 + 1,
        badges: vec![],
        game_stats: None,
        last_login: None,
        created_at: Utc::now(),
        updated_at: None,
    }
}

pub fn lesson(id: i64, title: &str) -> Lesson {
    Lesson {
        id,
        title: title.into(),
        description: None,
        content: "# starter code\n".into(),
        difficulty: Difficulty::Beginner,
        module: "module0".into(),
        is_active: true,
        created_at: Utc::now(),
        updated_at: None,
    }
}

fn passing_result() -> ExecutionResult {
    ExecutionResult {
        passed: true,
        metrics: Some(serde_json::json!({"mse": 0.01})),
        hints: None,
        logs: Some("all checks passed".into()),
    }
}

/// In-memory stand-in for the backend. Clones share state, so a test can
/// keep one handle while the session owns another and still flip the
/// behavior knobs mid-test.
#[derive(Clone)]
pub struct MockApi {
    inner: std::sync::Arc<MockState>,
}

pub struct MockState {
    pub token: Mutex<Option<String>>,
    /// When set every authenticated call answers 401.
    pub reject_all: AtomicBool,
    pub user: Mutex<User>,
    pub lessons: Mutex<Vec<Lesson>>,
    pub progress: Mutex<Vec<Progress>>,
    /// Job/submission polls that still answer "running" before settling.
    pub polls_remaining: AtomicU32,
    /// Route submissions through an async job instead of inline grading.
    pub use_job: AtomicBool,
}

impl std::ops::Deref for MockApi {
    type Target = MockState;

    fn deref(&self) -> &MockState {
        &self.inner
    }
}

impl MockApi {
    pub fn new(user: User) -> Self {
        Self {
            inner: std::sync::Arc::new(MockState {
                token: Mutex::new(None),
                reject_all: AtomicBool::new(false),
                user: Mutex::new(user),
                lessons: Mutex::new(Vec::new()),
                progress: Mutex::new(Vec::new()),
                polls_remaining: AtomicU32::new(0),
                use_job: AtomicBool::new(false),
            }),
        }
    }

    pub fn with_lessons(self, lessons: Vec<Lesson>) -> Self {
        *self.inner.lessons.lock().unwrap() = lessons;
        self
    }

    fn auth(&self) -> Result<(), ApiError> {
        if self.reject_all.load(Ordering::SeqCst) || self.token.lock().unwrap().is_none() {
            return Err(ApiError::Unauthorized);
        }
        Ok(())
    }

    fn still_running(&self) -> bool {
        self.polls_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl Api for MockApi {
    fn set_token(&self, token: Option<String>) {
        *self.token.lock().unwrap() = token;
    }

    async fn register(&self, req: &RegisterRequest) -> Result<User, ApiError> {
        let mut user = self.user.lock().unwrap().clone();
        user.email = req.email.clone();
        Ok(user)
    }

    async fn login(&self, _req: &LoginRequest) -> Result<TokenResponse, ApiError> {
        Ok(TokenResponse {
            access_token: "test-token".into(),
            token_type: "bearer".into(),
            expires_in: 3600,
        })
    }

    async fn current_user(&self) -> Result<User, ApiError> {
        self.auth()?;
        Ok(self.user.lock().unwrap().clone())
    }

    async fn lessons(&self, _query: &LessonQuery) -> Result<Vec<Lesson>, ApiError> {
        self.auth()?;
        Ok(self.lessons.lock().unwrap().clone())
    }

    async fn lesson(&self, id: i64) -> Result<Lesson, ApiError> {
        self.auth()?;
        self.lessons
            .lock()
            .unwrap()
            .iter()
            .find(|l| l.id == id)
            .cloned()
            .ok_or(ApiError::Status {
                status: 404,
                detail: "Lesson not found".into(),
            })
    }

    async fn submit_code(&self, req: &SubmissionCreate) -> Result<Submission, ApiError> {
        self.auth()?;
        let (status, result, job_id) = if self.use_job.load(Ordering::SeqCst) {
            (SubmissionStatus::Pending, None, Some("job-1".to_string()))
        } else if self.still_running() {
            (SubmissionStatus::Pending, None, None)
        } else {
            (SubmissionStatus::Completed, Some(passing_result()), None)
        };
        Ok(Submission {
            id: 1,
            lesson_id: req.lesson_id,
            user_id: self.user.lock().unwrap().id,
            code: req.code.clone(),
            language: req.language.clone(),
            status,
            result,
            job_id,
            created_at: Utc::now(),
            completed_at: None,
        })
    }

    async fn submission(&self, id: i64) -> Result<Submission, ApiError> {
        self.auth()?;
        let (status, result) = if self.still_running() {
            (SubmissionStatus::Running, None)
        } else {
            (SubmissionStatus::Completed, Some(passing_result()))
        };
        Ok(Submission {
            id,
            lesson_id: 1,
            user_id: self.user.lock().unwrap().id,
            code: String::new(),
            language: "python".into(),
            status,
            result,
            job_id: None,
            created_at: Utc::now(),
            completed_at: None,
        })
    }

    async fn job(&self, id: &str) -> Result<Job, ApiError> {
        self.auth()?;
        let (status, result) = if self.still_running() {
            (JobStatus::Running, None)
        } else {
            (JobStatus::Completed, Some(passing_result()))
        };
        Ok(Job {
            id: id.to_string(),
            status,
            result,
            error_message: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        })
    }

    async fn my_progress(&self) -> Result<Vec<Progress>, ApiError> {
        self.auth()?;
        Ok(self.progress.lock().unwrap().clone())
    }

    async fn create_progress(&self, req: &ProgressCreate) -> Result<Progress, ApiError> {
        self.auth()?;
        let mut records = self.progress.lock().unwrap();
        let record = Progress {
            id: records.len() as i64 + 1,
            user_id: self.user.lock().unwrap().id,
            lesson_id: req.lesson_id,
            status: req.status.unwrap_or(ProgressStatus::NotStarted),
            score: req.score.unwrap_or(0),
            attempts: req.attempts.unwrap_or(0),
            best_submission_id: req.best_submission_id,
            progress_metadata: req.progress_metadata.clone(),
            created_at: Utc::now(),
            updated_at: None,
        };
        records.push(record.clone());
        Ok(record)
    }

    async fn update_progress(&self, id: i64, req: &ProgressUpdate) -> Result<Progress, ApiError> {
        self.auth()?;
        let mut records = self.progress.lock().unwrap();
        let record = records
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(ApiError::Status {
                status: 404,
                detail: "Progress not found".into(),
            })?;
        if let Some(status) = req.status {
            record.status = status;
        }
        if let Some(score) = req.score {
            record.score = score;
        }
        if let Some(attempts) = req.attempts {
            record.attempts = attempts;
        }
        if let Some(best) = req.best_submission_id {
            record.best_submission_id = Some(best);
        }
        record.updated_at = Some(Utc::now());
        Ok(record.clone())
    }
}
