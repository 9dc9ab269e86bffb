//! Remote code execution: submit once, then poll until the verdict.
//!
//! The backend either grades a submission inline or hands it to an
//! asynchronous job; this module hides the difference behind `run_code`.
//! Every run is bounded by the configured timeout and can be cancelled
//! from another task through a `CancelToken`.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::client::{Api, ApiError};
use crate::config::ExecutionConfig;
use crate::domain::{ExecutionResult, Job, JobStatus, Submission, SubmissionStatus};
use crate::protocol::SubmissionCreate;

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("execution did not finish within {0:?}")]
    TimedOut(Duration),

    #[error("execution was cancelled")]
    Cancelled,

    #[error("execution failed: {0}")]
    Failed(String),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Cooperative cancellation handle. Clones share the same signal; once
/// cancelled a token stays cancelled.
#[derive(Clone)]
pub struct CancelToken {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            tx: Arc::new(tx),
            rx,
        }
    }

    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves when the token is cancelled; pends forever otherwise.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        if *rx.borrow_and_update() {
            return;
        }
        while rx.changed().await.is_ok() {
            if *rx.borrow() {
                return;
            }
        }
        std::future::pending::<()>().await
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

fn submission_settled(sub: &Submission) -> Option<Result<ExecutionResult, ExecutionError>> {
    match sub.status {
        SubmissionStatus::Completed => Some(Ok(sub.result.clone().unwrap_or_default())),
        SubmissionStatus::Failed => Some(Err(ExecutionError::Failed(
            sub.result
                .as_ref()
                .and_then(|r| r.logs.clone())
                .unwrap_or_else(|| "execution failed".into()),
        ))),
        SubmissionStatus::Pending | SubmissionStatus::Running => None,
    }
}

fn job_settled(job: &Job) -> Option<Result<ExecutionResult, ExecutionError>> {
    match job.status {
        JobStatus::Completed => Some(Ok(job.result.clone().unwrap_or_default())),
        JobStatus::Failed => Some(Err(ExecutionError::Failed(
            job.error_message
                .clone()
                .unwrap_or_else(|| "execution failed".into()),
        ))),
        JobStatus::Queued | JobStatus::Running => None,
    }
}

async fn drive<A: Api>(
    api: &A,
    req: &SubmissionCreate,
    cfg: &ExecutionConfig,
    run_id: Uuid,
) -> Result<ExecutionResult, ExecutionError> {
    let submission = api.submit_code(req).await?;
    if let Some(outcome) = submission_settled(&submission) {
        return outcome;
    }

    match submission.job_id.clone() {
        Some(job_id) => {
            debug!(target: "mlquest_client", %run_id, %job_id, "Polling execution job");
            loop {
                tokio::time::sleep(cfg.poll_interval()).await;
                let job = api.job(&job_id).await?;
                if let Some(outcome) = job_settled(&job) {
                    return outcome;
                }
                debug!(target: "mlquest_client", %run_id, status = ?job.status, "Job still running");
            }
        }
        None => {
            let id = submission.id;
            debug!(target: "mlquest_client", %run_id, submission_id = id, "Polling submission");
            loop {
                tokio::time::sleep(cfg.poll_interval()).await;
                let sub = api.submission(id).await?;
                if let Some(outcome) = submission_settled(&sub) {
                    return outcome;
                }
                debug!(target: "mlquest_client", %run_id, status = ?sub.status, "Submission still running");
            }
        }
    }
}

/// Submit code for a lesson and wait for its execution result, bounded
/// by the configured timeout and the cancellation token.
pub async fn run_code<A: Api>(
    api: &A,
    req: &SubmissionCreate,
    cfg: &ExecutionConfig,
    cancel: &CancelToken,
) -> Result<ExecutionResult, ExecutionError> {
    let run_id = Uuid::new_v4();
    info!(target: "mlquest_client", %run_id, lesson_id = req.lesson_id, "Submitting code for execution");

    tokio::select! {
        _ = cancel.cancelled() => {
            info!(target: "mlquest_client", %run_id, "Execution cancelled");
            Err(ExecutionError::Cancelled)
        }
        out = tokio::time::timeout(cfg.timeout(), drive(api, req, cfg, run_id)) => match out {
            Ok(result) => result,
            Err(_) => {
                warn!(target: "mlquest_client", %run_id, timeout = ?cfg.timeout(), "Execution timed out");
                Err(ExecutionError::TimedOut(cfg.timeout()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn token_resolves_once_cancelled() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());

        let waiter = token.clone();
        let handle = tokio::spawn(async move {
            waiter.cancelled().await;
            true
        });

        token.cancel();
        assert!(handle.await.unwrap());
        assert!(token.is_cancelled());

        // already-cancelled tokens resolve immediately
        token.cancelled().await;
    }

    #[tokio::test]
    async fn select_prefers_cancellation_over_pending_work() {
        let token = CancelToken::new();
        token.cancel();
        let outcome = tokio::select! {
            _ = token.cancelled() => "cancelled",
            _ = tokio::time::sleep(Duration::from_secs(60)) => "slept",
        };
        assert_eq!(outcome, "cancelled");
    }
}
