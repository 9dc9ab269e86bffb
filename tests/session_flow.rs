//! End-to-end session behavior against the in-memory backend fake.

mod helpers;

use std::sync::atomic::Ordering;

use helpers::{lesson, sample_user, MockApi};
use mlquest_client::client::ApiError;
use mlquest_client::config::ExecutionConfig;
use mlquest_client::domain::ProgressStatus;
use mlquest_client::executor::CancelToken;
use mlquest_client::session::{Session, SessionError};
use mlquest_client::store::MemoryStore;

fn fast_execution() -> ExecutionConfig {
    ExecutionConfig {
        timeout_secs: 5,
        poll_interval_ms: 5,
    }
}

fn session_with(api: MockApi) -> Session<MockApi, MemoryStore> {
    Session::new(api, MemoryStore::new(), fast_execution())
}

#[tokio::test]
async fn login_adopts_server_xp_and_resumes_locally() {
    let api = MockApi::new(sample_user(7, 300));
    let mut session = session_with(api.clone());

    let user = session.login("player7@example.org", "secret").await.unwrap();
    assert_eq!(user.id, 7);
    assert!(session.is_authenticated());
    assert!(api.token.lock().unwrap().is_some());

    // server XP is ahead of the fresh local snapshot and wins
    let stats = session.game().unwrap().stats().clone();
    assert_eq!(stats.total_xp, 300);
    assert_eq!(stats.level(), 4);
}

#[tokio::test]
async fn refresh_reconciles_when_the_server_pulls_ahead() {
    let api = MockApi::new(sample_user(7, 0));
    let mut session = session_with(api.clone());
    session.login("player7@example.org", "secret").await.unwrap();

    // another device banked XP and a badge on the server side
    {
        let mut user = api.user.lock().unwrap();
        user.total_xp = 500;
        user.badges.push("Explorer".into());
    }

    let user = session.refresh_user().await.unwrap();
    assert_eq!(user.total_xp, 500);
    let stats = session.game().unwrap().stats();
    assert_eq!(stats.total_xp, 500);
    assert!(stats.badges.contains("Explorer"));
}

#[tokio::test]
async fn rejected_token_forces_logout() {
    let api = MockApi::new(sample_user(1, 0)).with_lessons(vec![lesson(1, "Intro")]);
    let mut session = session_with(api.clone());
    session.login("a@b.c", "pw").await.unwrap();

    api.reject_all.store(true, Ordering::SeqCst);
    let err = session
        .refresh_lessons(&Default::default())
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::Api(ApiError::Unauthorized)));
    assert!(!session.is_authenticated());
    assert!(api.token.lock().unwrap().is_none());
}

#[tokio::test]
async fn lessons_unlock_in_order_as_they_complete() {
    let api = MockApi::new(sample_user(1, 0)).with_lessons(vec![
        lesson(10, "Linear Regression Basics"),
        lesson(11, "Polynomial Features"),
        lesson(12, "Bias-Variance Tradeoff"),
    ]);
    let mut session = session_with(api.clone());
    session.login("a@b.c", "pw").await.unwrap();
    session.refresh_lessons(&Default::default()).await.unwrap();

    assert!(session.is_lesson_unlocked(0));
    assert!(!session.is_lesson_unlocked(1));
    assert_eq!(session.next_lesson(), Some(0));

    let events = session.complete_lesson(10, 100).await.unwrap();
    assert!(!events.is_empty());
    // 50 base + 20 accuracy + 10 perfect + 25 "linear" topic bonus
    assert_eq!(session.game().unwrap().stats().total_xp, 105);
    assert!(session.is_lesson_unlocked(1));
    assert!(!session.is_lesson_unlocked(2));
    assert_eq!(session.next_lesson(), Some(1));
}

#[tokio::test]
async fn completion_is_written_through_to_the_backend() {
    let api = MockApi::new(sample_user(1, 0)).with_lessons(vec![lesson(10, "Intro")]);
    let mut session = session_with(api.clone());
    session.login("a@b.c", "pw").await.unwrap();
    session.refresh_lessons(&Default::default()).await.unwrap();

    session.complete_lesson(10, 80).await.unwrap();
    {
        let records = api.progress.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].lesson_id, 10);
        assert_eq!(records[0].status, ProgressStatus::Completed);
        assert_eq!(records[0].score, 80);
    }

    // a second completion updates the existing record instead of creating
    // a new one, and awards no XP again
    session.complete_lesson(10, 95).await.unwrap();
    let records = api.progress.lock().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].score, 95);
    assert!(records[0].updated_at.is_some());
}

#[tokio::test]
async fn run_code_polls_an_async_job_to_completion() {
    let api = MockApi::new(sample_user(1, 0));
    api.use_job.store(true, Ordering::SeqCst);
    api.polls_remaining.store(2, Ordering::SeqCst);

    let mut session = session_with(api.clone());
    session.login("a@b.c", "pw").await.unwrap();

    let result = session
        .run_code(1, "print('hi')", &CancelToken::new())
        .await
        .unwrap();
    assert!(result.passed);
    // both "running" polls were consumed before the job settled
    assert_eq!(api.polls_remaining.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn run_code_polls_the_submission_when_there_is_no_job() {
    let api = MockApi::new(sample_user(1, 0));
    api.polls_remaining.store(3, Ordering::SeqCst);

    let mut session = session_with(api.clone());
    session.login("a@b.c", "pw").await.unwrap();

    let result = session
        .run_code(1, "print('hi')", &CancelToken::new())
        .await
        .unwrap();
    assert!(result.passed);
}

#[tokio::test]
async fn run_code_times_out_when_the_job_never_settles() {
    let api = MockApi::new(sample_user(1, 0));
    api.use_job.store(true, Ordering::SeqCst);
    api.polls_remaining.store(u32::MAX, Ordering::SeqCst);

    let mut session = Session::new(
        api.clone(),
        MemoryStore::new(),
        ExecutionConfig {
            timeout_secs: 0,
            poll_interval_ms: 5,
        },
    );
    session.login("a@b.c", "pw").await.unwrap();

    let err = session
        .run_code(1, "while True: pass", &CancelToken::new())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SessionError::Execution(mlquest_client::executor::ExecutionError::TimedOut(_))
    ));
}

#[tokio::test]
async fn run_code_honors_cancellation() {
    let api = MockApi::new(sample_user(1, 0));
    api.use_job.store(true, Ordering::SeqCst);
    api.polls_remaining.store(u32::MAX, Ordering::SeqCst);

    let mut session = session_with(api.clone());
    session.login("a@b.c", "pw").await.unwrap();

    let cancel = CancelToken::new();
    cancel.cancel();
    let err = session
        .run_code(1, "print('hi')", &cancel)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SessionError::Execution(mlquest_client::executor::ExecutionError::Cancelled)
    ));
}

#[tokio::test]
async fn anonymous_sessions_cannot_run_code_or_play() {
    let api = MockApi::new(sample_user(1, 0));
    let mut session = session_with(api);

    assert!(matches!(
        session.run_code(1, "x", &CancelToken::new()).await,
        Err(SessionError::NotAuthenticated)
    ));
    assert!(matches!(
        session.start_quest(),
        Err(SessionError::NotAuthenticated)
    ));
    assert!(!session.is_lesson_unlocked(0));
}

#[tokio::test]
async fn logout_clears_token_and_state() {
    let api = MockApi::new(sample_user(1, 0));
    let mut session = session_with(api.clone());
    session.login("a@b.c", "pw").await.unwrap();

    session.logout();
    assert!(!session.is_authenticated());
    assert!(api.token.lock().unwrap().is_none());
}
