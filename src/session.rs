//! User session: authentication, lesson flow and the glue between the
//! backend and the local gamification state.
//!
//! The session owns the API client and the player's gamification engine.
//! Local rules run first (XP lands immediately, offline included); the
//! backend progress record is then written through. Any 401 from the
//! backend forces a logout so callers never keep using a stale token.

use thiserror::Error;
use tracing::{info, warn};

use crate::client::{Api, ApiError};
use crate::config::ExecutionConfig;
use crate::domain::{ExecutionResult, Lesson, ProgressStatus, User};
use crate::executor::{self, CancelToken, ExecutionError};
use crate::gamification::{GameEvent, Gamification, GamificationError};
use crate::protocol::{
    LessonQuery, LoginRequest, ProgressCreate, ProgressUpdate, RegisterRequest, SubmissionCreate,
};
use crate::quest::QuestGame;
use crate::seeds;
use crate::store::ProgressStore;
use crate::unlock;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("not signed in")]
    NotAuthenticated,

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Game(#[from] GamificationError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

pub struct Session<A: Api, S: ProgressStore + Clone> {
    api: A,
    store: S,
    execution: ExecutionConfig,
    user: Option<User>,
    game: Option<Gamification<S>>,
    lessons: Vec<Lesson>,
}

impl<A: Api, S: ProgressStore + Clone> Session<A, S> {
    pub fn new(api: A, store: S, execution: ExecutionConfig) -> Self {
        Self {
            api,
            store,
            execution,
            user: None,
            game: None,
            lessons: Vec::new(),
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn lessons(&self) -> &[Lesson] {
        &self.lessons
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// The signed-in player's gamification engine.
    pub fn game(&mut self) -> Result<&mut Gamification<S>, SessionError> {
        self.game.as_mut().ok_or(SessionError::NotAuthenticated)
    }

    fn force_logout(&mut self) {
        warn!(target: "mlquest_client", "Session token rejected, forcing logout");
        self.api.set_token(None);
        self.user = None;
        self.game = None;
    }

    /// Unwrap an API result, forcing a logout when the token was refused.
    fn checked<T>(&mut self, res: Result<T, ApiError>) -> Result<T, SessionError> {
        match res {
            Err(ApiError::Unauthorized) => {
                self.force_logout();
                Err(SessionError::Api(ApiError::Unauthorized))
            }
            other => Ok(other?),
        }
    }

    pub async fn register(
        &mut self,
        email: &str,
        full_name: &str,
        password: &str,
    ) -> Result<User, SessionError> {
        let req = RegisterRequest {
            email: email.to_string(),
            full_name: full_name.to_string(),
            password: password.to_string(),
        };
        Ok(self.api.register(&req).await?)
    }

    /// Sign in, load the local snapshot and fold in the server's view of
    /// the account.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<&User, SessionError> {
        let req = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let token = self.api.login(&req).await?;
        self.api.set_token(Some(token.access_token));

        let res = self.api.current_user().await;
        let user = self.checked(res)?;

        let mut game = Gamification::load_or_default(self.store.clone(), user.id.to_string())?;
        game.reconcile(&user)?;

        info!(target: "mlquest_client", user_id = user.id, "Signed in");
        self.game = Some(game);
        Ok(&*self.user.insert(user))
    }

    /// Re-fetch the profile and reconcile the local snapshot with it.
    pub async fn refresh_user(&mut self) -> Result<&User, SessionError> {
        if self.user.is_none() {
            return Err(SessionError::NotAuthenticated);
        }
        let res = self.api.current_user().await;
        let user = self.checked(res)?;
        self.game()?.reconcile(&user)?;
        Ok(&*self.user.insert(user))
    }

    pub fn logout(&mut self) {
        info!(target: "mlquest_client", "Signed out");
        self.api.set_token(None);
        self.user = None;
        self.game = None;
    }

    /// Fetch (and cache) the ordered lesson list.
    pub async fn refresh_lessons(&mut self, query: &LessonQuery) -> Result<&[Lesson], SessionError> {
        let res = self.api.lessons(query).await;
        self.lessons = self.checked(res)?;
        Ok(&self.lessons)
    }

    /// Whether the cached lesson at `index` is playable for this player.
    pub fn is_lesson_unlocked(&self, index: usize) -> bool {
        match &self.game {
            Some(game) => unlock::is_unlocked(&self.lessons, game.completed_lessons(), index),
            None => false,
        }
    }

    /// Where a resumed player should continue in the cached lesson list.
    pub fn next_lesson(&self) -> Option<usize> {
        let game = self.game.as_ref()?;
        unlock::next_playable(&self.lessons, game.completed_lessons())
    }

    /// Mark a lesson finished: the local rules award XP first, then the
    /// backend progress record is written through. The local award stays
    /// even when the write-through fails; a later completion or login
    /// reconciles.
    pub async fn complete_lesson(
        &mut self,
        lesson_id: i64,
        accuracy: u32,
    ) -> Result<Vec<GameEvent>, SessionError> {
        let title = match self.lessons.iter().find(|l| l.id == lesson_id) {
            Some(lesson) => lesson.title.clone(),
            None => {
                let res = self.api.lesson(lesson_id).await;
                self.checked(res)?.title
            }
        };

        let events = self.game()?.complete_lesson(lesson_id, &title, accuracy)?;

        let res = self.api.my_progress().await;
        let existing = self.checked(res)?;
        match existing.iter().find(|p| p.lesson_id == lesson_id) {
            Some(progress) => {
                let update = ProgressUpdate {
                    status: Some(ProgressStatus::Completed),
                    score: Some(accuracy),
                    ..Default::default()
                };
                let res = self.api.update_progress(progress.id, &update).await;
                self.checked(res)?;
            }
            None => {
                let create = ProgressCreate {
                    lesson_id,
                    status: Some(ProgressStatus::Completed),
                    score: Some(accuracy),
                    ..Default::default()
                };
                let res = self.api.create_progress(&create).await;
                self.checked(res)?;
            }
        }

        Ok(events)
    }

    /// Run lesson code on the backend, bounded by the execution config.
    pub async fn run_code(
        &mut self,
        lesson_id: i64,
        code: &str,
        cancel: &CancelToken,
    ) -> Result<ExecutionResult, SessionError> {
        if !self.is_authenticated() {
            return Err(SessionError::NotAuthenticated);
        }
        let req = SubmissionCreate::python(lesson_id, code);
        match executor::run_code(&self.api, &req, &self.execution, cancel).await {
            Err(ExecutionError::Api(ApiError::Unauthorized)) => {
                self.force_logout();
                Err(SessionError::Api(ApiError::Unauthorized))
            }
            other => Ok(other?),
        }
    }

    /// Resume the quest mini-game from the stored position.
    pub fn start_quest(&mut self) -> Result<QuestGame, SessionError> {
        let game = self.game()?;
        Ok(QuestGame::resume(seeds::quest_challenges(), game.quest()))
    }
}
