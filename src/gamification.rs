//! Gamification engine: XP, levels, hearts, streaks and badges.
//!
//! All rules live here as a deterministic reducer over `GameStats`; the
//! quest game and the lesson session both mutate state through this
//! service and never touch the numbers directly. Every mutation persists
//! the full `PlayerSnapshot` through the injected `ProgressStore` and
//! returns the list of `GameEvent`s the caller should surface.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::User;
use crate::store::{PlayerSnapshot, ProgressStore, QuestSnapshot, StoreError};

pub const MAX_HEARTS: u8 = 3;
pub const XP_PER_LEVEL: u32 = 100;
pub const CORRECT_ANSWER_XP: u32 = 25;
pub const LESSON_BASE_XP: u32 = 50;

/// Counters for one player. Hearts start full; everything else at zero.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameStats {
    pub total_xp: u32,
    pub hearts: u8,
    pub streak: u32,
    pub max_streak: u32,
    pub lessons_completed: u32,
    /// Rounded running mean of lesson completion accuracies.
    pub accuracy: u32,
    pub badges: BTreeSet<String>,
}

impl Default for GameStats {
    fn default() -> Self {
        Self {
            total_xp: 0,
            hearts: MAX_HEARTS,
            streak: 0,
            max_streak: 0,
            lessons_completed: 0,
            accuracy: 0,
            badges: BTreeSet::new(),
        }
    }
}

impl GameStats {
    /// Levels are a pure function of XP: 0..=99 is level 1, 100..=199
    /// level 2, and so on.
    pub fn level(&self) -> u32 {
        self.total_xp / XP_PER_LEVEL + 1
    }

    /// XP still missing for the next level, always in 1..=100.
    pub fn xp_to_next(&self) -> u32 {
        self.level() * XP_PER_LEVEL - self.total_xp
    }

    /// XP earned within the current level (for progress bars).
    pub fn xp_into_level(&self) -> u32 {
        self.total_xp % XP_PER_LEVEL
    }

    /// Streak multiplier applied to correct-answer XP.
    pub fn multiplier(&self) -> f64 {
        match self.streak {
            s if s >= 10 => 3.0,
            s if s >= 5 => 2.0,
            s if s >= 3 => 1.5,
            _ => 1.0,
        }
    }

    /// Out of hearts. Answers are refused until the player resets.
    pub fn game_over(&self) -> bool {
        self.hearts == 0
    }
}

/// Something worth telling the player about. Each XP award surfaces
/// exactly one notification: a level-up replaces the plain +N XP message
/// and also outranks a streak milestone in the same action.
#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    XpAwarded { amount: u32, reason: String },
    LevelUp { level: u32 },
    StreakMilestone { streak: u32, message: String },
    StreakBroken,
    HeartLost { remaining: u8 },
    GameOver,
    BadgeEarned { badge: String },
}

#[derive(Debug, Error)]
pub enum GamificationError {
    #[error("XP awards must be positive")]
    InvalidXpAmount,

    #[error("XP awards need a non-empty reason")]
    EmptyReason,

    #[error("accuracy must be 0..=100, got {0}")]
    InvalidAccuracy(u32),

    #[error("out of hearts; reset before answering again")]
    GameOver,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// XP awarded for finishing a lesson: accuracy bonuses plus additive
/// topic bonuses matched case-insensitively against the title.
pub fn lesson_xp(title: &str, accuracy: u32) -> u32 {
    let mut xp = LESSON_BASE_XP;
    if accuracy >= 90 {
        xp += 20;
    }
    if accuracy == 100 {
        xp += 10;
    }
    let title = title.to_lowercase();
    if title.contains("linear") {
        xp += 25;
    }
    if title.contains("polynomial") {
        xp += 35;
    }
    if title.contains("bias") {
        xp += 50;
    }
    xp
}

fn streak_milestone(streak: u32) -> Option<&'static str> {
    match streak {
        3 => Some("Streak started!"),
        5 => Some("Hot streak!"),
        10 => Some("Legendary streak!"),
        _ => None,
    }
}

/// Stateful engine for one signed-in user.
pub struct Gamification<S: ProgressStore> {
    store: S,
    user_id: String,
    snapshot: PlayerSnapshot,
}

impl<S: ProgressStore> Gamification<S> {
    /// Resume from the store, or start a fresh snapshot for a new player.
    pub fn load_or_default(store: S, user_id: impl Into<String>) -> Result<Self, GamificationError> {
        let user_id = user_id.into();
        let snapshot = store.load(&user_id)?.unwrap_or_default();
        debug!(target: "gamification", user = %user_id, xp = snapshot.stats.total_xp, "Loaded player snapshot");
        Ok(Self {
            store,
            user_id,
            snapshot,
        })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn stats(&self) -> &GameStats {
        &self.snapshot.stats
    }

    pub fn quest(&self) -> &QuestSnapshot {
        &self.snapshot.quest
    }

    pub fn completed_lessons(&self) -> &BTreeSet<i64> {
        &self.snapshot.completed_lessons
    }

    fn persist(&self) -> Result<(), GamificationError> {
        self.store.save(&self.user_id, &self.snapshot)?;
        Ok(())
    }

    /// Either a level-up or a plain XP notification per award, never both.
    fn apply_xp(&mut self, amount: u32, reason: &str) -> Vec<GameEvent> {
        let before = self.snapshot.stats.level();
        self.snapshot.stats.total_xp += amount;
        let after = self.snapshot.stats.level();

        if after > before {
            info!(target: "gamification", user = %self.user_id, level = after, "Level up");
            vec![GameEvent::LevelUp { level: after }]
        } else {
            vec![GameEvent::XpAwarded {
                amount,
                reason: reason.to_string(),
            }]
        }
    }

    /// Award XP for an external reason (bonuses, challenge completion).
    pub fn add_xp(&mut self, amount: u32, reason: &str) -> Result<Vec<GameEvent>, GamificationError> {
        if amount == 0 {
            return Err(GamificationError::InvalidXpAmount);
        }
        if reason.trim().is_empty() {
            return Err(GamificationError::EmptyReason);
        }
        let events = self.apply_xp(amount, reason);
        debug!(target: "gamification", user = %self.user_id, amount, reason, "XP awarded");
        self.persist()?;
        Ok(events)
    }

    /// Register a correct answer: streak grows, XP lands with the streak
    /// multiplier already applied. A level-up outranks a streak milestone,
    /// so only one of the two is emitted.
    pub fn correct_answer(&mut self) -> Result<Vec<GameEvent>, GamificationError> {
        if self.snapshot.stats.game_over() {
            return Err(GamificationError::GameOver);
        }

        let stats = &mut self.snapshot.stats;
        stats.streak += 1;
        stats.max_streak = stats.max_streak.max(stats.streak);
        let streak = stats.streak;
        let xp = (f64::from(CORRECT_ANSWER_XP) * stats.multiplier()).floor() as u32;

        let mut events = self.apply_xp(xp, "Correct answer");
        let leveled = events
            .iter()
            .any(|e| matches!(e, GameEvent::LevelUp { .. }));
        if !leveled {
            if let Some(message) = streak_milestone(streak) {
                events.push(GameEvent::StreakMilestone {
                    streak,
                    message: message.to_string(),
                });
            }
        }

        info!(target: "gamification", user = %self.user_id, xp, streak, "Correct answer");
        self.persist()?;
        Ok(events)
    }

    /// Register a wrong answer: lose a heart, break the streak. Once the
    /// player is already out of hearts this is a no-op.
    pub fn incorrect_answer(&mut self) -> Result<Vec<GameEvent>, GamificationError> {
        if self.snapshot.stats.game_over() {
            return Ok(Vec::new());
        }

        let stats = &mut self.snapshot.stats;
        let mut events = Vec::new();
        if stats.streak > 0 {
            events.push(GameEvent::StreakBroken);
        }
        stats.streak = 0;
        stats.hearts = stats.hearts.saturating_sub(1);
        events.push(GameEvent::HeartLost {
            remaining: stats.hearts,
        });
        if stats.hearts == 0 {
            warn!(target: "gamification", user = %self.user_id, "Out of hearts");
            events.push(GameEvent::GameOver);
        } else {
            info!(target: "gamification", user = %self.user_id, hearts = stats.hearts, "Heart lost");
        }

        self.persist()?;
        Ok(events)
    }

    /// Record a finished lesson and award its XP. Completing the same
    /// lesson twice is idempotent: the set is unchanged and no XP lands.
    pub fn complete_lesson(
        &mut self,
        lesson_id: i64,
        title: &str,
        accuracy: u32,
    ) -> Result<Vec<GameEvent>, GamificationError> {
        if accuracy > 100 {
            return Err(GamificationError::InvalidAccuracy(accuracy));
        }
        if !self.snapshot.completed_lessons.insert(lesson_id) {
            debug!(target: "gamification", user = %self.user_id, lesson_id, "Lesson already completed");
            return Ok(Vec::new());
        }
        let stats = &mut self.snapshot.stats;
        let total = f64::from(stats.accuracy) * f64::from(stats.lessons_completed);
        stats.lessons_completed += 1;
        stats.accuracy =
            ((total + f64::from(accuracy)) / f64::from(stats.lessons_completed)).round() as u32;

        let xp = lesson_xp(title, accuracy);
        let events = self.apply_xp(xp, &format!("Completed {title}"));
        info!(target: "gamification", user = %self.user_id, lesson_id, xp, accuracy, "Lesson completed");
        self.persist()?;
        Ok(events)
    }

    /// Grant a badge once; repeat grants are silently ignored.
    pub fn award_badge(&mut self, badge: &str) -> Result<Vec<GameEvent>, GamificationError> {
        if !self.snapshot.stats.badges.insert(badge.to_string()) {
            return Ok(Vec::new());
        }
        info!(target: "gamification", user = %self.user_id, badge, "Badge earned");
        self.persist()?;
        Ok(vec![GameEvent::BadgeEarned {
            badge: badge.to_string(),
        }])
    }

    /// Partial reset after running out of hearts: hearts refill and the
    /// streak restarts, but XP, level and badges are kept.
    pub fn reset_after_game_over(&mut self) -> Result<(), GamificationError> {
        self.snapshot.stats.hearts = MAX_HEARTS;
        self.snapshot.stats.streak = 0;
        info!(target: "gamification", user = %self.user_id, "Hearts refilled");
        self.persist()
    }

    /// Fold in the backend's view of the account. The server is the
    /// authority for lifetime XP and badges, so its numbers win when they
    /// are ahead; hearts and the live streak stay local.
    pub fn reconcile(&mut self, user: &User) -> Result<(), GamificationError> {
        let stats = &mut self.snapshot.stats;
        if user.total_xp > stats.total_xp {
            debug!(
                target: "gamification",
                user = %self.user_id,
                local = stats.total_xp,
                server = user.total_xp,
                "Adopting server XP"
            );
            stats.total_xp = user.total_xp;
        }
        for badge in &user.badges {
            stats.badges.insert(badge.clone());
        }
        if let Some(remote) = &user.game_stats {
            stats.max_streak = stats.max_streak.max(remote.max_streak);
            stats.lessons_completed = stats.lessons_completed.max(remote.challenges_completed);
        }
        self.persist()
    }

    /// Replace the stored quest position (called by the quest game after
    /// every submission).
    pub fn set_quest(&mut self, quest: QuestSnapshot) -> Result<(), GamificationError> {
        self.snapshot.quest = quest;
        self.persist()
    }
}
