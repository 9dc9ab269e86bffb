//! The scripted quest mini-game.
//!
//! `QuestGame` walks the player through the built-in challenge bank and
//! reports every submission to the gamification engine: correct answers
//! earn streak XP plus the grading reward plus the challenge completion
//! bonus and badges; wrong answers cost a heart. The quest position is
//! stored in the player snapshot so a later session resumes where the
//! last one stopped.

use std::collections::{BTreeSet, HashMap};

use thiserror::Error;
use tracing::info;

use crate::domain::Challenge;
use crate::gamification::{GameEvent, Gamification, GamificationError};
use crate::grading::{AttemptState, Grade, GradeError};
use crate::seeds;
use crate::store::{ProgressStore, QuestSnapshot};

#[derive(Debug, Error)]
pub enum QuestError {
    #[error(transparent)]
    Grade(#[from] GradeError),

    #[error(transparent)]
    Game(#[from] GamificationError),

    #[error("every challenge is already completed")]
    Finished,

    #[error("out of hearts; reset before continuing the quest")]
    GameOver,
}

/// Everything one submission produced, for the caller to render.
#[derive(Debug)]
pub struct QuestOutcome {
    pub grade: Grade,
    pub events: Vec<GameEvent>,
    pub challenge_complete: bool,
    pub quest_complete: bool,
}

pub struct QuestGame {
    challenges: Vec<Challenge>,
    current: usize,
    completed: BTreeSet<String>,
    /// Attempt counters are per run and deliberately not persisted.
    attempts: HashMap<String, AttemptState>,
}

impl QuestGame {
    /// Fresh run over the built-in challenge bank.
    pub fn new() -> Self {
        Self::with_challenges(seeds::quest_challenges())
    }

    pub fn with_challenges(challenges: Vec<Challenge>) -> Self {
        Self {
            challenges,
            current: 0,
            completed: BTreeSet::new(),
            attempts: HashMap::new(),
        }
    }

    /// Resume from a stored quest position. Ids no longer present in the
    /// bank are dropped; the current index is clamped into range.
    pub fn resume(challenges: Vec<Challenge>, snapshot: &QuestSnapshot) -> Self {
        let known: BTreeSet<&str> = challenges.iter().map(|c| c.id.as_str()).collect();
        let completed = snapshot
            .completed_challenges
            .iter()
            .filter(|id| known.contains(id.as_str()))
            .cloned()
            .collect();
        let current = snapshot.current_challenge.min(challenges.len().saturating_sub(1));
        let mut game = Self {
            challenges,
            current,
            completed,
            attempts: HashMap::new(),
        };
        if game.is_challenge_completed(game.current) {
            game.advance();
        }
        game
    }

    pub fn current_challenge(&self) -> Option<&Challenge> {
        if self.is_complete() {
            None
        } else {
            self.challenges.get(self.current)
        }
    }

    pub fn is_complete(&self) -> bool {
        self.challenges
            .iter()
            .all(|c| self.completed.contains(&c.id))
    }

    /// (completed, total) for progress display.
    pub fn progress(&self) -> (usize, usize) {
        (self.completed.len(), self.challenges.len())
    }

    pub fn attempts_for(&self, id: &str) -> u32 {
        self.attempts.get(id).map_or(0, AttemptState::attempts)
    }

    pub fn snapshot(&self) -> QuestSnapshot {
        QuestSnapshot {
            current_challenge: self.current,
            completed_challenges: self.completed.clone(),
        }
    }

    fn is_challenge_completed(&self, index: usize) -> bool {
        self.challenges
            .get(index)
            .is_some_and(|c| self.completed.contains(&c.id))
    }

    /// Move `current` to the next uncompleted challenge, wrapping around
    /// so earlier skipped challenges come back up.
    fn advance(&mut self) {
        let total = self.challenges.len();
        for step in 1..=total {
            let idx = (self.current + step) % total;
            if !self.is_challenge_completed(idx) {
                self.current = idx;
                return;
            }
        }
    }

    /// Grade a submission for the current challenge and apply the
    /// consequences through the gamification engine.
    pub fn submit_answer<S: ProgressStore>(
        &mut self,
        game: &mut Gamification<S>,
        raw: &str,
    ) -> Result<QuestOutcome, QuestError> {
        if game.stats().game_over() {
            return Err(QuestError::GameOver);
        }
        let challenge = self.current_challenge().cloned().ok_or(QuestError::Finished)?;

        let state = self.attempts.entry(challenge.id.clone()).or_default();
        let grade = state.submit(&challenge, raw)?;

        match &grade {
            Grade::Correct { tier, xp } => {
                let mut events = game.correct_answer()?;
                events.extend(game.add_xp(*xp, tier.message())?);
                events.extend(game.add_xp(challenge.xp, &format!("{} complete", challenge.title))?);
                for badge in &challenge.badges {
                    events.extend(game.award_badge(badge)?);
                }

                self.completed.insert(challenge.id.clone());
                self.advance();
                game.set_quest(self.snapshot())?;

                let quest_complete = self.is_complete();
                if quest_complete {
                    info!(target: "quest", user = %game.user_id(), "Quest line complete");
                }
                Ok(QuestOutcome {
                    grade,
                    events,
                    challenge_complete: true,
                    quest_complete,
                })
            }
            Grade::Incorrect { .. } => {
                let events = game.incorrect_answer()?;
                Ok(QuestOutcome {
                    grade,
                    events,
                    challenge_complete: false,
                    quest_complete: false,
                })
            }
        }
    }

    /// Skip past a locked (or just unwanted) challenge. The quest comes
    /// back around to it because `advance` wraps.
    pub fn skip_to_next<S: ProgressStore>(
        &mut self,
        game: &mut Gamification<S>,
    ) -> Result<Option<&Challenge>, QuestError> {
        if self.is_complete() {
            return Err(QuestError::Finished);
        }
        self.advance();
        game.set_quest(self.snapshot())?;
        Ok(self.challenges.get(self.current))
    }

    /// Clear attempt counters for uncompleted challenges so a player who
    /// refilled their hearts gets fresh tries (solved work is kept).
    pub fn reset_run(&mut self) {
        self.attempts.retain(|id, _| self.completed.contains(id));
    }
}

impl Default for QuestGame {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ExpectedAnswer;
    use crate::store::MemoryStore;

    fn challenge(id: &str, value: f64, xp: u32, badges: &[&str]) -> Challenge {
        Challenge {
            id: id.into(),
            title: format!("Challenge {id}"),
            story: String::new(),
            question: "?".into(),
            expected: ExpectedAnswer::Number {
                value,
                tolerance: 0.1,
            },
            hints: vec!["hint one".into(), "hint two".into()],
            explanation: Some("because".into()),
            xp,
            badges: badges.iter().map(|b| b.to_string()).collect(),
        }
    }

    fn engine() -> Gamification<MemoryStore> {
        Gamification::load_or_default(MemoryStore::new(), "1").unwrap()
    }

    #[test]
    fn correct_answer_awards_streak_reward_and_completion_xp() {
        let mut game = engine();
        let mut quest = QuestGame::with_challenges(vec![
            challenge("a", 10.0, 50, &["Explorer"]),
            challenge("b", 20.0, 75, &[]),
        ]);

        let outcome = quest.submit_answer(&mut game, "10").unwrap();
        assert!(outcome.challenge_complete);
        assert!(!outcome.quest_complete);
        // 25 streak XP + 150 first-try reward + 50 completion bonus
        assert_eq!(game.stats().total_xp, 225);
        assert!(game.stats().badges.contains("Explorer"));
        assert_eq!(quest.current_challenge().unwrap().id, "b");
        assert_eq!(game.quest().completed_challenges.len(), 1);
    }

    #[test]
    fn wrong_answer_costs_a_heart_and_keeps_position() {
        let mut game = engine();
        let mut quest = QuestGame::with_challenges(vec![challenge("a", 10.0, 50, &[])]);

        let outcome = quest.submit_answer(&mut game, "99").unwrap();
        assert!(!outcome.challenge_complete);
        assert_eq!(game.stats().hearts, 2);
        assert_eq!(game.stats().total_xp, 0);
        assert_eq!(quest.current_challenge().unwrap().id, "a");
    }

    #[test]
    fn malformed_input_touches_neither_hearts_nor_attempts() {
        let mut game = engine();
        let mut quest = QuestGame::with_challenges(vec![challenge("a", 10.0, 50, &[])]);

        assert!(matches!(
            quest.submit_answer(&mut game, "not a number"),
            Err(QuestError::Grade(GradeError::NotANumber(_)))
        ));
        assert_eq!(game.stats().hearts, 3);
        assert_eq!(quest.attempts_for("a"), 0);
    }

    #[test]
    fn quest_refuses_submissions_after_game_over() {
        let mut game = engine();
        let mut quest = QuestGame::with_challenges(vec![challenge("a", 10.0, 50, &[])]);

        for _ in 0..3 {
            quest.submit_answer(&mut game, "99").unwrap();
        }
        assert!(game.stats().game_over());
        assert!(matches!(
            quest.submit_answer(&mut game, "10"),
            Err(QuestError::GameOver)
        ));

        game.reset_after_game_over().unwrap();
        quest.reset_run();
        let outcome = quest.submit_answer(&mut game, "10").unwrap();
        assert!(outcome.challenge_complete);
        assert!(outcome.quest_complete);
    }

    #[test]
    fn skipping_wraps_back_to_unfinished_challenges() {
        let mut game = engine();
        let mut quest = QuestGame::with_challenges(vec![
            challenge("a", 10.0, 50, &[]),
            challenge("b", 20.0, 75, &[]),
        ]);

        let next = quest.skip_to_next(&mut game).unwrap().unwrap();
        assert_eq!(next.id, "b");
        quest.submit_answer(&mut game, "20").unwrap();
        // only "a" remains, so the cursor wraps back to it
        assert_eq!(quest.current_challenge().unwrap().id, "a");
    }

    #[test]
    fn resume_restores_position_and_drops_unknown_ids() {
        let snapshot = QuestSnapshot {
            current_challenge: 1,
            completed_challenges: BTreeSet::from(["a".to_string(), "gone".to_string()]),
        };
        let quest = QuestGame::resume(
            vec![challenge("a", 10.0, 50, &[]), challenge("b", 20.0, 75, &[])],
            &snapshot,
        );
        assert_eq!(quest.progress(), (1, 2));
        assert_eq!(quest.current_challenge().unwrap().id, "b");
    }
}
