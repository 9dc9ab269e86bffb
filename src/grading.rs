//! Answer grading for quest challenges.
//!
//! Grading is pure and side-effect free: `AttemptState::submit` only
//! tracks attempts for one challenge and reports what happened. Hearts,
//! XP and persistence belong to the gamification engine; the quest game
//! wires the two together.
//!
//! Rules:
//! - Numeric answers pass within the challenge tolerance; misses get a
//!   closeness band so the player knows whether to refine or restart.
//! - Text answers compare normalized (lowercased, whitespace stripped).
//! - Malformed or empty input is an input error and consumes no attempt.
//! - Hints unlock from the second failed attempt; the third failure locks
//!   the challenge and reveals the answer and explanation.

use thiserror::Error;
use tracing::debug;

use crate::domain::{Challenge, ExpectedAnswer};
use crate::util::normalize_answer;

pub const MAX_ATTEMPTS: u32 = 3;
pub const BASE_REWARD_XP: u32 = 50;

#[derive(Debug, Error)]
pub enum GradeError {
    #[error("answer is empty")]
    EmptyAnswer,

    #[error("expected a number, got {0:?}")]
    NotANumber(String),

    #[error("challenge is already solved")]
    AlreadySolved,

    #[error("no attempts left; the answer has been revealed")]
    AttemptsExhausted,
}

/// How far off a numeric miss was, in multiples of the tolerance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Closeness {
    VeryClose,
    Warmer,
    NotClose,
}

impl Closeness {
    fn band(diff: f64, tolerance: f64) -> Self {
        if diff <= 2.0 * tolerance {
            Closeness::VeryClose
        } else if diff <= 5.0 * tolerance {
            Closeness::Warmer
        } else {
            Closeness::NotClose
        }
    }

    pub fn feedback(&self) -> &'static str {
        match self {
            Closeness::VeryClose => "Very close! Check your arithmetic.",
            Closeness::Warmer => "Warmer. Revisit the formula.",
            Closeness::NotClose => "Not close. Reread the question.",
        }
    }
}

/// Reward scales with how quickly the challenge fell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RewardTier {
    Perfect,
    Great,
    Good,
}

impl RewardTier {
    fn for_failed_attempts(failed: u32) -> Self {
        match failed {
            0 => RewardTier::Perfect,
            1 => RewardTier::Great,
            _ => RewardTier::Good,
        }
    }

    /// Base reward times the remaining-attempt factor: 150, 100, 50.
    pub fn xp(&self) -> u32 {
        match self {
            RewardTier::Perfect => BASE_REWARD_XP * 3,
            RewardTier::Great => BASE_REWARD_XP * 2,
            RewardTier::Good => BASE_REWARD_XP,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            RewardTier::Perfect => "Perfect! First try!",
            RewardTier::Great => "Great! Got it on the second try.",
            RewardTier::Good => "Solved it!",
        }
    }
}

/// Answer and explanation disclosed after the final failed attempt.
#[derive(Clone, Debug, PartialEq)]
pub struct Reveal {
    pub correct_answer: String,
    pub explanation: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Grade {
    Correct {
        tier: RewardTier,
        xp: u32,
    },
    Incorrect {
        closeness: Option<Closeness>,
        attempts_used: u32,
        hint: Option<String>,
        reveal: Option<Reveal>,
    },
}

/// Attempt bookkeeping for a single challenge.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AttemptState {
    attempts: u32,
    solved: bool,
}

fn check(expected: &ExpectedAnswer, raw: &str) -> Result<(bool, Option<Closeness>), GradeError> {
    match expected {
        ExpectedAnswer::Number { value, tolerance } => {
            let parsed: f64 = raw
                .trim()
                .parse()
                .map_err(|_| GradeError::NotANumber(raw.trim().to_string()))?;
            if !parsed.is_finite() {
                return Err(GradeError::NotANumber(raw.trim().to_string()));
            }
            let diff = (parsed - value).abs();
            if diff <= *tolerance {
                Ok((true, None))
            } else {
                Ok((false, Some(Closeness::band(diff, *tolerance))))
            }
        }
        ExpectedAnswer::Text { accepted } => {
            let normalized = normalize_answer(raw);
            let hit = accepted.iter().any(|a| normalize_answer(a) == normalized);
            Ok((hit, None))
        }
    }
}

impl AttemptState {
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn solved(&self) -> bool {
        self.solved
    }

    /// All attempts spent without solving; only the reveal remains.
    pub fn locked(&self) -> bool {
        !self.solved && self.attempts >= MAX_ATTEMPTS
    }

    /// Grade one submission against the challenge. Input errors (empty or
    /// unparsable answers) never consume an attempt.
    pub fn submit(&mut self, challenge: &Challenge, raw: &str) -> Result<Grade, GradeError> {
        if self.solved {
            return Err(GradeError::AlreadySolved);
        }
        if self.locked() {
            return Err(GradeError::AttemptsExhausted);
        }
        if raw.trim().is_empty() {
            return Err(GradeError::EmptyAnswer);
        }

        let (correct, closeness) = check(&challenge.expected, raw)?;

        if correct {
            let tier = RewardTier::for_failed_attempts(self.attempts);
            self.solved = true;
            debug!(target: "quest", challenge = %challenge.id, attempts = self.attempts, "Challenge solved");
            return Ok(Grade::Correct { tier, xp: tier.xp() });
        }

        self.attempts += 1;
        let hint = if self.attempts >= 2 && !challenge.hints.is_empty() {
            let idx = (self.attempts as usize - 2).min(challenge.hints.len() - 1);
            Some(challenge.hints[idx].clone())
        } else {
            None
        };
        let reveal = if self.attempts >= MAX_ATTEMPTS {
            Some(Reveal {
                correct_answer: challenge.expected.display(),
                explanation: challenge.explanation.clone(),
            })
        } else {
            None
        };
        debug!(target: "quest", challenge = %challenge.id, attempts = self.attempts, "Wrong answer");

        Ok(Grade::Incorrect {
            closeness,
            attempts_used: self.attempts,
            hint,
            reveal,
        })
    }
}
