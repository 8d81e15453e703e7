//! Quiz engine — question pool selection and the per-question attempt
//! state machine.
//!
//! STATES:
//!   NoQuestion ──present_next──▶ AttemptInProgress ──correct / last miss──▶ Resolved
//!        ▲                              │  ▲                                    │
//!        │                              └──┘ miss with attempts left            │
//!        └────────────── complete_pending_advance (host timer fired) ──────────┘
//!
//!   NoQuestionsAvailable is entered instead of AttemptInProgress when the
//!   pool is empty, and left by `refresh` once XP or the yearly history
//!   trim re-admits questions.
//!
//! RULES:
//!   - Answers are graded by string, never by their shuffled position.
//!   - While Resolved, further answers are rejected until the host calls
//!     `complete_pending_advance`.
//!   - A question enters the history once, when it resolves.

use crate::{
    config::{Question, SimConfig},
    error::{PreconditionError, SimResult},
    progression,
    rng::{self, RandomSource},
    state::GameState,
    types::{FieldId, PoliticalLevel, Xp},
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// The question currently being asked.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveQuestion {
    pub question:       Question,
    /// `{correct} ∪ wrong_answers`, in presentation order.
    pub answers:        Vec<String>,
    pub wrong_attempts: u8,
    pub hint_revealed:  bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    Success,
    Exhausted,
}

#[derive(Debug, Clone, PartialEq)]
pub enum QuizPhase {
    NoQuestion,
    NoQuestionsAvailable,
    AttemptInProgress(ActiveQuestion),
    Resolved {
        question:     String,
        resolution:   Resolution,
        resume_after: Duration,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnswerResult {
    Correct {
        question:      String,
        field:         FieldId,
        xp_gained:     Xp,
        wealth_gained: f64,
        /// `(from, to)` when the grant crossed a rank threshold.
        rank_change:   Option<(PoliticalLevel, PoliticalLevel)>,
    },
    Incorrect {
        question:      String,
        attempt:       u8,
        attempts_left: u8,
        hint:          String,
    },
    Exhausted {
        question:       String,
        correct_answer: String,
    },
}

/// Questions the player may be asked right now: unlocked by level and
/// not in the recent history.
pub fn eligible_questions<'a>(state: &GameState, config: &'a SimConfig) -> Vec<&'a Question> {
    let max_level = progression::current_max_level(config, state.total_xp());
    config
        .questions
        .iter()
        .filter(|q| q.level <= max_level)
        .filter(|q| !state.quiz_history.iter().any(|id| *id == q.text))
        .collect()
}

#[derive(Debug, Clone)]
pub struct QuizEngine {
    phase: QuizPhase,
}

impl Default for QuizEngine {
    fn default() -> Self { Self::new() }
}

impl QuizEngine {
    pub fn new() -> Self {
        Self { phase: QuizPhase::NoQuestion }
    }

    pub fn phase(&self) -> &QuizPhase {
        &self.phase
    }

    pub fn active(&self) -> Option<&ActiveQuestion> {
        match &self.phase {
            QuizPhase::AttemptInProgress(active) => Some(active),
            _ => None,
        }
    }

    /// Delay the host should wait before calling `complete_pending_advance`.
    pub fn pending_advance(&self) -> Option<Duration> {
        match &self.phase {
            QuizPhase::Resolved { resume_after, .. } => Some(*resume_after),
            _ => None,
        }
    }

    pub fn accepts_answers(&self) -> bool {
        matches!(self.phase, QuizPhase::AttemptInProgress(_))
    }

    /// Pick the next question from the eligible pool. Only acts from
    /// `NoQuestion` or `NoQuestionsAvailable`; returns the new phase.
    pub fn present_next(
        &mut self,
        state:  &GameState,
        config: &SimConfig,
        rng:    &mut dyn RandomSource,
    ) -> &QuizPhase {
        if !matches!(self.phase, QuizPhase::NoQuestion | QuizPhase::NoQuestionsAvailable) {
            return &self.phase;
        }

        let pool = eligible_questions(state, config);
        if pool.is_empty() {
            log::debug!("year={} quiz: no eligible questions", state.current_year);
            self.phase = QuizPhase::NoQuestionsAvailable;
            return &self.phase;
        }

        let question = pool[rng.next_index(pool.len())].clone();
        let mut answers = Vec::with_capacity(1 + question.wrong_answers.len());
        answers.push(question.correct_answer.clone());
        answers.extend(question.wrong_answers.iter().cloned());
        rng::shuffle(rng, &mut answers);

        log::debug!(
            "year={} quiz: presenting level {} {} question ({} eligible)",
            state.current_year,
            question.level,
            question.field,
            pool.len()
        );

        self.phase = QuizPhase::AttemptInProgress(ActiveQuestion {
            question,
            answers,
            wrong_attempts: 0,
            hint_revealed: false,
        });
        &self.phase
    }

    /// Re-run selection after eligibility may have changed (year advance).
    /// Returns true if a new question was presented.
    pub fn refresh(
        &mut self,
        state:  &GameState,
        config: &SimConfig,
        rng:    &mut dyn RandomSource,
    ) -> bool {
        if !matches!(self.phase, QuizPhase::NoQuestionsAvailable) {
            return false;
        }
        matches!(self.present_next(state, config, rng), QuizPhase::AttemptInProgress(_))
    }

    /// Grade `answer` against the active question.
    pub fn submit_answer(
        &mut self,
        state:  &mut GameState,
        config: &SimConfig,
        answer: &str,
    ) -> SimResult<AnswerResult> {
        let active = match &mut self.phase {
            QuizPhase::AttemptInProgress(active) => active,
            QuizPhase::Resolved { .. } => return Err(PreconditionError::AwaitingNextQuestion.into()),
            QuizPhase::NoQuestion | QuizPhase::NoQuestionsAvailable => {
                return Err(PreconditionError::NoQuestionAvailable.into())
            }
        };
        let t = &config.tunables;
        let text = active.question.text.clone();

        if answer == active.question.correct_answer {
            let field = active.question.field;
            let result = grant_correct(state, config, field, &text);
            self.phase = QuizPhase::Resolved {
                question:     text,
                resolution:   Resolution::Success,
                resume_after: Duration::from_millis(t.correct_advance_delay_ms),
            };
            return Ok(result);
        }

        active.wrong_attempts += 1;
        if active.wrong_attempts < t.max_attempts {
            active.hint_revealed = true;
            return Ok(AnswerResult::Incorrect {
                question:      text,
                attempt:       active.wrong_attempts,
                attempts_left: t.max_attempts - active.wrong_attempts,
                hint:          active.question.hint.clone(),
            });
        }

        let correct_answer = active.question.correct_answer.clone();
        state.record_seen(&text);
        log::debug!("year={} quiz: question exhausted", state.current_year);
        self.phase = QuizPhase::Resolved {
            question:     text.clone(),
            resolution:   Resolution::Exhausted,
            resume_after: Duration::from_millis(t.exhausted_advance_delay_ms),
        };
        Ok(AnswerResult::Exhausted { question: text, correct_answer })
    }

    /// The host's timer fired: leave `Resolved` and pick the next question.
    pub fn complete_pending_advance(
        &mut self,
        state:  &GameState,
        config: &SimConfig,
        rng:    &mut dyn RandomSource,
    ) -> SimResult<&QuizPhase> {
        if !matches!(self.phase, QuizPhase::Resolved { .. }) {
            return Err(PreconditionError::NoPendingAdvance.into());
        }
        self.phase = QuizPhase::NoQuestion;
        Ok(self.present_next(state, config, rng))
    }

    /// Drop whatever is in flight. Used by reset.
    pub fn clear(&mut self) {
        self.phase = QuizPhase::NoQuestion;
    }
}

/// XP to the field, wealth scaled by the rank held at grant time, history,
/// then rank re-derivation.
fn grant_correct(
    state:  &mut GameState,
    config: &SimConfig,
    field:  FieldId,
    text:   &str,
) -> AnswerResult {
    let t = &config.tunables;
    let xp_gained = t.xp_per_answer;
    let wealth_gained = xp_gained as f64 * t.wealth_per_xp * state.political_level_score;

    *state.expertise.entry(field).or_insert(0) += xp_gained;
    state.net_worth += wealth_gained;
    state.record_seen(text);

    let from = state.political_level;
    let rank = progression::current_rank(config, state.total_xp());
    state.political_level = rank.level;
    state.political_level_score = rank.score;

    let rank_change = (from != rank.level).then_some((from, rank.level));
    if let Some((from, to)) = rank_change {
        log::info!("year={} rank: {from} -> {to}", state.current_year);
    }

    AnswerResult::Correct {
        question: text.to_string(),
        field,
        xp_gained,
        wealth_gained,
        rank_change,
    }
}
