//! Read-only status snapshot for the presentation layer.
//!
//! Everything here is derived from `GameState` + the quiz phase. The
//! presentation layer reconciles its widgets against `AvailableActions`;
//! the core never builds or removes UI elements itself.

use crate::{
    clock::{self, GameEnd},
    config::SimConfig,
    progression,
    quiz_subsystem::{self, QuizEngine, QuizPhase},
    state::GameState,
    types::{FieldId, MetricKey, PoliticalLevel, Xp},
    voting_subsystem,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeployStatus {
    Deployed,
    ReadyToVote,
    Researching,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldStatus {
    pub xp: Xp,
    pub status: DeployStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricStatus {
    pub initial: f64,
    pub current: f64,
    pub unit: String,
}

/// The active question as shown to the player. Never carries the
/// correct answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuizPrompt {
    pub question: String,
    pub field: FieldId,
    pub level: u8,
    pub answers: Vec<String>,
    pub attempts_left: u8,
    pub hint: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AvailableActions {
    pub votable: BTreeSet<FieldId>,
    pub can_answer: bool,
    pub can_advance_time: bool,
    /// Milliseconds until the host should send `CompletePendingAdvance`.
    pub pending_advance_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusSnapshot {
    pub state: GameState,
    pub total_xp: Xp,
    pub voting_weight: f64,
    pub rank: PoliticalLevel,
    pub rank_score: f64,
    pub max_question_level: u8,
    pub fields: BTreeMap<FieldId, FieldStatus>,
    pub metrics: BTreeMap<MetricKey, MetricStatus>,
    pub eligible_question_count: usize,
    pub quiz: Option<QuizPrompt>,
    pub no_questions_available: bool,
    pub game_end: Option<GameEnd>,
    pub actions: AvailableActions,
}

pub fn available_actions(state: &GameState, config: &SimConfig, quiz: &QuizEngine) -> AvailableActions {
    if clock::check_game_end(state, config).is_some() {
        return AvailableActions {
            votable: BTreeSet::new(),
            can_answer: false,
            can_advance_time: false,
            pending_advance_ms: None,
        };
    }
    AvailableActions {
        votable: voting_subsystem::votable_fields(state, config).into_iter().collect(),
        can_answer: quiz.accepts_answers(),
        can_advance_time: state.current_year < state.max_year,
        pending_advance_ms: quiz.pending_advance().map(|d| d.as_millis() as u64),
    }
}

pub fn build(state: &GameState, config: &SimConfig, quiz: &QuizEngine) -> StatusSnapshot {
    let total_xp = state.total_xp();
    let rank = progression::current_rank(config, total_xp);
    let gate = config.tunables.vote_gate_xp;

    let fields = FieldId::ALL
        .into_iter()
        .map(|field| {
            let xp = state.xp(field);
            let status = if state.is_deployed(field) {
                DeployStatus::Deployed
            } else if xp >= gate {
                DeployStatus::ReadyToVote
            } else {
                DeployStatus::Researching
            };
            (field, FieldStatus { xp, status })
        })
        .collect();

    let metrics = config
        .economy
        .metrics
        .iter()
        .map(|(key, m)| {
            let current = state.economy.get(key).copied().unwrap_or(m.initial);
            (key.clone(), MetricStatus { initial: m.initial, current, unit: m.unit.clone() })
        })
        .collect();

    let prompt = quiz.active().map(|active| QuizPrompt {
        question: active.question.text.clone(),
        field: active.question.field,
        level: active.question.level,
        answers: active.answers.clone(),
        attempts_left: config.tunables.max_attempts.saturating_sub(active.wrong_attempts),
        hint: active.hint_revealed.then(|| active.question.hint.clone()),
    });

    StatusSnapshot {
        state: state.clone(),
        total_xp,
        voting_weight: progression::voting_weight(state, config).weight,
        rank: rank.level,
        rank_score: rank.score,
        max_question_level: progression::current_max_level(config, total_xp),
        fields,
        metrics,
        eligible_question_count: quiz_subsystem::eligible_questions(state, config).len(),
        quiz: prompt,
        no_questions_available: matches!(quiz.phase(), QuizPhase::NoQuestionsAvailable),
        game_end: clock::check_game_end(state, config),
        actions: available_actions(state, config, quiz),
    }
}
