//! Outward notifications — everything a presentation layer needs to
//! react to. Every emitted event is also appended to the event log.
//!
//! Variants may be added — never removed or reordered.

use crate::{
    clock::GameOutcome,
    types::{FieldId, MetricKey, PoliticalLevel, RunId, Year, Xp},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimEvent {
    // ── Engine events ──────────────────────────────
    RunInitialized {
        run_id: RunId,
        seed: u64,
    },
    StateLoaded {
        year: Year,
        /// False when no usable save existed and a fresh game began.
        restored: bool,
    },
    StateReset {
        year: Year,
    },

    // ── Quiz events ────────────────────────────────
    QuestionPresented {
        year: Year,
        question: String,
        field: FieldId,
        level: u8,
        answers: Vec<String>,
    },
    NoQuestionsAvailable {
        year: Year,
    },
    AnswerCorrect {
        year: Year,
        question: String,
        field: FieldId,
        xp_gained: Xp,
        wealth_gained: f64,
        net_worth: f64,
    },
    AnswerIncorrect {
        year: Year,
        question: String,
        attempt: u8,
        attempts_left: u8,
        hint: String,
    },
    QuestionExhausted {
        year: Year,
        question: String,
        correct_answer: String,
    },
    NextQuestionScheduled {
        year: Year,
        delay_ms: u64,
    },

    // ── Progression events ─────────────────────────
    RankChanged {
        year: Year,
        from: PoliticalLevel,
        to: PoliticalLevel,
        score: f64,
    },

    // ── Deployment events ──────────────────────────
    DeploymentVoteResolved {
        year: Year,
        field: FieldId,
        voting_weight: f64,
        pass_probability: f64,
        roll: f64,
        passed: bool,
    },

    // ── Clock events ───────────────────────────────
    YearAdvanced {
        year: Year,
        net_worth: f64,
        metrics: BTreeMap<MetricKey, f64>,
    },
    GameEnded {
        year: Year,
        outcome: GameOutcome,
        summary: String,
    },
}

impl SimEvent {
    /// Stable name used for the event_type column in event_log.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::RunInitialized { .. }         => "run_initialized",
            Self::StateLoaded { .. }            => "state_loaded",
            Self::StateReset { .. }             => "state_reset",
            Self::QuestionPresented { .. }      => "question_presented",
            Self::NoQuestionsAvailable { .. }   => "no_questions_available",
            Self::AnswerCorrect { .. }          => "answer_correct",
            Self::AnswerIncorrect { .. }        => "answer_incorrect",
            Self::QuestionExhausted { .. }      => "question_exhausted",
            Self::NextQuestionScheduled { .. }  => "next_question_scheduled",
            Self::RankChanged { .. }            => "rank_changed",
            Self::DeploymentVoteResolved { .. } => "deployment_vote_resolved",
            Self::YearAdvanced { .. }           => "year_advanced",
            Self::GameEnded { .. }              => "game_ended",
        }
    }

    /// Which component emitted the event.
    pub fn source(&self) -> &'static str {
        match self {
            Self::RunInitialized { .. } | Self::StateLoaded { .. } | Self::StateReset { .. } => "engine",
            Self::QuestionPresented { .. }
            | Self::NoQuestionsAvailable { .. }
            | Self::AnswerCorrect { .. }
            | Self::AnswerIncorrect { .. }
            | Self::QuestionExhausted { .. }
            | Self::NextQuestionScheduled { .. } => "quiz",
            Self::RankChanged { .. } => "progression",
            Self::DeploymentVoteResolved { .. } => "voting",
            Self::YearAdvanced { .. } | Self::GameEnded { .. } => "clock",
        }
    }
}

/// The event log entry as persisted to SQLite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id: Option<i64>,
    pub run_id: RunId,
    pub year: Year,
    pub source: String,
    pub event_type: String,
    pub payload: String, // JSON-serialized SimEvent
}
