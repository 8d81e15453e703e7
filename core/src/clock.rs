//! Simulation clock — owns the year step and end-state evaluation.
//!
//! YEAR STEP ORDER (fixed, never reordered):
//!   1. Stop if the horizon is reached (no mutation).
//!   2. Increment the year.
//!   3. Compound net worth.
//!   4. Trim the quiz history window.
//!   5. Economic model step.
//!   6. Evaluate the end state.

use crate::{
    config::SimConfig,
    economics_subsystem,
    progression,
    state::GameState,
    types::{MetricKey, Year},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Net worth that counts as having become a trillionaire.
pub const TRILLION: f64 = 1e12;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GameOutcome {
    /// Every field deployed while holding the top office.
    Victory,
    /// Horizon reached with at least a trillion in net worth.
    Trillionaire,
    /// Horizon reached without either goal.
    TermExpired,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameEnd {
    pub outcome: GameOutcome,
    pub summary: String,
}

/// Result of one `advance_time` call.
#[derive(Debug, Clone, PartialEq)]
pub enum YearStep {
    Advanced {
        year:      Year,
        net_worth: f64,
        metrics:   BTreeMap<MetricKey, f64>,
        end:       Option<GameEnd>,
    },
    /// Horizon already reached; nothing changed.
    AtHorizon(GameEnd),
}

impl YearStep {
    pub fn end(&self) -> Option<&GameEnd> {
        match self {
            Self::Advanced { end, .. } => end.as_ref(),
            Self::AtHorizon(end) => Some(end),
        }
    }
}

pub fn advance_time(state: &mut GameState, config: &SimConfig) -> YearStep {
    if state.current_year >= state.max_year {
        let end = check_game_end(state, config)
            .unwrap_or_else(|| summarize(state, config, GameOutcome::TermExpired));
        return YearStep::AtHorizon(end);
    }

    state.current_year += 1;

    let growth = state.wealth_growth_rate + economics_subsystem::annual_wealth_boost(state, config);
    state.net_worth *= 1.0 + growth;

    state.truncate_history(config.tunables.history_window);

    let metrics = economics_subsystem::step(state, config);

    let end = check_game_end(state, config);
    log::debug!(
        "year={} net_worth={:.2} history={} end={:?}",
        state.current_year,
        state.net_worth,
        state.quiz_history.len(),
        end.as_ref().map(|e| e.outcome)
    );

    YearStep::Advanced {
        year: state.current_year,
        net_worth: state.net_worth,
        metrics,
        end,
    }
}

/// Pure end-state predicate. `None` while the game is still running.
pub fn check_game_end(state: &GameState, config: &SimConfig) -> Option<GameEnd> {
    let top = config.top_rank();
    let at_top = progression::current_rank(config, state.total_xp()).level == top.level;

    if state.all_deployed() && at_top {
        return Some(summarize(state, config, GameOutcome::Victory));
    }
    if state.current_year >= state.max_year {
        let outcome = if state.net_worth >= TRILLION {
            GameOutcome::Trillionaire
        } else {
            GameOutcome::TermExpired
        };
        return Some(summarize(state, config, outcome));
    }
    None
}

fn summarize(state: &GameState, config: &SimConfig, outcome: GameOutcome) -> GameEnd {
    let deployed = state.deployed_fields().count();
    let rank = progression::current_rank(config, state.total_xp()).level;
    let headline = match outcome {
        GameOutcome::Victory => "Every DBE subsystem is deployed under your presidency.",
        GameOutcome::Trillionaire => "Your time is up, but you retire a trillionaire.",
        GameOutcome::TermExpired => "Your time is up.",
    };
    GameEnd {
        outcome,
        summary: format!(
            "{headline} Year {}: {rank}, net worth ${:.2}, {} total XP, {deployed}/5 systems deployed.",
            state.current_year,
            state.net_worth,
            state.total_xp(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FieldId;

    #[test]
    fn advance_increments_year_and_compounds_wealth() {
        let config = SimConfig::default_test();
        let mut state = GameState::new(&config);

        let step = advance_time(&mut state, &config);

        assert_eq!(state.current_year, 2008);
        assert!((state.net_worth - 11_000.0).abs() < 1e-9);
        assert!(matches!(step, YearStep::Advanced { year: 2008, end: None, .. }));
    }

    #[test]
    fn fracton_deployment_boosts_growth() {
        let config = SimConfig::default_test();
        let mut state = GameState::new(&config);
        state.dbe_deployment.insert(FieldId::FractonMemory, true);

        advance_time(&mut state, &config);
        assert!((state.net_worth - 10_000.0 * 1.11).abs() < 1e-9);
    }

    #[test]
    fn horizon_is_idempotent() {
        let config = SimConfig::default_test();
        let mut state = GameState::new(&config);
        state.current_year = state.max_year;
        let before = state.clone();

        let first = advance_time(&mut state, &config);
        let second = advance_time(&mut state, &config);

        assert_eq!(state, before);
        assert_eq!(first, second);
        assert_eq!(first.end().unwrap().outcome, GameOutcome::TermExpired);
    }

    #[test]
    fn reaching_horizon_reports_end() {
        let config = SimConfig::default_test();
        let mut state = GameState::new(&config);
        state.current_year = state.max_year - 1;

        let step = advance_time(&mut state, &config);
        assert_eq!(step.end().unwrap().outcome, GameOutcome::TermExpired);
    }

    #[test]
    fn trillionaire_at_horizon() {
        let config = SimConfig::default_test();
        let mut state = GameState::new(&config);
        state.current_year = state.max_year;
        state.net_worth = 2e12;

        assert_eq!(check_game_end(&state, &config).unwrap().outcome, GameOutcome::Trillionaire);
    }

    #[test]
    fn victory_needs_all_deployed_and_top_rank() {
        let config = SimConfig::default_test();
        let mut state = GameState::new(&config);
        for field in FieldId::ALL {
            state.dbe_deployment.insert(field, true);
            state.expertise.insert(field, 5);
        }
        // 25 XP is Governor
        assert!(check_game_end(&state, &config).is_none());

        state.expertise.insert(FieldId::FractonMemory, 10);
        let end = check_game_end(&state, &config).unwrap();
        assert_eq!(end.outcome, GameOutcome::Victory);
        assert!(end.summary.contains("5/5"));
    }
}
