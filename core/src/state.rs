//! The single mutable game-state record.
//!
//! Owned by the engine and passed explicitly to every operation.
//! Serialized as the persisted save (camelCase keys, matching saves
//! written by earlier builds of the game).

use crate::{
    config::SimConfig,
    progression,
    types::{FieldId, MetricKey, PoliticalLevel, Xp, Year},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub current_year: Year,
    /// Inclusive end of the simulation horizon.
    pub max_year: Year,
    #[serde(default = "default_level")]
    pub political_level: PoliticalLevel,
    /// Cached score of `political_level`.
    #[serde(default = "default_score")]
    pub political_level_score: f64,
    pub net_worth: f64,
    pub wealth_growth_rate: f64,
    pub expertise: BTreeMap<FieldId, Xp>,
    #[serde(default, alias = "dbe_deployment")]
    pub dbe_deployment: BTreeMap<FieldId, bool>,
    /// Question texts already answered or exhausted, oldest first.
    #[serde(default)]
    pub quiz_history: Vec<String>,
    /// Live value of every economic metric.
    #[serde(default)]
    pub economy: BTreeMap<MetricKey, f64>,
}

fn default_level() -> PoliticalLevel {
    PoliticalLevel::Mayor
}

fn default_score() -> f64 {
    1.0
}

impl GameState {
    /// Fresh game from the configured starting values.
    pub fn new(config: &SimConfig) -> Self {
        let init = &config.initial_state;
        let first = &config.ranks[0];
        let mut state = Self {
            current_year:          init.start_year,
            max_year:              init.max_year,
            political_level:       first.level,
            political_level_score: first.score,
            net_worth:             init.net_worth,
            wealth_growth_rate:    init.wealth_growth_rate,
            expertise:             BTreeMap::new(),
            dbe_deployment:        BTreeMap::new(),
            quiz_history:          Vec::new(),
            economy:               BTreeMap::new(),
        };
        state.normalize(config);
        state
    }

    /// Parse a persisted save. Fails closed: anything unparseable or
    /// violating the state invariants yields `None`, and the caller
    /// starts a fresh game instead.
    pub fn restore(json: &str, config: &SimConfig) -> Option<Self> {
        let mut state: GameState = match serde_json::from_str(json) {
            Ok(s) => s,
            Err(e) => {
                log::warn!("discarding unreadable save: {e}");
                return None;
            }
        };

        if let Err(reason) = state.check_invariants() {
            log::warn!("discarding invalid save: {reason}");
            return None;
        }

        state.normalize(config);
        Some(state)
    }

    fn check_invariants(&self) -> Result<(), String> {
        if !self.net_worth.is_finite() || self.net_worth < 0.0 {
            return Err(format!("net worth {} is not a non-negative number", self.net_worth));
        }
        if !self.wealth_growth_rate.is_finite() || self.wealth_growth_rate < 0.0 {
            return Err(format!(
                "wealth growth rate {} is not a non-negative number",
                self.wealth_growth_rate
            ));
        }
        if self.current_year > self.max_year {
            return Err(format!(
                "current year {} is past max year {}",
                self.current_year, self.max_year
            ));
        }
        Ok(())
    }

    /// Fill in anything an older save may lack: missing fields get zero
    /// XP and an undeployed flag, missing metrics start at baseline, the
    /// history loses duplicates and the cached rank is re-derived.
    fn normalize(&mut self, config: &SimConfig) {
        for field in FieldId::ALL {
            self.expertise.entry(field).or_insert(0);
            self.dbe_deployment.entry(field).or_insert(false);
        }

        for (key, metric) in &config.economy.metrics {
            self.economy.entry(key.clone()).or_insert(metric.initial);
        }

        let mut seen = std::collections::HashSet::new();
        self.quiz_history.retain(|id| seen.insert(id.clone()));

        let rank = progression::current_rank(config, self.total_xp());
        self.political_level = rank.level;
        self.political_level_score = rank.score;
    }

    pub fn total_xp(&self) -> Xp {
        progression::total_xp(self)
    }

    pub fn xp(&self, field: FieldId) -> Xp {
        self.expertise.get(&field).copied().unwrap_or(0)
    }

    pub fn is_deployed(&self, field: FieldId) -> bool {
        self.dbe_deployment.get(&field).copied().unwrap_or(false)
    }

    pub fn deployed_fields(&self) -> impl Iterator<Item = FieldId> + '_ {
        FieldId::ALL.into_iter().filter(|f| self.is_deployed(*f))
    }

    pub fn all_deployed(&self) -> bool {
        FieldId::ALL.iter().all(|f| self.is_deployed(*f))
    }

    /// Record a question as seen. Returns false if it already was.
    pub fn record_seen(&mut self, question_text: &str) -> bool {
        if self.quiz_history.iter().any(|id| id == question_text) {
            return false;
        }
        self.quiz_history.push(question_text.to_string());
        true
    }

    /// Keep only the most recent `window` history entries.
    pub fn truncate_history(&mut self, window: usize) {
        let len = self.quiz_history.len();
        if len > window {
            self.quiz_history.drain(..len - window);
        }
    }
}
