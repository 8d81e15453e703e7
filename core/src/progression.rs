//! Progression model: XP totals, rank derivation, voting weight and the
//! quiz level unlocked by total XP.
//!
//! Pure functions over `GameState` + `SimConfig`. Nothing here mutates.

use crate::{
    config::{RankTier, SimConfig},
    state::GameState,
    types::{FieldId, Xp},
};

pub fn total_xp(state: &GameState) -> Xp {
    state.expertise.values().sum()
}

/// Highest rank tier whose `min_xp` is at or below `total_xp`.
pub fn current_rank(config: &SimConfig, total_xp: Xp) -> &RankTier {
    config
        .ranks
        .iter()
        .rev()
        .find(|r| r.min_xp <= total_xp)
        .unwrap_or(&config.ranks[0])
}

/// Highest question level the player may currently be asked.
pub fn current_max_level(config: &SimConfig, total_xp: Xp) -> u8 {
    let t = &config.tunables;
    let unlocked = (total_xp / t.xp_per_level).saturating_add(1);
    unlocked.min(t.max_level as Xp) as u8
}

/// Breakdown of a voting-weight computation, kept for vote reports.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VotingWeight {
    pub rank_score: f64,
    /// Saturates at 1.0 once average per-field XP reaches the vote gate.
    pub expertise_multiplier: f64,
    /// ln(net worth) / ln(trillion); above 1.0 past one trillion.
    pub wealth_factor: f64,
    pub weight: f64,
}

pub fn voting_weight(state: &GameState, config: &SimConfig) -> VotingWeight {
    let t = &config.tunables;
    let rank_score = state.political_level_score;

    let gate_total = (FieldId::ALL.len() as f64) * t.vote_gate_xp as f64;
    let expertise_multiplier = (state.total_xp() as f64 / gate_total).min(1.0);

    if !state.net_worth.is_finite() || state.net_worth <= 0.0 {
        return VotingWeight { rank_score, expertise_multiplier, wealth_factor: 0.0, weight: 0.0 };
    }
    let wealth_factor = state.net_worth.ln() / t.trillion_log_base.ln();

    let weight = rank_score * (1.0 + expertise_multiplier + wealth_factor);
    VotingWeight {
        rank_score,
        expertise_multiplier,
        wealth_factor,
        weight: if weight.is_finite() { weight } else { 0.0 },
    }
}

/// Probability that a deployment vote passes at the given weight.
pub fn pass_probability(config: &SimConfig, weight: f64) -> f64 {
    let t = &config.tunables;
    (weight / t.required_vote_weight).clamp(0.0, t.max_pass_probability)
}
