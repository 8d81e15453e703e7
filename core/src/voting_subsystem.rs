//! Deployment votes — the only code that flips a deployment flag.
//!
//! A vote may be called once a field's XP reaches the vote gate. It passes
//! with probability `min(max_pass, weight / required_weight)`. A passed
//! vote deploys the field for good and immediately advances the clock one
//! year so the impact shows up. A failed vote costs nothing.

use crate::{
    clock::{self, YearStep},
    config::SimConfig,
    error::{PreconditionError, SimResult},
    progression::{self, VotingWeight},
    rng::RandomSource,
    state::GameState,
    types::FieldId,
};

#[derive(Debug, Clone, PartialEq)]
pub struct VoteReport {
    pub field:            FieldId,
    pub weight:           VotingWeight,
    pub pass_probability: f64,
    pub roll:             f64,
    pub passed:           bool,
    /// The year step a passed vote triggers.
    pub year_step:        Option<YearStep>,
}

/// Fails without touching state when the field is already deployed or
/// under the XP gate.
pub fn check_eligible(state: &GameState, config: &SimConfig, field: FieldId) -> Result<(), PreconditionError> {
    if state.is_deployed(field) {
        return Err(PreconditionError::AlreadyDeployed { field });
    }
    let need = config.tunables.vote_gate_xp;
    let have = state.xp(field);
    if have < need {
        return Err(PreconditionError::InsufficientExpertise { field, have, need });
    }
    Ok(())
}

/// Fields a vote could be called on right now.
pub fn votable_fields(state: &GameState, config: &SimConfig) -> Vec<FieldId> {
    FieldId::ALL
        .into_iter()
        .filter(|f| check_eligible(state, config, *f).is_ok())
        .collect()
}

pub fn attempt_deployment(
    state:  &mut GameState,
    config: &SimConfig,
    field:  FieldId,
    rng:    &mut dyn RandomSource,
) -> SimResult<VoteReport> {
    check_eligible(state, config, field)?;

    let weight = progression::voting_weight(state, config);
    let pass_probability = progression::pass_probability(config, weight.weight);
    let roll = rng.next_f64();
    let passed = roll < pass_probability;

    log::debug!(
        "year={} vote {field}: weight={:.3} p={:.3} roll={:.3}",
        state.current_year,
        weight.weight,
        pass_probability,
        roll
    );

    let year_step = if passed {
        state.dbe_deployment.insert(field, true);
        log::info!("year={} deployed {field}", state.current_year);
        Some(clock::advance_time(state, config))
    } else {
        None
    };

    Ok(VoteReport { field, weight, pass_probability, roll, passed, year_step })
}
