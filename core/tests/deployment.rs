//! Deployment vote tests — XP gate, pass probability, and the year tick a
//! passed vote triggers.

use polisim_core::{
    clock::GameOutcome,
    config::SimConfig,
    engine::{SimEngine, SAVE_KEY},
    error::PreconditionError,
    event::SimEvent,
    rng::ScriptedRng,
    state::GameState,
    store::SimStore,
    types::{FieldId, PoliticalLevel},
};

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Engine resumed from `state`, with every vote roll fixed to `vote_roll`.
fn engine_from_state(run_id: &str, state: &GameState, vote_roll: f64) -> SimEngine {
    let store = SimStore::in_memory().expect("in-memory store");
    store.migrate().expect("migration");
    store
        .put_value(SAVE_KEY, &serde_json::to_string(state).unwrap())
        .unwrap();
    let mut engine = SimEngine::with_random_sources(
        run_id.into(),
        0,
        SimConfig::default_test(),
        store,
        Box::new(ScriptedRng::constant(0.0)),
        Box::new(ScriptedRng::constant(vote_roll)),
    )
    .unwrap();
    engine.start().unwrap();
    engine
}

fn fresh_state() -> GameState {
    GameState::new(&SimConfig::default_test())
}

fn count_year_advances(events: &[SimEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, SimEvent::YearAdvanced { .. }))
        .count()
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[test]
fn four_xp_is_rejected_five_xp_goes_to_a_vote() {
    let mut state = fresh_state();
    state.expertise.insert(FieldId::FractonMemory, 4);
    let mut engine = engine_from_state("deploy-gate", &state, 0.0);

    let err = engine.attempt_deployment(FieldId::FractonMemory).unwrap_err();
    assert_eq!(
        err.as_precondition(),
        Some(&PreconditionError::InsufficientExpertise { field: FieldId::FractonMemory, have: 4, need: 5 })
    );
    assert_eq!(engine.state().current_year, 2007);
    assert!(!engine.state().is_deployed(FieldId::FractonMemory));

    state.expertise.insert(FieldId::FractonMemory, 5);
    let mut engine = engine_from_state("deploy-gate-5", &state, 0.0);
    let events = engine.attempt_deployment(FieldId::FractonMemory).unwrap();
    assert!(matches!(events[0], SimEvent::DeploymentVoteResolved { passed: true, .. }));
}

#[test]
fn high_weight_vote_passes_and_advances_exactly_one_year() {
    // 30 total XP makes the player President: weight = 5 × (1 + 1 + wealth) > 5.
    let mut state = fresh_state();
    for field in FieldId::ALL {
        state.expertise.insert(field, 6);
    }
    let mut engine = engine_from_state("deploy-pass", &state, 0.5);
    assert_eq!(engine.state().political_level, PoliticalLevel::President);
    assert!(engine.status().voting_weight > 5.0);

    let events = engine.attempt_deployment(FieldId::FusionMhdControl).unwrap();

    match &events[0] {
        SimEvent::DeploymentVoteResolved { pass_probability, roll, passed, .. } => {
            assert!((pass_probability - 0.99).abs() < 1e-12);
            assert_eq!(*roll, 0.5);
            assert!(passed);
        }
        other => panic!("expected a vote result, got {other:?}"),
    }
    assert_eq!(count_year_advances(&events), 1);

    let state = engine.state();
    assert!(state.is_deployed(FieldId::FusionMhdControl));
    assert_eq!(state.current_year, 2008);
    let defense = state.economy["defense_spending_gdp"];
    assert!((defense - 4.0 * 1.005 * 0.80).abs() < 1e-9);
}

#[test]
fn pass_probability_never_reaches_certainty() {
    let mut state = fresh_state();
    for field in FieldId::ALL {
        state.expertise.insert(field, 6);
    }
    let mut engine = engine_from_state("deploy-cap", &state, 0.995);

    let events = engine.attempt_deployment(FieldId::TimeCrystalSync).unwrap();
    assert!(matches!(events[0], SimEvent::DeploymentVoteResolved { passed: false, .. }));
    assert_eq!(events.len(), 1);
    assert!(!engine.state().is_deployed(FieldId::TimeCrystalSync));
    assert_eq!(engine.state().current_year, 2007);
}

#[test]
fn failed_vote_can_be_retried() {
    let mut state = fresh_state();
    state.expertise.insert(FieldId::HolographicEncoding, 5);

    // Mayor with 5 XP and $10k: weight ≈ 1.53, p ≈ 0.31.
    let store = SimStore::in_memory().unwrap();
    store.migrate().unwrap();
    store.put_value(SAVE_KEY, &serde_json::to_string(&state).unwrap()).unwrap();
    let mut engine = SimEngine::with_random_sources(
        "deploy-retry".into(),
        0,
        SimConfig::default_test(),
        store,
        Box::new(ScriptedRng::constant(0.0)),
        Box::new(ScriptedRng::new(vec![0.9, 0.1])),
    )
    .unwrap();
    engine.start().unwrap();

    let first = engine.attempt_deployment(FieldId::HolographicEncoding).unwrap();
    assert!(matches!(first[0], SimEvent::DeploymentVoteResolved { passed: false, .. }));
    assert!(!engine.state().is_deployed(FieldId::HolographicEncoding));
    assert!(engine.status().actions.votable.contains(&FieldId::HolographicEncoding));

    let second = engine.attempt_deployment(FieldId::HolographicEncoding).unwrap();
    assert!(matches!(second[0], SimEvent::DeploymentVoteResolved { passed: true, .. }));
    assert!(engine.state().is_deployed(FieldId::HolographicEncoding));
    assert!(!engine.status().actions.votable.contains(&FieldId::HolographicEncoding));
}

#[test]
fn deploying_twice_is_rejected_without_change() {
    let mut state = fresh_state();
    state.expertise.insert(FieldId::FractonMemory, 5);
    state.dbe_deployment.insert(FieldId::FractonMemory, true);
    let mut engine = engine_from_state("deploy-twice", &state, 0.0);
    let before = engine.state().clone();

    let err = engine.attempt_deployment(FieldId::FractonMemory).unwrap_err();
    assert_eq!(
        err.as_precondition(),
        Some(&PreconditionError::AlreadyDeployed { field: FieldId::FractonMemory })
    );
    assert_eq!(engine.state(), &before);
}

/// President (30 XP) with every field but holographic encoding deployed.
fn one_deployment_from_victory() -> GameState {
    let mut state = fresh_state();
    for field in FieldId::ALL {
        state.expertise.insert(field, 6);
        state.dbe_deployment.insert(field, field != FieldId::HolographicEncoding);
    }
    state
}

fn outcomes(events: &[SimEvent]) -> Vec<GameOutcome> {
    events
        .iter()
        .filter_map(|e| match e {
            SimEvent::GameEnded { outcome, .. } => Some(*outcome),
            _ => None,
        })
        .collect()
}

#[test]
fn ended_game_rejects_answers_and_votes() {
    let mut state = one_deployment_from_victory();
    state.current_year = state.max_year;
    let mut engine = engine_from_state("deploy-horizon", &state, 0.0);
    let before = engine.state().clone();

    assert_eq!(outcomes(&engine.advance_time().unwrap()), vec![GameOutcome::TermExpired]);

    let err = engine.attempt_deployment(FieldId::HolographicEncoding).unwrap_err();
    assert_eq!(err.as_precondition(), Some(&PreconditionError::GameOver));
    let err = engine.submit_answer("anything").unwrap_err();
    assert_eq!(err.as_precondition(), Some(&PreconditionError::GameOver));
    let err = engine.complete_pending_advance().unwrap_err();
    assert_eq!(err.as_precondition(), Some(&PreconditionError::GameOver));

    assert_eq!(engine.state(), &before);
    assert_eq!(outcomes(&engine.advance_time().unwrap()), vec![GameOutcome::TermExpired]);

    let actions = engine.status().actions;
    assert!(actions.votable.is_empty());
    assert!(!actions.can_answer);
    assert!(!actions.can_advance_time);
    assert_eq!(actions.pending_advance_ms, None);
}

#[test]
fn final_deployment_wins_and_freezes_the_game() {
    let mut state = one_deployment_from_victory();
    state.current_year = 2010;
    let mut engine = engine_from_state("deploy-victory", &state, 0.0);

    let events = engine.attempt_deployment(FieldId::HolographicEncoding).unwrap();
    assert_eq!(count_year_advances(&events), 1);
    assert_eq!(outcomes(&events), vec![GameOutcome::Victory]);
    assert!(engine.quiz().active().is_none());

    let frozen = engine.state().clone();
    assert_eq!(frozen.current_year, 2011);
    let again = engine.advance_time().unwrap();
    assert_eq!(outcomes(&again), vec![GameOutcome::Victory]);
    assert_eq!(count_year_advances(&again), 0);
    assert_eq!(engine.state(), &frozen);

    let err = engine.submit_answer("anything").unwrap_err();
    assert_eq!(err.as_precondition(), Some(&PreconditionError::GameOver));
}

#[test]
fn reset_is_allowed_after_the_game_ends() {
    let mut state = one_deployment_from_victory();
    state.current_year = state.max_year;
    let mut engine = engine_from_state("deploy-reset-after-end", &state, 0.0);

    engine.reset().unwrap();

    assert_eq!(engine.state().current_year, 2007);
    assert!(engine.status().actions.can_answer);
}
