//! The simulation engine — the single owner of the game-state context.
//!
//! RULES:
//!   - Every player action enters through one of the engine's handlers
//!     (or `apply`, which dispatches a `PlayerCommand`).
//!   - Handlers run to completion; nothing suspends mid-operation.
//!   - Every state-changing handler saves the state before returning.
//!   - Every emitted event is appended to the event log.
//!   - All randomness flows through the two injected RandomSources.
//!   - A rejected action (PreconditionError) leaves state untouched.
//!   - Once the game has ended only `advance_time` (a no-op report at the
//!     horizon) and `reset` are accepted.

use crate::{
    clock::{self, GameEnd, YearStep},
    command::PlayerCommand,
    config::SimConfig,
    error::{PreconditionError, SimResult},
    event::{EventLogEntry, SimEvent},
    quiz_subsystem::{AnswerResult, QuizEngine, QuizPhase},
    rng::{RandomSource, RngBank, RngSlot},
    snapshot::{self, StatusSnapshot},
    state::GameState,
    store::SimStore,
    types::{FieldId, RunId},
    voting_subsystem,
};

/// Key the game state is persisted under.
pub const SAVE_KEY: &str = "poliSimDbeGame";

pub struct SimEngine {
    pub run_id: RunId,
    seed:       u64,
    config:     SimConfig,
    state:      GameState,
    quiz:       QuizEngine,
    quiz_rng:   Box<dyn RandomSource>,
    vote_rng:   Box<dyn RandomSource>,
    store:      SimStore,
    restored:   bool,
}

impl SimEngine {
    /// Engine whose random streams derive from `seed`.
    /// Loads any saved game from `store`; call `start()` next.
    pub fn new(run_id: RunId, seed: u64, config: SimConfig, store: SimStore) -> SimResult<Self> {
        let bank = RngBank::new(seed);
        Self::with_random_sources(
            run_id,
            seed,
            config,
            store,
            Box::new(bank.for_slot(RngSlot::Quiz)),
            Box::new(bank.for_slot(RngSlot::Vote)),
        )
    }

    /// Engine with caller-supplied randomness (tests, replays).
    pub fn with_random_sources(
        run_id:   RunId,
        seed:     u64,
        config:   SimConfig,
        store:    SimStore,
        quiz_rng: Box<dyn RandomSource>,
        vote_rng: Box<dyn RandomSource>,
    ) -> SimResult<Self> {
        store.insert_run(&run_id, seed, env!("CARGO_PKG_VERSION"))?;

        let saved = store.get_value(SAVE_KEY)?;
        let restored_state = saved.as_deref().and_then(|json| GameState::restore(json, &config));
        let restored = restored_state.is_some();
        let state = restored_state.unwrap_or_else(|| GameState::new(&config));

        log::info!(
            "run {run_id}: {} game at year {}",
            if restored { "restored" } else { "new" },
            state.current_year
        );

        Ok(Self {
            run_id,
            seed,
            config,
            state,
            quiz: QuizEngine::new(),
            quiz_rng,
            vote_rng,
            store,
            restored,
        })
    }

    /// In-memory store, embedded configuration.
    pub fn build_test(run_id: RunId, seed: u64) -> SimResult<Self> {
        let store = SimStore::in_memory()?;
        store.migrate()?;
        Self::new(run_id, seed, SimConfig::embedded()?, store)
    }

    /// Announce the run and present the first question.
    pub fn start(&mut self) -> SimResult<Vec<SimEvent>> {
        let mut events = vec![
            SimEvent::RunInitialized { run_id: self.run_id.clone(), seed: self.seed },
            SimEvent::StateLoaded { year: self.state.current_year, restored: self.restored },
        ];
        self.quiz.clear();
        match self.game_end() {
            None => self.present_question(&mut events),
            Some(end) => self.finish(end, &mut events),
        }
        self.save()?;
        self.record(&events)?;
        Ok(events)
    }

    // ── Read access ────────────────────────────────────────────

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn quiz(&self) -> &QuizEngine {
        &self.quiz
    }

    pub fn store(&self) -> &SimStore {
        &self.store
    }

    pub fn status(&self) -> StatusSnapshot {
        snapshot::build(&self.state, &self.config, &self.quiz)
    }

    /// Terminal outcome, if the game has ended.
    pub fn game_end(&self) -> Option<GameEnd> {
        clock::check_game_end(&self.state, &self.config)
    }

    // ── Handlers ───────────────────────────────────────────────

    pub fn apply(&mut self, command: PlayerCommand) -> SimResult<Vec<SimEvent>> {
        match command {
            PlayerCommand::SubmitAnswer { answer } => self.submit_answer(&answer),
            PlayerCommand::CompletePendingAdvance => self.complete_pending_advance(),
            PlayerCommand::AttemptDeployment { field } => self.attempt_deployment(field),
            PlayerCommand::AdvanceTime => self.advance_time(),
            PlayerCommand::Reset => self.reset(),
        }
    }

    pub fn submit_answer(&mut self, answer: &str) -> SimResult<Vec<SimEvent>> {
        self.ensure_running()?;
        let result = self.quiz.submit_answer(&mut self.state, &self.config, answer)?;
        let year = self.state.current_year;

        let mut events = Vec::new();
        match result {
            AnswerResult::Correct { question, field, xp_gained, wealth_gained, rank_change } => {
                events.push(SimEvent::AnswerCorrect {
                    year,
                    question,
                    field,
                    xp_gained,
                    wealth_gained,
                    net_worth: self.state.net_worth,
                });
                if let Some((from, to)) = rank_change {
                    events.push(SimEvent::RankChanged {
                        year,
                        from,
                        to,
                        score: self.state.political_level_score,
                    });
                }
            }
            AnswerResult::Incorrect { question, attempt, attempts_left, hint } => {
                events.push(SimEvent::AnswerIncorrect { year, question, attempt, attempts_left, hint });
            }
            AnswerResult::Exhausted { question, correct_answer } => {
                events.push(SimEvent::QuestionExhausted { year, question, correct_answer });
            }
        }
        // Ranking up can complete a victory.
        match self.game_end() {
            Some(end) => self.finish(end, &mut events),
            None => {
                if let Some(delay) = self.quiz.pending_advance() {
                    events.push(SimEvent::NextQuestionScheduled { year, delay_ms: delay.as_millis() as u64 });
                }
            }
        }

        self.save()?;
        self.record(&events)?;
        Ok(events)
    }

    pub fn complete_pending_advance(&mut self) -> SimResult<Vec<SimEvent>> {
        self.ensure_running()?;
        self.quiz
            .complete_pending_advance(&self.state, &self.config, self.quiz_rng.as_mut())?;
        let mut events = Vec::new();
        self.push_phase_event(&mut events);
        self.record(&events)?;
        Ok(events)
    }

    pub fn attempt_deployment(&mut self, field: FieldId) -> SimResult<Vec<SimEvent>> {
        self.ensure_running()?;
        let year = self.state.current_year;
        let report = voting_subsystem::attempt_deployment(
            &mut self.state,
            &self.config,
            field,
            self.vote_rng.as_mut(),
        )?;

        let mut events = vec![SimEvent::DeploymentVoteResolved {
            year,
            field,
            voting_weight: report.weight.weight,
            pass_probability: report.pass_probability,
            roll: report.roll,
            passed: report.passed,
        }];
        if let Some(step) = report.year_step {
            self.after_year_step(step, &mut events);
        }

        self.save()?;
        self.record(&events)?;
        Ok(events)
    }

    /// One irreversible year step. Once the game has ended this changes
    /// nothing and reports the same end state every call.
    pub fn advance_time(&mut self) -> SimResult<Vec<SimEvent>> {
        if let Some(end) = self.game_end() {
            let mut events = Vec::new();
            self.finish(end, &mut events);
            return Ok(events);
        }

        let step = clock::advance_time(&mut self.state, &self.config);
        let mut events = Vec::new();
        self.after_year_step(step, &mut events);

        self.save()?;
        self.record(&events)?;
        Ok(events)
    }

    /// Discard the save and start over from the configured defaults.
    pub fn reset(&mut self) -> SimResult<Vec<SimEvent>> {
        self.store.delete_value(SAVE_KEY)?;
        self.state = GameState::new(&self.config);
        self.restored = false;
        self.quiz.clear();
        log::info!("run {}: game reset", self.run_id);

        let mut events = vec![SimEvent::StateReset { year: self.state.current_year }];
        self.present_question(&mut events);
        self.save()?;
        self.record(&events)?;
        Ok(events)
    }

    // ── Internals ──────────────────────────────────────────────

    fn ensure_running(&self) -> Result<(), PreconditionError> {
        match self.game_end() {
            Some(_) => Err(PreconditionError::GameOver),
            None => Ok(()),
        }
    }

    fn after_year_step(&mut self, step: YearStep, events: &mut Vec<SimEvent>) {
        let end = match step {
            YearStep::Advanced { year, net_worth, metrics, end } => {
                events.push(SimEvent::YearAdvanced { year, net_worth, metrics });
                if end.is_none() && self.quiz.refresh(&self.state, &self.config, self.quiz_rng.as_mut()) {
                    self.push_phase_event(events);
                }
                end
            }
            YearStep::AtHorizon(end) => Some(end),
        };

        if let Some(end) = end {
            self.finish(end, events);
        }
    }

    fn finish(&mut self, end: GameEnd, events: &mut Vec<SimEvent>) {
        log::info!("run {}: game ended ({:?})", self.run_id, end.outcome);
        self.quiz.clear();
        events.push(SimEvent::GameEnded {
            year: self.state.current_year,
            outcome: end.outcome,
            summary: end.summary,
        });
    }

    fn present_question(&mut self, events: &mut Vec<SimEvent>) {
        self.quiz
            .present_next(&self.state, &self.config, self.quiz_rng.as_mut());
        self.push_phase_event(events);
    }

    fn push_phase_event(&self, events: &mut Vec<SimEvent>) {
        let year = self.state.current_year;
        match self.quiz.phase() {
            QuizPhase::AttemptInProgress(active) => events.push(SimEvent::QuestionPresented {
                year,
                question: active.question.text.clone(),
                field: active.question.field,
                level: active.question.level,
                answers: active.answers.clone(),
            }),
            QuizPhase::NoQuestionsAvailable => events.push(SimEvent::NoQuestionsAvailable { year }),
            QuizPhase::NoQuestion | QuizPhase::Resolved { .. } => {}
        }
    }

    fn save(&self) -> SimResult<()> {
        let json = serde_json::to_string(&self.state)?;
        self.store.put_value(SAVE_KEY, &json)
    }

    fn record(&self, events: &[SimEvent]) -> SimResult<()> {
        for event in events {
            let entry = EventLogEntry {
                id:         None,
                run_id:     self.run_id.clone(),
                year:       self.state.current_year,
                source:     event.source().to_string(),
                event_type: event.type_name().to_string(),
                payload:    serde_json::to_string(event)?,
            };
            self.store.append_event(&entry)?;
        }
        Ok(())
    }
}
