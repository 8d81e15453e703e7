//! PoliSim-DBE core: a quiz-driven progression and economy simulation.
//!
//! Everything mutable lives in one `GameState`, owned by `SimEngine` and
//! passed explicitly to each component. Components, leaf first:
//!
//!   economics_subsystem  yearly metric drift and deployment impacts
//!   progression          XP totals, rank, voting weight, quiz level
//!   quiz_subsystem       question pool and the 3-attempt state machine
//!   voting_subsystem     XP-gated, probabilistic deployment votes
//!   clock                year step and end-state evaluation

pub mod clock;
pub mod command;
pub mod config;
pub mod economics_subsystem;
pub mod engine;
pub mod error;
pub mod event;
pub mod progression;
pub mod quiz_subsystem;
pub mod rng;
pub mod snapshot;
pub mod state;
pub mod store;
pub mod types;
pub mod voting_subsystem;
