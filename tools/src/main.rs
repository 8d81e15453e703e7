//! polisim-runner: headless runner for PoliSim-DBE.
//!
//! Usage:
//!   polisim-runner --seed 12345 --years 28 --accuracy 0.7 --db run.db
//!   polisim-runner --seed 12345 --db run.db --ipc-mode

use anyhow::Result;
use polisim_core::{
    command::PlayerCommand,
    config::SimConfig,
    engine::SimEngine,
    error::SimError,
    event::SimEvent,
    rng::{RngBank, RngSlot, SubsystemRng},
    snapshot::StatusSnapshot,
    store::SimStore,
};
use std::env;
use std::io::{self, BufRead, Write};
use std::path::Path;

/// Runner-level requests; anything else on the wire is a `PlayerCommand`.
#[derive(serde::Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
enum ControlRequest {
    GetState,
    Quit,
}

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum IpcRequest {
    Control(ControlRequest),
    Player(PlayerCommand),
}

#[derive(serde::Serialize)]
struct IpcResponse<'a> {
    events: &'a [SimEvent],
    status: StatusSnapshot,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let years = parse_arg(&args, "--years", 28u32);
    let accuracy = parse_arg(&args, "--accuracy", 0.7f64);
    let answers_per_year = parse_arg(&args, "--answers-per-year", 3usize);
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let db = args
        .windows(2)
        .find(|w| w[0] == "--db")
        .map(|w| w[1].as_str())
        .unwrap_or(":memory:");
    let data_dir = args
        .windows(2)
        .find(|w| w[0] == "--data-dir")
        .map(|w| w[1].as_str())
        .unwrap_or("./data");

    if !ipc_mode {
        println!("PoliSim-DBE — polisim-runner");
        println!("  seed:      {seed}");
        println!("  years:     {years}");
        println!("  accuracy:  {accuracy}");
        println!("  db:        {db}");
        println!("  data_dir:  {data_dir}");
        println!();
    }

    let config = if Path::new(data_dir).is_dir() {
        SimConfig::load(data_dir)?
    } else {
        log::info!("{data_dir} not found, using embedded configuration");
        SimConfig::embedded()?
    };

    let store = SimStore::open(db)?;
    store.migrate()?;

    let run_id = format!("run-{}", uuid::Uuid::new_v4());
    let mut engine = SimEngine::new(run_id.clone(), seed, config, store)?;
    let opening = engine.start()?;

    if ipc_mode {
        let mut stdout = io::stdout();
        write_response(&mut stdout, &engine, &opening)?;
        run_ipc_loop(&mut engine)?;
    } else {
        let autoplay = RngBank::new(seed).for_slot(RngSlot::Autoplay);
        run_autoplay(&mut engine, autoplay, years, accuracy, answers_per_year)?;
        print_summary(&engine, &run_id)?;
    }

    Ok(())
}

fn run_ipc_loop(engine: &mut SimEngine) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }
        if buffer.trim().is_empty() {
            continue;
        }

        let request: IpcRequest = match serde_json::from_str(&buffer) {
            Ok(r) => r,
            Err(e) => {
                write_error(&mut stdout, &e.to_string())?;
                continue;
            }
        };

        match request {
            IpcRequest::Control(ControlRequest::Quit) => break,
            IpcRequest::Control(ControlRequest::GetState) => {
                write_response(&mut stdout, engine, &[])?;
            }
            IpcRequest::Player(command) => match engine.apply(command) {
                Ok(events) => write_response(&mut stdout, engine, &events)?,
                Err(SimError::Precondition(rejected)) => {
                    write_error(&mut stdout, &rejected.to_string())?;
                }
                Err(e) => return Err(e.into()),
            },
        }
    }
    Ok(())
}

fn write_response(out: &mut impl Write, engine: &SimEngine, events: &[SimEvent]) -> Result<()> {
    let response = IpcResponse { events, status: engine.status() };
    writeln!(out, "{}", serde_json::to_string(&response)?)?;
    out.flush()?;
    Ok(())
}

fn write_error(out: &mut impl Write, message: &str) -> Result<()> {
    writeln!(out, "{}", serde_json::json!({ "error": message }))?;
    out.flush()?;
    Ok(())
}

/// Simulated player: answers a few questions a year (correctly with
/// probability `accuracy`), puts every eligible field to a vote, then
/// moves the calendar on.
fn run_autoplay(
    engine:           &mut SimEngine,
    mut rng:          SubsystemRng,
    years:            u32,
    accuracy:         f64,
    answers_per_year: usize,
) -> Result<()> {
    let mut votes = 0u32;
    let mut passed = 0u32;

    for _ in 0..years {
        if engine.game_end().is_some() {
            break;
        }

        for _ in 0..answers_per_year {
            if engine.game_end().is_some() {
                break;
            }
            let Some(active) = engine.quiz().active() else { break };
            let question = active.question.clone();

            if rng.chance(accuracy) {
                engine.apply(PlayerCommand::SubmitAnswer { answer: question.correct_answer })?;
            } else {
                for wrong in &question.wrong_answers {
                    if !engine.quiz().accepts_answers() {
                        break;
                    }
                    engine.apply(PlayerCommand::SubmitAnswer { answer: wrong.clone() })?;
                }
            }
            // The host delay is irrelevant headless.
            if engine.game_end().is_none() {
                engine.apply(PlayerCommand::CompletePendingAdvance)?;
            }
        }

        let votable: Vec<_> = engine.status().actions.votable.into_iter().collect();
        for field in votable {
            if engine.game_end().is_some() {
                break;
            }
            let events = engine.apply(PlayerCommand::AttemptDeployment { field })?;
            votes += 1;
            if events
                .iter()
                .any(|e| matches!(e, SimEvent::DeploymentVoteResolved { passed: true, .. }))
            {
                passed += 1;
            }
        }

        engine.apply(PlayerCommand::AdvanceTime)?;
    }

    log::info!("{} finished: {passed}/{votes} deployment votes passed", rng.name);
    Ok(())
}

fn print_summary(engine: &SimEngine, run_id: &str) -> Result<()> {
    let status = engine.status();
    let state = &status.state;
    let store = engine.store();

    println!("=== RUN SUMMARY ===");
    println!("  run_id:         {run_id}");
    println!("  final year:     {} / {}", state.current_year, state.max_year);
    println!("  rank:           {} (score {:.1})", status.rank, status.rank_score);
    println!("  total xp:       {}", status.total_xp);
    println!("  net worth:      ${:.2}", state.net_worth);
    println!("  voting weight:  {:.3}", status.voting_weight);
    println!("  answered:       {}", store.event_count(run_id, "answer_correct")?);
    println!("  exhausted:      {}", store.event_count(run_id, "question_exhausted")?);
    println!("  votes held:     {}", store.event_count(run_id, "deployment_vote_resolved")?);

    println!();
    println!("=== FIELDS ===");
    for (field, fs) in &status.fields {
        println!("  {:<32} xp {:>2}  {:?}", field.label(), fs.xp, fs.status);
    }

    println!();
    println!("=== ECONOMY ===");
    for (key, m) in &status.metrics {
        println!("  {key:<24} {:>8.2}{} (from {:.2})", m.current, m.unit, m.initial);
    }

    println!();
    match &status.game_end {
        Some(end) => println!("GAME OVER ({:?}): {}", end.outcome, end.summary),
        None => println!("(game still in progress)"),
    }
    Ok(())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
