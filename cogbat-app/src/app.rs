use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};
use rand::SeedableRng;
use rand::rngs::StdRng;

use cogbat_core::{InstrumentId, MetricsRecord, ParticipantId};
use cogbat_engine::{
    CorsiBlocks, FivePoint, Instrument, PhaseController, SessionOutcome, Stroop, TrailMaking,
};
use cogbat_timing::VirtualTimer;

use crate::simulate::{Profile, SimulatedParticipant};
use crate::store::JsonStore;

const DEFAULT_RESULTS_FILE: &str = "cogbat_results.json";
const DEFAULT_SEED: u64 = 7;

/// Headless battery runner: a simulated participant plays the requested
/// instruments on a virtual clock, so a full session finishes in
/// milliseconds and still exercises the whole phase machine and store.
pub struct App {
    participant: ParticipantId,
    instruments: Vec<InstrumentId>,
    store_path: PathBuf,
    seed: u64,
}

fn parse_instruments(raw: &str) -> Option<Vec<InstrumentId>> {
    if raw == "all" {
        return Some(InstrumentId::ALL.to_vec());
    }
    InstrumentId::ALL
        .iter()
        .copied()
        .find(|i| i.as_str() == raw)
        .map(|i| vec![i])
}

impl App {
    pub fn new() -> Result<Self> {
        let args: Vec<String> = std::env::args().skip(1).collect();
        if args.len() < 2 {
            bail!(
                "usage: cogbat-app <instrument|all> <participant-id> [results-file] [seed]\n\
                 instruments: stroop, trail_making, corsi_blocks, five_point"
            );
        }
        let instruments = parse_instruments(&args[0])
            .ok_or_else(|| anyhow!("unknown instrument '{}'", args[0]))?;
        let participant = ParticipantId::new(args[1].clone());
        let store_path = args
            .get(2)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_RESULTS_FILE));
        let seed = match args.get(3) {
            Some(raw) => raw.parse().context("seed must be an integer")?,
            None => DEFAULT_SEED,
        };

        Ok(App {
            participant,
            instruments,
            store_path,
            seed,
        })
    }

    pub fn run(self) -> Result<()> {
        println!("=== COGNITIVE TRIAL BATTERY (SIMULATED) ===");
        println!("Platform: {}", std::env::consts::OS);
        println!("Participant: {}", self.participant);
        println!("Results file: {}", self.store_path.display());
        println!("Seed: {}\n", self.seed);

        let mut store = JsonStore::open(&self.store_path)?;
        for instrument in &self.instruments {
            println!("--- {instrument} ---");
            store = match instrument {
                InstrumentId::Stroop => self.run_one(Stroop::new(), store)?,
                InstrumentId::TrailMaking => self.run_one(TrailMaking::new(), store)?,
                InstrumentId::CorsiBlocks => self.run_one(CorsiBlocks::new(), store)?,
                InstrumentId::FivePoint => self.run_one(FivePoint::new(), store)?,
            };
            println!();
        }

        println!("All sessions finished.");
        println!("Results saved to {}", self.store_path.display());
        Ok(())
    }

    fn run_one<I: Instrument>(&self, instrument: I, store: JsonStore) -> Result<JsonStore> {
        let clock = VirtualTimer::new();
        let port = SimulatedParticipant::new(
            clock.clone(),
            Profile::default(),
            StdRng::seed_from_u64(self.seed.wrapping_add(1)),
        );
        let mut controller = PhaseController::new(
            instrument,
            clock,
            port,
            StdRng::seed_from_u64(self.seed),
            store,
        );

        let outcome = controller.start(Some(&self.participant))?;
        match &outcome {
            SessionOutcome::Completed { metrics } => print_metrics(metrics),
            SessionOutcome::AlreadyCompleted { metrics } => {
                println!("Already on file; not re-running. Use a fresh participant id to rerun.");
                print_metrics(metrics);
            }
            SessionOutcome::Abandoned => println!("Session abandoned; nothing saved."),
        }
        Ok(controller.store)
    }
}

fn print_metrics(metrics: &MetricsRecord) {
    match metrics {
        MetricsRecord::Stroop(m) => {
            println!("Trials: {}  Accuracy: {:.2}%", m.total_trials, m.accuracy);
            println!(
                "Average RT: {:.2} ms  (congruent {:.2} ms, incongruent {:.2} ms)",
                m.average_rt, m.congruent_rt, m.incongruent_rt
            );
            println!("Stroop effect: {:.2} ms", m.stroop_effect);
        }
        MetricsRecord::TrailMaking(m) => {
            println!("Trial A: {:.2} s, {} errors", m.trial_a.time, m.trial_a.errors);
            println!("Trial B: {:.2} s, {} errors", m.trial_b.time, m.trial_b.errors);
            println!("B minus A: {:.2} s", m.b_minus_a);
        }
        MetricsRecord::CorsiBlocks(m) => {
            println!(
                "Forward span: {}  Backward span: {}  Total: {}",
                m.forward_span, m.backward_span, m.total_span
            );
            println!(
                "Accuracy: {:.2}% (forward {:.2}%, backward {:.2}%)",
                m.accuracy, m.forward_accuracy, m.backward_accuracy
            );
        }
        MetricsRecord::FivePoint(m) => {
            println!(
                "New designs: {}  Repetitions: {}  Mistakes: {}",
                m.new_designs, m.repetitions, m.mistakes
            );
            println!("Total designs: {}", m.total_designs);
        }
    }
}
