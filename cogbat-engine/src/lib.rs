pub mod config;
pub mod controller;
pub mod corsi;
pub mod fivepoint;
pub mod instrument;
pub mod session;
pub mod stroop;
pub mod trails;

#[cfg(any(test, feature = "test-support"))]
pub mod harness;

pub use config::Timings;
pub use controller::{PhaseController, SessionOutcome};
pub use corsi::CorsiBlocks;
pub use fivepoint::FivePoint;
pub use instrument::{Instrument, TrialCtx, TrialStep};
pub use session::Session;
pub use stroop::Stroop;
pub use trails::TrailMaking;
