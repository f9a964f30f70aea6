use rand::Rng;

use cogbat_core::{EngineError, InstrumentId, InteractionPort, MetricsRecord, TrialRecord, round2};
use cogbat_timing::Timer;

use crate::config::Timings;

/// Everything one trial borrows from the session: the clock, the participant
/// port, the randomness source and the presentation timings.
pub struct TrialCtx<'a, T, P, R>
where
    T: Timer<Timestamp = u64>,
    P: InteractionPort,
    R: Rng,
{
    pub timer: &'a T,
    pub port: &'a mut P,
    pub rng: &'a mut R,
    pub timings: &'a Timings,
}

/// Outcome of one `run_trial` call.
#[derive(Debug, Clone)]
pub enum TrialStep {
    /// The trial resolved; append the record and continue.
    Recorded(TrialRecord),
    /// Nothing left to run: the required trial count was produced or the
    /// countdown elapsed.
    Finished,
    /// The participant navigated away; the session is discarded unsaved.
    Abandoned,
}

/// One instrument's generator, validator and reducer, driven by the shared
/// controller. `run_trial` owns the whole stimulus-response exchange of one
/// trial through the port; `reduce` folds the session log into the metrics
/// record once at completion.
pub trait Instrument {
    fn id(&self) -> InstrumentId;

    /// Instructions text presented before the session begins.
    fn instructions(&self) -> &'static str;

    /// Number of leading practice trials. The controller holds the session in
    /// `Practice` for exactly this many trials, then moves to `Running`.
    fn practice_len(&self) -> usize;

    /// Nominal total trial count, for progress reporting. Instruments that
    /// can end early (the Five-Point countdown) still report the full plan.
    fn planned_len(&self) -> usize;

    /// Rebuild per-session generator state. Called once before the first
    /// trial of every session; no state survives from earlier sessions.
    fn reset<R: Rng>(&mut self, rng: &mut R) -> Result<(), EngineError>;

    fn run_trial<T, P, R>(
        &mut self,
        index: usize,
        ctx: &mut TrialCtx<'_, T, P, R>,
    ) -> Result<TrialStep, EngineError>
    where
        T: Timer<Timestamp = u64>,
        P: InteractionPort,
        R: Rng;

    fn reduce(&self, records: &[TrialRecord]) -> MetricsRecord;
}

/// Nanosecond timer offset on the millisecond scale used in trial records.
pub(crate) fn ns_to_ms(ns: u64) -> f64 {
    ns as f64 / 1_000_000.0
}

/// Mean of a reaction-time subset, already rounded for the metrics contract.
/// Empty subsets come out as 0.
pub(crate) fn mean_ms(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    round2(values.iter().sum::<f64>() / values.len() as f64)
}

/// `part` of `total` as a percentage, rounded; 0 when `total` is 0.
pub(crate) fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round2(part as f64 / total as f64 * 100.0)
}
