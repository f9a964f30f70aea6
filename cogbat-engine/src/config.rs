/// Stimulus presentation timings, in milliseconds. Trial counts are fixed by
/// the protocol and live as constants on each instrument module; only
/// durations are collected here.
#[derive(Debug, Clone)]
pub struct Timings {
    /// Fixation cross shown before every Stroop stimulus.
    pub fixation_ms: u64,
    /// How long each Corsi block stays lit during sequence presentation.
    pub corsi_lit_ms: u64,
    /// Dark gap between two lit Corsi blocks.
    pub corsi_gap_ms: u64,
    /// Five-Point scored-phase countdown.
    pub five_point_limit_ms: u64,
    /// Pause between two trials of any instrument.
    pub inter_trial_ms: u64,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            fixation_ms: 500,
            corsi_lit_ms: 800,
            corsi_gap_ms: 200,
            five_point_limit_ms: 180_000,
            inter_trial_ms: 1000,
        }
    }
}
