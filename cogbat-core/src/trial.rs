use serde::{Deserialize, Serialize};

use crate::stimulus::{ResponseRecord, StimulusRecord};

/// The four instruments of the battery.
#[derive(Copy, Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InstrumentId {
    Stroop,
    TrailMaking,
    CorsiBlocks,
    FivePoint,
}

impl InstrumentId {
    pub const ALL: [InstrumentId; 4] = [
        InstrumentId::Stroop,
        InstrumentId::TrailMaking,
        InstrumentId::CorsiBlocks,
        InstrumentId::FivePoint,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            InstrumentId::Stroop => "stroop",
            InstrumentId::TrailMaking => "trail_making",
            InstrumentId::CorsiBlocks => "corsi_blocks",
            InstrumentId::FivePoint => "five_point",
        }
    }
}

impl std::fmt::Display for InstrumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque participant identifier handed over by the registration collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParticipantId(pub String);

impl ParticipantId {
    pub fn new(id: impl Into<String>) -> Self {
        ParticipantId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether a trial belongs to the practice or the scored portion of a session.
#[derive(Copy, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TrialPhase {
    Practice,
    Main,
}

impl TrialPhase {
    pub fn is_scored(self) -> bool {
        self == TrialPhase::Main
    }
}

/// Instrument-specific condition label carried by every trial.
#[derive(Copy, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TrialCondition {
    /// Stroop: arrow always centered.
    Control,
    /// Stroop: arrow position drawn independently of direction.
    Experimental,
    /// Trail-Making passes.
    SampleA,
    TrailA,
    SampleB,
    TrailB,
    /// Corsi directions.
    Forward,
    Backward,
    /// Five-Point: one square.
    Square,
}

/// One stimulus-response unit. Appended to the session log when the trial
/// resolves and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialRecord {
    pub phase: TrialPhase,
    pub condition: TrialCondition,
    pub stimulus: StimulusRecord,
    pub response: ResponseRecord,
    pub correct: bool,
    /// Stimulus onset to response, milliseconds. `None` for instruments whose
    /// trials are not single-response timed (Trail-Making, Corsi, Five-Point).
    pub reaction_time_ms: Option<f64>,
    /// Session-clock offsets in milliseconds.
    pub timestamp_start_ms: f64,
    pub timestamp_end_ms: f64,
}

impl TrialRecord {
    pub fn is_scored(&self) -> bool {
        self.phase.is_scored()
    }
}
