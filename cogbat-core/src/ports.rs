use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::geometry::Point;
use crate::metrics::MetricsRecord;
use crate::stimulus::{ArrowDirection, StimulusView};
use crate::trial::{InstrumentId, ParticipantId, TrialRecord};

/// A participant input event, already mapped from whatever raw device event
/// the UI collaborator received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum InputEvent {
    /// Directional key (Stroop).
    Arrow { direction: ArrowDirection },
    /// Canvas click (Trail-Making, Corsi).
    Click { point: Point },
    /// Five-Point edge attempt: the participant selected two dots.
    Connect { from: u8, to: u8 },
    /// Five-Point explicit design completion.
    EndDesign,
    /// Retry affordance after a save failure.
    Retry,
}

/// Which inputs the engine is listening for during one wait. Anything else
/// delivered by the port is ignored without touching trial state.
#[derive(Copy, Debug, Clone, PartialEq, Eq)]
pub enum InputFilter {
    Arrows,
    Clicks,
    FivePointMoves,
    Retry,
}

impl InputFilter {
    pub fn accepts(self, event: &InputEvent) -> bool {
        matches!(
            (self, event),
            (InputFilter::Arrows, InputEvent::Arrow { .. })
                | (InputFilter::Clicks, InputEvent::Click { .. })
                | (InputFilter::FivePointMoves, InputEvent::Connect { .. })
                | (InputFilter::FivePointMoves, InputEvent::EndDesign)
                | (InputFilter::Retry, InputEvent::Retry)
        )
    }
}

/// What a wait on the interaction port resolved to.
#[derive(Debug, Clone, PartialEq)]
pub enum PortEvent {
    Input(InputEvent),
    /// The deadline passed with no accepted input.
    Elapsed,
    /// The participant navigated away; the session is discarded unsaved.
    Abandoned,
}

/// The engine's only channel to the participant: stimulus presentation out,
/// timed input in. Implementations may block on a channel, poll a callback
/// queue, or replay a script; the engine does not care.
pub trait InteractionPort {
    fn present(&mut self, view: StimulusView);

    /// Wait for the next input accepted by `filter`, up to `deadline` if one
    /// is given. Implementations must not deliver events the filter rejects.
    fn await_input(&mut self, filter: InputFilter, deadline: Option<Duration>) -> PortEvent;
}

/// One completed session, as handed to the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRequest {
    pub participant: ParticipantId,
    pub instrument: InstrumentId,
    pub metrics: MetricsRecord,
    pub raw_trials: Vec<TrialRecord>,
    pub completed_at: DateTime<Utc>,
}

impl SaveRequest {
    pub fn completed_at_iso8601(&self) -> String {
        self.completed_at.to_rfc3339()
    }
}

/// Persistence collaborator interface. Upsert semantics: one record per
/// participant per instrument, later completions replace earlier ones.
pub trait ResultStore {
    /// Persist one completed session. Failures come back as
    /// `EngineError::PersistenceFailure`; the engine keeps the session and
    /// re-attempts the same request on user retry.
    fn save(&mut self, request: &SaveRequest) -> Result<(), EngineError>;

    /// The previously saved metrics for this participant and instrument, if
    /// any. Consulted at `Instructions` to offer a retake instead of a rerun.
    fn previous_result(
        &self,
        participant: &ParticipantId,
        instrument: InstrumentId,
    ) -> Option<MetricsRecord>;
}

/// In-memory reference store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: HashMap<(ParticipantId, InstrumentId), SaveRequest>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(
        &self,
        participant: &ParticipantId,
        instrument: InstrumentId,
    ) -> Option<&SaveRequest> {
        self.records.get(&(participant.clone(), instrument))
    }
}

impl ResultStore for MemoryStore {
    fn save(&mut self, request: &SaveRequest) -> Result<(), EngineError> {
        self.records.insert(
            (request.participant.clone(), request.instrument),
            request.clone(),
        );
        Ok(())
    }

    fn previous_result(
        &self,
        participant: &ParticipantId,
        instrument: InstrumentId,
    ) -> Option<MetricsRecord> {
        self.records
            .get(&(participant.clone(), instrument))
            .map(|r| r.metrics.clone())
    }
}
