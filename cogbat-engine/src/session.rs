use chrono::{DateTime, Utc};
use log::debug;

use cogbat_core::{EngineError, InstrumentId, ParticipantId, SessionPhase, TrialRecord};

/// One full run of one instrument by one participant. Owned by the controller
/// for the duration of the run and discarded on navigation away or after
/// successful persistence; trial records are append-only.
#[derive(Debug, Clone)]
pub struct Session {
    participant: ParticipantId,
    instrument: InstrumentId,
    phase: SessionPhase,
    records: Vec<TrialRecord>,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(participant: ParticipantId, instrument: InstrumentId) -> Self {
        Self {
            participant,
            instrument,
            phase: SessionPhase::default(),
            records: Vec::new(),
            started_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Move the state machine to `next`, refusing transitions the phase
    /// table does not allow.
    pub fn advance(&mut self, next: SessionPhase) -> Result<(), EngineError> {
        if !self.phase.can_advance_to(next) {
            return Err(EngineError::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }
        debug!("{}: {:?} -> {:?}", self.instrument, self.phase, next);
        self.phase = next;
        Ok(())
    }

    pub fn record(&mut self, record: TrialRecord) {
        self.records.push(record);
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn participant(&self) -> &ParticipantId {
        &self.participant
    }

    pub fn instrument(&self) -> InstrumentId {
        self.instrument
    }

    pub fn records(&self) -> &[TrialRecord] {
        &self.records
    }

    pub fn scored_len(&self) -> usize {
        self.records.iter().filter(|r| r.is_scored()).count()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn complete(&mut self, at: DateTime<Utc>) {
        self.completed_at = Some(at);
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }
}
