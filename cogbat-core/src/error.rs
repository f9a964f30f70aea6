use std::fmt;

use crate::phase::SessionPhase;

/// Engine error taxonomy. All variants are local to one session; an unmapped
/// participant input is not an error at all (it is ignored with no trial
/// state change).
#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// No participant identifier was supplied before `start()`.
    ParticipantRequired,
    /// Stimulus material could not be generated under its constraints.
    /// The session is aborted; the caller may retry from `Instructions`.
    StimulusLoadFailure(String),
    /// The result store rejected the save. Trial data stays in memory and the
    /// same save call is re-attempted on retry.
    PersistenceFailure(String),
    /// An entry point was invoked in a phase it is not legal in.
    InvalidTransition {
        from: SessionPhase,
        to: SessionPhase,
    },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::ParticipantRequired => {
                write!(f, "a participant id is required before a session may start")
            }
            EngineError::StimulusLoadFailure(detail) => {
                write!(f, "stimulus generation failed: {detail}")
            }
            EngineError::PersistenceFailure(detail) => {
                write!(f, "saving results failed: {detail}")
            }
            EngineError::InvalidTransition { from, to } => {
                write!(f, "illegal session transition {from:?} -> {to:?}")
            }
        }
    }
}

impl std::error::Error for EngineError {}
