use serde::{Deserialize, Serialize};

/// Session state machine states. One value lives on the session owned by the
/// controller; callers may only enter the machine through `start()` (at
/// `Instructions`) and `retake()` (at `Results`).
#[derive(Copy, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionPhase {
    Instructions,
    Practice,
    Running,
    Saving,
    Results,
    Error,
}

impl Default for SessionPhase {
    fn default() -> Self {
        SessionPhase::Instructions
    }
}

impl SessionPhase {
    /// Legal transitions of the session machine. `Practice` is optional:
    /// instruments without a leading practice segment go straight to
    /// `Running`. `Error` is the non-fatal recovery state for save and
    /// stimulus failures; `Results -> Instructions` is the retake path.
    pub fn can_advance_to(self, next: SessionPhase) -> bool {
        use SessionPhase::*;
        matches!(
            (self, next),
            (Instructions, Practice)
                | (Instructions, Running)
                | (Instructions, Results)
                | (Practice, Running)
                | (Running, Saving)
                | (Running, Error)
                | (Saving, Results)
                | (Saving, Error)
                | (Error, Running)
                | (Error, Saving)
                | (Results, Instructions)
        )
    }

    /// True while the machine accepts participant input.
    pub fn allows_input(self) -> bool {
        matches!(self, SessionPhase::Practice | SessionPhase::Running)
    }

    pub fn is_practice(self) -> bool {
        self == SessionPhase::Practice
    }

    pub fn is_running(self) -> bool {
        self == SessionPhase::Running
    }

    pub fn is_terminal(self) -> bool {
        self == SessionPhase::Results
    }
}
