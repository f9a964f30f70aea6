use std::time::Duration;

use chrono::Utc;
use log::{error, info, warn};
use rand::Rng;

use cogbat_core::{
    EngineError, InputEvent, InputFilter, InteractionPort, MetricsRecord, ParticipantId,
    PortEvent, ResultStore, SaveRequest, SessionPhase, StimulusView,
};
use cogbat_timing::Timer;

use crate::config::Timings;
use crate::instrument::{Instrument, TrialCtx, TrialStep};
use crate::session::Session;

/// How a session run came to rest.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    /// Ran to completion; metrics were reduced and saved.
    Completed { metrics: MetricsRecord },
    /// A stored result already existed, so the session jumped straight to
    /// the results screen without re-running the instrument.
    AlreadyCompleted { metrics: MetricsRecord },
    /// The participant walked away mid-session; nothing was saved.
    Abandoned,
}

/// Drives one instrument through the session phases: instructions, optional
/// practice, the scored run, saving and results. Owns the timer, interaction
/// port, randomness and result store for the duration of the session.
pub struct PhaseController<I, T, P, R, S>
where
    I: Instrument,
    T: Timer<Timestamp = u64>,
    P: InteractionPort,
    R: Rng,
    S: ResultStore,
{
    pub instrument: I,
    pub timer: T,
    pub port: P,
    pub rng: R,
    pub store: S,
    pub timings: Timings,
}

impl<I, T, P, R, S> PhaseController<I, T, P, R, S>
where
    I: Instrument,
    T: Timer<Timestamp = u64>,
    P: InteractionPort,
    R: Rng,
    S: ResultStore,
{
    pub fn new(instrument: I, timer: T, port: P, rng: R, store: S) -> Self {
        PhaseController {
            instrument,
            timer,
            port,
            rng,
            store,
            timings: Timings::default(),
        }
    }

    pub fn with_timings(mut self, timings: Timings) -> Self {
        self.timings = timings;
        self
    }

    /// Entry point for a session. Requires a participant id; if this
    /// participant already has a stored result for the instrument, shows it
    /// and stops instead of re-running.
    pub fn start(
        &mut self,
        participant: Option<&ParticipantId>,
    ) -> Result<SessionOutcome, EngineError> {
        let participant = participant.cloned().ok_or(EngineError::ParticipantRequired)?;
        if let Some(previous) = self
            .store
            .previous_result(&participant, self.instrument.id())
        {
            info!(
                "{participant} already has a {} result, showing it",
                self.instrument.id()
            );
            let mut session = Session::new(participant, self.instrument.id());
            session.advance(SessionPhase::Results)?;
            self.port.present(StimulusView::Results {
                metrics: previous.clone(),
            });
            return Ok(SessionOutcome::AlreadyCompleted { metrics: previous });
        }
        let session = Session::new(participant, self.instrument.id());
        self.run_session(session)
    }

    /// Fresh session regardless of any stored result. Reached from the
    /// results screen.
    pub fn retake(&mut self, participant: &ParticipantId) -> Result<SessionOutcome, EngineError> {
        info!("{participant} retaking {}", self.instrument.id());
        let session = Session::new(participant.clone(), self.instrument.id());
        self.run_session(session)
    }

    fn run_session(&mut self, mut session: Session) -> Result<SessionOutcome, EngineError> {
        self.instrument.reset(&mut self.rng)?;
        info!("{} starting {}", session.participant(), session.instrument());

        self.port.present(StimulusView::Message {
            text: self.instrument.instructions().to_string(),
        });
        loop {
            match self.port.await_input(InputFilter::Clicks, None) {
                PortEvent::Input(_) => break,
                PortEvent::Abandoned => {
                    info!("abandoned at instructions");
                    return Ok(SessionOutcome::Abandoned);
                }
                PortEvent::Elapsed => {}
            }
        }

        let practice_len = self.instrument.practice_len();
        if practice_len > 0 {
            session.advance(SessionPhase::Practice)?;
        } else {
            session.advance(SessionPhase::Running)?;
        }

        let mut index = 0usize;
        loop {
            if session.phase().is_practice() && index >= practice_len {
                session.advance(SessionPhase::Running)?;
            }
            let mut ctx = TrialCtx {
                timer: &self.timer,
                port: &mut self.port,
                rng: &mut self.rng,
                timings: &self.timings,
            };
            match self.instrument.run_trial(index, &mut ctx) {
                Ok(TrialStep::Recorded(record)) => {
                    session.record(record);
                    index += 1;
                    self.timer
                        .sleep(Duration::from_millis(self.timings.inter_trial_ms));
                }
                Ok(TrialStep::Finished) => break,
                Ok(TrialStep::Abandoned) => {
                    info!("abandoned after {} trials", session.records().len());
                    return Ok(SessionOutcome::Abandoned);
                }
                Err(err) => {
                    error!("trial {index} failed: {err}");
                    if session.phase().can_advance_to(SessionPhase::Error) {
                        session.advance(SessionPhase::Error)?;
                        self.port.present(StimulusView::Message {
                            text: err.to_string(),
                        });
                    }
                    return Err(err);
                }
            }
        }

        // A port can end the run before practice is exhausted; the machine
        // still passes through Running on its way out.
        if session.phase().is_practice() {
            session.advance(SessionPhase::Running)?;
        }
        session.advance(SessionPhase::Saving)?;
        let metrics = self.instrument.reduce(session.records());
        let completed_at = Utc::now();
        session.complete(completed_at);
        let request = SaveRequest {
            participant: session.participant().clone(),
            instrument: session.instrument(),
            metrics: metrics.clone(),
            raw_trials: session.records().to_vec(),
            completed_at,
        };

        // Failed saves park the session in Error until the participant asks
        // for a retry; the request itself is reused unchanged.
        loop {
            match self.store.save(&request) {
                Ok(()) => break,
                Err(err) => {
                    warn!("save failed: {err}");
                    session.advance(SessionPhase::Error)?;
                    self.port.present(StimulusView::SaveFailed {
                        detail: err.to_string(),
                    });
                    loop {
                        match self.port.await_input(InputFilter::Retry, None) {
                            PortEvent::Input(InputEvent::Retry) => break,
                            PortEvent::Abandoned => {
                                info!("abandoned with unsaved results");
                                return Ok(SessionOutcome::Abandoned);
                            }
                            _ => {}
                        }
                    }
                    session.advance(SessionPhase::Saving)?;
                }
            }
        }

        session.advance(SessionPhase::Results)?;
        info!(
            "{} completed {} with {} scored trials",
            session.participant(),
            session.instrument(),
            session.scored_len()
        );
        self.port.present(StimulusView::Results {
            metrics: metrics.clone(),
        });
        Ok(SessionOutcome::Completed { metrics })
    }
}
