use std::time::Duration;

use log::debug;
use rand::Rng;

use cogbat_core::{
    DesignRecord, EngineError, FIVE_POINT_CENTER, FIVE_POINT_DIAGONALS, FivePointMetrics,
    InputEvent, InputFilter, InstrumentId, InteractionPort, MetricsRecord, Novelty, PortEvent,
    ResponseRecord, StimulusRecord, StimulusView, TrialCondition, TrialPhase, TrialRecord,
    five_point_dots,
};
use cogbat_timing::Timer;

use crate::instrument::{Instrument, TrialCtx, TrialStep, ns_to_ms};

pub const PRACTICE_SQUARES: usize = 3;
pub const MAIN_SQUARES: usize = 40;

/// Why a proposed line was refused. Checked in this order, so a line that is
/// both a duplicate and a diagonal reports the duplicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveRejection {
    Duplicate,
    BackwardsMove,
    DiagonalWithoutCenter,
}

impl MoveRejection {
    pub fn feedback(self) -> &'static str {
        match self {
            MoveRejection::Duplicate => "That line is already part of this design.",
            MoveRejection::BackwardsMove => {
                "That line already exists in the other direction."
            }
            MoveRejection::DiagonalWithoutCenter => {
                "Diagonal lines need both ends connected to the center first."
            }
        }
    }
}

fn is_diagonal(from: u8, to: u8) -> bool {
    let pair = if from <= to { (from, to) } else { (to, from) };
    FIVE_POINT_DIAGONALS.contains(&pair)
}

fn center_linked(edges: &[(u8, u8)], dot: u8) -> bool {
    edges
        .iter()
        .any(|&(a, b)| (a == dot && b == FIVE_POINT_CENTER) || (a == FIVE_POINT_CENTER && b == dot))
}

/// Rule check for one proposed line against the lines drawn so far in the
/// current square.
pub fn validate_move(edges: &[(u8, u8)], from: u8, to: u8) -> Result<(), MoveRejection> {
    if edges.contains(&(from, to)) {
        return Err(MoveRejection::Duplicate);
    }
    if edges.contains(&(to, from)) {
        return Err(MoveRejection::BackwardsMove);
    }
    if is_diagonal(from, to) && !(center_linked(edges, from) && center_linked(edges, to)) {
        return Err(MoveRejection::DiagonalWithoutCenter);
    }
    Ok(())
}

fn countdown_left<T: Timer<Timestamp = u64>>(timer: &T, started: u64, limit_ms: u64) -> u64 {
    limit_ms.saturating_sub(timer.elapsed(started).as_millis() as u64)
}

/// Five-Point design fluency: draw as many distinct line designs over the
/// five-dot square as possible. Three untimed practice squares, then a
/// countdown covering every scored square. The square in progress when the
/// countdown expires is discarded.
#[derive(Debug, Clone, Default)]
pub struct FivePoint {
    seen: Vec<Vec<(u8, u8)>>,
    countdown_start: Option<u64>,
}

impl FivePoint {
    pub fn new() -> Self {
        FivePoint::default()
    }
}

impl Instrument for FivePoint {
    fn id(&self) -> InstrumentId {
        InstrumentId::FivePoint
    }

    fn instructions(&self) -> &'static str {
        "Connect the dots with straight lines to make designs. Make as many \
         different designs as you can; every design must be new."
    }

    fn practice_len(&self) -> usize {
        PRACTICE_SQUARES
    }

    fn planned_len(&self) -> usize {
        PRACTICE_SQUARES + MAIN_SQUARES
    }

    fn reset<R: Rng>(&mut self, _rng: &mut R) -> Result<(), EngineError> {
        self.seen.clear();
        self.countdown_start = None;
        Ok(())
    }

    fn run_trial<T, P, R>(
        &mut self,
        index: usize,
        ctx: &mut TrialCtx<'_, T, P, R>,
    ) -> Result<TrialStep, EngineError>
    where
        T: Timer<Timestamp = u64>,
        P: InteractionPort,
        R: Rng,
    {
        if index >= PRACTICE_SQUARES + MAIN_SQUARES {
            return Ok(TrialStep::Finished);
        }
        let phase = if index < PRACTICE_SQUARES {
            TrialPhase::Practice
        } else {
            TrialPhase::Main
        };
        if phase == TrialPhase::Main && self.countdown_start.is_none() {
            // Practice designs do not count against the novelty pool.
            self.seen.clear();
            self.countdown_start = Some(ctx.timer.now());
            debug!("five-point countdown armed: {} ms", ctx.timings.five_point_limit_ms);
        }

        let dots = five_point_dots();
        let shown = ctx.timer.now();
        let mut edges: Vec<(u8, u8)> = Vec::new();
        let mut mistakes = 0u32;

        loop {
            let remaining = match self.countdown_start {
                Some(started) => {
                    let left = countdown_left(ctx.timer, started, ctx.timings.five_point_limit_ms);
                    if left == 0 {
                        return Ok(TrialStep::Finished);
                    }
                    Some(left)
                }
                None => None,
            };
            ctx.port.present(StimulusView::FivePointBoard {
                dots: dots.to_vec(),
                edges: edges.clone(),
                remaining_ms: remaining,
            });

            match ctx
                .port
                .await_input(InputFilter::FivePointMoves, remaining.map(Duration::from_millis))
            {
                PortEvent::Input(InputEvent::Connect { from, to }) => {
                    if from == to || from as usize >= dots.len() || to as usize >= dots.len() {
                        continue;
                    }
                    match validate_move(&edges, from, to) {
                        Ok(()) => edges.push((from, to)),
                        Err(rejection) => {
                            if phase == TrialPhase::Practice {
                                ctx.port.present(StimulusView::Message {
                                    text: rejection.feedback().to_string(),
                                });
                            } else {
                                mistakes += 1;
                            }
                        }
                    }
                }
                PortEvent::Input(InputEvent::EndDesign) => {
                    // An empty square cannot be submitted.
                    if !edges.is_empty() {
                        break;
                    }
                }
                PortEvent::Elapsed => return Ok(TrialStep::Finished),
                PortEvent::Abandoned => return Ok(TrialStep::Abandoned),
                _ => {}
            }
        }
        let end = ctx.timer.now();

        let design = DesignRecord::from_edges(edges);
        let novelty = if self.seen.contains(&design.canonical_form) {
            Novelty::Repeated
        } else {
            Novelty::New
        };
        if phase == TrialPhase::Practice && novelty == Novelty::Repeated {
            ctx.port.present(StimulusView::Message {
                text: "You already made that design. Every design must be new.".to_string(),
            });
        }
        self.seen.push(design.canonical_form.clone());

        Ok(TrialStep::Recorded(TrialRecord {
            phase,
            condition: TrialCondition::Square,
            stimulus: StimulusRecord::FivePoint {
                square: index as u32,
            },
            response: ResponseRecord::FivePoint {
                design,
                novelty,
                mistakes,
            },
            correct: novelty == Novelty::New,
            reaction_time_ms: Some(ns_to_ms(end.saturating_sub(shown))),
            timestamp_start_ms: ns_to_ms(shown),
            timestamp_end_ms: ns_to_ms(end),
        }))
    }

    fn reduce(&self, records: &[TrialRecord]) -> MetricsRecord {
        let mut new_designs = 0u32;
        let mut repetitions = 0u32;
        let mut mistakes_total = 0u32;
        let mut designs = Vec::new();
        for record in records.iter().filter(|r| r.is_scored()) {
            if let ResponseRecord::FivePoint {
                design,
                novelty,
                mistakes,
            } = &record.response
            {
                match novelty {
                    Novelty::New => new_designs += 1,
                    Novelty::Repeated => repetitions += 1,
                }
                mistakes_total += mistakes;
                designs.push(design.clone());
            }
        }
        MetricsRecord::FivePoint(FivePointMetrics {
            new_designs,
            repetitions,
            mistakes: mistakes_total,
            total_designs: new_designs + repetitions,
            designs,
        })
    }
}
