use std::time::Duration;

use log::debug;
use rand::Rng;

use cogbat_core::{
    CANVAS_HEIGHT, CANVAS_WIDTH, CorsiDirection, CorsiLayout, CorsiMetrics, EngineError,
    InputEvent, InputFilter, InstrumentId, InteractionPort, MetricsRecord, Point, PortEvent,
    ResponseRecord, StimulusRecord, StimulusView, TrialCondition, TrialPhase, TrialRecord,
};
use cogbat_timing::Timer;

use crate::instrument::{Instrument, TrialCtx, TrialStep, ns_to_ms, percentage};

pub const BLOCK_COUNT: usize = 8;
pub const BLOCK_SIZE: f32 = 70.0;
pub const MIN_BLOCK_DISTANCE: f32 = 120.0;
pub const PLACEMENT_ATTEMPTS: usize = 1000;

pub const MIN_SPAN: usize = 2;
pub const MAX_SPAN: usize = 8;

const FALLBACK_COLS: usize = 4;
const FALLBACK_ROWS: usize = 3;
const FALLBACK_JITTER: f32 = 40.0;

fn clear_of(blocks: &[Point], candidate: Point) -> bool {
    blocks
        .iter()
        .all(|b| b.distance_to(candidate) >= MIN_BLOCK_DISTANCE)
}

/// Deterministic backstop when rejection sampling runs dry: walk a 4x3 grid
/// of cells, jitter each center, and take the first cell that keeps its
/// distance from every placed block. Cell centers are 200px apart, so two
/// jittered neighbours can never come closer than the minimum distance.
fn fallback_cell<R: Rng>(rng: &mut R, blocks: &[Point]) -> Result<Point, EngineError> {
    for row in 0..FALLBACK_ROWS {
        for col in 0..FALLBACK_COLS {
            let center = Point::new(
                CANVAS_WIDTH / FALLBACK_COLS as f32 * (col as f32 + 0.5),
                CANVAS_HEIGHT / FALLBACK_ROWS as f32 * (row as f32 + 0.5),
            );
            let jittered = Point::new(
                center.x + rng.random_range(-FALLBACK_JITTER..=FALLBACK_JITTER),
                center.y + rng.random_range(-FALLBACK_JITTER..=FALLBACK_JITTER),
            );
            if clear_of(blocks, jittered) {
                return Ok(jittered);
            }
        }
    }
    Err(EngineError::StimulusLoadFailure(
        "corsi block placement exhausted the fallback grid".to_string(),
    ))
}

/// Scatter the blocks across the canvas by rejection sampling, at least
/// `MIN_BLOCK_DISTANCE` apart center to center.
pub fn place_blocks<R: Rng>(rng: &mut R) -> Result<Vec<Point>, EngineError> {
    let half = BLOCK_SIZE / 2.0;
    let mut blocks: Vec<Point> = Vec::with_capacity(BLOCK_COUNT);
    for _ in 0..BLOCK_COUNT {
        let sampled = (0..PLACEMENT_ATTEMPTS)
            .map(|_| {
                Point::new(
                    rng.random_range(half..CANVAS_WIDTH - half),
                    rng.random_range(half..CANVAS_HEIGHT - half),
                )
            })
            .find(|candidate| clear_of(&blocks, *candidate));
        let position = match sampled {
            Some(point) => point,
            None => fallback_cell(rng, &blocks)?,
        };
        blocks.push(position);
    }
    Ok(blocks)
}

/// Distinct block indices to light up for one trial.
pub fn draw_sequence<R: Rng>(rng: &mut R, span: usize) -> Vec<u8> {
    rand::seq::index::sample(rng, BLOCK_COUNT, span)
        .iter()
        .map(|i| i as u8)
        .collect()
}

fn trial_plan() -> Vec<(CorsiDirection, usize)> {
    let spans = MIN_SPAN..=MAX_SPAN;
    spans
        .clone()
        .map(|span| (CorsiDirection::Forward, span))
        .chain(spans.map(|span| (CorsiDirection::Backward, span)))
        .collect()
}

/// Corsi block-tapping: watch a sequence of blocks light up, then click them
/// back in presentation order (forward block) or reversed (backward block).
/// Spans climb from 2 to 8 in each direction; there is no practice segment.
#[derive(Debug, Clone)]
pub struct CorsiBlocks {
    plan: Vec<(CorsiDirection, usize)>,
}

impl Default for CorsiBlocks {
    fn default() -> Self {
        Self::new()
    }
}

impl CorsiBlocks {
    pub fn new() -> Self {
        CorsiBlocks { plan: trial_plan() }
    }
}

impl Instrument for CorsiBlocks {
    fn id(&self) -> InstrumentId {
        InstrumentId::CorsiBlocks
    }

    fn instructions(&self) -> &'static str {
        "Watch the blocks light up, then click them back in the same order. \
         Halfway through, the rule flips: click them in reverse order."
    }

    fn practice_len(&self) -> usize {
        0
    }

    fn planned_len(&self) -> usize {
        self.plan.len()
    }

    fn reset<R: Rng>(&mut self, _rng: &mut R) -> Result<(), EngineError> {
        // Layouts roll per trial; the span ladder itself is fixed.
        self.plan = trial_plan();
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
        let Some(&(direction, span)) = self.plan.get(index) else {
            return Ok(TrialStep::Finished);
        };

        let blocks = place_blocks(ctx.rng)?;
        let sequence = draw_sequence(ctx.rng, span);
        debug!("corsi trial {index}: {direction:?} span {span}");

        let board = |lit: Option<u8>| StimulusView::CorsiBoard {
            blocks: blocks.clone(),
            block_size: BLOCK_SIZE,
            lit,
            direction,
        };

        let shown = ctx.timer.now();
        ctx.port.present(board(None));
        for &block in &sequence {
            ctx.port.present(board(Some(block)));
            ctx.timer.sleep(Duration::from_millis(ctx.timings.corsi_lit_ms));
            ctx.port.present(board(None));
            ctx.timer.sleep(Duration::from_millis(ctx.timings.corsi_gap_ms));
        }

        let layout = CorsiLayout {
            blocks,
            block_size: BLOCK_SIZE,
            sequence,
            direction,
        };

        let mut clicks: Vec<u8> = Vec::with_capacity(span);
        while clicks.len() < span {
            match ctx.port.await_input(InputFilter::Clicks, None) {
                PortEvent::Input(InputEvent::Click { point }) => {
                    // Clicks between blocks are ignored rather than scored.
                    if let Some(block) = layout.block_at(point) {
                        clicks.push(block);
                    }
                }
                PortEvent::Abandoned => return Ok(TrialStep::Abandoned),
                _ => {}
            }
        }
        let end = ctx.timer.now();

        let correct = clicks == layout.expected_clicks();
        let condition = match direction {
            CorsiDirection::Forward => TrialCondition::Forward,
            CorsiDirection::Backward => TrialCondition::Backward,
        };
        Ok(TrialStep::Recorded(TrialRecord {
            phase: TrialPhase::Main,
            condition,
            stimulus: StimulusRecord::Corsi { layout },
            response: ResponseRecord::Corsi { clicks },
            correct,
            reaction_time_ms: None,
            timestamp_start_ms: ns_to_ms(shown),
            timestamp_end_ms: ns_to_ms(end),
        }))
    }

    fn reduce(&self, records: &[TrialRecord]) -> MetricsRecord {
        let best_span = |condition: TrialCondition| -> u8 {
            records
                .iter()
                .filter(|r| r.condition == condition && r.correct)
                .filter_map(|r| match &r.stimulus {
                    StimulusRecord::Corsi { layout } => Some(layout.span() as u8),
                    _ => None,
                })
                .max()
                .unwrap_or(0)
        };
        let accuracy_of = |condition: TrialCondition| -> f64 {
            let total = records.iter().filter(|r| r.condition == condition).count();
            let correct = records
                .iter()
                .filter(|r| r.condition == condition && r.correct)
                .count();
            percentage(correct, total)
        };

        let forward_span = best_span(TrialCondition::Forward);
        let backward_span = best_span(TrialCondition::Backward);
        let correct_total = records.iter().filter(|r| r.correct).count();
        MetricsRecord::CorsiBlocks(CorsiMetrics {
            forward_span,
            backward_span,
            total_span: forward_span + backward_span,
            accuracy: percentage(correct_total, records.len()),
            forward_accuracy: accuracy_of(TrialCondition::Forward),
            backward_accuracy: accuracy_of(TrialCondition::Backward),
        })
    }
}
