use log::debug;
use rand::Rng;
use rand::seq::SliceRandom;

use cogbat_core::{
    CANVAS_HEIGHT, CANVAS_WIDTH, EngineError, InputEvent, InputFilter, InstrumentId,
    InteractionPort, MetricsRecord, Point, PortEvent, ResponseRecord, StimulusRecord,
    StimulusView, TrailForm, TrailLayout, TrailMetrics, TrailNode, TrailPassMetrics,
    TrialCondition, TrialPhase, TrialRecord, round2,
};
use cogbat_timing::Timer;

use crate::instrument::{Instrument, TrialCtx, TrialStep, ns_to_ms};

pub const GRID_SIZE: usize = 6;
pub const GRID_MARGIN: f32 = 60.0;
pub const NODE_RADIUS: f32 = 20.0;

pub const SAMPLE_A_LEN: usize = 8;
pub const TRIAL_A_LEN: usize = 25;
pub const SAMPLE_B_LEN: usize = 5;
pub const TRIAL_B_LEN: usize = 25;

struct PassPlan {
    condition: TrialCondition,
    phase: TrialPhase,
    form: TrailForm,
    len: usize,
    intro: &'static str,
}

/// The four passes, in protocol order. Sample B is practice-tagged but runs
/// between the two scored passes, so only Sample A counts as the session's
/// leading practice segment.
const PASSES: [PassPlan; 4] = [
    PassPlan {
        condition: TrialCondition::SampleA,
        phase: TrialPhase::Practice,
        form: TrailForm::Numeric,
        len: SAMPLE_A_LEN,
        intro: "Practice: click the circles in ascending order, starting at 1.",
    },
    PassPlan {
        condition: TrialCondition::TrailA,
        phase: TrialPhase::Main,
        form: TrailForm::Numeric,
        len: TRIAL_A_LEN,
        intro: "Connect the numbers 1 to 25 in ascending order, as fast as you can.",
    },
    PassPlan {
        condition: TrialCondition::SampleB,
        phase: TrialPhase::Practice,
        form: TrailForm::Alternating,
        len: SAMPLE_B_LEN,
        intro: "Practice: alternate between numbers and letters (1, A, 2, B, 3).",
    },
    PassPlan {
        condition: TrialCondition::TrailB,
        phase: TrialPhase::Main,
        form: TrailForm::Alternating,
        len: TRIAL_B_LEN,
        intro: "Alternate between numbers and letters (1, A, 2, B, ...) as fast as you can.",
    },
];

/// The 36 candidate node positions: cell centers of a 6x6 grid inside the
/// canvas margin.
pub fn candidate_positions() -> Vec<Point> {
    let cell_w = (CANVAS_WIDTH - 2.0 * GRID_MARGIN) / GRID_SIZE as f32;
    let cell_h = (CANVAS_HEIGHT - 2.0 * GRID_MARGIN) / GRID_SIZE as f32;
    let mut positions = Vec::with_capacity(GRID_SIZE * GRID_SIZE);
    for row in 0..GRID_SIZE {
        for col in 0..GRID_SIZE {
            positions.push(Point::new(
                GRID_MARGIN + (col as f32 + 0.5) * cell_w,
                GRID_MARGIN + (row as f32 + 0.5) * cell_h,
            ));
        }
    }
    positions
}

/// Label of the node at `index` in the target sequence: "1", "2", ... for the
/// numeric form, "1", "A", "2", "B", ... for the alternating form.
pub fn sequence_label(form: TrailForm, index: usize) -> String {
    match form {
        TrailForm::Numeric => (index + 1).to_string(),
        TrailForm::Alternating => {
            if index % 2 == 0 {
                (index / 2 + 1).to_string()
            } else {
                char::from(b'A' + (index / 2) as u8).to_string()
            }
        }
    }
}

/// Shuffle the candidate grid and assign the first `len` positions, in
/// shuffled order, to the target sequence.
pub fn generate_layout<R: Rng>(rng: &mut R, form: TrailForm, len: usize) -> TrailLayout {
    let mut positions = candidate_positions();
    positions.shuffle(rng);
    let nodes = positions
        .into_iter()
        .take(len)
        .enumerate()
        .map(|(target_index, center)| TrailNode {
            target_index,
            label: sequence_label(form, target_index),
            center,
        })
        .collect();
    TrailLayout {
        form,
        nodes,
        node_radius: NODE_RADIUS,
    }
}

/// Trail-Making: connect a scatter of labeled nodes in sequence. Four passes
/// per session; scored passes are timed from the first accepted click to the
/// final node, wrong-node clicks count errors without advancing.
#[derive(Debug, Clone, Default)]
pub struct TrailMaking;

impl TrailMaking {
    pub fn new() -> Self {
        TrailMaking
    }
}

impl Instrument for TrailMaking {
    fn id(&self) -> InstrumentId {
        InstrumentId::TrailMaking
    }

    fn instructions(&self) -> &'static str {
        "Connect the circles in order by clicking them one after another. \
         Work as fast as you can without mistakes."
    }

    fn practice_len(&self) -> usize {
        1
    }

    fn planned_len(&self) -> usize {
        PASSES.len()
    }

    fn reset<R: Rng>(&mut self, _rng: &mut R) -> Result<(), EngineError> {
        // Layouts are generated per pass; nothing survives between sessions.
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
        let Some(pass) = PASSES.get(index) else {
            return Ok(TrialStep::Finished);
        };

        let layout = generate_layout(ctx.rng, pass.form, pass.len);
        ctx.port.present(StimulusView::Message {
            text: pass.intro.to_string(),
        });
        ctx.port.present(StimulusView::TrailBoard {
            layout: layout.clone(),
        });

        let shown = ctx.timer.now();
        let mut cursor = 0usize;
        let mut errors = 0u32;
        let mut first_click: Option<u64> = None;

        while cursor < pass.len {
            match ctx.port.await_input(InputFilter::Clicks, None) {
                PortEvent::Input(InputEvent::Click { point }) => {
                    // A click that hits no node is a no-op and does not start
                    // the pass timer.
                    let Some(node) = layout.node_at(point) else {
                        continue;
                    };
                    if first_click.is_none() {
                        first_click = Some(ctx.timer.now());
                    }
                    if node.target_index == cursor {
                        cursor += 1;
                    } else {
                        errors += 1;
                    }
                }
                PortEvent::Abandoned => return Ok(TrialStep::Abandoned),
                _ => {}
            }
        }

        let end = ctx.timer.now();
        let elapsed_seconds = end.saturating_sub(first_click.unwrap_or(end)) as f64 / 1e9;
        debug!(
            "trail pass {:?}: {:.2} s, {} errors",
            pass.condition, elapsed_seconds, errors
        );

        Ok(TrialStep::Recorded(TrialRecord {
            phase: pass.phase,
            condition: pass.condition,
            stimulus: StimulusRecord::Trail { layout },
            response: ResponseRecord::Trail {
                elapsed_seconds,
                errors,
            },
            correct: errors == 0,
            reaction_time_ms: None,
            timestamp_start_ms: ns_to_ms(shown),
            timestamp_end_ms: ns_to_ms(end),
        }))
    }

    fn reduce(&self, records: &[TrialRecord]) -> MetricsRecord {
        let pass = |condition: TrialCondition| -> TrailPassMetrics {
            records
                .iter()
                .find(|r| r.condition == condition)
                .and_then(|r| match &r.response {
                    ResponseRecord::Trail {
                        elapsed_seconds,
                        errors,
                    } => Some(TrailPassMetrics {
                        time: round2(*elapsed_seconds),
                        errors: *errors,
                    }),
                    _ => None,
                })
                .unwrap_or(TrailPassMetrics {
                    time: 0.0,
                    errors: 0,
                })
        };

        let trial_a = pass(TrialCondition::TrailA);
        let trial_b = pass(TrialCondition::TrailB);
        let b_minus_a = round2(trial_b.time - trial_a.time);
        MetricsRecord::TrailMaking(TrailMetrics {
            trial_a,
            trial_b,
            b_minus_a,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn alternating_labels_interleave_numbers_and_letters() {
        let labels: Vec<String> = (0..5)
            .map(|i| sequence_label(TrailForm::Alternating, i))
            .collect();
        assert_eq!(labels, ["1", "A", "2", "B", "3"]);
        assert_eq!(sequence_label(TrailForm::Alternating, 23), "L");
        assert_eq!(sequence_label(TrailForm::Alternating, 24), "13");
        assert_eq!(sequence_label(TrailForm::Numeric, 24), "25");
    }

    #[test]
    fn candidate_grid_is_36_cells_inside_the_margin() {
        let positions = candidate_positions();
        assert_eq!(positions.len(), 36);
        for p in &positions {
            assert!(p.x >= GRID_MARGIN && p.x <= CANVAS_WIDTH - GRID_MARGIN);
            assert!(p.y >= GRID_MARGIN && p.y <= CANVAS_HEIGHT - GRID_MARGIN);
        }
        // Cells are far enough apart that node circles can never overlap.
        for (i, a) in positions.iter().enumerate() {
            for b in &positions[i + 1..] {
                assert!(a.distance_to(*b) > 2.0 * NODE_RADIUS);
            }
        }
    }

    #[test]
    fn layout_assigns_shuffled_positions_in_sequence_order() {
        let mut rng = StdRng::seed_from_u64(11);
        let layout = generate_layout(&mut rng, TrailForm::Alternating, TRIAL_B_LEN);
        assert_eq!(layout.nodes.len(), 25);
        for (i, node) in layout.nodes.iter().enumerate() {
            assert_eq!(node.target_index, i);
            assert_eq!(node.label, sequence_label(TrailForm::Alternating, i));
        }
        // All positions come from distinct grid cells.
        for (i, a) in layout.nodes.iter().enumerate() {
            for b in &layout.nodes[i + 1..] {
                assert!(a.center != b.center);
            }
        }
    }

    fn pass_record(condition: TrialCondition, phase: TrialPhase, time: f64, errors: u32) -> TrialRecord {
        let layout = TrailLayout {
            form: TrailForm::Numeric,
            nodes: Vec::new(),
            node_radius: NODE_RADIUS,
        };
        TrialRecord {
            phase,
            condition,
            stimulus: StimulusRecord::Trail { layout },
            response: ResponseRecord::Trail {
                elapsed_seconds: time,
                errors,
            },
            correct: errors == 0,
            reaction_time_ms: None,
            timestamp_start_ms: 0.0,
            timestamp_end_ms: time * 1000.0,
        }
    }

    #[test]
    fn reduce_reports_scored_passes_and_b_minus_a() {
        let records = vec![
            pass_record(TrialCondition::SampleA, TrialPhase::Practice, 5.0, 1),
            pass_record(TrialCondition::TrailA, TrialPhase::Main, 31.204, 1),
            pass_record(TrialCondition::SampleB, TrialPhase::Practice, 7.5, 0),
            pass_record(TrialCondition::TrailB, TrialPhase::Main, 44.751, 3),
        ];
        let MetricsRecord::TrailMaking(metrics) = TrailMaking::new().reduce(&records) else {
            panic!("wrong metrics variant");
        };
        assert_eq!(metrics.trial_a.time, 31.2);
        assert_eq!(metrics.trial_a.errors, 1);
        assert_eq!(metrics.trial_b.time, 44.75);
        assert_eq!(metrics.trial_b.errors, 3);
        assert_eq!(metrics.b_minus_a, 13.55);
    }

    #[test]
    fn reduce_without_passes_defaults_to_zero() {
        let MetricsRecord::TrailMaking(metrics) = TrailMaking::new().reduce(&[]) else {
            panic!("wrong metrics variant");
        };
        assert_eq!(metrics.trial_a.time, 0.0);
        assert_eq!(metrics.b_minus_a, 0.0);
    }
}
