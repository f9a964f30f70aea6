use std::time::Duration;

use log::debug;
use rand::Rng;
use rand::seq::SliceRandom;

use cogbat_core::{
    ArrowDirection, ArrowPosition, EngineError, InputEvent, InputFilter, InstrumentId,
    InteractionPort, MetricsRecord, PortEvent, ResponseRecord, StimulusRecord, StimulusView,
    StroopMetrics, StroopStimulus, TrialCondition, TrialPhase, TrialRecord, round2,
};
use cogbat_timing::Timer;

use crate::instrument::{Instrument, TrialCtx, TrialStep, mean_ms, ns_to_ms, percentage};

pub const PRACTICE_CONTROL_TRIALS: usize = 4;
pub const PRACTICE_EXPERIMENTAL_TRIALS: usize = 4;
pub const MAIN_CONTROL_TRIALS: usize = 20;
pub const MAIN_EXPERIMENTAL_TRIALS: usize = 40;

#[derive(Debug, Clone)]
struct PlannedTrial {
    phase: TrialPhase,
    condition: TrialCondition,
    stimulus: StroopStimulus,
}

/// Visual Stroop: respond to the direction an arrow points while the position
/// it appears at varies. The position manipulation is what the instrument
/// measures; it never enters correctness.
#[derive(Debug, Clone, Default)]
pub struct Stroop {
    schedule: Vec<PlannedTrial>,
}

impl Stroop {
    pub fn new() -> Self {
        Stroop::default()
    }
}

/// One segment of the schedule: a balanced direction multiset of `count`
/// trials, uniformly shuffled. Control trials pin the arrow to the center;
/// experimental trials draw the position independently of the direction,
/// which is what yields the congruent/incongruent split.
pub fn build_segment<R: Rng>(
    rng: &mut R,
    condition: TrialCondition,
    count: usize,
) -> Vec<StroopStimulus> {
    let mut directions: Vec<ArrowDirection> = ArrowDirection::ALL
        .iter()
        .copied()
        .cycle()
        .take(count)
        .collect();
    directions.shuffle(rng);

    directions
        .into_iter()
        .map(|direction| {
            let position = match condition {
                TrialCondition::Control => ArrowPosition::Center,
                _ => {
                    let slot = rng.random_range(0..ArrowPosition::DIRECTIONAL.len());
                    ArrowPosition::DIRECTIONAL[slot]
                }
            };
            StroopStimulus {
                direction,
                position,
            }
        })
        .collect()
}

fn stroop_stimulus(record: &TrialRecord) -> Option<StroopStimulus> {
    match record.stimulus {
        StimulusRecord::Stroop { stimulus } => Some(stimulus),
        _ => None,
    }
}

impl Instrument for Stroop {
    fn id(&self) -> InstrumentId {
        InstrumentId::Stroop
    }

    fn instructions(&self) -> &'static str {
        "Press the arrow key matching the direction the arrow points. \
         Ignore where on the screen it appears. Answer as fast as you can."
    }

    fn practice_len(&self) -> usize {
        PRACTICE_CONTROL_TRIALS + PRACTICE_EXPERIMENTAL_TRIALS
    }

    fn planned_len(&self) -> usize {
        self.practice_len() + MAIN_CONTROL_TRIALS + MAIN_EXPERIMENTAL_TRIALS
    }

    fn reset<R: Rng>(&mut self, rng: &mut R) -> Result<(), EngineError> {
        let segments = [
            (
                TrialPhase::Practice,
                TrialCondition::Control,
                PRACTICE_CONTROL_TRIALS,
            ),
            (
                TrialPhase::Practice,
                TrialCondition::Experimental,
                PRACTICE_EXPERIMENTAL_TRIALS,
            ),
            (TrialPhase::Main, TrialCondition::Control, MAIN_CONTROL_TRIALS),
            (
                TrialPhase::Main,
                TrialCondition::Experimental,
                MAIN_EXPERIMENTAL_TRIALS,
            ),
        ];
        self.schedule.clear();
        for (phase, condition, count) in segments {
            self.schedule.extend(
                build_segment(rng, condition, count)
                    .into_iter()
                    .map(|stimulus| PlannedTrial {
                        phase,
                        condition,
                        stimulus,
                    }),
            );
        }
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
        let Some(planned) = self.schedule.get(index).cloned() else {
            return Ok(TrialStep::Finished);
        };

        ctx.port.present(StimulusView::Fixation);
        ctx.timer
            .sleep(Duration::from_millis(ctx.timings.fixation_ms));

        ctx.port.present(StimulusView::Stroop {
            stimulus: planned.stimulus,
        });
        let onset = ctx.timer.now();

        // One directional response resolves the trial; there is no response
        // deadline for this instrument.
        loop {
            match ctx.port.await_input(InputFilter::Arrows, None) {
                PortEvent::Input(InputEvent::Arrow { direction }) => {
                    let rt_ms = ns_to_ms(ctx.timer.elapsed(onset).as_nanos() as u64);
                    let correct = direction == planned.stimulus.direction;
                    debug!(
                        "stroop trial {index}: {:?} answered {:?} in {:.1} ms, correct={}",
                        planned.stimulus.direction, direction, rt_ms, correct
                    );
                    return Ok(TrialStep::Recorded(TrialRecord {
                        phase: planned.phase,
                        condition: planned.condition,
                        stimulus: StimulusRecord::Stroop {
                            stimulus: planned.stimulus,
                        },
                        response: ResponseRecord::Stroop { key: direction },
                        correct,
                        reaction_time_ms: Some(rt_ms),
                        timestamp_start_ms: ns_to_ms(onset),
                        timestamp_end_ms: ns_to_ms(ctx.timer.now()),
                    }));
                }
                PortEvent::Abandoned => return Ok(TrialStep::Abandoned),
                _ => {}
            }
        }
    }

    fn reduce(&self, records: &[TrialRecord]) -> MetricsRecord {
        let scored: Vec<&TrialRecord> = records.iter().filter(|r| r.is_scored()).collect();
        let correct = scored.iter().filter(|r| r.correct).count();

        let all_rts: Vec<f64> = scored.iter().filter_map(|r| r.reaction_time_ms).collect();
        let experimental_rts = |congruent: bool| -> Vec<f64> {
            scored
                .iter()
                .copied()
                .filter(|r| r.condition == TrialCondition::Experimental)
                .filter_map(|r| {
                    let stimulus = stroop_stimulus(r)?;
                    if stimulus.congruent() == congruent {
                        r.reaction_time_ms
                    } else {
                        None
                    }
                })
                .collect()
        };
        let congruent_rts = experimental_rts(true);
        let incongruent_rts = experimental_rts(false);

        let congruent_rt = mean_ms(&congruent_rts);
        let incongruent_rt = mean_ms(&incongruent_rts);
        let stroop_effect = if congruent_rts.is_empty() || incongruent_rts.is_empty() {
            0.0
        } else {
            round2(incongruent_rt - congruent_rt)
        };

        MetricsRecord::Stroop(StroopMetrics {
            total_trials: scored.len(),
            accuracy: percentage(correct, scored.len()),
            average_rt: mean_ms(&all_rts),
            congruent_rt,
            incongruent_rt,
            stroop_effect,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn schedule_for_seed(seed: u64) -> Vec<PlannedTrial> {
        let mut stroop = Stroop::new();
        let mut rng = StdRng::seed_from_u64(seed);
        stroop.reset(&mut rng).unwrap();
        stroop.schedule
    }

    fn direction_counts(segment: &[PlannedTrial]) -> [usize; 4] {
        let mut counts = [0usize; 4];
        for trial in segment {
            let slot = ArrowDirection::ALL
                .iter()
                .position(|d| *d == trial.stimulus.direction)
                .unwrap();
            counts[slot] += 1;
        }
        counts
    }

    #[test]
    fn schedule_is_68_trials_in_four_segments() {
        let schedule = schedule_for_seed(7);
        assert_eq!(schedule.len(), 68);

        assert!(
            schedule[..4]
                .iter()
                .all(|t| t.phase == TrialPhase::Practice
                    && t.condition == TrialCondition::Control)
        );
        assert!(
            schedule[4..8]
                .iter()
                .all(|t| t.phase == TrialPhase::Practice
                    && t.condition == TrialCondition::Experimental)
        );
        assert!(
            schedule[8..28]
                .iter()
                .all(|t| t.phase == TrialPhase::Main && t.condition == TrialCondition::Control)
        );
        assert!(
            schedule[28..68]
                .iter()
                .all(|t| t.phase == TrialPhase::Main
                    && t.condition == TrialCondition::Experimental)
        );
    }

    #[test]
    fn every_segment_is_direction_balanced() {
        for seed in 0..20 {
            let schedule = schedule_for_seed(seed);
            assert_eq!(direction_counts(&schedule[..4]), [1, 1, 1, 1]);
            assert_eq!(direction_counts(&schedule[4..8]), [1, 1, 1, 1]);
            assert_eq!(direction_counts(&schedule[8..28]), [5, 5, 5, 5]);
            assert_eq!(direction_counts(&schedule[28..68]), [10, 10, 10, 10]);
        }
    }

    #[test]
    fn control_trials_are_centered_and_never_congruent() {
        let schedule = schedule_for_seed(3);
        for trial in schedule
            .iter()
            .filter(|t| t.condition == TrialCondition::Control)
        {
            assert_eq!(trial.stimulus.position, ArrowPosition::Center);
            assert!(!trial.stimulus.congruent());
        }
    }

    fn record(
        phase: TrialPhase,
        condition: TrialCondition,
        position: ArrowPosition,
        correct: bool,
        rt: f64,
    ) -> TrialRecord {
        let stimulus = StroopStimulus {
            direction: ArrowDirection::Right,
            position,
        };
        TrialRecord {
            phase,
            condition,
            stimulus: StimulusRecord::Stroop { stimulus },
            response: ResponseRecord::Stroop {
                key: if correct {
                    ArrowDirection::Right
                } else {
                    ArrowDirection::Left
                },
            },
            correct,
            reaction_time_ms: Some(rt),
            timestamp_start_ms: 0.0,
            timestamp_end_ms: rt,
        }
    }

    #[test]
    fn reduce_splits_experimental_rts_by_congruency() {
        let records = vec![
            // Practice is excluded from every figure.
            record(
                TrialPhase::Practice,
                TrialCondition::Control,
                ArrowPosition::Center,
                true,
                9_999.0,
            ),
            record(
                TrialPhase::Main,
                TrialCondition::Control,
                ArrowPosition::Center,
                true,
                300.0,
            ),
            record(
                TrialPhase::Main,
                TrialCondition::Experimental,
                ArrowPosition::Right,
                true,
                400.0,
            ),
            record(
                TrialPhase::Main,
                TrialCondition::Experimental,
                ArrowPosition::Right,
                true,
                500.0,
            ),
            record(
                TrialPhase::Main,
                TrialCondition::Experimental,
                ArrowPosition::Up,
                false,
                600.0,
            ),
            record(
                TrialPhase::Main,
                TrialCondition::Experimental,
                ArrowPosition::Left,
                true,
                700.0,
            ),
        ];

        let MetricsRecord::Stroop(metrics) = Stroop::new().reduce(&records) else {
            panic!("wrong metrics variant");
        };
        assert_eq!(metrics.total_trials, 5);
        assert_eq!(metrics.accuracy, 80.0);
        assert_eq!(metrics.average_rt, 500.0);
        assert_eq!(metrics.congruent_rt, 450.0);
        assert_eq!(metrics.incongruent_rt, 650.0);
        assert_eq!(metrics.stroop_effect, 200.0);
    }

    #[test]
    fn stroop_effect_is_zero_when_a_subset_is_empty() {
        // Every experimental trial congruent: no incongruent subset.
        let records = vec![
            record(
                TrialPhase::Main,
                TrialCondition::Experimental,
                ArrowPosition::Right,
                true,
                420.0,
            ),
            record(
                TrialPhase::Main,
                TrialCondition::Experimental,
                ArrowPosition::Right,
                true,
                430.0,
            ),
        ];
        let MetricsRecord::Stroop(metrics) = Stroop::new().reduce(&records) else {
            panic!("wrong metrics variant");
        };
        assert_eq!(metrics.congruent_rt, 425.0);
        assert_eq!(metrics.incongruent_rt, 0.0);
        assert_eq!(metrics.stroop_effect, 0.0);
    }

    #[test]
    fn reduce_of_nothing_is_all_zero() {
        let MetricsRecord::Stroop(metrics) = Stroop::new().reduce(&[]) else {
            panic!("wrong metrics variant");
        };
        assert_eq!(metrics.total_trials, 0);
        assert_eq!(metrics.accuracy, 0.0);
        assert_eq!(metrics.average_rt, 0.0);
        assert_eq!(metrics.stroop_effect, 0.0);
    }
}
