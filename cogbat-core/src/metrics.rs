use serde::{Deserialize, Serialize};

use crate::stimulus::DesignRecord;
use crate::trial::InstrumentId;

/// Round to 2 decimals. Every floating metric in the persisted contract goes
/// through this so stored values are stable across platforms.
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Stroop summary over the scored trials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StroopMetrics {
    pub total_trials: usize,
    /// Percent correct over all scored trials.
    pub accuracy: f64,
    #[serde(rename = "averageRT")]
    pub average_rt: f64,
    /// Mean RT within the congruent subset of the experimental condition.
    #[serde(rename = "congruentRT")]
    pub congruent_rt: f64,
    #[serde(rename = "incongruentRT")]
    pub incongruent_rt: f64,
    /// incongruentRT - congruentRT; 0 if either subset is empty.
    pub stroop_effect: f64,
}

/// One scored Trail-Making pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrailPassMetrics {
    /// Elapsed seconds, first accepted click to final node.
    pub time: f64,
    pub errors: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrailMetrics {
    pub trial_a: TrailPassMetrics,
    pub trial_b: TrailPassMetrics,
    /// trialB.time - trialA.time, the executive-function index.
    pub b_minus_a: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorsiMetrics {
    /// Largest span among correct trials per direction; 0 if none correct.
    pub forward_span: u8,
    pub backward_span: u8,
    pub total_span: u8,
    /// Percent correct over all 14 trials.
    pub accuracy: f64,
    pub forward_accuracy: f64,
    pub backward_accuracy: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FivePointMetrics {
    pub new_designs: u32,
    pub repetitions: u32,
    pub mistakes: u32,
    pub total_designs: u32,
    /// Every completed scored design, for audit.
    pub designs: Vec<DesignRecord>,
}

/// Instrument-tagged metrics record: the de facto schema contract with the
/// persistence collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "instrument", rename_all = "camelCase")]
pub enum MetricsRecord {
    Stroop(StroopMetrics),
    TrailMaking(TrailMetrics),
    CorsiBlocks(CorsiMetrics),
    FivePoint(FivePointMetrics),
}

impl MetricsRecord {
    pub fn instrument(&self) -> InstrumentId {
        match self {
            MetricsRecord::Stroop(_) => InstrumentId::Stroop,
            MetricsRecord::TrailMaking(_) => InstrumentId::TrailMaking,
            MetricsRecord::CorsiBlocks(_) => InstrumentId::CorsiBlocks,
            MetricsRecord::FivePoint(_) => InstrumentId::FivePoint,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round2_rounds_half_up_at_two_decimals() {
        assert_eq!(round2(12.345), 12.35);
        assert_eq!(round2(12.344), 12.34);
        assert_eq!(round2(-3.005), -3.0);
        assert_eq!(round2(100.0), 100.0);
    }

    #[test]
    fn stroop_contract_field_names() {
        let record = MetricsRecord::Stroop(StroopMetrics {
            total_trials: 60,
            accuracy: 95.0,
            average_rt: 512.25,
            congruent_rt: 480.0,
            incongruent_rt: 540.5,
            stroop_effect: 60.5,
        });
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["instrument"], "stroop");
        assert_eq!(json["totalTrials"], 60);
        assert_eq!(json["averageRT"], 512.25);
        assert_eq!(json["congruentRT"], 480.0);
        assert_eq!(json["incongruentRT"], 540.5);
        assert_eq!(json["stroopEffect"], 60.5);
    }

    #[test]
    fn trail_contract_field_names() {
        let record = MetricsRecord::TrailMaking(TrailMetrics {
            trial_a: TrailPassMetrics {
                time: 31.2,
                errors: 1,
            },
            trial_b: TrailPassMetrics {
                time: 44.75,
                errors: 3,
            },
            b_minus_a: 13.55,
        });
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["trialA"]["time"], 31.2);
        assert_eq!(json["trialB"]["errors"], 3);
        assert_eq!(json["bMinusA"], 13.55);
    }

    #[test]
    fn corsi_and_five_point_field_names() {
        let corsi = serde_json::to_value(MetricsRecord::CorsiBlocks(CorsiMetrics {
            forward_span: 6,
            backward_span: 5,
            total_span: 11,
            accuracy: 78.57,
            forward_accuracy: 85.71,
            backward_accuracy: 71.43,
        }))
        .unwrap();
        assert_eq!(corsi["forwardSpan"], 6);
        assert_eq!(corsi["totalSpan"], 11);
        assert_eq!(corsi["backwardAccuracy"], 71.43);

        let fp = serde_json::to_value(MetricsRecord::FivePoint(FivePointMetrics {
            new_designs: 17,
            repetitions: 2,
            mistakes: 4,
            total_designs: 19,
            designs: Vec::new(),
        }))
        .unwrap();
        assert_eq!(fp["newDesigns"], 17);
        assert_eq!(fp["totalDesigns"], 19);
    }
}
