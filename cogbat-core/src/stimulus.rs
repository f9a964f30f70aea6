use serde::{Deserialize, Serialize};

use crate::geometry::Point;
use crate::metrics::MetricsRecord;

/// Defines the stimulus material each instrument generates. Everything here is
/// pure layout data; rendering consumes these through the interaction port.
#[derive(Copy, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ArrowDirection {
    Up,
    Down,
    Left,
    Right,
}

impl ArrowDirection {
    pub const ALL: [ArrowDirection; 4] = [
        ArrowDirection::Up,
        ArrowDirection::Down,
        ArrowDirection::Left,
        ArrowDirection::Right,
    ];
}

/// Where a Stroop arrow appears. Control trials always use `Center`;
/// experimental trials draw from the four directional slots.
#[derive(Copy, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ArrowPosition {
    Center,
    Up,
    Down,
    Left,
    Right,
}

impl ArrowPosition {
    pub const DIRECTIONAL: [ArrowPosition; 4] = [
        ArrowPosition::Up,
        ArrowPosition::Down,
        ArrowPosition::Left,
        ArrowPosition::Right,
    ];

    /// True when the position slot matches the given direction. `Center`
    /// matches nothing; congruency is only defined for experimental trials.
    pub fn matches(self, direction: ArrowDirection) -> bool {
        matches!(
            (self, direction),
            (ArrowPosition::Up, ArrowDirection::Up)
                | (ArrowPosition::Down, ArrowDirection::Down)
                | (ArrowPosition::Left, ArrowDirection::Left)
                | (ArrowPosition::Right, ArrowDirection::Right)
        )
    }
}

/// One Stroop stimulus: the direction the arrow points (the task-relevant
/// feature) and the position it is shown at (the manipulation).
#[derive(Copy, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StroopStimulus {
    pub direction: ArrowDirection,
    pub position: ArrowPosition,
}

impl StroopStimulus {
    pub fn congruent(self) -> bool {
        self.position.matches(self.direction)
    }
}

/// Node labeling scheme of a Trail-Making pass.
#[derive(Copy, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TrailForm {
    /// 1, 2, 3, ...
    Numeric,
    /// 1, A, 2, B, ... (13 numbers interleaved with 12 letters).
    Alternating,
}

/// One positioned Trail-Making node. `target_index` is the node's 0-based
/// rank in the connection sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrailNode {
    pub target_index: usize,
    pub label: String,
    pub center: Point,
}

/// A full Trail-Making pass layout, immutable once presented.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrailLayout {
    pub form: TrailForm,
    pub nodes: Vec<TrailNode>,
    pub node_radius: f32,
}

impl TrailLayout {
    /// The node under `point`, if any. Nodes never overlap (distinct grid
    /// cells), so the first hit is the only hit.
    pub fn node_at(&self, point: Point) -> Option<&TrailNode> {
        self.nodes
            .iter()
            .find(|n| n.center.distance_to(point) <= self.node_radius)
    }
}

/// Reproduction order for a Corsi trial.
#[derive(Copy, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CorsiDirection {
    Forward,
    Backward,
}

/// One Corsi trial's material: the block placement plus the to-be-memorized
/// index sequence (`span` blocks, revealed one at a time).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorsiLayout {
    pub blocks: Vec<Point>,
    pub block_size: f32,
    pub sequence: Vec<u8>,
    pub direction: CorsiDirection,
}

impl CorsiLayout {
    pub fn span(&self) -> usize {
        self.sequence.len()
    }

    /// The block whose square hit box contains `point`, if any.
    pub fn block_at(&self, point: Point) -> Option<u8> {
        let half = self.block_size / 2.0;
        self.blocks
            .iter()
            .position(|b| (b.x - point.x).abs() <= half && (b.y - point.y).abs() <= half)
            .map(|i| i as u8)
    }

    /// The click sequence that scores as correct for this trial.
    pub fn expected_clicks(&self) -> Vec<u8> {
        match self.direction {
            CorsiDirection::Forward => self.sequence.clone(),
            CorsiDirection::Backward => self.sequence.iter().rev().copied().collect(),
        }
    }
}

/// Five-Point dot indices: 0 top-left, 1 top-right, 2 bottom-left,
/// 3 bottom-right, 4 center.
pub const FIVE_POINT_CENTER: u8 = 4;

/// The two corner diagonals that must route through the center.
pub const FIVE_POINT_DIAGONALS: [(u8, u8); 2] = [(0, 3), (1, 2)];

/// Fixed 5-dot square, identical across all Five-Point squares.
pub fn five_point_dots() -> [Point; 5] {
    [
        Point::new(200.0, 100.0),
        Point::new(600.0, 100.0),
        Point::new(200.0, 500.0),
        Point::new(600.0, 500.0),
        Point::new(400.0, 300.0),
    ]
}

/// Response outcome of comparing one completed design against the session's
/// earlier designs.
#[derive(Copy, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Novelty {
    New,
    Repeated,
}

/// The connections a participant drew in one Five-Point square.
///
/// `edges` preserves draw order and direction; `canonical_form` is the sorted
/// undirected-edge list. Two designs are the same design iff their canonical
/// forms are equal, independent of draw order or direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignRecord {
    pub edges: Vec<(u8, u8)>,
    pub canonical_form: Vec<(u8, u8)>,
}

impl DesignRecord {
    pub fn from_edges(edges: Vec<(u8, u8)>) -> Self {
        let canonical_form = canonical_form(&edges);
        DesignRecord {
            edges,
            canonical_form,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn same_design(&self, other: &DesignRecord) -> bool {
        self.canonical_form == other.canonical_form
    }
}

/// Direction- and order-independent normal form of an edge list.
pub fn canonical_form(edges: &[(u8, u8)]) -> Vec<(u8, u8)> {
    let mut undirected: Vec<(u8, u8)> = edges
        .iter()
        .map(|&(a, b)| if a <= b { (a, b) } else { (b, a) })
        .collect();
    undirected.sort_unstable();
    undirected
}

/// What the engine exposes to the rendering collaborator at each step.
/// Strictly data; no markup or styling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "view")]
pub enum StimulusView {
    Blank,
    /// 500 ms cross preceding each Stroop stimulus.
    Fixation,
    Message {
        text: String,
    },
    Stroop {
        stimulus: StroopStimulus,
    },
    TrailBoard {
        layout: TrailLayout,
    },
    CorsiBoard {
        blocks: Vec<Point>,
        block_size: f32,
        lit: Option<u8>,
        direction: CorsiDirection,
    },
    FivePointBoard {
        dots: Vec<Point>,
        edges: Vec<(u8, u8)>,
        remaining_ms: Option<u64>,
    },
    SaveFailed {
        detail: String,
    },
    Results {
        metrics: MetricsRecord,
    },
}

/// Generated material of one trial, kept verbatim in the trial log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "instrument")]
pub enum StimulusRecord {
    Stroop { stimulus: StroopStimulus },
    Trail { layout: TrailLayout },
    Corsi { layout: CorsiLayout },
    FivePoint { square: u32 },
}

/// What the participant did in one trial, plus derived per-trial counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "instrument")]
pub enum ResponseRecord {
    Stroop {
        key: ArrowDirection,
    },
    Trail {
        elapsed_seconds: f64,
        errors: u32,
    },
    Corsi {
        clicks: Vec<u8>,
    },
    FivePoint {
        design: DesignRecord,
        novelty: Novelty,
        mistakes: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn congruency_is_position_direction_match() {
        let congruent = StroopStimulus {
            direction: ArrowDirection::Right,
            position: ArrowPosition::Right,
        };
        assert!(congruent.congruent());

        let incongruent = StroopStimulus {
            direction: ArrowDirection::Right,
            position: ArrowPosition::Up,
        };
        assert!(!incongruent.congruent());

        let control = StroopStimulus {
            direction: ArrowDirection::Right,
            position: ArrowPosition::Center,
        };
        assert!(!control.congruent());
    }

    #[test]
    fn canonical_form_ignores_direction_and_order() {
        let a = canonical_form(&[(0, 1), (1, 2)]);
        let b = canonical_form(&[(2, 1), (1, 0)]);
        assert_eq!(a, b);
        assert_eq!(a, vec![(0, 1), (1, 2)]);
    }

    #[test]
    fn same_design_uses_canonical_form() {
        let first = DesignRecord::from_edges(vec![(0, 1), (1, 2)]);
        let second = DesignRecord::from_edges(vec![(2, 1), (1, 0)]);
        assert!(first.same_design(&second));
        assert_ne!(first.edges, second.edges);
    }

    #[test]
    fn corsi_backward_expects_reversed_sequence() {
        let layout = CorsiLayout {
            blocks: vec![Point::new(0.0, 0.0); 8],
            block_size: 70.0,
            sequence: vec![3, 1, 7],
            direction: CorsiDirection::Backward,
        };
        assert_eq!(layout.expected_clicks(), vec![7, 1, 3]);
    }

    #[test]
    fn corsi_hit_test_uses_square_box() {
        let layout = CorsiLayout {
            blocks: vec![Point::new(100.0, 100.0), Point::new(300.0, 100.0)],
            block_size: 70.0,
            sequence: vec![0, 1],
            direction: CorsiDirection::Forward,
        };
        assert_eq!(layout.block_at(Point::new(130.0, 130.0)), Some(0));
        assert_eq!(layout.block_at(Point::new(300.0, 64.0)), None);
        assert_eq!(layout.block_at(Point::new(300.0, 66.0)), Some(1));
    }

    #[test]
    fn five_point_dots_are_four_corners_plus_center() {
        let dots = five_point_dots();
        assert_eq!(dots.len(), 5);
        let center = dots[FIVE_POINT_CENTER as usize];
        assert_eq!(center, Point::new(400.0, 300.0));
        for (a, b) in FIVE_POINT_DIAGONALS {
            // Diagonal endpoints straddle the center.
            let mid = Point::new(
                (dots[a as usize].x + dots[b as usize].x) / 2.0,
                (dots[a as usize].y + dots[b as usize].y) / 2.0,
            );
            assert_eq!(mid, center);
        }
    }
}
