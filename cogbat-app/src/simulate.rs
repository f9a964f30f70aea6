use std::collections::VecDeque;
use std::time::Duration;

use rand::Rng;
use rand::rngs::StdRng;

use cogbat_core::{
    ArrowDirection, CANVAS_HEIGHT, CANVAS_WIDTH, CorsiDirection, InputEvent, InputFilter,
    InteractionPort, Point, PortEvent, StimulusView,
};
use cogbat_timing::VirtualTimer;

/// Response profile of the simulated participant.
pub struct Profile {
    pub latency: Duration,
    /// Chance per response of a deliberate slip: a wrong arrow, an
    /// out-of-order trail click, a swapped corsi pair, a duplicate line.
    pub error_rate: f64,
}

impl Default for Profile {
    fn default() -> Self {
        Profile {
            latency: Duration::from_millis(350),
            error_rate: 0.08,
        }
    }
}

/// Interaction port that plays every instrument from the presented views,
/// advancing the virtual clock by its response latency on each wait. Answers
/// are correct except for profile-driven slips, so battery runs produce
/// plausible rather than perfect metrics.
pub struct SimulatedParticipant {
    clock: VirtualTimer,
    profile: Profile,
    rng: StdRng,
    view: Option<StimulusView>,
    trail_cursor: usize,
    corsi_seen: Vec<u8>,
    design_bank: Vec<Vec<(u8, u8)>>,
    next_design: usize,
    pending: VecDeque<InputEvent>,
}

/// Distinct designs for the five-point square, diagonals listed after their
/// center anchors so every move validates. The bank wraps once a run outlasts
/// it, which is what produces repetitions.
fn design_bank() -> Vec<Vec<(u8, u8)>> {
    let sides: [(u8, u8); 8] = [
        (0, 1),
        (0, 2),
        (1, 3),
        (2, 3),
        (0, 4),
        (1, 4),
        (2, 4),
        (3, 4),
    ];
    let mut bank: Vec<Vec<(u8, u8)>> = sides.iter().map(|&edge| vec![edge]).collect();
    for (i, &a) in sides.iter().enumerate() {
        for &b in &sides[i + 1..] {
            bank.push(vec![a, b]);
        }
    }
    bank.push(vec![(0, 4), (3, 4), (0, 3)]);
    bank.push(vec![(1, 4), (2, 4), (1, 2)]);
    bank
}

fn center_click() -> InputEvent {
    InputEvent::Click {
        point: Point::new(CANVAS_WIDTH / 2.0, CANVAS_HEIGHT / 2.0),
    }
}

impl SimulatedParticipant {
    pub fn new(clock: VirtualTimer, profile: Profile, rng: StdRng) -> Self {
        SimulatedParticipant {
            clock,
            profile,
            rng,
            view: None,
            trail_cursor: 0,
            corsi_seen: Vec::new(),
            design_bank: design_bank(),
            next_design: 0,
            pending: VecDeque::new(),
        }
    }

    fn slips(&mut self) -> bool {
        self.rng.random_bool(self.profile.error_rate)
    }

    fn answer_arrow(&mut self) -> InputEvent {
        let direction = match &self.view {
            Some(StimulusView::Stroop { stimulus }) => stimulus.direction,
            _ => ArrowDirection::Up,
        };
        let answered = if self.slips() {
            let others: Vec<ArrowDirection> = ArrowDirection::ALL
                .iter()
                .copied()
                .filter(|d| *d != direction)
                .collect();
            others[self.rng.random_range(0..others.len())]
        } else {
            direction
        };
        InputEvent::Arrow {
            direction: answered,
        }
    }

    fn answer_click(&mut self) -> InputEvent {
        let slip = self.slips();
        match &self.view {
            Some(StimulusView::TrailBoard { layout }) if !layout.nodes.is_empty() => {
                let target = self.trail_cursor.min(layout.nodes.len() - 1);
                // A slip clicks the node after the current target; the
                // cursor holds so the next click recovers.
                if slip && target + 1 < layout.nodes.len() {
                    InputEvent::Click {
                        point: layout.nodes[target + 1].center,
                    }
                } else {
                    self.trail_cursor = target + 1;
                    InputEvent::Click {
                        point: layout.nodes[target].center,
                    }
                }
            }
            Some(StimulusView::CorsiBoard {
                blocks, direction, ..
            }) => {
                let mut order = self.corsi_seen.clone();
                if *direction == CorsiDirection::Backward {
                    order.reverse();
                }
                if slip && order.len() >= 2 {
                    order.swap(0, 1);
                }
                let mut queue: VecDeque<InputEvent> = order
                    .iter()
                    .map(|&block| InputEvent::Click {
                        point: blocks[block as usize],
                    })
                    .collect();
                self.corsi_seen.clear();
                match queue.pop_front() {
                    Some(first) => {
                        self.pending = queue;
                        first
                    }
                    None => center_click(),
                }
            }
            // The begin wait on the instructions screen.
            _ => center_click(),
        }
    }

    fn answer_five_point(&mut self) -> InputEvent {
        let slip = self.slips();
        let design = self.design_bank[self.next_design % self.design_bank.len()].clone();
        self.next_design += 1;

        let mut moves: Vec<InputEvent> = design
            .iter()
            .map(|&(from, to)| InputEvent::Connect { from, to })
            .collect();
        if slip {
            // Redraw the first line; the engine refuses it as a duplicate.
            let (from, to) = design[0];
            moves.push(InputEvent::Connect { from, to });
        }
        moves.push(InputEvent::EndDesign);

        let mut queue: VecDeque<InputEvent> = moves.into();
        match queue.pop_front() {
            Some(first) => {
                self.pending = queue;
                first
            }
            None => InputEvent::EndDesign,
        }
    }
}

impl InteractionPort for SimulatedParticipant {
    fn present(&mut self, view: StimulusView) {
        match &view {
            StimulusView::TrailBoard { .. } => self.trail_cursor = 0,
            StimulusView::CorsiBoard {
                lit: Some(block), ..
            } => self.corsi_seen.push(*block),
            _ => {}
        }
        self.view = Some(view);
    }

    fn await_input(&mut self, filter: InputFilter, _deadline: Option<Duration>) -> PortEvent {
        self.clock.advance(self.profile.latency);
        if let Some(event) = self.pending.pop_front() {
            return PortEvent::Input(event);
        }
        let event = match filter {
            InputFilter::Retry => InputEvent::Retry,
            InputFilter::Arrows => self.answer_arrow(),
            InputFilter::Clicks => self.answer_click(),
            InputFilter::FivePointMoves => self.answer_five_point(),
        };
        PortEvent::Input(event)
    }
}
