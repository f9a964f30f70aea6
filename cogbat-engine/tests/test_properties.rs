//! Property-based tests for stimulus generation and the five-point rule set.

use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

use cogbat_core::{CANVAS_HEIGHT, CANVAS_WIDTH, TrailForm, canonical_form};
use cogbat_engine::corsi::{
    BLOCK_COUNT, BLOCK_SIZE, MAX_SPAN, MIN_BLOCK_DISTANCE, MIN_SPAN, draw_sequence, place_blocks,
};
use cogbat_engine::fivepoint::{MoveRejection, validate_move};
use cogbat_engine::trails::{GRID_MARGIN, NODE_RADIUS, generate_layout, sequence_label};

/// Strategy: generate a trail form.
fn form_strategy() -> impl Strategy<Value = TrailForm> {
    prop_oneof![Just(TrailForm::Numeric), Just(TrailForm::Alternating)]
}

/// Strategy: generate a five-point move (self-loops included, the engine
/// ignores those before validation).
fn move_strategy() -> impl Strategy<Value = (u8, u8)> {
    (0..5u8, 0..5u8)
}

proptest! {
    // 1. Corsi placement always terminates with a full, well-spaced board
    #[test]
    fn corsi_blocks_keep_minimum_distance(seed in any::<u64>()) {
        let mut rng = StdRng::seed_from_u64(seed);
        let blocks = place_blocks(&mut rng).unwrap();
        prop_assert_eq!(blocks.len(), BLOCK_COUNT);
        let half = BLOCK_SIZE / 2.0;
        for (i, a) in blocks.iter().enumerate() {
            prop_assert!(a.x >= half && a.x <= CANVAS_WIDTH - half);
            prop_assert!(a.y >= half && a.y <= CANVAS_HEIGHT - half);
            for b in &blocks[i + 1..] {
                prop_assert!(
                    a.distance_to(*b) >= MIN_BLOCK_DISTANCE,
                    "{:?} and {:?} too close (seed {})", a, b, seed
                );
            }
        }
    }

    // 2. Corsi sequences use distinct blocks at every span
    #[test]
    fn corsi_sequences_are_duplicate_free(seed in any::<u64>(), span in MIN_SPAN..=MAX_SPAN) {
        let mut rng = StdRng::seed_from_u64(seed);
        let sequence = draw_sequence(&mut rng, span);
        prop_assert_eq!(sequence.len(), span);
        let mut sorted = sequence.clone();
        sorted.sort_unstable();
        sorted.dedup();
        prop_assert_eq!(sorted.len(), span, "repeat in {:?}", sequence);
        prop_assert!(sequence.iter().all(|&b| (b as usize) < BLOCK_COUNT));
    }

    // 3. Trail layouts stay inside the margin with one node per grid cell
    #[test]
    fn trail_layouts_are_in_bounds_and_distinct(
        seed in any::<u64>(),
        form in form_strategy(),
        len in 1..=25usize,
    ) {
        let mut rng = StdRng::seed_from_u64(seed);
        let layout = generate_layout(&mut rng, form, len);
        prop_assert_eq!(layout.nodes.len(), len);
        prop_assert_eq!(layout.node_radius, NODE_RADIUS);
        for (i, node) in layout.nodes.iter().enumerate() {
            prop_assert_eq!(node.target_index, i);
            prop_assert_eq!(&node.label, &sequence_label(form, i));
            prop_assert!(node.center.x >= GRID_MARGIN && node.center.x <= CANVAS_WIDTH - GRID_MARGIN);
            prop_assert!(node.center.y >= GRID_MARGIN && node.center.y <= CANVAS_HEIGHT - GRID_MARGIN);
            for other in &layout.nodes[i + 1..] {
                prop_assert!(node.center != other.center);
            }
        }
    }

    // 4. Alternating labels interleave numerals and single letters
    #[test]
    fn alternating_labels_interleave(index in 0..25usize) {
        let label = sequence_label(TrailForm::Alternating, index);
        if index % 2 == 0 {
            prop_assert_eq!(label.parse::<usize>().unwrap(), index / 2 + 1);
        } else {
            prop_assert_eq!(label.len(), 1);
            prop_assert!(label.chars().all(|c| c.is_ascii_uppercase()));
        }
    }

    // 5. The validator's verdict matches the board state it was given
    #[test]
    fn rejections_match_the_board(
        edges in prop::collection::vec(move_strategy(), 0..20),
        (from, to) in move_strategy(),
    ) {
        prop_assume!(from != to);
        match validate_move(&edges, from, to) {
            Ok(()) => {
                prop_assert!(!edges.contains(&(from, to)));
                prop_assert!(!edges.contains(&(to, from)));
            }
            Err(MoveRejection::Duplicate) => prop_assert!(edges.contains(&(from, to))),
            Err(MoveRejection::BackwardsMove) => {
                prop_assert!(edges.contains(&(to, from)));
                prop_assert!(!edges.contains(&(from, to)));
            }
            Err(MoveRejection::DiagonalWithoutCenter) => {
                let pair = if from <= to { (from, to) } else { (to, from) };
                prop_assert!(pair == (0, 3) || pair == (1, 2));
            }
        }
    }

    // 6. Folding proposals through the validator never accepts an undirected
    //    duplicate
    #[test]
    fn accepted_moves_never_duplicate_an_undirected_edge(
        proposals in prop::collection::vec(move_strategy(), 0..30),
    ) {
        let mut edges: Vec<(u8, u8)> = Vec::new();
        for (from, to) in proposals {
            if from == to {
                continue;
            }
            if validate_move(&edges, from, to).is_ok() {
                edges.push((from, to));
            }
        }
        let mut normalized = canonical_form(&edges);
        let before = normalized.len();
        normalized.dedup();
        prop_assert_eq!(normalized.len(), before);
    }

    // 7. Canonical form ignores drawing direction and order
    #[test]
    fn canonical_form_is_direction_and_order_blind(
        edges in prop::collection::vec(move_strategy(), 0..20),
    ) {
        let mut flipped: Vec<(u8, u8)> = edges.iter().map(|&(a, b)| (b, a)).collect();
        flipped.reverse();
        prop_assert_eq!(canonical_form(&edges), canonical_form(&flipped));
    }
}
