//! Board rule tests.

use std::collections::HashSet;

use crate::board::{Action, Board, BOARD_SIZE, STARTING_WALLS};
use crate::snapshot::{BoardSnapshot, SnapshotError};
use mcts::{SearchConfig, ThreadedSearch};

fn moves_of(board: &Board) -> Vec<Board> {
    let mut out = Vec::new();
    board.legal_moves(&mut out);
    out
}

/// Action texts from the mover's perspective.
fn mover_actions(board: &Board) -> Vec<String> {
    moves_of(board)
        .iter()
        .map(|child| child.action_text(true))
        .collect()
}

fn pawn_moves(board: &Board) -> usize {
    moves_of(board)
        .iter()
        .filter(|child| matches!(child.last_action(), Some(Action::Pawn { .. })))
        .count()
}

// =============================================================================
// Starting position
// =============================================================================

#[test]
fn starting_position() {
    let board = Board::default();
    assert_eq!(board.hero(), (4, 0));
    assert_eq!(board.villain(), (4, 8));
    assert_eq!(board.walls_remaining(), (STARTING_WALLS, STARTING_WALLS));
    assert!(!board.is_terminal());
    assert_eq!(board.hero_distance(), (BOARD_SIZE - 1) as u16);
    assert_eq!(board.villain_distance(), (BOARD_SIZE - 1) as u16);
    assert_eq!(board.non_terminal_rank(), 0);
    assert_eq!(board.non_terminal_eval(), None);
}

#[test]
fn opening_has_131_moves() {
    let board = Board::default();
    let moves = moves_of(&board);
    // 3 pawn steps (down is off the board) + 64 anchors * 2 orientations
    assert_eq!(moves.len(), 131);
    assert_eq!(pawn_moves(&board), 3);

    let texts: HashSet<String> = mover_actions(&board).into_iter().collect();
    assert_eq!(texts.len(), 131, "every action text is distinct");
    assert!(texts.contains("*(4,1)"));
    assert!(texts.contains("H(0,0)"));
    assert!(texts.contains("V(7,7)"));
}

#[test]
fn successors_are_flip_constructed() {
    let board = Board::default();
    let moves = moves_of(&board);
    let step_up = moves
        .iter()
        .find(|child| child.action_text(true) == "*(4,1)")
        .expect("pawn step up must be legal");

    // from the next mover's perspective: the old villain is now hero on
    // their home row, and the mover's pawn mirrored to (4,7)
    assert_eq!(step_up.hero(), (4, 0));
    assert_eq!(step_up.villain(), (4, 7));
    // the recorded action reads flipped unless asked for the mover's view
    assert_eq!(step_up.action_text(false), "*(4,7)");
}

#[test]
fn wall_placement_spends_a_wall() {
    let board = Board::default();
    let moves = moves_of(&board);
    let walled = moves
        .iter()
        .find(|child| child.action_text(true) == "H(3,4)")
        .expect("wall placement must be legal");
    // after the flip the placer is villain
    assert_eq!(walled.walls_remaining(), (STARTING_WALLS, STARTING_WALLS - 1));
}

// =============================================================================
// Walls and movement
// =============================================================================

#[test]
fn horizontal_wall_blocks_the_step_up() {
    let mut board = Board::default();
    // wall anchored at (4,0) covers the crossings above row 0 at columns 4..6
    board.wall_middles.set(4);
    board.horizontal_walls.set(4);
    board.horizontal_walls.set(5);

    assert_eq!(pawn_moves(&board), 2);
    let texts = mover_actions(&board);
    assert!(!texts.contains(&"*(4,1)".to_string()));
    assert!(texts.contains(&"*(3,0)".to_string()));
    assert!(texts.contains(&"*(5,0)".to_string()));
}

#[test]
fn pawn_hops_straight_over_the_opponent() {
    let mut board = Board::default();
    board.villain_x = 4;
    board.villain_y = 1;

    let texts = mover_actions(&board);
    assert!(texts.contains(&"*(4,2)".to_string()), "straight hop");
    assert!(!texts.contains(&"*(4,1)".to_string()), "cannot stop on villain");
    assert_eq!(pawn_moves(&board), 3);
}

#[test]
fn blocked_hop_branches_sideways() {
    let mut board = Board::default();
    board.villain_x = 4;
    board.villain_y = 1;
    // wall anchored at (4,1) blocks the straight continuation to (4,2)
    board.wall_middles.set(12);
    board.horizontal_walls.set(13);
    board.horizontal_walls.set(14);

    let texts = mover_actions(&board);
    assert!(!texts.contains(&"*(4,2)".to_string()));
    assert!(texts.contains(&"*(5,1)".to_string()), "hop right");
    assert!(texts.contains(&"*(3,1)".to_string()), "hop left");
    assert_eq!(pawn_moves(&board), 4);
}

#[test]
fn sealing_wall_placements_are_refused() {
    let mut board = Board::default();
    board.villain_x = 0;
    board.villain_y = 8;
    // horizontal wall at anchor (0,7) already boxes the corner from below
    board.wall_middles.set(56);
    board.horizontal_walls.set(63);
    board.horizontal_walls.set(64);
    board.hero_walls_remaining -= 1;

    let texts = mover_actions(&board);
    // the vertical wall at (1,7) would seal villain into the corner cells
    assert!(!texts.contains(&"V(1,7)".to_string()));
    // one anchor further out leaves an escape route
    assert!(texts.contains(&"V(2,7)".to_string()));
}

#[test]
fn distances_track_walls() {
    let mut board = Board::default();
    // wall anchored at (4,7) in front of villain's start
    board.wall_middles.set(60);
    board.horizontal_walls.set(67);
    board.horizontal_walls.set(68);

    assert_eq!(board.hero_distance(), 8);
    assert!(board.villain_distance() > 8);
}

// =============================================================================
// Terminal and race evaluation
// =============================================================================

#[test]
fn terminal_positions() {
    let mut board = Board::default();
    board.hero_y = 8;
    assert!(board.is_terminal());
    assert!(board.hero_wins());
    assert_eq!(board.terminal_eval(), 1.0);
    assert!(moves_of(&board).is_empty());

    let mut board = Board::default();
    board.villain_y = 0;
    assert!(board.is_terminal());
    assert!(board.villain_wins());
    assert_eq!(board.terminal_eval(), -1.0);
}

#[test]
fn race_eval_requires_empty_wall_stocks() {
    let mut board = Board::default();
    board.hero_y = 6; // two steps from home
    assert_eq!(board.non_terminal_rank(), 2 - 8);
    // with walls in hand the race is not settled
    assert_eq!(board.non_terminal_eval(), None);

    board.hero_walls_remaining = 0;
    board.villain_walls_remaining = 0;
    assert_eq!(board.non_terminal_eval(), Some(1.0));
}

#[test]
fn race_eval_sides_and_margin() {
    let mut losing = Board::default();
    losing.hero_y = 1; // seven steps out
    losing.villain_y = 2; // two steps from home
    losing.hero_walls_remaining = 0;
    losing.villain_walls_remaining = 0;
    assert_eq!(losing.non_terminal_eval(), Some(-1.0));

    let mut tight = Board::default();
    tight.hero_y = 4;
    tight.villain_y = 5; // margin of one is not decisive
    tight.hero_walls_remaining = 0;
    tight.villain_walls_remaining = 0;
    assert_eq!(tight.non_terminal_rank(), -1);
    assert_eq!(tight.non_terminal_eval(), None);
}

// =============================================================================
// Perspective flipping
// =============================================================================

#[test]
fn flip_is_an_involution() {
    let mut board = Board::default();
    board.hero_x = 2;
    board.hero_y = 3;
    board.wall_middles.set(5);
    board.horizontal_walls.set(11);
    board.horizontal_walls.set(12);
    board.hero_walls_remaining = 7;

    assert_eq!(board.flipped().flipped(), board);
    assert_ne!(board.flipped(), board);
}

#[test]
fn flip_swaps_the_race() {
    let mut board = Board::default();
    board.hero_y = 5;
    let flipped = board.flipped();
    assert_eq!(flipped.hero_distance(), board.villain_distance());
    assert_eq!(flipped.villain_distance(), board.hero_distance());
    assert_eq!(flipped.non_terminal_rank(), -board.non_terminal_rank());
}

#[test]
fn action_text_flipping() {
    assert_eq!(Action::Pawn { x: 4, y: 2 }.text(), "*(4,2)");
    assert_eq!(Action::Pawn { x: 4, y: 2 }.flipped().text(), "*(4,6)");
    assert_eq!(
        Action::Wall { vertical: true, x: 2, y: 3 }.text(),
        "V(2,3)"
    );
    assert_eq!(
        Action::Wall { vertical: true, x: 2, y: 3 }.flipped().text(),
        "V(5,4)"
    );
    assert_eq!(
        Action::Wall { vertical: false, x: 0, y: 0 }.flipped().text(),
        "H(7,7)"
    );
}

#[test]
fn equality_ignores_the_producing_action() {
    let board = Board::default();
    let mut twin = Board::default();
    twin.last_action = Some(Action::Pawn { x: 4, y: 1 });
    assert_eq!(board, twin);
}

// =============================================================================
// Heuristic evaluator
// =============================================================================

#[test]
fn heuristic_eval_is_balanced_at_the_start() {
    let board = Board::default();
    let children = moves_of(&board);
    let (q, probs) = board.eval(&children);
    assert_eq!(q, 0.0);
    assert_eq!(probs.len(), children.len());
    let total: f64 = probs.iter().sum();
    assert!((total - 1.0).abs() < 1e-9);
}

#[test]
fn heuristic_eval_tracks_the_race() {
    let mut board = Board::default();
    board.hero_y = 6;
    let (q, _) = board.eval(&[]);
    assert!(q > 0.0);

    let behind = board.flipped();
    let (q, _) = behind.eval(&[]);
    assert!(q < 0.0);
}

// =============================================================================
// Rendering
// =============================================================================

#[test]
fn render_shows_pawns_walls_and_distances() {
    let mut board = Board::default();
    board.wall_middles.set(27); // anchor (3,3)
    board.horizontal_walls.set(30);
    board.horizontal_walls.set(31);

    let text = board.render();
    assert!(text.contains("Hero distance from end: 8"));
    assert!(text.contains("Hero walls remaining: 10"));
    assert!(text.contains('h'));
    assert!(text.contains('v'));
    assert!(text.contains("---"));
    assert!(text.contains('+'));
}

// =============================================================================
// Snapshots
// =============================================================================

#[test]
fn snapshot_roundtrip() {
    let mut board = Board::default();
    board.hero_x = 3;
    board.hero_y = 2;
    board.wall_middles.set(20);
    board.vertical_walls.set(40);
    board.vertical_walls.set(41);
    board.villain_walls_remaining = 4;

    for flip in [false, true] {
        let snapshot = BoardSnapshot::from_board(&board, flip);
        assert_eq!(snapshot.to_board().unwrap(), board);
    }
}

#[test]
fn snapshot_validates_lengths() {
    let mut snapshot = BoardSnapshot::from_board(&Board::default(), false);
    snapshot.horizontal_walls.pop();
    assert_eq!(
        snapshot.to_board(),
        Err(SnapshotError::WrongLength {
            field: "horizontal_walls",
            expected: 72,
            actual: 71,
        })
    );
}

#[test]
fn snapshot_validates_coordinates() {
    let mut snapshot = BoardSnapshot::from_board(&Board::default(), false);
    snapshot.hero_x = 9;
    assert_eq!(
        snapshot.to_board(),
        Err(SnapshotError::OutOfRange {
            field: "hero_x",
            value: 9,
        })
    );
}

#[test]
fn snapshot_serializes() {
    let snapshot = BoardSnapshot::from_board(&Board::default(), false);
    let json = serde_json::to_string(&snapshot).unwrap();
    let back: BoardSnapshot = serde_json::from_str(&json).unwrap();
    assert_eq!(back.to_board().unwrap(), Board::default());
}

// =============================================================================
// Through the engine
// =============================================================================

#[test]
fn engine_takes_the_winning_step() {
    let mut board = Board::default();
    board.hero_y = 7;
    board.villain_x = 0;
    board.villain_y = 5;

    let driver: ThreadedSearch<Board> = ThreadedSearch::new(SearchConfig::for_testing());
    let action = driver.set_state_and_make_best_move(board, true).unwrap();
    assert_eq!(action, "*(4,8)");
}

#[test]
fn engine_reports_every_opening_action() {
    let driver: ThreadedSearch<Board> = ThreadedSearch::new(SearchConfig::for_testing());
    driver.ensure_sims(40);
    let actions = driver.sorted_actions(false).unwrap();
    assert_eq!(actions.len(), 131);
    if let Some(equity) = driver.evaluation() {
        assert!((-1.0..=1.0).contains(&equity));
    }
}
