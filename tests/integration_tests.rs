//! Rule-conformance and tree-editing scenarios exercised end to end
//! through the public API: moves played into a tree, positions derived by
//! replay, and scores computed from the derived state.

use kifu_engine::board::Stone;
use kifu_engine::rules::{GameState, IllegalMove, Move};
use kifu_engine::score::Scorer;
use kifu_engine::tree::{MoveTree, TreeError};

use Stone::{Black as B, White as W};

// =============================================================================
// Helper functions
// =============================================================================

/// Play a list of stones into a fresh tree, panicking on any rejection.
fn tree_with(size: usize, moves: &[(Stone, usize, usize)]) -> MoveTree {
    let mut tree = MoveTree::new(size);
    for &(color, x, y) in moves {
        tree.make_move(Move::place(color, x, y))
            .unwrap_or_else(|e| panic!("setup move ({x},{y}) rejected: {e}"));
    }
    tree
}

/// Play a list of stones through bare game states, no tree involved.
fn state_with(size: usize, moves: &[(Stone, usize, usize)]) -> GameState {
    moves.iter().fold(GameState::new(size), |s, &(c, x, y)| {
        s.play(Move::place(c, x, y))
            .unwrap_or_else(|e| panic!("setup move ({x},{y}) rejected: {e}"))
    })
}

// =============================================================================
// Stone conservation
// =============================================================================

#[test]
fn stones_on_board_never_exceed_moves_minus_captures() {
    // A game with one capture in the middle of it.
    let moves = [
        (B, 1, 2),
        (W, 2, 2),
        (B, 2, 1),
        (W, 7, 7),
        (B, 2, 3),
        (W, 7, 6),
        (B, 3, 2), // captures (2,2)
        (W, 5, 5),
        (B, 4, 4),
    ];
    let mut state = GameState::new(9);
    let mut played = 0;
    for &(c, x, y) in &moves {
        state = state.play(Move::place(c, x, y)).expect("legal move");
        played += 1;
        let on_board = state.board().count(B) + state.board().count(W);
        let captured = (state.captures(B) + state.captures(W)) as usize;
        assert_eq!(on_board, played - captured);
    }
}

// =============================================================================
// Spec scenario: three stones, then an occupied rejection
// =============================================================================

#[test]
fn occupied_point_stays_occupied_until_captured() {
    // Black (2,2), White (2,3), Black (3,3): no captures yet.
    let mut tree = tree_with(9, &[(B, 2, 2), (W, 2, 3), (B, 3, 3)]);
    let board = tree.position_at(tree.current()).unwrap();
    assert_eq!(board.get(2, 2), B);
    assert_eq!(board.get(2, 3), W);
    assert_eq!(board.get(3, 3), B);
    assert_eq!(board.count(B) + board.count(W), 3);

    // White cannot play on Black's stone.
    assert_eq!(
        tree.make_move(Move::place(W, 2, 2)),
        Err(IllegalMove::Occupied)
    );

    // After White captures (2,2), the point is open again.
    for m in [(W, 1, 2), (B, 7, 7), (W, 2, 1), (B, 7, 6), (W, 3, 2)] {
        tree.make_move(Move::place(m.0, m.1, m.2)).expect("legal");
    }
    // (2,2) neighbors: (1,2) W, (2,1) W, (3,2) W, (2,3) W -- captured.
    let board = tree.position_at(tree.current()).unwrap();
    assert_eq!(board.get(2, 2), Stone::Empty);
    tree.make_move(Move::place(B, 5, 5)).expect("legal");
    tree.make_move(Move::place(W, 2, 2)).expect("point reopened");
}

// =============================================================================
// Capture and suicide invariants
// =============================================================================

#[test]
fn last_liberty_fill_captures_exactly_one() {
    let state = state_with(
        9,
        &[(B, 1, 2), (W, 2, 2), (B, 2, 1), (W, 7, 7), (B, 2, 3), (W, 7, 6)],
    );
    assert_eq!(state.captures(B), 0);
    let state = state.play(Move::place(B, 3, 2)).expect("capturing move");
    assert_eq!(state.captures(B), 1);
    assert_eq!(state.board().get(2, 2), Stone::Empty);
}

#[test]
fn suicide_without_capture_is_always_rejected() {
    // Black ring with outside liberties around the empty point (2,2).
    let state = state_with(
        9,
        &[(B, 1, 2), (W, 7, 7), (B, 2, 1), (W, 7, 6), (B, 2, 3), (W, 7, 5), (B, 3, 2)],
    );
    assert_eq!(state.play(Move::place(W, 2, 2)), Err(IllegalMove::Suicide));
}

#[test]
fn multi_stone_group_capture() {
    // Two-stone white chain at (2,2)-(3,2) strangled by black.
    let state = state_with(
        9,
        &[
            (B, 1, 2),
            (W, 2, 2),
            (B, 2, 1),
            (W, 3, 2),
            (B, 3, 1),
            (W, 7, 7),
            (B, 2, 3),
            (W, 7, 6),
            (B, 3, 3),
            (W, 7, 5),
        ],
    );
    let state = state.play(Move::place(B, 4, 2)).expect("capturing move");
    assert_eq!(state.captures(B), 2);
    assert_eq!(state.board().get(2, 2), Stone::Empty);
    assert_eq!(state.board().get(3, 2), Stone::Empty);
}

// =============================================================================
// Ko
// =============================================================================

#[test]
fn ko_cycle_through_the_tree() {
    let mut tree = tree_with(
        9,
        &[
            (B, 1, 2),
            (W, 3, 1),
            (B, 2, 1),
            (W, 4, 2),
            (B, 2, 3),
            (W, 3, 3),
            (B, 6, 6),
            (W, 2, 2),
            (B, 3, 2), // takes the ko
        ],
    );
    assert_eq!(
        tree.make_move(Move::place(W, 2, 2)),
        Err(IllegalMove::KoViolation)
    );
    // A ko threat exchange makes the recapture legal.
    tree.make_move(Move::place(W, 6, 7)).expect("ko threat");
    tree.make_move(Move::place(B, 7, 7)).expect("answer");
    tree.make_move(Move::place(W, 2, 2)).expect("retake after threat");
}

// =============================================================================
// Undo / redo and replay consistency
// =============================================================================

#[test]
fn undo_redo_restores_current_node_and_position() {
    let mut tree = tree_with(9, &[(B, 2, 2), (W, 6, 6), (B, 4, 4)]);
    let node = tree.current();
    let before = tree.position_at(node).unwrap();

    tree.undo().unwrap();
    tree.undo().unwrap();
    tree.redo().unwrap();
    tree.redo().unwrap();

    assert_eq!(tree.current(), node);
    assert_eq!(tree.position_at(tree.current()).unwrap(), before);
}

#[test]
fn deep_edit_keeps_derived_positions_consistent() {
    // Branch early, then delete the other branch; the surviving line must
    // replay exactly as before the edit.
    let mut tree = tree_with(9, &[(B, 2, 2), (W, 6, 6), (B, 4, 4)]);
    let keep = tree.current();
    let reference = tree.position_at(keep).unwrap();

    tree.navigate_to(tree.root()).unwrap();
    let side = tree.make_move(Move::place(B, 8, 8)).unwrap();
    tree.navigate_to(side).unwrap();
    tree.delete_current().unwrap();

    assert_eq!(tree.position_at(keep).unwrap(), reference);
    assert_eq!(tree.navigate_to(side), Err(TreeError::NodeNotFound(side)));
}

// =============================================================================
// Scoring through a finished game
// =============================================================================

#[test]
fn two_passes_finish_and_score() {
    // Black walls off the left half of a 5x5 board.
    let mut tree = tree_with(
        5,
        &[(B, 2, 0), (W, 4, 0), (B, 2, 1), (W, 4, 1), (B, 2, 2), (W, 4, 2), (B, 2, 3), (W, 4, 3), (B, 2, 4)],
    );
    tree.pass(W).unwrap();
    tree.pass(B).unwrap();

    let state = tree.state_at(tree.current()).unwrap();
    assert!(state.finished());
    assert_eq!(
        state.play(Move::place(W, 3, 0)),
        Err(IllegalMove::GameOver)
    );

    let scorer = Scorer::new(&state);
    let (black, white) = scorer.totals();
    // Left of the wall: 10 points for Black. Column x=3 borders both.
    assert_eq!(black, 10);
    assert_eq!(white, 0);
}

#[test]
fn empty_board_scores_one_unowned_region() {
    let scorer = Scorer::new(&GameState::new(19));
    let territories = scorer.territories();
    assert_eq!(territories.len(), 1);
    assert_eq!(territories[0].owner, Stone::Empty);
    assert_eq!(territories[0].points.len(), 361);
}
