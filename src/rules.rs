//! Move legality, captures, and the game session value.
//!
//! [`GameState`] is an explicit, versioned value: applying a move returns a
//! new state and never mutates the receiver, so a rejected move leaves
//! nothing to roll back. Ko is the conventional one-move rule: the
//! resulting board is compared against the whole board as it stood before
//! the opponent's previous non-pass move. Positional superko is out of
//! scope.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::board::{Board, Point, Stone};
use crate::group::{group_of, has_liberty};

/// A move: a stone placement, or a pass when `point` is `None`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
    pub color: Stone,
    pub point: Option<Point>,
}

impl Move {
    pub fn place(color: Stone, x: usize, y: usize) -> Self {
        Self {
            color,
            point: Some((x, y)),
        }
    }

    pub fn pass(color: Stone) -> Self {
        Self { color, point: None }
    }

    pub fn is_pass(&self) -> bool {
        self.point.is_none()
    }
}

/// Why a move was rejected. Returned as a value; never a panic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum IllegalMove {
    #[error("point is off the board or already occupied")]
    Occupied,
    #[error("move would leave its own group without liberties")]
    Suicide,
    #[error("move would recreate the position before the opponent's last move")]
    KoViolation,
    #[error("game is over after two consecutive passes")]
    GameOver,
}

/// The full state of a game in progress.
///
/// Holds the live board, the board before the opponent's previous non-pass
/// move (the ko reference), the side to move, running capture totals, and
/// the consecutive-pass counter. Two consecutive passes finish the game.
#[derive(Clone, Debug, PartialEq)]
pub struct GameState {
    board: Board,
    ko_reference: Option<Board>,
    to_move: Stone,
    captures_black: u32,
    captures_white: u32,
    consecutive_passes: u8,
}

impl GameState {
    /// A fresh game on an empty `size`×`size` board, Black to move.
    pub fn new(size: usize) -> Self {
        Self {
            board: Board::new(size),
            ko_reference: None,
            to_move: Stone::Black,
            captures_black: 0,
            captures_white: 0,
            consecutive_passes: 0,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn to_move(&self) -> Stone {
        self.to_move
    }

    /// Stones the given color has captured so far.
    pub fn captures(&self, color: Stone) -> u32 {
        match color {
            Stone::Black => self.captures_black,
            Stone::White => self.captures_white,
            _ => 0,
        }
    }

    /// True once two consecutive passes have been played.
    pub fn finished(&self) -> bool {
        self.consecutive_passes >= 2
    }

    /// Apply a move, returning the resulting state.
    ///
    /// The move's color is taken as given rather than checked against
    /// `to_move`: game records may contain consecutive same-color moves,
    /// and turn enforcement belongs to the caller presenting the game.
    pub fn play(&self, mv: Move) -> Result<GameState, IllegalMove> {
        if self.finished() {
            return Err(IllegalMove::GameOver);
        }
        match mv.point {
            None => Ok(self.pass(mv.color)),
            Some((x, y)) => self.place(mv.color, x, y),
        }
    }

    fn pass(&self, color: Stone) -> GameState {
        let mut next = self.clone();
        next.to_move = color.opponent();
        next.consecutive_passes += 1;
        // Passes do not advance the ko reference.
        next
    }

    fn place(&self, color: Stone, x: usize, y: usize) -> Result<GameState, IllegalMove> {
        if !self.board.in_bounds(x, y) || self.board.get(x, y) != Stone::Empty {
            return Err(IllegalMove::Occupied);
        }

        let mut board = self.board.clone();
        board.set(x, y, color);

        // Capture any adjacent opponent group left without liberties.
        let opponent = color.opponent();
        let mut captured: u32 = 0;
        for (nx, ny) in self.board.neighbors(x, y) {
            if board.get(nx, ny) == opponent {
                let group = group_of(&board, nx, ny);
                if !has_liberty(&board, &group) {
                    captured += group.len() as u32;
                    for &(gx, gy) in &group {
                        board.set(gx, gy, Stone::Empty);
                    }
                }
            }
        }

        if captured == 0 {
            let own = group_of(&board, x, y);
            if !has_liberty(&board, &own) {
                return Err(IllegalMove::Suicide);
            }
        }

        if let Some(reference) = &self.ko_reference {
            if board == *reference {
                return Err(IllegalMove::KoViolation);
            }
        }

        let mut next = self.clone();
        match color {
            Stone::Black => next.captures_black += captured,
            Stone::White => next.captures_white += captured,
            _ => {}
        }
        next.ko_reference = Some(std::mem::replace(&mut next.board, board));
        next.to_move = color.opponent();
        next.consecutive_passes = 0;
        Ok(next)
    }
}
