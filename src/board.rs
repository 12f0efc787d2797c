//! Board representation for Go.
//!
//! The board is an N×N grid of [`Stone`] values with the size fixed at
//! construction. All rules logic works against this type; groups and
//! territories are recomputed on demand rather than stored.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Contents of one intersection.
///
/// `Shared` never appears on a board: it is only used as a territory owner
/// for neutral regions bordered by both colors.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stone {
    Empty,
    Black,
    White,
    Shared,
}

impl Stone {
    /// The opposing player. Only meaningful for `Black` and `White`;
    /// `Empty` and `Shared` map to themselves.
    pub fn opponent(self) -> Stone {
        match self {
            Stone::Black => Stone::White,
            Stone::White => Stone::Black,
            other => other,
        }
    }

    /// True for `Black` and `White`.
    pub fn is_player(self) -> bool {
        matches!(self, Stone::Black | Stone::White)
    }
}

/// A board coordinate as (column, row), 0-based from the top-left.
pub type Point = (usize, usize);

/// An N×N Go board.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    size: usize,
    cells: Vec<Stone>,
}

impl Board {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![Stone::Empty; size * size],
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn in_bounds(&self, x: usize, y: usize) -> bool {
        x < self.size && y < self.size
    }

    fn idx(&self, x: usize, y: usize) -> usize {
        y * self.size + x
    }

    /// Stone at (x, y). Off-board coordinates read as `Empty`; callers that
    /// care about the distinction check `in_bounds` first.
    pub fn get(&self, x: usize, y: usize) -> Stone {
        if !self.in_bounds(x, y) {
            return Stone::Empty;
        }
        self.cells[self.idx(x, y)]
    }

    pub fn set(&mut self, x: usize, y: usize, stone: Stone) {
        if self.in_bounds(x, y) {
            let i = self.idx(x, y);
            self.cells[i] = stone;
        }
    }

    /// The up-to-four orthogonal neighbors of (x, y) that are on the board.
    /// Off-board positions are simply absent, never yielded.
    pub fn neighbors(&self, x: usize, y: usize) -> impl Iterator<Item = Point> + '_ {
        let s = self.size;
        let mut v = Vec::with_capacity(4);
        if x > 0 {
            v.push((x - 1, y));
        }
        if x + 1 < s {
            v.push((x + 1, y));
        }
        if y > 0 {
            v.push((x, y - 1));
        }
        if y + 1 < s {
            v.push((x, y + 1));
        }
        v.into_iter()
    }

    /// All on-board points in row-major order.
    pub fn points(&self) -> impl Iterator<Item = Point> + '_ {
        let s = self.size;
        (0..s).flat_map(move |y| (0..s).map(move |x| (x, y)))
    }

    /// Number of stones of the given color on the board.
    pub fn count(&self, color: Stone) -> usize {
        self.cells.iter().filter(|&&c| c == color).count()
    }

    /// Numeric encoding for the external pattern-matcher interface:
    /// +1 for Black, -1 for White, 0 for empty, row-major.
    pub fn sign_encoding(&self) -> Vec<i8> {
        self.cells
            .iter()
            .map(|c| match c {
                Stone::Black => 1,
                Stone::White => -1,
                _ => 0,
            })
            .collect()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..self.size {
            for x in 0..self.size {
                let ch = match self.get(x, y) {
                    Stone::Black => 'X',
                    Stone::White => 'O',
                    _ => '.',
                };
                write!(f, "{ch} ")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
