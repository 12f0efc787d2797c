//! Territory scoring with manual dead-stone claims.
//!
//! Automatic detection flood-fills each empty region and assigns it to the
//! single bordering color, or to [`Stone::Shared`] (worth nothing) when
//! both colors border it. A claim removes a designated dead group from the
//! working board and credits its points, plus the connected empty region
//! around them, to the opposite color; claimed points are excluded from
//! the automatic pass so they are never counted twice.

use std::collections::{HashMap, HashSet};

use crate::board::{Board, Point, Stone};
use crate::group::group_of;
use crate::rules::GameState;

/// One scored region: its owner, its points, and its point value.
/// Plain empty intersections are worth 1, reclaimed dead-stone points 2;
/// neutral and unowned regions are worth 0.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Territory {
    pub owner: Stone,
    pub points: Vec<Point>,
    pub score: u32,
}

/// Scoring pass over a finished game.
///
/// Holds its own copy of the final board so claims never touch the game
/// state they were derived from.
pub struct Scorer {
    board: Board,
    captures_black: u32,
    captures_white: u32,
    claimed: HashMap<Point, Stone>,
    reclaimed: HashSet<Point>,
}

impl Scorer {
    pub fn new(state: &GameState) -> Self {
        Self {
            board: state.board().clone(),
            captures_black: state.captures(Stone::Black),
            captures_white: state.captures(Stone::White),
            claimed: HashMap::new(),
            reclaimed: HashSet::new(),
        }
    }

    /// Mark the stone group at (x, y) as dead. The group is lifted off the
    /// working board and its points, together with the connected empty
    /// region around them, are claimed for the opposing color. Returns
    /// false when (x, y) holds no stone.
    pub fn claim(&mut self, x: usize, y: usize) -> bool {
        let stone = self.board.get(x, y);
        if !stone.is_player() {
            return false;
        }
        let owner = stone.opponent();

        let group = group_of(&self.board, x, y);
        for &(gx, gy) in &group {
            self.board.set(gx, gy, Stone::Empty);
            self.claimed.insert((gx, gy), owner);
            self.reclaimed.insert((gx, gy));
        }

        // Sweep the surrounding empty region into the claim.
        let size = self.board.size();
        let mut visited = vec![false; size * size];
        let mut stack = group;
        while let Some((cx, cy)) = stack.pop() {
            for (nx, ny) in self.board.neighbors(cx, cy) {
                let i = ny * size + nx;
                if visited[i] || self.board.get(nx, ny) != Stone::Empty {
                    continue;
                }
                visited[i] = true;
                if !self.claimed.contains_key(&(nx, ny)) {
                    self.claimed.insert((nx, ny), owner);
                }
                stack.push((nx, ny));
            }
        }
        true
    }

    /// All territories on the board: claimed regions first, then automatic
    /// detection over whatever empty space remains.
    pub fn territories(&self) -> Vec<Territory> {
        let size = self.board.size();
        let mut seen = vec![false; size * size];
        let mut out = Vec::new();

        // Claimed regions, grouped by connectivity and owner.
        for (x, y) in self.board.points() {
            if !self.claimed.contains_key(&(x, y)) || seen[y * size + x] {
                continue;
            }
            let owner = self.claimed[&(x, y)];
            let mut points = Vec::new();
            let mut score = 0;
            let mut stack = vec![(x, y)];
            while let Some((cx, cy)) = stack.pop() {
                let i = cy * size + cx;
                if seen[i] {
                    continue;
                }
                seen[i] = true;
                points.push((cx, cy));
                score += if self.reclaimed.contains(&(cx, cy)) { 2 } else { 1 };
                for (nx, ny) in self.board.neighbors(cx, cy) {
                    if self.claimed.get(&(nx, ny)) == Some(&owner) && !seen[ny * size + nx] {
                        stack.push((nx, ny));
                    }
                }
            }
            points.sort();
            out.push(Territory {
                owner,
                points,
                score,
            });
        }

        // Automatic detection over the remaining empty regions.
        for (x, y) in self.board.points() {
            if seen[y * size + x] || self.board.get(x, y) != Stone::Empty {
                continue;
            }
            let mut points = Vec::new();
            let mut borders = HashSet::new();
            let mut stack = vec![(x, y)];
            while let Some((cx, cy)) = stack.pop() {
                let i = cy * size + cx;
                if seen[i] {
                    continue;
                }
                seen[i] = true;
                points.push((cx, cy));
                for (nx, ny) in self.board.neighbors(cx, cy) {
                    match self.board.get(nx, ny) {
                        Stone::Empty => {
                            if !seen[ny * size + nx] && !self.claimed.contains_key(&(nx, ny)) {
                                stack.push((nx, ny));
                            }
                        }
                        color if color.is_player() => {
                            borders.insert(color);
                        }
                        _ => {}
                    }
                }
            }
            let owner = match borders.len() {
                0 => Stone::Empty,
                1 => *borders.iter().next().unwrap_or(&Stone::Empty),
                _ => Stone::Shared,
            };
            let score = if owner.is_player() {
                points.len() as u32
            } else {
                0
            };
            points.sort();
            out.push(Territory {
                owner,
                points,
                score,
            });
        }
        out
    }

    /// Final totals per color: captures taken during play plus the scores
    /// of the territories the color owns.
    pub fn totals(&self) -> (u32, u32) {
        let mut black = self.captures_black;
        let mut white = self.captures_white;
        for territory in self.territories() {
            match territory.owner {
                Stone::Black => black += territory.score,
                Stone::White => white += territory.score,
                _ => {}
            }
        }
        (black, white)
    }
}
