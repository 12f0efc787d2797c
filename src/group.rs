//! Connected-group and liberty analysis.
//!
//! Pure functions over a [`Board`]: flood fill with an explicit stack and a
//! visited bitmap, O(board cells) per call, no side effects. The legality
//! engine and the scorer both build on these.

use crate::board::{Board, Point, Stone};

/// The maximal connected group of same-colored stones containing (x, y).
/// Empty for an empty or off-board starting point.
pub fn group_of(board: &Board, x: usize, y: usize) -> Vec<Point> {
    let color = board.get(x, y);
    if !color.is_player() {
        return Vec::new();
    }

    let size = board.size();
    let mut visited = vec![false; size * size];
    let mut stack = vec![(x, y)];
    let mut group = Vec::new();

    while let Some((cx, cy)) = stack.pop() {
        let i = cy * size + cx;
        if visited[i] {
            continue;
        }
        visited[i] = true;
        group.push((cx, cy));
        for (nx, ny) in board.neighbors(cx, cy) {
            if !visited[ny * size + nx] && board.get(nx, ny) == color {
                stack.push((nx, ny));
            }
        }
    }
    group
}

/// Whether the group has at least one liberty. The edge of the board is not
/// a liberty; only empty on-board neighbors count.
pub fn has_liberty(board: &Board, group: &[Point]) -> bool {
    group.iter().any(|&(x, y)| {
        board
            .neighbors(x, y)
            .any(|(nx, ny)| board.get(nx, ny) == Stone::Empty)
    })
}

/// Number of distinct liberties of the group.
pub fn liberties(board: &Board, group: &[Point]) -> usize {
    let size = board.size();
    let mut seen = vec![false; size * size];
    let mut count = 0;
    for &(x, y) in group {
        for (nx, ny) in board.neighbors(x, y) {
            let i = ny * size + nx;
            if board.get(nx, ny) == Stone::Empty && !seen[i] {
                seen[i] = true;
                count += 1;
            }
        }
    }
    count
}

/// All groups of the given color, each point appearing in exactly one group.
pub fn all_groups_of(board: &Board, color: Stone) -> Vec<Vec<Point>> {
    let size = board.size();
    let mut claimed = vec![false; size * size];
    let mut groups = Vec::new();
    for (x, y) in board.points() {
        if board.get(x, y) == color && !claimed[y * size + x] {
            let group = group_of(board, x, y);
            for &(gx, gy) in &group {
                claimed[gy * size + gx] = true;
            }
            groups.push(group);
        }
    }
    groups
}
