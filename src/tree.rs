//! The move tree: every played move, variation, and annotation of a game.
//!
//! Nodes live in an arena keyed by [`NodeId`] and refer to each other only
//! by id, so deleting a subtree is a matter of removing entries. The board
//! at a node is never cached: it is derived by replaying the move records
//! along the root-to-node path through the rules engine, which keeps the
//! board consistent with the tree shape under arbitrary edits.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::board::{Board, Stone};
use crate::rules::{GameState, IllegalMove, Move};

/// Stable node identifier, unique within one tree. Ids are allocated from a
/// counter and never reused, so a stale id can only miss, never alias.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

/// Shape of a board annotation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MarkerKind {
    Triangle,
    Square,
    Circle,
    Cross,
    Letter,
    Number,
}

/// A per-node board annotation. `label` carries the text of letter and
/// number markers and is `None` for the point shapes.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Marker {
    pub x: usize,
    pub y: usize,
    pub kind: MarkerKind,
    pub label: Option<String>,
}

/// One node of the tree: an optional move plus its annotations.
/// The root carries no move. Child index 0 is the main-line continuation.
#[derive(Clone, Debug)]
pub struct MoveNode {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub mv: Option<Move>,
    pub markers: Vec<Marker>,
    pub comment: String,
}

/// Navigation and edit failures, returned as values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("node {0:?} is not in the tree")]
    NodeNotFound(NodeId),
    #[error("already at the root")]
    AtRoot,
    #[error("already at a leaf")]
    AtLeaf,
    #[error("the root node cannot be deleted")]
    DeleteRoot,
    #[error("no stone of the current move at that point")]
    StoneMismatch,
}

/// Tree-shape snapshot for an external layout/visualization layer.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TreeSnapshot {
    pub root: NodeId,
    pub current: NodeId,
    pub nodes: Vec<NodeSnapshot>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub mv: Option<Move>,
    pub on_main_path: bool,
}

/// A game's full move tree. Owns every [`MoveNode`]; everything outside the
/// tree refers to nodes by id only.
pub struct MoveTree {
    nodes: HashMap<NodeId, MoveNode>,
    root: NodeId,
    current: NodeId,
    main_path: HashSet<NodeId>,
    next_id: u32,
    size: usize,
    komi: f64,
}

impl MoveTree {
    pub fn new(size: usize) -> Self {
        let root = NodeId(0);
        let mut nodes = HashMap::new();
        nodes.insert(
            root,
            MoveNode {
                id: root,
                parent: None,
                children: Vec::new(),
                mv: None,
                markers: Vec::new(),
                comment: String::new(),
            },
        );
        let mut tree = Self {
            nodes,
            root,
            current: root,
            main_path: HashSet::new(),
            next_id: 1,
            size,
            komi: 6.5,
        };
        tree.mark_main_path(true);
        tree
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn komi(&self) -> f64 {
        self.komi
    }

    pub fn set_komi(&mut self, komi: f64) {
        self.komi = komi;
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn current(&self) -> NodeId {
        self.current
    }

    pub fn node(&self, id: NodeId) -> Option<&MoveNode> {
        self.nodes.get(&id)
    }

    pub fn current_node(&self) -> &MoveNode {
        &self.nodes[&self.current]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes on the main path: root to current, then first children onward.
    pub fn main_path(&self) -> &HashSet<NodeId> {
        &self.main_path
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut MoveNode> {
        self.nodes.get_mut(&id)
    }

    /// Append a child node under `parent` without legality checking.
    /// The SGF loader and position setup go through this; interactive play
    /// goes through [`MoveTree::make_move`].
    pub fn add_child(&mut self, parent: NodeId, mv: Option<Move>) -> Result<NodeId, TreeError> {
        if !self.nodes.contains_key(&parent) {
            return Err(TreeError::NodeNotFound(parent));
        }
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(
            id,
            MoveNode {
                id,
                parent: Some(parent),
                children: Vec::new(),
                mv,
                markers: Vec::new(),
                comment: String::new(),
            },
        );
        if let Some(p) = self.nodes.get_mut(&parent) {
            p.children.push(id);
        }
        self.mark_main_path(true);
        Ok(id)
    }

    /// Play a move from the current node.
    ///
    /// The move is checked by the rules engine against the position derived
    /// at `current`. If an existing child already holds an equal move the
    /// tree navigates there instead of growing a duplicate branch. On
    /// rejection the tree is unchanged.
    pub fn make_move(&mut self, mv: Move) -> Result<NodeId, IllegalMove> {
        let state = self.replay(self.current);
        let _ = state.play(mv)?;

        let existing = self.nodes[&self.current]
            .children
            .iter()
            .copied()
            .find(|id| self.nodes[id].mv == Some(mv));

        let id = match existing {
            Some(id) => id,
            None => self
                .add_child(self.current, Some(mv))
                .unwrap_or(self.current),
        };
        self.current = id;
        self.mark_main_path(true);
        Ok(id)
    }

    /// Play a pass for the given color from the current node.
    pub fn pass(&mut self, color: Stone) -> Result<NodeId, IllegalMove> {
        self.make_move(Move::pass(color))
    }

    /// Step to the parent node. No-op error at the root.
    pub fn undo(&mut self) -> Result<NodeId, TreeError> {
        match self.nodes[&self.current].parent {
            Some(parent) => {
                self.current = parent;
                self.mark_main_path(true);
                Ok(parent)
            }
            None => Err(TreeError::AtRoot),
        }
    }

    /// Step to the first child (the main-line continuation).
    pub fn redo(&mut self) -> Result<NodeId, TreeError> {
        match self.nodes[&self.current].children.first().copied() {
            Some(child) => {
                self.current = child;
                self.mark_main_path(true);
                Ok(child)
            }
            None => Err(TreeError::AtLeaf),
        }
    }

    /// Jump to an arbitrary node. The main path becomes the root-to-node
    /// chain.
    pub fn navigate_to(&mut self, id: NodeId) -> Result<(), TreeError> {
        if !self.nodes.contains_key(&id) {
            return Err(TreeError::NodeNotFound(id));
        }
        self.current = id;
        self.mark_main_path(false);
        Ok(())
    }

    /// Promote the variation through `id`: the chain from the root through
    /// `id` and onward along first children becomes the displayed main
    /// path. Tree shape and child order are untouched.
    pub fn switch_variation(&mut self, id: NodeId) -> Result<(), TreeError> {
        if !self.nodes.contains_key(&id) {
            return Err(TreeError::NodeNotFound(id));
        }
        self.current = id;
        self.mark_main_path(true);
        Ok(())
    }

    /// Delete the current node and its whole subtree, then step to the
    /// parent. The root cannot be deleted.
    pub fn delete_current(&mut self) -> Result<NodeId, TreeError> {
        let node = &self.nodes[&self.current];
        let parent = node.parent.ok_or(TreeError::DeleteRoot)?;

        let mut doomed = vec![self.current];
        let mut queue = vec![self.current];
        while let Some(id) = queue.pop() {
            for child in &self.nodes[&id].children {
                doomed.push(*child);
                queue.push(*child);
            }
        }
        let target = self.current;
        for id in doomed {
            self.nodes.remove(&id);
        }
        if let Some(p) = self.nodes.get_mut(&parent) {
            p.children.retain(|c| *c != target);
        }
        self.current = parent;
        self.mark_main_path(true);
        Ok(parent)
    }

    /// Delete the current node, but only if its move placed a stone at
    /// (x, y). Guards against deleting a move other than the selected one.
    pub fn delete_stone_at(&mut self, x: usize, y: usize) -> Result<NodeId, TreeError> {
        match self.nodes[&self.current].mv {
            Some(mv) if mv.point == Some((x, y)) => self.delete_current(),
            _ => Err(TreeError::StoneMismatch),
        }
    }

    /// Add a marker to the current node. A marker of the same kind at the
    /// same point is replaced, so repeated adds are idempotent.
    ///
    /// Letter and number markers always carry text: a missing or empty
    /// label is filled with a default ("A" / "1"). Point-shape markers
    /// never carry one; a label passed for them is discarded.
    pub fn add_marker(&mut self, x: usize, y: usize, kind: MarkerKind, label: Option<String>) {
        let label = match kind {
            MarkerKind::Letter => {
                Some(label.filter(|l| !l.is_empty()).unwrap_or_else(|| "A".into()))
            }
            MarkerKind::Number => {
                Some(label.filter(|l| !l.is_empty()).unwrap_or_else(|| "1".into()))
            }
            _ => None,
        };
        let current = self.current;
        if let Some(node) = self.nodes.get_mut(&current) {
            node.markers
                .retain(|m| !(m.x == x && m.y == y && m.kind == kind));
            node.markers.push(Marker { x, y, kind, label });
        }
    }

    /// Remove the marker of the given kind at (x, y), if present.
    pub fn remove_marker(&mut self, x: usize, y: usize, kind: MarkerKind) {
        let current = self.current;
        if let Some(node) = self.nodes.get_mut(&current) {
            node.markers
                .retain(|m| !(m.x == x && m.y == y && m.kind == kind));
        }
    }

    /// Set the comment on the current node.
    pub fn set_comment(&mut self, text: impl Into<String>) {
        let current = self.current;
        if let Some(node) = self.nodes.get_mut(&current) {
            node.comment = text.into();
        }
    }

    /// The root-to-`id` node chain, root first.
    pub fn path_to(&self, id: NodeId) -> Result<Vec<NodeId>, TreeError> {
        if !self.nodes.contains_key(&id) {
            return Err(TreeError::NodeNotFound(id));
        }
        let mut path = vec![id];
        let mut cursor = id;
        while let Some(parent) = self.nodes[&cursor].parent {
            path.push(parent);
            cursor = parent;
        }
        path.reverse();
        Ok(path)
    }

    /// The full game state at a node, derived by replaying every move on
    /// the root-to-node path through the rules engine. Moves the engine
    /// rejects (possible in trees loaded from non-conformant records) are
    /// skipped, mirroring the codec's best-effort stance.
    pub fn state_at(&self, id: NodeId) -> Result<GameState, TreeError> {
        if !self.nodes.contains_key(&id) {
            return Err(TreeError::NodeNotFound(id));
        }
        Ok(self.replay(id))
    }

    // Replay along the root-to-id path. `id` must be in the arena.
    fn replay(&self, id: NodeId) -> GameState {
        let mut path = vec![id];
        let mut cursor = id;
        while let Some(parent) = self.nodes[&cursor].parent {
            path.push(parent);
            cursor = parent;
        }
        let mut state = GameState::new(self.size);
        for node in path.into_iter().rev() {
            if let Some(mv) = self.nodes[&node].mv {
                if let Ok(next) = state.play(mv) {
                    state = next;
                }
            }
        }
        state
    }

    /// The board at a node. See [`MoveTree::state_at`].
    pub fn position_at(&self, id: NodeId) -> Result<Board, TreeError> {
        Ok(self.state_at(id)?.board().clone())
    }

    /// Tree-shape snapshot for a visualization layer: ids, parent/child
    /// links, and the main-path marking. Never hands out node references.
    pub fn snapshot(&self) -> TreeSnapshot {
        let mut nodes: Vec<NodeSnapshot> = self
            .nodes
            .values()
            .map(|n| NodeSnapshot {
                id: n.id,
                parent: n.parent,
                children: n.children.clone(),
                mv: n.mv,
                on_main_path: self.main_path.contains(&n.id),
            })
            .collect();
        nodes.sort_by_key(|n| n.id);
        TreeSnapshot {
            root: self.root,
            current: self.current,
            nodes,
        }
    }

    /// Recompute the main path: root to current, plus the first-child
    /// chain from current onward when `forward` is set. Display-only;
    /// rules never consult it.
    fn mark_main_path(&mut self, forward: bool) {
        let mut path = HashSet::new();
        let mut cursor = self.current;
        path.insert(cursor);
        while let Some(parent) = self.nodes[&cursor].parent {
            path.insert(parent);
            cursor = parent;
        }
        if forward {
            cursor = self.current;
            while let Some(&child) = self.nodes[&cursor].children.first() {
                path.insert(child);
                cursor = child;
            }
        }
        self.main_path = path;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::IllegalMove;

    use Stone::{Black as B, White as W};

    fn mv(color: Stone, x: usize, y: usize) -> Move {
        Move::place(color, x, y)
    }

    #[test]
    fn make_move_extends_tree() {
        let mut tree = MoveTree::new(9);
        let id = tree.make_move(mv(B, 2, 2)).unwrap();
        assert_eq!(tree.current(), id);
        assert_eq!(tree.node(id).unwrap().parent, Some(tree.root()));
        let board = tree.position_at(id).unwrap();
        assert_eq!(board.get(2, 2), Stone::Black);
    }

    #[test]
    fn rejected_move_leaves_tree_unchanged() {
        let mut tree = MoveTree::new(9);
        tree.make_move(mv(B, 2, 2)).unwrap();
        let before = tree.len();
        let current = tree.current();
        assert_eq!(tree.make_move(mv(W, 2, 2)), Err(IllegalMove::Occupied));
        assert_eq!(tree.len(), before);
        assert_eq!(tree.current(), current);
    }

    #[test]
    fn repeated_move_reuses_child() {
        let mut tree = MoveTree::new(9);
        let first = tree.make_move(mv(B, 2, 2)).unwrap();
        tree.undo().unwrap();
        let second = tree.make_move(mv(B, 2, 2)).unwrap();
        assert_eq!(first, second);
        assert_eq!(tree.node(tree.root()).unwrap().children.len(), 1);
    }

    #[test]
    fn undo_redo_restore_node_and_position() {
        let mut tree = MoveTree::new(9);
        tree.make_move(mv(B, 2, 2)).unwrap();
        let id = tree.make_move(mv(W, 3, 3)).unwrap();
        let before = tree.position_at(id).unwrap();

        tree.undo().unwrap();
        assert_ne!(tree.current(), id);
        tree.redo().unwrap();
        assert_eq!(tree.current(), id);
        let after = tree.position_at(tree.current()).unwrap();
        assert!(before == after);
    }

    #[test]
    fn undo_at_root_and_redo_at_leaf_are_errors() {
        let mut tree = MoveTree::new(9);
        assert_eq!(tree.undo(), Err(TreeError::AtRoot));
        tree.make_move(mv(B, 2, 2)).unwrap();
        assert_eq!(tree.redo(), Err(TreeError::AtLeaf));
    }

    #[test]
    fn variations_branch_from_shared_parent() {
        let mut tree = MoveTree::new(9);
        tree.make_move(mv(B, 2, 2)).unwrap();
        let main = tree.make_move(mv(W, 3, 3)).unwrap();
        tree.undo().unwrap();
        let side = tree.make_move(mv(W, 5, 5)).unwrap();
        assert_ne!(main, side);

        let parent = tree.node(side).unwrap().parent.unwrap();
        assert_eq!(tree.node(parent).unwrap().children, vec![main, side]);
        // First child stays the main line when the parent is promoted.
        assert!(tree.main_path().contains(&side));
        tree.switch_variation(parent).unwrap();
        assert!(tree.main_path().contains(&main));
        assert!(!tree.main_path().contains(&side));
    }

    #[test]
    fn switch_variation_promotes_display_path() {
        let mut tree = MoveTree::new(9);
        tree.make_move(mv(B, 2, 2)).unwrap();
        tree.make_move(mv(W, 3, 3)).unwrap();
        tree.undo().unwrap();
        let side = tree.make_move(mv(W, 5, 5)).unwrap();
        let deeper = tree.make_move(mv(B, 6, 6)).unwrap();
        tree.navigate_to(tree.root()).unwrap();

        tree.switch_variation(side).unwrap();
        assert_eq!(tree.current(), side);
        assert!(tree.main_path().contains(&side));
        // Forward continuation follows first children.
        assert!(tree.main_path().contains(&deeper));
    }

    #[test]
    fn delete_current_removes_subtree() {
        let mut tree = MoveTree::new(9);
        let first = tree.make_move(mv(B, 2, 2)).unwrap();
        tree.make_move(mv(W, 3, 3)).unwrap();
        let leaf = tree.make_move(mv(B, 4, 4)).unwrap();
        tree.navigate_to(first).unwrap();

        let parent = tree.delete_current().unwrap();
        assert_eq!(parent, tree.root());
        assert_eq!(tree.current(), tree.root());
        assert_eq!(tree.len(), 1);
        assert!(tree.node(first).is_none());
        assert!(tree.node(leaf).is_none());
    }

    #[test]
    fn delete_root_is_rejected() {
        let mut tree = MoveTree::new(9);
        assert_eq!(tree.delete_current(), Err(TreeError::DeleteRoot));
    }

    #[test]
    fn delete_stone_at_requires_matching_point() {
        let mut tree = MoveTree::new(9);
        tree.make_move(mv(B, 2, 2)).unwrap();
        assert_eq!(tree.delete_stone_at(3, 3), Err(TreeError::StoneMismatch));
        tree.delete_stone_at(2, 2).unwrap();
        assert_eq!(tree.current(), tree.root());
    }

    #[test]
    fn markers_replace_by_point_and_kind() {
        let mut tree = MoveTree::new(9);
        tree.make_move(mv(B, 2, 2)).unwrap();
        tree.add_marker(4, 4, MarkerKind::Letter, Some("A".into()));
        tree.add_marker(4, 4, MarkerKind::Letter, Some("B".into()));
        let markers = &tree.current_node().markers;
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].label.as_deref(), Some("B"));

        tree.remove_marker(4, 4, MarkerKind::Letter);
        assert!(tree.current_node().markers.is_empty());
    }

    #[test]
    fn label_markers_always_carry_text() {
        let mut tree = MoveTree::new(9);
        tree.make_move(mv(B, 2, 2)).unwrap();
        tree.add_marker(4, 4, MarkerKind::Letter, None);
        tree.add_marker(5, 5, MarkerKind::Number, Some(String::new()));
        tree.add_marker(6, 6, MarkerKind::Triangle, Some("stray".into()));

        let markers = &tree.current_node().markers;
        assert_eq!(markers[0].label.as_deref(), Some("A"));
        assert_eq!(markers[1].label.as_deref(), Some("1"));
        assert_eq!(markers[2].label, None);
    }

    #[test]
    fn replay_reproduces_captures() {
        let mut tree = MoveTree::new(9);
        for m in [
            mv(B, 1, 2),
            mv(W, 2, 2),
            mv(B, 2, 1),
            mv(W, 7, 7),
            mv(B, 2, 3),
            mv(W, 7, 6),
            mv(B, 3, 2),
        ] {
            tree.make_move(m).unwrap();
        }
        let state = tree.state_at(tree.current()).unwrap();
        assert_eq!(state.captures(B), 1);
        assert_eq!(state.board().get(2, 2), Stone::Empty);
    }

    #[test]
    fn snapshot_reflects_shape_and_main_path() {
        let mut tree = MoveTree::new(9);
        tree.make_move(mv(B, 2, 2)).unwrap();
        tree.undo().unwrap();
        tree.make_move(mv(B, 3, 3)).unwrap();

        let snap = tree.snapshot();
        assert_eq!(snap.nodes.len(), 3);
        assert_eq!(snap.root, tree.root());
        assert_eq!(snap.current, tree.current());
        let root_entry = snap.nodes.iter().find(|n| n.id == snap.root).unwrap();
        assert_eq!(root_entry.children.len(), 2);
    }
}
