//! Kifu-Engine: a Go rules and game-record engine.
//!
//! This crate maintains a Go position, enforces move legality (captures,
//! suicide, simple ko), scores territory, and keeps the full history of a
//! game (including branching variations) as a navigable tree that can be
//! exchanged losslessly with SGF text.
//!
//! ## Modules
//!
//! - [`board`] - Board grid, stones, coordinates
//! - [`group`] - Connected-group and liberty flood fill
//! - [`rules`] - Move legality, captures, ko, the game session value
//! - [`tree`] - Arena move tree with variations and annotations
//! - [`score`] - Territory scoring with manual dead-stone claims
//! - [`sgf`] - SGF parsing and serialization
//!
//! ## Example
//!
//! ```
//! use kifu_engine::board::Stone;
//! use kifu_engine::rules::Move;
//! use kifu_engine::tree::MoveTree;
//! use kifu_engine::sgf;
//!
//! // Record a short opening with a side variation.
//! let mut tree = MoveTree::new(9);
//! tree.make_move(Move::place(Stone::Black, 2, 2)).unwrap();
//! tree.make_move(Move::place(Stone::White, 6, 6)).unwrap();
//! tree.undo().unwrap();
//! tree.make_move(Move::place(Stone::White, 4, 4)).unwrap();
//!
//! // Derive the board at the current node and export the record.
//! let board = tree.position_at(tree.current()).unwrap();
//! assert_eq!(board.get(4, 4), Stone::White);
//! let text = sgf::serialize(&tree);
//! assert!(text.starts_with("(;"));
//! ```

pub mod board;
pub mod group;
pub mod rules;
pub mod score;
pub mod sgf;
pub mod tree;
