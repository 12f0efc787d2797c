//! Kifu: inspect Go game records from the command line.
//!
//! ## Usage
//!
//! - `kifu show <file>` - Print the final main-line board of an SGF file
//! - `kifu score <file>` - Print the territory and capture summary
//! - `kifu dump <file>` - Print the tree shape as JSON for layout tools
//! - `kifu demo` - Play out a small builtin game

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use kifu_engine::board::Stone;
use kifu_engine::rules::Move;
use kifu_engine::score::Scorer;
use kifu_engine::sgf;
use kifu_engine::tree::{MoveTree, NodeId};

/// Kifu: a Go rules and game-record engine
#[derive(Parser)]
#[command(name = "kifu")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the board at the end of the main line of an SGF file
    Show { file: PathBuf },
    /// Print the territory and capture summary of an SGF file
    Score { file: PathBuf },
    /// Print the tree shape as JSON (ids, parents, children, main path)
    Dump { file: PathBuf },
    /// Play out a small builtin game and print it
    Demo,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Show { file }) => show(&file),
        Some(Commands::Score { file }) => score(&file),
        Some(Commands::Dump { file }) => dump(&file),
        Some(Commands::Demo) | None => demo(),
    }
}

fn load(file: &PathBuf) -> anyhow::Result<MoveTree> {
    let text = fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let (tree, diagnostics) = sgf::parse(&text);
    for diagnostic in &diagnostics {
        eprintln!("warning: {diagnostic}");
    }
    Ok(tree)
}

fn end_of_main_line(tree: &MoveTree) -> NodeId {
    let mut id = tree.root();
    while let Some(&child) = tree.node(id).and_then(|n| n.children.first()) {
        id = child;
    }
    id
}

fn show(file: &PathBuf) -> anyhow::Result<()> {
    let tree = load(file)?;
    let end = end_of_main_line(&tree);
    let state = tree
        .state_at(end)
        .context("main line does not replay")?;

    println!("{}", state.board());
    println!(
        "{}x{} board, komi {}, {} nodes",
        tree.size(),
        tree.size(),
        tree.komi(),
        tree.len()
    );
    println!(
        "captures: black {}, white {}",
        state.captures(Stone::Black),
        state.captures(Stone::White)
    );
    let comment = &tree.node(end).map(|n| n.comment.clone()).unwrap_or_default();
    if !comment.is_empty() {
        println!("comment: {comment}");
    }
    Ok(())
}

fn score(file: &PathBuf) -> anyhow::Result<()> {
    let tree = load(file)?;
    let end = end_of_main_line(&tree);
    let state = tree
        .state_at(end)
        .context("main line does not replay")?;

    let scorer = Scorer::new(&state);
    for territory in scorer.territories() {
        let owner = match territory.owner {
            Stone::Black => "black",
            Stone::White => "white",
            Stone::Shared => "neutral",
            Stone::Empty => "unowned",
        };
        println!(
            "{owner:>8}: {:3} points ({} intersections)",
            territory.score,
            territory.points.len()
        );
    }
    let (black, white) = scorer.totals();
    println!("total: black {black}, white {} + komi {}", white, tree.komi());
    Ok(())
}

fn dump(file: &PathBuf) -> anyhow::Result<()> {
    let tree = load(file)?;
    let snapshot = tree.snapshot();
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

fn demo() -> anyhow::Result<()> {
    println!("Kifu-Engine: Go rules and game-record engine\n");

    let mut tree = MoveTree::new(9);
    for (color, x, y) in [
        (Stone::Black, 2, 2),
        (Stone::White, 2, 3),
        (Stone::Black, 3, 3),
        (Stone::White, 6, 6),
        (Stone::Black, 2, 4),
        (Stone::White, 6, 2),
        (Stone::Black, 1, 3),
    ] {
        tree.make_move(Move::place(color, x, y))
            .map_err(|e| anyhow::anyhow!("demo move at ({x},{y}): {e}"))?;
    }

    let state = tree.state_at(tree.current())?;
    println!("{}", state.board());
    println!(
        "captures: black {}, white {}",
        state.captures(Stone::Black),
        state.captures(Stone::White)
    );
    println!("\nSGF: {}", sgf::serialize(&tree));
    Ok(())
}
