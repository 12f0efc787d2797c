//! SGF (Smart Game Format) codec.
//!
//! Parsing is a hand-written recursive descent over the SGF grammar:
//!
//! ```text
//! GameTree = "(" Sequence { GameTree } ")"
//! Sequence = Node { Node }
//! Node     = ";" { Property }
//! Property = Ident "[" Value "]" { "[" Value "]" }
//! ```
//!
//! Files in the wild are frequently slightly non-conformant, so parsing is
//! best-effort: malformed nodes and properties are skipped and reported in
//! a diagnostics list returned next to the tree, never as a hard failure.
//! A header without a readable board size falls back to 19×19.
//!
//! Serialization walks the tree pre-order, inlining single children and
//! wrapping each branch of a fork in its own parentheses.

use std::fmt::Write as _;

use thiserror::Error;

use crate::board::{Point, Stone};
use crate::rules::Move;
use crate::tree::{MarkerKind, MoveNode, MoveTree, NodeId};

/// Board size assumed when the header does not provide a usable `SZ`.
pub const DEFAULT_BOARD_SIZE: usize = 19;

/// Largest board the two-letter coordinate encoding covers here.
const MAX_BOARD_SIZE: usize = 26;

/// A recoverable problem found while parsing. The affected content is
/// skipped; everything well-formed around it is kept.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SgfDiagnostic {
    #[error("malformed header at byte {offset}: {detail}")]
    MalformedHeader { offset: usize, detail: String },
    #[error("unterminated branch starting at byte {offset}")]
    UnterminatedBranch { offset: usize },
    #[error("skipped node at byte {offset}: {detail}")]
    MalformedNode { offset: usize, detail: String },
    #[error("skipped {ident} property at byte {offset}: {detail}")]
    MalformedProperty {
        offset: usize,
        ident: String,
        detail: String,
    },
}

// Raw parse output, one step before tree construction. Mirrors the grammar:
// a sequence of property bags followed by variations.
struct RawTree {
    nodes: Vec<RawNode>,
    variations: Vec<RawTree>,
}

struct RawNode {
    offset: usize,
    properties: Vec<(String, Vec<String>)>,
}

impl RawNode {
    fn values_of(&self, ident: &str) -> Option<&[String]> {
        self.properties
            .iter()
            .find(|(i, _)| i == ident)
            .map(|(_, v)| v.as_slice())
    }
}

/// Parse SGF text into a move tree plus the diagnostics collected along
/// the way. Always yields a tree; a completely unreadable input produces
/// an empty default-size tree and a header diagnostic.
pub fn parse(text: &str) -> (MoveTree, Vec<SgfDiagnostic>) {
    let mut parser = Parser {
        bytes: text.as_bytes(),
        pos: 0,
        diagnostics: Vec::new(),
    };
    parser.skip_noise();
    let raw = parser.parse_game_tree();
    let mut diagnostics = parser.diagnostics;

    let tree = match raw {
        Some(raw) => build_tree(&raw, &mut diagnostics),
        None => {
            diagnostics.push(SgfDiagnostic::MalformedHeader {
                offset: 0,
                detail: "no game tree found".into(),
            });
            MoveTree::new(DEFAULT_BOARD_SIZE)
        }
    };
    (tree, diagnostics)
}

struct Parser<'a> {
    bytes: &'a [u8],
    pos: usize,
    diagnostics: Vec<SgfDiagnostic>,
}

impl Parser<'_> {
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b) if b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    // Leading bytes before the first '(' (BOMs, stray text) are noise.
    fn skip_noise(&mut self) {
        while let Some(b) = self.peek() {
            if b == b'(' {
                return;
            }
            self.pos += 1;
        }
    }

    fn parse_game_tree(&mut self) -> Option<RawTree> {
        self.skip_whitespace();
        if self.peek() != Some(b'(') {
            return None;
        }
        let open_offset = self.pos;
        self.pos += 1;

        let mut nodes = Vec::new();
        let mut variations = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some(b';') => {
                    self.pos += 1;
                    nodes.push(self.parse_node());
                }
                Some(b'(') => {
                    if let Some(subtree) = self.parse_game_tree() {
                        variations.push(subtree);
                    }
                }
                Some(b')') => {
                    self.pos += 1;
                    break;
                }
                Some(_) => {
                    // Unexpected byte inside a sequence; drop it and go on.
                    self.diagnostics.push(SgfDiagnostic::MalformedNode {
                        offset: self.pos,
                        detail: "unexpected character in sequence".into(),
                    });
                    self.pos += 1;
                }
                None => {
                    self.diagnostics.push(SgfDiagnostic::UnterminatedBranch {
                        offset: open_offset,
                    });
                    break;
                }
            }
        }
        Some(RawTree { nodes, variations })
    }

    fn parse_node(&mut self) -> RawNode {
        let offset = self.pos;
        let mut properties = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some(b) if b.is_ascii_alphabetic() => {
                    let ident_offset = self.pos;
                    let ident = self.parse_ident();
                    self.skip_whitespace();
                    if self.peek() != Some(b'[') {
                        self.diagnostics.push(SgfDiagnostic::MalformedProperty {
                            offset: ident_offset,
                            ident,
                            detail: "identifier without a value".into(),
                        });
                        continue;
                    }
                    let mut values = Vec::new();
                    while self.peek() == Some(b'[') {
                        values.push(self.parse_value());
                        self.skip_whitespace();
                    }
                    properties.push((ident, values));
                }
                _ => break,
            }
        }
        RawNode { offset, properties }
    }

    fn parse_ident(&mut self) -> String {
        let start = self.pos;
        while matches!(self.peek(), Some(b) if b.is_ascii_alphabetic()) {
            self.pos += 1;
        }
        String::from_utf8_lossy(&self.bytes[start..self.pos]).into_owned()
    }

    // Consumes "[...]" ; a backslash escapes the following byte.
    fn parse_value(&mut self) -> String {
        let open_offset = self.pos;
        self.pos += 1; // '['
        let mut value = Vec::new();
        loop {
            match self.peek() {
                Some(b']') => {
                    self.pos += 1;
                    break;
                }
                Some(b'\\') => {
                    self.pos += 1;
                    if let Some(escaped) = self.peek() {
                        value.push(escaped);
                        self.pos += 1;
                    }
                }
                Some(b) => {
                    value.push(b);
                    self.pos += 1;
                }
                None => {
                    self.diagnostics.push(SgfDiagnostic::UnterminatedBranch {
                        offset: open_offset,
                    });
                    break;
                }
            }
        }
        String::from_utf8_lossy(&value).into_owned()
    }
}

// ---------------------------------------------------------------------------
// Raw tree -> MoveTree
// ---------------------------------------------------------------------------

fn build_tree(raw: &RawTree, diagnostics: &mut Vec<SgfDiagnostic>) -> MoveTree {
    let mut size = DEFAULT_BOARD_SIZE;
    let mut komi = None;

    if let Some(root) = raw.nodes.first() {
        if let Some(values) = root.values_of("SZ") {
            match values.first().map(|v| v.parse::<usize>()) {
                Some(Ok(n)) if (1..=MAX_BOARD_SIZE).contains(&n) => size = n,
                _ => diagnostics.push(SgfDiagnostic::MalformedHeader {
                    offset: root.offset,
                    detail: format!(
                        "unusable board size {:?}, assuming {DEFAULT_BOARD_SIZE}",
                        values.first().map(String::as_str).unwrap_or("")
                    ),
                }),
            }
        }
        if let Some(values) = root.values_of("KM") {
            match values.first().map(|v| v.parse::<f64>()) {
                Some(Ok(k)) => komi = Some(k),
                _ => diagnostics.push(SgfDiagnostic::MalformedHeader {
                    offset: root.offset,
                    detail: "unreadable komi".into(),
                }),
            }
        }
    }

    let mut tree = MoveTree::new(size);
    if let Some(komi) = komi {
        tree.set_komi(komi);
    }

    let root = tree.root();
    let mut cursor = root;
    if let Some(root_raw) = raw.nodes.first() {
        apply_annotations(&mut tree, root, root_raw, diagnostics);
        // A move on the header node is non-conformant but seen in the
        // wild; hang it under the root like any other move.
        if let Ok(Some(mv)) = node_move(root_raw, tree.size(), diagnostics) {
            if let Ok(id) = tree.add_child(root, Some(mv)) {
                cursor = id;
            }
        }
    }

    let rest = if raw.nodes.is_empty() { &[] } else { &raw.nodes[1..] };
    let cursor = attach_sequence(&mut tree, cursor, rest, diagnostics);
    for variation in &raw.variations {
        attach_subtree(&mut tree, cursor, variation, diagnostics);
    }
    tree
}

fn attach_subtree(
    tree: &mut MoveTree,
    parent: NodeId,
    raw: &RawTree,
    diagnostics: &mut Vec<SgfDiagnostic>,
) {
    let cursor = attach_sequence(tree, parent, &raw.nodes, diagnostics);
    for variation in &raw.variations {
        attach_subtree(tree, cursor, variation, diagnostics);
    }
}

// Chains a sequence of raw nodes under `parent`, returning the last node
// created (branches hang off the node preceding them).
fn attach_sequence(
    tree: &mut MoveTree,
    parent: NodeId,
    nodes: &[RawNode],
    diagnostics: &mut Vec<SgfDiagnostic>,
) -> NodeId {
    let mut cursor = parent;
    for raw in nodes {
        let mv = match node_move(raw, tree.size(), diagnostics) {
            Ok(mv) => mv,
            // Malformed node: skip it, keep chaining from the same spot.
            Err(()) => continue,
        };
        match tree.add_child(cursor, mv) {
            Ok(id) => {
                apply_annotations(tree, id, raw, diagnostics);
                cursor = id;
            }
            Err(_) => break,
        }
    }
    cursor
}

// The node's move, if any. Ok(None) is an annotation-only node; Err means
// the node is malformed and must be skipped.
fn node_move(
    raw: &RawNode,
    size: usize,
    diagnostics: &mut Vec<SgfDiagnostic>,
) -> Result<Option<Move>, ()> {
    for (ident, color) in [("B", Stone::Black), ("W", Stone::White)] {
        let Some(values) = raw.values_of(ident) else {
            continue;
        };
        let value = values.first().map(String::as_str).unwrap_or("");
        // An empty value (or "tt" on boards up to 19) is a pass.
        if value.is_empty() || (value == "tt" && size <= 19) {
            return Ok(Some(Move::pass(color)));
        }
        match parse_point(value, size) {
            Some((x, y)) => return Ok(Some(Move::place(color, x, y))),
            None => {
                diagnostics.push(SgfDiagnostic::MalformedNode {
                    offset: raw.offset,
                    detail: format!("unreadable {ident} coordinate {value:?}"),
                });
                return Err(());
            }
        }
    }
    Ok(None)
}

fn apply_annotations(
    tree: &mut MoveTree,
    id: NodeId,
    raw: &RawNode,
    diagnostics: &mut Vec<SgfDiagnostic>,
) {
    let size = tree.size();
    let mut markers = Vec::new();

    for (ident, kind) in [
        ("TR", MarkerKind::Triangle),
        ("SQ", MarkerKind::Square),
        ("CR", MarkerKind::Circle),
        ("MA", MarkerKind::Cross),
    ] {
        for value in raw.values_of(ident).unwrap_or(&[]) {
            match parse_point(value, size) {
                Some((x, y)) => markers.push((x, y, kind, None)),
                None => diagnostics.push(SgfDiagnostic::MalformedProperty {
                    offset: raw.offset,
                    ident: ident.into(),
                    detail: format!("unreadable point {value:?}"),
                }),
            }
        }
    }

    for value in raw.values_of("LB").unwrap_or(&[]) {
        let parsed = value
            .split_once(':')
            .and_then(|(coord, label)| Some((parse_point(coord, size)?, label)));
        match parsed {
            Some(((x, y), label)) if !label.is_empty() => {
                // Numeric labels are number markers, the rest are letters.
                let kind = if label.chars().all(|c| c.is_ascii_digit()) {
                    MarkerKind::Number
                } else {
                    MarkerKind::Letter
                };
                markers.push((x, y, kind, Some(label.to_string())));
            }
            _ => diagnostics.push(SgfDiagnostic::MalformedProperty {
                offset: raw.offset,
                ident: "LB".into(),
                detail: format!("expected coord:text, got {value:?}"),
            }),
        }
    }

    let comment = raw
        .values_of("C")
        .and_then(|v| v.first())
        .cloned()
        .unwrap_or_default();

    if let Some(node) = tree.node_mut(id) {
        for (x, y, kind, label) in markers {
            node.markers.push(crate::tree::Marker { x, y, kind, label });
        }
        if !comment.is_empty() {
            node.comment = comment;
        }
    }
}

fn parse_point(value: &str, size: usize) -> Option<Point> {
    let bytes = value.as_bytes();
    if bytes.len() != 2 {
        return None;
    }
    let x = bytes[0].checked_sub(b'a')? as usize;
    let y = bytes[1].checked_sub(b'a')? as usize;
    if x < size && y < size { Some((x, y)) } else { None }
}

// ---------------------------------------------------------------------------
// MoveTree -> SGF text
// ---------------------------------------------------------------------------

/// Serialize a move tree to SGF text. The output always round-trips back
/// to the same tree shape, moves, markers, and comments.
pub fn serialize(tree: &MoveTree) -> String {
    let mut out = String::from("(;GM[1]FF[4]CA[UTF-8]");
    let _ = write!(
        out,
        "AP[kifu-engine:{}]SZ[{}]KM[{}]",
        env!("CARGO_PKG_VERSION"),
        tree.size(),
        tree.komi()
    );
    if let Some(root) = tree.node(tree.root()) {
        write_annotations(root, &mut out);
        write_children(tree, tree.root(), &mut out);
    }
    out.push(')');
    out
}

fn write_children(tree: &MoveTree, id: NodeId, out: &mut String) {
    let Some(node) = tree.node(id) else { return };
    match node.children.as_slice() {
        [] => {}
        // A single continuation is inlined into the parent's sequence.
        [only] => {
            write_node(tree, *only, out);
            write_children(tree, *only, out);
        }
        children => {
            for &child in children {
                out.push('(');
                write_node(tree, child, out);
                write_children(tree, child, out);
                out.push(')');
            }
        }
    }
}

fn write_node(tree: &MoveTree, id: NodeId, out: &mut String) {
    let Some(node) = tree.node(id) else { return };
    out.push(';');
    if let Some(mv) = node.mv {
        let ident = if mv.color == Stone::White { "W" } else { "B" };
        match mv.point {
            Some((x, y)) => {
                out.push_str(ident);
                out.push('[');
                push_point(x, y, out);
                out.push(']');
            }
            None => {
                out.push_str(ident);
                out.push_str("[]");
            }
        }
    }
    write_annotations(node, out);
}

fn write_annotations(node: &MoveNode, out: &mut String) {
    // Point markers are grouped into one property per kind.
    for (ident, kind) in [
        ("TR", MarkerKind::Triangle),
        ("SQ", MarkerKind::Square),
        ("CR", MarkerKind::Circle),
        ("MA", MarkerKind::Cross),
    ] {
        let mut wrote_ident = false;
        for marker in node.markers.iter().filter(|m| m.kind == kind) {
            if !wrote_ident {
                out.push_str(ident);
                wrote_ident = true;
            }
            out.push('[');
            push_point(marker.x, marker.y, out);
            out.push(']');
        }
    }

    let mut wrote_lb = false;
    for marker in node
        .markers
        .iter()
        .filter(|m| matches!(m.kind, MarkerKind::Letter | MarkerKind::Number))
    {
        if !wrote_lb {
            out.push_str("LB");
            wrote_lb = true;
        }
        out.push('[');
        push_point(marker.x, marker.y, out);
        out.push(':');
        out.push_str(&escape(marker.label.as_deref().unwrap_or("")));
        out.push(']');
    }

    if !node.comment.is_empty() {
        out.push_str("C[");
        out.push_str(&escape(&node.comment));
        out.push(']');
    }
}

fn push_point(x: usize, y: usize, out: &mut String) {
    out.push((b'a' + x as u8) as char);
    out.push((b'a' + y as u8) as char);
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace(']', "\\]")
}
