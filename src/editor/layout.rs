//! Single-line cell layout of a field, in terminal columns.

use std::collections::{HashMap, HashSet};

use unicode_width::UnicodeWidthChar;

use super::Editor;
use super::cursor::Point;
use super::direction::Direction;
use super::tree::{NodeId, NodeKind};

/// Glyph shown for an empty embedded expression.
pub const PLACEHOLDER: char = '□';

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellKind {
    Math,
    /// Text of a region, tagged with the region's control sequence.
    Text(&'static str),
    /// Top-level text of a text field.
    PlainText,
    Placeholder,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cell {
    pub glyph: char,
    pub width: usize,
    pub column: usize,
    pub kind: CellKind,
    pub selected: bool,
}

/// Half-open column range `[start, end)` covered by a node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Extent {
    pub start: usize,
    pub end: usize,
}

impl Extent {
    pub fn width(&self) -> usize {
        self.end - self.start
    }

    pub fn contains(&self, column: usize) -> bool {
        self.start <= column && column < self.end
    }
}

#[derive(Debug, Default)]
pub struct Layout {
    cells: Vec<Cell>,
    extents: HashMap<NodeId, Extent>,
    width: usize,
}

impl Layout {
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn extent(&self, node: NodeId) -> Extent {
        self.extents.get(&node).copied().unwrap_or_default()
    }

    /// Column of the gap at `point`.
    pub fn gap_column(&self, point: &Point) -> usize {
        if let Some(left) = point[Direction::Left] {
            self.extent(left).end
        } else if let Some(right) = point[Direction::Right] {
            self.extent(right).start
        } else {
            self.extent(point.parent).start
        }
    }
}

pub fn measure(editor: &Editor) -> Layout {
    let selected: HashSet<NodeId> = editor.selected_nodes().into_iter().collect();
    let mut measurer = Measurer {
        editor,
        selected,
        layout: Layout::default(),
    };
    let root = editor.tree.root();
    measurer.visit(root, None, false);
    measurer.layout
}

struct Measurer<'a> {
    editor: &'a Editor,
    selected: HashSet<NodeId>,
    layout: Layout,
}

impl Measurer<'_> {
    fn push(&mut self, glyph: char, kind: CellKind, selected: bool) {
        let width = UnicodeWidthChar::width(glyph).unwrap_or(0);
        self.layout.cells.push(Cell {
            glyph,
            width,
            column: self.layout.width,
            kind,
            selected,
        });
        self.layout.width += width;
    }

    fn visit(&mut self, node: NodeId, style: Option<&'static str>, selected: bool) {
        let editor = self.editor;
        let tree = &editor.tree;
        let selected = selected || self.selected.contains(&node);
        let start = self.layout.width;
        match tree.kind(node) {
            NodeKind::Segment(segment) => {
                let kind = CellKind::Text(style.unwrap_or("\\text"));
                // Glyphs come from the mirror, which is what the terminal shows.
                for glyph in editor.surface.text(segment.run).chars() {
                    self.push(glyph, kind, selected);
                }
            }
            NodeKind::Symbol(symbol) => {
                let kind = match tree.parent(node).map(|parent| tree.kind(parent)) {
                    Some(NodeKind::RootText) => CellKind::PlainText,
                    _ => CellKind::Math,
                };
                for glyph in symbol.text.chars() {
                    self.push(glyph, kind, selected);
                }
            }
            NodeKind::Region(region) => {
                let style = Some(region.style.control_sequence);
                for child in tree.children(node).collect::<Vec<_>>() {
                    self.visit(child, style, selected);
                }
            }
            NodeKind::ModeSwitch => {
                for child in tree.children(node).collect::<Vec<_>>() {
                    self.visit(child, None, selected);
                }
            }
            NodeKind::Block(_) | NodeKind::RootText => {
                if tree.is_empty(node) && tree.parent(node).is_some() {
                    self.push(PLACEHOLDER, CellKind::Placeholder, selected);
                }
                for child in tree.children(node).collect::<Vec<_>>() {
                    self.visit(child, None, selected);
                }
            }
        }
        self.layout.extents.insert(
            node,
            Extent {
                start,
                end: self.layout.width,
            },
        );
    }
}
