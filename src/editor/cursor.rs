use std::ops::{Index, IndexMut};

use tracing::trace;

use super::Editor;
use super::direction::{Direction, Sides};
use super::tree::{NodeId, NodeKind};

/// A gap between two children of `parent`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Point {
    pub parent: NodeId,
    pub sides: Sides<Option<NodeId>>,
}

impl Point {
    pub fn new(parent: NodeId, left: Option<NodeId>, right: Option<NodeId>) -> Self {
        Self {
            parent,
            sides: Sides::new(left, right),
        }
    }

    fn same_gap(&self, other: &Point) -> bool {
        self.parent == other.parent && self.sides[Direction::Left] == other.sides[Direction::Left]
    }
}

impl Index<Direction> for Point {
    type Output = Option<NodeId>;

    fn index(&self, dir: Direction) -> &Option<NodeId> {
        &self.sides[dir]
    }
}

impl IndexMut<Direction> for Point {
    fn index_mut(&mut self, dir: Direction) -> &mut Option<NodeId> {
        &mut self.sides[dir]
    }
}

/// A run of siblings from `ends[Left]` to `ends[Right]`, inclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Selection {
    pub ends: Sides<NodeId>,
}

/// Nodes detached from the tree by a selection removal, in order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Fragment {
    pub nodes: Vec<NodeId>,
}

#[derive(Clone, Debug)]
pub struct Cursor {
    pub(crate) point: Point,
    pub(crate) anticursor: Option<Point>,
    pub(crate) selection: Option<Selection>,
    visible: bool,
}

impl Cursor {
    pub fn new(root: NodeId) -> Self {
        Self {
            point: Point::new(root, None, None),
            anticursor: None,
            selection: None,
            visible: true,
        }
    }

    pub fn point(&self) -> Point {
        self.point
    }

    pub fn parent(&self) -> NodeId {
        self.point.parent
    }

    pub fn anticursor(&self) -> Option<Point> {
        self.anticursor
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn show(&mut self) -> &mut Self {
        self.visible = true;
        self
    }

    pub fn hide(&mut self) -> &mut Self {
        self.visible = false;
        self
    }

    pub fn start_selection(&mut self) {
        self.anticursor = Some(self.point);
    }

    pub fn clear_selection(&mut self) -> &mut Self {
        self.selection = None;
        self
    }

    pub fn end_selection(&mut self) -> &mut Self {
        self.anticursor = None;
        self
    }
}

impl Index<Direction> for Cursor {
    type Output = Option<NodeId>;

    fn index(&self, dir: Direction) -> &Option<NodeId> {
        &self.point.sides[dir]
    }
}

impl IndexMut<Direction> for Cursor {
    fn index_mut(&mut self, dir: Direction) -> &mut Option<NodeId> {
        &mut self.point.sides[dir]
    }
}

/// Either a gap or a node, used while searching for a selection's ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Anchor {
    Gap(Point),
    Node(NodeId),
}

impl Editor {
    /// Moves the cursor to `point`, blurring the block it leaves.
    pub(crate) fn relocate(&mut self, point: Point) {
        let old_parent = self.cursor.point.parent;
        self.cursor.point = point;
        if old_parent != point.parent {
            trace!(from = ?old_parent, to = ?point.parent, "cursor changed block");
            self.blur_block(old_parent);
        }
    }

    pub(crate) fn ins_dir_of(&mut self, dir: Direction, node: NodeId) {
        let Some(parent) = self.tree.parent(node) else {
            return;
        };
        let point = Point {
            parent,
            sides: Sides::toward(dir, self.tree.sibling(node, dir), Some(node)),
        };
        self.relocate(point);
    }

    pub(crate) fn ins_left_of(&mut self, node: NodeId) {
        self.ins_dir_of(Direction::Left, node);
    }

    pub(crate) fn ins_right_of(&mut self, node: NodeId) {
        self.ins_dir_of(Direction::Right, node);
    }

    pub(crate) fn ins_at_dir_end(&mut self, dir: Direction, block: NodeId) {
        let point = Point {
            parent: block,
            sides: Sides::toward(dir, None, self.tree.end(block, dir)),
        };
        self.relocate(point);
    }

    pub(crate) fn ins_at_left_end(&mut self, block: NodeId) {
        self.ins_at_dir_end(Direction::Left, block);
    }

    pub(crate) fn ins_at_right_end(&mut self, block: NodeId) {
        self.ins_at_dir_end(Direction::Right, block);
    }

    /// Inserts a detached node into the cursor's gap and steps the cursor past it.
    pub(crate) fn create_left_of_cursor(&mut self, node: NodeId) {
        let parent = self.cursor.point.parent;
        self.tree.adopt(node, parent, self.cursor.point.sides);
        self.mirror_attach(node);
        self.cursor[Direction::Left] = Some(node);
    }

    /// Inserts a detached node into the cursor's gap on the `dir` side of the cursor.
    pub(crate) fn create_dir_of_cursor(&mut self, node: NodeId, dir: Direction) {
        let parent = self.cursor.point.parent;
        self.tree.adopt(node, parent, self.cursor.point.sides);
        self.mirror_attach(node);
        self.cursor[dir] = Some(node);
    }

    /// Turns the gap between cursor and anticursor into a selection.
    ///
    /// Returns `false` when both denote the same gap or the anticursor is not
    /// in the cursor's tree.
    pub(crate) fn select(&mut self) -> bool {
        let Some(anticursor) = self.cursor.anticursor else {
            return false;
        };
        let cursor = self.cursor.point;
        if cursor.same_gap(&anticursor) {
            return false;
        }

        if !self.tree.is_live(anticursor.parent) {
            return false;
        }
        let anti_ancestors = self.tree.ancestors(anticursor.parent);
        let mut ancestor = Anchor::Gap(cursor);
        let lca = loop {
            let parent = self.anchor_parent(ancestor);
            if anti_ancestors.contains(&parent) {
                break parent;
            }
            if self.tree.parent(parent).is_none() {
                trace!(?anticursor, "anticursor is not in the cursor's tree");
                return false;
            }
            ancestor = Anchor::Node(parent);
        };

        // `anti_ancestors[depth]` is the common block; the entry below it is
        // the anticursor's ancestor among its children.
        let Some(depth) = anti_ancestors.iter().position(|node| *node == lca) else {
            return false;
        };
        let anti_ancestor = match depth {
            0 => Anchor::Gap(anticursor),
            _ => Anchor::Node(anti_ancestors[depth - 1]),
        };

        // The anticursor lies to the right iff walking rightward from the
        // cursor's ancestor reaches a node sharing its right neighbour.
        let mut dir = Direction::Right;
        let anti_is_left_neighbor =
            matches!(anti_ancestor, Anchor::Node(node) if self.anchor_side(ancestor, Direction::Left) == Some(node));
        if !anti_is_left_neighbor {
            let target = self.anchor_side(anti_ancestor, Direction::Right);
            let mut rightward = Some(ancestor);
            while let Some(current) = rightward {
                let next = self.anchor_side(current, Direction::Right);
                if next == target {
                    dir = Direction::Left;
                    break;
                }
                rightward = next.map(Anchor::Node);
            }
        }
        let (left_end, right_end) = match dir {
            Direction::Right => (anti_ancestor, ancestor),
            Direction::Left => (ancestor, anti_ancestor),
        };
        let left = match left_end {
            Anchor::Gap(point) => point[Direction::Right],
            Anchor::Node(node) => Some(node),
        };
        let right = match right_end {
            Anchor::Gap(point) => point[Direction::Left],
            Anchor::Node(node) => Some(node),
        };
        let (Some(left), Some(right)) = (left, right) else {
            return false;
        };

        let selection = Selection {
            ends: Sides::new(left, right),
        };
        self.cursor.hide();
        self.cursor.selection = Some(selection);
        self.ins_dir_of(dir, selection.ends[dir]);
        true
    }

    fn anchor_parent(&self, anchor: Anchor) -> NodeId {
        match anchor {
            Anchor::Gap(point) => point.parent,
            Anchor::Node(node) => self.tree.parent(node).unwrap_or(node),
        }
    }

    fn anchor_side(&self, anchor: Anchor, dir: Direction) -> Option<NodeId> {
        match anchor {
            Anchor::Gap(point) => point[dir],
            Anchor::Node(node) => self.tree.sibling(node, dir),
        }
    }

    /// Nodes covered by the current selection, left to right.
    pub(crate) fn selected_nodes(&self) -> Vec<NodeId> {
        let Some(selection) = self.cursor.selection else {
            return Vec::new();
        };
        let mut nodes = Vec::new();
        let mut current = Some(selection.ends[Direction::Left]);
        while let Some(node) = current {
            nodes.push(node);
            if node == selection.ends[Direction::Right] {
                break;
            }
            current = self.tree.sibling(node, Direction::Right);
        }
        nodes
    }

    /// Detaches the selected nodes and closes the gap around the cursor.
    pub(crate) fn delete_selection(&mut self) -> Option<Fragment> {
        let selection = self.cursor.selection?;
        let nodes = self.selected_nodes();
        let parent = self.tree.parent(selection.ends[Direction::Left])?;
        let left = self.tree.sibling(selection.ends[Direction::Left], Direction::Left);
        let right = self.tree.sibling(selection.ends[Direction::Right], Direction::Right);
        for node in &nodes {
            self.mirror_detach(*node);
            self.tree.disown(*node);
        }
        self.cursor.clear_selection();
        self.end_selection();
        self.relocate(Point::new(parent, left, right));
        Some(Fragment { nodes })
    }

    /// Removes the selection for the caller to reuse as replaced content.
    pub(crate) fn replace_selection(&mut self) -> Option<Fragment> {
        let fragment = self.delete_selection();
        if fragment.is_some() {
            self.cursor.show();
        }
        fragment
    }

    pub(crate) fn release_fragment(&mut self, fragment: Fragment) {
        for node in fragment.nodes {
            self.release_subtree(node);
        }
    }

    /// Plain text of a detached fragment, as it would read on screen.
    pub(crate) fn fragment_text(&self, fragment: &Fragment) -> String {
        fragment
            .nodes
            .iter()
            .map(|node| self.plain_text(*node))
            .collect()
    }

    pub(crate) fn plain_text(&self, node: NodeId) -> String {
        match self.tree.kind(node) {
            NodeKind::Segment(segment) => segment.text.clone(),
            NodeKind::Symbol(symbol) => symbol.text.clone(),
            _ => self
                .tree
                .children(node)
                .map(|child| self.plain_text(child))
                .collect(),
        }
    }
}
