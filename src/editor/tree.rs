use tracing::trace;

use super::arena::{Arena, Handle};
use super::direction::{Direction, Sides};
use super::mode_switch::BlockKind;
use super::region::TextRegion;
use super::segment::TextSegment;

/// Handle of a node in the document arena.
///
/// Slots of released nodes are reused. A handle remembers the generation of
/// its slot and stops resolving once the node is released.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(Handle);

/// A math leaf: one character or control word.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Symbol {
    pub latex: String,
    pub text: String,
    pub html: Option<&'static str>,
}

impl Symbol {
    pub fn new(latex: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            latex: latex.into(),
            text: text.into(),
            html: None,
        }
    }

    pub fn with_html(mut self, html: &'static str) -> Self {
        self.html = Some(html);
        self
    }

    pub fn is_control_word(&self) -> bool {
        let mut chars = self.latex.chars();
        chars.next() == Some('\\') && chars.next().is_some_and(|c| c.is_ascii_alphabetic())
    }
}

#[derive(Debug)]
pub enum NodeKind {
    /// Top-level container of a text field.
    RootText,
    Region(TextRegion),
    Segment(TextSegment),
    ModeSwitch,
    /// A math block: the root of a math field, or the body of a mode switch.
    Block(BlockKind),
    Symbol(Symbol),
}

#[derive(Debug)]
pub struct Node {
    pub kind: NodeKind,
    parent: Option<NodeId>,
    siblings: Sides<Option<NodeId>>,
    ends: Sides<Option<NodeId>>,
    needs_reflow: bool,
}

impl Node {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            siblings: Sides::default(),
            ends: Sides::default(),
            needs_reflow: false,
        }
    }
}

/// Result of unlinking a node: the node, where it was, and who flanked it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Detached {
    pub node: NodeId,
    pub parent: NodeId,
    pub neighbors: Sides<Option<NodeId>>,
}

#[derive(Debug)]
pub struct Tree {
    nodes: Arena<Node>,
    root: NodeId,
}

impl Tree {
    pub fn new(root: NodeKind) -> Self {
        let mut nodes = Arena::default();
        let root = NodeId(nodes.insert(Node::new(root)));
        Self { nodes, root }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn alloc(&mut self, kind: NodeKind) -> NodeId {
        NodeId(self.nodes.insert(Node::new(kind)))
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.node(id).kind
    }

    pub fn kind_mut(&mut self, id: NodeId) -> &mut NodeKind {
        &mut self.node_mut(id).kind
    }

    pub fn is_live(&self, id: NodeId) -> bool {
        self.nodes.contains(id.0)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn sibling(&self, id: NodeId, dir: Direction) -> Option<NodeId> {
        self.node(id).siblings[dir]
    }

    pub fn end(&self, id: NodeId, dir: Direction) -> Option<NodeId> {
        self.node(id).ends[dir]
    }

    pub fn is_empty(&self, id: NodeId) -> bool {
        self.end(id, Direction::Left).is_none()
    }

    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            tree: self,
            next: self.end(id, Direction::Left),
        }
    }

    /// The node itself followed by each of its ancestors up to the root.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut chain = vec![id];
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            chain.push(parent);
            current = parent;
        }
        chain
    }

    pub fn live_count(&self) -> usize {
        self.nodes.len()
    }

    /// Slots allocated so far, including free ones awaiting reuse.
    pub fn slots(&self) -> usize {
        self.nodes.slots()
    }

    pub fn segment(&self, id: NodeId) -> Option<&TextSegment> {
        match self.kind(id) {
            NodeKind::Segment(segment) => Some(segment),
            _ => None,
        }
    }

    pub fn segment_mut(&mut self, id: NodeId) -> Option<&mut TextSegment> {
        match self.kind_mut(id) {
            NodeKind::Segment(segment) => Some(segment),
            _ => None,
        }
    }

    pub fn region(&self, id: NodeId) -> Option<&TextRegion> {
        match self.kind(id) {
            NodeKind::Region(region) => Some(region),
            _ => None,
        }
    }

    pub fn region_mut(&mut self, id: NodeId) -> Option<&mut TextRegion> {
        match self.kind_mut(id) {
            NodeKind::Region(region) => Some(region),
            _ => None,
        }
    }

    pub fn is_segment(&self, id: NodeId) -> bool {
        matches!(self.kind(id), NodeKind::Segment(_))
    }

    pub fn is_region(&self, id: NodeId) -> bool {
        matches!(self.kind(id), NodeKind::Region(_))
    }

    /// Links `child` under `parent` between the given neighbours.
    ///
    /// A missing neighbour means `child` becomes that end of `parent`.
    pub fn adopt(&mut self, child: NodeId, parent: NodeId, neighbors: Sides<Option<NodeId>>) {
        assert!(
            self.parent(child).is_none(),
            "node {child:?} adopted while still attached"
        );
        {
            let node = self.node_mut(child);
            node.parent = Some(parent);
            node.siblings = neighbors;
        }
        for dir in Direction::BOTH {
            match neighbors[dir] {
                Some(neighbor) => {
                    assert_eq!(
                        self.parent(neighbor),
                        Some(parent),
                        "neighbour {neighbor:?} does not belong to {parent:?}"
                    );
                    self.node_mut(neighbor).siblings[dir.opposite()] = Some(child);
                }
                None => self.node_mut(parent).ends[dir] = Some(child),
            }
        }
    }

    pub fn adopt_at_end(&mut self, child: NodeId, parent: NodeId, dir: Direction) {
        let neighbors = Sides::toward(dir, None, self.end(parent, dir));
        self.adopt(child, parent, neighbors);
    }

    /// Unlinks `id` from its parent and siblings, leaving the node allocated.
    pub fn disown(&mut self, id: NodeId) -> Detached {
        let parent = self
            .parent(id)
            .unwrap_or_else(|| panic!("cannot disown detached node {id:?}"));
        let neighbors = self.node(id).siblings;
        for dir in Direction::BOTH {
            let beyond = neighbors[dir.opposite()];
            match neighbors[dir] {
                Some(neighbor) => self.node_mut(neighbor).siblings[dir.opposite()] = beyond,
                None => self.node_mut(parent).ends[dir] = beyond,
            }
        }
        let node = self.node_mut(id);
        node.parent = None;
        node.siblings = Sides::default();
        Detached {
            node: id,
            parent,
            neighbors,
        }
    }

    /// Disowns `id` and releases it with its whole subtree.
    pub fn remove(&mut self, id: NodeId) -> Detached {
        let detached = self.disown(id);
        self.release(id);
        detached
    }

    /// Frees `id` and its descendants. Their handles stop resolving.
    pub fn release(&mut self, id: NodeId) {
        let children: Vec<NodeId> = self.children(id).collect();
        for child in children {
            self.release(child);
        }
        self.nodes.remove(id.0);
    }

    /// Marks `id` and every ancestor as needing a layout refresh.
    pub fn bubble_reflow(&mut self, id: NodeId) {
        for node in self.ancestors(id) {
            self.node_mut(node).needs_reflow = true;
        }
    }

    /// Tells both neighbours of a freshly inserted node that it arrived.
    pub fn sibling_created(&mut self, id: NodeId) {
        for dir in Direction::BOTH {
            if let Some(neighbor) = self.sibling(id, dir) {
                trace!(?neighbor, created = ?id, side = ?dir.opposite(), "sibling created");
                self.node_mut(neighbor).needs_reflow = true;
            }
        }
    }

    pub fn needs_reflow(&self, id: NodeId) -> bool {
        self.node(id).needs_reflow
    }

    pub fn clear_reflow(&mut self) {
        for node in self.nodes.values_mut() {
            node.needs_reflow = false;
        }
    }
}

pub struct Children<'a> {
    tree: &'a Tree,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.sibling(current, Direction::Right);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbol(tree: &mut Tree, ch: char) -> NodeId {
        tree.alloc(NodeKind::Symbol(Symbol::new(ch.to_string(), ch.to_string())))
    }

    fn latex_of(tree: &Tree, parent: NodeId) -> String {
        tree.children(parent)
            .map(|child| match tree.kind(child) {
                NodeKind::Symbol(symbol) => symbol.latex.clone(),
                _ => String::new(),
            })
            .collect()
    }

    #[test]
    fn adopt_links_siblings_and_ends() {
        let mut tree = Tree::new(NodeKind::Block(BlockKind::Math));
        let root = tree.root();
        let a = symbol(&mut tree, 'a');
        let c = symbol(&mut tree, 'c');
        tree.adopt_at_end(a, root, Direction::Right);
        tree.adopt_at_end(c, root, Direction::Right);

        let b = symbol(&mut tree, 'b');
        tree.adopt(b, root, Sides::new(Some(a), Some(c)));

        assert_eq!(latex_of(&tree, root), "abc");
        assert_eq!(tree.end(root, Direction::Left), Some(a));
        assert_eq!(tree.end(root, Direction::Right), Some(c));
        assert_eq!(tree.sibling(b, Direction::Left), Some(a));
        assert_eq!(tree.sibling(b, Direction::Right), Some(c));
    }

    #[test]
    fn disown_reports_neighbors_and_relinks() {
        let mut tree = Tree::new(NodeKind::Block(BlockKind::Math));
        let root = tree.root();
        let nodes: Vec<NodeId> = "xyz".chars().map(|ch| symbol(&mut tree, ch)).collect();
        for node in &nodes {
            tree.adopt_at_end(*node, root, Direction::Right);
        }

        let detached = tree.disown(nodes[1]);
        assert_eq!(detached.parent, root);
        assert_eq!(detached.neighbors, Sides::new(Some(nodes[0]), Some(nodes[2])));
        assert_eq!(latex_of(&tree, root), "xz");
        assert!(tree.is_live(nodes[1]));

        tree.remove(nodes[0]);
        assert_eq!(tree.end(root, Direction::Left), Some(nodes[2]));
        assert!(!tree.is_live(nodes[0]));
    }

    #[test]
    fn released_slot_is_reused_without_aliasing() {
        let mut tree = Tree::new(NodeKind::Block(BlockKind::Math));
        let root = tree.root();
        let a = symbol(&mut tree, 'a');
        tree.adopt_at_end(a, root, Direction::Right);
        tree.remove(a);

        let b = symbol(&mut tree, 'b');
        assert_ne!(a, b);
        assert!(!tree.is_live(a));
        assert!(tree.is_live(b));
        assert_eq!(tree.slots(), 2);
        assert_eq!(tree.live_count(), 2);
    }

    #[test]
    fn bubble_reflow_marks_ancestors() {
        let mut tree = Tree::new(NodeKind::Block(BlockKind::Math));
        let root = tree.root();
        let command = tree.alloc(NodeKind::ModeSwitch);
        let block = tree.alloc(NodeKind::Block(BlockKind::ModeSwitch));
        tree.adopt_at_end(command, root, Direction::Right);
        tree.adopt_at_end(block, command, Direction::Right);

        tree.bubble_reflow(block);
        assert!(tree.needs_reflow(root));
        assert!(tree.needs_reflow(command));

        tree.clear_reflow();
        assert!(!tree.needs_reflow(root));
    }
}
