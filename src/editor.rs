//! Editable math and text fields.
//!
//! An [`Editor`] owns one document tree, the visual mirror of its text
//! regions and a cursor. Every public operation runs to completion and leaves
//! the tree, the mirror and the cursor consistent with each other.

use tracing::{debug, warn};

mod arena;
mod aria;
mod content;
mod cursor;
mod direction;
mod error;
pub mod latex;
pub mod layout;
mod mode_switch;
mod options;
mod region;
mod segment;
mod styles;
mod surface;
mod tree;

pub use aria::Aria;
pub use cursor::{Cursor, Fragment, Point, Selection};
pub use direction::{Direction, Sides};
pub use error::LatexError;
pub use mode_switch::{BlockKind, MODE_SWITCH_CHAR};
pub use options::EditorOptions;
pub use region::{PriorContent, TextRegion};
pub use segment::TextSegment;
pub use styles::{StyleRegistry, TextStyle};
pub use surface::{ContainerId, MirrorItem, RunId, Surface};
pub use tree::{Detached, NodeId, NodeKind, Symbol, Tree};

use latex::{MathItem, TextItem, escape_html, escape_text, join_latex, text_symbol};
use mode_switch::write_handler;

/// Which grammar the root of a field speaks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Math,
    Text,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Left,
    Right,
    ShiftLeft,
    ShiftRight,
    Home,
    End,
    ShiftHome,
    ShiftEnd,
    Backspace,
    Delete,
    SelectAll,
    Spacebar,
    ShiftSpacebar,
}

#[derive(Debug)]
pub struct Editor {
    pub(crate) tree: Tree,
    pub(crate) surface: Surface,
    pub(crate) cursor: Cursor,
    pub(crate) aria: Aria,
    pub(crate) options: EditorOptions,
    kind: FieldKind,
    blurred: bool,
}

impl Editor {
    pub fn math_field(options: EditorOptions) -> Self {
        Self::new(FieldKind::Math, options)
    }

    pub fn text_field(options: EditorOptions) -> Self {
        Self::new(FieldKind::Text, options)
    }

    fn new(kind: FieldKind, options: EditorOptions) -> Self {
        let root = match kind {
            FieldKind::Math => NodeKind::Block(BlockKind::Math),
            FieldKind::Text => NodeKind::RootText,
        };
        let tree = Tree::new(root);
        let cursor = Cursor::new(tree.root());
        Self {
            tree,
            surface: Surface::new(),
            cursor,
            aria: Aria::new(),
            options,
            kind,
            blurred: false,
        }
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    pub fn options(&self) -> &EditorOptions {
        &self.options
    }

    /// The most recent accessibility announcement.
    pub fn last_alert(&self) -> Option<&str> {
        self.aria.last_alert()
    }

    pub fn focus(&mut self) {
        self.blurred = false;
        self.cursor.show();
    }

    /// Hides the cursor. Regions keep their segments until the cursor leaves them.
    pub fn blur(&mut self) {
        self.blurred = true;
        self.cursor.hide();
    }

    pub fn is_blurred(&self) -> bool {
        self.blurred
    }

    /// Handles one editing key. Returns `false` when the key was ignored.
    pub fn keystroke(&mut self, key: Key) -> bool {
        match key {
            Key::Left => self.move_dir(Direction::Left),
            Key::Right => self.move_dir(Direction::Right),
            Key::ShiftLeft => self.select_dir(Direction::Left),
            Key::ShiftRight => self.select_dir(Direction::Right),
            Key::Home => self.move_to_block_end(Direction::Left),
            Key::End => self.move_to_block_end(Direction::Right),
            Key::ShiftHome => self.select_to_block_end(Direction::Left),
            Key::ShiftEnd => self.select_to_block_end(Direction::Right),
            Key::Backspace => self.delete_dir(Direction::Left),
            Key::Delete => self.delete_dir(Direction::Right),
            Key::SelectAll => self.select_all(),
            Key::Spacebar | Key::ShiftSpacebar => {
                if matches!(self.tree.kind(self.cursor.parent()), NodeKind::RootText) {
                    debug!(?key, "whitespace key ignored at text root");
                    return false;
                }
                self.write(' ');
            }
        }
        self.aria.alert();
        true
    }

    pub fn typed_text(&mut self, text: &str) {
        for ch in text.chars() {
            self.write(ch);
        }
    }

    /// Writes one character through the write handler of the cursor's block.
    pub fn write(&mut self, ch: char) {
        let parent = self.cursor.parent();
        let Some(handler) = write_handler(self.tree.kind(parent)) else {
            panic!("cursor parent {parent:?} cannot hold the cursor");
        };
        handler.write(self, ch);
        self.cursor.clear_selection();
        self.end_selection();
    }

    /// Runs a command: a known text control word opens a region of that style
    /// around the selection; any other input is written character by character.
    pub fn cmd(&mut self, input: &str) -> bool {
        let word = input
            .strip_prefix('\\')
            .filter(|word| !word.is_empty() && word.chars().all(|c| c.is_ascii_alphabetic()));
        match word {
            Some(word) => {
                let Some(style) = self.options.styles.lookup(word) else {
                    debug!(command = input, "unknown command");
                    return false;
                };
                if !matches!(self.tree.kind(self.cursor.parent()), NodeKind::Block(_)) {
                    debug!(command = input, "text command outside math");
                    return false;
                }
                self.create_region(style);
                self.cursor.clear_selection();
                self.end_selection();
            }
            None => self.typed_text(input),
        }
        if self.blurred {
            self.cursor.hide();
        }
        true
    }

    pub fn move_dir(&mut self, dir: Direction) {
        if let Some(selection) = self.cursor.selection {
            self.ins_dir_of(dir, selection.ends[dir]);
        } else if let Some(node) = self.cursor[dir] {
            self.move_towards(node, dir);
        } else {
            self.move_out_of(self.cursor.parent(), dir);
        }
        self.cursor.show().clear_selection();
        self.end_selection();
    }

    pub fn select_dir(&mut self, dir: Direction) {
        if self.cursor.anticursor.is_none() {
            self.start_selection();
        }
        match self.cursor[dir] {
            Some(node) => {
                let retracting = self
                    .cursor
                    .selection
                    .is_some_and(|selection| selection.ends[dir] == node)
                    && self
                        .cursor
                        .anticursor
                        .is_some_and(|anticursor| anticursor[dir.opposite()] != Some(node));
                if retracting {
                    self.unselect_into(node, dir);
                } else {
                    self.select_towards(node, dir);
                }
            }
            None => self.select_out_of(self.cursor.parent(), dir),
        }
        self.cursor.clear_selection();
        if !self.select() {
            self.cursor.show();
        }
    }

    pub fn delete_dir(&mut self, dir: Direction) {
        self.cursor.show();
        if self.cursor.selection.is_some() {
            self.discard_selection();
        } else if let Some(node) = self.cursor[dir] {
            self.delete_towards(node, dir);
        } else {
            self.delete_out_of(self.cursor.parent(), dir);
        }
        self.tree.bubble_reflow(self.cursor.parent());
        self.cursor.clear_selection();
        self.end_selection();
    }

    pub fn select_all(&mut self) {
        let root = self.tree.root();
        self.cursor.clear_selection();
        self.end_selection();
        self.ins_at_right_end(root);
        self.start_selection();
        self.ins_at_left_end(root);
        if !self.select() {
            self.cursor.show();
        }
    }

    fn move_to_block_end(&mut self, dir: Direction) {
        let block = self.cursor.parent();
        self.cursor.clear_selection();
        self.ins_at_dir_end(dir, block);
        self.end_selection();
        self.cursor.show();
    }

    fn select_to_block_end(&mut self, dir: Direction) {
        loop {
            self.select_dir(dir);
            if self.cursor[dir].is_none() {
                break;
            }
        }
    }

    /// Pointer press at `column`: places the cursor and anchors a new selection there.
    pub fn seek(&mut self, column: usize) {
        self.cursor.clear_selection();
        self.end_selection();
        self.cursor.show();
        self.seek_to(column);
        self.start_selection();
    }

    /// Pointer drag to `column`: extends the selection anchored by [`Editor::seek`].
    pub fn seek_select(&mut self, column: usize) {
        if self.cursor.anticursor.is_none() {
            self.start_selection();
        }
        self.cursor.clear_selection().show();
        self.seek_to(column);
        if !self.select() {
            self.cursor.show();
        }
    }

    fn seek_to(&mut self, column: usize) {
        let measured = layout::measure(self);
        let mut block = self.tree.root();
        loop {
            let Some(child) = self
                .tree
                .children(block)
                .find(|child| measured.extent(*child).contains(column))
            else {
                break;
            };
            if self.tree.is_region(child) {
                self.region_seek(child, column);
                return;
            }
            if !matches!(self.tree.kind(child), NodeKind::ModeSwitch) {
                break;
            }
            block = self.block_of(child);
        }
        let right = self.tree.children(block).find(|child| {
            let extent = measured.extent(*child);
            extent.start + extent.end > 2 * column
        });
        match right {
            Some(child) => self.ins_left_of(child),
            None => self.ins_at_right_end(block),
        }
    }

    pub(crate) fn start_selection(&mut self) {
        self.forget_parked_anticursor();
        self.cursor.start_selection();
    }

    pub(crate) fn end_selection(&mut self) {
        self.forget_parked_anticursor();
        self.cursor.end_selection();
    }

    /// Drops the offset a fused region recorded for the anticursor it holds.
    fn forget_parked_anticursor(&mut self) {
        let Some(anticursor) = self.cursor.anticursor else {
            return;
        };
        if !self.tree.is_live(anticursor.parent) {
            return;
        }
        if let Some(region) = self.tree.region_mut(anticursor.parent) {
            region.pending_anticursor_offset = None;
        }
    }

    fn move_towards(&mut self, node: NodeId, dir: Direction) {
        match self.tree.kind(node) {
            NodeKind::Segment(_) => self.segment_move_towards(node, dir),
            NodeKind::Region(_) => self.region_move_towards(node, dir),
            NodeKind::ModeSwitch => self.mode_switch_move_towards(node, dir),
            NodeKind::Symbol(symbol) => {
                let speech = symbol.text.clone();
                self.ins_dir_of(dir, node);
                self.aria.queue(speech);
            }
            NodeKind::Block(_) | NodeKind::RootText => {
                panic!("block {node:?} cannot neighbour the cursor")
            }
        }
    }

    fn select_towards(&mut self, node: NodeId, dir: Direction) {
        match self.tree.kind(node) {
            NodeKind::Segment(_) => self.segment_select_towards(node, dir),
            _ => self.ins_dir_of(dir, node),
        }
    }

    fn unselect_into(&mut self, node: NodeId, dir: Direction) {
        match self.tree.kind(node) {
            NodeKind::Region(_) => self.region_unselect_into(node, dir),
            NodeKind::ModeSwitch => self.mode_switch_unselect_into(node, dir),
            _ => self.ins_dir_of(dir, node),
        }
    }

    fn delete_towards(&mut self, node: NodeId, dir: Direction) {
        match self.tree.kind(node) {
            NodeKind::Segment(_) => {
                self.segment_delete_towards(node, dir);
            }
            NodeKind::Region(_) => self.region_delete_towards(node, dir),
            NodeKind::ModeSwitch => self.mode_switch_delete_towards(node, dir),
            NodeKind::Symbol(symbol) => {
                let speech = symbol.text.clone();
                let detached = self.remove_node(node);
                self.cursor[dir] = detached.neighbors[dir];
                self.aria.queue(speech);
            }
            NodeKind::Block(_) | NodeKind::RootText => {
                panic!("block {node:?} cannot neighbour the cursor")
            }
        }
    }

    fn move_out_of(&mut self, block: NodeId, dir: Direction) {
        match self.tree.kind(block) {
            NodeKind::Region(_) => self.region_move_out_of(block, dir),
            NodeKind::Block(BlockKind::ModeSwitch) => self.mode_switch_move_out_of(block, dir),
            _ => {}
        }
    }

    fn select_out_of(&mut self, block: NodeId, dir: Direction) {
        match self.tree.kind(block) {
            NodeKind::Region(_) => self.region_select_out_of(block, dir),
            NodeKind::Block(BlockKind::ModeSwitch) => self.mode_switch_select_out_of(block, dir),
            _ => {}
        }
    }

    fn delete_out_of(&mut self, block: NodeId, dir: Direction) {
        match self.tree.kind(block) {
            NodeKind::Region(_) => self.region_delete_out_of(block),
            NodeKind::Block(BlockKind::ModeSwitch) => self.mode_switch_delete_out_of(block, dir),
            _ => {}
        }
    }

    /// Inserts a math symbol at the cursor, replacing any selection.
    pub(crate) fn write_symbol(&mut self, symbol: Symbol) {
        if let Some(fragment) = self.replace_selection() {
            self.release_fragment(fragment);
        }
        let node = self.tree.alloc(NodeKind::Symbol(symbol));
        self.create_left_of_cursor(node);
        self.tree.sibling_created(node);
        self.tree.bubble_reflow(node);
        self.cursor.show();
    }

    /// Opens a text region at the cursor. A selection becomes its initial text.
    pub(crate) fn create_region(&mut self, style: TextStyle) -> NodeId {
        let region = self.new_region(style);
        if let Some(fragment) = self.replace_selection() {
            self.region_replaces(region, PriorContent::Removed(fragment));
        }
        self.cursor.show();
        self.region_create_left_of(region);
        region
    }

    pub(crate) fn discard_selection(&mut self) {
        if let Some(fragment) = self.delete_selection() {
            self.release_fragment(fragment);
        }
    }

    /// Detaches `node` from its parent and its region's mirror, then releases it.
    pub(crate) fn remove_node(&mut self, node: NodeId) -> Detached {
        self.mirror_detach(node);
        let detached = self.tree.disown(node);
        self.release_subtree(node);
        detached
    }

    /// Releases a detached subtree along with the mirror runs and containers
    /// it still owns.
    pub(crate) fn release_subtree(&mut self, node: NodeId) {
        let mut pending = vec![node];
        while let Some(current) = pending.pop() {
            match self.tree.kind(current) {
                NodeKind::Region(region) => {
                    let container = region.container;
                    self.surface.drop_container(container);
                }
                NodeKind::Segment(segment) => {
                    let run = segment.run;
                    self.surface.release_run(run);
                }
                _ => {}
            }
            pending.extend(self.tree.children(current));
        }
        self.tree.release(node);
    }

    /// Hook run on the block the cursor just left.
    pub(crate) fn blur_block(&mut self, block: NodeId) {
        if self.tree.is_live(block) && self.tree.is_region(block) {
            self.region_blur(block);
        }
    }

    /// Replaces the whole field with `source`. On a parse error the field is unchanged.
    pub fn set_latex(&mut self, source: &str) -> Result<(), LatexError> {
        let root = self.tree.root();
        let built = match self.kind {
            FieldKind::Math => {
                latex::parse_math(source, &self.options.styles).map(ImportedItems::Math)
            }
            FieldKind::Text => {
                latex::parse_text(source, &self.options.styles).map(ImportedItems::Text)
            }
        };
        let imported = built.inspect_err(|err| warn!(%err, "rejected LaTeX import"))?;

        self.cursor.clear_selection();
        self.end_selection();
        self.cursor.point = Point::new(root, None, None);
        let children: Vec<NodeId> = self.tree.children(root).collect();
        for child in children {
            self.tree.disown(child);
            self.release_subtree(child);
        }

        let nodes: Vec<NodeId> = match &imported {
            ImportedItems::Math(items) => items.iter().map(|item| self.build_math_item(item)).collect(),
            ImportedItems::Text(items) => items.iter().map(|item| self.build_text_item(item)).collect(),
        };
        for node in &nodes {
            self.tree.adopt_at_end(*node, root, Direction::Right);
        }
        self.tree.bubble_reflow(root);
        self.ins_at_right_end(root);
        if self.blurred {
            self.cursor.hide();
        } else {
            self.cursor.show();
        }
        debug!(nodes = nodes.len(), "imported LaTeX");
        Ok(())
    }

    fn build_math_item(&mut self, item: &MathItem) -> NodeId {
        match item {
            MathItem::Symbol(symbol) => self.tree.alloc(NodeKind::Symbol(symbol.clone())),
            MathItem::Region { style, body } => self.build_region(*style, body),
        }
    }

    fn build_text_item(&mut self, item: &TextItem) -> NodeId {
        match item {
            TextItem::Char(ch) => self.tree.alloc(NodeKind::Symbol(text_symbol(*ch))),
            TextItem::Math(items) => self.build_mode_switch(items),
        }
    }

    /// A detached embedded expression holding `items`.
    pub(crate) fn build_mode_switch(&mut self, items: &[MathItem]) -> NodeId {
        let command = self.tree.alloc(NodeKind::ModeSwitch);
        let block = self.tree.alloc(NodeKind::Block(BlockKind::ModeSwitch));
        self.tree.adopt_at_end(block, command, Direction::Right);
        for item in items {
            let node = self.build_math_item(item);
            self.tree.adopt_at_end(node, block, Direction::Right);
        }
        command
    }

    pub fn latex(&self) -> String {
        self.latex_of(self.tree.root())
    }

    pub(crate) fn latex_of(&self, node: NodeId) -> String {
        match self.tree.kind(node) {
            NodeKind::Symbol(symbol) => symbol.latex.clone(),
            NodeKind::Segment(segment) => escape_text(&segment.text),
            NodeKind::Region(_) => self.region_latex(node),
            NodeKind::ModeSwitch => self.latex_of(self.block_of(node)),
            NodeKind::Block(_) => join_latex(self.tree.children(node).map(|child| self.latex_of(child))),
            NodeKind::RootText => join_latex(self.tree.children(node).map(|child| {
                match self.tree.kind(child) {
                    NodeKind::ModeSwitch => format!("${}$", self.latex_of(child)),
                    _ => self.latex_of(child),
                }
            })),
        }
    }

    /// Plain text of the field; text regions appear quoted.
    pub fn text(&self) -> String {
        self.text_of(self.tree.root())
    }

    fn text_of(&self, node: NodeId) -> String {
        match self.tree.kind(node) {
            NodeKind::Symbol(symbol) => symbol.text.clone(),
            NodeKind::Segment(segment) => segment.text.clone(),
            NodeKind::Region(_) => format!("\"{}\"", self.children_text(node)),
            _ => self.children_text(node),
        }
    }

    fn children_text(&self, node: NodeId) -> String {
        self.tree.children(node).map(|child| self.text_of(child)).collect()
    }

    pub fn html(&self) -> String {
        self.html_of(self.tree.root())
    }

    fn html_of(&self, node: NodeId) -> String {
        match self.tree.kind(node) {
            NodeKind::Symbol(symbol) => match symbol.html {
                Some(html) => html.to_string(),
                None => escape_html(&symbol.text),
            },
            NodeKind::Segment(segment) => escape_html(&segment.text),
            NodeKind::Region(region) => {
                let style = region.style;
                format!(
                    "<{tag} {attributes}>{body}</{tag}>",
                    tag = style.tag,
                    attributes = style.attributes,
                    body = self.children_html(node),
                )
            }
            NodeKind::ModeSwitch => format!(
                "<span class=\"mq-math-mode\">{}</span>",
                self.html_of(self.block_of(node))
            ),
            NodeKind::Block(_) | NodeKind::RootText => self.children_html(node),
        }
    }

    fn children_html(&self, node: NodeId) -> String {
        self.tree.children(node).map(|child| self.html_of(child)).collect()
    }

    pub fn speech(&self) -> String {
        self.speech_of(self.tree.root())
    }

    pub(crate) fn speech_of(&self, node: NodeId) -> String {
        match self.tree.kind(node) {
            NodeKind::Symbol(symbol) => symbol.text.clone(),
            NodeKind::Segment(segment) => segment.text.clone(),
            NodeKind::Region(_) => self.region_speech(node),
            NodeKind::ModeSwitch => self.speech_of(self.block_of(node)),
            NodeKind::Block(_) | NodeKind::RootText => {
                let parts: Vec<String> = self
                    .tree
                    .children(node)
                    .map(|child| self.speech_of(child))
                    .filter(|part| !part.is_empty())
                    .collect();
                parts.join(" ")
            }
        }
    }
}

enum ImportedItems {
    Math(Vec<MathItem>),
    Text(Vec<TextItem>),
}

#[cfg(test)]
#[path = "editor_tests.rs"]
mod editor_tests;
