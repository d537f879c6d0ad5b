//! The mode-switch command: a math expression embedded in text, toggled by `$`.
//!
//! Character writes are dispatched on the kind of block holding the cursor.

use tracing::debug;

use super::Editor;
use super::cursor::Point;
use super::direction::{Direction, Sides};
use super::latex::{text_symbol, typed_math_symbol};
use super::tree::{NodeId, NodeKind};

pub const MODE_SWITCH_CHAR: char = '$';

/// Tag of a math block, selecting how it handles written characters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockKind {
    /// Root block of a math field.
    Math,
    /// Body of a mode-switch command.
    ModeSwitch,
}

pub(crate) trait WriteHandler {
    fn write(&self, editor: &mut Editor, ch: char);
}

struct MathBlockWrite;
struct ModeSwitchWrite;
struct RegionWrite;
struct RootTextWrite;

/// The write behaviour of a block, or `None` for nodes that never hold the cursor.
pub(crate) fn write_handler(kind: &NodeKind) -> Option<&'static dyn WriteHandler> {
    match kind {
        NodeKind::Block(BlockKind::Math) => Some(&MathBlockWrite),
        NodeKind::Block(BlockKind::ModeSwitch) => Some(&ModeSwitchWrite),
        NodeKind::Region(_) => Some(&RegionWrite),
        NodeKind::RootText => Some(&RootTextWrite),
        _ => None,
    }
}

impl WriteHandler for MathBlockWrite {
    fn write(&self, editor: &mut Editor, ch: char) {
        if ch == MODE_SWITCH_CHAR {
            let style = editor.options.styles.plain();
            editor.create_region(style);
        } else {
            editor.write_symbol(typed_math_symbol(ch));
        }
    }
}

impl WriteHandler for ModeSwitchWrite {
    fn write(&self, editor: &mut Editor, ch: char) {
        if ch != MODE_SWITCH_CHAR {
            return MathBlockWrite.write(editor, ch);
        }
        let block = editor.cursor.parent();
        let command = editor.command_of(block);
        if editor.tree.is_empty(block) {
            editor.ins_right_of(command);
            editor.mode_switch_delete_towards(command, Direction::Left);
            editor.cursor.show();
            editor.write_literal_mode_switch();
        } else if editor.cursor[Direction::Right].is_none() {
            editor.ins_right_of(command);
        } else if editor.cursor[Direction::Left].is_none() {
            editor.ins_left_of(command);
        } else {
            MathBlockWrite.write(editor, ch);
        }
    }
}

impl WriteHandler for RegionWrite {
    fn write(&self, editor: &mut Editor, ch: char) {
        editor.cursor.show();
        editor.discard_selection();
        if ch == MODE_SWITCH_CHAR {
            editor.create_mode_switch();
        } else {
            editor.segment_write_char(ch);
        }
    }
}

impl WriteHandler for RootTextWrite {
    fn write(&self, editor: &mut Editor, ch: char) {
        editor.cursor.show();
        editor.discard_selection();
        if ch == MODE_SWITCH_CHAR {
            editor.create_mode_switch();
        } else {
            editor.write_symbol(text_symbol(ch));
        }
    }
}

impl Editor {
    pub(crate) fn command_of(&self, block: NodeId) -> NodeId {
        self.tree
            .parent(block)
            .unwrap_or_else(|| panic!("mode-switch block {block:?} has no command"))
    }

    pub(crate) fn block_of(&self, command: NodeId) -> NodeId {
        self.tree
            .end(command, Direction::Left)
            .unwrap_or_else(|| panic!("mode-switch command {command:?} has no block"))
    }

    /// Inserts an empty embedded expression at the cursor and moves into it.
    pub(crate) fn create_mode_switch(&mut self) -> NodeId {
        let command = self.tree.alloc(NodeKind::ModeSwitch);
        let block = self.tree.alloc(NodeKind::Block(BlockKind::ModeSwitch));
        self.tree.adopt_at_end(block, command, Direction::Right);
        self.create_left_of_cursor(command);
        self.tree.sibling_created(command);
        self.tree.bubble_reflow(command);
        self.ins_at_right_end(block);
        debug!(?command, "opened embedded math");
        command
    }

    /// Writes a `$` that stays literal: plain text inside a region, an escaped
    /// symbol elsewhere.
    fn write_literal_mode_switch(&mut self) {
        if self.tree.is_region(self.cursor.parent()) {
            self.segment_write_char(MODE_SWITCH_CHAR);
        } else {
            self.write_symbol(text_symbol(MODE_SWITCH_CHAR));
        }
    }

    pub(crate) fn mode_switch_move_towards(&mut self, command: NodeId, dir: Direction) {
        let block = self.block_of(command);
        self.ins_at_dir_end(dir.opposite(), block);
        let speech = self.speech_of(block);
        self.aria.queue_dir_end_of(dir.opposite()).queue(speech);
    }

    pub(crate) fn mode_switch_unselect_into(&mut self, command: NodeId, dir: Direction) {
        let block = self.block_of(command);
        self.ins_at_dir_end(dir.opposite(), block);
    }

    pub(crate) fn mode_switch_delete_towards(&mut self, command: NodeId, dir: Direction) {
        if self.tree.is_empty(self.block_of(command)) {
            let detached = self.remove_node(command);
            self.cursor[dir] = detached.neighbors[dir];
            self.aria.queue("math");
        } else {
            self.mode_switch_move_towards(command, dir);
        }
    }

    pub(crate) fn mode_switch_move_out_of(&mut self, block: NodeId, dir: Direction) {
        let command = self.command_of(block);
        self.ins_dir_of(dir, command);
        let speech = self.speech_of(block);
        self.aria.queue_dir_of(dir).queue(speech);
    }

    pub(crate) fn mode_switch_select_out_of(&mut self, block: NodeId, dir: Direction) {
        let command = self.command_of(block);
        self.ins_dir_of(dir, command);
    }

    /// Backspace at the edge of an embedded expression. Inside a region the
    /// cursor steps out; elsewhere the expression's symbols replace it.
    pub(crate) fn mode_switch_delete_out_of(&mut self, block: NodeId, dir: Direction) {
        let command = self.command_of(block);
        let outer = self
            .tree
            .parent(command)
            .unwrap_or_else(|| panic!("mode-switch command {command:?} is detached"));

        if !self.tree.is_region(outer) {
            self.unwrap_mode_switch(command);
        } else if self.tree.is_empty(block) {
            let detached = self.remove_node(command);
            self.relocate(Point {
                parent: outer,
                sides: detached.neighbors,
            });
        } else {
            self.ins_dir_of(dir, command);
        }
    }

    /// Replaces `command` by its block's children, keeping the cursor between
    /// the same neighbours.
    pub(crate) fn unwrap_mode_switch(&mut self, command: NodeId) {
        let block = self.block_of(command);
        let children: Vec<NodeId> = self.tree.children(block).collect();
        let cursor_sides = if self.cursor.parent() == block {
            self.cursor.point().sides
        } else {
            Sides::default()
        };

        let detached = self.tree.disown(command);
        let outer = detached.parent;
        let right_of = detached.neighbors[Direction::Right];
        let mut previous = detached.neighbors[Direction::Left];
        for child in children {
            self.tree.disown(child);
            self.tree.adopt(child, outer, Sides::new(previous, right_of));
            previous = Some(child);
        }
        self.release_subtree(command);

        let left = cursor_sides[Direction::Left].or(detached.neighbors[Direction::Left]);
        let right = cursor_sides[Direction::Right].or(right_of);
        self.relocate(Point::new(outer, left, right));
        self.tree.bubble_reflow(outer);
        debug!(?command, "unwrapped embedded math");
    }
}

#[cfg(test)]
#[path = "mode_switch_tests.rs"]
mod mode_switch_tests;
