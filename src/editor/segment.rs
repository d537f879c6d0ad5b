use tracing::{debug, trace};

use super::Editor;
use super::content::{char_len, char_to_byte_idx, end_char, insert_at_end, take_end_char};
use super::direction::{Direction, Sides};
use super::surface::RunId;
use super::tree::{NodeId, NodeKind};

/// A nonempty run of characters inside a text region, mirrored by one surface run.
#[derive(Debug)]
pub struct TextSegment {
    pub(crate) text: String,
    pub(crate) run: RunId,
}

impl TextSegment {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn run(&self) -> RunId {
        self.run
    }

    pub fn len(&self) -> usize {
        char_len(&self.text)
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl Editor {
    pub(crate) fn new_segment(&mut self, text: &str) -> NodeId {
        assert!(!text.is_empty(), "text segments are never empty");
        let run = self.surface.create_run(text);
        self.tree.alloc(NodeKind::Segment(TextSegment {
            text: text.to_string(),
            run,
        }))
    }

    pub(crate) fn segment(&self, node: NodeId) -> &TextSegment {
        self.tree
            .segment(node)
            .unwrap_or_else(|| panic!("node {node:?} is not a text segment"))
    }

    fn segment_mut(&mut self, node: NodeId) -> &mut TextSegment {
        self.tree
            .segment_mut(node)
            .unwrap_or_else(|| panic!("node {node:?} is not a text segment"))
    }

    pub(crate) fn segment_append(&mut self, node: NodeId, text: &str) {
        self.segment_insert_at_end(node, text, Direction::Right);
    }

    pub(crate) fn segment_prepend(&mut self, node: NodeId, text: &str) {
        self.segment_insert_at_end(node, text, Direction::Left);
    }

    /// Adds a character crossing the cursor to the `dir` end of `from`, the
    /// segment on the far side of the gap.
    fn segment_migrate(&mut self, from: NodeId, ch: char, dir: Direction) {
        let text = ch.to_string();
        match dir {
            Direction::Right => self.segment_append(from, &text),
            Direction::Left => self.segment_prepend(from, &text),
        }
    }

    fn segment_insert_at_end(&mut self, node: NodeId, text: &str, dir: Direction) {
        let segment = self.segment_mut(node);
        insert_at_end(&mut segment.text, text, dir);
        let run = segment.run;
        match dir {
            Direction::Left => self.surface.insert_data(run, 0, text),
            Direction::Right => self.surface.append_data(run, text),
        }
    }

    /// Splits `node` so it keeps `[0, offset)` and returns a new right sibling
    /// holding the rest.
    pub(crate) fn segment_split_at(&mut self, node: NodeId, offset: usize) -> NodeId {
        let segment = self.segment(node);
        let len = segment.len();
        assert!(
            0 < offset && offset < len,
            "split offset {offset} outside 1..{len}"
        );
        let run = segment.run;
        let byte = char_to_byte_idx(&segment.text, offset);
        let tail_text = self.segment_mut(node).text.split_off(byte);
        let tail_run = self.surface.split_run(run, offset);
        let tail = self.tree.alloc(NodeKind::Segment(TextSegment {
            text: tail_text,
            run: tail_run,
        }));

        let parent = self
            .tree
            .parent(node)
            .unwrap_or_else(|| panic!("cannot split detached segment {node:?}"));
        let right = self.tree.sibling(node, Direction::Right);
        self.tree.adopt(tail, parent, Sides::new(Some(node), right));

        // Gaps that sat right of `node` now sit right of the tail.
        if self.cursor[Direction::Left] == Some(node) {
            self.cursor[Direction::Left] = Some(tail);
        }
        if let Some(anticursor) = self.cursor.anticursor.as_mut() {
            if anticursor[Direction::Left] == Some(node) {
                anticursor[Direction::Left] = Some(tail);
            }
        }
        debug!(?node, ?tail, offset, "split text segment");
        tail
    }

    fn segment_end_char(&self, node: NodeId, dir: Direction) -> char {
        end_char(&self.segment(node).text, dir)
            .unwrap_or_else(|| panic!("text segment {node:?} is empty"))
    }

    /// Steps the cursor one character across `node`, which is `cursor[dir]`.
    pub(crate) fn segment_move_towards(&mut self, node: NodeId, dir: Direction) {
        let ch = self.segment_end_char(node, dir.opposite());
        let from = self
            .tree
            .sibling(node, dir.opposite())
            .filter(|from| self.tree.is_segment(*from));
        match from {
            Some(from) => self.segment_migrate(from, ch, dir),
            None => {
                let created = self.new_segment(&ch.to_string());
                self.create_dir_of_cursor(created, dir.opposite());
            }
        }
        trace!(?node, ?dir, %ch, "moved across character");
        self.segment_delete_towards(node, dir);
    }

    /// Removes the character of `node` adjacent to the cursor, dropping the
    /// segment once its last character goes.
    pub(crate) fn segment_delete_towards(&mut self, node: NodeId, dir: Direction) -> char {
        let len = self.segment(node).len();
        let ch = if len > 1 {
            let segment = self.segment_mut(node);
            let ch = take_end_char(&mut segment.text, dir.opposite())
                .unwrap_or_else(|| panic!("text segment {node:?} is empty"));
            let run = segment.run;
            let offset = match dir {
                Direction::Right => 0,
                Direction::Left => len - 1,
            };
            self.surface.delete_data(run, offset, 1);
            ch
        } else {
            let ch = self.segment_end_char(node, dir);
            let detached = self.remove_node(node);
            self.relink_gaps(&detached);
            ch
        };
        self.aria.queue(ch.to_string());
        ch
    }

    /// Extends the selection by one character of `node`, which is `cursor[dir]`.
    pub(crate) fn segment_select_towards(&mut self, node: NodeId, dir: Direction) {
        let ch = self.segment_end_char(node, dir.opposite());
        let anticursor = self
            .cursor
            .anticursor
            .unwrap_or_else(|| panic!("selecting without an anticursor"));

        if anticursor[dir] == Some(node) {
            let created = self.new_segment(&ch.to_string());
            self.create_dir_of_cursor(created, dir);
            if let Some(anticursor) = self.cursor.anticursor.as_mut() {
                anticursor[dir] = Some(created);
            }
            self.ins_dir_of(dir, created);
        } else {
            let from = self
                .tree
                .sibling(node, dir.opposite())
                .filter(|from| self.tree.is_segment(*from));
            match from {
                Some(from) => self.segment_migrate(from, ch, dir),
                None => {
                    let created = self.new_segment(&ch.to_string());
                    self.create_dir_of_cursor(created, dir.opposite());
                }
            }

            if self.segment(node).len() == 1 && anticursor[dir.opposite()] == Some(node) {
                let beyond = self.tree.sibling(node, dir.opposite());
                if let Some(anticursor) = self.cursor.anticursor.as_mut() {
                    anticursor[dir.opposite()] = beyond;
                }
            }
        }
        trace!(?node, ?dir, %ch, "selected character");
        self.segment_delete_towards(node, dir);
    }

    /// Writes `ch` at the cursor, which must sit inside a text region.
    pub(crate) fn segment_write_char(&mut self, ch: char) {
        let left = self.cursor[Direction::Left].filter(|left| self.tree.is_segment(*left));
        match left {
            Some(left) => self.segment_append(left, &ch.to_string()),
            None => {
                let created = self.new_segment(&ch.to_string());
                self.create_left_of_cursor(created);
            }
        }
    }
}

#[cfg(test)]
#[path = "segment_tests.rs"]
mod segment_tests;
