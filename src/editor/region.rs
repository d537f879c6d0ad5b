use tracing::debug;
use unicode_width::UnicodeWidthChar;

use super::Editor;
use super::content::end_char;
use super::cursor::{Fragment, Point};
use super::direction::{Direction, Sides};
use super::error::LatexError;
use super::latex::{BodyPiece, escape_text, parse_region_argument};
use super::layout;
use super::segment::TextSegment;
use super::styles::TextStyle;
use super::surface::{ContainerId, MirrorItem};
use super::tree::{Detached, NodeId, NodeKind};

/// A run of styled plain text: a sequence of segments, possibly interleaved
/// with embedded math, mirrored by one surface container.
#[derive(Debug)]
pub struct TextRegion {
    pub(crate) style: TextStyle,
    pub(crate) container: ContainerId,
    pub(crate) pending_import: Option<String>,
    pub(crate) pending_anticursor_offset: Option<usize>,
}

impl TextRegion {
    pub fn style(&self) -> TextStyle {
        self.style
    }

    pub fn container(&self) -> ContainerId {
        self.container
    }
}

/// Content a new region takes over from whatever it replaces.
#[derive(Debug)]
pub enum PriorContent {
    Removed(Fragment),
    Text(String),
}

impl Editor {
    pub(crate) fn new_region(&mut self, style: TextStyle) -> NodeId {
        let container = self.surface.create_container();
        self.tree.alloc(NodeKind::Region(TextRegion {
            style,
            container,
            pending_import: None,
            pending_anticursor_offset: None,
        }))
    }

    fn region(&self, region: NodeId) -> &TextRegion {
        self.tree
            .region(region)
            .unwrap_or_else(|| panic!("node {region:?} is not a text region"))
    }

    fn region_mut(&mut self, region: NodeId) -> &mut TextRegion {
        self.tree
            .region_mut(region)
            .unwrap_or_else(|| panic!("node {region:?} is not a text region"))
    }

    /// Builds a detached region from a braced argument such as `{a\{b\}}`.
    pub fn region_from_latex(
        &mut self,
        style: TextStyle,
        source: &str,
    ) -> Result<NodeId, LatexError> {
        let body = parse_region_argument(source, &self.options.styles)?;
        Ok(self.build_region(style, &body))
    }

    pub(crate) fn build_region(&mut self, style: TextStyle, body: &[BodyPiece]) -> NodeId {
        let region = self.new_region(style);
        for piece in body {
            match piece {
                BodyPiece::Text(text) if text.is_empty() => {}
                BodyPiece::Text(text) => {
                    let segment = self.new_segment(text);
                    self.tree.adopt_at_end(segment, region, Direction::Right);
                    self.mirror_attach(segment);
                }
                BodyPiece::Math(items) => {
                    let command = self.build_mode_switch(items);
                    self.tree.adopt_at_end(command, region, Direction::Right);
                    self.mirror_attach(command);
                }
            }
        }
        region
    }

    /// Records content to replay into the region once it is inserted.
    pub(crate) fn region_replaces(&mut self, region: NodeId, prior: PriorContent) {
        let text = match prior {
            PriorContent::Removed(fragment) => {
                let text = self.fragment_text(&fragment);
                self.release_fragment(fragment);
                text
            }
            PriorContent::Text(text) => text,
        };
        self.region_mut(region).pending_import = Some(text);
    }

    /// Inserts `region` left of the cursor and moves the cursor to its right end,
    /// replaying any recorded content as typed characters.
    pub(crate) fn region_create_left_of(&mut self, region: NodeId) {
        self.create_left_of_cursor(region);
        self.ins_at_right_end(region);

        if let Some(text) = self.region_mut(region).pending_import.take() {
            for ch in text.chars() {
                self.segment_write_char(ch);
            }
        }

        self.tree.sibling_created(region);
        self.tree.bubble_reflow(region);
        debug!(?region, style = self.region(region).style.control_sequence, "created text region");
    }

    /// Concatenated text of the region's segments, embedded math excluded.
    pub fn text_contents(&self, region: NodeId) -> String {
        self.tree
            .children(region)
            .filter_map(|child| self.tree.segment(child))
            .map(|segment| segment.text.as_str())
            .collect()
    }

    pub(crate) fn region_latex(&self, region: NodeId) -> String {
        if self.tree.is_empty(region) {
            return String::new();
        }
        let mut body = String::new();
        for child in self.tree.children(region) {
            match self.tree.segment(child) {
                Some(segment) => body.push_str(&escape_text(&segment.text)),
                None => {
                    body.push('$');
                    body.push_str(&self.latex_of(child));
                    body.push('$');
                }
            }
        }
        format!("{}{{{}}}", self.region(region).style.control_sequence, body)
    }

    pub(crate) fn region_speech(&self, region: NodeId) -> String {
        let text = self.text_contents(region);
        if self.options.speech_shorthand {
            text
        } else {
            let style = self.region(region).style;
            format!("{}, {}, {}", style.speech_start(), text, style.speech_end())
        }
    }

    /// End-of-edit hook: drops an empty region or fuses its segments.
    pub(crate) fn region_blur(&mut self, region: NodeId) {
        if !self.tree.is_live(region) || self.tree.parent(region).is_none() {
            return;
        }
        if self.tree.is_empty(region) {
            let detached = self.remove_node(region);
            self.relink_gaps(&detached);
            debug!(?region, "removed empty text region");
        } else {
            self.region_fuse(region);
        }
    }

    /// Moves gaps that touched or sat inside a removed node to where it was.
    pub(crate) fn relink_gaps(&mut self, detached: &Detached) {
        let mut points = vec![&mut self.cursor.point];
        if let Some(anticursor) = self.cursor.anticursor.as_mut() {
            points.push(anticursor);
        }
        for point in points {
            if point.parent == detached.node {
                *point = Point {
                    parent: detached.parent,
                    sides: detached.neighbors,
                };
                continue;
            }
            for dir in Direction::BOTH {
                if point[dir] == Some(detached.node) {
                    point[dir] = detached.neighbors[dir];
                }
            }
        }
    }

    /// Collapses every stretch of adjacent segments into one fresh segment
    /// bound to the stretch's merged surface run.
    pub(crate) fn region_fuse(&mut self, region: NodeId) {
        let container = self.region(region).container;
        // A parked anticursor keeps its recorded offset.
        let anchored = self
            .cursor
            .anticursor
            .filter(|anticursor| anticursor.parent == region)
            .map(|anticursor| {
                self.region(region)
                    .pending_anticursor_offset
                    .unwrap_or_else(|| self.text_offset_of(&anticursor))
            });

        self.surface.normalize(container);
        let embeds = self
            .tree
            .children(region)
            .any(|child| !self.tree.is_segment(child));
        if !embeds {
            self.surface.single_run(container);
        }

        let mut stretches: Vec<Vec<NodeId>> = Vec::new();
        let mut current = Vec::new();
        for child in self.tree.children(region) {
            if self.tree.is_segment(child) {
                current.push(child);
            } else if !current.is_empty() {
                stretches.push(std::mem::take(&mut current));
            }
        }
        if !current.is_empty() {
            stretches.push(current);
        }

        for stretch in &stretches {
            let first = stretch[0];
            let last = stretch[stretch.len() - 1];
            let run = self.segment(first).run;
            assert!(
                self.surface.is_live(run),
                "fused run of {first:?} was merged away"
            );
            let neighbors = Sides::new(
                self.tree.sibling(first, Direction::Left),
                self.tree.sibling(last, Direction::Right),
            );
            for segment in stretch {
                self.tree.disown(*segment);
                self.tree.release(*segment);
            }
            let text = self.surface.text(run).to_string();
            let fused = self.tree.alloc(NodeKind::Segment(TextSegment { text, run }));
            self.tree.adopt(fused, region, neighbors);
        }

        match anchored {
            Some(offset) => {
                self.region_mut(region).pending_anticursor_offset = Some(offset);
                let parked = Point::new(region, None, self.tree.end(region, Direction::Left));
                self.cursor.anticursor = Some(parked);
            }
            None => self.region_mut(region).pending_anticursor_offset = None,
        }
        debug!(?region, stretches = stretches.len(), "fused text region");
    }

    /// Characters of segment text left of `point`, which lies in a region.
    pub(crate) fn text_offset_of(&self, point: &Point) -> usize {
        let mut offset = 0;
        let mut current = point[Direction::Left];
        while let Some(node) = current {
            if let Some(segment) = self.tree.segment(node) {
                offset += segment.len();
            }
            current = self.tree.sibling(node, Direction::Left);
        }
        offset
    }

    /// The gap `offset` characters into the region's text, splitting a segment
    /// when the offset falls inside one.
    pub(crate) fn point_at_text_offset(&mut self, region: NodeId, offset: usize) -> Point {
        let mut remaining = offset;
        let mut current = self.tree.end(region, Direction::Left);
        while let Some(node) = current {
            if let Some(len) = self.tree.segment(node).map(|segment| segment.len()) {
                if remaining == 0 {
                    return Point::new(region, self.tree.sibling(node, Direction::Left), Some(node));
                }
                if remaining < len {
                    let tail = self.segment_split_at(node, remaining);
                    return Point::new(region, Some(node), Some(tail));
                }
                remaining -= len;
                if remaining == 0 {
                    return Point::new(region, Some(node), self.tree.sibling(node, Direction::Right));
                }
            }
            current = self.tree.sibling(node, Direction::Right);
        }
        Point::new(region, self.tree.end(region, Direction::Right), None)
    }

    /// Puts a parked anticursor back at the offset recorded when its region fused.
    fn restore_anticursor(&mut self, region: NodeId) {
        let parked = self
            .cursor
            .anticursor
            .is_some_and(|anticursor| anticursor.parent == region);
        if !parked {
            return;
        }
        if let Some(offset) = self.region_mut(region).pending_anticursor_offset.take() {
            let point = self.point_at_text_offset(region, offset);
            self.cursor.anticursor = Some(point);
        }
    }

    pub(crate) fn region_move_towards(&mut self, region: NodeId, dir: Direction) {
        self.ins_at_dir_end(dir.opposite(), region);
        let speech = self.region_speech(region);
        self.aria.queue_dir_end_of(dir.opposite()).queue(speech);
        self.restore_anticursor(region);
    }

    pub(crate) fn region_unselect_into(&mut self, region: NodeId, dir: Direction) {
        self.region_move_towards(region, dir);
    }

    pub(crate) fn region_move_out_of(&mut self, region: NodeId, dir: Direction) {
        let speech = self.region_speech(region);
        self.ins_dir_of(dir, region);
        self.aria.queue_dir_of(dir).queue(speech);
    }

    pub(crate) fn region_select_out_of(&mut self, region: NodeId, dir: Direction) {
        self.ins_dir_of(dir, region);
    }

    pub(crate) fn region_delete_towards(&mut self, region: NodeId, dir: Direction) {
        if self.tree.is_empty(region) {
            let detached = self.remove_node(region);
            self.cursor[dir] = detached.neighbors[dir];
        } else {
            self.region_move_towards(region, dir);
        }
    }

    /// Only an empty region is left by deleting; blurring it then removes it.
    pub(crate) fn region_delete_out_of(&mut self, region: NodeId) {
        if self.tree.is_empty(region) {
            self.ins_right_of(region);
        }
    }

    /// Places the cursor in `region` nearest to terminal column `column`.
    pub(crate) fn region_seek(&mut self, region: NodeId, column: usize) {
        self.cursor.hide();
        let was_inside = self.cursor.parent() == region;
        // Leaving the cursor's current block blurs it, fusing this region if
        // the cursor was inside.
        self.ins_left_of(region);
        if !self.tree.is_live(region) {
            return;
        }
        if !was_inside {
            self.region_fuse(region);
        }

        let layout = layout::measure(self);
        let extent = layout.extent(region);
        if column < extent.start {
            self.ins_at_left_end(region);
        } else if column >= extent.end {
            self.ins_at_right_end(region);
        } else {
            let target = self
                .tree
                .children(region)
                .find(|child| layout.extent(*child).contains(column));
            match target {
                Some(child) if self.tree.is_segment(child) => {
                    let child_extent = layout.extent(child);
                    let len = self.segment(child).len();
                    let average = child_extent.width() as f64 / len as f64;
                    let approx = ((column - child_extent.start) as f64 / average).round() as usize;
                    if approx == 0 {
                        self.ins_left_of(child);
                    } else if approx >= len {
                        self.ins_right_of(child);
                    } else {
                        let tail = self.segment_split_at(child, approx);
                        self.relocate(Point::new(region, Some(child), Some(tail)));
                    }
                }
                Some(child) => {
                    let child_extent = layout.extent(child);
                    if column - child_extent.start < child_extent.end - column {
                        self.ins_left_of(child);
                    } else {
                        self.ins_right_of(child);
                    }
                }
                None => self.ins_at_right_end(region),
            }
        }

        let gap = layout::measure(self).gap_column(&self.cursor.point());
        self.refine_seek(column, gap);
        self.restore_anticursor(region);
        self.cursor.show();
    }

    /// Walks the cursor character by character toward `column` while that
    /// shrinks the distance.
    fn refine_seek(&mut self, column: usize, mut gap: usize) {
        let mut displacement = column as isize - gap as isize;
        let dir = if displacement < 0 {
            Direction::Left
        } else {
            Direction::Right
        };
        let sign: isize = match dir {
            Direction::Left => -1,
            Direction::Right => 1,
        };
        let mut previous = sign;
        while displacement * previous > 0 {
            let Some(next) = self.cursor[dir].filter(|node| self.tree.is_segment(*node)) else {
                break;
            };
            let width = self.crossed_width(next, dir);
            self.segment_move_towards(next, dir);
            gap = match dir {
                Direction::Left => gap.saturating_sub(width),
                Direction::Right => gap + width,
            };
            previous = displacement;
            displacement = column as isize - gap as isize;
        }
        if sign * displacement < -sign * previous {
            if let Some(back) = self.cursor[dir.opposite()].filter(|node| self.tree.is_segment(*node)) {
                self.segment_move_towards(back, dir.opposite());
            }
        }
        self.aria.clear();
    }

    fn crossed_width(&self, segment: NodeId, dir: Direction) -> usize {
        end_char(&self.segment(segment).text, dir.opposite())
            .and_then(UnicodeWidthChar::width)
            .unwrap_or(0)
    }

    pub(crate) fn mirror_item(&self, node: NodeId) -> MirrorItem {
        match self.tree.segment(node) {
            Some(segment) => MirrorItem::Run(segment.run),
            None => MirrorItem::Embed(node),
        }
    }

    /// Places an attached node's mirror item in its region's container.
    pub(crate) fn mirror_attach(&mut self, node: NodeId) {
        let Some(parent) = self.tree.parent(node) else {
            return;
        };
        let Some(container) = self.tree.region(parent).map(|region| region.container) else {
            return;
        };
        let item = self.mirror_item(node);
        let before = self
            .tree
            .sibling(node, Direction::Right)
            .map(|sibling| self.mirror_item(sibling));
        self.surface.insert(container, item, before);
    }

    /// Takes a still-attached node's mirror item out of its region's container.
    pub(crate) fn mirror_detach(&mut self, node: NodeId) {
        let Some(parent) = self.tree.parent(node) else {
            return;
        };
        let Some(container) = self.tree.region(parent).map(|region| region.container) else {
            return;
        };
        let item = self.mirror_item(node);
        self.surface.remove(container, item);
    }
}

#[cfg(test)]
#[path = "region_tests.rs"]
mod region_tests;
