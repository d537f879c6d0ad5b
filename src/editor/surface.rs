//! Visual mirror of text regions.
//!
//! Every text region owns one container; every text segment owns one run
//! inside its region's container. Embedded nodes (math inside a region) are
//! represented by placeholders so that run adjacency matches the tree.
//! All offsets are character offsets.

use super::arena::{Arena, Handle};
use super::content::char_to_byte_idx;
use super::tree::NodeId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ContainerId(Handle);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RunId(Handle);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MirrorItem {
    Run(RunId),
    Embed(NodeId),
}

#[derive(Debug)]
struct Run {
    text: String,
    container: Option<ContainerId>,
}

#[derive(Debug, Default)]
struct Container {
    items: Vec<MirrorItem>,
}

/// Released runs and containers free their slots for reuse.
#[derive(Debug, Default)]
pub struct Surface {
    containers: Arena<Container>,
    runs: Arena<Run>,
}

impl Surface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_container(&mut self) -> ContainerId {
        ContainerId(self.containers.insert(Container::default()))
    }

    /// Releases a container and every run still inside it.
    pub fn drop_container(&mut self, container: ContainerId) {
        let Some(dropped) = self.containers.remove(container.0) else {
            return;
        };
        for item in dropped.items {
            if let MirrorItem::Run(run) = item {
                self.runs.remove(run.0);
            }
        }
    }

    pub fn create_run(&mut self, text: &str) -> RunId {
        RunId(self.runs.insert(Run {
            text: text.to_string(),
            container: None,
        }))
    }

    /// Frees a run that is no longer in any container. Released runs are ignored.
    pub fn release_run(&mut self, run: RunId) {
        self.runs.remove(run.0);
    }

    pub fn text(&self, run: RunId) -> &str {
        &self.runs[run.0].text
    }

    pub fn is_live(&self, run: RunId) -> bool {
        self.runs.contains(run.0)
    }

    pub fn items(&self, container: ContainerId) -> &[MirrorItem] {
        &self.containers[container.0].items
    }

    /// Places `item` in `container` just before `before`, or last when `before` is `None`.
    pub fn insert(&mut self, container: ContainerId, item: MirrorItem, before: Option<MirrorItem>) {
        let items = &mut self.containers[container.0].items;
        let index = match before {
            Some(anchor) => items
                .iter()
                .position(|existing| *existing == anchor)
                .unwrap_or_else(|| panic!("mirror anchor {anchor:?} is not in {container:?}")),
            None => items.len(),
        };
        items.insert(index, item);
        if let MirrorItem::Run(run) = item {
            self.runs[run.0].container = Some(container);
        }
    }

    /// Takes `item` out of `container`. Removed runs are released.
    pub fn remove(&mut self, container: ContainerId, item: MirrorItem) {
        self.containers[container.0]
            .items
            .retain(|existing| *existing != item);
        if let MirrorItem::Run(run) = item {
            self.runs.remove(run.0);
        }
    }

    pub fn append_data(&mut self, run: RunId, text: &str) {
        self.runs[run.0].text.push_str(text);
    }

    pub fn insert_data(&mut self, run: RunId, offset: usize, text: &str) {
        let data = &mut self.runs[run.0].text;
        let byte = char_to_byte_idx(data, offset);
        data.insert_str(byte, text);
    }

    pub fn delete_data(&mut self, run: RunId, offset: usize, count: usize) {
        let data = &mut self.runs[run.0].text;
        let start = char_to_byte_idx(data, offset);
        let end = char_to_byte_idx(data, offset + count);
        data.drain(start..end);
    }

    /// Splits `run` at `offset`; the tail becomes a new run placed right after it.
    pub fn split_run(&mut self, run: RunId, offset: usize) -> RunId {
        let data = &mut self.runs[run.0].text;
        let byte = char_to_byte_idx(data, offset);
        let tail = data.split_off(byte);
        let container = self.runs[run.0].container;
        let new = self.create_run(&tail);
        if let Some(container) = container {
            let items = &mut self.containers[container.0].items;
            let index = items
                .iter()
                .position(|item| *item == MirrorItem::Run(run))
                .map_or(items.len(), |index| index + 1);
            items.insert(index, MirrorItem::Run(new));
            self.runs[new.0].container = Some(container);
        }
        new
    }

    /// Merges every group of adjacent runs into its first run and drops empty runs.
    pub fn normalize(&mut self, container: ContainerId) {
        let items = std::mem::take(&mut self.containers[container.0].items);
        let mut normalized: Vec<MirrorItem> = Vec::with_capacity(items.len());
        for item in items {
            match item {
                MirrorItem::Run(run) if self.runs[run.0].text.is_empty() => {
                    self.runs.remove(run.0);
                }
                MirrorItem::Run(run) => match normalized.last() {
                    Some(MirrorItem::Run(previous)) => {
                        let previous = *previous;
                        if let Some(merged) = self.runs.remove(run.0) {
                            self.runs[previous.0].text.push_str(&merged.text);
                        }
                    }
                    _ => normalized.push(item),
                },
                MirrorItem::Embed(_) => normalized.push(item),
            }
        }
        self.containers[container.0].items = normalized;
    }

    /// The only run in `container`, or `None` if it holds no runs.
    ///
    /// Panics when more than one run is present; callers normalize first.
    pub fn single_run(&self, container: ContainerId) -> Option<RunId> {
        let runs: Vec<RunId> = self
            .items(container)
            .iter()
            .filter_map(|item| match item {
                MirrorItem::Run(run) => Some(*run),
                MirrorItem::Embed(_) => None,
            })
            .collect();
        assert!(
            runs.len() <= 1,
            "expected a single text run in {container:?}, found {}",
            runs.len()
        );
        runs.first().copied()
    }

    /// Runs of `container` grouped into maximal stretches between embedded items.
    pub fn stretches(&self, container: ContainerId) -> Vec<Vec<RunId>> {
        let mut stretches = Vec::new();
        let mut current = Vec::new();
        for item in self.items(container) {
            match item {
                MirrorItem::Run(run) => current.push(*run),
                MirrorItem::Embed(_) => {
                    if !current.is_empty() {
                        stretches.push(std::mem::take(&mut current));
                    }
                }
            }
        }
        if !current.is_empty() {
            stretches.push(current);
        }
        stretches
    }

    /// Text content of the container, embedded items excluded.
    pub fn container_text(&self, container: ContainerId) -> String {
        self.items(container)
            .iter()
            .filter_map(|item| match item {
                MirrorItem::Run(run) => Some(self.text(*run)),
                MirrorItem::Embed(_) => None,
            })
            .collect()
    }

    pub fn live_runs(&self) -> usize {
        self.runs.len()
    }

    /// Run slots allocated so far, including free ones awaiting reuse.
    pub fn run_slots(&self) -> usize {
        self.runs.slots()
    }

    pub fn is_container_live(&self, container: ContainerId) -> bool {
        self.containers.contains(container.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::tree::{NodeKind, Tree};

    fn container_with(surface: &mut Surface, texts: &[&str]) -> (ContainerId, Vec<RunId>) {
        let container = surface.create_container();
        let runs = texts
            .iter()
            .map(|text| {
                let run = surface.create_run(text);
                surface.insert(container, MirrorItem::Run(run), None);
                run
            })
            .collect();
        (container, runs)
    }

    #[test]
    fn split_places_tail_after_original() {
        let mut surface = Surface::new();
        let (container, runs) = container_with(&mut surface, &["hello", "!"]);

        let tail = surface.split_run(runs[0], 2);
        assert_eq!(surface.text(runs[0]), "he");
        assert_eq!(surface.text(tail), "llo");
        assert_eq!(
            surface.items(container),
            &[
                MirrorItem::Run(runs[0]),
                MirrorItem::Run(tail),
                MirrorItem::Run(runs[1])
            ]
        );
    }

    #[test]
    fn data_edits_use_character_offsets() {
        let mut surface = Surface::new();
        let (_, runs) = container_with(&mut surface, &["añb"]);

        surface.insert_data(runs[0], 2, "é");
        assert_eq!(surface.text(runs[0]), "añéb");
        surface.delete_data(runs[0], 1, 2);
        assert_eq!(surface.text(runs[0]), "ab");
        surface.append_data(runs[0], "c");
        assert_eq!(surface.text(runs[0]), "abc");
    }

    #[test]
    fn normalize_merges_adjacent_runs_only() {
        let mut surface = Surface::new();
        let container = surface.create_container();
        let a = surface.create_run("ab");
        let b = surface.create_run("cd");
        let c = surface.create_run("ef");
        let tree = Tree::new(NodeKind::RootText);
        let embed = MirrorItem::Embed(tree.root());
        surface.insert(container, MirrorItem::Run(a), None);
        surface.insert(container, MirrorItem::Run(b), None);
        surface.insert(container, embed, None);
        surface.insert(container, MirrorItem::Run(c), None);

        surface.normalize(container);

        assert_eq!(
            surface.items(container),
            &[MirrorItem::Run(a), embed, MirrorItem::Run(c)]
        );
        assert_eq!(surface.text(a), "abcd");
        assert!(!surface.is_live(b));
        assert_eq!(surface.live_runs(), 2);
        assert_eq!(surface.stretches(container), vec![vec![a], vec![c]]);
    }

    #[test]
    #[should_panic(expected = "expected a single text run")]
    fn single_run_rejects_fragmented_container() {
        let mut surface = Surface::new();
        let (container, _) = container_with(&mut surface, &["a", "b"]);
        surface.single_run(container);
    }

    #[test]
    fn single_run_after_normalize() {
        let mut surface = Surface::new();
        let (container, runs) = container_with(&mut surface, &["a", "b", "c"]);
        surface.normalize(container);
        assert_eq!(surface.single_run(container), Some(runs[0]));
        assert_eq!(surface.container_text(container), "abc");
    }

    #[test]
    fn dropping_container_frees_its_runs_for_reuse() {
        let mut surface = Surface::new();
        let (container, runs) = container_with(&mut surface, &["a", "b"]);
        surface.drop_container(container);
        assert!(!surface.is_container_live(container));
        assert!(runs.iter().all(|run| !surface.is_live(*run)));
        assert_eq!(surface.live_runs(), 0);

        let (_, fresh) = container_with(&mut surface, &["c", "d"]);
        assert_eq!(surface.run_slots(), 2);
        assert_eq!(surface.text(fresh[0]), "c");
        assert!(runs.iter().all(|run| !fresh.contains(run)));
        surface.release_run(runs[0]);
        assert_eq!(surface.live_runs(), 2);
    }
}
