//! Slot storage with generation-checked handles.
//!
//! Freed slots are reused. A handle resolves only while its slot still has the
//! generation the handle was issued with.

use std::ops::{Index, IndexMut};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle {
    index: u32,
    generation: u32,
}

impl Handle {
    pub fn index(self) -> usize {
        self.index as usize
    }
}

#[derive(Debug)]
struct Entry<T> {
    generation: u32,
    value: Option<T>,
}

#[derive(Debug)]
pub struct Arena<T> {
    entries: Vec<Entry<T>>,
    free: Vec<u32>,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            free: Vec::new(),
        }
    }
}

impl<T> Arena<T> {
    pub fn insert(&mut self, value: T) -> Handle {
        if let Some(index) = self.free.pop() {
            let entry = &mut self.entries[index as usize];
            entry.value = Some(value);
            return Handle {
                index,
                generation: entry.generation,
            };
        }
        let index = u32::try_from(self.entries.len())
            .unwrap_or_else(|_| panic!("arena exceeded {} slots", u32::MAX));
        self.entries.push(Entry {
            generation: 0,
            value: Some(value),
        });
        Handle {
            index,
            generation: 0,
        }
    }

    /// Frees the slot of `handle` and returns its value. Stale handles yield `None`.
    pub fn remove(&mut self, handle: Handle) -> Option<T> {
        let entry = self.entries.get_mut(handle.index())?;
        if entry.generation != handle.generation {
            return None;
        }
        let value = entry.value.take()?;
        entry.generation = entry.generation.wrapping_add(1);
        self.free.push(handle.index);
        Some(value)
    }

    pub fn get(&self, handle: Handle) -> Option<&T> {
        self.entries
            .get(handle.index())
            .filter(|entry| entry.generation == handle.generation)
            .and_then(|entry| entry.value.as_ref())
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        self.entries
            .get_mut(handle.index())
            .filter(|entry| entry.generation == handle.generation)
            .and_then(|entry| entry.value.as_mut())
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.get(handle).is_some()
    }

    /// Number of live values.
    pub fn len(&self) -> usize {
        self.entries.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of slots ever allocated, live or free.
    pub fn slots(&self) -> usize {
        self.entries.len()
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.entries
            .iter_mut()
            .filter_map(|entry| entry.value.as_mut())
    }
}

impl<T> Index<Handle> for Arena<T> {
    type Output = T;

    fn index(&self, handle: Handle) -> &T {
        self.get(handle)
            .unwrap_or_else(|| panic!("stale arena handle {handle:?}"))
    }
}

impl<T> IndexMut<Handle> for Arena<T> {
    fn index_mut(&mut self, handle: Handle) -> &mut T {
        self.get_mut(handle)
            .unwrap_or_else(|| panic!("stale arena handle {handle:?}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn freed_slots_are_reused_with_a_new_generation() {
        let mut arena = Arena::default();
        let a = arena.insert("a".to_string());
        assert_eq!(arena.remove(a), Some("a".to_string()));
        let b = arena.insert("b".to_string());
        assert_eq!(a.index(), b.index());
        assert_ne!(a, b);
        assert!(!arena.contains(a));
        assert_eq!(arena.get(a), None);
        assert_eq!(arena[b], "b");
        assert_eq!(arena.slots(), 1);
    }

    #[test]
    fn removing_a_stale_handle_leaves_the_new_value() {
        let mut arena = Arena::default();
        let a = arena.insert(1);
        arena.remove(a);
        let b = arena.insert(2);
        assert_eq!(arena.remove(a), None);
        assert_eq!(arena.len(), 1);
        assert_eq!(arena[b], 2);
    }

    #[test]
    #[should_panic(expected = "stale arena handle")]
    fn indexing_with_a_stale_handle_panics() {
        let mut arena = Arena::default();
        let a = arena.insert(1);
        arena.remove(a);
        arena.insert(2);
        let _ = arena[a];
    }
}
