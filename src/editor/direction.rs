use std::ops::{Index, IndexMut};

/// Horizontal axis along which every traversal, split and deletion runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    pub const BOTH: [Direction; 2] = [Direction::Left, Direction::Right];

    pub fn opposite(self) -> Self {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }
}

/// A value on each side of something, addressed by [`Direction`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Sides<T> {
    left: T,
    right: T,
}

impl<T> Sides<T> {
    pub const fn new(left: T, right: T) -> Self {
        Self { left, right }
    }

    /// Builds a pair where `value` sits on `dir` and `other` on the opposite side.
    pub fn toward(dir: Direction, value: T, other: T) -> Self {
        match dir {
            Direction::Left => Self::new(value, other),
            Direction::Right => Self::new(other, value),
        }
    }
}

impl<T> Index<Direction> for Sides<T> {
    type Output = T;

    fn index(&self, dir: Direction) -> &T {
        match dir {
            Direction::Left => &self.left,
            Direction::Right => &self.right,
        }
    }
}

impl<T> IndexMut<Direction> for Sides<T> {
    fn index_mut(&mut self, dir: Direction) -> &mut T {
        match dir {
            Direction::Left => &mut self.left,
            Direction::Right => &mut self.right,
        }
    }
}
