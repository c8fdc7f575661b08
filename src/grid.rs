//! Grid coordinates and the coordinate -> tile index.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tile::TileId;

/// Integer grid coordinate of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

impl GridPos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Chebyshev distance: diagonal steps cost the same as straight ones.
    pub fn chebyshev(self, other: GridPos) -> u32 {
        let dx = self.x.abs_diff(other.x);
        let dy = self.y.abs_diff(other.y);
        dx.max(dy)
    }

    /// `None` when the shifted coordinate leaves the `i32` range.
    pub fn offset(self, dx: i32, dy: i32) -> Option<GridPos> {
        Some(GridPos::new(self.x.checked_add(dx)?, self.y.checked_add(dy)?))
    }

    /// Every coordinate with `1 <= chebyshev <= radius`, row by row.
    /// The center itself is never yielded, nor is anything past the edge of
    /// the `i32` coordinate space.
    pub fn ring_area(self, radius: u32) -> impl Iterator<Item = GridPos> {
        let r = i32::try_from(radius).unwrap_or(i32::MAX);
        (-r..=r).flat_map(move |dy| {
            (-r..=r).filter_map(move |dx| {
                if dx == 0 && dy == 0 {
                    None
                } else {
                    self.offset(dx, dy)
                }
            })
        })
    }
}

impl fmt::Display for GridPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl From<(i32, i32)> for GridPos {
    fn from((x, y): (i32, i32)) -> Self {
        GridPos::new(x, y)
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum GridError {
    #[error("coordinate {0} is already registered")]
    DuplicateCoordinate(GridPos),
}

/// Maps coordinates to tile ids. Tiles are never unregistered.
#[derive(Debug, Default, Clone)]
pub struct GridIndex {
    tiles: HashMap<GridPos, TileId>,
}

impl GridIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, pos: GridPos, tile: TileId) -> Result<(), GridError> {
        if self.tiles.contains_key(&pos) {
            return Err(GridError::DuplicateCoordinate(pos));
        }
        self.tiles.insert(pos, tile);
        Ok(())
    }

    pub fn lookup(&self, pos: GridPos) -> Option<TileId> {
        self.tiles.get(&pos).copied()
    }

    pub fn contains(&self, pos: GridPos) -> bool {
        self.tiles.contains_key(&pos)
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}
