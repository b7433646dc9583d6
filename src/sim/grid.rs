//! Uniform-grid broad phase
//!
//! Partitions the world rectangle into fixed-size square cells and buckets
//! bubble *indices* by the cells their bounding circles overlap. The grid is
//! torn down and rebuilt from scratch every tick with a three-pass counting
//! sort (count, prefix sum, scatter), so construction stays O(n) with no
//! per-cell allocation.
//!
//! The grid never stores references to entities, only `usize` indices into
//! the caller-owned slice passed to [`SpatialGrid::populate`]. Queries return
//! *candidates*: an index is reported when its covered cells intersect the
//! query's covered cells, which is necessary but not sufficient for true
//! circle overlap. Callers that need exactness re-test distance themselves.

use std::ops::ControlFlow;

use glam::Vec2;
use rand::Rng;

use crate::consts::{CELL_SIZE, WORLD_HEIGHT, WORLD_WIDTH};

/// Anything the grid can bucket: a center point plus a bounding radius.
pub trait Bounded {
    fn center(&self) -> Vec2;
    fn bounding_radius(&self) -> f32;
}

/// Inclusive rectangle of cell coordinates covered by a query circle,
/// clamped to the grid. May be empty (start past end) for a degenerate
/// negative radius; iteration over an empty range simply does nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CellRange {
    x_start: usize,
    y_start: usize,
    x_end: usize,
    y_end: usize,
}

/// Uniform spatial grid over the world rectangle.
///
/// Lifecycle per tick: [`SpatialGrid::rebuild`] once, then any number of
/// queries. The buckets describe the entity slice exactly as it was at
/// rebuild time; any insert/remove in the entity collection invalidates them
/// until the next rebuild.
#[derive(Debug, Clone)]
pub struct SpatialGrid {
    inv_cell_size: f32,
    n_cells_x: usize,
    n_cells_y: usize,
    /// Prefix sums: cell `c` owns `object_indices[cell_start_indices[c]..cell_start_indices[c + 1]]`
    cell_start_indices: Vec<usize>,
    /// Flat per-cell occupant lists; one slot per (entity, covered cell) pair
    object_indices: Vec<usize>,
    /// Per-cell write cursors for the scatter pass, garbage outside `populate`
    cell_insertion_positions: Vec<usize>,
}

impl Default for SpatialGrid {
    fn default() -> Self {
        Self::new(WORLD_WIDTH, WORLD_HEIGHT, CELL_SIZE)
    }
}

impl SpatialGrid {
    pub fn new(world_width: f32, world_height: f32, cell_size: f32) -> Self {
        let n_cells_x = (world_width / cell_size) as usize + 1;
        let n_cells_y = (world_height / cell_size) as usize + 1;

        Self {
            inv_cell_size: 1.0 / cell_size,
            n_cells_x,
            n_cells_y,
            cell_start_indices: vec![0; n_cells_x * n_cells_y + 1],
            object_indices: Vec::new(),
            cell_insertion_positions: Vec::new(),
        }
    }

    #[inline]
    fn flat_index(&self, cell_x: usize, cell_y: usize) -> usize {
        cell_y * self.n_cells_x + cell_x
    }

    /// Cell coordinates covered by a circle's bounding box, clamped to the
    /// grid on both axes. A zero radius yields a valid single-cell range.
    #[inline]
    fn cell_range(&self, center: Vec2, radius: f32) -> CellRange {
        let min_x = (center.x - radius) * self.inv_cell_size;
        let min_y = (center.y - radius) * self.inv_cell_size;
        let max_x = (center.x + radius) * self.inv_cell_size;
        let max_y = (center.y + radius) * self.inv_cell_size;

        let last_x = (self.n_cells_x - 1) as f32;
        let last_y = (self.n_cells_y - 1) as f32;

        CellRange {
            x_start: min_x.clamp(0.0, last_x) as usize,
            y_start: min_y.clamp(0.0, last_y) as usize,
            x_end: max_x.clamp(0.0, last_x) as usize,
            y_end: max_y.clamp(0.0, last_y) as usize,
        }
    }

    /// Occupants of one cell as a slice of entity indices.
    #[inline]
    fn cell_slice(&self, cell: usize) -> &[usize] {
        &self.object_indices[self.cell_start_indices[cell]..self.cell_start_indices[cell + 1]]
    }

    /// Reset all bucket counts. Must precede every [`SpatialGrid::populate`];
    /// prefer [`SpatialGrid::rebuild`], which pairs the two.
    pub fn clear(&mut self) {
        self.cell_start_indices.clear();
        self.cell_start_indices
            .resize(self.n_cells_x * self.n_cells_y + 1, 0);
    }

    /// Build the buckets from `items` with a three-pass counting sort.
    /// An item lands in every cell its bounding circle's box overlaps, so a
    /// large item occupies several cells at once.
    pub fn populate<T: Bounded>(&mut self, items: &[T]) {
        // First pass: count how many items land in each cell. The +1 offset
        // leaves slot 0 for the prefix sum below.
        for item in items {
            let range = self.cell_range(item.center(), item.bounding_radius());

            for cell_y in range.y_start..=range.y_end {
                for cell_x in range.x_start..=range.x_end {
                    let flat = self.flat_index(cell_x, cell_y);
                    self.cell_start_indices[flat + 1] += 1;
                }
            }
        }

        // Second pass: prefix sum turns counts into bucket start offsets;
        // the final element is the total membership count.
        for i in 1..self.cell_start_indices.len() {
            self.cell_start_indices[i] += self.cell_start_indices[i - 1];
        }

        let total = *self.cell_start_indices.last().unwrap_or(&0);
        self.object_indices.clear();
        self.object_indices.resize(total, 0);

        self.cell_insertion_positions.clear();
        self.cell_insertion_positions
            .extend_from_slice(&self.cell_start_indices);

        // Third pass: scatter each item index into its cells, advancing the
        // per-cell write cursor.
        for (index, item) in items.iter().enumerate() {
            let range = self.cell_range(item.center(), item.bounding_radius());

            for cell_y in range.y_start..=range.y_end {
                for cell_x in range.x_start..=range.x_end {
                    let cell = self.flat_index(cell_x, cell_y);
                    let insert_pos = self.cell_insertion_positions[cell];
                    self.cell_insertion_positions[cell] += 1;
                    self.object_indices[insert_pos] = index;
                }
            }
        }
    }

    /// Tear down and rebuild the buckets in one step. This is the intended
    /// per-tick entry point: after it returns, the buckets exactly describe
    /// `items` until the next rebuild.
    pub fn rebuild<T: Bounded>(&mut self, items: &[T]) {
        self.clear();
        self.populate(items);

        log::trace!(
            "grid rebuilt: {} items, {} cell memberships",
            items.len(),
            self.object_indices.len()
        );
    }

    /// Visit every candidate index whose covered cells intersect the query
    /// circle's covered cells. Returning [`ControlFlow::Break`] stops the
    /// whole scan immediately.
    ///
    /// An index spanning several cells inside the query rectangle is visited
    /// once per such cell, and cell-level overlap does not imply circle
    /// overlap: callers wanting exact hits re-test distance in the visitor.
    pub fn for_each_index_in_radius(
        &self,
        center: Vec2,
        radius: f32,
        mut visit: impl FnMut(usize) -> ControlFlow<()>,
    ) {
        let range = self.cell_range(center, radius);

        for cell_y in range.y_start..=range.y_end {
            for cell_x in range.x_start..=range.x_end {
                for &index in self.cell_slice(self.flat_index(cell_x, cell_y)) {
                    if visit(index).is_break() {
                        return;
                    }
                }
            }
        }
    }

    /// Pick a random candidate in range satisfying `predicate`, or `None`.
    ///
    /// Bounded-cost approximate search: up to one attempt per covered cell,
    /// each attempt picking a uniform cell then a uniform occupant of that
    /// cell. Selection is therefore *not* uniform over all matching
    /// occupants -- a bubble alone in its cell is favored over one in a
    /// crowded cell. That bias is the price of a hard attempt budget; don't
    /// flatten it away without checking what gameplay expects.
    pub fn pick_random_index_in_radius_matching<R: Rng>(
        &self,
        rng: &mut R,
        center: Vec2,
        radius: f32,
        mut predicate: impl FnMut(usize) -> bool,
    ) -> Option<usize> {
        let range = self.cell_range(center, radius);
        if range.x_end < range.x_start || range.y_end < range.y_start {
            return None;
        }

        let width = range.x_end - range.x_start + 1;
        let height = range.y_end - range.y_start + 1;
        let attempt_budget = width * height;

        for _ in 0..attempt_budget {
            let cell_x = range.x_start + rng.random_range(0..width);
            let cell_y = range.y_start + rng.random_range(0..height);

            let occupants = self.cell_slice(self.flat_index(cell_x, cell_y));
            if occupants.is_empty() {
                continue;
            }

            let candidate = occupants[rng.random_range(0..occupants.len())];
            if predicate(candidate) {
                return Some(candidate);
            }
        }

        None
    }

    /// Visit every unordered pair of occupants sharing a cell, for all cells.
    ///
    /// Pairs that never share a cell are never emitted, so completeness
    /// relies on the cell size being at least the largest entity diameter.
    /// Conversely a pair sharing more than one cell is emitted once per
    /// shared cell, so the handler must tolerate repeats.
    pub fn for_each_unique_index_pair(&self, mut visit: impl FnMut(usize, usize)) {
        for cell in 0..self.n_cells_x * self.n_cells_y {
            let occupants = self.cell_slice(cell);

            for i in 0..occupants.len() {
                for j in (i + 1)..occupants.len() {
                    visit(occupants[i], occupants[j]);
                }
            }
        }
    }
}
