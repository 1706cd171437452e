use std::collections::HashMap;

use crate::Cell;

/// Shared record of every cell claimed by a trail.
///
/// Stores an occurrence count per cell rather than a plain set: when an agent
/// dies moving onto a cell someone else already owns, the cell is claimed
/// twice, and erasing the dead agent must leave the owner's claim intact.
#[derive(Clone, Debug, Default)]
pub struct OccupancyGrid {
    /// Map from cell to the number of trail entries covering it.
    /// Cells with a count of zero are never stored.
    claims: HashMap<Cell, u32>,
}

impl OccupancyGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether any trail covers `cell`.
    #[inline]
    pub fn contains(&self, cell: Cell) -> bool {
        self.claims.contains_key(&cell)
    }

    /// Add one claim on `cell`.
    pub fn insert(&mut self, cell: Cell) {
        *self.claims.entry(cell).or_insert(0) += 1;
    }

    /// Drop one claim on `cell`. Absent cells are ignored.
    pub fn remove(&mut self, cell: Cell) {
        if let Some(count) = self.claims.get_mut(&cell) {
            *count -= 1;
            if *count == 0 {
                self.claims.remove(&cell);
            }
        }
    }

    /// Number of claims on `cell`.
    pub fn claims(&self, cell: Cell) -> u32 {
        self.claims.get(&cell).copied().unwrap_or(0)
    }

    /// Number of distinct occupied cells.
    pub fn len(&self) -> usize {
        self.claims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_then_contains() {
        let mut grid = OccupancyGrid::new();
        assert!(!grid.contains(Cell::new(4, 8)));
        grid.insert(Cell::new(4, 8));
        assert!(grid.contains(Cell::new(4, 8)));
        assert_eq!(grid.len(), 1);
    }

    #[test]
    fn removing_absent_cell_is_noop() {
        let mut grid = OccupancyGrid::new();
        grid.insert(Cell::new(0, 0));
        grid.remove(Cell::new(12, 12));
        assert_eq!(grid.len(), 1);
        assert_eq!(grid.claims(Cell::new(12, 12)), 0);
        assert!(grid.contains(Cell::new(0, 0)));
    }

    #[test]
    fn remove_drops_a_single_claim() {
        let mut grid = OccupancyGrid::new();
        let cell = Cell::new(20, 20);
        grid.insert(cell);
        grid.insert(cell);
        assert_eq!(grid.claims(cell), 2);
        assert_eq!(grid.len(), 1);

        grid.remove(cell);
        assert!(grid.contains(cell));
        grid.remove(cell);
        assert!(!grid.contains(cell));
        assert!(grid.is_empty());
    }
}
