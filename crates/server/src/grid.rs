//! Board geometry.

use protocol::Cell;
use rand::Rng;

/// A square board of `size` x `size` cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grid {
    size: i32,
}

impl Grid {
    pub fn new(size: i32) -> Self {
        debug_assert!(size > 0, "grid size must be positive");
        Self { size }
    }

    /// Number of cells on the board.
    #[inline]
    pub fn area(&self) -> usize {
        (self.size as usize) * (self.size as usize)
    }

    /// Spawn cell for every snake, rounded down for even sizes.
    #[inline]
    pub fn center(&self) -> Cell {
        Cell::new(self.size / 2, self.size / 2)
    }

    #[inline]
    pub fn contains(&self, cell: Cell) -> bool {
        (0..self.size).contains(&cell.x) && (0..self.size).contains(&cell.y)
    }

    /// Uniformly random cell on the board.
    #[inline]
    pub fn random_cell<R: Rng + ?Sized>(&self, rng: &mut R) -> Cell {
        Cell::new(rng.random_range(0..self.size), rng.random_range(0..self.size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_center_rounds_down() {
        assert_eq!(Grid::new(10).center(), Cell::new(5, 5));
        assert_eq!(Grid::new(41).center(), Cell::new(20, 20));
        assert_eq!(Grid::new(1).center(), Cell::new(0, 0));
    }

    #[test]
    fn test_contains() {
        let grid = Grid::new(10);
        assert!(grid.contains(Cell::new(0, 0)));
        assert!(grid.contains(Cell::new(9, 9)));
        assert!(!grid.contains(Cell::new(10, 3)));
        assert!(!grid.contains(Cell::new(3, -1)));
        assert_eq!(grid.area(), 100);
    }

    #[test]
    fn test_random_cell_in_bounds() {
        let grid = Grid::new(7);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            assert!(grid.contains(grid.random_cell(&mut rng)));
        }
    }
}
