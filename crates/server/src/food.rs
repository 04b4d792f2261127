//! Food placement.
//!
//! Food cells are chosen by rejection sampling against the occupied cells.
//! Every loop has a hard attempt ceiling, so a crowded board yields fewer
//! foods (or, at worst, a food on a snake) instead of spinning forever.

use crate::config::FoodConfig;
use crate::grid::Grid;
use protocol::Cell;
use rand::Rng;
use std::collections::HashSet;
use tracing::debug;

/// Places food on a grid up to a target count.
#[derive(Debug, Clone)]
pub struct FoodPlacer {
    grid: Grid,
    /// Target number of foods per room.
    count: usize,
    /// Samples per single placement before giving up.
    pick_attempts: usize,
    /// Placements per fill pass before giving up.
    fill_attempts: usize,
}

impl FoodPlacer {
    pub fn new(grid: Grid, config: &FoodConfig) -> Self {
        Self {
            grid,
            count: config.count,
            pick_attempts: config.min_pick_attempts.max(grid.area()).max(1),
            fill_attempts: config.fill_attempts,
        }
    }

    /// Target food count.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Sample a cell not in `occupied`.
    ///
    /// Once the attempt ceiling is reached the last sample is returned even if
    /// it is occupied.
    pub fn pick_empty_cell<R: Rng + ?Sized>(&self, rng: &mut R, occupied: &HashSet<Cell>) -> Cell {
        let mut cell = self.grid.random_cell(rng);
        let mut tries = 1;
        while occupied.contains(&cell) && tries < self.pick_attempts {
            cell = self.grid.random_cell(rng);
            tries += 1;
        }
        cell
    }

    /// Build a fresh food set avoiding `snake_cells`.
    pub fn init_foods<R: Rng + ?Sized>(&self, rng: &mut R, snake_cells: &HashSet<Cell>) -> Vec<Cell> {
        let mut foods = Vec::with_capacity(self.count);
        self.fill(rng, &mut foods, snake_cells);
        foods
    }

    /// Remove `eaten` from `foods` and top the set back up.
    ///
    /// The eaten cell is excluded from this top-up since the eater's head sits
    /// on it. Returns whether `eaten` was actually a food; the top-up runs
    /// either way.
    pub fn replenish<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        foods: &mut Vec<Cell>,
        eaten: Cell,
        snake_cells: &HashSet<Cell>,
    ) -> bool {
        let before = foods.len();
        foods.retain(|food| *food != eaten);
        let removed = foods.len() != before;
        let mut blocked = snake_cells.clone();
        blocked.insert(eaten);
        self.fill(rng, foods, &blocked);
        removed
    }

    fn fill<R: Rng + ?Sized>(&self, rng: &mut R, foods: &mut Vec<Cell>, snake_cells: &HashSet<Cell>) {
        let mut occupied: HashSet<Cell> = snake_cells.iter().chain(foods.iter()).copied().collect();
        let mut attempts = 0;
        while foods.len() < self.count && attempts < self.fill_attempts {
            let cell = self.pick_empty_cell(rng, &occupied);
            if !foods.contains(&cell) {
                foods.push(cell);
                occupied.insert(cell);
            }
            attempts += 1;
        }
        if foods.len() < self.count {
            debug!(
                "Food placement stopped at {}/{} after {} attempts",
                foods.len(),
                self.count,
                attempts
            );
        }
    }
}
