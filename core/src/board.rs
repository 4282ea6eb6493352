use alloc::vec::Vec;
use core::ops::Index;
use ndarray::Array2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::*;

/// Rectangular grid of [`Cell`]s indexed `[row][col]`.
///
/// The dimensions are fixed at construction. Lookups with out-of-range
/// coordinates yield `None` or [`RevealOutcome::NoChange`] instead of
/// panicking, only [`Index`] panics.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Board {
    grid: Array2<Cell>,
    mine_count: CellCount,
    /// Mines still to be placed, for boards whose layout waits on a first click.
    #[serde(default)]
    pending_mines: CellCount,
}

impl Board {
    pub fn new(rows: Coord, cols: Coord) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(GameError::EmptyBoard);
        }

        let grid = Array2::from_shape_fn((usize::from(rows), usize::from(cols)), |(row, col)| {
            Cell::new(row as Coord, col as Coord)
        });
        Ok(Self {
            grid,
            mine_count: 0,
            pending_mines: 0,
        })
    }

    /// Builds a board with mines at exactly `mine_coords`, adjacency included.
    pub fn from_mine_coords(size: Coord2, mine_coords: &[Coord2]) -> Result<Self> {
        let mut board = Self::new(size.0, size.1)?;

        for &coords in mine_coords {
            let cell = board
                .get_cell_mut(coords)
                .ok_or(GameError::InvalidCoords)?;
            if !cell.is_mine() {
                cell.set_mine();
                board.mine_count += 1;
            }
        }
        if board.mine_count >= board.total_cells() {
            return Err(GameError::TooManyMines);
        }

        board.calculate_adjacent_mines();
        Ok(board)
    }

    pub fn rows(&self) -> Coord {
        self.size().0
    }

    pub fn cols(&self) -> Coord {
        self.size().1
    }

    pub fn size(&self) -> Coord2 {
        let (rows, cols) = self.grid.dim();
        // constructed from `Coord` dimensions
        (rows as Coord, cols as Coord)
    }

    pub fn total_cells(&self) -> CellCount {
        mult(self.rows(), self.cols())
    }

    pub fn mine_count(&self) -> CellCount {
        self.mine_count
    }

    pub fn revealed_count(&self) -> CellCount {
        self.count_cells(Cell::is_revealed)
    }

    pub fn flagged_count(&self) -> CellCount {
        self.count_cells(Cell::is_flagged)
    }

    /// Mines placed plus mines announced but not placed yet.
    pub fn expected_mine_count(&self) -> CellCount {
        self.mine_count + self.pending_mines
    }

    /// Expected mines minus flags, negative when the player over-flags.
    pub fn mines_left(&self) -> i64 {
        i64::from(self.expected_mine_count()) - i64::from(self.flagged_count())
    }

    /// Announces `count` mines that a later [`Board::place_mines_excluding`]
    /// call will place.
    pub(crate) fn defer_mines(&mut self, count: CellCount) {
        self.pending_mines = count;
    }

    pub fn contains(&self, (row, col): Coord2) -> bool {
        let (rows, cols) = self.size();
        row < rows && col < cols
    }

    pub fn get_cell(&self, row: Coord, col: Coord) -> Option<&Cell> {
        self.grid.get((row, col).to_nd_index())
    }

    pub(crate) fn get_cell_mut(&mut self, coords: Coord2) -> Option<&mut Cell> {
        self.grid.get_mut(coords.to_nd_index())
    }

    /// Cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.grid.iter()
    }

    pub fn neighbor_coords(&self, row: Coord, col: Coord) -> NeighborIter {
        NeighborIter::new((row, col), self.size())
    }

    /// Existing cells among the 8 surrounding positions: 3 in a corner, 5 on
    /// an edge, 8 inside.
    pub fn neighbors(&self, row: Coord, col: Coord) -> impl Iterator<Item = &Cell> {
        self.neighbor_coords(row, col)
            .map(|coords| &self.grid[coords.to_nd_index()])
    }

    pub fn flagged_coords(&self) -> impl Iterator<Item = Coord2> {
        self.cells()
            .filter(|cell| cell.is_flagged())
            .map(Cell::coords)
    }

    /// Marks `count` distinct, previously safe cells as mines.
    ///
    /// Draws random positions and keeps those that are not mines yet until
    /// `count` new mines are placed. Adjacency is left stale, call
    /// [`Board::calculate_adjacent_mines`] afterwards.
    pub fn place_mines<R: Rng + ?Sized>(&mut self, count: CellCount, rng: &mut R) -> Result<()> {
        self.place_mines_excluding(count, &[], rng)
    }

    /// Same as [`Board::place_mines`], but never picks a cell in `excluded`.
    pub fn place_mines_excluding<R: Rng + ?Sized>(
        &mut self,
        count: CellCount,
        excluded: &[Coord2],
        rng: &mut R,
    ) -> Result<()> {
        let candidates = self
            .cells()
            .filter(|cell| !cell.is_mine() && !excluded.contains(&cell.coords()))
            .count();
        let total_after = self.mine_count.saturating_add(count);
        if total_after >= self.total_cells() || count as usize > candidates {
            return Err(GameError::TooManyMines);
        }

        let (rows, cols) = self.size();
        let mut placed: CellCount = 0;
        while placed < count {
            let coords = (rng.random_range(0..rows), rng.random_range(0..cols));
            if excluded.contains(&coords) {
                continue;
            }

            let cell = &mut self.grid[coords.to_nd_index()];
            if !cell.is_mine() {
                cell.set_mine();
                placed += 1;
            }
        }
        self.mine_count += count;
        self.pending_mines = self.pending_mines.saturating_sub(count);

        log::debug!(
            "Placed {} mines on {}x{} board ({} excluded cells)",
            count,
            rows,
            cols,
            excluded.len()
        );
        Ok(())
    }

    pub fn calculate_adjacent_mines(&mut self) {
        let size = self.size();
        let (rows, cols) = size;

        for row in 0..rows {
            for col in 0..cols {
                let count = NeighborIter::new((row, col), size)
                    .filter(|&pos| self.grid[pos.to_nd_index()].is_mine())
                    .count();
                self.grid[(row, col).to_nd_index()].set_adjacent_mines(count as u8);
            }
        }
    }

    /// Reveals a cell, flood-filling through zero-adjacency regions.
    ///
    /// Hidden, unflagged, in-bounds cells only. Hitting a mine reveals every
    /// mine and stops. A zero cell opens its whole zero region plus the ring
    /// of numbered cells around it, using an explicit work-list so board size
    /// never bounds recursion depth. Flagged cells stop the fill.
    pub fn reveal_cell(&mut self, row: Coord, col: Coord) -> RevealOutcome {
        let coords = (row, col);
        let Some(cell) = self.get_cell_mut(coords) else {
            return RevealOutcome::NoChange;
        };
        if cell.is_revealed() || cell.is_flagged() {
            return RevealOutcome::NoChange;
        }

        cell.reveal();
        if cell.is_mine() {
            self.reveal_all_mines();
            return RevealOutcome::HitMine;
        }
        if cell.adjacent_mines() != 0 {
            return RevealOutcome::Revealed(1);
        }

        let size = self.size();
        let mut revealed: CellCount = 1;
        let mut to_visit: Vec<Coord2> = NeighborIter::new(coords, size).collect();

        while let Some(visit_coords) = to_visit.pop() {
            let cell = &mut self.grid[visit_coords.to_nd_index()];
            if cell.is_revealed() || cell.is_flagged() || cell.is_mine() {
                continue;
            }

            cell.reveal();
            revealed += 1;

            if cell.adjacent_mines() == 0 {
                let grid = &self.grid;
                to_visit.extend(
                    NeighborIter::new(visit_coords, size)
                        .filter(|&pos| !grid[pos.to_nd_index()].is_revealed()),
                );
            }
        }

        log::trace!("Flood fill from {:?} revealed {} cells", coords, revealed);
        RevealOutcome::Revealed(revealed)
    }

    /// Reveals every mine, flagged or not, for the end-of-game display.
    pub fn reveal_all_mines(&mut self) {
        self.grid
            .iter_mut()
            .filter(|cell| cell.is_mine())
            .for_each(Cell::force_reveal);
    }

    pub fn toggle_flag(&mut self, row: Coord, col: Coord) -> MarkOutcome {
        self.get_cell_mut((row, col))
            .map_or(MarkOutcome::NoChange, Cell::toggle_flag)
    }

    /// Every safe cell is revealed.
    pub fn is_game_won(&self) -> bool {
        self.cells().all(|cell| cell.is_mine() || cell.is_revealed())
    }

    /// Some mine is revealed.
    pub fn is_game_lost(&self) -> bool {
        self.cells().any(|cell| cell.is_mine() && cell.is_revealed())
    }

    fn count_cells(&self, predicate: impl Fn(&Cell) -> bool) -> CellCount {
        self.cells().filter(|&cell| predicate(cell)).count() as CellCount
    }
}

impl Index<Coord2> for Board {
    type Output = Cell;

    fn index(&self, coords: Coord2) -> &Self::Output {
        &self.grid[coords.to_nd_index()]
    }
}
