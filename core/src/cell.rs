use serde::{Deserialize, Serialize};

use crate::*;

/// One grid position with its mine, reveal, flag and adjacency state.
///
/// Every mutator is total: actions that would break an invariant (revealing
/// a flagged cell, flagging a revealed one) are silently ignored.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    row: Coord,
    col: Coord,
    is_mine: bool,
    is_revealed: bool,
    is_flagged: bool,
    adjacent_mines: u8,
}

impl Cell {
    pub const fn new(row: Coord, col: Coord) -> Self {
        Self {
            row,
            col,
            is_mine: false,
            is_revealed: false,
            is_flagged: false,
            adjacent_mines: 0,
        }
    }

    pub const fn row(&self) -> Coord {
        self.row
    }

    pub const fn col(&self) -> Coord {
        self.col
    }

    pub const fn coords(&self) -> Coord2 {
        (self.row, self.col)
    }

    pub const fn is_mine(&self) -> bool {
        self.is_mine
    }

    pub const fn is_revealed(&self) -> bool {
        self.is_revealed
    }

    pub const fn is_flagged(&self) -> bool {
        self.is_flagged
    }

    /// Only meaningful once mine placement is final.
    pub const fn adjacent_mines(&self) -> u8 {
        self.adjacent_mines
    }

    /// Reveals the cell unless it is flagged.
    pub fn reveal(&mut self) {
        if !self.is_flagged {
            self.is_revealed = true;
        }
    }

    /// Flips the flag unless the cell is already revealed.
    pub fn toggle_flag(&mut self) -> MarkOutcome {
        if self.is_revealed {
            return MarkOutcome::NoChange;
        }
        self.is_flagged = !self.is_flagged;
        MarkOutcome::Changed
    }

    pub fn set_mine(&mut self) {
        self.is_mine = true;
    }

    /// Caller guarantees `count <= 8`.
    pub fn set_adjacent_mines(&mut self, count: u8) {
        debug_assert!(count <= 8, "a cell has at most 8 neighbours");
        self.adjacent_mines = count;
    }

    // end-of-game display, ignores the flag
    pub(crate) fn force_reveal(&mut self) {
        self.is_revealed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_cell_has_position_and_default_state() {
        let cell = Cell::new(2, 3);

        assert_eq!(cell.coords(), (2, 3));
        assert!(!cell.is_mine());
        assert!(!cell.is_revealed());
        assert!(!cell.is_flagged());
        assert_eq!(cell.adjacent_mines(), 0);
    }

    #[test]
    fn reveal_hidden_cell() {
        let mut cell = Cell::new(0, 0);

        cell.reveal();

        assert!(cell.is_revealed());
    }

    #[test]
    fn flagged_cell_is_protected_from_reveal() {
        let mut cell = Cell::new(0, 0);
        cell.toggle_flag();

        cell.reveal();
        assert!(!cell.is_revealed());

        cell.toggle_flag();
        cell.reveal();
        assert!(cell.is_revealed());
    }

    #[test]
    fn toggle_flag_flips_state() {
        let mut cell = Cell::new(0, 0);

        assert_eq!(cell.toggle_flag(), MarkOutcome::Changed);
        assert!(cell.is_flagged());
        assert_eq!(cell.toggle_flag(), MarkOutcome::Changed);
        assert!(!cell.is_flagged());
    }

    #[test]
    fn revealed_cell_cannot_be_flagged() {
        let mut cell = Cell::new(0, 0);
        cell.reveal();

        assert_eq!(cell.toggle_flag(), MarkOutcome::NoChange);
        assert!(!cell.is_flagged());
    }

    #[test]
    fn set_mine_is_idempotent() {
        let mut cell = Cell::new(0, 0);

        cell.set_mine();
        cell.set_mine();

        assert!(cell.is_mine());
    }

    #[test]
    fn set_adjacent_mines() {
        let mut cell = Cell::new(0, 0);

        cell.set_adjacent_mines(3);

        assert_eq!(cell.adjacent_mines(), 3);
    }

    #[test]
    fn force_reveal_ignores_flag() {
        let mut cell = Cell::new(0, 0);
        cell.toggle_flag();

        cell.force_reveal();

        assert!(cell.is_revealed());
        assert!(cell.is_flagged());
    }
}
