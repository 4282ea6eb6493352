use alloc::vec::Vec;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::*;

/// Valid transitions:
/// - Idle -> Playing
/// - Playing -> Won
/// - Playing -> Lost
/// - any -> Playing, only by starting a new game
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    #[default]
    Idle,
    Playing,
    Won,
    Lost,
}

impl GameStatus {
    pub const fn is_playing(self) -> bool {
        matches!(self, Self::Playing)
    }

    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

/// How the first click of a game is kept off a mine.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FirstClickPolicy {
    /// Mines are placed at game start, the whole board is rebuilt while the
    /// first clicked cell holds a mine.
    #[default]
    Regenerate,
    /// Mines are placed on the first click, away from the clicked cell and
    /// its neighbours, so the opening move is a zero whenever room allows.
    ClearNeighborhood,
}

/// Read-only view handed to renderers.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct GameSnapshot<'a> {
    /// `None` until the first game starts.
    pub board: Option<&'a Board>,
    pub status: GameStatus,
    /// The mine whose reveal ended the game.
    pub hit_mine_cell: Option<Coord2>,
}

/// Owns the board of the current game and drives its lifecycle.
///
/// Clicks and flags are accepted only while [`GameStatus::Playing`], anything
/// else is a silent no-op, as are out-of-bounds coordinates.
#[derive(Clone, Debug)]
pub struct GameController<R = SmallRng> {
    rng: R,
    first_click_policy: FirstClickPolicy,
    config: Option<GameConfig>,
    board: Option<Board>,
    status: GameStatus,
    is_first_click: bool,
    hit_mine_cell: Option<Coord2>,
}

impl GameController<SmallRng> {
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(SmallRng::seed_from_u64(seed))
    }

    pub fn from_seed(seed: u64, first_click_policy: FirstClickPolicy) -> Self {
        Self::new(SmallRng::seed_from_u64(seed), first_click_policy)
    }
}

impl<R: Rng> GameController<R> {
    pub fn new(rng: R, first_click_policy: FirstClickPolicy) -> Self {
        Self {
            rng,
            first_click_policy,
            config: None,
            board: None,
            status: GameStatus::Idle,
            is_first_click: true,
            hit_mine_cell: None,
        }
    }

    pub fn with_rng(rng: R) -> Self {
        Self::new(rng, FirstClickPolicy::default())
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn is_first_click(&self) -> bool {
        self.is_first_click
    }

    pub fn first_click_policy(&self) -> FirstClickPolicy {
        self.first_click_policy
    }

    pub fn config(&self) -> Option<GameConfig> {
        self.config
    }

    pub fn board(&self) -> Option<&Board> {
        self.board.as_ref()
    }

    pub fn hit_mine_cell(&self) -> Option<Coord2> {
        self.hit_mine_cell
    }

    pub fn game_state(&self) -> GameSnapshot<'_> {
        GameSnapshot {
            board: self.board.as_ref(),
            status: self.status,
            hit_mine_cell: self.hit_mine_cell,
        }
    }

    pub fn start_new_game(&mut self, rows: Coord, cols: Coord, mines: CellCount) -> Result<()> {
        self.start_game(GameConfig::new(rows, cols, mines)?)
    }

    /// Replaces any game in progress. On error the previous game is kept.
    pub fn start_game(&mut self, config: GameConfig) -> Result<()> {
        config.validate()?;

        let board = match self.first_click_policy {
            FirstClickPolicy::Regenerate => self.generate_board(config)?,
            FirstClickPolicy::ClearNeighborhood => {
                let mut board = Board::new(config.rows(), config.cols())?;
                board.defer_mines(config.mines);
                board
            }
        };

        self.config = Some(config);
        self.board = Some(board);
        self.status = GameStatus::Playing;
        self.is_first_click = true;
        self.hit_mine_cell = None;

        log::debug!(
            "Started {}x{} game with {} mines ({:?})",
            config.rows(),
            config.cols(),
            config.mines,
            self.first_click_policy
        );
        Ok(())
    }

    pub fn handle_cell_click(&mut self, row: Coord, col: Coord) -> RevealOutcome {
        let coords = (row, col);
        if !self.status.is_playing() {
            log::trace!("Ignoring click at {:?} while {:?}", coords, self.status);
            return RevealOutcome::NoChange;
        }
        if !self.board.as_ref().is_some_and(|board| board.contains(coords)) {
            log::trace!("Ignoring click outside the board at {:?}", coords);
            return RevealOutcome::NoChange;
        }

        if self.is_first_click
            && let Err(err) = self.secure_first_click(coords)
        {
            log::error!("Could not secure first click at {:?}: {}", coords, err);
            return RevealOutcome::NoChange;
        }

        let Some(board) = self.board.as_mut() else {
            return RevealOutcome::NoChange;
        };
        let outcome = board.reveal_cell(row, col);
        self.is_first_click = false;

        if board.is_game_lost() {
            self.status = GameStatus::Lost;
            if board
                .get_cell(row, col)
                .is_some_and(|cell| cell.is_mine() && cell.is_revealed())
            {
                self.hit_mine_cell = Some(coords);
            }
            log::debug!("Game lost at {:?}", coords);
            RevealOutcome::HitMine
        } else if board.is_game_won() {
            self.status = GameStatus::Won;
            log::debug!("Game won at {:?}", coords);
            RevealOutcome::Won
        } else {
            outcome
        }
    }

    pub fn handle_cell_right_click(&mut self, row: Coord, col: Coord) -> MarkOutcome {
        if !self.status.is_playing() {
            log::trace!("Ignoring flag at {:?} while {:?}", (row, col), self.status);
            return MarkOutcome::NoChange;
        }

        self.board
            .as_mut()
            .map_or(MarkOutcome::NoChange, |board| board.toggle_flag(row, col))
    }

    fn secure_first_click(&mut self, coords: Coord2) -> Result<()> {
        let Some(config) = self.config else {
            return Ok(());
        };

        match self.first_click_policy {
            FirstClickPolicy::Regenerate => self.regenerate_until_safe(config, coords),
            FirstClickPolicy::ClearNeighborhood => self.place_mines_around(config, coords),
        }
    }

    fn regenerate_until_safe(&mut self, config: GameConfig, coords: Coord2) -> Result<()> {
        let mut attempts: u32 = 0;

        loop {
            let Some(board) = &self.board else {
                return Ok(());
            };
            if !board[coords].is_mine() {
                break;
            }

            let flags: Vec<Coord2> = board.flagged_coords().collect();
            let mut fresh = self.generate_board(config)?;
            for (row, col) in flags {
                fresh.toggle_flag(row, col);
            }
            self.board = Some(fresh);
            attempts += 1;
        }

        if attempts > 0 {
            log::debug!(
                "Regenerated board {} times to keep first click at {:?} safe",
                attempts,
                coords
            );
        }
        Ok(())
    }

    fn place_mines_around(&mut self, config: GameConfig, coords: Coord2) -> Result<()> {
        let Some(board) = self.board.as_mut() else {
            return Ok(());
        };

        let mut excluded: Vec<Coord2> = board.neighbor_coords(coords.0, coords.1).collect();
        excluded.push(coords);
        if config.mines as usize > config.total_cells() as usize - excluded.len() {
            log::warn!("Cannot keep first click neighbourhood clear, fallback to clicked cell only");
            excluded.clear();
            excluded.push(coords);
        }

        board.place_mines_excluding(config.mines, &excluded, &mut self.rng)?;
        board.calculate_adjacent_mines();
        Ok(())
    }

    fn generate_board(&mut self, config: GameConfig) -> Result<Board> {
        let mut board = Board::new(config.rows(), config.cols())?;
        board.place_mines(config.mines, &mut self.rng)?;
        board.calculate_adjacent_mines();
        Ok(board)
    }
}
