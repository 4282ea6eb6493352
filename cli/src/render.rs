use std::fmt::{self, Write};

use kaboom_core::{Board, Cell, Coord2, GameSnapshot, GameStatus};

/// Turns a snapshot into one frame of output.
///
/// Implementations keep no state between frames, every call re-derives the
/// whole picture from the snapshot.
pub trait Renderer {
    fn render(&self, snapshot: &GameSnapshot<'_>) -> anyhow::Result<String>;
}

/// Plain text grid with row and column indices.
#[derive(Copy, Clone, Debug, Default)]
pub struct TextRenderer;

/// One JSON document per frame, for renderers living outside this process.
#[derive(Copy, Clone, Debug, Default)]
pub struct JsonRenderer;

pub fn glyph(cell: &Cell, hit_mine_cell: Option<Coord2>) -> char {
    if cell.is_flagged() {
        'F'
    } else if !cell.is_revealed() {
        '#'
    } else if cell.is_mine() {
        if hit_mine_cell == Some(cell.coords()) {
            'X'
        } else {
            '*'
        }
    } else {
        match cell.adjacent_mines() {
            0 => '.',
            n => char::from_digit(n.into(), 10).unwrap_or('?'),
        }
    }
}

fn status_label(status: GameStatus) -> &'static str {
    match status {
        GameStatus::Idle => "idle",
        GameStatus::Playing => "playing",
        GameStatus::Won => "won",
        GameStatus::Lost => "lost",
    }
}

impl TextRenderer {
    fn render_board(
        board: &Board,
        hit_mine_cell: Option<Coord2>,
        out: &mut String,
    ) -> fmt::Result {
        let (rows, cols) = board.size();
        let row_width = (rows - 1).to_string().len();
        let col_width = (cols - 1).to_string().len();

        write!(out, "{:row_width$} ", "")?;
        for col in 0..cols {
            write!(out, " {col:>col_width$}")?;
        }
        out.push('\n');

        for row in 0..rows {
            write!(out, "{row:>row_width$} ")?;
            for col in 0..cols {
                let symbol = board
                    .get_cell(row, col)
                    .map_or(' ', |cell| glyph(cell, hit_mine_cell));
                write!(out, " {symbol:>col_width$}")?;
            }
            out.push('\n');
        }
        Ok(())
    }
}

impl Renderer for TextRenderer {
    fn render(&self, snapshot: &GameSnapshot<'_>) -> anyhow::Result<String> {
        let mut out = String::new();
        let Some(board) = snapshot.board else {
            out.push_str("No game in progress");
            return Ok(out);
        };

        Self::render_board(board, snapshot.hit_mine_cell, &mut out)?;
        write!(
            out,
            "status: {}, mines left: {}",
            status_label(snapshot.status),
            board.mines_left()
        )?;
        Ok(out)
    }
}

impl Renderer for JsonRenderer {
    fn render(&self, snapshot: &GameSnapshot<'_>) -> anyhow::Result<String> {
        Ok(serde_json::to_string(snapshot)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(board: &Board, status: GameStatus, hit: Option<Coord2>) -> GameSnapshot<'_> {
        GameSnapshot {
            board: Some(board),
            status,
            hit_mine_cell: hit,
        }
    }

    #[test]
    fn renders_hidden_flagged_and_numbers() {
        let mut board = Board::from_mine_coords((3, 3), &[(0, 0)]).unwrap();
        board.reveal_cell(2, 2);
        board.toggle_flag(0, 0);

        let text = TextRenderer
            .render(&snapshot(&board, GameStatus::Playing, None))
            .unwrap();

        assert_eq!(
            text,
            "   0 1 2\n\
             0  F 1 .\n\
             1  1 1 .\n\
             2  . . .\n\
             status: playing, mines left: 0"
        );
    }

    #[test]
    fn hit_mine_is_distinct_from_other_mines() {
        let mut board = Board::from_mine_coords((1, 3), &[(0, 0), (0, 2)]).unwrap();
        board.reveal_cell(0, 2);

        let text = TextRenderer
            .render(&snapshot(&board, GameStatus::Lost, Some((0, 2))))
            .unwrap();

        assert!(text.contains("0  * # X"));
        assert!(text.ends_with("status: lost, mines left: 2"));
    }

    #[test]
    fn wide_boards_align_columns() {
        let board = Board::from_mine_coords((2, 11), &[]).unwrap();

        let text = TextRenderer
            .render(&snapshot(&board, GameStatus::Playing, None))
            .unwrap();
        let mut lines = text.lines();

        assert_eq!(lines.next(), Some("    0  1  2  3  4  5  6  7  8  9 10"));
        assert_eq!(lines.next(), Some("0   #  #  #  #  #  #  #  #  #  #  #"));
    }

    #[test]
    fn idle_snapshot() {
        let snapshot = GameSnapshot {
            board: None,
            status: GameStatus::Idle,
            hit_mine_cell: None,
        };

        assert_eq!(
            TextRenderer.render(&snapshot).unwrap(),
            "No game in progress"
        );
        assert!(JsonRenderer.render(&snapshot).unwrap().contains("\"idle\""));
    }

    #[test]
    fn json_frame_carries_status_and_hit_cell() {
        let mut board = Board::from_mine_coords((2, 2), &[(1, 1)]).unwrap();
        board.reveal_cell(1, 1);

        let json = JsonRenderer
            .render(&snapshot(&board, GameStatus::Lost, Some((1, 1))))
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["status"], "lost");
        assert_eq!(value["hit_mine_cell"], serde_json::json!([1, 1]));
    }
}
