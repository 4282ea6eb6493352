use std::str::FromStr;

use kaboom_core::{Coord, Coord2};
use thiserror::Error;

/// A player action parsed from one line of input.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Reveal(Coord2),
    Flag(Coord2),
    NewGame,
    Help,
    Quit,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("Empty command")]
    Empty,
    #[error("Unknown command `{0}`, type `help` for a list")]
    UnknownCommand(String),
    #[error("`{0}` expects ROW COL")]
    MissingCoords(&'static str),
    #[error("Invalid coordinate `{0}`, expected a non-negative integer")]
    InvalidCoord(String),
    #[error("Unexpected argument `{0}`")]
    UnexpectedArgument(String),
}

pub const HELP: &str = "\
commands:
  r, reveal ROW COL   reveal a cell
  f, flag ROW COL     toggle a flag
  n, new              start a new game
  h, help             show this help
  q, quit             leave";

fn parse_coord(s: &str) -> Result<Coord, InputError> {
    s.parse().map_err(|_| InputError::InvalidCoord(s.to_string()))
}

fn parse_coords<'a>(
    command: &'static str,
    mut args: impl Iterator<Item = &'a str>,
) -> Result<Coord2, InputError> {
    let (Some(row), Some(col)) = (args.next(), args.next()) else {
        return Err(InputError::MissingCoords(command));
    };
    let coords = (parse_coord(row)?, parse_coord(col)?);
    expect_end(args)?;
    Ok(coords)
}

fn expect_end<'a>(mut args: impl Iterator<Item = &'a str>) -> Result<(), InputError> {
    match args.next() {
        Some(extra) => Err(InputError::UnexpectedArgument(extra.to_string())),
        None => Ok(()),
    }
}

impl FromStr for Command {
    type Err = InputError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Err(InputError::Empty);
        };

        match name.to_ascii_lowercase().as_str() {
            "r" | "reveal" => Ok(Self::Reveal(parse_coords("reveal", words)?)),
            "f" | "flag" => Ok(Self::Flag(parse_coords("flag", words)?)),
            "n" | "new" => expect_end(words).map(|()| Self::NewGame),
            "h" | "help" | "?" => expect_end(words).map(|()| Self::Help),
            "q" | "quit" | "exit" => expect_end(words).map(|()| Self::Quit),
            _ => Err(InputError::UnknownCommand(name.to_string())),
        }
    }
}
