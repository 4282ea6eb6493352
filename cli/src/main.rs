use std::io::{self, BufRead, Write};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use kaboom_core::{CellCount, Coord, FirstClickPolicy, GameConfig, GameController};
use tracing_subscriber::filter::LevelFilter;

use input::{Command, InputError};
use render::{JsonRenderer, Renderer, TextRenderer};
use session::{Session, Step};

mod input;
mod render;
mod session;

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Preset {
    /// 9x9 with 10 mines
    Beginner,
    /// 16x16 with 40 mines
    Intermediate,
    /// 16x30 with 99 mines
    Expert,
}

impl Preset {
    fn config(self) -> GameConfig {
        match self {
            Self::Beginner => GameConfig::BEGINNER,
            Self::Intermediate => GameConfig::INTERMEDIATE,
            Self::Expert => GameConfig::EXPERT,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum FirstClick {
    /// Rebuild the board until the first clicked cell is safe
    Regenerate,
    /// Place mines after the first click, away from the clicked cell
    ClearNeighborhood,
}

impl From<FirstClick> for FirstClickPolicy {
    fn from(other: FirstClick) -> Self {
        match other {
            FirstClick::Regenerate => FirstClickPolicy::Regenerate,
            FirstClick::ClearNeighborhood => FirstClickPolicy::ClearNeighborhood,
        }
    }
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// What log level to use
    #[command(flatten)]
    verbose: Verbosity<WarnLevel>,

    /// Board size and mine count to start from
    #[arg(short, long, value_enum, default_value_t = Preset::Beginner)]
    preset: Preset,

    /// Override the preset's row count
    #[arg(long)]
    rows: Option<Coord>,

    /// Override the preset's column count
    #[arg(long)]
    cols: Option<Coord>,

    /// Override the preset's mine count
    #[arg(short, long)]
    mines: Option<CellCount>,

    /// Force a seed instead of random
    #[arg(short, long)]
    seed: Option<u64>,

    /// How the first click is kept safe
    #[arg(long, value_enum, default_value_t = FirstClick::Regenerate)]
    first_click: FirstClick,

    /// Print every frame as a JSON snapshot instead of a text grid
    #[arg(long)]
    json: bool,
}

impl Args {
    fn game_config(&self) -> anyhow::Result<GameConfig> {
        let preset = self.preset.config();
        let rows = self.rows.unwrap_or(preset.rows());
        let cols = self.cols.unwrap_or(preset.cols());
        let mines = self.mines.unwrap_or(preset.mines);

        GameConfig::new(rows, cols, mines)
            .with_context(|| format!("Invalid board: {rows}x{cols} with {mines} mines"))
    }
}

fn init_logging(verbose: &Verbosity<WarnLevel>) {
    let level = match verbose.log_level_filter() {
        log::LevelFilter::Off => LevelFilter::OFF,
        log::LevelFilter::Error => LevelFilter::ERROR,
        log::LevelFilter::Warn => LevelFilter::WARN,
        log::LevelFilter::Info => LevelFilter::INFO,
        log::LevelFilter::Debug => LevelFilter::DEBUG,
        log::LevelFilter::Trace => LevelFilter::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(&args.verbose);

    let config = args.game_config()?;
    let seed = args.seed.unwrap_or_else(rand::random);
    log::info!("seed: {}", seed);

    let renderer: Box<dyn Renderer> = if args.json {
        Box::new(JsonRenderer)
    } else {
        Box::new(TextRenderer)
    };
    let controller = GameController::from_seed(seed, args.first_click.into());
    let mut session = Session::new(controller, config, renderer)?;

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", session.render()?)?;
    if !args.json {
        eprintln!("Type `help` for commands.");
    }

    for line in io::stdin().lock().lines() {
        let command = match line?.parse::<Command>() {
            Ok(command) => command,
            Err(InputError::Empty) => continue,
            Err(err) => {
                eprintln!("{err}");
                continue;
            }
        };

        let reply = match session.apply(command)? {
            Step::Continue(reply) => reply,
            Step::Quit => break,
        };
        if let Some(frame) = reply.frame {
            writeln!(stdout, "{frame}")?;
        }
        if let Some(message) = reply.message {
            eprintln!("{message}");
        }
        stdout.flush()?;
    }

    log::debug!("Session ended while {:?}", session.controller().status());
    Ok(())
}
