//! Blockfall — classic falling-block puzzle game in the terminal.

mod app;
mod collision;
mod game;
mod grid;
mod input;
mod piece;
mod rotation;
mod scoring;
mod sound;
mod theme;
mod ui;

use anyhow::{Context, Result};
use app::App;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use thiserror::Error;

/// Engine-facing options derived from the CLI.
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub width: u16,
    pub height: u16,
    pub seed: Option<u64>,
    pub randomizer: Randomizer,
}

/// Narrowest grid that still fits the flat I piece at spawn.
pub const MIN_WIDTH: u16 = 4;
/// Shortest grid that fits every spawn shape.
pub const MIN_HEIGHT: u16 = 2;
/// Largest grid the terminal board can lay out.
pub const MAX_WIDTH: u16 = 100;
pub const MAX_HEIGHT: u16 = 100;
/// Accepted `--frame-rate` range, in frames per second.
pub const FRAME_RATES: std::ops::RangeInclusive<f64> = 1.0..=1000.0;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("width {0} is too narrow (minimum {min})", min = MIN_WIDTH)]
    TooNarrow(u16),
    #[error("width {0} is too wide (maximum {max})", max = MAX_WIDTH)]
    TooWide(u16),
    #[error("height {0} is too short (minimum {min})", min = MIN_HEIGHT)]
    TooShort(u16),
    #[error("height {0} is too tall (maximum {max})", max = MAX_HEIGHT)]
    TooTall(u16),
    #[error("frame rate must be between 1 and 1000, got {0}")]
    FrameRate(f64),
}

impl GameConfig {
    pub fn from_args(args: &Args) -> Result<Self, ConfigError> {
        if args.width < MIN_WIDTH {
            return Err(ConfigError::TooNarrow(args.width));
        }
        if args.width > MAX_WIDTH {
            return Err(ConfigError::TooWide(args.width));
        }
        if args.height < MIN_HEIGHT {
            return Err(ConfigError::TooShort(args.height));
        }
        if args.height > MAX_HEIGHT {
            return Err(ConfigError::TooTall(args.height));
        }
        // NaN and infinities fall outside the range too.
        if !FRAME_RATES.contains(&args.frame_rate) {
            return Err(ConfigError::FrameRate(args.frame_rate));
        }
        Ok(Self {
            width: args.width,
            height: args.height,
            seed: args.seed,
            randomizer: args.randomizer,
        })
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    if let Some(path) = args.log_file.as_deref() {
        init_logging(path)?;
    }
    let config = GameConfig::from_args(&args)?;
    let theme = match theme::Theme::load(args.theme.as_deref(), args.palette) {
        Ok(t) => t,
        Err(e) => {
            log::warn!("theme not loaded, using built-in colours: {e}");
            let mut fallback = theme::Theme::classic();
            fallback.apply_palette(args.palette);
            fallback
        }
    };
    let mut app = App::new(args, config, theme);
    app.run()?;
    Ok(())
}

/// Log to a file: the terminal itself is owned by the UI.
fn init_logging(path: &std::path::Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("cannot open log file {}", path.display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init()?;
    Ok(())
}

/// Classic falling-block puzzle game in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "blockfall",
    version,
    about = "Classic falling-block puzzle in the terminal. Stack pieces, clear full rows, survive.",
    long_about = "Blockfall is a terminal rendition of the classic falling-block puzzle.\n\n\
        Pieces fall one row at a time. Fill a row edge to edge to clear it; every ten \
        lines raise the level and the falling speed.\n\n\
        CONTROLS:\n  Left/Right or h/l  Move      Up or k    Rotate\n  Down or j          Soft drop Space      Hard drop\n  \
        P                  Pause     Enter / R  Start / restart\n  Q / Esc            Quit"
)]
pub struct Args {
    /// Grid width in columns.
    #[arg(long, default_value = "10", value_name = "COLS")]
    pub width: u16,

    /// Grid height in rows.
    #[arg(long, default_value = "20", value_name = "ROWS")]
    pub height: u16,

    /// Seed for the piece randomizer (same seed, same pieces).
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// How upcoming pieces are chosen.
    #[arg(long, default_value = "uniform")]
    pub randomizer: Randomizer,

    /// Path to theme file (btop-style theme[key]=\"value\").
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Where sound events go: off, log (info records in --log-file), or bell (terminal bell).
    #[arg(long, default_value = "log")]
    pub sound: SoundMode,

    /// Target frames per second; gravity is measured against real elapsed time.
    #[arg(long, default_value = "60.0", value_name = "RATE")]
    pub frame_rate: f64,

    /// Skip the start screen and begin playing immediately.
    #[arg(long)]
    pub autostart: bool,

    /// Write logs to this file (filter with RUST_LOG).
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Randomizer {
    /// Each piece drawn independently from all seven.
    #[default]
    Uniform,
    /// Shuffled bags of all seven.
    Bag,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SoundMode {
    Off,
    #[default]
    Log,
    Bell,
}
