//! Tetratui — classic falling-block puzzle game in the terminal.

mod app;
mod board;
mod game;
mod input;
mod pieces;
mod theme;
mod ui;

use anyhow::Result;
use app::App;
use clap::{Parser, ValueEnum};

/// Options derived from CLI that affect the simulation (board size, base
/// gravity speed, RNG seed).
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub rows: usize,
    pub columns: usize,
    pub tick_ms: u64,
    pub seed: Option<u32>,
    pub no_animation: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let theme = theme::Theme::load(args.theme.as_deref(), args.palette).unwrap_or_default();
    // Smallest board a 4-wide piece can spawn on.
    let config = GameConfig {
        rows: args.rows.max(4) as usize,
        columns: args.cols.max(4) as usize,
        tick_ms: args.tick_ms.max(1),
        seed: args.seed,
        no_animation: args.no_animation,
    };
    let mut app = App::new(config, theme);
    app.run()?;
    Ok(())
}

/// Classic falling-block puzzle game in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "tetratui",
    version,
    about = "Classic falling-block puzzle in the terminal. Complete horizontal lines to score.",
    long_about = "Tetratui is a terminal rendition of the classic falling-block puzzle.\n\n\
        Steer the falling tetromino into the stack. Completed horizontal lines disappear; \
        every tenth line raises the level and speeds gravity up.\n\n\
        CONTROLS (normal):\n  Left/Right  Move    Up    Rotate    Down    Soft drop\n  P           Pause   Q / Esc     Quit\n\n\
        CONTROLS (vim):\n  h/l         Move    k     Rotate    j       Soft drop\n\n\
        Hold a movement key to keep the piece moving. Use --theme to load a btop-style theme (e.g. onedark.theme)."
)]
pub struct Args {
    /// Path to theme file (btop-style theme[key]=\"value\"). Uses One Dark if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<std::path::PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Playfield height in rows.
    #[arg(long, default_value = "20", value_name = "ROWS")]
    pub rows: u16,

    /// Playfield width in columns.
    #[arg(long, default_value = "10", value_name = "COLS")]
    pub cols: u16,

    /// Starting gravity interval in milliseconds (level 1 speed).
    #[arg(long, default_value = "500", value_name = "MS")]
    pub tick_ms: u64,

    /// RNG seed for the piece sequence. Same seed, same pieces.
    #[arg(long, value_name = "N")]
    pub seed: Option<u32>,

    /// Disable the line-clear flash animation.
    #[arg(long)]
    pub no_animation: bool,
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
