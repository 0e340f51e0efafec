//! Number Rush: type the scrolling numbers in order before they reach the wall.

mod app;
mod config;
mod game;
mod grid;
mod input;
mod theme;
mod ui;

use anyhow::{Context, Result};
use app::App;
use clap::{Parser, ValueEnum};
use config::GameConfig;
use std::path::{Path, PathBuf};

fn main() -> Result<()> {
    let args = Args::parse();
    if let Some(path) = args.log_file.as_deref() {
        init_logging(path)?;
    }

    let config = args.game_config();
    config.validate().context("invalid game configuration")?;
    let theme = theme::Theme::load(args.theme.as_deref(), args.palette).unwrap_or_else(|e| {
        log::warn!("theme not loaded, using default: {}", e);
        theme::Theme::default()
    });

    let mut app = App::new(config, theme, args.options())?;
    let score = app.run()?;
    println!("Game over! You scored {} points!", score);
    Ok(())
}

/// The terminal belongs to the game, so log lines go to a file. `RUST_LOG` picks the level.
fn init_logging(path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("cannot create log file {}", path.display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

/// Numbered tokens scroll towards the wall; press each digit in the order they appeared.
#[derive(Debug, Parser)]
#[command(
    name = "number-rush",
    version,
    about = "Type the scrolling numbers in order before they reach the wall.",
    long_about = "Number Rush: digits enter on the right of the field and scroll left.\n\n\
        Press the digit key of the OLDEST number still on the field to clear it and score. \
        Every few hundred points the numbers move faster. When a number reaches the left wall, \
        the game is over.\n\n\
        CONTROLS:\n  1-9        Clear the oldest number    R  Restart (after game over)\n  Q / Esc    Quit                       Ctrl+C  Quit"
)]
pub struct Args {
    /// Field width in cells, wall included.
    #[arg(long, default_value_t = config::DEFAULT_FIELD_WIDTH, value_name = "COLS")]
    pub width: usize,

    /// Field height in cells, wall included.
    #[arg(long, default_value_t = config::DEFAULT_FIELD_HEIGHT, value_name = "ROWS")]
    pub height: usize,

    /// Ticks per scroll step at the start (lower is faster).
    #[arg(long, default_value_t = config::DEFAULT_TICK_THRESHOLD, value_name = "TICKS")]
    pub tick_threshold: u32,

    /// Points per cleared number.
    #[arg(long, default_value_t = config::DEFAULT_REWARD, value_name = "POINTS")]
    pub reward: u32,

    /// Speed up each time the score passes a multiple of this.
    #[arg(long, default_value_t = config::DEFAULT_SPEEDUP_EVERY, value_name = "POINTS")]
    pub speedup_every: u32,

    /// Ticks removed from the scroll step on each speed-up.
    #[arg(long, default_value_t = config::DEFAULT_SPEEDUP_STEP, value_name = "TICKS")]
    pub speedup_step: u32,

    /// Fastest scroll step, in ticks.
    #[arg(long, default_value_t = config::DEFAULT_MIN_TICK_THRESHOLD, value_name = "TICKS")]
    pub min_threshold: u32,

    /// Chance (0 < p <= 1) that a scroll step brings in a new number.
    #[arg(long, default_value_t = 1.0, value_name = "P")]
    pub spawn_chance: f64,

    /// Random seed. Same seed and same key presses replay the same game.
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Length of one tick in milliseconds.
    #[arg(long, default_value = "10", value_name = "MS")]
    pub frame_ms: u64,

    /// Path to theme file (btop-style theme[key]=\"value\"). Uses One Dark if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Disable the fade-out of cleared numbers.
    #[arg(long)]
    pub no_animation: bool,

    /// Write logs to this file (level from RUST_LOG, default info).
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

impl Args {
    fn game_config(&self) -> GameConfig {
        GameConfig {
            width: self.width,
            height: self.height,
            tick_threshold: self.tick_threshold,
            reward: self.reward,
            speedup_every: self.speedup_every,
            speedup_step: self.speedup_step,
            min_tick_threshold: self.min_threshold,
            spawn_chance: self.spawn_chance,
            seed: self.seed.unwrap_or_else(rand::random),
        }
    }

    fn options(&self) -> AppOptions {
        AppOptions {
            frame: std::time::Duration::from_millis(self.frame_ms.max(1)),
            no_animation: self.no_animation,
        }
    }
}

/// Shell settings that do not affect the simulation.
#[derive(Debug, Clone, Copy)]
pub struct AppOptions {
    pub frame: std::time::Duration,
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
