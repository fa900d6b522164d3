//! Edgefall: four-sided falling-block matching puzzle in the terminal.

mod app;
mod input;
mod ui;

use anyhow::{Context, Result};
use app::App;
use clap::Parser;
use edgefall::EngineConfig;
use std::path::PathBuf;
use std::time::Duration;

fn main() -> Result<()> {
    let args = Args::parse();
    let config = engine_config(&args)?;
    let mut app = App::new(args, config)?;
    app.run()?;
    Ok(())
}

/// Config file first, then command-line overrides.
fn engine_config(args: &Args) -> Result<EngineConfig> {
    let mut config = EngineConfig::load(args.config.as_deref())
        .with_context(|| format!("loading config {:?}", args.config))?;
    if let Some(size) = args.size {
        config.grid_size = size;
    }
    if let Some(ms) = args.cooldown_ms {
        config.cooldown = Duration::from_millis(ms);
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if args.no_animation {
        for level in &mut config.levels {
            level.drop_ms = 0;
        }
    }
    config.validate()?;
    Ok(config)
}

/// Four-sided falling-block matching puzzle in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "edgefall",
    version,
    about = "Four-sided falling-block puzzle: pieces drop in from every edge; complete a same-coloured 2x2 square to clear its whole region.",
    long_about = "Edgefall is a terminal puzzle on a square board with an unbreakable anchor in the middle.\n\n\
        Quads of four blocks drop in from any of the four edges and travel inward until they hit the \
        boundary or another block. A block that completes a 2x2 square of its colour clears every \
        block of that colour connected to it. Points raise the level; each level brings a new palette \
        and a fresh board.\n\n\
        CONTROLS (normal):\n  Arrows      Shift board   R / X      Rotate     Space/Enter  Drop\n  P           Pause         N          New game   Q / Esc      Quit\n\n\
        CONTROLS (vim):\n  h/j/k/l     Shift board   i          Rotate\n\n\
        Shifts are refused while a quad is still falling."
)]
pub struct Args {
    /// Config file with `key="value"` lines (grid size, checkpoints, per-level palettes).
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Board size in cells (odd, 3 to 255). Overrides the config file.
    #[arg(short, long, value_name = "CELLS")]
    pub size: Option<usize>,

    /// Move gate cooldown in ms for rotations and shifts.
    #[arg(long, value_name = "MS")]
    pub cooldown_ms: Option<u64>,

    /// Seed for the piece generator.
    #[arg(long, value_name = "N")]
    pub seed: Option<u32>,

    /// Target render frames per second.
    #[arg(long, default_value = "30.0", value_name = "RATE")]
    pub frame_rate: f64,

    /// Disable drop and clear animations (instant landing).
    #[arg(long)]
    pub no_animation: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_overrides_reach_the_engine_config() {
        let args = Args::parse_from(["edgefall", "--size", "11", "--cooldown-ms", "40", "--no-animation"]);
        let config = engine_config(&args).unwrap();
        assert_eq!(config.grid_size, 11);
        assert_eq!(config.cooldown, Duration::from_millis(40));
        assert!(config.levels.iter().all(|l| l.drop_ms == 0));
    }

    #[test]
    fn even_board_is_rejected() {
        let args = Args::parse_from(["edgefall", "--size", "8"]);
        assert!(engine_config(&args).is_err());
    }
}
