//! Contracts of the engine's outside collaborators.
//!
//! Presentation calls are fire-and-forget: they never block or fail, and
//! every method has a no-op default so a front end only implements what it shows.

use crate::block::Block;
use crate::error::EngineError;
use crate::grid::{Coord, Grid, Point};
use crate::quad::Quad;
use ratatui::style::Color;
use std::time::Duration;

/// Produces pieces and performs board rotation.
pub trait Generator {
    /// New level: future pieces use `palette` (never empty).
    fn set_level(&mut self, level: usize, palette: &[Color]);

    /// The piece the next `next_quad` will hand out.
    fn peek(&self) -> &Quad;

    fn next_quad(&mut self, grid_size: usize) -> Quad;

    /// Rotate the board. Occupancy must be consistent again before returning.
    fn rotate(&mut self, grid: &mut Grid) -> Result<(), EngineError> {
        grid.rotate_cw();
        Ok(())
    }
}

pub trait Audio {
    fn play(&mut self, _track: &str) {}
}

pub trait Backdrop {
    fn new_color(&mut self, _color: Color) {}
}

pub trait Renderer {
    /// Block shown at a staging point, not yet on the board.
    fn display(&mut self, _block: &Block, _at: Point) {}

    /// Block already registered at its cell; tween it in from `from`.
    fn animate_drop(&mut self, _block: &Block, _from: Point, _to: Point, _duration: Duration) {}

    /// Block removed from `at`; play the shrink-out.
    fn destroy(&mut self, _block: &Block, _at: Coord) {}

    /// Colour changed on a visible block.
    fn refresh(&mut self, _block: &Block) {}

    fn scoreboard(&mut self, _text: &str) {}
}

/// Presentation that shows nothing. Used headless and in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

impl Audio for Silent {}
impl Backdrop for Silent {}
impl Renderer for Silent {}

pub struct Collaborators {
    pub generator: Box<dyn Generator>,
    pub audio: Box<dyn Audio>,
    pub backdrop: Box<dyn Backdrop>,
    pub renderer: Box<dyn Renderer>,
}

impl Collaborators {
    /// Generator only; everything visible or audible is silenced.
    pub fn headless(generator: impl Generator + 'static) -> Self {
        Self {
            generator: Box::new(generator),
            audio: Box::new(Silent),
            backdrop: Box::new(Silent),
            renderer: Box::new(Silent),
        }
    }
}
