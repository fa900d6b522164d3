//! Edgefall: four-sided falling-block matching puzzle.
//!
//! Blocks enter from any edge of a square board and travel inward until they
//! rest against the boundary or another block. A settled block that completes a
//! same-coloured 2x2 square clears its whole connected region; clears score
//! points, points advance levels, and each level brings a new palette and a
//! fresh board around an unbreakable anchor.

pub mod block;
pub mod clear;
pub mod collab;
pub mod config;
pub mod engine;
pub mod error;
pub mod gate;
pub mod grid;
pub mod quad;
pub mod score;

pub use block::{Block, BlockColor, BlockId};
pub use collab::{Audio, Backdrop, Collaborators, Generator, Renderer, Silent};
pub use config::{EngineConfig, LevelSpec, MAX_GRID_SIZE};
pub use engine::{DropHandler, Engine};
pub use error::{ConfigError, EngineError};
pub use gate::{Intent, MoveGate};
pub use grid::{Coord, Edge, Grid, Point};
pub use quad::{Quad, QuadGenerator};
pub use score::{Score, ScoreUpdate};
