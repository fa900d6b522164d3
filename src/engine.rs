//! Engine context: the one place that owns grid, score, move gate and collaborators.
//!
//! Every operation takes `&mut Engine`, so independent games (and tests) never
//! share state. Occupancy changes are synchronous: a block is in the grid the
//! moment its drop is accepted, and only the visual tween is deferred.

use crate::block::{Block, BlockColor, BlockId};
use crate::clear;
use crate::collab::{Collaborators, Generator};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::gate::{Intent, MoveGate};
use crate::grid::{Coord, Edge, Grid};
use crate::score::Score;
use ratatui::style::Color;
use std::time::{Duration, Instant};

/// Runs when a drop completes, after the default clear check.
pub type DropHandler = Box<dyn FnOnce(&mut Engine, BlockId) -> Result<(), EngineError>>;

/// Runs once after every accepted intent.
pub type PostMoveHook = Box<dyn FnMut(Intent, &Grid)>;

/// A registered block whose drop animation has not finished yet.
struct InFlight {
    id: BlockId,
    lands_at: Instant,
    handlers: Vec<DropHandler>,
}

pub struct Engine {
    config: EngineConfig,
    grid: Grid,
    score: Score,
    gate: MoveGate,
    collab: Collaborators,
    in_flight: Vec<InFlight>,
    post_move: Vec<PostMoveHook>,
    next_id: u64,
}

impl Engine {
    /// Fresh game at level 0 with an unbreakable anchor in the middle.
    /// Fails with `EngineError::Config` when `config` does not validate.
    pub fn new(config: EngineConfig, collab: Collaborators) -> Result<Self, EngineError> {
        config.validate()?;
        let mut engine = Self {
            grid: Grid::new(config.grid_size, config.cell_px),
            score: Score::new(config.checkpoints.clone(), config.exponents()),
            gate: MoveGate::new(config.cooldown),
            config,
            collab,
            in_flight: Vec::new(),
            post_move: Vec::new(),
            next_id: 1,
        };
        let palette = engine.palette().to_vec();
        engine.collab.generator.set_level(0, &palette);
        engine.seed_anchor()?;
        let status = engine.score.status_text();
        engine.collab.renderer.scoreboard(&status);
        Ok(engine)
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn score(&self) -> &Score {
        &self.score
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn gate(&self) -> &MoveGate {
        &self.gate
    }

    pub fn generator(&self) -> &dyn Generator {
        self.collab.generator.as_ref()
    }

    /// Palette of the current level.
    pub fn palette(&self) -> &[Color] {
        self.config
            .level(self.score.level())
            .map(|l| l.palette.as_slice())
            .unwrap_or_default()
    }

    /// Number of blocks still mid drop-animation.
    pub fn falling(&self) -> usize {
        self.in_flight.len()
    }

    pub fn is_falling(&self, id: BlockId) -> bool {
        self.in_flight.iter().any(|f| f.id == id)
    }

    fn drop_duration(&self) -> Duration {
        let ms = self.config.level(self.score.level()).map_or(0, |l| l.drop_ms);
        Duration::from_millis(ms)
    }

    fn primary_color(&self) -> Color {
        self.palette().first().copied().unwrap_or(self.config.unbreakable)
    }

    /// New staged block with a fresh id.
    pub fn spawn(&mut self, color: Color, edge: Edge, lane: usize) -> Block {
        let id = BlockId(self.next_id);
        self.next_id += 1;
        Block::new(id, BlockColor::Paint(color), edge, lane)
    }

    /// Show a staged block `offset` cells outside its entry edge.
    pub fn display(&mut self, block: &mut Block, offset: usize) {
        let at = self
            .grid
            .direction_to_point(block.direction(), block.lane(), offset);
        block.display(at);
        self.collab.renderer.display(block, at);
    }

    /// Register `block` at `at` (or its resting cell from its entry edge).
    ///
    /// Registration happens before anything else. With `animate` the block
    /// stays in flight until `tick` sees its landing time; otherwise the
    /// completion chain (clear check, then `handlers` in order) runs now.
    pub fn drop_block(
        &mut self,
        block: Block,
        at: Option<Coord>,
        animate: bool,
        now: Instant,
        handlers: Vec<DropHandler>,
    ) -> Result<Coord, EngineError> {
        let target = match at {
            Some(coord) => coord,
            None => self.grid.first_available(block.direction(), block.lane())?,
        };
        if self.grid.get(target)?.is_some() {
            return Err(EngineError::Blocked {
                x: target.x,
                y: target.y,
            });
        }
        let from = block.staged_at().unwrap_or_else(|| {
            self.grid
                .direction_to_point(block.direction(), block.lane(), 0)
        });
        let id = block.id();
        self.grid.set(target, Some(block))?;

        let duration = self.drop_duration();
        if animate && !duration.is_zero() {
            let to = self.grid.point_of(target);
            if let Some(placed) = self.grid.get(target)? {
                self.collab.renderer.animate_drop(placed, from, to, duration);
            }
            self.in_flight.push(InFlight {
                id,
                lands_at: now + duration,
                handlers,
            });
        } else {
            self.complete_drop(id, handlers)?;
        }
        Ok(target)
    }

    fn complete_drop(&mut self, id: BlockId, handlers: Vec<DropHandler>) -> Result<(), EngineError> {
        // An earlier clear may already have consumed the block.
        if self.grid.locate(id).is_some() {
            self.clear(id)?;
        }
        for handler in handlers {
            handler(self, id)?;
        }
        Ok(())
    }

    /// Land every in-flight block whose animation has ended. Returns how many landed.
    pub fn tick(&mut self, now: Instant) -> Result<usize, EngineError> {
        let mut landed = 0;
        while let Some(pos) = self.in_flight.iter().position(|f| f.lands_at <= now) {
            let flight = self.in_flight.remove(pos);
            self.complete_drop(flight.id, flight.handlers)?;
            landed += 1;
        }
        Ok(landed)
    }

    /// Match check for a settled block; scores the clear and levels up when due.
    /// Returns the number of blocks removed.
    pub fn clear(&mut self, id: BlockId) -> Result<usize, EngineError> {
        let renderer = &mut self.collab.renderer;
        let cleared = clear::clear(&mut self.grid, id, |block, at| renderer.destroy(&block, at))?;
        if cleared == 0 {
            return Ok(0);
        }
        let update = self
            .score
            .update(u32::try_from(cleared).unwrap_or(u32::MAX));
        self.collab.renderer.scoreboard(&update.status);
        if let Some(level) = update.level_up {
            self.level_transition(level)?;
        }
        Ok(cleared)
    }

    /// Level-up side effects. Theme changes come first so the reset shows the new level.
    fn level_transition(&mut self, level: usize) -> Result<(), EngineError> {
        let palette = self
            .config
            .level(level)
            .map(|l| l.palette.clone())
            .unwrap_or_default();
        let primary = self.primary_color();
        self.collab.generator.set_level(level, &palette);
        self.collab.audio.play(&format!("background{}", level + 1));
        self.collab.backdrop.new_color(primary);

        let middle = self.grid.middle();
        if let Some(anchor) = self.grid.get_mut(middle)? {
            if anchor.breakable(primary) {
                self.collab.renderer.refresh(anchor);
            }
        }
        for (at, block) in self.grid.clear_all() {
            self.collab.renderer.destroy(&block, at);
        }
        // whatever was still falling went with the board; only its handlers remain
        let stranded = std::mem::take(&mut self.in_flight);
        self.seed_anchor()?;

        let status = self.score.status_text();
        self.collab.renderer.scoreboard(&status);
        for flight in stranded {
            for handler in flight.handlers {
                handler(self, flight.id)?;
            }
        }
        Ok(())
    }

    /// Restore the protected middle and plant a new unbreakable anchor there.
    fn seed_anchor(&mut self) -> Result<(), EngineError> {
        let middle = self.grid.middle();
        if let Some(old) = self.grid.take(middle)? {
            self.collab.renderer.destroy(&old, middle);
        }
        let primary = self.primary_color();
        let mut anchor = self.spawn(primary, Edge::Top, middle.x);
        anchor.position_at(middle);
        anchor.unbreakable();
        self.grid.reset_middle(anchor)?;
        if let Some(placed) = self.grid.get(middle)? {
            self.collab.renderer.refresh(placed);
        }
        Ok(())
    }

    /// Take the generator's next quad and drop it: both leading blocks, then
    /// both trailing ones. Returns the cells taken.
    pub fn drop_next(&mut self, now: Instant) -> Result<Vec<Coord>, EngineError> {
        let quad = self.collab.generator.next_quad(self.grid.size());
        let mut placed = Vec::with_capacity(4);
        for depth in 0..2 {
            for side in 0..2 {
                let mut block = self.spawn(quad.colors[side][depth], quad.edge, quad.lane + side);
                self.display(&mut block, depth);
                placed.push(self.drop_block(block, None, true, now, Vec::new())?);
            }
        }
        Ok(placed)
    }

    pub fn on_post_move(&mut self, hook: impl FnMut(Intent, &Grid) + 'static) {
        self.post_move.push(Box::new(hook));
    }

    /// Gate and perform one move intent. `Ok(false)` means it was silently dropped.
    ///
    /// Post-move hooks fire exactly once per accepted intent, after its effect.
    pub fn apply(&mut self, intent: Intent, now: Instant) -> Result<bool, EngineError> {
        match intent {
            Intent::Rotate => {
                if !self.gate.try_rotate(now) {
                    return Ok(false);
                }
                self.collab.generator.rotate(&mut self.grid)?;
            }
            Intent::Shift(edge) => {
                if !self.gate.try_shift(now, self.falling()) {
                    return Ok(false);
                }
                for id in self.grid.slide(edge)? {
                    if self.grid.locate(id).is_some() {
                        self.clear(id)?;
                    }
                }
            }
            Intent::Drop => {
                self.drop_next(now)?;
            }
        }
        for hook in &mut self.post_move {
            hook(intent, &self.grid);
        }
        Ok(true)
    }
}
