//! Piece generator: 2x2 quads of random palette colours from a random edge.

use crate::collab::Generator;
use crate::grid::Edge;
use ratatui::style::Color;

/// Four blocks entering together over lanes `lane` and `lane + 1`, two deep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quad {
    pub edge: Edge,
    pub lane: usize,
    /// colors[side][depth]; depth 0 leads.
    pub colors: [[Color; 2]; 2],
}

#[derive(Debug, Clone)]
pub struct QuadGenerator {
    rng: u32,
    level: usize,
    palette: Vec<Color>,
    grid_size: usize,
    next: Quad,
}

impl QuadGenerator {
    pub fn new(seed: u32, grid_size: usize) -> Self {
        let mut g = Self {
            rng: seed,
            level: 0,
            palette: vec![Color::Gray],
            grid_size,
            next: Quad {
                edge: Edge::Top,
                lane: 0,
                colors: [[Color::Gray; 2]; 2],
            },
        };
        g.next = g.roll();
        g
    }

    pub fn level(&self) -> usize {
        self.level
    }

    fn next_rand(&mut self) -> u32 {
        self.rng = self.rng.wrapping_mul(1103515245).wrapping_add(12345);
        self.rng >> 16
    }

    fn pick_color(&mut self) -> Color {
        let i = self.next_rand() as usize % self.palette.len().max(1);
        self.palette.get(i).copied().unwrap_or(Color::Gray)
    }

    fn roll(&mut self) -> Quad {
        let edge = Edge::ALL[self.next_rand() as usize % 4];
        let lane = self.next_rand() as usize % self.grid_size.saturating_sub(1).max(1);
        let colors = [
            [self.pick_color(), self.pick_color()],
            [self.pick_color(), self.pick_color()],
        ];
        Quad { edge, lane, colors }
    }
}

impl Generator for QuadGenerator {
    fn set_level(&mut self, level: usize, palette: &[Color]) {
        self.level = level;
        self.palette = palette.to_vec();
        // the preview should already use the new palette
        self.next = self.roll();
    }

    fn peek(&self) -> &Quad {
        &self.next
    }

    fn next_quad(&mut self, grid_size: usize) -> Quad {
        self.grid_size = grid_size;
        let upcoming = self.roll();
        std::mem::replace(&mut self.next, upcoming)
    }
}
