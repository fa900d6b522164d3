//! Block entity: one grid occupant with a colour, an entry edge and a coordinate.

use crate::error::EngineError;
use crate::grid::{Coord, Edge, Point};
use ratatui::style::Color;
use std::fmt;

/// Identity of a block for the lifetime of an engine. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub u64);

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Palette colour, or the reserved sentinel that never matches anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockColor {
    Paint(Color),
    Unbreakable,
}

impl BlockColor {
    /// True only for two equal palette colours. The sentinel does not even match itself.
    #[inline]
    pub fn matches(self, other: Self) -> bool {
        match (self, other) {
            (Self::Paint(a), Self::Paint(b)) => a == b,
            _ => false,
        }
    }

    pub fn is_unbreakable(self) -> bool {
        self == Self::Unbreakable
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    id: BlockId,
    color: BlockColor,
    /// `None` while staged or in the generator's hands.
    coordinate: Option<Coord>,
    /// Edge the block enters from; only used to compute its entry slot.
    direction: Edge,
    /// Lane along `direction` (column for top/bottom, row for left/right).
    lane: usize,
    visible: bool,
    staged_at: Option<Point>,
}

impl Block {
    pub fn new(id: BlockId, color: BlockColor, direction: Edge, lane: usize) -> Self {
        Self {
            id,
            color,
            coordinate: None,
            direction,
            lane,
            visible: false,
            staged_at: None,
        }
    }

    pub fn id(&self) -> BlockId {
        self.id
    }

    pub fn color(&self) -> BlockColor {
        self.color
    }

    pub fn coordinate(&self) -> Option<Coord> {
        self.coordinate
    }

    pub fn direction(&self) -> Edge {
        self.direction
    }

    pub fn lane(&self) -> usize {
        self.lane
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn staged_at(&self) -> Option<Point> {
        self.staged_at
    }

    pub fn is_unbreakable(&self) -> bool {
        self.color.is_unbreakable()
    }

    pub fn matching_color(&self, other: &Self) -> bool {
        self.color.matches(other.color)
    }

    /// Show the block at a staging point outside the grid. Does not touch occupancy.
    pub fn display(&mut self, at: Point) {
        self.visible = true;
        self.staged_at = Some(at);
    }

    /// Move one cell toward `edge`. Pure state update: the caller guarantees the
    /// destination is free.
    pub fn slide(&mut self, edge: Edge) -> Result<Coord, EngineError> {
        let Coord { x, y } = self.coordinate.ok_or(EngineError::NotPlaced(self.id))?;
        let next = match edge {
            Edge::Top => y.checked_sub(1).map(|y| Coord { x, y }),
            Edge::Bottom => Some(Coord { x, y: y + 1 }),
            Edge::Left => x.checked_sub(1).map(|x| Coord { x, y }),
            Edge::Right => Some(Coord { x: x + 1, y }),
        };
        let next = next.ok_or(EngineError::OutOfBounds {
            x: if edge == Edge::Left { -1 } else { x as isize },
            y: if edge == Edge::Top { -1 } else { y as isize },
        })?;
        self.coordinate = Some(next);
        Ok(next)
    }

    /// Place at an exact coordinate with no animation.
    pub fn position_at(&mut self, coord: Coord) {
        self.coordinate = Some(coord);
        self.visible = true;
        self.staged_at = None;
    }

    pub(crate) fn unplace(&mut self) {
        self.coordinate = None;
    }

    /// Turn into the clear-immune sentinel. Returns true when a visual refresh is due.
    pub fn unbreakable(&mut self) -> bool {
        self.color = BlockColor::Unbreakable;
        self.visible
    }

    /// Give the block a normal palette colour again. Returns true when a visual refresh is due.
    pub fn breakable(&mut self, color: Color) -> bool {
        self.color = BlockColor::Paint(color);
        self.visible
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn red(id: u64) -> Block {
        Block::new(BlockId(id), BlockColor::Paint(Color::Red), Edge::Top, 0)
    }

    #[test]
    fn sentinel_never_matches() {
        let u = BlockColor::Unbreakable;
        assert!(!u.matches(u));
        assert!(!u.matches(BlockColor::Paint(Color::Red)));
        assert!(BlockColor::Paint(Color::Red).matches(BlockColor::Paint(Color::Red)));
        assert!(!BlockColor::Paint(Color::Red).matches(BlockColor::Paint(Color::Blue)));
    }

    #[test]
    fn slide_moves_one_cell_per_axis() {
        let mut b = red(1);
        b.position_at(Coord { x: 2, y: 2 });
        assert_eq!(b.slide(Edge::Top).unwrap(), Coord { x: 2, y: 1 });
        assert_eq!(b.slide(Edge::Right).unwrap(), Coord { x: 3, y: 1 });
        assert_eq!(b.slide(Edge::Bottom).unwrap(), Coord { x: 3, y: 2 });
        assert_eq!(b.slide(Edge::Left).unwrap(), Coord { x: 2, y: 2 });
    }

    #[test]
    fn slide_unplaced_is_not_placed() {
        let mut b = red(7);
        assert_eq!(b.slide(Edge::Left), Err(EngineError::NotPlaced(BlockId(7))));
    }

    #[test]
    fn slide_past_origin_is_out_of_bounds() {
        let mut b = red(1);
        b.position_at(Coord { x: 0, y: 0 });
        assert!(matches!(b.slide(Edge::Left), Err(EngineError::OutOfBounds { x: -1, .. })));
        assert_eq!(b.coordinate(), Some(Coord { x: 0, y: 0 }));
    }

    #[test]
    fn unbreakable_requests_refresh_only_when_visible() {
        let mut b = red(1);
        assert!(!b.unbreakable());
        b.display(Point { x: 0, y: -16 });
        assert!(b.unbreakable());
        assert!(b.is_unbreakable());
        assert!(b.breakable(Color::Green));
        assert_eq!(b.color(), BlockColor::Paint(Color::Green));
    }
}
