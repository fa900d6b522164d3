//! Grid store: square occupancy array, edge-relative lanes, slides and rotation.
//!
//! `y = 0` is the top row. Every stored block records the coordinate of the
//! slot that holds it; all mutation goes through this type so the two never drift.

use crate::block::{Block, BlockId};
use crate::error::EngineError;
use std::fmt;
use std::str::FromStr;

/// Logical cell position (column, row).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Coord {
    pub x: usize,
    pub y: usize,
}

impl Coord {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

/// Pixel position; negative or past the far edge for staging points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

/// One of the four drop zones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Edge {
    Top,
    Bottom,
    Left,
    Right,
}

impl Edge {
    pub const ALL: [Self; 4] = [Self::Top, Self::Right, Self::Bottom, Self::Left];

    /// Unit step toward this edge.
    const fn delta(self) -> (isize, isize) {
        match self {
            Self::Top => (0, -1),
            Self::Bottom => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
        }
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Top => "top",
            Self::Bottom => "bottom",
            Self::Left => "left",
            Self::Right => "right",
        };
        f.write_str(name)
    }
}

impl FromStr for Edge {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "top" | "up" => Ok(Self::Top),
            "bottom" | "down" => Ok(Self::Bottom),
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            _ => Err(EngineError::InvalidDirection(s.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Grid {
    size: usize,
    /// Pixel size of one cell (staging geometry only).
    cell_px: i32,
    /// cells[y * size + x]
    cells: Vec<Option<Block>>,
    /// Protected cell holding the unbreakable anchor.
    middle: Coord,
}

impl Grid {
    /// `size` should be odd so the middle cell is a true centre and maps onto
    /// itself under rotation.
    pub fn new(size: usize, cell_px: i32) -> Self {
        Self {
            size,
            cell_px,
            cells: (0..size * size).map(|_| None).collect(),
            middle: Coord::new(size / 2, size / 2),
        }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn middle(&self) -> Coord {
        self.middle
    }

    #[inline]
    pub fn is_protected(&self, coord: Coord) -> bool {
        coord == self.middle
    }

    #[inline]
    fn index(&self, coord: Coord) -> Result<usize, EngineError> {
        if coord.x >= self.size || coord.y >= self.size {
            return Err(EngineError::out_of_bounds(coord.x, coord.y));
        }
        Ok(coord.y * self.size + coord.x)
    }

    pub fn get(&self, coord: Coord) -> Result<Option<&Block>, EngineError> {
        let idx = self.index(coord)?;
        Ok(self.cells[idx].as_ref())
    }

    pub(crate) fn get_mut(&mut self, coord: Coord) -> Result<Option<&mut Block>, EngineError> {
        let idx = self.index(coord)?;
        Ok(self.cells[idx].as_mut())
    }

    /// Store (or empty) a slot. A stored block is re-pointed at `coord`; the
    /// previous occupant is returned unplaced.
    pub fn set(&mut self, coord: Coord, block: Option<Block>) -> Result<Option<Block>, EngineError> {
        let idx = self.index(coord)?;
        let block = block.map(|mut b| {
            b.position_at(coord);
            b
        });
        let mut previous = std::mem::replace(&mut self.cells[idx], block);
        if let Some(b) = previous.as_mut() {
            b.unplace();
        }
        Ok(previous)
    }

    pub fn take(&mut self, coord: Coord) -> Result<Option<Block>, EngineError> {
        self.set(coord, None)
    }

    /// Cell at `depth` cells in from `edge` along lane `line`.
    pub(crate) fn along(&self, edge: Edge, line: usize, depth: usize) -> Coord {
        let far = self.size - 1;
        match edge {
            Edge::Top => Coord::new(line, depth),
            Edge::Bottom => Coord::new(line, far - depth),
            Edge::Left => Coord::new(depth, line),
            Edge::Right => Coord::new(far - depth, line),
        }
    }

    /// Resting cell for a block entering from `edge` in lane `position`: it
    /// travels inward until the next cell is occupied or the far boundary.
    pub fn first_available(&self, edge: Edge, position: usize) -> Result<Coord, EngineError> {
        if position >= self.size {
            return Err(match edge {
                Edge::Top | Edge::Bottom => EngineError::out_of_bounds(position, 0),
                Edge::Left | Edge::Right => EngineError::out_of_bounds(0, position),
            });
        }
        let mut rest = None;
        for depth in 0..self.size {
            let cell = self.along(edge, position, depth);
            if self.cells[cell.y * self.size + cell.x].is_some() {
                break;
            }
            rest = Some(cell);
        }
        rest.ok_or(EngineError::GridFull { edge, position })
    }

    /// Staging point `offset + 1` cells outside `edge` in lane `position`.
    pub fn direction_to_point(&self, edge: Edge, position: usize, offset: usize) -> Point {
        let px = self.cell_px;
        let lane = position as i32 * px;
        let out = (offset as i32 + 1) * px;
        let far = self.size as i32 * px;
        match edge {
            Edge::Top => Point { x: lane, y: -out },
            Edge::Bottom => Point { x: lane, y: far + out - px },
            Edge::Left => Point { x: -out, y: lane },
            Edge::Right => Point { x: far + out - px, y: lane },
        }
    }

    pub fn point_of(&self, coord: Coord) -> Point {
        Point {
            x: coord.x as i32 * self.cell_px,
            y: coord.y as i32 * self.cell_px,
        }
    }

    /// Move one block one cell toward `edge`.
    ///
    /// `Blocked` when `from` is empty or unbreakable, or the destination is taken.
    pub fn step(&mut self, from: Coord, edge: Edge) -> Result<Coord, EngineError> {
        let src = self.index(from)?;
        let (dx, dy) = edge.delta();
        let (tx, ty) = (from.x as isize + dx, from.y as isize + dy);
        if tx < 0 || ty < 0 || tx >= self.size as isize || ty >= self.size as isize {
            return Err(EngineError::OutOfBounds { x: tx, y: ty });
        }
        let to = Coord::new(tx as usize, ty as usize);
        let dst = self.index(to)?;
        if self.cells[dst].is_some() {
            return Err(EngineError::Blocked { x: to.x, y: to.y });
        }
        match self.cells[src].take() {
            Some(mut block) if !block.is_unbreakable() => match block.slide(edge) {
                Ok(_) => {
                    self.cells[dst] = Some(block);
                    Ok(to)
                }
                Err(e) => {
                    self.cells[src] = Some(block);
                    Err(e)
                }
            },
            other => {
                self.cells[src] = other;
                Err(EngineError::Blocked { x: from.x, y: from.y })
            }
        }
    }

    /// Compact every breakable block toward `edge`, lane by lane, with no gaps.
    /// Unbreakable blocks stay put and act as a wall. Returns the ids that moved.
    pub fn slide(&mut self, edge: Edge) -> Result<Vec<BlockId>, EngineError> {
        let mut moved = Vec::new();
        for line in 0..self.size {
            let mut target = 0;
            for depth in 0..self.size {
                let cell = self.along(edge, line, depth);
                let (id, wall) = match self.get(cell)? {
                    None => continue,
                    Some(b) => (b.id(), b.is_unbreakable()),
                };
                if wall {
                    target = depth + 1;
                    continue;
                }
                if target < depth {
                    let mut at = cell;
                    for _ in target..depth {
                        at = self.step(at, edge)?;
                    }
                    moved.push(id);
                }
                target += 1;
            }
        }
        Ok(moved)
    }

    /// Empty every slot outside the protected middle. Returns what was removed
    /// with the cell each block came from.
    pub fn clear_all(&mut self) -> Vec<(Coord, Block)> {
        let size = self.size;
        let middle = self.middle;
        self.cells
            .iter_mut()
            .enumerate()
            .map(|(idx, slot)| (Coord::new(idx % size, idx / size), slot))
            .filter(|(at, _)| *at != middle)
            .filter_map(|(at, slot)| slot.take().map(|b| (at, b)))
            .map(|(at, mut b)| {
                b.unplace();
                (at, b)
            })
            .collect()
    }

    /// Put a fresh anchor into the protected middle; returns the old occupant.
    pub fn reset_middle(&mut self, anchor: Block) -> Result<Option<Block>, EngineError> {
        self.set(self.middle, Some(anchor))
    }

    /// Rigid quarter turn clockwise of the whole board.
    pub fn rotate_cw(&mut self) {
        let n = self.size;
        let mut rotated: Vec<Option<Block>> = (0..n * n).map(|_| None).collect();
        for (idx, slot) in self.cells.iter_mut().enumerate() {
            if let Some(mut block) = slot.take() {
                let (x, y) = (idx % n, idx / n);
                let to = Coord::new(n - 1 - y, x);
                block.position_at(to);
                rotated[to.y * n + to.x] = Some(block);
            }
        }
        self.cells = rotated;
    }

    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.cells.iter().flatten()
    }

    pub fn occupied(&self) -> usize {
        self.blocks().count()
    }

    pub fn locate(&self, id: BlockId) -> Option<Coord> {
        self.blocks().find(|b| b.id() == id).and_then(Block::coordinate)
    }

    /// Every stored block records exactly the slot holding it.
    pub fn is_consistent(&self) -> bool {
        self.cells.iter().enumerate().all(|(idx, slot)| match slot {
            Some(b) => b.coordinate() == Some(Coord::new(idx % self.size, idx / self.size)),
            None => true,
        })
    }
}
