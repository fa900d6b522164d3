//! Square detection and connected-region clearing.
//!
//! A settled block clears only when it is a corner of a full 2x2 square of its
//! own colour; then every 4-connected block of that colour goes with it.

use crate::block::{Block, BlockColor, BlockId};
use crate::error::EngineError;
use crate::grid::{Coord, Grid};
use std::collections::HashSet;

const NEIGHBOURS_4: [(isize, isize); 4] = [(0, -1), (-1, 0), (1, 0), (0, 1)];

/// Origins of the four 2x2 squares that have the trigger as a corner.
const SQUARE_ORIGINS: [(isize, isize); 4] = [(0, 0), (-1, 0), (0, -1), (-1, -1)];
const SQUARE_CELLS: [(isize, isize); 4] = [(0, 0), (1, 0), (0, 1), (1, 1)];

/// Colour at a signed position; anything off the board is simply absent.
fn color_at(grid: &Grid, x: isize, y: isize) -> Option<BlockColor> {
    if x < 0 || y < 0 {
        return None;
    }
    grid.get(Coord::new(x as usize, y as usize))
        .ok()
        .flatten()
        .map(Block::color)
}

/// Phase 1: does any 2x2 square through `coord` consist of four blocks of its colour?
pub fn square_at(grid: &Grid, coord: Coord) -> bool {
    let Some(color) = color_at(grid, coord.x as isize, coord.y as isize) else {
        return false;
    };
    SQUARE_ORIGINS.iter().any(|&(ox, oy)| {
        let (bx, by) = (coord.x as isize + ox, coord.y as isize + oy);
        SQUARE_CELLS
            .iter()
            .all(|&(cx, cy)| color_at(grid, bx + cx, by + cy).is_some_and(|c| c.matches(color)))
    })
}

/// Phase 2: remove the 4-connected region of `origin`'s colour from the live grid.
///
/// Each removed block is handed to `on_destroy` with the cell it occupied.
/// Returns the number of blocks removed.
pub fn sweep(
    grid: &mut Grid,
    origin: Coord,
    mut on_destroy: impl FnMut(Block, Coord),
) -> Result<usize, EngineError> {
    let Some(color) = grid.get(origin)?.map(Block::color) else {
        return Ok(0);
    };
    let size = grid.size() as isize;
    let mut visited: HashSet<BlockId> = HashSet::new();
    let mut stack = vec![origin];
    let mut destroyed = 0;

    while let Some(at) = stack.pop() {
        let id = match grid.get(at)? {
            Some(b) if b.color().matches(color) => b.id(),
            _ => continue,
        };
        if !visited.insert(id) {
            continue;
        }
        if let Some(block) = grid.take(at)? {
            on_destroy(block, at);
            destroyed += 1;
        }
        for (dx, dy) in NEIGHBOURS_4 {
            let (nx, ny) = (at.x as isize + dx, at.y as isize + dy);
            if nx >= 0 && ny >= 0 && nx < size && ny < size {
                stack.push(Coord::new(nx as usize, ny as usize));
            }
        }
    }
    Ok(destroyed)
}

/// Run both phases for the block `id`. `NotPlaced` if it is not on the grid.
pub fn clear(
    grid: &mut Grid,
    id: BlockId,
    on_destroy: impl FnMut(Block, Coord),
) -> Result<usize, EngineError> {
    let coord = grid.locate(id).ok_or(EngineError::NotPlaced(id))?;
    if !square_at(grid, coord) {
        return Ok(0);
    }
    sweep(grid, coord, on_destroy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Edge;
    use ratatui::style::Color;

    struct Board {
        grid: Grid,
        next: u64,
    }

    impl Board {
        fn new(size: usize) -> Self {
            Self {
                grid: Grid::new(size, 16),
                next: 1,
            }
        }

        fn paint(&mut self, x: usize, y: usize, color: Color) -> BlockId {
            self.place(x, y, BlockColor::Paint(color))
        }

        fn place(&mut self, x: usize, y: usize, color: BlockColor) -> BlockId {
            let id = BlockId(self.next);
            self.next += 1;
            self.grid
                .set(Coord::new(x, y), Some(Block::new(id, color, Edge::Top, x)))
                .unwrap();
            id
        }

        fn clear(&mut self, id: BlockId) -> usize {
            clear(&mut self.grid, id, |_, _| {}).unwrap()
        }
    }

    #[test]
    fn each_corner_of_a_square_triggers() {
        // Trigger at each of the four corners of the square (2..=3, 3..=4).
        for (tx, ty) in [(2, 3), (3, 3), (2, 4), (3, 4)] {
            let mut b = Board::new(7);
            let mut trigger = None;
            for (x, y) in [(2, 3), (3, 3), (2, 4), (3, 4)] {
                let id = b.paint(x, y, Color::Red);
                if (x, y) == (tx, ty) {
                    trigger = Some(id);
                }
            }
            assert_eq!(b.clear(trigger.unwrap()), 4, "trigger at ({tx}, {ty})");
            assert_eq!(b.grid.occupied(), 0);
        }
    }

    #[test]
    fn three_of_four_is_not_a_square() {
        let mut b = Board::new(7);
        let id = b.paint(2, 3, Color::Red);
        b.paint(3, 3, Color::Red);
        b.paint(2, 4, Color::Red);
        b.paint(3, 4, Color::Blue);
        assert!(!square_at(&b.grid, Coord::new(2, 3)));
        assert_eq!(b.clear(id), 0);
        assert_eq!(b.grid.occupied(), 4);
    }

    #[test]
    fn square_check_tolerates_the_border() {
        let mut b = Board::new(3);
        let id = b.paint(0, 0, Color::Red);
        b.paint(1, 0, Color::Red);
        assert_eq!(b.clear(id), 0);
        b.paint(0, 1, Color::Red);
        b.paint(1, 1, Color::Red);
        assert_eq!(b.clear(id), 4);
    }

    #[test]
    fn flood_fill_takes_the_whole_l_shape() {
        let mut b = Board::new(7);
        let id = b.paint(1, 1, Color::Green);
        b.paint(2, 1, Color::Green);
        b.paint(1, 2, Color::Green);
        b.paint(2, 2, Color::Green);
        // tail of the L
        b.paint(1, 3, Color::Green);
        b.paint(1, 4, Color::Green);
        b.paint(1, 5, Color::Green);
        // diagonal neighbour is not connected
        b.paint(3, 3, Color::Green);
        // different colour stays
        b.paint(2, 3, Color::Blue);
        let mut removed = Vec::new();
        let n = clear(&mut b.grid, id, |blk, at| removed.push((blk.id(), at))).unwrap();
        assert_eq!(n, 7);
        assert_eq!(removed.len(), 7);
        assert!(removed.iter().all(|(blk, _)| b.grid.locate(*blk).is_none()));
        assert_eq!(b.grid.occupied(), 2);
    }

    #[test]
    fn clearing_from_the_far_end_of_the_region_needs_a_square_there() {
        let mut b = Board::new(7);
        b.paint(1, 1, Color::Green);
        b.paint(2, 1, Color::Green);
        b.paint(1, 2, Color::Green);
        b.paint(2, 2, Color::Green);
        let tail = b.paint(1, 3, Color::Green);
        assert_eq!(b.clear(tail), 0);
    }

    #[test]
    fn flood_fill_takes_the_whole_plus_shape() {
        let mut b = Board::new(7);
        b.paint(3, 3, Color::Yellow);
        b.paint(4, 3, Color::Yellow);
        b.paint(3, 4, Color::Yellow);
        let id = b.paint(4, 4, Color::Yellow);
        for (x, y) in [(3, 2), (3, 1), (2, 3), (1, 3), (5, 4), (4, 5)] {
            b.paint(x, y, Color::Yellow);
        }
        assert_eq!(b.clear(id), 10);
        assert_eq!(b.grid.occupied(), 0);
    }

    #[test]
    fn unbreakable_cells_never_form_or_join_a_square() {
        let mut b = Board::new(5);
        b.place(1, 1, BlockColor::Unbreakable);
        b.place(2, 1, BlockColor::Unbreakable);
        let a = b.paint(1, 2, Color::Red);
        b.paint(2, 2, Color::Red);
        assert_eq!(b.clear(a), 0);

        // a real square next to an anchor leaves the anchor alone
        b.paint(1, 3, Color::Red);
        b.paint(2, 3, Color::Red);
        assert_eq!(b.clear(a), 4);
        assert_eq!(b.grid.occupied(), 2);
    }

    #[test]
    fn unbreakable_trigger_does_nothing() {
        let mut b = Board::new(5);
        let id = b.place(0, 0, BlockColor::Unbreakable);
        b.place(1, 0, BlockColor::Unbreakable);
        b.place(0, 1, BlockColor::Unbreakable);
        b.place(1, 1, BlockColor::Unbreakable);
        assert_eq!(b.clear(id), 0);
        assert_eq!(b.grid.occupied(), 4);
    }

    #[test]
    fn clear_of_unplaced_block_fails() {
        let mut b = Board::new(5);
        assert_eq!(
            clear(&mut b.grid, BlockId(42), |_, _| {}),
            Err(EngineError::NotPlaced(BlockId(42)))
        );
    }
}
