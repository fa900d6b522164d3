//! Property tests: random play never breaks occupancy, and shifts always compact.

use edgefall::{
    Block, BlockColor, BlockId, Collaborators, Coord, Edge, Engine, EngineConfig, EngineError,
    Grid, Intent, QuadGenerator,
};
use proptest::prelude::*;
use ratatui::style::Color;
use std::collections::HashSet;
use std::time::{Duration, Instant};

const PALETTE: [Color; 3] = [Color::Red, Color::Green, Color::Blue];

#[derive(Debug, Clone)]
enum Op {
    Drop,
    Shift(Edge),
    Rotate,
    Wait(u64),
    Place { x: usize, y: usize, color: usize, animate: bool },
}

fn edge() -> impl Strategy<Value = Edge> {
    prop_oneof![
        Just(Edge::Top),
        Just(Edge::Bottom),
        Just(Edge::Left),
        Just(Edge::Right),
    ]
}

fn op(size: usize) -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Drop),
        edge().prop_map(Op::Shift),
        Just(Op::Rotate),
        (0u64..400).prop_map(Op::Wait),
        (0..size, 0..size, 0..PALETTE.len(), any::<bool>())
            .prop_map(|(x, y, color, animate)| Op::Place { x, y, color, animate }),
    ]
}

fn run(engine: &mut Engine, op: &Op, now: &mut Instant) -> Result<(), EngineError> {
    match *op {
        Op::Drop => engine.apply(Intent::Drop, *now).map(|_| ()),
        Op::Shift(edge) => engine.apply(Intent::Shift(edge), *now).map(|_| ()),
        Op::Rotate => engine.apply(Intent::Rotate, *now).map(|_| ()),
        Op::Wait(ms) => {
            *now += Duration::from_millis(ms);
            engine.tick(*now).map(|_| ())
        }
        Op::Place { x, y, color, animate } => {
            let block = engine.spawn(PALETTE[color], Edge::Top, x);
            engine
                .drop_block(block, Some(Coord::new(x, y)), animate, *now, Vec::new())
                .map(|_| ())
        }
    }
}

/// In every lane, the blocks between two walls sit flush against the nearer wall toward `edge`.
fn compacted(grid: &Grid, edge: Edge) -> bool {
    let n = grid.size();
    (0..n).all(|line| {
        let mut gap = false;
        (0..n).all(|depth| {
            let cell = match edge {
                Edge::Top => Coord::new(line, depth),
                Edge::Bottom => Coord::new(line, n - 1 - depth),
                Edge::Left => Coord::new(depth, line),
                Edge::Right => Coord::new(n - 1 - depth, line),
            };
            match grid.get(cell).ok().flatten() {
                None => {
                    gap = true;
                    true
                }
                Some(b) if b.is_unbreakable() => {
                    gap = false;
                    true
                }
                Some(_) => !gap,
            }
        })
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn random_play_keeps_the_board_consistent(
        ops in prop::collection::vec(op(7), 1..120),
        seed in any::<u32>(),
    ) {
        let mut config = EngineConfig::default();
        config.grid_size = 7;
        config.seed = seed;
        config.checkpoints = vec![10, 30, 60, 100];
        let generator = QuadGenerator::new(config.seed, config.grid_size);
        let mut engine = Engine::new(config, Collaborators::headless(generator)).unwrap();
        let middle = engine.grid().middle();
        let mut now = Instant::now();
        let (mut level, mut points) = (0, 0);

        for op in &ops {
            match run(&mut engine, op, &mut now) {
                Ok(()) | Err(EngineError::GridFull { .. } | EngineError::Blocked { .. }) => {}
                Err(e) => prop_assert!(false, "{op:?} failed: {e}"),
            }
            let grid = engine.grid();
            prop_assert!(grid.is_consistent());
            prop_assert!(grid.get(middle).unwrap().is_some_and(Block::is_unbreakable));
            prop_assert!(engine.score().level() >= level);
            prop_assert!(engine.score().points() >= points);
            level = engine.score().level();
            points = engine.score().points();
        }
    }

    #[test]
    fn slide_compacts_every_lane_and_keeps_every_block(
        cells in prop::collection::vec((0usize..9, 0usize..9, 0..PALETTE.len()), 0..60),
        edge in edge(),
    ) {
        let mut grid = Grid::new(9, 16);
        let middle = grid.middle();
        grid.reset_middle(Block::new(BlockId(0), BlockColor::Unbreakable, Edge::Top, middle.x)).unwrap();
        for (i, &(x, y, c)) in cells.iter().enumerate() {
            let at = Coord::new(x, y);
            if grid.get(at).unwrap().is_none() {
                let id = BlockId(i as u64 + 1);
                grid.set(at, Some(Block::new(id, BlockColor::Paint(PALETTE[c]), Edge::Top, x))).unwrap();
            }
        }
        let before: HashSet<BlockId> = grid.blocks().map(Block::id).collect();

        let moved = grid.slide(edge).unwrap();

        let after: HashSet<BlockId> = grid.blocks().map(Block::id).collect();
        prop_assert_eq!(before, after);
        prop_assert!(grid.is_consistent());
        prop_assert!(compacted(&grid, edge));
        prop_assert!(!moved.contains(&BlockId(0)));
        prop_assert_eq!(grid.locate(BlockId(0)), Some(middle));
        // a second slide has nothing left to do
        prop_assert!(grid.slide(edge).unwrap().is_empty());
    }
}
