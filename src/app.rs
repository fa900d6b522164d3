//! App: terminal init, main loop, collaborator wiring and key handling.

use crate::Args;
use crate::input::{Action, key_to_action};
use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use edgefall::{
    Audio, Backdrop, Block, BlockColor, BlockId, Collaborators, Coord, Engine, EngineConfig,
    EngineError, Intent, Point, QuadGenerator, Renderer,
};
use ratatui::DefaultTerminal;
use ratatui::style::Color;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::{Duration, Instant};
use tachyonfx::Effect;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Playing,
    GameOver,
}

/// Drop tween in staging-point units.
#[derive(Debug, Clone, Copy)]
pub struct Tween {
    pub id: BlockId,
    pub from: Point,
    pub to: Point,
    pub started: Instant,
    pub duration: Duration,
}

impl Tween {
    /// Interpolated position at `now`.
    pub fn at(&self, now: Instant) -> (f32, f32) {
        let t = if self.duration.is_zero() {
            1.0
        } else {
            (now.saturating_duration_since(self.started).as_secs_f32() / self.duration.as_secs_f32())
                .min(1.0)
        };
        let lerp = |a: i32, b: i32| a as f32 + (b - a) as f32 * t;
        (lerp(self.from.x, self.to.x), lerp(self.from.y, self.to.y))
    }

    pub fn finished(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.started) >= self.duration
    }
}

/// Everything the engine has told the front end so far.
#[derive(Debug, Default)]
pub struct Stage {
    pub scoreboard: String,
    pub track: String,
    /// Border colour; `None` until the first level-up.
    pub backdrop: Option<Color>,
    pub unbreakable: Color,
    pub tweens: Vec<Tween>,
    /// Cells emptied by clears, still fading out.
    pub fading: Vec<(Coord, Color)>,
    /// `fading` grew since the running fade effect was built.
    pub fading_dirty: bool,
}

impl Stage {
    pub fn color_of(&self, color: BlockColor) -> Color {
        match color {
            BlockColor::Paint(c) => c,
            BlockColor::Unbreakable => self.unbreakable,
        }
    }

    /// Tween still heading for `to`, if the block has one.
    pub fn tween_to(&self, id: BlockId, to: Point) -> Option<&Tween> {
        self.tweens.iter().find(|t| t.id == id && t.to == to)
    }
}

/// One stage behind the renderer, audio and backdrop slots.
#[derive(Clone)]
struct StageHandle(Rc<RefCell<Stage>>);

impl Renderer for StageHandle {
    fn animate_drop(&mut self, block: &Block, from: Point, to: Point, duration: Duration) {
        self.0.borrow_mut().tweens.push(Tween {
            id: block.id(),
            from,
            to,
            started: Instant::now(),
            duration,
        });
    }

    fn destroy(&mut self, block: &Block, at: Coord) {
        let mut stage = self.0.borrow_mut();
        stage.tweens.retain(|t| t.id != block.id());
        let color = stage.color_of(block.color());
        stage.fading.push((at, color));
        stage.fading_dirty = true;
    }

    fn scoreboard(&mut self, text: &str) {
        self.0.borrow_mut().scoreboard = text.to_string();
    }
}

impl Audio for StageHandle {
    fn play(&mut self, track: &str) {
        self.0.borrow_mut().track = track.to_string();
    }
}

impl Backdrop for StageHandle {
    fn new_color(&mut self, color: Color) {
        self.0.borrow_mut().backdrop = Some(color);
    }
}

/// A fresh engine wired to a fresh stage. The flag goes up once a move leaves no empty cell.
fn new_game(config: &EngineConfig) -> Result<(Engine, Rc<RefCell<Stage>>, Rc<Cell<bool>>), EngineError> {
    let stage = Rc::new(RefCell::new(Stage {
        track: "background1".to_string(),
        unbreakable: config.unbreakable,
        ..Stage::default()
    }));
    let handle = StageHandle(Rc::clone(&stage));
    let collab = Collaborators {
        generator: Box::new(QuadGenerator::new(config.seed, config.grid_size)),
        audio: Box::new(handle.clone()),
        backdrop: Box::new(handle.clone()),
        renderer: Box::new(handle),
    };
    let mut engine = Engine::new(config.clone(), collab)?;
    let board_full = Rc::new(Cell::new(false));
    let flag = Rc::clone(&board_full);
    engine.on_post_move(move |_, grid| flag.set(grid.occupied() == grid.size() * grid.size()));
    Ok((engine, stage, board_full))
}

pub struct App {
    args: Args,
    config: EngineConfig,
    engine: Engine,
    stage: Rc<RefCell<Stage>>,
    board_full: Rc<Cell<bool>>,
    screen: Screen,
    paused: bool,
    /// Games started; offsets the seed so restarts differ.
    games: u32,
    /// TachyonFX fade over freshly cleared cells.
    clear_effect: Option<Effect>,
    /// Last time we processed the clear effect (for delta).
    clear_effect_time: Option<Instant>,
}

impl App {
    pub fn new(args: Args, config: EngineConfig) -> Result<Self> {
        let (engine, stage, board_full) = new_game(&config)?;
        Ok(Self {
            args,
            config,
            engine,
            stage,
            board_full,
            screen: Screen::Playing,
            paused: false,
            games: 0,
            clear_effect: None,
            clear_effect_time: None,
        })
    }

    fn restart(&mut self) -> Result<()> {
        self.games = self.games.wrapping_add(1);
        let mut config = self.config.clone();
        config.seed = config.seed.wrapping_add(self.games);
        let (engine, stage, board_full) = new_game(&config)?;
        self.engine = engine;
        self.stage = stage;
        self.board_full = board_full;
        self.screen = Screen::Playing;
        self.paused = false;
        self.clear_effect = None;
        self.clear_effect_time = None;
        Ok(())
    }

    /// Forward a move to the engine. A quad with nowhere to go ends the game.
    fn apply(&mut self, intent: Intent, now: Instant) -> Result<()> {
        match self.engine.apply(intent, now) {
            Ok(_) => {}
            Err(EngineError::GridFull { .. }) => self.screen = Screen::GameOver,
            Err(e) => return Err(e.into()),
        }
        if self.board_full.get() {
            self.screen = Screen::GameOver;
        }
        Ok(())
    }

    /// Returns true when the player quits.
    fn handle(&mut self, action: Action, now: Instant) -> Result<bool> {
        match (self.screen, action) {
            (_, Action::Quit) => return Ok(true),
            (_, Action::Restart) => self.restart()?,
            (Screen::Playing, Action::Pause) => self.paused = !self.paused,
            (Screen::Playing, Action::Move(intent)) if !self.paused => self.apply(intent, now)?,
            _ => {}
        }
        Ok(false)
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let mut terminal = ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

        let result = self.run_loop(&mut terminal);

        execute!(std::io::stdout(), LeaveAlternateScreen)?;
        disable_raw_mode()?;

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        let frame_duration = Duration::from_secs_f64(1.0 / self.args.frame_rate.max(1.0));
        loop {
            let now = Instant::now();
            if self.screen == Screen::Playing && !self.paused {
                self.engine.tick(now)?;
            }
            {
                let mut stage = self.stage.borrow_mut();
                stage.tweens.retain(|t| !t.finished(now));
                if self.args.no_animation {
                    stage.fading.clear();
                }
                if stage.fading_dirty {
                    // rebuild so the new cells are part of the filter
                    stage.fading_dirty = false;
                    self.clear_effect = None;
                    self.clear_effect_time = None;
                }
            }

            terminal.draw(|f| {
                let stage = self.stage.borrow();
                let view = crate::ui::View {
                    engine: &self.engine,
                    stage: &stage,
                    screen: self.screen,
                    paused: self.paused,
                    now,
                };
                crate::ui::draw(f, &view, &mut self.clear_effect, &mut self.clear_effect_time);
            })?;

            if self.clear_effect.as_ref().is_some_and(|e| e.done()) {
                self.stage.borrow_mut().fading.clear();
                self.clear_effect = None;
                self.clear_effect_time = None;
            }

            let timeout = frame_duration.saturating_sub(now.elapsed());
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    if let Event::Key(key) = event::read()? {
                        // held keys arrive as repeated presses; the move gate paces them
                        if key.kind != KeyEventKind::Press {
                            continue;
                        }
                        if self.handle(key_to_action(key), Instant::now())? {
                            return Ok(());
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edgefall::Edge;

    fn small() -> EngineConfig {
        let mut c = EngineConfig::default();
        c.grid_size = 5;
        c
    }

    #[test]
    fn tween_interpolates_and_finishes() {
        let t0 = Instant::now();
        let tween = Tween {
            id: BlockId(1),
            from: Point { x: 0, y: -16 },
            to: Point { x: 0, y: 48 },
            started: t0,
            duration: Duration::from_millis(100),
        };
        assert_eq!(tween.at(t0), (0.0, -16.0));
        let (_, mid) = tween.at(t0 + Duration::from_millis(50));
        assert!((mid - 16.0).abs() < 0.01);
        assert_eq!(tween.at(t0 + Duration::from_secs(1)), (0.0, 48.0));
        assert!(!tween.finished(t0));
        assert!(tween.finished(t0 + Duration::from_millis(100)));
    }

    #[test]
    fn stage_follows_the_engine() {
        let (mut engine, stage, _) = new_game(&small()).unwrap();
        assert_eq!(stage.borrow().scoreboard, "Level: 1 / Score: 0");
        assert_eq!(stage.borrow().track, "background1");

        let now = Instant::now();
        for (x, y) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
            let b = engine.spawn(Color::Red, Edge::Top, x);
            engine.drop_block(b, Some(Coord::new(x, y)), false, now, Vec::new()).unwrap();
        }
        assert_eq!(stage.borrow().fading.len(), 4);
        assert!(stage.borrow().fading_dirty);
        assert_eq!(stage.borrow().scoreboard, "Level: 1 / Score: 4");

        engine.apply(Intent::Drop, now).unwrap();
        assert_eq!(stage.borrow().tweens.len(), 4);
    }

    #[test]
    fn board_full_flag_is_raised_by_the_post_move_hook() {
        let (mut engine, _, full) = new_game(&small()).unwrap();
        let now = Instant::now();
        let palette = [Color::Red, Color::Green];
        for y in 0..5 {
            for x in 0..5 {
                // checkerboard never forms a square
                let b = engine.spawn(palette[(x + y) % 2], Edge::Top, x);
                engine.drop_block(b, Some(Coord::new(x, y)), false, now, Vec::new()).ok();
            }
        }
        assert!(!full.get());
        engine.apply(Intent::Rotate, now).unwrap();
        assert!(full.get());
    }
}
