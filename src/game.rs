use log::{debug, info};

use crate::catalog::{RandomShapeSource, ShapeSource};
use crate::grid::{ActiveBlock, Direction, Grid};

// ============================================================================
// Configuration
// ============================================================================

pub const BASE_TICK_MS: u64 = 300;
pub const TICK_STEP_MS: u64 = 2;
pub const MIN_TICK_MS: u64 = 20;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct GameConfig {
    /// Seed for the shape source; `None` draws from OS entropy.
    pub seed: Option<u64>,
    pub base_tick_ms: u64,
    /// Tick interval lost per placed block.
    pub tick_step_ms: u64,
    pub min_tick_ms: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seed: None,
            base_tick_ms: BASE_TICK_MS,
            tick_step_ms: TICK_STEP_MS,
            min_tick_ms: MIN_TICK_MS,
        }
    }
}

// ============================================================================
// Types
// ============================================================================

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GameState {
    Playing,
    GameOver,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Command {
    Left,
    Right,
    Rotate,
    Drop,
    NewGame,
    Quit,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum GameEvent {
    Moved,
    Rotated,
    Dropped,
    Locked,
    RowsCleared(usize),
    GameOver,
    Restarted,
}

// ============================================================================
// Game
// ============================================================================

/// Owns the authoritative [`Grid`] and applies transitions to it one at a time,
/// committing a candidate only when it is valid.
pub struct Game {
    pub grid: Grid,
    pub state: GameState,
    config: GameConfig,
    placed_count: u64,
    source: Box<dyn ShapeSource>,
    events: Vec<GameEvent>,
}

impl Game {
    pub fn new(config: GameConfig) -> Self {
        let source: Box<dyn ShapeSource> = match config.seed {
            Some(seed) => Box::new(RandomShapeSource::seeded(seed)),
            None => Box::new(RandomShapeSource::from_entropy()),
        };
        Self::with_source(config, source)
    }

    pub fn with_source(config: GameConfig, mut source: Box<dyn ShapeSource>) -> Self {
        let grid = Grid::new(source.next_shape());
        Self {
            grid,
            state: GameState::Playing,
            config,
            placed_count: 0,
            source,
            events: Vec::new(),
        }
    }

    /// Starts from an arbitrary grid; later spawns come from `source`.
    pub fn with_grid(grid: Grid, source: Box<dyn ShapeSource>) -> Self {
        Self {
            grid,
            state: GameState::Playing,
            config: GameConfig::default(),
            placed_count: 0,
            source,
            events: Vec::new(),
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn placed_count(&self) -> u64 {
        self.placed_count
    }

    pub fn is_game_over(&self) -> bool {
        self.state == GameState::GameOver
    }

    /// Commits `candidate` if it is valid and still has an active block.
    /// Returns whether it was committed.
    fn try_commit(&mut self, candidate: Grid, event: GameEvent) -> bool {
        if self.state != GameState::Playing
            || candidate.active().is_none()
            || !candidate.is_valid()
        {
            return false;
        }
        self.grid = candidate;
        self.events.push(event);
        true
    }

    pub fn move_left(&mut self) -> bool {
        self.try_commit(self.grid.shift(Direction::Left), GameEvent::Moved)
    }

    pub fn move_right(&mut self) -> bool {
        self.try_commit(self.grid.shift(Direction::Right), GameEvent::Moved)
    }

    pub fn rotate(&mut self) -> bool {
        self.try_commit(self.grid.rotate(), GameEvent::Rotated)
    }

    /// Manual drop. Never locks the block; only the tick does that.
    pub fn soft_drop(&mut self) -> bool {
        self.try_commit(self.grid.drop(), GameEvent::Dropped)
    }

    pub fn tick(&mut self) {
        if self.state != GameState::Playing {
            return;
        }
        if self.grid.active().is_none() {
            self.spawn();
        } else if !self.soft_drop() {
            self.lock_and_spawn();
        }
    }

    fn lock_and_spawn(&mut self) {
        self.placed_count += 1;
        self.events.push(GameEvent::Locked);
        self.grid = self.grid.place_active();
        debug!("locked block #{}", self.placed_count);
        self.spawn();
    }

    /// Spawns the next shape, clears full rows, and only then checks for game over.
    fn spawn(&mut self) {
        let spawned = self
            .grid
            .with_active(ActiveBlock::at_spawn(self.source.next_shape()));
        let (grid, cleared) = spawned.clear_full_rows_counted();
        self.grid = grid;

        if cleared > 0 {
            self.events.push(GameEvent::RowsCleared(cleared));
        }

        if !self.grid.is_valid() {
            info!("game over after {} placed blocks", self.placed_count);
            self.state = GameState::GameOver;
            self.events.push(GameEvent::GameOver);
        }
    }

    pub fn restart(&mut self) {
        self.grid = Grid::new(self.source.next_shape());
        self.placed_count = 0;
        self.state = GameState::Playing;
        self.events.clear();
        self.events.push(GameEvent::Restarted);
        info!("new game");
    }

    /// Applies a driver command. Returns `false` when the driver should stop.
    pub fn apply(&mut self, command: Command) -> bool {
        match command {
            Command::Left => {
                self.move_left();
            }
            Command::Right => {
                self.move_right();
            }
            Command::Rotate => {
                self.rotate();
            }
            Command::Drop => {
                self.soft_drop();
            }
            Command::NewGame => self.restart(),
            Command::Quit => return false,
        }
        true
    }

    /// Tick interval; shrinks linearly with placed blocks down to the floor.
    pub fn tick_duration_ms(&self) -> u64 {
        let reduction = self.placed_count.saturating_mul(self.config.tick_step_ms);
        self.config
            .base_tick_ms
            .saturating_sub(reduction)
            .max(self.config.min_tick_ms)
    }

    /// Takes and clears all pending events
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new(GameConfig::default())
    }
}
