//! Tests for the game driver
//!
//! Test categories:
//! - Commands and candidate rejection
//! - Tick: dropping, locking, spawning
//! - Row clearing during play
//! - Game over and restart
//! - Tick speed-up
//! - Deterministic shape sources

use blockfall::catalog::{Position, SequenceShapeSource, Shape, ShapeKind, ShapeSource};
use blockfall::game::{Command, Game, GameConfig, GameEvent, GameState};
use blockfall::grid::{test_helpers::*, ActiveBlock, Grid, SPAWN_POSITION, WIDTH};

fn source(kinds: &[ShapeKind]) -> Box<dyn ShapeSource> {
    Box::new(SequenceShapeSource::of_kinds(kinds))
}

fn game_with(placed: Vec<blockfall::PlacedBlock>, active: ActiveBlock) -> Game {
    Game::with_grid(Grid::from_parts(placed, Some(active)), source(&[ShapeKind::O]))
}

fn anchor(game: &Game) -> Position {
    game.grid.active().unwrap().position
}

// ============================================================================
// Command Tests
// ============================================================================

mod commands {
    use super::*;

    #[test]
    fn moves_left_and_right() {
        let mut game = game_with(vec![], active(&[(0, 0)], 5, 5));

        assert!(game.move_left());
        assert_eq!(anchor(&game), Position::new(4, 5));
        assert!(game.move_right());
        assert_eq!(anchor(&game), Position::new(5, 5));
    }

    #[test]
    fn invalid_move_keeps_last_valid_grid() {
        let mut game = game_with(vec![], active(&[(0, 0)], 0, 5));
        let before = game.grid.clone();

        assert!(!game.move_left());
        assert_eq!(game.grid, before);
    }

    #[test]
    fn blocked_by_placed_cell() {
        let mut game = game_with(vec![block(&[(6, 5)])], active(&[(0, 0)], 5, 5));

        assert!(!game.move_right());
        assert_eq!(anchor(&game), Position::new(5, 5));
    }

    #[test]
    fn rotate_rejected_at_wall() {
        // I lies vertical; rotating lays it out to the right past the wall.
        let mut game = game_with(
            vec![],
            ActiveBlock::new(ShapeKind::I.shape(), Position::new(WIDTH - 1, 5)),
        );

        assert!(!game.rotate());
        assert_eq!(game.grid.active().unwrap().shape, ShapeKind::I.shape());
    }

    #[test]
    fn rotate_commits_when_valid() {
        let mut game = game_with(
            vec![],
            ActiveBlock::new(ShapeKind::I.shape(), Position::new(5, 5)),
        );

        assert!(game.rotate());
        assert_eq!(
            game.grid.resolve_active(),
            Some(Shape::new([(5, 5), (6, 5), (7, 5), (8, 5)]))
        );
    }

    #[test]
    fn manual_drop_never_locks() {
        let mut game = game_with(vec![], active(&[(0, 0)], 3, 0));

        assert!(!game.soft_drop());
        assert!(game.grid.placed().is_empty());
        assert_eq!(game.placed_count(), 0);
    }

    #[test]
    fn commands_emit_events() {
        let mut game = game_with(vec![], active(&[(0, 0)], 5, 5));

        game.apply(Command::Left);
        game.apply(Command::Rotate);
        game.apply(Command::Drop);

        assert_eq!(
            game.take_events(),
            vec![GameEvent::Moved, GameEvent::Rotated, GameEvent::Dropped]
        );
    }

    #[test]
    fn quit_stops_driver() {
        let mut game = game_with(vec![], active(&[(0, 0)], 5, 5));

        assert!(game.apply(Command::Right));
        assert!(!game.apply(Command::Quit));
    }
}

// ============================================================================
// Tick Tests
// ============================================================================

mod tick {
    use super::*;

    #[test]
    fn tick_moves_block_down() {
        let mut game = game_with(vec![], active(&[(0, 0)], 4, 10));

        game.tick();

        assert_eq!(anchor(&game), Position::new(4, 9));
    }

    #[test]
    fn tick_locks_and_spawns_at_floor() {
        let mut game = game_with(vec![], active(&[(0, 0), (0, 1)], 3, 0));
        game.take_events();

        game.tick();

        assert_eq!(game.grid.placed(), &[block(&[(3, 0), (3, 1)])]);
        assert_eq!(
            game.grid.active(),
            Some(&ActiveBlock::at_spawn(ShapeKind::O.shape()))
        );
        assert_eq!(game.placed_count(), 1);
        assert_eq!(game.state, GameState::Playing);
        assert!(game.take_events().contains(&GameEvent::Locked));
    }

    #[test]
    fn tick_locks_on_top_of_placed_block() {
        let mut game = game_with(vec![block(&[(3, 0)])], active(&[(0, 0)], 3, 1));

        game.tick();

        assert_eq!(game.grid.placed().len(), 2);
        assert!(game.grid.is_occupied(Position::new(3, 1)));
    }

    #[test]
    fn tick_does_nothing_when_game_over() {
        let mut game = game_with(vec![], active(&[(0, 0)], 4, 5));
        game.state = GameState::GameOver;

        game.tick();

        assert_eq!(anchor(&game), Position::new(4, 5));
    }

    #[test]
    fn block_falls_from_spawn_to_floor() {
        let mut game = Game::with_source(GameConfig::default(), source(&[ShapeKind::I]));

        for _ in 0..SPAWN_POSITION.y {
            game.tick();
        }
        assert_eq!(anchor(&game), Position::new(SPAWN_POSITION.x, 0));
        assert_eq!(game.placed_count(), 0);

        game.tick();
        assert_eq!(game.placed_count(), 1);
        assert!(game.grid.is_valid());
    }

    #[test]
    fn tick_spawns_when_grid_has_no_active_block() {
        let empty = Grid::from_parts(vec![block(&[(3, 0)])], Some(active(&[(0, 0)], 5, 0)))
            .place_active();
        let mut game = Game::with_grid(empty, source(&[ShapeKind::O]));

        game.tick();

        assert_eq!(
            game.grid.active(),
            Some(&ActiveBlock::at_spawn(ShapeKind::O.shape()))
        );
        assert_eq!(game.placed_count(), 0);
        assert_eq!(game.state, GameState::Playing);

        game.tick();
        assert_eq!(anchor(&game).y, SPAWN_POSITION.y - 1);
    }

    #[test]
    fn commands_without_active_block_are_rejected() {
        let empty = Grid::from_parts(vec![], Some(active(&[(0, 0)], 5, 5))).place_active();
        let mut game = Game::with_grid(empty, source(&[ShapeKind::O]));

        assert!(!game.soft_drop());
        assert!(!game.move_left());
        assert!(!game.rotate());
        assert!(game.take_events().is_empty());
    }
}

// ============================================================================
// Row Clearing Tests
// ============================================================================

mod row_clearing {
    use super::*;

    #[test]
    fn locking_completes_and_clears_row() {
        let mut game = game_with(
            vec![row_with_gap(0, 9), block(&[(2, 1)])],
            active(&[(0, 0)], 9, 0),
        );
        game.take_events();

        game.tick();

        assert_eq!(game.grid.placed(), &[block(&[(2, 0)])]);
        assert!(game.take_events().contains(&GameEvent::RowsCleared(1)));
    }

    #[test]
    fn locking_clears_several_rows() {
        let mut game = game_with(
            vec![row_with_gap(0, 0), row_with_gap(1, 0)],
            ActiveBlock::new(Shape::new([(0, 0), (0, 1)]), Position::new(0, 0)),
        );
        game.take_events();

        game.tick();

        assert!(game.grid.placed().is_empty());
        assert!(game.take_events().contains(&GameEvent::RowsCleared(2)));
    }
}

// ============================================================================
// Game Over Tests
// ============================================================================

mod game_over {
    use super::*;

    #[test]
    fn game_over_when_spawn_blocked() {
        let tower = block(&[(SPAWN_POSITION.x, SPAWN_POSITION.y)]);
        let mut game = game_with(vec![tower], active(&[(0, 0)], 0, 0));
        game.take_events();

        game.tick();

        assert!(game.is_game_over());
        assert!(!game.grid.is_valid());
        assert!(game.take_events().contains(&GameEvent::GameOver));
    }

    #[test]
    fn spawn_checked_only_after_rows_clear() {
        // The spawn cell is taken until the floor row clears and drops it.
        let mut game = game_with(
            vec![
                row_with_gap(0, 0),
                block(&[(SPAWN_POSITION.x, SPAWN_POSITION.y)]),
            ],
            active(&[(0, 0)], 0, 0),
        );
        game.take_events();

        game.tick();

        assert_eq!(game.state, GameState::Playing);
        assert!(game.grid.is_valid());
        assert_eq!(
            game.grid.placed(),
            &[block(&[(SPAWN_POSITION.x, SPAWN_POSITION.y - 1)])]
        );
        let events = game.take_events();
        assert!(events.contains(&GameEvent::RowsCleared(1)));
        assert!(!events.contains(&GameEvent::GameOver));
    }

    #[test]
    fn no_moves_after_game_over() {
        let mut game = game_with(vec![], active(&[(0, 0)], 5, 5));
        game.state = GameState::GameOver;

        assert!(!game.move_left());
        assert!(!game.move_right());
        assert!(!game.rotate());
        assert!(!game.soft_drop());
    }

    #[test]
    fn new_game_resets() {
        let tower = block(&[(SPAWN_POSITION.x, SPAWN_POSITION.y)]);
        let mut game = game_with(vec![tower], active(&[(0, 0)], 0, 0));
        game.tick();
        assert!(game.is_game_over());

        assert!(game.apply(Command::NewGame));

        assert_eq!(game.state, GameState::Playing);
        assert_eq!(game.placed_count(), 0);
        assert!(game.grid.placed().is_empty());
        assert!(game.grid.is_valid());
        assert_eq!(game.take_events(), vec![GameEvent::Restarted]);
    }
}

// ============================================================================
// Tick Speed Tests
// ============================================================================

mod tick_speed {
    use super::*;

    fn lock_one(game: &mut Game) {
        let before = game.placed_count();
        while game.placed_count() == before && !game.is_game_over() {
            game.tick();
        }
    }

    #[test]
    fn starts_at_base_interval() {
        let game = Game::new(GameConfig {
            seed: Some(1),
            ..GameConfig::default()
        });

        assert_eq!(game.tick_duration_ms(), 300);
    }

    #[test]
    fn shrinks_per_placed_block() {
        let mut game = Game::with_source(GameConfig::default(), source(&[ShapeKind::O]));

        lock_one(&mut game);
        lock_one(&mut game);

        assert_eq!(game.placed_count(), 2);
        assert_eq!(game.tick_duration_ms(), 296);
    }

    #[test]
    fn never_below_floor() {
        let config = GameConfig {
            base_tick_ms: 10,
            tick_step_ms: 100,
            min_tick_ms: 5,
            seed: None,
        };
        let mut game = Game::with_source(config, source(&[ShapeKind::I]));

        lock_one(&mut game);

        assert_eq!(game.tick_duration_ms(), 5);
    }
}

// ============================================================================
// Shape Source Tests
// ============================================================================

mod shape_source {
    use super::*;

    #[test]
    fn sequence_source_cycles() {
        let mut source = SequenceShapeSource::of_kinds(&[ShapeKind::I, ShapeKind::O]);

        assert_eq!(source.next_shape(), ShapeKind::I.shape());
        assert_eq!(source.next_shape(), ShapeKind::O.shape());
        assert_eq!(source.next_shape(), ShapeKind::I.shape());
    }

    #[test]
    fn game_spawns_from_source() {
        let mut game = Game::with_source(
            GameConfig::default(),
            source(&[ShapeKind::T, ShapeKind::Z]),
        );
        assert_eq!(game.grid.active().unwrap().shape, ShapeKind::T.shape());

        while game.placed_count() == 0 {
            game.tick();
        }

        assert_eq!(game.grid.active().unwrap().shape, ShapeKind::Z.shape());
    }

    #[test]
    fn same_seed_same_game() {
        let config = GameConfig {
            seed: Some(99),
            ..GameConfig::default()
        };
        let mut a = Game::new(config);
        let mut b = Game::new(config);

        for _ in 0..200 {
            a.tick();
            b.tick();
        }

        assert_eq!(a.grid, b.grid);
    }
}
