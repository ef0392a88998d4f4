use std::{
    fs::File,
    io::stdout,
    path::PathBuf,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use log::{debug, info};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};

use blockfall::catalog::Position;
use blockfall::game::{
    Command, Game, GameConfig, GameState, BASE_TICK_MS, MIN_TICK_MS, TICK_STEP_MS,
};
use blockfall::grid::{HEIGHT, WIDTH};

// ============================================================================
// Configuration
// ============================================================================

/// Falling-block puzzle in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "blockfall",
    version,
    about = "Falling-block puzzle in the terminal.",
    long_about = "Falling-block puzzle in the terminal.\n\n\
        CONTROLS:\n  Left/Right  Move    Up  Rotate    Down  Drop\n  N  New game    Q / Esc  Quit"
)]
struct Args {
    /// Seed for the shape sequence. Random when omitted.
    #[arg(long, value_name = "N")]
    seed: Option<u64>,

    /// Tick interval at the start of a game.
    #[arg(long, default_value_t = BASE_TICK_MS, value_name = "MS")]
    base_tick_ms: u64,

    /// Milliseconds taken off the tick interval per placed block.
    #[arg(long, default_value_t = TICK_STEP_MS, value_name = "MS")]
    tick_step_ms: u64,

    /// Fastest allowed tick interval.
    #[arg(long, default_value_t = MIN_TICK_MS, value_name = "MS")]
    min_tick_ms: u64,

    /// Write logs (filtered by RUST_LOG) to this file.
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,
}

impl Args {
    fn game_config(&self) -> GameConfig {
        GameConfig {
            seed: self.seed,
            base_tick_ms: self.base_tick_ms,
            tick_step_ms: self.tick_step_ms,
            min_tick_ms: self.min_tick_ms,
        }
    }
}

fn init_logging(path: Option<&PathBuf>) -> Result<()> {
    // The terminal belongs to the UI, so logs only go to a file.
    let Some(path) = path else {
        return Ok(());
    };
    let file = File::create(path)
        .with_context(|| format!("cannot create log file {}", path.display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

// ============================================================================
// Visual Constants
// ============================================================================

const BLOCK_CHAR: &str = "██";
const EMPTY_CHAR: &str = "  ";
const GUIDE_CHAR: &str = "▕▏";
const STRIPE_CHAR: &str = "░░";

const PALETTE: [Color; 9] = [
    Color::Red,
    Color::Blue,
    Color::Yellow,
    Color::Rgb(255, 165, 0),
    Color::Magenta,
    Color::Green,
    Color::LightBlue,
    Color::LightRed,
    Color::Rgb(150, 75, 0),
];
const ACTIVE_COLOR: Color = Color::White;

// ============================================================================
// Rendering
// ============================================================================

fn render(frame: &mut Frame, game: &Game) {
    let area = frame.size();
    render_game(frame, game, area);
    if game.state == GameState::GameOver {
        render_game_over(frame, game, area);
    }
}

fn render_game(frame: &mut Frame, game: &Game, area: Rect) {
    let board_width = WIDTH as u16 * 2 + 2;
    let board_height = HEIGHT as u16 + 2;

    let vertical = Layout::vertical([Constraint::Length(board_height), Constraint::Min(0)])
        .split(area);
    let horizontal = Layout::horizontal([
        Constraint::Fill(1),
        Constraint::Length(board_width),
        Constraint::Length(16),
        Constraint::Fill(1),
    ])
    .split(vertical[0]);

    render_board(frame, game, horizontal[1]);
    render_info(frame, game, horizontal[2]);

    let controls_area = Rect {
        x: area.x,
        y: vertical[0].y + vertical[0].height,
        width: area.width,
        height: 1,
    };
    if controls_area.y < area.height {
        let controls = Paragraph::new(Line::from(
            "←→: Move | ↑: Rotate | ↓: Drop | N: New game | Q/ESC: Quit",
        ))
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(controls, controls_area);
    }
}

/// Colour of the cell at `cell`, if anything occupies it.
fn cell_color(game: &Game, active: &[Position], cell: Position) -> Option<Color> {
    if active.contains(&cell) {
        return Some(ACTIVE_COLOR);
    }
    game.grid
        .placed()
        .iter()
        .position(|b| b.cells.contains(cell))
        .map(|i| PALETTE[i % PALETTE.len()])
}

fn render_board(frame: &mut Frame, game: &Game, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Blockfall ")
        .title_alignment(Alignment::Center);

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let active = game
        .grid
        .resolve_active()
        .map(|s| s.cells().to_vec())
        .unwrap_or_default();
    let guide_x = game.grid.active().map(|a| a.position.x);

    // Row 0 is the floor, so draw from the top of the viewport down.
    let lines: Vec<Line> = (0..HEIGHT)
        .rev()
        .map(|y| {
            let spans: Vec<Span> = (0..WIDTH)
                .map(|x| match cell_color(game, &active, Position::new(x, y)) {
                    Some(color) => Span::styled(BLOCK_CHAR, Style::default().fg(color)),
                    None if guide_x == Some(x) => {
                        Span::styled(GUIDE_CHAR, Style::default().fg(Color::Red))
                    }
                    None if x % 2 == 0 => {
                        Span::styled(STRIPE_CHAR, Style::default().fg(Color::DarkGray))
                    }
                    None => Span::raw(EMPTY_CHAR),
                })
                .collect();
            Line::from(spans)
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_info(frame: &mut Frame, game: &Game, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Info ")
        .title_alignment(Alignment::Center);

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled("Blocks", Style::default().fg(Color::Yellow))),
        Line::from(format!("{}", game.placed_count())),
        Line::from(""),
        Line::from(Span::styled("Tick", Style::default().fg(Color::Cyan))),
        Line::from(format!("{} ms", game.tick_duration_ms())),
    ];

    let paragraph = Paragraph::new(lines).alignment(Alignment::Center);
    frame.render_widget(paragraph, inner);
}

fn render_game_over(frame: &mut Frame, game: &Game, area: Rect) {
    let text = vec![
        Line::from(""),
        Line::from(Span::styled("GAME OVER", Style::default().fg(Color::Red))),
        Line::from(""),
        Line::from(format!("Blocks: {}", game.placed_count())),
        Line::from(""),
        Line::from(Span::styled(
            "N: new game",
            Style::default().fg(Color::DarkGray),
        )),
        Line::from(Span::styled(
            "ESC: quit",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let paragraph = Paragraph::new(text).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Game Over ")
            .title_alignment(Alignment::Center)
            .style(Style::default().bg(Color::Black)),
    );

    frame.render_widget(paragraph, centered_rect(24, 10, area));
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let horizontal = Layout::horizontal([
        Constraint::Fill(1),
        Constraint::Length(width.min(area.width)),
        Constraint::Fill(1),
    ])
    .split(area);

    let vertical = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(height.min(area.height)),
        Constraint::Fill(1),
    ])
    .split(horizontal[1]);

    vertical[1]
}

// ============================================================================
// Main Loop
// ============================================================================

fn command_for(code: KeyCode) -> Option<Command> {
    match code {
        KeyCode::Left => Some(Command::Left),
        KeyCode::Right => Some(Command::Right),
        KeyCode::Up => Some(Command::Rotate),
        KeyCode::Down => Some(Command::Drop),
        KeyCode::Char('n') | KeyCode::Char('N') => Some(Command::NewGame),
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => Some(Command::Quit),
        _ => None,
    }
}

/// Drains pending game events into the log. Returns how many there were.
fn log_events(game: &mut Game) -> usize {
    let events = game.take_events();
    for event in &events {
        debug!("{:?}", event);
    }
    events.len()
}

fn run(terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>, game: &mut Game) -> Result<()> {
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|frame| render(frame, game))?;

        let tick_duration = Duration::from_millis(game.tick_duration_ms());
        let timeout = tick_duration
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if let Some(command) = command_for(key.code) {
                        if !game.apply(command) {
                            return Ok(());
                        }
                        if command == Command::NewGame {
                            last_tick = Instant::now();
                        }
                    }
                }
            }
        }

        if last_tick.elapsed() >= tick_duration {
            game.tick();
            last_tick = Instant::now();
        }

        log_events(game);
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.as_ref())?;

    let config = args.game_config();
    info!("starting with {:?}", config);
    let mut game = Game::new(config);

    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout());
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, &mut game);

    // Restore the terminal even when the loop failed.
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}
