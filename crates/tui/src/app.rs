use std::{io, thread, time::Duration};

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction as LayoutDirection, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame, Terminal,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info};
use tui2048_core::{Command, Direction, GameSession, Position, Renderer, Snapshot};

use crate::block_font;

const TICK_RATE: Duration = Duration::from_millis(250);
const CELL_WIDTH: u16 = 8;
const CELL_HEIGHT: u16 = 3;
/// Ticks during which merged and new tiles stay highlighted.
const HIGHLIGHT_TICKS: u8 = 2;

#[derive(Debug, Clone)]
struct Theme {
    board_bg: Color,
    empty_cell: Color,
    accent: Color,
    muted: Color,
    success: Color,
    danger: Color,
    dark_text: Color,
    light_text: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            board_bg: Color::Rgb(0xbb, 0xad, 0xa0),
            empty_cell: Color::Rgb(0xcd, 0xc1, 0xb4),
            accent: Color::Rgb(0xed, 0xc2, 0x2e),
            muted: Color::DarkGray,
            success: Color::Green,
            danger: Color::Red,
            dark_text: Color::Rgb(0x77, 0x6e, 0x65),
            light_text: Color::Rgb(0xf9, 0xf6, 0xf2),
        }
    }
}

impl Theme {
    fn tile_background(&self, value: u32) -> Color {
        match value {
            2 => Color::Rgb(0xee, 0xe4, 0xda),
            4 => Color::Rgb(0xed, 0xe0, 0xc8),
            8 => Color::Rgb(0xf3, 0xb2, 0x7a),
            16 => Color::Rgb(0xf6, 0x96, 0x64),
            32 => Color::Rgb(0xf7, 0x7c, 0x5f),
            64 => Color::Rgb(0xf7, 0x5f, 0x3b),
            128 => Color::Rgb(0xf2, 0xd8, 0x6d),
            256 => Color::Rgb(0xf2, 0xc4, 0x64),
            512 => Color::Rgb(0xf2, 0xa9, 0x4d),
            1024 => Color::Rgb(0xf2, 0x99, 0x4d),
            2048 => Color::Rgb(0xf2, 0xa3, 0x3d),
            _ => Color::Rgb(0x44, 0x00, 0x44),
        }
    }

    fn tile_foreground(&self, value: u32) -> Color {
        if value >= 8 {
            self.light_text
        } else {
            self.dark_text
        }
    }
}

enum AppEvent {
    Input(Event),
    Tick,
}

/// What a key press asks the application to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyAction {
    Command(Command),
    Quit,
}

/// Last snapshot handed over by the session plus presentation state.
struct BoardView {
    snapshot: Snapshot,
    status: String,
    highlight_ticks: u8,
}

impl Renderer for BoardView {
    fn render(&mut self, snapshot: &Snapshot) {
        let gained = snapshot.score.saturating_sub(self.snapshot.score);
        self.status = if snapshot.is_win {
            "You won!".to_string()
        } else if snapshot.is_game_over {
            "Game over!".to_string()
        } else if snapshot.moves == 0 {
            "New game".to_string()
        } else if gained > 0 {
            format!("+{gained}")
        } else {
            String::new()
        };
        self.snapshot = snapshot.clone();
        self.highlight_ticks = HIGHLIGHT_TICKS;
    }
}

/// Terminal front end driving a single game session.
pub struct Tui2048App {
    session: GameSession,
    view: BoardView,
    theme: Theme,
    should_quit: bool,
}

impl Tui2048App {
    pub fn new(session: GameSession) -> Self {
        let snapshot = session.snapshot();
        Self {
            session,
            view: BoardView {
                snapshot,
                status: "Ready".to_string(),
                highlight_ticks: HIGHLIGHT_TICKS,
            },
            theme: Theme::default(),
            should_quit: false,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(128);
        spawn_input_thread(event_tx);

        let outcome = self.event_loop(&mut terminal, &mut event_rx).await;
        restore_terminal(&mut terminal)?;
        outcome
    }

    async fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
        event_rx: &mut mpsc::Receiver<AppEvent>,
    ) -> Result<()> {
        loop {
            terminal.draw(|frame| self.draw(frame))?;
            if self.should_quit {
                break;
            }
            let maybe_event = event_rx.recv().await;
            if !self.process_app_event(maybe_event) {
                break;
            }
        }
        Ok(())
    }

    fn process_app_event(&mut self, maybe_event: Option<AppEvent>) -> bool {
        match maybe_event {
            Some(AppEvent::Input(Event::Key(key))) => {
                if let Err(err) = self.handle_key(key) {
                    error!(?err, "Command failed");
                    self.view.status = format!("Error: {err}");
                }
                true
            }
            Some(AppEvent::Input(_)) => true,
            Some(AppEvent::Tick) => {
                self.view.highlight_ticks = self.view.highlight_ticks.saturating_sub(1);
                true
            }
            None => false,
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        match key_action(&key) {
            Some(KeyAction::Quit) => {
                info!(score = self.session.score(), "Quitting");
                self.should_quit = true;
            }
            Some(KeyAction::Command(command)) => {
                let rendered = self.session.dispatch_to(command, &mut self.view)?;
                debug!(%command, rendered, "Command handled");
            }
            None => {}
        }
        Ok(())
    }

    fn draw(&self, frame: &mut Frame) {
        let area = frame.size();
        let (_, board_height) = board_extent(board_cells(self.view.snapshot.size));
        let layout = Layout::default()
            .direction(LayoutDirection::Vertical)
            .constraints([
                Constraint::Length(block_font::height() as u16 + 1),
                Constraint::Length(3),
                Constraint::Min(board_height.min(area.height)),
                Constraint::Length(3),
                Constraint::Length(1),
            ])
            .split(area);

        self.render_banner(frame, layout[0]);
        self.render_scores(frame, layout[1]);
        self.render_board(frame, layout[2]);
        self.render_status(frame, layout[3]);
        self.render_help(frame, layout[4]);

        if self.view.snapshot.is_terminal() {
            self.render_result(frame, area);
        }
    }

    fn render_banner(&self, frame: &mut Frame, area: Rect) {
        let lines: Vec<Line> = block_font::render("2048")
            .into_iter()
            .map(|line| {
                Line::from(Span::styled(
                    line,
                    Style::default()
                        .fg(self.theme.accent)
                        .add_modifier(Modifier::BOLD),
                ))
            })
            .collect();
        frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), area);
    }

    fn render_scores(&self, frame: &mut Frame, area: Rect) {
        let snapshot = &self.view.snapshot;
        let label = Style::default().fg(self.theme.muted);
        let value = Style::default().add_modifier(Modifier::BOLD);
        let line = Line::from(vec![
            Span::styled("Score ", label),
            Span::styled(snapshot.score.to_string(), value),
            Span::raw("   "),
            Span::styled("Best ", label),
            Span::styled(snapshot.best_score.to_string(), value),
            Span::raw("   "),
            Span::styled("Moves ", label),
            Span::styled(snapshot.moves.to_string(), value),
        ]);
        let width = 48.min(area.width);
        let paragraph = Paragraph::new(line)
            .block(Block::default().borders(Borders::ALL))
            .alignment(Alignment::Center);
        frame.render_widget(paragraph, centered_rect(width, area.height, area));
    }

    fn render_board(&self, frame: &mut Frame, area: Rect) {
        let size = board_cells(self.view.snapshot.size);
        let (board_width, board_height) = board_extent(size);
        let board = centered_rect(board_width, board_height, area);
        let block = Block::default()
            .borders(Borders::ALL)
            .style(Style::default().bg(self.theme.board_bg));
        let inner = block.inner(board);
        frame.render_widget(block, board);

        let highlight = self.view.highlight_ticks > 0;
        for y in 0..size {
            for x in 0..size {
                let cell = Rect::new(
                    inner.x.saturating_add(x.saturating_mul(CELL_WIDTH)),
                    inner.y.saturating_add(y.saturating_mul(CELL_HEIGHT)),
                    CELL_WIDTH,
                    CELL_HEIGHT,
                );
                if cell.right() > inner.right() || cell.bottom() > inner.bottom() {
                    continue;
                }
                let position = Position::new(i32::from(x), i32::from(y));
                let widget = match self.view.snapshot.tile_at(position) {
                    Some(tile) => {
                        let mut style = Style::default()
                            .bg(self.theme.tile_background(tile.value))
                            .fg(self.theme.tile_foreground(tile.value))
                            .add_modifier(Modifier::BOLD);
                        if highlight && tile.is_merged {
                            style = style.add_modifier(Modifier::REVERSED);
                        } else if highlight && tile.is_new {
                            style = style.add_modifier(Modifier::ITALIC);
                        }
                        Paragraph::new(vec![Line::raw(""), Line::raw(tile.value.to_string())])
                            .style(style)
                            .alignment(Alignment::Center)
                    }
                    None => Paragraph::new("").style(Style::default().bg(self.theme.empty_cell)),
                };
                frame.render_widget(widget, shrink(cell));
            }
        }
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let snapshot = &self.view.snapshot;
        let color = if snapshot.is_win {
            self.theme.success
        } else if snapshot.is_game_over {
            self.theme.danger
        } else {
            self.theme.accent
        };
        let paragraph = Paragraph::new(Line::from(Span::styled(
            self.view.status.clone(),
            Style::default().fg(color),
        )))
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_help(&self, frame: &mut Frame, area: Rect) {
        let help = Paragraph::new("←↑→↓ / wasd / hjkl: move   r: retry   n: new game   q: quit")
            .style(Style::default().fg(self.theme.muted))
            .alignment(Alignment::Center);
        frame.render_widget(help, area);
    }

    fn render_result(&self, frame: &mut Frame, area: Rect) {
        let snapshot = &self.view.snapshot;
        let (title, color) = if snapshot.is_win {
            ("You won!", self.theme.success)
        } else {
            ("Game over!", self.theme.danger)
        };
        let popup = centered_rect(30, 5, area);
        let lines = vec![
            Line::from(Span::styled(
                title,
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )),
            Line::from(format!("Final score: {}", snapshot.score)),
            Line::from(Span::styled(
                "r: retry   n: new game",
                Style::default().fg(self.theme.muted),
            )),
        ];
        frame.render_widget(Clear, popup);
        frame.render_widget(
            Paragraph::new(lines)
                .block(Block::default().borders(Borders::ALL))
                .alignment(Alignment::Center),
            popup,
        );
    }
}

fn key_action(key: &KeyEvent) -> Option<KeyAction> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    if key.modifiers == KeyModifiers::CONTROL && key.code == KeyCode::Char('c') {
        return Some(KeyAction::Quit);
    }
    let direction = match key.code {
        KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('k') => Direction::Up,
        KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('l') => Direction::Right,
        KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('j') => Direction::Down,
        KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('h') => Direction::Left,
        KeyCode::Char('r') => return Some(KeyAction::Command(Command::Restart)),
        KeyCode::Char('n') => return Some(KeyAction::Command(Command::NewGame)),
        KeyCode::Char('q') | KeyCode::Esc => return Some(KeyAction::Quit),
        _ => return None,
    };
    Some(KeyAction::Command(Command::Move(direction)))
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    Ok(())
}

fn spawn_input_thread(sender: mpsc::Sender<AppEvent>) {
    thread::spawn(move || loop {
        match event::poll(TICK_RATE) {
            Ok(true) => match event::read() {
                Ok(evt) => {
                    if sender.blocking_send(AppEvent::Input(evt)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            Ok(false) => {
                if sender.blocking_send(AppEvent::Tick).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    });
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

fn board_cells(size: usize) -> u16 {
    u16::try_from(size).unwrap_or(u16::MAX)
}

/// Outer width and height of a board of `cells`×`cells`, border included.
fn board_extent(cells: u16) -> (u16, u16) {
    (
        cells.saturating_mul(CELL_WIDTH).saturating_add(2),
        cells.saturating_mul(CELL_HEIGHT).saturating_add(2),
    )
}

/// Leave a one-column gutter between neighbouring cells.
fn shrink(cell: Rect) -> Rect {
    Rect::new(cell.x + 1, cell.y, cell.width.saturating_sub(2), cell.height)
}
