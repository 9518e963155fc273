//! Interactive TUI: renders nation ownership as a colored grid and advances
//! the tick loop on a fixed cadence, pausable via the keyboard.

use std::io::{self, Stdout};
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};
use territory_core::{step, Command, EngineConfig, ObserverRegistry, TerritoryMatrix, UNOWNED};

const PALETTE: [Color; 8] = [
    Color::Red,
    Color::Green,
    Color::Yellow,
    Color::Blue,
    Color::Magenta,
    Color::Cyan,
    Color::LightRed,
    Color::LightGreen,
];

pub fn run(
    matrix: &mut TerritoryMatrix,
    mut pending: Vec<Command>,
    config: &EngineConfig,
    observers: &mut ObserverRegistry,
) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_loop(&mut terminal, matrix, &mut pending, config, observers);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    result
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    matrix: &mut TerritoryMatrix,
    pending: &mut Vec<Command>,
    config: &EngineConfig,
    observers: &mut ObserverRegistry,
) -> Result<()> {
    let mut tick: u64 = 0;
    let mut paused = false;
    let mut tick_interval = Duration::from_millis(200);
    let mut last_tick = Instant::now();
    let mut last_report_flips = 0u32;

    loop {
        if event::poll(Duration::from_millis(20))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => break,
                        KeyCode::Char(' ') => paused = !paused,
                        KeyCode::Char('+') => tick_interval = tick_interval.saturating_sub(Duration::from_millis(20)).max(Duration::from_millis(20)),
                        KeyCode::Char('-') => tick_interval += Duration::from_millis(20),
                        _ => {}
                    }
                }
            }
        }

        if !paused && last_tick.elapsed() >= tick_interval {
            let report = step(matrix, tick, std::mem::take(pending), config, None);
            observers.notify(&report);
            last_report_flips = report.total_flips;
            tick += 1;
            last_tick = Instant::now();
        }

        terminal.draw(|frame| draw(frame, matrix, tick, paused, last_report_flips))?;
    }

    Ok(())
}

fn draw(frame: &mut Frame, matrix: &TerritoryMatrix, tick: u64, paused: bool, last_flips: u32) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(10), Constraint::Length(3)])
        .split(frame.area());

    let grid = render_grid(matrix);
    let title = format!("territory-sim — tick {tick}{}", if paused { " (paused)" } else { "" });
    frame.render_widget(Paragraph::new(grid).block(Block::default().title(title).borders(Borders::ALL)), layout[0]);

    let status = Line::from(vec![
        Span::raw(format!("flips last tick: {last_flips}  ")),
        Span::raw("[space] pause  [+/-] speed  [q] quit"),
    ]);
    frame.render_widget(Paragraph::new(status).block(Block::default().borders(Borders::ALL)), layout[1]);
}

fn render_grid(matrix: &TerritoryMatrix) -> Vec<Line<'static>> {
    (0..matrix.height)
        .map(|y| {
            let spans = (0..matrix.width)
                .map(|x| {
                    let owner = matrix.owner(x, y);
                    if matrix.is_ocean(x, y) {
                        Span::styled("~", Style::default().fg(Color::DarkGray))
                    } else if owner == UNOWNED {
                        Span::raw(".")
                    } else {
                        let color = PALETTE[(owner as usize) % PALETTE.len()];
                        Span::styled("#", Style::default().fg(color))
                    }
                })
                .collect::<Vec<_>>();
            Line::from(spans)
        })
        .collect()
}
