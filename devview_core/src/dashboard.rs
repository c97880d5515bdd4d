//! DevView TUI Dashboard Module
//! ============================
//!
//! Terminal display surface for playback: the clock label, a 3D scatter of
//! device positions projected through the fixed camera, and the paginated
//! device table. Uses Ratatui for rendering and Crossbeam to receive frames
//! from the playback thread.
//!
//! Enable with the `dashboard` feature flag.
//!
//! Keys:
//! - `←`/`p` and `→`/`n`: previous / next table page
//! - `q`/`Esc`: quit (drops the receiver, which stops playback)

use std::collections::VecDeque;
use std::io;
use std::time::Duration;

use crossbeam::channel::{unbounded, Receiver, Sender, TryRecvError};
use crossterm::{
    event::{self, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Line as CanvasLine, Points},
        Block, Borders, Paragraph, Row, Sparkline, Table,
    },
    Frame, Terminal,
};

use crate::cycle::RenderFrame;
use crate::sink::{FrameSink, SinkError};
use crate::views::TABLE_COLUMNS;

const HISTORY_LEN: usize = 100;

const SERIES_COLORS: [Color; 6] = [
    Color::LightRed,
    Color::LightBlue,
    Color::Yellow,
    Color::Cyan,
    Color::Magenta,
    Color::LightGreen,
];

fn series_color(index: usize) -> Color {
    SERIES_COLORS[index % SERIES_COLORS.len()]
}

// =============================================================================
// FRAME CHANNEL (playback thread -> dashboard)
// =============================================================================

/// Sink half of the frame channel.
pub struct ChannelSink {
    tx: Sender<RenderFrame>,
}

impl FrameSink for ChannelSink {
    fn present(&mut self, frame: &RenderFrame) -> Result<(), SinkError> {
        self.tx
            .send(frame.clone())
            .map_err(|_| SinkError::Disconnected)
    }
}

/// Create a connected sink / receiver pair.
pub fn frame_channel() -> (ChannelSink, Receiver<RenderFrame>) {
    let (tx, rx) = unbounded();
    (ChannelSink { tx }, rx)
}

// =============================================================================
// PLAYBACK DASHBOARD
// =============================================================================

/// TUI dashboard for watching playback.
pub struct PlaybackDashboard {
    rx: Receiver<RenderFrame>,
    latest: Option<RenderFrame>,
    device_history: VecDeque<u64>,
    page: usize,
    frame_count: usize,
    feed_closed: bool,
}

impl PlaybackDashboard {
    /// Create a new dashboard with the frame receiver channel.
    pub fn new(rx: Receiver<RenderFrame>) -> Self {
        Self {
            rx,
            latest: None,
            device_history: VecDeque::with_capacity(HISTORY_LEN),
            page: 0,
            frame_count: 0,
            feed_closed: false,
        }
    }

    /// Pull every frame waiting on the channel, keeping the newest.
    pub fn drain_frames(&mut self) {
        loop {
            match self.rx.try_recv() {
                Ok(frame) => self.accept(frame),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.feed_closed = true;
                    break;
                }
            }
        }
    }

    fn accept(&mut self, frame: RenderFrame) {
        self.device_history.push_back(frame.table.len() as u64);
        if self.device_history.len() > HISTORY_LEN {
            self.device_history.pop_front();
        }
        // Keep the page if it still exists in the new frame
        self.page = self.page.min(frame.table.page_count() - 1);
        self.latest = Some(frame);
    }

    /// Apply a key press. Returns `true` when the dashboard should close.
    pub fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Right | KeyCode::Char('n') => {
                let pages = self.latest.as_ref().map_or(1, |f| f.table.page_count());
                if self.page + 1 < pages {
                    self.page += 1;
                }
            }
            KeyCode::Left | KeyCode::Char('p') => {
                self.page = self.page.saturating_sub(1);
            }
            _ => {}
        }
        false
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn latest(&self) -> Option<&RenderFrame> {
        self.latest.as_ref()
    }

    pub fn feed_closed(&self) -> bool {
        self.feed_closed
    }

    /// Run the TUI main loop (blocks until 'q' pressed)
    pub fn run(&mut self) -> io::Result<()> {
        // Setup terminal
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        loop {
            self.drain_frames();

            terminal.draw(|f| self.ui(f))?;
            self.frame_count += 1;

            // Handle input (non-blocking with 50ms timeout)
            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if self.handle_key(key.code) {
                        break;
                    }
                }
            }
        }

        // Restore terminal
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        Ok(())
    }

    /// Render the UI
    fn ui(&self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(3), // Header / clock
                Constraint::Min(12),   // Scatter + table
                Constraint::Length(5), // Device count sparkline
                Constraint::Length(1), // Footer
            ])
            .split(f.area());

        self.render_header(f, chunks[0]);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(chunks[1]);
        self.render_scatter(f, body[0]);
        self.render_table(f, body[1]);

        let history: Vec<u64> = self.device_history.iter().copied().collect();
        let sparkline = Sparkline::default()
            .block(Block::default().title("Devices per frame (last 100)").borders(Borders::ALL))
            .data(&history)
            .style(Style::default().fg(Color::Cyan));
        f.render_widget(sparkline, chunks[2]);

        let footer_text = if self.feed_closed {
            "Playback stopped | Press 'q' to quit"
        } else {
            "←/→ page | Press 'q' to quit"
        };
        let footer = Paragraph::new(footer_text).style(Style::default().fg(Color::DarkGray));
        f.render_widget(footer, chunks[3]);
    }

    fn render_header(&self, f: &mut Frame, area: Rect) {
        let clock = self
            .latest
            .as_ref()
            .map_or_else(|| "waiting for first frame".to_string(), |frame| frame.time.to_string());
        let tick = self.latest.as_ref().map_or(0, |frame| frame.tick);

        let header = Paragraph::new(Line::from(vec![
            Span::styled("DevView Playback", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("  |  "),
            Span::styled(clock, Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
            Span::raw("  |  "),
            Span::raw(format!("Tick: {}", tick)),
            Span::raw("  |  "),
            Span::raw(format!("Redraws: {}", self.frame_count)),
        ]))
        .block(Block::default().borders(Borders::BOTTOM));
        f.render_widget(header, area);
    }

    fn render_scatter(&self, f: &mut Frame, area: Rect) {
        let Some(frame) = self.latest.as_ref() else {
            f.render_widget(Block::default().title("Positions").borders(Borders::ALL), area);
            return;
        };
        let scatter = &frame.scatter;
        let layout = scatter.layout;
        let (x_bounds, y_bounds) = layout.camera.projected_bounds(&layout.viewport);
        let pivot = layout.viewport.center();

        // Projected edges of the viewport cube
        let corners: Vec<[f64; 2]> = layout
            .viewport
            .corners()
            .iter()
            .map(|c| layout.camera.project(c, &pivot))
            .collect();
        let edges: Vec<(usize, usize)> = (0..8usize)
            .flat_map(|a| [1usize, 2, 4].into_iter().map(move |bit| (a, a ^ bit)))
            .filter(|(a, b)| a < b)
            .collect();

        let series: Vec<(Color, Vec<(f64, f64)>)> = scatter
            .series
            .iter()
            .enumerate()
            .map(|(i, s)| (series_color(i), scatter.projected(s).collect()))
            .collect();

        let legend: Vec<Span> = scatter
            .series
            .iter()
            .enumerate()
            .map(|(i, s)| {
                Span::styled(format!(" ● {} ", s.name), Style::default().fg(series_color(i)))
            })
            .collect();

        let canvas = Canvas::default()
            .block(
                Block::default()
                    .title(Line::from(legend))
                    .title_bottom(format!(
                        "viewport [{}, {}]",
                        layout.viewport.min, layout.viewport.max
                    ))
                    .borders(Borders::ALL),
            )
            .marker(Marker::Braille)
            .x_bounds(x_bounds)
            .y_bounds(y_bounds)
            .paint(move |ctx| {
                for (a, b) in &edges {
                    ctx.draw(&CanvasLine {
                        x1: corners[*a][0],
                        y1: corners[*a][1],
                        x2: corners[*b][0],
                        y2: corners[*b][1],
                        color: Color::DarkGray,
                    });
                }
                ctx.layer();
                for (color, coords) in &series {
                    ctx.draw(&Points {
                        coords,
                        color: *color,
                    });
                }
            });
        f.render_widget(canvas, area);
    }

    fn render_table(&self, f: &mut Frame, area: Rect) {
        let header_cells = TABLE_COLUMNS
            .iter()
            .map(|h| Span::styled(*h, Style::default().add_modifier(Modifier::BOLD)));
        let header = Row::new(header_cells).height(1);

        let (rows, title): (Vec<Row>, String) = match self.latest.as_ref() {
            Some(frame) => (
                frame
                    .table
                    .page(self.page)
                    .iter()
                    .map(|row| Row::new(row.cells()))
                    .collect(),
                format!(
                    "Devices ({} rows, page {}/{})",
                    frame.table.len(),
                    self.page + 1,
                    frame.table.page_count()
                ),
            ),
            None => (Vec::new(), "Devices".to_string()),
        };

        let table = Table::new(
            rows,
            [
                Constraint::Length(10),
                Constraint::Length(11),
                Constraint::Length(11),
                Constraint::Length(11),
                Constraint::Min(12),
            ],
        )
        .header(header)
        .block(Block::default().title(title).borders(Borders::ALL));
        f.render_widget(table, area);
    }
}

// =============================================================================
// TESTS
// =============================================================================
