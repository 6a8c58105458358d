//! Orrery - Terminal User Interface
//!
//! Scroll the solar system through time in a terminal.
//! App logic lives in `orrery::tui::orrery_app`.

#![forbid(unsafe_code)]

#[cfg(feature = "tui")]
fn main() -> std::io::Result<()> {
    use orrery::config::OrreryConfig;
    use orrery::tui::orrery_app::OrreryApp;

    tui::init_tracing();
    let config = match std::env::args().nth(1) {
        Some(path) => match OrreryConfig::load(&path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("cannot load {path}: {err}");
                std::process::exit(2);
            }
        },
        None => OrreryConfig::embedded(),
    };
    tui::run(OrreryApp::from_config(config))
}

#[cfg(not(feature = "tui"))]
fn main() {
    eprintln!("TUI feature not enabled. Run with --features tui");
    std::process::exit(1);
}

#[cfg(feature = "tui")]
mod tui {
    use crossterm::{
        event::{self, Event, KeyEventKind},
        execute,
        terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    };
    use orrery::render::RenderCommand;
    use orrery::shell::Availability;
    use orrery::tui::orrery_app::{OrreryApp, VIEW_SIZE};
    use ratatui::{
        backend::CrosstermBackend,
        layout::{Constraint, Direction, Layout, Rect},
        style::{Color, Modifier, Style},
        text::{Line, Span},
        widgets::{
            canvas::{Canvas, Circle, Line as CanvasLine, Points},
            Block, Borders, Gauge, Paragraph,
        },
        Frame, Terminal,
    };
    use std::io;
    use std::time::{Duration, Instant};
    use tracing_subscriber::EnvFilter;

    /// Log to stderr, filtered by `RUST_LOG` (default `warn`).
    pub fn init_tracing() {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .try_init();
    }

    /// Run the TUI application.
    pub fn run(mut app: OrreryApp) -> io::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let tick_rate = Duration::from_millis(33);

        loop {
            let start = Instant::now();
            terminal.draw(|f| ui(f, &app))?;

            let timeout = tick_rate.saturating_sub(start.elapsed());
            if event::poll(timeout)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        app.handle_key(key.code);
                    }
                }
            }

            if app.should_quit() {
                break;
            }

            app.update();
        }

        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        Ok(())
    }

    fn ui(f: &mut Frame, app: &OrreryApp) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(10),
                Constraint::Length(3),
                Constraint::Length(4),
            ])
            .split(f.area());

        render_title(f, chunks[0], app);
        render_view(f, chunks[1], app);
        render_status(f, chunks[2], app);
        render_panel(f, chunks[3], app);
    }

    fn term_color(c: orrery::color::Color) -> Color {
        Color::Rgb(c.r, c.g, c.b)
    }

    fn render_title(f: &mut Frame, area: Rect, app: &OrreryApp) {
        let hud = app.hud();
        let title = Paragraph::new(vec![Line::from(vec![
            Span::styled(
                " ORRERY ",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
            Span::raw(" | "),
            Span::styled(
                format!("[{}]", hud.mode.label()),
                Style::default().fg(if app.paused { Color::DarkGray } else { Color::Green }),
            ),
            Span::raw(" | "),
            Span::styled(hud.epoch_label(), Style::default().fg(Color::White)),
            Span::raw(" | "),
            Span::styled(hud.prediction.label, Style::default().fg(Color::Cyan)),
        ])])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("[Tab] Mode  [Up/Down] Step/Zoom  [1-6] Step  [n/p] Epoch  [Q] Quit"),
        );
        f.render_widget(title, area);
    }

    fn render_view(f: &mut Frame, area: Rect, app: &OrreryApp) {
        let (w, h) = (f64::from(VIEW_SIZE.0), f64::from(VIEW_SIZE.1));
        let unavailable = match app.hud().availability {
            Availability::Available => None,
            Availability::Unavailable { reason } => Some(reason),
        };
        if let Some(reason) = unavailable {
            let text = Paragraph::new(format!("View unavailable: {reason}"))
                .block(Block::default().borders(Borders::ALL).title("Orrery"));
            f.render_widget(text, area);
            return;
        }

        // Canvas y grows upward; screen y grows downward.
        let flip = |(x, y): (f64, f64)| (x, h - y);
        let canvas = Canvas::default()
            .block(Block::default().borders(Borders::ALL).title("Orrery"))
            .x_bounds([0.0, w])
            .y_bounds([0.0, h])
            .paint(|ctx| {
                for command in app.commands() {
                    match command {
                        RenderCommand::Clear { .. } => {}
                        RenderCommand::DrawCircle { x, y, radius, color, .. }
                        | RenderCommand::DrawGlow { x, y, radius, color } => {
                            let (x, y) = flip((*x, *y));
                            ctx.draw(&Circle {
                                x,
                                y,
                                radius: *radius,
                                color: term_color(*color),
                            });
                        }
                        RenderCommand::DrawPolyline { points, color } => {
                            for pair in points.windows(2) {
                                let (x1, y1) = flip(pair[0]);
                                let (x2, y2) = flip(pair[1]);
                                ctx.draw(&CanvasLine {
                                    x1,
                                    y1,
                                    x2,
                                    y2,
                                    color: term_color(*color),
                                });
                            }
                        }
                        RenderCommand::DrawPoints { points, color, .. } => {
                            let coords: Vec<(f64, f64)> = points.iter().copied().map(flip).collect();
                            ctx.draw(&Points {
                                coords: &coords,
                                color: term_color(*color),
                            });
                        }
                        RenderCommand::DrawText { x, y, text, color } => {
                            let (x, y) = flip((*x, *y));
                            ctx.print(x, y, Span::styled(text.clone(), Style::default().fg(term_color(*color))));
                        }
                    }
                }
            });
        f.render_widget(canvas, area);
    }

    fn render_status(f: &mut Frame, area: Rect, app: &OrreryApp) {
        let hud = app.hud();
        let highlighted = hud
            .highlighted
            .map_or_else(String::new, |e| format!("{}: {}", e.label, e.rationale));
        let status = Paragraph::new(vec![Line::from(vec![
            Span::styled("Step: ", Style::default().fg(Color::Gray)),
            Span::styled(app.step_label(), Style::default().fg(Color::White)),
            Span::raw(" | "),
            Span::styled("Z: ", Style::default().fg(Color::Gray)),
            Span::styled(format!("{:.0}x", hud.z_scale), Style::default().fg(Color::White)),
            Span::raw(" | "),
            Span::styled("Trail: ", Style::default().fg(Color::Gray)),
            Span::styled(app.selected.name(), Style::default().fg(Color::White)),
            Span::raw(" | "),
            Span::styled(highlighted, Style::default().fg(Color::Yellow)),
        ])])
        .block(Block::default().borders(Borders::ALL));
        f.render_widget(status, area);
    }

    fn render_panel(f: &mut Frame, area: Rect, app: &OrreryApp) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(area);

        let hud = app.hud();
        let datasets: Vec<Span> = if hud.datasets.is_empty() {
            vec![Span::styled("no instrumental data", Style::default().fg(Color::DarkGray))]
        } else {
            hud.datasets
                .iter()
                .map(|d| Span::styled(format!("{} ", d.name), Style::default().fg(term_color(d.color))))
                .collect()
        };
        let coverage = Paragraph::new(vec![
            Line::from(datasets),
            Line::from(Span::styled(hud.prediction.description, Style::default().fg(Color::Gray))),
        ])
        .block(Block::default().borders(Borders::ALL).title("Coverage"));
        f.render_widget(coverage, chunks[0]);

        let percent = (hud.torque * 100.0).clamp(0.0, 100.0) as u16;
        let gauge = Gauge::default()
            .block(Block::default().borders(Borders::ALL).title("Torque Index"))
            .gauge_style(Style::default().fg(if hud.torque > 0.7 { Color::Red } else { Color::Yellow }))
            .percent(percent)
            .label(hud.torque_label());
        f.render_widget(gauge, chunks[1]);
    }

}
