//! Ratatui-based terminal UI.
//!
//! The left panel lists the merged timeline; toggling a date recomputes the
//! selection and the comparison, which are drawn as a chart and a table.

use std::io;
use std::time::Duration;

use chrono::{Datelike, NaiveDate};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use plotters::style::RGBColor;
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
};
use tracing::debug;

use crate::app::pipeline::{Session, View};
use crate::domain::{MAX_SELECTED_DATES, SeriesId};
use crate::error::AppError;
use crate::report::fmt_rate;

mod plotters_chart;

use plotters_chart::{ChartLine, RatesChart};

/// Rows moved by PgUp/PgDn.
const PAGE: usize = 10;

/// Line colours per series, in load order.
const LINE_COLORS: [(RGBColor, Color); 4] = [
    (RGBColor(0, 255, 255), Color::Cyan),
    (RGBColor(255, 0, 255), Color::Magenta),
    (RGBColor(0, 255, 0), Color::Green),
    (RGBColor(255, 128, 0), Color::LightRed),
];

/// Start the TUI on a loaded session.
pub fn run(session: Session, requested: Vec<NaiveDate>) -> Result<(), AppError> {
    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(session, requested);
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

struct App {
    session: Session,
    ids: Vec<SeriesId>,
    /// Dates in the order the user toggled them on; may exceed the cap.
    requested: Vec<NaiveDate>,
    view: View,
    cursor: usize,
    status: String,
}

impl App {
    fn new(session: Session, requested: Vec<NaiveDate>) -> Self {
        let ids = session.store().ids().cloned().collect();
        let view = session.interact(&requested);
        let cursor = requested
            .first()
            .and_then(|d| session.timeline().position(*d))
            .unwrap_or(0);
        Self {
            session,
            ids,
            requested,
            view,
            cursor,
            status: "Space to select a date.".to_string(),
        }
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => needs_redraw = true,
                _ => {}
            }
        }
        Ok(())
    }

    /// Apply one key press. Returns `true` when the app should quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        let last = self.session.timeline().len().saturating_sub(1);
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Up | KeyCode::Char('k') => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => self.cursor = (self.cursor + 1).min(last),
            KeyCode::PageUp => self.cursor = self.cursor.saturating_sub(PAGE),
            KeyCode::PageDown => self.cursor = (self.cursor + PAGE).min(last),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = last,
            KeyCode::Char(' ') | KeyCode::Enter => self.toggle_current(),
            KeyCode::Char('c') => {
                self.requested.clear();
                self.refresh();
                self.status = "Selection cleared.".to_string();
            }
            _ => {}
        }
        false
    }

    fn toggle_current(&mut self) {
        let Some(&date) = self.session.timeline().dates().get(self.cursor) else {
            return;
        };
        if let Some(pos) = self.requested.iter().position(|d| *d == date) {
            self.requested.remove(pos);
            self.status = format!("Removed {date}.");
        } else {
            self.requested.push(date);
            self.status = format!("Added {date}.");
        }
        self.refresh();
    }

    fn refresh(&mut self) {
        self.view = self.session.interact(&self.requested);
        debug!(
            requested = self.requested.len(),
            accepted = self.view.selection.accepted.len(),
            "selection recomputed"
        );
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(5), Constraint::Min(0), Constraint::Length(3)])
            .split(frame.area());

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut title = vec![Span::styled("rates", Style::default().fg(Color::Cyan)), Span::raw(" | ")];
        for (slot, id) in self.ids.iter().enumerate() {
            if slot > 0 {
                title.push(Span::raw(" vs "));
            }
            title.push(Span::styled(id.to_string(), Style::default().fg(series_color(slot).1)));
        }

        let timeline = self.session.timeline();
        let range = match (timeline.first(), timeline.last()) {
            (Some(first), Some(last)) => format!("{first} .. {last}"),
            _ => "-".to_string(),
        };
        let mut lines = vec![
            Line::from(title),
            Line::from(Span::styled(
                format!(
                    "{} dates ({range}) | selected {}/{MAX_SELECTED_DATES}",
                    timeline.len(),
                    self.view.selection.accepted.len()
                ),
                Style::default().fg(Color::Gray),
            )),
        ];
        if self.view.selection.truncated {
            lines.push(Line::from(Span::styled(
                format!("Only {MAX_SELECTED_DATES} dates can be compared; extra dates are ignored."),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )));
        }

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(20), Constraint::Min(0)])
            .split(area);

        self.draw_dates(frame, cols[0]);

        let table_height = (self.view.rows.len().max(1) + 3) as u16;
        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(table_height)])
            .split(cols[1]);

        self.draw_chart(frame, right[0]);
        self.draw_table(frame, right[1]);
    }

    fn draw_dates(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let items: Vec<ListItem> = self
            .session
            .timeline()
            .dates()
            .iter()
            .map(|date| {
                let (mark, style) = if self.view.selection.accepted.contains(date) {
                    ("[x]", Style::default().fg(Color::Yellow))
                } else if self.requested.contains(date) {
                    ("[!]", Style::default().fg(Color::DarkGray))
                } else {
                    ("[ ]", Style::default())
                };
                ListItem::new(format!("{mark} {date}")).style(style)
            })
            .collect();

        let list = List::new(items)
            .block(Block::default().title("Dates").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ListState::default();
        if !self.session.timeline().is_empty() {
            state.select(Some(self.cursor));
        }
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title("Policy rates").borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let data = chart_data(&self.session, &self.view);
        let Some((x_bounds, y_bounds)) = data.bounds else {
            let msg = Paragraph::new("No data to plot.").style(Style::default().fg(Color::Yellow));
            frame.render_widget(msg, inner);
            return;
        };

        let lines: Vec<ChartLine<'_>> = data
            .lines
            .iter()
            .enumerate()
            .map(|(slot, points)| ChartLine {
                points,
                color: series_color(slot).0,
            })
            .collect();

        let (chart_rect, insets) = chart_layout(inner);
        let widget = RatesChart {
            lines: &lines,
            markers: &data.markers,
            guides: &data.guides,
            x_bounds,
            y_bounds,
            x_label: "date",
            y_label: "rate (%)",
            fmt_x: fmt_axis_date,
            fmt_y: fmt_axis_rate,
        };

        frame.render_widget(widget, chart_rect);
        if let Some(insets) = insets {
            draw_axis_ticks(frame, inner, chart_rect, insets, x_bounds, y_bounds);
        }
    }

    fn draw_table(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let header_style = Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD);
        let mut header = vec![Span::styled(format!("{:<12}", "date"), header_style)];
        for (slot, id) in self.ids.iter().enumerate() {
            header.push(Span::styled(
                format!("{:>10}", id.as_str()),
                header_style.fg(series_color(slot).1),
            ));
        }

        let mut lines = vec![Line::from(header)];
        if self.view.rows.is_empty() {
            lines.push(Line::from(Span::styled(
                "No dates selected.",
                Style::default().fg(Color::DarkGray),
            )));
        }
        for row in &self.view.rows {
            let mut spans = vec![Span::raw(format!("{:<12}", row.date.to_string()))];
            for id in &self.ids {
                let rate = row.rate_for(id);
                let style = if rate.is_some() {
                    Style::default()
                } else {
                    Style::default().fg(Color::DarkGray)
                };
                spans.push(Span::styled(format!("{:>10}", fmt_rate(rate)), style));
            }
            lines.push(Line::from(spans));
        }

        let p = Paragraph::new(Text::from(lines))
            .block(Block::default().title("Comparison").borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "↑/↓ move  PgUp/PgDn page  Space toggle  c clear  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

fn series_color(slot: usize) -> (RGBColor, Color) {
    LINE_COLORS[slot % LINE_COLORS.len()]
}

/// Chart inputs in plot coordinates (day numbers, percent).
#[derive(Debug, Default)]
struct ChartData {
    lines: Vec<Vec<(f64, f64)>>,
    markers: Vec<(f64, f64)>,
    guides: Vec<f64>,
    bounds: Option<([f64; 2], [f64; 2])>,
}

fn chart_data(session: &Session, view: &View) -> ChartData {
    let lines: Vec<Vec<(f64, f64)>> = session
        .store()
        .series()
        .map(|s| s.points().iter().map(|p| (day_number(p.date), p.rate)).collect())
        .collect();
    let markers = view
        .markers
        .iter()
        .map(|m| (day_number(m.date), m.rate))
        .collect();
    let guides = view.selection.accepted.iter().map(|d| day_number(*d)).collect();

    let timeline = session.timeline();
    let bounds = match (timeline.first(), timeline.last()) {
        (Some(first), Some(last)) => {
            let (mut x0, mut x1) = (day_number(first), day_number(last));
            if x1 <= x0 {
                x0 -= 1.0;
                x1 += 1.0;
            }

            let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
            for &(_, y) in lines.iter().flatten() {
                y_min = y_min.min(y);
                y_max = y_max.max(y);
            }
            if !y_min.is_finite() || !y_max.is_finite() {
                y_min = 0.0;
                y_max = 1.0;
            } else if y_max <= y_min {
                y_min -= 0.5;
                y_max += 0.5;
            }
            let pad = ((y_max - y_min).abs() * 0.05).max(1e-12);
            Some(([x0, x1], [y_min - pad, y_max + pad]))
        }
        _ => None,
    };

    ChartData {
        lines,
        markers,
        guides,
        bounds,
    }
}

fn day_number(date: NaiveDate) -> f64 {
    date.num_days_from_ce() as f64
}

fn fmt_axis_date(v: f64) -> String {
    NaiveDate::from_num_days_from_ce_opt(v.round() as i32)
        .map(|d| d.format("%Y-%m").to_string())
        .unwrap_or_default()
}

fn fmt_axis_rate(v: f64) -> String {
    format!("{v:.2}")
}

#[derive(Debug, Clone, Copy)]
struct AxisInsets {
    left: u16,
    right: u16,
    top: u16,
    bottom: u16,
}

fn chart_layout(inner: Rect) -> (Rect, Option<AxisInsets>) {
    let insets = AxisInsets {
        left: 8,
        right: 2,
        top: 1,
        bottom: 2,
    };

    if inner.width <= insets.left + insets.right + 10 || inner.height <= insets.top + insets.bottom + 5 {
        return (inner, None);
    }

    let rect = Rect {
        x: inner.x + insets.left,
        y: inner.y + insets.top,
        width: inner.width - insets.left - insets.right,
        height: inner.height - insets.top - insets.bottom,
    };

    (rect, Some(insets))
}

fn draw_axis_ticks(
    frame: &mut ratatui::Frame<'_>,
    inner: Rect,
    chart: Rect,
    insets: AxisInsets,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
) {
    let ticks = 4usize;
    let style = Style::default().fg(Color::Gray);

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let x_val = x_bounds[0] + u * (x_bounds[1] - x_bounds[0]);
        let x = chart.x + ((chart.width - 1) as f64 * u).round() as u16;
        let label = fmt_axis_date(x_val);
        let label_len = label.len() as u16;
        let start = x.saturating_sub(label_len / 2);
        let y = chart.y + chart.height;
        if y >= inner.y + inner.height - 1 {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let y_val = y_bounds[0] + u * (y_bounds[1] - y_bounds[0]);
        let y = chart.y + (chart.height - 1) - ((chart.height - 1) as f64 * u).round() as u16;
        let label = fmt_axis_rate(y_val);
        let label_len = label.len() as u16;
        let x = inner.x + insets.left.saturating_sub(1);
        let start = x.saturating_sub(label_len);
        if start < inner.x {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    let x_label = Paragraph::new("date").alignment(Alignment::Center).style(style);
    let x_rect = Rect {
        x: chart.x,
        y: chart.y + chart.height + 1,
        width: chart.width,
        height: 1,
    };
    if x_rect.y < inner.y + inner.height {
        frame.render_widget(x_label, x_rect);
    }

    let y_label = Paragraph::new("%").style(style.add_modifier(Modifier::BOLD));
    let y_rect = Rect {
        x: inner.x,
        y: inner.y,
        width: insets.left.saturating_sub(1),
        height: 1,
    };
    frame.render_widget(y_label, y_rect);
}
