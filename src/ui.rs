use chrono::Local;
use itertools::Itertools;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Widget, Wrap},
    Frame,
};
use std::time::Duration;
use time_humanize::{Accuracy, HumanTime, Tense};

use taplock::auth::AuthPhase;
use taplock::stats::AttemptRecord;

use crate::{App, AppState, Notice, SortBy};

/// Top-level draw dispatch for the current app state.
pub fn draw(app: &App, f: &mut Frame) {
    match app.state {
        AppState::AttemptStats => render_attempt_history(app, f),
        _ => f.render_widget(app, f.area()),
    }
}

/// The clickable canvas region for a given terminal area.
///
/// Input mapping and rendering share this, so a click always lands on the
/// cell its marker is drawn in.
pub fn canvas_rect(area: Rect) -> Rect {
    let chunks = entry_layout(area);
    Block::default().borders(Borders::ALL).inner(chunks[0])
}

fn entry_layout(area: Rect) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(8),    // canvas
            Constraint::Length(1), // session summary
            Constraint::Length(1), // notice
            Constraint::Length(1), // key help
        ])
        .split(area)
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.state {
            AppState::Entry => render_entry(self, area, buf),
            AppState::Details => render_details(self, area, buf),
            AppState::Verified => render_verified(self, area, buf),
            // Handled by draw(); nothing to paint here.
            AppState::AttemptStats => {}
        }
    }
}

fn render_entry(app: &App, area: Rect, buf: &mut Buffer) {
    let chunks = entry_layout(area);

    let canvas_block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" taplock · {} ", app.backdrop.name));
    let inner = canvas_block.inner(chunks[0]);
    canvas_block.render(chunks[0], buf);

    render_backdrop(app, inner, buf);
    render_markers(app, inner, buf);

    let phase_text = match app.session.phase() {
        AuthPhase::NoPasswordSaved => "no password saved",
        AuthPhase::AwaitingEntry => "password set",
        AuthPhase::Authenticated => "authenticated",
    };
    let count = app.session.working_points().len();
    let entered = match count {
        0 => "no points entered".to_string(),
        1 => "1 point entered".to_string(),
        n => format!("{} points entered", n),
    };
    let summary = format!(
        "{} · {} · tolerance {}",
        phase_text,
        entered,
        app.session.tolerance()
    );
    Paragraph::new(Span::styled(
        summary,
        Style::default().add_modifier(Modifier::DIM),
    ))
    .alignment(Alignment::Center)
    .render(chunks[1], buf);

    render_notice(app, chunks[2], buf);

    let help = [
        "click: add point",
        "(s)ave password",
        "(l)ogin",
        "(c)lear",
        "(a)ttempt history",
        "esc: quit",
    ]
    .iter()
    .join(" · ");
    Paragraph::new(Span::styled(
        help,
        Style::default().add_modifier(Modifier::DIM),
    ))
    .alignment(Alignment::Center)
    .render(chunks[3], buf);
}

fn render_backdrop(app: &App, area: Rect, buf: &mut Buffer) {
    let backdrop = &app.backdrop;
    let x0 = area.x + area.width.saturating_sub(backdrop.width() as u16) / 2;
    let y0 = area.y + area.height.saturating_sub(backdrop.height() as u16) / 2;
    let style = Style::default().fg(Color::DarkGray);

    for (dy, line) in backdrop.lines.iter().enumerate() {
        let y = y0 + dy as u16;
        if y >= area.bottom() {
            break;
        }
        buf.set_stringn(x0, y, line, (area.right() - x0) as usize, style);
    }
}

fn render_markers(app: &App, area: Rect, buf: &mut Buffer) {
    let style = Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD);

    for p in app.session.working_points() {
        let (Ok(dx), Ok(dy)) = (u16::try_from(p.x), u16::try_from(p.y)) else {
            continue;
        };
        // Points recorded before a resize may no longer fit the canvas.
        if dx >= area.width || dy >= area.height {
            continue;
        }

        if let Some(cell) = buf.cell_mut(Position::new(area.x + dx, area.y + dy)) {
            cell.set_symbol("●");
            cell.set_style(style);
        }
    }
}

fn render_notice(app: &App, area: Rect, buf: &mut Buffer) {
    let Some(ref notice) = app.notice else {
        return;
    };

    let (text, style) = match notice {
        Notice::Info(msg) => (msg, Style::default().fg(Color::Cyan)),
        Notice::Success(msg) => (
            msg,
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        ),
        Notice::Error(msg) => (
            msg,
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ),
    };

    Paragraph::new(Span::styled(text.clone(), style))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(area, buf);
}

fn render_details(app: &App, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(25),
            Constraint::Length(2), // heading
            Constraint::Length(2), // subtitle
            Constraint::Length(6), // fields
            Constraint::Length(1), // notice
            Constraint::Length(1), // key help
            Constraint::Min(0),
        ])
        .split(area);

    Paragraph::new(Span::styled(
        "Login Successful!",
        Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD),
    ))
    .alignment(Alignment::Center)
    .render(chunks[1], buf);

    Paragraph::new(Span::styled(
        "Fill in your details to continue.",
        Style::default().add_modifier(Modifier::DIM),
    ))
    .alignment(Alignment::Center)
    .render(chunks[2], buf);

    let fields = [
        ("Name", &app.form.name),
        ("Id", &app.form.id),
        ("Contact", &app.form.contact),
    ];

    let mut lines = Vec::new();
    for (idx, (label, value)) in fields.iter().enumerate() {
        let focused = idx == app.form.focus;
        let label_style = if focused {
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        let cursor = if focused { "▏" } else { "" };

        lines.push(Line::from(vec![
            Span::styled(format!("{:>8}: ", label), label_style),
            Span::raw(format!("{}{}", value, cursor)),
        ]));
        lines.push(Line::default());
    }

    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .render(chunks[3], buf);

    render_notice(app, chunks[4], buf);

    let help = [
        "type to fill the field",
        "tab: next field",
        "enter: submit",
        "esc: quit",
    ]
    .iter()
    .join(" · ");
    Paragraph::new(Span::styled(
        help,
        Style::default().add_modifier(Modifier::DIM),
    ))
    .alignment(Alignment::Center)
    .render(chunks[5], buf);
}

fn render_verified(app: &App, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(40),
            Constraint::Length(2),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(area);

    Paragraph::new(Span::styled(
        "Verified Authentication Done!",
        Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD),
    ))
    .alignment(Alignment::Center)
    .render(chunks[1], buf);

    render_notice(app, chunks[2], buf);

    Paragraph::new(Span::styled(
        "(r): start over · esc: quit",
        Style::default().add_modifier(Modifier::DIM),
    ))
    .alignment(Alignment::Center)
    .render(chunks[3], buf);
}

fn render_attempt_history(app: &App, f: &mut Frame) {
    let area = f.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Length(1), // Summary
            Constraint::Min(0),    // Attempts table
            Constraint::Length(1), // Notice
            Constraint::Length(2), // Instructions
        ])
        .split(area);

    let sort_by_text = match app.stats_view.sort_by {
        SortBy::Recent => "Recent",
        SortBy::Deviation => "Deviation",
    };
    let title = Paragraph::new(format!("Attempt History (Sort: {})", sort_by_text))
        .block(Block::default().borders(Borders::ALL).title("Stats"))
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center);
    f.render_widget(title, chunks[0]);

    let Some(ref db) = app.attempt_db else {
        let msg = Paragraph::new("Attempt history is disabled for this session.")
            .style(Style::default().add_modifier(Modifier::DIM))
            .alignment(Alignment::Center);
        f.render_widget(msg, chunks[2]);
        render_history_help(f, chunks[4]);
        return;
    };

    let summary = match (db.attempt_count(), db.success_rate(), db.avg_deviation()) {
        (Ok(count), Ok(Some(rate)), Ok(avg)) => format!(
            "{} attempts · {:.0}% success · avg max deviation {}",
            count,
            rate,
            avg.map(|a| format!("{:.1}", a))
                .unwrap_or_else(|| "—".to_string()),
        ),
        _ => "no attempts recorded yet".to_string(),
    };
    f.render_widget(
        Paragraph::new(summary)
            .style(Style::default().add_modifier(Modifier::DIM))
            .alignment(Alignment::Center),
        chunks[1],
    );

    let mut records = db.recent_attempts(200).unwrap_or_default();
    if app.stats_view.sort_by == SortBy::Deviation {
        records = records
            .into_iter()
            .sorted_by_key(|r| std::cmp::Reverse(r.max_deviation.unwrap_or(-1)))
            .collect();
    }

    let offset = app
        .stats_view
        .scroll_offset
        .min(records.len().saturating_sub(1));
    let rows = records.iter().skip(offset).map(|rec| {
        let outcome_style = if rec.matched {
            Style::default().fg(Color::Green)
        } else {
            Style::default().fg(Color::Red)
        };

        Row::new(vec![
            Cell::from(humanized_age(rec)),
            Cell::from(if rec.matched { "ok" } else { "fail" }).style(outcome_style),
            Cell::from(format!("{} / {}", rec.points_entered, rec.points_saved)),
            Cell::from(
                rec.max_deviation
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "—".to_string()),
            ),
        ])
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(24),
            Constraint::Length(8),
            Constraint::Length(12),
            Constraint::Length(10),
        ],
    )
    .header(
        Row::new(vec!["when", "result", "points", "max dev"])
            .style(Style::default().add_modifier(Modifier::BOLD)),
    )
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(table, chunks[2]);

    render_notice(app, chunks[3], f.buffer_mut());
    render_history_help(f, chunks[4]);
}

fn render_history_help(f: &mut Frame, area: Rect) {
    let help = [
        "↑/↓ scroll",
        "(d): toggle sort",
        "(e): export csv",
        "(b): back",
        "esc: quit",
    ]
    .iter()
    .join(" · ");
    f.render_widget(
        Paragraph::new(help)
            .style(Style::default().add_modifier(Modifier::DIM))
            .alignment(Alignment::Center),
        area,
    );
}

fn humanized_age(rec: &AttemptRecord) -> String {
    let secs = (Local::now() - rec.timestamp).num_seconds().max(0) as u64;
    HumanTime::from(Duration::from_secs(secs)).to_text_en(Accuracy::Rough, Tense::Past)
}
