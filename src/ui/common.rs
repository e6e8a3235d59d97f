//! Common UI components shared across views.
//!
//! This module contains the header bar, status bar, and help overlay.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::{App, Mode};

/// Render the header bar with a tracking overview.
///
/// Displays: saving indicator, tracked entity count, realtime/batch split,
/// and the configured metric prefix.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let Some(ref config) = app.config else {
        let line = Line::from(vec![
            Span::styled(
                " EXPORT PANEL ",
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw("| Loading configuration..."),
        ]);
        frame.render_widget(Paragraph::new(line), area);
        return;
    };

    let realtime = app.rows.iter().filter(|r| r.realtime).count();
    let batch = app.rows.len() - realtime;

    let (status_icon, status_style) = if app.pipeline.saving() {
        ("◌", Style::default().fg(app.theme.warning))
    } else {
        ("●", Style::default().fg(app.theme.realtime))
    };

    let line = Line::from(vec![
        Span::styled(format!(" {} ", status_icon), status_style),
        Span::styled("EXPORT ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("│ "),
        Span::styled(
            format!("{}", app.rows.len()),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(" tracked │ "),
        Span::styled(format!("{}", realtime), Style::default().fg(app.theme.realtime)),
        Span::raw(" realtime "),
        Span::styled(format!("{}", batch), Style::default().fg(app.theme.batch)),
        Span::raw(" batch │ "),
        Span::raw(format!("prefix {}", config.metric_prefix)),
        if app.pipeline.saving() {
            Span::styled(" │ saving…", Style::default().fg(app.theme.warning))
        } else {
            Span::raw("")
        },
    ]);

    frame.render_widget(Paragraph::new(line), area);
}

/// Render the status bar at the bottom.
///
/// Shows: snapshot feed, time since last update, available controls.
/// Also displays temporary status messages and errors.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    // Check for temporary status message first
    if let Some(msg) = app.get_status_message() {
        let paragraph =
            Paragraph::new(format!(" {} ", msg)).style(Style::default().fg(app.theme.highlight));
        frame.render_widget(paragraph, area);
        return;
    }

    let status = if let Some(updated) = app.last_updated {
        let controls = match app.mode {
            Mode::Search => "Type to search | ↑↓:select Enter:track Esc:cancel",
            Mode::EditInterval => "Type seconds (10-3600) | Enter:apply Esc:cancel",
            Mode::Normal => "a:track d:untrack t:mode i:interval Enter:detail ?:help q:quit",
        };

        format!(
            " {} | Updated {:.1}s ago | {}",
            app.source_description(),
            updated.elapsed().as_secs_f64(),
            controls,
        )
    } else if let Some(ref err) = app.load_error {
        format!(" Error: {} | q:quit", err)
    } else {
        " Waiting for state snapshot... | q:quit".to_string()
    };

    let paragraph = Paragraph::new(status).style(Style::default().add_modifier(Modifier::DIM));

    frame.render_widget(paragraph, area);
}

/// Render the help overlay with keyboard shortcuts.
///
/// Displayed as a centered modal on top of the current view.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let help_text = vec![
        Line::from(vec![Span::styled("Keyboard Shortcuts", app.theme.header)]),
        Line::from(""),
        Line::from(vec![Span::styled(
            " Navigation",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from("  ↑/↓ j/k     Navigate list"),
        Line::from("  PgUp/PgDn   Jump 10 items"),
        Line::from("  Home/End    Jump to first/last"),
        Line::from("  Enter       View detail"),
        Line::from("  Esc         Go back"),
        Line::from(""),
        Line::from(vec![Span::styled(
            " Tracking",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from("  a or /    Track a new entity"),
        Line::from("  d/Del     Stop tracking selected"),
        Line::from("  t/Space   Toggle realtime/batch"),
        Line::from("  i         Edit batch interval"),
        Line::from(""),
        Line::from(vec![Span::styled(
            " General",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from("  q         Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let paragraph = Paragraph::new(help_text).block(block);

    // Center the help overlay - responsive to terminal size
    let help_width = 42u16.min(area.width.saturating_sub(4));
    let help_height = 22u16.min(area.height.saturating_sub(2));
    let help_area = centered(area, help_width, help_height);

    // Clear the area behind the help
    frame.render_widget(ratatui::widgets::Clear, help_area);
    frame.render_widget(paragraph, help_area);
}

/// Compute a centered rectangle of the given size inside `area`.
pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(2));
    let height = height.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}
