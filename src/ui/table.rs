//! Tracked entity table rendering.
//!
//! The main view: one row per tracked entity with resolved display name,
//! metric name, export mode, effective interval, and annotation tags.

use ratatui::{
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    widgets::{Block, Borders, Cell, Row as TableRow, Table, TableState},
    Frame,
};

use crate::app::{App, Mode};

/// Render the tracked entity table.
pub fn render(frame: &mut Frame, app: &mut App, area: Rect) {
    let header = TableRow::new(vec![
        Cell::from("Name"),
        Cell::from("Metric"),
        Cell::from("Mode"),
        Cell::from("Interval"),
        Cell::from("Tags"),
    ])
    .height(1)
    .style(app.theme.header);

    let editing = app.mode == Mode::EditInterval;
    let selected = app.selected.min(app.rows.len().saturating_sub(1));

    let rows: Vec<TableRow> = app
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let mode_label = if row.realtime { "realtime" } else { "batch" };

            // While editing the selected row's interval, show the raw
            // input with a cursor instead of the effective value.
            let interval = if editing && i == selected {
                format!("{}_", app.interval_input)
            } else if row.realtime {
                "-".to_string()
            } else {
                format!("{}s", row.interval)
            };
            let interval_style = if editing && i == selected {
                Style::default().fg(app.theme.highlight).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };

            TableRow::new(vec![
                Cell::from(row.display_name.clone()),
                Cell::from(row.metric_name.clone()),
                Cell::from(mode_label).style(app.theme.mode_style(row.realtime)),
                Cell::from(interval).style(interval_style),
                Cell::from(row.tags.clone()),
            ])
        })
        .collect();

    let widths = [
        Constraint::Fill(3),  // Name - gets the largest share
        Constraint::Fill(2),  // Metric
        Constraint::Min(8),   // Mode
        Constraint::Min(8),   // Interval
        Constraint::Fill(2),  // Tags
    ];

    let position_info = if !app.rows.is_empty() {
        format!(" [{}/{}]", selected + 1, app.rows.len())
    } else {
        String::new()
    };

    let title = format!(" Tracked Entities ({}){} ", app.rows.len(), position_info);

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_type(app.theme.border_type)
                .border_style(Style::default().fg(app.theme.border)),
        )
        .row_highlight_style(app.theme.selected)
        .highlight_symbol("▶ ");

    let mut state = TableState::default();
    if !app.rows.is_empty() {
        state.select(Some(selected));
    }

    frame.render_stateful_widget(table, area, &mut state);
}
