//! Candidate search overlay.
//!
//! A centered modal with a query line and the bounded candidate list.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row as TableRow, Table, TableState},
    Frame,
};

use crate::app::App;
use crate::data::matcher::MIN_QUERY_LEN;
use crate::ui::common::centered;

/// Render the entity search overlay.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let overlay = centered(area, 70, 16);
    frame.render_widget(Clear, overlay);

    let block = Block::default()
        .title(" Track Entity ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));
    let inner = block.inner(overlay);
    frame.render_widget(block, overlay);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(inner);

    let query = Line::from(vec![
        Span::styled(" Search: ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(format!("{}_", app.search_query)),
    ]);
    frame.render_widget(Paragraph::new(query), chunks[0]);

    if app.search_query.chars().count() < MIN_QUERY_LEN {
        let hint = Paragraph::new(" Type at least 2 characters")
            .style(Style::default().add_modifier(Modifier::DIM));
        frame.render_widget(hint, chunks[1]);
        return;
    }

    if app.candidates.is_empty() {
        let hint = Paragraph::new(" No matching untracked entities")
            .style(Style::default().add_modifier(Modifier::DIM));
        frame.render_widget(hint, chunks[1]);
        return;
    }

    let rows: Vec<TableRow> = app
        .candidates
        .iter()
        .map(|c| {
            TableRow::new(vec![
                Cell::from(c.display_name.clone()),
                Cell::from(c.entity_id.clone())
                    .style(Style::default().add_modifier(Modifier::DIM)),
                Cell::from(c.state.clone()),
            ])
        })
        .collect();

    let widths = [
        Constraint::Fill(2),
        Constraint::Fill(2),
        Constraint::Fill(1),
    ];

    let table = Table::new(rows, widths)
        .row_highlight_style(app.theme.selected)
        .highlight_symbol("▶ ");

    let mut state = TableState::default();
    state.select(Some(app.candidate_selected.min(app.candidates.len() - 1)));

    frame.render_stateful_widget(table, chunks[1], &mut state);
}
