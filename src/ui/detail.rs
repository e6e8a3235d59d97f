//! Entity detail overlay.
//!
//! Shows everything the panel knows about the selected entity: export
//! settings, live state, and the owning device.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::App;
use crate::ui::common::centered;

/// Render the detail overlay for the selected entity.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let Some(row) = app.selected_row() else {
        return;
    };

    let mut lines = vec![
        Line::from(vec![Span::styled(
            row.display_name.clone(),
            app.theme.header,
        )]),
        Line::from(""),
        field("Entity", &row.entity_id),
        field("Metric", &row.metric_name),
        field("Mode", if row.realtime { "realtime" } else { "batch" }),
        field("Interval", &format!("{}s", row.interval)),
        field("Tags", &row.tags),
    ];

    if let Some(entity) = app.snapshot.entities.get(&row.entity_id) {
        lines.push(Line::from(""));
        lines.push(field("State", &entity.state));
        if let Some(friendly) = entity.friendly_name() {
            lines.push(field("Friendly name", friendly));
        }
        if let Some(device) = app.snapshot.device_for(&row.entity_id) {
            let name = device.name.as_deref().unwrap_or("(unnamed)");
            lines.push(field("Device", name));
            if let (Some(manufacturer), Some(model)) = (&device.manufacturer, &device.model) {
                lines.push(field("Hardware", &format!("{} {}", manufacturer, model)));
            }
        }
    } else {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            " Not present in the current snapshot",
            Style::default().fg(app.theme.warning),
        )));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Esc/Enter to close",
        Style::default().add_modifier(Modifier::DIM),
    )));

    let height = (lines.len() as u16).saturating_add(2);
    let overlay = centered(area, 60, height);

    let block = Block::default()
        .title(" Entity ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    frame.render_widget(Clear, overlay);
    frame.render_widget(Paragraph::new(lines).block(block), overlay);
}

fn field(name: &str, value: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            format!(" {:<14}", name),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(value.to_string()),
    ])
}
