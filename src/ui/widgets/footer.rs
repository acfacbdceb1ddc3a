// src/ui/widgets/footer.rs

use crate::app::{App, AppState, ExportStatus};
use ratatui::{
    prelude::*,
    style::{Color, Style, Stylize},
    text::{Line, Span},
    widgets::Paragraph,
};

fn key(label: &str) -> Span<'_> {
    Span::styled(label, Style::new().bold().fg(Color::Yellow))
}

/// Renders the footer widget, which displays available actions.
pub fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let line = match &app.state {
        AppState::Idle => Line::from(vec![
            Span::raw("Press "),
            key("Enter"),
            Span::raw(" to scan, "),
            key("Esc"),
            Span::raw(" to quit."),
        ]),
        AppState::Finished => match &app.export_status {
            ExportStatus::Success(message) => Line::from(Span::styled(message.clone(), Style::new().fg(Color::Green))),
            ExportStatus::Error(message) => {
                Line::from(Span::styled(format!("Export failed: {message}"), Style::new().fg(Color::Red)))
            }
            ExportStatus::Idle => Line::from(vec![
                key("[N]"),
                Span::raw("ew Scan, "),
                key("[E]"),
                Span::raw("xport, "),
                key("[Q]"),
                Span::raw("uit"),
            ]),
        },
        AppState::Failed(_) => Line::from(vec![key("[N]"), Span::raw("ew Scan, "), key("[Q]"), Span::raw("uit")]),
        AppState::Scanning => Line::from("Scanning... Press Q to quit."),
    };

    let footer = Paragraph::new(line).alignment(Alignment::Center);
    frame.render_widget(footer, area);
}
