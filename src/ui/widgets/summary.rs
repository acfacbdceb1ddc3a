// src/ui/widgets/summary.rs

use crate::app::{App, AppState};
use ratatui::{
    prelude::*,
    text::Line,
    widgets::{Block, Borders, Paragraph},
};

/// Renders the summary widget, a high-level overview of the finished scan.
///
/// Shows the host counts, the findings per severity and the detected
/// technologies. Nothing is drawn inside the border until the scan finishes.
///
/// # Arguments
/// * `frame` - The `Frame` used for rendering the UI.
/// * `app` - A reference to the application's state, containing all scan data.
/// * `area` - The `Rect` defining the drawable area for this widget.
pub fn render_summary(frame: &mut Frame, app: &App, area: Rect) {
    let summary_container = Block::default().borders(Borders::ALL).title("Summary");
    frame.render_widget(summary_container, area);

    let summary_chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(5), // Hosts
            Constraint::Length(1), // Spacer
            Constraint::Length(6), // Findings by severity
            Constraint::Length(1), // Spacer
            Constraint::Min(0),    // Technologies
        ])
        .split(area);

    if !matches!(app.state, AppState::Finished) {
        return;
    }
    let summary = &app.summary;

    let hosts = Text::from(vec![
        Line::from("HOSTS".bold()),
        Line::from(format!("Subdomains: {}", summary.subdomains)),
        Line::from(vec![
            Span::raw("Live: "),
            Span::styled(summary.live_hosts.to_string(), Style::default().fg(Color::Green)),
        ]),
        Line::from(format!("Open directories: {}", summary.open_directories)),
    ]);
    frame.render_widget(Paragraph::new(hosts), summary_chunks[0]);

    let severity_line = |label: &'static str, count: usize, color: Color| {
        Line::from(vec![Span::raw(label), Span::styled(count.to_string(), Style::default().fg(color))])
    };
    let findings = Text::from(vec![
        Line::from(format!("FINDINGS ({})", summary.total_findings()).bold()),
        severity_line("Critical: ", summary.critical, Color::Red),
        severity_line("High:     ", summary.high, Color::LightRed),
        severity_line("Medium:   ", summary.medium, Color::Yellow),
        severity_line("Low:      ", summary.low, Color::Cyan),
        severity_line("Info:     ", summary.info, Color::Gray),
    ]);
    frame.render_widget(Paragraph::new(findings), summary_chunks[2]);

    let tech_block = Block::default().title(format!("TECHNOLOGIES ({})", summary.technologies).bold());
    let mut tech_lines = Vec::new();
    match app.scan_report.as_ref().and_then(|r| r.technologies.as_ref()) {
        Some(techs) if techs.is_empty() => tech_lines.push(Line::from("Not identified.")),
        Some(techs) => {
            for tech in techs {
                let version = tech.version.as_deref().map(|v| format!(" {v}")).unwrap_or_default();
                tech_lines.push(Line::from(vec![
                    Span::raw("- "),
                    Span::styled(format!("{}{version}", tech.name), Style::default().fg(Color::Cyan)),
                    Span::styled(format!(" ({}%)", tech.confidence), Style::default().fg(Color::DarkGray)),
                ]));
            }
        }
        None => tech_lines.push(Line::from(Span::styled("Homepage unavailable.", Style::default().fg(Color::Red)))),
    }
    frame.render_widget(Paragraph::new(tech_lines).block(tech_block), summary_chunks[4]);
}
