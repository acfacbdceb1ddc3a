// src/ui/widgets/analysis_view.rs

use crate::app::{App, AppState};
use crate::core::knowledge_base;
use crate::core::models::Severity;
use ratatui::{
    prelude::*,
    text::Line,
    widgets::{Block, Borders, Gauge, List, ListItem, Paragraph, Wrap},
};

fn severity_style(severity: Severity) -> Style {
    match severity {
        Severity::Critical => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        Severity::High => Style::default().fg(Color::LightRed),
        Severity::Medium => Style::default().fg(Color::Yellow),
        Severity::Low => Style::default().fg(Color::Cyan),
        Severity::Info => Style::default().fg(Color::Gray),
    }
}

pub fn render_analysis_view(frame: &mut Frame, app: &mut App, area: Rect) {
    let main_block = Block::default()
        .borders(Borders::ALL)
        .title("Findings (Navigate with ↑ ↓)");

    if matches!(app.state, AppState::Finished) {
        render_findings(frame, app, main_block, area);
        return;
    }

    match &app.state {
        AppState::Idle => {
            let content = Paragraph::new("Enter a domain and press Enter to start the scan.")
                .alignment(Alignment::Center)
                .block(main_block);
            frame.render_widget(content, area);
        }
        AppState::Scanning => render_progress(frame, app, main_block, area),
        AppState::Failed(message) => {
            let content = Paragraph::new(vec![
                Line::from("SCAN FAILED".bold().fg(Color::Red)),
                Line::from(""),
                Line::from(message.as_str()),
            ])
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(main_block);
            frame.render_widget(content, area);
        }
        AppState::Finished => {}
    }
}

fn render_progress(frame: &mut Frame, app: &App, block: Block, area: Rect) {
    let inner_area = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([Constraint::Length(1), Constraint::Length(1), Constraint::Length(1), Constraint::Min(0)])
        .split(inner_area);

    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(Color::Cyan))
        .percent(app.progress_percent.into())
        .label(format!("{}%", app.progress_percent));
    frame.render_widget(gauge, chunks[0]);
    frame.render_widget(
        Paragraph::new(app.progress_message.as_str()).style(Style::default().fg(Color::DarkGray)),
        chunks[2],
    );
}

fn render_findings(frame: &mut Frame, app: &mut App, block: Block, area: Rect) {
    let inner_area = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(45), Constraint::Min(0)])
        .split(inner_area);

    let items: Vec<ListItem> = app
        .findings()
        .iter()
        .map(|f| {
            ListItem::new(Line::from(vec![
                Span::styled(format!("{:<9}", f.severity.to_string()), severity_style(f.severity)),
                Span::styled(format!("[{}] ", f.category), Style::default().fg(Color::DarkGray)),
                Span::raw(f.name.clone()),
            ]))
        })
        .collect();

    let findings_list = List::new(items)
        .highlight_style(Style::new().bg(Color::DarkGray).add_modifier(Modifier::BOLD));
    frame.render_stateful_widget(findings_list, chunks[0], &mut app.findings_state);

    let detail_block = Block::default().borders(Borders::TOP).title("Details");
    let Some(finding) = app.selected_finding() else {
        let placeholder = Paragraph::new(vec![
            Line::from(""),
            Line::from("✓ NO FINDINGS".bold().fg(Color::Green)),
            Line::from(""),
            Line::from("None of the checks matched this target."),
        ])
        .alignment(Alignment::Center)
        .block(detail_block);
        frame.render_widget(placeholder, chunks[1]);
        return;
    };

    let mut text = vec![
        Line::from(vec![Span::raw("Target: "), Span::styled(finding.target.clone(), Style::default().fg(Color::Cyan))]),
        Line::from(""),
        Line::from("WHAT IT IS:".yellow().bold()),
        Line::from(finding.description.clone()),
        Line::from(""),
        Line::from("HOW TO FIX:".yellow().bold()),
        Line::from(finding.remediation.clone()),
    ];
    if let Some(evidence) = &finding.evidence {
        text.push(Line::from(""));
        text.push(Line::from("EVIDENCE:".yellow().bold()));
        text.push(Line::from(evidence.clone()));
    }
    if let Some(detail) = knowledge_base::get_finding_detail(&finding.id) {
        text.push(Line::from(""));
        text.push(Line::from(Span::styled(format!("Check: {} ({})", detail.code, detail.category), Style::default().fg(Color::DarkGray))));
    }

    let details = Paragraph::new(text).wrap(Wrap { trim: true }).block(detail_block);
    frame.render_widget(details, chunks[1]);
}
