// src/app.rs

use crate::core::config::ScanConfig;
use crate::core::export;
use crate::core::models::{HostStatus, ScanReport, Severity, VulnerabilityFinding};
use crate::core::scanner::{self, progress::ScanEvent};
use ratatui::widgets::ListState;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::task::JoinHandle;
use tracing::{error, info};

pub enum ExportStatus {
    Idle,
    Success(String),
    Error(String),
}

pub enum AppState {
    Idle,
    Scanning,
    Finished,
    Failed(String),
}

/// Counts shown in the summary panel once a scan has finished.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub subdomains: usize,
    pub live_hosts: usize,
    pub technologies: usize,
    pub open_directories: usize,
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub info: usize,
}

impl ScanSummary {
    pub fn from_report(report: &ScanReport) -> Self {
        let subdomains = report.subdomains.as_deref().unwrap_or_default();
        Self {
            subdomains: subdomains.len(),
            live_hosts: subdomains.iter().filter(|s| s.status == HostStatus::Live).count(),
            technologies: report.technologies.as_ref().map_or(0, Vec::len),
            open_directories: report.open_directories.as_ref().map_or(0, Vec::len),
            critical: report.count_severity(Severity::Critical),
            high: report.count_severity(Severity::High),
            medium: report.count_severity(Severity::Medium),
            low: report.count_severity(Severity::Low),
            info: report.count_severity(Severity::Info),
        }
    }

    pub fn total_findings(&self) -> usize {
        self.critical + self.high + self.medium + self.low + self.info
    }
}

pub struct App {
    pub should_quit: bool,
    pub state: AppState,
    pub input: String,
    pub config: ScanConfig,
    pub progress_percent: u8,
    pub progress_message: String,
    pub scan_report: Option<ScanReport>,
    pub summary: ScanSummary,
    pub findings_state: ListState,
    pub export_status: ExportStatus,
    events: Option<UnboundedReceiver<ScanEvent>>,
    scan_task: Option<JoinHandle<()>>,
}

impl App {
    pub fn new(config: ScanConfig) -> Self {
        Self {
            should_quit: false,
            state: AppState::Idle,
            input: String::new(),
            config,
            progress_percent: 0,
            progress_message: String::new(),
            scan_report: None,
            summary: ScanSummary::default(),
            findings_state: ListState::default(),
            export_status: ExportStatus::Idle,
            events: None,
            scan_task: None,
        }
    }

    /// Starts a scan of whatever is in the input box. Each scan gets its own
    /// channel, so events from an abandoned scan never reach the next one.
    pub fn start_scan(&mut self) {
        let input = self.input.trim().to_string();
        if input.is_empty() {
            return;
        }
        info!(input = %input, "Starting scan from the UI.");
        let (tx, rx) = mpsc::unbounded_channel();
        self.scan_task = Some(scanner::spawn_scan(input, self.config.clone(), tx));
        self.events = Some(rx);
        self.state = AppState::Scanning;
        self.progress_percent = 0;
        self.progress_message = "Starting...".to_string();
    }

    /// Drains every pending event from the running scan.
    pub fn poll_scan(&mut self) {
        let mut pending = Vec::new();
        if let Some(rx) = self.events.as_mut() {
            while let Ok(event) = rx.try_recv() {
                pending.push(event);
            }
        }
        for event in pending {
            self.on_scan_event(event);
        }
    }

    pub fn on_scan_event(&mut self, event: ScanEvent) {
        match event {
            ScanEvent::Progress { percent, message } => {
                self.progress_percent = percent;
                self.progress_message = message;
            }
            ScanEvent::Finished(report) => {
                self.summary = ScanSummary::from_report(&report);
                self.findings_state = ListState::default();
                if !report.findings().is_empty() {
                    self.findings_state.select(Some(0));
                }
                self.scan_report = Some(*report);
                self.state = AppState::Finished;
                self.finish_scan();
            }
            ScanEvent::Failed(message) => {
                self.state = AppState::Failed(message);
                self.finish_scan();
            }
        }
    }

    fn finish_scan(&mut self) {
        self.events = None;
        self.scan_task = None;
    }

    pub fn findings(&self) -> &[VulnerabilityFinding] {
        self.scan_report.as_ref().map(ScanReport::findings).unwrap_or_default()
    }

    pub fn selected_finding(&self) -> Option<&VulnerabilityFinding> {
        self.findings_state.selected().and_then(|i| self.findings().get(i))
    }

    pub fn select_next(&mut self) {
        let total = self.findings().len();
        if total == 0 {
            return;
        }
        let next = self.findings_state.selected().map_or(0, |i| (i + 1) % total);
        self.findings_state.select(Some(next));
    }

    pub fn select_previous(&mut self) {
        let total = self.findings().len();
        if total == 0 {
            return;
        }
        let previous = self.findings_state.selected().map_or(0, |i| (i + total - 1) % total);
        self.findings_state.select(Some(previous));
    }

    pub fn export(&mut self) {
        let Some(report) = &self.scan_report else { return };
        self.export_status = match export::write_exports(report) {
            Ok((json, csv)) => ExportStatus::Success(format!("Saved {} and {}", json.display(), csv.display())),
            Err(e) => {
                error!(error = %e, "Export failed.");
                ExportStatus::Error(e.to_string())
            }
        };
    }

    pub fn quit(&mut self) {
        self.abort_scan();
        self.should_quit = true;
    }

    fn abort_scan(&mut self) {
        if let Some(task) = self.scan_task.take() {
            task.abort();
        }
        self.events = None;
    }

    pub fn reset(&mut self) {
        self.abort_scan();
        self.state = AppState::Idle;
        self.input = String::new();
        self.progress_percent = 0;
        self.progress_message = String::new();
        self.scan_report = None;
        self.summary = ScanSummary::default();
        self.findings_state = ListState::default();
        self.export_status = ExportStatus::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{DiscoverySource, Subdomain};
    use chrono::Utc;

    fn finding(id: &str, severity: Severity) -> VulnerabilityFinding {
        VulnerabilityFinding {
            id: id.to_string(),
            name: id.to_string(),
            severity,
            category: "Test".to_string(),
            target: "example.com".to_string(),
            description: String::new(),
            remediation: String::new(),
            evidence: None,
            timestamp: Utc::now(),
        }
    }

    fn finished_report() -> ScanReport {
        let mut report = ScanReport::new("example.com");
        report.subdomains = Some(vec![
            Subdomain { hostname: "example.com".into(), ip: Some("1.2.3.4".into()), status: HostStatus::Live, source: DiscoverySource::Root },
            Subdomain { hostname: "dev.example.com".into(), ip: None, status: HostStatus::Dead, source: DiscoverySource::BruteForce },
        ]);
        report.vulnerabilities = Some(vec![
            finding("env-file-exposure", Severity::Critical),
            finding("missing-hsts", Severity::Medium),
            finding("security-txt-missing", Severity::Info),
        ]);
        report
    }

    #[test]
    fn finished_event_fills_summary_and_selects_first_finding() {
        let mut app = App::new(ScanConfig::default());
        app.state = AppState::Scanning;
        app.on_scan_event(ScanEvent::Progress { percent: 42, message: "[Status Check] ...".into() });
        assert_eq!(app.progress_percent, 42);

        app.on_scan_event(ScanEvent::Finished(Box::new(finished_report())));
        assert!(matches!(app.state, AppState::Finished));
        assert_eq!(app.summary.subdomains, 2);
        assert_eq!(app.summary.live_hosts, 1);
        assert_eq!(app.summary.critical, 1);
        assert_eq!(app.summary.total_findings(), 3);
        assert_eq!(app.selected_finding().map(|f| f.id.as_str()), Some("env-file-exposure"));
    }

    #[test]
    fn selection_wraps_around() {
        let mut app = App::new(ScanConfig::default());
        app.on_scan_event(ScanEvent::Finished(Box::new(finished_report())));

        app.select_previous();
        assert_eq!(app.findings_state.selected(), Some(2));
        app.select_next();
        assert_eq!(app.findings_state.selected(), Some(0));
    }

    #[test]
    fn failure_is_kept_until_reset() {
        let mut app = App::new(ScanConfig::default());
        app.input = "bad input".into();
        app.on_scan_event(ScanEvent::Failed("invalid domain".into()));
        assert!(matches!(&app.state, AppState::Failed(m) if m == "invalid domain"));

        app.reset();
        assert!(matches!(app.state, AppState::Idle));
        assert!(app.input.is_empty());
    }
}
