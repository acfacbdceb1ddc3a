// src/core/scanner/progress.rs

use crate::core::models::ScanReport;
use std::sync::atomic::{AtomicU8, Ordering};
use strum::{Display, EnumIter};
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

/// The scan's phases, in the only order they ever run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Display, EnumIter)]
pub enum Phase {
    #[strum(to_string = "Validate")]
    Validate,
    #[strum(to_string = "WHOIS")]
    Whois,
    #[strum(to_string = "DNS Records")]
    DnsRecords,
    #[strum(to_string = "Email Security")]
    EmailSecurity,
    #[strum(to_string = "Subdomain Discovery")]
    SubdomainDiscovery,
    #[strum(to_string = "Status Check")]
    StatusCheck,
    #[strum(to_string = "IP Resolution")]
    IpResolution,
    #[strum(to_string = "Page Fetch")]
    PageFetch,
    #[strum(to_string = "Tech Detection")]
    TechDetection,
    #[strum(to_string = "Robots/Sitemap")]
    RobotsSitemap,
    #[strum(to_string = "Wayback")]
    Wayback,
    #[strum(to_string = "Open-Directory Probe")]
    OpenDirectoryProbe,
    #[strum(to_string = "Vulnerability Scan")]
    VulnerabilityScan,
    #[strum(to_string = "Graph Build")]
    GraphBuild,
    #[strum(to_string = "Complete")]
    Complete,
}

impl Phase {
    /// Progress percentage reported when the phase starts.
    pub fn start_percent(self) -> u8 {
        match self {
            Phase::Validate => 0,
            Phase::Whois => 3,
            Phase::DnsRecords => 8,
            Phase::EmailSecurity => 12,
            Phase::SubdomainDiscovery => 16,
            Phase::StatusCheck => 42,
            Phase::IpResolution => 54,
            Phase::PageFetch => 64,
            Phase::TechDetection => 68,
            Phase::RobotsSitemap => 72,
            Phase::Wayback => 76,
            Phase::OpenDirectoryProbe => 80,
            Phase::VulnerabilityScan => 84,
            Phase::GraphBuild => 97,
            Phase::Complete => 100,
        }
    }

    /// Exclusive upper bound for progress reported from inside the phase.
    pub fn end_percent(self) -> u8 {
        use strum::IntoEnumIterator;
        Phase::iter()
            .find(|p| *p > self)
            .map(Phase::start_percent)
            .unwrap_or(100)
    }
}

/// What the scan task tells its caller.
#[derive(Debug)]
pub enum ScanEvent {
    Progress { percent: u8, message: String },
    Finished(Box<ScanReport>),
    Failed(String),
}

/// Sends progress updates, never letting the percentage go backwards.
pub struct ProgressReporter {
    tx: Option<UnboundedSender<ScanEvent>>,
    last: AtomicU8,
}

impl ProgressReporter {
    pub fn new(tx: UnboundedSender<ScanEvent>) -> Self {
        Self { tx: Some(tx), last: AtomicU8::new(0) }
    }

    /// A reporter that only logs.
    pub fn silent() -> Self {
        Self { tx: None, last: AtomicU8::new(0) }
    }

    pub fn percent(&self) -> u8 {
        self.last.load(Ordering::SeqCst)
    }

    pub fn report(&self, percent: u8, message: impl Into<String>) {
        let percent = self.last.fetch_max(percent.min(100), Ordering::SeqCst).max(percent.min(100));
        let message = message.into();
        debug!(percent, message = %message, "Progress.");
        if let Some(tx) = &self.tx {
            // The receiver going away is how the UI drops interest in a scan.
            let _ = tx.send(ScanEvent::Progress { percent, message });
        }
    }

    /// Reports the start of `phase`.
    pub fn enter(&self, phase: Phase, message: impl Into<String>) {
        self.report(phase.start_percent(), format!("[{phase}] {}", message.into()));
    }

    /// Reports `done` out of `total` units of work inside `phase`, scaled
    /// into the phase's share of the bar.
    pub fn within(&self, phase: Phase, done: usize, total: usize, message: impl Into<String>) {
        let start = phase.start_percent() as usize;
        let span = (phase.end_percent() as usize).saturating_sub(start + 1);
        let offset = if total == 0 { 0 } else { span * done.min(total) / total };
        self.report((start + offset) as u8, format!("[{phase}] {}", message.into()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;
    use tokio::sync::mpsc;

    #[test]
    fn phase_percentages_increase() {
        let percents: Vec<u8> = Phase::iter().map(Phase::start_percent).collect();
        assert!(percents.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(Phase::Complete.start_percent(), 100);
    }

    #[test]
    fn progress_never_goes_backwards() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let reporter = ProgressReporter::new(tx);
        reporter.report(40, "forty");
        reporter.report(10, "ten");
        reporter.within(Phase::SubdomainDiscovery, 7, 7, "done");

        let mut seen = Vec::new();
        while let Ok(ScanEvent::Progress { percent, .. }) = rx.try_recv() {
            seen.push(percent);
        }
        assert_eq!(seen, vec![40, 40, 41]);
    }
}
