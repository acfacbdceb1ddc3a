// src/core/models.rs

use crate::core::graph::NetworkGraph;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

// --- Severity ---

/// Severity of a finding. Variants are declared from least to most severe so
/// the derived `Ord` gives `Info < Low < Medium < High < Critical`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIter)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

/// A short analysis note attached to a collector result, keyed by a code
/// that the knowledge base can explain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnalysisFinding {
    pub severity: Severity,
    pub code: String,
}

impl AnalysisFinding {
    pub fn new(severity: Severity, code: &str) -> Self {
        Self { severity, code: code.to_string() }
    }
}

// --- Subdomains ---

/// Where a hostname was first attributed from. Declaration order is the
/// display precedence: a lower variant wins when several adapters report
/// the same hostname.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DiscoverySource {
    CertificateTransparency,
    BruteForce,
    Archive,
    Root,
}

impl DiscoverySource {
    /// Keeps whichever of `self` and `other` has the higher precedence.
    pub fn strongest(self, other: DiscoverySource) -> DiscoverySource {
        self.min(other)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Display, Default)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum HostStatus {
    Live,
    Dead,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Subdomain {
    pub hostname: String,
    pub ip: Option<String>,
    pub status: HostStatus,
    pub source: DiscoverySource,
}

// --- DNS ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DnsRecord {
    #[serde(rename = "type")]
    pub record_type: String,
    pub value: String,
    pub ttl: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SpfData {
    pub record: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DmarcData {
    pub record: String,
    pub policy: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DkimRecord {
    pub selector: String,
    pub record: String,
}

/// SPF, DMARC and DKIM posture of the root domain.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EmailSecurity {
    pub spf: Option<SpfData>,
    pub dmarc: Option<DmarcData>,
    pub dkim: Vec<DkimRecord>,
    pub analysis: Vec<AnalysisFinding>,
}

// --- Registration & network ---

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct WhoisInfo {
    pub registrar: Option<String>,
    pub created: Option<String>,
    pub expires: Option<String>,
    pub updated: Option<String>,
    pub nameservers: Vec<String>,
    pub status: Vec<String>,
    pub dnssec: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct IpInfo {
    pub ip: String,
    pub city: Option<String>,
    pub country: Option<String>,
    pub org: Option<String>,
    pub asn: Option<String>,
}

// --- Web ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TechnologySignal {
    pub name: String,
    pub category: String,
    /// Always within `0..=100`.
    pub confidence: u8,
    pub version: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageSummary {
    pub url: String,
    /// Absent when the page came through a relay.
    pub status: Option<u16>,
    pub title: Option<String>,
    pub server: Option<String>,
    pub via_relay: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct RobotsInfo {
    pub disallowed: Vec<String>,
    pub allowed: Vec<String>,
    pub sitemaps: Vec<String>,
    pub sitemap_url_count: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArchiveSnapshot {
    pub timestamp: String,
    pub original_url: String,
    pub status_code: Option<u16>,
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct WaybackSummary {
    pub total_snapshots: usize,
    pub first_capture: Option<String>,
    pub last_capture: Option<String>,
    pub recent: Vec<ArchiveSnapshot>,
}

// --- Vulnerabilities ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VulnerabilityFinding {
    pub id: String,
    pub name: String,
    pub severity: Severity,
    pub category: String,
    pub target: String,
    pub description: String,
    pub remediation: String,
    pub evidence: Option<String>,
    pub timestamp: DateTime<Utc>,
}

// --- Main Report ---

/// Everything a scan learned about one domain.
///
/// A field stays `None` until its phase has completed; a phase that could not
/// reach its collaborators leaves it `None` for good.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub domain: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub whois: Option<WhoisInfo>,
    pub dns_records: Option<Vec<DnsRecord>>,
    pub email_security: Option<EmailSecurity>,
    pub subdomains: Option<Vec<Subdomain>>,
    pub ip_info: Option<IpInfo>,
    pub page: Option<PageSummary>,
    pub technologies: Option<Vec<TechnologySignal>>,
    pub robots: Option<RobotsInfo>,
    pub wayback: Option<WaybackSummary>,
    pub open_directories: Option<Vec<String>>,
    pub vulnerabilities: Option<Vec<VulnerabilityFinding>>,
    pub graph: Option<NetworkGraph>,
}

impl ScanReport {
    pub fn new(domain: &str) -> Self {
        Self {
            domain: domain.to_string(),
            started_at: Utc::now(),
            completed_at: None,
            whois: None,
            dns_records: None,
            email_security: None,
            subdomains: None,
            ip_info: None,
            page: None,
            technologies: None,
            robots: None,
            wayback: None,
            open_directories: None,
            vulnerabilities: None,
            graph: None,
        }
    }

    pub fn findings(&self) -> &[VulnerabilityFinding] {
        self.vulnerabilities.as_deref().unwrap_or_default()
    }

    pub fn count_severity(&self, severity: Severity) -> usize {
        self.findings().iter().filter(|f| f.severity == severity).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_is_totally_ordered() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
        assert!(Severity::Low > Severity::Info);
        assert_eq!(serde_json::to_string(&Severity::High).unwrap(), "\"HIGH\"");
        assert_eq!(Severity::Critical.to_string(), "CRITICAL");
    }

    #[test]
    fn source_precedence_prefers_certificate_transparency() {
        use DiscoverySource::*;
        assert_eq!(Archive.strongest(CertificateTransparency), CertificateTransparency);
        assert_eq!(BruteForce.strongest(Archive), BruteForce);
        assert_eq!(Root.strongest(Archive), Archive);
        assert_eq!(BruteForce.to_string(), "brute_force");
    }
}
