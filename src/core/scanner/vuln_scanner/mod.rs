// src/core/scanner/vuln_scanner/mod.rs

//! The vulnerability check registry and its runner.
//!
//! Every check is a small object implementing [`Check`]. Its static metadata
//! (name, severity, category, remediation) lives in the knowledge base under
//! the check's id, so a finding's severity depends on nothing but which check
//! raised it.

pub mod exposure;
pub mod headers;
pub mod tls;

use crate::core::collectors::http::{HttpClient, HttpResponse};
use crate::core::error::CollectorError;
use crate::core::knowledge_base::{get_finding_detail, FindingDetail};
use crate::core::models::VulnerabilityFinding;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::time::Duration;
use tracing::{debug, info, warn};

/// What a single check concluded about the target.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Outcome {
    pub vulnerable: bool,
    pub evidence: Option<String>,
}

impl Outcome {
    pub fn clean() -> Self {
        Self::default()
    }

    pub fn found(evidence: impl Into<String>) -> Self {
        Self { vulnerable: true, evidence: Some(evidence.into()) }
    }
}

/// Everything a check may look at.
pub struct Target<'a> {
    pub domain: &'a str,
    /// Scheme and host the probes are sent to, without a trailing slash.
    pub base_url: &'a str,
    /// The homepage fetched earlier in the scan, if that worked.
    pub homepage: Option<&'a HttpResponse>,
    pub http: &'a HttpClient,
}

impl Target<'_> {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    /// The homepage, but only if it came back directly with its headers.
    pub fn direct_homepage(&self) -> Result<&HttpResponse, CollectorError> {
        self.homepage
            .filter(|page| !page.via_relay)
            .ok_or_else(|| CollectorError::Parse("homepage headers unavailable".to_string()))
    }
}

/// A single-responsibility probe. `Err` means the probe could not reach a
/// verdict, which the runner records as not vulnerable.
#[async_trait]
pub trait Check: Send + Sync {
    /// Knowledge-base code this check reports under.
    fn id(&self) -> &'static str;

    async fn execute(&self, target: &Target<'_>) -> Result<Outcome, CollectorError>;
}

/// All checks, in the fixed order they run and report in.
pub fn registry() -> Vec<Box<dyn Check>> {
    let mut checks = exposure::path_checks();
    checks.extend(exposure::probe_checks());
    checks.extend(headers::header_checks());
    checks.push(Box::new(tls::CertificateValidity));
    checks
}

/// Builds a finding from the knowledge-base entry for a check.
pub fn finding_from_detail(
    detail: &FindingDetail,
    target: &str,
    evidence: Option<String>,
    timestamp: DateTime<Utc>,
) -> VulnerabilityFinding {
    VulnerabilityFinding {
        id: detail.code.to_string(),
        name: detail.title.to_string(),
        severity: detail.severity,
        category: detail.category.to_string(),
        target: target.to_string(),
        description: detail.description.to_string(),
        remediation: detail.remediation.to_string(),
        evidence,
        timestamp,
    }
}

/// Runs every check against `target`, `batch_size` at a time, each bounded
/// by `timeout`.
///
/// A check that errors or times out counts as not vulnerable. Every finding
/// carries `timestamp`, and findings come back in registry order.
///
/// # Arguments
/// * `on_batch` - Called after each batch with the checks completed so far
///   and the total.
pub async fn run_checks(
    target: &Target<'_>,
    checks: &[Box<dyn Check>],
    batch_size: usize,
    timeout: Duration,
    timestamp: DateTime<Utc>,
    mut on_batch: impl FnMut(usize, usize),
) -> Vec<VulnerabilityFinding> {
    info!(target = target.domain, checks = checks.len(), "Starting vulnerability scan.");
    let mut findings = Vec::new();
    let mut completed = 0;

    for batch in checks.chunks(batch_size.max(1)) {
        let runs = batch.iter().map(|check| async move {
            let verdict = match tokio::time::timeout(timeout, check.execute(target)).await {
                Ok(Ok(outcome)) => outcome,
                Ok(Err(e)) => {
                    debug!(check = check.id(), error = %e, "Check could not complete.");
                    Outcome::clean()
                }
                Err(_) => {
                    warn!(check = check.id(), "Check timed out.");
                    Outcome::clean()
                }
            };
            (check.id(), verdict)
        });

        for (id, outcome) in join_all(runs).await {
            if !outcome.vulnerable {
                continue;
            }
            match get_finding_detail(id) {
                Some(detail) => {
                    info!(check = id, severity = %detail.severity, "Vulnerability found.");
                    findings.push(finding_from_detail(detail, target.domain, outcome.evidence, timestamp));
                }
                None => warn!(check = id, "Check has no knowledge-base entry, dropping result."),
            }
        }
        completed += batch.len();
        on_batch(completed, checks.len());
    }

    info!(findings = findings.len(), "Vulnerability scan finished.");
    findings
}
