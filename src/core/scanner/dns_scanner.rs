// src/core/scanner/dns_scanner.rs

use tracing::{debug, info, warn};

use crate::core::collectors::dns::{RecordKind, Resolve};
use crate::core::error::CollectorError;
use crate::core::models::{AnalysisFinding, DkimRecord, DmarcData, DnsRecord, EmailSecurity, Severity, SpfData};
use futures::future::join_all;
use strum::IntoEnumIterator;

/// A list of common DKIM selectors to check for when a specific one is not known.
const COMMON_DKIM_SELECTORS: &[&str] = &["google", "selector1", "selector2", "default", "dkim"];

/// Collects every record type the scanner knows about for `target`.
///
/// All lookups go out as one batch. Types that fail to resolve are skipped;
/// the result is `None` only when every single lookup failed.
///
/// # Arguments
/// * `resolver` - The resolver backend for this scan.
/// * `target` - The root domain.
pub async fn run_dns_records(resolver: &dyn Resolve, target: &str) -> Option<Vec<DnsRecord>> {
    info!(target, "Starting DNS record collection.");

    let lookups = RecordKind::iter().map(|kind| async move { (kind, resolver.lookup(target, kind).await) });
    let results = join_all(lookups).await;

    let mut records = Vec::new();
    let mut failures = 0;
    for (kind, result) in results {
        match result {
            Ok(found) => records.extend(found),
            Err(e) => {
                failures += 1;
                warn!(target, record_type = %kind, error = %e, "DNS lookup failed.");
            }
        }
    }

    if failures == RecordKind::iter().count() {
        return None;
    }
    info!(count = records.len(), "DNS record collection finished.");
    Some(records)
}

/// Runs the SPF, DMARC and DKIM lookups and analyzes them.
///
/// Returns `None` when neither the SPF nor the DMARC lookup could be
/// completed, since an analysis built on nothing would report every record
/// as missing.
pub async fn run_email_security(resolver: &dyn Resolve, target: &str) -> Option<EmailSecurity> {
    // Strip "www." prefix to query the root domain, which is standard for these record types.
    let root_target = target.strip_prefix("www.").unwrap_or(target);
    info!(target = %root_target, "Starting email security scan.");

    let (spf_result, dmarc_result, dkim) = tokio::join!(
        lookup_spf(resolver, root_target),
        lookup_dmarc(resolver, root_target),
        lookup_dkim(resolver, root_target)
    );

    if spf_result.is_err() && dmarc_result.is_err() {
        warn!(target = %root_target, "SPF and DMARC lookups both failed, leaving email security empty.");
        return None;
    }

    let mut results = EmailSecurity {
        spf: spf_result.as_ref().ok().cloned().flatten(),
        dmarc: dmarc_result.as_ref().ok().cloned().flatten(),
        dkim,
        analysis: Vec::new(),
    };
    results.analysis = analyze_email_security(&results, spf_result.is_ok(), dmarc_result.is_ok());
    info!(findings = %results.analysis.len(), "Email security scan finished.");
    Some(results)
}

/// Generates advisories from the collected records. A lookup that failed is
/// not reported as a missing record.
fn analyze_email_security(results: &EmailSecurity, spf_known: bool, dmarc_known: bool) -> Vec<AnalysisFinding> {
    let mut analyses = Vec::new();

    if dmarc_known {
        match &results.dmarc {
            Some(dmarc) => {
                if dmarc.policy.as_deref() == Some("none") {
                    debug!("DMARC analysis: Found policy 'none'.");
                    analyses.push(AnalysisFinding::new(Severity::Medium, "DNS_DMARC_POLICY_NONE"));
                }
            }
            None => {
                debug!("DMARC analysis: No record found.");
                analyses.push(AnalysisFinding::new(Severity::High, "DNS_DMARC_MISSING"));
            }
        }
    }

    if spf_known {
        match &results.spf {
            // Softfail (~all) and Neutral (?all) policies are less strict than Hardfail (-all).
            Some(spf) if spf.record.ends_with("~all") => {
                analyses.push(AnalysisFinding::new(Severity::Low, "DNS_SPF_POLICY_SOFTFAIL"));
            }
            Some(spf) if spf.record.ends_with("?all") => {
                analyses.push(AnalysisFinding::new(Severity::Low, "DNS_SPF_POLICY_NEUTRAL"));
            }
            Some(_) => {}
            None => {
                debug!("SPF analysis: No record found.");
                analyses.push(AnalysisFinding::new(Severity::Medium, "DNS_SPF_MISSING"));
            }
        }
    }

    if results.dkim.is_empty() {
        analyses.push(AnalysisFinding::new(Severity::Info, "DNS_DKIM_MISSING"));
    }

    analyses
}

/// Looks up the SPF (Sender Policy Framework) record for a domain.
/// SPF records are stored in TXT records and start with "v=spf1".
async fn lookup_spf(resolver: &dyn Resolve, target: &str) -> Result<Option<SpfData>, CollectorError> {
    debug!(target, "Looking up SPF record.");
    let records = resolver.lookup(target, RecordKind::Txt).await.inspect_err(|e| {
        warn!(target, error = %e, "SPF lookup failed.");
    })?;
    Ok(records
        .into_iter()
        .find(|r| r.value.starts_with("v=spf1"))
        .map(|r| SpfData { record: r.value }))
}

/// Looks up the DMARC record for a domain.
/// DMARC records are stored in a TXT record at the `_dmarc` subdomain.
async fn lookup_dmarc(resolver: &dyn Resolve, target: &str) -> Result<Option<DmarcData>, CollectorError> {
    let dmarc_target = format!("_dmarc.{}", target);
    debug!(target = %dmarc_target, "Looking up DMARC record.");
    let records = resolver.lookup(&dmarc_target, RecordKind::Txt).await.inspect_err(|e| {
        warn!(target = %dmarc_target, error = %e, "DMARC lookup failed.");
    })?;

    Ok(records
        .into_iter()
        .find(|r| r.value.starts_with("v=DMARC1"))
        .map(|r| {
            let policy = parse_dmarc_policy(&r.value);
            DmarcData { record: r.value, policy }
        }))
}

/// Extracts the `p=` tag from a DMARC record.
fn parse_dmarc_policy(record: &str) -> Option<String> {
    record
        .split(';')
        .map(str::trim)
        .find_map(|tag| tag.strip_prefix("p="))
        .map(|p| p.trim().to_lowercase())
}

/// Looks up DKIM records for a domain using a list of common selectors.
/// DKIM records are stored in TXT records at `selector._domainkey.domain`.
async fn lookup_dkim(resolver: &dyn Resolve, target: &str) -> Vec<DkimRecord> {
    let lookups = COMMON_DKIM_SELECTORS.iter().map(|selector| async move {
        let dkim_target = format!("{selector}._domainkey.{target}");
        match resolver.lookup(&dkim_target, RecordKind::Txt).await {
            Ok(records) => records
                .into_iter()
                .filter(|r| r.value.starts_with("v=DKIM1"))
                .map(|r| DkimRecord { selector: selector.to_string(), record: r.value })
                .collect(),
            Err(e) => {
                // It's common for some selectors not to exist.
                debug!(selector, error = %e, "DKIM lookup for this selector failed.");
                Vec::new()
            }
        }
    });

    let found: Vec<DkimRecord> = join_all(lookups).await.into_iter().flatten().collect();
    if !found.is_empty() {
        info!(count = %found.len(), "Found DKIM records.");
    }
    found
}
