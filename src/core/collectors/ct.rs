// src/core/collectors/ct.rs

use crate::core::collectors::http::HttpClient;
use crate::core::error::CollectorError;
use serde::Deserialize;
use tracing::info;

/// One certificate row of the CT search API. Only the names are used.
#[derive(Debug, Deserialize)]
pub struct CertificateEntry {
    pub name_value: String,
}

/// Asks the certificate-transparency search endpoint for every certificate
/// issued under `%.<domain>`.
///
/// # Returns
/// The raw `name_value` fields. Each one may hold several newline-separated
/// names, some of them wildcards.
pub async fn search_certificates(
    http: &HttpClient,
    endpoint: &str,
    domain: &str,
) -> Result<Vec<String>, CollectorError> {
    let pattern = format!("%.{domain}");
    let entries: Vec<CertificateEntry> = http
        .get_json(endpoint, &[("q", pattern.as_str()), ("output", "json")])
        .await?;
    info!(domain, certificates = entries.len(), "Certificate transparency search finished.");
    Ok(entries.into_iter().map(|e| e.name_value).collect())
}
