// src/core/collectors/archive.rs

use crate::core::collectors::http::HttpClient;
use crate::core::error::CollectorError;
use crate::core::models::ArchiveSnapshot;
use tracing::info;

const FIELDS: &str = "timestamp,original,statuscode,mimetype";

/// Queries the web-archive CDX index.
///
/// # Arguments
/// * `url_pattern` - CDX `url` parameter, e.g. `*.example.com/*` or `example.com`.
/// * `limit` - Maximum number of rows requested.
/// * `collapse_urlkey` - Collapse repeated captures of the same URL.
///
/// # Returns
/// The rows without the header row, in index order (oldest first).
pub async fn query_index(
    http: &HttpClient,
    endpoint: &str,
    url_pattern: &str,
    limit: usize,
    collapse_urlkey: bool,
) -> Result<Vec<ArchiveSnapshot>, CollectorError> {
    let limit = limit.to_string();
    let mut query = vec![
        ("url", url_pattern),
        ("output", "json"),
        ("fl", FIELDS),
        ("limit", limit.as_str()),
    ];
    if collapse_urlkey {
        query.push(("collapse", "urlkey"));
    }

    let rows: Vec<Vec<String>> = http.get_json(endpoint, &query).await?;
    let snapshots: Vec<ArchiveSnapshot> = rows
        .into_iter()
        .skip(1)
        .filter_map(|row| {
            let mut cols = row.into_iter();
            let timestamp = cols.next()?;
            let original_url = cols.next()?;
            Some(ArchiveSnapshot {
                timestamp,
                original_url,
                status_code: cols.next().and_then(|s| s.parse().ok()),
                mime_type: cols.next().filter(|m| !m.is_empty() && m != "-"),
            })
        })
        .collect();

    info!(url_pattern, rows = snapshots.len(), "Archive index query finished.");
    Ok(snapshots)
}
