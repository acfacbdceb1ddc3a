// src/core/export.rs

use crate::core::models::ScanReport;
use crate::logging::get_data_dir;
use chrono::{DateTime, Utc};
use color_eyre::eyre::Result;
use csv::WriterBuilder;
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

const TOOL_NAME: &str = "Vanguard Recon";

#[derive(Serialize)]
struct ExportMetadata {
    exported_at: DateTime<Utc>,
    tool: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
struct JsonExport<'a> {
    #[serde(flatten)]
    report: &'a ScanReport,
    metadata: ExportMetadata,
}

/// Serializes the whole report plus an export metadata block.
pub fn to_json(report: &ScanReport, exported_at: DateTime<Utc>) -> Result<String> {
    let export = JsonExport {
        report,
        metadata: ExportMetadata { exported_at, tool: TOOL_NAME, version: env!("CARGO_PKG_VERSION") },
    };
    Ok(serde_json::to_string_pretty(&export)?)
}

/// Renders the subdomain table, preceded by `#` comment lines naming the
/// domain and the generation time.
pub fn to_csv(report: &ScanReport, generated_at: DateTime<Utc>) -> Result<String> {
    let header = format!(
        "# {TOOL_NAME} subdomain export\n# Domain: {}\n# Generated: {}\n",
        report.domain,
        generated_at.to_rfc3339()
    );
    let mut wtr = WriterBuilder::new().from_writer(header.into_bytes());
    wtr.write_record(["hostname", "ip", "status", "source"])?;
    for subdomain in report.subdomains.iter().flatten() {
        let status = subdomain.status.to_string();
        let source = subdomain.source.to_string();
        wtr.write_record([
            subdomain.hostname.as_str(),
            subdomain.ip.as_deref().unwrap_or_default(),
            status.as_str(),
            source.as_str(),
        ])?;
    }
    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8(bytes)?)
}

/// Writes both exports into the data directory.
///
/// # Returns
/// The paths of the JSON and CSV files, in that order.
pub fn write_exports(report: &ScanReport) -> Result<(PathBuf, PathBuf)> {
    let now = Utc::now();
    let directory = get_data_dir().join("exports");
    std::fs::create_dir_all(&directory)?;

    let stem = format!("{}_{}", report.domain, now.format("%Y%m%d-%H%M%S"));
    let json_path = directory.join(format!("{stem}.json"));
    let csv_path = directory.join(format!("{stem}.csv"));
    std::fs::write(&json_path, to_json(report, now)?)?;
    std::fs::write(&csv_path, to_csv(report, now)?)?;

    info!(json = %json_path.display(), csv = %csv_path.display(), "Report exported.");
    Ok((json_path, csv_path))
}
