// src/core/config.rs

use crate::logging::project_directory;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

const CONFIG_FILE: &str = "config.json";

/// Which DNS backend the scan resolves names with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResolverBackend {
    /// JSON DNS-over-HTTPS endpoint (`doh_url`).
    #[default]
    Doh,
    /// The operating system's resolver configuration, via hickory.
    System,
}

/// Tunables for a scan. Every field has a default, so a partial
/// `config.json` only overrides what it names.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub doh_url: String,
    pub ct_url: String,
    pub rdap_url: String,
    pub geo_url: String,
    pub archive_url: String,
    /// Tried in order, one at a time, when a direct page fetch fails.
    /// Each entry is a prefix the percent-encoded target URL is appended to.
    pub relays: Vec<String>,
    pub resolver: ResolverBackend,
    pub user_agent: String,
    pub request_timeout_secs: u64,
    pub check_timeout_secs: u64,
    pub probe_cap: usize,
    pub liveness_batch: usize,
    pub ip_batch: usize,
    pub bruteforce_batch: usize,
    pub check_batch: usize,
    pub archive_limit: usize,
    pub max_body_bytes: usize,
    /// Limit for collaborator JSON answers, which are parsed whole.
    pub max_json_bytes: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            doh_url: "https://dns.google/resolve".to_string(),
            ct_url: "https://crt.sh/".to_string(),
            rdap_url: "https://rdap.org".to_string(),
            geo_url: "https://ipapi.co".to_string(),
            archive_url: "https://web.archive.org/cdx/search/cdx".to_string(),
            relays: vec![
                "https://api.allorigins.win/raw?url=".to_string(),
                "https://corsproxy.io/?url=".to_string(),
            ],
            resolver: ResolverBackend::Doh,
            user_agent: concat!("VanguardRecon/", env!("CARGO_PKG_VERSION")).to_string(),
            request_timeout_secs: 10,
            check_timeout_secs: 8,
            probe_cap: 50,
            liveness_batch: 5,
            ip_batch: 10,
            bruteforce_batch: 10,
            check_batch: 5,
            archive_limit: 1000,
            max_body_bytes: 2 * 1024 * 1024,
            max_json_bytes: 64 * 1024 * 1024,
        }
    }
}

impl ScanConfig {
    /// Loads `config.json` from the platform config directory, falling back
    /// to defaults when the file is missing or unreadable.
    pub fn load() -> Self {
        let Some(path) = config_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match std::fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|raw| Self::from_json(&raw).map_err(|e| e.to_string()))
        {
            Ok(config) => {
                info!(path = %path.display(), "Loaded scan configuration.");
                config
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring unreadable configuration file.");
                Self::default()
            }
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn check_timeout(&self) -> Duration {
        Duration::from_secs(self.check_timeout_secs)
    }
}

fn config_path() -> Option<PathBuf> {
    project_directory().map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let config = ScanConfig::from_json(r#"{"probe_cap": 20, "resolver": "system"}"#).unwrap();
        assert_eq!(config.probe_cap, 20);
        assert_eq!(config.resolver, ResolverBackend::System);
        assert_eq!(config.liveness_batch, 5);
        assert_eq!(config.ip_batch, 10);
        assert_eq!(config.relays.len(), 2);
    }

    #[test]
    fn malformed_file_is_an_error() {
        assert!(ScanConfig::from_json("{ probe_cap: }").is_err());
    }
}
