// src/core/collectors/dns.rs

use crate::core::collectors::http::HttpClient;
use crate::core::error::CollectorError;
use crate::core::models::DnsRecord;
use async_trait::async_trait;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::error::ResolveErrorKind;
use hickory_resolver::proto::rr::RecordType;
use hickory_resolver::system_conf::read_system_conf;
use hickory_resolver::TokioAsyncResolver;
use serde::Deserialize;
use std::time::Duration;
use strum::{Display, EnumIter};
use tracing::{debug, warn};

/// The record types the scanner asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "UPPERCASE")]
pub enum RecordKind {
    A,
    Aaaa,
    Cname,
    Mx,
    Ns,
    Txt,
    Soa,
    Caa,
}

impl RecordKind {
    /// IANA type number, as used by the JSON DoH API.
    pub fn code(self) -> u16 {
        match self {
            RecordKind::A => 1,
            RecordKind::Ns => 2,
            RecordKind::Cname => 5,
            RecordKind::Soa => 6,
            RecordKind::Mx => 15,
            RecordKind::Txt => 16,
            RecordKind::Aaaa => 28,
            RecordKind::Caa => 257,
        }
    }

    fn to_hickory(self) -> RecordType {
        match self {
            RecordKind::A => RecordType::A,
            RecordKind::Aaaa => RecordType::AAAA,
            RecordKind::Cname => RecordType::CNAME,
            RecordKind::Mx => RecordType::MX,
            RecordKind::Ns => RecordType::NS,
            RecordKind::Txt => RecordType::TXT,
            RecordKind::Soa => RecordType::SOA,
            RecordKind::Caa => RecordType::CAA,
        }
    }
}

/// Name resolution capability shared by every phase that touches DNS.
///
/// An empty vector means the name has no records of that type; `Err` means
/// the lookup itself failed. Callers treat both as "nothing found".
#[async_trait]
pub trait Resolve: Send + Sync {
    async fn lookup(&self, name: &str, kind: RecordKind) -> Result<Vec<DnsRecord>, CollectorError>;

    /// First IPv4 address of `name`, if any.
    async fn resolve_ipv4(&self, name: &str) -> Option<String> {
        self.lookup(name, RecordKind::A)
            .await
            .ok()
            .and_then(|records| records.into_iter().next())
            .map(|record| record.value)
    }
}

// --- DNS-over-HTTPS ---

#[derive(Debug, Deserialize)]
struct DohResponse {
    #[serde(rename = "Status")]
    status: u32,
    #[serde(rename = "Answer", default)]
    answer: Vec<DohAnswer>,
}

#[derive(Debug, Deserialize)]
struct DohAnswer {
    #[serde(rename = "type")]
    record_type: u16,
    #[serde(rename = "TTL", default)]
    ttl: u32,
    data: String,
}

/// Resolver backed by a JSON DNS-over-HTTPS endpoint (`?name=..&type=..`).
pub struct DohResolver {
    http: HttpClient,
    endpoint: String,
}

impl DohResolver {
    pub fn new(http: HttpClient, endpoint: &str) -> Self {
        Self { http, endpoint: endpoint.to_string() }
    }
}

#[async_trait]
impl Resolve for DohResolver {
    async fn lookup(&self, name: &str, kind: RecordKind) -> Result<Vec<DnsRecord>, CollectorError> {
        let type_code = kind.code().to_string();
        let response: DohResponse = self
            .http
            .get_json(&self.endpoint, &[("name", name), ("type", type_code.as_str())])
            .await?;

        // Status 3 is NXDOMAIN, anything non-zero is an empty answer for us.
        if response.status != 0 {
            debug!(name, status = response.status, "DoH query returned no data.");
            return Ok(Vec::new());
        }

        Ok(response
            .answer
            .into_iter()
            // A queries also return the CNAME chain that led to the address.
            .filter(|a| a.record_type == kind.code())
            .map(|a| DnsRecord {
                record_type: kind.to_string(),
                value: normalize_data(kind, &a.data),
                ttl: a.ttl,
            })
            .collect())
    }
}

/// TXT answers arrive quoted and possibly split into several strings.
fn normalize_data(kind: RecordKind, data: &str) -> String {
    match kind {
        RecordKind::Txt => data.trim().trim_matches('"').replace("\" \"", ""),
        _ => data.trim().trim_end_matches('.').to_string(),
    }
}

// --- System resolver ---

/// Resolver using the host's DNS configuration (`/etc/resolv.conf` or the
/// platform equivalent) through hickory.
pub struct SystemResolver {
    resolver: TokioAsyncResolver,
    timeout: Duration,
}

impl SystemResolver {
    pub fn new(timeout: Duration) -> Self {
        let (config, opts) = system_settings(timeout);
        Self {
            resolver: TokioAsyncResolver::tokio(config, opts),
            timeout,
        }
    }
}

/// Reads the host resolver configuration, falling back to hickory's default
/// upstreams when it cannot be read. Timeout and attempts are always ours.
fn system_settings(timeout: Duration) -> (ResolverConfig, ResolverOpts) {
    let (config, mut opts) = match read_system_conf() {
        Ok(settings) => settings,
        Err(e) => {
            warn!(error = %e, "Could not read the system resolver configuration, using defaults.");
            (ResolverConfig::default(), ResolverOpts::default())
        }
    };
    opts.timeout = timeout;
    opts.attempts = 1;
    (config, opts)
}

#[async_trait]
impl Resolve for SystemResolver {
    async fn lookup(&self, name: &str, kind: RecordKind) -> Result<Vec<DnsRecord>, CollectorError> {
        let wanted = kind.to_hickory();
        let lookup = match tokio::time::timeout(self.timeout, self.resolver.lookup(name, wanted)).await? {
            Ok(lookup) => lookup,
            Err(e) if matches!(e.kind(), ResolveErrorKind::NoRecordsFound { .. }) => return Ok(Vec::new()),
            Err(e) => return Err(CollectorError::Dns(e.to_string())),
        };

        Ok(lookup
            .record_iter()
            .filter(|record| record.record_type() == wanted)
            .filter_map(|record| {
                record.data().map(|data| DnsRecord {
                    record_type: kind.to_string(),
                    value: normalize_data(kind, &data.to_string()),
                    ttl: record.ttl(),
                })
            })
            .collect())
    }
}

#[cfg(test)]
pub mod testing {
    //! In-memory resolver for phase tests.

    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Answers from a fixed table and records how many lookups were in
    /// flight at once.
    #[derive(Default)]
    pub struct StaticResolver {
        records: HashMap<(String, RecordKind), Vec<String>>,
        failing: Vec<String>,
        in_flight: AtomicUsize,
        pub max_in_flight: AtomicUsize,
        pub queried: Mutex<Vec<String>>,
    }

    impl StaticResolver {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with(mut self, name: &str, kind: RecordKind, values: &[&str]) -> Self {
            self.records.insert(
                (name.to_string(), kind),
                values.iter().map(|v| v.to_string()).collect(),
            );
            self
        }

        pub fn failing(mut self, name: &str) -> Self {
            self.failing.push(name.to_string());
            self
        }

        pub fn max_concurrency(&self) -> usize {
            self.max_in_flight.load(Ordering::SeqCst)
        }

        pub fn query_count(&self) -> usize {
            self.queried.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Resolve for StaticResolver {
        async fn lookup(&self, name: &str, kind: RecordKind) -> Result<Vec<DnsRecord>, CollectorError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            self.queried.lock().unwrap().push(name.to_string());
            tokio::time::sleep(Duration::from_millis(2)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if self.failing.iter().any(|f| f == name) {
                return Err(CollectorError::Timeout);
            }
            Ok(self
                .records
                .get(&(name.to_string(), kind))
                .map(|values| {
                    values
                        .iter()
                        .map(|v| DnsRecord { record_type: kind.to_string(), value: v.clone(), ttl: 300 })
                        .collect()
                })
                .unwrap_or_default())
        }
    }
}
