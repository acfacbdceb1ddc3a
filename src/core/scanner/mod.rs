// src/core/scanner/mod.rs

// This file acts as the public interface for the `scanner` module.
// It declares the phase modules and owns the orchestration that runs them.
pub mod discovery;
pub mod dns_scanner;
pub mod fingerprint_scanner;
pub mod progress;
pub mod prober;
pub mod recon;
pub mod vuln_scanner;

use crate::core::collectors::dns::{DohResolver, Resolve, SystemResolver};
use crate::core::collectors::http::HttpClient;
use crate::core::collectors::{geo, rdap};
use crate::core::config::{ResolverBackend, ScanConfig};
use crate::core::domain::Domain;
use crate::core::error::{CollectorError, ScanError};
use crate::core::graph::build_graph;
use crate::core::models::{HostStatus, ScanReport};
use self::progress::{Phase, ProgressReporter, ScanEvent};
use self::vuln_scanner::Target;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Shared collaborators for one scan.
pub struct ScanContext {
    pub config: ScanConfig,
    pub http: HttpClient,
    pub resolver: Arc<dyn Resolve>,
    /// Where web probes are sent. `None` means `https://<domain>`.
    pub web_root: Option<String>,
}

impl ScanContext {
    /// Builds the HTTP client and the configured resolver backend.
    pub fn from_config(config: ScanConfig) -> Result<Self, ScanError> {
        let http = HttpClient::new(&config).map_err(|e| ScanError::Internal(format!("HTTP client: {e}")))?;
        let resolver: Arc<dyn Resolve> = match config.resolver {
            ResolverBackend::Doh => Arc::new(DohResolver::new(http.clone(), &config.doh_url)),
            ResolverBackend::System => Arc::new(SystemResolver::new(config.request_timeout())),
        };
        Ok(Self { config, http, resolver, web_root: None })
    }

    pub fn base_url(&self, domain: &Domain) -> String {
        match &self.web_root {
            Some(root) => root.trim_end_matches('/').to_string(),
            None => format!("https://{domain}"),
        }
    }
}

/// Logs a collaborator failure and turns it into an absent field.
fn absorb<T>(operation: &str, result: Result<T, CollectorError>) -> Option<T> {
    result
        .inspect_err(|e| warn!(operation, error = %e, "Collaborator failed, leaving the field empty."))
        .ok()
}

/// Validates `input` and runs every phase against it.
///
/// # Arguments
///
/// * `input` - The domain as typed by the user.
/// * `config` - Endpoints, timeouts and batch sizes.
/// * `progress` - Receives monotonic progress updates.
///
/// # Returns
///
/// The finished report. The only errors are a malformed domain, reported
/// before any phase runs, and a failure to build the HTTP client.
pub async fn run_full_scan(input: &str, config: ScanConfig, progress: &ProgressReporter) -> Result<ScanReport, ScanError> {
    progress.enter(Phase::Validate, format!("Validating '{}'...", input.trim()));
    let domain = Domain::parse(input)?;
    let ctx = ScanContext::from_config(config)?;
    Ok(run_with_context(&domain, &ctx, progress).await)
}

/// Runs the phases in order. Each phase settles completely before the next
/// starts, and its result lands in the report only once it has finished.
pub async fn run_with_context(domain: &Domain, ctx: &ScanContext, progress: &ProgressReporter) -> ScanReport {
    info!(domain = %domain, "Starting full scan.");
    let mut report = ScanReport::new(domain.as_str());
    let resolver = ctx.resolver.as_ref();
    let config = &ctx.config;

    progress.enter(Phase::Whois, "Looking up registration data...");
    report.whois = absorb("rdap", rdap::lookup_registration(&ctx.http, &config.rdap_url, domain.as_str()).await);

    progress.enter(Phase::DnsRecords, "Collecting DNS records...");
    report.dns_records = dns_scanner::run_dns_records(resolver, domain.as_str()).await;

    progress.enter(Phase::EmailSecurity, "Checking SPF, DMARC and DKIM...");
    report.email_security = dns_scanner::run_email_security(resolver, domain.as_str()).await;

    progress.enter(Phase::SubdomainDiscovery, "Discovering subdomains...");
    let discovered = discovery::run_discovery(ctx, domain, progress).await;

    let candidates = prober::select_candidates(domain, &discovered, config.probe_cap);
    progress.enter(
        Phase::StatusCheck,
        format!("Checking {} of {} discovered hosts...", candidates.len(), discovered.len()),
    );
    let mut hosts = prober::check_liveness(resolver, &candidates, config.liveness_batch, |done, total| {
        progress.within(Phase::StatusCheck, done, total, format!("{done}/{total} hosts checked"));
    })
    .await;
    report.subdomains = Some(hosts.values().cloned().collect());

    progress.enter(Phase::IpResolution, "Resolving addresses...");
    prober::resolve_addresses(resolver, &mut hosts, config.ip_batch).await;
    let root_ip = hosts.get(domain.as_str()).and_then(|h| h.ip.clone());
    report.subdomains = Some(hosts.into_values().collect());
    if let Some(ip) = root_ip {
        report.ip_info = absorb("geolocation", geo::locate_ip(&ctx.http, &config.geo_url, &ip).await);
    }

    let base_url = ctx.base_url(domain);
    progress.enter(Phase::PageFetch, format!("Fetching {base_url}/ ..."));
    let homepage = absorb("page fetch", ctx.http.fetch_page(&format!("{base_url}/")).await);
    report.page = homepage.as_ref().map(recon::summarize_page);

    progress.enter(Phase::TechDetection, "Fingerprinting technologies...");
    report.technologies = homepage.as_ref().map(fingerprint_scanner::detect_technologies);

    progress.enter(Phase::RobotsSitemap, "Reading robots.txt and sitemap...");
    report.robots = absorb("robots", recon::collect_robots(&ctx.http, &base_url).await);

    progress.enter(Phase::Wayback, "Querying archived captures...");
    report.wayback = absorb(
        "wayback",
        recon::collect_wayback(&ctx.http, &config.archive_url, domain.as_str(), config.archive_limit).await,
    );

    progress.enter(Phase::OpenDirectoryProbe, "Probing for open directories...");
    report.open_directories = Some(
        recon::probe_open_directories(&ctx.http, &base_url, recon::OPEN_DIRECTORY_PATHS, config.check_batch).await,
    );

    progress.enter(Phase::VulnerabilityScan, "Running vulnerability checks...");
    let timestamp = Utc::now();
    let target = Target { domain: domain.as_str(), base_url: &base_url, homepage: homepage.as_ref(), http: &ctx.http };
    let checks = vuln_scanner::registry();
    let mut findings = vuln_scanner::run_checks(
        &target,
        &checks,
        config.check_batch,
        config.check_timeout(),
        timestamp,
        |done, total| progress.within(Phase::VulnerabilityScan, done, total, format!("{done}/{total} checks run")),
    )
    .await;
    if let Some(technologies) = &report.technologies {
        findings.extend(fingerprint_scanner::known_cve_findings(technologies, domain.as_str(), timestamp));
    }
    findings.sort_by(|a, b| b.severity.cmp(&a.severity));
    report.vulnerabilities = Some(findings);

    progress.enter(Phase::GraphBuild, "Building the network graph...");
    let graph = build_graph(domain.as_str(), report.subdomains.as_deref().unwrap_or_default(), report.findings());
    if let Err(e) = graph.validate(domain.as_str()) {
        error!(error = %e, "Built graph is not a single-rooted tree.");
    }
    report.graph = Some(graph);

    report.completed_at = Some(Utc::now());
    let live = report
        .subdomains
        .iter()
        .flatten()
        .filter(|s| s.status == HostStatus::Live)
        .count();
    progress.enter(
        Phase::Complete,
        format!("Scan complete: {live} live hosts, {} findings.", report.findings().len()),
    );
    info!(domain = %domain, live, findings = report.findings().len(), "Full scan finished.");
    report
}

/// Runs a scan on its own task and reports through `tx`.
///
/// Progress events come first, then exactly one `Finished` or `Failed`. A
/// panic inside the scan is reported as `Failed`.
pub fn spawn_scan(input: String, config: ScanConfig, tx: UnboundedSender<ScanEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let progress = ProgressReporter::new(tx.clone());
        let scan = tokio::spawn(async move { run_full_scan(&input, config, &progress).await });

        let event = match scan.await {
            Ok(Ok(report)) => ScanEvent::Finished(Box::new(report)),
            Ok(Err(e)) => {
                warn!(error = %e, "Scan rejected.");
                ScanEvent::Failed(e.to_string())
            }
            Err(e) => {
                error!(error = %e, "Scan task failed.");
                ScanEvent::Failed(ScanError::Internal(e.to_string()).to_string())
            }
        };
        let _ = tx.send(event);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::collectors::dns::RecordKind;
    use crate::core::collectors::dns::testing::StaticResolver;
    use crate::core::models::{DiscoverySource, DnsRecord, Severity};
    use async_trait::async_trait;
    use tokio::sync::mpsc;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const HOMEPAGE: &str = r#"<!DOCTYPE html><html><head><title>Example Domain</title>
        <script src="https://code.jquery.com/jquery-3.4.1.min.js"></script></head>
        <body><h1>Example</h1></body></html>"#;

    fn config_for(server: &MockServer) -> ScanConfig {
        let uri = server.uri();
        ScanConfig {
            ct_url: format!("{uri}/ct"),
            rdap_url: format!("{uri}/rdap"),
            geo_url: format!("{uri}/geo"),
            archive_url: format!("{uri}/cdx"),
            relays: Vec::new(),
            request_timeout_secs: 2,
            check_timeout_secs: 2,
            ..ScanConfig::default()
        }
    }

    async fn mount_collaborators(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/ct"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"name_value": "www.example.com\n*.example.com"},
                {"name_value": "api.example.com"},
                {"name_value": "mail.example.com"}
            ])))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rdap/domain/example.com"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "events": [{"eventAction": "registration", "eventDate": "1995-08-14T04:00:00Z"}],
                "nameservers": [{"ldhName": "A.IANA-SERVERS.NET"}],
                "status": ["active"]
            })))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/geo/93.184.216.34/json/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "city": "Norwell", "country_name": "United States", "org": "EDGECAST", "asn": "AS15133"
            })))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/cdx"))
            .and(query_param("url", "*.example.com/*"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                ["timestamp", "original", "statuscode", "mimetype"],
                ["20120101000000", "http://old.example.com/index.html", "200", "text/html"],
                ["20130101000000", "http://www.example.com/", "200", "text/html"]
            ])))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/cdx"))
            .and(query_param("url", "example.com"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                ["timestamp", "original", "statuscode", "mimetype"],
                ["20020120142510", "http://example.com/", "200", "text/html"],
                ["20240301000000", "https://example.com/", "200", "text/html"]
            ])))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Server", "nginx/1.18.0")
                    .set_body_string(HOMEPAGE),
            )
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/.env"))
            .respond_with(ResponseTemplate::new(200).set_body_string("APP_KEY=base64:abc\nDB_PASSWORD=secret\n"))
            .mount(server)
            .await;
        Mock::given(method("GET")).respond_with(ResponseTemplate::new(404)).mount(server).await;
        Mock::given(method("POST")).respond_with(ResponseTemplate::new(404)).mount(server).await;
    }

    fn resolver() -> StaticResolver {
        StaticResolver::new()
            .with("example.com", RecordKind::A, &["93.184.216.34"])
            .with("example.com", RecordKind::Ns, &["a.iana-servers.net"])
            .with("example.com", RecordKind::Txt, &["v=spf1 -all"])
            .with("www.example.com", RecordKind::A, &["93.184.216.34"])
            .with("mail.example.com", RecordKind::A, &["10.0.0.5"])
            .failing("api.example.com")
    }

    #[tokio::test]
    async fn full_scan_against_mocked_collaborators() {
        let server = MockServer::start().await;
        mount_collaborators(&server).await;
        let config = config_for(&server);
        let ctx = ScanContext {
            http: HttpClient::new(&config).unwrap(),
            config,
            resolver: Arc::new(resolver()),
            web_root: Some(server.uri()),
        };
        let (tx, mut rx) = mpsc::unbounded_channel();
        let progress = ProgressReporter::new(tx);
        let domain = Domain::parse("Example.com").unwrap();

        let report = run_with_context(&domain, &ctx, &progress).await;

        // Progress is monotonic and ends at 100.
        let mut percents = Vec::new();
        while let Ok(ScanEvent::Progress { percent, .. }) = rx.try_recv() {
            percents.push(percent);
        }
        assert!(percents.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(percents.last(), Some(&100));
        assert!(report.completed_at.is_some());

        assert_eq!(report.whois.as_ref().unwrap().nameservers, vec!["a.iana-servers.net"]);
        let records = report.dns_records.as_ref().unwrap();
        assert!(records.contains(&DnsRecord { record_type: "NS".into(), value: "a.iana-servers.net".into(), ttl: 300 }));
        let email = report.email_security.as_ref().unwrap();
        assert!(email.analysis.iter().any(|a| a.code == "DNS_DMARC_MISSING"));

        let subdomains = report.subdomains.as_ref().unwrap();
        assert!(subdomains.iter().all(|s| s.hostname == "example.com" || s.hostname.ends_with(".example.com")));
        let find = |name: &str| subdomains.iter().find(|s| s.hostname == name).unwrap();
        // `*.example.com` in the certificate names the root itself, and
        // certificate transparency outranks the root attribution.
        assert_eq!(find("example.com").source, DiscoverySource::CertificateTransparency);
        assert_eq!(find("www.example.com").source, DiscoverySource::CertificateTransparency);
        assert_eq!(find("mail.example.com").source, DiscoverySource::CertificateTransparency);
        assert_eq!(find("old.example.com").source, DiscoverySource::Archive);
        assert_eq!(find("mail.example.com").ip.as_deref(), Some("10.0.0.5"));
        assert_eq!(find("api.example.com").status, HostStatus::Dead);
        assert_eq!(report.ip_info.as_ref().unwrap().city.as_deref(), Some("Norwell"));

        let page = report.page.as_ref().unwrap();
        assert_eq!(page.title.as_deref(), Some("Example Domain"));
        let techs = report.technologies.as_ref().unwrap();
        assert!(techs.iter().any(|t| t.name == "jQuery" && t.version.as_deref() == Some("3.4.1")));
        assert!(techs.iter().any(|t| t.name == "Nginx" && t.confidence == 40));
        assert!(report.robots.is_none());
        assert_eq!(report.wayback.as_ref().unwrap().total_snapshots, 2);
        assert_eq!(report.open_directories, Some(Vec::new()));

        let findings = report.findings();
        let ids: Vec<&str> = findings.iter().map(|f| f.id.as_str()).collect();
        assert!(ids.contains(&"env-file-exposure"));
        assert!(ids.contains(&"known-cve-jquery"));
        assert!(ids.contains(&"missing-hsts"));
        assert!(ids.contains(&"security-txt-missing"));
        assert!(!ids.contains(&"tls-certificate-invalid"));
        assert_eq!(findings[0].severity, Severity::Critical);
        assert!(findings.iter().all(|f| f.timestamp == findings[0].timestamp));

        let graph = report.graph.as_ref().unwrap();
        assert_eq!(graph.validate("example.com"), Ok(()));
        assert_eq!(graph.node("example.com").unwrap().risk, crate::core::graph::Risk::High);
    }

    struct Unreachable;

    #[async_trait]
    impl Resolve for Unreachable {
        async fn lookup(&self, _name: &str, _kind: RecordKind) -> Result<Vec<DnsRecord>, CollectorError> {
            Err(CollectorError::Timeout)
        }
    }

    #[tokio::test]
    async fn scan_completes_when_every_collaborator_is_down() {
        let dead = "http://127.0.0.1:9".to_string();
        let config = ScanConfig {
            ct_url: dead.clone(),
            rdap_url: dead.clone(),
            geo_url: dead.clone(),
            archive_url: dead.clone(),
            relays: vec![format!("{dead}/raw?url=")],
            request_timeout_secs: 1,
            check_timeout_secs: 1,
            ..ScanConfig::default()
        };
        let ctx = ScanContext {
            http: HttpClient::new(&config).unwrap(),
            config,
            resolver: Arc::new(Unreachable),
            web_root: Some(dead),
        };
        let domain = Domain::parse("example.com").unwrap();
        let progress = ProgressReporter::silent();

        let report = run_with_context(&domain, &ctx, &progress).await;

        assert_eq!(progress.percent(), 100);
        assert!(report.completed_at.is_some());
        assert!(report.whois.is_none());
        assert!(report.dns_records.is_none());
        assert!(report.email_security.is_none());
        assert!(report.ip_info.is_none());
        assert!(report.page.is_none());
        assert!(report.technologies.is_none());
        assert!(report.robots.is_none());
        assert!(report.wayback.is_none());
        assert!(report.findings().is_empty());

        let subdomains = report.subdomains.as_ref().unwrap();
        assert_eq!(subdomains.len(), 1);
        assert_eq!(subdomains[0].status, HostStatus::Dead);
        let graph = report.graph.as_ref().unwrap();
        assert_eq!(graph.nodes.len(), 1);
        assert_eq!(graph.validate("example.com"), Ok(()));
    }

    #[tokio::test]
    async fn invalid_domain_runs_no_phase() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let progress = ProgressReporter::new(tx);
        let result = run_full_scan("-bad-.example", ScanConfig::default(), &progress).await;

        assert!(matches!(result, Err(ScanError::InvalidDomain { .. })));
        let mut events = 0;
        while let Ok(event) = rx.try_recv() {
            assert!(matches!(event, ScanEvent::Progress { percent: 0, .. }));
            events += 1;
        }
        assert_eq!(events, 1);
    }

    #[tokio::test]
    async fn spawned_scan_reports_rejection() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        spawn_scan("not a domain".to_string(), ScanConfig::default(), tx).await.unwrap();

        let mut last = None;
        while let Ok(event) = rx.try_recv() {
            last = Some(event);
        }
        assert!(matches!(last, Some(ScanEvent::Failed(message)) if message.starts_with("invalid domain")));
    }
}
