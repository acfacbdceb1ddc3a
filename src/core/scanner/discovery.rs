// src/core/scanner/discovery.rs

use crate::core::collectors::dns::{RecordKind, Resolve};
use crate::core::collectors::{archive, ct};
use crate::core::domain::Domain;
use crate::core::models::{ArchiveSnapshot, DiscoverySource};
use crate::core::scanner::ScanContext;
use crate::core::scanner::progress::{Phase, ProgressReporter};
use futures::future::join_all;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};
use url::Url;

/// Labels tried by the dictionary adapter, one `<label>.<domain>` each.
pub const WORDLIST: &[&str] = &[
    "www", "mail", "webmail", "smtp", "pop", "imap", "ftp", "sftp", "ns1", "ns2",
    "dns", "mx", "api", "api2", "dev", "staging", "stage", "test", "testing", "qa",
    "uat", "demo", "beta", "alpha", "admin", "administrator", "portal", "dashboard", "app", "apps",
    "mobile", "m", "blog", "shop", "store", "cdn", "static", "assets", "media", "img",
    "images", "files", "docs", "help", "support", "status", "vpn", "remote", "gateway", "proxy",
    "auth", "login", "sso", "id", "accounts", "secure", "git", "gitlab", "jenkins", "ci",
    "jira", "confluence", "wiki", "intranet", "internal", "db", "mysql", "monitor", "grafana", "kibana",
];

// --- Certificate transparency ---

/// Turns raw CT `name_value` fields into hostnames under `domain`.
///
/// Each field may hold several newline-separated names. Wildcard prefixes are
/// stripped, names are lowercased, and anything outside the domain is dropped.
pub fn parse_certificate_names(domain: &Domain, name_values: &[String]) -> BTreeSet<String> {
    name_values
        .iter()
        .flat_map(|value| value.lines())
        .map(|name| name.trim().trim_start_matches("*.").to_lowercase())
        .filter(|name| !name.is_empty() && !name.contains('*'))
        .filter(|name| domain.contains_host(name))
        .collect()
}

pub async fn discover_from_certificates(ctx: &ScanContext, domain: &Domain) -> BTreeSet<String> {
    match ct::search_certificates(&ctx.http, &ctx.config.ct_url, domain.as_str()).await {
        Ok(values) => {
            let hosts = parse_certificate_names(domain, &values);
            info!(count = hosts.len(), "Certificate transparency adapter finished.");
            hosts
        }
        Err(e) => {
            warn!(domain = %domain, error = %e, "Certificate transparency adapter failed.");
            BTreeSet::new()
        }
    }
}

// --- Dictionary brute force ---

/// Resolves `<label>.<domain>` for every wordlist label, `batch_size` at a
/// time, keeping names with at least one A record.
///
/// Each batch is fully settled before the next one starts. `on_batch` is
/// called after every batch with the number of labels tried so far and the
/// hits found so far.
pub async fn discover_by_bruteforce<F>(
    resolver: &dyn Resolve,
    domain: &Domain,
    wordlist: &[&str],
    batch_size: usize,
    mut on_batch: F,
) -> BTreeSet<String>
where
    F: FnMut(usize, usize),
{
    let mut found = BTreeSet::new();
    let mut tried = 0;

    for batch in wordlist.chunks(batch_size.max(1)) {
        let lookups = batch.iter().map(|label| {
            let host = format!("{label}.{domain}");
            async move {
                let live = resolver
                    .lookup(&host, RecordKind::A)
                    .await
                    .map(|records| !records.is_empty())
                    .unwrap_or(false);
                (host, live)
            }
        });

        for (host, live) in join_all(lookups).await {
            if live {
                debug!(host = %host, "Brute-force hit.");
                found.insert(host);
            }
        }
        tried += batch.len();
        on_batch(tried, found.len());
    }

    info!(count = found.len(), "Brute-force adapter finished.");
    found
}

// --- Historical archive ---

/// Keeps the hostnames of archived URLs that fall under `domain`.
pub fn parse_archive_hosts(domain: &Domain, snapshots: &[ArchiveSnapshot]) -> BTreeSet<String> {
    snapshots
        .iter()
        .filter_map(|snapshot| {
            let raw = snapshot.original_url.trim();
            let parsed = Url::parse(raw).or_else(|_| Url::parse(&format!("http://{raw}"))).ok()?;
            parsed.host_str().map(str::to_lowercase)
        })
        .filter(|host| domain.contains_host(host))
        .collect()
}

pub async fn discover_from_archive(ctx: &ScanContext, domain: &Domain) -> BTreeSet<String> {
    let pattern = format!("*.{domain}/*");
    match archive::query_index(&ctx.http, &ctx.config.archive_url, &pattern, ctx.config.archive_limit, true).await {
        Ok(snapshots) => {
            let hosts = parse_archive_hosts(domain, &snapshots);
            info!(count = hosts.len(), "Archive adapter finished.");
            hosts
        }
        Err(e) => {
            warn!(domain = %domain, error = %e, "Archive adapter failed.");
            BTreeSet::new()
        }
    }
}

// --- Aggregation ---

/// Unions the three adapters' results plus the root domain.
///
/// A hostname reported by several adapters keeps the strongest source
/// (certificate transparency, then brute force, then archive, then root),
/// whatever order the sets are merged in.
pub fn merge_sources(
    domain: &Domain,
    certificate: &BTreeSet<String>,
    bruteforce: &BTreeSet<String>,
    archived: &BTreeSet<String>,
) -> BTreeMap<String, DiscoverySource> {
    let mut merged = BTreeMap::new();
    let sources = [
        (DiscoverySource::Archive, archived),
        (DiscoverySource::BruteForce, bruteforce),
        (DiscoverySource::CertificateTransparency, certificate),
    ];

    merged.insert(domain.to_string(), DiscoverySource::Root);
    for (source, hosts) in sources {
        for host in hosts.iter().filter(|h| domain.contains_host(h)) {
            merged
                .entry(host.clone())
                .and_modify(|existing: &mut DiscoverySource| *existing = existing.strongest(source))
                .or_insert(source);
        }
    }
    merged
}

/// Runs all three adapters, one after another, and merges their results.
pub async fn run_discovery(
    ctx: &ScanContext,
    domain: &Domain,
    progress: &ProgressReporter,
) -> BTreeMap<String, DiscoverySource> {
    let phase = Phase::SubdomainDiscovery;
    let total_steps = WORDLIST.len() + 2;

    progress.within(phase, 0, total_steps, "Searching certificate transparency logs...");
    let certificate = discover_from_certificates(ctx, domain).await;

    progress.within(phase, 1, total_steps, format!("{} names from certificates. Brute-forcing common labels...", certificate.len()));
    let bruteforce = discover_by_bruteforce(
        ctx.resolver.as_ref(),
        domain,
        WORDLIST,
        ctx.config.bruteforce_batch,
        |tried, hits| {
            progress.within(phase, 1 + tried, total_steps, format!("Brute force: {tried}/{} labels, {hits} found", WORDLIST.len()));
        },
    )
    .await;

    progress.within(phase, total_steps - 1, total_steps, "Querying the web archive index...");
    let archived = discover_from_archive(ctx, domain).await;

    let merged = merge_sources(domain, &certificate, &bruteforce, &archived);
    info!(domain = %domain, unique = merged.len(), "Subdomain discovery finished.");
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::collectors::dns::testing::StaticResolver;

    fn domain() -> Domain {
        Domain::parse("example.com").unwrap()
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn wordlist_has_seventy_unique_labels() {
        let unique: BTreeSet<_> = WORDLIST.iter().collect();
        assert_eq!(WORDLIST.len(), 70);
        assert_eq!(unique.len(), 70);
    }

    #[test]
    fn certificate_names_are_split_cleaned_and_filtered() {
        let values = vec![
            "example.com\nWWW.Example.com".to_string(),
            "*.api.example.com\n*.example.com".to_string(),
            "mail.example.com\nexample.org\nnotexample.com".to_string(),
        ];
        let hosts = parse_certificate_names(&domain(), &values);
        assert_eq!(hosts, set(&["api.example.com", "example.com", "mail.example.com", "www.example.com"]));
    }

    #[test]
    fn archive_urls_keep_matching_hosts_only() {
        let snapshot = |url: &str| ArchiveSnapshot {
            timestamp: "20200101000000".into(),
            original_url: url.into(),
            status_code: Some(200),
            mime_type: None,
        };
        let rows = vec![
            snapshot("http://blog.example.com/post?id=1"),
            snapshot("https://SHOP.example.com:443/cart"),
            snapshot("cdn.example.com/lib.js"),
            snapshot("http://evil-example.com/"),
            snapshot("not a url at all"),
        ];
        assert_eq!(
            parse_archive_hosts(&domain(), &rows),
            set(&["blog.example.com", "cdn.example.com", "shop.example.com"])
        );
    }

    #[test]
    fn merge_deduplicates_and_applies_source_precedence() {
        let certificate = set(&["www.example.com", "api.example.com"]);
        let bruteforce = set(&["www.example.com", "mail.example.com", "example.com"]);
        let archived = set(&["www.example.com", "mail.example.com", "old.example.com", "other.org"]);

        let merged = merge_sources(&domain(), &certificate, &bruteforce, &archived);

        assert_eq!(merged.len(), 5);
        assert_eq!(merged["www.example.com"], DiscoverySource::CertificateTransparency);
        assert_eq!(merged["api.example.com"], DiscoverySource::CertificateTransparency);
        assert_eq!(merged["mail.example.com"], DiscoverySource::BruteForce);
        assert_eq!(merged["old.example.com"], DiscoverySource::Archive);
        assert_eq!(merged["example.com"], DiscoverySource::BruteForce);
        assert!(!merged.contains_key("other.org"));
    }

    #[test]
    fn merge_is_independent_of_argument_roles_for_shared_hosts() {
        let a = set(&["x.example.com"]);
        let empty = BTreeSet::new();
        let via_archive = merge_sources(&domain(), &empty, &empty, &a);
        let via_both = merge_sources(&domain(), &a, &empty, &a);
        assert_eq!(via_archive["x.example.com"], DiscoverySource::Archive);
        assert_eq!(via_both["x.example.com"], DiscoverySource::CertificateTransparency);
        assert_eq!(via_both["example.com"], DiscoverySource::Root);
    }

    #[tokio::test]
    async fn bruteforce_runs_seven_bounded_batches() {
        let resolver = StaticResolver::new()
            .with("www.example.com", RecordKind::A, &["93.184.216.34"])
            .with("mail.example.com", RecordKind::A, &["93.184.216.35"])
            .failing("vpn.example.com");

        let mut batches = Vec::new();
        let found = discover_by_bruteforce(&resolver, &domain(), WORDLIST, 10, |tried, hits| {
            batches.push((tried, hits));
        })
        .await;

        assert_eq!(batches.len(), 7);
        assert_eq!(batches.last(), Some(&(70, 2)));
        assert!(batches.windows(2).all(|w| w[1].0 == w[0].0 + 10));
        assert_eq!(resolver.query_count(), 70);
        assert_eq!(resolver.max_concurrency(), 10);
        assert_eq!(found, set(&["mail.example.com", "www.example.com"]));
    }
}
