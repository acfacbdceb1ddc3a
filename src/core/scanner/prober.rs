// src/core/scanner/prober.rs

use crate::core::collectors::dns::{RecordKind, Resolve};
use crate::core::domain::Domain;
use crate::core::models::{DiscoverySource, HostStatus, Subdomain};
use futures::future::join_all;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Picks at most `cap` hosts to probe: the root first, then by source
/// precedence, then alphabetically.
pub fn select_candidates(
    domain: &Domain,
    discovered: &BTreeMap<String, DiscoverySource>,
    cap: usize,
) -> Vec<(String, DiscoverySource)> {
    let mut candidates: Vec<(String, DiscoverySource)> =
        discovered.iter().map(|(host, source)| (host.clone(), *source)).collect();
    candidates.sort_by(|(host_a, source_a), (host_b, source_b)| {
        let root_a = host_a.as_str() != domain.as_str();
        let root_b = host_b.as_str() != domain.as_str();
        root_a.cmp(&root_b)
            .then(source_a.cmp(source_b))
            .then(host_a.cmp(host_b))
    });
    candidates.truncate(cap);
    candidates
}

/// Marks each host live if it has at least one A record.
///
/// Hosts are probed `batch_size` at a time and every batch settles before
/// the next starts. Lookup failures count as dead.
pub async fn check_liveness(
    resolver: &dyn Resolve,
    candidates: &[(String, DiscoverySource)],
    batch_size: usize,
    mut on_batch: impl FnMut(usize, usize),
) -> BTreeMap<String, Subdomain> {
    let mut statuses = BTreeMap::new();

    for batch in candidates.chunks(batch_size.max(1)) {
        let probes = batch.iter().map(|(host, source)| async move {
            let live = resolver
                .lookup(host, RecordKind::A)
                .await
                .map(|records| !records.is_empty())
                .unwrap_or(false);
            Subdomain {
                hostname: host.clone(),
                ip: None,
                status: if live { HostStatus::Live } else { HostStatus::Dead },
                source: *source,
            }
        });

        for subdomain in join_all(probes).await {
            statuses.insert(subdomain.hostname.clone(), subdomain);
        }
        on_batch(statuses.len(), candidates.len());
    }

    let live = statuses.values().filter(|s| s.status == HostStatus::Live).count();
    info!(probed = statuses.len(), live, "Liveness check finished.");
    statuses
}

/// Resolves an IPv4 address for every host, `batch_size` at a time.
///
/// Status is overwritten from this pass: resolved means live, anything else
/// means dead with no address.
pub async fn resolve_addresses(
    resolver: &dyn Resolve,
    subdomains: &mut BTreeMap<String, Subdomain>,
    batch_size: usize,
) {
    let hosts: Vec<String> = subdomains.keys().cloned().collect();

    for batch in hosts.chunks(batch_size.max(1)) {
        let lookups = batch.iter().map(|host| async move {
            (host.clone(), resolver.resolve_ipv4(host).await)
        });
        let results = join_all(lookups).await;

        for (host, ip) in results {
            if let Some(entry) = subdomains.get_mut(&host) {
                debug!(host = %host, ip = ?ip, "Address resolved.");
                entry.status = if ip.is_some() { HostStatus::Live } else { HostStatus::Dead };
                entry.ip = ip;
            }
        }
    }

    let resolved = subdomains.values().filter(|s| s.ip.is_some()).count();
    info!(hosts = subdomains.len(), resolved, "IP resolution finished.");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::collectors::dns::testing::StaticResolver;

    fn domain() -> Domain {
        Domain::parse("example.com").unwrap()
    }

    #[test]
    fn candidates_are_capped_with_root_first() {
        let mut discovered = BTreeMap::new();
        discovered.insert("example.com".to_string(), DiscoverySource::Root);
        for i in 0..60 {
            discovered.insert(format!("h{i:02}.example.com"), DiscoverySource::Archive);
        }
        discovered.insert("zz.example.com".to_string(), DiscoverySource::CertificateTransparency);

        let picked = select_candidates(&domain(), &discovered, 50);
        assert_eq!(picked.len(), 50);
        assert_eq!(picked[0].0, "example.com");
        assert_eq!(picked[1].0, "zz.example.com");
        assert_eq!(picked[2].0, "h00.example.com");
    }

    #[tokio::test]
    async fn liveness_uses_batches_of_five() {
        let resolver = StaticResolver::new()
            .with("www.example.com", RecordKind::A, &["10.0.0.1"])
            .failing("broken.example.com");
        let candidates: Vec<(String, DiscoverySource)> = ["www", "mail", "broken", "a", "b", "c", "d", "e", "f", "g", "h", "i"]
            .iter()
            .map(|l| (format!("{l}.example.com"), DiscoverySource::BruteForce))
            .collect();

        let mut batches = 0;
        let statuses = check_liveness(&resolver, &candidates, 5, |_, _| batches += 1).await;

        assert_eq!(batches, 3);
        assert!(resolver.max_concurrency() <= 5);
        assert_eq!(statuses.len(), 12);
        assert_eq!(statuses["www.example.com"].status, HostStatus::Live);
        assert_eq!(statuses["mail.example.com"].status, HostStatus::Dead);
        assert_eq!(statuses["broken.example.com"].status, HostStatus::Dead);
    }

    #[tokio::test]
    async fn address_pass_overwrites_status() {
        let resolver = StaticResolver::new()
            .with("www.example.com", RecordKind::A, &["10.0.0.1", "10.0.0.2"]);
        let mut subdomains = BTreeMap::new();
        for (host, status) in [("www.example.com", HostStatus::Dead), ("mail.example.com", HostStatus::Live)] {
            subdomains.insert(
                host.to_string(),
                Subdomain { hostname: host.to_string(), ip: None, status, source: DiscoverySource::BruteForce },
            );
        }

        resolve_addresses(&resolver, &mut subdomains, 10).await;

        assert_eq!(subdomains["www.example.com"].status, HostStatus::Live);
        assert_eq!(subdomains["www.example.com"].ip.as_deref(), Some("10.0.0.1"));
        assert_eq!(subdomains["mail.example.com"].status, HostStatus::Dead);
        assert_eq!(subdomains["mail.example.com"].ip, None);
    }
}
