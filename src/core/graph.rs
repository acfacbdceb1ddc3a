// src/core/graph.rs

//! Network graph of a scan: the domain at the root, each discovered host one
//! level below it, and resolved addresses as leaves.
//!
//! Hosts always hang directly off the root whatever their real DNS
//! delegation depth, so the structure stays a one-level tree that renders
//! with a plain tree layout.

use crate::core::models::{HostStatus, Subdomain, VulnerabilityFinding};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};
use strum::Display;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum NodeKind {
    Root,
    Subdomain,
    Ip,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Risk {
    Critical,
    High,
    Medium,
    Low,
    None,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeKind {
    Contains,
    ResolvesTo,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GraphNode {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub label: String,
    pub status: HostStatus,
    pub risk: Risk,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub kind: EdgeKind,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct NetworkGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

/// Ways a graph can fail to be a single-rooted tree.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("expected exactly one root, found {0}")]
    RootCount(usize),
    #[error("root is '{found}', expected '{expected}'")]
    WrongRoot { expected: String, found: String },
    #[error("edge references unknown node '{0}'")]
    DanglingEdge(String),
    #[error("duplicate node id '{0}'")]
    DuplicateNode(String),
    #[error("node '{0}' is not reachable from the root")]
    Unreachable(String),
    #[error("cycle through node '{0}'")]
    Cycle(String),
}

impl NetworkGraph {
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Checks that `domain` is the only node nothing points to, that every
    /// edge joins known nodes, and that every node is reachable from the
    /// root without cycles.
    ///
    /// A shared address node has one parent per host resolving to it, so
    /// leaves may have indegree above one.
    pub fn validate(&self, domain: &str) -> Result<(), GraphError> {
        let mut ids = HashSet::new();
        for node in &self.nodes {
            if !ids.insert(node.id.as_str()) {
                return Err(GraphError::DuplicateNode(node.id.clone()));
            }
        }

        let mut indegree: BTreeMap<&str, usize> = self.nodes.iter().map(|n| (n.id.as_str(), 0)).collect();
        let mut children: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for edge in &self.edges {
            for end in [&edge.source, &edge.target] {
                if !ids.contains(end.as_str()) {
                    return Err(GraphError::DanglingEdge(end.clone()));
                }
            }
            *indegree.entry(edge.target.as_str()).or_default() += 1;
            children.entry(edge.source.as_str()).or_default().push(edge.target.as_str());
        }

        let roots: Vec<&str> = indegree.iter().filter(|(_, d)| **d == 0).map(|(id, _)| *id).collect();
        match roots.as_slice() {
            [root] if *root == domain => {}
            [root] => {
                return Err(GraphError::WrongRoot { expected: domain.to_string(), found: root.to_string() });
            }
            other => return Err(GraphError::RootCount(other.len())),
        }

        // Kahn's algorithm from the root: anything left unvisited is either
        // unreachable or on a cycle.
        let mut remaining = indegree.clone();
        let mut queue = VecDeque::from([domain]);
        let mut visited = BTreeSet::new();
        while let Some(id) = queue.pop_front() {
            visited.insert(id);
            for child in children.get(id).into_iter().flatten() {
                if let Some(d) = remaining.get_mut(child) {
                    *d -= 1;
                    if *d == 0 {
                        queue.push_back(*child);
                    }
                }
            }
        }

        if let Some(stuck) = self.nodes.iter().find(|n| !visited.contains(n.id.as_str())) {
            let on_cycle = remaining.get(stuck.id.as_str()).is_some_and(|d| *d > 0)
                && self.edges.iter().any(|e| e.target == stuck.id && visited.contains(e.source.as_str()));
            return Err(if on_cycle {
                GraphError::Cycle(stuck.id.clone())
            } else {
                GraphError::Unreachable(stuck.id.clone())
            });
        }
        Ok(())
    }
}

/// Assembles the scan graph from the probed hosts and the findings known at
/// build time.
///
/// Hosts are added in hostname order and addresses in first-seen order, so
/// the same inputs always produce the same graph. The root's own entry in
/// `subdomains` is not repeated as a child. Risk is a snapshot: a finding
/// targeting the root makes it `high` (otherwise `low`), a finding
/// targeting a host makes it `critical` (otherwise `none`).
///
/// # Arguments
/// * `domain` - The validated root domain.
/// * `subdomains` - Probed hosts, possibly including the root.
/// * `findings` - Every finding of the scan.
pub fn build_graph(domain: &str, subdomains: &[Subdomain], findings: &[VulnerabilityFinding]) -> NetworkGraph {
    let targeted: HashSet<&str> = findings.iter().map(|f| f.target.as_str()).collect();
    let root_status = subdomains
        .iter()
        .find(|s| s.hostname == domain)
        .map(|s| s.status)
        .unwrap_or(HostStatus::Live);

    let mut graph = NetworkGraph::default();
    graph.nodes.push(GraphNode {
        id: domain.to_string(),
        kind: NodeKind::Root,
        label: domain.to_string(),
        status: root_status,
        risk: if targeted.contains(domain) { Risk::High } else { Risk::Low },
    });

    let mut hosts: Vec<&Subdomain> = subdomains.iter().filter(|s| s.hostname != domain).collect();
    hosts.sort_by(|a, b| a.hostname.cmp(&b.hostname));
    hosts.dedup_by(|a, b| a.hostname == b.hostname);

    let mut seen_ips: HashSet<String> = HashSet::new();
    for host in hosts {
        graph.nodes.push(GraphNode {
            id: host.hostname.clone(),
            kind: NodeKind::Subdomain,
            label: host.hostname.clone(),
            status: host.status,
            risk: if targeted.contains(host.hostname.as_str()) { Risk::Critical } else { Risk::None },
        });
        graph.edges.push(GraphEdge {
            source: domain.to_string(),
            target: host.hostname.clone(),
            kind: EdgeKind::Contains,
        });

        let Some(ip) = host.ip.as_ref() else { continue };
        if seen_ips.insert(ip.clone()) {
            graph.nodes.push(GraphNode {
                id: ip.clone(),
                kind: NodeKind::Ip,
                label: ip.clone(),
                status: HostStatus::Live,
                risk: Risk::None,
            });
        }
        graph.edges.push(GraphEdge {
            source: host.hostname.clone(),
            target: ip.clone(),
            kind: EdgeKind::ResolvesTo,
        });
    }

    debug!(nodes = graph.nodes.len(), edges = graph.edges.len(), "Graph assembled.");
    info!(domain, hosts = graph.nodes.iter().filter(|n| n.kind == NodeKind::Subdomain).count(), "Graph build finished.");
    graph
}
