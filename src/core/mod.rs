// src/core/mod.rs

// The root of the `core` module. Everything the scan needs lives here; the
// `ui` module only consumes what these modules produce.

/// Thin clients for the external collaborators: HTTP, DNS, certificate
/// transparency, RDAP, geolocation and the web archive.
pub mod collectors;

/// Scan tunables and their on-disk overrides.
pub mod config;

/// The validated target domain.
pub mod domain;

pub mod error;

/// JSON and CSV exports of a finished report.
pub mod export;

/// The host/IP tree built from a finished scan.
pub mod graph;

/// Contains the business logic for explaining findings: titles, severities,
/// descriptions and remediations keyed by finding code, plus the table of
/// component versions with known CVEs.
pub mod knowledge_base;

/// Contains all data structures and models used throughout the application,
/// such as `ScanReport`, `Severity`, and the per-phase result structs.
pub mod models;

/// Houses the phase logic and the orchestrator that runs the phases in order.
pub mod scanner;
