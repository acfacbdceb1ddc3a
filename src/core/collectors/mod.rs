// src/core/collectors/mod.rs

// Typed access to the external services a scan depends on. Every function
// here returns a `Result`; deciding what a failure means is left to the
// scanner phases.
pub mod archive;
pub mod ct;
pub mod dns;
pub mod geo;
pub mod http;
pub mod rdap;
