// src/ui/widgets/mod.rs

// Module declarations for every widget the `ui` module draws.

pub mod analysis_view; // Progress gauge while scanning, findings list and details afterwards.
pub mod footer;        // The key hints bar.
pub mod input;         // The target domain field.
pub mod summary;       // Counts from the finished report.
