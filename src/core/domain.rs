// src/core/domain.rs

use crate::core::error::ScanError;
use serde::{Deserialize, Serialize};
use std::fmt;

const MAX_LABEL_LEN: usize = 63;
const MAX_DOMAIN_LEN: usize = 253;

/// A validated root hostname. Constructed only through [`Domain::parse`],
/// so holding one means the grammar has already been checked.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Domain(String);

impl Domain {
    /// Validates `input` against the hostname grammar and normalizes it to
    /// lowercase.
    ///
    /// Labels are dot-separated, non-empty, made of ASCII alphanumerics and
    /// hyphens, and never start or end with a hyphen. There must be at least
    /// two labels and the last one must be alphabetic and at least two
    /// characters long.
    ///
    /// # Errors
    /// Returns [`ScanError::InvalidDomain`] describing the first rule broken.
    pub fn parse(input: &str) -> Result<Self, ScanError> {
        let candidate = input.trim().trim_end_matches('.').to_ascii_lowercase();
        let invalid = |reason| ScanError::InvalidDomain { input: input.to_string(), reason };

        if candidate.is_empty() {
            return Err(invalid("empty input"));
        }
        if candidate.len() > MAX_DOMAIN_LEN {
            return Err(invalid("longer than 253 characters"));
        }

        let labels: Vec<&str> = candidate.split('.').collect();
        if labels.len() < 2 {
            return Err(invalid("at least two labels are required"));
        }

        for label in &labels {
            if label.is_empty() {
                return Err(invalid("empty label"));
            }
            if label.len() > MAX_LABEL_LEN {
                return Err(invalid("label longer than 63 characters"));
            }
            if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
                return Err(invalid("labels may only contain letters, digits and hyphens"));
            }
            if label.starts_with('-') || label.ends_with('-') {
                return Err(invalid("labels may not start or end with a hyphen"));
            }
        }

        let Some(tld) = labels.last() else {
            return Err(invalid("at least two labels are required"));
        };
        if tld.len() < 2 || !tld.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(invalid("top-level label must be alphabetic and at least 2 characters"));
        }

        Ok(Domain(candidate))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when `host` is this domain or one of its strict dot-suffix
    /// subdomains. Comparison is exact, so callers lowercase first.
    pub fn contains_host(&self, host: &str) -> bool {
        host == self.0
            || host
                .strip_suffix(self.0.as_str())
                .is_some_and(|prefix| prefix.len() > 1 && prefix.ends_with('.'))
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Domain {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
