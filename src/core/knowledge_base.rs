//! This module acts as the central "brain" of the scanner.
//! It contains a static, read-only database of every finding the scanner can
//! raise, complete with human-readable explanations and remediation steps,
//! plus the table of component versions with known CVEs.
//! Keeping this data-driven means a check's severity depends on nothing but
//! its code.

use crate::core::models::Severity;
use std::cmp::Ordering;
use std::fmt;

/// Defines the high-level categories for security findings.
/// This is used to group related issues together in the user interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FindingCategory {
    /// SPF, DMARC and DKIM posture.
    Email,
    /// Credentials, keys and configuration files served over HTTP.
    SensitiveFile,
    /// Backups, logs and source maps left on the web root.
    Exposure,
    DirectoryListing,
    Injection,
    Cors,
    SecurityHeaders,
    Cookies,
    /// Admin panels, debug and diagnostics endpoints.
    AdminDebug,
    Api,
    InformationDisclosure,
    Tls,
    OutdatedComponent,
}

impl fmt::Display for FindingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FindingCategory::Email => "Email Security",
            FindingCategory::SensitiveFile => "Sensitive File Exposure",
            FindingCategory::Exposure => "Backup & Log Exposure",
            FindingCategory::DirectoryListing => "Directory Listing",
            FindingCategory::Injection => "Injection",
            FindingCategory::Cors => "CORS",
            FindingCategory::SecurityHeaders => "HTTP Security Headers",
            FindingCategory::Cookies => "Cookies",
            FindingCategory::AdminDebug => "Admin & Debug Endpoints",
            FindingCategory::Api => "API Exposure",
            FindingCategory::InformationDisclosure => "Information Disclosure",
            FindingCategory::Tls => "SSL/TLS Certificate",
            FindingCategory::OutdatedComponent => "Outdated Components",
        };
        f.write_str(name)
    }
}

/// A struct that holds all the detailed, human-readable information about a specific finding.
///
/// This is the core data structure of the knowledge base. Vulnerability check
/// templates and email-security advisories are both described by it.
pub struct FindingDetail {
    /// A unique, machine-readable identifier (e.g., "env-file-exposure").
    pub code: &'static str,
    /// A short, human-readable title for the finding.
    pub title: &'static str,
    pub category: FindingCategory,
    pub severity: Severity,
    /// What the finding means and why it matters.
    pub description: &'static str,
    /// Clear, actionable steps the user can take to fix the issue.
    pub remediation: &'static str,
}

/// The centralized, static knowledge base of all possible findings.
static FINDINGS: &[FindingDetail] = &[
    // --- Email: SPF / DMARC / DKIM ---
    FindingDetail {
        code: "DNS_DMARC_MISSING",
        title: "DMARC Record Missing",
        category: FindingCategory::Email,
        severity: Severity::High,
        description: "DMARC tells receiving mail servers how to handle emails that fail authentication. Without it the domain can be spoofed in phishing campaigns.",
        remediation: "Publish a TXT record at _dmarc.<domain>. Start with 'v=DMARC1; p=none; rua=mailto:...' and move to 'p=quarantine' or 'p=reject' after reviewing reports.",
    },
    FindingDetail {
        code: "DNS_DMARC_POLICY_NONE",
        title: "DMARC Policy is 'none'",
        category: FindingCategory::Email,
        severity: Severity::Medium,
        description: "The DMARC policy only monitors. Receivers are not asked to block or quarantine spoofed mail.",
        remediation: "Once legitimate mail passes SPF and DKIM, raise the policy to 'p=quarantine' or 'p=reject'.",
    },
    FindingDetail {
        code: "DNS_SPF_MISSING",
        title: "SPF Record Missing",
        category: FindingCategory::Email,
        severity: Severity::Medium,
        description: "SPF lists the servers allowed to send mail for the domain. Without it, forged senders are harder for receivers to reject.",
        remediation: "Publish a TXT record such as 'v=spf1 include:_spf.google.com -all' listing every legitimate sender.",
    },
    FindingDetail {
        code: "DNS_SPF_POLICY_SOFTFAIL",
        title: "SPF Policy is 'Softfail'",
        category: FindingCategory::Email,
        severity: Severity::Low,
        description: "The SPF record ends with '~all', so failing mail is accepted and only marked as suspicious.",
        remediation: "When the record covers every legitimate sender, end it with '-all' instead.",
    },
    FindingDetail {
        code: "DNS_SPF_POLICY_NEUTRAL",
        title: "SPF Policy is 'Neutral'",
        category: FindingCategory::Email,
        severity: Severity::Low,
        description: "The SPF record ends with '?all', which expresses no policy at all for unlisted senders.",
        remediation: "Replace '?all' with '~all' or, preferably, '-all'.",
    },
    FindingDetail {
        code: "DNS_DKIM_MISSING",
        title: "DKIM Record Not Found",
        category: FindingCategory::Email,
        severity: Severity::Info,
        description: "No DKIM key was found under the common selectors. DKIM signs outgoing mail so receivers can verify it was not altered.",
        remediation: "Enable DKIM signing with the mail provider and publish the public key as a TXT record under <selector>._domainkey.",
    },

    // --- Sensitive files ---
    FindingDetail {
        code: "env-file-exposure",
        title: "Environment File Exposed",
        category: FindingCategory::SensitiveFile,
        severity: Severity::Critical,
        description: "A .env file is publicly readable. These files usually hold database passwords, API keys and application secrets.",
        remediation: "Remove the file from the web root, block dotfiles at the web server, and rotate every secret it contained.",
    },
    FindingDetail {
        code: "git-config-exposure",
        title: "Git Repository Config Exposed",
        category: FindingCategory::SensitiveFile,
        severity: Severity::Critical,
        description: "The .git directory is served. Attackers can reconstruct the source code and its history, including any committed secrets.",
        remediation: "Deny access to /.git at the web server and deploy build artifacts instead of working copies.",
    },
    FindingDetail {
        code: "git-head-exposure",
        title: "Git HEAD Exposed",
        category: FindingCategory::SensitiveFile,
        severity: Severity::High,
        description: "/.git/HEAD is readable, which indicates the repository metadata can be downloaded.",
        remediation: "Deny access to /.git at the web server.",
    },
    FindingDetail {
        code: "svn-metadata-exposure",
        title: "Subversion Metadata Exposed",
        category: FindingCategory::SensitiveFile,
        severity: Severity::High,
        description: "Subversion working-copy metadata is served, exposing file names and possibly source code.",
        remediation: "Deny access to /.svn and deploy exported trees instead of working copies.",
    },
    FindingDetail {
        code: "ds-store-exposure",
        title: ".DS_Store File Exposed",
        category: FindingCategory::SensitiveFile,
        severity: Severity::Low,
        description: "A macOS .DS_Store file lists the names of files in the directory, including ones that are not linked anywhere.",
        remediation: "Delete .DS_Store files from the deployment and block them at the web server.",
    },
    FindingDetail {
        code: "wp-config-backup",
        title: "WordPress Config Backup Exposed",
        category: FindingCategory::SensitiveFile,
        severity: Severity::Critical,
        description: "A backup copy of wp-config.php is served as plain text, revealing database credentials and authentication salts.",
        remediation: "Delete the backup, rotate the database password and salts, and never keep editor backups in the web root.",
    },
    FindingDetail {
        code: "htpasswd-exposure",
        title: ".htpasswd File Exposed",
        category: FindingCategory::SensitiveFile,
        severity: Severity::High,
        description: "An .htpasswd file with user names and password hashes is readable and can be cracked offline.",
        remediation: "Move the file outside the web root and change the affected passwords.",
    },
    FindingDetail {
        code: "ssh-private-key-exposure",
        title: "SSH Private Key Exposed",
        category: FindingCategory::SensitiveFile,
        severity: Severity::Critical,
        description: "A private key is downloadable. Anyone holding it can authenticate wherever the matching public key is trusted.",
        remediation: "Remove the key, revoke it from every authorized_keys file, and issue a new key pair.",
    },
    FindingDetail {
        code: "docker-compose-exposure",
        title: "docker-compose File Exposed",
        category: FindingCategory::SensitiveFile,
        severity: Severity::Medium,
        description: "The container composition file reveals internal service names, images, ports and sometimes credentials.",
        remediation: "Keep deployment descriptors out of the web root.",
    },
    FindingDetail {
        code: "config-json-secrets",
        title: "Configuration File With Secrets",
        category: FindingCategory::SensitiveFile,
        severity: Severity::High,
        description: "A public JSON configuration file contains keys that look like passwords, tokens or API keys.",
        remediation: "Serve only the configuration the browser needs and move secrets to server-side storage. Rotate exposed values.",
    },

    // --- Backups, logs, source maps ---
    FindingDetail {
        code: "backup-archive-exposure",
        title: "Backup Archive Exposed",
        category: FindingCategory::Exposure,
        severity: Severity::High,
        description: "A site backup archive can be downloaded, typically containing source code and configuration.",
        remediation: "Store backups outside the web root and restrict access to them.",
    },
    FindingDetail {
        code: "sql-dump-exposure",
        title: "Database Dump Exposed",
        category: FindingCategory::Exposure,
        severity: Severity::Critical,
        description: "A SQL dump is publicly readable and may contain user records and password hashes.",
        remediation: "Delete the dump from the web root, assess what data leaked, and rotate credentials.",
    },
    FindingDetail {
        code: "debug-log-exposure",
        title: "Debug Log Exposed",
        category: FindingCategory::Exposure,
        severity: Severity::Medium,
        description: "An application debug log is readable. Logs leak file paths, stack traces and sometimes tokens.",
        remediation: "Write logs outside the web root and disable debug logging in production.",
    },
    FindingDetail {
        code: "error-log-exposure",
        title: "Error Log Exposed",
        category: FindingCategory::Exposure,
        severity: Severity::Medium,
        description: "A server error log is readable, revealing internal paths and software versions.",
        remediation: "Move logs outside the web root and deny access to log files.",
    },
    FindingDetail {
        code: "source-map-exposure",
        title: "JavaScript Source Maps Exposed",
        category: FindingCategory::Exposure,
        severity: Severity::Low,
        description: "Source maps for production scripts are public, making the original front-end source easy to read.",
        remediation: "Do not deploy .map files, or restrict them to internal networks.",
    },
    FindingDetail {
        code: "directory-listing",
        title: "Directory Listing Enabled",
        category: FindingCategory::DirectoryListing,
        severity: Severity::Medium,
        description: "The web server generates file indexes for directories without an index page, exposing their contents.",
        remediation: "Disable auto-indexing ('Options -Indexes' on Apache, 'autoindex off' on Nginx).",
    },

    // --- Injection ---
    FindingDetail {
        code: "sql-error-disclosure",
        title: "SQL Error Message on Malformed Input",
        category: FindingCategory::Injection,
        severity: Severity::High,
        description: "A quote in a query parameter produced a database error message, a strong hint of SQL injection.",
        remediation: "Use parameterized queries everywhere and return generic error pages.",
    },

    // --- CORS ---
    FindingDetail {
        code: "cors-misconfiguration",
        title: "Permissive CORS Policy",
        category: FindingCategory::Cors,
        severity: Severity::High,
        description: "The server trusts arbitrary origins in Access-Control-Allow-Origin, letting other sites read responses, possibly with credentials.",
        remediation: "Allow only an explicit list of trusted origins and never combine a reflected origin with Access-Control-Allow-Credentials.",
    },

    // --- Security headers ---
    FindingDetail {
        code: "missing-hsts",
        title: "HSTS Header Missing",
        category: FindingCategory::SecurityHeaders,
        severity: Severity::Medium,
        description: "Strict-Transport-Security makes browsers use HTTPS only, protecting against downgrade attacks and cookie hijacking.",
        remediation: "Send 'Strict-Transport-Security: max-age=31536000; includeSubDomains'.",
    },
    FindingDetail {
        code: "missing-csp",
        title: "CSP Header Missing",
        category: FindingCategory::SecurityHeaders,
        severity: Severity::Medium,
        description: "Content-Security-Policy limits where scripts and other resources may load from and is the main defence in depth against XSS.",
        remediation: "Define a Content-Security-Policy, starting restrictive and loosening it as needed.",
    },
    FindingDetail {
        code: "missing-x-frame-options",
        title: "X-Frame-Options Missing",
        category: FindingCategory::SecurityHeaders,
        severity: Severity::Medium,
        description: "Without framing restrictions the site can be embedded in an invisible iframe for clickjacking.",
        remediation: "Send 'X-Frame-Options: DENY' or 'SAMEORIGIN', or a CSP frame-ancestors directive.",
    },
    FindingDetail {
        code: "missing-permissions-policy",
        title: "Permissions-Policy Missing",
        category: FindingCategory::SecurityHeaders,
        severity: Severity::Low,
        description: "Permissions-Policy restricts powerful browser features such as camera, microphone and geolocation.",
        remediation: "Send a Permissions-Policy header disabling features the site does not use.",
    },
    FindingDetail {
        code: "missing-x-content-type-options",
        title: "X-Content-Type-Options Missing",
        category: FindingCategory::SecurityHeaders,
        severity: Severity::Low,
        description: "Without 'nosniff', browsers may guess content types and execute files disguised as other formats.",
        remediation: "Send 'X-Content-Type-Options: nosniff'.",
    },

    // --- Cookies ---
    FindingDetail {
        code: "insecure-cookie-flags",
        title: "Cookies Without Secure/HttpOnly",
        category: FindingCategory::Cookies,
        severity: Severity::Medium,
        description: "Cookies are set without the Secure or HttpOnly flag, so they can travel over plain HTTP or be read by scripts.",
        remediation: "Set Secure and HttpOnly (and SameSite) on every session cookie.",
    },

    // --- Admin & debug endpoints ---
    FindingDetail {
        code: "admin-panel-exposure",
        title: "Admin Login Exposed",
        category: FindingCategory::AdminDebug,
        severity: Severity::Medium,
        description: "An administrative login form is reachable from the internet and is a target for credential stuffing.",
        remediation: "Restrict admin interfaces by IP or VPN and require multi-factor authentication.",
    },
    FindingDetail {
        code: "phpinfo-exposure",
        title: "phpinfo() Page Exposed",
        category: FindingCategory::AdminDebug,
        severity: Severity::High,
        description: "A phpinfo page discloses the PHP configuration, environment variables and internal paths.",
        remediation: "Delete diagnostic scripts from production servers.",
    },
    FindingDetail {
        code: "server-status-exposure",
        title: "Apache server-status Exposed",
        category: FindingCategory::AdminDebug,
        severity: Severity::Medium,
        description: "mod_status output shows live requests, client addresses and virtual hosts.",
        remediation: "Restrict /server-status to localhost or disable mod_status.",
    },
    FindingDetail {
        code: "spring-actuator-exposure",
        title: "Spring Boot Actuator Exposed",
        category: FindingCategory::AdminDebug,
        severity: Severity::High,
        description: "Actuator endpoints expose environment properties and configuration of a Spring Boot application.",
        remediation: "Expose only the health endpoint publicly and protect the rest with authentication.",
    },
    FindingDetail {
        code: "debug-endpoint-exposure",
        title: "Debug Endpoint Exposed",
        category: FindingCategory::AdminDebug,
        severity: Severity::High,
        description: "A framework debugger or profiler is reachable, which can leak internals or allow code execution.",
        remediation: "Disable debug mode and profilers in production builds.",
    },

    // --- API ---
    FindingDetail {
        code: "swagger-docs-exposure",
        title: "API Documentation Exposed",
        category: FindingCategory::Api,
        severity: Severity::Low,
        description: "A Swagger/OpenAPI description is public, mapping every API route for an attacker.",
        remediation: "Publish API documentation only where intended and protect internal APIs.",
    },
    FindingDetail {
        code: "graphql-introspection",
        title: "GraphQL Introspection Enabled",
        category: FindingCategory::Api,
        severity: Severity::Medium,
        description: "The GraphQL endpoint answers introspection queries, revealing the full schema including hidden fields.",
        remediation: "Disable introspection in production.",
    },
    FindingDetail {
        code: "crossdomain-wildcard",
        title: "Wildcard crossdomain.xml",
        category: FindingCategory::Api,
        severity: Severity::Medium,
        description: "crossdomain.xml allows any domain, letting Flash and other plugin content read data across origins.",
        remediation: "Remove the file or restrict allow-access-from to trusted domains.",
    },

    // --- Information disclosure ---
    FindingDetail {
        code: "server-version-disclosure",
        title: "Server Version Disclosed",
        category: FindingCategory::InformationDisclosure,
        severity: Severity::Low,
        description: "The Server header reveals the exact software version, making it easy to match known vulnerabilities.",
        remediation: "Hide version numbers ('server_tokens off', 'ServerTokens Prod').",
    },
    FindingDetail {
        code: "x-powered-by-disclosure",
        title: "X-Powered-By Header Present",
        category: FindingCategory::InformationDisclosure,
        severity: Severity::Low,
        description: "X-Powered-By and similar headers reveal the application stack and version.",
        remediation: "Remove the header in the application or at the reverse proxy.",
    },
    FindingDetail {
        code: "security-txt-missing",
        title: "security.txt Missing",
        category: FindingCategory::InformationDisclosure,
        severity: Severity::Info,
        description: "No /.well-known/security.txt tells researchers how to report vulnerabilities.",
        remediation: "Publish a security.txt file with at least a Contact field.",
    },

    // --- TLS ---
    FindingDetail {
        code: "tls-certificate-invalid",
        title: "TLS Certificate Expired or Expiring",
        category: FindingCategory::Tls,
        severity: Severity::High,
        description: "The certificate served on port 443 is expired, not yet valid, or expires within 14 days.",
        remediation: "Renew the certificate and automate renewals (e.g. ACME / Let's Encrypt).",
    },

    // --- Components ---
    FindingDetail {
        code: "vulnerable-component",
        title: "Component With Known CVEs",
        category: FindingCategory::OutdatedComponent,
        severity: Severity::High,
        description: "A detected library or server version is listed as affected by published vulnerabilities.",
        remediation: "Upgrade the component to a patched release.",
    },
];

/// Retrieves the full detail for a given finding code from the static knowledge base.
///
/// # Arguments
///
/// * `code` - The machine-readable code for the finding.
///
/// # Returns
///
/// An `Option` containing a reference to the `FindingDetail` if the code is found,
/// or `None` if the code does not exist in the knowledge base.
pub fn get_finding_detail(code: &str) -> Option<&'static FindingDetail> {
    FINDINGS.iter().find(|f| f.code == code)
}

/// A half-open version range `[introduced, fixed)` of a component with
/// published CVEs.
pub struct VulnerableVersion {
    pub technology: &'static str,
    pub introduced: &'static str,
    pub fixed: &'static str,
    pub cves: &'static [&'static str],
}

const fn range(
    technology: &'static str,
    introduced: &'static str,
    fixed: &'static str,
    cves: &'static [&'static str],
) -> VulnerableVersion {
    VulnerableVersion { technology, introduced, fixed, cves }
}

static VULNERABLE_VERSIONS: &[VulnerableVersion] = &[
    range("jQuery", "0", "3.4.0", &["CVE-2019-11358"]),
    range("jQuery", "1.2", "3.5.0", &["CVE-2020-11022", "CVE-2020-11023"]),
    range("AngularJS", "1.0", "2.0", &["CVE-2022-25844", "CVE-2023-26116", "CVE-2023-26117"]),
    range("Bootstrap", "3.0", "3.4.1", &["CVE-2018-14040", "CVE-2018-14042", "CVE-2019-8331"]),
    range("Bootstrap", "4.0", "4.1.2", &["CVE-2018-14040", "CVE-2018-14042"]),
    range("Bootstrap", "4.0", "4.3.1", &["CVE-2019-8331"]),
    range("Lodash", "0", "4.17.12", &["CVE-2019-10744"]),
    range("Lodash", "0", "4.17.19", &["CVE-2020-8203"]),
    range("Lodash", "0", "4.17.21", &["CVE-2021-23337"]),
    range("Moment.js", "0", "2.19.3", &["CVE-2017-18214"]),
    range("Moment.js", "1.0.1", "2.29.2", &["CVE-2022-24785"]),
    range("Handlebars", "0", "4.5.3", &["CVE-2019-19919"]),
    range("Handlebars", "0", "4.7.7", &["CVE-2021-23369"]),
    range("Apache", "2.4.49", "2.4.50", &["CVE-2021-41773"]),
    range("Apache", "2.4.49", "2.4.51", &["CVE-2021-42013"]),
    range("PHP", "5.0", "7.1.31", &["CVE-2019-11042"]),
    range("PHP", "5.0", "7.1.33", &["CVE-2019-11043"]),
    range("PHP", "7.2", "7.2.24", &["CVE-2019-11043"]),
    range("PHP", "7.3", "7.3.11", &["CVE-2019-11043"]),
    range("WordPress", "0", "4.9.9", &["CVE-2019-8942", "CVE-2019-8943"]),
    range("WordPress", "5.0", "5.0.1", &["CVE-2019-8942", "CVE-2019-8943"]),
    range("Nginx", "0.6.18", "1.20.1", &["CVE-2021-23017"]),
];

/// Numeric components of a dotted version. Each component keeps its leading
/// digits only, so `3.4.1-rc2` reads as `[3, 4, 1]`.
fn version_parts(version: &str) -> Vec<u64> {
    version
        .trim()
        .trim_start_matches(['v', 'V'])
        .split('.')
        .map_while(|part| {
            let digits: String = part.chars().take_while(char::is_ascii_digit).collect();
            digits.parse().ok()
        })
        .collect()
}

/// Compares two versions component by component, padding the shorter one
/// with zeros.
fn compare_versions(a: &[u64], b: &[u64]) -> Ordering {
    let len = a.len().max(b.len());
    (0..len)
        .map(|i| a.get(i).copied().unwrap_or(0).cmp(&b.get(i).copied().unwrap_or(0)))
        .find(|ord| ord.is_ne())
        .unwrap_or(Ordering::Equal)
}

/// CVEs listed for `technology` at `version`, merged across every matching
/// range and deduplicated in table order. Unparseable versions match nothing.
pub fn known_cves(technology: &str, version: &str) -> Vec<&'static str> {
    let parsed = version_parts(version);
    if parsed.is_empty() {
        return Vec::new();
    }

    let mut cves: Vec<&'static str> = Vec::new();
    for entry in VULNERABLE_VERSIONS.iter().filter(|v| {
        v.technology == technology
            && compare_versions(&parsed, &version_parts(v.introduced)).is_ge()
            && compare_versions(&parsed, &version_parts(v.fixed)).is_lt()
    }) {
        for cve in entry.cves {
            if !cves.contains(cve) {
                cves.push(cve);
            }
        }
    }
    cves
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn finding_codes_are_unique() {
        let codes: HashSet<&str> = FINDINGS.iter().map(|f| f.code).collect();
        assert_eq!(codes.len(), FINDINGS.len());
    }

    #[test]
    fn cve_lookup_uses_version_ranges() {
        assert_eq!(known_cves("jQuery", "3.4.1"), vec!["CVE-2020-11022", "CVE-2020-11023"]);
        assert_eq!(known_cves("jQuery", "2.2.4"), vec!["CVE-2019-11358", "CVE-2020-11022", "CVE-2020-11023"]);
        assert!(known_cves("jQuery", "3.7.1").is_empty());
        assert!(known_cves("React", "16.0.0").is_empty());
        assert_eq!(known_cves("Apache", "2.4.49"), vec!["CVE-2021-41773", "CVE-2021-42013"]);
        assert_eq!(known_cves("Apache", "2.4.50"), vec!["CVE-2021-42013"]);
    }

    #[test]
    fn late_patch_releases_inside_a_range_are_matched() {
        assert_eq!(known_cves("Lodash", "4.17.20"), vec!["CVE-2021-23337"]);
        assert_eq!(known_cves("Lodash", "4.17.5"), vec!["CVE-2019-10744", "CVE-2020-8203", "CVE-2021-23337"]);
        assert!(known_cves("Lodash", "4.17.21").is_empty());
        assert_eq!(known_cves("Moment.js", "2.24.0"), vec!["CVE-2022-24785"]);
        assert!(known_cves("Moment.js", "2.29.4").is_empty());
        assert_eq!(known_cves("Nginx", "1.18.0"), vec!["CVE-2021-23017"]);
    }

    #[test]
    fn versions_compare_numerically() {
        assert_eq!(version_parts("3.4.1-rc2"), vec![3, 4, 1]);
        assert_eq!(version_parts("v1.10"), vec![1, 10]);
        assert!(version_parts("latest").is_empty());
        assert!(compare_versions(&[1, 10], &[1, 9, 9]).is_gt());
        assert!(compare_versions(&[2, 0], &[2]).is_eq());
        assert!(known_cves("jQuery", "unknown").is_empty());
    }
}
