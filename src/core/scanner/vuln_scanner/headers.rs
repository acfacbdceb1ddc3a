// src/core/scanner/vuln_scanner/headers.rs

use super::{Check, Outcome, Target};
use crate::core::collectors::http::HttpResponse;
use crate::core::error::CollectorError;
use async_trait::async_trait;
use tracing::debug;

/// A check that only inspects the homepage response headers. It cannot reach
/// a verdict when the homepage came through a relay or was not fetched.
pub struct HeaderCheck {
    id: &'static str,
    inspect: fn(&HttpResponse) -> Outcome,
}

#[async_trait]
impl Check for HeaderCheck {
    fn id(&self) -> &'static str {
        self.id
    }

    async fn execute(&self, target: &Target<'_>) -> Result<Outcome, CollectorError> {
        let homepage = target.direct_homepage()?;
        Ok((self.inspect)(homepage))
    }
}

/// The header checks, in registry order.
pub fn header_checks() -> Vec<Box<dyn Check>> {
    let checks = [
        HeaderCheck { id: "missing-hsts", inspect: missing_hsts },
        HeaderCheck { id: "missing-csp", inspect: missing_csp },
        HeaderCheck { id: "missing-x-frame-options", inspect: missing_frame_options },
        HeaderCheck { id: "missing-permissions-policy", inspect: missing_permissions_policy },
        HeaderCheck { id: "missing-x-content-type-options", inspect: missing_content_type_options },
        HeaderCheck { id: "insecure-cookie-flags", inspect: insecure_cookies },
        HeaderCheck { id: "server-version-disclosure", inspect: server_version },
        HeaderCheck { id: "x-powered-by-disclosure", inspect: powered_by },
    ];
    checks.into_iter().map(|c| Box::new(c) as Box<dyn Check>).collect()
}

/// Checks for the presence of a header, logging what was seen.
fn present(page: &HttpResponse, name: &str) -> bool {
    let found = page.header(name).is_some_and(|v| !v.trim().is_empty());
    debug!(header_name = name, found, "Checking for header.");
    found
}

fn missing_hsts(page: &HttpResponse) -> Outcome {
    if present(page, "strict-transport-security") {
        Outcome::clean()
    } else {
        Outcome::found("Strict-Transport-Security header not set")
    }
}

fn missing_csp(page: &HttpResponse) -> Outcome {
    if present(page, "content-security-policy") {
        Outcome::clean()
    } else {
        Outcome::found("Content-Security-Policy header not set")
    }
}

fn missing_frame_options(page: &HttpResponse) -> Outcome {
    let csp_frames = page
        .header("content-security-policy")
        .is_some_and(|csp| csp.to_ascii_lowercase().contains("frame-ancestors"));
    if present(page, "x-frame-options") || csp_frames {
        Outcome::clean()
    } else {
        Outcome::found("Neither X-Frame-Options nor CSP frame-ancestors is set")
    }
}

fn missing_permissions_policy(page: &HttpResponse) -> Outcome {
    if present(page, "permissions-policy") || present(page, "feature-policy") {
        Outcome::clean()
    } else {
        Outcome::found("Permissions-Policy header not set")
    }
}

fn missing_content_type_options(page: &HttpResponse) -> Outcome {
    match page.header("x-content-type-options") {
        Some(v) if v.trim().eq_ignore_ascii_case("nosniff") => Outcome::clean(),
        Some(v) => Outcome::found(format!("X-Content-Type-Options is '{v}'")),
        None => Outcome::found("X-Content-Type-Options header not set"),
    }
}

/// Reports every cookie set without `Secure` or `HttpOnly`, by name.
fn insecure_cookies(page: &HttpResponse) -> Outcome {
    let weak: Vec<String> = page
        .set_cookies
        .iter()
        .filter_map(|cookie| {
            let mut parts = cookie.split(';').map(str::trim);
            let name = parts.next()?.split('=').next()?.to_string();
            let attributes: Vec<String> = parts.map(str::to_ascii_lowercase).collect();
            let secure = attributes.iter().any(|a| a == "secure");
            let http_only = attributes.iter().any(|a| a == "httponly");
            let mut missing = Vec::new();
            if !secure {
                missing.push("Secure");
            }
            if !http_only {
                missing.push("HttpOnly");
            }
            (!missing.is_empty()).then(|| format!("{name} (no {})", missing.join("/")))
        })
        .collect();

    if weak.is_empty() {
        Outcome::clean()
    } else {
        Outcome::found(weak.join(", "))
    }
}

fn server_version(page: &HttpResponse) -> Outcome {
    match page.header("server") {
        Some(server) if server.contains('/') && server.chars().any(|c| c.is_ascii_digit()) => {
            Outcome::found(format!("Server: {server}"))
        }
        _ => Outcome::clean(),
    }
}

fn powered_by(page: &HttpResponse) -> Outcome {
    let leaks: Vec<String> = ["x-powered-by", "x-aspnet-version", "x-aspnetmvc-version", "x-generator"]
        .iter()
        .filter_map(|name| page.header(name).map(|v| format!("{name}: {v}")))
        .collect();
    if leaks.is_empty() {
        Outcome::clean()
    } else {
        Outcome::found(leaks.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::collectors::http::HttpClient;
    use crate::core::config::ScanConfig;

    fn page(headers: &[(&str, &str)], cookies: &[&str]) -> HttpResponse {
        HttpResponse {
            url: "https://example.com/".into(),
            status: Some(200),
            headers: headers.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            set_cookies: cookies.iter().map(|c| c.to_string()).collect(),
            body: String::new(),
            via_relay: false,
        }
    }

    #[test]
    fn bare_response_misses_every_security_header() {
        let bare = page(&[], &[]);
        assert!(missing_hsts(&bare).vulnerable);
        assert!(missing_csp(&bare).vulnerable);
        assert!(missing_frame_options(&bare).vulnerable);
        assert!(missing_permissions_policy(&bare).vulnerable);
        assert!(missing_content_type_options(&bare).vulnerable);
        assert!(!insecure_cookies(&bare).vulnerable);
    }

    #[test]
    fn hardened_response_passes() {
        let hardened = page(
            &[
                ("strict-transport-security", "max-age=31536000"),
                ("content-security-policy", "default-src 'self'; frame-ancestors 'none'"),
                ("permissions-policy", "camera=()"),
                ("x-content-type-options", "nosniff"),
                ("server", "nginx"),
            ],
            &["sid=abc; Path=/; Secure; HttpOnly; SameSite=Lax"],
        );
        for check in [missing_hsts, missing_csp, missing_frame_options, missing_permissions_policy, missing_content_type_options, insecure_cookies, server_version, powered_by] {
            assert!(!check(&hardened).vulnerable);
        }
    }

    #[test]
    fn cookie_and_version_leaks_carry_evidence() {
        let leaky = page(
            &[("server", "Apache/2.4.41 (Ubuntu)"), ("x-powered-by", "PHP/7.4.3")],
            &["PHPSESSID=1; path=/", "theme=dark; Secure; HttpOnly", "csrf=2; secure"],
        );
        assert_eq!(
            insecure_cookies(&leaky).evidence.as_deref(),
            Some("PHPSESSID (no Secure/HttpOnly), csrf (no HttpOnly)")
        );
        assert_eq!(server_version(&leaky).evidence.as_deref(), Some("Server: Apache/2.4.41 (Ubuntu)"));
        assert_eq!(powered_by(&leaky).evidence.as_deref(), Some("x-powered-by: PHP/7.4.3"));
    }

    #[tokio::test]
    async fn relayed_homepage_gives_no_verdict() {
        let http = HttpClient::new(&ScanConfig::default()).unwrap();
        let relayed = HttpResponse { via_relay: true, ..page(&[], &[]) };
        let target = Target { domain: "example.com", base_url: "https://example.com", homepage: Some(&relayed), http: &http };
        for check in header_checks() {
            assert!(check.execute(&target).await.is_err());
        }
    }
}
