// src/core/scanner/vuln_scanner/exposure.rs

use super::{Check, Outcome, Target};
use crate::core::collectors::http::HttpResponse;
use crate::core::error::CollectorError;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use tracing::{debug, error};
use url::Url;

/// Fetches a list of paths and reports the first one that answers 200 with a
/// body matching `signature`.
pub struct PathCheck {
    id: &'static str,
    paths: &'static [&'static str],
    signature: Regex,
    /// Whether an HTML body can be a real hit. When false, HTML answers are
    /// treated as soft-404 pages.
    html_ok: bool,
}

impl PathCheck {
    fn new(id: &'static str, paths: &'static [&'static str], pattern: &str, html_ok: bool) -> Option<Self> {
        match Regex::new(pattern) {
            Ok(signature) => Some(Self { id, paths, signature, html_ok }),
            Err(e) => {
                error!(check = id, error = %e, "Invalid check signature, check disabled.");
                None
            }
        }
    }

    fn matches(&self, response: &HttpResponse) -> bool {
        if response.status != Some(200) {
            return false;
        }
        if !self.html_ok && looks_like_html(&response.body) {
            return false;
        }
        self.signature.is_match(&response.body)
    }
}

fn looks_like_html(body: &str) -> bool {
    let head: String = body.trim_start().chars().take(256).collect::<String>().to_ascii_lowercase();
    head.starts_with("<!doctype html") || head.starts_with("<html") || head.contains("<head")
}

/// Evidence is the matched path and the first line of the signature match.
fn evidence(path: &str, signature: &Regex, body: &str) -> String {
    let snippet = signature
        .find(body)
        .map(|m| m.as_str().lines().next().unwrap_or_default().chars().take(80).collect::<String>())
        .unwrap_or_default();
    format!("{path}: {snippet}")
}

#[async_trait]
impl Check for PathCheck {
    fn id(&self) -> &'static str {
        self.id
    }

    async fn execute(&self, target: &Target<'_>) -> Result<Outcome, CollectorError> {
        let mut last_error = None;
        let mut answered = false;

        for path in self.paths {
            match target.http.get(&target.url(path)).await {
                Ok(response) => {
                    answered = true;
                    if self.matches(&response) {
                        return Ok(Outcome::found(evidence(path, &self.signature, &response.body)));
                    }
                }
                Err(e) => {
                    debug!(check = self.id, path, error = %e, "Probe request failed.");
                    last_error = Some(e);
                }
            }
        }

        match (answered, last_error) {
            (false, Some(e)) => Err(e),
            _ => Ok(Outcome::clean()),
        }
    }
}

/// The path-based checks, in registry order.
pub fn path_checks() -> Vec<Box<dyn Check>> {
    let specs: [(&'static str, &'static [&'static str], &str, bool); 22] = [
        ("env-file-exposure", &["/.env", "/.env.production", "/.env.local"], r"(?m)^[A-Z][A-Z0-9_]{2,}\s*=", false),
        ("git-config-exposure", &["/.git/config"], r"\[core\]", false),
        ("git-head-exposure", &["/.git/HEAD"], r"^ref: refs/heads/", false),
        ("svn-metadata-exposure", &["/.svn/entries", "/.svn/wc.db"], r"^(?:\d+\s|SQLite format 3)", false),
        ("ds-store-exposure", &["/.DS_Store"], r"^\x00\x00\x00\x01Bud1", false),
        (
            "wp-config-backup",
            &["/wp-config.php.bak", "/wp-config.php~", "/wp-config.php.save", "/wp-config.old"],
            r"DB_PASSWORD|define\(\s*'DB_NAME'",
            false,
        ),
        ("htpasswd-exposure", &["/.htpasswd"], r"(?m)^[\w.-]+:(?:\$apr1\$|\$2[aby]\$|\{SHA\}|\$1\$)", false),
        (
            "ssh-private-key-exposure",
            &["/id_rsa", "/.ssh/id_rsa", "/id_ed25519"],
            r"-----BEGIN (?:RSA |OPENSSH |EC |DSA )?PRIVATE KEY-----",
            false,
        ),
        ("docker-compose-exposure", &["/docker-compose.yml", "/docker-compose.yaml"], r"(?m)^services:\s*$", false),
        (
            "config-json-secrets",
            &["/config.json", "/app/config.json"],
            r#"(?i)"[^"]*(?:password|secret|api_?key|token)[^"]*"\s*:\s*"[^"]+""#,
            false,
        ),
        ("backup-archive-exposure", &["/backup.zip", "/site.zip", "/www.zip", "/backup/backup.zip"], r"^PK\x03\x04", false),
        (
            "sql-dump-exposure",
            &["/dump.sql", "/backup.sql", "/database.sql", "/db.sql"],
            r"(?i)-- MySQL dump|-- PostgreSQL database dump|CREATE TABLE|INSERT INTO",
            false,
        ),
        (
            "debug-log-exposure",
            &["/debug.log", "/wp-content/debug.log"],
            r"PHP (?:Notice|Warning|Fatal error|Deprecated)|Stack trace:|\bDEBUG\b",
            false,
        ),
        (
            "error-log-exposure",
            &["/error_log", "/error.log", "/logs/error.log"],
            r"(?i)\[(?:error|warn|notice|crit)\]|PHP (?:Warning|Fatal error)",
            false,
        ),
        ("directory-listing", &["/uploads/", "/backup/", "/files/"], r"<title>Index of /", true),
        (
            "admin-panel-exposure",
            &["/admin", "/admin/login", "/administrator/", "/wp-login.php"],
            r#"(?i)<input[^>]+type=["']?password"#,
            true,
        ),
        ("phpinfo-exposure", &["/phpinfo.php", "/info.php", "/test.php"], r"<title>phpinfo\(\)</title>|PHP Version \d", true),
        ("server-status-exposure", &["/server-status"], r"Apache Server Status for", true),
        (
            "spring-actuator-exposure",
            &["/actuator/env", "/actuator", "/env"],
            r#""(?:activeProfiles|propertySources)"|"_links"\s*:\s*\{[^}]*"(?:env|health)""#,
            false,
        ),
        (
            "debug-endpoint-exposure",
            &["/_debugbar/open", "/_profiler", "/debug/pprof/", "/__debug__/"],
            r"(?i)Symfony Profiler|phpdebugbar|Types of profiles available|djdt",
            true,
        ),
        (
            "swagger-docs-exposure",
            &["/swagger-ui.html", "/swagger/index.html", "/api-docs", "/v2/api-docs", "/openapi.json", "/swagger.json"],
            r#"(?i)swagger-ui|"swagger"\s*:|"openapi"\s*:"#,
            true,
        ),
        ("crossdomain-wildcard", &["/crossdomain.xml"], r#"<allow-access-from\s+domain=["']\*["']"#, true),
    ];

    specs
        .into_iter()
        .filter_map(|(id, paths, pattern, html_ok)| PathCheck::new(id, paths, pattern, html_ok))
        .map(|check| Box::new(check) as Box<dyn Check>)
        .collect()
}

/// The checks that need more than a GET and a signature, in registry order.
pub fn probe_checks() -> Vec<Box<dyn Check>> {
    vec![
        Box::new(SourceMaps),
        Box::new(SqlErrorDisclosure),
        Box::new(CorsMisconfiguration),
        Box::new(GraphqlIntrospection),
        Box::new(SecurityTxtMissing),
    ]
}

// --- Source maps ---

static SCRIPT_SELECTOR: Lazy<Option<Selector>> = Lazy::new(|| Selector::parse("script[src]").ok());

/// Same-origin script URLs referenced by the homepage, at most `limit`.
fn same_origin_scripts(base_url: &str, body: &str, limit: usize) -> Vec<String> {
    let Ok(base) = Url::parse(base_url) else {
        return Vec::new();
    };
    let Some(selector) = SCRIPT_SELECTOR.as_ref() else {
        return Vec::new();
    };
    let document = Html::parse_document(body);
    document
        .select(selector)
        .filter_map(|el| el.value().attr("src"))
        .filter_map(|src| base.join(src).ok())
        .filter(|url| url.host_str() == base.host_str() && url.path().ends_with(".js"))
        .map(|mut url| {
            url.set_query(None);
            url.to_string()
        })
        .take(limit)
        .collect()
}

pub struct SourceMaps;

#[async_trait]
impl Check for SourceMaps {
    fn id(&self) -> &'static str {
        "source-map-exposure"
    }

    async fn execute(&self, target: &Target<'_>) -> Result<Outcome, CollectorError> {
        let homepage = target
            .homepage
            .ok_or_else(|| CollectorError::Parse("homepage unavailable".to_string()))?;
        let scripts = same_origin_scripts(target.base_url, &homepage.body, 3);

        for script in scripts {
            let map_url = format!("{script}.map");
            let Ok(response) = target.http.get(&map_url).await else { continue };
            if response.status == Some(200) && response.body.contains("\"mappings\"") {
                return Ok(Outcome::found(map_url));
            }
        }
        Ok(Outcome::clean())
    }
}

// --- SQL error disclosure ---

static SQL_ERROR: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(
        r"(?i)you have an error in your sql syntax|warning: mysql_|unclosed quotation mark after the character string|quoted string not properly terminated|pg_query\(\)|SQLSTATE\[|sqlite3?\.OperationalError|ORA-\d{5}",
    )
    .ok()
});

pub struct SqlErrorDisclosure;

#[async_trait]
impl Check for SqlErrorDisclosure {
    fn id(&self) -> &'static str {
        "sql-error-disclosure"
    }

    async fn execute(&self, target: &Target<'_>) -> Result<Outcome, CollectorError> {
        let pattern = SQL_ERROR
            .as_ref()
            .ok_or_else(|| CollectorError::Parse("sql error pattern unavailable".to_string()))?;
        let probe = target.http.get(&target.url("/?id=1'")).await?;
        let Some(hit) = pattern.find(&probe.body) else {
            return Ok(Outcome::clean());
        };

        // A page that always shows the message is not reacting to the quote.
        let baseline = target.homepage.map(|page| page.body.as_str()).unwrap_or_default();
        if pattern.is_match(baseline) {
            return Ok(Outcome::clean());
        }
        Ok(Outcome::found(format!("/?id=1' -> {}", hit.as_str())))
    }
}

// --- CORS ---

const PROBE_ORIGIN: &str = "https://vanguard-origin-probe.example";

pub struct CorsMisconfiguration;

/// Judges the CORS answer to a request sent with [`PROBE_ORIGIN`].
fn assess_cors(response: &HttpResponse) -> Outcome {
    let allow_origin = response.header("access-control-allow-origin").map(str::trim);
    let credentials = response
        .header("access-control-allow-credentials")
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"));

    match allow_origin {
        Some(origin) if origin == PROBE_ORIGIN => Outcome::found(format!(
            "Origin reflected in Access-Control-Allow-Origin (credentials: {credentials})"
        )),
        Some("*") if credentials => Outcome::found("Wildcard origin allowed together with credentials"),
        Some("null") if credentials => Outcome::found("'null' origin allowed together with credentials"),
        _ => Outcome::clean(),
    }
}

#[async_trait]
impl Check for CorsMisconfiguration {
    fn id(&self) -> &'static str {
        "cors-misconfiguration"
    }

    async fn execute(&self, target: &Target<'_>) -> Result<Outcome, CollectorError> {
        let request = target.http.client().get(target.url("/")).header("Origin", PROBE_ORIGIN);
        let response = target.http.send(request).await?;
        Ok(assess_cors(&response))
    }
}

// --- GraphQL ---

pub struct GraphqlIntrospection;

#[async_trait]
impl Check for GraphqlIntrospection {
    fn id(&self) -> &'static str {
        "graphql-introspection"
    }

    async fn execute(&self, target: &Target<'_>) -> Result<Outcome, CollectorError> {
        let query = serde_json::json!({ "query": "query { __schema { queryType { name } } }" });
        let mut last_error = None;

        for path in ["/graphql", "/api/graphql"] {
            let request = target.http.client().post(target.url(path)).json(&query);
            match target.http.send(request).await {
                Ok(response) if response.status == Some(200) => {
                    if response.body.contains("__schema") && response.body.contains("queryType") {
                        return Ok(Outcome::found(format!("{path} answers __schema queries")));
                    }
                }
                Ok(_) => {}
                Err(e) => last_error = Some(e),
            }
        }
        last_error.map_or(Ok(Outcome::clean()), Err)
    }
}

// --- security.txt ---

pub struct SecurityTxtMissing;

#[async_trait]
impl Check for SecurityTxtMissing {
    fn id(&self) -> &'static str {
        "security-txt-missing"
    }

    async fn execute(&self, target: &Target<'_>) -> Result<Outcome, CollectorError> {
        let response = target.http.get(&target.url("/.well-known/security.txt")).await?;
        let has_contact = response.status == Some(200)
            && response.body.lines().any(|line| line.trim_start().to_ascii_lowercase().starts_with("contact:"));
        if has_contact {
            Ok(Outcome::clean())
        } else {
            Ok(Outcome::found(format!(
                "/.well-known/security.txt returned {}",
                response.status.map_or_else(|| "no status".to_string(), |s| s.to_string())
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::collectors::http::HttpClient;
    use crate::core::config::ScanConfig;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn http() -> HttpClient {
        HttpClient::new(&ScanConfig { request_timeout_secs: 2, ..ScanConfig::default() }).unwrap()
    }

    fn check(id: &str) -> Box<dyn Check> {
        path_checks().into_iter().find(|c| c.id() == id).unwrap()
    }

    #[test]
    fn every_path_signature_compiles() {
        assert_eq!(path_checks().len(), 22);
        assert!(SQL_ERROR.is_some());
    }

    #[tokio::test]
    async fn env_file_is_detected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/.env"))
            .respond_with(ResponseTemplate::new(200).set_body_string("APP_ENV=production\nDB_PASSWORD=hunter2\n"))
            .mount(&server)
            .await;
        Mock::given(method("GET")).respond_with(ResponseTemplate::new(404)).mount(&server).await;

        let http = http();
        let base = server.uri();
        let target = Target { domain: "example.com", base_url: &base, homepage: None, http: &http };
        let outcome = check("env-file-exposure").execute(&target).await.unwrap();
        assert!(outcome.vulnerable);
        assert_eq!(outcome.evidence.as_deref(), Some("/.env: APP_ENV="));
    }

    #[tokio::test]
    async fn soft_404_html_pages_are_not_hits() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "<!DOCTYPE html><html><head><title>Home</title></head><body>\nAPP_ENV=x [core]</body></html>",
            ))
            .mount(&server)
            .await;

        let http = http();
        let base = server.uri();
        let target = Target { domain: "example.com", base_url: &base, homepage: None, http: &http };
        assert!(!check("env-file-exposure").execute(&target).await.unwrap().vulnerable);
        assert!(!check("git-config-exposure").execute(&target).await.unwrap().vulnerable);
    }

    #[tokio::test]
    async fn unreachable_target_is_an_error_not_a_verdict() {
        let http = http();
        let target = Target { domain: "example.com", base_url: "http://127.0.0.1:9", homepage: None, http: &http };
        assert!(check("git-head-exposure").execute(&target).await.is_err());
    }

    #[tokio::test]
    async fn sql_errors_are_compared_against_the_homepage() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string(
                "<p>You have an error in your SQL syntax; check the manual near ''1''' at line 1</p>",
            ))
            .mount(&server)
            .await;

        let http = http();
        let base = server.uri();
        let clean_home = HttpResponse { status: Some(200), body: "<p>welcome</p>".into(), ..HttpResponse::default() };
        let target = Target { domain: "example.com", base_url: &base, homepage: Some(&clean_home), http: &http };
        assert!(SqlErrorDisclosure.execute(&target).await.unwrap().vulnerable);

        let noisy_home = HttpResponse {
            status: Some(200),
            body: "forum post: you have an error in your sql syntax".into(),
            ..HttpResponse::default()
        };
        let target = Target { domain: "example.com", base_url: &base, homepage: Some(&noisy_home), http: &http };
        assert!(!SqlErrorDisclosure.execute(&target).await.unwrap().vulnerable);
    }

    #[tokio::test]
    async fn reflected_origin_is_flagged() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("origin", PROBE_ORIGIN))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Access-Control-Allow-Origin", PROBE_ORIGIN)
                    .insert_header("Access-Control-Allow-Credentials", "true"),
            )
            .mount(&server)
            .await;

        let http = http();
        let base = server.uri();
        let target = Target { domain: "example.com", base_url: &base, homepage: None, http: &http };
        let outcome = CorsMisconfiguration.execute(&target).await.unwrap();
        assert!(outcome.vulnerable);
        assert!(outcome.evidence.unwrap().contains("credentials: true"));
    }

    #[test]
    fn plain_wildcard_cors_is_acceptable() {
        let mut response = HttpResponse { status: Some(200), ..HttpResponse::default() };
        response.headers.insert("access-control-allow-origin".into(), "*".into());
        assert!(!assess_cors(&response).vulnerable);
        response.headers.insert("access-control-allow-credentials".into(), "true".into());
        assert!(assess_cors(&response).vulnerable);
    }

    #[tokio::test]
    async fn graphql_introspection_is_detected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"data":{"__schema":{"queryType":{"name":"Query"}}}}"#),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST")).respond_with(ResponseTemplate::new(404)).mount(&server).await;

        let http = http();
        let base = server.uri();
        let target = Target { domain: "example.com", base_url: &base, homepage: None, http: &http };
        assert!(GraphqlIntrospection.execute(&target).await.unwrap().vulnerable);
    }

    #[tokio::test]
    async fn security_txt_needs_a_contact_line() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/.well-known/security.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Contact: mailto:security@example.com\n"))
            .mount(&server)
            .await;

        let http = http();
        let base = server.uri();
        let target = Target { domain: "example.com", base_url: &base, homepage: None, http: &http };
        assert!(!SecurityTxtMissing.execute(&target).await.unwrap().vulnerable);
    }

    #[tokio::test]
    async fn source_maps_of_homepage_scripts_are_probed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/static/app.js.map"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"version":3,"mappings":"AAAA"}"#))
            .mount(&server)
            .await;

        let http = http();
        let base = server.uri();
        let homepage = HttpResponse {
            status: Some(200),
            body: r#"<script src="/static/app.js?v=3"></script><script src="https://cdn.other.net/lib.js"></script>"#.into(),
            ..HttpResponse::default()
        };
        let target = Target { domain: "example.com", base_url: &base, homepage: Some(&homepage), http: &http };
        let outcome = SourceMaps.execute(&target).await.unwrap();
        assert!(outcome.vulnerable);
        assert!(outcome.evidence.unwrap().ends_with("/static/app.js.map"));
    }
}
