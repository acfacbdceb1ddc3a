// src/core/scanner/recon.rs

use crate::core::collectors::archive;
use crate::core::collectors::http::{HttpClient, HttpResponse};
use crate::core::error::CollectorError;
use crate::core::models::{PageSummary, RobotsInfo, WaybackSummary};
use futures::future::join_all;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::{debug, info, warn};

/// Directories probed for auto-generated indexes.
pub const OPEN_DIRECTORY_PATHS: &[&str] = &[
    "/uploads/", "/images/", "/img/", "/files/", "/backup/", "/backups/",
    "/assets/", "/static/", "/media/", "/downloads/", "/tmp/", "/logs/",
];

const RECENT_SNAPSHOTS: usize = 10;

static TITLE_SELECTOR: Lazy<Option<Selector>> = Lazy::new(|| Selector::parse("title").ok());

// --- Page fetch ---

/// Pulls the parts of the homepage the report keeps.
pub fn summarize_page(page: &HttpResponse) -> PageSummary {
    let document = Html::parse_document(&page.body);
    let title = TITLE_SELECTOR
        .as_ref()
        .and_then(|selector| document.select(selector).next())
        .map(|el| el.text().collect::<String>().split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|t| !t.is_empty());

    PageSummary {
        url: page.url.clone(),
        status: page.status,
        title,
        server: page.header("server").map(str::to_string),
        via_relay: page.via_relay,
    }
}

// --- Robots / Sitemap ---

/// Reads `Disallow`, `Allow` and `Sitemap` lines from a robots.txt body.
/// Directive names are case-insensitive; empty values and comments are ignored.
pub fn parse_robots(body: &str) -> RobotsInfo {
    let mut info = RobotsInfo::default();
    for line in body.lines() {
        let line = line.split('#').next().unwrap_or_default().trim();
        let Some((directive, value)) = line.split_once(':') else { continue };
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        match directive.trim().to_ascii_lowercase().as_str() {
            "disallow" => info.disallowed.push(value.to_string()),
            "allow" => info.allowed.push(value.to_string()),
            "sitemap" => info.sitemaps.push(value.to_string()),
            _ => {}
        }
    }
    info
}

pub fn count_sitemap_urls(body: &str) -> usize {
    body.matches("<loc>").count()
}

/// Fetches `/robots.txt` and the sitemap it names (or `/sitemap.xml`).
///
/// The robots file must answer 2xx; a missing sitemap only leaves the URL
/// count absent.
pub async fn collect_robots(http: &HttpClient, base_url: &str) -> Result<RobotsInfo, CollectorError> {
    let robots = http.get_ok(&format!("{base_url}/robots.txt")).await?;
    let mut info = parse_robots(&robots.body);

    let sitemap_url = info
        .sitemaps
        .first()
        .cloned()
        .unwrap_or_else(|| format!("{base_url}/sitemap.xml"));
    match http.get_ok(&sitemap_url).await {
        Ok(sitemap) => info.sitemap_url_count = Some(count_sitemap_urls(&sitemap.body)),
        Err(e) => debug!(url = %sitemap_url, error = %e, "Sitemap unavailable."),
    }

    info!(disallowed = info.disallowed.len(), sitemaps = info.sitemaps.len(), "Robots/sitemap collected.");
    Ok(info)
}

// --- Wayback ---

/// Summarizes every capture of the domain's homepage URLs.
pub async fn collect_wayback(
    http: &HttpClient,
    endpoint: &str,
    domain: &str,
    limit: usize,
) -> Result<WaybackSummary, CollectorError> {
    let mut snapshots = archive::query_index(http, endpoint, domain, limit, false).await?;
    snapshots.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));

    let summary = WaybackSummary {
        total_snapshots: snapshots.len(),
        first_capture: snapshots.first().map(|s| s.timestamp.clone()),
        last_capture: snapshots.last().map(|s| s.timestamp.clone()),
        recent: snapshots.iter().rev().take(RECENT_SNAPSHOTS).cloned().collect(),
    };
    info!(total = summary.total_snapshots, "Wayback summary collected.");
    Ok(summary)
}

// --- Open directories ---

fn is_directory_index(response: &HttpResponse) -> bool {
    response.status == Some(200)
        && (response.body.contains("<title>Index of /") || response.body.contains("<h1>Index of /"))
}

/// Probes each path `batch_size` at a time and returns those serving an
/// auto-generated index, in probe order.
pub async fn probe_open_directories(
    http: &HttpClient,
    base_url: &str,
    paths: &[&str],
    batch_size: usize,
) -> Vec<String> {
    let mut open = Vec::new();

    for batch in paths.chunks(batch_size.max(1)) {
        let probes = batch.iter().map(|path| async move {
            let result = http.get(&format!("{base_url}{path}")).await;
            (*path, result)
        });
        for (path, result) in join_all(probes).await {
            match result {
                Ok(response) if is_directory_index(&response) => {
                    info!(path, "Open directory listing found.");
                    open.push(path.to_string());
                }
                Ok(_) => {}
                Err(e) => debug!(path, error = %e, "Directory probe failed."),
            }
        }
    }

    if open.is_empty() {
        debug!("No open directories found.");
    } else {
        warn!(count = open.len(), "Directories with listings enabled.");
    }
    open
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ScanConfig;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn http() -> HttpClient {
        HttpClient::new(&ScanConfig { request_timeout_secs: 2, ..ScanConfig::default() }).unwrap()
    }

    #[test]
    fn robots_directives_are_collected() {
        let body = "User-agent: *\nDisallow: /admin/ # staff only\nDISALLOW: /tmp\nAllow: /public\nDisallow:\nSitemap: https://example.com/sitemap_index.xml\n";
        let info = parse_robots(body);
        assert_eq!(info.disallowed, vec!["/admin/", "/tmp"]);
        assert_eq!(info.allowed, vec!["/public"]);
        assert_eq!(info.sitemaps, vec!["https://example.com/sitemap_index.xml"]);
        assert_eq!(info.sitemap_url_count, None);
    }

    #[test]
    fn page_title_is_normalized() {
        let page = HttpResponse {
            url: "https://example.com/".into(),
            status: Some(200),
            body: "<html><head><title>\n  Example   Domain\n</title></head></html>".into(),
            ..HttpResponse::default()
        };
        let summary = summarize_page(&page);
        assert_eq!(summary.title.as_deref(), Some("Example Domain"));
        assert_eq!(summary.server, None);
        assert!(!summary.via_relay);
    }

    #[tokio::test]
    async fn robots_and_default_sitemap_are_fetched() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private\n"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/sitemap.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "<urlset><url><loc>https://example.com/</loc></url><url><loc>https://example.com/a</loc></url></urlset>",
            ))
            .mount(&server)
            .await;

        let info = collect_robots(&http(), &server.uri()).await.unwrap();
        assert_eq!(info.disallowed, vec!["/private"]);
        assert_eq!(info.sitemap_url_count, Some(2));
    }

    #[tokio::test]
    async fn missing_robots_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET")).respond_with(ResponseTemplate::new(404)).mount(&server).await;
        assert!(collect_robots(&http(), &server.uri()).await.is_err());
    }

    #[tokio::test]
    async fn wayback_summary_orders_captures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("url", "example.com"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"[["timestamp","original","statuscode","mimetype"],
                    ["20210101000000","http://example.com/","200","text/html"],
                    ["20150101000000","http://example.com/","301","text/html"],
                    ["20230101000000","https://example.com/","200","text/html"]]"#,
            ))
            .mount(&server)
            .await;

        let summary = collect_wayback(&http(), &server.uri(), "example.com", 100).await.unwrap();
        assert_eq!(summary.total_snapshots, 3);
        assert_eq!(summary.first_capture.as_deref(), Some("20150101000000"));
        assert_eq!(summary.last_capture.as_deref(), Some("20230101000000"));
        assert_eq!(summary.recent[0].timestamp, "20230101000000");
    }

    #[tokio::test]
    async fn open_directories_are_reported_in_probe_order() {
        let server = MockServer::start().await;
        for dir in ["/backup/", "/uploads/"] {
            Mock::given(method("GET"))
                .and(path(dir))
                .respond_with(ResponseTemplate::new(200).set_body_string(format!(
                    "<html><head><title>Index of {dir}</title></head></html>"
                )))
                .mount(&server)
                .await;
        }
        Mock::given(method("GET")).respond_with(ResponseTemplate::new(403)).mount(&server).await;

        let open = probe_open_directories(&http(), &server.uri(), OPEN_DIRECTORY_PATHS, 4).await;
        assert_eq!(open, vec!["/uploads/", "/backup/"]);
    }
}
