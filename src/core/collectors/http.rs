// src/core/collectors/http.rs

use crate::core::config::ScanConfig;
use crate::core::error::CollectorError;
use reqwest::header::HeaderMap;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

/// A fully read HTTP response, detached from the connection.
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    pub url: String,
    /// `None` when the body came through a relay, which hides the origin status.
    pub status: Option<u16>,
    /// Lowercased header names. Repeated headers are joined with `", "`.
    pub headers: HashMap<String, String>,
    pub set_cookies: Vec<String>,
    pub body: String,
    pub via_relay: bool,
}

impl HttpResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    pub fn is_success(&self) -> bool {
        self.status.is_some_and(|s| (200..300).contains(&s))
    }
}

/// Shared HTTP access for every collector and check. One instance per scan.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    relays: Vec<String>,
    max_body_bytes: usize,
    max_json_bytes: usize,
}

impl HttpClient {
    pub fn new(config: &ScanConfig) -> Result<Self, CollectorError> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.request_timeout())
            .connect_timeout(Duration::from_secs(config.request_timeout_secs.min(5)))
            .build()?;
        Ok(Self {
            client,
            relays: config.relays.clone(),
            max_body_bytes: config.max_body_bytes,
            max_json_bytes: config.max_json_bytes,
        })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Sends a request and reads the body up to `max_body_bytes`, whatever
    /// the status code. The rest of a longer body is never downloaded.
    pub async fn send(&self, request: RequestBuilder) -> Result<HttpResponse, CollectorError> {
        let response = request.send().await.map_err(classify)?;
        let url = response.url().to_string();
        let status = response.status().as_u16();
        let (headers, set_cookies) = flatten_headers(response.headers());
        let (bytes, truncated) = read_capped(response, self.max_body_bytes).await?;
        let body = String::from_utf8_lossy(&bytes).into_owned();
        debug!(url = %url, status, bytes = bytes.len(), truncated, "HTTP response read.");
        Ok(HttpResponse { url, status: Some(status), headers, set_cookies, body, via_relay: false })
    }

    pub async fn get(&self, url: &str) -> Result<HttpResponse, CollectorError> {
        self.send(self.client.get(url)).await
    }

    /// Like [`HttpClient::get`] but treats any non-2xx status as an error.
    pub async fn get_ok(&self, url: &str) -> Result<HttpResponse, CollectorError> {
        let response = self.get(url).await?;
        match response.status {
            Some(s) if (200..300).contains(&s) => Ok(response),
            Some(s) => Err(CollectorError::Status(s)),
            None => Ok(response),
        }
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, CollectorError> {
        let response = self.client.get(url).query(query).send().await.map_err(classify)?;
        let status = response.status();
        if !status.is_success() {
            return Err(CollectorError::Status(status.as_u16()));
        }
        // Collaborator answers are parsed whole, so they get their own, larger limit.
        let (bytes, truncated) = read_capped(response, self.max_json_bytes).await?;
        if truncated {
            return Err(CollectorError::Parse(format!("JSON response exceeds {} bytes", self.max_json_bytes)));
        }
        debug!(url, bytes = bytes.len(), "JSON response read.");
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Fetches a page directly, then through each relay in order until one
    /// answers with a 2xx. Relays are never raced.
    pub async fn fetch_page(&self, url: &str) -> Result<HttpResponse, CollectorError> {
        match self.get_ok(url).await {
            Ok(response) => return Ok(response),
            Err(e) => warn!(url, error = %e, "Direct fetch failed, trying relays."),
        }

        for relay in &self.relays {
            let relay_url = relay_url(relay, url);
            match self.get_ok(&relay_url).await {
                Ok(response) => {
                    debug!(relay = %relay, "Relay fetch succeeded.");
                    return Ok(HttpResponse {
                        url: url.to_string(),
                        status: None,
                        headers: HashMap::new(),
                        set_cookies: Vec::new(),
                        body: response.body,
                        via_relay: true,
                    });
                }
                Err(e) => warn!(relay = %relay, error = %e, "Relay fetch failed."),
            }
        }
        Err(CollectorError::AllRelaysFailed)
    }
}

/// Reads the body chunk by chunk and stops once `limit` bytes are held.
///
/// # Returns
/// The bytes read and whether the body was longer than `limit`.
async fn read_capped(mut response: Response, limit: usize) -> Result<(Vec<u8>, bool), CollectorError> {
    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await.map_err(classify)? {
        let room = limit - body.len();
        if chunk.len() > room {
            body.extend_from_slice(&chunk[..room]);
            return Ok((body, true));
        }
        body.extend_from_slice(&chunk);
    }
    Ok((body, false))
}

fn relay_url(relay: &str, target: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(target.as_bytes()).collect();
    format!("{relay}{encoded}")
}

fn flatten_headers(headers: &HeaderMap) -> (HashMap<String, String>, Vec<String>) {
    let mut flat: HashMap<String, String> = HashMap::new();
    let mut cookies = Vec::new();
    for (name, value) in headers {
        let Ok(value) = value.to_str() else { continue };
        if *name == reqwest::header::SET_COOKIE {
            cookies.push(value.to_string());
        }
        flat.entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(value);
            })
            .or_insert_with(|| value.to_string());
    }
    (flat, cookies)
}

/// Separates timeouts from other transport failures so callers can log them
/// distinctly.
pub fn classify(e: reqwest::Error) -> CollectorError {
    if e.is_timeout() {
        CollectorError::Timeout
    } else {
        CollectorError::Http(e)
    }
}
