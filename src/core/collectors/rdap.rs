// src/core/collectors/rdap.rs

use crate::core::collectors::http::HttpClient;
use crate::core::error::CollectorError;
use crate::core::models::WhoisInfo;
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

#[derive(Debug, Deserialize)]
struct RdapDomain {
    #[serde(default)]
    events: Vec<RdapEvent>,
    #[serde(default)]
    entities: Vec<RdapEntity>,
    #[serde(default)]
    nameservers: Vec<RdapNameserver>,
    #[serde(default)]
    status: Vec<String>,
    #[serde(rename = "secureDNS")]
    secure_dns: Option<RdapSecureDns>,
}

#[derive(Debug, Deserialize)]
struct RdapEvent {
    #[serde(rename = "eventAction")]
    action: String,
    #[serde(rename = "eventDate")]
    date: String,
}

#[derive(Debug, Deserialize)]
struct RdapEntity {
    #[serde(default)]
    roles: Vec<String>,
    #[serde(rename = "vcardArray")]
    vcard: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct RdapNameserver {
    #[serde(rename = "ldhName")]
    name: String,
}

#[derive(Debug, Deserialize)]
struct RdapSecureDns {
    #[serde(rename = "delegationSigned", default)]
    delegation_signed: bool,
}

/// Fetches `<endpoint>/domain/<domain>` and condenses the RDAP document.
pub async fn lookup_registration(
    http: &HttpClient,
    endpoint: &str,
    domain: &str,
) -> Result<WhoisInfo, CollectorError> {
    let url = format!("{}/domain/{}", endpoint.trim_end_matches('/'), domain);
    let document: RdapDomain = http.get_json(&url, &[]).await?;

    let event = |action: &str| {
        document
            .events
            .iter()
            .find(|e| e.action == action)
            .map(|e| e.date.clone())
    };

    let registrar = document
        .entities
        .iter()
        .find(|e| e.roles.iter().any(|r| r == "registrar"))
        .and_then(|e| e.vcard.as_ref())
        .and_then(vcard_full_name);

    let info = WhoisInfo {
        registrar,
        created: event("registration"),
        expires: event("expiration"),
        updated: event("last changed"),
        nameservers: document.nameservers.iter().map(|n| n.name.to_lowercase()).collect(),
        status: document.status.clone(),
        dnssec: document.secure_dns.as_ref().is_some_and(|s| s.delegation_signed),
    };
    info!(domain, registrar = ?info.registrar, "RDAP lookup finished.");
    Ok(info)
}

/// Pulls the `fn` property out of a jCard: `["vcard", [["fn", {}, "text", "Name"], ...]]`.
fn vcard_full_name(vcard: &Value) -> Option<String> {
    vcard
        .get(1)?
        .as_array()?
        .iter()
        .find(|prop| prop.get(0).and_then(Value::as_str) == Some("fn"))
        .and_then(|prop| prop.get(3))
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ScanConfig;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn condenses_rdap_document() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/domain/example.com"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ldhName": "EXAMPLE.COM",
                "events": [
                    {"eventAction": "registration", "eventDate": "1995-08-14T04:00:00Z"},
                    {"eventAction": "expiration", "eventDate": "2026-08-13T04:00:00Z"},
                    {"eventAction": "last changed", "eventDate": "2025-08-14T07:01:44Z"}
                ],
                "entities": [{
                    "roles": ["registrar"],
                    "vcardArray": ["vcard", [["version", {}, "text", "4.0"], ["fn", {}, "text", "RESERVED-Internet Assigned Numbers Authority"]]]
                }],
                "nameservers": [{"ldhName": "A.IANA-SERVERS.NET"}, {"ldhName": "B.IANA-SERVERS.NET"}],
                "status": ["client delete prohibited"],
                "secureDNS": {"delegationSigned": true}
            })))
            .mount(&server)
            .await;

        let http = HttpClient::new(&ScanConfig::default()).unwrap();
        let info = lookup_registration(&http, &server.uri(), "example.com").await.unwrap();

        assert_eq!(info.registrar.as_deref(), Some("RESERVED-Internet Assigned Numbers Authority"));
        assert_eq!(info.created.as_deref(), Some("1995-08-14T04:00:00Z"));
        assert_eq!(info.expires.as_deref(), Some("2026-08-13T04:00:00Z"));
        assert_eq!(info.nameservers, vec!["a.iana-servers.net", "b.iana-servers.net"]);
        assert!(info.dnssec);
    }

    #[tokio::test]
    async fn missing_domain_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let http = HttpClient::new(&ScanConfig::default()).unwrap();
        assert!(lookup_registration(&http, &server.uri(), "example.com").await.is_err());
    }
}
