// src/core/scanner/vuln_scanner/tls.rs

use super::{Check, Outcome, Target};
use crate::core::error::CollectorError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use native_tls::TlsConnector;
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;
use tokio::task::spawn_blocking;
use tracing::{debug, error, info};
use url::Url;
use x509_parser::prelude::*;

/// Certificates closer than this to expiry are reported.
const EXPIRY_WARNING_DAYS: i64 = 14;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Validity window of the certificate served on port 443.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CertificateWindow {
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
}

pub struct CertificateValidity;

#[async_trait]
impl Check for CertificateValidity {
    fn id(&self) -> &'static str {
        "tls-certificate-invalid"
    }

    async fn execute(&self, target: &Target<'_>) -> Result<Outcome, CollectorError> {
        let url = Url::parse(target.base_url).map_err(|e| CollectorError::Parse(e.to_string()))?;
        if url.scheme() != "https" {
            return Err(CollectorError::Tls("target is not served over https".to_string()));
        }
        let host = url
            .host_str()
            .ok_or_else(|| CollectorError::Tls("target has no host".to_string()))?
            .to_string();
        let port = url.port_or_known_default().unwrap_or(443);

        debug!(host = %host, "Spawning blocking task for TLS connection.");
        let window = spawn_blocking(move || fetch_certificate_window(&host, port))
            .await
            .unwrap_or_else(|e| {
                error!(panic = %e, "Blocking TLS task panicked.");
                Err(CollectorError::Tls(format!("task panicked: {e}")))
            })?;

        Ok(assess_validity(&window, Utc::now()))
    }
}

/// Connects, completes a handshake that accepts any certificate, and reads
/// the peer certificate's validity window.
fn fetch_certificate_window(host: &str, port: u16) -> Result<CertificateWindow, CollectorError> {
    // Expired certificates must still be readable.
    let connector = TlsConnector::builder()
        .danger_accept_invalid_certs(true)
        .build()
        .map_err(|e| CollectorError::Tls(format!("connector: {e}")))?;

    let address = (host, port)
        .to_socket_addrs()
        .map_err(|e| CollectorError::Dns(e.to_string()))?
        .next()
        .ok_or_else(|| CollectorError::Dns(format!("{host} has no address")))?;

    debug!(host, %address, "Connecting TCP stream.");
    let stream = TcpStream::connect_timeout(&address, CONNECT_TIMEOUT)
        .map_err(|e| CollectorError::Tls(format!("tcp connect: {e}")))?;
    stream
        .set_read_timeout(Some(CONNECT_TIMEOUT))
        .and_then(|_| stream.set_write_timeout(Some(CONNECT_TIMEOUT)))
        .map_err(|e| CollectorError::Tls(e.to_string()))?;

    debug!(host, "Performing TLS handshake.");
    let stream = connector
        .connect(host, stream)
        .map_err(|e| CollectorError::Tls(format!("handshake: {e}")))?;

    let cert = stream
        .peer_certificate()
        .map_err(|e| CollectorError::Tls(e.to_string()))?
        .ok_or_else(|| CollectorError::Tls("no peer certificate".to_string()))?;
    let der = cert.to_der().map_err(|e| CollectorError::Tls(e.to_string()))?;
    let (_, x509) = parse_x509_certificate(&der).map_err(|e| CollectorError::Parse(e.to_string()))?;

    info!(subject = %x509.subject(), issuer = %x509.issuer(), "Parsed peer certificate.");
    let validity = x509.validity();
    Ok(CertificateWindow {
        not_before: asn1_time_to_chrono_utc(&validity.not_before),
        not_after: asn1_time_to_chrono_utc(&validity.not_after),
    })
}

fn asn1_time_to_chrono_utc(time: &ASN1Time) -> DateTime<Utc> {
    DateTime::from_timestamp(time.timestamp(), 0).unwrap_or_default()
}

/// Flags certificates that are expired, not yet valid, or expiring within
/// [`EXPIRY_WARNING_DAYS`].
pub fn assess_validity(window: &CertificateWindow, now: DateTime<Utc>) -> Outcome {
    if now < window.not_before {
        return Outcome::found(format!("certificate not valid before {}", window.not_before.format("%Y-%m-%d")));
    }
    if now > window.not_after {
        return Outcome::found(format!("certificate expired on {}", window.not_after.format("%Y-%m-%d")));
    }
    let days_left = window.not_after.signed_duration_since(now).num_days();
    if days_left < EXPIRY_WARNING_DAYS {
        debug!(days_left, "Certificate is expiring soon.");
        return Outcome::found(format!("certificate expires in {days_left} days"));
    }
    Outcome::clean()
}
