//! TLS probing of tracked domains.
//!
//! One probe opens a TLS connection to `domain:443`, extracts the peer's
//! leaf certificate into a [`DomainSnapshot`] and classifies the outcome.
//! The probe never blocks past its deadline and never retries; retry policy
//! belongs to the scheduler's next tick.

pub mod certificate;
pub mod tls;

pub use certificate::{EXPIRY_WINDOW, classify_expiry};

use crate::error::ProbeFailure;
use crate::snapshot::DomainSnapshot;
use rustls_pki_types::{CertificateDer, ServerName};
use std::net::SocketAddr;
use time::OffsetDateTime;
use tokio::net::TcpStream;
use tokio::time::{Duration, Instant, timeout};
use tokio_rustls::TlsConnector;

/// Probe `domain:443`, racing the whole connect + handshake against
/// `deadline`. Always returns a snapshot; failures are classified into the
/// snapshot's status (`invalid`, `offline` or `unresponsive`).
#[tracing::instrument(name = "poll_domain", skip(deadline), fields(domain = %domain))]
pub async fn poll_domain(domain: &str, deadline: Duration) -> DomainSnapshot {
    poll(domain, None, deadline).await
}

/// Same probe against an explicit socket address, with `domain` used only
/// for SNI and certificate verification. The periodic and on-demand sweeps
/// go through [`poll_domain`]; this entry point exists so the probe can be
/// exercised against local listeners.
pub async fn poll_addr(domain: &str, addr: SocketAddr, deadline: Duration) -> DomainSnapshot {
    poll(domain, Some(addr), deadline).await
}

async fn poll(domain: &str, addr: Option<SocketAddr>, deadline: Duration) -> DomainSnapshot {
    let started = Instant::now();

    let outcome = match timeout(deadline, handshake(domain, addr)).await {
        Ok(outcome) => outcome,
        Err(_elapsed) => Err(ProbeFailure::Timeout),
    };
    let latency_ms = started.elapsed().as_millis() as i64;
    let now = OffsetDateTime::now_utc();

    match outcome {
        Ok((remote_addr, leaf)) => {
            match certificate::snapshot_from_leaf(&leaf, remote_addr, latency_ms, now) {
                Some(snapshot) => snapshot,
                None => {
                    let failure =
                        ProbeFailure::Verification("peer certificate failed to parse".to_string());
                    DomainSnapshot::failure(failure.status(), failure.to_string(), latency_ms, now)
                }
            }
        }
        Err(failure) => {
            tracing::debug!(
                domain = %domain,
                status = %failure.status(),
                error = %failure,
                "probe failed"
            );
            DomainSnapshot::failure(failure.status(), failure.to_string(), latency_ms, now)
        }
    }
}

/// TCP connect + TLS handshake, returning the remote address and the peer's
/// leaf certificate. The connection is dropped (closed) on every exit path.
async fn handshake(
    domain: &str,
    addr: Option<SocketAddr>,
) -> Result<(SocketAddr, CertificateDer<'static>), ProbeFailure> {
    let stream = match addr {
        Some(addr) => TcpStream::connect(addr).await,
        // DNS failures surface here and classify as network errors.
        None => TcpStream::connect((domain, 443u16)).await,
    }
    .map_err(|e| ProbeFailure::Network(e.to_string()))?;

    let remote_addr = stream
        .peer_addr()
        .map_err(|e| ProbeFailure::Network(e.to_string()))?;

    let server_name = ServerName::try_from(domain.to_string())
        .map_err(|_| ProbeFailure::Network(format!("invalid server name: {domain}")))?;

    let connector = TlsConnector::from(tls::shared_tls_config());
    let tls_stream = connector
        .connect(server_name, stream)
        .await
        .map_err(classify_handshake_error)?;

    let (_, connection) = tls_stream.get_ref();
    let leaf = connection
        .peer_certificates()
        .and_then(|certs| certs.first())
        .cloned()
        .map(CertificateDer::into_owned)
        .ok_or_else(|| ProbeFailure::Network("peer presented no certificate".to_string()))?;

    Ok((remote_addr, leaf))
}

/// A handshake error is a verification failure when rustls rejected the
/// certificate; everything else (refused, reset, no route) is a network
/// failure.
fn classify_handshake_error(err: std::io::Error) -> ProbeFailure {
    if let Some(tls_err) = err
        .get_ref()
        .and_then(|inner| inner.downcast_ref::<rustls::Error>())
        && matches!(tls_err, rustls::Error::InvalidCertificate(_))
    {
        return ProbeFailure::Verification(tls_err.to_string());
    }
    ProbeFailure::Network(err.to_string())
}
