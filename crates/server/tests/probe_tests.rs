//! Probe behaviour against local listeners: offline classification,
//! deadline enforcement and certificate verification failures.

use certalert::probe::poll_addr;
use certalert::snapshot::Status;
use rcgen::{CertificateParams, KeyPair};
use rustls_pki_types::{PrivateKeyDer, PrivatePkcs8KeyDer};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::time::{Duration, Instant};

fn install_crypto_provider() {
    let _ = rustls::crypto::ring::default_provider().install_default();
}

/// Bind and immediately drop a listener to get an address nothing listens
/// on.
async fn refused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

#[tokio::test]
async fn refused_connection_is_offline_with_error_text() {
    install_crypto_provider();
    let addr = refused_addr().await;

    let snapshot = poll_addr("localhost", addr, Duration::from_secs(5)).await;

    assert_eq!(snapshot.status, Status::Offline);
    let error = snapshot.error.expect("offline snapshot must carry the error");
    assert!(error.contains("connection failed"), "unexpected error: {error}");
    assert!(snapshot.latency_ms.is_some());
    // failed probes never carry certificate fields
    assert!(snapshot.expires.is_none());
    assert!(snapshot.issuer.is_none());
    assert!(snapshot.encoded_pem.is_none());
}

#[tokio::test]
async fn silent_listener_times_out_as_unresponsive_within_the_deadline() {
    install_crypto_provider();
    // Accepting at the TCP level but never speaking TLS stalls the
    // handshake until the probe deadline.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hold = tokio::spawn(async move {
        let _conn = listener.accept().await;
        tokio::time::sleep(Duration::from_secs(30)).await;
    });

    let deadline = Duration::from_millis(500);
    let started = Instant::now();
    let snapshot = poll_addr("localhost", addr, deadline).await;
    let elapsed = started.elapsed();

    assert_eq!(snapshot.status, Status::Unresponsive);
    assert_eq!(snapshot.error.as_deref(), Some("deadline exceeded"));
    assert!(elapsed >= deadline, "probe returned before its deadline");
    assert!(
        elapsed < Duration::from_secs(5),
        "probe hung past its deadline: {elapsed:?}"
    );

    hold.abort();
}

#[tokio::test]
async fn untrusted_certificate_is_invalid() {
    install_crypto_provider();

    // Self-signed leaf: the webpki roots will reject it as untrusted.
    let key_pair = KeyPair::generate().expect("key generation");
    let params = CertificateParams::new(vec!["localhost".to_string()]).expect("params");
    let cert = params.self_signed(&key_pair).expect("self-signed cert");

    let cert_der = rustls_pki_types::CertificateDer::from(cert.der().to_vec());
    let key_der = PrivateKeyDer::from(PrivatePkcs8KeyDer::from(key_pair.serialize_der()));
    let server_config = rustls::ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(vec![cert_der], key_der)
        .expect("server config");

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let acceptor = tokio_rustls::TlsAcceptor::from(Arc::new(server_config));
    let server = tokio::spawn(async move {
        if let Ok((stream, _)) = listener.accept().await {
            // The client aborts the handshake on verification failure;
            // the server-side error is irrelevant here.
            let _ = acceptor.accept(stream).await;
        }
    });

    let snapshot = poll_addr("localhost", addr, Duration::from_secs(5)).await;

    assert_eq!(snapshot.status, Status::Invalid);
    let error = snapshot.error.expect("invalid snapshot must carry the error");
    assert!(
        error.contains("certificate verification failed"),
        "unexpected error: {error}"
    );
    assert!(snapshot.expires.is_none());

    server.abort();
}
