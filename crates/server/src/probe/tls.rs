use once_cell::sync::OnceCell;
use rustls::{ClientConfig, RootCertStore};
use std::sync::Arc;

/// Shared TLS client configuration to avoid recreating it for every probe.
static TLS_CONFIG: OnceCell<Arc<ClientConfig>> = OnceCell::new();

/// Get a shared TLS client configuration with the webpki default roots.
/// This avoids rebuilding the root certificate store on every connection.
pub fn shared_tls_config() -> Arc<ClientConfig> {
    TLS_CONFIG
        .get_or_init(|| {
            let mut root_cert_store = RootCertStore::empty();
            root_cert_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

            let config = ClientConfig::builder()
                .with_root_certificates(root_cert_store)
                .with_no_client_auth();

            Arc::new(config)
        })
        .clone()
}
