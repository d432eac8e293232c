//! Leaf certificate field extraction for domain snapshots.

use crate::snapshot::{DomainSnapshot, Status};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use sha1::{Digest, Sha1};
use ::time::OffsetDateTime;
use x509_parser::oid_registry::{
    OID_KEY_TYPE_EC_PUBLIC_KEY, OID_PKCS1_RSAENCRYPTION, OID_PKCS1_SHA1WITHRSA,
    OID_PKCS1_SHA256WITHRSA, OID_PKCS1_SHA384WITHRSA, OID_PKCS1_SHA512WITHRSA, OID_SIG_ED25519,
    OID_SIG_ECDSA_WITH_SHA256, OID_SIG_ECDSA_WITH_SHA384, OID_SIG_ECDSA_WITH_SHA512,
};
use x509_parser::prelude::*;
use x509_parser::public_key::PublicKey;

/// How close to `NotAfter` a certificate is considered "expiring".
pub const EXPIRY_WINDOW: ::time::Duration = ::time::Duration::days(30);

/// Classify a certificate's expiry timestamp against `now`.
///
/// `expired` iff `now > not_after`; `expires` iff `not_after` lies within
/// [`EXPIRY_WINDOW`] of `now`; `healthy` otherwise.
pub fn classify_expiry(not_after: OffsetDateTime, now: OffsetDateTime) -> Status {
    if now > not_after {
        return Status::Expired;
    }
    if now + EXPIRY_WINDOW > not_after {
        return Status::Expires;
    }
    Status::Healthy
}

/// Build a full snapshot from the peer's leaf certificate DER.
///
/// Returns `None` when the bytes do not parse as an X.509 certificate; the
/// prober turns that into a verification failure.
pub fn snapshot_from_leaf(
    cert_der: &rustls_pki_types::CertificateDer<'_>,
    remote_addr: std::net::SocketAddr,
    latency_ms: i64,
    now: OffsetDateTime,
) -> Option<DomainSnapshot> {
    let cert_bytes = cert_der.as_ref();
    let (_, x509) = X509Certificate::from_der(cert_bytes).ok()?;

    let issued = x509.validity().not_before.to_datetime();
    let expires = x509.validity().not_after.to_datetime();

    Some(DomainSnapshot {
        remote_addr: Some(remote_addr.to_string()),
        issuer: Some(issuer_organization(&x509)),
        signature_algo: Some(signature_algorithm_name(&x509).to_string()),
        public_key_algo: Some(public_key_algorithm_name(&x509).to_string()),
        public_key_type: Some(public_key_type(&x509).to_string()),
        encoded_pem: Some(pem_from_der(cert_bytes)),
        signature_sha1: Some(format!(
            "{:x}",
            Sha1::digest(x509.signature_value.data.as_ref())
        )),
        dns_names: Some(dns_names(&x509).join(", ")),
        key_usage: Some(key_usage_labels(&x509)),
        ext_key_usages: Some(ext_key_usage_labels(&x509)),
        issued: Some(issued),
        expires: Some(expires),
        latency_ms: Some(latency_ms),
        last_poll_at: now,
        error: None,
        status: classify_expiry(expires, now),
    })
}

/// First organization entry of the issuer; falls back to the issuer common
/// name, then `"Unknown"`, for certificates without one.
fn issuer_organization(x509: &X509Certificate<'_>) -> String {
    x509.issuer()
        .iter_organization()
        .next()
        .and_then(|attr| attr.as_str().ok())
        .or_else(|| {
            x509.issuer()
                .iter_common_name()
                .next()
                .and_then(|attr| attr.as_str().ok())
        })
        .unwrap_or("Unknown")
        .to_string()
}

fn dns_names(x509: &X509Certificate<'_>) -> Vec<String> {
    let mut names = Vec::new();
    if let Ok(extensions_map) = x509.extensions_map()
        && let Some(san_ext) =
            extensions_map.get(&x509_parser::oid_registry::OID_X509_EXT_SUBJECT_ALT_NAME)
        && let ParsedExtension::SubjectAlternativeName(san_general_names) =
            san_ext.parsed_extension()
    {
        for name in &san_general_names.general_names {
            if let GeneralName::DNSName(dns_name) = name {
                names.push(dns_name.to_string());
            }
        }
    }
    names
}

fn signature_algorithm_name(x509: &X509Certificate<'_>) -> &'static str {
    let oid = &x509.signature_algorithm.algorithm;
    if *oid == OID_PKCS1_SHA256WITHRSA {
        "SHA256-RSA"
    } else if *oid == OID_PKCS1_SHA384WITHRSA {
        "SHA384-RSA"
    } else if *oid == OID_PKCS1_SHA512WITHRSA {
        "SHA512-RSA"
    } else if *oid == OID_PKCS1_SHA1WITHRSA {
        "SHA1-RSA"
    } else if *oid == OID_SIG_ECDSA_WITH_SHA256 {
        "ECDSA-SHA256"
    } else if *oid == OID_SIG_ECDSA_WITH_SHA384 {
        "ECDSA-SHA384"
    } else if *oid == OID_SIG_ECDSA_WITH_SHA512 {
        "ECDSA-SHA512"
    } else if *oid == OID_SIG_ED25519 {
        "Ed25519"
    } else {
        "Unknown"
    }
}

fn public_key_algorithm_name(x509: &X509Certificate<'_>) -> &'static str {
    let oid = &x509.public_key().algorithm.algorithm;
    if *oid == OID_PKCS1_RSAENCRYPTION {
        "RSA"
    } else if *oid == OID_KEY_TYPE_EC_PUBLIC_KEY {
        "ECDSA"
    } else if *oid == OID_SIG_ED25519 {
        "Ed25519"
    } else {
        "Unknown"
    }
}

/// Key *type* as distinct from the SPKI algorithm identifier: derived from
/// the parsed key material, limited to RSA/ECDSA/Unknown.
fn public_key_type(x509: &X509Certificate<'_>) -> &'static str {
    match x509.public_key().parsed() {
        Ok(PublicKey::RSA(_)) => "RSA",
        Ok(PublicKey::EC(_)) => "ECDSA",
        _ => "Unknown",
    }
}

/// Render key-usage bits as a bracketed list of human-readable labels,
/// e.g. `[Digital Signature, Key Encipherment]`.
fn key_usage_labels(x509: &X509Certificate<'_>) -> String {
    let mut labels: Vec<&str> = Vec::new();
    if let Ok(Some(ext)) = x509.key_usage() {
        let usage = ext.value;
        if usage.digital_signature() {
            labels.push("Digital Signature");
        }
        if usage.non_repudiation() {
            labels.push("Content Commitment");
        }
        if usage.key_encipherment() {
            labels.push("Key Encipherment");
        }
        if usage.data_encipherment() {
            labels.push("Data Encipherment");
        }
        if usage.key_agreement() {
            labels.push("Key Agreement");
        }
        if usage.key_cert_sign() {
            labels.push("Certificate Signing");
        }
        if usage.crl_sign() {
            labels.push("CRL Signing");
        }
        if usage.encipher_only() {
            labels.push("Encipher Only");
        }
        if usage.decipher_only() {
            labels.push("Decipher Only");
        }
    }
    format!("[{}]", labels.join(", "))
}

/// Render extended key usages the same way as [`key_usage_labels`].
fn ext_key_usage_labels(x509: &X509Certificate<'_>) -> String {
    let mut labels: Vec<&str> = Vec::new();
    if let Ok(Some(ext)) = x509.extended_key_usage() {
        let eku = ext.value;
        if eku.any {
            labels.push("Any");
        }
        if eku.server_auth {
            labels.push("Server Authentication");
        }
        if eku.client_auth {
            labels.push("Client Authentication");
        }
        if eku.code_signing {
            labels.push("Code Signing");
        }
        if eku.email_protection {
            labels.push("Email Protection");
        }
        if eku.time_stamping {
            labels.push("Timestamping");
        }
        if eku.ocsp_signing {
            labels.push("OCSP Signing");
        }
        if !eku.other.is_empty() {
            labels.push("Unknown");
        }
    }
    format!("[{}]", labels.join(", "))
}

/// PEM-encode a raw DER certificate, 64 columns per base64 line.
fn pem_from_der(der: &[u8]) -> String {
    let encoded = BASE64.encode(der);
    let mut pem = String::with_capacity(encoded.len() + encoded.len() / 64 + 64);
    pem.push_str("-----BEGIN CERTIFICATE-----\n");
    for chunk in encoded.as_bytes().chunks(64) {
        // base64 output is always valid UTF-8
        pem.push_str(std::str::from_utf8(chunk).unwrap_or_default());
        pem.push('\n');
    }
    pem.push_str("-----END CERTIFICATE-----");
    pem
}
