//! Certificate snapshot data model and change detection.
//!
//! A [`DomainSnapshot`] is the immutable record produced by one probe of a
//! tracked domain. Snapshots are replaced wholesale on every poll; the differ
//! compares the previous and current snapshot to decide whether a domain's
//! certificate state changed in a way worth alerting on.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use time::OffsetDateTime;

/// Certificate health of a domain as observed by a single probe.
///
/// The wire/database representation is the fixed lowercase string set
/// `invalid | offline | healthy | expires | expired | unresponsive`; anything
/// else fails to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Valid certificate, expiry outside the 30-day window.
    Healthy,
    /// Valid certificate expiring within 30 days.
    Expires,
    /// `NotAfter` is in the past.
    Expired,
    /// Certificate verification failed (untrusted chain, hostname mismatch).
    Invalid,
    /// TCP/TLS connection refused or unreachable.
    Offline,
    /// The probe exceeded its deadline.
    Unresponsive,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown status value: {0}")]
pub struct ParseStatusError(pub String);

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Healthy => "healthy",
            Status::Expires => "expires",
            Status::Expired => "expired",
            Status::Invalid => "invalid",
            Status::Offline => "offline",
            Status::Unresponsive => "unresponsive",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "healthy" => Ok(Status::Healthy),
            "expires" => Ok(Status::Expires),
            "expired" => Ok(Status::Expired),
            "invalid" => Ok(Status::Invalid),
            "offline" => Ok(Status::Offline),
            "unresponsive" => Ok(Status::Unresponsive),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

/// Everything one probe captured about a domain's certificate and connection.
///
/// Invariant: `error` is set exactly when the certificate fields are absent;
/// a `healthy`/`expires`/`expired` status implies the certificate fields are
/// present and `error` is `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainSnapshot {
    pub remote_addr: Option<String>,
    pub issuer: Option<String>,
    pub signature_algo: Option<String>,
    pub public_key_algo: Option<String>,
    pub public_key_type: Option<String>,
    pub encoded_pem: Option<String>,
    pub signature_sha1: Option<String>,
    /// Subject alternative names, joined with `", "`.
    pub dns_names: Option<String>,
    /// Key-usage bits rendered as a bracketed label list.
    pub key_usage: Option<String>,
    /// Extended key usages rendered the same way.
    pub ext_key_usages: Option<String>,
    pub issued: Option<OffsetDateTime>,
    pub expires: Option<OffsetDateTime>,
    pub latency_ms: Option<i64>,
    pub last_poll_at: OffsetDateTime,
    pub error: Option<String>,
    pub status: Status,
}

impl DomainSnapshot {
    /// Snapshot for a probe that never produced a certificate.
    pub fn failure(
        status: Status,
        error: String,
        latency_ms: i64,
        polled_at: OffsetDateTime,
    ) -> Self {
        Self {
            remote_addr: None,
            issuer: None,
            signature_algo: None,
            public_key_algo: None,
            public_key_type: None,
            encoded_pem: None,
            signature_sha1: None,
            dns_names: None,
            key_usage: None,
            ext_key_usages: None,
            issued: None,
            expires: None,
            latency_ms: Some(latency_ms),
            last_poll_at: polled_at,
            error: Some(error),
            status,
        }
    }
}

/// Compare two snapshots of the same domain and report whether anything a
/// user cares about moved.
///
/// Tracked fields: remote address, issuer, public-key type, DNS names,
/// key-usage rendering, extended-key-usage rendering, expiry timestamp and
/// status. Absent fields compare as a distinct state: `None` vs `Some` is a
/// change, `None` vs `None` is not. Expiry is compared as a timestamp, never
/// as a formatted string.
pub fn has_changed(prev: &DomainSnapshot, current: &DomainSnapshot) -> bool {
    prev.remote_addr != current.remote_addr
        || prev.issuer != current.issuer
        || prev.public_key_type != current.public_key_type
        || prev.dns_names != current.dns_names
        || prev.key_usage != current.key_usage
        || prev.ext_key_usages != current.ext_key_usages
        || prev.expires != current.expires
        || prev.status != current.status
}
