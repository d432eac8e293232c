use thiserror::Error;

use crate::snapshot::Status;

/// Why a TLS probe failed to produce a certificate.
///
/// Never propagated out of the prober: each variant is rendered into the
/// resulting snapshot's status and error text.
#[derive(Debug, Error)]
pub enum ProbeFailure {
    #[error("deadline exceeded")]
    Timeout,
    #[error("certificate verification failed: {0}")]
    Verification(String),
    #[error("connection failed: {0}")]
    Network(String),
}

impl ProbeFailure {
    pub fn status(&self) -> Status {
        match self {
            ProbeFailure::Timeout => Status::Unresponsive,
            ProbeFailure::Verification(_) => Status::Invalid,
            ProbeFailure::Network(_) => Status::Offline,
        }
    }
}

/// Message composition failures. An unsupported locale is a hard error for
/// that single alert attempt; there is no silent fallback language.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ComposeError {
    #[error("unsupported language code {0:?}")]
    UnsupportedLocale(String),
}

/// A single channel's delivery failure. Logged by the dispatcher; never
/// aborts the polling cycle or other channels.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no linked {0} identity")]
    MissingIdentity(&'static str),
    #[error("invalid mail address: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("building mail failed: {0}")]
    Mail(#[from] lettre::error::Error),
    #[error("smtp delivery failed: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
    #[error("bot delivery failed: {0}")]
    Bot(#[from] teloxide::RequestError),
    #[error("webhook delivery failed: {0}")]
    Webhook(#[from] reqwest::Error),
}
