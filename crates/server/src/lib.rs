//! Periodic TLS certificate health monitoring for tracked domains.
//!
//! The service probes every tracked domain on a schedule, compares each new
//! certificate snapshot against the previous one, and alerts the owning user
//! about imminent expiry or meaningful changes over their enabled
//! notification channels.

use std::sync::Arc;

use lettre::{AsyncSmtpTransport, Tokio1Executor};
use sea_orm::DatabaseConnection;
use teloxide::Bot;

use crate::config::AppConfig;

pub mod alerts;
pub mod config;
pub mod entity;
pub mod error;
pub mod notify;
pub mod probe;
pub mod scheduler;
pub mod snapshot;
pub mod storage;

#[derive(Clone)]
pub struct AppResources {
    pub db: Arc<DatabaseConnection>,
    pub mailer: Arc<AsyncSmtpTransport<Tokio1Executor>>,
    pub bot: Bot,
    pub config: Arc<AppConfig>,
}
