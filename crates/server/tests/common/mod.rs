//! Shared test fixtures: an in-memory storage backend, snapshot builders
//! and a recording notification channel.

use async_trait::async_trait;
use certalert::alerts::AlertMessage;
use certalert::error::DispatchError;
use certalert::notify::ChannelSender;
use certalert::snapshot::{DomainSnapshot, Status};
use certalert::storage::{ChannelIdentity, NotificationPreferences, Storage, TrackedDomain};
use sea_orm::DbErr;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use time::{Duration, OffsetDateTime};

/// In-memory [`Storage`] used by the scheduler and alert engine tests.
#[derive(Default)]
pub struct MemoryStorage {
    pub domains: Mutex<Vec<TrackedDomain>>,
    pub preferences: Mutex<HashMap<i64, NotificationPreferences>>,
    pub identities: Mutex<HashMap<i64, ChannelIdentity>>,
    pub cooldowns: Mutex<HashMap<i64, OffsetDateTime>>,
    /// Every `update_snapshot` call, in order.
    pub snapshot_updates: Mutex<Vec<(i64, DomainSnapshot)>>,
    /// Every `update_last_alert_time` call, in order.
    pub alert_times: Mutex<Vec<(i64, i64, OffsetDateTime)>>,
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn list_tracked_domains(&self) -> Result<Vec<TrackedDomain>, DbErr> {
        Ok(self.domains.lock().unwrap().clone())
    }

    async fn list_user_domains(&self, user_id: i64) -> Result<Vec<TrackedDomain>, DbErr> {
        Ok(self
            .domains
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn update_snapshot(
        &self,
        domain_id: i64,
        snapshot: &DomainSnapshot,
    ) -> Result<(), DbErr> {
        self.snapshot_updates
            .lock()
            .unwrap()
            .push((domain_id, snapshot.clone()));
        let mut domains = self.domains.lock().unwrap();
        if let Some(row) = domains.iter_mut().find(|d| d.id == domain_id) {
            row.snapshot = Some(snapshot.clone());
        }
        Ok(())
    }

    async fn notification_preferences(
        &self,
        user_id: i64,
    ) -> Result<NotificationPreferences, DbErr> {
        Ok(self
            .preferences
            .lock()
            .unwrap()
            .get(&user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn channel_identity(&self, user_id: i64) -> Result<Option<ChannelIdentity>, DbErr> {
        Ok(self.identities.lock().unwrap().get(&user_id).cloned())
    }

    async fn update_last_alert_time(
        &self,
        user_id: i64,
        domain_id: i64,
        at: OffsetDateTime,
    ) -> Result<(), DbErr> {
        self.alert_times
            .lock()
            .unwrap()
            .push((user_id, domain_id, at));
        let mut domains = self.domains.lock().unwrap();
        if let Some(row) = domains
            .iter_mut()
            .find(|d| d.id == domain_id && d.user_id == user_id)
        {
            row.last_alert_time = Some(at);
        }
        Ok(())
    }

    async fn user_cooldown(&self, user_id: i64) -> Result<Option<OffsetDateTime>, DbErr> {
        Ok(self.cooldowns.lock().unwrap().get(&user_id).copied())
    }

    async fn set_user_cooldown(&self, user_id: i64, at: OffsetDateTime) -> Result<(), DbErr> {
        self.cooldowns.lock().unwrap().insert(user_id, at);
        Ok(())
    }
}

/// A healthy-looking snapshot for a certificate expiring `expires_in` from
/// now.
pub fn snapshot_expiring_in(expires_in: Duration) -> DomainSnapshot {
    let now = OffsetDateTime::now_utc();
    let expires = now + expires_in;
    let status = if now > expires {
        Status::Expired
    } else if now + Duration::days(30) > expires {
        Status::Expires
    } else {
        Status::Healthy
    };
    DomainSnapshot {
        remote_addr: Some("93.184.216.34:443".to_string()),
        issuer: Some("DigiCert Inc".to_string()),
        signature_algo: Some("SHA256-RSA".to_string()),
        public_key_algo: Some("RSA".to_string()),
        public_key_type: Some("RSA".to_string()),
        encoded_pem: Some("-----BEGIN CERTIFICATE-----\nMIIB\n-----END CERTIFICATE-----".into()),
        signature_sha1: Some("da39a3ee5e6b4b0d3255bfef95601890afd80709".to_string()),
        dns_names: Some("example.com, www.example.com".to_string()),
        key_usage: Some("[Digital Signature, Key Encipherment]".to_string()),
        ext_key_usages: Some("[Server Authentication, Client Authentication]".to_string()),
        issued: Some(now - Duration::days(30)),
        expires: Some(expires),
        latency_ms: Some(42),
        last_poll_at: now,
        error: None,
        status,
    }
}

pub fn tracked(
    id: i64,
    user_id: i64,
    domain_name: &str,
    snapshot: Option<DomainSnapshot>,
) -> TrackedDomain {
    TrackedDomain {
        id,
        user_id,
        domain_name: domain_name.to_string(),
        snapshot,
        last_alert_time: None,
    }
}

pub fn identity_with_lang(lang: &str) -> ChannelIdentity {
    ChannelIdentity {
        email: "owner@example.com".to_string(),
        chat_id: Some(4242),
        lang: lang.to_string(),
        webhook_url: None,
    }
}

/// Which preference toggle a [`RecordingSender`] answers to.
#[derive(Clone, Copy)]
pub enum FakeChannel {
    Email,
    Telegram,
    Webhook,
}

/// Channel fake that records every delivery; can simulate failures and
/// missing identities.
pub struct RecordingSender {
    pub which: FakeChannel,
    pub sent: Arc<Mutex<Vec<AlertMessage>>>,
    pub fail: bool,
    pub missing_identity: bool,
}

impl RecordingSender {
    pub fn new(which: FakeChannel) -> (Self, Arc<Mutex<Vec<AlertMessage>>>) {
        let sent = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                which,
                sent: sent.clone(),
                fail: false,
                missing_identity: false,
            },
            sent,
        )
    }
}

#[async_trait]
impl ChannelSender for RecordingSender {
    fn channel_name(&self) -> &'static str {
        match self.which {
            FakeChannel::Email => "email",
            FakeChannel::Telegram => "telegram",
            FakeChannel::Webhook => "webhook",
        }
    }

    fn enabled(&self, prefs: &NotificationPreferences) -> bool {
        match self.which {
            FakeChannel::Email => prefs.email_alert,
            FakeChannel::Telegram => prefs.telegram_alert,
            FakeChannel::Webhook => prefs.webhook_alert,
        }
    }

    async fn send(
        &self,
        _identity: &ChannelIdentity,
        alert: &AlertMessage,
    ) -> Result<(), DispatchError> {
        if self.missing_identity {
            return Err(DispatchError::MissingIdentity("telegram"));
        }
        if self.fail {
            let parse_failure = "not an address"
                .parse::<lettre::Address>()
                .expect_err("address must not parse");
            return Err(DispatchError::Address(parse_failure));
        }
        self.sent.lock().unwrap().push(alert.clone());
        Ok(())
    }
}
