//! Storage interface consumed by the polling core.
//!
//! The core never owns user or channel records: it reads preferences and
//! identities, and writes back only snapshots, alert timestamps and the
//! on-demand cooldown. [`SeaOrmStorage`] is the production implementation;
//! tests substitute an in-memory one.

use crate::entity::{channel_identity, notification_preference, tracked_domain, user};
use crate::snapshot::{DomainSnapshot, Status};
use async_trait::async_trait;
use sea_orm::{
    ActiveValue, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    sea_query::Expr,
};
use std::str::FromStr;
use std::sync::Arc;
use time::OffsetDateTime;

/// A (user, domain-name) tracking relation with its most recent snapshot.
#[derive(Debug, Clone)]
pub struct TrackedDomain {
    pub id: i64,
    pub user_id: i64,
    pub domain_name: String,
    /// None until the domain has been polled at least once.
    pub snapshot: Option<DomainSnapshot>,
    pub last_alert_time: Option<OffsetDateTime>,
}

/// Per-user alerting preferences.
#[derive(Debug, Clone)]
pub struct NotificationPreferences {
    pub expiry_alerts: bool,
    pub change_alert: bool,
    pub before_days: i32,
    pub email_alert: bool,
    pub telegram_alert: bool,
    pub webhook_alert: bool,
}

impl Default for NotificationPreferences {
    /// Matches the row defaults created alongside an account: expiry and
    /// change alerts over email on, other channels opt-in.
    fn default() -> Self {
        Self {
            expiry_alerts: true,
            change_alert: true,
            before_days: 7,
            email_alert: true,
            telegram_alert: false,
            webhook_alert: false,
        }
    }
}

/// Where a user's alerts can be delivered. Assembled from the account row
/// and the linked chat identity; read-only to this core.
#[derive(Debug, Clone)]
pub struct ChannelIdentity {
    pub email: String,
    pub chat_id: Option<i64>,
    pub lang: String,
    pub webhook_url: Option<String>,
}

#[async_trait]
pub trait Storage: Send + Sync {
    /// All tracked domains, system-wide. Used by the periodic sweep.
    async fn list_tracked_domains(&self) -> Result<Vec<TrackedDomain>, DbErr>;

    /// The tracked domains of one user. Used by the on-demand check.
    async fn list_user_domains(&self, user_id: i64) -> Result<Vec<TrackedDomain>, DbErr>;

    /// Replace a domain's snapshot wholesale.
    async fn update_snapshot(&self, domain_id: i64, snapshot: &DomainSnapshot)
    -> Result<(), DbErr>;

    async fn notification_preferences(
        &self,
        user_id: i64,
    ) -> Result<NotificationPreferences, DbErr>;

    /// None when the user record does not exist.
    async fn channel_identity(&self, user_id: i64) -> Result<Option<ChannelIdentity>, DbErr>;

    async fn update_last_alert_time(
        &self,
        user_id: i64,
        domain_id: i64,
        at: OffsetDateTime,
    ) -> Result<(), DbErr>;

    /// When the user last completed an on-demand check.
    async fn user_cooldown(&self, user_id: i64) -> Result<Option<OffsetDateTime>, DbErr>;

    async fn set_user_cooldown(&self, user_id: i64, at: OffsetDateTime) -> Result<(), DbErr>;
}

/// SeaORM-backed [`Storage`] implementation.
#[derive(Clone)]
pub struct SeaOrmStorage {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmStorage {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Storage for SeaOrmStorage {
    async fn list_tracked_domains(&self) -> Result<Vec<TrackedDomain>, DbErr> {
        tracked_domain::Entity::find()
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(domain_from_row)
            .collect()
    }

    async fn list_user_domains(&self, user_id: i64) -> Result<Vec<TrackedDomain>, DbErr> {
        tracked_domain::Entity::find()
            .filter(tracked_domain::Column::UserId.eq(user_id))
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(domain_from_row)
            .collect()
    }

    async fn update_snapshot(
        &self,
        domain_id: i64,
        snapshot: &DomainSnapshot,
    ) -> Result<(), DbErr> {
        use sea_orm::ActiveModelTrait;

        let update = tracked_domain::ActiveModel {
            id: ActiveValue::Unchanged(domain_id),
            remote_addr: ActiveValue::Set(snapshot.remote_addr.clone()),
            issuer: ActiveValue::Set(snapshot.issuer.clone()),
            signature_algo: ActiveValue::Set(snapshot.signature_algo.clone()),
            public_key_algo: ActiveValue::Set(snapshot.public_key_algo.clone()),
            public_key_type: ActiveValue::Set(snapshot.public_key_type.clone()),
            encoded_pem: ActiveValue::Set(snapshot.encoded_pem.clone()),
            signature_sha1: ActiveValue::Set(snapshot.signature_sha1.clone()),
            dns_names: ActiveValue::Set(snapshot.dns_names.clone()),
            key_usage: ActiveValue::Set(snapshot.key_usage.clone()),
            ext_key_usages: ActiveValue::Set(snapshot.ext_key_usages.clone()),
            issued: ActiveValue::Set(snapshot.issued),
            expires: ActiveValue::Set(snapshot.expires),
            latency_ms: ActiveValue::Set(snapshot.latency_ms),
            last_poll_at: ActiveValue::Set(Some(snapshot.last_poll_at)),
            error: ActiveValue::Set(snapshot.error.clone()),
            status: ActiveValue::Set(Some(snapshot.status.to_string())),
            ..Default::default()
        };
        update.update(self.db.as_ref()).await?;
        Ok(())
    }

    async fn notification_preferences(
        &self,
        user_id: i64,
    ) -> Result<NotificationPreferences, DbErr> {
        let row = notification_preference::Entity::find_by_id(user_id)
            .one(self.db.as_ref())
            .await?;
        Ok(match row {
            Some(row) => NotificationPreferences {
                expiry_alerts: row.expiry_alerts,
                change_alert: row.change_alert,
                before_days: row.before_days,
                email_alert: row.email_alert,
                telegram_alert: row.telegram_alert,
                webhook_alert: row.webhook_alert,
            },
            None => NotificationPreferences::default(),
        })
    }

    async fn channel_identity(&self, user_id: i64) -> Result<Option<ChannelIdentity>, DbErr> {
        let Some(account) = user::Entity::find_by_id(user_id).one(self.db.as_ref()).await? else {
            return Ok(None);
        };
        let linked = channel_identity::Entity::find()
            .filter(channel_identity::Column::UserId.eq(user_id))
            .one(self.db.as_ref())
            .await?;
        Ok(Some(match linked {
            Some(row) => ChannelIdentity {
                email: account.email,
                chat_id: row.chat_id,
                lang: row.lang,
                webhook_url: row.webhook_url,
            },
            // No linked chat identity: mail-only delivery, English messages.
            None => ChannelIdentity {
                email: account.email,
                chat_id: None,
                lang: "en".to_string(),
                webhook_url: None,
            },
        }))
    }

    async fn update_last_alert_time(
        &self,
        user_id: i64,
        domain_id: i64,
        at: OffsetDateTime,
    ) -> Result<(), DbErr> {
        tracked_domain::Entity::update_many()
            .col_expr(tracked_domain::Column::LastAlertTime, Expr::value(at))
            .filter(tracked_domain::Column::Id.eq(domain_id))
            .filter(tracked_domain::Column::UserId.eq(user_id))
            .exec(self.db.as_ref())
            .await?;
        Ok(())
    }

    async fn user_cooldown(&self, user_id: i64) -> Result<Option<OffsetDateTime>, DbErr> {
        Ok(user::Entity::find_by_id(user_id)
            .one(self.db.as_ref())
            .await?
            .and_then(|row| row.last_poll_at))
    }

    async fn set_user_cooldown(&self, user_id: i64, at: OffsetDateTime) -> Result<(), DbErr> {
        user::Entity::update_many()
            .col_expr(user::Column::LastPollAt, Expr::value(at))
            .filter(user::Column::Id.eq(user_id))
            .exec(self.db.as_ref())
            .await?;
        Ok(())
    }
}

/// Rebuild the domain view from a row; a status string outside the fixed
/// set is a data error, not a silent default.
fn domain_from_row(row: tracked_domain::Model) -> Result<TrackedDomain, DbErr> {
    let snapshot = match (row.status.as_deref(), row.last_poll_at) {
        (Some(status), Some(last_poll_at)) => {
            let status =
                Status::from_str(status).map_err(|e| DbErr::Custom(e.to_string()))?;
            Some(DomainSnapshot {
                remote_addr: row.remote_addr,
                issuer: row.issuer,
                signature_algo: row.signature_algo,
                public_key_algo: row.public_key_algo,
                public_key_type: row.public_key_type,
                encoded_pem: row.encoded_pem,
                signature_sha1: row.signature_sha1,
                dns_names: row.dns_names,
                key_usage: row.key_usage,
                ext_key_usages: row.ext_key_usages,
                issued: row.issued,
                expires: row.expires,
                latency_ms: row.latency_ms,
                last_poll_at,
                error: row.error,
                status,
            })
        }
        _ => None,
    };
    Ok(TrackedDomain {
        id: row.id,
        user_id: row.user_id,
        domain_name: row.domain_name,
        snapshot,
        last_alert_time: row.last_alert_time,
    })
}
