use sea_orm::entity::prelude::*;
use serde::Serialize;
use time::OffsetDateTime;

/// One (user, domain) tracking relation together with the columns of its
/// most recent snapshot. Snapshot columns are nullable as a block: they are
/// absent until the first poll and replaced wholesale on every poll.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "tracked_domain")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub domain_name: String,
    pub remote_addr: Option<String>,
    pub issuer: Option<String>,
    pub signature_algo: Option<String>,
    pub public_key_algo: Option<String>,
    pub public_key_type: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub encoded_pem: Option<String>,
    pub signature_sha1: Option<String>,
    pub dns_names: Option<String>,
    pub key_usage: Option<String>,
    pub ext_key_usages: Option<String>,
    pub issued: Option<OffsetDateTime>,
    pub expires: Option<OffsetDateTime>,
    pub latency_ms: Option<i64>,
    pub last_poll_at: Option<OffsetDateTime>,
    pub error: Option<String>,
    pub status: Option<String>,
    pub last_alert_time: Option<OffsetDateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
