use sea_orm::entity::prelude::*;
use serde::Serialize;

/// Per-user alerting preferences, created alongside the account and updated
/// only by the user.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "notification_preference")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: i64,
    pub expiry_alerts: bool,
    pub change_alert: bool,
    /// Days before expiry from which expiry pre-alerts fire.
    pub before_days: i32,
    pub email_alert: bool,
    pub telegram_alert: bool,
    pub webhook_alert: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
