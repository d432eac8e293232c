use sea_orm::entity::prelude::*;
use serde::Serialize;
use time::OffsetDateTime;

/// External chat identity linked to an account via the out-of-band linking
/// flow. Read-only to the polling core.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "channel_identity")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub chat_id: Option<i64>,
    pub lang: String,
    pub webhook_url: Option<String>,
    pub created_at: OffsetDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
