use sea_orm::entity::prelude::*;
use serde::Serialize;
use time::OffsetDateTime;

/// Account row as seen by the polling core: delivery address plus the
/// on-demand check cooldown timestamp. Account management itself lives
/// outside this service.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub email: String,
    /// Last completed on-demand check, None if the user never ran one.
    pub last_poll_at: Option<OffsetDateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
