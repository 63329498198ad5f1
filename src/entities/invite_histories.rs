use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "invite_status")]
#[serde(rename_all = "snake_case")]
pub enum InviteStatus {
    /// 受邀人已注册
    #[sea_orm(string_value = "registered")]
    Registered,
    /// 受邀人已激活账号
    #[sea_orm(string_value = "activated")]
    Activated,
}

impl std::fmt::Display for InviteStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InviteStatus::Registered => write!(f, "registered"),
            InviteStatus::Activated => write!(f, "activated"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "invite_histories")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub inviter: i64,
    pub invitee: i64,
    pub status: InviteStatus,
    pub reward_settled: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
