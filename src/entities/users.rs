use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "user_status")]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    /// 被封禁，任何登陆方式都会被拒绝
    #[sea_orm(string_value = "banned")]
    Banned,
    /// 未激活（微信影子账号的初始状态）
    #[sea_orm(string_value = "inactivated")]
    Inactivated,
    #[sea_orm(string_value = "init")]
    Init,
    #[sea_orm(string_value = "activated")]
    Activated,
}

impl std::fmt::Display for UserStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserStatus::Banned => write!(f, "banned"),
            UserStatus::Inactivated => write!(f, "inactivated"),
            UserStatus::Init => write!(f, "init"),
            UserStatus::Activated => write!(f, "activated"),
        }
    }
}

#[derive(
    Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "user_gender")]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    #[sea_orm(string_value = "unknown")]
    Unknown,
    #[sea_orm(string_value = "male")]
    Male,
    #[sea_orm(string_value = "female")]
    Female,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub username: String,
    pub nickname: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password_hash: String,
    pub status: UserStatus,
    /// 角色列表，JSON 数组
    pub role: Json,
    pub gender: Gender,
    pub pay_password: Option<String>,
    pub invite_code: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
