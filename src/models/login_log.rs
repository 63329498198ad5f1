use crate::entities::{LoginCommand, LoginType, login_log_entity as login_logs};
use crate::models::common::format_rfc3339;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginLogResponse {
    pub id: i64,
    pub login_type: LoginType,
    pub command: LoginCommand,
    pub client: String,
    pub last_ip: String,
    pub created_at: String,
}

impl From<login_logs::Model> for LoginLogResponse {
    fn from(log: login_logs::Model) -> Self {
        Self {
            id: log.id,
            login_type: log.login_type,
            command: log.command,
            client: log.client,
            last_ip: log.last_ip,
            created_at: format_rfc3339(log.created_at),
        }
    }
}
