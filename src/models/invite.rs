use crate::entities::{InviteStatus, invite_history_entity as invite_histories};
use crate::models::common::format_rfc3339;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InviteResponse {
    pub id: i64,
    pub inviter: i64,
    pub invitee: i64,
    pub status: InviteStatus,
    pub reward_settled: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<invite_histories::Model> for InviteResponse {
    fn from(invite: invite_histories::Model) -> Self {
        Self {
            id: invite.id,
            inviter: invite.inviter,
            invitee: invite.invitee,
            status: invite.status,
            reward_settled: invite.reward_settled,
            created_at: format_rfc3339(invite.created_at),
            updated_at: format_rfc3339(invite.updated_at),
        }
    }
}
