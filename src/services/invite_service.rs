use crate::entities::invite_history_entity as invite_histories;
use crate::error::{AppError, AppResult};
use crate::models::*;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct InviteService {
    pool: Arc<DatabaseConnection>,
}

impl InviteService {
    pub fn new(pool: impl Into<Arc<DatabaseConnection>>) -> Self {
        Self { pool: pool.into() }
    }

    /// 获取单条邀请记录。只有跟自己有关的（邀请人或受邀人），才能获取详情
    pub async fn get_invite(&self, requester_uid: i64, invite_id: i64) -> AppResult<InviteResponse> {
        let invite = invite_histories::Entity::find_by_id(invite_id)
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(|| AppError::NotFound("Invite record does not exist".to_string()))?;

        if invite.inviter != requester_uid && invite.invitee != requester_uid {
            return Err(AppError::PermissionDenied);
        }

        Ok(InviteResponse::from(invite))
    }

    /// 当前用户相关的邀请记录列表，按时间倒序
    pub async fn list_invites(
        &self,
        requester_uid: i64,
        params: &PaginationParams,
    ) -> AppResult<PaginatedResponse<InviteResponse>> {
        let related = Condition::any()
            .add(invite_histories::Column::Inviter.eq(requester_uid))
            .add(invite_histories::Column::Invitee.eq(requester_uid));

        #[derive(Debug, sea_orm::FromQueryResult)]
        struct CountRow {
            count: i64,
        }
        let total = invite_histories::Entity::find()
            .filter(related.clone())
            .select_only()
            .column_as(Expr::val(1).count(), "count")
            .into_model::<CountRow>()
            .one(self.pool.as_ref())
            .await?
            .map(|r| r.count)
            .unwrap_or(0);

        let models = invite_histories::Entity::find()
            .filter(related)
            .order_by_desc(invite_histories::Column::CreatedAt)
            .limit(params.get_limit() as u64)
            .offset(params.get_offset() as u64)
            .all(self.pool.as_ref())
            .await?;
        let items: Vec<InviteResponse> = models.into_iter().map(InviteResponse::from).collect();

        Ok(PaginatedResponse::new(
            items,
            params.page.unwrap_or(1),
            params.get_limit(),
            total,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::InviteStatus;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn invite_model(id: i64, inviter: i64, invitee: i64) -> invite_histories::Model {
        invite_histories::Model {
            id,
            inviter,
            invitee,
            status: InviteStatus::Registered,
            reward_settled: false,
            created_at: Some(Utc::now()),
            updated_at: Some(Utc::now()),
        }
    }

    fn db_with(invites: Vec<invite_histories::Model>) -> DatabaseConnection {
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([invites])
            .into_connection()
    }

    #[tokio::test]
    async fn test_get_invite_as_inviter() {
        let service = InviteService::new(db_with(vec![invite_model(5, 1, 2)]));
        let invite = service.get_invite(1, 5).await.unwrap();
        assert_eq!(invite.id, 5);
        assert_eq!(invite.inviter, 1);
    }

    #[tokio::test]
    async fn test_get_invite_as_invitee() {
        let service = InviteService::new(db_with(vec![invite_model(5, 1, 2)]));
        let invite = service.get_invite(2, 5).await.unwrap();
        assert_eq!(invite.invitee, 2);
    }

    #[tokio::test]
    async fn test_get_invite_unrelated_user_denied() {
        let service = InviteService::new(db_with(vec![invite_model(5, 1, 2)]));
        let err = service.get_invite(3, 5).await.unwrap_err();
        assert!(matches!(err, AppError::PermissionDenied));
    }

    #[tokio::test]
    async fn test_get_invite_not_found() {
        let service = InviteService::new(db_with(vec![]));
        let err = service.get_invite(1, 5).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
