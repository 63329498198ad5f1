use crate::entities::{login_log_entity as login_logs, user_entity as users};
use crate::error::{AppError, AppResult};
use crate::models::*;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect};
use std::sync::Arc;

#[derive(Clone)]
pub struct UserService {
    pool: Arc<DatabaseConnection>,
}

impl UserService {
    pub fn new(pool: impl Into<Arc<DatabaseConnection>>) -> Self {
        Self { pool: pool.into() }
    }

    /// 获取当前用户的个人资料
    pub async fn get_profile(&self, user_id: i64) -> AppResult<ProfileResponse> {
        let user = users::Entity::find_by_id(user_id)
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        Ok(ProfileResponse::from(user))
    }

    /// 获取当前用户的登陆历史，按时间倒序
    pub async fn get_login_history(
        &self,
        user_id: i64,
        params: &PaginationParams,
    ) -> AppResult<PaginatedResponse<LoginLogResponse>> {
        #[derive(Debug, sea_orm::FromQueryResult)]
        struct CountRow {
            count: i64,
        }
        let total = login_logs::Entity::find()
            .filter(login_logs::Column::Uid.eq(user_id))
            .select_only()
            .column_as(Expr::val(1).count(), "count")
            .into_model::<CountRow>()
            .one(self.pool.as_ref())
            .await?
            .map(|r| r.count)
            .unwrap_or(0);

        let models = login_logs::Entity::find()
            .filter(login_logs::Column::Uid.eq(user_id))
            .order_by_desc(login_logs::Column::CreatedAt)
            .limit(params.get_limit() as u64)
            .offset(params.get_offset() as u64)
            .all(self.pool.as_ref())
            .await?;
        let items: Vec<LoginLogResponse> = models.into_iter().map(LoginLogResponse::from).collect();

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
    use crate::entities::{Gender, UserStatus};
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn user_model(id: i64) -> users::Model {
        users::Model {
            id,
            username: "alice".to_string(),
            nickname: None,
            email: None,
            phone: None,
            password_hash: "$2b$04$abcdefghijklmnopqrstuv".to_string(),
            status: UserStatus::Init,
            role: serde_json::json!(["user"]),
            gender: Gender::Unknown,
            pay_password: None,
            invite_code: None,
            created_at: Some(Utc::now()),
            updated_at: Some(Utc::now()),
        }
    }

    #[tokio::test]
    async fn test_get_profile() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user_model(1)]])
            .into_connection();

        let profile = UserService::new(db).get_profile(1).await.unwrap();
        assert_eq!(profile.id, 1);
        assert_eq!(profile.username, "alice");
    }

    #[tokio::test]
    async fn test_get_profile_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<users::Model>::new()])
            .into_connection();

        let err = UserService::new(db).get_profile(1).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
