use crate::entities::{
    Gender, InviteStatus, LoginCommand, LoginType, UserStatus,
    invite_history_entity as invite_histories, login_log_entity as login_logs,
    user_entity as users, wechat_open_id_entity as wechat_open_ids,
};
use crate::error::{AppError, AppResult};
use crate::external::WechatAPI;
use crate::models::*;
use crate::utils::*;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, QueryFilter, Set, TransactionTrait,
};
use std::sync::Arc;

/// 新账号的初始角色
const DEFAULT_ROLE: &str = "user";

#[derive(Clone)]
pub struct AuthService {
    pool: Arc<DatabaseConnection>,
    jwt_service: JwtService,
    wechat_api: WechatAPI,
}

impl AuthService {
    pub fn new(
        pool: impl Into<Arc<DatabaseConnection>>,
        jwt_service: JwtService,
        wechat_api: WechatAPI,
    ) -> Self {
        Self {
            pool: pool.into(),
            jwt_service,
            wechat_api,
        }
    }

    /// 注册。用户名/邮箱/手机号至少提供一个；
    /// 带邀请码时在同一事务内写入邀请记录。
    pub async fn sign_up(&self, request: SignUpRequest) -> AppResult<AuthResponse> {
        if request.username.is_none() && request.email.is_none() && request.phone.is_none() {
            return Err(AppError::ValidationError(
                "请至少提供用户名、邮箱或手机号之一".to_string(),
            ));
        }
        validate_password(&request.password)?;
        if let Some(username) = &request.username {
            validate_username(username)?;
        }
        if let Some(email) = &request.email {
            validate_email(email)?;
        }
        if let Some(phone) = &request.phone {
            validate_phone(phone)?;
        }

        let txn = self.pool.begin().await?;

        if let Some(username) = &request.username {
            let exists = users::Entity::find()
                .filter(users::Column::Username.eq(username.clone()))
                .one(&txn)
                .await?;
            if exists.is_some() {
                return Err(AppError::ValidationError("用户名已被占用".to_string()));
            }
        }
        if let Some(email) = &request.email {
            let exists = users::Entity::find()
                .filter(users::Column::Email.eq(email.clone()))
                .one(&txn)
                .await?;
            if exists.is_some() {
                return Err(AppError::ValidationError("邮箱已被注册".to_string()));
            }
        }
        if let Some(phone) = &request.phone {
            let exists = users::Entity::find()
                .filter(users::Column::Phone.eq(phone.clone()))
                .one(&txn)
                .await?;
            if exists.is_some() {
                return Err(AppError::ValidationError("手机号已被注册".to_string()));
            }
        }

        // 邀请人在创建受邀账号之前解析
        let inviter = match &request.invite_code {
            Some(code) => Some(
                users::Entity::find()
                    .filter(users::Column::InviteCode.eq(code.clone()))
                    .one(&txn)
                    .await?
                    .ok_or_else(|| AppError::ValidationError("邀请码不存在".to_string()))?,
            ),
            None => None,
        };

        let invite_code = generate_unique_invite_code(&txn).await?;
        let password_hash = hash_password(&request.password)?;

        let username = match &request.username {
            Some(name) => name.clone(),
            None => generate_placeholder_username(),
        };

        // 注册账号直接进入 init；邮箱/短信激活流程不在本服务内
        let user = users::ActiveModel {
            username: Set(username),
            email: Set(request.email.clone()),
            phone: Set(request.phone.clone()),
            password_hash: Set(password_hash),
            status: Set(UserStatus::Init),
            role: Set(serde_json::json!([DEFAULT_ROLE])),
            gender: Set(Gender::Unknown),
            invite_code: Set(Some(invite_code)),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        if let Some(inviter) = inviter {
            invite_histories::ActiveModel {
                inviter: Set(inviter.id),
                invitee: Set(user.id),
                status: Set(InviteStatus::Registered),
                reward_settled: Set(false),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
        }

        txn.commit().await?;

        self.issue_tokens(&user)
    }

    /// 普通帐号登陆
    pub async fn sign_in(&self, ctx: &ClientInfo, request: SignInRequest) -> AppResult<AuthResponse> {
        if request.account.is_empty() {
            return Err(AppError::ValidationError("请输入登陆账号".to_string()));
        }
        if request.password.is_empty() {
            return Err(AppError::ValidationError("请输入密码".to_string()));
        }

        let kind = resolve_account(&request.account);
        let login_type = match kind {
            AccountKind::Phone => LoginType::Phone,
            AccountKind::Email => LoginType::Email,
            AccountKind::Username => LoginType::Username,
        };

        let txn = self.pool.begin().await?;

        let query = users::Entity::find();
        let query = match kind {
            AccountKind::Phone => query.filter(users::Column::Phone.eq(request.account.clone())),
            AccountKind::Email => query.filter(users::Column::Email.eq(request.account.clone())),
            AccountKind::Username => {
                query.filter(users::Column::Username.eq(request.account.clone()))
            }
        };

        // 查不到与密码不对返回同一个错误
        let user = query
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::AuthError("账号或密码错误".to_string()))?;

        if !verify_password(&request.password, &user.password_hash)? {
            // 失败记录不能跟着登陆事务一起回滚，单独落库
            if let Err(e) = self
                .record_login(
                    self.pool.as_ref(),
                    user.id,
                    login_type,
                    LoginCommand::LoginFailure,
                    ctx,
                )
                .await
            {
                log::warn!("Failed to record login failure for user {}: {e:?}", user.id);
            }
            return Err(AppError::AuthError("账号或密码错误".to_string()));
        }

        Self::ensure_can_sign_in(&user, false)?;

        let response = self.issue_tokens(&user)?;
        self.record_login(&txn, user.id, login_type, LoginCommand::LoginSuccess, ctx)
            .await?;
        txn.commit().await?;

        Ok(response)
    }

    /// 使用微信小程序登陆
    pub async fn sign_in_with_wechat(
        &self,
        ctx: &ClientInfo,
        request: WechatSignInRequest,
    ) -> AppResult<AuthResponse> {
        let session = self.wechat_api.code_to_session(&request.code).await?;
        self.sign_in_with_openid(ctx, &session.openid).await
    }

    pub(crate) async fn sign_in_with_openid(
        &self,
        ctx: &ClientInfo,
        openid: &str,
    ) -> AppResult<AuthResponse> {
        let txn = self.pool.begin().await?;

        let mapping = wechat_open_ids::Entity::find_by_id(openid.to_string())
            .one(&txn)
            .await?;

        let user = match mapping {
            Some(mapping) => users::Entity::find_by_id(mapping.uid)
                .one(&txn)
                .await?
                .ok_or_else(|| AppError::NotFound("用户不存在".to_string()))?,
            None => {
                // 第一次用微信登陆：创建影子账号并绑定 openid
                let username = generate_placeholder_username();
                let password_hash = hash_password(&uuid::Uuid::new_v4().to_string())?;
                let user = users::ActiveModel {
                    username: Set(username.clone()),
                    nickname: Set(Some(username)),
                    password_hash: Set(password_hash),
                    status: Set(UserStatus::Inactivated),
                    role: Set(serde_json::json!([DEFAULT_ROLE])),
                    gender: Set(Gender::Unknown),
                    ..Default::default()
                }
                .insert(&txn)
                .await?;

                wechat_open_ids::ActiveModel {
                    id: Set(openid.to_string()),
                    uid: Set(user.id),
                    ..Default::default()
                }
                .insert(&txn)
                .await?;

                user
            }
        };

        // 未激活是微信登陆的正常状态，只拦截封禁账号
        Self::ensure_can_sign_in(&user, true)?;

        let response = self.issue_tokens(&user)?;
        self.record_login(&txn, user.id, LoginType::Wechat, LoginCommand::LoginSuccess, ctx)
            .await?;
        txn.commit().await?;

        Ok(response)
    }

    /// 微信帐号的信息补全。
    /// 只有未激活账号允许补全，补全成功后状态迁移到 init。
    pub async fn complete_wechat_account(
        &self,
        ctx: &ClientInfo,
        request: WechatCompleteRequest,
    ) -> AppResult<AuthResponse> {
        if let Some(phone) = &request.phone {
            validate_phone(phone)?;
        }
        if let Some(username) = &request.username {
            validate_username(username)?;
        }

        let session = self.wechat_api.code_to_session(&request.code).await?;
        self.complete_with_openid(ctx, &session.openid, request.phone, request.username)
            .await
    }

    pub(crate) async fn complete_with_openid(
        &self,
        ctx: &ClientInfo,
        openid: &str,
        phone: Option<String>,
        username: Option<String>,
    ) -> AppResult<AuthResponse> {
        let txn = self.pool.begin().await?;

        let mapping = wechat_open_ids::Entity::find_by_id(openid.to_string())
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("微信账号尚未注册".to_string()))?;

        let mut user = users::Entity::find_by_id(mapping.uid)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("用户不存在".to_string()))?;

        Self::ensure_can_sign_in(&user, true)?;

        if user.status == UserStatus::Inactivated && (phone.is_some() || username.is_some()) {
            let mut am = user.clone().into_active_model();
            if let Some(phone) = phone {
                am.phone = Set(Some(phone));
            }
            if let Some(username) = username {
                am.username = Set(username);
            }
            am.status = Set(UserStatus::Init);
            am.updated_at = Set(Some(Utc::now()));
            user = am.update(&txn).await?;
        }

        let response = self.issue_tokens(&user)?;
        self.record_login(&txn, user.id, LoginType::Wechat, LoginCommand::LoginSuccess, ctx)
            .await?;
        txn.commit().await?;

        Ok(response)
    }

    /// 用刷新令牌换新的访问令牌
    pub async fn refresh_token(&self, refresh_token: &str) -> AppResult<AuthResponse> {
        let claims = self.jwt_service.verify_refresh_token(refresh_token)?;
        let user_id: i64 = claims
            .sub
            .parse()
            .map_err(|_| AppError::AuthError("无效的令牌".to_string()))?;

        let user = users::Entity::find_by_id(user_id)
            .one(self.pool.as_ref())
            .await?
            .ok_or_else(|| AppError::NotFound("用户不存在".to_string()))?;

        Self::ensure_can_sign_in(&user, true)?;

        let access_token = self
            .jwt_service
            .generate_access_token(user.id, &user.username)?;

        Ok(AuthResponse {
            user: ProfileResponse::from(user),
            access_token,
            refresh_token: refresh_token.to_string(),
            expires_in: self.jwt_service.get_access_token_expires_in(),
        })
    }

    fn ensure_can_sign_in(user: &users::Model, allow_inactivated: bool) -> AppResult<()> {
        match user.status {
            UserStatus::Banned => Err(AppError::AccountState("账号已被封禁".to_string())),
            UserStatus::Inactivated if !allow_inactivated => {
                Err(AppError::AccountState("账号尚未激活".to_string()))
            }
            _ => Ok(()),
        }
    }

    fn issue_tokens(&self, user: &users::Model) -> AppResult<AuthResponse> {
        let access_token = self
            .jwt_service
            .generate_access_token(user.id, &user.username)?;
        let refresh_token = self
            .jwt_service
            .generate_refresh_token(user.id, &user.username)?;

        Ok(AuthResponse {
            user: ProfileResponse::from(user.clone()),
            access_token,
            refresh_token,
            expires_in: self.jwt_service.get_access_token_expires_in(),
        })
    }

    async fn record_login<C: ConnectionTrait>(
        &self,
        db: &C,
        uid: i64,
        login_type: LoginType,
        command: LoginCommand,
        ctx: &ClientInfo,
    ) -> AppResult<()> {
        login_logs::ActiveModel {
            uid: Set(uid),
            login_type: Set(login_type),
            command: Set(command),
            client: Set(ctx.user_agent.clone()),
            last_ip: Set(ctx.ip.clone()),
            ..Default::default()
        }
        .insert(db)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WechatConfig;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn jwt() -> JwtService {
        JwtService::new("test-secret", 3600, 86400)
    }

    fn wechat() -> WechatAPI {
        WechatAPI::new(WechatConfig {
            app_id: String::new(),
            secret: String::new(),
            base_url: "https://api.weixin.qq.com".to_string(),
        })
    }

    fn service(db: DatabaseConnection) -> AuthService {
        AuthService::new(db, jwt(), wechat())
    }

    fn ctx() -> ClientInfo {
        ClientInfo {
            user_agent: "test-agent".to_string(),
            ip: "127.0.0.1".to_string(),
        }
    }

    fn user_model(id: i64, status: UserStatus, password: &str) -> users::Model {
        users::Model {
            id,
            username: "alice".to_string(),
            nickname: None,
            email: None,
            phone: None,
            password_hash: bcrypt::hash(password, 4).unwrap(),
            status,
            role: serde_json::json!(["user"]),
            gender: Gender::Unknown,
            pay_password: None,
            invite_code: Some("661234".to_string()),
            created_at: Some(Utc::now()),
            updated_at: Some(Utc::now()),
        }
    }

    fn login_log_model(uid: i64, command: LoginCommand) -> login_logs::Model {
        login_logs::Model {
            id: 1,
            uid,
            login_type: LoginType::Username,
            command,
            client: "test-agent".to_string(),
            last_ip: "127.0.0.1".to_string(),
            created_at: Some(Utc::now()),
        }
    }

    fn mapping_model(openid: &str, uid: i64) -> wechat_open_ids::Model {
        wechat_open_ids::Model {
            id: openid.to_string(),
            uid,
            created_at: Some(Utc::now()),
            updated_at: Some(Utc::now()),
        }
    }

    #[tokio::test]
    async fn test_sign_in_success() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user_model(1, UserStatus::Init, "Password123")]])
            .append_query_results([vec![login_log_model(1, LoginCommand::LoginSuccess)]])
            .into_connection();

        let res = service(db)
            .sign_in(
                &ctx(),
                SignInRequest {
                    account: "alice".to_string(),
                    password: "Password123".to_string(),
                },
            )
            .await
            .unwrap();

        assert_eq!(res.user.id, 1);
        assert!(!res.access_token.is_empty());
        assert!(!res.refresh_token.is_empty());
    }

    #[tokio::test]
    async fn test_sign_in_wrong_password() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user_model(1, UserStatus::Init, "Password123")]])
            .append_query_results([vec![login_log_model(1, LoginCommand::LoginFailure)]])
            .into_connection();

        let err = service(db)
            .sign_in(
                &ctx(),
                SignInRequest {
                    account: "alice".to_string(),
                    password: "WrongPassword1".to_string(),
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::AuthError(_)));
    }

    #[tokio::test]
    async fn test_sign_in_unknown_account() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<users::Model>::new()])
            .into_connection();

        let err = service(db)
            .sign_in(
                &ctx(),
                SignInRequest {
                    account: "nobody".to_string(),
                    password: "Password123".to_string(),
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::AuthError(_)));
    }

    #[tokio::test]
    async fn test_sign_in_banned_account() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user_model(1, UserStatus::Banned, "Password123")]])
            .into_connection();

        let err = service(db)
            .sign_in(
                &ctx(),
                SignInRequest {
                    account: "alice".to_string(),
                    password: "Password123".to_string(),
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::AccountState(_)));
    }

    #[tokio::test]
    async fn test_sign_in_inactivated_account() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user_model(1, UserStatus::Inactivated, "Password123")]])
            .into_connection();

        let err = service(db)
            .sign_in(
                &ctx(),
                SignInRequest {
                    account: "alice".to_string(),
                    password: "Password123".to_string(),
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::AccountState(_)));
    }

    #[tokio::test]
    async fn test_wechat_sign_in_existing_openid() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![mapping_model("openid-1", 7)]])
            .append_query_results([vec![user_model(7, UserStatus::Inactivated, "Password123")]])
            .append_query_results([vec![login_log_model(7, LoginCommand::LoginSuccess)]])
            .into_connection();

        let res = service(db)
            .sign_in_with_openid(&ctx(), "openid-1")
            .await
            .unwrap();

        // 未激活账号可以用微信登陆
        assert_eq!(res.user.id, 7);
        assert_eq!(res.user.status, UserStatus::Inactivated);
    }

    #[tokio::test]
    async fn test_wechat_sign_in_new_openid_creates_shadow_account() {
        let mut shadow = user_model(9, UserStatus::Inactivated, "Password123");
        shadow.username = "v0123456789ab".to_string();
        shadow.invite_code = None;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<wechat_open_ids::Model>::new()])
            .append_query_results([vec![shadow]])
            .append_query_results([vec![mapping_model("openid-new", 9)]])
            .append_query_results([vec![login_log_model(9, LoginCommand::LoginSuccess)]])
            .into_connection();

        let res = service(db)
            .sign_in_with_openid(&ctx(), "openid-new")
            .await
            .unwrap();

        assert_eq!(res.user.id, 9);
        assert_eq!(res.user.status, UserStatus::Inactivated);
        assert!(res.user.username.starts_with('v'));
        assert!(!res.access_token.is_empty());
    }

    #[tokio::test]
    async fn test_wechat_sign_in_banned_account() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![mapping_model("openid-1", 7)]])
            .append_query_results([vec![user_model(7, UserStatus::Banned, "Password123")]])
            .into_connection();

        let err = service(db)
            .sign_in_with_openid(&ctx(), "openid-1")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::AccountState(_)));
    }

    #[tokio::test]
    async fn test_wechat_complete_flips_inactivated_to_init() {
        let mut updated = user_model(7, UserStatus::Init, "Password123");
        updated.phone = Some("13800138000".to_string());

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![mapping_model("openid-1", 7)]])
            .append_query_results([vec![user_model(7, UserStatus::Inactivated, "Password123")]])
            .append_query_results([vec![updated]])
            .append_query_results([vec![login_log_model(7, LoginCommand::LoginSuccess)]])
            .into_connection();

        let res = service(db)
            .complete_with_openid(&ctx(), "openid-1", Some("13800138000".to_string()), None)
            .await
            .unwrap();

        assert_eq!(res.user.status, UserStatus::Init);
        assert_eq!(res.user.phone.as_deref(), Some("13800138000"));
    }

    #[tokio::test]
    async fn test_wechat_complete_leaves_non_inactivated_account_alone() {
        // 已经 init 的账号不会被再次修改，也不会迁移状态
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![mapping_model("openid-1", 7)]])
            .append_query_results([vec![user_model(7, UserStatus::Init, "Password123")]])
            .append_query_results([vec![login_log_model(7, LoginCommand::LoginSuccess)]])
            .into_connection();

        let res = service(db)
            .complete_with_openid(&ctx(), "openid-1", Some("13800138000".to_string()), None)
            .await
            .unwrap();

        assert_eq!(res.user.status, UserStatus::Init);
        // 更新被跳过，手机号保持原值
        assert!(res.user.phone.is_none());
    }

    #[tokio::test]
    async fn test_wechat_complete_unknown_openid() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<wechat_open_ids::Model>::new()])
            .into_connection();

        let err = service(db)
            .complete_with_openid(&ctx(), "openid-unknown", None, None)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_sign_up_duplicate_username() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user_model(1, UserStatus::Init, "Password123")]])
            .into_connection();

        let err = service(db)
            .sign_up(SignUpRequest {
                username: Some("alice".to_string()),
                email: None,
                phone: None,
                password: "Password123".to_string(),
                invite_code: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_sign_up_success() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<users::Model>::new()]) // 用户名查重
            .append_query_results([Vec::<users::Model>::new()]) // 邀请码查重
            .append_query_results([vec![user_model(3, UserStatus::Init, "Password123")]])
            .into_connection();

        let res = service(db)
            .sign_up(SignUpRequest {
                username: Some("alice".to_string()),
                email: None,
                phone: None,
                password: "Password123".to_string(),
                invite_code: None,
            })
            .await
            .unwrap();

        assert_eq!(res.user.id, 3);
        assert_eq!(res.user.status, UserStatus::Init);
        assert!(res.user.invite_code.is_some());
    }

    #[tokio::test]
    async fn test_sign_up_with_inviter_records_invite_history() {
        let inviter = user_model(1, UserStatus::Init, "Password123");
        let invitee = user_model(3, UserStatus::Init, "Password123");
        let invite = invite_histories::Model {
            id: 11,
            inviter: 1,
            invitee: 3,
            status: InviteStatus::Registered,
            reward_settled: false,
            created_at: Some(Utc::now()),
            updated_at: Some(Utc::now()),
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<users::Model>::new()]) // 用户名查重
            .append_query_results([vec![inviter]]) // 邀请人
            .append_query_results([Vec::<users::Model>::new()]) // 邀请码查重
            .append_query_results([vec![invitee]])
            .append_query_results([vec![invite]])
            .into_connection();

        let res = service(db)
            .sign_up(SignUpRequest {
                username: Some("bob".to_string()),
                email: None,
                phone: None,
                password: "Password123".to_string(),
                invite_code: Some("661234".to_string()),
            })
            .await
            .unwrap();

        assert_eq!(res.user.id, 3);
    }

    #[tokio::test]
    async fn test_sign_up_unknown_invite_code() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<users::Model>::new()]) // 用户名查重
            .append_query_results([Vec::<users::Model>::new()]) // 邀请人不存在
            .into_connection();

        let err = service(db)
            .sign_up(SignUpRequest {
                username: Some("bob".to_string()),
                email: None,
                phone: None,
                password: "Password123".to_string(),
                invite_code: Some("000000".to_string()),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::ValidationError(_)));
    }
}
