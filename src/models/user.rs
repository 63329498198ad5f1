use crate::entities::{Gender, UserStatus, user_entity as users};
use crate::models::common::format_rfc3339;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SignUpRequest {
    #[schema(example = "alice")]
    pub username: Option<String>,
    #[schema(example = "alice@example.com")]
    pub email: Option<String>,
    #[schema(example = "13800138000")]
    pub phone: Option<String>,
    #[schema(example = "Password123")]
    pub password: String,
    /// 邀请人的邀请码
    #[schema(example = "661234")]
    pub invite_code: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SignInRequest {
    /// 用户名/手机号/邮箱，由服务端识别类型
    #[schema(example = "alice")]
    pub account: String,
    #[schema(example = "Password123")]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WechatSignInRequest {
    /// 微信小程序授权之后返回的 code
    #[schema(example = "081Kq0Ga1r7Hl0")]
    pub code: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WechatCompleteRequest {
    /// 微信小程序授权之后返回的 code
    #[schema(example = "081Kq0Ga1r7Hl0")]
    pub code: String,
    #[schema(example = "13800138000")]
    pub phone: Option<String>,
    #[schema(example = "alice")]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProfileResponse {
    pub id: i64,
    pub username: String,
    pub nickname: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub status: UserStatus,
    pub gender: Gender,
    pub role: Vec<String>,
    /// 是否已设置支付密码
    pub pay_password: bool,
    pub invite_code: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub user: ProfileResponse,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

impl From<users::Model> for ProfileResponse {
    fn from(user: users::Model) -> Self {
        let role: Vec<String> = serde_json::from_value(user.role).unwrap_or_default();
        Self {
            id: user.id,
            username: user.username,
            nickname: user.nickname,
            email: user.email,
            phone: user.phone,
            status: user.status,
            gender: user.gender,
            role,
            pay_password: user.pay_password.map(|p| !p.is_empty()).unwrap_or(false),
            invite_code: user.invite_code,
            created_at: format_rfc3339(user.created_at),
            updated_at: format_rfc3339(user.updated_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_user() -> users::Model {
        users::Model {
            id: 1,
            username: "alice".to_string(),
            nickname: Some("Alice".to_string()),
            email: Some("alice@example.com".to_string()),
            phone: None,
            password_hash: "$2b$04$abcdefghijklmnopqrstuv".to_string(),
            status: UserStatus::Init,
            role: serde_json::json!(["user"]),
            gender: Gender::Unknown,
            pay_password: None,
            invite_code: Some("661234".to_string()),
            created_at: Some(Utc::now()),
            updated_at: Some(Utc::now()),
        }
    }

    #[test]
    fn test_profile_hides_password_material() {
        let profile = ProfileResponse::from(sample_user());
        let json = serde_json::to_string(&profile).unwrap();
        assert!(!json.contains("password_hash"));
        assert!(json.contains("\"pay_password\":false"));
    }

    #[test]
    fn test_pay_password_flag() {
        let mut user = sample_user();
        user.pay_password = Some("$2b$04$qrstuvabcdefghijklmnop".to_string());
        assert!(ProfileResponse::from(user).pay_password);

        let mut user = sample_user();
        user.pay_password = Some(String::new());
        assert!(!ProfileResponse::from(user).pay_password);
    }

    #[test]
    fn test_role_list_decoded_from_json() {
        let profile = ProfileResponse::from(sample_user());
        assert_eq!(profile.role, vec!["user".to_string()]);
    }

    #[test]
    fn test_timestamps_are_rfc3339() {
        let profile = ProfileResponse::from(sample_user());
        assert!(chrono::DateTime::parse_from_rfc3339(&profile.created_at).is_ok());
        assert!(chrono::DateTime::parse_from_rfc3339(&profile.updated_at).is_ok());
    }
}
