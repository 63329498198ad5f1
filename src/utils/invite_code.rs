use crate::entities::user_entity as users;
use crate::error::AppResult;
use rand::Rng;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};

/// 生成六位数字邀请码
pub fn random_invite_code() -> String {
    let mut rng = rand::thread_rng();
    format!("{}", rng.gen_range(100000_u32..=999999_u32))
}

/// 生成唯一的六位数字邀请码
pub async fn generate_unique_invite_code<C: ConnectionTrait>(db: &C) -> AppResult<String> {
    loop {
        let invite_code = random_invite_code();

        // 检查是否已存在
        let exists = users::Entity::find()
            .filter(users::Column::InviteCode.eq(invite_code.clone()))
            .one(db)
            .await?;

        if exists.is_none() {
            return Ok(invite_code);
        }
    }
}

/// 占位用户名，"v" + 随机串。用于微信影子账号和未提供用户名的注册
pub fn generate_placeholder_username() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("v{}", &id[..12])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_invite_code() {
        let code = random_invite_code();
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_generate_placeholder_username() {
        let username = generate_placeholder_username();
        assert!(username.starts_with('v'));
        assert_eq!(username.len(), 13);

        // 占位用户名不能被账号识别当成手机号或邮箱
        use crate::utils::account::{AccountKind, resolve_account};
        assert_eq!(resolve_account(&username), AccountKind::Username);
    }
}
