use crate::error::{AppError, AppResult};
use regex::Regex;

/// 登陆账号的类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountKind {
    Phone,
    Email,
    Username,
}

/// 识别自由格式的登陆账号：手机号 -> 邮箱 -> 其余按用户名处理
pub fn resolve_account(account: &str) -> AccountKind {
    if is_phone(account) {
        AccountKind::Phone
    } else if is_email(account) {
        AccountKind::Email
    } else {
        AccountKind::Username
    }
}

/// 中国大陆手机号
pub fn is_phone(s: &str) -> bool {
    let phone_regex = Regex::new(r"^1[3-9]\d{9}$").unwrap();
    phone_regex.is_match(s)
}

pub fn is_email(s: &str) -> bool {
    let email_regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    email_regex.is_match(s)
}

pub fn validate_phone(phone: &str) -> AppResult<()> {
    if !is_phone(phone) {
        return Err(AppError::ValidationError(
            "手机号格式无效".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> AppResult<()> {
    if !is_email(email) {
        return Err(AppError::ValidationError("邮箱格式无效".to_string()));
    }
    Ok(())
}

/// 用户名不能与手机号/邮箱的形态冲突，否则账号识别会把它当成别的类型
pub fn validate_username(username: &str) -> AppResult<()> {
    if username.len() < 2 || username.len() > 36 {
        return Err(AppError::ValidationError(
            "用户名长度必须在2-36字符之间".to_string(),
        ));
    }
    if is_phone(username) || is_email(username) {
        return Err(AppError::ValidationError(
            "用户名不能是手机号或邮箱".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_account() {
        assert_eq!(resolve_account("13800138000"), AccountKind::Phone);
        assert_eq!(resolve_account("alice@example.com"), AccountKind::Email);
        assert_eq!(resolve_account("alice"), AccountKind::Username);
        // 位数不足的手机号按用户名处理
        assert_eq!(resolve_account("1380013800"), AccountKind::Username);
        // 12x 号段不存在
        assert_eq!(resolve_account("12800138000"), AccountKind::Username);
    }

    #[test]
    fn test_is_email() {
        assert!(is_email("alice@example.com"));
        assert!(!is_email("alice@example"));
        assert!(!is_email("alice.example.com"));
        assert!(!is_email("a lice@example.com"));
    }

    #[test]
    fn test_validate_username() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("a").is_err());
        assert!(validate_username(&"a".repeat(37)).is_err());
        assert!(validate_username("13800138000").is_err());
        assert!(validate_username("alice@example.com").is_err());
    }
}
