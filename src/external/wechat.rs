use crate::config::WechatConfig;
use crate::error::{AppError, AppResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// 微信小程序 jscode2session 客户端
#[derive(Clone)]
pub struct WechatAPI {
    http: Client,
    cfg: WechatConfig,
}

/// 一次成功的 code 换取结果
#[derive(Debug, Clone)]
pub struct WechatSession {
    pub openid: String,
    pub session_key: String,
    pub unionid: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
struct SessionResponse {
    /// 用户唯一标识
    #[serde(default)]
    openid: Option<String>,
    /// 会话密钥
    #[serde(default)]
    session_key: Option<String>,
    /// 用户在开放平台的唯一标识符，满足下发条件时返回
    #[serde(default)]
    unionid: Option<String>,
    #[serde(default)]
    errcode: Option<i64>,
    #[serde(default)]
    errmsg: Option<String>,
}

impl WechatAPI {
    pub fn new(cfg: WechatConfig) -> Self {
        let http = Client::builder()
            .user_agent("passport-backend/wechat")
            .build()
            .expect("reqwest client");
        Self { http, cfg }
    }

    /// 用小程序授权 code 换取 openid / session_key
    pub async fn code_to_session(&self, js_code: &str) -> AppResult<WechatSession> {
        if js_code.is_empty() {
            return Err(AppError::ValidationError("请输入微信授权代码".into()));
        }

        let url = format!("{}/sns/jscode2session", self.cfg.base_url);
        let resp = self
            .http
            .get(&url)
            .query(&[
                ("appid", self.cfg.app_id.as_str()),
                ("secret", self.cfg.secret.as_str()),
                ("js_code", js_code),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(AppError::ExternalApiError(format!(
                "WeChat jscode2session failed: HTTP {}",
                status.as_u16()
            )));
        }

        let body: SessionResponse = resp.json().await?;
        map_session(body)
    }
}

fn map_session(body: SessionResponse) -> AppResult<WechatSession> {
    // 微信用 200 + errcode 表达业务错误
    if let Some(errcode) = body.errcode
        && errcode != 0
    {
        return Err(AppError::ExternalApiError(format!(
            "WeChat jscode2session failed: {}: {}",
            errcode,
            body.errmsg.unwrap_or_default()
        )));
    }

    let openid = body
        .openid
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::ExternalApiError("WeChat response missing openid".into()))?;

    Ok(WechatSession {
        openid,
        session_key: body.session_key.unwrap_or_default(),
        unionid: body.unionid,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_session_success() {
        let body: SessionResponse = serde_json::from_str(
            r#"{"openid":"oGZUI0egBJY1zhBYw2KhdUfwVJJE","session_key":"tiihtNczf5v6AKRyjwEUhQ=="}"#,
        )
        .unwrap();
        let session = map_session(body).unwrap();
        assert_eq!(session.openid, "oGZUI0egBJY1zhBYw2KhdUfwVJJE");
        assert_eq!(session.session_key, "tiihtNczf5v6AKRyjwEUhQ==");
        assert!(session.unionid.is_none());
    }

    #[test]
    fn test_map_session_errcode() {
        let body: SessionResponse =
            serde_json::from_str(r#"{"errcode":40029,"errmsg":"invalid code"}"#).unwrap();
        let err = map_session(body).unwrap_err();
        match err {
            AppError::ExternalApiError(msg) => {
                assert!(msg.contains("40029"));
                assert!(msg.contains("invalid code"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_map_session_missing_openid() {
        let body: SessionResponse = serde_json::from_str(r#"{"errcode":0}"#).unwrap();
        assert!(map_session(body).is_err());
    }
}
