use crate::models::*;
use crate::services::AuthService;
use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

/// 提取审计记录用的客户端信息
fn client_info(req: &HttpRequest) -> ClientInfo {
    let user_agent = req
        .headers()
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    let ip = req
        .connection_info()
        .realip_remote_addr()
        .unwrap_or("")
        .to_string();
    ClientInfo { user_agent, ip }
}

#[utoipa::path(
    post,
    path = "/auth/signup",
    tag = "auth",
    request_body = SignUpRequest,
    responses(
        (status = 200, description = "注册成功", body = AuthResponse),
        (status = 400, description = "请求参数错误"),
        (status = 500, description = "服务器内部错误")
    )
)]
pub async fn sign_up(
    auth_service: web::Data<AuthService>,
    request: web::Json<SignUpRequest>,
) -> Result<HttpResponse> {
    match auth_service.sign_up(request.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/auth/signin",
    tag = "auth",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "登录成功", body = AuthResponse),
        (status = 401, description = "认证失败"),
        (status = 403, description = "账号被封禁或未激活"),
        (status = 400, description = "请求参数错误")
    )
)]
pub async fn sign_in(
    auth_service: web::Data<AuthService>,
    req: HttpRequest,
    request: web::Json<SignInRequest>,
) -> Result<HttpResponse> {
    let ctx = client_info(&req);
    match auth_service.sign_in(&ctx, request.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/auth/signin/wechat",
    tag = "auth",
    request_body = WechatSignInRequest,
    responses(
        (status = 200, description = "登录成功，首次登陆会创建未激活账号", body = AuthResponse),
        (status = 502, description = "微信接口调用失败"),
        (status = 400, description = "请求参数错误")
    )
)]
pub async fn sign_in_with_wechat(
    auth_service: web::Data<AuthService>,
    req: HttpRequest,
    request: web::Json<WechatSignInRequest>,
) -> Result<HttpResponse> {
    let ctx = client_info(&req);
    match auth_service
        .sign_in_with_wechat(&ctx, request.into_inner())
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/auth/wechat/complete",
    tag = "auth",
    request_body = WechatCompleteRequest,
    responses(
        (status = 200, description = "补全成功", body = AuthResponse),
        (status = 404, description = "微信账号尚未注册"),
        (status = 400, description = "请求参数错误")
    )
)]
pub async fn complete_wechat_account(
    auth_service: web::Data<AuthService>,
    req: HttpRequest,
    request: web::Json<WechatCompleteRequest>,
) -> Result<HttpResponse> {
    let ctx = client_info(&req);
    match auth_service
        .complete_wechat_account(&ctx, request.into_inner())
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/auth/refresh",
    tag = "auth",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "刷新令牌成功", body = AuthResponse),
        (status = 401, description = "无效的刷新令牌")
    )
)]
pub async fn refresh(
    auth_service: web::Data<AuthService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let auth_header = req.headers().get("Authorization");

    let token = if let Some(auth_value) = auth_header {
        if let Ok(auth_str) = auth_value.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                token
            } else {
                return Ok(HttpResponse::Unauthorized().json(json!({
                    "success": false,
                    "error": {
                        "code": "INVALID_TOKEN_FORMAT",
                        "message": "无效的令牌格式"
                    }
                })));
            }
        } else {
            return Ok(HttpResponse::Unauthorized().json(json!({
                "success": false,
                "error": {
                    "code": "INVALID_TOKEN_FORMAT",
                    "message": "无效的令牌格式"
                }
            })));
        }
    } else {
        return Ok(HttpResponse::Unauthorized().json(json!({
            "success": false,
            "error": {
                "code": "MISSING_TOKEN",
                "message": "缺少刷新令牌"
            }
        })));
    };

    match auth_service.refresh_token(token).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "auth",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "登出成功")
    )
)]
pub async fn logout() -> Result<HttpResponse> {
    // 简单的登出响应，实际的令牌失效应该在客户端处理
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "已成功登出"
    })))
}

pub fn auth_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/signup", web::post().to(sign_up))
            .route("/signin", web::post().to(sign_in))
            .route("/signin/wechat", web::post().to(sign_in_with_wechat))
            .route("/wechat/complete", web::post().to(complete_wechat_account))
            .route("/refresh", web::post().to(refresh))
            .route("/logout", web::post().to(logout)),
    );
}
