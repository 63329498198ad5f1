use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::entities::{Gender, InviteStatus, LoginCommand, LoginType, UserStatus};
use crate::handlers;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.as_mut().unwrap();
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        )
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::sign_up,
        handlers::auth::sign_in,
        handlers::auth::sign_in_with_wechat,
        handlers::auth::complete_wechat_account,
        handlers::auth::refresh,
        handlers::auth::logout,
        handlers::user::get_profile,
        handlers::user::get_login_history,
        handlers::invite::get_invite,
        handlers::invite::list_invites,
    ),
    components(
        schemas(
            SignUpRequest,
            SignInRequest,
            WechatSignInRequest,
            WechatCompleteRequest,
            ProfileResponse,
            AuthResponse,
            InviteResponse,
            LoginLogResponse,
            PaginationParams,
            UserStatus,
            Gender,
            LoginType,
            LoginCommand,
            InviteStatus,
            ApiError,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "注册、登陆与令牌"),
        (name = "user", description = "用户资料与登陆历史"),
        (name = "invite", description = "邀请记录")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    );
}
