use crate::models::*;
use crate::services::InviteService;
use actix_web::{HttpMessage, HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

fn get_user_id_from_request(req: &HttpRequest) -> Option<i64> {
    req.extensions().get::<i64>().copied()
}

#[utoipa::path(
    get,
    path = "/invite/{invite_id}",
    tag = "invite",
    params(
        ("invite_id" = i64, Path, description = "邀请记录ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取邀请记录成功", body = InviteResponse),
        (status = 401, description = "未授权"),
        (status = 403, description = "只有邀请人或受邀人可以查看"),
        (status = 404, description = "邀请记录不存在")
    )
)]
pub async fn get_invite(
    invite_service: web::Data<InviteService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);
    let invite_id = path.into_inner();

    match invite_service.get_invite(user_id, invite_id).await {
        Ok(invite) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": invite
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/invite",
    tag = "invite",
    params(
        ("page" = Option<i64>, Query, description = "页码"),
        ("page_size" = Option<i64>, Query, description = "每页数量")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取邀请记录列表成功"),
        (status = 401, description = "未授权")
    )
)]
pub async fn list_invites(
    invite_service: web::Data<InviteService>,
    req: HttpRequest,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);

    match invite_service
        .list_invites(user_id, &query.into_inner())
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn invite_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/invite")
            .route("", web::get().to(list_invites))
            .route("/{invite_id}", web::get().to(get_invite)),
    );
}
