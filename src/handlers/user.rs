use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

use super::current_user_id;
use crate::models::*;
use crate::services::{AccountService, AuthService};

#[utoipa::path(
    get,
    path = "/users/me",
    tag = "user",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user profile", body = UserResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn get_profile(
    auth_service: web::Data<AuthService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;

    match auth_service.get_user(user_id).await {
        Ok(user) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": UserResponse::from(user)
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/users/me",
    tag = "user",
    request_body = UpdateProfileRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Profile updated", body = UserResponse),
        (status = 409, description = "Profile was modified by another request")
    )
)]
pub async fn update_profile(
    account_service: web::Data<AccountService>,
    req: HttpRequest,
    request: web::Json<UpdateProfileRequest>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;

    match account_service
        .update_profile(user_id, request.into_inner())
        .await
    {
        Ok(user) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": user
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/users/me/payments",
    tag = "user",
    params(
        ("page" = Option<u32>, Query, description = "Page number"),
        ("page_size" = Option<u32>, Query, description = "Items per page")
    ),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Payment history"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn payment_history(
    account_service: web::Data<AccountService>,
    req: HttpRequest,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;

    match account_service
        .payment_history(user_id, query.into_inner())
        .await
    {
        Ok(history) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": history
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn user_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/users")
            .route("/me", web::get().to(get_profile))
            .route("/me", web::put().to(update_profile))
            .route("/me/payments", web::get().to(payment_history)),
    );
}
