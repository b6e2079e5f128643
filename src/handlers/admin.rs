use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;
use uuid::Uuid;

use super::current_user_id;
use crate::models::*;
use crate::services::AdminService;

#[utoipa::path(
    post,
    path = "/admin/admins",
    tag = "admin",
    request_body = CreateAdminRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Admin created", body = AdminUser),
        (status = 403, description = "Super admin access required"),
        (status = 409, description = "User is already an admin")
    )
)]
pub async fn create_admin(
    admin_service: web::Data<AdminService>,
    req: HttpRequest,
    request: web::Json<CreateAdminRequest>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;
    if let Err(e) = admin_service.require_super_admin(user_id).await {
        return Ok(e.error_response());
    }

    match admin_service.create_admin(request.into_inner()).await {
        Ok(admin) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": admin
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/gift-codes",
    tag = "admin",
    request_body = CreateGiftCodeRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Gift code created", body = GiftCodeResponse),
        (status = 403, description = "Admin access required")
    )
)]
pub async fn create_gift_code(
    admin_service: web::Data<AdminService>,
    req: HttpRequest,
    request: web::Json<CreateGiftCodeRequest>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;
    let admin = match admin_service.require_admin(user_id).await {
        Ok(admin) => admin,
        Err(e) => return Ok(e.error_response()),
    };

    match admin_service
        .create_gift_code(admin.id, request.into_inner())
        .await
    {
        Ok(code) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": code
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/gift-codes",
    tag = "admin",
    params(
        ("page" = Option<u32>, Query, description = "Page number"),
        ("page_size" = Option<u32>, Query, description = "Items per page")
    ),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Gift codes"),
        (status = 403, description = "Admin access required")
    )
)]
pub async fn list_gift_codes(
    admin_service: web::Data<AdminService>,
    req: HttpRequest,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;
    if let Err(e) = admin_service.require_admin(user_id).await {
        return Ok(e.error_response());
    }

    match admin_service.list_gift_codes(query.into_inner()).await {
        Ok(codes) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": codes
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/gift-codes/{code}",
    tag = "admin",
    params(("code" = String, Path, description = "Gift code")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Gift code details", body = GiftCodeResponse),
        (status = 404, description = "Gift code not found")
    )
)]
pub async fn get_gift_code(
    admin_service: web::Data<AdminService>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;
    if let Err(e) = admin_service.require_admin(user_id).await {
        return Ok(e.error_response());
    }

    match admin_service.get_gift_code(&path).await {
        Ok(code) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": code
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/admin/gift-codes/{code}/revoke",
    tag = "admin",
    params(("code" = String, Path, description = "Gift code")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Gift code revoked", body = GiftCodeResponse),
        (status = 409, description = "Gift code is not active")
    )
)]
pub async fn revoke_gift_code(
    admin_service: web::Data<AdminService>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;
    if let Err(e) = admin_service.require_admin(user_id).await {
        return Ok(e.error_response());
    }

    match admin_service.revoke_gift_code(&path).await {
        Ok(code) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": code
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/users",
    tag = "admin",
    params(
        ("page" = Option<u32>, Query, description = "Page number"),
        ("page_size" = Option<u32>, Query, description = "Items per page")
    ),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Users"),
        (status = 403, description = "Admin access required")
    )
)]
pub async fn list_users(
    admin_service: web::Data<AdminService>,
    req: HttpRequest,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;
    if let Err(e) = admin_service.require_admin(user_id).await {
        return Ok(e.error_response());
    }

    match admin_service.list_users(query.into_inner()).await {
        Ok(users) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": users
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/admin/users/{id}/subscription",
    tag = "admin",
    params(("id" = Uuid, Path, description = "User id")),
    request_body = UpdateUserSubscriptionRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Subscription updated", body = UserResponse),
        (status = 404, description = "User not found")
    )
)]
pub async fn update_user_subscription(
    admin_service: web::Data<AdminService>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    request: web::Json<UpdateUserSubscriptionRequest>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;
    if let Err(e) = admin_service.require_admin(user_id).await {
        return Ok(e.error_response());
    }

    match admin_service
        .update_user_subscription(path.into_inner(), request.into_inner())
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
    post,
    path = "/admin/users/{id}/deactivate",
    tag = "admin",
    params(("id" = Uuid, Path, description = "User id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "User deactivated"),
        (status = 404, description = "User not found")
    )
)]
pub async fn deactivate_user(
    admin_service: web::Data<AdminService>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;
    if let Err(e) = admin_service.require_admin(user_id).await {
        return Ok(e.error_response());
    }

    match admin_service.deactivate_user(path.into_inner()).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "message": "User deactivated"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/payments",
    tag = "admin",
    params(
        ("start" = String, Query, description = "Range start (RFC 3339)"),
        ("end" = String, Query, description = "Range end (RFC 3339)"),
        ("page" = Option<u32>, Query, description = "Page number"),
        ("page_size" = Option<u32>, Query, description = "Items per page")
    ),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Payment records in range"),
        (status = 403, description = "Admin access required")
    )
)]
pub async fn payment_records(
    admin_service: web::Data<AdminService>,
    req: HttpRequest,
    range: web::Query<PaymentRangeQuery>,
    pagination: web::Query<PaginationParams>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;
    if let Err(e) = admin_service.require_admin(user_id).await {
        return Ok(e.error_response());
    }

    match admin_service
        .payment_records(&range, pagination.into_inner())
        .await
    {
        Ok(records) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": records
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/revenue",
    tag = "admin",
    params(
        ("start" = String, Query, description = "Range start (RFC 3339)"),
        ("end" = String, Query, description = "Range end (RFC 3339)")
    ),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Completed revenue in range", body = RevenueResponse),
        (status = 403, description = "Admin access required")
    )
)]
pub async fn total_revenue(
    admin_service: web::Data<AdminService>,
    req: HttpRequest,
    range: web::Query<PaymentRangeQuery>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;
    if let Err(e) = admin_service.require_admin(user_id).await {
        return Ok(e.error_response());
    }

    match admin_service.total_revenue(&range).await {
        Ok(revenue) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": revenue
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/stats/subscriptions",
    tag = "admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Active users per tier"),
        (status = 403, description = "Admin access required")
    )
)]
pub async fn subscription_stats(
    admin_service: web::Data<AdminService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;
    if let Err(e) = admin_service.require_admin(user_id).await {
        return Ok(e.error_response());
    }

    match admin_service.subscription_stats().await {
        Ok(stats) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": stats
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn admin_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .route("/admins", web::post().to(create_admin))
            .route("/gift-codes", web::post().to(create_gift_code))
            .route("/gift-codes", web::get().to(list_gift_codes))
            .route("/gift-codes/{code}", web::get().to(get_gift_code))
            .route("/gift-codes/{code}/revoke", web::post().to(revoke_gift_code))
            .route("/users", web::get().to(list_users))
            .route(
                "/users/{id}/subscription",
                web::put().to(update_user_subscription),
            )
            .route("/users/{id}/deactivate", web::post().to(deactivate_user))
            .route("/payments", web::get().to(payment_records))
            .route("/revenue", web::get().to(total_revenue))
            .route("/stats/subscriptions", web::get().to(subscription_stats)),
    );
}
