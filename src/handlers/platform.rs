use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;
use std::str::FromStr;
use uuid::Uuid;

use super::current_user_id;
use crate::error::AppError;
use crate::models::*;
use crate::services::PlatformService;

#[utoipa::path(
    get,
    path = "/platforms/{platform}/authorize-url",
    tag = "platform",
    params(("platform" = String, Path, description = "Platform name, e.g. twitch")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "OAuth authorization URL", body = AuthorizeUrlResponse),
        (status = 400, description = "Unknown platform")
    )
)]
pub async fn authorize_url(
    platform_service: web::Data<PlatformService>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let platform = match PlatformType::from_str(&path) {
        Ok(platform) => platform,
        Err(e) => return Ok(AppError::ValidationError(e).error_response()),
    };

    match platform_service.authorize_url(platform) {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/platforms",
    tag = "platform",
    request_body = ConnectPlatformRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Platform connected", body = ConnectionResponse),
        (status = 409, description = "Platform already connected"),
        (status = 502, description = "Platform API unreachable")
    )
)]
pub async fn connect_platform(
    platform_service: web::Data<PlatformService>,
    req: HttpRequest,
    request: web::Json<ConnectPlatformRequest>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;

    match platform_service
        .connect_platform(user_id, request.into_inner())
        .await
    {
        Ok(connection) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": connection
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/platforms",
    tag = "platform",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Active platform connections"))
)]
pub async fn list_connections(
    platform_service: web::Data<PlatformService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;

    match platform_service.list_connections(user_id).await {
        Ok(connections) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": connections
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/platforms/{id}/validate",
    tag = "platform",
    params(("id" = Uuid, Path, description = "Connection id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Validation result", body = ValidateConnectionResponse),
        (status = 404, description = "Connection not found")
    )
)]
pub async fn validate_connection(
    platform_service: web::Data<PlatformService>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;

    match platform_service
        .validate_connection(user_id, path.into_inner())
        .await
    {
        Ok(result) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": result
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/platforms/{id}/refresh",
    tag = "platform",
    params(("id" = Uuid, Path, description = "Connection id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Tokens refreshed", body = ConnectionResponse),
        (status = 502, description = "Platform rejected the refresh, connection degraded")
    )
)]
pub async fn refresh_tokens(
    platform_service: web::Data<PlatformService>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;

    match platform_service
        .refresh_tokens(user_id, path.into_inner())
        .await
    {
        Ok(connection) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": connection
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/platforms/{id}/primary",
    tag = "platform",
    params(("id" = Uuid, Path, description = "Connection id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Connection marked primary", body = ConnectionResponse),
        (status = 404, description = "Connection not found")
    )
)]
pub async fn set_primary(
    platform_service: web::Data<PlatformService>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;

    match platform_service.set_primary(user_id, path.into_inner()).await {
        Ok(connection) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": connection
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/platforms/{id}/sync",
    tag = "platform",
    params(("id" = Uuid, Path, description = "Connection id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Sync recorded", body = ConnectionResponse),
        (status = 409, description = "Connection is degraded")
    )
)]
pub async fn sync_platform(
    platform_service: web::Data<PlatformService>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;

    match platform_service
        .sync_platform(user_id, path.into_inner())
        .await
    {
        Ok(connection) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": connection
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/platforms/{id}",
    tag = "platform",
    params(("id" = Uuid, Path, description = "Connection id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Platform disconnected"),
        (status = 404, description = "Connection not found")
    )
)]
pub async fn disconnect_platform(
    platform_service: web::Data<PlatformService>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;

    match platform_service
        .disconnect_platform(user_id, path.into_inner())
        .await
    {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "message": "Platform disconnected"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn platform_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/platforms")
            .route("", web::get().to(list_connections))
            .route("", web::post().to(connect_platform))
            .route("/{platform}/authorize-url", web::get().to(authorize_url))
            .route("/{id}/validate", web::post().to(validate_connection))
            .route("/{id}/refresh", web::post().to(refresh_tokens))
            .route("/{id}/primary", web::post().to(set_primary))
            .route("/{id}/sync", web::post().to(sync_platform))
            .route("/{id}", web::delete().to(disconnect_platform)),
    );
}
