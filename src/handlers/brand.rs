use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;
use uuid::Uuid;

use super::current_user_id;
use crate::models::*;
use crate::services::BrandService;

#[utoipa::path(
    post,
    path = "/brand/assets",
    tag = "brand",
    params(
        ("name" = String, Query, description = "Asset name"),
        ("asset_type" = String, Query, description = "Content type, e.g. image/png")
    ),
    request_body(content = Vec<u8>, content_type = "application/octet-stream"),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Asset uploaded", body = BrandAsset),
        (status = 400, description = "Empty or oversized asset"),
        (status = 502, description = "Storage unreachable")
    )
)]
pub async fn upload_asset(
    brand_service: web::Data<BrandService>,
    req: HttpRequest,
    query: web::Query<UploadAssetQuery>,
    body: web::Bytes,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;

    match brand_service
        .upload_asset(user_id, &query.name, &query.asset_type, body.to_vec())
        .await
    {
        Ok(asset) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": asset
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/brand/assets",
    tag = "brand",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Brand assets"))
)]
pub async fn list_assets(
    brand_service: web::Data<BrandService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;

    match brand_service.list_assets(user_id).await {
        Ok(assets) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": assets
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/brand/assets/{id}",
    tag = "brand",
    params(("id" = Uuid, Path, description = "Asset id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Asset deleted"),
        (status = 404, description = "Asset not found")
    )
)]
pub async fn delete_asset(
    brand_service: web::Data<BrandService>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;

    match brand_service.delete_asset(user_id, path.into_inner()).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "message": "Asset deleted"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn brand_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/brand")
            .route("/assets", web::post().to(upload_asset))
            .route("/assets", web::get().to(list_assets))
            .route("/assets/{id}", web::delete().to(delete_asset)),
    );
}
