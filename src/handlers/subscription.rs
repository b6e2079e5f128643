use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

use super::current_user_id;
use crate::models::*;
use crate::services::AccountService;

#[utoipa::path(
    get,
    path = "/subscription/price",
    tag = "subscription",
    params(
        ("tier" = SubscriptionTier, Query, description = "Subscription tier"),
        ("is_annual" = Option<bool>, Query, description = "Annual billing")
    ),
    responses(
        (status = 200, description = "Price for the tier", body = PriceResponse),
        (status = 400, description = "Tier cannot be purchased")
    )
)]
pub async fn get_price(
    account_service: web::Data<AccountService>,
    query: web::Query<PriceQuery>,
) -> Result<HttpResponse> {
    match account_service.subscription_price(query.tier, query.is_annual) {
        Ok(amount_cents) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": PriceResponse {
                tier: query.tier,
                is_annual: query.is_annual,
                amount_cents,
                currency: "USD".to_string(),
            }
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/subscription/payment",
    tag = "subscription",
    request_body = ProcessPaymentRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Payment accepted, tier upgraded", body = ProcessPaymentResponse),
        (status = 400, description = "Payment was not approved by the provider"),
        (status = 502, description = "Payment provider unreachable")
    )
)]
pub async fn process_payment(
    account_service: web::Data<AccountService>,
    req: HttpRequest,
    request: web::Json<ProcessPaymentRequest>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;

    match account_service
        .process_payment(user_id, request.into_inner())
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
    path = "/subscription/gift-code/redeem",
    tag = "subscription",
    request_body = RedeemGiftCodeRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Gift code redeemed", body = RedeemGiftCodeResponse),
        (status = 404, description = "Gift code not found"),
        (status = 409, description = "Gift code already used or revoked"),
        (status = 410, description = "Gift code expired")
    )
)]
pub async fn redeem_gift_code(
    account_service: web::Data<AccountService>,
    req: HttpRequest,
    request: web::Json<RedeemGiftCodeRequest>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;

    match account_service.redeem_gift_code(user_id, &request.code).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/subscription",
    tag = "subscription",
    request_body = CreateSubscriptionRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Recurring subscription created", body = CreateSubscriptionResponse),
        (status = 502, description = "Payment provider unreachable")
    )
)]
pub async fn create_subscription(
    account_service: web::Data<AccountService>,
    req: HttpRequest,
    request: web::Json<CreateSubscriptionRequest>,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;

    match account_service
        .create_subscription(user_id, request.into_inner())
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
    delete,
    path = "/subscription",
    tag = "subscription",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Subscription cancelled, account back on the free tier", body = UserResponse),
        (status = 502, description = "Payment provider unreachable")
    )
)]
pub async fn cancel_subscription(
    account_service: web::Data<AccountService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user_id = current_user_id(&req)?;

    match account_service.cancel_subscription(user_id).await {
        Ok(user) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": user
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn subscription_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/subscription")
            .route("/price", web::get().to(get_price))
            .route("/payment", web::post().to(process_payment))
            .route("/gift-code/redeem", web::post().to(redeem_gift_code))
            .route("", web::post().to(create_subscription))
            .route("", web::delete().to(cancel_subscription)),
    );
}
