use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

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
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::verify_email,
        handlers::auth::resend_verification,
        handlers::auth::forgot_password,
        handlers::auth::reset_password,
        handlers::auth::change_password,
        handlers::auth::refresh,
        handlers::auth::logout,
        handlers::user::get_profile,
        handlers::user::update_profile,
        handlers::user::payment_history,
        handlers::subscription::get_price,
        handlers::subscription::process_payment,
        handlers::subscription::redeem_gift_code,
        handlers::subscription::create_subscription,
        handlers::subscription::cancel_subscription,
        handlers::platform::authorize_url,
        handlers::platform::connect_platform,
        handlers::platform::list_connections,
        handlers::platform::validate_connection,
        handlers::platform::refresh_tokens,
        handlers::platform::set_primary,
        handlers::platform::sync_platform,
        handlers::platform::disconnect_platform,
        handlers::admin::create_admin,
        handlers::admin::create_gift_code,
        handlers::admin::list_gift_codes,
        handlers::admin::get_gift_code,
        handlers::admin::revoke_gift_code,
        handlers::admin::list_users,
        handlers::admin::update_user_subscription,
        handlers::admin::deactivate_user,
        handlers::admin::payment_records,
        handlers::admin::total_revenue,
        handlers::admin::subscription_stats,
        handlers::brand::upload_asset,
        handlers::brand::list_assets,
        handlers::brand::delete_asset,
    ),
    components(
        schemas(
            User,
            UserResponse,
            AuthResponse,
            RegisterRequest,
            LoginRequest,
            VerifyEmailRequest,
            ResendVerificationRequest,
            ForgotPasswordRequest,
            ResetPasswordRequest,
            ChangePasswordRequest,
            UpdateProfileRequest,
            SubscriptionTier,
            PriceQuery,
            PriceResponse,
            ProcessPaymentRequest,
            ProcessPaymentResponse,
            CreateSubscriptionRequest,
            CreateSubscriptionResponse,
            PaymentRecord,
            PaymentStatus,
            TransactionType,
            PaymentRangeQuery,
            RevenueResponse,
            TierCount,
            GiftCode,
            GiftCodeStatus,
            GiftCodeResponse,
            CreateGiftCodeRequest,
            RedeemGiftCodeRequest,
            RedeemGiftCodeResponse,
            PlatformType,
            ConnectionStatus,
            PlatformConnection,
            ConnectPlatformRequest,
            ConnectionResponse,
            AuthorizeUrlResponse,
            ValidateConnectionResponse,
            AdminRole,
            AdminUser,
            CreateAdminRequest,
            UpdateUserSubscriptionRequest,
            BrandAsset,
            UploadAssetQuery,
            PaginationParams,
            ApiError,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Authentication API"),
        (name = "user", description = "Account profile API"),
        (name = "subscription", description = "Subscription and billing API"),
        (name = "platform", description = "Platform connection API"),
        (name = "admin", description = "Back-office API"),
        (name = "brand", description = "Brand asset API"),
    ),
    info(
        title = "ClientTrackPro Backend API",
        version = "1.0.0",
        description = "ClientTrackPro REST API documentation"
    ),
    servers(
        (url = "/api/v1", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}
