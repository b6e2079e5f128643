pub mod admin;
pub mod auth;
pub mod brand;
pub mod platform;
pub mod subscription;
pub mod user;

pub use admin::admin_config;
pub use auth::auth_config;
pub use brand::brand_config;
pub use platform::platform_config;
pub use subscription::subscription_config;
pub use user::user_config;

use crate::error::AppError;
use actix_web::{HttpMessage, HttpRequest};
use uuid::Uuid;

/// User id placed in request extensions by the auth middleware.
pub(crate) fn current_user_id(req: &HttpRequest) -> Result<Uuid, AppError> {
    req.extensions()
        .get::<Uuid>()
        .copied()
        .ok_or_else(|| AppError::AuthError("Missing access token".to_string()))
}
