use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "subscription_tier", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionTier {
    Free,
    Streamer,
    Mogul,
}

impl SubscriptionTier {
    /// Price in cents; the free tier is not purchasable.
    pub fn price_cents(&self, is_annual: bool) -> Option<i64> {
        match self {
            SubscriptionTier::Streamer => Some(if is_annual { 9999 } else { 999 }),
            SubscriptionTier::Mogul => Some(if is_annual { 29999 } else { 2999 }),
            SubscriptionTier::Free => None,
        }
    }
}

impl std::fmt::Display for SubscriptionTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubscriptionTier::Free => write!(f, "free"),
            SubscriptionTier::Streamer => write!(f, "streamer"),
            SubscriptionTier::Mogul => write!(f, "mogul"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_active: bool,
    pub email_verified: bool,
    #[serde(skip_serializing)]
    pub verification_code: Option<String>,
    #[serde(skip_serializing)]
    pub verification_expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing)]
    pub password_reset_token: Option<String>,
    #[serde(skip_serializing)]
    pub password_reset_expires_at: Option<DateTime<Utc>>,
    pub subscription_tier: SubscriptionTier,
    pub subscription_expires_at: Option<DateTime<Utc>>,
    pub paypal_subscription_id: Option<String>,
    pub data_processing_consent: bool,
    pub marketing_consent: bool,
    pub risk_score: i32,
    pub last_login_at: Option<DateTime<Utc>>,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    #[schema(example = "creator@example.com")]
    pub email: String,
    #[schema(example = "alice")]
    pub username: String,
    #[schema(example = "Password123")]
    pub password: String,
    #[serde(default)]
    pub marketing_consent: bool,
    #[serde(default)]
    pub data_processing_consent: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "creator@example.com")]
    pub email: String,
    #[schema(example = "Password123")]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VerifyEmailRequest {
    pub email: String,
    #[schema(example = "123456")]
    pub code: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ResendVerificationRequest {
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ResetPasswordRequest {
    pub email: String,
    pub token: String,
    pub new_password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    pub username: Option<String>,
    pub marketing_consent: Option<bool>,
    pub data_processing_consent: Option<bool>,
    /// Row version the client last read; a stale version is rejected.
    pub version: i32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub email_verified: bool,
    pub subscription_tier: SubscriptionTier,
    pub subscription_expires_at: Option<DateTime<Utc>>,
    pub marketing_consent: bool,
    pub data_processing_consent: bool,
    pub version: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            username: user.username,
            email_verified: user.email_verified,
            subscription_tier: user.subscription_tier,
            subscription_expires_at: user.subscription_expires_at,
            marketing_consent: user.marketing_consent,
            data_processing_consent: user.data_processing_consent,
            version: user.version,
            created_at: user.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_table() {
        assert_eq!(SubscriptionTier::Streamer.price_cents(false), Some(999));
        assert_eq!(SubscriptionTier::Streamer.price_cents(true), Some(9999));
        assert_eq!(SubscriptionTier::Mogul.price_cents(false), Some(2999));
        assert_eq!(SubscriptionTier::Mogul.price_cents(true), Some(29999));
        assert_eq!(SubscriptionTier::Free.price_cents(false), None);
        assert_eq!(SubscriptionTier::Free.price_cents(true), None);
    }

    #[test]
    fn test_tier_serde_round_trip() {
        let json = serde_json::to_string(&SubscriptionTier::Mogul).unwrap();
        assert_eq!(json, "\"mogul\"");
        let tier: SubscriptionTier = serde_json::from_str("\"streamer\"").unwrap();
        assert_eq!(tier, SubscriptionTier::Streamer);
    }
}
