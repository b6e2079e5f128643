use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use super::SubscriptionTier;

/// Redeemed and revoked are distinct terminal states; "expired" is derived
/// from `expires_at` at read time and never written.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "gift_code_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum GiftCodeStatus {
    Active,
    Redeemed,
    Revoked,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct GiftCode {
    pub id: Uuid,
    pub code: String,
    pub tier: SubscriptionTier,
    pub duration_days: i32,
    pub status: GiftCodeStatus,
    pub used_by_user_id: Option<Uuid>,
    pub used_at: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
    pub created_by_admin_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl GiftCode {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }

    pub fn is_redeemable(&self, now: DateTime<Utc>) -> bool {
        self.status == GiftCodeStatus::Active && !self.is_expired(now)
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateGiftCodeRequest {
    pub tier: SubscriptionTier,
    #[schema(example = 30)]
    pub duration_days: i32,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RedeemGiftCodeRequest {
    #[schema(example = "A7K2P9XQ")]
    pub code: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RedeemGiftCodeResponse {
    pub tier: SubscriptionTier,
    pub subscription_expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GiftCodeResponse {
    pub id: Uuid,
    pub code: String,
    pub tier: SubscriptionTier,
    pub duration_days: i32,
    pub status: GiftCodeStatus,
    /// Derived: an active code past its expiry is unusable.
    pub expired: bool,
    pub used_by_user_id: Option<Uuid>,
    pub used_at: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<GiftCode> for GiftCodeResponse {
    fn from(code: GiftCode) -> Self {
        let expired = code.is_expired(Utc::now());
        Self {
            id: code.id,
            code: code.code,
            tier: code.tier,
            duration_days: code.duration_days,
            status: code.status,
            expired,
            used_by_user_id: code.used_by_user_id,
            used_at: code.used_at,
            expires_at: code.expires_at,
            created_at: code.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample(status: GiftCodeStatus, expires_in_days: i64) -> GiftCode {
        GiftCode {
            id: Uuid::new_v4(),
            code: "A7K2P9XQ".into(),
            tier: SubscriptionTier::Streamer,
            duration_days: 30,
            status,
            used_by_user_id: None,
            used_at: None,
            expires_at: Utc::now() + Duration::days(expires_in_days),
            created_by_admin_id: Uuid::new_v4(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_redeemable_only_while_active_and_unexpired() {
        let now = Utc::now();
        assert!(sample(GiftCodeStatus::Active, 10).is_redeemable(now));
        assert!(!sample(GiftCodeStatus::Active, -1).is_redeemable(now));
        assert!(!sample(GiftCodeStatus::Redeemed, 10).is_redeemable(now));
        assert!(!sample(GiftCodeStatus::Revoked, 10).is_redeemable(now));
    }
}
