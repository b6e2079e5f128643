use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use super::SubscriptionTier;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "payment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "transaction_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Subscription,
    GiftCode,
    Refund,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct PaymentRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub payment_id: String,
    pub amount_cents: i64,
    pub currency: String,
    pub status: PaymentStatus,
    pub transaction_type: TransactionType,
    pub tier: Option<SubscriptionTier>,
    pub duration_days: Option<i32>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProcessPaymentRequest {
    /// Provider payment id to re-validate server-side.
    pub payment_id: String,
    pub tier: SubscriptionTier,
    #[serde(default)]
    pub is_annual: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProcessPaymentResponse {
    pub tier: SubscriptionTier,
    pub subscription_expires_at: DateTime<Utc>,
    pub payment_record_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PriceQuery {
    pub tier: SubscriptionTier,
    #[serde(default)]
    pub is_annual: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PriceResponse {
    pub tier: SubscriptionTier,
    pub is_annual: bool,
    pub amount_cents: i64,
    pub currency: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateSubscriptionRequest {
    pub tier: SubscriptionTier,
    #[serde(default)]
    pub is_annual: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateSubscriptionResponse {
    pub subscription_id: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PaymentRangeQuery {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RevenueResponse {
    pub total_cents: i64,
    pub currency: String,
}

#[derive(Debug, Serialize, Deserialize, FromRow, ToSchema)]
pub struct TierCount {
    pub tier: SubscriptionTier,
    pub count: i64,
}
