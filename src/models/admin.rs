use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use super::SubscriptionTier;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "admin_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AdminRole {
    SuperAdmin,
    Admin,
    Moderator,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct AdminUser {
    pub id: Uuid,
    pub user_id: Uuid,
    pub role: AdminRole,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateAdminRequest {
    pub user_id: Uuid,
    pub role: AdminRole,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateUserSubscriptionRequest {
    pub tier: SubscriptionTier,
    pub duration_days: i32,
}
