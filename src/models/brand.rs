use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BrandAsset {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub asset_type: String,
    pub url: String,
    pub thumbnail_url: Option<String>,
    pub size_bytes: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadAssetQuery {
    #[schema(example = "logo-main")]
    pub name: String,
    #[schema(example = "image/png")]
    pub asset_type: String,
}
