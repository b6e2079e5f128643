use crate::error::{AppError, AppResult};
use crate::external::StorageClient;
use crate::models::BrandAsset;
use sqlx::PgPool;
use uuid::Uuid;

const MAX_ASSET_BYTES: usize = 10 * 1024 * 1024;

/// Brand assets (logos, overlays) stored in object storage with a database
/// row per asset.
#[derive(Clone)]
pub struct BrandService {
    pool: PgPool,
    storage_client: StorageClient,
}

impl BrandService {
    pub fn new(pool: PgPool, storage_client: StorageClient) -> Self {
        Self {
            pool,
            storage_client,
        }
    }

    pub async fn upload_asset(
        &self,
        user_id: Uuid,
        name: &str,
        asset_type: &str,
        bytes: Vec<u8>,
    ) -> AppResult<BrandAsset> {
        if bytes.is_empty() {
            return Err(AppError::ValidationError("Asset is empty".to_string()));
        }
        if bytes.len() > MAX_ASSET_BYTES {
            return Err(AppError::ValidationError(
                "Asset exceeds the 10 MB limit".to_string(),
            ));
        }
        if name.is_empty() || name.len() > 128 {
            return Err(AppError::ValidationError(
                "Asset name must be 1-128 characters".to_string(),
            ));
        }

        let asset_id = Uuid::new_v4();
        let key = format!("{}/{}-{}", user_id, asset_id.simple(), name);
        let size_bytes = bytes.len() as i64;
        let url = self.storage_client.upload(&key, bytes, asset_type).await?;

        let asset = sqlx::query_as::<_, BrandAsset>(
            r#"
            INSERT INTO brand_assets (id, user_id, name, asset_type, url, size_bytes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(asset_id)
        .bind(user_id)
        .bind(name)
        .bind(asset_type)
        .bind(&url)
        .bind(size_bytes)
        .fetch_one(&self.pool)
        .await?;

        log::info!("User {} uploaded asset {} ({} bytes)", user_id, name, size_bytes);
        Ok(asset)
    }

    pub async fn list_assets(&self, user_id: Uuid) -> AppResult<Vec<BrandAsset>> {
        let assets = sqlx::query_as::<_, BrandAsset>(
            "SELECT * FROM brand_assets WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(assets)
    }

    /// Deletes the row first; the storage object is removed best-effort and an
    /// orphaned object only costs space.
    pub async fn delete_asset(&self, user_id: Uuid, asset_id: Uuid) -> AppResult<()> {
        let asset = sqlx::query_as::<_, BrandAsset>(
            "DELETE FROM brand_assets WHERE id = $1 AND user_id = $2 RETURNING *",
        )
        .bind(asset_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Asset not found".to_string()))?;

        // object_url("") is the "{base}/{bucket}/" prefix of every stored url.
        if let Some(key) = asset.url.strip_prefix(&self.storage_client.object_url(""))
            && let Err(e) = self.storage_client.delete(key).await
        {
            log::warn!("Failed to delete storage object for asset {}: {:?}", asset_id, e);
        }

        Ok(())
    }
}
