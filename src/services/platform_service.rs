use crate::error::{AppError, AppResult};
use crate::external::{PlatformOAuthClient, TokenSet};
use crate::models::*;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

/// Streaming/social platform connections: OAuth linking, token upkeep, the
/// primary-connection flag and sync bookkeeping.
#[derive(Clone)]
pub struct PlatformService {
    pool: PgPool,
    oauth_client: PlatformOAuthClient,
}

impl PlatformService {
    pub fn new(pool: PgPool, oauth_client: PlatformOAuthClient) -> Self {
        Self { pool, oauth_client }
    }

    pub fn authorize_url(&self, platform: PlatformType) -> AppResult<AuthorizeUrlResponse> {
        let url = self.oauth_client.authorize_url(platform)?;
        Ok(AuthorizeUrlResponse { platform, url })
    }

    /// Exchanges the authorization code, fetches the platform profile, and
    /// stores the connection. One active connection per user and platform;
    /// the first connection a user makes becomes primary.
    pub async fn connect_platform(
        &self,
        user_id: Uuid,
        request: ConnectPlatformRequest,
    ) -> AppResult<ConnectionResponse> {
        let tokens = self
            .oauth_client
            .exchange_code(request.platform, &request.auth_code)
            .await?;
        let profile = self
            .oauth_client
            .get_user_profile(request.platform, &tokens.access_token)
            .await?;

        let existing = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id FROM platform_connections
            WHERE user_id = $1 AND platform = $2 AND is_active
            "#,
        )
        .bind(user_id)
        .bind(request.platform)
        .fetch_optional(&self.pool)
        .await?;
        if existing.is_some() {
            return Err(AppError::Conflict(format!(
                "{} is already connected",
                request.platform
            )));
        }

        let has_primary = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM platform_connections WHERE user_id = $1 AND is_primary",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .is_some();

        let connection = sqlx::query_as::<_, PlatformConnection>(
            r#"
            INSERT INTO platform_connections (
                id, user_id, platform, platform_user_id, platform_username,
                access_token, refresh_token, token_expires_at,
                is_primary, is_active, status
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, TRUE, $10)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(request.platform)
        .bind(&profile.id)
        .bind(&profile.username)
        .bind(&tokens.access_token)
        .bind(&tokens.refresh_token)
        .bind(tokens.expires_at)
        .bind(!has_primary)
        .bind(ConnectionStatus::Connected)
        .fetch_one(&self.pool)
        .await?;

        log::info!(
            "User {} connected {} as {}",
            user_id,
            connection.platform,
            connection.platform_username
        );

        Ok(ConnectionResponse::from(connection))
    }

    pub async fn list_connections(&self, user_id: Uuid) -> AppResult<Vec<ConnectionResponse>> {
        let connections = sqlx::query_as::<_, PlatformConnection>(
            r#"
            SELECT * FROM platform_connections
            WHERE user_id = $1 AND is_active
            ORDER BY connected_at
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(connections.into_iter().map(ConnectionResponse::from).collect())
    }

    /// Checks whether the stored access token is still usable, refreshing it
    /// first when it has expired. A failed refresh leaves the connection
    /// degraded rather than valid.
    pub async fn validate_connection(
        &self,
        user_id: Uuid,
        connection_id: Uuid,
    ) -> AppResult<ValidateConnectionResponse> {
        let connection = self.get_connection(user_id, connection_id).await?;

        if !connection.is_active {
            return Ok(ValidateConnectionResponse {
                valid: false,
                status: connection.status,
                token_expires_at: None,
            });
        }

        let expired = connection
            .token_expires_at
            .is_some_and(|at| at <= Utc::now());

        if !expired && connection.status == ConnectionStatus::Connected {
            return Ok(ValidateConnectionResponse {
                valid: true,
                status: connection.status,
                token_expires_at: connection.token_expires_at,
            });
        }

        match self.refresh_connection(&connection).await {
            Ok(refreshed) => Ok(ValidateConnectionResponse {
                valid: true,
                status: refreshed.status,
                token_expires_at: refreshed.token_expires_at,
            }),
            Err(e) => {
                log::warn!(
                    "Validation refresh failed for connection {}: {:?}",
                    connection_id,
                    e
                );
                Ok(ValidateConnectionResponse {
                    valid: false,
                    status: ConnectionStatus::Degraded,
                    token_expires_at: connection.token_expires_at,
                })
            }
        }
    }

    pub async fn refresh_tokens(
        &self,
        user_id: Uuid,
        connection_id: Uuid,
    ) -> AppResult<ConnectionResponse> {
        let connection = self.get_connection(user_id, connection_id).await?;
        let refreshed = self.refresh_connection(&connection).await?;
        Ok(ConnectionResponse::from(refreshed))
    }

    async fn refresh_connection(
        &self,
        connection: &PlatformConnection,
    ) -> AppResult<PlatformConnection> {
        let refresh_token = connection.refresh_token.as_deref().ok_or_else(|| {
            AppError::ValidationError("Connection has no refresh token".to_string())
        })?;

        match self
            .oauth_client
            .refresh_token(connection.platform, refresh_token)
            .await
        {
            Ok(tokens) => self.store_refreshed_tokens(connection.id, tokens).await,
            Err(e) => {
                // Mark degraded so sync skips this connection until the user
                // re-authorizes.
                sqlx::query(
                    r#"
                    UPDATE platform_connections
                    SET status = $1, updated_at = NOW()
                    WHERE id = $2
                    "#,
                )
                .bind(ConnectionStatus::Degraded)
                .bind(connection.id)
                .execute(&self.pool)
                .await?;
                Err(e)
            }
        }
    }

    async fn store_refreshed_tokens(
        &self,
        connection_id: Uuid,
        tokens: TokenSet,
    ) -> AppResult<PlatformConnection> {
        let connection = sqlx::query_as::<_, PlatformConnection>(
            r#"
            UPDATE platform_connections
            SET access_token = $1,
                refresh_token = COALESCE($2, refresh_token),
                token_expires_at = $3,
                status = $4,
                updated_at = NOW()
            WHERE id = $5
            RETURNING *
            "#,
        )
        .bind(&tokens.access_token)
        .bind(&tokens.refresh_token)
        .bind(tokens.expires_at)
        .bind(ConnectionStatus::Connected)
        .bind(connection_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(connection)
    }

    /// At most one primary per user, enforced by a partial unique index. The
    /// clear-then-set runs inside one transaction so no other request ever
    /// observes zero or two primaries.
    pub async fn set_primary(
        &self,
        user_id: Uuid,
        connection_id: Uuid,
    ) -> AppResult<ConnectionResponse> {
        let connection = self.get_connection(user_id, connection_id).await?;
        if !connection.is_active {
            return Err(AppError::ValidationError(
                "Cannot make an inactive connection primary".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "UPDATE platform_connections SET is_primary = FALSE, updated_at = NOW() WHERE user_id = $1 AND is_primary",
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        let connection = sqlx::query_as::<_, PlatformConnection>(
            r#"
            UPDATE platform_connections
            SET is_primary = TRUE, updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(connection_id)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(ConnectionResponse::from(connection))
    }

    /// Deactivates the connection and drops its tokens. The row survives for
    /// history; a later reconnect inserts a fresh row.
    pub async fn disconnect_platform(
        &self,
        user_id: Uuid,
        connection_id: Uuid,
    ) -> AppResult<()> {
        let connection = self.get_connection(user_id, connection_id).await?;

        sqlx::query(
            r#"
            UPDATE platform_connections
            SET is_active = FALSE,
                is_primary = FALSE,
                status = $1,
                access_token = NULL,
                refresh_token = NULL,
                token_expires_at = NULL,
                updated_at = NOW()
            WHERE id = $2
            "#,
        )
        .bind(ConnectionStatus::Disconnected)
        .bind(connection.id)
        .execute(&self.pool)
        .await?;

        log::info!("User {} disconnected {}", user_id, connection.platform);
        Ok(())
    }

    /// Marks a sync pass for the connection. Degraded connections are refused
    /// until their tokens are repaired.
    pub async fn sync_platform(
        &self,
        user_id: Uuid,
        connection_id: Uuid,
    ) -> AppResult<ConnectionResponse> {
        let connection = self.get_connection(user_id, connection_id).await?;

        if !connection.is_active {
            return Err(AppError::ValidationError(
                "Connection is not active".to_string(),
            ));
        }
        if connection.status == ConnectionStatus::Degraded {
            return Err(AppError::Conflict(
                "Connection is degraded, re-authorize the platform first".to_string(),
            ));
        }

        let connection = sqlx::query_as::<_, PlatformConnection>(
            r#"
            UPDATE platform_connections
            SET last_synced_at = NOW(), updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(connection.id)
        .fetch_one(&self.pool)
        .await?;

        Ok(ConnectionResponse::from(connection))
    }

    async fn get_connection(
        &self,
        user_id: Uuid,
        connection_id: Uuid,
    ) -> AppResult<PlatformConnection> {
        sqlx::query_as::<_, PlatformConnection>(
            "SELECT * FROM platform_connections WHERE id = $1 AND user_id = $2",
        )
        .bind(connection_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Connection not found".to_string()))
    }
}
