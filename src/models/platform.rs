use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "platform_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PlatformType {
    Twitch,
    YouTube,
    Facebook,
    TikTok,
    Instagram,
    Kick,
}

impl std::fmt::Display for PlatformType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlatformType::Twitch => write!(f, "twitch"),
            PlatformType::YouTube => write!(f, "youtube"),
            PlatformType::Facebook => write!(f, "facebook"),
            PlatformType::TikTok => write!(f, "tiktok"),
            PlatformType::Instagram => write!(f, "instagram"),
            PlatformType::Kick => write!(f, "kick"),
        }
    }
}

impl std::str::FromStr for PlatformType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "twitch" => Ok(PlatformType::Twitch),
            "youtube" => Ok(PlatformType::YouTube),
            "facebook" => Ok(PlatformType::Facebook),
            "tiktok" => Ok(PlatformType::TikTok),
            "instagram" => Ok(PlatformType::Instagram),
            "kick" => Ok(PlatformType::Kick),
            other => Err(format!("Unknown platform: {other}")),
        }
    }
}

/// Connection health. `Degraded` means the stored refresh token was rejected
/// and the user has to re-authorize; degraded connections are skipped by sync.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "connection_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    Connected,
    Degraded,
    Disconnected,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct PlatformConnection {
    pub id: Uuid,
    pub user_id: Uuid,
    pub platform: PlatformType,
    pub platform_user_id: String,
    pub platform_username: String,
    #[serde(skip_serializing)]
    pub access_token: Option<String>,
    #[serde(skip_serializing)]
    pub refresh_token: Option<String>,
    pub token_expires_at: Option<DateTime<Utc>>,
    pub is_primary: bool,
    pub is_active: bool,
    pub status: ConnectionStatus,
    pub last_synced_at: Option<DateTime<Utc>>,
    pub connected_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ConnectPlatformRequest {
    pub platform: PlatformType,
    /// OAuth authorization code returned by the platform redirect.
    pub auth_code: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ConnectionResponse {
    pub id: Uuid,
    pub platform: PlatformType,
    pub platform_user_id: String,
    pub platform_username: String,
    pub is_primary: bool,
    pub is_active: bool,
    pub status: ConnectionStatus,
    pub token_expires_at: Option<DateTime<Utc>>,
    pub last_synced_at: Option<DateTime<Utc>>,
    pub connected_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthorizeUrlResponse {
    pub platform: PlatformType,
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ValidateConnectionResponse {
    pub valid: bool,
    pub status: ConnectionStatus,
    pub token_expires_at: Option<DateTime<Utc>>,
}

impl From<PlatformConnection> for ConnectionResponse {
    fn from(c: PlatformConnection) -> Self {
        Self {
            id: c.id,
            platform: c.platform,
            platform_user_id: c.platform_user_id,
            platform_username: c.platform_username,
            is_primary: c.is_primary,
            is_active: c.is_active,
            status: c.status,
            token_expires_at: c.token_expires_at,
            last_synced_at: c.last_synced_at,
            connected_at: c.connected_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_platform_from_str() {
        assert_eq!(
            PlatformType::from_str("twitch").unwrap(),
            PlatformType::Twitch
        );
        assert_eq!(
            PlatformType::from_str("youtube").unwrap(),
            PlatformType::YouTube
        );
        assert!(PlatformType::from_str("myspace").is_err());
    }

    #[test]
    fn test_connection_response_hides_tokens() {
        let json = serde_json::to_value(ConnectionResponse {
            id: Uuid::new_v4(),
            platform: PlatformType::Twitch,
            platform_user_id: "12345".into(),
            platform_username: "alice".into(),
            is_primary: false,
            is_active: true,
            status: ConnectionStatus::Connected,
            token_expires_at: None,
            last_synced_at: None,
            connected_at: Utc::now(),
        })
        .unwrap();
        assert!(json.get("access_token").is_none());
        assert!(json.get("refresh_token").is_none());
    }
}
