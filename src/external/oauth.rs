use crate::config::{PlatformCredentials, PlatformsConfig};
use crate::error::{AppError, AppResult};
use crate::models::PlatformType;
use chrono::{DateTime, Duration, Utc};
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::Value;

const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Tokens returned by an authorization-code exchange or a refresh.
#[derive(Debug, Clone)]
pub struct TokenSet {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct PlatformProfile {
    pub id: String,
    pub username: String,
}

#[derive(Debug, Deserialize)]
struct OAuthTokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
}

struct PlatformEndpoints {
    authorize_url: &'static str,
    token_url: &'static str,
    profile_url: &'static str,
    scope: &'static str,
    /// JSON pointers into the profile payload.
    profile_id_ptr: &'static str,
    profile_username_ptr: &'static str,
}

fn endpoints(platform: PlatformType) -> PlatformEndpoints {
    match platform {
        PlatformType::Twitch => PlatformEndpoints {
            authorize_url: "https://id.twitch.tv/oauth2/authorize",
            token_url: "https://id.twitch.tv/oauth2/token",
            profile_url: "https://api.twitch.tv/helix/users",
            scope: "user:read:email channel:read:subscriptions",
            profile_id_ptr: "/data/0/id",
            profile_username_ptr: "/data/0/login",
        },
        PlatformType::YouTube => PlatformEndpoints {
            authorize_url: "https://accounts.google.com/o/oauth2/v2/auth",
            token_url: "https://oauth2.googleapis.com/token",
            profile_url: "https://www.googleapis.com/oauth2/v2/userinfo",
            scope: "https://www.googleapis.com/auth/youtube.readonly",
            profile_id_ptr: "/id",
            profile_username_ptr: "/name",
        },
        PlatformType::Facebook => PlatformEndpoints {
            authorize_url: "https://www.facebook.com/v12.0/dialog/oauth",
            token_url: "https://graph.facebook.com/v12.0/oauth/access_token",
            profile_url: "https://graph.facebook.com/me",
            scope: "email public_profile",
            profile_id_ptr: "/id",
            profile_username_ptr: "/name",
        },
        PlatformType::TikTok => PlatformEndpoints {
            authorize_url: "https://www.tiktok.com/auth/authorize",
            token_url: "https://open-api.tiktok.com/oauth/access_token",
            profile_url: "https://open-api.tiktok.com/user/info",
            scope: "user.info.basic",
            profile_id_ptr: "/data/user/open_id",
            profile_username_ptr: "/data/user/display_name",
        },
        PlatformType::Instagram => PlatformEndpoints {
            authorize_url: "https://api.instagram.com/oauth/authorize",
            token_url: "https://api.instagram.com/oauth/access_token",
            profile_url: "https://graph.instagram.com/me",
            scope: "user_profile",
            profile_id_ptr: "/id",
            profile_username_ptr: "/username",
        },
        PlatformType::Kick => PlatformEndpoints {
            authorize_url: "https://id.kick.com/oauth/authorize",
            token_url: "https://id.kick.com/oauth/token",
            profile_url: "https://api.kick.com/public/v1/users",
            scope: "user:read",
            profile_id_ptr: "/data/0/user_id",
            profile_username_ptr: "/data/0/name",
        },
    }
}

/// OAuth2 authorization-code client for the supported streaming/social
/// platforms. One client handles every platform; credentials come from config.
#[derive(Clone)]
pub struct PlatformOAuthClient {
    client: Client,
    config: PlatformsConfig,
}

impl PlatformOAuthClient {
    pub fn new(config: PlatformsConfig) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .expect("failed to build HTTP client"),
            config,
        }
    }

    fn credentials(&self, platform: PlatformType) -> &PlatformCredentials {
        match platform {
            PlatformType::Twitch => &self.config.twitch,
            PlatformType::YouTube => &self.config.youtube,
            PlatformType::Facebook => &self.config.facebook,
            PlatformType::TikTok => &self.config.tiktok,
            PlatformType::Instagram => &self.config.instagram,
            PlatformType::Kick => &self.config.kick,
        }
    }

    pub fn authorize_url(&self, platform: PlatformType) -> AppResult<String> {
        let creds = self.credentials(platform);
        let ep = endpoints(platform);
        let url = Url::parse_with_params(
            ep.authorize_url,
            &[
                ("client_id", creds.client_id.as_str()),
                ("redirect_uri", creds.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", ep.scope),
            ],
        )
        .map_err(|e| AppError::InternalError(format!("Bad authorize URL: {e}")))?;
        Ok(url.to_string())
    }

    pub async fn exchange_code(&self, platform: PlatformType, code: &str) -> AppResult<TokenSet> {
        let creds = self.credentials(platform);
        let ep = endpoints(platform);

        let params = [
            ("client_id", creds.client_id.as_str()),
            ("client_secret", creds.client_secret.as_str()),
            ("code", code),
            ("grant_type", "authorization_code"),
            ("redirect_uri", creds.redirect_uri.as_str()),
        ];

        let response = self
            .client
            .post(ep.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| {
                AppError::ExternalApiError(format!("{platform} token endpoint unreachable: {e}"))
            })?;

        if !response.status().is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::ExternalApiError(format!(
                "{platform} code exchange failed: {error_text}"
            )));
        }

        let token: OAuthTokenResponse = response.json().await?;
        Ok(token_set(token))
    }

    pub async fn refresh_token(
        &self,
        platform: PlatformType,
        refresh_token: &str,
    ) -> AppResult<TokenSet> {
        let creds = self.credentials(platform);
        let ep = endpoints(platform);

        let params = [
            ("client_id", creds.client_id.as_str()),
            ("client_secret", creds.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];

        // A refresh is idempotent from our side; retry once on transport
        // failure before giving up. A rejected token is not retried.
        let mut last_err = None;
        for _ in 0..2 {
            match self.client.post(ep.token_url).form(&params).send().await {
                Ok(response) => {
                    if !response.status().is_success() {
                        let error_text = response
                            .text()
                            .await
                            .unwrap_or_else(|_| "Unknown error".to_string());
                        return Err(AppError::ExternalApiError(format!(
                            "{platform} token refresh rejected: {error_text}"
                        )));
                    }
                    let token: OAuthTokenResponse = response.json().await?;
                    return Ok(token_set(token));
                }
                Err(e) => last_err = Some(e),
            }
        }
        Err(AppError::ExternalApiError(format!(
            "{platform} token endpoint unreachable: {}",
            last_err.map(|e| e.to_string()).unwrap_or_default()
        )))
    }

    pub async fn get_user_profile(
        &self,
        platform: PlatformType,
        access_token: &str,
    ) -> AppResult<PlatformProfile> {
        let creds = self.credentials(platform);
        let ep = endpoints(platform);

        let mut request = self.client.get(ep.profile_url).bearer_auth(access_token);
        // Helix additionally requires the application client id.
        if platform == PlatformType::Twitch {
            request = request.header("Client-Id", creds.client_id.as_str());
        }

        let response = request.send().await.map_err(|e| {
            AppError::ExternalApiError(format!("{platform} profile endpoint unreachable: {e}"))
        })?;

        if !response.status().is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::ExternalApiError(format!(
                "{platform} profile fetch failed: {error_text}"
            )));
        }

        let payload: Value = response.json().await?;
        extract_profile(platform, &payload)
    }
}

fn token_set(token: OAuthTokenResponse) -> TokenSet {
    TokenSet {
        access_token: token.access_token,
        refresh_token: token.refresh_token,
        expires_at: token
            .expires_in
            .map(|secs| Utc::now() + Duration::seconds(secs)),
    }
}

fn extract_profile(platform: PlatformType, payload: &Value) -> AppResult<PlatformProfile> {
    let ep = endpoints(platform);
    let read = |ptr: &str| -> Option<String> {
        payload.pointer(ptr).map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    };

    match (read(ep.profile_id_ptr), read(ep.profile_username_ptr)) {
        (Some(id), Some(username)) => Ok(PlatformProfile { id, username }),
        _ => Err(AppError::ExternalApiError(format!(
            "{platform} profile payload missing id or username"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlatformsConfig;
    use serde_json::json;

    fn client() -> PlatformOAuthClient {
        let mut config = PlatformsConfig::default();
        config.twitch = PlatformCredentials {
            client_id: "twitch-client".into(),
            client_secret: "s".into(),
            redirect_uri: "https://app.example.com/oauth/twitch".into(),
        };
        PlatformOAuthClient::new(config)
    }

    #[test]
    fn test_authorize_url_encodes_redirect() {
        let url = client().authorize_url(PlatformType::Twitch).unwrap();
        assert!(url.starts_with("https://id.twitch.tv/oauth2/authorize?"));
        assert!(url.contains("client_id=twitch-client"));
        assert!(url.contains("redirect_uri=https%3A%2F%2Fapp.example.com%2Foauth%2Ftwitch"));
        assert!(url.contains("response_type=code"));
    }

    #[test]
    fn test_extract_twitch_profile() {
        let payload = json!({ "data": [{ "id": "141981764", "login": "twitchdev" }] });
        let profile = extract_profile(PlatformType::Twitch, &payload).unwrap();
        assert_eq!(profile.id, "141981764");
        assert_eq!(profile.username, "twitchdev");
    }

    #[test]
    fn test_extract_instagram_profile() {
        let payload = json!({ "id": "17841", "username": "creator" });
        let profile = extract_profile(PlatformType::Instagram, &payload).unwrap();
        assert_eq!(profile.id, "17841");
        assert_eq!(profile.username, "creator");
    }

    #[test]
    fn test_extract_profile_missing_fields() {
        let payload = json!({ "data": [] });
        assert!(extract_profile(PlatformType::Twitch, &payload).is_err());
    }

    #[test]
    fn test_token_set_expiry() {
        let set = token_set(OAuthTokenResponse {
            access_token: "at".into(),
            refresh_token: Some("rt".into()),
            expires_in: Some(3600),
        });
        assert!(set.expires_at.unwrap() > Utc::now());

        let no_expiry = token_set(OAuthTokenResponse {
            access_token: "at".into(),
            refresh_token: None,
            expires_in: None,
        });
        assert!(no_expiry.expires_at.is_none());
    }
}
