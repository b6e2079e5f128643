use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub paypal: PayPalConfig,
    pub mail: MailConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub security: SecurityConfig,
    #[serde(default)]
    pub platforms: PlatformsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_expires_in: i64,  // seconds
    pub refresh_token_expires_in: i64, // seconds
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayPalConfig {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub use_sandbox: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    pub api_key: String,
    pub base_url: String,
    pub from_address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub base_url: String,
    pub bucket: String,
    pub access_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub verification_code_expiry_minutes: i64,
    pub password_reset_expiry_minutes: i64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            verification_code_expiry_minutes: 15,
            password_reset_expiry_minutes: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PlatformCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PlatformsConfig {
    #[serde(default)]
    pub twitch: PlatformCredentials,
    #[serde(default)]
    pub youtube: PlatformCredentials,
    #[serde(default)]
    pub facebook: PlatformCredentials,
    #[serde(default)]
    pub tiktok: PlatformCredentials,
    #[serde(default)]
    pub instagram: PlatformCredentials,
    #[serde(default)]
    pub kick: PlatformCredentials,
}

impl Config {
    pub fn from_toml() -> anyhow::Result<Self> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        let config_result = std::fs::read_to_string(&config_path);

        let mut config: Config = match config_result {
            Ok(config_str) => {
                toml::from_str(&config_str).context("Failed to parse config file")?
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                // No config file: build entirely from environment variables.
                fn get_env(name: &str) -> Option<String> {
                    env::var(name).ok()
                }
                fn get_env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
                    env::var(name)
                        .ok()
                        .and_then(|v| v.parse::<T>().ok())
                        .unwrap_or(default)
                }

                let database_url = get_env("DATABASE_URL")
                    .ok_or_else(|| anyhow!("DATABASE_URL is not set and no config.toml was found"))?;

                Config {
                    server: ServerConfig {
                        host: get_env("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                        port: get_env_parse("SERVER_PORT", 8080u16),
                    },
                    database: DatabaseConfig {
                        url: database_url,
                        max_connections: get_env_parse("DB_MAX_CONNECTIONS", 10u32),
                    },
                    jwt: JwtConfig {
                        secret: get_env("JWT_SECRET")
                            .unwrap_or_else(|| "change-me-in-production".to_string()),
                        access_token_expires_in: get_env_parse("JWT_ACCESS_EXPIRES_IN", 7200i64),
                        refresh_token_expires_in: get_env_parse(
                            "JWT_REFRESH_EXPIRES_IN",
                            2_592_000i64,
                        ),
                    },
                    paypal: PayPalConfig {
                        client_id: get_env("PAYPAL_CLIENT_ID").unwrap_or_default(),
                        client_secret: get_env("PAYPAL_CLIENT_SECRET").unwrap_or_default(),
                        use_sandbox: get_env_parse("PAYPAL_USE_SANDBOX", true),
                    },
                    mail: MailConfig {
                        api_key: get_env("MAIL_API_KEY").unwrap_or_default(),
                        base_url: get_env("MAIL_BASE_URL")
                            .unwrap_or_else(|| "https://api.mail.clienttrackpro.com".to_string()),
                        from_address: get_env("MAIL_FROM_ADDRESS")
                            .unwrap_or_else(|| "no-reply@clienttrackpro.com".to_string()),
                    },
                    storage: StorageConfig {
                        base_url: get_env("STORAGE_BASE_URL").unwrap_or_default(),
                        bucket: get_env("STORAGE_BUCKET")
                            .unwrap_or_else(|| "brand-assets".to_string()),
                        access_key: get_env("STORAGE_ACCESS_KEY").unwrap_or_default(),
                    },
                    security: SecurityConfig {
                        verification_code_expiry_minutes: get_env_parse(
                            "VERIFICATION_CODE_EXPIRY_MINUTES",
                            15i64,
                        ),
                        password_reset_expiry_minutes: get_env_parse(
                            "PASSWORD_RESET_EXPIRY_MINUTES",
                            30i64,
                        ),
                    },
                    platforms: PlatformsConfig::default(),
                }
            }
            Err(e) => {
                return Err(anyhow!("Failed to read config file {config_path}: {e}"));
            }
        };

        // Environment variables override the file when both are present.
        if let Ok(v) = env::var("SERVER_HOST") {
            config.server.host = v;
        }
        if let Ok(v) = env::var("SERVER_PORT")
            && let Ok(p) = v.parse()
        {
            config.server.port = p;
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            config.database.url = v;
        }
        if let Ok(v) = env::var("DB_MAX_CONNECTIONS")
            && let Ok(mc) = v.parse()
        {
            config.database.max_connections = mc;
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            config.jwt.secret = v;
        }
        if let Ok(v) = env::var("JWT_ACCESS_EXPIRES_IN")
            && let Ok(n) = v.parse()
        {
            config.jwt.access_token_expires_in = n;
        }
        if let Ok(v) = env::var("JWT_REFRESH_EXPIRES_IN")
            && let Ok(n) = v.parse()
        {
            config.jwt.refresh_token_expires_in = n;
        }
        if let Ok(v) = env::var("PAYPAL_CLIENT_ID") {
            config.paypal.client_id = v;
        }
        if let Ok(v) = env::var("PAYPAL_CLIENT_SECRET") {
            config.paypal.client_secret = v;
        }
        if let Ok(v) = env::var("PAYPAL_USE_SANDBOX")
            && let Ok(b) = v.parse()
        {
            config.paypal.use_sandbox = b;
        }
        if let Ok(v) = env::var("MAIL_API_KEY") {
            config.mail.api_key = v;
        }
        if let Ok(v) = env::var("MAIL_BASE_URL") {
            config.mail.base_url = v;
        }
        if let Ok(v) = env::var("MAIL_FROM_ADDRESS") {
            config.mail.from_address = v;
        }
        if let Ok(v) = env::var("STORAGE_BASE_URL") {
            config.storage.base_url = v;
        }
        if let Ok(v) = env::var("STORAGE_BUCKET") {
            config.storage.bucket = v;
        }
        if let Ok(v) = env::var("STORAGE_ACCESS_KEY") {
            config.storage.access_key = v;
        }

        Ok(config)
    }
}
