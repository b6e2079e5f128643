use crate::config::StorageConfig;
use crate::error::{AppError, AppResult};
use reqwest::Client;

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Object-storage client for brand assets: PUT bytes under a key, get back a
/// public URL.
#[derive(Clone)]
pub struct StorageClient {
    client: Client,
    config: StorageConfig,
}

impl StorageClient {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .expect("failed to build HTTP client"),
            config,
        }
    }

    pub fn object_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.config.base_url, self.config.bucket, key)
    }

    pub async fn upload(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> AppResult<String> {
        let url = self.object_url(key);

        let response = self
            .client
            .put(&url)
            .bearer_auth(&self.config.access_key)
            .header("Content-Type", content_type)
            .body(bytes)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(url)
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            Err(AppError::ExternalApiError(format!(
                "Asset upload failed: {}",
                error_text
            )))
        }
    }

    pub async fn delete(&self, key: &str) -> AppResult<()> {
        let url = self.object_url(key);

        let response = self
            .client
            .delete(&url)
            .bearer_auth(&self.config.access_key)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            Err(AppError::ExternalApiError(format!(
                "Asset delete failed: {}",
                error_text
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_url() {
        let client = StorageClient::new(StorageConfig {
            base_url: "https://cdn.example.com".into(),
            bucket: "brand-assets".into(),
            access_key: "k".into(),
        });
        assert_eq!(
            client.object_url("u1/logo.png"),
            "https://cdn.example.com/brand-assets/u1/logo.png"
        );
    }
}
