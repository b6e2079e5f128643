use crate::config::MailConfig;
use crate::error::{AppError, AppResult};
use reqwest::Client;
use serde_json::json;

const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Transactional-mail client. Callers treat delivery as best-effort: state
/// changes are committed first and a failed send only logs.
#[derive(Clone)]
pub struct EmailClient {
    client: Client,
    config: MailConfig,
}

impl EmailClient {
    pub fn new(config: MailConfig) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .expect("failed to build HTTP client"),
            config,
        }
    }

    pub async fn send(&self, to: &str, subject: &str, html_body: &str) -> AppResult<()> {
        let url = format!("{}/v1/messages", self.config.base_url);
        let body = json!({
            "from": self.config.from_address,
            "to": to,
            "subject": subject,
            "html": html_body,
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        if response.status().is_success() {
            log::info!("Email sent to {}: {}", to, subject);
            Ok(())
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            log::error!("Email to {} failed: {}", to, error_text);
            Err(AppError::ExternalApiError(format!(
                "Email sending failed: {}",
                error_text
            )))
        }
    }

    pub async fn send_verification_email(
        &self,
        to: &str,
        code: &str,
        expiry_minutes: i64,
    ) -> AppResult<()> {
        let body = format!(
            "<h2>Welcome to ClientTrackPro!</h2>\
             <p>Please verify your email address by entering the following code:</p>\
             <h1 style='font-size: 24px; color: #007bff;'>{code}</h1>\
             <p>This code will expire in {expiry_minutes} minutes.</p>\
             <p>If you didn't request this verification, please ignore this email.</p>"
        );
        self.send(to, "Verify Your Email Address", &body).await
    }

    pub async fn send_password_reset_email(
        &self,
        to: &str,
        token: &str,
        expiry_minutes: i64,
    ) -> AppResult<()> {
        let body = format!(
            "<h2>Password Reset Request</h2>\
             <p>You have requested to reset your password. Use the following code to proceed:</p>\
             <h1 style='font-size: 24px; color: #007bff;'>{token}</h1>\
             <p>This code will expire in {expiry_minutes} minutes.</p>\
             <p>If you didn't request this reset, please ignore this email and ensure your account is secure.</p>"
        );
        self.send(to, "Reset Your Password", &body).await
    }

    pub async fn send_subscription_confirmation(&self, to: &str, tier: &str) -> AppResult<()> {
        let body = format!(
            "<h2>Thank You for Your Subscription!</h2>\
             <p>Your subscription to the {tier} tier has been confirmed.</p>\
             <p>You now have access to all features included in your subscription plan.</p>\
             <p>If you have any questions, please don't hesitate to contact our support team.</p>"
        );
        self.send(to, "Subscription Confirmation", &body).await
    }
}
