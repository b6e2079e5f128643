use crate::config::PayPalConfig;
use crate::error::{AppError, AppResult};
use crate::models::SubscriptionTier;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::Mutex;

const SANDBOX_BASE_URL: &str = "https://api-m.sandbox.paypal.com";
const LIVE_BASE_URL: &str = "https://api-m.paypal.com";
const REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Deserialize)]
pub struct PayPalTokenResponse {
    pub access_token: String,
    pub expires_in: i64,
}

#[derive(Debug, Deserialize)]
pub struct PayPalPayment {
    pub id: String,
    pub state: String,
    #[serde(default)]
    pub payer: Option<PayPalPayer>,
}

#[derive(Debug, Deserialize)]
pub struct PayPalPayer {
    pub status: Option<String>,
}

impl PayPalPayment {
    pub fn is_valid(&self) -> bool {
        self.state == "approved"
            && self
                .payer
                .as_ref()
                .and_then(|p| p.status.as_deref())
                .is_some_and(|s| s == "VERIFIED")
    }
}

#[derive(Debug, Deserialize)]
struct PayPalPlan {
    id: String,
}

#[derive(Debug, Deserialize)]
struct PayPalSubscription {
    id: String,
}

#[derive(Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

/// PayPal REST client. The client-credentials token is short-lived and shared
/// across requests, so it lives behind a mutex with an expiry check instead of
/// plain instance state.
#[derive(Clone)]
pub struct PayPalClient {
    client: Client,
    config: PayPalConfig,
    base_url: String,
    token: Arc<Mutex<Option<CachedToken>>>,
}

impl PayPalClient {
    pub fn new(config: PayPalConfig) -> Self {
        let base_url = if config.use_sandbox {
            SANDBOX_BASE_URL.to_string()
        } else {
            LIVE_BASE_URL.to_string()
        };
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .expect("failed to build HTTP client"),
            config,
            base_url,
            token: Arc::new(Mutex::new(None)),
        }
    }

    async fn ensure_access_token(&self) -> AppResult<String> {
        let mut guard = self.token.lock().await;

        // Refresh one minute early so an in-flight call never carries a token
        // that expires mid-request.
        if let Some(cached) = guard.as_ref()
            && cached.expires_at > Utc::now() + Duration::seconds(60)
        {
            return Ok(cached.access_token.clone());
        }

        let response = self
            .client
            .post(format!("{}/v1/oauth2/token", self.base_url))
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::ExternalApiError(format!(
                "Failed to obtain PayPal access token: {}",
                error_text
            )));
        }

        let token: PayPalTokenResponse = response.json().await?;
        let access_token = token.access_token.clone();
        *guard = Some(CachedToken {
            access_token: token.access_token,
            expires_at: Utc::now() + Duration::seconds(token.expires_in),
        });

        Ok(access_token)
    }

    pub async fn get_payment(&self, payment_id: &str) -> AppResult<PayPalPayment> {
        let token = self.ensure_access_token().await?;
        let url = format!("{}/v1/payments/payment/{}", self.base_url, payment_id);

        // Payment lookup is an idempotent GET, safe to retry once on a
        // transport failure.
        let mut last_err = None;
        for _ in 0..2 {
            match self.client.get(&url).bearer_auth(&token).send().await {
                Ok(response) => {
                    if response.status().is_success() {
                        return Ok(response.json().await?);
                    }
                    let error_text = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Unknown error".to_string());
                    return Err(AppError::ExternalApiError(format!(
                        "Failed to retrieve payment {}: {}",
                        payment_id, error_text
                    )));
                }
                Err(e) => last_err = Some(e),
            }
        }
        Err(AppError::ExternalApiError(format!(
            "PayPal unreachable: {}",
            last_err.map(|e| e.to_string()).unwrap_or_default()
        )))
    }

    /// Server-side payment validation: approved state and a verified payer.
    pub async fn validate_payment(&self, payment_id: &str) -> AppResult<bool> {
        let payment = self.get_payment(payment_id).await?;
        Ok(payment.is_valid())
    }

    pub async fn create_billing_plan(
        &self,
        tier: SubscriptionTier,
        is_annual: bool,
        price_cents: i64,
    ) -> AppResult<String> {
        let token = self.ensure_access_token().await?;
        let period = if is_annual { "Annual" } else { "Monthly" };
        let plan = json!({
            "name": format!("{tier} Plan ({period})"),
            "description": format!("Subscription to the {tier} tier"),
            "type": "FIXED",
            "payment_definitions": [{
                "name": "Regular Payment",
                "type": "REGULAR",
                "frequency": if is_annual { "YEAR" } else { "MONTH" },
                "frequency_interval": "1",
                "amount": {
                    "value": format_cents(price_cents),
                    "currency": "USD"
                },
                "cycles": "0"
            }]
        });

        let response = self
            .client
            .post(format!("{}/v1/payments/billing-plans", self.base_url))
            .bearer_auth(&token)
            .json(&plan)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::ExternalApiError(format!(
                "Failed to create billing plan: {}",
                error_text
            )));
        }

        let created: PayPalPlan = response.json().await?;

        // Plans are created inactive and must be activated before use.
        let activate = json!([{ "op": "replace", "path": "/", "value": { "state": "ACTIVE" } }]);
        let response = self
            .client
            .patch(format!(
                "{}/v1/payments/billing-plans/{}",
                self.base_url, created.id
            ))
            .bearer_auth(&token)
            .json(&activate)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::ExternalApiError(format!(
                "Failed to activate billing plan: {}",
                error_text
            )));
        }

        Ok(created.id)
    }

    pub async fn create_subscription(&self, plan_id: &str) -> AppResult<String> {
        let token = self.ensure_access_token().await?;
        let subscription = json!({
            "plan_id": plan_id,
            "start_time": (Utc::now() + Duration::minutes(1)).to_rfc3339(),
            "application_context": {
                "brand_name": "ClientTrackPro",
                "locale": "en-US",
                "shipping_preference": "NO_SHIPPING",
                "user_action": "SUBSCRIBE_NOW",
                "return_url": "https://clienttrackpro.com/subscription/success",
                "cancel_url": "https://clienttrackpro.com/subscription/cancel"
            }
        });

        let response = self
            .client
            .post(format!("{}/v1/billing/subscriptions", self.base_url))
            .bearer_auth(&token)
            .json(&subscription)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::ExternalApiError(format!(
                "Failed to create subscription: {}",
                error_text
            )));
        }

        let created: PayPalSubscription = response.json().await?;
        Ok(created.id)
    }

    pub async fn cancel_subscription(&self, subscription_id: &str) -> AppResult<()> {
        let token = self.ensure_access_token().await?;
        let response = self
            .client
            .post(format!(
                "{}/v1/billing/subscriptions/{}/cancel",
                self.base_url, subscription_id
            ))
            .bearer_auth(&token)
            .json(&json!({ "reason": "Cancelled by user" }))
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::ExternalApiError(format!(
                "Failed to cancel subscription {}: {}",
                subscription_id, error_text
            )));
        }

        Ok(())
    }

    pub async fn refund_payment(&self, payment_id: &str, amount_cents: i64) -> AppResult<()> {
        let token = self.ensure_access_token().await?;
        let refund = json!({
            "amount": {
                "total": format_cents(amount_cents),
                "currency": "USD"
            }
        });

        let response = self
            .client
            .post(format!(
                "{}/v1/payments/sale/{}/refund",
                self.base_url, payment_id
            ))
            .bearer_auth(&token)
            .json(&refund)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::ExternalApiError(format!(
                "Failed to refund payment {}: {}",
                payment_id, error_text
            )));
        }

        Ok(())
    }
}

fn format_cents(cents: i64) -> String {
    format!("{}.{:02}", cents / 100, cents % 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_cents() {
        assert_eq!(format_cents(999), "9.99");
        assert_eq!(format_cents(29999), "299.99");
        assert_eq!(format_cents(100), "1.00");
        assert_eq!(format_cents(5), "0.05");
    }

    #[test]
    fn test_payment_validity() {
        let approved_verified = PayPalPayment {
            id: "PAY-1".into(),
            state: "approved".into(),
            payer: Some(PayPalPayer {
                status: Some("VERIFIED".into()),
            }),
        };
        assert!(approved_verified.is_valid());

        let created = PayPalPayment {
            id: "PAY-2".into(),
            state: "created".into(),
            payer: Some(PayPalPayer {
                status: Some("VERIFIED".into()),
            }),
        };
        assert!(!created.is_valid());

        let unverified = PayPalPayment {
            id: "PAY-3".into(),
            state: "approved".into(),
            payer: Some(PayPalPayer {
                status: Some("UNVERIFIED".into()),
            }),
        };
        assert!(!unverified.is_valid());

        let no_payer = PayPalPayment {
            id: "PAY-4".into(),
            state: "approved".into(),
            payer: None,
        };
        assert!(!no_payer.is_valid());
    }

    #[test]
    fn test_sandbox_base_url() {
        let client = PayPalClient::new(PayPalConfig {
            client_id: "id".into(),
            client_secret: "secret".into(),
            use_sandbox: true,
        });
        assert_eq!(client.base_url, SANDBOX_BASE_URL);
    }
}
