use crate::error::{AppError, AppResult};
use crate::external::{EmailClient, PayPalClient};
use crate::models::*;
use chrono::{Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

fn billing_period_days(is_annual: bool) -> i64 {
    if is_annual { 365 } else { 30 }
}

/// Subscription and billing operations for a single account.
#[derive(Clone)]
pub struct AccountService {
    pool: PgPool,
    paypal_client: PayPalClient,
    email_client: EmailClient,
}

impl AccountService {
    pub fn new(pool: PgPool, paypal_client: PayPalClient, email_client: EmailClient) -> Self {
        Self {
            pool,
            paypal_client,
            email_client,
        }
    }

    pub fn subscription_price(
        &self,
        tier: SubscriptionTier,
        is_annual: bool,
    ) -> AppResult<i64> {
        tier.price_cents(is_annual).ok_or_else(|| {
            AppError::ValidationError("This tier cannot be purchased".to_string())
        })
    }

    /// Validates a completed PayPal payment server-side, then applies the tier
    /// change and records the payment in one transaction. The client-reported
    /// amount is never trusted; price comes from the tier table.
    pub async fn process_payment(
        &self,
        user_id: Uuid,
        request: ProcessPaymentRequest,
    ) -> AppResult<ProcessPaymentResponse> {
        let amount_cents = self.subscription_price(request.tier, request.is_annual)?;

        let valid = self.paypal_client.validate_payment(&request.payment_id).await?;
        if !valid {
            return Err(AppError::ValidationError(
                "Payment was not approved by the provider".to_string(),
            ));
        }

        let duration_days = billing_period_days(request.is_annual);
        let expires_at = Utc::now() + Duration::days(duration_days);

        let mut tx = self.pool.begin().await?;

        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1 FOR UPDATE")
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        sqlx::query(
            r#"
            UPDATE users
            SET subscription_tier = $1,
                subscription_expires_at = $2,
                version = version + 1,
                updated_at = NOW()
            WHERE id = $3
            "#,
        )
        .bind(request.tier)
        .bind(expires_at)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        let payment_record_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO payment_records (
                id, user_id, payment_id, amount_cents, currency,
                status, transaction_type, tier, duration_days
            ) VALUES ($1, $2, $3, $4, 'USD', $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&request.payment_id)
        .bind(amount_cents)
        .bind(PaymentStatus::Completed)
        .bind(TransactionType::Subscription)
        .bind(request.tier)
        .bind(duration_days as i32)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        // Confirmation mail only after the commit, and never blocking the
        // response.
        let email_client = self.email_client.clone();
        let email = user.email.clone();
        let tier_name = request.tier.to_string();
        tokio::spawn(async move {
            if let Err(e) = email_client
                .send_subscription_confirmation(&email, &tier_name)
                .await
            {
                log::error!("Failed to send subscription confirmation to {}: {:?}", email, e);
            }
        });

        Ok(ProcessPaymentResponse {
            tier: request.tier,
            subscription_expires_at: expires_at,
            payment_record_id,
        })
    }

    /// Redeems a gift code with the code row locked, so two concurrent
    /// redemptions of the same code cannot both succeed.
    pub async fn redeem_gift_code(
        &self,
        user_id: Uuid,
        code: &str,
    ) -> AppResult<RedeemGiftCodeResponse> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let gift_code = sqlx::query_as::<_, GiftCode>(
            "SELECT * FROM subscription_gift_codes WHERE code = $1 FOR UPDATE",
        )
        .bind(code)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Gift code not found".to_string()))?;

        match gift_code.status {
            GiftCodeStatus::Redeemed => {
                return Err(AppError::Conflict("Gift code already used".to_string()));
            }
            GiftCodeStatus::Revoked => {
                return Err(AppError::Conflict("Gift code has been revoked".to_string()));
            }
            GiftCodeStatus::Active => {}
        }

        if gift_code.is_expired(now) {
            return Err(AppError::Expired("Gift code expired".to_string()));
        }

        let user_exists = sqlx::query_scalar::<_, Uuid>("SELECT id FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?;
        if user_exists.is_none() {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        let expires_at = now + Duration::days(gift_code.duration_days as i64);

        sqlx::query(
            r#"
            UPDATE subscription_gift_codes
            SET status = $1, used_by_user_id = $2, used_at = NOW()
            WHERE id = $3
            "#,
        )
        .bind(GiftCodeStatus::Redeemed)
        .bind(user_id)
        .bind(gift_code.id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE users
            SET subscription_tier = $1,
                subscription_expires_at = $2,
                version = version + 1,
                updated_at = NOW()
            WHERE id = $3
            "#,
        )
        .bind(gift_code.tier)
        .bind(expires_at)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO payment_records (
                id, user_id, payment_id, amount_cents, currency,
                status, transaction_type, tier, duration_days
            ) VALUES ($1, $2, $3, 0, 'USD', $4, $5, $6, $7)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(format!("gift:{}", gift_code.code))
        .bind(PaymentStatus::Completed)
        .bind(TransactionType::GiftCode)
        .bind(gift_code.tier)
        .bind(gift_code.duration_days)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(RedeemGiftCodeResponse {
            tier: gift_code.tier,
            subscription_expires_at: expires_at,
        })
    }

    pub async fn create_subscription(
        &self,
        user_id: Uuid,
        request: CreateSubscriptionRequest,
    ) -> AppResult<CreateSubscriptionResponse> {
        let price_cents = self.subscription_price(request.tier, request.is_annual)?;

        let plan_id = self
            .paypal_client
            .create_billing_plan(request.tier, request.is_annual, price_cents)
            .await?;
        let subscription_id = self.paypal_client.create_subscription(&plan_id).await?;

        let updated = sqlx::query(
            "UPDATE users SET paypal_subscription_id = $1, updated_at = NOW() WHERE id = $2",
        )
        .bind(&subscription_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        Ok(CreateSubscriptionResponse { subscription_id })
    }

    /// Cancels at the provider first; the local downgrade only happens once
    /// PayPal has accepted the cancellation.
    pub async fn cancel_subscription(&self, user_id: Uuid) -> AppResult<UserResponse> {
        let user = self.get_user(user_id).await?;

        if let Some(subscription_id) = &user.paypal_subscription_id {
            self.paypal_client.cancel_subscription(subscription_id).await?;
        }

        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET subscription_tier = $1,
                subscription_expires_at = NULL,
                paypal_subscription_id = NULL,
                version = version + 1,
                updated_at = NOW()
            WHERE id = $2
            RETURNING *
            "#,
        )
        .bind(SubscriptionTier::Free)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(UserResponse::from(user))
    }

    /// Compare-and-swap on the row version: a concurrent writer bumps the
    /// version and the stale update is rejected instead of silently lost.
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        request: UpdateProfileRequest,
    ) -> AppResult<UserResponse> {
        if let Some(username) = &request.username {
            crate::utils::validate_username(username)?;
        }

        let updated = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET username = COALESCE($1, username),
                marketing_consent = COALESCE($2, marketing_consent),
                data_processing_consent = COALESCE($3, data_processing_consent),
                version = version + 1,
                updated_at = NOW()
            WHERE id = $4 AND version = $5
            RETURNING *
            "#,
        )
        .bind(&request.username)
        .bind(request.marketing_consent)
        .bind(request.data_processing_consent)
        .bind(user_id)
        .bind(request.version)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(user) => Ok(UserResponse::from(user)),
            None => {
                // Distinguish a missing user from a stale version.
                self.get_user(user_id).await?;
                Err(AppError::Conflict(
                    "Profile was modified by another request, reload and retry".to_string(),
                ))
            }
        }
    }

    pub async fn payment_history(
        &self,
        user_id: Uuid,
        pagination: PaginationParams,
    ) -> AppResult<PaginatedResponse<PaymentRecord>> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM payment_records WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        let records = sqlx::query_as::<_, PaymentRecord>(
            r#"
            SELECT * FROM payment_records
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(pagination.get_limit() as i64)
        .bind(pagination.get_offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(PaginatedResponse::new(
            records,
            pagination.get_page(),
            pagination.get_limit(),
            total,
        ))
    }

    async fn get_user(&self, user_id: Uuid) -> AppResult<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_billing_period_days() {
        assert_eq!(billing_period_days(false), 30);
        assert_eq!(billing_period_days(true), 365);
    }
}
