use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::utils::generate_gift_code;
use chrono::{Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

const GIFT_CODE_GENERATION_ATTEMPTS: usize = 5;

/// Back-office operations: admin accounts, gift codes, user management and
/// revenue reporting.
#[derive(Clone)]
pub struct AdminService {
    pool: PgPool,
}

impl AdminService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_admin(&self, user_id: Uuid) -> AppResult<Option<AdminUser>> {
        let admin = sqlx::query_as::<_, AdminUser>(
            "SELECT * FROM admin_users WHERE user_id = $1 AND is_active",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(admin)
    }

    pub async fn require_admin(&self, user_id: Uuid) -> AppResult<AdminUser> {
        self.get_admin(user_id)
            .await?
            .ok_or_else(|| AppError::Forbidden("Admin access required".to_string()))
    }

    pub async fn require_super_admin(&self, user_id: Uuid) -> AppResult<AdminUser> {
        let admin = self.require_admin(user_id).await?;
        if admin.role != AdminRole::SuperAdmin {
            return Err(AppError::Forbidden(
                "Super admin access required".to_string(),
            ));
        }
        Ok(admin)
    }

    pub async fn create_admin(&self, request: CreateAdminRequest) -> AppResult<AdminUser> {
        let user_exists = sqlx::query_scalar::<_, Uuid>("SELECT id FROM users WHERE id = $1")
            .bind(request.user_id)
            .fetch_optional(&self.pool)
            .await?;
        if user_exists.is_none() {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        let admin = sqlx::query_as::<_, AdminUser>(
            r#"
            INSERT INTO admin_users (id, user_id, role, is_active)
            VALUES ($1, $2, $3, TRUE)
            ON CONFLICT (user_id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.user_id)
        .bind(request.role)
        .fetch_optional(&self.pool)
        .await?;

        admin.ok_or_else(|| AppError::Conflict("User is already an admin".to_string()))
    }

    /// Code uniqueness is enforced by the database; on a collision a fresh
    /// code is generated, up to a small bound.
    pub async fn create_gift_code(
        &self,
        admin_id: Uuid,
        request: CreateGiftCodeRequest,
    ) -> AppResult<GiftCodeResponse> {
        if request.duration_days <= 0 {
            return Err(AppError::ValidationError(
                "Gift code duration must be positive".to_string(),
            ));
        }
        if request.expires_at <= Utc::now() {
            return Err(AppError::ValidationError(
                "Gift code expiry must be in the future".to_string(),
            ));
        }
        if request.tier == SubscriptionTier::Free {
            return Err(AppError::ValidationError(
                "Gift codes cannot grant the free tier".to_string(),
            ));
        }

        for _ in 0..GIFT_CODE_GENERATION_ATTEMPTS {
            let code = generate_gift_code();
            let inserted = sqlx::query_as::<_, GiftCode>(
                r#"
                INSERT INTO subscription_gift_codes (
                    id, code, tier, duration_days, status, expires_at, created_by_admin_id
                ) VALUES ($1, $2, $3, $4, $5, $6, $7)
                ON CONFLICT (code) DO NOTHING
                RETURNING *
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(&code)
            .bind(request.tier)
            .bind(request.duration_days)
            .bind(GiftCodeStatus::Active)
            .bind(request.expires_at)
            .bind(admin_id)
            .fetch_optional(&self.pool)
            .await?;

            if let Some(gift_code) = inserted {
                return Ok(GiftCodeResponse::from(gift_code));
            }
        }

        Err(AppError::InternalError(
            "Could not generate a unique gift code".to_string(),
        ))
    }

    pub async fn get_gift_code(&self, code: &str) -> AppResult<GiftCodeResponse> {
        let gift_code = sqlx::query_as::<_, GiftCode>(
            "SELECT * FROM subscription_gift_codes WHERE code = $1",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Gift code not found".to_string()))?;

        Ok(GiftCodeResponse::from(gift_code))
    }

    pub async fn list_gift_codes(
        &self,
        pagination: PaginationParams,
    ) -> AppResult<PaginatedResponse<GiftCodeResponse>> {
        let total =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM subscription_gift_codes")
                .fetch_one(&self.pool)
                .await?;

        let codes = sqlx::query_as::<_, GiftCode>(
            r#"
            SELECT * FROM subscription_gift_codes
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(pagination.get_limit() as i64)
        .bind(pagination.get_offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(PaginatedResponse::new(
            codes.into_iter().map(GiftCodeResponse::from).collect(),
            pagination.get_page(),
            pagination.get_limit(),
            total,
        ))
    }

    /// Only an active code can be revoked; a redeemed code stays redeemed.
    pub async fn revoke_gift_code(&self, code: &str) -> AppResult<GiftCodeResponse> {
        let revoked = sqlx::query_as::<_, GiftCode>(
            r#"
            UPDATE subscription_gift_codes
            SET status = $1
            WHERE code = $2 AND status = $3
            RETURNING *
            "#,
        )
        .bind(GiftCodeStatus::Revoked)
        .bind(code)
        .bind(GiftCodeStatus::Active)
        .fetch_optional(&self.pool)
        .await?;

        match revoked {
            Some(gift_code) => Ok(GiftCodeResponse::from(gift_code)),
            None => {
                let existing = self.get_gift_code(code).await?;
                Err(AppError::Conflict(format!(
                    "Gift code is not active (status: {:?})",
                    existing.status
                )))
            }
        }
    }

    pub async fn list_users(
        &self,
        pagination: PaginationParams,
    ) -> AppResult<PaginatedResponse<UserResponse>> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        let users = sqlx::query_as::<_, User>(
            "SELECT * FROM users ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(pagination.get_limit() as i64)
        .bind(pagination.get_offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(PaginatedResponse::new(
            users.into_iter().map(UserResponse::from).collect(),
            pagination.get_page(),
            pagination.get_limit(),
            total,
        ))
    }

    pub async fn update_user_subscription(
        &self,
        user_id: Uuid,
        request: UpdateUserSubscriptionRequest,
    ) -> AppResult<UserResponse> {
        if request.duration_days <= 0 {
            return Err(AppError::ValidationError(
                "Duration must be positive".to_string(),
            ));
        }

        let expires_at = if request.tier == SubscriptionTier::Free {
            None
        } else {
            Some(Utc::now() + Duration::days(request.duration_days as i64))
        };

        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET subscription_tier = $1,
                subscription_expires_at = $2,
                version = version + 1,
                updated_at = NOW()
            WHERE id = $3
            RETURNING *
            "#,
        )
        .bind(request.tier)
        .bind(expires_at)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        Ok(UserResponse::from(user))
    }

    pub async fn deactivate_user(&self, user_id: Uuid) -> AppResult<()> {
        let updated = sqlx::query(
            r#"
            UPDATE users
            SET is_active = FALSE, version = version + 1, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(AppError::NotFound("User not found".to_string()));
        }
        Ok(())
    }

    pub async fn payment_records(
        &self,
        range: &PaymentRangeQuery,
        pagination: PaginationParams,
    ) -> AppResult<PaginatedResponse<PaymentRecord>> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM payment_records WHERE created_at >= $1 AND created_at < $2",
        )
        .bind(range.start)
        .bind(range.end)
        .fetch_one(&self.pool)
        .await?;

        let records = sqlx::query_as::<_, PaymentRecord>(
            r#"
            SELECT * FROM payment_records
            WHERE created_at >= $1 AND created_at < $2
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(range.start)
        .bind(range.end)
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

    /// Completed payments only; refunds and pending rows do not count.
    pub async fn total_revenue(&self, range: &PaymentRangeQuery) -> AppResult<RevenueResponse> {
        let total_cents = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COALESCE(SUM(amount_cents), 0)
            FROM payment_records
            WHERE status = $1 AND created_at >= $2 AND created_at < $3
            "#,
        )
        .bind(PaymentStatus::Completed)
        .bind(range.start)
        .bind(range.end)
        .fetch_one(&self.pool)
        .await?;

        Ok(RevenueResponse {
            total_cents,
            currency: "USD".to_string(),
        })
    }

    pub async fn subscription_stats(&self) -> AppResult<Vec<TierCount>> {
        let counts = sqlx::query_as::<_, TierCount>(
            r#"
            SELECT subscription_tier AS tier, COUNT(*) AS count
            FROM users
            WHERE is_active
            GROUP BY subscription_tier
            ORDER BY subscription_tier
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(counts)
    }
}
