use crate::config::SecurityConfig;
use crate::error::{AppError, AppResult};
use crate::external::EmailClient;
use crate::models::*;
use crate::utils::*;
use chrono::{Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct AuthService {
    pool: PgPool,
    jwt_service: JwtService,
    email_client: EmailClient,
    security: SecurityConfig,
}

impl AuthService {
    pub fn new(
        pool: PgPool,
        jwt_service: JwtService,
        email_client: EmailClient,
        security: SecurityConfig,
    ) -> Self {
        Self {
            pool,
            jwt_service,
            email_client,
            security,
        }
    }

    pub async fn register(&self, request: RegisterRequest) -> AppResult<UserResponse> {
        validate_email(&request.email)?;
        validate_username(&request.username)?;
        validate_password(&request.password)?;

        // One uniform message for both duplicate email and duplicate username,
        // so the endpoint cannot be used to enumerate accounts.
        let existing = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM users WHERE email = $1 OR username = $2",
        )
        .bind(&request.email)
        .bind(&request.username)
        .fetch_optional(&self.pool)
        .await?;

        if existing.is_some() {
            return Err(AppError::Conflict(
                "Email or username already in use".to_string(),
            ));
        }

        let password_hash = hash_password(&request.password)?;
        let verification_code = generate_six_digit_code();
        let verification_expires_at =
            Utc::now() + Duration::minutes(self.security.verification_code_expiry_minutes);

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (
                id, email, username, password_hash, email_verified,
                verification_code, verification_expires_at,
                marketing_consent, data_processing_consent
            ) VALUES ($1, $2, $3, $4, FALSE, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&request.email)
        .bind(&request.username)
        .bind(&password_hash)
        .bind(&verification_code)
        .bind(verification_expires_at)
        .bind(request.marketing_consent)
        .bind(request.data_processing_consent)
        .fetch_one(&self.pool)
        .await?;

        // Best effort; the user can ask for a resend if delivery fails.
        let email_client = self.email_client.clone();
        let email = user.email.clone();
        let expiry_minutes = self.security.verification_code_expiry_minutes;
        tokio::spawn(async move {
            if let Err(e) = email_client
                .send_verification_email(&email, &verification_code, expiry_minutes)
                .await
            {
                log::error!("Failed to send verification email to {}: {:?}", email, e);
            }
        });

        Ok(UserResponse::from(user))
    }

    pub async fn login(&self, request: LoginRequest) -> AppResult<AuthResponse> {
        let user = self.find_by_email(&request.email).await?;

        let user = user
            .ok_or_else(|| AppError::AuthError("Invalid email or password".to_string()))?;

        if !verify_password(&request.password, &user.password_hash)? {
            return Err(AppError::AuthError("Invalid email or password".to_string()));
        }

        if !user.email_verified {
            return Err(AppError::AuthError(
                "Please verify your email first".to_string(),
            ));
        }

        if !user.is_active {
            return Err(AppError::AuthError("Account is deactivated".to_string()));
        }

        // Last-writer-wins is fine for a login timestamp.
        sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
            .bind(user.id)
            .execute(&self.pool)
            .await?;

        let access_token = self.jwt_service.generate_access_token(user.id, &user.email)?;
        let refresh_token = self
            .jwt_service
            .generate_refresh_token(user.id, &user.email)?;

        Ok(AuthResponse {
            user: UserResponse::from(user),
            access_token,
            refresh_token,
            expires_in: self.jwt_service.get_access_token_expires_in(),
        })
    }

    pub async fn verify_email(&self, request: VerifyEmailRequest) -> AppResult<()> {
        let user = self
            .find_by_email(&request.email)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        match (&user.verification_code, user.verification_expires_at) {
            (Some(code), Some(expires_at)) if *code == request.code => {
                if expires_at < Utc::now() {
                    return Err(AppError::Expired("Verification code expired".to_string()));
                }
            }
            _ => {
                return Err(AppError::ValidationError(
                    "Invalid verification code".to_string(),
                ));
            }
        }

        sqlx::query(
            r#"
            UPDATE users
            SET email_verified = TRUE,
                verification_code = NULL,
                verification_expires_at = NULL,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(user.id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn resend_verification(&self, email: &str) -> AppResult<()> {
        let user = self
            .find_by_email(email)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if user.email_verified {
            return Err(AppError::ValidationError(
                "Email is already verified".to_string(),
            ));
        }

        let code = generate_six_digit_code();
        let expires_at =
            Utc::now() + Duration::minutes(self.security.verification_code_expiry_minutes);

        sqlx::query(
            r#"
            UPDATE users
            SET verification_code = $1, verification_expires_at = $2, updated_at = NOW()
            WHERE id = $3
            "#,
        )
        .bind(&code)
        .bind(expires_at)
        .bind(user.id)
        .execute(&self.pool)
        .await?;

        self.email_client
            .send_verification_email(
                email,
                &code,
                self.security.verification_code_expiry_minutes,
            )
            .await
    }

    /// Always answers success so the endpoint cannot confirm whether an email
    /// is registered.
    pub async fn forgot_password(&self, email: &str) -> AppResult<()> {
        let Some(user) = self.find_by_email(email).await? else {
            log::info!("Password reset requested for unknown email");
            return Ok(());
        };

        let token = generate_reset_token();
        let expires_at =
            Utc::now() + Duration::minutes(self.security.password_reset_expiry_minutes);

        sqlx::query(
            r#"
            UPDATE users
            SET password_reset_token = $1, password_reset_expires_at = $2, updated_at = NOW()
            WHERE id = $3
            "#,
        )
        .bind(&token)
        .bind(expires_at)
        .bind(user.id)
        .execute(&self.pool)
        .await?;

        let email_client = self.email_client.clone();
        let email = email.to_string();
        let expiry_minutes = self.security.password_reset_expiry_minutes;
        tokio::spawn(async move {
            if let Err(e) = email_client
                .send_password_reset_email(&email, &token, expiry_minutes)
                .await
            {
                log::error!("Failed to send password reset email to {}: {:?}", email, e);
            }
        });

        Ok(())
    }

    pub async fn reset_password(&self, request: ResetPasswordRequest) -> AppResult<()> {
        validate_password(&request.new_password)?;

        let user = self
            .find_by_email(&request.email)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        match (&user.password_reset_token, user.password_reset_expires_at) {
            (Some(token), Some(expires_at)) if *token == request.token => {
                if expires_at < Utc::now() {
                    return Err(AppError::Expired("Reset token expired".to_string()));
                }
            }
            _ => {
                return Err(AppError::ValidationError("Invalid reset token".to_string()));
            }
        }

        let password_hash = hash_password(&request.new_password)?;
        sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $1,
                password_reset_token = NULL,
                password_reset_expires_at = NULL,
                updated_at = NOW()
            WHERE id = $2
            "#,
        )
        .bind(&password_hash)
        .bind(user.id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn change_password(
        &self,
        user_id: Uuid,
        request: ChangePasswordRequest,
    ) -> AppResult<()> {
        validate_password(&request.new_password)?;

        let user = self.get_user(user_id).await?;

        if !verify_password(&request.current_password, &user.password_hash)? {
            return Err(AppError::AuthError(
                "Current password is incorrect".to_string(),
            ));
        }

        let password_hash = hash_password(&request.new_password)?;
        sqlx::query("UPDATE users SET password_hash = $1, updated_at = NOW() WHERE id = $2")
            .bind(&password_hash)
            .bind(user.id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn refresh_token(&self, refresh_token: &str) -> AppResult<AuthResponse> {
        let claims = self.jwt_service.verify_refresh_token(refresh_token)?;
        let user_id: Uuid = claims
            .sub
            .parse()
            .map_err(|_| AppError::AuthError("Invalid token".to_string()))?;

        let user = self.get_user(user_id).await?;
        if !user.is_active {
            return Err(AppError::AuthError("Account is deactivated".to_string()));
        }

        let access_token = self.jwt_service.generate_access_token(user.id, &user.email)?;

        Ok(AuthResponse {
            user: UserResponse::from(user),
            access_token,
            refresh_token: refresh_token.to_string(),
            expires_in: self.jwt_service.get_access_token_expires_in(),
        })
    }

    pub async fn get_user(&self, user_id: Uuid) -> AppResult<User> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        user.ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }
}
