use super::mailer::{confirmation_link, Mailer};
use crate::error::{AppError, Result};
use crate::models::{LoginForm, LoginResponse, PublicProfile, RegisterRequest, User, UserId};
use crate::security::{hash_password, verify_password, TokenIssuer};
use sqlx::PgPool;

/// Account registration and sign-in
pub struct UserService;

impl UserService {
    /// Creates an inactive account and mails its confirmation link
    pub async fn register(
        db: &PgPool,
        tokens: &TokenIssuer,
        mailer: &dyn Mailer,
        public_url: &str,
        req: &RegisterRequest,
    ) -> Result<UserId> {
        let email = req.email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(AppError::BadRequest("Невірна адреса пошти".into()));
        }
        let password_hash = hash_password(&req.password)?;
        let phone = format!("+{}", req.phone.trim().trim_start_matches('+'));

        let user_id: Option<UserId> = sqlx::query_scalar(
            r#"
            INSERT INTO users (name, phone, email, password, is_active)
            VALUES ($1, $2, $3, $4, FALSE)
            ON CONFLICT (email) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(req.name.trim())
        .bind(&phone)
        .bind(email)
        .bind(&password_hash)
        .fetch_optional(db)
        .await?;

        let user_id = user_id
            .ok_or_else(|| AppError::BadRequest("Користувач вже зареєстрований".into()))?;
        tracing::info!(user_id, "user registered");

        let token = tokens.issue(user_id, email)?;
        mailer
            .send_confirmation(email, &confirmation_link(public_url, &token))
            .await?;
        Ok(user_id)
    }

    pub async fn login(db: &PgPool, tokens: &TokenIssuer, form: &LoginForm) -> Result<LoginResponse> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, phone, email, password, rating_user, is_active
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(form.username.trim())
        .fetch_optional(db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

        if !verify_password(&form.password, &user.password)? {
            return Err(AppError::InvalidCredentials);
        }
        if !user.is_active {
            return Err(AppError::EmailNotConfirmed);
        }

        let access_token = tokens.issue(user.id, &user.email)?;
        tracing::info!(user_id = user.id, "user logged in");
        Ok(LoginResponse {
            access_token,
            token_type: "bearer",
            message: "Вхід виконано",
            name: user.name,
            rating_user: user.rating_user,
        })
    }

    pub async fn public_profile(db: &PgPool, user_id: UserId) -> Result<PublicProfile> {
        sqlx::query_as::<_, PublicProfile>("SELECT name, email FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Користувача не знайдено".into()))
    }
}
