use crate::clock::LocalClock;
use crate::error::{AppError, Result};
use crate::models::{Route, User, UserId, ROUTE_ACTIVE};
use crate::security::{Claims, TokenIssuer};
use sqlx::PgPool;

/// Resolves bearer tokens to users
#[derive(Clone)]
pub struct IdentityService {
    db: PgPool,
    tokens: TokenIssuer,
    clock: LocalClock,
}

impl IdentityService {
    pub fn new(db: PgPool, tokens: TokenIssuer, clock: LocalClock) -> Self {
        Self { db, tokens, clock }
    }

    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    fn claims(&self, token: &str) -> Result<Claims> {
        self.tokens.verify(token).map_err(|e| {
            tracing::debug!(error = %e, "bearer token rejected");
            AppError::Unauthorized
        })
    }

    /// User id carried by a valid token, without loading the user.
    ///
    /// Notification sockets only need the id as a registry key.
    pub fn identify(&self, token: &str) -> Result<UserId> {
        self.claims(token).map(|claims| claims.id)
    }

    pub async fn authenticate(&self, token: &str) -> Result<User> {
        let claims = self.claims(token)?;

        sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, phone, email, password, rating_user, is_active
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(claims.id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::Unauthorized)
    }

    /// The caller's active route as a driver, if any
    pub async fn authenticate_driver(&self, token: &str) -> Result<Option<Route>> {
        let claims = self.claims(token)?;

        let route = sqlx::query_as::<_, Route>(
            r#"
            SELECT id, route, datetime, price, description, car, seats, status, rating_route, user_id
            FROM routes
            WHERE user_id = $1 AND status = $2 AND datetime >= $3
            ORDER BY datetime
            LIMIT 1
            "#,
        )
        .bind(claims.id)
        .bind(ROUTE_ACTIVE)
        .bind(self.clock.now())
        .fetch_optional(&self.db)
        .await?;
        Ok(route)
    }

    /// Activates the account named by a confirmation token
    pub async fn confirm_email(&self, token: &str) -> Result<()> {
        let claims = self.tokens.verify(token).map_err(|_| AppError::InvalidLink)?;

        let updated = sqlx::query(
            "UPDATE users SET is_active = TRUE WHERE email = $1 AND is_active = FALSE",
        )
        .bind(&claims.sub)
        .execute(&self.db)
        .await?;

        // Unknown and already confirmed accounts are both an invalid link
        if updated.rows_affected() == 0 {
            return Err(AppError::InvalidLink);
        }
        tracing::info!(user_id = claims.id, "e-mail confirmed");
        Ok(())
    }
}
