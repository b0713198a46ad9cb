use crate::error::{AppError, Result};
use crate::models::{OfferListing, OfferRequest, Route, UserId, OFFER_DESCRIPTION};
use sqlx::PgPool;

/// Drivers offering their route against a passenger's ride request
pub struct OfferService;

impl OfferService {
    /// Records one offer per (driver route, ride request) pair.
    ///
    /// Returns the user who published the ride request.
    pub async fn make(db: &PgPool, driver_route: &Route, req: &OfferRequest) -> Result<UserId> {
        let target: UserId = sqlx::query_scalar("SELECT user_id FROM routes WHERE id = $1")
            .bind(req.route_id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Маршрут не знайдено".into()))?;

        let inserted: Option<i64> = sqlx::query_scalar(
            r#"
            INSERT INTO offers (route_p_id, route_d_id, user_id, description)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (route_d_id, route_p_id) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(req.route_id)
        .bind(driver_route.id)
        .bind(target)
        .bind(OFFER_DESCRIPTION)
        .fetch_optional(db)
        .await?;

        let offer_id =
            inserted.ok_or_else(|| AppError::Precondition("Пропозиція вже відправлена".into()))?;
        tracing::info!(
            offer_id,
            driver_route = %driver_route.id,
            request_route = %req.route_id,
            user_id = target,
            "route offered"
        );
        Ok(target)
    }

    /// Offers made to `user_id` for their ride request `request_route`
    pub async fn list(
        db: &PgPool,
        user_id: UserId,
        request_route: uuid::Uuid,
    ) -> Result<Vec<OfferListing>> {
        let rows = sqlx::query_as::<_, OfferListing>(
            r#"
            SELECT o.id AS offer, r.route, r.id, r.seats, r.datetime, r.status
            FROM offers o
            JOIN routes r ON r.id = o.route_d_id
            WHERE o.route_p_id = $1 AND o.user_id = $2
            ORDER BY o.id
            "#,
        )
        .bind(request_route)
        .bind(user_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }
}
