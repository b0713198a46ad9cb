use super::texts::{search_pattern, title_case};
use crate::error::{AppError, Result};
use crate::models::{
    CreateRouteRequest, DriverRouteSummary, Route, RouteDetails, RouteListing, RoutePassenger,
    RouteSeatSummary, SearchRequest, UpdateSeatsRequest, User, UserId, BOOKING_ACTIVE,
    BOOKING_CANCELLED_BY_DRIVER, ROUTE_ACTIVE, ROUTE_CANCELLED,
};
use chrono::{NaiveDateTime, NaiveTime};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

macro_rules! route_columns {
    () => {
        "r.id, r.route, r.datetime, r.price, r.description, r.car, r.seats, r.status, r.rating_route, r.user_id"
    };
}

const ACTIVE_ROUTE_EXISTS: &str = "У вас вже є дійсний маршрут";

fn route_not_found() -> AppError {
    AppError::NotFound("Маршрут не знайдено".into())
}

/// Publishing, searching and cancelling routes
pub struct RouteService;

impl RouteService {
    /// Whether the user has a route that is neither cancelled nor in the past
    pub async fn has_active_route(db: &PgPool, user_id: UserId, now: NaiveDateTime) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM routes WHERE user_id = $1 AND status <> $2 AND datetime >= $3)",
        )
        .bind(user_id)
        .bind(ROUTE_CANCELLED)
        .bind(now)
        .fetch_one(db)
        .await?;
        Ok(exists)
    }

    /// Publishes a route, or a ride request when no vehicle is given.
    ///
    /// Fails with a precondition error while the owner has another active route.
    pub async fn create(
        db: &PgPool,
        owner: &User,
        req: &CreateRouteRequest,
        now: NaiveDateTime,
    ) -> Result<Uuid> {
        let seats = req.seats.unwrap_or(1);
        if seats < 0 {
            return Err(AppError::BadRequest(
                "Кількість місць не може бути від'ємною".into(),
            ));
        }
        let name = title_case(req.name.trim());
        if name.is_empty() {
            return Err(AppError::BadRequest("Вкажіть маршрут".into()));
        }

        let mut tx = db.begin().await?;
        lock_user(&mut tx, owner.id).await?;

        let inserted: Option<Uuid> = sqlx::query_scalar(
            r#"
            INSERT INTO routes (id, route, datetime, price, description, car, seats, status, user_id)
            SELECT $1, $2, $3, $4, $5, $6, $7, $8, $9
            WHERE NOT EXISTS (
                SELECT 1 FROM routes WHERE user_id = $9 AND status <> $10 AND datetime >= $11
            )
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&name)
        .bind(req.date.and_time(req.time))
        .bind(req.price.as_deref())
        .bind(&req.description)
        .bind(req.vehicle.as_deref().unwrap_or_default())
        .bind(seats)
        .bind(ROUTE_ACTIVE)
        .bind(owner.id)
        .bind(ROUTE_CANCELLED)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await?;

        let route_id = inserted.ok_or_else(|| AppError::Precondition(ACTIVE_ROUTE_EXISTS.into()))?;
        tx.commit().await?;

        tracing::info!(user_id = owner.id, %route_id, "route created");
        Ok(route_id)
    }

    /// Drivers find ride requests; passengers find driver routes
    pub async fn search(
        db: &PgPool,
        req: &SearchRequest,
        now: NaiveDateTime,
    ) -> Result<Vec<RouteListing>> {
        let start = if req.datetime > now.date() {
            req.datetime.and_time(NaiveTime::MIN)
        } else {
            crate::clock::truncate_to_minute(now)
        };

        let rows = sqlx::query_as::<_, RouteListing>(concat!(
            "SELECT ",
            route_columns!(),
            r#", u.name, u.rating_user
            FROM routes r
            JOIN users u ON u.id = r.user_id
            WHERE r.route LIKE $1
              AND r.seats >= $2
              AND r.status = $3
              AND r.datetime >= $4
              AND (r.car = '') = $5
            ORDER BY r.datetime"#
        ))
        .bind(search_pattern(&req.route))
        .bind(req.seats)
        .bind(ROUTE_ACTIVE)
        .bind(start)
        .bind(req.driver)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn details(db: &PgPool, route_id: Uuid) -> Result<RouteDetails> {
        sqlx::query_as::<_, RouteDetails>(concat!(
            "SELECT ",
            route_columns!(),
            r#", u.name, u.rating_user,
                (SELECT SUM(p.seats) FROM passengers p
                 WHERE p.route_id = r.id AND p.description = $2) AS sum
            FROM routes r
            JOIN users u ON u.id = r.user_id
            WHERE r.id = $1"#
        ))
        .bind(route_id)
        .bind(BOOKING_ACTIVE)
        .fetch_optional(db)
        .await?
        .ok_or_else(route_not_found)
    }

    pub async fn booked_seats(db: &PgPool, route_id: Uuid) -> Result<Option<i64>> {
        let sum: Option<i64> = sqlx::query_scalar(
            "SELECT SUM(seats) FROM passengers WHERE route_id = $1 AND description = $2",
        )
        .bind(route_id)
        .bind(BOOKING_ACTIVE)
        .fetch_one(db)
        .await?;
        Ok(sum)
    }

    pub async fn driver_summary(db: &PgPool, route: Route) -> Result<DriverRouteSummary> {
        let sum = Self::booked_seats(db, route.id).await?;
        Ok(DriverRouteSummary::new(route, sum))
    }

    /// The user's past and cancelled routes, newest first
    pub async fn history(db: &PgPool, user_id: UserId, now: NaiveDateTime) -> Result<Vec<Route>> {
        let rows = sqlx::query_as::<_, Route>(concat!(
            "SELECT ",
            route_columns!(),
            r#"
            FROM routes r
            WHERE r.user_id = $1 AND (r.datetime < $2 OR r.status = $3)
            ORDER BY r.datetime DESC"#
        ))
        .bind(user_id)
        .bind(now)
        .bind(ROUTE_CANCELLED)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    /// Cancels the owner's route and every active booking on it.
    ///
    /// Returns the route and the passengers whose bookings were cancelled.
    pub async fn cancel(db: &PgPool, route_id: Uuid, owner: UserId) -> Result<(Route, Vec<UserId>)> {
        let mut tx = db.begin().await?;

        let route = sqlx::query_as::<_, Route>(
            r#"
            UPDATE routes SET status = $3
            WHERE id = $1 AND user_id = $2
            RETURNING id, route, datetime, price, description, car, seats, status, rating_route, user_id
            "#,
        )
        .bind(route_id)
        .bind(owner)
        .bind(ROUTE_CANCELLED)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(route_not_found)?;

        let passengers: Vec<UserId> = sqlx::query_scalar(
            r#"
            UPDATE passengers SET description = $3
            WHERE route_id = $1 AND description = $2
            RETURNING user_id
            "#,
        )
        .bind(route_id)
        .bind(BOOKING_ACTIVE)
        .bind(BOOKING_CANCELLED_BY_DRIVER)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::info!(user_id = owner, %route_id, passengers = passengers.len(), "route cancelled");
        Ok((route, passengers))
    }

    /// Sets the route's capacity to the booked seats plus `req.seats` free ones
    pub async fn update_seats(db: &PgPool, owner: UserId, req: &UpdateSeatsRequest) -> Result<()> {
        if req.seats < 0 {
            return Err(AppError::BadRequest(
                "Кількість місць не може бути від'ємною".into(),
            ));
        }

        let updated = sqlx::query(
            r#"
            UPDATE routes r
            SET seats = COALESCE(
                    (SELECT SUM(p.seats) FROM passengers p
                     WHERE p.route_id = r.id AND p.description = $3), 0
                ) + $4,
                description = COALESCE($5, r.description)
            WHERE r.id = $1 AND r.user_id = $2
            "#,
        )
        .bind(req.id)
        .bind(owner)
        .bind(BOOKING_ACTIVE)
        .bind(i64::from(req.seats))
        .bind(req.desc.as_deref())
        .execute(db)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(route_not_found());
        }
        Ok(())
    }

    /// First booking on the route with the route's capacity
    pub async fn seat_summary(db: &PgPool, route_id: Uuid) -> Result<Option<RouteSeatSummary>> {
        let row = sqlx::query_as::<_, RouteSeatSummary>(
            r#"
            SELECT p.id, r.seats, SUM(p.seats) AS my_seats
            FROM routes r
            JOIN passengers p ON p.route_id = r.id
            WHERE r.id = $1
            GROUP BY p.id, r.seats
            ORDER BY p.id
            LIMIT 1
            "#,
        )
        .bind(route_id)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    /// Active passengers of a route; when none are active, every booking ever made
    pub async fn passengers(db: &PgPool, route_id: Uuid) -> Result<Vec<RoutePassenger>> {
        let active = sqlx::query_as::<_, RoutePassenger>(
            r#"
            SELECT p.id, p.route_id, p.seats, p.description, u.id AS user_id,
                   u.name, u.email, u.phone, r.datetime
            FROM passengers p
            JOIN routes r ON r.id = p.route_id
            JOIN users u ON u.id = p.user_id
            WHERE p.route_id = $1 AND p.description = $2
            ORDER BY p.id
            "#,
        )
        .bind(route_id)
        .bind(BOOKING_ACTIVE)
        .fetch_all(db)
        .await?;

        if !active.is_empty() {
            return Ok(active);
        }

        let all = sqlx::query_as::<_, RoutePassenger>(
            r#"
            SELECT p.id, p.route_id, p.seats, p.description, u.id AS user_id,
                   u.name, u.email, u.phone, NULL::TIMESTAMP AS datetime
            FROM passengers p
            JOIN users u ON u.id = p.user_id
            WHERE p.route_id = $1
            ORDER BY p.id
            "#,
        )
        .bind(route_id)
        .fetch_all(db)
        .await?;
        Ok(all)
    }
}

/// Serialises concurrent conditional inserts made on behalf of one user
pub(crate) async fn lock_user(conn: &mut PgConnection, user_id: UserId) -> Result<()> {
    sqlx::query("SELECT id FROM users WHERE id = $1 FOR UPDATE")
        .bind(user_id)
        .fetch_optional(conn)
        .await?
        .ok_or(AppError::Unauthorized)?;
    Ok(())
}
