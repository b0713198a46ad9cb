use super::route_service::lock_user;
use crate::error::{AppError, Result};
use crate::models::{
    BookSeatRequest, BookingChange, BookingHistoryEntry, RatingRequest, RemovePassengerRequest,
    Route, SeatReservation, UpdateBookingRequest, User, UserId, BOOKING_ACTIVE,
    BOOKING_CANCELLED_BY_PASSENGER, BOOKING_REMOVED_BY_DRIVER, ROUTE_ACTIVE, ROUTE_CANCELLED,
};
use chrono::NaiveDateTime;
use sqlx::PgPool;

fn booking_not_found() -> AppError {
    AppError::NotFound("Бронювання не знайдено".into())
}

/// Seat bookings on published routes
pub struct PassengerService;

impl PassengerService {
    /// Books seats for `passenger`; a passenger holds at most one active upcoming booking
    pub async fn book(
        db: &PgPool,
        passenger: &User,
        req: &BookSeatRequest,
        now: NaiveDateTime,
    ) -> Result<BookingChange> {
        if req.seats < 1 {
            return Err(AppError::BadRequest("Вкажіть кількість місць".into()));
        }

        let mut tx = db.begin().await?;
        lock_user(&mut tx, passenger.id).await?;

        let route = sqlx::query_as::<_, Route>(
            r#"
            SELECT id, route, datetime, price, description, car, seats, status, rating_route, user_id
            FROM routes
            WHERE id = $1
            "#,
        )
        .bind(req.router)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Маршрут не знайдено".into()))?;

        if !route.is_active_at(now) {
            return Err(AppError::Precondition("Маршрут вже не дійсний".into()));
        }

        let inserted: Option<i64> = sqlx::query_scalar(
            r#"
            INSERT INTO passengers (route_id, user_id, seats, description)
            SELECT $1, $2, $3, $4
            WHERE NOT EXISTS (
                SELECT 1
                FROM passengers p
                JOIN routes r ON r.id = p.route_id
                WHERE p.user_id = $2 AND p.description = $4 AND r.datetime > $5
            )
            RETURNING id
            "#,
        )
        .bind(route.id)
        .bind(passenger.id)
        .bind(req.seats)
        .bind(BOOKING_ACTIVE)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await?;

        let booking_id = inserted
            .ok_or_else(|| AppError::Precondition("У вас вже є заброньоване місце".into()))?;
        tx.commit().await?;

        tracing::info!(user_id = passenger.id, booking_id, route_id = %route.id, "seats booked");
        Ok(BookingChange {
            passenger_id: passenger.id,
            route_id: route.id,
            driver_id: route.user_id,
            route: route.route,
            datetime: route.datetime,
        })
    }

    /// The passenger's upcoming active booking with the driver's contact
    pub async fn current(
        db: &PgPool,
        passenger: UserId,
        now: NaiveDateTime,
    ) -> Result<Option<SeatReservation>> {
        let row = sqlx::query_as::<_, SeatReservation>(
            r#"
            SELECT r.id, r.route, r.datetime, r.price, r.description, r.car, r.seats, r.status,
                   r.rating_route, r.user_id,
                   p.id AS p_id, p.seats AS booking_seats,
                   u.id AS driver_id, u.name, u.phone
            FROM routes r
            JOIN passengers p ON p.route_id = r.id
            JOIN users u ON u.id = r.user_id
            WHERE p.user_id = $1 AND r.datetime >= $2 AND r.status = $3 AND p.description = $4
            ORDER BY r.datetime DESC
            LIMIT 1
            "#,
        )
        .bind(passenger)
        .bind(now)
        .bind(ROUTE_ACTIVE)
        .bind(BOOKING_ACTIVE)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    /// Bookings that are over: past rides, cancelled routes and ended bookings
    pub async fn history(
        db: &PgPool,
        passenger: UserId,
        now: NaiveDateTime,
    ) -> Result<Vec<BookingHistoryEntry>> {
        let rows = sqlx::query_as::<_, BookingHistoryEntry>(
            r#"
            SELECT r.id, r.route, r.datetime, r.price, r.description, r.car, r.seats, r.status,
                   r.rating_route, r.user_id,
                   p.description AS p_desc, p.seats AS booking_seats,
                   u.id AS driver_id, u.name, u.phone, p.rating, p.comment
            FROM routes r
            JOIN passengers p ON p.route_id = r.id
            JOIN users u ON u.id = r.user_id
            WHERE p.user_id = $1
              AND (r.datetime < $2 OR r.status = $3 OR p.description <> $4)
            ORDER BY r.datetime DESC
            "#,
        )
        .bind(passenger)
        .bind(now)
        .bind(ROUTE_CANCELLED)
        .bind(BOOKING_ACTIVE)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    /// Passenger cancels their own active booking
    pub async fn cancel(db: &PgPool, passenger: UserId, booking_id: i64) -> Result<BookingChange> {
        let change = sqlx::query_as::<_, BookingChange>(
            r#"
            UPDATE passengers p SET description = $4
            FROM routes r
            WHERE p.id = $1 AND p.user_id = $2 AND p.description = $3 AND r.id = p.route_id
            RETURNING p.user_id AS passenger_id, r.id AS route_id, r.user_id AS driver_id,
                      r.route, r.datetime
            "#,
        )
        .bind(booking_id)
        .bind(passenger)
        .bind(BOOKING_ACTIVE)
        .bind(BOOKING_CANCELLED_BY_PASSENGER)
        .fetch_optional(db)
        .await?
        .ok_or_else(booking_not_found)?;

        tracing::info!(user_id = passenger, booking_id, "booking cancelled by passenger");
        Ok(change)
    }

    pub async fn update_seats(db: &PgPool, passenger: UserId, req: &UpdateBookingRequest) -> Result<()> {
        if req.seats < 1 {
            return Err(AppError::BadRequest("Вкажіть кількість місць".into()));
        }

        let updated = sqlx::query(
            "UPDATE passengers SET seats = $3 WHERE id = $1 AND user_id = $2 AND description = $4",
        )
        .bind(req.id)
        .bind(passenger)
        .bind(req.seats)
        .bind(BOOKING_ACTIVE)
        .execute(db)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(booking_not_found());
        }
        Ok(())
    }

    /// Driver removes a passenger from one of the driver's routes
    pub async fn remove(db: &PgPool, driver: UserId, req: &RemovePassengerRequest) -> Result<BookingChange> {
        let change = sqlx::query_as::<_, BookingChange>(
            r#"
            UPDATE passengers p SET description = $5
            FROM routes r
            WHERE p.id = $1 AND p.route_id = $2 AND p.description = $4
              AND r.id = p.route_id AND r.user_id = $3
            RETURNING p.user_id AS passenger_id, r.id AS route_id, r.user_id AS driver_id,
                      r.route, r.datetime
            "#,
        )
        .bind(req.pass_id)
        .bind(req.route_id)
        .bind(driver)
        .bind(BOOKING_ACTIVE)
        .bind(BOOKING_REMOVED_BY_DRIVER)
        .fetch_optional(db)
        .await?
        .ok_or_else(booking_not_found)?;

        tracing::info!(
            user_id = driver,
            passenger_id = change.passenger_id,
            route_id = %change.route_id,
            "passenger removed from route"
        );
        Ok(change)
    }

    /// Stores the passenger's rating, then refreshes the route and driver averages
    pub async fn rate(db: &PgPool, passenger: UserId, req: &RatingRequest) -> Result<()> {
        let score = req.score().map_err(AppError::BadRequest)?;

        let mut tx = db.begin().await?;

        let rated: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE passengers SET rating = $3, comment = $4
            WHERE route_id = $1 AND user_id = $2
            RETURNING id
            "#,
        )
        .bind(req.route_id)
        .bind(passenger)
        .bind(score)
        .bind(&req.comment)
        .fetch_optional(&mut *tx)
        .await?;
        if rated.is_none() {
            return Err(booking_not_found());
        }

        let driver: UserId = sqlx::query_scalar(
            r#"
            UPDATE routes SET rating_route = COALESCE(
                (SELECT AVG(rating) FROM passengers WHERE route_id = $1 AND rating IS NOT NULL), 0
            )
            WHERE id = $1
            RETURNING user_id
            "#,
        )
        .bind(req.route_id)
        .fetch_one(&mut *tx)
        .await?;

        // Driver average over published routes that have at least one rating
        sqlx::query(
            r#"
            UPDATE users SET rating_user = COALESCE(
                (SELECT AVG(r.rating_route) FROM routes r
                 WHERE r.user_id = $1 AND r.car <> ''
                   AND EXISTS (SELECT 1 FROM passengers p
                               WHERE p.route_id = r.id AND p.rating IS NOT NULL)), 0
            )
            WHERE id = $1
            "#,
        )
        .bind(driver)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::info!(user_id = passenger, route_id = %req.route_id, score, "route rated");
        Ok(())
    }
}
