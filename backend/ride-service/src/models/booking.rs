use super::{Route, UserId};
use chrono::NaiveDateTime;
use serde::Serialize;
use uuid::Uuid;

/// Booking status lives in `passengers.description`: empty while the booking
/// is active, otherwise the reason it ended.
pub const BOOKING_ACTIVE: &str = "";
pub const BOOKING_CANCELLED_BY_PASSENGER: &str = "Ви відмінили бронь";
pub const BOOKING_CANCELLED_BY_DRIVER: &str = "Водій відмінив маршрут";
pub const BOOKING_REMOVED_BY_DRIVER: &str = "Водій вилучив вас з маршруту";

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Booking {
    pub id: i64,
    pub route_id: Uuid,
    pub user_id: UserId,
    pub seats: i32,
    pub description: String,
    pub rating: Option<f64>,
    pub comment: Option<String>,
}

/// The caller's current booking with the driver's contact
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SeatReservation {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub route: Route,
    pub p_id: i64,
    pub booking_seats: i32,
    pub driver_id: UserId,
    pub name: String,
    pub phone: String,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct BookingHistoryEntry {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub route: Route,
    pub p_desc: String,
    pub booking_seats: i32,
    pub driver_id: UserId,
    pub name: String,
    pub phone: String,
    pub rating: Option<f64>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct RoutePassenger {
    pub id: i64,
    pub route_id: Uuid,
    pub seats: i32,
    pub description: String,
    pub user_id: UserId,
    pub name: String,
    pub email: String,
    pub phone: String,
    /// Only present when listing active bookings
    pub datetime: Option<NaiveDateTime>,
}

/// Route data returned by a booking mutation, used to word the notification
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BookingChange {
    pub passenger_id: UserId,
    pub route_id: Uuid,
    pub driver_id: UserId,
    pub route: String,
    pub datetime: NaiveDateTime,
}
