use super::UserId;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const ROUTE_ACTIVE: i32 = 0;
pub const ROUTE_CANCELLED: i32 = 1;

/// A published ride. Drivers publish routes with a car; passengers publish
/// ride requests with an empty `car`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Route {
    pub id: Uuid,
    pub route: String,
    pub datetime: NaiveDateTime,
    pub price: Option<String>,
    pub description: String,
    pub car: String,
    pub seats: i32,
    pub status: i32,
    pub rating_route: f64,
    pub user_id: UserId,
}

impl Route {
    pub fn is_active_at(&self, now: NaiveDateTime) -> bool {
        self.status == ROUTE_ACTIVE && self.datetime >= now
    }
}

/// Route joined with its owner's public data
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct RouteListing {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub route: Route,
    pub name: String,
    pub rating_user: f64,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct RouteDetails {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub listing: RouteListing,
    /// Seats held by active bookings
    pub sum: Option<i64>,
}

/// The caller's active route as a driver, with the seats already booked
#[derive(Debug, Clone, Serialize)]
pub struct DriverRouteSummary {
    pub id: Uuid,
    pub route: String,
    pub car: String,
    pub seats: i32,
    pub datetime: NaiveDateTime,
    pub description: String,
    pub sum: Option<i64>,
}

impl DriverRouteSummary {
    pub fn new(route: Route, sum: Option<i64>) -> Self {
        Self {
            id: route.id,
            route: route.route,
            car: route.car,
            seats: route.seats,
            datetime: route.datetime,
            description: route.description,
            sum,
        }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct RouteSeatSummary {
    pub id: i64,
    pub seats: i32,
    pub my_seats: Option<i64>,
}
