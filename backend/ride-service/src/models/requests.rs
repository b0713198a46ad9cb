/// Request payloads accepted by the HTTP API
use super::lenient_i64;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    /// Digits without the leading `+`
    pub phone: String,
    pub password: String,
}

/// OAuth2 password-grant style form; `username` carries the e-mail
#[derive(Debug, Clone, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateRouteRequest {
    pub name: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub description: String,
    /// Empty or absent for a passenger's ride request
    #[serde(default)]
    pub vehicle: Option<String>,
    #[serde(default)]
    pub seats: Option<i32>,
    #[serde(default)]
    pub price: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchRequest {
    pub route: String,
    pub datetime: NaiveDate,
    pub seats: i32,
    /// A driver searches passenger requests; a passenger searches driver routes
    pub driver: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookSeatRequest {
    pub seats: i32,
    /// Route being booked
    pub router: Uuid,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RouteRef {
    pub id: Uuid,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CancelBookingRequest {
    #[serde(deserialize_with = "lenient_i64")]
    pub pass_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateBookingRequest {
    /// Booking id
    #[serde(deserialize_with = "lenient_i64")]
    pub id: i64,
    pub seats: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateSeatsRequest {
    pub id: Uuid,
    /// Seats still free after the current bookings
    pub seats: i32,
    #[serde(default)]
    pub desc: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemovePassengerRequest {
    #[serde(deserialize_with = "lenient_i64")]
    pub pass_id: i64,
    pub route_id: Uuid,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OfferRequest {
    /// The passenger's ride request
    pub route_id: Uuid,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingRequest {
    pub route_id: Uuid,
    pub rating: String,
    #[serde(default)]
    pub comment: String,
}

impl RatingRequest {
    pub fn score(&self) -> Result<f64, String> {
        let score: f64 = self
            .rating
            .trim()
            .parse()
            .map_err(|_| format!("invalid rating: {}", self.rating))?;
        if !(0.0..=5.0).contains(&score) {
            return Err(format!("rating must be between 0 and 5, got {score}"));
        }
        Ok(score)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
