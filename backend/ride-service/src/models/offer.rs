use chrono::NaiveDateTime;
use serde::Serialize;
use uuid::Uuid;

pub const OFFER_DESCRIPTION: &str = "Вам запропонували маршрут";

/// A driver's route offered against a passenger's ride request
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OfferListing {
    pub offer: i64,
    pub route: String,
    pub id: Uuid,
    pub seats: i32,
    pub datetime: NaiveDateTime,
    pub status: i32,
}
