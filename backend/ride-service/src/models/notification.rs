use super::UserId;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Durable notification record (`messages` table). Immutable once written
/// except for the read flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Notification {
    pub id: i64,
    pub text: String,
    pub read: bool,
    pub created: NaiveDateTime,
    pub route_id: Option<Uuid>,
    pub user_id: UserId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub route_id: Option<Uuid>,
    pub user_id: UserId,
    pub text: String,
    pub created: NaiveDateTime,
}
