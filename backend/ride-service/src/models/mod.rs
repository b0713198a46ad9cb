/// Data models for the ride-sharing service
pub mod booking;
pub mod notification;
pub mod offer;
pub mod requests;
pub mod route;
pub mod user;

pub use booking::*;
pub use notification::*;
pub use offer::*;
pub use requests::*;
pub use route::*;
pub use user::*;

use serde::{Deserialize, Deserializer};

/// Authenticated user reference, also the connection registry key
pub type UserId = i64;

/// Accepts an integer given either as a JSON number or as a numeric string.
/// Web clients send ids both ways.
pub fn lenient_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText {
        Number(i64),
        Text(String),
    }

    match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Number(n) => Ok(n),
        NumberOrText::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("expected an integer, got {s:?}"))),
    }
}
