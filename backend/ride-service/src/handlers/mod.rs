/// HTTP handlers for the ride-sharing API
pub mod bookings;
pub mod messages;
pub mod offers;
pub mod routes;
pub mod users;
pub mod websocket;

use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig) {
    users::register_routes(cfg);
    // Literal /route/... paths must be matched before /route/{id}
    bookings::register_routes(cfg);
    routes::register_routes(cfg);
    messages::register_routes(cfg);
    offers::register_routes(cfg);
    websocket::register_routes(cfg);
}
