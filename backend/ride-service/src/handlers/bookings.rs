use crate::error::Result;
use crate::middleware::CurrentUser;
use crate::models::{
    BookSeatRequest, CancelBookingRequest, MessageResponse, RatingRequest,
    RemovePassengerRequest, UpdateBookingRequest,
};
use crate::services::{texts, PassengerService};
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use serde_json::json;

/// POST /set-passengers
pub async fn set_passengers(
    state: web::Data<AppState>,
    CurrentUser(user): CurrentUser,
    req: web::Json<BookSeatRequest>,
) -> Result<HttpResponse> {
    let change = PassengerService::book(&state.db, &user, &req, state.clock.now()).await?;

    let text = texts::passenger_joined(&user.name, &user.phone, &change.route, change.datetime);
    state
        .notifier
        .notify(Some(change.route_id), change.driver_id, text)
        .await;

    Ok(HttpResponse::Ok().json(MessageResponse::new("Ви долучились до маршруту")))
}

/// GET /my-seats
pub async fn my_seats(
    state: web::Data<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<HttpResponse> {
    match PassengerService::current(&state.db, user.id, state.clock.now()).await? {
        Some(reservation) => Ok(HttpResponse::Ok().json(reservation)),
        None => Ok(HttpResponse::Ok().json(json!({}))),
    }
}

/// GET /user-routes-history
pub async fn user_routes_history(
    state: web::Data<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<HttpResponse> {
    let history = PassengerService::history(&state.db, user.id, state.clock.now()).await?;
    Ok(HttpResponse::Ok().json(history))
}

/// POST /delete-route
///
/// Passenger cancels their booking; the driver is notified.
pub async fn delete_route(
    state: web::Data<AppState>,
    CurrentUser(user): CurrentUser,
    req: web::Json<CancelBookingRequest>,
) -> Result<HttpResponse> {
    let change = PassengerService::cancel(&state.db, user.id, req.pass_id).await?;

    let text = texts::booking_cancelled(&user.name, &user.phone, &change.route, change.datetime);
    state
        .notifier
        .notify(Some(change.route_id), change.driver_id, text)
        .await;

    Ok(HttpResponse::Ok().json(MessageResponse::new("Маршрут видалено")))
}

/// POST /update-route
pub async fn update_route(
    state: web::Data<AppState>,
    CurrentUser(user): CurrentUser,
    req: web::Json<UpdateBookingRequest>,
) -> Result<HttpResponse> {
    PassengerService::update_seats(&state.db, user.id, &req).await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("Маршрут змінено")))
}

/// POST /route/remove-passenger
pub async fn remove_passenger(
    state: web::Data<AppState>,
    CurrentUser(user): CurrentUser,
    req: web::Json<RemovePassengerRequest>,
) -> Result<HttpResponse> {
    let change = PassengerService::remove(&state.db, user.id, &req).await?;

    let text = texts::passenger_removed(&change.route, change.datetime);
    state
        .notifier
        .notify(Some(change.route_id), change.passenger_id, text)
        .await;

    Ok(HttpResponse::Ok().json(MessageResponse::new(
        "Ви вилучили пасажира, йому прийде повідомлення",
    )))
}

/// POST /route/rating
pub async fn rate_route(
    state: web::Data<AppState>,
    CurrentUser(user): CurrentUser,
    req: web::Json<RatingRequest>,
) -> Result<HttpResponse> {
    PassengerService::rate(&state.db, user.id, &req).await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("Оцінено")))
}

pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/set-passengers", web::post().to(set_passengers))
        .route("/my-seats", web::get().to(my_seats))
        .route("/user-routes-history", web::get().to(user_routes_history))
        .route("/delete-route", web::post().to(delete_route))
        .route("/update-route", web::post().to(update_route))
        .route("/route/remove-passenger", web::post().to(remove_passenger))
        .route("/route/rating", web::post().to(rate_route));
}
