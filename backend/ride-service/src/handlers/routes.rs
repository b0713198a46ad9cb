use crate::error::Result;
use crate::middleware::{CurrentUser, DriverRoute};
use crate::models::{
    CreateRouteRequest, MessageResponse, RouteRef, SearchRequest, UpdateSeatsRequest,
};
use crate::services::{texts, RouteService};
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use serde_json::json;
use uuid::Uuid;

/// POST /create-route
pub async fn create_route(
    state: web::Data<AppState>,
    CurrentUser(user): CurrentUser,
    req: web::Json<CreateRouteRequest>,
) -> Result<HttpResponse> {
    RouteService::create(&state.db, &user, &req, state.clock.now()).await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("Маршрут створено")))
}

/// GET /check-active-route
pub async fn check_active_route(
    state: web::Data<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<HttpResponse> {
    if RouteService::has_active_route(&state.db, user.id, state.clock.now()).await? {
        return Ok(HttpResponse::Ok().json(MessageResponse::new("У вас вже є дійсний маршрут")));
    }
    Ok(HttpResponse::Ok().json(serde_json::Value::Null))
}

/// POST /search
pub async fn search(
    state: web::Data<AppState>,
    req: web::Json<SearchRequest>,
) -> Result<HttpResponse> {
    let routes = RouteService::search(&state.db, &req, state.clock.now()).await?;
    Ok(HttpResponse::Ok().json(routes))
}

/// GET /route/{id}
pub async fn route_details(
    state: web::Data<AppState>,
    route_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let details = RouteService::details(&state.db, route_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(details))
}

/// GET /my-routes
pub async fn my_routes(
    state: web::Data<AppState>,
    DriverRoute(route): DriverRoute,
) -> Result<HttpResponse> {
    match route {
        Some(route) => {
            let summary = RouteService::driver_summary(&state.db, route).await?;
            Ok(HttpResponse::Ok().json(summary))
        }
        None => Ok(HttpResponse::Ok().json(json!({}))),
    }
}

/// GET /routes-history
pub async fn routes_history(
    state: web::Data<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<HttpResponse> {
    let routes = RouteService::history(&state.db, user.id, state.clock.now()).await?;
    Ok(HttpResponse::Ok().json(routes))
}

/// POST /get-route
pub async fn seat_summary(
    state: web::Data<AppState>,
    req: web::Json<RouteRef>,
) -> Result<HttpResponse> {
    let summary = RouteService::seat_summary(&state.db, req.id).await?;
    Ok(HttpResponse::Ok().json(summary))
}

/// POST /change-active-route
///
/// Driver cancels their route; every passenger with an active booking is notified.
pub async fn change_active_route(
    state: web::Data<AppState>,
    CurrentUser(user): CurrentUser,
    req: web::Json<RouteRef>,
) -> Result<HttpResponse> {
    let (route, passengers) = RouteService::cancel(&state.db, req.id, user.id).await?;

    let text = texts::route_cancelled(&route.route, route.datetime);
    let summary = state
        .notifier
        .notify_many(Some(route.id), &passengers, &text)
        .await;
    tracing::debug!(route_id = %route.id, ?summary, "passengers notified of cancellation");

    Ok(HttpResponse::Ok().json(MessageResponse::new("Ви відмінили маршрут")))
}

/// GET /route/{id}/passengers
pub async fn route_passengers(
    state: web::Data<AppState>,
    _caller: CurrentUser,
    route_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let passengers = RouteService::passengers(&state.db, route_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(passengers))
}

/// POST /update-seats
pub async fn update_seats(
    state: web::Data<AppState>,
    CurrentUser(user): CurrentUser,
    req: web::Json<UpdateSeatsRequest>,
) -> Result<HttpResponse> {
    RouteService::update_seats(&state.db, user.id, &req).await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("Дані оновлено")))
}

pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/create-route", web::post().to(create_route))
        .route("/check-active-route", web::get().to(check_active_route))
        .route("/search", web::post().to(search))
        .route("/route/{id}", web::get().to(route_details))
        .route("/route/{id}/passengers", web::get().to(route_passengers))
        .route("/my-routes", web::get().to(my_routes))
        .route("/routes-history", web::get().to(routes_history))
        .route("/get-route", web::post().to(seat_summary))
        .route("/change-active-route", web::post().to(change_active_route))
        .route("/update-seats", web::post().to(update_seats));
}
