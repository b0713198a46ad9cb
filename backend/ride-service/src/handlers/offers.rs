use crate::error::{AppError, Result};
use crate::middleware::{CurrentUser, DriverRoute};
use crate::models::{MessageResponse, OfferRequest};
use crate::services::{texts, OfferService};
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use uuid::Uuid;

/// POST /offer
///
/// A driver offers their active route to the author of a ride request.
pub async fn offer(
    state: web::Data<AppState>,
    DriverRoute(route): DriverRoute,
    req: web::Json<OfferRequest>,
) -> Result<HttpResponse> {
    let route = route.ok_or_else(|| AppError::Precondition("У вас немає маршруту".into()))?;
    let target = OfferService::make(&state.db, &route, &req).await?;

    let text = texts::route_offered(&route.route, route.datetime);
    state.notifier.notify(Some(route.id), target, text).await;

    Ok(HttpResponse::Ok().json(MessageResponse::new("Пропозиція відправлена")))
}

/// GET /offers/{id}
pub async fn list_offers(
    state: web::Data<AppState>,
    CurrentUser(user): CurrentUser,
    request_route: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let offers = OfferService::list(&state.db, user.id, request_route.into_inner()).await?;
    Ok(HttpResponse::Ok().json(offers))
}

pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/offer", web::post().to(offer))
        .route("/offers/{id}", web::get().to(list_offers));
}
