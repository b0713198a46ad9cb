use crate::error::Result;
use crate::middleware::CurrentUser;
use crate::models::MessageResponse;
use crate::state::AppState;
use actix_web::{web, HttpResponse};

/// GET /number-messages
pub async fn number_messages(
    state: web::Data<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<HttpResponse> {
    let count = state.notifications.unread_count(user.id).await?;
    Ok(HttpResponse::Ok().json(count))
}

/// GET /messages-history
pub async fn messages_history(
    state: web::Data<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<HttpResponse> {
    let read = state.notifications.list_read(user.id).await?;
    Ok(HttpResponse::Ok().json(read))
}

/// GET /get-message
pub async fn unread_messages(
    state: web::Data<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<HttpResponse> {
    let unread = state.notifications.list_unread(user.id).await?;
    Ok(HttpResponse::Ok().json(unread))
}

/// PATCH /change-read-message
///
/// Marks everything read and pushes the new count to the caller's socket.
pub async fn mark_all_read(
    state: web::Data<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<HttpResponse> {
    let changed = state.notifications.mark_all_read(user.id).await?;
    tracing::debug!(user_id = user.id, changed, "notifications marked read");

    if let Err(e) = state.registry.push_unread_count(user.id).await {
        tracing::error!(user_id = user.id, error = %e, "unread count lookup failed");
    }
    Ok(HttpResponse::Ok().json(MessageResponse::new("OK")))
}

pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/number-messages", web::get().to(number_messages))
        .route("/messages-history", web::get().to(messages_history))
        .route("/get-message", web::get().to(unread_messages))
        .route("/change-read-message", web::patch().to(mark_all_read));
}
