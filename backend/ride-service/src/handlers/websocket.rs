use crate::state::AppState;
use crate::websocket::WsSession;
use actix_web::{web, Error, HttpRequest, HttpResponse, ResponseError};
use actix_web_actors::ws;

/// GET /ws/{token}
///
/// The token is verified before the upgrade; a rejected token never
/// touches the registry. The session registers itself once it starts.
pub async fn notifications_ws(
    req: HttpRequest,
    stream: web::Payload,
    token: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let user_id = match state.identity.identify(&token) {
        Ok(user_id) => user_id,
        Err(e) => {
            tracing::warn!(error = %e, "websocket connection rejected");
            return Ok(e.error_response());
        }
    };

    let mut response = ws::handshake(&req)?;
    let session = WsSession::new(
        user_id,
        state.registry.clone(),
        state.notifications.clone(),
        state.config.websocket.clone(),
    );

    Ok(response.streaming(ws::WebsocketContext::create(session, stream)))
}

pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/ws/{token}", web::get().to(notifications_ws));
}
