use crate::error::Result;
use crate::middleware::CurrentUser;
use crate::models::{LoginForm, MessageResponse, RegisterRequest, UserId};
use crate::services::UserService;
use crate::state::AppState;
use actix_web::{web, HttpResponse};

/// GET /
pub async fn index() -> HttpResponse {
    HttpResponse::Ok().json(MessageResponse::new("FromTo"))
}

/// POST /register
pub async fn register(
    state: web::Data<AppState>,
    req: web::Json<RegisterRequest>,
) -> Result<HttpResponse> {
    UserService::register(
        &state.db,
        state.identity.tokens(),
        state.mailer.as_ref(),
        &state.config.app.public_url,
        &req,
    )
    .await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("Підтвердіть свою пошту")))
}

/// POST /login
pub async fn login(state: web::Data<AppState>, form: web::Form<LoginForm>) -> Result<HttpResponse> {
    let response = UserService::login(&state.db, state.identity.tokens(), &form).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// GET /user
pub async fn current_user(CurrentUser(user): CurrentUser) -> HttpResponse {
    HttpResponse::Ok().json(user)
}

/// GET /get-confirm-email/{token}
pub async fn confirm_email(
    state: web::Data<AppState>,
    token: web::Path<String>,
) -> Result<HttpResponse> {
    state.identity.confirm_email(&token).await?;
    Ok(HttpResponse::Ok().json(MessageResponse::new("Ви підтвердили пошту")))
}

/// GET /users/{id}
pub async fn public_profile(
    state: web::Data<AppState>,
    _caller: CurrentUser,
    user_id: web::Path<UserId>,
) -> Result<HttpResponse> {
    let profile = UserService::public_profile(&state.db, user_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(profile))
}

pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index))
        .route("/register", web::post().to(register))
        .route("/login", web::post().to(login))
        .route("/user", web::get().to(current_user))
        .route("/get-confirm-email/{token}", web::get().to(confirm_email))
        .route("/users/{id}", web::get().to(public_profile));
}
