//! HTTP surface tests that need no database
//!
//! The pool is lazy and never connects; every request here is answered
//! before a query would run.

mod common;

use actix_web::{http::StatusCode, test, web, App};
use common::test_state;
use ride_service::configure_app;
use ride_service::metrics::MetricsMiddleware;
use serde_json::{json, Value};

#[actix_web::test]
async fn test_index_and_health() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(test_state()))
            .wrap(MetricsMiddleware)
            .configure(configure_app),
    )
    .await;

    let body: Value =
        test::call_and_read_body_json(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert_eq!(body, json!({"message": "FromTo"}));

    let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp =
        test::call_service(&app, test::TestRequest::get().uri("/metrics").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = test::read_body(resp).await;
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("ride_service_http_requests_total"));
}

#[actix_web::test]
async fn test_missing_token_is_unauthorized() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(test_state()))
            .configure(configure_app),
    )
    .await;

    let resp = test::call_service(&app, test::TestRequest::get().uri("/user").to_request()).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(resp.headers().get("WWW-Authenticate").unwrap(), "Bearer");

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "UNAUTHORIZED");
    assert_eq!(body["message"], "Для цього необхідно увійти або зареєструватися");
}

#[actix_web::test]
async fn test_garbage_token_is_unauthorized() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(test_state()))
            .configure(configure_app),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/number-messages")
        .insert_header(("Authorization", "Bearer not-a-jwt"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/offer")
        .insert_header(("Authorization", "Token abc"))
        .set_json(json!({"route_id": "9b2f3c3e-6a44-4c53-9a8f-0d7c5b1f4c11"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_websocket_rejects_bad_token_without_registering() {
    let state = test_state();
    let registry = state.registry.clone();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(configure_app),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/ws/not-a-jwt")
        .insert_header(("Upgrade", "websocket"))
        .insert_header(("Connection", "Upgrade"))
        .insert_header(("Sec-WebSocket-Version", "13"))
        .insert_header(("Sec-WebSocket-Key", "dGhlIHNhbXBsZSBub25jZQ=="))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(registry.connected_count().await, 0);
}

#[actix_web::test]
async fn test_websocket_token_signed_with_other_secret_rejected() {
    let state = test_state();
    let registry = state.registry.clone();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(configure_app),
    )
    .await;

    let token = ride_service::security::TokenIssuer::new("another-secret", 120)
        .issue(42, "driver@mail.com")
        .unwrap();
    let req = test::TestRequest::get()
        .uri(&format!("/ws/{token}"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(!registry.is_connected(42).await);
}

#[actix_web::test]
async fn test_invalid_route_id_is_not_found() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(test_state()))
            .configure(configure_app),
    )
    .await;

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/route/not-a-uuid").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_search_with_malformed_body_is_bad_request() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(test_state()))
            .configure(configure_app),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/search")
        .set_json(json!({"route": "Київ Львів", "datetime": "tomorrow"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
