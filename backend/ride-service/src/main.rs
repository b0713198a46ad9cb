use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use ride_service::{configure_app, db, logging, metrics, AppState, Config};
use tracing_actix_web::TracingLogger;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    logging::init_tracing();

    let config = Config::from_env().context("failed to load configuration")?;
    tracing::info!(?config, "starting ride-service");

    let pool = db::init_pool(&config.database)
        .await
        .context("failed to connect to database")?;
    db::MIGRATOR
        .run(&pool)
        .await
        .context("failed to run database migrations")?;
    tracing::info!("database migrations applied");

    let addr = format!("0.0.0.0:{}", config.app.port);
    let state = AppState::new(pool, config);
    let registry = state.registry.clone();

    tracing::info!("Starting HTTP server on {}", addr);
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(metrics::MetricsMiddleware)
            .wrap(TracingLogger::default())
            .configure(configure_app)
    })
    .bind(&addr)?
    .run()
    .await?;

    let closed = registry.close_all().await;
    tracing::info!(closed, "ride-service stopped");
    Ok(())
}
