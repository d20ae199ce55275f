use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use std::sync::Arc;

use gallery_service::config::{Config, StorageBackend};
use gallery_service::domain::CityUniverse;
use gallery_service::repository::{MemoryStore, PgStore};
use gallery_service::{db, handlers, logging, metrics, FeedService};

#[actix_web::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    logging::init_tracing();

    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(
        env = %config.app.env,
        storage = %config.storage,
        facet_size = config.feed.facet_size,
        "Starting gallery-service"
    );

    let universe = CityUniverse::known();
    let service = match config.storage {
        StorageBackend::Memory => FeedService::with_store(
            Arc::new(MemoryStore::new()),
            universe,
            config.feed.facet_size,
        ),
        StorageBackend::Postgres => {
            let db_config = config
                .database
                .as_ref()
                .context("Postgres storage selected without database configuration")?;
            let pool = db::init_pool(db_config)
                .await
                .context("Failed to initialize database")?;
            FeedService::with_store(Arc::new(PgStore::new(pool)), universe, config.feed.facet_size)
        }
    };
    let service = web::Data::new(service);

    let (host, port) = config.bind_address();
    tracing::info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .wrap(tracing_actix_web::TracingLogger::default())
            .app_data(service.clone())
            .configure(handlers::configure)
            .route("/metrics", web::get().to(metrics::serve_metrics))
    })
    .bind((host.as_str(), port))
    .context("Failed to bind HTTP server")?
    .run()
    .await
    .context("HTTP server error")
}
