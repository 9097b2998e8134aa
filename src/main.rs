use std::sync::Arc;
use std::time::Duration;

use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use announcements_api::{
    config::Config,
    cors_layer, db,
    routes,
    services::{announcements::AnnouncementService, metrics},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let pool = db::create_pool(&config.database_url, config.database_max_connections).await?;
    db::run_migrations(&pool).await?;
    info!("Database connected and migrations applied");

    let store = Arc::new(db::PgStore::new(pool));
    let announcements = AnnouncementService::new(store.clone(), store);

    metrics::start(
        announcements.clone(),
        Duration::from_secs(config.metrics_refresh_seconds),
    );

    let app = routes::router(AppState { announcements })
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(config.app_base_url.clone()));

    let addr = format!("{}:{}", config.host, config.port);
    info!("Announcements API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
