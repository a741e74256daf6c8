use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use hotel_server::collaborators::{LogNotifier, PgGuestDirectory, SystemClock};
use hotel_server::config::Config;
use hotel_server::routes::create_routes;
use hotel_server::services::ReservationEngine;
use hotel_server::state::AppState;
use hotel_server::store::PgStore;

#[tokio::main]
async fn main() {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env();
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Successfully connected to database");

    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    tracing::info!("Migrations run successfully");

    let engine = ReservationEngine::new(
        Arc::new(PgStore::new(pool.clone())),
        Arc::new(PgGuestDirectory::new(pool)),
        Arc::new(LogNotifier),
        Arc::new(SystemClock),
    );
    let app: Router = create_routes(AppState::new(engine), &config);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Server running at http://{}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .expect("Failed to bind address");

    axum::serve(listener, app).await.expect("Server failed");
}
