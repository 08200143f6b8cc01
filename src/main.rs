use std::net::SocketAddr;
use std::sync::Arc;

use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lostfound_server::{
    auth::SessionStore,
    config::Config,
    create_router,
    repositories::{
        account_repository::PostgresAccountRepository,
        feedback_repository::PostgresFeedbackRepository, item_repository::PostgresItemRepository,
    },
    storage::ImageHostClient,
    store::ItemStore,
    AppState,
};

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().expect("Invalid configuration");

    // Create database connection pool
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .expect("Failed to create database pool.");

    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .expect("Failed to run database migrations.");

    info!("Database connection pool established");

    let state = AppState {
        items: ItemStore::new(Arc::new(PostgresItemRepository::new(db_pool.clone()))),
        feedback: Arc::new(PostgresFeedbackRepository::new(db_pool.clone())),
        accounts: Arc::new(PostgresAccountRepository::new(db_pool)),
        sessions: SessionStore::new(),
        image_storage: Arc::new(ImageHostClient::new(
            config.image_upload_url.clone(),
            config.image_upload_preset.clone(),
            config.image_folder.clone(),
        )),
    };

    let app = create_router(state);

    // Define the address and port to run the server on.
    let addr = SocketAddr::from(([127, 0, 0, 1], config.server_port));
    info!(%addr, "Listening");

    // Run the server.
    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
