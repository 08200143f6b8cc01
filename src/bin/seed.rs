use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;

use lostfound_server::seeder::seed_demo_items;

#[tokio::main]
async fn main() {
    dotenv().ok();

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await
        .expect("Failed to create database pool.");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations.");

    seed_demo_items(&pool).await.expect("Seeding failed");
}
