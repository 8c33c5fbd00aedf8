// src/bin/seed.rs

use coursehub::config::Config;
use coursehub::services::{AuthService, SeedService};
use coursehub::store::PgStore;
use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenv().ok();
    let config = Config::from_env();

    tracing_subscriber::registry()
        .with(EnvFilter::new(&config.rust_log))
        .with(fmt::layer().with_target(false))
        .init();

    // Initialize Database Pool with Retry
    let mut retry_count = 0;
    let pool = loop {
        match PgPoolOptions::new()
            .max_connections(2)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
        {
            Ok(pool) => break pool,
            Err(e) => {
                retry_count += 1;
                if retry_count > 5 {
                    panic!("Failed to connect to database after 5 retries: {}", e);
                }
                tracing::warn!(
                    "Database not ready, retrying in 2s... (Attempt {})",
                    retry_count
                );
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
        }
    };

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    let store = PgStore::new(pool);

    if let Err(e) = AuthService::new(&store, &config).ensure_admin().await {
        tracing::error!("Failed to seed admin user: {:?}", e);
    }

    match SeedService::new(&store, &config.base_url).run().await {
        Ok(report) => tracing::info!(
            "Seeding finished: {} users, {} courses, {} modules, {} enrollments created",
            report.users,
            report.courses,
            report.modules,
            report.enrollments
        ),
        Err(e) => {
            tracing::error!("Seeding failed: {:?}", e);
            std::process::exit(1);
        }
    }
}
