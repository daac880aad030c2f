use anyhow::Result;
use axum::{routing::get, Router};
use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use tracing_subscriber;

mod ai;
mod auth;
mod config;
mod cycle;
mod db;
mod error;
mod fasting;
mod models;
mod profile;
mod routes;
mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = Config::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;

    let state = AppState::new(pool, &config);

    let app = Router::new()
        .merge(routes::auth::routes(state.clone()))
        .merge(routes::profile::routes(state.clone()))
        .merge(routes::journal::routes(state.clone()))
        .merge(routes::meals::routes(state.clone()))
        .merge(routes::pantry::routes(state.clone()))
        .merge(routes::recipes::routes(state.clone()))
        .merge(routes::cycle::routes(state.clone()))
        .merge(routes::reports::routes(state))
        .route("/health", get(|| async { "✅ Backend up" }));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("🥑 Server running at {}", addr);

    axum::serve(
        tokio::net::TcpListener::bind(addr).await?,
        app.into_make_service(),
    )
    .await?;

    Ok(())
}
