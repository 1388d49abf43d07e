//! Campaign contribution intake service — entry point.
//!
//! Serves the contribution and KYC endpoints over an Axum REST API backed by
//! SQLite.  A background task purges expired rate-limit windows.

mod api;
mod auth;
mod config;
mod contributions;
mod db;
mod errors;
mod kyc;
mod models;
mod rate_limit;
mod validation;

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::Config;
use rate_limit::RateLimiter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging (RUST_LOG controls verbosity).
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Load optional .env file (ignored if missing).
    let _ = dotenvy::dotenv();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!("{e}"))?;

    // Set up the SQLite connection pool and run migrations.
    let pool = db::init_pool(&config.database_url, config.db_max_connections).await?;

    // ─── Rate-limit sweeper ───────────────────────────────
    let limiter = Arc::new(RateLimiter::new(
        config.rate_limit_max_requests,
        config.rate_limit_window(),
    ));
    tokio::spawn(rate_limit::run_sweeper(
        limiter.clone(),
        config.rate_limit_sweep_interval(),
    ));

    if config.reviewer_api_key.is_none() {
        warn!("REVIEWER_API_KEY is not set; PUT /api/kyc accepts unauthenticated reviews");
    }

    // ─── REST API ─────────────────────────────────────────
    let app = api::router(Arc::new(api::ApiState {
        pool,
        limiter,
        reviewer_api_key: config.reviewer_api_key.clone(),
    }));

    let addr = format!("0.0.0.0:{}", config.api_port);
    info!("API listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
