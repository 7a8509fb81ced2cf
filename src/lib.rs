use axum::Router;
use tokio::net::TcpListener;

use crate::model::{DbConnection, ModelManager};
use crate::utils::signal::shutdown_signal;
use crate::{error::AppResult, web::AppState};

pub mod config;
pub use config::{Config, ConfigError, ConfigResult};

pub mod auth;
pub mod client;
pub mod error;
pub mod model;
pub mod player;
pub mod studio;
pub mod utils;
pub mod web;

static APPLICATION_NAME: &str = "nexus";

pub async fn build_server() -> AppResult<(AppState, Router)> {
    let use_local = cfg!(debug_assertions);
    let config = config::Config::get_or_init(use_local).await;

    let db = DbConnection::connect(config.app().database_uri())?;
    db.migrate().await?;

    let state = AppState::from_config(ModelManager::new(db), config);
    let app = web::routes::build_app(state.clone(), config.app().docs());
    Ok((state, app))
}

/// Router over an existing state, without docs. Used by tests and embedders
/// that manage their own database.
pub fn build_server_with_state(state: AppState) -> Router {
    web::routes::build_app(state, false)
}

#[tracing::instrument]
pub async fn setup_workers() -> AppResult<()> {
    let (_, app) = build_server().await?;
    let config = Config::get_or_init(cfg!(debug_assertions)).await;
    let listener = TcpListener::bind(config.host().bindto()).await?;

    tracing::info!("{APPLICATION_NAME} is starting at: {}", config.host().bindto());
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

pub fn setup_trace() {
    use tracing_error::ErrorLayer;
    use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

    // load .env file for RUST_LOG etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .with(ErrorLayer::default())
        .init();

    tracing::debug!("tracing initialized.");
}

#[tracing::instrument]
pub async fn run() -> AppResult<()> {
    setup_trace();
    setup_workers().await?;
    Ok(())
}
