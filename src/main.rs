#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
// easier to use when using the functions as callback of foreign functions
#![allow(clippy::needless_pass_by_value)]
#![doc = include_str!("../README.md")]

use std::net::SocketAddr;

use anyhow::Result;
use axum::Extension;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing_subscriber::prelude::*;

use crate::api::JwtKeys;
use crate::api::not_found;
use crate::api::router;
use crate::note_service::NoteService;
use crate::seed::seed_sample_data;
use crate::statistics::StatisticsService;
use crate::storage::Storage;
use crate::storage::setup;
use crate::utils::env_var;
use crate::utils::env_var_or_else;

mod api;
mod graceful_shutdown;
mod note_service;
mod notes;
mod password;
mod seed;
mod statistics;
mod storage;
#[cfg(all(test, not(feature = "postgres")))]
mod tests;
mod users;
mod utils;

const DEFAULT_RUST_LOG: &str = "qnotes=debug,tower_http=debug";
const DEFAULT_ADDRESS: &str = "0.0.0.0:8080";

#[tokio::main]
async fn main() -> Result<()> {
    setup_environment();
    setup_tracing();

    let app = setup_app().await?;

    let address = setup_address()?;
    tracing::info!("Listening on {}", address);

    let listener = TcpListener::bind(address).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(graceful_shutdown::handler())
        .await?;

    Ok(())
}

/// Create and setup the app with its dependencies
///
/// # Errors
///
/// Will return `Err` if any of its dependencies fail to load:
/// - Storage connection
/// - Sample data
pub async fn setup_app() -> Result<Router> {
    let storage = setup().await?;

    seed_sample_data(&storage).await?;

    Ok(create_router(storage, setup_jwt_keys()))
}

/// Create the router for QNotes
///
/// Every service shares the same storage handle
fn create_router<S: Storage>(storage: S, jwt_keys: JwtKeys) -> Router {
    let notes = NoteService::new(storage.clone());
    let statistics = StatisticsService::new(notes.clone());

    Router::new()
        .nest("/api", router::<S>())
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(Extension(storage))
        .layer(Extension(notes))
        .layer(Extension(statistics))
        .layer(Extension(jwt_keys))
}

fn setup_environment() {
    dotenvy::dotenv().ok();
}

fn setup_tracing() {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::registry;

    registry()
        .with(EnvFilter::new(env_var_or_else("RUST_LOG", || {
            DEFAULT_RUST_LOG.into()
        })))
        .with(fmt::layer())
        .init();
}

fn setup_jwt_keys() -> JwtKeys {
    use crate::password::generate;

    let jwt_secret = env_var_or_else("JWT_SECRET", || {
        let jwt_secret = generate();
        tracing::info!("`JWT_SECRET` is not set, generating temporary one: {jwt_secret}");
        jwt_secret
    });

    JwtKeys::new(jwt_secret.as_bytes())
}

fn setup_address() -> Result<SocketAddr> {
    let mut address =
        env_var_or_else("ADDRESS", || String::from(DEFAULT_ADDRESS)).parse::<SocketAddr>()?;

    // optional override of just the port
    if let Some(port) = env_var("PORT") {
        address.set_port(port.parse::<u16>()?);
    }

    Ok(address)
}
