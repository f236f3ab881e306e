//! HTTP surface of the dashboard.
//!
//! Everything under `/api` except login, logout and the market table requires
//! an authenticated session.

pub mod auth;
pub mod dashboard;
pub mod error;
pub mod markets;
pub mod positions;
pub mod transactions;

use crate::core::config::{AppConfig, ServerConfig};
use crate::core::market::MarketDataProvider;
use crate::core::store::PositionStore;
use crate::providers::StaticMarketProvider;
use crate::store::SessionBackend;
use anyhow::{Context, Result};
use axum::Router;
use axum::routing::{delete, get, post};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tower_sessions::cookie::SameSite;
use tower_sessions::session_store::ExpiredDeletion;
use tower_sessions::{Expiry, SessionManagerLayer};
use tracing::{debug, error, info};

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;
/// Upper bound for `server.session_days`.
pub const MAX_SESSION_DAYS: i64 = 365;
const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PositionStore>,
    pub markets: Arc<dyn MarketDataProvider>,
}

impl AppState {
    pub fn new(store: Arc<dyn PositionStore>, markets: Arc<dyn MarketDataProvider>) -> Self {
        AppState { store, markets }
    }
}

fn session_lifetime(days: i64) -> Result<Duration> {
    if !(1..=MAX_SESSION_DAYS).contains(&days) {
        anyhow::bail!("session_days must be between 1 and {MAX_SESSION_DAYS}, got {days}");
    }
    u64::try_from(days)
        .ok()
        .and_then(|d| d.checked_mul(SECONDS_PER_DAY))
        .map(Duration::from_secs)
        .context("Session lifetime out of range")
}

/// Builds the application router with session and tracing layers.
pub fn router(state: AppState, server: &ServerConfig, sessions: SessionBackend) -> Result<Router> {
    let inactivity = session_lifetime(server.session_days)?
        .try_into()
        .context("Session lifetime out of range")?;

    let session_layer = SessionManagerLayer::new(sessions)
        .with_secure(server.secure_cookies)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(inactivity));

    let api = Router::new()
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/auth/user", get(auth::current_user))
        .route("/dashboard", get(dashboard::dashboard))
        .route("/dashboard/metrics", get(dashboard::metrics))
        .route(
            "/lending",
            get(positions::list_lending).post(positions::create_lending),
        )
        .route("/lending/{id}", delete(positions::delete_lending))
        .route(
            "/borrowing",
            get(positions::list_borrowing).post(positions::create_borrowing),
        )
        .route("/borrowing/{id}", delete(positions::delete_borrowing))
        .route("/transactions", get(transactions::list))
        .route("/markets", get(markets::list));

    Ok(Router::new()
        .nest("/api", api)
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

/// Serves `router` on `listener` until Ctrl-C.
pub async fn serve(listener: TcpListener, router: Router) -> Result<()> {
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

/// Removes expired sessions every `period` until the process exits.
pub async fn purge_expired_sessions(sessions: SessionBackend, period: Duration) {
    let mut interval = tokio::time::interval(period);
    loop {
        interval.tick().await;
        match sessions.delete_expired().await {
            Ok(()) => debug!("Expired sessions purged"),
            Err(e) => error!(error = %e, "Failed to purge expired sessions"),
        }
    }
}

/// Opens the configured store and runs the server on the configured address.
pub async fn run(config: &AppConfig) -> Result<()> {
    let stores = crate::store::open(config)?;
    let markets = Arc::new(StaticMarketProvider::new(config.markets.clone()));
    let app = router(
        AppState::new(stores.positions, markets),
        &config.server,
        stores.sessions.clone(),
    )?;
    tokio::spawn(purge_expired_sessions(stores.sessions, SESSION_PURGE_INTERVAL));

    let listener = TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind))?;
    info!("Listening on http://{}", listener.local_addr()?);

    serve(listener, app).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Stores;

    fn build(session_days: i64) -> Result<Router> {
        let stores = Stores::memory();
        let markets = Arc::new(StaticMarketProvider::new(Vec::new()));
        let server = ServerConfig {
            session_days,
            ..Default::default()
        };
        router(
            AppState::new(stores.positions, markets),
            &server,
            stores.sessions,
        )
    }

    #[test]
    fn test_session_lifetime_in_days() {
        assert_eq!(
            session_lifetime(7).unwrap(),
            Duration::from_secs(7 * SECONDS_PER_DAY)
        );
        assert_eq!(
            session_lifetime(MAX_SESSION_DAYS).unwrap(),
            Duration::from_secs(365 * SECONDS_PER_DAY)
        );
    }

    #[test]
    fn test_out_of_range_session_days_are_rejected() {
        for days in [i64::MAX, MAX_SESSION_DAYS + 1, 0, -3, i64::MIN] {
            let err = build(days).unwrap_err();
            assert!(err.to_string().contains("session_days"), "{days}: {err}");
        }
        assert!(build(7).is_ok());
    }
}
