mod config;
mod db;
mod model;
mod routes;
mod services;
mod state;
mod store;
mod views;

use std::fmt::Display;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

/// Startup failures are fatal: log them and exit non-zero.
fn or_exit<T, E: Display>(result: Result<T, E>, what: &str) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            tracing::error!(error = %e, "{what}");
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = or_exit(config::AppConfig::from_env(), "invalid configuration");

    let pool = or_exit(
        db::init_pool(&config.database_url, config.db_max_connections).await,
        "database init failed",
    );
    let store = Arc::new(store::PgStore::new(pool));
    let mailer = or_exit(services::notify::build_mailer(&config.mail), "mail transport init failed");

    let port = config.port;
    tracing::info!(
        notify_failure = ?config.notify_failure,
        admin_emails = config.admin_emails.len(),
        "configuration loaded"
    );
    let state = state::AppState::new(store, mailer, config);

    let app = routes::app(state);
    let listener = or_exit(
        tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await,
        "failed to bind",
    );

    tracing::info!(%port, "servicedesk listening");
    or_exit(axum::serve(listener, app).await, "server failed");
}
