mod app;
mod auth;
mod config;
mod db;
mod error;
mod state;
mod tasks;
#[cfg(test)]
mod testing;

use std::time::Duration;

use crate::{config::AppConfig, state::AppState};

const SESSION_SWEEP_PERIOD: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "todosys=debug,axum=info,tower_http=info,sqlx=warn".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let config = AppConfig::from_env()?;
    if config.tasks_list_legacy_query_auth {
        tracing::warn!("GET /api/tasks trusts the userId query parameter without a session");
    }

    let pool = db::connect(&config).await?;
    db::migrate(&pool).await?;

    let (host, port) = (config.host.clone(), config.port);
    let app_state = AppState::init(config, pool)?;
    app_state.session_store.migrate().await?;
    app_state.session_store.spawn_expiry_sweep(SESSION_SWEEP_PERIOD);

    let app = app::build_app(app_state);
    app::serve(app, &host, port).await
}
