use std::net::SocketAddr;

use axum::{routing::get, Router};
use tower_http::{
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnResponse, TraceLayer},
    LatencyUnit,
};
use tracing::Level;

use crate::auth::session;
use crate::state::AppState;
use crate::{auth, tasks};

pub fn build_app(state: AppState) -> Router {
    let public_dir = state.config.public_dir.clone();
    let routes = Router::new()
        .merge(auth::router(&public_dir))
        .merge(tasks::router())
        .route("/health", get(|| async { "ok" }))
        .fallback_service(ServeDir::new(&public_dir))
        .with_state(state.clone());

    session::install(
        routes,
        state.session_store,
        &state.config.session,
        state.session_key,
    )
    .layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_response(
                DefaultOnResponse::new()
                    .level(Level::INFO)
                    .latency_unit(LatencyUnit::Millis),
            )
            .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
    )
}

pub async fn serve(app: Router, host: &str, port: u16) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{host}:{port}").parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
