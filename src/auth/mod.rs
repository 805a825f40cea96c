use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod extractors;
pub mod handlers;
pub mod password;
pub mod repo;
pub mod repo_types;
pub mod session;

pub fn router(public_dir: &str) -> Router<AppState> {
    Router::new()
        .merge(handlers::page_routes(public_dir))
        .merge(handlers::me_routes())
}
