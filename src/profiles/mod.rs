use axum::{
    routing::{get, post, put},
    Router,
};

use crate::state::AppState;

pub mod dto;
pub mod handlers;
pub mod repo;
pub mod repo_types;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/engineers",
            get(handlers::list_engineers).post(handlers::create_engineer),
        )
        .route("/engineers/me", put(handlers::update_own_engineer))
        .route(
            "/engineers/:id",
            get(handlers::read_engineer).put(handlers::update_engineer),
        )
        .route("/recruiters", post(handlers::create_recruiter))
        .route("/recruiters/me", put(handlers::update_own_recruiter))
        .route(
            "/recruiters/:id",
            get(handlers::read_recruiter).put(handlers::update_recruiter),
        )
}
