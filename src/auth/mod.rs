use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub mod claims;
pub mod dto;
pub mod extractors;
pub mod handlers;
pub mod ids;
pub mod jwt;
pub mod membership;
pub mod ownership;
pub mod password;
pub mod repo;
pub mod repo_types;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/sign-up", post(handlers::sign_up))
        .route("/login", post(handlers::login))
        .route("/verify/:user_id/:code", get(handlers::verify_email))
        .route("/count", get(handlers::count))
        .route("/me", get(handlers::me))
}
