use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};

use crate::state::AppState;

pub mod dto;
pub mod handlers;

/// Moderation and admin management. Everything except login is behind the
/// admin gate via the `AuthAdmin` extractor.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/login", post(handlers::login))
        .route("/admin/profile", get(handlers::profile))
        .route("/admin/recruiters", get(handlers::list_recruiters))
        .route("/admin/recruiters/pending", get(handlers::pending_recruiters))
        .route(
            "/admin/recruiters/:id/approve",
            patch(handlers::approve_recruiter),
        )
        .route("/admin/recruiters/:id/reject", patch(handlers::reject_recruiter))
        .route("/admin/users/:id/verify", put(handlers::verify_user))
        .route(
            "/admin/admins",
            get(handlers::list_admins).post(handlers::create_admin),
        )
        .route("/admin/admins/:id", delete(handlers::delete_admin))
}
