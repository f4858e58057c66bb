use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Endpoints reachable without a session: browsing jobs and the account gateway
/// (registration and login).
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness check for load balancers.
        .route("/health", get(|| async { "ok" }))
        // GET /
        // Every job on the board.
        .route("/", get(handlers::index))
        // GET /job/{id}
        // One job, or 404.
        .route("/job/{id}", get(handlers::job_detail))
        // GET/POST /register
        .route(
            "/register",
            get(handlers::register_form).post(handlers::register),
        )
        // GET/POST /login
        // A successful POST sets the `session` cookie and redirects by role.
        .route("/login", get(handlers::login_form).post(handlers::login))
}
