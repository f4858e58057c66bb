use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Authenticated Router Module
///
/// Routes that need a valid session. The router is wrapped in the auth middleware, and
/// each handler also takes the `AuthUser` extractor for the identity it acts as.
/// Role and ownership checks happen in the service each handler calls.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // POST /apply/{id}
        // Multipart upload of a resume (`resume` field) for a job.
        .route("/apply/{id}", post(handlers::apply))
        // GET /logout
        .route("/logout", get(handlers::logout))
        // --- Dashboards (role-gated) ---
        .route("/recruiter_dashboard", get(handlers::recruiter_dashboard))
        .route("/applicant_dashboard", get(handlers::applicant_dashboard))
        // --- Recruiter actions ---
        // GET/POST /post_job
        .route(
            "/post_job",
            get(handlers::post_job_form).post(handlers::post_job),
        )
        // GET /delete_job/{id}
        // Owner-only. Deletes the job's applications too.
        .route("/delete_job/{id}", get(handlers::delete_job))
}
