use axum::{
    Router,
    extract::{DefaultBodyLimit, FromRef, Request},
    http::{HeaderName, StatusCode},
    middleware::{self, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod config;
pub mod error;
pub mod flash;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod services;
pub mod storage;

// Routing segregated by access requirement (public, authenticated).
pub mod routes;
use auth::AuthUser;
use routes::{authenticated, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use repository::{InMemoryRepository, PostgresRepository, RepositoryState};
pub use storage::{LocalStorage, MockStorageService, S3StorageClient, StorageState};

/// ApiDoc
///
/// OpenAPI document for every route, served at `/api-docs/openapi.json` and browsable
/// through Swagger UI.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::index, handlers::job_detail, handlers::register_form, handlers::register,
        handlers::login_form, handlers::login, handlers::logout, handlers::recruiter_dashboard,
        handlers::applicant_dashboard, handlers::post_job_form, handlers::post_job,
        handlers::delete_job, handlers::apply
    ),
    components(
        schemas(
            models::Role, models::ApplicationStatus, models::User, models::Job,
            models::Application, models::RegisterForm, models::LoginForm, models::JobForm,
            models::ResumeUpload, models::FlashLevel, models::Flash, models::UserSummary,
            models::JobListView, models::JobDetailView, models::PostingWithApplications,
            models::RecruiterDashboardView, models::ApplicantDashboardView, models::FormView,
        )
    ),
    tags(
        (name = "job-board", description = "Job board: postings, applications and dashboards")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single, cloneable container of shared services and configuration handed to
/// every request.
#[derive(Clone)]
pub struct AppState {
    /// Persistence layer (Postgres in production, in-memory in tests).
    pub repo: RepositoryState,
    /// Resume storage (local disk, S3, or the mock).
    pub storage: StorageState,
    /// The loaded, immutable configuration.
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

// Let handlers and extractors pull individual components out of the shared state.

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for StorageState {
    fn from_ref(app_state: &AppState) -> StorageState {
        app_state.storage.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Guards `authenticated_routes`. Extracting `AuthUser` resolves the session; when that
/// fails the extractor's rejection (redirect to `/login`) is returned and the handler
/// never runs.
async fn auth_middleware(_auth_user: AuthUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// create_router
///
/// Assembles all routes, applies the middleware stack and registers the state.
pub fn create_router(state: AppState) -> Router {
    let x_request_id = HeaderName::from_static("x-request-id");
    let request_timeout = state.config.request_timeout;
    let body_limit = state.config.max_upload_bytes;

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(
            authenticated::authenticated_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        )
        // Bounds the size of uploaded resumes.
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state);

    // Observability, correlation and hardening layers (outermost first).
    base_router.layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(trace_span_logger)
                    .on_response(
                        DefaultOnResponse::new()
                            .level(Level::INFO)
                            .latency_unit(tower_http::LatencyUnit::Millis),
                    ),
            )
            .layer(PropagateRequestIdLayer::new(x_request_id))
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                request_timeout,
            )),
    )
}

/// trace_span_logger
///
/// Span for one request, tagged with the `x-request-id` so every log line of a
/// request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
