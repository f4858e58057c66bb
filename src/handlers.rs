use crate::{
    AppState, auth,
    auth::AuthUser,
    error::{AppError, AppResult, OrRedirect, Redirected},
    flash,
    models::{
        self, ApplicantDashboardView, Flash, FormView, JobDetailView, JobForm, JobListView,
        LoginForm, RecruiterDashboardView, RegisterForm, UserSummary,
    },
    services::{
        accounts,
        applications::{self, ResumeFile},
        jobs,
    },
};
use axum::{
    Form, Json,
    extract::{
        Multipart, Path, State,
        multipart::{MultipartError, MultipartRejection},
    },
    response::Redirect,
};
use axum_extra::extract::CookieJar;

/// Redirects to `to` with a success notice queued for the next page.
fn redirect_with(jar: CookieJar, notice: Flash, to: &str) -> (CookieJar, Redirect) {
    (flash::push(jar, &notice), Redirect::to(to))
}

fn form_view(jar: CookieJar, form: &str) -> (CookieJar, Json<FormView>) {
    let (jar, flashes) = flash::take(jar);
    let view = FormView {
        form: form.to_string(),
        flashes,
    };
    (jar, Json(view))
}

// --- Public Pages ---

/// index
///
/// [Public Route] Lists every job on the board.
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "All jobs", body = JobListView))
)]
pub async fn index(
    State(state): State<AppState>,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<JobListView>)> {
    let jobs = jobs::list_jobs(&*state.repo).await?;
    let (jar, flashes) = flash::take(jar);
    Ok((jar, Json(JobListView { jobs, flashes })))
}

/// job_detail
///
/// [Public Route] Shows one job. Unknown ids are a plain 404.
#[utoipa::path(
    get,
    path = "/job/{id}",
    params(("id" = i64, Path, description = "Job ID")),
    responses(
        (status = 200, description = "Found", body = JobDetailView),
        (status = 404, description = "No such job")
    )
)]
pub async fn job_detail(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<JobDetailView>)> {
    let (job, posted_by) = jobs::job_detail(&*state.repo, id).await?;
    let (jar, flashes) = flash::take(jar);
    Ok((
        jar,
        Json(JobDetailView {
            job,
            posted_by,
            flashes,
        }),
    ))
}

// --- Registration & Login ---

#[utoipa::path(
    get,
    path = "/register",
    responses((status = 200, description = "Registration form", body = FormView))
)]
pub async fn register_form(jar: CookieJar) -> (CookieJar, Json<FormView>) {
    form_view(jar, "register")
}

/// register
///
/// [Public Route] Creates an account. An already-registered email is sent to the login
/// page; every other failure goes back to the registration form.
#[utoipa::path(
    post,
    path = "/register",
    request_body(content = RegisterForm, content_type = "application/x-www-form-urlencoded"),
    responses((status = 303, description = "Redirect to /login on success, back to the form on failure"))
)]
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<RegisterForm>,
) -> Result<(CookieJar, Redirect), Redirected> {
    match accounts::register(&*state.repo, form).await {
        Ok(_) => Ok(redirect_with(
            jar,
            Flash::success("Registration successful! Please log in."),
            "/login",
        )),
        Err(error @ AppError::Conflict { field: "email", .. }) => Err(Redirected {
            error,
            to: "/login".to_string(),
        }),
        Err(error) => Err(Redirected {
            error,
            to: "/register".to_string(),
        }),
    }
}

#[utoipa::path(
    get,
    path = "/login",
    responses((status = 200, description = "Login form", body = FormView))
)]
pub async fn login_form(jar: CookieJar) -> (CookieJar, Json<FormView>) {
    form_view(jar, "login")
}

/// login
///
/// [Public Route] Verifies credentials, sets the signed `session` cookie and sends the
/// user to the dashboard for their role.
#[utoipa::path(
    post,
    path = "/login",
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    responses((status = 303, description = "Redirect to the role dashboard, or back to /login"))
)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<(CookieJar, Redirect), Redirected> {
    let user = accounts::login(&*state.repo, form)
        .await
        .or_redirect("/login")?;
    let token = auth::issue_session(user.id, &state.config).or_redirect("/login")?;

    let jar = jar.add(auth::session_cookie(token, &state.config));
    Ok(redirect_with(
        jar,
        Flash::success("Login successful!"),
        user.role.dashboard_path(),
    ))
}

/// logout
///
/// [Authenticated Route] Clears the session cookie unconditionally.
#[utoipa::path(
    get,
    path = "/logout",
    responses((status = 303, description = "Redirect to /"))
)]
pub async fn logout(user: AuthUser, jar: CookieJar) -> (CookieJar, Redirect) {
    tracing::info!(user_id = user.id, "user logged out");
    let jar = auth::clear_session(jar);
    redirect_with(jar, Flash::success("Logged out successfully!"), "/")
}

// --- Dashboards ---

/// recruiter_dashboard
///
/// [Authenticated Route] Recruiters only. Non-recruiters are sent home with a notice.
#[utoipa::path(
    get,
    path = "/recruiter_dashboard",
    responses(
        (status = 200, description = "Dashboard", body = RecruiterDashboardView),
        (status = 303, description = "Not a recruiter")
    )
)]
pub async fn recruiter_dashboard(
    user: AuthUser,
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<RecruiterDashboardView>), Redirected> {
    let dashboard = jobs::recruiter_dashboard(&*state.repo, &user)
        .await
        .or_redirect("/")?;
    let (jar, flashes) = flash::take(jar);
    Ok((
        jar,
        Json(RecruiterDashboardView {
            identity: summary(&user),
            jobs: dashboard.jobs,
            my_postings: dashboard.my_postings,
            flashes,
        }),
    ))
}

/// applicant_dashboard
///
/// [Authenticated Route] Applicants only.
#[utoipa::path(
    get,
    path = "/applicant_dashboard",
    responses(
        (status = 200, description = "Dashboard", body = ApplicantDashboardView),
        (status = 303, description = "Not an applicant")
    )
)]
pub async fn applicant_dashboard(
    user: AuthUser,
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<ApplicantDashboardView>), Redirected> {
    let dashboard = jobs::applicant_dashboard(&*state.repo, &user)
        .await
        .or_redirect("/")?;
    let (jar, flashes) = flash::take(jar);
    Ok((
        jar,
        Json(ApplicantDashboardView {
            identity: summary(&user),
            jobs: dashboard.jobs,
            my_applications: dashboard.my_applications,
            flashes,
        }),
    ))
}

fn summary(user: &AuthUser) -> UserSummary {
    UserSummary {
        id: user.id,
        username: user.username.clone(),
        role: user.role,
    }
}

// --- Job Posting & Deletion ---

#[utoipa::path(
    get,
    path = "/post_job",
    responses(
        (status = 200, description = "Job posting form", body = FormView),
        (status = 303, description = "Not a recruiter")
    )
)]
pub async fn post_job_form(
    user: AuthUser,
    jar: CookieJar,
) -> Result<(CookieJar, Json<FormView>), Redirected> {
    jobs::can_post_jobs(&user).or_redirect("/")?;
    Ok(form_view(jar, "post_job"))
}

/// post_job
///
/// [Authenticated Route] Recruiters only. Missing fields send the user back to the form.
#[utoipa::path(
    post,
    path = "/post_job",
    request_body(content = JobForm, content_type = "application/x-www-form-urlencoded"),
    responses((status = 303, description = "Redirect to /recruiter_dashboard on success"))
)]
pub async fn post_job(
    user: AuthUser,
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<JobForm>,
) -> Result<(CookieJar, Redirect), Redirected> {
    match jobs::post_job(&*state.repo, &user, form).await {
        Ok(_) => Ok(redirect_with(
            jar,
            Flash::success("Job posted successfully!"),
            "/recruiter_dashboard",
        )),
        Err(error @ AppError::Validation(_)) => Err(Redirected {
            error,
            to: "/post_job".to_string(),
        }),
        Err(error) => Err(Redirected {
            error,
            to: "/".to_string(),
        }),
    }
}

/// delete_job
///
/// [Authenticated Route] Only the recruiter who posted the job may delete it.
/// Applications to the job are deleted with it.
#[utoipa::path(
    get,
    path = "/delete_job/{id}",
    params(("id" = i64, Path, description = "Job ID")),
    responses(
        (status = 303, description = "Redirect to /recruiter_dashboard"),
        (status = 404, description = "No such job")
    )
)]
pub async fn delete_job(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), Redirected> {
    jobs::delete_job(&*state.repo, &*state.storage, id, &user)
        .await
        .or_redirect("/recruiter_dashboard")?;
    Ok(redirect_with(
        jar,
        Flash::success("Job deleted successfully!"),
        "/recruiter_dashboard",
    ))
}

// --- Applying ---

/// Notice shown when the multipart body cannot be parsed or exceeds the size limit.
pub const UNREADABLE_UPLOAD: &str = "Could not read the uploaded file. It may be too large.";

fn unreadable_upload(e: MultipartError) -> AppError {
    tracing::debug!(status = %e.status(), "multipart body rejected: {}", e.body_text());
    AppError::validation(UNREADABLE_UPLOAD)
}

/// Pulls the `resume` field out of the multipart body. `None` when the request carried
/// no such field (or was not multipart at all).
async fn read_resume(
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Option<ResumeFile>> {
    let Ok(mut multipart) = multipart else {
        return Ok(None);
    };

    while let Some(field) = multipart.next_field().await.map_err(unreadable_upload)? {
        if field.name() != Some("resume") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await.map_err(unreadable_upload)?;
        return Ok(Some(ResumeFile {
            filename,
            content_type,
            data,
        }));
    }
    Ok(None)
}

/// apply
///
/// [Authenticated Route] Uploads a resume (multipart field `resume`) for a job.
#[utoipa::path(
    post,
    path = "/apply/{id}",
    params(("id" = i64, Path, description = "Job ID")),
    request_body(content = models::ResumeUpload, content_type = "multipart/form-data"),
    responses(
        (status = 303, description = "Redirect to / on success, back to the job on failure"),
        (status = 404, description = "No such job")
    )
)]
pub async fn apply(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    jar: CookieJar,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(CookieJar, Redirect), Redirected> {
    let back = format!("/job/{id}");
    let upload = read_resume(multipart).await.or_redirect(back.as_str())?;

    applications::apply(&*state.repo, &*state.storage, id, &user, upload)
        .await
        .or_redirect(back)?;

    Ok(redirect_with(
        jar,
        Flash::success("Application submitted successfully!"),
        "/",
    ))
}
