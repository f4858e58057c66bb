use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::{fmt, str::FromStr};
use thiserror::Error;
use ts_rs::TS;
use utoipa::ToSchema;

// --- Closed Enumerations ---

/// Role
///
/// The RBAC field of a `User`. Stored as lowercase text (`recruiter`, `applicant`, `admin`)
/// and matched exhaustively at every authorization point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    Recruiter,
    #[default]
    Applicant,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Recruiter => "recruiter",
            Role::Applicant => "applicant",
            Role::Admin => "admin",
        }
    }

    /// The dashboard a user lands on after logging in.
    /// Recruiters get their own dashboard; everyone else is sent to the applicant one.
    pub fn dashboard_path(&self) -> &'static str {
        match self {
            Role::Recruiter => "/recruiter_dashboard",
            Role::Applicant | Role::Admin => "/applicant_dashboard",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a role string is not one of the three known roles.
#[derive(Debug, Error, PartialEq)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "recruiter" => Ok(Role::Recruiter),
            "applicant" => Ok(Role::Applicant),
            "admin" => Ok(Role::Admin),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

// Lets sqlx decode the TEXT column straight into the enum (`#[sqlx(try_from = "String")]`).
impl TryFrom<String> for Role {
    type Error = UnknownRole;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// ApplicationStatus
///
/// Review state of an `Application`. Every application is created `Pending`;
/// no exposed operation moves it to another state yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub enum ApplicationStatus {
    #[default]
    Pending,
    Reviewed,
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "Pending",
            ApplicationStatus::Reviewed => "Reviewed",
            ApplicationStatus::Accepted => "Accepted",
            ApplicationStatus::Rejected => "Rejected",
        }
    }
}

#[derive(Debug, Error, PartialEq)]
#[error("unknown application status: {0}")]
pub struct UnknownStatus(pub String);

impl TryFrom<String> for ApplicationStatus {
    type Error = UnknownStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "Pending" => Ok(ApplicationStatus::Pending),
            "Reviewed" => Ok(ApplicationStatus::Reviewed),
            "Accepted" => Ok(ApplicationStatus::Accepted),
            "Rejected" => Ok(ApplicationStatus::Rejected),
            _ => Err(UnknownStatus(value)),
        }
    }
}

// --- Column Limits ---

// Character limits of the VARCHAR columns in `migrations/`.
pub const USERNAME_MAX_CHARS: usize = 150;
pub const EMAIL_MAX_CHARS: usize = 150;
pub const TITLE_MAX_CHARS: usize = 100;
pub const LOCATION_MAX_CHARS: usize = 100;

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// Canonical identity record from the `users` table.
/// The password hash is loaded for login verification but never serialized.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    #[ts(skip)]
    #[schema(ignore)]
    pub password_hash: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
}

/// Job
///
/// A posting from the `jobs` table. `recruiter_id` is the poster; resolve it with
/// `Repository::get_user` when the poster's details are needed.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[ts(export)]
pub struct Job {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub location: String,
    #[ts(type = "string")]
    pub date_posted: DateTime<Utc>,
    pub recruiter_id: i64,
}

/// Application
///
/// A resume submission linking a user to a job.
/// `resume_path` is the server-generated storage location; `resume_filename` is the
/// name the client uploaded, kept for display only.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[ts(export)]
pub struct Application {
    pub id: i64,
    pub user_id: i64,
    pub job_id: i64,
    pub resume_path: String,
    pub resume_filename: String,
    #[sqlx(try_from = "String")]
    pub status: ApplicationStatus,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

// --- Insert Payloads (Repository Input) ---

/// Validated data for a new `users` row. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

#[derive(Debug, Clone)]
pub struct NewJob {
    pub title: String,
    pub description: String,
    pub location: String,
    pub recruiter_id: i64,
}

#[derive(Debug, Clone)]
pub struct NewApplication {
    pub user_id: i64,
    pub job_id: i64,
    pub resume_path: String,
    pub resume_filename: String,
}

// --- Form Payloads (Input Schemas) ---

// Every field is optional so that a missing field reaches validation
// instead of being rejected by the extractor.

/// RegisterForm
///
/// Body of `POST /register`.
#[derive(Clone, Deserialize, Serialize, ToSchema, Default)]
pub struct RegisterForm {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    #[schema(example = "applicant")]
    pub role: Option<String>,
}

impl fmt::Debug for RegisterForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterForm")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"[redacted]")
            .field("role", &self.role)
            .finish()
    }
}

/// LoginForm
///
/// Body of `POST /login`.
#[derive(Clone, Deserialize, Serialize, ToSchema, Default)]
pub struct LoginForm {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginForm")
            .field("email", &self.email)
            .field("password", &"[redacted]")
            .finish()
    }
}

/// JobForm
///
/// Body of `POST /post_job`.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, Default)]
pub struct JobForm {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
}

/// ResumeUpload
///
/// Multipart body of `POST /apply/{id}`. Documentation-only schema; the handler reads the
/// `resume` field straight from the multipart stream.
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct ResumeUpload {
    #[schema(value_type = String, format = Binary)]
    pub resume: Vec<u8>,
}

// --- Flash Notices ---

/// FlashLevel
///
/// Severity of a flash notice, used by clients for styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum FlashLevel {
    Success,
    Info,
    Warning,
    Danger,
}

/// Flash
///
/// A one-shot notice shown on the page rendered after a redirect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

impl Flash {
    pub fn new(level: FlashLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(FlashLevel::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(FlashLevel::Warning, message)
    }
}

// --- View Models (Output Schemas) ---

/// UserSummary
///
/// The public part of a `User`, safe to hand to any page.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    pub role: Role,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            role: user.role,
        }
    }
}

/// JobListView
///
/// Data for the home page (`GET /`).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct JobListView {
    pub jobs: Vec<Job>,
    pub flashes: Vec<Flash>,
}

/// JobDetailView
///
/// Data for `GET /job/{id}`, including the poster's username resolved by id.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct JobDetailView {
    pub job: Job,
    pub posted_by: Option<String>,
    pub flashes: Vec<Flash>,
}

/// PostingWithApplications
///
/// One of the recruiter's own jobs together with the applications it received.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct PostingWithApplications {
    pub job: Job,
    pub applications: Vec<Application>,
}

/// RecruiterDashboardView
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RecruiterDashboardView {
    pub identity: UserSummary,
    /// Every job on the board.
    pub jobs: Vec<Job>,
    /// The recruiter's own postings.
    pub my_postings: Vec<PostingWithApplications>,
    pub flashes: Vec<Flash>,
}

/// ApplicantDashboardView
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ApplicantDashboardView {
    pub identity: UserSummary,
    pub jobs: Vec<Job>,
    pub my_applications: Vec<Application>,
    pub flashes: Vec<Flash>,
}

/// FormView
///
/// Data for the GET side of a form page (`register`, `login`, `post_job`).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct FormView {
    pub form: String,
    pub flashes: Vec<Flash>,
}
