use axum::body::Bytes;

use crate::{
    auth::AuthUser,
    error::{AppError, AppResult},
    models::{Application, NewApplication},
    repository::{Repository, RepositoryError},
    storage::{self, StorageService},
};

use super::jobs;

pub const NO_FILE: &str = "No file uploaded!";
pub const NO_SELECTED_FILE: &str = "No selected file!";
pub const EMPTY_FILE: &str = "The selected file is empty!";
pub const ALREADY_APPLIED: &str = "You have already applied to this job.";

/// A resume as received from the multipart form.
#[derive(Debug, Clone)]
pub struct ResumeFile {
    /// The filename the client sent; may be empty.
    pub filename: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// apply
///
/// Stores the resume under a server-generated key and records a `Pending` application.
/// If the row cannot be written the stored file is removed again, so either both the
/// file and the row exist or neither does.
///
/// # Errors
/// * `NotFound` when the job does not exist.
/// * `Validation` when no file was attached, the filename is empty, or the file is empty.
/// * `Conflict { field: "application" }` when the applicant already applied to this job.
/// * `Storage` when the file cannot be written.
pub async fn apply(
    repo: &dyn Repository,
    storage: &dyn StorageService,
    job_id: i64,
    applicant: &AuthUser,
    upload: Option<ResumeFile>,
) -> AppResult<Application> {
    let job = jobs::get_job(repo, job_id).await?;

    let upload = upload.ok_or_else(|| AppError::validation(NO_FILE))?;
    let resume_filename = storage::display_filename(&upload.filename);
    if resume_filename.is_empty() {
        return Err(AppError::validation(NO_SELECTED_FILE));
    }
    if upload.data.is_empty() {
        return Err(AppError::validation(EMPTY_FILE));
    }

    if repo.find_application(applicant.id, job.id).await?.is_some() {
        return Err(AppError::conflict("application", ALREADY_APPLIED));
    }

    let key = storage::resume_key(&resume_filename);
    let resume_path = storage
        .store(&key, upload.content_type.as_deref(), upload.data)
        .await?;

    let created = repo
        .create_application(NewApplication {
            user_id: applicant.id,
            job_id: job.id,
            resume_path: resume_path.clone(),
            resume_filename,
        })
        .await;

    match created {
        Ok(application) => {
            tracing::info!(
                application_id = application.id,
                job_id = job.id,
                user_id = applicant.id,
                "application submitted"
            );
            Ok(application)
        }
        Err(e) => {
            if let Err(cleanup) = storage.remove(&resume_path).await {
                tracing::warn!("could not remove orphaned resume {resume_path}: {cleanup}");
            }
            Err(match e {
                RepositoryError::Duplicate(_) => AppError::conflict("application", ALREADY_APPLIED),
                RepositoryError::MissingReference(_) => AppError::not_found(jobs::JOB_NOT_FOUND),
                other => AppError::from(other),
            })
        }
    }
}
