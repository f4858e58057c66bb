use crate::{
    auth::AuthUser,
    error::{AppError, AppResult},
    models::{
        Application, Job, JobForm, LOCATION_MAX_CHARS, NewJob, PostingWithApplications, Role,
        TITLE_MAX_CHARS,
    },
    repository::{Repository, RepositoryError},
    storage::StorageService,
};

use super::{required, within_limit};

pub const JOB_NOT_FOUND: &str = "Job not found.";
pub const UNAUTHORIZED_ACTION: &str = "Unauthorized action!";
pub const NOT_YOUR_JOB: &str = "Unauthorized action! You can only delete your own jobs.";
pub const ACCESS_DENIED: &str = "Access denied!";

/// Fails with `Authorization(message)` unless the identity is a recruiter.
fn ensure_recruiter(identity: &AuthUser, message: &str) -> AppResult<()> {
    match identity.role {
        Role::Recruiter => Ok(()),
        Role::Applicant | Role::Admin => Err(AppError::authorization(message)),
    }
}

/// Every job on the board, in posting order.
pub async fn list_jobs(repo: &dyn Repository) -> AppResult<Vec<Job>> {
    Ok(repo.list_jobs().await?)
}

/// The job with `job_id`, or `NotFound`.
pub async fn get_job(repo: &dyn Repository, job_id: i64) -> AppResult<Job> {
    repo.get_job(job_id)
        .await?
        .ok_or_else(|| AppError::not_found(JOB_NOT_FOUND))
}

/// The job plus the username of whoever posted it, looked up by `recruiter_id`.
pub async fn job_detail(repo: &dyn Repository, job_id: i64) -> AppResult<(Job, Option<String>)> {
    let job = get_job(repo, job_id).await?;
    let poster = repo.get_user(job.recruiter_id).await?.map(|u| u.username);
    Ok((job, poster))
}

/// Checks that `identity` may open the job posting form.
pub fn can_post_jobs(identity: &AuthUser) -> AppResult<()> {
    ensure_recruiter(identity, UNAUTHORIZED_ACTION)
}

/// post_job
///
/// Creates a job owned by `poster`. The role check comes first, then field validation.
///
/// # Errors
/// * `Authorization` unless `poster` is a recruiter.
/// * `Validation` when title, description or location is missing or blank, or when
///   title or location is longer than its column.
pub async fn post_job(repo: &dyn Repository, poster: &AuthUser, form: JobForm) -> AppResult<Job> {
    ensure_recruiter(poster, UNAUTHORIZED_ACTION)?;

    let (Some(title), Some(description), Some(location)) = (
        required(form.title),
        required(form.description),
        required(form.location),
    ) else {
        return Err(AppError::validation("All fields are required!"));
    };
    within_limit("Title", &title, TITLE_MAX_CHARS)?;
    within_limit("Location", &location, LOCATION_MAX_CHARS)?;

    let job = repo
        .create_job(NewJob {
            title,
            description,
            location,
            recruiter_id: poster.id,
        })
        .await
        .map_err(|e| match e {
            RepositoryError::TooLong(field) => {
                AppError::validation(format!("The {field} is too long."))
            }
            other => AppError::from(other),
        })?;

    tracing::info!(job_id = job.id, recruiter_id = poster.id, "job posted");
    Ok(job)
}

/// delete_job
///
/// Deletes a job and, in the same unit of work, every application to it. The resume
/// files of those applications are removed afterwards; a file that cannot be removed
/// is logged and left behind rather than failing the deletion.
///
/// # Errors
/// * `NotFound` when the job does not exist.
/// * `Authorization` unless the requester is a recruiter and the job's poster.
pub async fn delete_job(
    repo: &dyn Repository,
    storage: &dyn StorageService,
    job_id: i64,
    requester: &AuthUser,
) -> AppResult<Job> {
    let job = get_job(repo, job_id).await?;

    match requester.role {
        Role::Recruiter if job.recruiter_id == requester.id => {}
        Role::Recruiter | Role::Applicant | Role::Admin => {
            tracing::warn!(
                job_id,
                requester_id = requester.id,
                "refused to delete a job the requester does not own"
            );
            return Err(AppError::authorization(NOT_YOUR_JOB));
        }
    }

    let removed = repo
        .delete_job(job_id)
        .await?
        .ok_or_else(|| AppError::not_found(JOB_NOT_FOUND))?;

    for application in &removed {
        if let Err(e) = storage.remove(&application.resume_path).await {
            tracing::warn!(
                application_id = application.id,
                "could not remove resume of deleted job: {e}"
            );
        }
    }

    tracing::info!(job_id, applications = removed.len(), "job deleted");
    Ok(job)
}

/// What the recruiter dashboard shows.
#[derive(Debug)]
pub struct RecruiterDashboard {
    pub jobs: Vec<Job>,
    pub my_postings: Vec<PostingWithApplications>,
}

/// recruiter_dashboard
///
/// All jobs, plus the recruiter's own postings with the applications each received.
pub async fn recruiter_dashboard(
    repo: &dyn Repository,
    identity: &AuthUser,
) -> AppResult<RecruiterDashboard> {
    ensure_recruiter(identity, ACCESS_DENIED)?;

    let jobs = repo.list_jobs().await?;
    let mut my_postings = Vec::new();
    for job in repo.list_jobs_by_recruiter(identity.id).await? {
        let applications = repo.list_applications_for_job(job.id).await?;
        my_postings.push(PostingWithApplications { job, applications });
    }

    Ok(RecruiterDashboard { jobs, my_postings })
}

/// What the applicant dashboard shows.
#[derive(Debug)]
pub struct ApplicantDashboard {
    pub jobs: Vec<Job>,
    pub my_applications: Vec<Application>,
}

/// applicant_dashboard
///
/// All jobs, plus the applicant's own applications.
pub async fn applicant_dashboard(
    repo: &dyn Repository,
    identity: &AuthUser,
) -> AppResult<ApplicantDashboard> {
    match identity.role {
        Role::Applicant => {}
        Role::Recruiter | Role::Admin => return Err(AppError::authorization(ACCESS_DENIED)),
    }

    Ok(ApplicantDashboard {
        jobs: repo.list_jobs().await?,
        my_applications: repo.list_applications_by_user(identity.id).await?,
    })
}
