use crate::models::{
    Application, ApplicationStatus, EMAIL_MAX_CHARS, Job, LOCATION_MAX_CHARS, NewApplication,
    NewJob, NewUser, TITLE_MAX_CHARS, USERNAME_MAX_CHARS, User,
};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Debug, Error)]
pub enum RepositoryError {
    /// A unique constraint rejected the write. Carries the logical field name
    /// (`email`, `username` or `application`).
    #[error("duplicate value for {0}")]
    Duplicate(&'static str),

    /// A value does not fit its column (Postgres `22001`).
    #[error("value too long for {0}")]
    TooLong(&'static str),

    /// A foreign key pointed at a row that does not exist.
    #[error("referenced {0} does not exist")]
    MissingReference(&'static str),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type RepoResult<T> = Result<T, RepositoryError>;

/// Repository Trait
///
/// Abstract contract for all persistence operations. Handlers and services talk to this
/// trait only, so Postgres and the in-memory store are interchangeable.
/// Relationships are explicit: callers follow a foreign key with the matching lookup.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn create_user(&self, user: NewUser) -> RepoResult<User>;
    async fn get_user(&self, id: i64) -> RepoResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>>;

    // --- Jobs ---
    // Every job, in insertion (id) order.
    async fn list_jobs(&self) -> RepoResult<Vec<Job>>;
    async fn list_jobs_by_recruiter(&self, recruiter_id: i64) -> RepoResult<Vec<Job>>;
    async fn get_job(&self, id: i64) -> RepoResult<Option<Job>>;
    async fn create_job(&self, job: NewJob) -> RepoResult<Job>;
    /// Deletes a job together with its applications in one unit of work.
    /// Returns the removed applications, or `None` when the job did not exist.
    async fn delete_job(&self, id: i64) -> RepoResult<Option<Vec<Application>>>;

    // --- Applications ---
    async fn create_application(&self, application: NewApplication) -> RepoResult<Application>;
    async fn find_application(&self, user_id: i64, job_id: i64)
    -> RepoResult<Option<Application>>;
    async fn list_applications_for_job(&self, job_id: i64) -> RepoResult<Vec<Application>>;
    async fn list_applications_by_user(&self, user_id: i64) -> RepoResult<Vec<Application>>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

const USER_COLUMNS: &str = "id, username, email, password_hash, role";
const JOB_COLUMNS: &str = "id, title, description, location, date_posted, recruiter_id";
const APPLICATION_COLUMNS: &str =
    "id, user_id, job_id, resume_path, resume_filename, status, created_at";

/// Maps constraint violations onto the repository's own error variants.
fn classify(e: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(db) = &e {
        let constraint = db.constraint().unwrap_or_default();
        if db.is_unique_violation() {
            let field = if constraint.contains("email") {
                "email"
            } else if constraint.contains("username") {
                "username"
            } else {
                "application"
            };
            return RepositoryError::Duplicate(field);
        }
        if db.code().as_deref() == Some("22001") {
            return RepositoryError::TooLong("field");
        }
        if db.is_foreign_key_violation() {
            let table = if constraint.contains("job_id") { "job" } else { "user" };
            return RepositoryError::MissingReference(table);
        }
    }
    RepositoryError::Database(e)
}

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by PostgreSQL.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    /// create_user
    ///
    /// Unique violations on `email`/`username` come back as `RepositoryError::Duplicate`,
    /// which also covers two registrations racing each other.
    async fn create_user(&self, user: NewUser) -> RepoResult<User> {
        let query = format!(
            "INSERT INTO users (username, email, password_hash, role) VALUES ($1, $2, $3, $4) RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(user.username)
            .bind(user.email)
            .bind(user.password_hash)
            .bind(user.role.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(classify)
    }

    async fn get_user(&self, id: i64) -> RepoResult<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        Ok(sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        Ok(sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_jobs(&self) -> RepoResult<Vec<Job>> {
        let query = format!("SELECT {JOB_COLUMNS} FROM jobs ORDER BY id ASC");
        Ok(sqlx::query_as::<_, Job>(&query).fetch_all(&self.pool).await?)
    }

    async fn list_jobs_by_recruiter(&self, recruiter_id: i64) -> RepoResult<Vec<Job>> {
        let query =
            format!("SELECT {JOB_COLUMNS} FROM jobs WHERE recruiter_id = $1 ORDER BY id ASC");
        Ok(sqlx::query_as::<_, Job>(&query)
            .bind(recruiter_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn get_job(&self, id: i64) -> RepoResult<Option<Job>> {
        let query = format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = $1");
        Ok(sqlx::query_as::<_, Job>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// create_job
    ///
    /// `date_posted` is assigned by the database (`DEFAULT NOW()`).
    async fn create_job(&self, job: NewJob) -> RepoResult<Job> {
        let query = format!(
            "INSERT INTO jobs (title, description, location, recruiter_id) VALUES ($1, $2, $3, $4) RETURNING {JOB_COLUMNS}"
        );
        sqlx::query_as::<_, Job>(&query)
            .bind(job.title)
            .bind(job.description)
            .bind(job.location)
            .bind(job.recruiter_id)
            .fetch_one(&self.pool)
            .await
            .map_err(classify)
    }

    /// delete_job
    ///
    /// Removes the applications first, then the job, inside one transaction. The schema
    /// also declares `ON DELETE CASCADE`; deleting explicitly lets us return the rows so
    /// the caller can clean up the stored resume files.
    async fn delete_job(&self, id: i64) -> RepoResult<Option<Vec<Application>>> {
        let mut tx = self.pool.begin().await?;

        let query =
            format!("DELETE FROM applications WHERE job_id = $1 RETURNING {APPLICATION_COLUMNS}");
        let removed = sqlx::query_as::<_, Application>(&query)
            .bind(id)
            .fetch_all(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM jobs WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        tx.commit().await?;
        Ok(Some(removed))
    }

    /// create_application
    ///
    /// `UNIQUE (user_id, job_id)` turns a second application to the same job into
    /// `RepositoryError::Duplicate("application")`.
    async fn create_application(&self, application: NewApplication) -> RepoResult<Application> {
        let query = format!(
            "INSERT INTO applications (user_id, job_id, resume_path, resume_filename, status) VALUES ($1, $2, $3, $4, $5) RETURNING {APPLICATION_COLUMNS}"
        );
        sqlx::query_as::<_, Application>(&query)
            .bind(application.user_id)
            .bind(application.job_id)
            .bind(application.resume_path)
            .bind(application.resume_filename)
            .bind(ApplicationStatus::Pending.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(classify)
    }

    async fn find_application(
        &self,
        user_id: i64,
        job_id: i64,
    ) -> RepoResult<Option<Application>> {
        let query = format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications WHERE user_id = $1 AND job_id = $2"
        );
        Ok(sqlx::query_as::<_, Application>(&query)
            .bind(user_id)
            .bind(job_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_applications_for_job(&self, job_id: i64) -> RepoResult<Vec<Application>> {
        let query = format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications WHERE job_id = $1 ORDER BY id ASC"
        );
        Ok(sqlx::query_as::<_, Application>(&query)
            .bind(job_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn list_applications_by_user(&self, user_id: i64) -> RepoResult<Vec<Application>> {
        let query = format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications WHERE user_id = $1 ORDER BY id ASC"
        );
        Ok(sqlx::query_as::<_, Application>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?)
    }
}

// --- In-Memory Implementation ---

#[derive(Default)]
struct MemoryTables {
    users: Vec<User>,
    jobs: Vec<Job>,
    applications: Vec<Application>,
    next_user_id: i64,
    next_job_id: i64,
    next_application_id: i64,
}

impl MemoryTables {
    fn next_id(counter: &mut i64) -> i64 {
        *counter += 1;
        *counter
    }
}

/// Rejects values that would not fit the matching Postgres VARCHAR column.
fn fits(field: &'static str, value: &str, max_chars: usize) -> RepoResult<()> {
    if value.chars().count() > max_chars {
        return Err(RepositoryError::TooLong(field));
    }
    Ok(())
}

/// InMemoryRepository
///
/// A `Repository` that keeps the three tables in memory behind one lock. It enforces the
/// same unique and foreign-key constraints as the Postgres schema, which makes it a
/// faithful backend for the router-level test suites.
#[derive(Default)]
pub struct InMemoryRepository {
    tables: Mutex<MemoryTables>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn create_user(&self, user: NewUser) -> RepoResult<User> {
        fits("username", &user.username, USERNAME_MAX_CHARS)?;
        fits("email", &user.email, EMAIL_MAX_CHARS)?;
        let mut tables = self.tables.lock().await;
        if tables.users.iter().any(|u| u.email == user.email) {
            return Err(RepositoryError::Duplicate("email"));
        }
        if tables.users.iter().any(|u| u.username == user.username) {
            return Err(RepositoryError::Duplicate("username"));
        }
        let created = User {
            id: MemoryTables::next_id(&mut tables.next_user_id),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
        };
        tables.users.push(created.clone());
        Ok(created)
    }

    async fn get_user(&self, id: i64) -> RepoResult<Option<User>> {
        let tables = self.tables.lock().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let tables = self.tables.lock().await;
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn list_jobs(&self) -> RepoResult<Vec<Job>> {
        Ok(self.tables.lock().await.jobs.clone())
    }

    async fn list_jobs_by_recruiter(&self, recruiter_id: i64) -> RepoResult<Vec<Job>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .jobs
            .iter()
            .filter(|j| j.recruiter_id == recruiter_id)
            .cloned()
            .collect())
    }

    async fn get_job(&self, id: i64) -> RepoResult<Option<Job>> {
        let tables = self.tables.lock().await;
        Ok(tables.jobs.iter().find(|j| j.id == id).cloned())
    }

    async fn create_job(&self, job: NewJob) -> RepoResult<Job> {
        fits("title", &job.title, TITLE_MAX_CHARS)?;
        fits("location", &job.location, LOCATION_MAX_CHARS)?;
        let mut tables = self.tables.lock().await;
        if !tables.users.iter().any(|u| u.id == job.recruiter_id) {
            return Err(RepositoryError::MissingReference("user"));
        }
        let created = Job {
            id: MemoryTables::next_id(&mut tables.next_job_id),
            title: job.title,
            description: job.description,
            location: job.location,
            date_posted: Utc::now(),
            recruiter_id: job.recruiter_id,
        };
        tables.jobs.push(created.clone());
        Ok(created)
    }

    async fn delete_job(&self, id: i64) -> RepoResult<Option<Vec<Application>>> {
        let mut tables = self.tables.lock().await;
        let Some(position) = tables.jobs.iter().position(|j| j.id == id) else {
            return Ok(None);
        };
        tables.jobs.remove(position);

        let (removed, kept): (Vec<Application>, Vec<Application>) =
            std::mem::take(&mut tables.applications)
            .into_iter()
            .partition(|a| a.job_id == id);
        tables.applications = kept;
        Ok(Some(removed))
    }

    async fn create_application(&self, application: NewApplication) -> RepoResult<Application> {
        let mut tables = self.tables.lock().await;
        if !tables.users.iter().any(|u| u.id == application.user_id) {
            return Err(RepositoryError::MissingReference("user"));
        }
        if !tables.jobs.iter().any(|j| j.id == application.job_id) {
            return Err(RepositoryError::MissingReference("job"));
        }
        if tables
            .applications
            .iter()
            .any(|a| a.user_id == application.user_id && a.job_id == application.job_id)
        {
            return Err(RepositoryError::Duplicate("application"));
        }
        let created = Application {
            id: MemoryTables::next_id(&mut tables.next_application_id),
            user_id: application.user_id,
            job_id: application.job_id,
            resume_path: application.resume_path,
            resume_filename: application.resume_filename,
            status: ApplicationStatus::Pending,
            created_at: Utc::now(),
        };
        tables.applications.push(created.clone());
        Ok(created)
    }

    async fn find_application(
        &self,
        user_id: i64,
        job_id: i64,
    ) -> RepoResult<Option<Application>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .applications
            .iter()
            .find(|a| a.user_id == user_id && a.job_id == job_id)
            .cloned())
    }

    async fn list_applications_for_job(&self, job_id: i64) -> RepoResult<Vec<Application>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .applications
            .iter()
            .filter(|a| a.job_id == job_id)
            .cloned()
            .collect())
    }

    async fn list_applications_by_user(&self, user_id: i64) -> RepoResult<Vec<Application>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .applications
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect())
    }
}
