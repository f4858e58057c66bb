use job_board::{
    models::{ApplicationStatus, NewApplication, NewJob, NewUser, Role, TITLE_MAX_CHARS, User},
    repository::{PostgresRepository, Repository, RepositoryError},
};
use sqlx::{PgPool, migrate::Migrator};
use uuid::Uuid;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

// --- Test Context and Setup ---

/// Holds the database pool for one test. These tests need a live Postgres and are
/// skipped by default; run them with `cargo test -- --ignored` and `DATABASE_URL` set.
struct DbTestContext {
    pool: PgPool,
}

impl DbTestContext {
    async fn setup() -> Self {
        dotenv::dotenv().ok();

        let db_url = std::env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set to run integration tests");

        let pool = PgPool::connect(&db_url)
            .await
            .expect("Failed to connect to database for integration tests.");

        MIGRATOR
            .run(&pool)
            .await
            .expect("Failed to run database migrations.");

        DbTestContext { pool }
    }

    fn repository(&self) -> PostgresRepository {
        PostgresRepository::new(self.pool.clone())
    }
}

// --- Test Data Helpers ---

/// Unique per call, so reruns against the same database never collide.
fn unique(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4().simple())
}

async fn create_test_user(repo: &PostgresRepository, role: Role) -> User {
    let name = unique(role.as_str());
    repo.create_user(NewUser {
        username: name.clone(),
        email: format!("{name}@test.com"),
        password_hash: "$argon2id$v=19$placeholder".to_string(),
        role,
    })
    .await
    .expect("Failed to create test user")
}

fn new_job(recruiter_id: i64) -> NewJob {
    NewJob {
        title: "Platform Engineer".to_string(),
        description: "Keep the lights on".to_string(),
        location: "Remote".to_string(),
        recruiter_id,
    }
}

// --- Tests ---

#[tokio::test]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn test_user_round_trip_and_unique_email() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();

    let user = create_test_user(&repo, Role::Recruiter).await;
    let fetched = repo.get_user(user.id).await.unwrap().expect("user exists");
    assert_eq!(fetched.role, Role::Recruiter);
    assert_eq!(
        repo.find_user_by_email(&user.email).await.unwrap().map(|u| u.id),
        Some(user.id)
    );

    let duplicate = repo
        .create_user(NewUser {
            username: unique("other"),
            email: user.email.clone(),
            password_hash: "x".to_string(),
            role: Role::Applicant,
        })
        .await;
    assert!(matches!(duplicate, Err(RepositoryError::Duplicate("email"))));

    let duplicate = repo
        .create_user(NewUser {
            username: user.username.clone(),
            email: format!("{}@test.com", unique("other")),
            password_hash: "x".to_string(),
            role: Role::Applicant,
        })
        .await;
    assert!(matches!(duplicate, Err(RepositoryError::Duplicate("username"))));
}

#[tokio::test]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn test_job_requires_existing_recruiter() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();

    let result = repo.create_job(new_job(i64::MAX)).await;
    assert!(matches!(result, Err(RepositoryError::MissingReference("user"))));
}

#[tokio::test]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn test_application_lifecycle_and_cascade() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();

    let recruiter = create_test_user(&repo, Role::Recruiter).await;
    let applicant = create_test_user(&repo, Role::Applicant).await;
    let job = repo.create_job(new_job(recruiter.id)).await.unwrap();

    assert!(
        repo.list_jobs_by_recruiter(recruiter.id)
            .await
            .unwrap()
            .iter()
            .any(|j| j.id == job.id)
    );

    let application = repo
        .create_application(NewApplication {
            user_id: applicant.id,
            job_id: job.id,
            resume_path: format!("uploads/{}.pdf", Uuid::new_v4()),
            resume_filename: "cv.pdf".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(application.status, ApplicationStatus::Pending);
    assert_eq!(
        repo.find_application(applicant.id, job.id).await.unwrap(),
        Some(application.clone())
    );

    let second = repo
        .create_application(NewApplication {
            user_id: applicant.id,
            job_id: job.id,
            resume_path: "uploads/second.pdf".to_string(),
            resume_filename: "cv.pdf".to_string(),
        })
        .await;
    assert!(matches!(second, Err(RepositoryError::Duplicate("application"))));

    let removed = repo.delete_job(job.id).await.unwrap().expect("job existed");
    assert_eq!(removed, vec![application]);
    assert!(repo.get_job(job.id).await.unwrap().is_none());
    assert!(repo.list_applications_by_user(applicant.id).await.unwrap().is_empty());

    assert!(repo.delete_job(job.id).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires a running Postgres (DATABASE_URL)"]
async fn test_overlong_value_is_classified() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let recruiter = create_test_user(&repo, Role::Recruiter).await;

    let result = repo
        .create_job(NewJob {
            title: "t".repeat(TITLE_MAX_CHARS + 1),
            ..new_job(recruiter.id)
        })
        .await;

    assert!(matches!(result, Err(RepositoryError::TooLong(_))));
}
