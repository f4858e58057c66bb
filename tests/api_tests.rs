use job_board::{
    AppConfig, AppState, InMemoryRepository, LocalStorage, create_router,
    auth,
    models::{ApplicationStatus, NewJob, NewUser, Role},
    repository::{Repository, RepositoryState},
    storage::StorageState,
};
use reqwest::{StatusCode, header, multipart, redirect::Policy};
use serde_json::Value;
use std::{path::Path, sync::Arc};
use tempfile::TempDir;
use tokio::net::TcpListener;

pub struct TestApp {
    pub address: String,
    pub repo: Arc<InMemoryRepository>,
    pub client: reqwest::Client,
    // Held so the upload directory lives as long as the server.
    pub uploads: TempDir,
}

async fn spawn_app() -> TestApp {
    let uploads = tempfile::tempdir().expect("Failed to create upload dir");
    let repo = Arc::new(InMemoryRepository::new());
    let config = AppConfig {
        upload_dir: uploads.path().to_path_buf(),
        ..AppConfig::default()
    };

    let state = AppState {
        repo: repo.clone() as RepositoryState,
        storage: Arc::new(LocalStorage::new(config.upload_dir.clone())) as StorageState,
        config,
    };
    let router = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{port}");

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    // Redirects are asserted on, never followed.
    let client = reqwest::Client::builder()
        .redirect(Policy::none())
        .build()
        .unwrap();

    TestApp {
        address,
        repo,
        client,
        uploads,
    }
}

impl TestApp {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    async fn seed_recruiter_with_job(&self) -> (i64, i64) {
        let recruiter = self
            .repo
            .create_user(NewUser {
                username: "rita".to_string(),
                email: "rita@example.com".to_string(),
                password_hash: auth::hash_password("recruit-pw").unwrap(),
                role: Role::Recruiter,
            })
            .await
            .unwrap();
        let job = self
            .repo
            .create_job(NewJob {
                title: "Backend Engineer".to_string(),
                description: "Axum and Postgres".to_string(),
                location: "Dublin".to_string(),
                recruiter_id: recruiter.id,
            })
            .await
            .unwrap();
        (recruiter.id, job.id)
    }

    /// Logs in through the form and returns the session cookie pair.
    async fn login(&self, email: &str, password: &str, expected_dashboard: &str) -> String {
        let response = self
            .client
            .post(self.url("/login"))
            .form(&[("email", email), ("password", password)])
            .send()
            .await
            .expect("login request");

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), expected_dashboard);
        cookie_pair(&response, auth::SESSION_COOKIE).expect("session cookie")
    }
}

fn location(response: &reqwest::Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

fn cookie_pair(response: &reqwest::Response, name: &str) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with(&format!("{name}=")))
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}

fn resume_form(bytes: &'static [u8]) -> multipart::Form {
    let part = multipart::Part::bytes(bytes)
        .file_name("resume.pdf")
        .mime_str("application/pdf")
        .unwrap();
    multipart::Form::new().part("resume", part)
}

#[tokio::test]
async fn test_health_check() {
    let app = spawn_app().await;
    let response = app.client.get(app.url("/health")).send().await.expect("req fail");
    assert!(response.status().is_success());
}

#[tokio::test]
async fn test_applicant_journey() {
    let app = spawn_app().await;
    let (_recruiter, job_id) = app.seed_recruiter_with_job().await;

    // 1. Register
    let response = app
        .client
        .post(app.url("/register"))
        .form(&[
            ("username", "ann"),
            ("email", "ann@example.com"),
            ("password", "apply-pw"),
            ("role", "applicant"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");

    // 2. Login
    let session = app.login("ann@example.com", "apply-pw", "/applicant_dashboard").await;
    let applicant = app
        .repo
        .find_user_by_email("ann@example.com")
        .await
        .unwrap()
        .expect("registered user");

    // 3. Browse the job
    let detail: Value = app
        .client
        .get(app.url(&format!("/job/{job_id}")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(detail["job"]["title"], "Backend Engineer");
    assert_eq!(detail["posted_by"], "rita");

    // 4. Apply
    let response = app
        .client
        .post(app.url(&format!("/apply/{job_id}")))
        .header(header::COOKIE, &session)
        .multipart(resume_form(b"%PDF-1.4 ann"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
    let notice = cookie_pair(&response, "flash").expect("flash cookie");

    let applications = app.repo.list_applications_by_user(applicant.id).await.unwrap();
    assert_eq!(applications.len(), 1);
    let application = &applications[0];
    assert_eq!(application.job_id, job_id);
    assert_eq!(application.status, ApplicationStatus::Pending);
    assert_eq!(application.resume_filename, "resume.pdf");

    let stored = Path::new(&application.resume_path);
    assert_eq!(stored.parent(), Some(app.uploads.path()));
    assert_eq!(std::fs::read(stored).unwrap(), b"%PDF-1.4 ann");

    // 5. Dashboard shows the application and the pending notice
    let dashboard: Value = app
        .client
        .get(app.url("/applicant_dashboard"))
        .header(header::COOKIE, format!("{session}; {notice}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(dashboard["my_applications"][0]["job_id"], job_id);
    assert_eq!(
        dashboard["flashes"][0]["message"],
        "Application submitted successfully!"
    );

    // 6. Applying again is refused
    let response = app
        .client
        .post(app.url(&format!("/apply/{job_id}")))
        .header(header::COOKIE, &session)
        .multipart(resume_form(b"%PDF-1.4 again"))
        .send()
        .await
        .unwrap();
    assert_eq!(location(&response), format!("/job/{job_id}"));
    assert_eq!(
        app.repo.list_applications_for_job(job_id).await.unwrap().len(),
        1
    );

    // 7. Logout
    let response = app
        .client
        .get(app.url("/logout"))
        .header(header::COOKIE, &session)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    let response = app
        .client
        .get(app.url("/applicant_dashboard"))
        .send()
        .await
        .unwrap();
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn test_recruiter_sees_and_deletes_applications() {
    let app = spawn_app().await;
    let (_recruiter, job_id) = app.seed_recruiter_with_job().await;

    app.client
        .post(app.url("/register"))
        .form(&[
            ("username", "ann"),
            ("email", "ann@example.com"),
            ("password", "apply-pw"),
            ("role", "applicant"),
        ])
        .send()
        .await
        .unwrap();
    let applicant_session = app.login("ann@example.com", "apply-pw", "/applicant_dashboard").await;
    app.client
        .post(app.url(&format!("/apply/{job_id}")))
        .header(header::COOKIE, &applicant_session)
        .multipart(resume_form(b"%PDF-1.4 ann"))
        .send()
        .await
        .unwrap();
    let resume_path = app.repo.list_applications_for_job(job_id).await.unwrap()[0]
        .resume_path
        .clone();

    let session = app.login("rita@example.com", "recruit-pw", "/recruiter_dashboard").await;

    let dashboard: Value = app
        .client
        .get(app.url("/recruiter_dashboard"))
        .header(header::COOKIE, &session)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(dashboard["my_postings"][0]["job"]["id"], job_id);
    assert_eq!(
        dashboard["my_postings"][0]["applications"][0]["resume_filename"],
        "resume.pdf"
    );

    let response = app
        .client
        .get(app.url(&format!("/delete_job/{job_id}")))
        .header(header::COOKIE, &session)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/recruiter_dashboard");

    assert!(app.repo.get_job(job_id).await.unwrap().is_none());
    assert!(app.repo.list_applications_for_job(job_id).await.unwrap().is_empty());
    assert!(!Path::new(&resume_path).exists());

    let response = app
        .client
        .get(app.url(&format!("/job/{job_id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
