use axum::body::Bytes;
use job_board::storage::{
    LocalStorage, MockStorageService, StorageError, StorageService, display_filename, resume_key,
    sanitize_key,
};

#[test]
fn test_sanitize_key_strips_navigation() {
    assert_eq!(sanitize_key("../../etc/passwd"), "etc/passwd");
    assert_eq!(sanitize_key("./a//b/./c"), "a/b/c");
    assert_eq!(sanitize_key("..\\..\\windows\\win.ini"), "windows/win.ini");
    assert_eq!(sanitize_key(".."), "");
}

#[test]
fn test_display_filename_keeps_last_component() {
    assert_eq!(display_filename("C:\\Users\\me\\resume.pdf"), "resume.pdf");
    assert_eq!(display_filename("../../resume.pdf"), "resume.pdf");
    assert_eq!(display_filename("  cv.docx  "), "cv.docx");
    assert_eq!(display_filename("bad\nname.pdf"), "badname.pdf");
    assert_eq!(display_filename(""), "");
    assert_eq!(display_filename(&"a".repeat(400)).len(), 255);
}

#[test]
fn test_resume_key_is_generated_not_client_controlled() {
    let key = resume_key("../../../etc/Resume.PDF");
    assert!(key.ends_with(".pdf"));
    assert!(!key.contains('/'));
    assert!(!key.contains("Resume"));

    // Unusual extensions are dropped entirely.
    let odd = resume_key("resume.p$f");
    assert!(!odd.contains('.'));
    let none = resume_key("resume");
    assert!(!none.contains('.'));

    assert_ne!(resume_key("a.pdf"), resume_key("a.pdf"));
}

#[tokio::test]
async fn test_local_storage_creates_directory_and_writes_file() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("uploads");
    let storage = LocalStorage::new(&root);

    let location = storage
        .store("abc.pdf", Some("application/pdf"), Bytes::from_static(b"%PDF-1.4"))
        .await
        .expect("store succeeds");

    assert!(root.is_dir());
    assert_eq!(std::fs::read(&location).unwrap(), b"%PDF-1.4");
    assert_eq!(std::path::Path::new(&location).parent(), Some(root.as_path()));
}

#[tokio::test]
async fn test_local_storage_flattens_nested_keys() {
    let dir = tempfile::tempdir().unwrap();
    let storage = LocalStorage::new(dir.path());

    let location = storage
        .store("../nested/evil.pdf", None, Bytes::from_static(b"x"))
        .await
        .unwrap();

    assert_eq!(
        std::path::Path::new(&location).parent(),
        Some(dir.path())
    );
}

#[tokio::test]
async fn test_local_storage_remove() {
    let dir = tempfile::tempdir().unwrap();
    let storage = LocalStorage::new(dir.path());
    storage.ensure_ready().await.unwrap();

    let location = storage
        .store("gone.pdf", None, Bytes::from_static(b"x"))
        .await
        .unwrap();
    storage.remove(&location).await.unwrap();
    assert!(!std::path::Path::new(&location).exists());
}

#[tokio::test]
async fn test_local_storage_refuses_paths_outside_root() {
    let dir = tempfile::tempdir().unwrap();
    let outside = tempfile::NamedTempFile::new().unwrap();
    let storage = LocalStorage::new(dir.path().join("uploads"));

    let result = storage.remove(&outside.path().to_string_lossy()).await;

    assert!(matches!(result, Err(StorageError::OutsideRoot(_))));
    assert!(outside.path().exists());

    let empty = storage.store("..", None, Bytes::from_static(b"x")).await;
    assert!(matches!(empty, Err(StorageError::OutsideRoot(_))));
}

#[tokio::test]
async fn test_mock_storage_records_and_fails_on_demand() {
    let mock = MockStorageService::new();
    let location = mock
        .store("k.pdf", None, Bytes::from_static(b"x"))
        .await
        .unwrap();
    mock.remove(&location).await.unwrap();

    assert_eq!(mock.stored(), vec!["mock://uploads/k.pdf".to_string()]);
    assert_eq!(mock.removed(), vec![location]);

    let failing = MockStorageService::new_failing();
    assert!(
        failing
            .store("k.pdf", None, Bytes::from_static(b"x"))
            .await
            .is_err()
    );
    assert!(failing.stored().is_empty());
}
