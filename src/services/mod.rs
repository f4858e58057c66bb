//! Domain operations of the job board.
//!
//! Each operation is a plain async function over the `Repository` / `StorageService`
//! traits returning `AppResult`. Handlers decide how a result is presented (view,
//! redirect, flash); services decide whether it succeeds.

pub mod accounts;
pub mod applications;
pub mod jobs;

use crate::error::{AppError, AppResult};

/// Trims a form field and treats missing and blank alike.
pub(crate) fn required(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Fails with `Validation` when `value` is longer than its column allows.
pub(crate) fn within_limit(label: &str, value: &str, max_chars: usize) -> AppResult<()> {
    if value.chars().count() > max_chars {
        return Err(AppError::validation(format!(
            "{label} must be at most {max_chars} characters."
        )));
    }
    Ok(())
}

/// Runs CPU-heavy work (password hashing) off the async executor.
pub(crate) async fn blocking<T, F>(work: F) -> AppResult<T>
where
    F: FnOnce() -> AppResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| AppError::Internal(format!("blocking task failed: {e}")))?
}
