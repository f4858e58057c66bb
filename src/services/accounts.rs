use crate::{
    auth,
    error::{AppError, AppResult},
    models::{EMAIL_MAX_CHARS, LoginForm, NewUser, RegisterForm, Role, USERNAME_MAX_CHARS, User},
    repository::{Repository, RepositoryError},
};

use super::{blocking, required, within_limit};

pub const EMAIL_TAKEN: &str = "Email already registered! Please log in.";
pub const USERNAME_TAKEN: &str = "Username already taken!";

fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

/// register
///
/// Creates a user after validating every field and hashing the password.
///
/// # Errors
/// * `Validation` when a field is missing/blank, too long for its column, or the role
///   is unknown.
/// * `Conflict { field: "email" }` when the email is already registered.
/// * `Conflict { field: "username" }` when the username is taken.
pub async fn register(repo: &dyn Repository, form: RegisterForm) -> AppResult<User> {
    let password = form.password.filter(|p| !p.trim().is_empty());
    let (Some(username), Some(email), Some(password), Some(role)) = (
        required(form.username),
        required(form.email),
        password,
        required(form.role),
    ) else {
        return Err(AppError::validation("All fields are required!"));
    };

    let role: Role = role
        .parse()
        .map_err(|_| AppError::validation(format!("Unknown role: {role}")))?;
    let email = normalize_email(&email);
    within_limit("Username", &username, USERNAME_MAX_CHARS)?;
    within_limit("Email", &email, EMAIL_MAX_CHARS)?;

    if repo.find_user_by_email(&email).await?.is_some() {
        return Err(AppError::conflict("email", EMAIL_TAKEN));
    }

    let password_hash = blocking(move || auth::hash_password(&password)).await?;

    let user = repo
        .create_user(NewUser {
            username,
            email,
            password_hash,
            role,
        })
        .await
        .map_err(|e| match e {
            RepositoryError::Duplicate("email") => AppError::conflict("email", EMAIL_TAKEN),
            RepositoryError::Duplicate("username") => {
                AppError::conflict("username", USERNAME_TAKEN)
            }
            RepositoryError::TooLong(field) => {
                AppError::validation(format!("The {field} is too long."))
            }
            other => AppError::from(other),
        })?;

    tracing::info!(user_id = user.id, role = %user.role, "user registered");
    Ok(user)
}

/// login
///
/// Resolves the user for an email/password pair.
///
/// # Errors
/// `Auth` when the email is unknown, the password does not match, or either is missing.
/// The three cases are indistinguishable to the caller.
pub async fn login(repo: &dyn Repository, form: LoginForm) -> AppResult<User> {
    let (Some(email), Some(password)) = (required(form.email), form.password) else {
        return Err(AppError::Auth);
    };

    let Some(user) = repo.find_user_by_email(&normalize_email(&email)).await? else {
        tracing::debug!("login failed: unknown email");
        return Err(AppError::Auth);
    };

    let hash = user.password_hash.clone();
    let verified = blocking(move || Ok(auth::check_password(&hash, &password))).await?;
    if !verified {
        tracing::debug!(user_id = user.id, "login failed: password mismatch");
        return Err(AppError::Auth);
    }

    tracing::info!(user_id = user.id, "user logged in");
    Ok(user)
}
