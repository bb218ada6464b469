use std::sync::OnceLock;

use regex::Regex;

use crate::errors::AppError;
use crate::models::user::User;

// Practical subset of the RFC 5322 addr-spec grammar: dot-separated atoms,
// lowercase, no quoted local parts or IP-literal domains.
const EMAIL_PATTERN: &str = r"^[a-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[a-z0-9!#$%&'*+/=?^_`{|}~-]+)*@(?:[a-z0-9](?:[a-z0-9-]*[a-z0-9])?\.)+[a-z0-9](?:[a-z0-9-]*[a-z0-9])?$";

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(EMAIL_PATTERN).expect("email pattern is a valid regex"))
}

pub fn is_email(email: &str) -> bool {
    email_regex().is_match(email)
}

/// Precondition checks for create and update requests. Runs before any
/// storage or diff work; a failure aborts the whole operation.
pub fn validate_user(user: &User) -> Result<(), AppError> {
    if user.user_id.is_empty() {
        return Err(AppError::Validation(
            "user_id must not be empty".to_string(),
        ));
    }
    if !is_email(&user.email) {
        return Err(AppError::Validation(format!(
            "'{}' is not a valid email address",
            user.email
        )));
    }
    Ok(())
}
