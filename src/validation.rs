// Validation utilities module
// Custom validation functions shared by the server DTOs and the client forms

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;
use validator::{ValidationError, ValidationErrors};

static SLUG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("slug pattern is valid"));

static USERNAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_]{3,30}$").expect("username pattern is valid"));

/// Validates that a username is 3-30 characters of letters, digits and underscores
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if USERNAME_PATTERN.is_match(username) {
        Ok(())
    } else {
        let mut error = ValidationError::new("invalid_username");
        error.message = Some(Cow::Borrowed(
            "Username must be 3-30 characters long and contain only letters, numbers, and underscores",
        ));
        Err(error)
    }
}

/// Lists every unmet password strength requirement, in a stable order
pub fn password_strength_issues(password: &str) -> Vec<&'static str> {
    let mut issues = Vec::new();

    if password.chars().count() < 8 {
        issues.push("Password must be at least 8 characters long");
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        issues.push("Password must contain at least one uppercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        issues.push("Password must contain at least one lowercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        issues.push("Password must contain at least one number");
    }

    issues
}

/// Validates password strength (length, upper, lower, digit)
pub fn validate_strong_password(password: &str) -> Result<(), ValidationError> {
    match password_strength_issues(password).into_iter().next() {
        None => Ok(()),
        Some(first) => {
            let mut error = ValidationError::new("weak_password");
            error.message = Some(Cow::Borrowed(first));
            Err(error)
        }
    }
}

/// Picks the first error message, walking fields in the given order
///
/// `ValidationErrors` keeps fields in a hash map, so callers pass the form's
/// declared field order to get deterministic feedback.
pub fn first_error_message(errors: &ValidationErrors, field_order: &[&str]) -> String {
    let fields = errors.field_errors();

    field_order
        .iter()
        .filter_map(|field| fields.get(*field))
        .chain(fields.values())
        .flat_map(|errs| errs.iter())
        .map(|err| match &err.message {
            Some(message) => message.to_string(),
            None => format!("Invalid value ({})", err.code),
        })
        .next()
        .unwrap_or_else(|| "Please check your input and try again.".to_string())
}

/// Validates a URL slug: lowercase words of letters and digits joined by single hyphens
pub fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    if SLUG_PATTERN.is_match(slug) {
        Ok(())
    } else {
        let mut error = ValidationError::new("invalid_slug");
        error.message = Some(Cow::Borrowed(
            "Slug may only contain lowercase letters, numbers, and single hyphens",
        ));
        Err(error)
    }
}

/// Derives a slug from a title; empty when the title has no letters or digits
pub fn slugify(title: &str) -> String {
    title
        .to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}
