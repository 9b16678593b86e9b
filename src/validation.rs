//! Input validation for the service layer.
//!
//! Path and form values arrive as text; these helpers turn them into typed
//! values or a `Validation` error that callers surface as a bad request.

use std::str::FromStr;

use crate::error::{Error, Result};
use crate::models::applications::ApplicationStatus;

/// Parses a numeric identifier such as a property or application id.
///
/// # Examples
/// ```
/// use rentals::validation::parse_id;
///
/// assert_eq!(parse_id("42", "property id").unwrap(), 42);
/// assert!(parse_id("abc", "property id").is_err());
/// ```
pub fn parse_id(input: &str, field_name: &str) -> Result<i64> {
    let trimmed = input.trim();
    match trimmed.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(Error::Validation(format!(
            "Invalid {}: '{}'",
            field_name, input
        ))),
    }
}

/// Parses an application status name (`Pending`, `Approved`, `Denied`).
pub fn parse_status(input: &str) -> Result<ApplicationStatus> {
    ApplicationStatus::from_str(input.trim())
        .map_err(|_| Error::Validation(format!("Invalid application status: '{}'", input)))
}

/// Validates the shape of an email address.
///
/// Only structural checks are made: one `@`, non-empty local part, a dotted
/// domain and no whitespace or bracket characters.
pub fn validate_email(email: &str) -> Result<()> {
    let email = email.trim();

    if email.is_empty() {
        return Err(Error::Validation("Email cannot be empty".to_string()));
    }
    if email.len() > 254 {
        return Err(Error::Validation("Email address is too long (max 254 characters)".to_string()));
    }

    let Some((local_part, domain)) = email.split_once('@') else {
        return Err(Error::Validation("Invalid email format: missing @".to_string()));
    };

    if local_part.is_empty() || domain.is_empty() || domain.contains('@') {
        return Err(Error::Validation("Invalid email format".to_string()));
    }
    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return Err(Error::Validation("Invalid email format: bad domain".to_string()));
    }
    if email.contains("..") {
        return Err(Error::Validation("Invalid email format: cannot contain consecutive dots".to_string()));
    }
    if let Some(c) = email
        .chars()
        .find(|c| c.is_whitespace() || "<>()[]\\,;:\"".contains(*c))
    {
        return Err(Error::Validation(format!("Invalid email format: cannot contain '{}'", c)));
    }

    Ok(())
}

/// Trims `input` and rejects it when nothing is left.
pub fn validate_required(input: &str, field_name: &str) -> Result<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation(format!("{} cannot be empty", field_name)));
    }
    Ok(trimmed.to_string())
}

/// Validates the name, email and phone number of a tenant or manager profile.
pub fn validate_profile(name: &str, email: &str, phone_number: &str) -> Result<()> {
    validate_required(name, "Name")?;
    validate_email(email)?;
    validate_required(phone_number, "Phone number")?;
    Ok(())
}
