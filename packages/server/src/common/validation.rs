//! Field-level input checks shared by registration, profile and listing forms.

use lazy_static::lazy_static;
use regex::Regex;

use crate::common::AppError;

pub const MAX_EMAIL_LEN: usize = 254;
pub const MAX_NAME_LEN: usize = 50;

lazy_static! {
    // RFC 5322 simplified, anchored
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$"
    ).unwrap();

    // Indian mobile numbers: ten digits starting 6-9
    static ref CONTACT_NUMBER_REGEX: Regex = Regex::new(r"^[6-9][0-9]{9}$").unwrap();
}

/// Trim and lower-case an email address for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn is_valid_email(email: &str) -> bool {
    email.len() <= MAX_EMAIL_LEN && EMAIL_REGEX.is_match(email)
}

pub fn is_valid_contact_number(number: &str) -> bool {
    CONTACT_NUMBER_REGEX.is_match(number)
}

/// Treat empty and whitespace-only strings as absent.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Require a non-blank field, naming it in the error.
pub fn required(value: Option<String>, field: &str) -> Result<String, AppError> {
    non_blank(value).ok_or_else(|| AppError::validation(format!("{} is required", field)))
}

/// Reject strings longer than `max` characters.
pub fn max_len(value: &str, max: usize, field: &str) -> Result<(), AppError> {
    if value.chars().count() > max {
        return Err(AppError::validation(format!(
            "{} must be at most {} characters",
            field, max
        )));
    }
    Ok(())
}

pub fn validate_name(value: &str, field: &str) -> Result<(), AppError> {
    max_len(value, MAX_NAME_LEN, field)
}

pub fn validate_contact_number(value: &str) -> Result<(), AppError> {
    if !is_valid_contact_number(value) {
        return Err(AppError::validation(
            "contactNumber must be a valid 10-digit mobile number",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("asha.rao@example.co.in"));
        assert!(is_valid_email("a+tag@example.com"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a @example.com"));
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Asha@Example.COM "), "asha@example.com");
    }

    #[test]
    fn test_contact_number() {
        assert!(is_valid_contact_number("9876543210"));
        assert!(!is_valid_contact_number("1234567890"));
        assert!(!is_valid_contact_number("98765"));
        assert!(!is_valid_contact_number("98765432100"));
    }

    #[test]
    fn test_required_rejects_blank() {
        assert!(required(Some("  ".to_string()), "firstName").is_err());
        assert!(required(None, "firstName").is_err());
        assert_eq!(required(Some(" Asha ".to_string()), "firstName").unwrap(), "Asha");
    }

    #[test]
    fn test_max_len_counts_chars() {
        assert!(max_len("ñññ", 3, "x").is_ok());
        assert!(max_len("abcd", 3, "x").is_err());
    }
}
