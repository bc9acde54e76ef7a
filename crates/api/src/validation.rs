//! Input validation shared by the account, catalog and order endpoints.
//!
//! Each validator returns the normalized value or a client-facing message.

use foodloc_core::Email;

pub const MAX_USERNAME_LENGTH: usize = 150;
pub const MAX_NAME_LENGTH: usize = 255;
pub const MAX_TAG_LENGTH: usize = 50;

/// Usernames: up to 150 letters, digits and `@.+-_`.
///
/// # Errors
///
/// Returns a message describing the first rule that failed.
pub fn username(value: &str) -> Result<String, String> {
    let value = value.trim();
    if value.is_empty() {
        return Err("username is required".to_string());
    }
    if value.chars().count() > MAX_USERNAME_LENGTH {
        return Err(format!(
            "username must be at most {MAX_USERNAME_LENGTH} characters"
        ));
    }
    if !value
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
    {
        return Err("username may only contain letters, digits and @.+-_".to_string());
    }
    Ok(value.to_string())
}

/// A required single-line text field of at most `max` characters.
///
/// # Errors
///
/// Returns a message naming `field` when the value is blank or too long.
pub fn required_text(field: &str, value: &str, max: usize) -> Result<String, String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(format!("{field} is required"));
    }
    if value.chars().count() > max {
        return Err(format!("{field} must be at most {max} characters"));
    }
    Ok(value.to_string())
}

/// Optional text: blank becomes `None`.
///
/// # Errors
///
/// Returns a message naming `field` when the value is too long.
pub fn optional_text(field: &str, value: Option<&str>, max: usize) -> Result<Option<String>, String> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => required_text(field, v, max).map(Some),
    }
}

/// Phone numbers: an optional leading `+` and 8 to 15 digits. Spaces, dots
/// and dashes are stripped.
///
/// # Errors
///
/// Returns a message when the number is malformed.
pub fn phone(value: &str) -> Result<String, String> {
    let trimmed = value.trim();
    let (plus, rest) = trimmed
        .strip_prefix('+')
        .map_or(("", trimmed), |rest| ("+", rest));
    let digits: String = rest
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '.'))
        .collect();

    if !(8..=15).contains(&digits.len()) || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err("phone must contain 8 to 15 digits".to_string());
    }
    Ok(format!("{plus}{digits}"))
}

/// Optional email, normalized through [`Email::parse`].
///
/// # Errors
///
/// Returns the parse error message.
pub fn optional_email(value: Option<&str>) -> Result<Option<String>, String> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => Email::parse(v)
            .map(|e| Some(e.into_inner()))
            .map_err(|e| format!("invalid email: {e}")),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_username() {
        assert_eq!(username("  an.nguyen+1 ").unwrap(), "an.nguyen+1");
        assert!(username("").is_err());
        assert!(username("has space").is_err());
        assert!(username(&"x".repeat(151)).is_err());
    }

    #[test]
    fn test_phone_normalization() {
        assert_eq!(phone("090 123-4567").unwrap(), "0901234567");
        assert_eq!(phone("+84 90 123 4567").unwrap(), "+84901234567");
        assert!(phone("12345").is_err());
        assert!(phone("09012abc67").is_err());
    }

    #[test]
    fn test_optional_text() {
        assert_eq!(optional_text("address", Some("   "), 10).unwrap(), None);
        assert_eq!(
            optional_text("address", Some(" 12 Le Loi "), 20).unwrap(),
            Some("12 Le Loi".to_string())
        );
        assert!(optional_text("address", Some("too long value"), 5).is_err());
    }

    #[test]
    fn test_required_text() {
        assert_eq!(
            required_text("name", "", 10).unwrap_err(),
            "name is required"
        );
    }

    #[test]
    fn test_optional_email() {
        assert_eq!(optional_email(None).unwrap(), None);
        assert_eq!(
            optional_email(Some("An@Example.VN")).unwrap(),
            Some("An@example.vn".to_string())
        );
        assert!(optional_email(Some("not-an-email")).is_err());
    }
}
