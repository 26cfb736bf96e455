//! Registration input validation.

/// Validation error for registration input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Username is empty.
    EmptyUsername,
    /// Username has the wrong length or characters.
    InvalidUsername,
    /// Email address is empty.
    EmptyEmail,
    /// Email address format is invalid.
    InvalidEmail,
    /// Password is too short or lacks letters/digits.
    WeakPassword,
    /// Phone number format is invalid.
    InvalidPhone,
}

impl ValidationError {
    /// Get human-readable error message.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::EmptyUsername => "Username is required",
            Self::InvalidUsername => "Username must be 4-16 letters, digits, '_' or '-'",
            Self::EmptyEmail => "Email address is required",
            Self::InvalidEmail => "Invalid email address format",
            Self::WeakPassword => "Password must be at least 6 characters with a letter and a digit",
            Self::InvalidPhone => "Invalid mobile number",
        }
    }

    /// Get the field name this error relates to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::EmptyUsername | Self::InvalidUsername => "username",
            Self::EmptyEmail | Self::InvalidEmail => "email",
            Self::WeakPassword => "password",
            Self::InvalidPhone => "phone",
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ValidationError {}

/// Result of validating registration input.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// Validate registration input.
///
/// Returns `Ok(())` if valid, or all failures at once.
///
/// # Errors
///
/// Returns a vector of `ValidationError` if any fields are invalid.
pub fn validate_registration(
    username: &str,
    email: &str,
    password: &str,
    phone: Option<&str>,
) -> ValidationResult {
    let mut errors = Vec::new();

    if username.trim().is_empty() {
        errors.push(ValidationError::EmptyUsername);
    } else if !is_valid_username(username) {
        errors.push(ValidationError::InvalidUsername);
    }

    if email.trim().is_empty() {
        errors.push(ValidationError::EmptyEmail);
    } else if !is_valid_email(email) {
        errors.push(ValidationError::InvalidEmail);
    }

    if !is_valid_password(password) {
        errors.push(ValidationError::WeakPassword);
    }

    if let Some(phone) = phone
        && !is_valid_phone(phone)
    {
        errors.push(ValidationError::InvalidPhone);
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

/// 4-16 characters from `[A-Za-z0-9_-]`.
fn is_valid_username(username: &str) -> bool {
    (4..=16).contains(&username.len())
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// At least 6 characters with at least one letter and one digit.
fn is_valid_password(password: &str) -> bool {
    password.len() >= 6
        && password.chars().any(|c| c.is_ascii_alphabetic())
        && password.chars().any(|c| c.is_ascii_digit())
}

/// CN mobile number: 11 digits, `1` then `3-9`.
fn is_valid_phone(phone: &str) -> bool {
    let bytes = phone.as_bytes();
    bytes.len() == 11
        && bytes[0] == b'1'
        && (b'3'..=b'9').contains(&bytes[1])
        && phone.chars().all(|c| c.is_ascii_digit())
}

/// Basic email validation.
fn is_valid_email(email: &str) -> bool {
    let email = email.trim();

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return false;
    }

    let local = parts[0];
    let domain = parts[1];

    if local.is_empty() {
        return false;
    }

    if domain.is_empty() || !domain.contains('.') {
        return false;
    }

    let domain_parts: Vec<&str> = domain.split('.').collect();
    if domain_parts.iter().any(|p| p.is_empty()) {
        return false;
    }

    true
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn valid_usernames() {
        assert!(is_valid_username("sam_42"));
        assert!(is_valid_username("a-b-c-d"));
    }

    #[test]
    fn invalid_usernames() {
        assert!(!is_valid_username("abc"));
        assert!(!is_valid_username("way_too_long_for_a_handle"));
        assert!(!is_valid_username("has space"));
        assert!(!is_valid_username("emoji🙂name"));
    }

    #[test]
    fn password_needs_letter_and_digit() {
        assert!(is_valid_password("abc123"));
        assert!(!is_valid_password("abcdef"));
        assert!(!is_valid_password("123456"));
        assert!(!is_valid_password("a1"));
    }

    #[test]
    fn phone_shape() {
        assert!(is_valid_phone("13912345678"));
        assert!(!is_valid_phone("12912345678"));
        assert!(!is_valid_phone("1391234567"));
        assert!(!is_valid_phone("1391234567a"));
    }

    #[test]
    fn collects_all_failures() {
        let errors = validate_registration("", "nope", "short", Some("abc")).unwrap_err();
        assert!(errors.contains(&ValidationError::EmptyUsername));
        assert!(errors.contains(&ValidationError::InvalidEmail));
        assert!(errors.contains(&ValidationError::WeakPassword));
        assert!(errors.contains(&ValidationError::InvalidPhone));
    }

    #[test]
    fn accepts_complete_registration() {
        assert!(validate_registration("sam_42", "sam@example.com", "abc123", None).is_ok());
    }

    proptest! {
        #[test]
        fn username_check_never_panics(s in ".*") {
            let _ = is_valid_username(&s);
        }

        #[test]
        fn phone_check_never_panics(s in ".*") {
            let _ = is_valid_phone(&s);
        }
    }
}
