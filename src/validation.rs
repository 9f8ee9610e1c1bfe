use regex::Regex;
use std::sync::OnceLock;

use crate::services::account_service::AccountError;

const USERNAME_MIN: usize = 3;
const USERNAME_MAX: usize = 30;
const PASSWORD_MIN: usize = 8;
const PASSWORD_SYMBOLS: &str = "@$!%*?&";
const NAME_MAX: usize = 50;

fn get_regex(re: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    re.get_or_init(|| Regex::new(pattern).expect("Invalid regex pattern defined in code"))
}

pub fn validate_username(username: &str) -> Result<&str, AccountError> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = get_regex(&RE, r"^[A-Za-z0-9_]+$");

    if !(USERNAME_MIN..=USERNAME_MAX).contains(&username.len()) {
        return Err(AccountError::Validation(format!(
            "Username must be between {USERNAME_MIN} and {USERNAME_MAX} characters"
        )));
    }

    if !re.is_match(username) {
        return Err(AccountError::Validation(
            "Username can only contain letters, numbers, and underscores".to_string(),
        ));
    }

    Ok(username)
}

/// Validates the address shape and returns it normalized to lowercase.
pub fn validate_email(email: &str) -> Result<String, AccountError> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = get_regex(&RE, r"^\w+([.-]?\w+)*@\w+([.-]?\w+)*(\.\w{2,3})+$");

    let email = email.trim().to_lowercase();
    if !re.is_match(&email) {
        return Err(AccountError::Validation(
            "A valid email address is required".to_string(),
        ));
    }

    Ok(email)
}

pub fn validate_password(password: &str) -> Result<(), AccountError> {
    if password.len() < PASSWORD_MIN {
        return Err(AccountError::Validation(format!(
            "Password must be at least {PASSWORD_MIN} characters"
        )));
    }

    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(AccountError::Validation(
            "Password must contain at least one uppercase letter".to_string(),
        ));
    }

    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(AccountError::Validation(
            "Password must contain at least one lowercase letter".to_string(),
        ));
    }

    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(AccountError::Validation(
            "Password must contain at least one number".to_string(),
        ));
    }

    if !password.chars().any(|c| PASSWORD_SYMBOLS.contains(c)) {
        return Err(AccountError::Validation(format!(
            "Password must contain at least one of {PASSWORD_SYMBOLS}"
        )));
    }

    Ok(())
}

pub fn validate_name(field: &str, value: &str) -> Result<(), AccountError> {
    if value.len() > NAME_MAX {
        return Err(AccountError::Validation(format!(
            "{field} cannot exceed {NAME_MAX} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username() {
        assert!(validate_username("rin").is_ok());
        assert!(validate_username("shima_rin_1998").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username(&"a".repeat(31)).is_err());
        assert!(validate_username("no spaces").is_err());
        assert!(validate_username("bad!chars").is_err());
    }

    #[test]
    fn test_validate_email() {
        assert_eq!(
            validate_email("Rin.Shima@Example.COM").unwrap(),
            "rin.shima@example.com"
        );
        assert!(validate_email("plain").is_err());
        assert!(validate_email("missing@tld").is_err());
        assert!(validate_email("two@@example.com").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("Sup3r@secret").is_ok());
        assert!(validate_password("Sh0rt@!").is_err());
        assert!(validate_password("alllower1@cas").is_err());
        assert!(validate_password("ALLUPPER1@CAS").is_err());
        assert!(validate_password("NoDigits@@here").is_err());
        assert!(validate_password("NoSymbols123here").is_err());
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("First name", "Nadeshiko").is_ok());
        assert!(validate_name("First name", &"x".repeat(51)).is_err());
    }
}
