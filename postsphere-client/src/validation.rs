//! Client-side form checks run before anything is sent to the server.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{ClientError, ClientResult};

pub const MIN_PASSWORD_LEN: usize = 8;

static UPPERCASE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Z]").expect("Failed to compile uppercase regex"));
static LOWERCASE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-z]").expect("Failed to compile lowercase regex"));
static DIGIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d").expect("Failed to compile digit regex"));
static SPECIAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[!@#$%^&*(),.?":{}|<>]"#).expect("Failed to compile special char regex"));

/// Checks password strength. Rules are applied in order and the first one
/// that fails is reported.
pub fn validate_password(password: &str) -> ClientResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(invalid(format!(
            "Password must be at least {} characters long.",
            MIN_PASSWORD_LEN
        )));
    }
    if !UPPERCASE.is_match(password) {
        return Err(invalid("Password must contain at least one uppercase letter."));
    }
    if !LOWERCASE.is_match(password) {
        return Err(invalid("Password must contain at least one lowercase letter."));
    }
    if !DIGIT.is_match(password) {
        return Err(invalid("Password must contain at least one number."));
    }
    if !SPECIAL.is_match(password) {
        return Err(invalid("Password must contain at least one special character."));
    }
    Ok(())
}

pub fn require(value: &str, field: &str) -> ClientResult<()> {
    if value.trim().is_empty() {
        return Err(invalid(format!("{} is required", field)));
    }
    Ok(())
}

pub fn passwords_match(password: &str, confirmation: &str) -> ClientResult<()> {
    if password != confirmation {
        return Err(invalid("Passwords do not match"));
    }
    Ok(())
}

/// Signup form as typed by the user
#[derive(Debug, Clone, Default)]
pub struct SignupForm {
    pub username: String,
    pub email: String,
    pub bio: String,
    pub password: String,
    pub confirm_password: String,
}

impl SignupForm {
    pub fn validate(&self) -> ClientResult<()> {
        require(&self.username, "Username")?;
        require(&self.email, "Email")?;
        if self.password.is_empty() {
            return Err(invalid("Password is required"));
        }
        passwords_match(&self.password, &self.confirm_password)?;
        validate_password(&self.password)
    }
}

fn invalid(message: impl Into<String>) -> ClientError {
    ClientError::Validation(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn message(result: ClientResult<()>) -> String {
        match result {
            Err(ClientError::Validation(msg)) => msg,
            other => panic!("expected validation failure, got {:?}", other),
        }
    }

    #[test]
    fn test_password_rules_in_order() {
        assert_eq!(message(validate_password("abc")), "Password must be at least 8 characters long.");
        assert_eq!(
            message(validate_password("abcdefg1!")),
            "Password must contain at least one uppercase letter."
        );
        assert_eq!(
            message(validate_password("ABCDEFG1!")),
            "Password must contain at least one lowercase letter."
        );
        assert_eq!(
            message(validate_password("Abcdefgh!")),
            "Password must contain at least one number."
        );
        assert_eq!(
            message(validate_password("Abcdefg1")),
            "Password must contain at least one special character."
        );
        assert!(validate_password("Abcdefg1!").is_ok());
    }

    #[test]
    fn test_signup_form_checks() {
        let mut form = SignupForm {
            username: "alice".into(),
            email: "alice@example.com".into(),
            bio: String::new(),
            password: "Abcdefg1!".into(),
            confirm_password: "Abcdefg1!".into(),
        };
        assert!(form.validate().is_ok());

        form.confirm_password = "Abcdefg1?".into();
        assert_eq!(message(form.validate()), "Passwords do not match");

        form.username = "   ".into();
        assert_eq!(message(form.validate()), "Username is required");
    }

    #[test]
    fn test_signup_rejects_weak_password() {
        let form = SignupForm {
            username: "alice".into(),
            email: "alice@example.com".into(),
            password: "abc".into(),
            confirm_password: "abc".into(),
            ..Default::default()
        };
        assert!(matches!(form.validate(), Err(ClientError::Validation(_))));
    }

    proptest! {
        #[test]
        fn prop_short_passwords_always_rejected(pw in "[A-Za-z0-9!@#]{0,7}") {
            prop_assert!(validate_password(&pw).is_err());
        }

        #[test]
        fn prop_strong_passwords_accepted(body in "[a-z]{5,20}", upper in "[A-Z]", digit in "[0-9]", special in "[!@#$%^&*]") {
            let pw = format!("{}{}{}{}", upper, body, digit, special);
            prop_assert!(validate_password(&pw).is_ok());
        }
    }
}
