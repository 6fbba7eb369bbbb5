use validator::ValidateEmail;

use crate::error::{Error, Result};

/// Trimmed value of a required text field, or a field-tagged error.
pub fn required(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::validation(field, format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

pub fn email(field: &str, value: &str) -> Result<String> {
    let value = required(field, value)?;
    if !value.validate_email() {
        return Err(Error::validation(field, format!("{} is not a valid email address", field)));
    }
    Ok(value)
}

/// `None` for absent or whitespace-only input.
pub fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_is_trimmed_and_checked() {
        assert_eq!(email("email", " jane@example.com ").unwrap(), "jane@example.com");
        assert!(email("email", "j.doe+jobs@mail.example.org").is_ok());
        for bad in ["jane", "@example.com", "jane@@example.com", "jane doe@example.com"] {
            match email("email", bad) {
                Err(Error::Validation { field, .. }) => assert_eq!(field, "email"),
                other => panic!("{} accepted: {:?}", bad, other),
            }
        }
    }

    #[test]
    fn required_rejects_whitespace() {
        match required("phone", "   ") {
            Err(Error::Validation { field, .. }) => assert_eq!(field, "phone"),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(required("phone", " 555 ").unwrap(), "555");
    }

    #[test]
    fn optional_drops_blank() {
        assert_eq!(optional(Some("  ".into())), None);
        assert_eq!(optional(Some(" hi ".into())), Some("hi".into()));
    }
}
