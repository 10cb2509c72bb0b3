//! Login and signup forms.
//!
//! Forms are validated locally before any request leaves the client. The
//! serialized form is the request body.

use std::fmt;

use serde::Serialize;
use validator::{Validate, ValidationErrors};

use crate::error::ClientError;

/// Credentials for `POST /api/auth/login`.
#[derive(Clone, Serialize, Validate)]
pub struct LoginForm {
    /// Account email.
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,

    /// Account password.
    #[validate(length(min = 1, message = "Password is required."))]
    pub password: String,
}

impl LoginForm {
    /// Build a form from raw input. Surrounding whitespace in the email is
    /// dropped; the password is taken as typed.
    pub fn new(email: &str, password: impl Into<String>) -> Self {
        Self {
            email: email.trim().to_owned(),
            password: password.into(),
        }
    }

    /// Validate, returning a user-presentable error.
    pub fn check(&self) -> Result<(), ClientError> {
        self.validate().map_err(|e| ClientError::Validation(describe(&e)))
    }
}

impl fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginForm")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Registration details for `POST /api/auth/signup`.
#[derive(Clone, Serialize, Validate)]
pub struct SignupForm {
    /// Display name.
    #[validate(length(min = 1, message = "Full name is required."))]
    pub fullname: String,

    /// Account email.
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,

    /// Chosen password.
    #[validate(length(min = 1, message = "Password is required."))]
    pub password: String,
}

impl SignupForm {
    /// Build a form from raw input, trimming the name and email.
    pub fn new(fullname: &str, email: &str, password: impl Into<String>) -> Self {
        Self {
            fullname: fullname.trim().to_owned(),
            email: email.trim().to_owned(),
            password: password.into(),
        }
    }

    /// Validate, returning a user-presentable error.
    pub fn check(&self) -> Result<(), ClientError> {
        self.validate().map_err(|e| ClientError::Validation(describe(&e)))
    }
}

impl fmt::Debug for SignupForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignupForm")
            .field("fullname", &self.fullname)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Flatten field errors into one line, in a stable order.
fn describe(errors: &ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                e.message
                    .as_ref()
                    .map_or_else(|| format!("{field} is invalid."), ToString::to_string)
            })
        })
        .collect();
    messages.sort();
    messages.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_login_passes() {
        let form = LoginForm::new("  ops@example.org ", "hunter2");
        assert_eq!(form.email, "ops@example.org");
        assert!(form.check().is_ok());
    }

    #[test]
    fn bad_email_is_rejected() {
        let form = LoginForm::new("not-an-email", "hunter2");
        let msg = form.check().err().map(|e| e.to_string());
        assert_eq!(msg.as_deref(), Some("Enter a valid email address."));
    }

    #[test]
    fn signup_reports_every_missing_field() {
        let form = SignupForm::new(" ", "a@b.io", "");
        let msg = form.check().err().map(|e| e.to_string()).unwrap_or_default();
        assert!(msg.contains("Full name is required."));
        assert!(msg.contains("Password is required."));
    }

    #[test]
    fn debug_hides_password() {
        let form = SignupForm::new("Asha", "a@b.io", "s3cret");
        let debug = format!("{form:?}");
        assert!(!debug.contains("s3cret"));
        assert!(debug.contains("Asha"));
    }

    #[test]
    fn body_has_wire_field_names() {
        let form = SignupForm::new("Asha", "a@b.io", "pw");
        let json = serde_json::to_value(&form).unwrap_or_default();
        assert_eq!(json.get("fullname").and_then(|v| v.as_str()), Some("Asha"));
        assert_eq!(json.get("password").and_then(|v| v.as_str()), Some("pw"));
    }
}
