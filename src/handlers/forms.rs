use serde_json::{Map, Value};
use thiserror::Error;

use crate::providers::{PasswordCredentials, SignUpRequest};

pub const MIN_PASSWORD_CHARS: usize = 6;

/// Client-side form problems. The display text is what the user sees.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please fill in all fields")]
    MissingFields,

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Password must be at least 6 characters")]
    PasswordTooShort,
}

fn filled(value: &str) -> bool {
    !value.trim().is_empty()
}

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    pub fn validate(&self) -> Result<PasswordCredentials, ValidationError> {
        if !filled(&self.email) || self.password.is_empty() {
            return Err(ValidationError::MissingFields);
        }
        Ok(PasswordCredentials {
            email: self.email.trim().to_string(),
            password: self.password.clone(),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct SignupForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl SignupForm {
    /// Checks run in order: every field filled, passwords equal, length.
    pub fn validate(&self) -> Result<SignUpRequest, ValidationError> {
        let all_filled = filled(&self.first_name)
            && filled(&self.last_name)
            && filled(&self.email)
            && !self.password.is_empty()
            && !self.confirm_password.is_empty();
        if !all_filled {
            return Err(ValidationError::MissingFields);
        }
        if self.password != self.confirm_password {
            return Err(ValidationError::PasswordMismatch);
        }
        // Length in UTF-16 code units, as JavaScript clients measure it.
        if self.password.encode_utf16().count() < MIN_PASSWORD_CHARS {
            return Err(ValidationError::PasswordTooShort);
        }

        let mut data = Map::new();
        data.insert(
            "first_name".to_string(),
            Value::String(self.first_name.trim().to_string()),
        );
        data.insert(
            "last_name".to_string(),
            Value::String(self.last_name.trim().to_string()),
        );

        Ok(SignUpRequest {
            email: self.email.trim().to_string(),
            password: self.password.clone(),
            data,
        })
    }
}
