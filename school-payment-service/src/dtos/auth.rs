use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

pub const CREDENTIALS_REQUIRED: &str = "Please provide email and password";

/// Body of both `/auth/register` and `/auth/login`.
///
/// Only registration runs the rules; login answers every bad credential with the same 401.
#[derive(Debug, Deserialize, Validate)]
pub struct CredentialsRequest {
    #[serde(default)]
    #[validate(
        required(message = "Please provide email and password"),
        custom(function = "present")
    )]
    pub email: Option<String>,
    #[serde(default)]
    #[validate(
        required(message = "Please provide email and password"),
        custom(function = "present")
    )]
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub id: String,
    pub email: String,
    pub token: String,
}

fn present(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some(CREDENTIALS_REQUIRED.into());
        return Err(err);
    }
    Ok(())
}
