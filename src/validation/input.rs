use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
};
use garde::Validate;
use serde::de::DeserializeOwned;

use crate::error::{AppError, Result};

/// The longest id accepted in a path, the width of a `u64`.
const MAX_ID_LEN: usize = 20;

/// A JSON body decoded with `sonic_rs` and checked with `garde`.
///
/// Rejections are `InvalidInput` errors rendered in the response envelope.
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
    T::Context: Default,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self> {
        let body = Bytes::from_request(req, state)
            .await
            .map_err(|e| AppError::InvalidInput(e.body_text()))?;

        let value: T = sonic_rs::from_slice(&body)
            .map_err(|e| AppError::InvalidInput(format!("Malformed JSON body: {}", e)))?;
        value.validate()?;

        Ok(ValidJson(value))
    }
}

/// Validates a numeric record id taken from the path.
///
/// # Arguments
///
/// * `id` - The raw path segment.
///
/// # Returns
///
/// A `Result<()>` indicating whether the id is valid.
pub fn validate_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(AppError::InvalidInput("Id cannot be empty".to_string()));
    }

    if id.len() > MAX_ID_LEN || !id.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::InvalidInput(format!("Malformed id `{}`", id)));
    }

    Ok(())
}

/// Validates a password.
///
/// # Arguments
///
/// * `password` - The password to validate.
///
/// # Returns
///
/// A `Result<()>` indicating whether the password is valid.
pub fn validate_password(password: &str) -> Result<()> {
    if password.len() < 8 {
        return Err(AppError::InvalidInput(
            "Password must be at least 8 characters long".to_string(),
        ));
    }

    if password.len() > 128 {
        return Err(AppError::InvalidInput(
            "Password must be at most 128 characters".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_must_be_numeric() {
        assert!(validate_id("42").is_ok());
        assert!(validate_id("").is_err());
        assert!(validate_id("4a").is_err());
        assert!(validate_id("-1").is_err());
        assert!(validate_id("123456789012345678901").is_err());
    }

    #[test]
    fn password_length_is_bounded() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("long enough").is_ok());
        assert!(validate_password(&"x".repeat(129)).is_err());
    }
}
