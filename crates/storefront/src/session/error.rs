//! Authentication error types.

use thiserror::Error;

use crate::api::ApiError;
use crate::storage::StorageError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] vivahart_core::EmailError),

    /// Password left blank.
    #[error("password is required")]
    EmptyPassword,

    /// The backend rejected the email/password pair.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The backend could not be reached or answered unexpectedly.
    #[error("login request failed: {0}")]
    Backend(#[source] ApiError),

    /// The operation needs a logged-in session.
    #[error("not logged in")]
    NotLoggedIn,

    /// The session could not be written to durable storage.
    #[error("could not persist session: {0}")]
    Storage(#[from] StorageError),

    /// The user record could not be encoded for storage.
    #[error("could not encode user record: {0}")]
    Encode(#[from] serde_json::Error),
}

impl AuthError {
    /// Message shown next to the login form.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidEmail(_) => "Invalid email address".to_string(),
            Self::EmptyPassword => "Please enter your password".to_string(),
            Self::InvalidCredentials => "Invalid email or password. Please try again.".to_string(),
            Self::Backend(_) => "Login failed, please try again later".to_string(),
            Self::NotLoggedIn => "Please log in to continue".to_string(),
            Self::Storage(_) | Self::Encode(_) => "Could not save your session".to_string(),
        }
    }
}

impl From<ApiError> for AuthError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Unauthorized(_)
            | ApiError::NotFound(_)
            | ApiError::Status { status: 400, .. } => Self::InvalidCredentials,
            other => Self::Backend(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_rejection_maps_to_invalid_credentials() {
        let err = AuthError::from(ApiError::Unauthorized("Invalid credentials".to_string()));
        assert!(matches!(err, AuthError::InvalidCredentials));

        let err = AuthError::from(ApiError::Status {
            status: 400,
            message: "Invalid email or password".to_string(),
        });
        assert!(matches!(err, AuthError::InvalidCredentials));

        let err = AuthError::from(ApiError::Status {
            status: 503,
            message: "down".to_string(),
        });
        assert!(matches!(err, AuthError::Backend(_)));
    }
}
