//! Defines the error type for calls against the scan service.

use thiserror::Error;

/// The primary error type for the `api` module.
///
/// Transport failures and non-2xx responses are kept apart so the UI can
/// show the service-provided message when one exists and a generic
/// "unreachable" message when the request never completed.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (connection refused, DNS, ...).
    #[error("scan service unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a non-2xx status. `message` carries the
    /// `detail` field of the error body when the service sent one.
    #[error("scan service returned {status}: {message}")]
    Status { status: u16, message: String },
}

impl ApiError {
    /// The text shown to the user. Never exposes transport internals.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Transport(_) => {
                "Scan service unreachable. Check the backend URL in the settings.".to_string()
            }
            ApiError::Status { message, .. } => message.clone(),
        }
    }
}
