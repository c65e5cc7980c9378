//! Typed outcomes of talking to the booking API and of a poll cycle.

use thiserror::Error;

/// Error code the API uses when the patient has no matching appointment.
pub const NOT_FOUND_CODE: &str = "APPOINTMENT_RECEPTION_NOT_FOUND";

#[derive(Debug, Error)]
pub enum FetchError {
    /// Network failure, timeout or TLS error
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx HTTP response
    #[error("unexpected HTTP status {status}")]
    Status { status: reqwest::StatusCode },

    /// Body was not the JSON shape we expect
    #[error("could not decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The API answered with an error other than "not found"
    #[error("rejected by API ({code}): {message}")]
    Rejected { code: String, message: String },

    /// Neither `result` nor `error` present
    #[error("response carries neither result nor error")]
    Malformed,
}

impl FetchError {
    /// Worth retrying as-is on the next cycle.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            FetchError::Transport(_) | FetchError::Status { .. } | FetchError::Decode(_)
        )
    }
}

#[derive(Debug, Error)]
pub enum CycleError {
    /// Resolving the current appointment failed; the cycle is retried later.
    #[error("appointment lookup failed: {0}")]
    Lookup(#[source] FetchError),

    /// A notification could not be delivered. Not recoverable by polling.
    #[error("failed to send notification for {doctor}: {source:#}")]
    Dispatch {
        doctor: String,
        #[source]
        source: anyhow::Error,
    },
}

impl CycleError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, CycleError::Lookup(_))
    }
}
