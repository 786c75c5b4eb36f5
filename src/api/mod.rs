//! Outbound VK API client.
//!
//! Sends community messages through `messages.send` using form-encoded
//! parameters and decodes the JSON result.

pub mod client;

pub use client::{VkClient, MESSAGE_SEPARATOR};

/// Errors from the outbound API client.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The HTTP request could not be completed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a status other than 200.
    #[error("unexpected HTTP status {status}: {reason}")]
    HttpStatus {
        /// Numeric status code.
        status: u16,
        /// Canonical status text.
        reason: String,
    },

    /// The response body was not a valid API result.
    #[error("failed to decode API response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The API reported an error.
    #[error("VK API error {code}: {message}")]
    Api {
        /// VK error code.
        code: i64,
        /// VK error message.
        message: String,
        /// Request parameters echoed back by the API.
        request_params: Vec<serde_json::Value>,
    },
}
