// Error taxonomy for the session client. Every failure of `login` or
// `add_magnet` ends up as one of these variants; nothing is retried or
// swallowed on the way.

use crate::transport::TransportError;
use reqwest::StatusCode;
use thiserror::Error;

/// Upper bound on how much of a response body is kept for diagnostics.
pub const MAX_BODY_PREVIEW: usize = 512;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Caller input rejected before any I/O happened.
    #[error("invalid input: {0}")]
    Validation(String),

    /// The configured host is not a usable base URL.
    #[error("invalid qBittorrent host {host:?}: {reason}")]
    InvalidHost { host: String, reason: String },

    /// The login endpoint answered with something other than 200.
    #[error("login failed: status {}: {body}", .status.as_u16())]
    Auth { status: StatusCode, body: String },

    /// The add endpoint answered with something other than 200.
    #[error("qBittorrent rejected the request: status {}: {body}", .status.as_u16())]
    Submission { status: StatusCode, body: String },

    /// The exchange itself could not complete.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl ClientError {
    /// HTTP status carried by `Auth` and `Submission` errors.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Auth { status, .. } | ClientError::Submission { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }
}

/// Trim a response body and cut it down to `MAX_BODY_PREVIEW` bytes
/// without splitting a UTF-8 sequence.
pub(crate) fn body_preview(body: &str) -> String {
    let body = body.trim();
    if body.len() <= MAX_BODY_PREVIEW {
        return body.to_string();
    }
    let mut end = MAX_BODY_PREVIEW;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &body[..end])
}
