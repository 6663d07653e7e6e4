//! Error types surfaced to the user
//!
//! Every variant is recoverable: the page keeps running and the form keeps
//! its contents so the user can retry.

use serde::{Deserialize, Serialize};

use crate::forms::project::FileRejection;
use crate::forms::validation::FieldErrors;

/// Failure reported across the back-end boundary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{message}")]
pub struct CollaboratorError {
    /// Machine-readable reason, e.g. `storage/io`
    pub code: String,
    /// Human-readable message, shown to the user when non-empty
    pub message: String,
}

impl CollaboratorError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn io(context: &str, err: &std::io::Error) -> Self {
        Self::new("storage/io", format!("{context}: {err}"))
    }
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SiteError {
    /// Client-side validation failed; no collaborator was called
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    /// Attachment violates the size or type policy
    #[error(transparent)]
    FileRejected(#[from] FileRejection),

    /// Storage collaborator failed while uploading the attachment
    #[error("Upload failed: {0}")]
    Upload(#[source] CollaboratorError),

    /// Data collaborator rejected the record
    #[error("Submission failed: {0}")]
    Submission(#[source] CollaboratorError),

    /// Read request (e.g. project list) failed
    #[error("Request failed: {0}")]
    Network(#[source] CollaboratorError),

    /// The form already has a request in flight
    #[error("A submission is already in progress")]
    InFlight,
}

impl SiteError {
    /// Text for the error notice, falling back to `fallback` for opaque collaborator failures
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            SiteError::Validation(errors) => errors
                .first_message()
                .unwrap_or("Please fill in all required fields")
                .to_string(),
            SiteError::FileRejected(rejection) => rejection.to_string(),
            SiteError::Upload(err) | SiteError::Submission(err) | SiteError::Network(err) => {
                if err.message.trim().is_empty() {
                    fallback.to_string()
                } else {
                    err.message.clone()
                }
            }
            SiteError::InFlight => "Please wait for the current submission to finish".to_string(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, SiteError::Validation(_) | SiteError::FileRejected(_))
    }
}
