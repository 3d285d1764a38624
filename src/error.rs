//! Error types for media-archive

use thiserror::Error;

/// Rejection notice shown to visitors who try to change the catalog.
pub const ADMIN_REQUIRED_NOTICE: &str =
    "Only authenticated admin users can add videos. Please login to continue.";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArchiveError {
    /// A required field is missing or malformed
    #[error("Validation error: {0}")]
    Validation(String),

    /// An operation referenced an id that does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// The object store rejected or never answered an upload
    #[error("Upload failed: {0}")]
    Upload(String),

    /// Bad credentials or identity provider failure
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Signed-in identity (or visitor) is not the admin
    #[error("{}", ADMIN_REQUIRED_NOTICE)]
    AdminRequired,

    /// A submission is already in flight for this session
    #[error("A submission is already in progress")]
    Busy,

    /// Missing or unknown session id
    #[error("Session error: {0}")]
    Session(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ArchiveError {
    /// Short machine-readable kind, used in API error bodies
    pub fn kind(&self) -> &'static str {
        match self {
            ArchiveError::Validation(_) => "validation",
            ArchiveError::NotFound(_) => "not_found",
            ArchiveError::Upload(_) => "upload",
            ArchiveError::Auth(_) => "auth",
            ArchiveError::AdminRequired => "admin_required",
            ArchiveError::Busy => "busy",
            ArchiveError::Session(_) => "session",
            ArchiveError::Config(_) => "config",
        }
    }
}

pub type Result<T> = std::result::Result<T, ArchiveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_required_message_is_notice() {
        assert_eq!(ArchiveError::AdminRequired.to_string(), ADMIN_REQUIRED_NOTICE);
    }

    #[test]
    fn test_kinds() {
        assert_eq!(ArchiveError::Busy.kind(), "busy");
        assert_eq!(ArchiveError::NotFound("x".into()).kind(), "not_found");
        assert_eq!(ArchiveError::Upload("x".into()).kind(), "upload");
    }
}
