//! Structured error documents returned to rejected callers.

use serde::{Deserialize, Serialize};

/// Status string carried by every deny.
pub const UNAUTHORIZED_STATUS: &str = "401";

/// Status string carried by internal failures.
pub const INTERNAL_STATUS: &str = "500";

/// Detail returned for internal failures. The cause is logged, never returned.
pub const INTERNAL_ERROR_DETAIL: &str = "Internal Server Error";

/// Error body: `{"errors": [{"detail": "...", "status": "401"}]}`.
///
/// # Examples
///
/// ```
/// use sources_authz::ErrorDocument;
///
/// let doc = ErrorDocument::new("Unauthorized Action: Incorrect PSK", "401");
/// let body = serde_json::to_string(&doc).unwrap();
///
/// assert_eq!(
///     body,
///     r#"{"errors":[{"detail":"Unauthorized Action: Incorrect PSK","status":"401"}]}"#
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDocument {
    /// One entry per reported error
    pub errors: Vec<ErrorEntry>,
}

/// A single reported error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEntry {
    /// Human-readable message
    pub detail: String,
    /// HTTP status as a string
    pub status: String,
}

impl ErrorDocument {
    /// A document holding a single error.
    pub fn new(detail: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            errors: vec![ErrorEntry {
                detail: detail.into(),
                status: status.into(),
            }],
        }
    }

    /// The generic document returned for internal failures.
    pub fn internal() -> Self {
        Self::new(INTERNAL_ERROR_DETAIL, INTERNAL_STATUS)
    }
}
