use std::time::Duration;

use thiserror::Error;

/// Failures that stop the gate from reaching a decision.
///
/// None of these is a deny. The routing layer turns them into a 5xx
/// response; they must never be treated as permission to proceed.
#[derive(Debug, Error)]
pub enum AuthzError {
    /// A request context entry had the wrong shape.
    #[error("malformed request context entry '{key}': {reason}")]
    MalformedContext {
        /// Context key that failed validation
        key: &'static str,
        /// What was wrong with the value (never the value itself)
        reason: String,
    },
    /// A user identity was present without the raw header it was parsed from.
    #[error("parsed user identity present without a raw identity header")]
    MissingIdentityHeader,
    /// The RBAC lookup could not produce an answer.
    #[error("error hitting rbac: {0}")]
    Rbac(#[from] RbacError),
}

impl AuthzError {
    pub(crate) fn malformed(key: &'static str, reason: impl Into<String>) -> Self {
        AuthzError::MalformedContext {
            key,
            reason: reason.into(),
        }
    }
}

/// RBAC lookup failures.
///
/// These mean "unable to authorize", which is distinct from a definitive deny.
#[derive(Debug, Error)]
pub enum RbacError {
    /// The lookup did not finish before its deadline and was cancelled.
    #[error("rbac request timed out after {0:?}")]
    Timeout(Duration),
    /// The request could not be sent or the connection failed.
    #[error("rbac transport error: {0}")]
    Transport(String),
    /// The service answered with a non-success status.
    #[error("rbac returned status {0}")]
    Status(u16),
    /// The response body could not be decoded.
    #[error("malformed rbac response: {0}")]
    MalformedResponse(String),
    /// No RBAC endpoint was configured for this gate.
    #[error("rbac client not configured")]
    NotConfigured,
    /// A grant's permission string was not `service:resource:verb`.
    #[error("invalid permission '{0}'")]
    InvalidPermission(String),
}

/// Configuration loading failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An RBAC client was requested but no endpoint was configured.
    #[error("RBAC_URL is not configured")]
    MissingRbacUrl,
    /// The configured endpoint is not a valid URL.
    #[error("invalid RBAC_URL '{url}': {source}")]
    InvalidRbacUrl {
        /// The rejected value
        url: String,
        /// Parser error
        #[source]
        source: url::ParseError,
    },
    /// The HTTP client could not be constructed.
    #[error("failed to build rbac http client: {0}")]
    Client(String),
}
