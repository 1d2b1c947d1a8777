//! Audit events for gate decisions.
//!
//! Every evaluation emits exactly one event on the [`AUDIT_TARGET`] tracing
//! target. Events carry safe metadata only: which kind of credential was
//! used, the tenant, and the outcome. Keys and identity headers never appear.

use std::fmt;

/// Tracing target audit events are emitted on.
pub const AUDIT_TARGET: &str = "sources_authz::audit";

/// Which credential path the gate took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialKind {
    /// Checks disabled by configuration
    Bypass,
    /// Pre-shared key
    PresharedKey,
    /// System principal identity
    SystemIdentity,
    /// User principal identity
    UserIdentity,
    /// Nothing presented
    Anonymous,
}

impl fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialKind::Bypass => write!(f, "bypass"),
            CredentialKind::PresharedKey => write!(f, "psk"),
            CredentialKind::SystemIdentity => write!(f, "system_identity"),
            CredentialKind::UserIdentity => write!(f, "user_identity"),
            CredentialKind::Anonymous => write!(f, "anonymous"),
        }
    }
}

/// Outcome of an audited evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditOutcome {
    /// Request may proceed
    Allowed,
    /// Request was rejected with a 401
    Denied,
    /// No decision could be reached
    Error,
}

impl fmt::Display for AuditOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditOutcome::Allowed => write!(f, "allowed"),
            AuditOutcome::Denied => write!(f, "denied"),
            AuditOutcome::Error => write!(f, "error"),
        }
    }
}

/// One gate evaluation, as recorded in the audit log.
///
/// # Examples
///
/// ```
/// use sources_authz::audit::{AuditEvent, AuditOutcome, CredentialKind};
///
/// let event = AuditEvent::new(CredentialKind::PresharedKey, AuditOutcome::Denied, "deny_bad_psk")
///     .with_request_id("req-9");
///
/// assert_eq!(
///     event.to_string(),
///     "AuditEvent[credential=psk, outcome=denied, decision=deny_bad_psk, request_id=req-9, org_id=<none>]"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    request_id: Option<String>,
    org_id: Option<String>,
    credential: CredentialKind,
    outcome: AuditOutcome,
    decision: &'static str,
}

impl AuditEvent {
    /// Creates an event for a decision (or error) reached via `credential`.
    pub fn new(credential: CredentialKind, outcome: AuditOutcome, decision: &'static str) -> Self {
        Self {
            request_id: None,
            org_id: None,
            credential,
            outcome,
            decision,
        }
    }

    /// Sets the request correlation id.
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Sets the tenant of the principal.
    pub fn with_org_id(mut self, org_id: impl Into<String>) -> Self {
        self.org_id = Some(org_id.into());
        self
    }

    /// Request correlation id, if known.
    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    /// Tenant of the principal, if known.
    pub fn org_id(&self) -> Option<&str> {
        self.org_id.as_deref()
    }

    /// Credential path taken.
    pub fn credential(&self) -> CredentialKind {
        self.credential
    }

    /// Evaluation outcome.
    pub fn outcome(&self) -> AuditOutcome {
        self.outcome
    }

    /// Decision label (e.g. `allow`, `deny_bad_rbac`, `internal_error`).
    pub fn decision(&self) -> &'static str {
        self.decision
    }

    /// Emits the event through tracing.
    pub fn emit(&self) {
        match self.outcome {
            AuditOutcome::Allowed => tracing::info!(
                target: AUDIT_TARGET,
                request_id = ?self.request_id,
                org_id = ?self.org_id,
                credential = %self.credential,
                outcome = %self.outcome,
                decision = self.decision,
                "write access decision"
            ),
            AuditOutcome::Denied | AuditOutcome::Error => tracing::warn!(
                target: AUDIT_TARGET,
                request_id = ?self.request_id,
                org_id = ?self.org_id,
                credential = %self.credential,
                outcome = %self.outcome,
                decision = self.decision,
                "write access decision"
            ),
        }
    }
}

impl fmt::Display for AuditEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AuditEvent[credential={}, outcome={}, decision={}, request_id={}, org_id={}]",
            self.credential,
            self.outcome,
            self.decision,
            self.request_id.as_deref().unwrap_or("<none>"),
            self.org_id.as_deref().unwrap_or("<none>"),
        )
    }
}
